//! Error types shared by the randomization crates.
//!
//! Configuration problems and data-integrity problems are kept apart so a
//! caller can tell a broken project definition from a bad subject record.

use thiserror::Error;

/// A project definition or stored project state is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("project name must not be empty")]
    EmptyProjectName,

    #[error("at least 2 treatment groups are required, found {found}")]
    TooFewGroups { found: usize },

    #[error("treatment group names must not be empty")]
    EmptyGroupName,

    #[error("duplicate treatment group name: {0}")]
    DuplicateGroup(String),

    #[error("expected {expected} sampling rates (one per group), found {found}")]
    SamplingRateCount { expected: usize, found: usize },

    #[error("sampling rate for group '{group}' must be a positive number, got {rate}")]
    NonPositiveSamplingRate { group: String, rate: f64 },

    #[error("bias must be between 1 and 10, got {0}")]
    BiasOutOfRange(i64),

    #[error("unknown scoring function: {0}")]
    UnknownScoringFunction(String),

    #[error("invalid variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },

    #[error("duplicate variable name: {0}")]
    DuplicateVariable(String),

    #[error("project state is inconsistent: {0}")]
    Shape(String),
}

/// Subject data does not line up with the project's configuration or counts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    #[error("no value supplied for variable '{variable}'")]
    MissingCovariate { variable: String },

    #[error("value '{value}' is not a level of variable '{variable}'")]
    UnknownLevel { variable: String, value: String },

    #[error("unknown treatment group: {0}")]
    UnknownGroup(String),

    #[error("removing the subject would make the count for {cell} negative")]
    CountUnderflow { cell: String },
}

/// Any failure raised by the randomization engine or its record operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RandomizationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("the project is not open for new enrollments")]
    EnrollmentClosed,

    #[error("the subject id may not be blank")]
    EmptySubjectId,

    #[error("subject '{0}' has already been assigned to a treatment group")]
    DuplicateSubject(String),

    #[error("there is no subject with id '{0}' in the project")]
    SubjectNotFound(String),

    #[error("subject '{0}' has already been removed from the project")]
    SubjectAlreadyRemoved(String),

    #[error("subject-level data is not stored for this project")]
    RawDataNotStored,

    #[error("subject '{subject_id}' is already in group '{group}'")]
    SameGroup { subject_id: String, group: String },
}

pub type Result<T> = std::result::Result<T, RandomizationError>;
