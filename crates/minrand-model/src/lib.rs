pub mod enums;
pub mod error;
pub mod project;
pub mod variable;

pub use enums::{Bias, ScoringFunction};
pub use error::{ConfigurationError, DataIntegrityError, RandomizationError, Result};
pub use project::{AggregateCounts, Project, ProjectDefinition, SubjectRecord};
pub use variable::Variable;
