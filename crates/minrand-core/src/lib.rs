//! Covariate-adaptive minimization (Pocock-Simon) randomization engine.
//!
//! The engine scores every candidate group for a new subject, turns the
//! ranking into biased-coin probabilities, draws a rank, breaks ties
//! uniformly and records the result in the project's aggregate counts.
//!
//! # Architecture
//!
//! - `stats` - range and population standard deviation
//! - `score` - imbalance of a hypothetical placement for one variable
//! - `probability` - rank probabilities from group count and bias
//! - `selector` - end-to-end assignment of one subject
//! - `ledger` - aggregate count bookkeeping, removal and reassignment
//! - `random` - injectable random source
//! - `report` - balance summary for display
//!
//! The engine does not lock anything. Callers must run
//! "load project, assign, persist" as one atomic unit per project.

pub mod ledger;
pub mod probability;
pub mod random;
pub mod report;
pub mod score;
pub mod selector;
pub mod stats;

pub use ledger::{
    Reassignment, add_to_aggregate, reassign_subject, remove_from_aggregate, remove_subject,
};
pub use probability::RankProbabilities;
pub use random::{RandomSource, RngSource, ScriptedSource};
pub use report::{BalanceReport, GroupSummary, LevelBalance};
pub use score::{score, score_level};
pub use selector::{
    Assignment, AssignmentOutcome, AssignmentRequest, assign, check_before_assigning,
    group_scores, randomize,
};
pub use stats::{imbalance, range, rate_adjusted, stdev};
