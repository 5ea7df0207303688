pub mod discover;
pub mod orchestrator;
pub mod report;
pub mod select;
pub mod types;

pub use orchestrator::Orchestrator;
pub use types::{MigrationOutcome, ProjectCandidate, SolutionReport, WorkItem};
