pub mod decision;

pub use decision::{ArchiveDecision, ArchiveOutcome, Archiver};
