mod case;
mod pipeline;
mod process;
mod runner;
mod scratch;
mod store;
mod verdict;

pub use case::{TestCase, DELIMITER};
pub use pipeline::{FailureSignal, PipelineResult, Stage, Tool, Toolchain};
pub use process::Output;
pub use runner::{Config, RunSummary, Runner};
pub use scratch::{Scratch, ScratchLayout};
pub use store::CaseStore;
pub use verdict::{judge, outputs_match, Verdict};

/*****************************************************************************************
 * Error Types
 */

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The corpus directory is missing or unreadable, nothing can run
    #[error("case directory {path:?} is unavailable")]
    StoreUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed case {name}: expected exactly one `!expect!` line, found {occurrences}")]
    MalformedCase { name: String, occurrences: usize },

    #[error("failed to read case {path:?}")]
    ReadCase {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write scratch file {path:?}")]
    WriteScratch {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {program:?}")]
    Spawn {
        program: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/*****************************************************************************************
 * Common Constants
 */

/// Names starting with this prefix belong to the harness and are never treated as cases
pub const DEFAULT_SCRATCH_PREFIX: &str = "_";
