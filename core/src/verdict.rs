use crate::{PipelineResult, Stage};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    FailedCompile(String),
    FailedMismatch { expected: String, actual: String },
    /// The case file holds the delimiter `occurrences` times instead of exactly once
    Malformed { occurrences: usize },
    TimedOut { stage: Stage, limit: Duration },
    /// The harness itself failed on this case, e.g. a program couldn't be spawned
    Errored(String),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// `actual` may carry exactly one extra trailing newline, nothing else is forgiven
pub fn outputs_match(expected: &str, actual: &str) -> bool {
    actual == expected || actual.strip_suffix('\n') == Some(expected)
}

pub fn judge(expected: &str, result: PipelineResult) -> Verdict {
    match result {
        PipelineResult::CompileFailed { message, .. } => Verdict::FailedCompile(message),
        PipelineResult::TimedOut { stage, limit } => Verdict::TimedOut { stage, limit },
        PipelineResult::Ran { stdout, .. } if outputs_match(expected, &stdout) => Verdict::Passed,
        PipelineResult::Ran { stdout, .. } => Verdict::FailedMismatch {
            expected: expected.to_owned(),
            actual: stdout,
        },
    }
}
