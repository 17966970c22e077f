//! The error type shared by the parser, compiler and executors.

use std::collections::TryReserveError;
use thiserror::Error;

/// Represents an error encountered while parsing, compiling or executing a
/// regex.
///
/// Parse failures carry exactly one of two diagnostics: `invalid repeat` or
/// `invalid capture`. The remaining variants report compile failures and
/// exhausted budgets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A quantifier had nothing to repeat, for example `*` at the start of a
    /// pattern or directly after `(` or `|`.
    #[error("invalid repeat")]
    InvalidRepeat,

    /// A `)` without a matching `(`, or a `(` that is never closed.
    #[error("invalid capture")]
    InvalidCapture,

    /// The compiler was handed a node with no content, such as a
    /// concatenation with no children.
    #[error("cannot compile empty {0} node")]
    EmptyNode(&'static str),

    /// The compiled program would exceed the instruction budget.
    #[error("program exceeds the limit of {0} instructions")]
    ProgramTooLarge(usize),

    /// The pattern opens more capture groups than can be numbered.
    #[error("pattern has more than {0} capture groups")]
    TooManyCaptureGroups(usize),

    /// The pattern nests deeper than the nesting budget.
    #[error("pattern nesting exceeds the limit of {0}")]
    NestingTooDeep(usize),

    /// A match attempt executed more instructions than the step budget.
    #[error("match exceeded the limit of {0} steps")]
    StepLimitExceeded(usize),

    /// A match attempt accumulated more pending alternatives than the
    /// backtrack budget.
    #[error("match exceeded the limit of {0} backtrack entries")]
    BacktrackLimitExceeded(usize),

    /// An allocation failed.
    #[error("out of memory")]
    ResourceExhausted,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::ResourceExhausted
    }
}

impl Error {
    /// \return whether this error was produced by the parser.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Error::InvalidRepeat | Error::InvalidCapture)
    }
}
