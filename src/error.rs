//! Error taxonomy for the P-system core.
//!
//! Four kinds, matching the propagation policy a caller needs to apply:
//! [`DomainError`] and [`StructuralError`] are fatal for the step and
//! abort the simulation; [`ResourceError`] wraps I/O failures from the
//! trace/CSV sinks and propagates to the caller; semantic/soft failures
//! (`apply_out` from the root, a firing invalidated by an earlier
//! dissolution) are deliberately *not* errors — see [`ApplyOutcome`] in
//! [`crate::membrane`] — so they do not appear here.

use thiserror::Error;

use crate::symbol::Symbol;

/// Top-level error type for the P-system core.
#[derive(Error, Debug)]
pub enum PSystemError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Malformed values that are a programming/construction error, never a
/// recoverable runtime condition.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("negative multiplicity {n} for symbol '{symbol}'")]
    NegativeMultiplicity { symbol: Symbol, n: i64 },

    #[error("null or empty symbol")]
    NullSymbol,

    #[error("unsupported move code: {0:?}")]
    UnsupportedMove(crate::rule::MoveCode),

    #[error("rule '{id:?}' has a priority list but no id, so it could never be excluded by name")]
    PriorityWithoutId { id: Option<String> },

    #[error("duplicate rule id '{0}' within the same membrane rule list")]
    DuplicateRuleId(String),
}

/// Inconsistencies discovered while wiring or walking the membrane tree.
#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("apply_in destination '{0}' is not a child of the acting membrane")]
    DestinationNotAChild(String),

    #[error("apply_move_mem destination membrane does not exist in the tree")]
    DestinationMembraneMissing,

    #[error("membrane id {0:?} refers to a dissolved (stale) membrane")]
    StaleMembraneId(crate::membrane::MembraneId),

    #[error("membrane id {0:?} does not exist in this arena")]
    UnknownMembraneId(crate::membrane::MembraneId),

    #[error("child index {index} out of range for membrane {parent:?} with {len} children")]
    ChildIndexOutOfRange {
        parent: crate::membrane::MembraneId,
        index: usize,
        len: usize,
    },
}

/// I/O failures while writing the trace file or the output CSV.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::io::Error> for PSystemError {
    fn from(err: std::io::Error) -> Self {
        PSystemError::Resource(ResourceError::from(err))
    }
}

pub type Result<T> = std::result::Result<T, PSystemError>;
