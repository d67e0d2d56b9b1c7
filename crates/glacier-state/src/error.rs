//! State-specific error types.

use std::error::Error;
use std::fmt;

use glacier_core::{BlockId, FieldName, StageError};

/// Errors that can occur when building or checking state snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateError {
    /// A field buffer does not match the mesh dimensions.
    ShapeMismatch {
        /// The offending field.
        field: FieldName,
        /// Expected number of values.
        expected: usize,
        /// Actual number of values.
        actual: usize,
    },
    /// A snapshot was paired with a mesh block of a different shape.
    BlockMismatch {
        /// The block the snapshot was checked against.
        block: BlockId,
        /// Description of the mismatch.
        reason: String,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                field,
                expected,
                actual,
            } => write!(f, "field {field} has {actual} values, expected {expected}"),
            Self::BlockMismatch { block, reason } => {
                write!(f, "state does not match block {block}: {reason}")
            }
        }
    }
}

impl Error for StateError {}

impl From<StateError> for StageError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::ShapeMismatch {
                field,
                expected,
                actual,
            } => StageError::ShapeMismatch {
                field,
                expected,
                actual,
            },
            other => StageError::ExecutionFailed {
                reason: other.to_string(),
            },
        }
    }
}
