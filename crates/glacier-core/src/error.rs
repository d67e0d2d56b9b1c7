//! Error types shared across the diagnostic core.
//!
//! Stage-level failures are [`StageError`]s; per-cell geometric
//! inconsistencies are not errors at all but [`GeometryViolation`] records
//! that travel alongside the aggregate [`ErrorFlags`](crate::ErrorFlags).

use std::error::Error;
use std::fmt;

use crate::field::FieldName;
use crate::id::BlockId;

/// Errors from a single stage running on a single block.
///
/// Returned by built-in stages and external collaborators alike. The
/// orchestrator records them and raises the matching error flag; it does
/// not stop other blocks from running.
#[derive(Clone, Debug, PartialEq)]
pub enum StageError {
    /// The stage (or collaborator) failed outright.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A field buffer does not have the length the mesh implies.
    ShapeMismatch {
        /// The offending field.
        field: FieldName,
        /// Expected number of values.
        expected: usize,
        /// Actual number of values.
        actual: usize,
    },
    /// A non-finite value was found where a finite one is required.
    NonFinite {
        /// The field containing the value.
        field: FieldName,
        /// Flat index of the first offending value.
        index: usize,
    },
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::ShapeMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field {field} has {actual} values, expected {expected}"
            ),
            Self::NonFinite { field, index } => {
                write!(f, "non-finite value in field {field} at index {index}")
            }
        }
    }
}

impl Error for StageError {}

/// A cell whose lower surface lies below the bed.
///
/// Recorded by the surface geometry update. Non-fatal at the point of
/// detection; the run continues and the violation is reported with the
/// aggregate flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryViolation {
    /// Block the cell belongs to.
    pub block: BlockId,
    /// Local cell index within the block.
    pub cell: usize,
    /// Computed lower surface elevation.
    pub lower_surface: f64,
    /// Bed elevation at the cell.
    pub bed_topography: f64,
}

impl fmt::Display for GeometryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} cell {}: lower surface {} below bed {}",
            self.block, self.cell, self.lower_surface, self.bed_topography
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_display_names_field() {
        let err = StageError::ShapeMismatch {
            field: FieldName::LayerThickness,
            expected: 12,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "field layer_thickness has 10 values, expected 12"
        );
    }

    #[test]
    fn violation_display() {
        let v = GeometryViolation {
            block: BlockId(2),
            cell: 5,
            lower_surface: -120.0,
            bed_topography: -100.0,
        };
        assert!(v.to_string().contains("block 2 cell 5"));
    }
}
