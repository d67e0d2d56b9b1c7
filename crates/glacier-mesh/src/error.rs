//! Error types for mesh construction.

use glacier_core::ElementKind;
use std::fmt;

/// Errors arising from mesh block or sigma level construction.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Attempted to construct a block with zero cells.
    EmptyMesh,
    /// The sigma fractions are unusable.
    InvalidSigma {
        /// What went wrong.
        reason: String,
    },
    /// An adjacency table refers to a cell that does not exist.
    CellOutOfRange {
        /// Element kind holding the reference.
        element: ElementKind,
        /// Index of the referencing element.
        index: usize,
        /// The out-of-range cell index.
        cell: usize,
        /// Number of cells in the block.
        cell_count: usize,
    },
    /// A per-element array has the wrong length.
    LengthMismatch {
        /// Name of the array.
        name: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// An owned-element count exceeds the total element count.
    OwnedExceedsTotal {
        /// Element kind.
        element: ElementKind,
        /// Declared owned count.
        owned: usize,
        /// Total element count.
        total: usize,
    },
    /// A geometric value is NaN, infinite, or negative where it must not be.
    InvalidGeometry {
        /// Name of the array.
        name: &'static str,
        /// Index of the offending value.
        index: usize,
        /// The offending value.
        value: f64,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMesh => write!(f, "mesh block must have at least one cell"),
            Self::InvalidSigma { reason } => write!(f, "invalid sigma levels: {reason}"),
            Self::CellOutOfRange {
                element,
                index,
                cell,
                cell_count,
            } => write!(
                f,
                "{element} {index} references cell {cell}, block has {cell_count} cells"
            ),
            Self::LengthMismatch {
                name,
                expected,
                actual,
            } => write!(f, "{name} has length {actual}, expected {expected}"),
            Self::OwnedExceedsTotal {
                element,
                owned,
                total,
            } => write!(f, "owned {element} count {owned} exceeds total {total}"),
            Self::InvalidGeometry { name, index, value } => {
                write!(f, "{name}[{index}] = {value} is not a valid value")
            }
        }
    }
}

impl std::error::Error for MeshError {}
