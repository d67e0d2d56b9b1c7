//! What a diagnostic run hands back to its caller.

use glacier_core::{BlockId, ErrorFlags, GeometryViolation, StageError};
use glacier_diag::PhaseKind;

use crate::metrics::DiagnosticMetrics;

/// A stage that returned an error on one block.
#[derive(Clone, Debug, PartialEq)]
pub struct StageFailure {
    /// Block the stage ran on.
    pub block: BlockId,
    /// Stage name.
    pub stage: String,
    /// The error it returned.
    pub error: StageError,
}

/// Aggregate result of one diagnostic run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagnosticReport {
    /// Bitwise OR of every flag raised on every block.
    pub flags: ErrorFlags,
    /// Geometry violations from all blocks, in block order.
    pub violations: Vec<GeometryViolation>,
    /// Stage failures from all blocks, in block order.
    pub failures: Vec<StageFailure>,
    /// Vertices interpolated with the zero-area fallback.
    pub degenerate_vertices: usize,
    /// Phases that ran, in order.
    pub phases: Vec<PhaseKind>,
    /// Timing.
    pub metrics: DiagnosticMetrics,
}

impl DiagnosticReport {
    /// Whether no flag was raised.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}
