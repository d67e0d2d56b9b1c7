//! The [`BlockStage`] trait and write [`Coverage`].
//!
//! Stages are stateless operators run once per block per phase. They
//! declare which fields they read, which of those they read on halo
//! elements, and which they write, so the pipeline can be checked for
//! stale-halo reads before the first run.

use glacier_core::{ErrorFlags, FieldName, FieldSet, StageError};
use smallvec::SmallVec;

use crate::context::StageContext;

/// How much of a field a stage leaves valid after writing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// Every element, halo included, holds a correct value.
    All,
    /// Only owned elements are correct; the halo is stale until exchanged.
    Owned,
}

/// Write declarations of a stage.
pub type StageWrites = SmallVec<[(FieldName, Coverage); 4]>;

/// A stateless operator applied to one block at a time.
///
/// # Contract
///
/// - `run()` must only touch the fields declared in `writes()`.
/// - `&self`: stages hold configuration, never per-run state.
/// - `reads()`, `reads_halo()` and `writes()` are consulted once, when the
///   pipeline is validated.
///
/// # Object safety
///
/// The pipeline stores stages as `Box<dyn BlockStage>`.
///
/// # Examples
///
/// ```
/// use glacier_core::{FieldName, FieldSet, StageError};
/// use glacier_diag::{BlockStage, Coverage, StageContext, StageWrites};
/// use smallvec::smallvec;
///
/// struct ZeroVertexThickness;
///
/// impl BlockStage for ZeroVertexThickness {
///     fn name(&self) -> &str { "zero_vertex_thickness" }
///     fn reads(&self) -> FieldSet { FieldSet::empty() }
///     fn writes(&self) -> StageWrites {
///         smallvec![(FieldName::ThicknessVertex, Coverage::All)]
///     }
///     fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
///         ctx.state_mut().thickness_vertex.fill(0.0);
///         Ok(())
///     }
/// }
///
/// assert_eq!(ZeroVertexThickness.name(), "zero_vertex_thickness");
/// ```
pub trait BlockStage: Send + Sync {
    /// Name used in logs, failure records and pipeline errors.
    fn name(&self) -> &str;

    /// Fields the stage reads.
    fn reads(&self) -> FieldSet;

    /// Subset of reads that must be valid on halo elements.
    ///
    /// Default: empty set.
    fn reads_halo(&self) -> FieldSet {
        FieldSet::empty()
    }

    /// Fields the stage writes and how much of each it covers.
    fn writes(&self) -> StageWrites;

    /// Flag raised when `run()` returns an error. Default: [`ErrorFlags::STAGE`].
    fn failure_flag(&self) -> ErrorFlags {
        ErrorFlags::STAGE
    }

    /// Execute the stage on one block.
    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError>;
}
