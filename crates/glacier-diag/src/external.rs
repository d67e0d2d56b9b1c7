//! Collaborators supplied by the host model, and the stages that run them.
//!
//! The mask classifier, velocity solver and velocity reconstructor are
//! specified only at their interface. The host passes implementations to
//! the engine; the adapters here give them a place in the pipeline with
//! their field declarations and the error flag their failure raises.

use std::sync::Arc;

use glacier_core::{ElementKind, ErrorFlags, FieldName, FieldSet, StageError};
use glacier_mesh::MeshBlock;
use glacier_state::StateSnapshot;
use smallvec::smallvec;

use crate::config::DiagnosticConfig;
use crate::context::StageContext;
use crate::stage::{BlockStage, Coverage, StageWrites};

// ── Collaborator traits ────────────────────────────────────────────

/// Writes cell, edge and vertex masks from the current geometry.
///
/// Only owned elements need to be correct on return; the masks are
/// exchanged before anything reads them on the halo.
pub trait MaskClassifier: Send + Sync {
    /// Classify every owned element of one block.
    fn classify(
        &self,
        mesh: &MeshBlock,
        state: &mut StateSnapshot,
        config: &DiagnosticConfig,
    ) -> Result<(), StageError>;
}

/// Solves for edge-normal velocity on owned edges.
pub trait VelocitySolver: Send + Sync {
    /// Fill `normal_velocity` for one block.
    fn solve(
        &self,
        mesh: &MeshBlock,
        state: &mut StateSnapshot,
        config: &DiagnosticConfig,
    ) -> Result<(), StageError>;
}

/// Reconstructs cell-centred velocity components from edge-normal velocity.
pub trait VelocityReconstructor: Send + Sync {
    /// Fill `u_reconstruct_x` and `u_reconstruct_y` for one block.
    fn reconstruct(&self, mesh: &MeshBlock, state: &mut StateSnapshot) -> Result<(), StageError>;
}

// ── Adapter stages ─────────────────────────────────────────────────

/// Runs a [`MaskClassifier`] and checks the cell masks it produced.
pub struct ClassifyMasksStage {
    classifier: Arc<dyn MaskClassifier>,
}

impl ClassifyMasksStage {
    /// Wrap a classifier.
    pub fn new(classifier: Arc<dyn MaskClassifier>) -> Self {
        Self { classifier }
    }
}

impl BlockStage for ClassifyMasksStage {
    fn name(&self) -> &str {
        "classify_masks"
    }

    fn reads(&self) -> FieldSet {
        [FieldName::Thickness].into_iter().collect()
    }

    fn reads_halo(&self) -> FieldSet {
        self.reads()
    }

    fn writes(&self) -> StageWrites {
        smallvec![
            (FieldName::CellMask, Coverage::Owned),
            (FieldName::EdgeMask, Coverage::Owned),
            (FieldName::VertexMask, Coverage::Owned),
        ]
    }

    fn failure_flag(&self) -> ErrorFlags {
        ErrorFlags::MASK
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let (mesh, state, config) = ctx.parts();
        self.classifier.classify(mesh, state, config)?;
        let owned = mesh.owned_count(ElementKind::Cell);
        match state.cell_mask[..owned]
            .iter()
            .position(|m| !m.is_well_formed())
        {
            Some(cell) => Err(StageError::ExecutionFailed {
                reason: format!(
                    "cell {cell} mask {} is not exactly one of no-ice, grounded, floating",
                    state.cell_mask[cell]
                ),
            }),
            None => Ok(()),
        }
    }
}

/// Runs a [`VelocitySolver`].
pub struct SolveVelocityStage {
    solver: Arc<dyn VelocitySolver>,
}

impl SolveVelocityStage {
    /// Wrap a solver.
    pub fn new(solver: Arc<dyn VelocitySolver>) -> Self {
        Self { solver }
    }
}

impl BlockStage for SolveVelocityStage {
    fn name(&self) -> &str {
        "solve_velocity"
    }

    fn reads(&self) -> FieldSet {
        [
            FieldName::Thickness,
            FieldName::LayerThickness,
            FieldName::Tracers,
            FieldName::CellMask,
            FieldName::EdgeMask,
            FieldName::VertexMask,
            FieldName::UpperSurface,
            FieldName::LowerSurface,
            FieldName::ThicknessVertex,
            FieldName::UpperSurfaceVertex,
        ]
        .into_iter()
        .collect()
    }

    fn reads_halo(&self) -> FieldSet {
        [
            FieldName::Thickness,
            FieldName::CellMask,
            FieldName::EdgeMask,
            FieldName::UpperSurface,
        ]
        .into_iter()
        .collect()
    }

    fn writes(&self) -> StageWrites {
        smallvec![(FieldName::NormalVelocity, Coverage::Owned)]
    }

    fn failure_flag(&self) -> ErrorFlags {
        ErrorFlags::VELOCITY
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let (mesh, state, config) = ctx.parts();
        self.solver.solve(mesh, state, config)
    }
}

/// Runs a [`VelocityReconstructor`].
pub struct ReconstructVelocityStage {
    reconstructor: Arc<dyn VelocityReconstructor>,
}

impl ReconstructVelocityStage {
    /// Wrap a reconstructor.
    pub fn new(reconstructor: Arc<dyn VelocityReconstructor>) -> Self {
        Self { reconstructor }
    }
}

impl BlockStage for ReconstructVelocityStage {
    fn name(&self) -> &str {
        "reconstruct_velocity"
    }

    fn reads(&self) -> FieldSet {
        [FieldName::NormalVelocity].into_iter().collect()
    }

    fn reads_halo(&self) -> FieldSet {
        self.reads()
    }

    fn writes(&self) -> StageWrites {
        smallvec![
            (FieldName::UReconstructX, Coverage::Owned),
            (FieldName::UReconstructY, Coverage::Owned),
        ]
    }

    fn failure_flag(&self) -> ErrorFlags {
        ErrorFlags::RECONSTRUCT
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let (mesh, state, _) = ctx.parts();
        self.reconstructor.reconstruct(mesh, state)
    }
}
