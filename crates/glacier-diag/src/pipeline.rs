//! Phases as data and startup validation of halo ordering.
//!
//! A diagnostic run is a list of [`Phase`]s, each a sequence of
//! [`Step`]s: either a [`BlockStage`] applied to every block, or a halo
//! exchange of one field. [`validate_pipeline`] runs once when the engine
//! is built and rejects any layout in which a stage reads a field on halo
//! elements while that field's halo is stale.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use glacier_core::{FieldName, FieldSet};
use indexmap::IndexMap;

use crate::external::{
    ClassifyMasksStage, MaskClassifier, ReconstructVelocityStage, SolveVelocityStage,
    VelocityReconstructor, VelocitySolver,
};
use crate::remap::RemapStage;
use crate::stage::{BlockStage, Coverage};
use crate::surface::SurfaceStage;
use crate::upwind::UpwindStage;
use crate::vertex::VertexInterpolationStage;

// ── Phases ─────────────────────────────────────────────────────────

/// The three phases of a diagnostic run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Masks, surfaces, vertex geometry, vertical remap.
    PreVelocity,
    /// Velocity solve; skipped unless the caller asks for it.
    Velocity,
    /// Velocity reconstruction and edge flux thickness.
    PostVelocity,
}

impl PhaseKind {
    /// Whether the phase only runs on request.
    pub fn is_optional(self) -> bool {
        matches!(self, Self::Velocity)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreVelocity => write!(f, "pre-velocity"),
            Self::Velocity => write!(f, "velocity"),
            Self::PostVelocity => write!(f, "post-velocity"),
        }
    }
}

/// One step of a phase.
pub enum Step {
    /// Run a stage on every block; the end of the step is a barrier.
    Block(Box<dyn BlockStage>),
    /// Exchange one field's halo across blocks.
    Exchange(FieldName),
}

impl Step {
    /// Short label for logs and metrics.
    pub fn label(&self) -> String {
        match self {
            Self::Block(stage) => stage.name().to_string(),
            Self::Exchange(field) => format!("exchange {field}"),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(stage) => f.debug_tuple("Block").field(&stage.name()).finish(),
            Self::Exchange(field) => f.debug_tuple("Exchange").field(field).finish(),
        }
    }
}

/// An ordered group of steps.
#[derive(Debug)]
pub struct Phase {
    /// Which phase this is.
    pub kind: PhaseKind,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

/// The standard diagnostic layout.
///
/// ```text
/// pre-velocity:  classify_masks → exchange cell/edge/vertex masks
///                → surface_geometry → cell_to_vertex → vertical_remap
/// velocity:      solve_velocity → exchange normal_velocity
/// post-velocity: reconstruct_velocity → edge_flux_thickness
///                → exchange layer_thickness_edge
/// ```
pub fn standard_phases(
    classifier: Arc<dyn MaskClassifier>,
    solver: Arc<dyn VelocitySolver>,
    reconstructor: Arc<dyn VelocityReconstructor>,
) -> Vec<Phase> {
    vec![
        Phase {
            kind: PhaseKind::PreVelocity,
            steps: vec![
                Step::Block(Box::new(ClassifyMasksStage::new(classifier))),
                Step::Exchange(FieldName::CellMask),
                Step::Exchange(FieldName::EdgeMask),
                Step::Exchange(FieldName::VertexMask),
                Step::Block(Box::new(SurfaceStage)),
                Step::Block(Box::new(VertexInterpolationStage)),
                Step::Block(Box::new(RemapStage)),
            ],
        },
        Phase {
            kind: PhaseKind::Velocity,
            steps: vec![
                Step::Block(Box::new(SolveVelocityStage::new(solver))),
                Step::Exchange(FieldName::NormalVelocity),
            ],
        },
        Phase {
            kind: PhaseKind::PostVelocity,
            steps: vec![
                Step::Block(Box::new(ReconstructVelocityStage::new(reconstructor))),
                Step::Block(Box::new(UpwindStage)),
                Step::Exchange(FieldName::LayerThicknessEdge),
            ],
        },
    ]
}

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from pipeline validation (startup-time, not per-run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No phases, or no steps in any phase.
    EmptyPipeline,
    /// Phases are not in pre-velocity, velocity, post-velocity order, or a
    /// kind appears twice.
    PhaseOrder {
        /// The phase found out of order.
        phase: PhaseKind,
    },
    /// A stage reads a field on halo elements after it was written on
    /// owned elements only and before it was exchanged.
    StaleHaloRead {
        /// Phase containing the reader.
        phase: PhaseKind,
        /// The reading stage.
        stage: String,
        /// The stale field.
        field: FieldName,
        /// The stage that last wrote the field.
        writer: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPipeline => write!(f, "pipeline has no steps"),
            Self::PhaseOrder { phase } => write!(f, "phase {phase} is out of order"),
            Self::StaleHaloRead {
                phase,
                stage,
                field,
                writer,
            } => write!(
                f,
                "stage '{stage}' in {phase} phase reads halo of {field}, \
                 which '{writer}' wrote on owned elements without an exchange"
            ),
        }
    }
}

impl Error for PipelineError {}

// ── Validation ─────────────────────────────────────────────────────

/// Validate a phase list.
///
/// Checks performed:
///
/// 1. At least one step exists.
/// 2. Phase kinds appear at most once and in execution order.
/// 3. No stale halo reads, both with and without the optional phases.
///
/// Fields are assumed halo-valid when the run starts.
pub fn validate_pipeline(phases: &[Phase]) -> Result<(), PipelineError> {
    if phases.iter().all(|p| p.steps.is_empty()) {
        return Err(PipelineError::EmptyPipeline);
    }

    for pair in phases.windows(2) {
        if rank(pair[1].kind) <= rank(pair[0].kind) {
            return Err(PipelineError::PhaseOrder {
                phase: pair[1].kind,
            });
        }
    }

    check_halo_order(phases, true)?;
    check_halo_order(phases, false)
}

fn rank(kind: PhaseKind) -> u8 {
    match kind {
        PhaseKind::PreVelocity => 0,
        PhaseKind::Velocity => 1,
        PhaseKind::PostVelocity => 2,
    }
}

fn check_halo_order(phases: &[Phase], with_optional: bool) -> Result<(), PipelineError> {
    let mut stale = FieldSet::empty();
    // Field → name of the stage that last wrote it on owned elements.
    let mut writers: IndexMap<FieldName, String> = IndexMap::new();

    for phase in phases {
        if phase.kind.is_optional() && !with_optional {
            continue;
        }
        for step in &phase.steps {
            match step {
                Step::Block(stage) => {
                    if let Some(field) = stage.reads_halo().intersection(&stale).iter().next() {
                        return Err(PipelineError::StaleHaloRead {
                            phase: phase.kind,
                            stage: stage.name().to_string(),
                            field,
                            writer: writers.get(&field).cloned().unwrap_or_default(),
                        });
                    }
                    let writes = stage.writes();
                    let covered = |coverage: Coverage| -> FieldSet {
                        writes
                            .iter()
                            .filter(|(_, c)| *c == coverage)
                            .map(|(f, _)| *f)
                            .collect()
                    };
                    let owned = covered(Coverage::Owned);
                    stale = stale.difference(&covered(Coverage::All)).union(&owned);
                    for field in owned.iter() {
                        writers.insert(field, stage.name().to_string());
                    }
                }
                Step::Exchange(field) => {
                    stale.remove(*field);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StageContext;
    use crate::stage::StageWrites;
    use glacier_core::StageError;
    use glacier_mesh::MeshBlock;
    use glacier_state::StateSnapshot;
    use smallvec::smallvec;

    use crate::config::DiagnosticConfig;

    struct Nop;

    impl MaskClassifier for Nop {
        fn classify(
            &self,
            _: &MeshBlock,
            _: &mut StateSnapshot,
            _: &DiagnosticConfig,
        ) -> Result<(), StageError> {
            Ok(())
        }
    }

    impl VelocitySolver for Nop {
        fn solve(
            &self,
            _: &MeshBlock,
            _: &mut StateSnapshot,
            _: &DiagnosticConfig,
        ) -> Result<(), StageError> {
            Ok(())
        }
    }

    impl VelocityReconstructor for Nop {
        fn reconstruct(&self, _: &MeshBlock, _: &mut StateSnapshot) -> Result<(), StageError> {
            Ok(())
        }
    }

    fn standard() -> Vec<Phase> {
        standard_phases(Arc::new(Nop), Arc::new(Nop), Arc::new(Nop))
    }

    /// Writes `field` on owned elements only.
    struct OwnedWriter(FieldName);

    impl BlockStage for OwnedWriter {
        fn name(&self) -> &str {
            "owned_writer"
        }
        fn reads(&self) -> FieldSet {
            FieldSet::empty()
        }
        fn writes(&self) -> StageWrites {
            smallvec![(self.0, Coverage::Owned)]
        }
        fn run(&self, _ctx: &mut StageContext<'_>) -> Result<(), StageError> {
            Ok(())
        }
    }

    #[test]
    fn standard_layout_is_valid() {
        let phases = standard();
        assert_eq!(validate_pipeline(&phases), Ok(()));
        assert_eq!(phases.len(), 3);
        assert_eq!(phases[0].steps[0].label(), "classify_masks");
        assert_eq!(phases[0].steps[1].label(), "exchange cell_mask");
    }

    #[test]
    fn missing_mask_exchange_is_rejected() {
        let mut phases = standard();
        phases[0].steps.remove(1);
        assert_eq!(
            validate_pipeline(&phases),
            Err(PipelineError::StaleHaloRead {
                phase: PhaseKind::PreVelocity,
                stage: "surface_geometry".to_string(),
                field: FieldName::CellMask,
                writer: "classify_masks".to_string(),
            })
        );
    }

    #[test]
    fn missing_velocity_exchange_is_rejected() {
        let mut phases = standard();
        phases[1].steps.pop();
        let err = validate_pipeline(&phases).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StaleHaloRead {
                phase: PhaseKind::PostVelocity,
                field: FieldName::NormalVelocity,
                ..
            }
        ));
    }

    #[test]
    fn stale_field_refreshed_by_full_write() {
        let phases = vec![Phase {
            kind: PhaseKind::PreVelocity,
            steps: vec![
                Step::Block(Box::new(OwnedWriter(FieldName::LayerThickness))),
                Step::Block(Box::new(RemapStage)),
            ],
        }];
        assert!(matches!(
            validate_pipeline(&phases),
            Err(PipelineError::StaleHaloRead { .. })
        ));

        let phases = vec![Phase {
            kind: PhaseKind::PreVelocity,
            steps: vec![
                Step::Block(Box::new(OwnedWriter(FieldName::UpperSurface))),
                Step::Block(Box::new(SurfaceStage)),
                Step::Block(Box::new(VertexInterpolationStage)),
            ],
        }];
        assert_eq!(validate_pipeline(&phases), Ok(()));
    }

    #[test]
    fn exchange_inside_optional_phase_does_not_cover_skipped_runs() {
        let phases = vec![
            Phase {
                kind: PhaseKind::PreVelocity,
                steps: vec![Step::Block(Box::new(OwnedWriter(FieldName::Thickness)))],
            },
            Phase {
                kind: PhaseKind::Velocity,
                steps: vec![Step::Exchange(FieldName::Thickness)],
            },
            Phase {
                kind: PhaseKind::PostVelocity,
                steps: vec![Step::Block(Box::new(RemapStage))],
            },
        ];
        assert!(matches!(
            validate_pipeline(&phases),
            Err(PipelineError::StaleHaloRead {
                phase: PhaseKind::PostVelocity,
                field: FieldName::Thickness,
                ..
            })
        ));
    }

    #[test]
    fn exchange_refreshes_only_its_own_field() {
        let phases = vec![Phase {
            kind: PhaseKind::PreVelocity,
            steps: vec![
                Step::Block(Box::new(OwnedWriter(FieldName::LayerThickness))),
                Step::Block(Box::new(OwnedWriter(FieldName::Thickness))),
                Step::Exchange(FieldName::Thickness),
                Step::Block(Box::new(RemapStage)),
            ],
        }];
        assert_eq!(
            validate_pipeline(&phases),
            Err(PipelineError::StaleHaloRead {
                phase: PhaseKind::PreVelocity,
                stage: "vertical_remap".to_string(),
                field: FieldName::LayerThickness,
                writer: "owned_writer".to_string(),
            })
        );
    }

    #[test]
    fn empty_and_misordered_pipelines_rejected() {
        assert_eq!(validate_pipeline(&[]), Err(PipelineError::EmptyPipeline));
        let phases = vec![
            Phase {
                kind: PhaseKind::PostVelocity,
                steps: vec![Step::Block(Box::new(UpwindStage))],
            },
            Phase {
                kind: PhaseKind::PreVelocity,
                steps: vec![Step::Block(Box::new(SurfaceStage))],
            },
        ];
        assert_eq!(
            validate_pipeline(&phases),
            Err(PipelineError::PhaseOrder {
                phase: PhaseKind::PreVelocity
            })
        );
    }
}
