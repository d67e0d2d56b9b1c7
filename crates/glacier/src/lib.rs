//! Glacier: the diagnostic-update core of a distributed-mesh ice-sheet model.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! glacier sub-crates. For most hosts, adding `glacier` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use glacier::prelude::*;
//!
//! // Every cell with ice rests on the bed.
//! struct AllGrounded;
//! impl MaskClassifier for AllGrounded {
//!     fn classify(
//!         &self,
//!         _mesh: &MeshBlock,
//!         state: &mut StateSnapshot,
//!         _config: &DiagnosticConfig,
//!     ) -> Result<(), StageError> {
//!         for (m, &h) in state.cell_mask.iter_mut().zip(&state.thickness) {
//!             *m = if h > 0.0 { Mask::GROUNDED } else { Mask::NO_ICE };
//!         }
//!         Ok(())
//!     }
//! }
//!
//! // Ice at rest.
//! struct Still;
//! impl VelocitySolver for Still {
//!     fn solve(
//!         &self,
//!         _mesh: &MeshBlock,
//!         _state: &mut StateSnapshot,
//!         _config: &DiagnosticConfig,
//!     ) -> Result<(), StageError> {
//!         Ok(())
//!     }
//! }
//! impl VelocityReconstructor for Still {
//!     fn reconstruct(&self, _mesh: &MeshBlock, _state: &mut StateSnapshot) -> Result<(), StageError> {
//!         Ok(())
//!     }
//! }
//!
//! // Two cells joined by one edge, two layers.
//! let mesh = MeshBlockBuilder::new(BlockId(0), vec![0.0, 0.0], SigmaLevels::uniform(2).unwrap())
//!     .edges(vec![[Some(0), Some(1)]])
//!     .build()
//!     .unwrap();
//! let mut block = Block::zeroed(mesh, 0);
//! {
//!     let (_, state) = block.split_mut(TimeLevel::Current);
//!     state.thickness = vec![100.0, 50.0];
//!     state.layer_thickness = vec![100.0, 0.0, 50.0, 0.0];
//! }
//! let mut domain = Domain::new(vec![block]).unwrap();
//!
//! let mut engine = DiagnosticEngine::standard(
//!     DiagnosticConfig::default(),
//!     Arc::new(AllGrounded),
//!     Arc::new(Still),
//!     Arc::new(Still),
//!     Arc::new(LocalHaloExchange::default()),
//! )
//! .unwrap();
//! let report = engine
//!     .run_diagnostics(&mut domain, TimeLevel::Current, true)
//!     .unwrap();
//! assert!(report.is_clean());
//!
//! let state = domain.blocks()[0].state(TimeLevel::Current);
//! assert_eq!(state.layer_thickness, vec![50.0, 50.0, 25.0, 25.0]);
//! assert_eq!(state.upper_surface, vec![100.0, 50.0]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `glacier-core` | IDs, field names, masks, error flags |
//! | [`mesh`] | `glacier-mesh` | Mesh blocks and sigma levels |
//! | [`state`] | `glacier-state` | Snapshots and the current/next pair |
//! | [`diag`] | `glacier-diag` | Diagnostic stages, collaborator traits, pipeline validation |
//! | [`engine`] | `glacier-engine` | Orchestrator, domain and halo exchange |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and identifiers (`glacier-core`).
pub use glacier_core as types;

/// Mesh geometry (`glacier-mesh`).
///
/// [`mesh::MeshBlock`] is immutable once built with
/// [`mesh::MeshBlockBuilder`].
pub use glacier_mesh as mesh;

/// Evolving state (`glacier-state`).
pub use glacier_state as state;

/// Diagnostic stages and pipeline validation (`glacier-diag`).
///
/// The built-in stages live in [`diag::remap`], [`diag::surface`],
/// [`diag::vertex`] and [`diag::upwind`]; host collaborators plug in through
/// the traits in [`diag::external`].
pub use glacier_diag as diag;

/// Orchestration (`glacier-engine`).
///
/// [`engine::DiagnosticEngine::run_diagnostics`] is the single entry point
/// per time step.
pub use glacier_engine as engine;

/// Common imports for hosting the diagnostic core.
///
/// ```rust
/// use glacier::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use glacier_core::{
        BlockId, ElementKind, ErrorFlags, FieldName, FieldSet, GeometryViolation, Mask,
        StageError, TimeLevel,
    };

    // Geometry and state
    pub use glacier_mesh::{MeshBlock, MeshBlockBuilder, SigmaLevels};
    pub use glacier_state::{SnapshotPair, StateSnapshot};

    // Stages and collaborators
    pub use glacier_diag::{
        AdvectionScheme, BlockStage, DiagnosticConfig, MaskClassifier, Phase, PhaseKind,
        StageContext, Step, VelocityReconstructor, VelocitySolver,
    };

    // Engine
    pub use glacier_engine::{
        Block, DiagnosticEngine, DiagnosticError, DiagnosticReport, Domain, GhostLink,
        HaloExchange, LocalHaloExchange,
    };
}
