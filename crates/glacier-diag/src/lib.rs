//! Diagnostic stages for the glacier ice-sheet core.
//!
//! This crate holds the per-block numerical kernels and the machinery that
//! lets the engine sequence them:
//!
//! - [`remap`]: conservative vertical remapping of layer thickness and
//!   tracers onto the mesh sigma levels.
//! - [`surface`]: upper/lower surface elevations from thickness, flotation
//!   and bed elevation.
//! - [`vertex`]: kite-area interpolation of cell fields onto vertices.
//! - [`upwind`]: first-order upwind layer thickness on edges.
//! - [`external`]: the collaborator traits (mask classifier, velocity
//!   solver, velocity reconstructor) and the stages that adapt them.
//! - [`pipeline`]: phases as data, the standard phase layout, and the
//!   startup check that no stage reads a stale halo.
//!
//! Every stage implements [`BlockStage`] and runs against one block at a
//! time through a [`StageContext`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod external;
pub mod pipeline;
pub mod remap;
pub mod stage;
pub mod surface;
pub mod upwind;
pub mod vertex;

pub use config::{AdvectionScheme, ConfigError, DiagnosticConfig};
pub use context::{BlockOutcome, StageContext};
pub use external::{MaskClassifier, VelocityReconstructor, VelocitySolver};
pub use pipeline::{standard_phases, validate_pipeline, Phase, PhaseKind, PipelineError, Step};
pub use stage::{BlockStage, Coverage, StageWrites};
