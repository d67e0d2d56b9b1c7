//! Diagnostic orchestration for the glacier ice-sheet core.
//!
//! Provides the [`DiagnosticEngine`] that runs the diagnostic phases over
//! every block of a [`Domain`], interleaving block-parallel stages with
//! halo exchanges, and aggregates error flags into a
//! [`DiagnosticReport`]. A non-empty flag set is returned to the caller as
//! an abort request; the engine never stops the process itself.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod exchange;
pub mod metrics;
pub mod orchestrator;
pub mod report;

pub use domain::{Block, Domain, DomainError};
pub use error::{DiagnosticError, EngineError};
pub use exchange::{ExchangeError, GhostLink, HaloExchange, LocalHaloExchange};
pub use metrics::DiagnosticMetrics;
pub use orchestrator::{DiagnosticEngine, PhaseState};
pub use report::{DiagnosticReport, StageFailure};

pub use glacier_diag::{AdvectionScheme, ConfigError, DiagnosticConfig};
