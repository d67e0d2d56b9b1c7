//! Engine construction and run errors.

use std::error::Error;
use std::fmt;

use glacier_core::{BlockId, FieldName};
use glacier_diag::{ConfigError, PhaseKind, PipelineError};
use glacier_state::StateError;

use crate::exchange::ExchangeError;
use crate::report::DiagnosticReport;

/// Errors from [`DiagnosticEngine::new`](crate::DiagnosticEngine::new).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Configuration failed validation.
    Config(ConfigError),
    /// Phase layout failed validation.
    Pipeline(PipelineError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Pipeline(e) => write!(f, "invalid pipeline: {e}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Pipeline(e) => Some(e),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PipelineError> for EngineError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

/// Errors from [`run_diagnostics`](crate::DiagnosticEngine::run_diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticError {
    /// The run completed but raised error flags. The caller is expected
    /// to abort the simulation.
    AbortRequested(Box<DiagnosticReport>),
    /// A halo exchange failed; the run stopped at that step.
    Exchange {
        /// Phase in progress.
        phase: PhaseKind,
        /// Field being exchanged.
        field: FieldName,
        /// Transport error.
        source: ExchangeError,
    },
    /// A block's state no longer matches its mesh.
    Shape {
        /// The offending block.
        block: BlockId,
        /// Details.
        source: StateError,
    },
}

impl DiagnosticError {
    /// The report carried by an abort request.
    pub fn report(&self) -> Option<&DiagnosticReport> {
        match self {
            Self::AbortRequested(report) => Some(report),
            _ => None,
        }
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbortRequested(report) => {
                write!(f, "diagnostics raised error flags {}", report.flags)
            }
            Self::Exchange {
                phase,
                field,
                source,
            } => write!(f, "halo exchange of {field} failed in {phase} phase: {source}"),
            Self::Shape { block, source } => write!(f, "block {block}: {source}"),
        }
    }
}

impl Error for DiagnosticError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AbortRequested(_) => None,
            Self::Exchange { source, .. } => Some(source),
            Self::Shape { source, .. } => Some(source),
        }
    }
}
