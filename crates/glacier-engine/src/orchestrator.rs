//! The diagnostic engine: runs phases over a domain.
//!
//! # State machine
//!
//! ```text
//! PreVelocity ──► Velocity ──► PostVelocity ──► Done
//!      │             ▲
//!      └─────────────┘ skipped unless a velocity solve is requested
//! ```
//!
//! Within a phase, each block step runs on all blocks in parallel and
//! finishes on every block before the next step starts. Exchange steps
//! run on the calling thread. Stage errors are recorded per block and
//! never stop other blocks; exchange errors end the run.

use std::sync::Arc;
use std::time::Instant;

use glacier_core::TimeLevel;
use glacier_diag::{
    standard_phases, validate_pipeline, BlockOutcome, BlockStage, DiagnosticConfig,
    MaskClassifier, Phase, PhaseKind, StageContext, Step, VelocityReconstructor,
    VelocitySolver,
};
use log::{debug, error};
use rayon::prelude::*;

use crate::domain::Domain;
use crate::error::{DiagnosticError, EngineError};
use crate::exchange::HaloExchange;
use crate::metrics::DiagnosticMetrics;
use crate::report::{DiagnosticReport, StageFailure};

/// Where a run currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseState {
    /// Running the pre-velocity phase.
    PreVelocity,
    /// Running the velocity phase.
    Velocity,
    /// Running the post-velocity phase.
    PostVelocity,
    /// All phases finished.
    Done,
}

impl PhaseState {
    /// State after this one.
    pub fn next(self, solve_velocity: bool) -> Self {
        match self {
            Self::PreVelocity if solve_velocity => Self::Velocity,
            Self::PreVelocity | Self::Velocity => Self::PostVelocity,
            Self::PostVelocity | Self::Done => Self::Done,
        }
    }

    /// Phase executed in this state, if any.
    pub fn phase(self) -> Option<PhaseKind> {
        match self {
            Self::PreVelocity => Some(PhaseKind::PreVelocity),
            Self::Velocity => Some(PhaseKind::Velocity),
            Self::PostVelocity => Some(PhaseKind::PostVelocity),
            Self::Done => None,
        }
    }
}

/// Runs the diagnostic phases over a [`Domain`].
///
/// Built once with a validated configuration and phase layout, then
/// called once per time step.
pub struct DiagnosticEngine {
    config: DiagnosticConfig,
    phases: Vec<Phase>,
    exchanger: Arc<dyn HaloExchange>,
    last_metrics: DiagnosticMetrics,
}

impl DiagnosticEngine {
    /// Build an engine from an explicit phase layout.
    ///
    /// Returns `Err` if the configuration is invalid or a stage would read
    /// a stale halo.
    pub fn new(
        config: DiagnosticConfig,
        phases: Vec<Phase>,
        exchanger: Arc<dyn HaloExchange>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        validate_pipeline(&phases)?;
        Ok(Self {
            config,
            phases,
            exchanger,
            last_metrics: DiagnosticMetrics::default(),
        })
    }

    /// Build an engine with the standard phase layout.
    pub fn standard(
        config: DiagnosticConfig,
        classifier: Arc<dyn MaskClassifier>,
        solver: Arc<dyn VelocitySolver>,
        reconstructor: Arc<dyn VelocityReconstructor>,
        exchanger: Arc<dyn HaloExchange>,
    ) -> Result<Self, EngineError> {
        let phases = standard_phases(classifier, solver, reconstructor);
        Self::new(config, phases, exchanger)
    }

    /// Run configuration.
    pub fn config(&self) -> &DiagnosticConfig {
        &self.config
    }

    /// Phase layout.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Timing of the most recent run.
    pub fn last_metrics(&self) -> &DiagnosticMetrics {
        &self.last_metrics
    }

    /// Recompute every diagnostic field of `domain` at `level`.
    ///
    /// Returns the report when no flag was raised. A non-empty flag set
    /// comes back as [`DiagnosticError::AbortRequested`] carrying the full
    /// report; the caller decides how to stop.
    pub fn run_diagnostics(
        &mut self,
        domain: &mut Domain,
        level: TimeLevel,
        solve_velocity: bool,
    ) -> Result<DiagnosticReport, DiagnosticError> {
        let run_start = Instant::now();

        for block in domain.blocks() {
            block
                .state(level)
                .check_shape(block.mesh())
                .map_err(|source| DiagnosticError::Shape {
                    block: block.id(),
                    source,
                })?;
        }

        let mut outcomes = vec![BlockOutcome::default(); domain.len()];
        let mut metrics = DiagnosticMetrics {
            block_count: domain.len(),
            ..Default::default()
        };
        let mut phases_run = Vec::new();

        let mut state = PhaseState::PreVelocity;
        while let Some(kind) = state.phase() {
            if let Some(phase) = self.phases.iter().find(|p| p.kind == kind) {
                debug!("{kind} phase on {} blocks at {level} level", domain.len());
                self.run_phase(phase, domain, level, &mut outcomes, &mut metrics)?;
                phases_run.push(kind);
            }
            state = state.next(solve_velocity);
        }

        let mut report = DiagnosticReport {
            phases: phases_run,
            ..Default::default()
        };
        for (block, outcome) in domain.blocks().iter().zip(outcomes) {
            report.flags |= outcome.flags;
            report.violations.extend(outcome.violations);
            report.degenerate_vertices += outcome.degenerate_vertices;
            report
                .failures
                .extend(outcome.failures.into_iter().map(|(stage, error)| StageFailure {
                    block: block.id(),
                    stage,
                    error,
                }));
        }
        metrics.total_us = run_start.elapsed().as_micros() as u64;
        report.metrics = metrics.clone();
        self.last_metrics = metrics;

        if report.flags.is_empty() {
            Ok(report)
        } else {
            error!(
                "diagnostics raised {} ({} violations, {} stage failures); requesting abort",
                report.flags,
                report.violations.len(),
                report.failures.len()
            );
            Err(DiagnosticError::AbortRequested(Box::new(report)))
        }
    }

    fn run_phase(
        &self,
        phase: &Phase,
        domain: &mut Domain,
        level: TimeLevel,
        outcomes: &mut [BlockOutcome],
        metrics: &mut DiagnosticMetrics,
    ) -> Result<(), DiagnosticError> {
        for step in &phase.steps {
            let step_start = Instant::now();
            match step {
                Step::Block(stage) => self.run_stage(stage.as_ref(), domain, level, outcomes),
                Step::Exchange(field) => {
                    self.exchanger
                        .exchange(domain.blocks_mut(), *field, level)
                        .map_err(|source| {
                            error!("halo exchange of {field} failed: {source}");
                            DiagnosticError::Exchange {
                                phase: phase.kind,
                                field: *field,
                                source,
                            }
                        })?;
                }
            }
            let us = step_start.elapsed().as_micros() as u64;
            if matches!(step, Step::Exchange(_)) {
                metrics.exchange_us += us;
            }
            metrics.step_us.push((step.label(), us));
        }
        Ok(())
    }

    fn run_stage(
        &self,
        stage: &dyn BlockStage,
        domain: &mut Domain,
        level: TimeLevel,
        outcomes: &mut [BlockOutcome],
    ) {
        let config = &self.config;
        domain
            .blocks_mut()
            .par_iter_mut()
            .zip(outcomes.par_iter_mut())
            .for_each(|(block, outcome)| {
                let id = block.id();
                let (mesh, state) = block.split_mut(level);
                let mut ctx = StageContext::new(mesh, state, config, outcome);
                if let Err(e) = stage.run(&mut ctx) {
                    error!("stage '{}' failed on block {id}: {e}", stage.name());
                    outcome.flags |= stage.failure_flag();
                    outcome.failures.push((stage.name().to_string(), e));
                }
            });
    }
}

impl std::fmt::Debug for DiagnosticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticEngine")
            .field("config", &self.config)
            .field("phases", &self.phases)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_with_velocity() {
        let mut s = PhaseState::PreVelocity;
        let mut seen = Vec::new();
        while let Some(kind) = s.phase() {
            seen.push(kind);
            s = s.next(true);
        }
        assert_eq!(
            seen,
            vec![
                PhaseKind::PreVelocity,
                PhaseKind::Velocity,
                PhaseKind::PostVelocity
            ]
        );
        assert_eq!(s, PhaseState::Done);
    }

    #[test]
    fn state_machine_skips_velocity() {
        assert_eq!(PhaseState::PreVelocity.next(false), PhaseState::PostVelocity);
        assert_eq!(PhaseState::PostVelocity.next(true), PhaseState::Done);
        assert_eq!(PhaseState::Done.next(true), PhaseState::Done);
    }
}
