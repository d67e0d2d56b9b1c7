//! Per-run timing for the diagnostic engine.

/// Timing collected during one call to
/// [`run_diagnostics`](crate::DiagnosticEngine::run_diagnostics).
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticMetrics {
    /// Wall-clock time for the whole run.
    pub total_us: u64,
    /// Per-step times in execution order: `(label, microseconds)`.
    pub step_us: Vec<(String, u64)>,
    /// Time spent inside halo exchanges.
    pub exchange_us: u64,
    /// Number of blocks processed.
    pub block_count: usize,
}

impl DiagnosticMetrics {
    /// Time spent in block-parallel stages, i.e. total step time minus
    /// exchange time.
    pub fn stage_us(&self) -> u64 {
        let steps: u64 = self.step_us.iter().map(|(_, us)| us).sum();
        steps.saturating_sub(self.exchange_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = DiagnosticMetrics::default();
        assert_eq!(m.total_us, 0);
        assert!(m.step_us.is_empty());
        assert_eq!(m.stage_us(), 0);
    }

    #[test]
    fn stage_time_excludes_exchanges() {
        let m = DiagnosticMetrics {
            total_us: 100,
            step_us: vec![
                ("vertical_remap".to_string(), 40),
                ("exchange cell_mask".to_string(), 25),
            ],
            exchange_us: 25,
            block_count: 2,
        };
        assert_eq!(m.stage_us(), 40);
    }
}
