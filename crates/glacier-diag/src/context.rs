//! Execution context passed to stages for one block.
//!
//! [`StageContext`] bundles the read-only mesh and configuration with
//! mutable access to the selected time level's [`StateSnapshot`] and the
//! block's [`BlockOutcome`] side channel.

use glacier_core::{BlockId, ErrorFlags, GeometryViolation, StageError};
use glacier_mesh::MeshBlock;
use glacier_state::StateSnapshot;

use crate::config::DiagnosticConfig;

/// Everything one block accumulated while running stages.
///
/// The engine keeps one outcome per block per run and ORs them together
/// when the run is done.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockOutcome {
    /// Error flags raised on this block.
    pub flags: ErrorFlags,
    /// Cells whose lower surface was found below the bed.
    pub violations: Vec<GeometryViolation>,
    /// Stage failures as `(stage name, error)`.
    pub failures: Vec<(String, StageError)>,
    /// Vertices interpolated with the zero-area fallback.
    pub degenerate_vertices: usize,
}

impl BlockOutcome {
    /// Fold another outcome into this one.
    pub fn merge(&mut self, other: BlockOutcome) {
        self.flags |= other.flags;
        self.violations.extend(other.violations);
        self.failures.extend(other.failures);
        self.degenerate_vertices += other.degenerate_vertices;
    }
}

/// Context handed to [`BlockStage::run`](crate::BlockStage::run).
pub struct StageContext<'a> {
    mesh: &'a MeshBlock,
    state: &'a mut StateSnapshot,
    config: &'a DiagnosticConfig,
    outcome: &'a mut BlockOutcome,
}

impl<'a> StageContext<'a> {
    /// Construct a stage context.
    ///
    /// Typically called by the engine. Tests build one directly around a
    /// fixture mesh and snapshot.
    pub fn new(
        mesh: &'a MeshBlock,
        state: &'a mut StateSnapshot,
        config: &'a DiagnosticConfig,
        outcome: &'a mut BlockOutcome,
    ) -> Self {
        Self {
            mesh,
            state,
            config,
            outcome,
        }
    }

    /// Block being processed.
    pub fn block(&self) -> BlockId {
        self.mesh.id()
    }

    /// Mesh geometry.
    pub fn mesh(&self) -> &'a MeshBlock {
        self.mesh
    }

    /// Run configuration.
    pub fn config(&self) -> &'a DiagnosticConfig {
        self.config
    }

    /// State at the selected time level.
    pub fn state(&self) -> &StateSnapshot {
        self.state
    }

    /// Mutable state at the selected time level.
    pub fn state_mut(&mut self) -> &mut StateSnapshot {
        self.state
    }

    /// Split borrow of the snapshot together with the mesh and config.
    pub fn parts(&mut self) -> (&'a MeshBlock, &mut StateSnapshot, &'a DiagnosticConfig) {
        (self.mesh, self.state, self.config)
    }

    /// Raise an error flag for this block.
    pub fn raise(&mut self, flag: ErrorFlags) {
        self.outcome.flags |= flag;
    }

    /// Record a geometry violation and raise [`ErrorFlags::GEOMETRY`].
    pub fn record_violation(&mut self, violation: GeometryViolation) {
        self.outcome.violations.push(violation);
        self.outcome.flags |= ErrorFlags::GEOMETRY;
    }

    /// Count vertices that needed the zero-area fallback.
    pub fn note_degenerate_vertices(&mut self, count: usize) {
        self.outcome.degenerate_vertices += count;
    }

    /// Flags raised so far on this block.
    pub fn flags(&self) -> ErrorFlags {
        self.outcome.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacier_mesh::{MeshBlockBuilder, SigmaLevels};

    #[test]
    fn violations_raise_geometry_flag() {
        let mesh = MeshBlockBuilder::new(BlockId(3), vec![0.0], SigmaLevels::uniform(1).unwrap())
            .build()
            .unwrap();
        let mut state = StateSnapshot::new(&mesh, 0);
        let config = DiagnosticConfig::default();
        let mut outcome = BlockOutcome::default();
        let mut ctx = StageContext::new(&mesh, &mut state, &config, &mut outcome);
        assert_eq!(ctx.block(), BlockId(3));
        ctx.record_violation(GeometryViolation {
            block: BlockId(3),
            cell: 0,
            lower_surface: -1.0,
            bed_topography: 0.0,
        });
        ctx.raise(ErrorFlags::MASK);
        assert!(ctx.flags().contains(ErrorFlags::GEOMETRY | ErrorFlags::MASK));
        assert_eq!(outcome.violations.len(), 1);
    }

    #[test]
    fn merge_ors_flags_and_concatenates() {
        let mut a = BlockOutcome {
            flags: ErrorFlags::GEOMETRY,
            degenerate_vertices: 1,
            ..Default::default()
        };
        let b = BlockOutcome {
            flags: ErrorFlags::VELOCITY,
            failures: vec![(
                "solve".to_string(),
                StageError::ExecutionFailed {
                    reason: "diverged".to_string(),
                },
            )],
            degenerate_vertices: 2,
            ..Default::default()
        };
        a.merge(b);
        assert_eq!(a.flags, ErrorFlags::GEOMETRY | ErrorFlags::VELOCITY);
        assert_eq!(a.failures.len(), 1);
        assert_eq!(a.degenerate_vertices, 3);
    }
}
