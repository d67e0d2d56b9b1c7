//! Current/next snapshot pair with an O(1) swap.
//!
//! A block keeps two [`StateSnapshot`]s. Diagnostics run against either
//! time level; once the outer time stepper has filled `Next`, it calls
//! [`SnapshotPair::advance`] so that `Next` becomes `Current` and the old
//! `Current` buffers are reused for the following step.

use glacier_core::TimeLevel;
use glacier_mesh::MeshBlock;

use crate::error::StateError;
use crate::snapshot::StateSnapshot;

/// Two snapshots of one block addressed by [`TimeLevel`].
///
/// # Layout
///
/// ```text
/// slots[0]  ←─── current (even generations) / next (odd)
/// slots[1]  ←─── next (even generations) / current (odd)
/// ```
#[derive(Clone, Debug)]
pub struct SnapshotPair {
    slots: [StateSnapshot; 2],
    next_is_zero: bool,
    generation: u64,
}

impl SnapshotPair {
    /// Allocate both time levels for `mesh`.
    pub fn new(mesh: &MeshBlock, tracer_count: usize) -> Self {
        let s = StateSnapshot::new(mesh, tracer_count);
        Self {
            slots: [s.clone(), s],
            next_is_zero: false,
            generation: 0,
        }
    }

    /// Build a pair from an initial current state; `Next` starts as a copy.
    ///
    /// Returns `Err(StateError)` if `current` does not fit `mesh`.
    pub fn from_current(mesh: &MeshBlock, current: StateSnapshot) -> Result<Self, StateError> {
        current.check_shape(mesh)?;
        Ok(Self {
            slots: [current.clone(), current],
            next_is_zero: false,
            generation: 0,
        })
    }

    fn slot(&self, level: TimeLevel) -> usize {
        let next = usize::from(!self.next_is_zero);
        match level {
            TimeLevel::Current => 1 - next,
            TimeLevel::Next => next,
        }
    }

    /// Snapshot at `level`.
    pub fn get(&self, level: TimeLevel) -> &StateSnapshot {
        &self.slots[self.slot(level)]
    }

    /// Mutable snapshot at `level`.
    pub fn get_mut(&mut self, level: TimeLevel) -> &mut StateSnapshot {
        let i = self.slot(level);
        &mut self.slots[i]
    }

    /// Shorthand for `get(TimeLevel::Current)`.
    pub fn current(&self) -> &StateSnapshot {
        self.get(TimeLevel::Current)
    }

    /// Shorthand for `get(TimeLevel::Next)`.
    pub fn next(&self) -> &StateSnapshot {
        self.get(TimeLevel::Next)
    }

    /// Swap roles: `Next` becomes `Current`.
    pub fn advance(&mut self) {
        self.next_is_zero = !self.next_is_zero;
        self.generation += 1;
    }

    /// Number of completed [`advance`](Self::advance) calls.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check both snapshots against the mesh.
    pub fn check_shape(&self, mesh: &MeshBlock) -> Result<(), StateError> {
        self.slots[0].check_shape(mesh)?;
        self.slots[1].check_shape(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacier_core::BlockId;
    use glacier_mesh::{MeshBlockBuilder, SigmaLevels};
    use proptest::prelude::*;

    fn mesh() -> MeshBlock {
        MeshBlockBuilder::new(BlockId(0), vec![0.0; 2], SigmaLevels::uniform(2).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn levels_are_distinct() {
        let m = mesh();
        let mut pair = SnapshotPair::new(&m, 0);
        pair.get_mut(TimeLevel::Next).thickness[0] = 5.0;
        assert_eq!(pair.current().thickness[0], 0.0);
        assert_eq!(pair.next().thickness[0], 5.0);
    }

    #[test]
    fn advance_swaps_roles() {
        let m = mesh();
        let mut pair = SnapshotPair::new(&m, 0);
        pair.get_mut(TimeLevel::Next).thickness[1] = 3.0;
        pair.advance();
        assert_eq!(pair.current().thickness[1], 3.0);
        assert_eq!(pair.next().thickness[1], 0.0);
        assert_eq!(pair.generation(), 1);
        pair.advance();
        assert_eq!(pair.next().thickness[1], 3.0);
    }

    #[test]
    fn from_current_rejects_wrong_shape() {
        let m = mesh();
        let mut s = StateSnapshot::new(&m, 0);
        s.thickness.push(1.0);
        assert!(SnapshotPair::from_current(&m, s).is_err());
    }

    proptest! {
        #[test]
        fn value_written_to_next_surfaces_after_odd_advances(n in 1u64..40) {
            let m = mesh();
            let mut pair = SnapshotPair::new(&m, 0);
            pair.get_mut(TimeLevel::Next).thickness[0] = 9.0;
            for _ in 0..n {
                pair.advance();
            }
            prop_assert_eq!(pair.generation(), n);
            let expected = if n % 2 == 1 { 9.0 } else { 0.0 };
            prop_assert_eq!(pair.current().thickness[0], expected);
        }
    }
}
