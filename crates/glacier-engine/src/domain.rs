//! The local domain: blocks owned by this process.

use std::error::Error;
use std::fmt;

use glacier_core::{BlockId, TimeLevel};
use glacier_mesh::MeshBlock;
use glacier_state::{SnapshotPair, StateError, StateSnapshot};
use indexmap::IndexSet;

/// One mesh block together with its current/next state.
#[derive(Clone, Debug)]
pub struct Block {
    mesh: MeshBlock,
    states: SnapshotPair,
}

impl Block {
    /// Pair a mesh with its states.
    ///
    /// Returns `Err(StateError)` if either snapshot does not fit the mesh.
    pub fn new(mesh: MeshBlock, states: SnapshotPair) -> Result<Self, StateError> {
        states.check_shape(&mesh)?;
        Ok(Self { mesh, states })
    }

    /// Block with zeroed state.
    pub fn zeroed(mesh: MeshBlock, tracer_count: usize) -> Self {
        let states = SnapshotPair::new(&mesh, tracer_count);
        Self { mesh, states }
    }

    /// Block identifier.
    pub fn id(&self) -> BlockId {
        self.mesh.id()
    }

    /// Mesh geometry.
    pub fn mesh(&self) -> &MeshBlock {
        &self.mesh
    }

    /// Both time levels.
    pub fn states(&self) -> &SnapshotPair {
        &self.states
    }

    /// Both time levels, mutably.
    pub fn states_mut(&mut self) -> &mut SnapshotPair {
        &mut self.states
    }

    /// State at one time level.
    pub fn state(&self, level: TimeLevel) -> &StateSnapshot {
        self.states.get(level)
    }

    /// Mesh and the mutable state at one time level.
    pub fn split_mut(&mut self, level: TimeLevel) -> (&MeshBlock, &mut StateSnapshot) {
        (&self.mesh, self.states.get_mut(level))
    }
}

/// Errors from [`Domain::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// Two blocks share an identifier.
    DuplicateBlock {
        /// The repeated identifier.
        id: BlockId,
    },
    /// A block's layer or tracer count differs from the first block's.
    ShapeMismatch {
        /// The mismatched block.
        id: BlockId,
        /// Layers on the first block.
        expected_levels: usize,
        /// Layers on this block.
        levels: usize,
        /// Tracers on the first block.
        expected_tracers: usize,
        /// Tracers on this block.
        tracers: usize,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBlock { id } => write!(f, "block {id} appears more than once"),
            Self::ShapeMismatch {
                id,
                expected_levels,
                levels,
                expected_tracers,
                tracers,
            } => write!(
                f,
                "block {id} has {levels} layers and {tracers} tracers, \
                 expected {expected_levels} and {expected_tracers}"
            ),
        }
    }
}

impl Error for DomainError {}

/// All blocks owned by this process, exclusively owned by the caller.
#[derive(Clone, Debug, Default)]
pub struct Domain {
    blocks: Vec<Block>,
}

impl Domain {
    /// Build a domain from blocks with distinct identifiers.
    ///
    /// Every block, at both time levels, must carry the same layer and
    /// tracer counts as the first block.
    pub fn new(blocks: Vec<Block>) -> Result<Self, DomainError> {
        let mut seen = IndexSet::with_capacity(blocks.len());
        let expected = blocks.first().map(|b| {
            (
                b.mesh().vert_level_count(),
                b.state(TimeLevel::Current).tracer_count(),
            )
        });
        for block in &blocks {
            if !seen.insert(block.id()) {
                return Err(DomainError::DuplicateBlock { id: block.id() });
            }
            if let Some((expected_levels, expected_tracers)) = expected {
                let levels = block.mesh().vert_level_count();
                for level in [TimeLevel::Current, TimeLevel::Next] {
                    let tracers = block.state(level).tracer_count();
                    if levels != expected_levels || tracers != expected_tracers {
                        return Err(DomainError::ShapeMismatch {
                            id: block.id(),
                            expected_levels,
                            levels,
                            expected_tracers,
                            tracers,
                        });
                    }
                }
            }
        }
        Ok(Self { blocks })
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the domain has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in construction order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable blocks in construction order.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Look up a block by identifier.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    /// Look up a block mutably by identifier.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    /// Swap current and next on every block.
    pub fn advance(&mut self) {
        for block in &mut self.blocks {
            block.states.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacier_mesh::{MeshBlockBuilder, SigmaLevels};

    fn mesh(id: u32) -> MeshBlock {
        layered_mesh(id, 1)
    }

    fn layered_mesh(id: u32, levels: usize) -> MeshBlock {
        MeshBlockBuilder::new(BlockId(id), vec![0.0; 2], SigmaLevels::uniform(levels).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = Domain::new(vec![Block::zeroed(mesh(1), 0), Block::zeroed(mesh(1), 0)])
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateBlock { id: BlockId(1) });
    }

    #[test]
    fn mismatched_layer_counts_rejected() {
        let err = Domain::new(vec![
            Block::zeroed(layered_mesh(0, 1), 0),
            Block::zeroed(layered_mesh(1, 2), 0),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::ShapeMismatch {
                id: BlockId(1),
                expected_levels: 1,
                levels: 2,
                expected_tracers: 0,
                tracers: 0,
            }
        );
    }

    #[test]
    fn mismatched_tracer_counts_rejected() {
        let err = Domain::new(vec![Block::zeroed(mesh(0), 2), Block::zeroed(mesh(1), 3)])
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::ShapeMismatch {
                id: BlockId(1),
                expected_tracers: 2,
                tracers: 3,
                ..
            }
        ));
    }

    #[test]
    fn lookup_and_advance() {
        let mut d = Domain::new(vec![Block::zeroed(mesh(0), 0), Block::zeroed(mesh(7), 0)])
            .unwrap();
        assert_eq!(d.len(), 2);
        let b = d.block_mut(BlockId(7)).unwrap();
        b.split_mut(TimeLevel::Next).1.thickness[0] = 4.0;
        d.advance();
        assert_eq!(d.block(BlockId(7)).unwrap().state(TimeLevel::Current).thickness[0], 4.0);
        assert!(d.block(BlockId(3)).is_none());
    }

    #[test]
    fn block_rejects_mismatched_state() {
        let m = mesh(0);
        let other = MeshBlockBuilder::new(BlockId(0), vec![0.0; 5], SigmaLevels::uniform(1).unwrap())
            .build()
            .unwrap();
        let pair = SnapshotPair::new(&other, 0);
        assert!(Block::new(m, pair).is_err());
    }
}
