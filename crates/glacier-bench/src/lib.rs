//! Benchmark profiles for the glacier diagnostic core.
//!
//! Provides pre-built domains for Criterion benchmarks: a single large
//! block for the column kernels and a partitioned strip for full runs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use glacier_core::{BlockId, TimeLevel};
use glacier_engine::Block;
use glacier_mesh::{MeshBlockBuilder, SigmaLevels};
use glacier_test_utils::fixtures::{Strip, StripBuilder};

/// Cells in the reference block.
pub const REFERENCE_CELLS: usize = 40_000;

/// Layers in every profile.
pub const REFERENCE_LEVELS: usize = 10;

/// Tracers in every profile.
pub const REFERENCE_TRACERS: usize = 3;

/// Deterministic pseudo-random value in `[0, 1)` for slot `i`.
pub fn jitter(seed: u64, i: usize) -> f64 {
    let x = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add((i as u64).wrapping_mul(1442695040888963407));
    (x >> 11) as f64 / (1u64 << 53) as f64
}

/// Fill thickness, uneven layers and tracers for every local cell.
///
/// Roughly one cell in eight is left ice-free.
pub fn fill_columns(
    state: &mut glacier_state::StateSnapshot,
    cells: impl Iterator<Item = (usize, usize)>,
    levels: usize,
    seed: u64,
) {
    for (global, local) in cells {
        if jitter(seed, global) < 0.125 {
            continue;
        }
        let mut h = 0.0;
        for k in 0..levels {
            let lt = 10.0 + 90.0 * jitter(seed ^ 0x5eed, global * levels + k);
            state.layer_thickness[local * levels + k] = lt;
            h += lt;
            for t in 0..state.tracer_count() {
                state
                    .tracers
                    .set(t, k, local, 250.0 + 20.0 * jitter(seed + t as u64, k));
            }
        }
        state.thickness[local] = h;
        state.cell_mask[local] = glacier_core::Mask::GROUNDED;
    }
}

/// One halo-free block of [`REFERENCE_CELLS`] columns joined in a line.
pub fn reference_block(seed: u64) -> Block {
    let n = REFERENCE_CELLS;
    let edges = (0..n - 1).map(|c| [Some(c), Some(c + 1)]).collect();
    let mesh = MeshBlockBuilder::new(
        BlockId(0),
        vec![0.0; n],
        SigmaLevels::uniform(REFERENCE_LEVELS).unwrap(),
    )
    .edges(edges)
    .build()
    .unwrap();
    let mut block = Block::zeroed(mesh, REFERENCE_TRACERS);
    let (_, state) = block.split_mut(TimeLevel::Current);
    fill_columns(state, (0..n).map(|c| (c, c)), REFERENCE_LEVELS, seed);
    for (i, v) in state.normal_velocity.iter_mut().enumerate() {
        *v = jitter(seed, i) - 0.5;
    }
    block
}

/// A strip of `cells` columns split over `blocks` blocks.
pub fn reference_strip(cells: usize, blocks: usize, seed: u64) -> Strip {
    let mut strip = StripBuilder::new(cells, blocks)
        .levels(REFERENCE_LEVELS)
        .tracers(REFERENCE_TRACERS)
        .build();
    let globals = strip.cell_globals.clone();
    for (b, block) in strip.domain.blocks_mut().iter_mut().enumerate() {
        let (_, state) = block.split_mut(TimeLevel::Current);
        fill_columns(
            state,
            globals[b].iter().copied().enumerate().map(|(l, g)| (g, l)),
            REFERENCE_LEVELS,
            seed,
        );
    }
    strip
}
