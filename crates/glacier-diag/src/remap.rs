//! Conservative vertical remapping onto the mesh sigma levels.
//!
//! After thickness and tracers have been advanced, each column's layers no
//! longer sit at the fixed sigma fractions. [`remap_column`] rebuilds the
//! layers at the target fractions and redistributes tracer content by
//! linear overlap between old and new layers, so that column mass and
//! tracer content are conserved.
//!
//! Sigma runs from 0 at the upper surface to 1 at the bed; layer 0 is the
//! top layer.

use glacier_core::{FieldName, FieldSet, Mask, StageError};
use glacier_mesh::{MeshBlock, SigmaLevels};
use glacier_state::StateSnapshot;
use rayon::prelude::*;
use smallvec::smallvec;

use crate::context::StageContext;
use crate::stage::{BlockStage, Coverage, StageWrites};

/// Regularisation added to thickness before dividing by it.
pub const THICKNESS_EPSILON: f64 = 1.0e-30;

/// Per-worker scratch reused across columns.
#[derive(Clone, Debug)]
pub struct ColumnScratch {
    source_interfaces: Vec<f64>,
    accumulated: Vec<f64>,
}

impl ColumnScratch {
    /// Scratch sized for `level_count` layers and `tracer_count` tracers.
    pub fn new(level_count: usize, tracer_count: usize) -> Self {
        Self {
            source_interfaces: vec![0.0; level_count + 1],
            accumulated: vec![0.0; level_count * tracer_count],
        }
    }

    fn fit(&mut self, level_count: usize, tracer_count: usize) {
        self.source_interfaces.resize(level_count + 1, 0.0);
        self.accumulated.resize(level_count * tracer_count, 0.0);
    }
}

/// Remap one column in place.
///
/// `layer_thickness` holds one value per layer. `tracers` is the column's
/// tracer slice, layer-major (`k * tracer_count + t`). `ice_indicator` is
/// 1.0 for ice-covered cells and 0.0 otherwise; the outputs are multiplied
/// by it.
///
/// Inputs are not validated. A column of zero thickness comes out as
/// exact zeros whatever its indicator, and layers whose new thickness is
/// exactly zero get tracer value 0.
///
/// # Examples
///
/// ```
/// use glacier_diag::remap::{remap_column, ColumnScratch};
/// use glacier_mesh::SigmaLevels;
///
/// let sigma = SigmaLevels::uniform(2).unwrap();
/// let mut lt = [3.0, 1.0];
/// let mut tr = [10.0, 10.0];
/// let mut scratch = ColumnScratch::new(2, 1);
/// remap_column(4.0, &mut lt, &mut tr, 1, &sigma, 1.0, &mut scratch);
/// assert_eq!(lt, [2.0, 2.0]);
/// assert_eq!(tr, [10.0, 10.0]);
/// ```
pub fn remap_column(
    thickness: f64,
    layer_thickness: &mut [f64],
    tracers: &mut [f64],
    tracer_count: usize,
    sigma: &SigmaLevels,
    ice_indicator: f64,
    scratch: &mut ColumnScratch,
) {
    if thickness == 0.0 {
        layer_thickness.fill(0.0);
        tracers.fill(0.0);
        return;
    }

    let levels = sigma.level_count();
    scratch.fit(levels, tracer_count);
    let h_eps = thickness + THICKNESS_EPSILON;

    // Source interfaces from the current layers.
    let s = &mut scratch.source_interfaces;
    s[0] = 0.0;
    for k in 0..levels {
        s[k + 1] = s[k] + layer_thickness[k] / h_eps;
    }
    s[levels] = 1.0;

    // Target layers; the residual goes into the top layer.
    let mut total = 0.0;
    for (lt, frac) in layer_thickness.iter_mut().zip(sigma.fractions()) {
        *lt = frac * h_eps;
        total += *lt;
    }
    layer_thickness[0] += thickness - total;

    let t = sigma.interfaces();
    let acc = &mut scratch.accumulated;
    acc.fill(0.0);
    if tracer_count > 0 {
        for k1 in 0..levels {
            for k2 in 0..levels {
                let overlap =
                    (s[k1 + 1].min(t[k2 + 1]) - s[k1].max(t[k2])).max(0.0) * thickness;
                if overlap == 0.0 {
                    continue;
                }
                let src = &tracers[k1 * tracer_count..(k1 + 1) * tracer_count];
                let dst = &mut acc[k2 * tracer_count..(k2 + 1) * tracer_count];
                for (a, v) in dst.iter_mut().zip(src) {
                    *a += v * overlap;
                }
            }
        }
    }

    for k in 0..levels {
        let lt = layer_thickness[k];
        let layer = &mut tracers[k * tracer_count..(k + 1) * tracer_count];
        let summed = &acc[k * tracer_count..(k + 1) * tracer_count];
        for (tr, a) in layer.iter_mut().zip(summed) {
            let value = if lt == 0.0 { 0.0 } else { a / lt };
            *tr = value * ice_indicator;
        }
        layer_thickness[k] = lt * ice_indicator;
    }
}

/// Remap every column of a block, columns in parallel.
///
/// Each rayon worker allocates one [`ColumnScratch`] and reuses it for all
/// columns it processes.
pub fn remap_block(mesh: &MeshBlock, state: &mut StateSnapshot) {
    let levels = mesh.vert_level_count();
    let sigma = mesh.sigma();
    let tracer_count = state.tracer_count();
    let StateSnapshot {
        thickness,
        layer_thickness,
        tracers,
        cell_mask,
        ..
    } = state;

    let column = |scratch: &mut ColumnScratch, lt: &mut [f64], tr: &mut [f64], h: f64, m: Mask| {
        remap_column(h, lt, tr, tracer_count, sigma, m.ice_indicator(), scratch);
    };

    if tracer_count == 0 {
        layer_thickness
            .par_chunks_mut(levels)
            .zip(thickness.par_iter())
            .zip(cell_mask.par_iter())
            .for_each_init(
                || ColumnScratch::new(levels, 0),
                |scratch, ((lt, &h), &m)| column(scratch, lt, &mut [], h, m),
            );
    } else {
        let column_len = tracers.column_len();
        layer_thickness
            .par_chunks_mut(levels)
            .zip(tracers.as_mut_slice().par_chunks_mut(column_len))
            .zip(thickness.par_iter())
            .zip(cell_mask.par_iter())
            .for_each_init(
                || ColumnScratch::new(levels, tracer_count),
                |scratch, (((lt, tr), &h), &m)| column(scratch, lt, tr, h, m),
            );
    }
}

/// Pipeline stage wrapping [`remap_block`].
///
/// Runs on every column, halo included, so its inputs must be halo-valid.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemapStage;

impl BlockStage for RemapStage {
    fn name(&self) -> &str {
        "vertical_remap"
    }

    fn reads(&self) -> FieldSet {
        [
            FieldName::Thickness,
            FieldName::LayerThickness,
            FieldName::Tracers,
            FieldName::CellMask,
        ]
        .into_iter()
        .collect()
    }

    fn reads_halo(&self) -> FieldSet {
        self.reads()
    }

    fn writes(&self) -> StageWrites {
        smallvec![
            (FieldName::LayerThickness, Coverage::All),
            (FieldName::Tracers, Coverage::All),
        ]
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let (mesh, state, _) = ctx.parts();
        remap_block(mesh, state);
        Ok(())
    }
}
