//! Kite-area interpolation of cell-centred scalars onto vertices.

use glacier_core::{FieldName, FieldSet, StageError};
use glacier_mesh::MeshBlock;
use log::debug;
use smallvec::smallvec;

use crate::context::StageContext;
use crate::stage::{BlockStage, Coverage, StageWrites};

/// Interpolate `field` (one value per cell) onto every vertex of `mesh`.
///
/// For incident cells `c_i` with kite areas `a_i` the weight of `c_i` is
/// `Σ_{j≠i} 0.5·a_j` and the result is `Σ weight(c_i)·field(c_i) / Σ a_i`.
/// Incident cells outside the block add their area to the denominator but
/// no value to the numerator.
///
/// A vertex whose kite areas sum to zero gets the plain mean of its
/// in-block cells (0.0 if it has none). Returns the number of such
/// vertices.
pub fn interpolate_cell_to_vertex(mesh: &MeshBlock, field: &[f64], out: &mut [f64]) -> usize {
    let mut degenerate = 0;
    for (v, slot) in out.iter_mut().enumerate().take(mesh.vertex_count()) {
        let cells = mesh.cells_on_vertex(v);
        let areas = mesh.kite_areas_on_vertex(v);
        let total: f64 = areas.iter().sum();

        if total > 0.0 {
            let mut acc = 0.0;
            for (i, cell) in cells.iter().enumerate() {
                let Some(c) = *cell else { continue };
                let others: f64 = areas
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, a)| 0.5 * a)
                    .sum();
                acc += others * field[c];
            }
            *slot = acc / total;
        } else {
            degenerate += 1;
            let (sum, n) = cells
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, n), &c| (s + field[c], n + 1));
            *slot = if n == 0 { 0.0 } else { sum / n as f64 };
        }
    }
    degenerate
}

/// Pipeline stage producing `thickness_vertex` and `upper_surface_vertex`.
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexInterpolationStage;

impl BlockStage for VertexInterpolationStage {
    fn name(&self) -> &str {
        "cell_to_vertex"
    }

    fn reads(&self) -> FieldSet {
        [FieldName::Thickness, FieldName::UpperSurface]
            .into_iter()
            .collect()
    }

    fn reads_halo(&self) -> FieldSet {
        self.reads()
    }

    fn writes(&self) -> StageWrites {
        smallvec![
            (FieldName::ThicknessVertex, Coverage::All),
            (FieldName::UpperSurfaceVertex, Coverage::All),
        ]
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let (mesh, state, _) = ctx.parts();
        let degenerate =
            interpolate_cell_to_vertex(mesh, &state.thickness, &mut state.thickness_vertex);
        interpolate_cell_to_vertex(
            mesh,
            &state.upper_surface,
            &mut state.upper_surface_vertex,
        );
        if degenerate > 0 {
            debug!(
                "block {}: {degenerate} vertices with zero kite area, used uniform mean",
                mesh.id()
            );
            ctx.note_degenerate_vertices(degenerate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacier_core::BlockId;
    use glacier_mesh::{MeshBlockBuilder, SigmaLevels};
    use proptest::prelude::*;

    fn mesh(cells: Vec<Option<usize>>, areas: Vec<f64>) -> MeshBlock {
        MeshBlockBuilder::new(BlockId(0), vec![0.0; 3], SigmaLevels::uniform(1).unwrap())
            .vertices(3, cells, areas)
            .build()
            .unwrap()
    }

    #[test]
    fn equal_kites_give_the_mean() {
        let m = mesh(vec![Some(0), Some(1), Some(2)], vec![1.0, 1.0, 1.0]);
        let mut out = [0.0];
        let n = interpolate_cell_to_vertex(&m, &[3.0, 6.0, 9.0], &mut out);
        assert_eq!(n, 0);
        assert!((out[0] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn weights_follow_opposite_kites() {
        // weights: 0.5*(2+3)=2.5, 0.5*(1+3)=2, 0.5*(1+2)=1.5; total area 6.
        let m = mesh(vec![Some(0), Some(1), Some(2)], vec![1.0, 2.0, 3.0]);
        let mut out = [0.0];
        interpolate_cell_to_vertex(&m, &[6.0, 0.0, 0.0], &mut out);
        assert!((out[0] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn missing_cell_contributes_no_value() {
        let m = mesh(vec![Some(0), None, Some(2)], vec![1.0, 1.0, 1.0]);
        let mut out = [0.0];
        interpolate_cell_to_vertex(&m, &[3.0, 100.0, 3.0], &mut out);
        assert!((out[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_area_falls_back_to_mean() {
        let m = mesh(vec![Some(0), Some(1), None], vec![0.0, 0.0, 0.0]);
        let mut out = [f64::NAN];
        let n = interpolate_cell_to_vertex(&m, &[2.0, 4.0, 100.0], &mut out);
        assert_eq!(n, 1);
        assert_eq!(out[0], 3.0);

        let isolated = mesh(vec![None, None, None], vec![0.0, 0.0, 0.0]);
        interpolate_cell_to_vertex(&isolated, &[1.0, 1.0, 1.0], &mut out);
        assert_eq!(out[0], 0.0);
    }

    proptest! {
        #[test]
        fn constant_field_is_reproduced(
            areas in prop::collection::vec(0.0f64..10.0, 3),
            value in -1000.0f64..1000.0,
        ) {
            let m = mesh(vec![Some(0), Some(1), Some(2)], areas);
            let mut out = [0.0];
            interpolate_cell_to_vertex(&m, &[value; 3], &mut out);
            prop_assert!(out[0].is_finite());
            prop_assert!((out[0] - value).abs() <= 1e-9 * value.abs().max(1.0));
        }
    }
}
