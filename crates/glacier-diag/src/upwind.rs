//! First-order upwind layer thickness on edges.

use glacier_core::{FieldName, FieldSet, StageError};
use glacier_mesh::MeshBlock;
use rayon::prelude::*;
use smallvec::smallvec;

use crate::context::StageContext;
use crate::stage::{BlockStage, Coverage, StageWrites};

/// Fill `layer_thickness_edge` from the upwind cell of each edge and layer.
///
/// With `sign = +1` for `v ≥ 0` and `-1` otherwise, the edge value is
/// `max(sign·lt(cell1), −sign·lt(cell2))`. At zero velocity the `max`
/// picks the larger of `lt(cell1)` and `−lt(cell2)`. A neighbour outside the
/// block reads as zero thickness.
pub fn upwind_edge_thickness(
    mesh: &MeshBlock,
    layer_thickness: &[f64],
    normal_velocity: &[f64],
    layer_thickness_edge: &mut [f64],
) {
    let levels = mesh.vert_level_count();
    let cell_layer = |cell: Option<usize>, k: usize| match cell {
        Some(c) => layer_thickness[c * levels + k],
        None => 0.0,
    };
    layer_thickness_edge
        .par_chunks_mut(levels)
        .zip(normal_velocity.par_chunks(levels))
        .zip(mesh.cells_on_edge().par_iter())
        .for_each(|((out, vel), &[c1, c2])| {
            for (k, (o, &v)) in out.iter_mut().zip(vel).enumerate() {
                let sign = if v >= 0.0 { 1.0 } else { -1.0 };
                *o = (sign * cell_layer(c1, k)).max(-sign * cell_layer(c2, k));
            }
        });
}

/// Pipeline stage wrapping [`upwind_edge_thickness`].
///
/// Does nothing unless the configured advection scheme is first-order
/// upwind.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpwindStage;

impl BlockStage for UpwindStage {
    fn name(&self) -> &str {
        "edge_flux_thickness"
    }

    fn reads(&self) -> FieldSet {
        [FieldName::LayerThickness, FieldName::NormalVelocity]
            .into_iter()
            .collect()
    }

    fn reads_halo(&self) -> FieldSet {
        [FieldName::LayerThickness].into_iter().collect()
    }

    fn writes(&self) -> StageWrites {
        smallvec![(FieldName::LayerThicknessEdge, Coverage::Owned)]
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let (mesh, state, config) = ctx.parts();
        if !config.advection.is_upwind() {
            return Ok(());
        }
        upwind_edge_thickness(
            mesh,
            &state.layer_thickness,
            &state.normal_velocity,
            &mut state.layer_thickness_edge,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdvectionScheme, DiagnosticConfig};
    use crate::context::BlockOutcome;
    use glacier_core::BlockId;
    use glacier_mesh::{MeshBlockBuilder, SigmaLevels};
    use glacier_state::StateSnapshot;

    fn mesh() -> MeshBlock {
        MeshBlockBuilder::new(BlockId(0), vec![0.0; 2], SigmaLevels::uniform(2).unwrap())
            .edges(vec![[Some(0), Some(1)], [Some(1), None]])
            .build()
            .unwrap()
    }

    #[test]
    fn picks_upwind_cell_per_layer() {
        let m = mesh();
        let lt = [5.0, 6.0, 1.0, 2.0];
        let vel = [1.0, -1.0, 1.0, 1.0];
        let mut out = [0.0; 4];
        upwind_edge_thickness(&m, &lt, &vel, &mut out);
        // Edge 0 layer 0 flows from cell 0, layer 1 from cell 1.
        assert_eq!(out[0], 5.0);
        assert_eq!(out[1], 2.0);
        // Edge 1 flows out of cell 1.
        assert_eq!(out[2], 1.0);
        assert_eq!(out[3], 2.0);
    }

    #[test]
    fn inflow_from_outside_block_is_zero() {
        let m = mesh();
        let lt = [5.0, 6.0, 1.0, 2.0];
        let vel = [1.0, 1.0, -3.0, -3.0];
        let mut out = [9.0; 4];
        upwind_edge_thickness(&m, &lt, &vel, &mut out);
        assert_eq!(&out[2..], &[0.0, 0.0]);
    }

    #[test]
    fn zero_velocity_resolved_by_max() {
        let m = mesh();
        let lt = [3.0, 3.0, 7.0, 7.0];
        let vel = [0.0; 4];
        let mut out = [0.0; 4];
        upwind_edge_thickness(&m, &lt, &vel, &mut out);
        assert_eq!(out[0], 3.0);
    }

    #[test]
    fn other_schemes_leave_edges_untouched() {
        let m = mesh();
        let mut s = StateSnapshot::new(&m, 0);
        s.layer_thickness = vec![5.0, 6.0, 1.0, 2.0];
        s.normal_velocity = vec![1.0; 4];
        s.layer_thickness_edge = vec![-1.0; 4];
        let cfg = DiagnosticConfig {
            advection: AdvectionScheme::from_name("fct"),
            ..Default::default()
        };
        let mut outcome = BlockOutcome::default();
        let mut ctx = StageContext::new(&m, &mut s, &cfg, &mut outcome);
        UpwindStage.run(&mut ctx).unwrap();
        assert_eq!(s.layer_thickness_edge, vec![-1.0; 4]);

        let cfg = DiagnosticConfig::default();
        let mut ctx = StageContext::new(&m, &mut s, &cfg, &mut outcome);
        UpwindStage.run(&mut ctx).unwrap();
        assert_eq!(s.layer_thickness_edge, vec![5.0, 6.0, 1.0, 2.0]);
    }
}
