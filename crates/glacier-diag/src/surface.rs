//! Upper and lower surface elevations from thickness and flotation.

use glacier_core::{FieldName, FieldSet, GeometryViolation, StageError};
use glacier_mesh::MeshBlock;
use glacier_state::StateSnapshot;
use log::warn;
use smallvec::smallvec;

use crate::config::DiagnosticConfig;
use crate::context::StageContext;
use crate::stage::{BlockStage, Coverage, StageWrites};

/// Recompute `lower_surface` and `upper_surface` on every cell.
///
/// Floating cells hang from sea level by hydrostatic balance
/// (`sea_level − thickness·ρ_ice/ρ_ocean`); all other cells rest on the
/// bed. Cells whose lower surface ends up more than
/// `config.geometry_tolerance` below the bed are returned as violations.
/// Every cell is processed regardless of earlier violations.
pub fn update_surfaces(
    mesh: &MeshBlock,
    state: &mut StateSnapshot,
    config: &DiagnosticConfig,
) -> Vec<GeometryViolation> {
    let ratio = config.density_ratio();
    let mut violations = Vec::new();
    let cells = state
        .thickness
        .iter()
        .zip(&state.cell_mask)
        .zip(mesh.bed_topography())
        .zip(state.lower_surface.iter_mut().zip(state.upper_surface.iter_mut()));
    for (cell, (((&h, mask), &bed), (lower, upper))) in cells.enumerate() {
        *lower = if mask.is_floating() {
            config.sea_level - h * ratio
        } else {
            bed
        };
        *upper = *lower + h;
        if *lower < bed - config.geometry_tolerance {
            violations.push(GeometryViolation {
                block: mesh.id(),
                cell,
                lower_surface: *lower,
                bed_topography: bed,
            });
        }
    }
    violations
}

/// Pipeline stage wrapping [`update_surfaces`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceStage;

impl BlockStage for SurfaceStage {
    fn name(&self) -> &str {
        "surface_geometry"
    }

    fn reads(&self) -> FieldSet {
        [FieldName::Thickness, FieldName::CellMask].into_iter().collect()
    }

    fn reads_halo(&self) -> FieldSet {
        self.reads()
    }

    fn writes(&self) -> StageWrites {
        smallvec![
            (FieldName::LowerSurface, Coverage::All),
            (FieldName::UpperSurface, Coverage::All),
        ]
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let (mesh, state, config) = ctx.parts();
        let violations = update_surfaces(mesh, state, config);
        for v in violations {
            warn!("geometry violation on {v}");
            ctx.record_violation(v);
        }
        Ok(())
    }
}
