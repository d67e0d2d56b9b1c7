//! [`StateSnapshot`]: one time level of a block's evolving fields.

use glacier_core::{FieldName, Mask};
use glacier_mesh::MeshBlock;

use crate::error::StateError;
use crate::tracer::TracerBlock;

/// Struct-of-arrays holding every evolving field of one block at one time level.
///
/// Fields are public so kernels can borrow several of them disjointly.
/// Layered arrays are column-contiguous: value `(element, layer)` lives at
/// `element * vert_level_count + layer`.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Total ice thickness per cell.
    pub thickness: Vec<f64>,
    /// Layer thickness per (cell, layer).
    pub layer_thickness: Vec<f64>,
    /// Tracer values.
    pub tracers: TracerBlock,
    /// Cell mask bits.
    pub cell_mask: Vec<Mask>,
    /// Edge mask bits.
    pub edge_mask: Vec<Mask>,
    /// Vertex mask bits.
    pub vertex_mask: Vec<Mask>,
    /// Upper surface elevation per cell.
    pub upper_surface: Vec<f64>,
    /// Lower surface elevation per cell.
    pub lower_surface: Vec<f64>,
    /// Edge-normal velocity per (edge, layer).
    pub normal_velocity: Vec<f64>,
    /// Reconstructed x velocity per (cell, layer).
    pub u_reconstruct_x: Vec<f64>,
    /// Reconstructed y velocity per (cell, layer).
    pub u_reconstruct_y: Vec<f64>,
    /// Upwinded layer thickness per (edge, layer).
    pub layer_thickness_edge: Vec<f64>,
    /// Thickness at vertices.
    pub thickness_vertex: Vec<f64>,
    /// Upper surface at vertices.
    pub upper_surface_vertex: Vec<f64>,
}

/// Read-only view of one field, whatever its element type.
#[derive(Debug)]
pub enum FieldSlice<'a> {
    /// Floating-point field.
    Real(&'a [f64]),
    /// Mask field.
    Mask(&'a [Mask]),
}

/// Mutable view of one field, whatever its element type.
#[derive(Debug)]
pub enum FieldSliceMut<'a> {
    /// Floating-point field.
    Real(&'a mut [f64]),
    /// Mask field.
    Mask(&'a mut [Mask]),
}

impl FieldSlice<'_> {
    /// Number of stored values.
    pub fn len(&self) -> usize {
        match self {
            Self::Real(v) => v.len(),
            Self::Mask(v) => v.len(),
        }
    }

    /// Returns `true` if the view holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateSnapshot {
    /// Allocate a zeroed snapshot sized for `mesh` with `tracer_count` tracers.
    ///
    /// Masks start as [`Mask::NO_ICE`].
    pub fn new(mesh: &MeshBlock, tracer_count: usize) -> Self {
        let nc = mesh.cell_count();
        let ne = mesh.edge_count();
        let nv = mesh.vertex_count();
        let nl = mesh.vert_level_count();
        Self {
            thickness: vec![0.0; nc],
            layer_thickness: vec![0.0; nc * nl],
            tracers: TracerBlock::new(tracer_count, nl, nc),
            cell_mask: vec![Mask::NO_ICE; nc],
            edge_mask: vec![Mask::NO_ICE; ne],
            vertex_mask: vec![Mask::NO_ICE; nv],
            upper_surface: vec![0.0; nc],
            lower_surface: vec![0.0; nc],
            normal_velocity: vec![0.0; ne * nl],
            u_reconstruct_x: vec![0.0; nc * nl],
            u_reconstruct_y: vec![0.0; nc * nl],
            layer_thickness_edge: vec![0.0; ne * nl],
            thickness_vertex: vec![0.0; nv],
            upper_surface_vertex: vec![0.0; nv],
        }
    }

    /// Number of tracers carried.
    pub fn tracer_count(&self) -> usize {
        self.tracers.tracer_count()
    }

    /// Values stored per element for `field`.
    pub fn values_per_element(&self, field: FieldName, vert_level_count: usize) -> usize {
        match field {
            FieldName::Tracers => self.tracers.column_len(),
            f if f.is_layered() => vert_level_count,
            _ => 1,
        }
    }

    /// Borrow a field by name.
    pub fn field(&self, name: FieldName) -> FieldSlice<'_> {
        match name {
            FieldName::Thickness => FieldSlice::Real(&self.thickness),
            FieldName::LayerThickness => FieldSlice::Real(&self.layer_thickness),
            FieldName::Tracers => FieldSlice::Real(self.tracers.as_slice()),
            FieldName::CellMask => FieldSlice::Mask(&self.cell_mask),
            FieldName::EdgeMask => FieldSlice::Mask(&self.edge_mask),
            FieldName::VertexMask => FieldSlice::Mask(&self.vertex_mask),
            FieldName::UpperSurface => FieldSlice::Real(&self.upper_surface),
            FieldName::LowerSurface => FieldSlice::Real(&self.lower_surface),
            FieldName::NormalVelocity => FieldSlice::Real(&self.normal_velocity),
            FieldName::UReconstructX => FieldSlice::Real(&self.u_reconstruct_x),
            FieldName::UReconstructY => FieldSlice::Real(&self.u_reconstruct_y),
            FieldName::LayerThicknessEdge => FieldSlice::Real(&self.layer_thickness_edge),
            FieldName::ThicknessVertex => FieldSlice::Real(&self.thickness_vertex),
            FieldName::UpperSurfaceVertex => FieldSlice::Real(&self.upper_surface_vertex),
        }
    }

    /// Mutably borrow a field by name.
    pub fn field_mut(&mut self, name: FieldName) -> FieldSliceMut<'_> {
        match name {
            FieldName::Thickness => FieldSliceMut::Real(&mut self.thickness),
            FieldName::LayerThickness => FieldSliceMut::Real(&mut self.layer_thickness),
            FieldName::Tracers => FieldSliceMut::Real(self.tracers.as_mut_slice()),
            FieldName::CellMask => FieldSliceMut::Mask(&mut self.cell_mask),
            FieldName::EdgeMask => FieldSliceMut::Mask(&mut self.edge_mask),
            FieldName::VertexMask => FieldSliceMut::Mask(&mut self.vertex_mask),
            FieldName::UpperSurface => FieldSliceMut::Real(&mut self.upper_surface),
            FieldName::LowerSurface => FieldSliceMut::Real(&mut self.lower_surface),
            FieldName::NormalVelocity => FieldSliceMut::Real(&mut self.normal_velocity),
            FieldName::UReconstructX => FieldSliceMut::Real(&mut self.u_reconstruct_x),
            FieldName::UReconstructY => FieldSliceMut::Real(&mut self.u_reconstruct_y),
            FieldName::LayerThicknessEdge => FieldSliceMut::Real(&mut self.layer_thickness_edge),
            FieldName::ThicknessVertex => FieldSliceMut::Real(&mut self.thickness_vertex),
            FieldName::UpperSurfaceVertex => FieldSliceMut::Real(&mut self.upper_surface_vertex),
        }
    }

    /// Check every field length against the mesh dimensions.
    pub fn check_shape(&self, mesh: &MeshBlock) -> Result<(), StateError> {
        let nl = mesh.vert_level_count();
        if self.tracers.level_count() != nl {
            return Err(StateError::BlockMismatch {
                block: mesh.id(),
                reason: format!(
                    "tracer block has {} layers, mesh has {nl}",
                    self.tracers.level_count()
                ),
            });
        }
        for field in FieldName::ALL {
            let per = self.values_per_element(field, nl);
            let expected = mesh.element_count(field.element()) * per;
            let actual = self.field(field).len();
            if actual != expected {
                return Err(StateError::ShapeMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Number of elements a field spans, derived from its length.
    pub fn element_len(&self, field: FieldName, vert_level_count: usize) -> usize {
        let per = self.values_per_element(field, vert_level_count);
        self.field(field).len().checked_div(per).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacier_core::BlockId;
    use glacier_mesh::{MeshBlockBuilder, SigmaLevels};

    fn mesh() -> MeshBlock {
        MeshBlockBuilder::new(BlockId(0), vec![0.0; 3], SigmaLevels::uniform(4).unwrap())
            .edges(vec![[Some(0), Some(1)], [Some(1), Some(2)]])
            .vertices(3, vec![Some(0), Some(1), Some(2)], vec![1.0; 3])
            .build()
            .unwrap()
    }

    #[test]
    fn new_snapshot_matches_mesh() {
        let m = mesh();
        let s = StateSnapshot::new(&m, 2);
        s.check_shape(&m).unwrap();
        assert_eq!(s.layer_thickness.len(), 12);
        assert_eq!(s.normal_velocity.len(), 8);
        assert_eq!(s.tracers.as_slice().len(), 24);
        assert!(s.cell_mask.iter().all(|m| *m == Mask::NO_ICE));
    }

    #[test]
    fn shape_check_catches_truncated_field() {
        let m = mesh();
        let mut s = StateSnapshot::new(&m, 1);
        s.layer_thickness_edge.pop();
        assert_eq!(
            s.check_shape(&m),
            Err(StateError::ShapeMismatch {
                field: FieldName::LayerThicknessEdge,
                expected: 8,
                actual: 7,
            })
        );
    }

    #[test]
    fn field_by_name_aliases_struct_member() {
        let m = mesh();
        let mut s = StateSnapshot::new(&m, 1);
        if let FieldSliceMut::Real(v) = s.field_mut(FieldName::UpperSurface) {
            v[1] = 42.0;
        }
        assert_eq!(s.upper_surface[1], 42.0);
        assert_eq!(s.values_per_element(FieldName::Tracers, 4), 4);
        assert_eq!(s.element_len(FieldName::NormalVelocity, 4), 2);
    }
}
