//! [`MeshBlock`]: one partition of the horizontal mesh plus its halo.

use glacier_core::{BlockId, ElementKind};

use crate::error::MeshError;
use crate::vertical::SigmaLevels;

/// Immutable geometry and adjacency for one mesh block.
///
/// Elements `0..owned_*` are authoritative on this block; the remainder
/// are halo copies whose values are refreshed by exchange. Adjacency uses
/// `None` for a neighbour that lies outside the block (outermost halo or
/// domain boundary).
#[derive(Clone, Debug)]
pub struct MeshBlock {
    id: BlockId,
    owned_cells: usize,
    owned_edges: usize,
    owned_vertices: usize,
    vertex_degree: usize,
    bed_topography: Vec<f64>,
    cells_on_edge: Vec<[Option<usize>; 2]>,
    cells_on_vertex: Vec<Option<usize>>,
    kite_areas_on_vertex: Vec<f64>,
    sigma: SigmaLevels,
}

impl MeshBlock {
    /// Block identifier.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Total cells, owned plus halo.
    pub fn cell_count(&self) -> usize {
        self.bed_topography.len()
    }

    /// Total edges, owned plus halo.
    pub fn edge_count(&self) -> usize {
        self.cells_on_edge.len()
    }

    /// Total vertices, owned plus halo.
    pub fn vertex_count(&self) -> usize {
        if self.vertex_degree == 0 {
            0
        } else {
            self.kite_areas_on_vertex.len() / self.vertex_degree
        }
    }

    /// Number of vertical layers.
    pub fn vert_level_count(&self) -> usize {
        self.sigma.level_count()
    }

    /// Number of element slots of the given kind.
    pub fn element_count(&self, element: ElementKind) -> usize {
        match element {
            ElementKind::Cell => self.cell_count(),
            ElementKind::Edge => self.edge_count(),
            ElementKind::Vertex => self.vertex_count(),
        }
    }

    /// Number of owned (non-halo) elements of the given kind.
    pub fn owned_count(&self, element: ElementKind) -> usize {
        match element {
            ElementKind::Cell => self.owned_cells,
            ElementKind::Edge => self.owned_edges,
            ElementKind::Vertex => self.owned_vertices,
        }
    }

    /// Cells incident to each vertex.
    pub fn vertex_degree(&self) -> usize {
        self.vertex_degree
    }

    /// Bed elevation per cell.
    pub fn bed_topography(&self) -> &[f64] {
        &self.bed_topography
    }

    /// The two cells sharing each edge.
    pub fn cells_on_edge(&self) -> &[[Option<usize>; 2]] {
        &self.cells_on_edge
    }

    /// Cells incident to vertex `v`, `vertex_degree()` entries.
    pub fn cells_on_vertex(&self, v: usize) -> &[Option<usize>] {
        let d = self.vertex_degree;
        &self.cells_on_vertex[v * d..(v + 1) * d]
    }

    /// Kite areas each incident cell contributes to vertex `v`.
    pub fn kite_areas_on_vertex(&self, v: usize) -> &[f64] {
        let d = self.vertex_degree;
        &self.kite_areas_on_vertex[v * d..(v + 1) * d]
    }

    /// Target sigma levels.
    pub fn sigma(&self) -> &SigmaLevels {
        &self.sigma
    }
}

/// Validating builder for [`MeshBlock`].
///
/// # Examples
///
/// ```
/// use glacier_core::BlockId;
/// use glacier_mesh::{MeshBlockBuilder, SigmaLevels};
///
/// // Two cells sharing one edge, no vertices.
/// let block = MeshBlockBuilder::new(BlockId(0), vec![-10.0, -20.0], SigmaLevels::uniform(3).unwrap())
///     .edges(vec![[Some(0), Some(1)]])
///     .build()
///     .unwrap();
/// assert_eq!(block.cell_count(), 2);
/// assert_eq!(block.edge_count(), 1);
/// assert_eq!(block.vert_level_count(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct MeshBlockBuilder {
    id: BlockId,
    bed_topography: Vec<f64>,
    sigma: SigmaLevels,
    owned_cells: Option<usize>,
    owned_edges: Option<usize>,
    owned_vertices: Option<usize>,
    cells_on_edge: Vec<[Option<usize>; 2]>,
    vertex_degree: usize,
    cells_on_vertex: Vec<Option<usize>>,
    kite_areas_on_vertex: Vec<f64>,
}

impl MeshBlockBuilder {
    /// Start a block with per-cell bed elevation and target sigma levels.
    pub fn new(id: BlockId, bed_topography: Vec<f64>, sigma: SigmaLevels) -> Self {
        Self {
            id,
            bed_topography,
            sigma,
            owned_cells: None,
            owned_edges: None,
            owned_vertices: None,
            cells_on_edge: Vec::new(),
            vertex_degree: 0,
            cells_on_vertex: Vec::new(),
            kite_areas_on_vertex: Vec::new(),
        }
    }

    /// Edge adjacency: the two cells sharing each edge.
    pub fn edges(mut self, cells_on_edge: Vec<[Option<usize>; 2]>) -> Self {
        self.cells_on_edge = cells_on_edge;
        self
    }

    /// Vertex adjacency, flattened `vertex × degree`, with matching kite areas.
    pub fn vertices(
        mut self,
        vertex_degree: usize,
        cells_on_vertex: Vec<Option<usize>>,
        kite_areas_on_vertex: Vec<f64>,
    ) -> Self {
        self.vertex_degree = vertex_degree;
        self.cells_on_vertex = cells_on_vertex;
        self.kite_areas_on_vertex = kite_areas_on_vertex;
        self
    }

    /// Number of owned cells (default: all).
    pub fn owned_cells(mut self, n: usize) -> Self {
        self.owned_cells = Some(n);
        self
    }

    /// Number of owned edges (default: all).
    pub fn owned_edges(mut self, n: usize) -> Self {
        self.owned_edges = Some(n);
        self
    }

    /// Number of owned vertices (default: all).
    pub fn owned_vertices(mut self, n: usize) -> Self {
        self.owned_vertices = Some(n);
        self
    }

    /// Validate and build the block.
    pub fn build(self) -> Result<MeshBlock, MeshError> {
        let cell_count = self.bed_topography.len();
        if cell_count == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if let Some((i, &v)) = self
            .bed_topography
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(MeshError::InvalidGeometry {
                name: "bed_topography",
                index: i,
                value: v,
            });
        }

        for (e, pair) in self.cells_on_edge.iter().enumerate() {
            for cell in pair.iter().flatten() {
                if *cell >= cell_count {
                    return Err(MeshError::CellOutOfRange {
                        element: ElementKind::Edge,
                        index: e,
                        cell: *cell,
                        cell_count,
                    });
                }
            }
        }

        let degree = self.vertex_degree;
        if degree == 0 {
            if !self.cells_on_vertex.is_empty() || !self.kite_areas_on_vertex.is_empty() {
                return Err(MeshError::LengthMismatch {
                    name: "cells_on_vertex",
                    expected: 0,
                    actual: self.cells_on_vertex.len(),
                });
            }
        } else {
            if self.kite_areas_on_vertex.len() % degree != 0 {
                return Err(MeshError::LengthMismatch {
                    name: "kite_areas_on_vertex",
                    expected: self.kite_areas_on_vertex.len().next_multiple_of(degree),
                    actual: self.kite_areas_on_vertex.len(),
                });
            }
            if self.cells_on_vertex.len() != self.kite_areas_on_vertex.len() {
                return Err(MeshError::LengthMismatch {
                    name: "cells_on_vertex",
                    expected: self.kite_areas_on_vertex.len(),
                    actual: self.cells_on_vertex.len(),
                });
            }
            for (slot, cell) in self.cells_on_vertex.iter().enumerate() {
                if let Some(c) = cell {
                    if *c >= cell_count {
                        return Err(MeshError::CellOutOfRange {
                            element: ElementKind::Vertex,
                            index: slot / degree,
                            cell: *c,
                            cell_count,
                        });
                    }
                }
            }
            if let Some((i, &a)) = self
                .kite_areas_on_vertex
                .iter()
                .enumerate()
                .find(|(_, a)| !a.is_finite() || **a < 0.0)
            {
                return Err(MeshError::InvalidGeometry {
                    name: "kite_areas_on_vertex",
                    index: i,
                    value: a,
                });
            }
        }

        let edge_count = self.cells_on_edge.len();
        let vertex_count = if degree == 0 {
            0
        } else {
            self.kite_areas_on_vertex.len() / degree
        };
        let owned_cells = check_owned(ElementKind::Cell, self.owned_cells, cell_count)?;
        let owned_edges = check_owned(ElementKind::Edge, self.owned_edges, edge_count)?;
        let owned_vertices = check_owned(ElementKind::Vertex, self.owned_vertices, vertex_count)?;

        Ok(MeshBlock {
            id: self.id,
            owned_cells,
            owned_edges,
            owned_vertices,
            vertex_degree: degree,
            bed_topography: self.bed_topography,
            cells_on_edge: self.cells_on_edge,
            cells_on_vertex: self.cells_on_vertex,
            kite_areas_on_vertex: self.kite_areas_on_vertex,
            sigma: self.sigma,
        })
    }
}

fn check_owned(
    element: ElementKind,
    owned: Option<usize>,
    total: usize,
) -> Result<usize, MeshError> {
    match owned {
        None => Ok(total),
        Some(n) if n <= total => Ok(n),
        Some(n) => Err(MeshError::OwnedExceedsTotal {
            element,
            owned: n,
            total,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigma() -> SigmaLevels {
        SigmaLevels::uniform(2).unwrap()
    }

    #[test]
    fn builds_triangle_fan() {
        let block = MeshBlockBuilder::new(BlockId(1), vec![0.0, 1.0, 2.0], sigma())
            .edges(vec![[Some(0), Some(1)], [Some(1), Some(2)], [Some(2), None]])
            .vertices(3, vec![Some(0), Some(1), Some(2)], vec![1.0, 2.0, 3.0])
            .owned_cells(2)
            .build()
            .unwrap();
        assert_eq!(block.id(), BlockId(1));
        assert_eq!(block.vertex_count(), 1);
        assert_eq!(block.cells_on_vertex(0), &[Some(0), Some(1), Some(2)]);
        assert_eq!(block.kite_areas_on_vertex(0), &[1.0, 2.0, 3.0]);
        assert_eq!(block.owned_count(ElementKind::Cell), 2);
        assert_eq!(block.owned_count(ElementKind::Edge), 3);
    }

    #[test]
    fn empty_mesh_rejected() {
        let err = MeshBlockBuilder::new(BlockId(0), vec![], sigma())
            .build()
            .unwrap_err();
        assert_eq!(err, MeshError::EmptyMesh);
    }

    #[test]
    fn edge_cell_out_of_range_rejected() {
        let err = MeshBlockBuilder::new(BlockId(0), vec![0.0, 0.0], sigma())
            .edges(vec![[Some(0), Some(5)]])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            MeshError::CellOutOfRange {
                element: ElementKind::Edge,
                cell: 5,
                ..
            }
        ));
    }

    #[test]
    fn mismatched_vertex_arrays_rejected() {
        let err = MeshBlockBuilder::new(BlockId(0), vec![0.0; 3], sigma())
            .vertices(3, vec![Some(0), Some(1)], vec![1.0, 1.0, 1.0])
            .build()
            .unwrap_err();
        assert!(matches!(err, MeshError::LengthMismatch { .. }));
    }

    #[test]
    fn negative_kite_area_rejected() {
        let err = MeshBlockBuilder::new(BlockId(0), vec![0.0; 3], sigma())
            .vertices(3, vec![Some(0), Some(1), Some(2)], vec![1.0, -1.0, 1.0])
            .build()
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidGeometry { index: 1, .. }));
    }

    #[test]
    fn owned_exceeding_total_rejected() {
        let err = MeshBlockBuilder::new(BlockId(0), vec![0.0; 3], sigma())
            .owned_cells(4)
            .build()
            .unwrap_err();
        assert!(matches!(err, MeshError::OwnedExceedsTotal { .. }));
    }
}
