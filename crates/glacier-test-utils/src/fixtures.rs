//! A one-dimensional strip mesh split into blocks with one-cell halos.
//!
//! Global cell `g` sits between edges `g - 1` and `g`; edge `g` joins cells
//! `g` and `g + 1` and is owned by the block that owns cell `g`. Every
//! owned cell carries one vertex whose incident cells are its left
//! neighbour, itself and its right neighbour, all with unit kite area.
//!
//! ```text
//! block 0: [0 1 2 | 3]          owned cells 0..3, halo cell 3
//! block 1:   [2 | 3 4 5 | 6]    owned cells 3..6, halo cells 2 and 6
//! ```

use glacier_core::{BlockId, ElementKind, TimeLevel};
use glacier_engine::{Block, Domain, GhostLink, LocalHaloExchange};
use glacier_mesh::{MeshBlockBuilder, SigmaLevels};
use glacier_state::StateSnapshot;

/// A partitioned strip plus the links needed to exchange its halos.
pub struct Strip {
    pub domain: Domain,
    pub exchange: LocalHaloExchange,
    /// For each block, the global cell index of every local cell.
    pub cell_globals: Vec<Vec<usize>>,
    /// For each block, the global edge index of every local edge.
    pub edge_globals: Vec<Vec<usize>>,
    /// For each block, the half-open range of owned global cells.
    pub owned: Vec<(usize, usize)>,
}

impl Strip {
    /// Visit every local cell (owned and halo) of every block at `level`
    /// as `(global cell, local cell, state)`.
    pub fn for_each_cell(
        &mut self,
        level: TimeLevel,
        mut f: impl FnMut(usize, usize, &mut StateSnapshot),
    ) {
        for (b, block) in self.domain.blocks_mut().iter_mut().enumerate() {
            let (_, state) = block.split_mut(level);
            for (local, &global) in self.cell_globals[b].iter().enumerate() {
                f(global, local, state);
            }
        }
    }

    /// Block index and local index of the owner of global cell `g`.
    pub fn owner_of(&self, g: usize) -> (usize, usize) {
        let b = self
            .owned
            .iter()
            .position(|&(s, e)| s <= g && g < e)
            .expect("cell outside strip");
        (b, g - self.owned[b].0)
    }

    /// Block index and local index of every halo copy of global cell `g`.
    pub fn halo_copies_of(&self, g: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (b, globals) in self.cell_globals.iter().enumerate() {
            let (s, e) = self.owned[b];
            for (local, &global) in globals.iter().enumerate() {
                if global == g && !(s <= g && g < e) {
                    out.push((b, local));
                }
            }
        }
        out
    }

    /// Sum of layer thickness over owned cells.
    pub fn owned_mass(&self, level: TimeLevel) -> f64 {
        self.domain
            .blocks()
            .iter()
            .zip(&self.owned)
            .map(|(block, &(s, e))| {
                let levels = block.mesh().vert_level_count();
                block.state(level).layer_thickness[..(e - s) * levels]
                    .iter()
                    .sum::<f64>()
            })
            .sum()
    }
}

/// Builder for [`Strip`].
pub struct StripBuilder {
    cells: usize,
    blocks: usize,
    levels: usize,
    tracers: usize,
    bed: Option<Vec<f64>>,
}

impl StripBuilder {
    /// `cells` global cells split evenly into `blocks` blocks.
    ///
    /// Defaults: 4 uniform layers, 1 tracer, flat bed at 0 m.
    pub fn new(cells: usize, blocks: usize) -> Self {
        Self {
            cells,
            blocks,
            levels: 4,
            tracers: 1,
            bed: None,
        }
    }

    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    pub fn tracers(mut self, tracers: usize) -> Self {
        self.tracers = tracers;
        self
    }

    /// Bed elevation per global cell.
    pub fn bed(mut self, bed: Vec<f64>) -> Self {
        self.bed = Some(bed);
        self
    }

    pub fn build(self) -> Strip {
        let n = self.cells;
        assert!(self.blocks >= 1 && self.blocks <= n, "need 1..=cells blocks");
        let bed = self.bed.unwrap_or_else(|| vec![0.0; n]);
        assert_eq!(bed.len(), n, "bed must have one value per cell");

        let owned: Vec<(usize, usize)> = (0..self.blocks)
            .map(|b| (b * n / self.blocks, (b + 1) * n / self.blocks))
            .collect();
        let owner = |g: usize| {
            owned
                .iter()
                .position(|&(s, e)| s <= g && g < e)
                .expect("cell outside strip")
        };

        let mut blocks = Vec::with_capacity(self.blocks);
        let mut links = Vec::new();
        let mut cell_globals = Vec::with_capacity(self.blocks);
        let mut edge_globals = Vec::with_capacity(self.blocks);

        for (b, &(start, end)) in owned.iter().enumerate() {
            let mut cells: Vec<usize> = (start..end).collect();
            if start > 0 {
                cells.push(start - 1);
            }
            if end < n {
                cells.push(end);
            }
            let local = |g: usize| cells.iter().position(|&c| c == g);

            let mut edges = Vec::new();
            let mut cells_on_edge = Vec::new();
            for g in start..end {
                if g + 1 < n {
                    edges.push(g);
                    cells_on_edge.push([local(g), local(g + 1)]);
                }
            }
            let owned_edges = edges.len();
            if start > 0 {
                edges.push(start - 1);
                cells_on_edge.push([local(start - 1), local(start)]);
            }

            let mut cells_on_vertex = Vec::new();
            for g in start..end {
                cells_on_vertex.push(g.checked_sub(1).and_then(local));
                cells_on_vertex.push(local(g));
                cells_on_vertex.push(if g + 1 < n { local(g + 1) } else { None });
            }
            let kite_areas = vec![1.0; cells_on_vertex.len()];

            let id = BlockId(b as u32);
            let mesh = MeshBlockBuilder::new(
                id,
                cells.iter().map(|&g| bed[g]).collect(),
                SigmaLevels::uniform(self.levels).expect("levels must be positive"),
            )
            .edges(cells_on_edge)
            .vertices(3, cells_on_vertex, kite_areas)
            .owned_cells(end - start)
            .owned_edges(owned_edges)
            .owned_vertices(end - start)
            .build()
            .expect("strip mesh is valid");

            for (dst_index, &g) in cells.iter().enumerate().skip(end - start) {
                let ob = owner(g);
                links.push(GhostLink {
                    element: ElementKind::Cell,
                    src_block: BlockId(ob as u32),
                    src_index: g - owned[ob].0,
                    dst_block: id,
                    dst_index,
                });
            }
            for (dst_index, &e) in edges.iter().enumerate().skip(owned_edges) {
                let ob = owner(e);
                links.push(GhostLink {
                    element: ElementKind::Edge,
                    src_block: BlockId(ob as u32),
                    src_index: e - owned[ob].0,
                    dst_block: id,
                    dst_index,
                });
            }

            blocks.push(Block::zeroed(mesh, self.tracers));
            cell_globals.push(cells);
            edge_globals.push(edges);
        }

        Strip {
            domain: Domain::new(blocks).expect("block ids are distinct"),
            exchange: LocalHaloExchange::new(links),
            cell_globals,
            edge_globals,
            owned,
        }
    }
}
