//! Test utilities and mock collaborators for glacier development.
//!
//! Provides simple implementations of the host-supplied traits
//! ([`MaskClassifier`], [`VelocitySolver`], [`VelocityReconstructor`],
//! [`HaloExchange`]) and a strip-mesh domain builder in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Mutex;

use glacier_core::{BlockId, ElementKind, FieldName, Mask, StageError, TimeLevel};
use glacier_diag::{DiagnosticConfig, MaskClassifier, VelocityReconstructor, VelocitySolver};
use glacier_engine::{Block, ExchangeError, HaloExchange};
use glacier_mesh::MeshBlock;
use glacier_state::StateSnapshot;

// ── Mask classification ────────────────────────────────────────────

/// Flotation-criterion classifier.
///
/// A cell is floating when `ρ_ice·h < ρ_ocean·(sea_level − bed)`, grounded
/// when it otherwise has positive thickness, and ice-free otherwise. Edges
/// and vertices take the strongest state of their adjacent cells
/// (grounded over floating over no ice).
pub struct ThicknessClassifier;

impl ThicknessClassifier {
    pub fn classify_cell(thickness: f64, bed: f64, config: &DiagnosticConfig) -> Mask {
        if thickness <= 0.0 {
            Mask::NO_ICE
        } else if thickness * config.density_ratio() < config.sea_level - bed {
            Mask::FLOATING
        } else {
            Mask::GROUNDED
        }
    }

    fn combine(cells: impl Iterator<Item = Mask>) -> Mask {
        let mut out = Mask::NO_ICE;
        for m in cells {
            if m.is_grounded() {
                return Mask::GROUNDED;
            }
            if m.is_floating() {
                out = Mask::FLOATING;
            }
        }
        out
    }
}

impl MaskClassifier for ThicknessClassifier {
    fn classify(
        &self,
        mesh: &MeshBlock,
        state: &mut StateSnapshot,
        config: &DiagnosticConfig,
    ) -> Result<(), StageError> {
        let cell_mask: Vec<Mask> = state
            .thickness
            .iter()
            .zip(mesh.bed_topography())
            .map(|(&h, &b)| Self::classify_cell(h, b, config))
            .collect();

        let owned_cells = mesh.owned_count(ElementKind::Cell);
        state.cell_mask[..owned_cells].copy_from_slice(&cell_mask[..owned_cells]);

        for e in 0..mesh.owned_count(ElementKind::Edge) {
            let cells = mesh.cells_on_edge()[e];
            state.edge_mask[e] = Self::combine(cells.iter().flatten().map(|&c| cell_mask[c]));
        }
        for v in 0..mesh.owned_count(ElementKind::Vertex) {
            state.vertex_mask[v] = Self::combine(
                mesh.cells_on_vertex(v)
                    .iter()
                    .flatten()
                    .map(|&c| cell_mask[c]),
            );
        }
        Ok(())
    }
}

/// Gives every owned cell with ice the same state, regardless of bed.
pub struct UniformClassifier {
    pub ice: Mask,
}

impl MaskClassifier for UniformClassifier {
    fn classify(
        &self,
        mesh: &MeshBlock,
        state: &mut StateSnapshot,
        _config: &DiagnosticConfig,
    ) -> Result<(), StageError> {
        let owned = mesh.owned_count(ElementKind::Cell);
        for (m, &h) in state.cell_mask[..owned].iter_mut().zip(&state.thickness) {
            *m = if h > 0.0 { self.ice } else { Mask::NO_ICE };
        }
        Ok(())
    }
}

/// Classifier that writes a mask with conflicting state bits.
pub struct MalformedClassifier;

impl MaskClassifier for MalformedClassifier {
    fn classify(
        &self,
        _mesh: &MeshBlock,
        state: &mut StateSnapshot,
        _config: &DiagnosticConfig,
    ) -> Result<(), StageError> {
        if let Some(m) = state.cell_mask.first_mut() {
            *m = Mask::GROUNDED | Mask::FLOATING;
        }
        Ok(())
    }
}

// ── Velocity ───────────────────────────────────────────────────────

/// Sets every owned edge, every layer, to the same normal velocity.
pub struct ConstantSolver {
    pub speed: f64,
}

impl VelocitySolver for ConstantSolver {
    fn solve(
        &self,
        mesh: &MeshBlock,
        state: &mut StateSnapshot,
        _config: &DiagnosticConfig,
    ) -> Result<(), StageError> {
        let owned = mesh.owned_count(ElementKind::Edge) * mesh.vert_level_count();
        state.normal_velocity[..owned].fill(self.speed);
        Ok(())
    }
}

/// Fails on one block and behaves like [`ConstantSolver`] elsewhere.
pub struct FailingSolver {
    pub block: BlockId,
    pub speed: f64,
}

impl VelocitySolver for FailingSolver {
    fn solve(
        &self,
        mesh: &MeshBlock,
        state: &mut StateSnapshot,
        config: &DiagnosticConfig,
    ) -> Result<(), StageError> {
        if mesh.id() == self.block {
            return Err(StageError::ExecutionFailed {
                reason: format!("solver did not converge on block {}", self.block),
            });
        }
        ConstantSolver { speed: self.speed }.solve(mesh, state, config)
    }
}

/// Sets both reconstructed components of each owned cell to the mean
/// normal velocity of its incident edges, layer by layer.
pub struct MeanReconstructor;

impl VelocityReconstructor for MeanReconstructor {
    fn reconstruct(&self, mesh: &MeshBlock, state: &mut StateSnapshot) -> Result<(), StageError> {
        let levels = mesh.vert_level_count();
        let owned = mesh.owned_count(ElementKind::Cell);
        let mut sum = vec![0.0; owned * levels];
        let mut count = vec![0usize; owned];
        for (e, cells) in mesh.cells_on_edge().iter().enumerate() {
            for &c in cells.iter().flatten().filter(|&&c| c < owned) {
                count[c] += 1;
                for k in 0..levels {
                    sum[c * levels + k] += state.normal_velocity[e * levels + k];
                }
            }
        }
        for c in 0..owned {
            let n = count[c].max(1) as f64;
            for k in 0..levels {
                let u = sum[c * levels + k] / n;
                state.u_reconstruct_x[c * levels + k] = u;
                state.u_reconstruct_y[c * levels + k] = u;
            }
        }
        Ok(())
    }
}

// ── Exchange ───────────────────────────────────────────────────────

/// Wraps another exchange and records every call.
pub struct RecordingExchange<E> {
    pub inner: E,
    calls: Mutex<Vec<(FieldName, TimeLevel)>>,
}

impl<E> RecordingExchange<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fields exchanged so far, in call order.
    pub fn calls(&self) -> Vec<(FieldName, TimeLevel)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fields(&self) -> Vec<FieldName> {
        self.calls().into_iter().map(|(f, _)| f).collect()
    }
}

impl<E: HaloExchange> HaloExchange for RecordingExchange<E> {
    fn exchange(
        &self,
        blocks: &mut [Block],
        field: FieldName,
        level: TimeLevel,
    ) -> Result<(), ExchangeError> {
        self.calls.lock().unwrap().push((field, level));
        self.inner.exchange(blocks, field, level)
    }
}

/// Exchange that fails for one field and does nothing otherwise.
pub struct FailingExchange {
    pub field: FieldName,
}

impl HaloExchange for FailingExchange {
    fn exchange(
        &self,
        _blocks: &mut [Block],
        field: FieldName,
        _level: TimeLevel,
    ) -> Result<(), ExchangeError> {
        if field == self.field {
            Err(ExchangeError::Transport {
                reason: format!("peer unreachable while exchanging {field}"),
            })
        } else {
            Ok(())
        }
    }
}
