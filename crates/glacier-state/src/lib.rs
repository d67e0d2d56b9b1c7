//! Evolving per-block state for the glacier diagnostic core.
//!
//! # Layout
//!
//! ```text
//! SnapshotPair (owned by a block)
//! ├── StateSnapshot × 2 (current / next, swapped by advance())
//! │   ├── per-cell:   thickness, cell_mask, upper/lower_surface
//! │   ├── cell×layer: layer_thickness, u_reconstruct_x/y
//! │   ├── TracerBlock (cell-major, then layer, then tracer)
//! │   ├── per-edge:   edge_mask; edge×layer: normal_velocity, layer_thickness_edge
//! │   └── per-vertex: vertex_mask, thickness_vertex, upper_surface_vertex
//! ```
//!
//! All arrays are allocated once when the snapshot is created and mutated
//! in place afterwards. Layered arrays store one column contiguously, so a
//! column is a single slice and columns can be processed in parallel with
//! `chunks_mut`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod pair;
pub mod snapshot;
pub mod tracer;

pub use error::StateError;
pub use pair::SnapshotPair;
pub use snapshot::{FieldSlice, FieldSliceMut, StateSnapshot};
pub use tracer::TracerBlock;
