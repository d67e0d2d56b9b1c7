//! Mesh geometry for the glacier diagnostic core.
//!
//! A [`MeshBlock`] is one partition of an unstructured horizontal mesh
//! plus its halo: per-cell bed elevation, edge and vertex adjacency
//! tables, kite areas, and the mesh-level [`SigmaLevels`] that every
//! column is remapped onto. Blocks are built once through
//! [`MeshBlockBuilder`] and are immutable afterwards.
//!
//! Mesh construction and partitioning proper happen outside this
//! workspace; this crate only validates and stores the result.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod error;
pub mod vertical;

pub use block::{MeshBlock, MeshBlockBuilder};
pub use error::MeshError;
pub use vertical::SigmaLevels;
