//! Core types for the glacier ice-sheet diagnostic core.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: block
//! and time-level identifiers, the typed [`FieldName`] table and its
//! [`FieldSet`] bitset, per-element [`Mask`] flags, the aggregate
//! [`ErrorFlags`] side channel, and stage-level error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod flags;
pub mod id;
pub mod mask;

pub use error::{GeometryViolation, StageError};
pub use field::{ElementKind, FieldName, FieldSet};
pub use flags::ErrorFlags;
pub use id::{BlockId, TimeLevel};
pub use mask::Mask;
