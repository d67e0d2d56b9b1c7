//! Halo exchange: the trait the engine calls, and an in-process transport.
//!
//! Exchanges are blocking. The engine calls one only after the preceding
//! block-parallel step has finished on every block, and a failure ends the
//! run.

use std::error::Error;
use std::fmt;

use glacier_core::{BlockId, ElementKind, FieldName, Mask, TimeLevel};
use glacier_state::{FieldSlice, FieldSliceMut};
use indexmap::IndexMap;

use crate::domain::Block;

/// Refreshes one field's halo values from their owning blocks.
pub trait HaloExchange: Send + Sync {
    /// Exchange `field` at `level` across `blocks`. Returns once every
    /// halo value of that field is up to date.
    fn exchange(
        &self,
        blocks: &mut [Block],
        field: FieldName,
        level: TimeLevel,
    ) -> Result<(), ExchangeError>;
}

/// Errors from a halo exchange. All are fatal to the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeError {
    /// A link names a block that is not in the domain.
    UnknownBlock {
        /// The missing block.
        block: BlockId,
    },
    /// A link points past the end of a block's element range.
    IndexOutOfRange {
        /// Block the index was applied to.
        block: BlockId,
        /// Field being exchanged.
        field: FieldName,
        /// The offending element index.
        index: usize,
        /// Number of elements of that kind on the block.
        count: usize,
    },
    /// Source and destination store different numbers of values per
    /// element for the field.
    ShapeMismatch {
        /// Field being exchanged.
        field: FieldName,
        /// Owning block.
        src_block: BlockId,
        /// Values per element on the owning block.
        src_len: usize,
        /// Block holding the halo copy.
        dst_block: BlockId,
        /// Values per element on the halo block.
        dst_len: usize,
    },
    /// The underlying transport failed.
    Transport {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBlock { block } => write!(f, "unknown block {block}"),
            Self::IndexOutOfRange {
                block,
                field,
                index,
                count,
            } => write!(
                f,
                "{field} index {index} out of range on block {block} ({count} elements)"
            ),
            Self::ShapeMismatch {
                field,
                src_block,
                src_len,
                dst_block,
                dst_len,
            } => write!(
                f,
                "{field} has {src_len} values per element on block {src_block} \
                 but {dst_len} on block {dst_block}"
            ),
            Self::Transport { reason } => write!(f, "transport failed: {reason}"),
        }
    }
}

impl Error for ExchangeError {}

/// One halo element and the owned element it mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostLink {
    /// Element kind of both ends.
    pub element: ElementKind,
    /// Owning block.
    pub src_block: BlockId,
    /// Element index on the owning block.
    pub src_index: usize,
    /// Block holding the halo copy.
    pub dst_block: BlockId,
    /// Element index of the halo copy.
    pub dst_index: usize,
}

/// Exchange between blocks held in the same process.
///
/// All source values are gathered before any destination is written, so
/// chains of links (a halo copy that is itself a source) see pre-exchange
/// values.
#[derive(Clone, Debug, Default)]
pub struct LocalHaloExchange {
    links: Vec<GhostLink>,
}

enum Gathered {
    Real(Vec<f64>),
    Mask(Vec<Mask>),
}

impl LocalHaloExchange {
    /// Exchange driven by `links`.
    pub fn new(links: Vec<GhostLink>) -> Self {
        Self { links }
    }

    /// Configured links.
    pub fn links(&self) -> &[GhostLink] {
        &self.links
    }
}

fn locate(
    index: &IndexMap<BlockId, usize>,
    blocks: &[Block],
    block: BlockId,
    element: usize,
    field: FieldName,
) -> Result<usize, ExchangeError> {
    let pos = *index
        .get(&block)
        .ok_or(ExchangeError::UnknownBlock { block })?;
    let count = blocks[pos].mesh().element_count(field.element());
    if element >= count {
        return Err(ExchangeError::IndexOutOfRange {
            block,
            field,
            index: element,
            count,
        });
    }
    Ok(pos)
}

impl HaloExchange for LocalHaloExchange {
    fn exchange(
        &self,
        blocks: &mut [Block],
        field: FieldName,
        level: TimeLevel,
    ) -> Result<(), ExchangeError> {
        let index: IndexMap<BlockId, usize> =
            blocks.iter().enumerate().map(|(i, b)| (b.id(), i)).collect();
        let links: Vec<&GhostLink> = self
            .links
            .iter()
            .filter(|l| l.element == field.element())
            .collect();

        let per_element = |block: &Block| {
            block
                .state(level)
                .values_per_element(field, block.mesh().vert_level_count())
        };
        let mut routes = Vec::with_capacity(links.len());
        for link in &links {
            let src = locate(&index, blocks, link.src_block, link.src_index, field)?;
            let dst = locate(&index, blocks, link.dst_block, link.dst_index, field)?;
            let (src_len, dst_len) = (per_element(&blocks[src]), per_element(&blocks[dst]));
            if src_len != dst_len {
                return Err(ExchangeError::ShapeMismatch {
                    field,
                    src_block: link.src_block,
                    src_len,
                    dst_block: link.dst_block,
                    dst_len,
                });
            }
            routes.push((src, link.src_index, dst, link.dst_index));
        }

        let mut gathered = if field.is_mask() {
            Gathered::Mask(Vec::new())
        } else {
            Gathered::Real(Vec::new())
        };
        for &(src, src_index, _, _) in &routes {
            let block = &blocks[src];
            let per = per_element(block);
            let range = src_index * per..(src_index + 1) * per;
            match (&mut gathered, block.state(level).field(field)) {
                (Gathered::Real(out), FieldSlice::Real(v)) => out.extend_from_slice(&v[range]),
                (Gathered::Mask(out), FieldSlice::Mask(v)) => out.extend_from_slice(&v[range]),
                _ => {
                    return Err(ExchangeError::Transport {
                        reason: format!("field {field} has an unexpected value type"),
                    })
                }
            }
        }

        let mut offset = 0;
        for &(_, _, dst, dst_index) in &routes {
            let block = &mut blocks[dst];
            let levels = block.mesh().vert_level_count();
            let (_, state) = block.split_mut(level);
            let per = state.values_per_element(field, levels);
            let range = dst_index * per..(dst_index + 1) * per;
            match (&gathered, state.field_mut(field)) {
                (Gathered::Real(src), FieldSliceMut::Real(v)) => {
                    v[range].copy_from_slice(&src[offset..offset + per]);
                }
                (Gathered::Mask(src), FieldSliceMut::Mask(v)) => {
                    v[range].copy_from_slice(&src[offset..offset + per]);
                }
                _ => {
                    return Err(ExchangeError::Transport {
                        reason: format!("field {field} has an unexpected value type"),
                    })
                }
            }
            offset += per;
        }
        Ok(())
    }
}
