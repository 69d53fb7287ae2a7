//! Visually editable content pages and the block tree in their front matter.
/// Block tree types
mod block;
/// Front matter / body split
mod page;

pub use block::{
    Block,
    BlockSchema,
    Container,
    ContentTree,
    LeafBlock,
};
pub use page::PageRecord;
