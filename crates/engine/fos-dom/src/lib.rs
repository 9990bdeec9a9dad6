//! fOS DOM - Document Object Model
//!
//! Memory-efficient, arena-backed DOM tree. This crate owns the node
//! storage and the structural primitives (insertion, removal, cloning,
//! document-position comparison, range contents). Script-facing objects
//! are layered on top by `fos-js-dom`.

mod interner;
mod mutation;
mod node;
mod operations;
mod position;
mod range_content;
mod tree;

pub use interner::{InternedString, StringInterner};
pub use mutation::{MutationRecord, MutationType};
pub use node::{
    AttrData, ElementData, Node, NodeData, NodeType, QualName, HTML_NAMESPACE, SVG_NAMESPACE,
};
pub use operations::{DomError, DomResult};
pub use position::DocumentPosition;
pub use range_content::BoundaryPoint;
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node" in link fields
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this id refers to a node (not the `NONE` sentinel)
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Build an id from a raw arena index.
    ///
    /// The id is not checked against any tree; lookups with an id the tree
    /// never handed out simply miss.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Raw arena index
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// `Some(self)` for a valid id, `None` for the sentinel
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        if self.is_valid() { Some(self) } else { None }
    }
}
