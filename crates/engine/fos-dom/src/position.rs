//! Document position bitmask
//!
//! Result of `DomTree::compare_document_position`, with the DOM's
//! `Node.DOCUMENT_POSITION_*` bit values.

use std::ops::BitOr;

/// Relative position of one node to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DocumentPosition(u16);

impl DocumentPosition {
    /// Same node
    pub const EQUAL: DocumentPosition = DocumentPosition(0);
    pub const DISCONNECTED: DocumentPosition = DocumentPosition(0x01);
    pub const PRECEDING: DocumentPosition = DocumentPosition(0x02);
    pub const FOLLOWING: DocumentPosition = DocumentPosition(0x04);
    pub const CONTAINS: DocumentPosition = DocumentPosition(0x08);
    pub const CONTAINED_BY: DocumentPosition = DocumentPosition(0x10);
    pub const IMPLEMENTATION_SPECIFIC: DocumentPosition = DocumentPosition(0x20);

    /// Raw bitmask
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Check whether all bits of `flag` are set
    pub fn contains(self, flag: DocumentPosition) -> bool {
        flag.0 != 0 && (self.0 & flag.0) == flag.0
    }
}

impl BitOr for DocumentPosition {
    type Output = DocumentPosition;

    fn bitor(self, rhs: DocumentPosition) -> DocumentPosition {
        DocumentPosition(self.0 | rhs.0)
    }
}
