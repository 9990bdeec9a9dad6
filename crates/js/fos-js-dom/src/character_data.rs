//! CharacterData and Text accessors
//!
//! Offsets and counts are in characters (Unicode scalar values).

use crate::node::{Node, NodeKind};
use crate::{DomException, DomResult};

impl Node {
    /// Character data of text, CDATA, comment and processing instruction
    /// nodes
    pub fn data(&self) -> Option<String> {
        self.read(|tree, id| tree.character_data(id).map(str::to_string))
            .flatten()
    }

    pub fn set_data(&self, data: &str) -> DomResult<()> {
        let doc = self.live_doc()?;
        doc.mutate(|tree| tree.set_data(self.id(), data))
    }

    /// Length in characters (DOM node length for other nodes)
    pub fn length(&self) -> u32 {
        self.read(|tree, id| tree.length(id)).unwrap_or(0)
    }

    /// `count` characters starting at `offset`
    pub fn substring_data(&self, offset: u32, count: u32) -> DomResult<String> {
        let data = self.data().ok_or(DomException::InvalidNodeType)?;
        let length = data.chars().count() as u32;
        if offset > length {
            return Err(DomException::IndexSize { offset, length });
        }
        Ok(data
            .chars()
            .skip(offset as usize)
            .take(count as usize)
            .collect())
    }

    pub fn append_data(&self, data: &str) -> DomResult<()> {
        self.replace_data(self.length(), 0, data)
    }

    pub fn insert_data(&self, offset: u32, data: &str) -> DomResult<()> {
        self.replace_data(offset, 0, data)
    }

    pub fn delete_data(&self, offset: u32, count: u32) -> DomResult<()> {
        self.replace_data(offset, count, "")
    }

    /// Replace `count` characters at `offset` with `data`
    pub fn replace_data(&self, offset: u32, count: u32, data: &str) -> DomResult<()> {
        let doc = self.live_doc()?;
        doc.mutate(|tree| tree.replace_data(self.id(), offset, count, data))
    }

    /// Split a text node at `offset`; returns the new node holding the tail
    pub fn split_text(&self, offset: u32) -> DomResult<Node> {
        if !matches!(self.kind(), NodeKind::Text | NodeKind::CDataSection) {
            return Err(DomException::InvalidNodeType);
        }
        let doc = self.live_doc()?;
        let tail = doc.mutate(|tree| tree.split_text(self.id(), offset))?;
        Ok(doc.proxy(tail))
    }

    /// Concatenated data of this text node and its adjacent text siblings
    pub fn whole_text(&self) -> Option<String> {
        if !matches!(self.kind(), NodeKind::Text | NodeKind::CDataSection) {
            return None;
        }
        self.read(|tree, id| {
            let is_text = |n: fos_dom::NodeId| tree.get(n).is_some_and(fos_dom::Node::is_text);
            let mut first = id;
            while let Some(prev) = tree.prev_sibling(first).filter(|&p| is_text(p)) {
                first = prev;
            }
            let mut text = String::new();
            let mut cur = Some(first);
            while let Some(node) = cur.filter(|&n| is_text(n)) {
                text.push_str(tree.character_data(node).unwrap_or_default());
                cur = tree.next_sibling(node);
            }
            text
        })
    }
}
