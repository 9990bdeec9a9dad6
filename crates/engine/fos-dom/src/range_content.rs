//! Range contents
//!
//! Boundary points and the DOM range algorithms that read or rewrite the
//! nodes between two of them: text extraction, cloning, extraction,
//! deletion, insertion and surrounding. Partial text nodes at either end
//! are split or trimmed here, and start/end containers may sit at any
//! depth below their common ancestor.
//!
//! Boundary points passed in must be valid (offset within the container's
//! length). A start that lies after its end, or in another tree, selects
//! nothing.

use std::cmp::Ordering;

use crate::node::substring;
use crate::{DomError, DomResult, DomTree, NodeData, NodeId, NodeType};

/// Range boundary point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    /// The container node
    pub node: NodeId,
    /// Offset within the container (character offset for character data,
    /// child index otherwise)
    pub offset: u32,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: u32) -> Self {
        Self { node, offset }
    }
}

/// Children of the common ancestor touched by a range
struct RangeParts {
    first_partial: Option<NodeId>,
    last_partial: Option<NodeId>,
    contained: Vec<NodeId>,
}

impl DomTree {
    /// Position of boundary point `a` relative to `b` (same tree)
    pub fn boundary_position(&self, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        if self.tree_order(a.node, b.node) == Ordering::Greater {
            return self.boundary_position(b, a).reverse();
        }
        if self.is_ancestor(a.node, b.node) {
            let child = self
                .inclusive_ancestors(b.node)
                .find(|&c| self.parent(c) == Some(a.node));
            if let Some(child) = child {
                if self.index(child) < a.offset {
                    return Ordering::Greater;
                }
            }
        }
        Ordering::Less
    }

    /// First inclusive ancestor of `a` that is also an inclusive ancestor of `b`
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        self.inclusive_ancestors(a)
            .find(|&candidate| self.is_inclusive_ancestor(candidate, b))
    }

    /// Whether the boundary pair selects anything at all
    fn selects_nothing(&self, start: BoundaryPoint, end: BoundaryPoint) -> bool {
        self.root_of(start.node) != self.root_of(end.node)
            || self.boundary_position(start, end) != Ordering::Less
    }

    fn is_contained(&self, node: NodeId, start: BoundaryPoint, end: BoundaryPoint) -> bool {
        self.root_of(node) == self.root_of(start.node)
            && self.boundary_position(BoundaryPoint::new(node, 0), start) == Ordering::Greater
            && self.boundary_position(BoundaryPoint::new(node, self.length(node)), end)
                == Ordering::Less
    }

    fn is_partially_contained(&self, node: NodeId, start: BoundaryPoint, end: BoundaryPoint) -> bool {
        self.is_inclusive_ancestor(node, start.node) != self.is_inclusive_ancestor(node, end.node)
    }

    fn range_parts(
        &self,
        common: NodeId,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> DomResult<RangeParts> {
        let first_partial = if self.is_inclusive_ancestor(start.node, end.node) {
            None
        } else {
            self.children(common)
                .map(|(c, _)| c)
                .find(|&c| self.is_partially_contained(c, start, end))
        };
        let last_partial = if self.is_inclusive_ancestor(end.node, start.node) {
            None
        } else {
            self.children(common)
                .map(|(c, _)| c)
                .filter(|&c| self.is_partially_contained(c, start, end))
                .last()
        };
        let contained: Vec<NodeId> = self
            .children(common)
            .map(|(c, _)| c)
            .filter(|&c| self.is_contained(c, start, end))
            .collect();
        if contained
            .iter()
            .any(|&c| self.node_type(c) == Some(NodeType::DocumentType))
        {
            return Err(DomError::HierarchyRequest("range contains a doctype"));
        }
        Ok(RangeParts {
            first_partial,
            last_partial,
            contained,
        })
    }

    /// Overwrite character data of a freshly cloned, detached node
    fn overwrite_clone_data(&mut self, id: NodeId, data: String) {
        if let Some(current) = self.get_mut(id).and_then(|n| n.character_data_mut()) {
            *current = data;
        }
    }

    fn clone_with_data(&mut self, source: NodeId, offset: u32, count: u32) -> DomResult<NodeId> {
        let data = self.character_data(source).ok_or(DomError::InvalidNodeType)?;
        let data = substring(data, offset, count);
        let copy = self.clone_node(source, false)?;
        self.overwrite_clone_data(copy, data);
        Ok(copy)
    }

    /// Concatenated data of the text nodes between two boundary points
    pub fn text_between(&self, start: BoundaryPoint, end: BoundaryPoint) -> String {
        if self.selects_nothing(start, end) {
            return String::new();
        }
        let text_of = |id: NodeId| self.get(id).and_then(|n| n.as_text());

        if start.node == end.node {
            if let Some(data) = text_of(start.node) {
                return substring(data, start.offset, end.offset - start.offset);
            }
        }

        let mut out = String::new();
        if let Some(data) = text_of(start.node) {
            out.push_str(&substring(data, start.offset, u32::MAX));
        }
        let mut cur = self.following(start.node, self.root_of(start.node));
        while let Some(id) = cur {
            if self.boundary_position(BoundaryPoint::new(id, 0), end) != Ordering::Less {
                break;
            }
            if let Some(data) = text_of(id) {
                if self.is_contained(id, start, end) {
                    out.push_str(data);
                }
            }
            cur = self.following(id, self.root_of(id));
        }
        if let Some(data) = text_of(end.node) {
            out.push_str(&substring(data, 0, end.offset));
        }
        out
    }

    /// Copy the selected nodes into a new document fragment
    pub fn clone_contents(&mut self, start: BoundaryPoint, end: BoundaryPoint) -> DomResult<NodeId> {
        let fragment = self.create_fragment();
        if self.selects_nothing(start, end) {
            return Ok(fragment);
        }

        if start.node == end.node && self.get(start.node).is_some_and(|n| n.is_character_data()) {
            let copy = self.clone_with_data(start.node, start.offset, end.offset - start.offset)?;
            self.insert_unchecked(copy, fragment, None);
            return Ok(fragment);
        }

        let common = self
            .common_ancestor(start.node, end.node)
            .ok_or(DomError::WrongDocument)?;
        let parts = self.range_parts(common, start, end)?;

        if let Some(first) = parts.first_partial {
            if self.get(first).is_some_and(|n| n.is_character_data()) {
                let count = self.length(start.node) - start.offset;
                let copy = self.clone_with_data(start.node, start.offset, count)?;
                self.insert_unchecked(copy, fragment, None);
            } else {
                let copy = self.clone_node(first, false)?;
                self.insert_unchecked(copy, fragment, None);
                let sub_end = BoundaryPoint::new(first, self.length(first));
                let sub = self.clone_contents(start, sub_end)?;
                self.insert_unchecked(sub, copy, None);
            }
        }

        for child in parts.contained {
            let copy = self.clone_node(child, true)?;
            self.insert_unchecked(copy, fragment, None);
        }

        if let Some(last) = parts.last_partial {
            if self.get(last).is_some_and(|n| n.is_character_data()) {
                let copy = self.clone_with_data(end.node, 0, end.offset)?;
                self.insert_unchecked(copy, fragment, None);
            } else {
                let copy = self.clone_node(last, false)?;
                self.insert_unchecked(copy, fragment, None);
                let sub_start = BoundaryPoint::new(last, 0);
                let sub = self.clone_contents(sub_start, end)?;
                self.insert_unchecked(sub, copy, None);
            }
        }

        Ok(fragment)
    }

    /// Where a range collapses to after its contents are removed
    fn collapse_point_after_removal(&self, start: BoundaryPoint, end: BoundaryPoint) -> BoundaryPoint {
        if self.is_inclusive_ancestor(start.node, end.node) {
            return start;
        }
        let mut reference = start.node;
        while let Some(parent) = self.parent(reference) {
            if self.is_inclusive_ancestor(parent, end.node) {
                return BoundaryPoint::new(parent, self.index(reference) + 1);
            }
            reference = parent;
        }
        start
    }

    /// Move the selected nodes into a new document fragment.
    /// Returns the fragment and the point the range collapses to.
    pub fn extract_contents(
        &mut self,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> DomResult<(NodeId, BoundaryPoint)> {
        let fragment = self.create_fragment();
        if self.selects_nothing(start, end) {
            return Ok((fragment, start));
        }
        tracing::trace!(?start, ?end, "extracting range contents");

        if start.node == end.node && self.get(start.node).is_some_and(|n| n.is_character_data()) {
            let count = end.offset - start.offset;
            let copy = self.clone_with_data(start.node, start.offset, count)?;
            self.insert_unchecked(copy, fragment, None);
            self.replace_data(start.node, start.offset, count, "")?;
            return Ok((fragment, start));
        }

        let common = self
            .common_ancestor(start.node, end.node)
            .ok_or(DomError::WrongDocument)?;
        let parts = self.range_parts(common, start, end)?;
        let collapse_to = self.collapse_point_after_removal(start, end);

        if let Some(first) = parts.first_partial {
            if self.get(first).is_some_and(|n| n.is_character_data()) {
                let count = self.length(start.node) - start.offset;
                let copy = self.clone_with_data(start.node, start.offset, count)?;
                self.insert_unchecked(copy, fragment, None);
                self.replace_data(start.node, start.offset, count, "")?;
            } else {
                let copy = self.clone_node(first, false)?;
                self.insert_unchecked(copy, fragment, None);
                let sub_end = BoundaryPoint::new(first, self.length(first));
                let (sub, _) = self.extract_contents(start, sub_end)?;
                self.insert_unchecked(sub, copy, None);
            }
        }

        for child in parts.contained {
            self.insert_unchecked(child, fragment, None);
        }

        if let Some(last) = parts.last_partial {
            if self.get(last).is_some_and(|n| n.is_character_data()) {
                let copy = self.clone_with_data(end.node, 0, end.offset)?;
                self.insert_unchecked(copy, fragment, None);
                self.replace_data(end.node, 0, end.offset, "")?;
            } else {
                let copy = self.clone_node(last, false)?;
                self.insert_unchecked(copy, fragment, None);
                let sub_start = BoundaryPoint::new(last, 0);
                let (sub, _) = self.extract_contents(sub_start, end)?;
                self.insert_unchecked(sub, copy, None);
            }
        }

        Ok((fragment, collapse_to))
    }

    /// Remove the selected nodes. Returns the point the range collapses to.
    pub fn delete_contents(&mut self, start: BoundaryPoint, end: BoundaryPoint) -> DomResult<BoundaryPoint> {
        if self.selects_nothing(start, end) {
            return Ok(start);
        }
        tracing::trace!(?start, ?end, "deleting range contents");

        if start.node == end.node && self.get(start.node).is_some_and(|n| n.is_character_data()) {
            self.replace_data(start.node, start.offset, end.offset - start.offset, "")?;
            return Ok(start);
        }

        let common = self
            .common_ancestor(start.node, end.node)
            .ok_or(DomError::WrongDocument)?;
        let to_remove: Vec<NodeId> = self
            .descendants(common)
            .filter(|&id| self.is_contained(id, start, end))
            .filter(|&id| {
                self.parent(id)
                    .is_none_or(|parent| !self.is_contained(parent, start, end))
            })
            .collect();
        let collapse_to = self.collapse_point_after_removal(start, end);

        if self.get(start.node).is_some_and(|n| n.is_character_data()) {
            let count = self.length(start.node) - start.offset;
            self.replace_data(start.node, start.offset, count, "")?;
        }
        for id in to_remove {
            self.remove(id);
        }
        if self.get(end.node).is_some_and(|n| n.is_character_data()) {
            self.replace_data(end.node, 0, end.offset, "")?;
        }

        Ok(collapse_to)
    }

    /// Insert `node` at the start of the range.
    /// Returns the range's boundary points after the insertion.
    pub fn insert_node(
        &mut self,
        start: BoundaryPoint,
        end: BoundaryPoint,
        node: NodeId,
    ) -> DomResult<(BoundaryPoint, BoundaryPoint)> {
        let start_type = self.node_type(start.node).ok_or(DomError::NotFound)?;
        let start_is_text = matches!(start_type, NodeType::Text | NodeType::CDataSection);
        if matches!(start_type, NodeType::ProcessingInstruction | NodeType::Comment)
            || (start_is_text && self.parent(start.node).is_none())
            || start.node == node
        {
            return Err(DomError::HierarchyRequest("cannot insert at this boundary"));
        }

        let collapsed = start == end;
        let mut reference = if start_is_text {
            Some(start.node)
        } else {
            self.child_at(start.node, start.offset)
        };
        let parent = match reference {
            Some(r) => self.parent(r).ok_or(DomError::NotFound)?,
            None => start.node,
        };
        self.ensure_pre_insertion_validity(node, parent, reference)?;

        let mut new_start = start;
        let mut new_end = end;

        if start_is_text {
            let split_index = self.index(start.node);
            let tail = self.split_text(start.node, start.offset)?;
            for point in [&mut new_start, &mut new_end] {
                if point.node == start.node && point.offset > start.offset {
                    *point = BoundaryPoint::new(tail, point.offset - start.offset);
                } else if point.node == parent && point.offset > split_index {
                    point.offset += 1;
                }
            }
            reference = Some(tail);
        }
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }

        if let Some(old_parent) = self.parent(node) {
            let old_index = self.index(node);
            for point in [&mut new_start, &mut new_end] {
                if self.is_inclusive_ancestor(node, point.node) {
                    *point = BoundaryPoint::new(old_parent, old_index);
                }
            }
            self.remove(node);
            for point in [&mut new_start, &mut new_end] {
                if point.node == old_parent && point.offset > old_index {
                    point.offset -= 1;
                }
            }
        }

        let count = if self.node_type(node) == Some(NodeType::DocumentFragment) {
            self.child_count(node)
        } else {
            1
        };
        let insert_at = match reference {
            Some(r) => self.index(r),
            None => self.length(parent),
        };
        self.insert_unchecked(node, parent, reference);
        for point in [&mut new_start, &mut new_end] {
            if point.node == parent && point.offset > insert_at {
                point.offset += count;
            }
        }

        if collapsed {
            new_end = BoundaryPoint::new(parent, insert_at + count);
        }
        tracing::debug!(?node, ?parent, insert_at, count, "inserted node into range");
        Ok((new_start, new_end))
    }

    /// Move the selected contents into `new_parent` and put `new_parent`
    /// where they were. Returns the boundary points selecting `new_parent`.
    pub fn surround_contents(
        &mut self,
        start: BoundaryPoint,
        end: BoundaryPoint,
        new_parent: NodeId,
    ) -> DomResult<(BoundaryPoint, BoundaryPoint)> {
        let is_text = |tree: &DomTree, id: NodeId| {
            matches!(
                tree.node_type(id),
                Some(NodeType::Text | NodeType::CDataSection)
            )
        };
        let partial_non_text = self
            .inclusive_ancestors(start.node)
            .filter(|&a| !self.is_inclusive_ancestor(a, end.node))
            .chain(
                self.inclusive_ancestors(end.node)
                    .filter(|&a| !self.is_inclusive_ancestor(a, start.node)),
            )
            .any(|a| !is_text(self, a));
        if partial_non_text {
            tracing::debug!(?start, ?end, "surround rejected: partial non-text selection");
            return Err(DomError::InvalidState("range partially selects a non-text node"));
        }
        match self.get(new_parent).map(|n| &n.data) {
            None => return Err(DomError::NotFound),
            Some(NodeData::Document | NodeData::Doctype { .. } | NodeData::DocumentFragment) => {
                return Err(DomError::InvalidNodeType);
            }
            Some(_) => {}
        }

        let (fragment, collapsed_at) = self.extract_contents(start, end)?;
        let old_children: Vec<NodeId> = self.children(new_parent).map(|(c, _)| c).collect();
        for child in old_children {
            self.remove(child);
        }
        self.insert_node(collapsed_at, collapsed_at, new_parent)?;
        self.append_child(new_parent, fragment)?;

        let parent = self.parent(new_parent).ok_or(DomError::InvalidNodeType)?;
        let index = self.index(new_parent);
        Ok((
            BoundaryPoint::new(parent, index),
            BoundaryPoint::new(parent, index + 1),
        ))
    }
}
