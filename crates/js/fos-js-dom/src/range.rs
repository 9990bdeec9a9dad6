//! Range and StaticRange
//!
//! A range is a pair of boundary points. Each boundary can be set on its
//! own: setters validate the node and offset but never reorder or collapse
//! the other boundary, so a range whose start lies after its end is
//! representable. Content operations hand the boundary pair to the backing
//! engine's range primitives and adopt the boundaries it reports back.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use fos_dom::{BoundaryPoint, DomTree, NodeId};

use crate::document::DocumentInner;
use crate::node::{Node, NodeKind};
use crate::{Document, DomException, DomResult};

/// Read-only view shared by `Range` and `StaticRange`
pub trait AbstractRange {
    fn start_container(&self) -> Node;
    fn start_offset(&self) -> u32;
    fn end_container(&self) -> Node;
    fn end_offset(&self) -> u32;

    /// Start and end are the same boundary point
    fn collapsed(&self) -> bool {
        self.start_container() == self.end_container() && self.start_offset() == self.end_offset()
    }
}

/// A boundary point held by proxy
#[derive(Debug, Clone, PartialEq)]
struct Boundary {
    node: Node,
    offset: u32,
}

impl Boundary {
    fn point(&self) -> BoundaryPoint {
        BoundaryPoint::new(self.node.id(), self.offset)
    }
}

fn ordering_sign(ordering: Ordering) -> i16 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Mutable range
#[derive(Debug, PartialEq)]
pub struct Range {
    start: Boundary,
    end: Boundary,
}

impl Range {
    pub const START_TO_START: u16 = 0;
    pub const START_TO_END: u16 = 1;
    pub const END_TO_END: u16 = 2;
    pub const END_TO_START: u16 = 3;

    /// New range collapsed at `(document, 0)`
    pub fn new(document: &Document) -> Self {
        let point = Boundary {
            node: document.node(),
            offset: 0,
        };
        Self {
            start: point.clone(),
            end: point,
        }
    }

    /// Validate a prospective boundary point
    fn boundary(&self, node: &Node, offset: u32) -> DomResult<Boundary> {
        if node.kind() == NodeKind::DocumentType {
            return Err(DomException::InvalidNodeType);
        }
        self.start.node.same_document(node)?;
        let length = node.length();
        if offset > length {
            return Err(DomException::IndexSize { offset, length });
        }
        Ok(Boundary {
            node: node.clone(),
            offset,
        })
    }

    /// `(parent, index)` of `node`, plus one for the point after it
    fn boundary_around(&self, node: &Node, after: bool) -> DomResult<Boundary> {
        let parent = node
            .parent_node()
            .ok_or(DomException::NotFound("node has no parent"))?;
        let index = node.read(DomTree::index).unwrap_or(0);
        self.boundary(&parent, if after { index + 1 } else { index })
    }

    // --- Setters ---

    /// Move the start; the end is left where it is
    pub fn set_start(&mut self, node: &Node, offset: u32) -> DomResult<()> {
        self.start = self.boundary(node, offset)?;
        Ok(())
    }

    /// Move the end; the start is left where it is
    pub fn set_end(&mut self, node: &Node, offset: u32) -> DomResult<()> {
        self.end = self.boundary(node, offset)?;
        Ok(())
    }

    pub fn set_start_before(&mut self, node: &Node) -> DomResult<()> {
        self.start = self.boundary_around(node, false)?;
        Ok(())
    }

    pub fn set_start_after(&mut self, node: &Node) -> DomResult<()> {
        self.start = self.boundary_around(node, true)?;
        Ok(())
    }

    pub fn set_end_before(&mut self, node: &Node) -> DomResult<()> {
        self.end = self.boundary_around(node, false)?;
        Ok(())
    }

    pub fn set_end_after(&mut self, node: &Node) -> DomResult<()> {
        self.end = self.boundary_around(node, true)?;
        Ok(())
    }

    /// Select `node` itself
    pub fn select_node(&mut self, node: &Node) -> DomResult<()> {
        let start = self.boundary_around(node, false)?;
        let end = self.boundary_around(node, true)?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Select the contents of `node`
    pub fn select_node_contents(&mut self, node: &Node) -> DomResult<()> {
        let start = self.boundary(node, 0)?;
        let end = self.boundary(node, node.length())?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Copy one boundary onto the other
    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start.clone();
        } else {
            self.start = self.end.clone();
        }
    }

    // --- Queries ---

    /// Deepest node containing both boundaries
    pub fn common_ancestor_container(&self) -> Option<Node> {
        let end = self.end.node.id();
        self.start
            .node
            .related(|tree, start| tree.common_ancestor(start, end))
    }

    /// Compare one boundary of `self` with one boundary of `source`,
    /// chosen by `how` (`START_TO_START` .. `END_TO_START`)
    pub fn compare_boundary_points(&self, how: u16, source: &Range) -> DomResult<i16> {
        let (this, other) = match how {
            Self::START_TO_START => (&self.start, &source.start),
            Self::START_TO_END => (&self.end, &source.start),
            Self::END_TO_END => (&self.end, &source.end),
            Self::END_TO_START => (&self.start, &source.end),
            _ => return Err(DomException::NotSupported("unknown boundary comparison mode")),
        };
        let doc = this.node.same_document(&other.node)?;
        let tree = doc.tree.borrow();
        if tree.root_of(this.node.id()) != tree.root_of(other.node.id()) {
            return Err(DomException::WrongDocument);
        }
        Ok(ordering_sign(tree.boundary_position(this.point(), other.point())))
    }

    /// Check a point against this range; doctypes and bad offsets fail
    fn check_point(&self, tree: &DomTree, node: &Node, offset: u32) -> DomResult<()> {
        if node.kind() == NodeKind::DocumentType {
            return Err(DomException::InvalidNodeType);
        }
        let length = tree.length(node.id());
        if offset > length {
            return Err(DomException::IndexSize { offset, length });
        }
        Ok(())
    }

    fn shares_root(&self, tree: &DomTree, node: &Node) -> bool {
        self.start.node.in_same_document(node)
            && tree.root_of(node.id()) == tree.root_of(self.start.node.id())
    }

    /// Whether `(node, offset)` lies between start and end
    pub fn is_point_in_range(&self, node: &Node, offset: u32) -> DomResult<bool> {
        let doc = self.start.node.live_doc()?;
        let tree = doc.tree.borrow();
        if !self.shares_root(&tree, node) {
            return Ok(false);
        }
        self.check_point(&tree, node, offset)?;
        let point = BoundaryPoint::new(node.id(), offset);
        Ok(tree.boundary_position(point, self.start.point()) != Ordering::Less
            && tree.boundary_position(point, self.end.point()) != Ordering::Greater)
    }

    /// -1, 0 or 1 as `(node, offset)` is before, inside or after the range
    pub fn compare_point(&self, node: &Node, offset: u32) -> DomResult<i16> {
        let doc = self.start.node.live_doc()?;
        let tree = doc.tree.borrow();
        if !self.shares_root(&tree, node) {
            return Err(DomException::WrongDocument);
        }
        self.check_point(&tree, node, offset)?;
        let point = BoundaryPoint::new(node.id(), offset);
        if tree.boundary_position(point, self.start.point()) == Ordering::Less {
            Ok(-1)
        } else if tree.boundary_position(point, self.end.point()) == Ordering::Greater {
            Ok(1)
        } else {
            Ok(0)
        }
    }

    /// Whether any part of `node` lies inside the range
    pub fn intersects_node(&self, node: &Node) -> bool {
        let Some(doc) = self.start.node.doc() else {
            return false;
        };
        let tree = doc.tree.borrow();
        if !self.shares_root(&tree, node) {
            return false;
        }
        let Some(parent) = tree.parent(node.id()) else {
            return true;
        };
        let index = tree.index(node.id());
        tree.boundary_position(BoundaryPoint::new(parent, index), self.end.point()) == Ordering::Less
            && tree.boundary_position(BoundaryPoint::new(parent, index + 1), self.start.point())
                == Ordering::Greater
    }

    /// Copy of this range with its own boundary points
    pub fn clone_range(&self) -> Range {
        Range {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    /// Kept for compatibility; does nothing
    pub fn detach(&self) {}

    // --- Content ---

    /// Document and boundary pair, provided both boundaries are still
    /// within their nodes
    fn checked_points(&self) -> DomResult<(Rc<DocumentInner>, BoundaryPoint, BoundaryPoint)> {
        let doc = self.start.node.same_document(&self.end.node)?;
        {
            let tree = doc.tree.borrow();
            for boundary in [&self.start, &self.end] {
                let length = tree.length(boundary.node.id());
                if boundary.offset > length {
                    return Err(DomException::IndexSize {
                        offset: boundary.offset,
                        length,
                    });
                }
            }
        }
        Ok((doc, self.start.point(), self.end.point()))
    }

    fn adopt(&mut self, doc: &Rc<DocumentInner>, start: BoundaryPoint, end: BoundaryPoint) {
        self.start = Boundary {
            node: doc.proxy(start.node),
            offset: start.offset,
        };
        self.end = Boundary {
            node: doc.proxy(end.node),
            offset: end.offset,
        };
    }

    /// Copy the selected contents into a new fragment
    pub fn clone_contents(&self) -> DomResult<Node> {
        let (doc, start, end) = self.checked_points()?;
        let fragment = doc.mutate(|tree| tree.clone_contents(start, end))?;
        tracing::debug!(?start, ?end, "cloned range contents");
        Ok(doc.proxy(fragment))
    }

    /// Move the selected contents into a new fragment; the range collapses
    pub fn extract_contents(&mut self) -> DomResult<Node> {
        let (doc, start, end) = self.checked_points()?;
        let (fragment, collapsed) = doc.mutate(|tree| tree.extract_contents(start, end))?;
        tracing::debug!(?start, ?end, "extracted range contents");
        self.adopt(&doc, collapsed, collapsed);
        Ok(doc.proxy(fragment))
    }

    /// Remove the selected contents; the range collapses
    pub fn delete_contents(&mut self) -> DomResult<()> {
        let (doc, start, end) = self.checked_points()?;
        let collapsed = doc.mutate(|tree| tree.delete_contents(start, end))?;
        tracing::debug!(?start, ?end, "deleted range contents");
        self.adopt(&doc, collapsed, collapsed);
        Ok(())
    }

    /// Insert `node` at the start of the range
    pub fn insert_node(&mut self, node: &Node) -> DomResult<()> {
        let (doc, start, end) = self.checked_points()?;
        self.start.node.same_document(node)?;
        let (new_start, new_end) = doc.mutate(|tree| tree.insert_node(start, end, node.id()))?;
        self.adopt(&doc, new_start, new_end);
        Ok(())
    }

    /// Move the selected contents into `new_parent` and insert
    /// `new_parent` in their place; the range then selects `new_parent`
    pub fn surround_contents(&mut self, new_parent: &Node) -> DomResult<()> {
        let (doc, start, end) = self.checked_points()?;
        self.start.node.same_document(new_parent)?;
        let (new_start, new_end) =
            doc.mutate(|tree| tree.surround_contents(start, end, new_parent.id()))?;
        self.adopt(&doc, new_start, new_end);
        Ok(())
    }
}

impl AbstractRange for Range {
    fn start_container(&self) -> Node {
        self.start.node.clone()
    }

    fn start_offset(&self) -> u32 {
        self.start.offset
    }

    fn end_container(&self) -> Node {
        self.end.node.clone()
    }

    fn end_offset(&self) -> u32 {
        self.end.offset
    }
}

/// Text between the boundaries, in document order
impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.end.point();
        let text = self
            .start
            .node
            .read(|tree, id| tree.text_between(BoundaryPoint::new(id, self.start.offset), end))
            .unwrap_or_default();
        f.write_str(&text)
    }
}

/// Immutable range; boundaries are not validated against node lengths
#[derive(Debug, Clone, PartialEq)]
pub struct StaticRange {
    start: Boundary,
    end: Boundary,
}

impl StaticRange {
    pub fn new(
        start_container: &Node,
        start_offset: u32,
        end_container: &Node,
        end_offset: u32,
    ) -> DomResult<Self> {
        for container in [start_container, end_container] {
            if matches!(container.kind(), NodeKind::DocumentType | NodeKind::Attribute) {
                return Err(DomException::InvalidNodeType);
            }
        }
        Ok(Self {
            start: Boundary {
                node: start_container.clone(),
                offset: start_offset,
            },
            end: Boundary {
                node: end_container.clone(),
                offset: end_offset,
            },
        })
    }

    /// Same boundary points as `range`
    pub fn from_range(range: &Range) -> Self {
        Self {
            start: range.start.clone(),
            end: range.end.clone(),
        }
    }

    /// Backing ids of both boundaries
    pub fn ids(&self) -> (NodeId, NodeId) {
        (self.start.node.id(), self.end.node.id())
    }
}

impl AbstractRange for StaticRange {
    fn start_container(&self) -> Node {
        self.start.node.clone()
    }

    fn start_offset(&self) -> u32 {
        self.start.offset
    }

    fn end_container(&self) -> Node {
        self.end.node.clone()
    }

    fn end_offset(&self) -> u32 {
        self.end.offset
    }
}
