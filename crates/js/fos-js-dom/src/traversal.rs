//! NodeIterator and TreeWalker
//!
//! Filtered traversal over a subtree. Both cursors test candidates against
//! a `WhatToShow` mask, then against an optional script filter. The tree
//! is never borrowed while the filter runs, so a filter may mutate it.
//!
//! For a NodeIterator, `Reject` and `Skip` both exclude only the node
//! itself. For a TreeWalker, `Reject` excludes the node's whole subtree.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::BitOr;
use std::rc::Rc;

use fos_dom::{MutationRecord, NodeType};

use crate::document::DocumentInner;
use crate::node::Node;
use crate::{DomException, DomResult};

/// What types of nodes to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WhatToShow(u32);

impl WhatToShow {
    pub const ALL: WhatToShow = WhatToShow(0xFFFF_FFFF);
    pub const ELEMENT: WhatToShow = WhatToShow(0x1);
    pub const ATTRIBUTE: WhatToShow = WhatToShow(0x2);
    pub const TEXT: WhatToShow = WhatToShow(0x4);
    pub const CDATA_SECTION: WhatToShow = WhatToShow(0x8);
    pub const PROCESSING_INSTRUCTION: WhatToShow = WhatToShow(0x40);
    pub const COMMENT: WhatToShow = WhatToShow(0x80);
    pub const DOCUMENT: WhatToShow = WhatToShow(0x100);
    pub const DOCUMENT_TYPE: WhatToShow = WhatToShow(0x200);
    pub const DOCUMENT_FRAGMENT: WhatToShow = WhatToShow(0x400);

    /// Mask from the raw `whatToShow` bits
    pub const fn from_bits(bits: u32) -> Self {
        WhatToShow(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if a node type is shown
    pub fn includes(self, node_type: NodeType) -> bool {
        let flag = 1u32 << (node_type.to_u16() - 1);
        (self.0 & flag) != 0
    }
}

impl Default for WhatToShow {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for WhatToShow {
    type Output = WhatToShow;

    fn bitor(self, rhs: WhatToShow) -> WhatToShow {
        WhatToShow(self.0 | rhs.0)
    }
}

/// Node filter result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    Accept,
    /// NodeIterator: same as `Skip`. TreeWalker: skip the node and its
    /// descendants.
    Reject,
    /// Skip this node but process its children
    Skip,
}

/// Script-supplied node filter
pub trait NodeFilter {
    fn accept_node(&self, node: &Node) -> DomResult<FilterResult>;
}

impl<F> NodeFilter for F
where
    F: Fn(&Node) -> DomResult<FilterResult>,
{
    fn accept_node(&self, node: &Node) -> DomResult<FilterResult> {
        self(node)
    }
}

/// Root, mask and filter shared by both cursors
struct Traversal {
    root: Node,
    what_to_show: WhatToShow,
    filter: Option<Rc<dyn NodeFilter>>,
    active: Cell<bool>,
}

impl Traversal {
    fn new(root: &Node, what_to_show: WhatToShow, filter: Option<Rc<dyn NodeFilter>>) -> Self {
        Self {
            root: root.clone(),
            what_to_show,
            filter,
            active: Cell::new(false),
        }
    }

    /// Mask first, then the script filter
    fn filter(&self, node: &Node) -> DomResult<FilterResult> {
        if self.active.get() {
            return Err(DomException::InvalidState("node filter is already running"));
        }
        let shown = node
            .kind()
            .node_type()
            .is_some_and(|node_type| self.what_to_show.includes(node_type));
        if !shown {
            return Ok(FilterResult::Skip);
        }
        let Some(filter) = &self.filter else {
            return Ok(FilterResult::Accept);
        };
        self.active.set(true);
        let result = filter.accept_node(node);
        self.active.set(false);
        tracing::trace!(node = ?node.id(), ?result, "filtered node");
        result
    }
}

impl fmt::Debug for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal")
            .field("root", &self.root.id())
            .field("what_to_show", &self.what_to_show)
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// NodeIterator
// ============================================================================

/// NodeIterator state; the document holds it weakly to adjust the reference
/// node when part of the tree is removed
#[derive(Debug)]
pub(crate) struct NodeIteratorState {
    traversal: Traversal,
    reference: RefCell<Node>,
    pointer_before: Cell<bool>,
}

impl NodeIteratorState {
    /// Keep the reference node inside the tree after `record` removed the
    /// subtree holding it
    pub(crate) fn adjust_for_removal(&self, doc: &Rc<DocumentInner>, record: &MutationRecord) {
        let root = self.traversal.root.id();
        let reference = self.reference.borrow().id();
        let tree = doc.tree.borrow();

        let removed_holds_reference = record.removed_nodes.iter().any(|&removed| {
            tree.is_inclusive_ancestor(removed, reference)
                && !tree.is_inclusive_ancestor(removed, root)
        });
        if !removed_holds_reference {
            return;
        }

        if self.pointer_before.get() {
            let next = record
                .next_sibling
                .or_else(|| tree.following_skipping_children(record.target, root));
            if let Some(next) = next {
                drop(tree);
                tracing::debug!(from = ?reference, to = ?next, "iterator reference moved forward");
                *self.reference.borrow_mut() = doc.proxy(next);
                return;
            }
            self.pointer_before.set(false);
        }

        let previous = match record.previous_sibling {
            Some(sibling) => tree.last_inclusive_descendant(sibling),
            None => record.target,
        };
        drop(tree);
        tracing::debug!(from = ?reference, to = ?previous, "iterator reference moved back");
        *self.reference.borrow_mut() = doc.proxy(previous);
    }
}

/// Sequential, filtered walk over a subtree in document order
#[derive(Clone)]
pub struct NodeIterator {
    state: Rc<NodeIteratorState>,
}

impl NodeIterator {
    pub fn new(root: &Node, what_to_show: WhatToShow, filter: Option<Rc<dyn NodeFilter>>) -> Self {
        let state = Rc::new(NodeIteratorState {
            traversal: Traversal::new(root, what_to_show, filter),
            reference: RefCell::new(root.clone()),
            pointer_before: Cell::new(true),
        });
        if let Some(doc) = root.doc() {
            doc.register_iterator(Rc::downgrade(&state));
        }
        Self { state }
    }

    pub fn root(&self) -> Node {
        self.state.traversal.root.clone()
    }

    pub fn what_to_show(&self) -> WhatToShow {
        self.state.traversal.what_to_show
    }

    pub fn filter(&self) -> Option<Rc<dyn NodeFilter>> {
        self.state.traversal.filter.clone()
    }

    pub fn reference_node(&self) -> Node {
        self.state.reference.borrow().clone()
    }

    pub fn pointer_before_reference(&self) -> bool {
        self.state.pointer_before.get()
    }

    /// Next accepted node; `None`, with the cursor unchanged, when there
    /// is none
    pub fn next_node(&self) -> DomResult<Option<Node>> {
        self.traverse(true)
    }

    /// Previous accepted node; `None`, with the cursor unchanged, when
    /// there is none
    pub fn previous_node(&self) -> DomResult<Option<Node>> {
        self.traverse(false)
    }

    fn traverse(&self, forward: bool) -> DomResult<Option<Node>> {
        let root = self.state.traversal.root.id();
        let mut node = self.reference_node();
        let mut before = self.state.pointer_before.get();
        loop {
            if forward == before {
                // The first candidate is the reference node itself.
                before = !forward;
            } else {
                let step = if forward {
                    node.related(|tree, id| tree.following(id, root))
                } else {
                    node.related(|tree, id| tree.preceding(id, root))
                };
                match step {
                    Some(next) => node = next,
                    None => return Ok(None),
                }
            }
            if self.state.traversal.filter(&node)? == FilterResult::Accept {
                break;
            }
        }
        *self.state.reference.borrow_mut() = node.clone();
        self.state.pointer_before.set(before);
        Ok(Some(node))
    }

    /// Kept for compatibility; the iterator keeps working
    pub fn detach(&self) {}
}

impl fmt::Debug for NodeIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIterator")
            .field("traversal", &self.state.traversal)
            .field("reference", &self.state.reference.borrow().id())
            .field("pointer_before", &self.state.pointer_before.get())
            .finish()
    }
}

// ============================================================================
// TreeWalker
// ============================================================================

struct TreeWalkerState {
    traversal: Traversal,
    current: RefCell<Node>,
}

/// Filtered, tree-shaped navigation over a subtree
#[derive(Clone)]
pub struct TreeWalker {
    state: Rc<TreeWalkerState>,
}

impl TreeWalker {
    pub fn new(root: &Node, what_to_show: WhatToShow, filter: Option<Rc<dyn NodeFilter>>) -> Self {
        Self {
            state: Rc::new(TreeWalkerState {
                traversal: Traversal::new(root, what_to_show, filter),
                current: RefCell::new(root.clone()),
            }),
        }
    }

    pub fn root(&self) -> Node {
        self.state.traversal.root.clone()
    }

    pub fn what_to_show(&self) -> WhatToShow {
        self.state.traversal.what_to_show
    }

    pub fn filter(&self) -> Option<Rc<dyn NodeFilter>> {
        self.state.traversal.filter.clone()
    }

    pub fn current_node(&self) -> Node {
        self.state.current.borrow().clone()
    }

    pub fn set_current_node(&self, node: &Node) {
        *self.state.current.borrow_mut() = node.clone();
    }

    fn filter_node(&self, node: &Node) -> DomResult<FilterResult> {
        self.state.traversal.filter(node)
    }

    fn accept(&self, node: Node) -> DomResult<Option<Node>> {
        self.set_current_node(&node);
        Ok(Some(node))
    }

    /// Closest accepted ancestor, stopping at the root
    pub fn parent_node(&self) -> DomResult<Option<Node>> {
        let root = self.root();
        let mut node = self.current_node();
        while node != root {
            node = match node.parent_node() {
                Some(parent) => parent,
                None => return Ok(None),
            };
            if self.filter_node(&node)? == FilterResult::Accept {
                return self.accept(node);
            }
        }
        Ok(None)
    }

    pub fn first_child(&self) -> DomResult<Option<Node>> {
        self.traverse_children(true)
    }

    pub fn last_child(&self) -> DomResult<Option<Node>> {
        self.traverse_children(false)
    }

    fn traverse_children(&self, first: bool) -> DomResult<Option<Node>> {
        let root = self.root();
        let current = self.current_node();
        let child_of = |n: &Node| if first { n.first_child() } else { n.last_child() };
        let sibling_of = |n: &Node| if first { n.next_sibling() } else { n.previous_sibling() };

        let mut candidate = child_of(&current);
        'outer: while let Some(node) = candidate {
            match self.filter_node(&node)? {
                FilterResult::Accept => return self.accept(node),
                FilterResult::Skip => {
                    if let Some(child) = child_of(&node) {
                        candidate = Some(child);
                        continue;
                    }
                }
                FilterResult::Reject => {}
            }
            let mut cur = node;
            loop {
                if let Some(sibling) = sibling_of(&cur) {
                    candidate = Some(sibling);
                    continue 'outer;
                }
                match cur.parent_node() {
                    Some(parent) if parent != root && parent != current => cur = parent,
                    _ => return Ok(None),
                }
            }
        }
        Ok(None)
    }

    pub fn next_sibling(&self) -> DomResult<Option<Node>> {
        self.traverse_siblings(true)
    }

    pub fn previous_sibling(&self) -> DomResult<Option<Node>> {
        self.traverse_siblings(false)
    }

    fn traverse_siblings(&self, next: bool) -> DomResult<Option<Node>> {
        let root = self.root();
        let mut node = self.current_node();
        if node == root {
            return Ok(None);
        }
        let sibling_of = |n: &Node| if next { n.next_sibling() } else { n.previous_sibling() };
        let child_of = |n: &Node| if next { n.first_child() } else { n.last_child() };

        loop {
            let mut sibling = sibling_of(&node);
            while let Some(candidate) = sibling {
                node = candidate;
                let result = self.filter_node(&node)?;
                if result == FilterResult::Accept {
                    return self.accept(node);
                }
                sibling = child_of(&node);
                if result == FilterResult::Reject || sibling.is_none() {
                    sibling = sibling_of(&node);
                }
            }
            node = match node.parent_node() {
                Some(parent) => parent,
                None => return Ok(None),
            };
            if node == root || self.filter_node(&node)? == FilterResult::Accept {
                return Ok(None);
            }
        }
    }

    /// Previous accepted node in document order
    pub fn previous_node(&self) -> DomResult<Option<Node>> {
        let root = self.root();
        let mut node = self.current_node();
        while node != root {
            let mut sibling = node.previous_sibling();
            while let Some(candidate) = sibling {
                node = candidate;
                let mut result = self.filter_node(&node)?;
                while result != FilterResult::Reject {
                    match node.last_child() {
                        Some(child) => {
                            node = child;
                            result = self.filter_node(&node)?;
                        }
                        None => break,
                    }
                }
                if result == FilterResult::Accept {
                    return self.accept(node);
                }
                sibling = node.previous_sibling();
            }
            node = match node.parent_node() {
                Some(parent) if node != root => parent,
                _ => return Ok(None),
            };
            if self.filter_node(&node)? == FilterResult::Accept {
                return self.accept(node);
            }
        }
        Ok(None)
    }

    /// Next accepted node in document order
    pub fn next_node(&self) -> DomResult<Option<Node>> {
        let root = self.root();
        let mut node = self.current_node();
        let mut result = FilterResult::Accept;
        loop {
            while result != FilterResult::Reject {
                match node.first_child() {
                    Some(child) => {
                        node = child;
                        result = self.filter_node(&node)?;
                        if result == FilterResult::Accept {
                            return self.accept(node);
                        }
                    }
                    None => break,
                }
            }

            let mut following = None;
            let mut cur = Some(node.clone());
            while let Some(n) = cur {
                if n == root {
                    return Ok(None);
                }
                if let Some(sibling) = n.next_sibling() {
                    following = Some(sibling);
                    break;
                }
                cur = n.parent_node();
            }
            node = match following {
                Some(sibling) => sibling,
                None => return Ok(None),
            };
            result = self.filter_node(&node)?;
            if result == FilterResult::Accept {
                return self.accept(node);
            }
        }
    }
}

impl fmt::Debug for TreeWalker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeWalker")
            .field("traversal", &self.state.traversal)
            .field("current", &self.state.current.borrow().id())
            .finish()
    }
}
