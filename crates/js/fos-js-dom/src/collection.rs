//! Collections
//!
//! Ordered views over the nodes below a root. Every collection type
//! (`childNodes`, `children`, `getElementsByTagName`, `forms`, ...) is one
//! `Collection` configured with:
//! - a scope: the root's children, or all of its descendants
//! - a predicate selecting the nodes that belong to the view
//! - for live collections, an effect function deciding which mutations
//!   invalidate the cached list
//!
//! The node list is materialized lazily, in tree order, on first read and
//! kept until a mutation the effect function maps to `Reset` arrives. A
//! static collection is materialized once at creation and never changes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use fos_dom::{DomTree, MutationRecord, MutationType, NodeId};

use crate::document::DocumentInner;
use crate::node::Node;

/// Which nodes below the root are candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// Direct children of the root
    Children,
    /// All descendants of the root, in tree order
    Descendants,
}

/// Membership test, run with the tree borrowed
pub type Predicate = Rc<dyn Fn(&DomTree, NodeId) -> bool>;

/// Maps a mutation to what it means for a live collection
pub type EffectFn = Rc<dyn Fn(&MutationEvent<'_>) -> MutationEffect>;

/// What a mutation does to a live collection's cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEffect {
    /// Keep the cached list
    None,
    /// Drop the cached list; the next read recomputes it
    Reset,
}

/// A mutation below a live collection's root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEvent<'a> {
    /// Children were added to or removed from `target`
    ChildList {
        target: NodeId,
        added: &'a [NodeId],
        removed: &'a [NodeId],
    },
    /// Attribute `name` of `target` was set or removed
    Attribute { target: NodeId, name: &'a str },
    /// Text of `target` changed
    CharacterData { target: NodeId },
}

impl<'a> MutationEvent<'a> {
    pub fn from_record(record: &'a MutationRecord) -> Self {
        match record.mutation_type {
            MutationType::ChildList => MutationEvent::ChildList {
                target: record.target,
                added: &record.added_nodes,
                removed: &record.removed_nodes,
            },
            MutationType::Attributes => MutationEvent::Attribute {
                target: record.target,
                name: record.attribute_name.as_deref().unwrap_or_default(),
            },
            MutationType::CharacterData => MutationEvent::CharacterData {
                target: record.target,
            },
        }
    }

    pub fn target(&self) -> NodeId {
        match *self {
            MutationEvent::ChildList { target, .. }
            | MutationEvent::Attribute { target, .. }
            | MutationEvent::CharacterData { target } => target,
        }
    }

    /// Name of the changed attribute, for attribute events
    pub fn attribute_name(&self) -> Option<&'a str> {
        match *self {
            MutationEvent::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_child_list(&self) -> bool {
        matches!(self, MutationEvent::ChildList { .. })
    }
}

/// Default effect: any change to the child lists below the root resets
pub fn reset_on_child_list(event: &MutationEvent<'_>) -> MutationEffect {
    if event.is_child_list() {
        MutationEffect::Reset
    } else {
        MutationEffect::None
    }
}

/// Effect that also resets when one of `attributes` changes
pub fn reset_on_attributes(attributes: &'static [&'static str]) -> EffectFn {
    Rc::new(move |event: &MutationEvent<'_>| match event.attribute_name() {
        Some(name) if attributes.contains(&name) => MutationEffect::Reset,
        _ => reset_on_child_list(event),
    })
}

pub(crate) struct CollectionInner {
    doc: Weak<DocumentInner>,
    root: NodeId,
    scope: CollectionScope,
    predicate: Predicate,
    /// `None` for static collections
    effect: Option<EffectFn>,
    cache: RefCell<Option<Vec<NodeId>>>,
}

impl CollectionInner {
    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn collect(&self, tree: &DomTree) -> Vec<NodeId> {
        match self.scope {
            CollectionScope::Children => tree
                .children(self.root)
                .map(|(id, _)| id)
                .filter(|&id| (self.predicate)(tree, id))
                .collect(),
            CollectionScope::Descendants => tree
                .descendants(self.root)
                .filter(|&id| (self.predicate)(tree, id))
                .collect(),
        }
    }

    /// Feed mutations below the root to the effect function
    pub(crate) fn notify<'r>(&self, records: impl Iterator<Item = &'r MutationRecord>) {
        let Some(effect) = &self.effect else {
            return;
        };
        if self.cache.borrow().is_none() {
            return;
        }
        for record in records {
            let event = MutationEvent::from_record(record);
            if effect(&event) == MutationEffect::Reset {
                tracing::debug!(root = ?self.root, ?event, "live collection reset");
                *self.cache.borrow_mut() = None;
                return;
            }
        }
    }
}

/// Ordered, indexable view over nodes below a root
#[derive(Clone)]
pub struct Collection {
    inner: Rc<CollectionInner>,
}

impl Collection {
    /// Create a collection over `root`.
    ///
    /// Live collections use `effect` (or `reset_on_child_list` when `None`)
    /// to decide when to recompute. Static collections take their snapshot
    /// now and ignore `effect`.
    pub fn create(
        root: &Node,
        scope: CollectionScope,
        predicate: Predicate,
        live: bool,
        effect: Option<EffectFn>,
    ) -> Collection {
        let effect = if live {
            Some(effect.unwrap_or_else(|| Rc::new(reset_on_child_list)))
        } else {
            None
        };
        let doc = root.doc();
        let inner = Rc::new(CollectionInner {
            doc: doc.as_ref().map(Rc::downgrade).unwrap_or_default(),
            root: root.id(),
            scope,
            predicate,
            effect,
            cache: RefCell::new(None),
        });

        if let Some(doc) = doc {
            if live {
                doc.register_collection(Rc::downgrade(&inner));
            } else {
                let nodes = inner.collect(&doc.tree.borrow());
                *inner.cache.borrow_mut() = Some(nodes);
            }
        }
        tracing::debug!(root = ?root.id(), ?scope, live, "created collection");
        Collection { inner }
    }

    /// Static collection over an explicit node list
    pub(crate) fn from_nodes(root: &Node, nodes: Vec<NodeId>) -> Collection {
        let inner = Rc::new(CollectionInner {
            doc: root.doc().as_ref().map(Rc::downgrade).unwrap_or_default(),
            root: root.id(),
            scope: CollectionScope::Descendants,
            predicate: Rc::new(|_: &DomTree, _: NodeId| false),
            effect: None,
            cache: RefCell::new(Some(nodes)),
        });
        Collection { inner }
    }

    pub fn is_live(&self) -> bool {
        self.inner.effect.is_some()
    }

    /// Root the collection was created over
    pub fn root(&self) -> Option<Node> {
        let doc = self.doc()?;
        Some(doc.proxy(self.inner.root))
    }

    fn doc(&self) -> Option<Rc<DocumentInner>> {
        let doc = self.inner.doc.upgrade();
        if doc.is_none() {
            tracing::warn!(root = ?self.inner.root, "collection outlived its document");
        }
        doc
    }

    /// Make sure the cache reflects every mutation delivered so far
    fn materialize(&self, doc: &Rc<DocumentInner>) {
        if self.is_live() {
            doc.flush_mutations();
        }
        if self.inner.cache.borrow().is_some() {
            return;
        }
        let nodes = self.inner.collect(&doc.tree.borrow());
        tracing::trace!(root = ?self.inner.root, len = nodes.len(), "materialized collection");
        *self.inner.cache.borrow_mut() = Some(nodes);
    }

    /// Current node ids, in order
    pub fn ids(&self) -> Vec<NodeId> {
        let Some(doc) = self.doc() else {
            return Vec::new();
        };
        self.materialize(&doc);
        self.inner.cache.borrow().clone().unwrap_or_default()
    }

    pub fn length(&self) -> usize {
        let Some(doc) = self.doc() else {
            return 0;
        };
        self.materialize(&doc);
        self.inner.cache.borrow().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Node at `index`; `None` when out of range
    pub fn item(&self, index: usize) -> Option<Node> {
        let doc = self.doc()?;
        self.materialize(&doc);
        let id = self
            .inner
            .cache
            .borrow()
            .as_ref()
            .and_then(|nodes| nodes.get(index).copied())?;
        Some(doc.proxy(id))
    }

    /// First element whose `id` or `name` attribute is `name`
    pub fn named_item(&self, name: &str) -> Option<Node> {
        if name.is_empty() {
            return None;
        }
        let doc = self.doc()?;
        self.materialize(&doc);
        let id = {
            let tree = doc.tree.borrow();
            let cache = self.inner.cache.borrow();
            cache.as_ref()?.iter().copied().find(|&id| {
                tree.get_attr(id, "id") == Some(name) || tree.get_attr(id, "name") == Some(name)
            })
        }?;
        Some(doc.proxy(id))
    }

    /// Call `f` for every index, re-reading the collection between calls.
    ///
    /// `f` may mutate the tree; later indices are resolved against the
    /// updated list and no index is delivered twice.
    pub fn for_each(&self, mut f: impl FnMut(&Node, usize)) {
        let mut index = 0;
        while let Some(node) = self.item(index) {
            f(&node, index);
            index += 1;
        }
    }

    /// Indices of the current list
    pub fn keys(&self) -> std::ops::Range<usize> {
        0..self.length()
    }

    /// Snapshot of the current nodes
    pub fn values(&self) -> std::vec::IntoIter<Node> {
        let Some(doc) = self.doc() else {
            return Vec::new().into_iter();
        };
        let ids = self.ids();
        ids.into_iter()
            .map(|id| doc.proxy(id))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Snapshot of `(index, node)` pairs
    pub fn entries(&self) -> std::iter::Enumerate<std::vec::IntoIter<Node>> {
        self.values().enumerate()
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("root", &self.inner.root)
            .field("scope", &self.inner.scope)
            .field("live", &self.is_live())
            .field("cached", &self.inner.cache.borrow().as_ref().map(Vec::len))
            .finish()
    }
}
