//! Node proxies
//!
//! A `Node` is a cheap, clonable handle on one backing tree node. Handles
//! compare by identity: two `Node`s are equal only when they are the same
//! proxy, and the registry guarantees one proxy per backing node.
//!
//! A proxy keeps only a weak link to its document. Once the document is
//! dropped, reads return nothing and mutations fail with
//! `InvalidStateError`.

use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use fos_dom::{DocumentPosition, DomTree, NodeId, NodeType};

use crate::collection::Collection;
use crate::config::ScriptRealm;
use crate::document::{Document, DocumentInner};
use crate::{DomException, DomResult};

/// Concrete kind of a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    CDataSection,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
    DocumentFragment,
    /// Diagnostic proxy for an id the tree could not resolve
    Unknown,
}

impl From<NodeType> for NodeKind {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Element => NodeKind::Element,
            NodeType::Attribute => NodeKind::Attribute,
            NodeType::Text => NodeKind::Text,
            NodeType::CDataSection => NodeKind::CDataSection,
            NodeType::ProcessingInstruction => NodeKind::ProcessingInstruction,
            NodeType::Comment => NodeKind::Comment,
            NodeType::Document => NodeKind::Document,
            NodeType::DocumentType => NodeKind::DocumentType,
            NodeType::DocumentFragment => NodeKind::DocumentFragment,
        }
    }
}

impl NodeKind {
    /// Backing node type (`None` for `Unknown`)
    pub fn node_type(self) -> Option<NodeType> {
        match self {
            NodeKind::Element => Some(NodeType::Element),
            NodeKind::Attribute => Some(NodeType::Attribute),
            NodeKind::Text => Some(NodeType::Text),
            NodeKind::CDataSection => Some(NodeType::CDataSection),
            NodeKind::ProcessingInstruction => Some(NodeType::ProcessingInstruction),
            NodeKind::Comment => Some(NodeType::Comment),
            NodeKind::Document => Some(NodeType::Document),
            NodeKind::DocumentType => Some(NodeType::DocumentType),
            NodeKind::DocumentFragment => Some(NodeType::DocumentFragment),
            NodeKind::Unknown => None,
        }
    }

    /// Text, CDATA, comment or processing instruction
    pub fn is_character_data(self) -> bool {
        self.node_type().is_some_and(NodeType::is_character_data)
    }
}

pub(crate) struct NodeInner {
    id: NodeId,
    kind: NodeKind,
    realm: ScriptRealm,
    doc: Weak<DocumentInner>,
    pub(crate) child_nodes: OnceCell<Collection>,
    pub(crate) children: OnceCell<Collection>,
}

/// Script-facing node
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    pub const ELEMENT_NODE: u16 = 1;
    pub const ATTRIBUTE_NODE: u16 = 2;
    pub const TEXT_NODE: u16 = 3;
    pub const CDATA_SECTION_NODE: u16 = 4;
    pub const PROCESSING_INSTRUCTION_NODE: u16 = 7;
    pub const COMMENT_NODE: u16 = 8;
    pub const DOCUMENT_NODE: u16 = 9;
    pub const DOCUMENT_TYPE_NODE: u16 = 10;
    pub const DOCUMENT_FRAGMENT_NODE: u16 = 11;

    pub(crate) fn new(id: NodeId, kind: NodeKind, realm: ScriptRealm, doc: Weak<DocumentInner>) -> Self {
        Node(Rc::new(NodeInner {
            id,
            kind,
            realm,
            doc,
            child_nodes: OnceCell::new(),
            children: OnceCell::new(),
        }))
    }

    pub(crate) fn inner(&self) -> &NodeInner {
        &self.0
    }

    /// Backing node id
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    /// Realm this proxy was created in
    pub fn realm(&self) -> ScriptRealm {
        self.0.realm
    }

    /// DOM `nodeType` code (0 for diagnostic proxies)
    pub fn node_type(&self) -> u16 {
        self.0.kind.node_type().map_or(0, NodeType::to_u16)
    }

    pub fn is_element(&self) -> bool {
        self.0.kind == NodeKind::Element
    }

    // --- Document access ---

    pub(crate) fn doc(&self) -> Option<Rc<DocumentInner>> {
        let doc = self.0.doc.upgrade();
        if doc.is_none() {
            tracing::warn!(node = ?self.0.id, "owning document has been dropped");
        }
        doc
    }

    pub(crate) fn live_doc(&self) -> DomResult<Rc<DocumentInner>> {
        self.doc()
            .ok_or(DomException::InvalidState("owning document has been dropped"))
    }

    /// Document of `self`, provided `other` lives in the same one
    pub(crate) fn same_document(&self, other: &Node) -> DomResult<Rc<DocumentInner>> {
        let doc = self.live_doc()?;
        match other.0.doc.upgrade() {
            Some(other_doc) if Rc::ptr_eq(&doc, &other_doc) => Ok(doc),
            _ => Err(DomException::WrongDocument),
        }
    }

    pub(crate) fn in_same_document(&self, other: &Node) -> bool {
        Weak::ptr_eq(&self.0.doc, &other.0.doc)
    }

    /// Run `f` against the backing tree
    pub(crate) fn read<R>(&self, f: impl FnOnce(&DomTree, NodeId) -> R) -> Option<R> {
        let doc = self.doc()?;
        let tree = doc.tree.borrow();
        Some(f(&*tree, self.0.id))
    }

    /// Proxy of the node `f` picks, if any
    pub(crate) fn related(&self, f: impl FnOnce(&DomTree, NodeId) -> Option<NodeId>) -> Option<Node> {
        let doc = self.doc()?;
        let id = f(&*doc.tree.borrow(), self.0.id)?;
        Some(doc.proxy(id))
    }

    /// The document this node belongs to
    pub fn node_document(&self) -> Option<Document> {
        self.0.doc.upgrade().map(Document::from_inner)
    }

    /// DOM `ownerDocument`: the node document, except for documents
    pub fn owner_document(&self) -> Option<Document> {
        if self.0.kind == NodeKind::Document {
            return None;
        }
        self.node_document()
    }

    // --- Names and values ---

    /// DOM `nodeName`
    pub fn node_name(&self) -> String {
        match self.0.kind {
            NodeKind::Element => self.tag_name().unwrap_or_default(),
            NodeKind::Attribute => self.name().unwrap_or_default(),
            NodeKind::Text => "#text".to_string(),
            NodeKind::CDataSection => "#cdata-section".to_string(),
            NodeKind::Comment => "#comment".to_string(),
            NodeKind::Document => "#document".to_string(),
            NodeKind::DocumentFragment => "#document-fragment".to_string(),
            NodeKind::DocumentType | NodeKind::ProcessingInstruction => self
                .read(|tree, id| match tree.get(id).map(|n| &n.data) {
                    Some(fos_dom::NodeData::Doctype { name, .. }) => tree.resolve(*name).to_string(),
                    Some(fos_dom::NodeData::ProcessingInstruction { target, .. }) => {
                        tree.resolve(*target).to_string()
                    }
                    _ => String::new(),
                })
                .unwrap_or_default(),
            NodeKind::Unknown => "#unknown".to_string(),
        }
    }

    /// DOM `nodeValue`: attribute value or character data
    pub fn node_value(&self) -> Option<String> {
        match self.0.kind {
            NodeKind::Attribute => self.value(),
            kind if kind.is_character_data() => self.data(),
            _ => None,
        }
    }

    /// DOM `nodeValue` setter; ignored for nodes without a value
    pub fn set_node_value(&self, value: &str) -> DomResult<()> {
        match self.0.kind {
            NodeKind::Attribute => self.set_value(value),
            kind if kind.is_character_data() => self.set_data(value),
            _ => Ok(()),
        }
    }

    /// DOM `textContent`
    pub fn text_content(&self) -> Option<String> {
        self.read(|tree, id| tree.text_content(id)).flatten()
    }

    /// DOM `textContent` setter
    pub fn set_text_content(&self, value: &str) -> DomResult<()> {
        let doc = self.live_doc()?;
        doc.mutate(|tree| tree.set_text_content(self.0.id, value))
    }

    // --- Navigation ---

    pub fn parent_node(&self) -> Option<Node> {
        self.related(|tree, id| tree.parent(id))
    }

    /// Parent, if it is an element
    pub fn parent_element(&self) -> Option<Node> {
        self.related(|tree, id| {
            tree.parent(id)
                .filter(|&p| tree.node_type(p) == Some(NodeType::Element))
        })
    }

    pub fn first_child(&self) -> Option<Node> {
        self.related(|tree, id| tree.first_child(id))
    }

    pub fn last_child(&self) -> Option<Node> {
        self.related(|tree, id| tree.last_child(id))
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        self.related(|tree, id| tree.prev_sibling(id))
    }

    pub fn next_sibling(&self) -> Option<Node> {
        self.related(|tree, id| tree.next_sibling(id))
    }

    pub fn has_child_nodes(&self) -> bool {
        self.read(|tree, id| tree.first_child(id).is_some())
            .unwrap_or(false)
    }

    /// Topmost inclusive ancestor
    pub fn get_root_node(&self) -> Node {
        self.related(|tree, id| Some(tree.root_of(id)))
            .unwrap_or_else(|| self.clone())
    }

    /// Whether the node is in its document's tree
    pub fn is_connected(&self) -> bool {
        self.read(|tree, id| tree.contains(id) && tree.root_of(id) == tree.root())
            .unwrap_or(false)
    }

    /// Inclusive descendant check
    pub fn contains(&self, other: Option<&Node>) -> bool {
        let Some(other) = other else {
            return false;
        };
        self.in_same_document(other)
            && self
                .read(|tree, id| tree.is_inclusive_ancestor(id, other.id()))
                .unwrap_or(false)
    }

    /// DOM `compareDocumentPosition` bitmask of `other` relative to `self`
    pub fn compare_document_position(&self, other: &Node) -> u16 {
        if self == other {
            return DocumentPosition::EQUAL.bits();
        }
        if !self.in_same_document(other) {
            let direction = if Rc::as_ptr(&other.0) < Rc::as_ptr(&self.0) {
                DocumentPosition::PRECEDING
            } else {
                DocumentPosition::FOLLOWING
            };
            return (DocumentPosition::DISCONNECTED
                | DocumentPosition::IMPLEMENTATION_SPECIFIC
                | direction)
                .bits();
        }
        self.read(|tree, id| tree.compare_document_position(id, other.id()).bits())
            .unwrap_or(DocumentPosition::DISCONNECTED.bits())
    }

    // --- Mutation ---

    /// Append `child`; returns it
    pub fn append_child(&self, child: &Node) -> DomResult<Node> {
        let doc = self.same_document(child)?;
        doc.mutate(|tree| tree.append_child(self.0.id, child.id()))?;
        Ok(child.clone())
    }

    /// Insert `node` before `child` (append when `None`); returns `node`
    pub fn insert_before(&self, node: &Node, child: Option<&Node>) -> DomResult<Node> {
        let doc = self.same_document(node)?;
        if let Some(child) = child {
            self.same_document(child)?;
        }
        doc.mutate(|tree| tree.insert_before(self.0.id, node.id(), child.map(Node::id)))?;
        Ok(node.clone())
    }

    /// Remove `child`; returns it
    pub fn remove_child(&self, child: &Node) -> DomResult<Node> {
        let doc = self.same_document(child)?;
        doc.mutate(|tree| tree.remove_child(self.0.id, child.id()))
            .map_err(|err| match err {
                DomException::NotFound(_) => DomException::NotFound("node is not a child of this node"),
                other => other,
            })?;
        Ok(child.clone())
    }

    /// Replace `child` with `node`; returns `child`
    pub fn replace_child(&self, node: &Node, child: &Node) -> DomResult<Node> {
        let doc = self.same_document(node)?;
        self.same_document(child)?;
        doc.mutate(|tree| tree.replace_child(self.0.id, node.id(), child.id()))?;
        Ok(child.clone())
    }

    /// Remove this node from its parent, if any
    pub fn remove(&self) -> DomResult<()> {
        let doc = self.live_doc()?;
        doc.mutate(|tree| {
            tree.detach(self.0.id);
            Ok(())
        })
    }

    /// Copy of this node (and its subtree when `deep`)
    pub fn clone_node(&self, deep: bool) -> DomResult<Node> {
        if self.0.kind == NodeKind::Document {
            return Err(DomException::NotSupported("cloning a document"));
        }
        let doc = self.live_doc()?;
        let copy = doc.mutate(|tree| tree.clone_node(self.0.id, deep))?;
        Ok(doc.proxy(copy))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .finish()
    }
}
