//! Document
//!
//! The document owns the backing tree, the proxy registry and the
//! registrations of every live object that reacts to mutations (live
//! collections, node iterators). Mutations made through proxies drain the
//! tree's mutation records right away and hand them to those objects.
//!
//! Borrow discipline: the tree is never borrowed while user code runs.
//! Effect functions, node filters and the script host are always called
//! after the tree borrow has been released.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use fos_dom::{DomTree, NodeId, NodeType, HTML_NAMESPACE};

use crate::collection::CollectionInner;
use crate::config::DocumentConfig;
use crate::node::{Node, NodeKind};
use crate::range::Range;
use crate::registry::{ProxyRegistry, ScriptHost};
use crate::selector::SelectorMatcher;
use crate::traversal::{NodeFilter, NodeIterator, NodeIteratorState, TreeWalker, WhatToShow};
use crate::{DomException, DomResult};

pub(crate) struct DocumentInner {
    pub(crate) tree: RefCell<DomTree>,
    registry: RefCell<ProxyRegistry>,
    collections: RefCell<Vec<Weak<CollectionInner>>>,
    iterators: RefCell<Vec<Weak<NodeIteratorState>>>,
    pub(crate) config: DocumentConfig,
    host: RefCell<Option<Rc<dyn ScriptHost>>>,
    pub(crate) selector_matcher: RefCell<Option<Rc<dyn SelectorMatcher>>>,
}

impl DocumentInner {
    /// The proxy for `id`, created on first request
    pub(crate) fn proxy(self: &Rc<Self>, id: NodeId) -> Node {
        if let Some(node) = self.registry.borrow().get(id) {
            tracing::trace!(node = ?id, "proxy cache hit");
            return node.clone();
        }

        let kind = match self.tree.borrow().node_type(id) {
            Some(node_type) => NodeKind::from(node_type),
            None => {
                tracing::warn!(node = ?id, "unknown node, creating diagnostic proxy");
                NodeKind::Unknown
            }
        };
        let node = Node::new(id, kind, self.config.realm, Rc::downgrade(self));
        self.registry.borrow_mut().insert(node.clone());
        if self.config.log_proxy_creation {
            tracing::debug!(node = ?id, ?kind, realm = self.config.realm.0, "created node proxy");
        }

        let host = self.host.borrow().clone();
        if let Some(host) = host {
            host.expose(&node);
        }
        node
    }

    /// Run a tree mutation, then deliver its mutation records
    pub(crate) fn mutate<R>(
        self: &Rc<Self>,
        f: impl FnOnce(&mut DomTree) -> fos_dom::DomResult<R>,
    ) -> DomResult<R> {
        let result = f(&mut *self.tree.borrow_mut());
        self.flush_mutations();
        result.map_err(DomException::from)
    }

    pub(crate) fn is_html(&self) -> bool {
        self.config.is_html()
    }

    pub(crate) fn register_collection(&self, collection: Weak<CollectionInner>) {
        let mut collections = self.collections.borrow_mut();
        collections.retain(|c| c.strong_count() > 0);
        collections.push(collection);
    }

    pub(crate) fn register_iterator(&self, iterator: Weak<NodeIteratorState>) {
        let mut iterators = self.iterators.borrow_mut();
        iterators.retain(|i| i.strong_count() > 0);
        iterators.push(iterator);
    }

    /// Drain pending mutation records and deliver them to live objects
    pub(crate) fn flush_mutations(self: &Rc<Self>) {
        let records = self.tree.borrow_mut().take_records();
        if records.is_empty() {
            return;
        }

        let collections: Vec<Rc<CollectionInner>> = {
            let mut registered = self.collections.borrow_mut();
            registered.retain(|c| c.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };
        for collection in &collections {
            let in_scope: Vec<bool> = {
                let tree = self.tree.borrow();
                records
                    .iter()
                    .map(|r| tree.is_inclusive_ancestor(collection.root(), r.target))
                    .collect()
            };
            collection.notify(
                records
                    .iter()
                    .zip(in_scope)
                    .filter(|(_, in_scope)| *in_scope)
                    .map(|(record, _)| record),
            );
        }

        let iterators: Vec<Rc<NodeIteratorState>> = {
            let mut registered = self.iterators.borrow_mut();
            registered.retain(|i| i.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };
        for iterator in &iterators {
            for record in records.iter().filter(|r| !r.removed_nodes.is_empty()) {
                iterator.adjust_for_removal(self, record);
            }
        }
    }
}

/// Script-facing document
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    /// Create an empty document
    pub fn new(config: DocumentConfig) -> Self {
        tracing::debug!(url = %config.url, kind = ?config.kind, "created document");
        Self {
            inner: Rc::new(DocumentInner {
                tree: RefCell::new(DomTree::new()),
                registry: RefCell::new(ProxyRegistry::new()),
                collections: RefCell::new(Vec::new()),
                iterators: RefCell::new(Vec::new()),
                config,
                host: RefCell::new(None),
                selector_matcher: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<DocumentInner> {
        &self.inner
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.inner.config
    }

    pub fn url(&self) -> &str {
        &self.inner.config.url
    }

    /// Proxy of the document node itself
    pub fn node(&self) -> Node {
        self.inner.proxy(NodeId::ROOT)
    }

    /// Proxy of any backing node; ids the tree does not know yield a
    /// diagnostic proxy of kind `Unknown`
    pub fn get_node(&self, id: NodeId) -> Node {
        self.inner.proxy(id)
    }

    pub fn registry(&self) -> Ref<'_, ProxyRegistry> {
        self.inner.registry.borrow()
    }

    /// Install the host that is told about every new proxy
    pub fn set_script_host(&self, host: Rc<dyn ScriptHost>) {
        *self.inner.host.borrow_mut() = Some(host);
    }

    /// Install the selector engine used by `query_selector*`
    pub fn set_selector_matcher(&self, matcher: Rc<dyn SelectorMatcher>) {
        *self.inner.selector_matcher.borrow_mut() = Some(matcher);
    }

    /// Read the backing tree
    pub fn with_tree<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        f(&*self.inner.tree.borrow())
    }

    /// Change the backing tree directly (parser, page engine). Mutation
    /// records are delivered afterwards like for any other change.
    pub fn with_tree_mut<R>(&self, f: impl FnOnce(&mut DomTree) -> R) -> R {
        let result = f(&mut *self.inner.tree.borrow_mut());
        self.inner.flush_mutations();
        result
    }

    // --- Factories ---

    /// Create an element; HTML documents lower-case the name
    pub fn create_element(&self, local_name: &str) -> DomResult<Node> {
        validate_name(local_name)?;
        let id = if self.inner.is_html() {
            let name = local_name.to_ascii_lowercase();
            self.inner.tree.borrow_mut().create_element(&name)
        } else {
            self.inner.tree.borrow_mut().create_element_ns(None, local_name)
        };
        Ok(self.inner.proxy(id))
    }

    /// Create an element in `namespace` from a possibly prefixed name
    pub fn create_element_ns(&self, namespace: Option<&str>, qualified_name: &str) -> DomResult<Node> {
        validate_qualified_name(qualified_name)?;
        let namespace = namespace.filter(|ns| !ns.is_empty());
        if namespace.is_none() && qualified_name.contains(':') {
            return Err(DomException::InvalidCharacter(format!(
                "prefixed name {qualified_name:?} needs a namespace"
            )));
        }
        let id = self
            .inner
            .tree
            .borrow_mut()
            .create_element_ns(namespace, qualified_name);
        Ok(self.inner.proxy(id))
    }

    pub fn create_text_node(&self, data: &str) -> Node {
        let id = self.inner.tree.borrow_mut().create_text(data);
        self.inner.proxy(id)
    }

    pub fn create_comment(&self, data: &str) -> Node {
        let id = self.inner.tree.borrow_mut().create_comment(data);
        self.inner.proxy(id)
    }

    /// CDATA sections only exist in XML documents
    pub fn create_cdata_section(&self, data: &str) -> DomResult<Node> {
        if self.inner.is_html() {
            return Err(DomException::NotSupported("CDATA sections in HTML documents"));
        }
        if data.contains("]]>") {
            return Err(DomException::InvalidCharacter(
                "CDATA section data contains \"]]>\"".to_string(),
            ));
        }
        let id = self.inner.tree.borrow_mut().create_cdata_section(data);
        Ok(self.inner.proxy(id))
    }

    pub fn create_processing_instruction(&self, target: &str, data: &str) -> DomResult<Node> {
        validate_name(target)?;
        if data.contains("?>") {
            return Err(DomException::InvalidCharacter(
                "processing instruction data contains \"?>\"".to_string(),
            ));
        }
        let id = self
            .inner
            .tree
            .borrow_mut()
            .create_processing_instruction(target, data);
        Ok(self.inner.proxy(id))
    }

    pub fn create_document_fragment(&self) -> Node {
        let id = self.inner.tree.borrow_mut().create_fragment();
        self.inner.proxy(id)
    }

    /// Create an unattached attribute with an empty value
    pub fn create_attribute(&self, name: &str) -> DomResult<Node> {
        validate_name(name)?;
        let name = if self.inner.is_html() {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        let id = self.inner.tree.borrow_mut().create_attribute(&name, "");
        Ok(self.inner.proxy(id))
    }

    pub fn create_doctype(&self, name: &str, public_id: &str, system_id: &str) -> DomResult<Node> {
        validate_qualified_name(name)?;
        let id = self
            .inner
            .tree
            .borrow_mut()
            .create_doctype(name, public_id, system_id);
        Ok(self.inner.proxy(id))
    }

    /// New range collapsed at the start of the document
    pub fn create_range(&self) -> Range {
        Range::new(self)
    }

    pub fn create_node_iterator(
        &self,
        root: &Node,
        what_to_show: WhatToShow,
        filter: Option<Rc<dyn NodeFilter>>,
    ) -> NodeIterator {
        NodeIterator::new(root, what_to_show, filter)
    }

    pub fn create_tree_walker(
        &self,
        root: &Node,
        what_to_show: WhatToShow,
        filter: Option<Rc<dyn NodeFilter>>,
    ) -> TreeWalker {
        TreeWalker::new(root, what_to_show, filter)
    }

    // --- Lookups ---

    /// The root element
    pub fn document_element(&self) -> Option<Node> {
        let id = {
            let tree = self.inner.tree.borrow();
            tree.children(NodeId::ROOT)
                .find(|(_, n)| n.is_element())
                .map(|(id, _)| id)
        }?;
        Some(self.inner.proxy(id))
    }

    /// The document type node
    pub fn doctype(&self) -> Option<Node> {
        let id = {
            let tree = self.inner.tree.borrow();
            tree.children(NodeId::ROOT)
                .find(|(_, n)| n.node_type() == NodeType::DocumentType)
                .map(|(id, _)| id)
        }?;
        Some(self.inner.proxy(id))
    }

    /// First element in tree order whose `id` attribute is `element_id`
    pub fn get_element_by_id(&self, element_id: &str) -> Option<Node> {
        if element_id.is_empty() {
            return None;
        }
        let id = {
            let tree = self.inner.tree.borrow();
            tree.descendants(NodeId::ROOT)
                .find(|&id| tree.get_attr(id, "id") == Some(element_id))
        }?;
        Some(self.inner.proxy(id))
    }

    /// `<body>` of an HTML document
    pub fn body(&self) -> Option<Node> {
        let id = {
            let tree = self.inner.tree.borrow();
            let html = tree
                .children(NodeId::ROOT)
                .find(|(_, n)| n.is_element())
                .map(|(id, _)| id)?;
            tree.children(html)
                .map(|(id, _)| id)
                .find(|&id| {
                    tree.local_name(id) == Some("body") && tree.namespace(id) == Some(HTML_NAMESPACE)
                })
        }?;
        Some(self.inner.proxy(id))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentConfig::default())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.inner.config.url)
            .field("kind", &self.inner.config.kind)
            .field("proxies", &self.inner.registry.borrow().len())
            .finish()
    }
}

/// Check a name against the XML `Name` production (ASCII approximation)
pub(crate) fn validate_name(name: &str) -> DomResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c == ':' || c == '_' || c.is_alphabetic());
    let valid_rest = chars.all(|c| {
        c == ':' || c == '_' || c == '-' || c == '.' || c == '\u{B7}' || c.is_alphanumeric()
    });
    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(DomException::InvalidCharacter(format!("{name:?} is not a valid name")))
    }
}

/// A valid name with at most one colon, not at either end
pub(crate) fn validate_qualified_name(name: &str) -> DomResult<()> {
    validate_name(name)?;
    let well_formed = match name.split_once(':') {
        Some((prefix, local)) => !prefix.is_empty() && !local.is_empty() && !local.contains(':'),
        None => true,
    };
    if well_formed {
        Ok(())
    } else {
        Err(DomException::InvalidCharacter(format!(
            "{name:?} is not a valid qualified name"
        )))
    }
}
