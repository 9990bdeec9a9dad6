//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: removing a node only unlinks it, so a `NodeId`
//! stays valid for the lifetime of the tree. Detached subtrees keep their
//! internal links and can be reinserted.

use std::cmp::Ordering;

use crate::node::{byte_offset, char_len, substring};
use crate::{
    AttrData, DocumentPosition, DomError, DomResult, InternedString, MutationRecord, Node,
    NodeData, NodeId, NodeType, QualName, StringInterner, HTML_NAMESPACE,
};

/// Arena-based DOM tree for memory efficiency
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    interner: StringInterner,
    records: Vec<MutationRecord>,
}

impl DomTree {
    /// Create a new tree holding only its document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            interner: StringInterner::new(),
            records: Vec::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Whether `id` was handed out by this tree
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name interner of this tree
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Intern a name
    pub fn intern(&mut self, s: &str) -> InternedString {
        self.interner.intern(s)
    }

    /// Resolve an interned name
    #[inline]
    pub fn resolve(&self, s: InternedString) -> &str {
        self.interner.get(s)
    }

    // --- Creation ---

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create an HTML element
    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        let ns = self.interner.intern(HTML_NAMESPACE);
        let local = self.interner.intern(local_name);
        self.alloc(Node::element(QualName::new(None, ns, local)))
    }

    /// Create an element in `namespace`; `qualified_name` may carry a prefix
    pub fn create_element_ns(&mut self, namespace: Option<&str>, qualified_name: &str) -> NodeId {
        let name = self.qualify(namespace, qualified_name);
        self.alloc(Node::element(name))
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.alloc(Node::text(data.to_string()))
    }

    pub fn create_cdata_section(&mut self, data: &str) -> NodeId {
        self.alloc(Node::new(NodeData::CDataSection(data.to_string())))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(data.to_string())))
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        let target = self.interner.intern(target);
        self.alloc(Node::new(NodeData::ProcessingInstruction {
            target,
            data: data.to_string(),
        }))
    }

    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        let name = self.interner.intern(name);
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(Node::new(NodeData::DocumentFragment))
    }

    /// Create an unattached attribute with no namespace
    pub fn create_attribute(&mut self, name: &str, value: &str) -> NodeId {
        let local = self.interner.intern(name);
        self.alloc(Node::new(NodeData::Attribute(AttrData {
            name: QualName::local(local),
            value: value.to_string(),
            owner: NodeId::NONE,
        })))
    }

    fn qualify(&mut self, namespace: Option<&str>, qualified_name: &str) -> QualName {
        let ns = self.interner.intern(namespace.unwrap_or(""));
        match qualified_name.split_once(':') {
            Some((prefix, local)) => {
                let prefix = self.interner.intern(prefix);
                let local = self.interner.intern(local);
                QualName::new(Some(prefix), ns, local)
            }
            None => {
                let local = self.interner.intern(qualified_name);
                QualName::new(None, ns, local)
            }
        }
    }

    /// `prefix:local` or `local`
    pub fn qualified_name(&self, name: &QualName) -> String {
        match name.prefix {
            Some(prefix) => format!("{}:{}", self.resolve(prefix), self.resolve(name.local)),
            None => self.resolve(name.local).to_string(),
        }
    }

    // --- Links ---

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(Node::node_type)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.to_option())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.to_option())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.to_option())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.to_option())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.to_option())
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    pub fn child_count(&self, id: NodeId) -> u32 {
        self.children(id).count() as u32
    }

    /// Child at `index`, if any
    pub fn child_at(&self, parent: NodeId, index: u32) -> Option<NodeId> {
        self.children(parent).nth(index as usize).map(|(id, _)| id)
    }

    /// Position of a node among its siblings
    pub fn index(&self, id: NodeId) -> u32 {
        let mut count = 0;
        let mut cur = self.prev_sibling(id);
        while let Some(prev) = cur {
            count += 1;
            cur = self.prev_sibling(prev);
        }
        count
    }

    /// DOM node length: 0 for doctypes and attributes, character count for
    /// character data, child count otherwise
    pub fn length(&self, id: NodeId) -> u32 {
        match self.get(id) {
            Some(node) => match &node.data {
                NodeData::Doctype { .. } | NodeData::Attribute(_) => 0,
                _ => match node.character_data() {
                    Some(data) => char_len(data),
                    None => self.child_count(id),
                },
            },
            None => 0,
        }
    }

    /// Ancestors from parent to root (excluding `id` itself)
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&cur| self.parent(cur))
    }

    /// `id` followed by its ancestors
    pub fn inclusive_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&cur| self.parent(cur))
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inclusive_ancestors(node).any(|id| id == ancestor)
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// Topmost inclusive ancestor
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.inclusive_ancestors(id).last().unwrap_or(id)
    }

    /// Pre-order descendants of `id`, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.first_child(id),
        }
    }

    pub fn last_inclusive_descendant(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(last) = self.last_child(cur) {
            cur = last;
        }
        cur
    }

    /// Next node in document order, staying inside `root`'s subtree
    pub fn following(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        self.following_skipping_children(id, root)
    }

    /// Next node in document order that is not a descendant of `id`,
    /// staying inside `root`'s subtree
    pub fn following_skipping_children(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        let mut cur = id;
        while cur != root {
            if let Some(next) = self.next_sibling(cur) {
                return Some(next);
            }
            cur = self.parent(cur)?;
        }
        None
    }

    /// Previous node in document order, staying inside `root`'s subtree
    pub fn preceding(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        if id == root {
            return None;
        }
        match self.prev_sibling(id) {
            Some(prev) => Some(self.last_inclusive_descendant(prev)),
            None => self.parent(id),
        }
    }

    /// Compare two nodes in document order. Nodes of different trees are
    /// ordered by their roots' ids, so distinct nodes never compare equal.
    pub fn tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let mut path_a: Vec<NodeId> = self.inclusive_ancestors(a).collect();
        let mut path_b: Vec<NodeId> = self.inclusive_ancestors(b).collect();
        path_a.reverse();
        path_b.reverse();
        if let (Some(&root_a), Some(&root_b)) = (path_a.first(), path_b.first()) {
            if root_a != root_b {
                return root_a.cmp(&root_b);
            }
        }

        let shared = path_a
            .iter()
            .zip(path_b.iter())
            .take_while(|(x, y)| x == y)
            .count();
        match (path_a.get(shared), path_b.get(shared)) {
            // `a` is an ancestor of `b`
            (None, _) => Ordering::Less,
            (_, None) => Ordering::Greater,
            (Some(&x), Some(&y)) => self.index(x).cmp(&self.index(y)),
        }
    }

    /// Position of `other` relative to `reference`, as a DOM bitmask
    pub fn compare_document_position(&self, reference: NodeId, other: NodeId) -> DocumentPosition {
        if reference == other {
            return DocumentPosition::EQUAL;
        }

        let mut node1 = other;
        let mut node2 = reference;
        let mut attr1 = None;
        let mut attr2 = None;

        if let Some(attr) = self.get(other).and_then(Node::as_attr) {
            attr1 = Some(other);
            node1 = attr.owner;
        }
        if let Some(attr) = self.get(reference).and_then(Node::as_attr) {
            attr2 = Some(reference);
            node2 = attr.owner;
            if let Some(attr1) = attr1 {
                if node1.is_valid() && node1 == node2 {
                    let attrs = self
                        .get(node2)
                        .and_then(Node::as_element)
                        .map(|e| e.attrs.as_slice())
                        .unwrap_or_default();
                    for &attr in attrs {
                        if attr == attr1 {
                            return DocumentPosition::IMPLEMENTATION_SPECIFIC
                                | DocumentPosition::PRECEDING;
                        }
                        if attr == reference {
                            return DocumentPosition::IMPLEMENTATION_SPECIFIC
                                | DocumentPosition::FOLLOWING;
                        }
                    }
                }
            }
        }

        if !node1.is_valid()
            || !node2.is_valid()
            || !self.contains(node1)
            || !self.contains(node2)
            || self.root_of(node1) != self.root_of(node2)
        {
            let order_key = |node: NodeId, fallback: NodeId| {
                if node.is_valid() && self.contains(node) {
                    self.root_of(node)
                } else {
                    fallback
                }
            };
            let direction = if order_key(node1, other) < order_key(node2, reference) {
                DocumentPosition::PRECEDING
            } else {
                DocumentPosition::FOLLOWING
            };
            return DocumentPosition::DISCONNECTED
                | DocumentPosition::IMPLEMENTATION_SPECIFIC
                | direction;
        }

        if (attr1.is_none() && self.is_ancestor(node1, node2))
            || (attr2.is_some() && node1 == node2)
        {
            return DocumentPosition::CONTAINS | DocumentPosition::PRECEDING;
        }
        if (attr2.is_none() && self.is_ancestor(node2, node1))
            || (attr1.is_some() && node1 == node2)
        {
            return DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING;
        }
        if self.tree_order(node1, node2) == Ordering::Less {
            DocumentPosition::PRECEDING
        } else {
            DocumentPosition::FOLLOWING
        }
    }

    // --- Content ---

    /// Local name of an element or attribute
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element(e) => Some(self.resolve(e.name.local)),
            NodeData::Attribute(a) => Some(self.resolve(a.name.local)),
            _ => None,
        }
    }

    /// Namespace URI of an element or attribute (`None` for no namespace)
    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        let ns = match &self.get(id)?.data {
            NodeData::Element(e) => e.name.ns,
            NodeData::Attribute(a) => a.name.ns,
            _ => return None,
        };
        if ns == InternedString::EMPTY {
            None
        } else {
            Some(self.resolve(ns))
        }
    }

    /// Character data of text-like nodes
    pub fn character_data(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::character_data)
    }

    /// DOM `textContent`
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        let node = self.get(id)?;
        match &node.data {
            NodeData::Element(_) | NodeData::DocumentFragment => Some(
                self.descendants(id)
                    .filter_map(|d| self.get(d).and_then(Node::as_text))
                    .collect(),
            ),
            NodeData::Attribute(a) => Some(a.value.clone()),
            NodeData::Document | NodeData::Doctype { .. } => None,
            _ => node.character_data().map(str::to_string),
        }
    }

    /// DOM `textContent` setter
    pub fn set_text_content(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        let node_type = self.node_type(id).ok_or(DomError::NotFound)?;
        match node_type {
            NodeType::Element | NodeType::DocumentFragment => {
                let removed: Vec<NodeId> = self.children(id).map(|(c, _)| c).collect();
                for &child in &removed {
                    self.unlink(child);
                }
                let mut added = Vec::new();
                if !value.is_empty() {
                    let text = self.create_text(value);
                    self.link(id, text, None);
                    added.push(text);
                }
                if !removed.is_empty() || !added.is_empty() {
                    self.records
                        .push(MutationRecord::child_list(id, added, removed, None, None));
                }
                Ok(())
            }
            NodeType::Attribute => self.set_attr_value(id, value),
            NodeType::Document | NodeType::DocumentType => Ok(()),
            _ => self.set_data(id, value),
        }
    }

    /// Replace the whole character data of a node
    pub fn set_data(&mut self, id: NodeId, data: &str) -> DomResult<()> {
        let length = self.length(id);
        self.replace_data(id, 0, length, data)
    }

    /// Replace `count` characters at `offset` with `data`
    pub fn replace_data(&mut self, id: NodeId, offset: u32, count: u32, data: &str) -> DomResult<()> {
        let node = self.get_mut(id).ok_or(DomError::NotFound)?;
        let current = node.character_data_mut().ok_or(DomError::InvalidNodeType)?;
        let length = char_len(current);
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        let count = count.min(length - offset);
        let old_value = current.clone();

        let from = byte_offset(current, offset);
        let to = from + byte_offset(&current[from..], count);
        current.replace_range(from..to, data);

        self.records
            .push(MutationRecord::character_data(id, old_value));
        Ok(())
    }

    /// Split a text node at `offset`; the tail becomes a new next sibling
    pub fn split_text(&mut self, id: NodeId, offset: u32) -> DomResult<NodeId> {
        let node = self.get(id).ok_or(DomError::NotFound)?;
        let data = node.as_text().ok_or(DomError::InvalidNodeType)?;
        let length = char_len(data);
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        let tail = substring(data, offset, length - offset);
        let new_data = match node.data {
            NodeData::CDataSection(_) => NodeData::CDataSection(tail),
            _ => NodeData::Text(tail),
        };
        let new_node = self.alloc(Node::new(new_data));

        if let Some(parent) = self.parent(id) {
            let next = self.next_sibling(id);
            self.link(parent, new_node, next);
            self.records.push(MutationRecord::child_list(
                parent,
                vec![new_node],
                Vec::new(),
                Some(id),
                next,
            ));
        }
        self.replace_data(id, offset, length - offset, "")?;
        Ok(new_node)
    }

    // --- Attributes ---

    /// Attribute nodes of an element, in insertion order
    pub fn attr_nodes(&self, element: NodeId) -> &[NodeId] {
        self.get(element)
            .and_then(Node::as_element)
            .map(|e| e.attrs.as_slice())
            .unwrap_or_default()
    }

    /// Attribute node whose qualified name is `name`
    pub fn attr_node(&self, element: NodeId, name: &str) -> Option<NodeId> {
        self.attr_nodes(element).iter().copied().find(|&attr| {
            self.get(attr)
                .and_then(Node::as_attr)
                .is_some_and(|a| self.qualified_name(&a.name) == name)
        })
    }

    /// Value of the attribute whose qualified name is `name`
    pub fn get_attr(&self, element: NodeId, name: &str) -> Option<&str> {
        let attr = self.attr_node(element, name)?;
        self.get(attr).and_then(Node::as_attr).map(|a| a.value.as_str())
    }

    /// Set (or create) the attribute `name` on `element`
    pub fn set_attr(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<()> {
        if !self.get(element).is_some_and(Node::is_element) {
            return Err(DomError::InvalidNodeType);
        }
        if let Some(attr) = self.attr_node(element, name) {
            return self.set_attr_value(attr, value);
        }
        let attr = self.create_attribute(name, value);
        if let Some(NodeData::Attribute(a)) = self.get_mut(attr).map(|n| &mut n.data) {
            a.owner = element;
        }
        if let Some(e) = self.get_mut(element).and_then(Node::as_element_mut) {
            e.attrs.push(attr);
        }
        self.records
            .push(MutationRecord::attributes(element, name, None));
        Ok(())
    }

    /// Change the value of an attribute node, recording on its owner
    pub fn set_attr_value(&mut self, attr: NodeId, value: &str) -> DomResult<()> {
        let (owner, old_value, name) = {
            let data = match self.get_mut(attr).map(|n| &mut n.data) {
                Some(NodeData::Attribute(a)) => a,
                Some(_) => return Err(DomError::InvalidNodeType),
                None => return Err(DomError::NotFound),
            };
            let old = std::mem::replace(&mut data.value, value.to_string());
            (data.owner, old, data.name)
        };
        if owner.is_valid() {
            let name = self.qualified_name(&name);
            self.records
                .push(MutationRecord::attributes(owner, &name, Some(old_value)));
        }
        Ok(())
    }

    /// Remove the attribute `name`; returns the detached attribute node
    pub fn remove_attr(&mut self, element: NodeId, name: &str) -> DomResult<Option<NodeId>> {
        if !self.get(element).is_some_and(Node::is_element) {
            return Err(DomError::InvalidNodeType);
        }
        let Some(attr) = self.attr_node(element, name) else {
            return Ok(None);
        };
        if let Some(e) = self.get_mut(element).and_then(Node::as_element_mut) {
            e.attrs.retain(|&a| a != attr);
        }
        let old_value = match self.get_mut(attr).map(|n| &mut n.data) {
            Some(NodeData::Attribute(a)) => {
                a.owner = NodeId::NONE;
                Some(a.value.clone())
            }
            _ => None,
        };
        self.records
            .push(MutationRecord::attributes(element, name, old_value));
        Ok(Some(attr))
    }

    // --- Structure ---

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `node` into `parent` before `child` (append when `None`).
    /// Fragments insert their children instead of themselves.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.ensure_pre_insertion_validity(node, parent, child)?;
        let reference = if child == Some(node) {
            self.next_sibling(node)
        } else {
            child
        };
        self.insert_unchecked(node, parent, reference);
        Ok(node)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if !self.contains(parent) || self.parent(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.remove(child);
        Ok(child)
    }

    /// Replace `child` of `parent` with `node`; returns `child`
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        node: NodeId,
        child: NodeId,
    ) -> DomResult<NodeId> {
        self.ensure_replace_validity(node, parent, child)?;
        let mut reference = self.next_sibling(child);
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }
        if node != child {
            self.remove(child);
        }
        self.insert_unchecked(node, parent, reference);
        Ok(child)
    }

    /// Remove a node from its parent, if it has one
    pub fn detach(&mut self, id: NodeId) {
        if self.parent(id).is_some() {
            self.remove(id);
        }
    }

    /// Clone a node; `deep` also clones its descendants.
    /// Attributes are always cloned. The clone is detached.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> DomResult<NodeId> {
        let source = self.get(id).ok_or(DomError::NotFound)?;
        let data = match &source.data {
            NodeData::Element(e) => NodeData::Element(crate::ElementData::new(e.name)),
            NodeData::Attribute(a) => NodeData::Attribute(AttrData {
                name: a.name,
                value: a.value.clone(),
                owner: NodeId::NONE,
            }),
            other => other.clone(),
        };
        let copy = self.alloc(Node::new(data));

        let attrs = self.attr_nodes(id).to_vec();
        for attr in attrs {
            let attr_copy = self.clone_node(attr, false)?;
            if let Some(NodeData::Attribute(a)) = self.get_mut(attr_copy).map(|n| &mut n.data) {
                a.owner = copy;
            }
            if let Some(e) = self.get_mut(copy).and_then(Node::as_element_mut) {
                e.attrs.push(attr_copy);
            }
        }

        if deep {
            let children: Vec<NodeId> = self.children(id).map(|(c, _)| c).collect();
            for child in children {
                let child_copy = self.clone_node(child, true)?;
                self.link(copy, child_copy, None);
            }
        }
        Ok(copy)
    }

    /// Insert without validation; `reference` must be a child of `parent`
    pub(crate) fn insert_unchecked(
        &mut self,
        node: NodeId,
        parent: NodeId,
        reference: Option<NodeId>,
    ) {
        let nodes: Vec<NodeId> = if self.node_type(node) == Some(NodeType::DocumentFragment) {
            let children: Vec<NodeId> = self.children(node).map(|(c, _)| c).collect();
            for &child in &children {
                self.unlink(child);
            }
            if !children.is_empty() {
                self.records.push(MutationRecord::child_list(
                    node,
                    Vec::new(),
                    children.clone(),
                    None,
                    None,
                ));
            }
            children
        } else {
            if self.parent(node).is_some() {
                self.remove(node);
            }
            vec![node]
        };
        if nodes.is_empty() {
            return;
        }

        let previous = match reference {
            Some(r) => self.prev_sibling(r),
            None => self.last_child(parent),
        };
        for &n in &nodes {
            self.link(parent, n, reference);
        }
        self.records.push(MutationRecord::child_list(
            parent,
            nodes,
            Vec::new(),
            previous,
            reference,
        ));
    }

    /// Unlink a node from its parent and record the removal
    pub(crate) fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let previous = self.prev_sibling(id);
        let next = self.next_sibling(id);
        self.unlink(id);
        self.records.push(MutationRecord::child_list(
            parent,
            Vec::new(),
            vec![id],
            previous,
            next,
        ));
    }

    /// Link `child` under `parent` before `before` (append when `None`)
    fn link(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        let prev = match before {
            Some(b) => self.nodes[b.index()].prev_sibling,
            None => self.nodes[parent.index()].last_child,
        };
        let next = before.unwrap_or(NodeId::NONE);

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }
    }

    /// Unlink a node from its parent without recording
    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }
        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    // --- Mutation records ---

    /// Drain all mutation records queued since the last call
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// Whether any mutation records are queued
    pub fn has_pending_records(&self) -> bool {
        !self.records.is_empty()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling.to_option();
        Some((id, node))
    }
}

/// Pre-order iterator over the descendants of a node
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.following(id, self.root);
        Some(id)
    }
}
