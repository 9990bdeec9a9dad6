//! Node equality
//!
//! `is_same_node` is proxy identity. `is_equal_node` compares structure:
//! kind-specific fields, attributes as a name-keyed set, then children
//! pairwise in order. The two nodes may live in different documents, so
//! names are compared as resolved strings rather than interned ids.

use fos_dom::{DomTree, NodeData, NodeId, QualName};

use crate::node::{Node, NodeKind};

/// Resolved `(namespace, prefix, local)` of a qualified name
fn name_parts<'t>(tree: &'t DomTree, name: &QualName) -> (&'t str, Option<&'t str>, &'t str) {
    (
        tree.resolve(name.ns),
        name.prefix.map(|p| tree.resolve(p)),
        tree.resolve(name.local),
    )
}

fn attr_equal(ta: &DomTree, a: NodeId, tb: &DomTree, b: NodeId) -> bool {
    match (ta.get(a).and_then(|n| n.as_attr()), tb.get(b).and_then(|n| n.as_attr())) {
        (Some(x), Some(y)) => name_parts(ta, &x.name) == name_parts(tb, &y.name) && x.value == y.value,
        _ => false,
    }
}

/// Same attribute count, and every attribute of `a` has an equal
/// counterpart of the same name on `b`
fn attributes_equal(ta: &DomTree, a: NodeId, tb: &DomTree, b: NodeId) -> bool {
    let attrs_a = ta.attr_nodes(a);
    let attrs_b = tb.attr_nodes(b);
    if attrs_a.len() != attrs_b.len() {
        return false;
    }
    attrs_a.iter().all(|&x| {
        let Some(name) = ta.get(x).and_then(|n| n.as_attr()).map(|attr| name_parts(ta, &attr.name))
        else {
            return false;
        };
        attrs_b.iter().any(|&y| {
            tb.get(y)
                .and_then(|n| n.as_attr())
                .is_some_and(|attr| name_parts(tb, &attr.name) == name)
                && attr_equal(ta, x, tb, y)
        })
    })
}

/// Kind-specific fields only
fn shallow_equal(ta: &DomTree, a: NodeId, tb: &DomTree, b: NodeId) -> bool {
    let (Some(x), Some(y)) = (ta.get(a), tb.get(b)) else {
        return false;
    };
    match (&x.data, &y.data) {
        (NodeData::Document, NodeData::Document)
        | (NodeData::DocumentFragment, NodeData::DocumentFragment) => true,
        (
            NodeData::Doctype {
                name: name_a,
                public_id: public_a,
                system_id: system_a,
            },
            NodeData::Doctype {
                name: name_b,
                public_id: public_b,
                system_id: system_b,
            },
        ) => {
            ta.resolve(*name_a) == tb.resolve(*name_b) && public_a == public_b && system_a == system_b
        }
        (NodeData::Element(ea), NodeData::Element(eb)) => {
            name_parts(ta, &ea.name) == name_parts(tb, &eb.name) && attributes_equal(ta, a, tb, b)
        }
        (NodeData::Attribute(_), NodeData::Attribute(_)) => attr_equal(ta, a, tb, b),
        (
            NodeData::ProcessingInstruction {
                target: target_a,
                data: data_a,
            },
            NodeData::ProcessingInstruction {
                target: target_b,
                data: data_b,
            },
        ) => ta.resolve(*target_a) == tb.resolve(*target_b) && data_a == data_b,
        (NodeData::Text(da), NodeData::Text(db))
        | (NodeData::CDataSection(da), NodeData::CDataSection(db))
        | (NodeData::Comment(da), NodeData::Comment(db)) => da == db,
        _ => false,
    }
}

/// Structural equality of two subtrees
pub(crate) fn nodes_equal(ta: &DomTree, a: NodeId, tb: &DomTree, b: NodeId) -> bool {
    if !shallow_equal(ta, a, tb, b) || ta.child_count(a) != tb.child_count(b) {
        return false;
    }
    ta.children(a)
        .zip(tb.children(b))
        .all(|((x, _), (y, _))| nodes_equal(ta, x, tb, y))
}

impl Node {
    /// Identity: the same proxy, hence the same backing node
    pub fn is_same_node(&self, other: Option<&Node>) -> bool {
        other.is_some_and(|other| self == other)
    }

    /// Structural equality
    pub fn is_equal_node(&self, other: Option<&Node>) -> bool {
        let Some(other) = other else {
            return false;
        };
        if self == other {
            return true;
        }
        if self.kind() != other.kind() || self.kind() == NodeKind::Unknown {
            return false;
        }
        let (Some(doc_a), Some(doc_b)) = (self.doc(), other.doc()) else {
            return false;
        };
        let tree_a = doc_a.tree.borrow();
        let tree_b = doc_b.tree.borrow();
        nodes_equal(&tree_a, self.id(), &tree_b, other.id())
    }
}
