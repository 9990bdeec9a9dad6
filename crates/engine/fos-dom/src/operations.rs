//! DOM Node Operations
//!
//! Error type for structural operations and the DOM pre-insertion and
//! replacement validity checks shared by every insertion path.

use crate::{DomTree, NodeData, NodeId, NodeType};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found (unknown id, or reference child of another parent)
    #[error("Node not found")]
    NotFound,
    /// Hierarchy error (e.g., inserting ancestor)
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(&'static str),
    /// Nodes belong to different documents
    #[error("Wrong document")]
    WrongDocument,
    /// Operation not valid for this kind of node
    #[error("Invalid node type")]
    InvalidNodeType,
    /// Offset outside the node's length
    #[error("Index {offset} is outside length {length}")]
    IndexSize { offset: u32, length: u32 },
    /// Operation not valid in the current state
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
}

impl DomTree {
    /// Check that `node` may be inserted into `parent` before `child`.
    pub fn ensure_pre_insertion_validity(
        &self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_type = self.node_type(parent).ok_or(DomError::NotFound)?;
        let node_type = self.node_type(node).ok_or(DomError::NotFound)?;

        if !matches!(
            parent_type,
            NodeType::Document | NodeType::DocumentFragment | NodeType::Element
        ) {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if self.is_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of parent"));
        }
        if let Some(child) = child {
            if self.parent(child) != Some(parent) {
                return Err(DomError::NotFound);
            }
        }
        self.check_child_kind(node_type, parent_type)?;

        if parent_type == NodeType::Document {
            self.check_document_children(node, node_type, parent, child, None)?;
        }
        Ok(())
    }

    /// Check that `node` may replace `child` under `parent`.
    pub fn ensure_replace_validity(
        &self,
        node: NodeId,
        parent: NodeId,
        child: NodeId,
    ) -> DomResult<()> {
        let parent_type = self.node_type(parent).ok_or(DomError::NotFound)?;
        let node_type = self.node_type(node).ok_or(DomError::NotFound)?;

        if !matches!(
            parent_type,
            NodeType::Document | NodeType::DocumentFragment | NodeType::Element
        ) {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if self.is_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of parent"));
        }
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.check_child_kind(node_type, parent_type)?;

        if parent_type == NodeType::Document {
            self.check_document_children(node, node_type, parent, Some(child), Some(child))?;
        }
        Ok(())
    }

    fn check_child_kind(&self, node_type: NodeType, parent_type: NodeType) -> DomResult<()> {
        match node_type {
            NodeType::Document | NodeType::Attribute => {
                Err(DomError::HierarchyRequest("node cannot be a child"))
            }
            NodeType::Text | NodeType::CDataSection if parent_type == NodeType::Document => {
                Err(DomError::HierarchyRequest("text cannot be a child of a document"))
            }
            NodeType::DocumentType if parent_type != NodeType::Document => {
                Err(DomError::HierarchyRequest("doctype must be a child of a document"))
            }
            _ => Ok(()),
        }
    }

    /// Document-specific rules: one element child, one doctype, doctype
    /// before element. `replaced` is ignored when counting existing children.
    fn check_document_children(
        &self,
        node: NodeId,
        node_type: NodeType,
        parent: NodeId,
        child: Option<NodeId>,
        replaced: Option<NodeId>,
    ) -> DomResult<()> {
        let has_other = |kind: NodeType| {
            self.children(parent)
                .any(|(id, n)| Some(id) != replaced && n.node_type() == kind)
        };
        let doctype_following = |child: NodeId| {
            let mut cur = self.next_sibling(child);
            while let Some(id) = cur {
                if self.node_type(id) == Some(NodeType::DocumentType) {
                    return true;
                }
                cur = self.next_sibling(id);
            }
            false
        };
        let element_preceding = |child: NodeId| {
            let mut cur = self.prev_sibling(child);
            while let Some(id) = cur {
                if Some(id) != replaced && self.node_type(id) == Some(NodeType::Element) {
                    return true;
                }
                cur = self.prev_sibling(id);
            }
            false
        };
        let child_is_doctype =
            |child: Option<NodeId>| child.and_then(|c| self.node_type(c)) == Some(NodeType::DocumentType);

        match node_type {
            NodeType::DocumentFragment => {
                let mut elements = 0;
                for (_, n) in self.children(node) {
                    match n.data {
                        NodeData::Element(_) => elements += 1,
                        NodeData::Text(_) | NodeData::CDataSection(_) => {
                            return Err(DomError::HierarchyRequest(
                                "text cannot be a child of a document",
                            ));
                        }
                        _ => {}
                    }
                }
                if elements > 1 {
                    return Err(DomError::HierarchyRequest("document can have one element"));
                }
                if elements == 1
                    && (has_other(NodeType::Element)
                        || (replaced.is_none() && child_is_doctype(child))
                        || child.is_some_and(doctype_following))
                {
                    return Err(DomError::HierarchyRequest("document can have one element"));
                }
            }
            NodeType::Element => {
                if has_other(NodeType::Element)
                    || (replaced.is_none() && child_is_doctype(child))
                    || child.is_some_and(doctype_following)
                {
                    return Err(DomError::HierarchyRequest("document can have one element"));
                }
            }
            NodeType::DocumentType => {
                let misplaced = match child {
                    Some(c) => element_preceding(c),
                    None => has_other(NodeType::Element),
                };
                if has_other(NodeType::DocumentType) || misplaced {
                    return Err(DomError::HierarchyRequest("misplaced doctype"));
                }
            }
            _ => {}
        }
        Ok(())
    }
}
