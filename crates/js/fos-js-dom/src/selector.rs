//! Selector matching for `querySelector` and `querySelectorAll`
//!
//! The document delegates selector matching to an embedder-supplied
//! `SelectorMatcher`. Without one, selector queries fail with
//! `SyntaxError`.

use fos_dom::{DomTree, NodeId};

use crate::DomResult;

/// Selector engine used by `query_selector*`
pub trait SelectorMatcher {
    /// Descendant elements of `root` matching `selectors`, in tree order
    fn query_all(&self, tree: &DomTree, root: NodeId, selectors: &str) -> DomResult<Vec<NodeId>>;

    /// First descendant element of `root` matching `selectors`
    fn query(&self, tree: &DomTree, root: NodeId, selectors: &str) -> DomResult<Option<NodeId>> {
        Ok(self.query_all(tree, root, selectors)?.into_iter().next())
    }
}
