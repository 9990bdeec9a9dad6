//! Proxy Registry
//!
//! One script-facing `Node` per backing node. The registry is owned by the
//! document and never forgets a proxy, so repeated lookups of the same
//! `NodeId` hand out the same `Rc` for as long as the document lives.

use std::collections::HashMap;

use fos_dom::NodeId;

use crate::Node;

/// Hook into the scripting host
///
/// The host is told about every proxy exactly once, right after it is
/// created, so it can wrap the proxy in a script object of its own.
pub trait ScriptHost {
    fn expose(&self, node: &Node);
}

/// Map from backing node to its proxy
#[derive(Debug, Default)]
pub struct ProxyRegistry {
    proxies: HashMap<NodeId, Node>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached proxy for `id`, if one was created
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.proxies.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.proxies.contains_key(&id)
    }

    /// Number of proxies created so far
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.proxies.insert(node.id(), node);
    }
}
