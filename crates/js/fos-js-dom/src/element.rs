//! Element and attribute accessors
//!
//! Attribute names passed to element methods are lower-cased for HTML
//! elements in HTML documents, the way the HTML parser stores them.

use fos_dom::{DomTree, NodeData, NodeId, NodeType, HTML_NAMESPACE};

use crate::document::validate_name;
use crate::node::{Node, NodeKind};
use crate::{DomException, DomResult};

fn is_html_element(tree: &DomTree, id: NodeId) -> bool {
    tree.node_type(id) == Some(NodeType::Element) && tree.namespace(id) == Some(HTML_NAMESPACE)
}

impl Node {
    /// Attribute name as stored for this element
    fn attribute_key(&self, name: &str) -> String {
        let html = self.doc().is_some_and(|doc| doc.is_html())
            && self.read(is_html_element).unwrap_or(false);
        if html {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    // --- Names ---

    /// DOM `tagName`: qualified name, upper-cased for HTML elements in
    /// HTML documents
    pub fn tag_name(&self) -> Option<String> {
        if self.kind() != NodeKind::Element {
            return None;
        }
        let doc = self.doc()?;
        let tree = doc.tree.borrow();
        let element = tree.get(self.id())?.as_element()?;
        let name = tree.qualified_name(&element.name);
        if doc.is_html() && is_html_element(&tree, self.id()) {
            Some(name.to_ascii_uppercase())
        } else {
            Some(name)
        }
    }

    /// Local name of an element or attribute
    pub fn local_name(&self) -> Option<String> {
        self.read(|tree, id| tree.local_name(id).map(str::to_string))
            .flatten()
    }

    /// Namespace URI of an element or attribute
    pub fn namespace_uri(&self) -> Option<String> {
        self.read(|tree, id| tree.namespace(id).map(str::to_string))
            .flatten()
    }

    /// Namespace prefix of an element or attribute
    pub fn prefix(&self) -> Option<String> {
        self.read(|tree, id| {
            let name = match &tree.get(id)?.data {
                NodeData::Element(e) => e.name,
                NodeData::Attribute(a) => a.name,
                _ => return None,
            };
            name.prefix.map(|p| tree.resolve(p).to_string())
        })
        .flatten()
    }

    // --- Attributes ---

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let key = self.attribute_key(name);
        self.read(|tree, id| tree.get_attr(id, &key).map(str::to_string))
            .flatten()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        let key = self.attribute_key(name);
        self.read(|tree, id| tree.attr_node(id, &key).is_some())
            .unwrap_or(false)
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
        validate_name(name)?;
        let key = self.attribute_key(name);
        let doc = self.live_doc()?;
        doc.mutate(|tree| tree.set_attr(self.id(), &key, value))
    }

    /// Remove the attribute if present
    pub fn remove_attribute(&self, name: &str) -> DomResult<()> {
        let key = self.attribute_key(name);
        let doc = self.live_doc()?;
        doc.mutate(|tree| tree.remove_attr(self.id(), &key).map(|_| ()))
    }

    /// Add the attribute if absent, remove it if present; `force` pins the
    /// outcome. Returns whether the attribute is present afterwards.
    pub fn toggle_attribute(&self, name: &str, force: Option<bool>) -> DomResult<bool> {
        validate_name(name)?;
        match (self.has_attribute(name), force) {
            (true, Some(true)) => Ok(true),
            (true, _) => {
                self.remove_attribute(name)?;
                Ok(false)
            }
            (false, Some(false)) => Ok(false),
            (false, _) => {
                self.set_attribute(name, "")?;
                Ok(true)
            }
        }
    }

    /// The attribute node named `name`
    pub fn get_attribute_node(&self, name: &str) -> Option<Node> {
        let key = self.attribute_key(name);
        self.related(|tree, id| tree.attr_node(id, &key))
    }

    /// Attribute nodes in insertion order
    pub fn attributes(&self) -> Vec<Node> {
        let Some(doc) = self.doc() else {
            return Vec::new();
        };
        let ids = doc.tree.borrow().attr_nodes(self.id()).to_vec();
        ids.into_iter().map(|id| doc.proxy(id)).collect()
    }

    pub fn id_attribute(&self) -> String {
        self.get_attribute("id").unwrap_or_default()
    }

    pub fn set_id_attribute(&self, value: &str) -> DomResult<()> {
        self.set_attribute("id", value)
    }

    /// DOM `className`
    pub fn class_name(&self) -> String {
        self.get_attribute("class").unwrap_or_default()
    }

    pub fn set_class_name(&self, value: &str) -> DomResult<()> {
        self.set_attribute("class", value)
    }

    // --- Attribute nodes ---

    /// Qualified name of an attribute node
    pub fn name(&self) -> Option<String> {
        self.read(|tree, id| {
            let attr = tree.get(id)?.as_attr()?;
            Some(tree.qualified_name(&attr.name))
        })
        .flatten()
    }

    /// Value of an attribute node
    pub fn value(&self) -> Option<String> {
        self.read(|tree, id| tree.get(id)?.as_attr().map(|a| a.value.clone()))
            .flatten()
    }

    /// Set the value of an attribute node
    pub fn set_value(&self, value: &str) -> DomResult<()> {
        if self.kind() != NodeKind::Attribute {
            return Err(DomException::InvalidNodeType);
        }
        let doc = self.live_doc()?;
        doc.mutate(|tree| tree.set_attr_value(self.id(), value))
    }

    /// Element an attribute node is attached to
    pub fn owner_element(&self) -> Option<Node> {
        self.related(|tree, id| tree.get(id)?.as_attr()?.owner.to_option())
    }

    // --- Element children ---

    pub fn first_element_child(&self) -> Option<Node> {
        self.related(|tree, id| {
            tree.children(id)
                .find(|(_, n)| n.is_element())
                .map(|(child, _)| child)
        })
    }

    pub fn last_element_child(&self) -> Option<Node> {
        self.related(|tree, id| {
            let mut cur = tree.last_child(id);
            while let Some(child) = cur {
                if tree.node_type(child) == Some(NodeType::Element) {
                    return Some(child);
                }
                cur = tree.prev_sibling(child);
            }
            None
        })
    }

    pub fn child_element_count(&self) -> usize {
        self.read(|tree, id| tree.children(id).filter(|(_, n)| n.is_element()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, DocumentConfig};

    #[test]
    fn test_attributes_round_trip() {
        let doc = Document::default();
        let div = doc.create_element("div").unwrap();
        div.set_attribute("ID", "main").unwrap();
        assert_eq!(div.get_attribute("id").as_deref(), Some("main"));
        assert_eq!(div.id_attribute(), "main");
        assert!(div.has_attribute("Id"));

        div.remove_attribute("id").unwrap();
        assert!(!div.has_attribute("id"));
        div.remove_attribute("id").unwrap();
    }

    #[test]
    fn test_invalid_attribute_name() {
        let doc = Document::default();
        let div = doc.create_element("div").unwrap();
        assert_eq!(
            div.set_attribute("a b", "x").unwrap_err().name(),
            "InvalidCharacterError"
        );
    }

    #[test]
    fn test_attribute_nodes_are_stable() {
        let doc = Document::default();
        let a = doc.create_element("a").unwrap();
        a.set_attribute("href", "/x").unwrap();
        let attr = a.get_attribute_node("href").unwrap();
        assert_eq!(a.get_attribute_node("href"), Some(attr.clone()));
        assert_eq!(attr.owner_element(), Some(a.clone()));
        assert_eq!(attr.name().as_deref(), Some("href"));

        attr.set_value("/y").unwrap();
        assert_eq!(a.get_attribute("href").as_deref(), Some("/y"));
        assert_eq!(a.attributes(), vec![attr]);
    }

    #[test]
    fn test_toggle_attribute() {
        let doc = Document::default();
        let input = doc.create_element("input").unwrap();
        assert!(input.toggle_attribute("disabled", None).unwrap());
        assert!(input.toggle_attribute("disabled", Some(true)).unwrap());
        assert!(!input.toggle_attribute("disabled", None).unwrap());
        assert!(!input.toggle_attribute("disabled", Some(false)).unwrap());
    }

    #[test]
    fn test_namespaced_element() {
        let doc = Document::new(DocumentConfig::xml());
        let rect = doc
            .create_element_ns(Some("http://www.w3.org/2000/svg"), "svg:rect")
            .unwrap();
        assert_eq!(rect.prefix().as_deref(), Some("svg"));
        assert_eq!(rect.local_name().as_deref(), Some("rect"));
        assert_eq!(rect.tag_name().as_deref(), Some("svg:rect"));
    }

    #[test]
    fn test_element_children() {
        let doc = Document::default();
        let div = doc.create_element("div").unwrap();
        div.append_child(&doc.create_text_node("a")).unwrap();
        let first = doc.create_element("b").unwrap();
        div.append_child(&first).unwrap();
        let last = doc.create_element("i").unwrap();
        div.append_child(&last).unwrap();
        div.append_child(&doc.create_comment("c")).unwrap();

        assert_eq!(div.first_element_child(), Some(first));
        assert_eq!(div.last_element_child(), Some(last));
        assert_eq!(div.child_element_count(), 2);
    }
}
