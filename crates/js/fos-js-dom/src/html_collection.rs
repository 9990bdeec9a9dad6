//! Specialized collections
//!
//! The DOM's named collections, each built from a predicate and an effect
//! function on top of `Collection`.

use std::rc::Rc;

use fos_dom::{DomTree, NodeId, NodeType, HTML_NAMESPACE};

use crate::collection::{reset_on_attributes, Collection, CollectionScope, Predicate};
use crate::node::Node;
use crate::token_list::parse_tokens;
use crate::{Document, DomException, DomResult};

fn is_element(tree: &DomTree, id: NodeId) -> bool {
    tree.node_type(id) == Some(NodeType::Element)
}

/// HTML element with one of the given local names
fn is_html_element(tree: &DomTree, id: NodeId, names: &[&str]) -> bool {
    tree.namespace(id) == Some(HTML_NAMESPACE)
        && tree.local_name(id).is_some_and(|local| names.contains(&local))
}

fn html_elements(names: &'static [&'static str]) -> Predicate {
    Rc::new(move |tree: &DomTree, id: NodeId| is_html_element(tree, id, names))
}

/// Qualified name of an element, or `None` for other nodes
fn element_qualified_name(tree: &DomTree, id: NodeId) -> Option<String> {
    let element = tree.get(id)?.as_element()?;
    Some(tree.qualified_name(&element.name))
}

impl Node {
    /// Live list of all children
    pub fn child_nodes(&self) -> Collection {
        self.inner()
            .child_nodes
            .get_or_init(|| {
                let all: Predicate = Rc::new(|_: &DomTree, _: NodeId| true);
                Collection::create(self, CollectionScope::Children, all, true, None)
            })
            .clone()
    }

    /// Live list of element children
    pub fn children(&self) -> Collection {
        self.inner()
            .children
            .get_or_init(|| {
                Collection::create(self, CollectionScope::Children, Rc::new(is_element), true, None)
            })
            .clone()
    }

    /// Live list of descendant elements named `qualified_name` (`"*"` for
    /// all). In HTML documents, HTML elements match the lower-cased name.
    pub fn get_elements_by_tag_name(&self, qualified_name: &str) -> Collection {
        let is_html = self.doc().is_some_and(|doc| doc.is_html());
        let wanted = qualified_name.to_string();
        let lowered = qualified_name.to_ascii_lowercase();
        let predicate: Predicate = Rc::new(move |tree: &DomTree, id: NodeId| {
            let Some(name) = element_qualified_name(tree, id) else {
                return false;
            };
            if wanted == "*" {
                return true;
            }
            if is_html && tree.namespace(id) == Some(HTML_NAMESPACE) {
                name == lowered
            } else {
                name == wanted
            }
        });
        Collection::create(self, CollectionScope::Descendants, predicate, true, None)
    }

    /// Live list of descendant elements carrying every class in
    /// `class_names`; an empty set matches nothing
    pub fn get_elements_by_class_name(&self, class_names: &str) -> Collection {
        let wanted = parse_tokens(class_names);
        let predicate: Predicate = Rc::new(move |tree: &DomTree, id: NodeId| {
            if wanted.is_empty() || !is_element(tree, id) {
                return false;
            }
            let classes = parse_tokens(tree.get_attr(id, "class").unwrap_or_default());
            wanted.iter().all(|class| classes.contains(class))
        });
        Collection::create(
            self,
            CollectionScope::Descendants,
            predicate,
            true,
            Some(reset_on_attributes(&["class"])),
        )
    }

    /// First descendant element matching `selectors`
    pub fn query_selector(&self, selectors: &str) -> DomResult<Option<Node>> {
        let doc = self.live_doc()?;
        let matcher = doc
            .selector_matcher
            .borrow()
            .clone()
            .ok_or_else(|| DomException::Syntax("no selector engine installed".to_string()))?;
        let found = matcher.query(&doc.tree.borrow(), self.id(), selectors)?;
        Ok(found.map(|id| doc.proxy(id)))
    }

    /// Static list of descendant elements matching `selectors`
    pub fn query_selector_all(&self, selectors: &str) -> DomResult<Collection> {
        let doc = self.live_doc()?;
        let matcher = doc
            .selector_matcher
            .borrow()
            .clone()
            .ok_or_else(|| DomException::Syntax("no selector engine installed".to_string()))?;
        let found = matcher.query_all(&doc.tree.borrow(), self.id(), selectors)?;
        Ok(Collection::from_nodes(self, found))
    }
}

impl Document {
    fn document_collection(&self, predicate: Predicate, attributes: &'static [&'static str]) -> Collection {
        let effect = if attributes.is_empty() {
            None
        } else {
            Some(reset_on_attributes(attributes))
        };
        Collection::create(&self.node(), CollectionScope::Descendants, predicate, true, effect)
    }

    /// `<form>` elements
    pub fn forms(&self) -> Collection {
        self.document_collection(html_elements(&["form"]), &[])
    }

    /// `<img>` elements
    pub fn images(&self) -> Collection {
        self.document_collection(html_elements(&["img"]), &[])
    }

    /// `<embed>` elements
    pub fn embeds(&self) -> Collection {
        self.document_collection(html_elements(&["embed"]), &[])
    }

    /// Same as `embeds`
    pub fn plugins(&self) -> Collection {
        self.embeds()
    }

    /// `<script>` elements
    pub fn scripts(&self) -> Collection {
        self.document_collection(html_elements(&["script"]), &[])
    }

    /// `<a>` and `<area>` elements with an `href`
    pub fn links(&self) -> Collection {
        let predicate: Predicate = Rc::new(|tree: &DomTree, id: NodeId| {
            is_html_element(tree, id, &["a", "area"]) && tree.get_attr(id, "href").is_some()
        });
        self.document_collection(predicate, &["href"])
    }

    /// `<a>` elements with a `name`
    pub fn anchors(&self) -> Collection {
        let predicate: Predicate = Rc::new(|tree: &DomTree, id: NodeId| {
            is_html_element(tree, id, &["a"]) && tree.get_attr(id, "name").is_some()
        });
        self.document_collection(predicate, &["name"])
    }

    /// Elements whose `name` attribute is `name`
    pub fn get_elements_by_name(&self, name: &str) -> Collection {
        let wanted = name.to_string();
        let predicate: Predicate = Rc::new(move |tree: &DomTree, id: NodeId| {
            is_element(tree, id) && tree.get_attr(id, "name") == Some(wanted.as_str())
        });
        self.document_collection(predicate, &["name"])
    }

    /// Live list of elements named `qualified_name`
    pub fn get_elements_by_tag_name(&self, qualified_name: &str) -> Collection {
        self.node().get_elements_by_tag_name(qualified_name)
    }

    /// Live list of elements carrying every class in `class_names`
    pub fn get_elements_by_class_name(&self, class_names: &str) -> Collection {
        self.node().get_elements_by_class_name(class_names)
    }

    pub fn query_selector(&self, selectors: &str) -> DomResult<Option<Node>> {
        self.node().query_selector(selectors)
    }

    pub fn query_selector_all(&self, selectors: &str) -> DomResult<Collection> {
        self.node().query_selector_all(selectors)
    }
}
