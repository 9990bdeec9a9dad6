//! Collection tests
//!
//! Live invalidation, static snapshots, re-entrant iteration and the
//! specialized document collections.

use std::cell::Cell;
use std::rc::Rc;

use fos_js_dom::{
    Collection, CollectionScope, Document, DocumentConfig, DomException, DomTree, EffectFn,
    MutationEffect, MutationEvent, Node, NodeId, Predicate, SelectorMatcher,
};

mod common;

use common::{parse_selector_list, SimpleSelector, SimpleSelectorMatcher};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn element(doc: &Document, parent: &Node, name: &str) -> Node {
    let node = doc.create_element(name).unwrap();
    parent.append_child(&node).unwrap();
    node
}

fn is_element() -> Predicate {
    Rc::new(|tree: &DomTree, id: NodeId| tree.get(id).is_some_and(|n| n.is_element()))
}

// ============================================================================
// LIVE AND STATIC
// ============================================================================

#[test]
fn test_live_descendants_follow_removal() {
    init_tracing();
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "div");
    let a = element(&doc, &root, "p");
    let b = element(&doc, &a, "span");
    let c = element(&doc, &root, "p");

    let live = Collection::create(&root, CollectionScope::Descendants, is_element(), true, None);
    assert_eq!(live.values().collect::<Vec<_>>(), vec![a.clone(), b, c.clone()]);

    root.remove_child(&a).unwrap();
    assert_eq!(live.values().collect::<Vec<_>>(), vec![c]);
}

#[test]
fn test_effect_none_keeps_stale_cache() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "div");
    element(&doc, &root, "p");

    let ignore: EffectFn = Rc::new(|_: &MutationEvent<'_>| MutationEffect::None);
    let stale = Collection::create(
        &root,
        CollectionScope::Children,
        is_element(),
        true,
        Some(ignore),
    );
    assert_eq!(stale.length(), 1);

    element(&doc, &root, "p");
    assert_eq!(stale.length(), 1);

    let fresh = Collection::create(&root, CollectionScope::Children, is_element(), true, None);
    assert_eq!(fresh.length(), 2);
}

#[test]
fn test_direct_tree_changes_reach_live_collections() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "ul");
    let items = root.children();
    assert_eq!(items.length(), 0);

    let root_id = root.id();
    doc.with_tree_mut(|tree| {
        let li = tree.create_element("li");
        tree.append_child(root_id, li).unwrap();
    });
    assert_eq!(items.length(), 1);
}

#[test]
fn test_child_nodes_is_cached_per_node() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "div");
    assert_eq!(root.child_nodes(), root.child_nodes());
    assert_eq!(root.children(), root.children());
    assert_ne!(root.child_nodes(), root.children());
}

#[test]
fn test_static_query_selector_all() {
    let doc = Document::default();
    doc.set_selector_matcher(Rc::new(SimpleSelectorMatcher));
    let root = element(&doc, &doc.node(), "div");
    let p = element(&doc, &root, "p");
    p.set_attribute("class", "note").unwrap();

    let found = doc.query_selector_all("p.note").unwrap();
    assert!(!found.is_live());
    assert_eq!(found.length(), 1);

    let q = element(&doc, &root, "p");
    q.set_attribute("class", "note").unwrap();
    assert_eq!(found.length(), 1);
    assert_eq!(doc.query_selector("div > .note").unwrap(), Some(p));
}

#[test]
fn test_query_selector_without_matcher() {
    let doc = Document::default();
    assert_eq!(doc.query_selector("div").unwrap_err().name(), "SyntaxError");
}

#[test]
fn test_invalid_selector() {
    let doc = Document::default();
    doc.set_selector_matcher(Rc::new(SimpleSelectorMatcher));
    assert_eq!(doc.query_selector_all("a ~ b").unwrap_err().name(), "SyntaxError");
}

// ============================================================================
// ITERATION
// ============================================================================

#[test]
fn test_for_each_sees_mutations_without_revisiting() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "ul");
    for _ in 0..4 {
        element(&doc, &root, "li");
    }
    let items = root.children();

    // Remove the next item on every visit: 0 sees [0,1,2,3] and removes 1,
    // then index 1 is the old item 2, which removes item 3.
    let visited = Cell::new(0);
    items.for_each(|node, index| {
        visited.set(visited.get() + 1);
        if let Some(next) = node.next_sibling() {
            root.remove_child(&next).unwrap();
        }
        assert_eq!(items.item(index), Some(node.clone()));
    });
    assert_eq!(visited.get(), 2);
    assert_eq!(items.length(), 2);
}

#[test]
fn test_keys_values_entries_are_snapshots() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "ol");
    let first = element(&doc, &root, "li");
    let items = root.children();

    let values = items.values();
    let keys = items.keys();
    element(&doc, &root, "li");

    assert_eq!(values.count(), 1);
    assert_eq!(keys.len(), 1);
    assert_eq!(items.keys().len(), 2);
    let entries: Vec<(usize, Node)> = items.entries().collect();
    assert_eq!(entries[0], (0, first));
    assert_eq!(entries[1].0, 1);
}

#[test]
fn test_out_of_range_is_none() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "div");
    assert_eq!(root.children().item(0), None);
    assert_eq!(root.children().item(usize::MAX), None);
}

// ============================================================================
// SPECIALIZED COLLECTIONS
// ============================================================================

#[test]
fn test_class_name_collection_resets_on_class_change() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "div");
    let a = element(&doc, &root, "span");
    let b = element(&doc, &root, "span");
    a.set_attribute("class", "x y").unwrap();

    let xs = doc.get_elements_by_class_name("y x");
    assert_eq!(xs.length(), 1);

    b.class_list().add(&["x", "y"]).unwrap();
    assert_eq!(xs.length(), 2);
    a.set_attribute("class", "x").unwrap();
    assert_eq!(xs.item(0), Some(b));
    assert_eq!(doc.get_elements_by_class_name("   ").length(), 0);
}

#[test]
fn test_tag_name_collection_case_rules() {
    let doc = Document::default();
    let root = element(&doc, &doc.node(), "div");
    element(&doc, &root, "P");
    let svg = doc
        .create_element_ns(Some("http://www.w3.org/2000/svg"), "foreignObject")
        .unwrap();
    root.append_child(&svg).unwrap();

    assert_eq!(doc.get_elements_by_tag_name("p").length(), 1);
    assert_eq!(doc.get_elements_by_tag_name("P").length(), 1);
    assert_eq!(doc.get_elements_by_tag_name("foreignObject").length(), 1);
    assert_eq!(doc.get_elements_by_tag_name("foreignobject").length(), 0);
    assert_eq!(doc.get_elements_by_tag_name("*").length(), 3);

    let xml = Document::new(DocumentConfig::xml());
    let item = xml.create_element("Item").unwrap();
    xml.node().append_child(&item).unwrap();
    assert_eq!(xml.get_elements_by_tag_name("item").length(), 0);
    assert_eq!(xml.get_elements_by_tag_name("Item").length(), 1);
}

#[test]
fn test_links_and_anchors() {
    let doc = Document::default();
    let body = element(&doc, &doc.node(), "body");
    let a = element(&doc, &body, "a");
    let area = element(&doc, &body, "area");
    area.set_attribute("href", "/map").unwrap();

    let links = doc.links();
    let anchors = doc.anchors();
    assert_eq!(links.length(), 1);
    assert_eq!(anchors.length(), 0);

    a.set_attribute("href", "/home").unwrap();
    a.set_attribute("name", "top").unwrap();
    assert_eq!(links.values().collect::<Vec<_>>(), vec![a.clone(), area]);
    assert_eq!(anchors.item(0), Some(a.clone()));
    assert_eq!(doc.get_elements_by_name("top").item(0), Some(a.clone()));
    assert_eq!(links.named_item("top"), Some(a));
}

#[test]
fn test_document_element_collections() {
    let doc = Document::default();
    let body = element(&doc, &doc.node(), "body");
    for name in ["form", "img", "embed", "script", "img"] {
        element(&doc, &body, name);
    }
    assert_eq!(doc.forms().length(), 1);
    assert_eq!(doc.images().length(), 2);
    assert_eq!(doc.embeds().length(), 1);
    assert_eq!(doc.plugins().length(), 1);
    assert_eq!(doc.scripts().length(), 1);
}

// ============================================================================
// SELECTOR MATCHER
// ============================================================================

#[test]
fn test_parse_compound_selector() {
    let list = parse_selector_list("div#main.box").unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(
        list[0].compounds[0].selectors,
        vec![
            SimpleSelector::Tag("div".into()),
            SimpleSelector::Id("main".into()),
            SimpleSelector::Class("box".into()),
        ]
    );
}

#[test]
fn test_malformed_selectors() {
    for bad in ["", "div,", "a + b", "p:hover", "[x", ".", "div >"] {
        assert!(
            matches!(parse_selector_list(bad), Err(DomException::Syntax(_))),
            "{bad:?} should not parse"
        );
    }
}

#[test]
fn test_matcher_over_raw_tree() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = tree.create_element("div");
    tree.set_attr(div, "id", "main").unwrap();
    tree.set_attr(div, "class", "box wide").unwrap();
    tree.append_child(root, div).unwrap();
    let p = tree.create_element("p");
    tree.set_attr(p, "data-kind", "intro").unwrap();
    tree.append_child(div, p).unwrap();
    let span = tree.create_element("span");
    tree.set_attr(span, "class", "wide").unwrap();
    tree.append_child(p, span).unwrap();

    let matcher = SimpleSelectorMatcher;
    assert_eq!(matcher.query_all(&tree, root, ".wide").unwrap(), vec![div, span]);
    assert_eq!(matcher.query_all(&tree, root, "DIV > P").unwrap(), vec![p]);
    assert_eq!(matcher.query_all(&tree, root, "#main span").unwrap(), vec![span]);
    assert_eq!(matcher.query_all(&tree, root, "div > span").unwrap(), vec![]);
    assert_eq!(
        matcher.query_all(&tree, root, "[data-kind='intro'], span").unwrap(),
        vec![p, span]
    );
    assert_eq!(matcher.query(&tree, div, "*").unwrap(), Some(p));
}
