//! Traversal tests
//!
//! NodeIterator ordering, filtering and removal handling, and TreeWalker
//! navigation.

use std::cell::RefCell;
use std::rc::Rc;

use fos_js_dom::{
    Document, DomResult, FilterResult, Node, NodeFilter, NodeIterator, WhatToShow,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `<div><p>a</p><!--c--><p><span></span></p></div>` attached to the document
fn sample(doc: &Document) -> (Node, Node, Node, Node) {
    let div = doc.create_element("div").unwrap();
    doc.node().append_child(&div).unwrap();
    let p1 = doc.create_element("p").unwrap();
    p1.append_child(&doc.create_text_node("a")).unwrap();
    div.append_child(&p1).unwrap();
    div.append_child(&doc.create_comment("c")).unwrap();
    let p2 = doc.create_element("p").unwrap();
    div.append_child(&p2).unwrap();
    let span = doc.create_element("span").unwrap();
    p2.append_child(&span).unwrap();
    (div, p1, p2, span)
}

fn reject(target: &Node) -> Rc<dyn NodeFilter> {
    let target = target.clone();
    Rc::new(move |node: &Node| -> DomResult<FilterResult> {
        Ok(if *node == target { FilterResult::Reject } else { FilterResult::Accept })
    })
}

fn skip(target: &Node) -> Rc<dyn NodeFilter> {
    let target = target.clone();
    Rc::new(move |node: &Node| -> DomResult<FilterResult> {
        Ok(if *node == target { FilterResult::Skip } else { FilterResult::Accept })
    })
}

fn drain(iter: &NodeIterator) -> Vec<Node> {
    let mut out = Vec::new();
    while let Some(node) = iter.next_node().unwrap() {
        out.push(node);
    }
    out
}

// ============================================================================
// NODE ITERATOR
// ============================================================================

#[test]
fn test_iterator_forward_then_back() {
    init_tracing();
    let doc = Document::default();
    let (div, p1, p2, span) = sample(&doc);
    let iter = doc.create_node_iterator(&div, WhatToShow::ELEMENT, None);

    assert_eq!(drain(&iter), vec![div.clone(), p1.clone(), p2.clone(), span.clone()]);
    assert_eq!(iter.reference_node(), span);

    let mut back = Vec::new();
    while let Some(node) = iter.previous_node().unwrap() {
        back.push(node);
    }
    assert_eq!(back, vec![span, p2, p1, div.clone()]);
    assert_eq!(iter.reference_node(), div);
    assert!(iter.pointer_before_reference());
}

#[test]
fn test_iterator_mask_selects_node_types() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let iter = doc.create_node_iterator(&div, WhatToShow::TEXT | WhatToShow::COMMENT, None);
    let kinds: Vec<u16> = drain(&iter).iter().map(Node::node_type).collect();
    assert_eq!(kinds, vec![Node::TEXT_NODE, Node::COMMENT_NODE]);
}

#[test]
fn test_iterator_reject_only_skips_the_node() {
    let doc = Document::default();
    let (div, p1, p2, span) = sample(&doc);
    let iter = doc.create_node_iterator(&div, WhatToShow::ELEMENT, Some(reject(&p2)));
    assert_eq!(drain(&iter), vec![div, p1, span]);
}

#[test]
fn test_reentrant_filter_is_rejected() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let slot: Rc<RefCell<Option<NodeIterator>>> = Rc::new(RefCell::new(None));
    let inner = slot.clone();
    let filter: Rc<dyn NodeFilter> = Rc::new(move |_: &Node| -> DomResult<FilterResult> {
        if let Some(iter) = inner.borrow().as_ref() {
            iter.next_node()?;
        }
        Ok(FilterResult::Accept)
    });
    let iter = doc.create_node_iterator(&div, WhatToShow::ALL, Some(filter));
    *slot.borrow_mut() = Some(iter.clone());

    let err = iter.next_node().unwrap_err();
    assert_eq!(err.name(), "InvalidStateError");
    assert_eq!(iter.reference_node(), div);
    slot.borrow_mut().take();
}

#[test]
fn test_removal_moves_reference_back() {
    let doc = Document::default();
    let (div, p1, ..) = sample(&doc);
    let iter = doc.create_node_iterator(&div, WhatToShow::ALL, None);
    iter.next_node().unwrap();
    assert_eq!(iter.next_node().unwrap(), Some(p1.clone()));

    div.remove_child(&p1).unwrap();
    assert_eq!(iter.reference_node(), div);
    assert!(!iter.pointer_before_reference());
    assert_eq!(iter.next_node().unwrap().map(|n| n.node_type()), Some(Node::COMMENT_NODE));
}

#[test]
fn test_removal_moves_reference_forward() {
    let doc = Document::default();
    let (div, p1, ..) = sample(&doc);
    let iter = doc.create_node_iterator(&div, WhatToShow::ALL, None);
    iter.next_node().unwrap();
    iter.next_node().unwrap();
    assert_eq!(iter.previous_node().unwrap(), Some(p1.clone()));
    assert!(iter.pointer_before_reference());

    // The text inside p1 goes with it.
    div.remove_child(&p1).unwrap();
    let reference = iter.reference_node();
    assert_eq!(reference.node_type(), Node::COMMENT_NODE);
    assert!(iter.pointer_before_reference());
    assert_eq!(iter.next_node().unwrap(), Some(reference));
}

#[test]
fn test_removing_the_root_keeps_reference() {
    let doc = Document::default();
    let (div, _, p2, span) = sample(&doc);
    let iter = doc.create_node_iterator(&p2, WhatToShow::ALL, None);
    iter.next_node().unwrap();
    assert_eq!(iter.next_node().unwrap(), Some(span.clone()));

    div.remove_child(&p2).unwrap();
    assert_eq!(iter.reference_node(), span);
    assert_eq!(iter.previous_node().unwrap(), Some(span));
}

#[test]
fn test_iterator_detach_is_a_no_op() {
    let doc = Document::default();
    let (div, p1, ..) = sample(&doc);
    let iter = doc.create_node_iterator(&div, WhatToShow::ELEMENT, None);
    iter.detach();
    assert_eq!(iter.next_node().unwrap(), Some(div));
    assert_eq!(iter.next_node().unwrap(), Some(p1));
    assert_eq!(iter.root().node_name(), "DIV");
}

// ============================================================================
// TREE WALKER
// ============================================================================

#[test]
fn test_walker_navigation() {
    let doc = Document::default();
    let (div, p1, p2, span) = sample(&doc);
    let walker = doc.create_tree_walker(&div, WhatToShow::ELEMENT, None);

    assert_eq!(walker.first_child().unwrap(), Some(p1.clone()));
    assert_eq!(walker.next_sibling().unwrap(), Some(p2.clone()));
    assert_eq!(walker.first_child().unwrap(), Some(span.clone()));
    assert_eq!(walker.parent_node().unwrap(), Some(p2.clone()));
    assert_eq!(walker.previous_sibling().unwrap(), Some(p1.clone()));

    // p1 only holds text, which the mask hides.
    assert_eq!(walker.last_child().unwrap(), None);
    assert_eq!(walker.current_node(), p1);

    assert_eq!(walker.parent_node().unwrap(), Some(div.clone()));
    assert_eq!(walker.parent_node().unwrap(), None);
    assert_eq!(walker.current_node(), div);
    assert_eq!(walker.last_child().unwrap(), Some(p2.clone()));
}

#[test]
fn test_walker_document_order() {
    let doc = Document::default();
    let (div, p1, p2, span) = sample(&doc);
    let walker = doc.create_tree_walker(&div, WhatToShow::ELEMENT, None);

    let mut forward = Vec::new();
    while let Some(node) = walker.next_node().unwrap() {
        forward.push(node);
    }
    assert_eq!(forward, vec![p1.clone(), p2.clone(), span.clone()]);

    assert_eq!(walker.previous_node().unwrap(), Some(p2));
    assert_eq!(walker.previous_node().unwrap(), Some(p1));
    assert_eq!(walker.previous_node().unwrap(), Some(div));
    assert_eq!(walker.previous_node().unwrap(), None);
}

#[test]
fn test_walker_reject_prunes_subtree() {
    let doc = Document::default();
    let (div, p1, p2, span) = sample(&doc);

    let rejecting = doc.create_tree_walker(&div, WhatToShow::ELEMENT, Some(reject(&p2)));
    assert_eq!(rejecting.next_node().unwrap(), Some(p1.clone()));
    assert_eq!(rejecting.next_node().unwrap(), None);

    let skipping = doc.create_tree_walker(&div, WhatToShow::ELEMENT, Some(skip(&p2)));
    assert_eq!(skipping.next_node().unwrap(), Some(p1.clone()));
    assert_eq!(skipping.next_node().unwrap(), Some(span.clone()));

    // A skipped node's children stand in for it among siblings.
    skipping.set_current_node(&p1);
    assert_eq!(skipping.next_sibling().unwrap(), Some(span));
}

#[test]
fn test_walker_current_node_outside_root() {
    let doc = Document::default();
    let (div, p1, ..) = sample(&doc);
    let stray = doc.create_element("aside").unwrap();
    let walker = doc.create_tree_walker(&p1, WhatToShow::ALL, None);

    walker.set_current_node(&stray);
    assert_eq!(walker.parent_node().unwrap(), None);
    assert_eq!(walker.next_node().unwrap(), None);

    walker.set_current_node(&div);
    assert_eq!(walker.current_node(), div);
}
