//! Range tests

use fos_js_dom::{AbstractRange, Document, DomException, Node, Range, StaticRange};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `<div><b>one</b>two<i>three</i></div>` attached to the document
fn sample(doc: &Document) -> (Node, Node, Node, Node) {
    let div = doc.create_element("div").unwrap();
    doc.node().append_child(&div).unwrap();
    let b = doc.create_element("b").unwrap();
    b.append_child(&doc.create_text_node("one")).unwrap();
    div.append_child(&b).unwrap();
    let two = doc.create_text_node("two");
    div.append_child(&two).unwrap();
    let i = doc.create_element("i").unwrap();
    i.append_child(&doc.create_text_node("three")).unwrap();
    div.append_child(&i).unwrap();
    (div, b, two, i)
}

// ============================================================================
// BOUNDARIES
// ============================================================================

#[test]
fn test_select_node_contents_then_collapse() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let mut range = doc.create_range();

    range.select_node_contents(&div).unwrap();
    assert_eq!(range.start_container(), div);
    assert_eq!(range.start_offset(), 0);
    assert_eq!(range.end_offset(), 3);
    assert!(!range.collapsed());
    assert_eq!(range.to_string(), "onetwothree");

    range.collapse(true);
    assert!(range.collapsed());
    assert_eq!(range.end_container(), div);
    assert_eq!(range.end_offset(), 0);
}

#[test]
fn test_setters_do_not_reorder_boundaries() {
    let doc = Document::default();
    let (div, _, two, _) = sample(&doc);
    let mut range = doc.create_range();
    range.set_start(&div, 3).unwrap();
    range.set_end(&two, 1).unwrap();

    // Start after end is kept as set.
    assert_eq!(range.start_container(), div);
    assert_eq!(range.start_offset(), 3);
    assert_eq!(range.end_container(), two);
    assert!(!range.collapsed());
    assert_eq!(range.to_string(), "");
}

#[test]
fn test_before_and_after_setters() {
    let doc = Document::default();
    let (div, b, two, i) = sample(&doc);
    let mut range = doc.create_range();

    range.set_start_after(&b).unwrap();
    range.set_end_before(&i).unwrap();
    assert_eq!((range.start_offset(), range.end_offset()), (1, 2));
    assert_eq!(range.to_string(), "two");

    range.select_node(&two).unwrap();
    assert_eq!(range.start_container(), div);
    assert_eq!((range.start_offset(), range.end_offset()), (1, 2));

    range.set_start_before(&b).unwrap();
    range.set_end_after(&i).unwrap();
    assert_eq!(range.common_ancestor_container(), Some(div));
}

#[test]
fn test_text_range_length_matches_offsets() {
    let doc = Document::default();
    let (_, _, two, _) = sample(&doc);
    let mut range = doc.create_range();
    for (start, end) in [(0, 3), (1, 2), (2, 2)] {
        range.set_start(&two, start).unwrap();
        range.set_end(&two, end).unwrap();
        assert_eq!(range.to_string().chars().count() as u32, end - start);
    }
}

#[test]
fn test_detach_is_a_no_op() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let mut range = doc.create_range();
    range.select_node_contents(&div).unwrap();
    range.detach();
    assert_eq!(range.end_offset(), 3);
    range.set_end(&div, 1).unwrap();
    assert_eq!(range.to_string(), "one");
}

// ============================================================================
// COMPARISON
// ============================================================================

#[test]
fn test_compare_boundary_points_modes() {
    let doc = Document::default();
    let (div, b, two, _) = sample(&doc);
    let mut outer = doc.create_range();
    outer.select_node_contents(&div).unwrap();
    let mut inner = doc.create_range();
    inner.select_node(&two).unwrap();

    assert_eq!(outer.compare_boundary_points(Range::START_TO_START, &inner).unwrap(), -1);
    assert_eq!(outer.compare_boundary_points(Range::END_TO_END, &inner).unwrap(), 1);
    assert_eq!(outer.compare_boundary_points(Range::START_TO_END, &inner).unwrap(), 1);
    assert_eq!(outer.compare_boundary_points(Range::END_TO_START, &inner).unwrap(), -1);
    assert_eq!(inner.compare_boundary_points(Range::START_TO_START, &inner.clone_range()).unwrap(), 0);

    let mut nested = doc.create_range();
    nested.select_node_contents(&b).unwrap();
    assert_eq!(outer.compare_boundary_points(Range::START_TO_START, &nested).unwrap(), -1);
    assert_eq!(nested.compare_boundary_points(Range::START_TO_START, &outer).unwrap(), 1);
}

#[test]
fn test_compare_across_trees_fails() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let mut attached = doc.create_range();
    attached.select_node_contents(&div).unwrap();

    let lone = doc.create_element("p").unwrap();
    let mut detached = doc.create_range();
    detached.select_node_contents(&lone).unwrap();
    assert_eq!(
        attached.compare_boundary_points(Range::START_TO_START, &detached),
        Err(DomException::WrongDocument)
    );

    let other = Document::default();
    assert_eq!(
        attached.compare_boundary_points(Range::START_TO_START, &other.create_range()),
        Err(DomException::WrongDocument)
    );
}

#[test]
fn test_compare_with_end_in_detached_subtree() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let lone = doc.create_element("p").unwrap();

    let mut spanning = doc.create_range();
    spanning.set_start(&div, 0).unwrap();
    spanning.set_end(&lone, 0).unwrap();
    let mut anchored = doc.create_range();
    anchored.set_start(&div, 0).unwrap();
    anchored.collapse(true);

    assert_eq!(
        spanning.compare_boundary_points(Range::END_TO_END, &anchored),
        Err(DomException::WrongDocument)
    );
    assert_eq!(
        anchored.compare_boundary_points(Range::END_TO_END, &spanning),
        Err(DomException::WrongDocument)
    );
    assert_eq!(
        spanning.compare_boundary_points(Range::START_TO_END, &anchored),
        Err(DomException::WrongDocument)
    );
    // Only the two compared points need to share a root.
    assert_eq!(spanning.compare_boundary_points(Range::START_TO_START, &anchored), Ok(0));
    assert_eq!(anchored.compare_boundary_points(Range::START_TO_END, &spanning), Ok(0));
}

#[test]
fn test_clone_range_is_independent() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let mut range = doc.create_range();
    range.select_node_contents(&div).unwrap();
    let copy = range.clone_range();
    range.collapse(false);
    assert_eq!(copy.start_offset(), 0);
    assert_eq!(copy.end_offset(), 3);
    assert!(range.collapsed());
}

// ============================================================================
// CONTENT
// ============================================================================

#[test]
fn test_extract_partial_text() {
    init_tracing();
    let doc = Document::default();
    let (div, b, two, i) = sample(&doc);
    let b_text = b.first_child().unwrap();
    let i_text = i.first_child().unwrap();
    let mut range = doc.create_range();
    range.set_start(&b_text, 1).unwrap();
    range.set_end(&i_text, 2).unwrap();

    let fragment = range.extract_contents().unwrap();
    assert_eq!(fragment.text_content().as_deref(), Some("netwoth"));
    assert_eq!(div.text_content().as_deref(), Some("oree"));
    assert!(range.collapsed());
    assert_eq!(range.start_container(), div);
    assert_eq!(range.start_offset(), 1);
    assert_eq!(two.parent_node(), Some(fragment));
}

#[test]
fn test_clone_contents_leaves_tree_alone() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let mut range = doc.create_range();
    range.select_node_contents(&div).unwrap();
    let fragment = range.clone_contents().unwrap();
    assert_eq!(fragment.text_content().as_deref(), Some("onetwothree"));
    assert!(fragment.is_equal_node(Some(&{
        let copy = div.clone_node(true).unwrap();
        let frag = doc.create_document_fragment();
        while let Some(child) = copy.first_child() {
            frag.append_child(&child).unwrap();
        }
        frag
    })));
    assert_eq!(div.child_nodes().length(), 3);
}

#[test]
fn test_delete_contents_collapses() {
    let doc = Document::default();
    let (div, _, two, _) = sample(&doc);
    let mut range = doc.create_range();
    range.set_start(&two, 1).unwrap();
    range.set_end(&div, 3).unwrap();
    range.delete_contents().unwrap();
    assert_eq!(div.text_content().as_deref(), Some("onet"));
    assert_eq!(two.data().as_deref(), Some("t"));
    assert_eq!(range.start_container(), div);
    assert_eq!(range.start_offset(), 2);
    assert!(range.collapsed());
}

#[test]
fn test_insert_node_splits_text() {
    let doc = Document::default();
    let (div, _, two, _) = sample(&doc);
    let mut range = doc.create_range();
    range.set_start(&two, 1).unwrap();
    range.set_end(&two, 1).unwrap();

    let em = doc.create_element("em").unwrap();
    range.insert_node(&em).unwrap();
    assert_eq!(two.data().as_deref(), Some("t"));
    assert_eq!(two.next_sibling(), Some(em.clone()));
    assert_eq!(em.next_sibling().and_then(|n| n.data()).as_deref(), Some("wo"));
    assert_eq!(div.child_nodes().length(), 5);
    assert_eq!(range.end_container(), div);
}

#[test]
fn test_insert_node_moves_boundary_out_of_moved_node() {
    let doc = Document::default();
    let p = doc.create_element("p").unwrap();
    doc.node().append_child(&p).unwrap();
    for name in ["a", "b"] {
        p.append_child(&doc.create_element(name).unwrap()).unwrap();
    }
    let c = doc.create_element("c").unwrap();
    p.append_child(&c).unwrap();
    let text = doc.create_text_node("xyz");
    c.append_child(&text).unwrap();

    let mut range = doc.create_range();
    range.set_start(&p, 0).unwrap();
    range.set_end(&text, 1).unwrap();
    range.insert_node(&c).unwrap();

    assert_eq!(p.first_child(), Some(c));
    assert_eq!((range.start_container(), range.start_offset()), (p.clone(), 0));
    assert_eq!((range.end_container(), range.end_offset()), (p, 3));
}

#[test]
fn test_surround_contents() {
    let doc = Document::default();
    let (div, _, two, _) = sample(&doc);
    let mut range = doc.create_range();
    range.select_node(&two).unwrap();

    let span = doc.create_element("span").unwrap();
    range.surround_contents(&span).unwrap();
    assert_eq!(two.parent_node(), Some(span.clone()));
    assert_eq!(span.parent_node(), Some(div.clone()));
    assert_eq!(range.start_container(), div);
    assert_eq!((range.start_offset(), range.end_offset()), (1, 2));
}

#[test]
fn test_surround_rejects_partial_selection() {
    let doc = Document::default();
    let (div, b, ..) = sample(&doc);
    let mut range = doc.create_range();
    range.set_start(&b.first_child().unwrap(), 1).unwrap();
    range.set_end(&div, 2).unwrap();
    let span = doc.create_element("span").unwrap();
    assert_eq!(range.surround_contents(&span).unwrap_err().name(), "InvalidStateError");
}

#[test]
fn test_stale_offset_is_rejected() {
    let doc = Document::default();
    let (div, _, two, _) = sample(&doc);
    let mut range = doc.create_range();
    range.set_start(&two, 3).unwrap();
    range.set_end(&div, 3).unwrap();
    two.set_data("x").unwrap();
    assert!(matches!(
        range.delete_contents(),
        Err(DomException::IndexSize { offset: 3, length: 1 })
    ));
}

#[test]
fn test_static_range_from_range() {
    let doc = Document::default();
    let (div, ..) = sample(&doc);
    let mut range = doc.create_range();
    range.select_node_contents(&div).unwrap();
    let snapshot = StaticRange::from_range(&range);
    range.collapse(true);
    assert_eq!(snapshot.end_offset(), 3);
    assert_eq!(snapshot.start_container(), div);
}
