//! End-to-end tests for the diff → patch document → merge pipeline.
//!
//! Each round trip serializes the differences between two documents with
//! the patch-ops writer, re-parses the patch document, and applies it to an
//! independently parsed baseline, checking that the target is reconstructed.

use xml_patch::{
    parse_str, structural_eq, DiffEvent, EventCollector, NodeRef, PatchOpsWriter, XmlDiff,
    XmlMerge,
};

/// Runs a full diff → serialize → parse → merge round trip.
fn round_trip(baseline_xml: &str, target_xml: &str, ordered: bool) -> (NodeRef, u32) {
    let tree1 = parse_str(baseline_xml).unwrap();
    let tree2 = parse_str(target_xml).unwrap();

    let mut differ = XmlDiff::new();
    differ.set_ordered(ordered);

    let mut patch_bytes = Vec::new();
    differ
        .diff(&tree1, &tree2, &mut PatchOpsWriter::new(&mut patch_bytes))
        .unwrap();

    let patch = parse_str(std::str::from_utf8(&patch_bytes).unwrap()).unwrap();
    let baseline = parse_str(baseline_xml).unwrap();
    let mut merger = XmlMerge::new();
    let errors = merger.merge(&baseline, &patch).unwrap();
    (baseline, errors)
}

fn assert_round_trip(baseline_xml: &str, target_xml: &str, ordered: bool) {
    let (merged, errors) = round_trip(baseline_xml, target_xml, ordered);
    assert_eq!(errors, 0, "merge reported errors");
    let target = parse_str(target_xml).unwrap();
    assert!(
        structural_eq(&merged, &target),
        "round trip diverged for baseline {:?} target {:?}",
        baseline_xml,
        target_xml
    );
}

fn collect_events(baseline_xml: &str, target_xml: &str, ordered: bool) -> Vec<DiffEvent> {
    let tree1 = parse_str(baseline_xml).unwrap();
    let tree2 = parse_str(target_xml).unwrap();
    let mut differ = XmlDiff::new();
    differ.set_ordered(ordered);
    let mut collector = EventCollector::new();
    differ.diff(&tree1, &tree2, &mut collector).unwrap();
    collector.into_events()
}

#[test]
fn noop_diff_emits_no_events() {
    let documents = [
        "<r/>",
        r#"<r a="1" b="2"/>"#,
        "<r><c>text</c><d/><d/></r>",
        r#"<fields><field id="1" name="Account"><doc>The account</doc></field></fields>"#,
    ];
    for xml in documents {
        assert!(
            collect_events(xml, xml, true).is_empty(),
            "ordered diff of {:?} against itself emitted events",
            xml
        );
        assert!(
            collect_events(xml, xml, false).is_empty(),
            "unordered diff of {:?} against itself emitted events",
            xml
        );
    }
}

#[test]
fn attribute_changes_round_trip() {
    assert_round_trip(
        r#"<r keep="1" gone="x" changed="a"/>"#,
        r#"<r keep="1" changed="b" added="y"/>"#,
        true,
    );
}

#[test]
fn text_changes_round_trip() {
    assert_round_trip("<r><c>old</c></r>", "<r><c>new</c></r>", true);
    assert_round_trip("<r><c/></r>", "<r><c>added</c></r>", true);
}

#[test]
fn element_insertion_round_trips_in_order() {
    assert_round_trip("<r><a/><c/></r>", "<r><a/><b/><c/></r>", true);
    assert_round_trip("<r><a/></r>", "<r><a/><b/><c/></r>", true);
    assert_round_trip("<r/>", "<r><a/></r>", true);
}

#[test]
fn element_removal_round_trips() {
    assert_round_trip("<r><a/><b/><c/></r>", "<r><a/><c/></r>", true);
    assert_round_trip("<r><a><x/><y/></a></r>", "<r><a><x/></a></r>", true);
}

#[test]
fn subtree_insertion_carries_content() {
    assert_round_trip(
        r#"<catalog><book id="1"><title>First</title></book></catalog>"#,
        concat!(
            r#"<catalog><book id="1"><title>First</title></book>"#,
            r#"<book id="2"><title>Second &amp; last</title><price>10</price></book></catalog>"#
        ),
        true,
    );
}

#[test]
fn keyed_elements_round_trip_under_reordering() {
    let baseline = r#"<r><f id="2" v="1"/><f id="1"/></r>"#;
    let target = r#"<r><f id="1"/><f id="2" v="2"/></r>"#;
    let (merged, errors) = round_trip(baseline, target, false);
    assert_eq!(errors, 0);

    // Unordered mode never records moves, so compare up to child order
    let target_tree = parse_str(target).unwrap();
    assert!(structural_eq_unordered(&merged, &target_tree));
}

#[test]
fn unordered_reorder_emits_nothing() {
    let events = collect_events("<r><a/><b/></r>", "<r><b/><a/></r>", false);
    assert!(events.is_empty());
}

#[test]
fn ordered_reorder_emits_add_remove_burst() {
    let events = collect_events("<r><a/><b/></r>", "<r><b/><a/></r>", true);
    let removes = events
        .iter()
        .filter(|e| matches!(e, DiffEvent::Remove { .. }))
        .count();
    let adds = events
        .iter()
        .filter(|e| matches!(e, DiffEvent::Add { .. }))
        .count();
    assert!(removes >= 1 && adds >= 1, "expected an add/remove burst");
    assert_eq!(events.len(), removes + adds);
}

#[test]
fn merge_error_accounting() {
    let baseline = parse_str("<r><a/><d/></r>").unwrap();
    let patch = parse_str(concat!(
        r#"<diff>"#,
        r#"<add sel="/nonexistent"><x/></add>"#,
        r#"<remove sel="/r/d[1]"/>"#,
        r#"</diff>"#
    ))
    .unwrap();

    let mut merger = XmlMerge::new();
    let errors = merger.merge(&baseline, &patch).unwrap();

    assert_eq!(errors, 1);
    let expected = parse_str("<r><a/></r>").unwrap();
    assert!(structural_eq(&baseline, &expected));
}

#[test]
fn concrete_scenario_attribute_text_and_removal() {
    let baseline_xml = r#"<r version="1"><c>old</c><d/></r>"#;
    let target_xml = r#"<r version="2"><c>new</c></r>"#;

    let events = collect_events(baseline_xml, target_xml, true);
    assert_eq!(events.len(), 3);
    match &events[0] {
        DiffEvent::Replace { sel, .. } => assert_eq!(sel, "/r/@version"),
        other => panic!("unexpected first event: {:?}", other),
    }
    match &events[1] {
        DiffEvent::Replace { sel, .. } => assert_eq!(sel, "/r/c[1]"),
        other => panic!("unexpected second event: {:?}", other),
    }
    match &events[2] {
        DiffEvent::Remove { sel } => assert_eq!(sel, "/r/d[1]"),
        other => panic!("unexpected third event: {:?}", other),
    }

    assert_round_trip(baseline_xml, target_xml, true);
}

#[test]
fn repository_style_document_round_trips() {
    let baseline = concat!(
        r#"<repository version="EP215">"#,
        r#"<fields><field id="1" name="Account"><doc>account</doc></field>"#,
        r#"<field id="4" name="AdvSide"/></fields>"#,
        r#"<messages><message name="Heartbeat" msgtype="0"/></messages>"#,
        r#"</repository>"#
    );
    let target = concat!(
        r#"<repository version="EP216">"#,
        r#"<fields><field id="1" name="Account"><doc>the account</doc></field>"#,
        r#"<field id="5" name="AdvRefID"/></fields>"#,
        r#"<messages><message name="Heartbeat" msgtype="0"/>"#,
        r#"<message name="TestRequest" msgtype="1"/></messages>"#,
        r#"</repository>"#
    );
    assert_round_trip(baseline, target, true);

    let (merged, errors) = round_trip(baseline, target, false);
    assert_eq!(errors, 0);
    let target_tree = parse_str(target).unwrap();
    assert!(structural_eq_unordered(&merged, &target_tree));
}

#[test]
fn structure_mismatch_aborts_the_run() {
    let tree1 = parse_str("<repository/>").unwrap();
    let tree2 = parse_str("<catalog/>").unwrap();
    let mut sink = EventCollector::new();
    assert!(XmlDiff::new().diff(&tree1, &tree2, &mut sink).is_err());
}

/// Structural equality up to child element order, for unordered-mode
/// comparisons.
fn structural_eq_unordered(a: &NodeRef, b: &NodeRef) -> bool {
    use std::cmp::Ordering;
    use xml_patch::XmlContent;

    fn sort_key(node: &NodeRef) -> (u8, String, String, String) {
        let borrowed = node.borrow();
        match borrowed.content() {
            XmlContent::Element(e) => (
                1,
                e.qname().to_string(),
                e.attribute_ignore_case("id").unwrap_or("").to_string(),
                e.attribute_ignore_case("name").unwrap_or("").to_string(),
            ),
            XmlContent::Text(t) => (0, t.text().to_string(), String::new(), String::new()),
        }
    }

    fn eq(a: &NodeRef, b: &NodeRef) -> bool {
        let a_borrowed = a.borrow();
        let b_borrowed = b.borrow();
        let content_equal = match (a_borrowed.content(), b_borrowed.content()) {
            (XmlContent::Element(ea), XmlContent::Element(eb)) => {
                ea.qname() == eb.qname() && ea.attributes() == eb.attributes()
            }
            (XmlContent::Text(ta), XmlContent::Text(tb)) => ta.text() == tb.text(),
            _ => false,
        };
        if !content_equal || a_borrowed.child_count() != b_borrowed.child_count() {
            return false;
        }

        let mut a_children: Vec<NodeRef> = a_borrowed.children().to_vec();
        let mut b_children: Vec<NodeRef> = b_borrowed.children().to_vec();
        let by_key = |x: &NodeRef, y: &NodeRef| -> Ordering { sort_key(x).cmp(&sort_key(y)) };
        a_children.sort_by(by_key);
        b_children.sort_by(by_key);
        a_children.iter().zip(b_children.iter()).all(|(x, y)| eq(x, y))
    }

    eq(a, b)
}
