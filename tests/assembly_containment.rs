//! Containment assembly driven end to end through a session
//!
//! The scripted grammar emits only flat `node` descriptors; structure must
//! come entirely from span nesting. Descriptor order is deliberately
//! shuffled in places, since the assembler sorts before building.

use jcst::facts::NODE;
use jcst::testing::{corpus, ReplayEvaluator, ReplayFactory};
use jcst::{
    AssemblyStrategy, CorruptRelationError, Node, NodeSpan, ParseSession, SessionConfig,
    SessionError, SyntaxTree, TokenOffsets,
};

fn containment_session() -> ParseSession {
    ParseSession::with_config(SessionConfig {
        strategy: AssemblyStrategy::Containment,
        ..SessionConfig::default()
    })
}

fn script(spans: &[(&str, u32, u32)]) -> ReplayEvaluator {
    let mut evaluator = ReplayEvaluator::new();
    let rows = spans
        .iter()
        .map(|&(name, start, end)| vec![evaluator.symbol(name), start, end])
        .collect();
    evaluator.provide(NODE, rows);
    evaluator
}

fn assert_round_trip(tree: &SyntaxTree, offsets: &TokenOffsets) {
    fn walk(node: Node<'_>, offsets: &TokenOffsets) {
        let tokens = node.token_range();
        assert_eq!(
            offsets.span_of_tokens(tokens.start, tokens.end),
            Some(node.byte_range()),
            "node `{}`",
            node.name()
        );
        for child in node.children() {
            walk(child, offsets);
        }
    }
    walk(tree.root(), offsets);
}

#[test]
fn test_structure_is_recovered_from_nesting_alone() {
    let mut session = containment_session();
    session.add_source("counter", corpus::COUNTER_METHOD).unwrap();
    let factory = ReplayFactory::single(script(&[
        ("return_statement", 12, 15),
        ("class_declaration", 0, 17),
        ("identifier", 4, 5),
        ("block", 7, 16),
        ("identifier", 1, 2),
        ("method_declaration", 3, 16),
        ("expression_statement", 8, 12),
    ]));
    assert_eq!(session.run(&factory).unwrap(), 1);

    let tree = session.tree("counter").unwrap();
    let class_decl = tree.root();
    assert_eq!(class_decl.name(), "class_declaration");
    assert_eq!(class_decl.byte_range(), 0..82);

    let class_kids: Vec<_> = class_decl
        .children()
        .map(|node| (node.name().to_string(), node.byte_range()))
        .collect();
    assert_eq!(
        class_kids,
        vec![
            ("identifier".to_string(), 6..13),
            ("method_declaration".to_string(), 20..80),
        ]
    );

    let method = class_decl.children().nth(1).unwrap();
    let method_kids: Vec<_> = method.children().map(|node| node.name().to_string()).collect();
    assert_eq!(method_kids, vec!["identifier", "block"]);

    let block = method.children().nth(1).unwrap();
    let statements: Vec<_> = block
        .children()
        .map(|node| (node.name().to_string(), node.byte_range()))
        .collect();
    assert_eq!(
        statements,
        vec![
            ("expression_statement".to_string(), 41..52),
            ("return_statement".to_string(), 61..74),
        ]
    );

    // Containment trees carry no grammar-symbol labels.
    assert!(class_decl.field("name").is_none());
    assert_eq!(class_decl.fields().count(), 0);
    assert_eq!(class_decl.list_names().count(), 0);

    assert_round_trip(tree, session.offsets("counter").unwrap());
}

#[test]
fn test_descriptor_order_does_not_matter() {
    let spans: [(&str, u32, u32); 4] = [
        ("class_declaration", 0, 10),
        ("identifier", 1, 2),
        ("field_declaration", 3, 6),
        ("field_declaration", 6, 9),
    ];
    let mut shuffled = spans;
    shuffled.reverse();

    let parse = |rows: &[(&str, u32, u32)]| {
        let mut session = containment_session();
        session.add_source("point", corpus::POINT_CLASS).unwrap();
        session.run(&ReplayFactory::single(script(rows))).unwrap();
        session.tree("point").cloned().unwrap()
    };
    assert_eq!(parse(&spans), parse(&shuffled));
}

#[test]
fn test_overlapping_spans_abort_with_both_nodes_named() {
    let mut session = containment_session();
    session.add_source("point", corpus::POINT_CLASS).unwrap();
    let factory = ReplayFactory::single(script(&[("a", 0, 5), ("b", 3, 8)]));
    let err = session.run(&factory).unwrap_err();
    assert_eq!(
        err,
        SessionError::CorruptRelation(CorruptRelationError::OverlappingSpans {
            first: NodeSpan { name: "a".to_string(), start: 0, end: 19 },
            second: NodeSpan { name: "b".to_string(), start: 14, end: 26 },
        })
    );
    assert!(session.tree("point").is_none());
}

#[test]
fn test_disjoint_top_level_spans_abort() {
    let mut session = containment_session();
    session.add_source("point", corpus::POINT_CLASS).unwrap();
    let factory = ReplayFactory::single(script(&[("a", 0, 3), ("b", 3, 6)]));
    let err = session.run(&factory).unwrap_err();
    match err {
        SessionError::CorruptRelation(CorruptRelationError::MultipleRoots { root, node }) => {
            assert_eq!(root.name, "a");
            assert_eq!(node.name, "b");
        }
        other => panic!("expected MultipleRoots, got {:?}", other),
    }
}

#[test]
fn test_empty_node_relation_is_a_non_parse() {
    let mut session = containment_session();
    session.add_source("point", corpus::POINT_CLASS).unwrap();
    let assembled = session.run(&ReplayFactory::single(ReplayEvaluator::new())).unwrap();
    assert_eq!(assembled, 0);
    assert!(session.tree("point").is_none());
}
