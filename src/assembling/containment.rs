//! Assembly from span nesting
//!
//! The grammar emits only `node(name, start_token, end_token)` descriptors
//! with no parent links. Sorting descriptors by `(start ascending, end
//! descending)` puts every node before its descendants and orders siblings
//! by source position, so a single pass with a stack of open ancestors
//! recovers the tree. The spans must form a laminar family: two spans
//! either nest or are disjoint. Partial overlap is corrupt input and stops
//! assembly, as does a second span outside the established root.

use crate::assembling::{resolve_span, AssembleError, CorruptRelationError, NodeSpan};
use crate::evaluator::GrammarEvaluator;
use crate::facts::NODE;
use crate::offsets::TokenOffsets;
use crate::tree::{NodeId, SyntaxTree, TreeBuilder};

struct Descriptor {
    name: String,
    byte_start: usize,
    byte_end: usize,
    token_start: u32,
    token_end: u32,
}

/// Build the tree implied by the evaluator's span descriptors
///
/// An empty `node` relation means the grammar derived no tree for the
/// unit; that is a non-parse, not an error.
pub fn assemble(
    evaluator: &dyn GrammarEvaluator,
    offsets: &TokenOffsets,
) -> Result<Option<SyntaxTree>, AssembleError> {
    let mut descriptors = Vec::new();
    for row in evaluator.iterate(NODE)? {
        let (name_code, start, end) = match row.as_slice() {
            [name, start, end] => (*name, *start, *end),
            _ => {
                return Err(CorruptRelationError::MalformedRow {
                    relation: NODE.to_string(),
                    expected: 3,
                    actual: row.len(),
                }
                .into())
            }
        };
        let name = evaluator.decode_symbol(name_code)?.to_string();
        let bytes = resolve_span(&name, start, end, offsets)?;
        descriptors.push(Descriptor {
            name,
            byte_start: bytes.start,
            byte_end: bytes.end,
            token_start: start,
            token_end: end,
        });
    }
    if descriptors.is_empty() {
        return Ok(None);
    }

    // Outermost first; among equal starts the longer span wins, and the
    // name breaks exact-span ties so input order never shows in the tree.
    descriptors.sort_by(|a, b| {
        a.byte_start
            .cmp(&b.byte_start)
            .then(b.byte_end.cmp(&a.byte_end))
            .then(a.name.cmp(&b.name))
    });

    let mut builder = TreeBuilder::new();
    let mut stack: Vec<(NodeId, usize, usize)> = Vec::new();
    let mut root: Option<(NodeId, usize, usize)> = None;
    for descriptor in descriptors {
        let Descriptor { name, byte_start, byte_end, token_start, token_end } = descriptor;
        let parent = loop {
            let Some(&(top, top_start, top_end)) = stack.last() else {
                break None;
            };
            if top_end <= byte_start {
                // Disjoint, that subtree is finished.
                stack.pop();
                continue;
            }
            if top_start <= byte_start && top_end >= byte_end {
                break Some(top);
            }
            return Err(CorruptRelationError::OverlappingSpans {
                first: span_of(&builder, top, top_start, top_end),
                second: NodeSpan { name, start: byte_start, end: byte_end },
            }
            .into());
        };
        match parent {
            None => {
                if let Some((root_id, root_start, root_end)) = root {
                    return Err(CorruptRelationError::MultipleRoots {
                        root: span_of(&builder, root_id, root_start, root_end),
                        node: NodeSpan { name, start: byte_start, end: byte_end },
                    }
                    .into());
                }
                let id = builder.push(name, byte_start..byte_end, token_start..token_end);
                root = Some((id, byte_start, byte_end));
                stack.push((id, byte_start, byte_end));
            }
            Some(parent) => {
                let id = builder.push(name, byte_start..byte_end, token_start..token_end);
                builder.attach_child(parent, id);
                stack.push((id, byte_start, byte_end));
            }
        }
    }

    let Some((root_id, _, _)) = root else {
        return Ok(None);
    };
    tracing::debug!(nodes = builder.len(), "assembled tree from span nesting");
    Ok(Some(builder.finish(root_id)))
}

fn span_of(builder: &TreeBuilder, id: NodeId, start: usize, end: usize) -> NodeSpan {
    NodeSpan { name: builder.name_of(id).to_string(), start, end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::CONTAINMENT_OUTPUT_SCHEMAS;
    use crate::lexing::tokenize;
    use crate::testing::ReplayEvaluator;

    // Ten single-letter tokens; token i spans bytes [2i, 2i+1).
    const SOURCE: &str = "a b c d e f g h i j";

    fn offsets() -> TokenOffsets {
        let tokens = tokenize(SOURCE).into_result().unwrap();
        TokenOffsets::from_tokens(&tokens)
    }

    fn descriptor_rows(evaluator: &mut ReplayEvaluator, spans: &[(&str, u32, u32)]) {
        let rows = spans
            .iter()
            .map(|&(name, start, end)| vec![evaluator.symbol(name), start, end])
            .collect();
        evaluator.provide(NODE, rows);
    }

    #[test]
    fn test_no_descriptors_is_a_non_parse() {
        let mut evaluator = ReplayEvaluator::new();
        evaluator.declare_relations(&CONTAINMENT_OUTPUT_SCHEMAS).unwrap();
        assert_eq!(assemble(&evaluator, &offsets()), Ok(None));
    }

    #[test]
    fn test_nesting_recovers_the_tree() {
        let mut evaluator = ReplayEvaluator::new();
        // Shuffled on purpose; sorting must put ancestors first.
        descriptor_rows(
            &mut evaluator,
            &[("d", 6, 7), ("a", 0, 10), ("c", 5, 8), ("b", 2, 4)],
        );

        let tree = assemble(&evaluator, &offsets()).unwrap().unwrap();
        let root = tree.root();
        assert_eq!(root.name(), "a");
        let kids: Vec<_> = root.children().map(|n| n.name().to_string()).collect();
        assert_eq!(kids, vec!["b", "c"]);
        let c = root.children().nth(1).unwrap();
        let grandkids: Vec<_> = c.children().map(|n| n.name().to_string()).collect();
        assert_eq!(grandkids, vec!["d"]);
        assert_eq!(c.parent().unwrap().name(), "a");
    }

    #[test]
    fn test_byte_spans_come_from_the_offset_table() {
        let mut evaluator = ReplayEvaluator::new();
        descriptor_rows(&mut evaluator, &[("a", 0, 10), ("b", 2, 4)]);

        let tree = assemble(&evaluator, &offsets()).unwrap().unwrap();
        assert_eq!(tree.root().byte_range(), 0..19);
        assert_eq!(tree.root().token_range(), 0..10);
        let b = tree.root().children().next().unwrap();
        assert_eq!(b.byte_range(), 4..7);
        assert_eq!(b.token_range(), 2..4);
    }

    #[test]
    fn test_partial_overlap_is_corrupt() {
        let mut evaluator = ReplayEvaluator::new();
        descriptor_rows(&mut evaluator, &[("a", 0, 10), ("b", 2, 6), ("c", 4, 8)]);

        let err = assemble(&evaluator, &offsets()).unwrap_err();
        assert_eq!(
            err,
            AssembleError::Corrupt(CorruptRelationError::OverlappingSpans {
                first: NodeSpan { name: "b".into(), start: 4, end: 11 },
                second: NodeSpan { name: "c".into(), start: 8, end: 15 },
            })
        );
    }

    #[test]
    fn test_second_top_level_span_is_corrupt() {
        let mut evaluator = ReplayEvaluator::new();
        descriptor_rows(&mut evaluator, &[("a", 0, 4), ("b", 5, 9)]);

        let err = assemble(&evaluator, &offsets()).unwrap_err();
        assert_eq!(
            err,
            AssembleError::Corrupt(CorruptRelationError::MultipleRoots {
                root: NodeSpan { name: "a".into(), start: 0, end: 7 },
                node: NodeSpan { name: "b".into(), start: 10, end: 17 },
            })
        );
    }

    #[test]
    fn test_exact_span_ties_nest_by_name() {
        let mut evaluator = ReplayEvaluator::new();
        descriptor_rows(&mut evaluator, &[("inner", 0, 10), ("outer", 0, 10)]);

        let tree = assemble(&evaluator, &offsets()).unwrap().unwrap();
        assert_eq!(tree.root().name(), "inner");
        let only: Vec<_> = tree.root().children().map(|n| n.name().to_string()).collect();
        assert_eq!(only, vec!["outer"]);
    }
}
