//! Assembly from explicit parent/child relations
//!
//! The grammar emits `root(id)`, `parent_of(parent, symbol, child)` for
//! single-valued fields and `parent_of_list(parent, symbol, head)` for
//! ordered lists, where `head` starts a chain of `(child, next)` cells
//! ending at the `0` sentinel. Nodes are materialized by record id, memoized
//! so no id is built twice, which keeps the pass linear in nodes plus edges.

use std::collections::HashMap;

use crate::assembling::{resolve_span, AssembleError, CorruptRelationError};
use crate::evaluator::{EvaluatorError, GrammarEvaluator};
use crate::facts::{NO_NODE, PARENT_OF, PARENT_OF_LIST, ROOT};
use crate::offsets::TokenOffsets;
use crate::tree::{NodeId, SyntaxTree, TreeBuilder};

/// Build the tree described by the evaluator's parent relations
///
/// An empty `root` relation means the grammar derived no tree for the unit;
/// that is a non-parse, not an error.
pub fn assemble(
    evaluator: &dyn GrammarEvaluator,
    offsets: &TokenOffsets,
) -> Result<Option<SyntaxTree>, AssembleError> {
    let roots = evaluator.iterate(ROOT)?;
    let root_id = match roots.as_slice() {
        [] => return Ok(None),
        [row] => match row.as_slice() {
            [id] => *id,
            _ => {
                return Err(CorruptRelationError::MalformedRow {
                    relation: ROOT.to_string(),
                    expected: 1,
                    actual: row.len(),
                }
                .into())
            }
        },
        rows => {
            return Err(CorruptRelationError::AmbiguousRoot { count: rows.len() }.into())
        }
    };

    let mut assembly = Assembly {
        evaluator,
        offsets,
        fields: edges_by_parent(evaluator, PARENT_OF)?,
        lists: edges_by_parent(evaluator, PARENT_OF_LIST)?,
        builder: TreeBuilder::new(),
        built: HashMap::new(),
    };
    let root = assembly.build(root_id)?;
    let mut builder = assembly.builder;
    builder.order_children();
    tracing::debug!(nodes = builder.len(), "assembled tree from parent relations");
    Ok(Some(builder.finish(root)))
}

/// Group `(parent, symbol, target)` rows by parent, keeping relation order
fn edges_by_parent(
    evaluator: &dyn GrammarEvaluator,
    relation: &str,
) -> Result<HashMap<u32, Vec<(u32, u32)>>, AssembleError> {
    let mut edges: HashMap<u32, Vec<(u32, u32)>> = HashMap::new();
    for row in evaluator.iterate(relation)? {
        match row.as_slice() {
            [parent, symbol, target] => {
                edges.entry(*parent).or_default().push((*symbol, *target));
            }
            _ => {
                return Err(CorruptRelationError::MalformedRow {
                    relation: relation.to_string(),
                    expected: 3,
                    actual: row.len(),
                }
                .into())
            }
        }
    }
    Ok(edges)
}

struct Assembly<'a> {
    evaluator: &'a dyn GrammarEvaluator,
    offsets: &'a TokenOffsets,
    fields: HashMap<u32, Vec<(u32, u32)>>,
    lists: HashMap<u32, Vec<(u32, u32)>>,
    builder: TreeBuilder,
    built: HashMap<u32, NodeId>,
}

impl Assembly<'_> {
    fn build(&mut self, id: u32) -> Result<NodeId, AssembleError> {
        if let Some(&node) = self.built.get(&id) {
            return Ok(node);
        }
        let (name_code, start, end) = self.decode_node(id)?;
        let name = self.evaluator.decode_symbol(name_code)?.to_string();
        let bytes = resolve_span(&name, start, end, self.offsets)?;
        let node = self.builder.push(name, bytes, start..end);
        self.built.insert(id, node);

        // Edges are consumed here; memoization makes a second visit skip them.
        for (symbol_code, child_id) in self.fields.remove(&id).unwrap_or_default() {
            if child_id == NO_NODE {
                continue;
            }
            let child = self.build(child_id)?;
            let symbol = self.evaluator.decode_symbol(symbol_code)?.to_string();
            self.builder.attach_field(node, symbol, child);
        }
        for (symbol_code, head) in self.lists.remove(&id).unwrap_or_default() {
            let children = self.decode_list(head)?;
            let symbol = self.evaluator.decode_symbol(symbol_code)?.to_string();
            self.builder.attach_list(node, symbol, children);
        }
        Ok(node)
    }

    /// Decode a node record to `(name, start_token, end_token)`
    fn decode_node(&self, id: u32) -> Result<(u32, u32, u32), AssembleError> {
        match self.decode(id, 3)? {
            [name, start, end] => Ok((*name, *start, *end)),
            fields => Err(EvaluatorError::WrongArity {
                id,
                expected: 3,
                actual: fields.len(),
            }
            .into()),
        }
    }

    /// Walk a `(child, next)` cell chain until the sentinel
    fn decode_list(&mut self, head: u32) -> Result<Vec<NodeId>, AssembleError> {
        let mut children = Vec::new();
        let mut cell = head;
        while cell != NO_NODE {
            let (child_id, next) = match self.decode(cell, 2)? {
                [child, next] => (*child, *next),
                fields => {
                    return Err(EvaluatorError::WrongArity {
                        id: cell,
                        expected: 2,
                        actual: fields.len(),
                    }
                    .into())
                }
            };
            children.push(self.build(child_id)?);
            cell = next;
        }
        Ok(children)
    }

    fn decode(&self, id: u32, arity: usize) -> Result<&[u32], AssembleError> {
        match self.evaluator.decode_record(id, arity) {
            Ok(fields) => Ok(fields),
            Err(EvaluatorError::UnknownRecord(_)) => {
                Err(CorruptRelationError::MissingRecord { id }.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexing::tokenize;
    use crate::testing::ReplayEvaluator;

    fn offsets_for(source: &str) -> TokenOffsets {
        let tokens = tokenize(source).into_result().unwrap();
        TokenOffsets::from_tokens(&tokens)
    }

    #[test]
    fn test_empty_root_relation_is_a_non_parse() {
        let evaluator = ReplayEvaluator::new();
        let offsets = offsets_for("int x;");
        assert_eq!(assemble(&evaluator, &offsets), Ok(None));
    }

    #[test]
    fn test_single_field_edge() {
        // int x ;  →  declaration(name: identifier)
        let mut evaluator = ReplayEvaluator::new();
        let declaration = evaluator.node("declaration", 0, 3);
        let identifier = evaluator.node("identifier", 1, 2);
        let name = evaluator.symbol("name");
        evaluator.provide(ROOT, vec![vec![declaration]]);
        evaluator.provide(PARENT_OF, vec![vec![declaration, name, identifier]]);

        let offsets = offsets_for("int x;");
        let tree = assemble(&evaluator, &offsets).unwrap().unwrap();
        let root = tree.root();
        assert_eq!(root.name(), "declaration");
        assert_eq!(root.byte_range(), 0..6);
        let child = root.field("name").unwrap();
        assert_eq!(child.name(), "identifier");
        assert_eq!(child.byte_range(), 4..5);
        assert_eq!(child.parent().unwrap().id(), root.id());
    }

    #[test]
    fn test_sentinel_child_means_absent_field() {
        let mut evaluator = ReplayEvaluator::new();
        let declaration = evaluator.node("declaration", 0, 3);
        let initializer = evaluator.symbol("initializer");
        evaluator.provide(ROOT, vec![vec![declaration]]);
        evaluator.provide(PARENT_OF, vec![vec![declaration, initializer, NO_NODE]]);

        let offsets = offsets_for("int x;");
        let tree = assemble(&evaluator, &offsets).unwrap().unwrap();
        assert!(tree.root().field("initializer").is_none());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_list_edge_preserves_cell_order() {
        // int a ; int b ;  →  unit(declarations: [d1, d2])
        let mut evaluator = ReplayEvaluator::new();
        let unit = evaluator.node("unit", 0, 6);
        let first = evaluator.node("declaration", 0, 3);
        let second = evaluator.node("declaration", 3, 6);
        let declarations = evaluator.symbol("declarations");
        let head = evaluator.list(&[first, second]);
        evaluator.provide(ROOT, vec![vec![unit]]);
        evaluator.provide(PARENT_OF_LIST, vec![vec![unit, declarations, head]]);

        let offsets = offsets_for("int a; int b;");
        let tree = assemble(&evaluator, &offsets).unwrap().unwrap();
        let spans: Vec<_> =
            tree.root().list("declarations").map(|n| n.byte_range()).collect();
        assert_eq!(spans, vec![0..6, 7..13]);
        let ordered: Vec<_> = tree.root().children().map(|n| n.byte_range().start).collect();
        assert_eq!(ordered, vec![0, 7]);
    }

    #[test]
    fn test_shared_record_is_built_once() {
        let mut evaluator = ReplayEvaluator::new();
        let unit = evaluator.node("unit", 0, 3);
        let shared = evaluator.node("identifier", 1, 2);
        let left = evaluator.symbol("left");
        let right = evaluator.symbol("right");
        evaluator.provide(ROOT, vec![vec![unit]]);
        evaluator.provide(
            PARENT_OF,
            vec![vec![unit, left, shared], vec![unit, right, shared]],
        );

        let offsets = offsets_for("int x;");
        let tree = assemble(&evaluator, &offsets).unwrap().unwrap();
        assert_eq!(tree.node_count(), 2);
        assert_eq!(
            tree.root().field("left").unwrap().id(),
            tree.root().field("right").unwrap().id()
        );
    }

    #[test]
    fn test_ambiguous_root_is_corrupt() {
        let mut evaluator = ReplayEvaluator::new();
        let first = evaluator.node("unit", 0, 1);
        let second = evaluator.node("unit", 1, 2);
        evaluator.provide(ROOT, vec![vec![first], vec![second]]);

        let offsets = offsets_for("int x;");
        let err = assemble(&evaluator, &offsets).unwrap_err();
        assert_eq!(
            err,
            AssembleError::Corrupt(CorruptRelationError::AmbiguousRoot { count: 2 })
        );
    }

    #[test]
    fn test_unknown_child_record_is_corrupt() {
        let mut evaluator = ReplayEvaluator::new();
        let unit = evaluator.node("unit", 0, 3);
        let body = evaluator.symbol("body");
        evaluator.provide(ROOT, vec![vec![unit]]);
        evaluator.provide(PARENT_OF, vec![vec![unit, body, 999]]);

        let offsets = offsets_for("int x;");
        let err = assemble(&evaluator, &offsets).unwrap_err();
        assert_eq!(
            err,
            AssembleError::Corrupt(CorruptRelationError::MissingRecord { id: 999 })
        );
    }

    #[test]
    fn test_token_range_beyond_unit_is_corrupt() {
        let mut evaluator = ReplayEvaluator::new();
        let unit = evaluator.node("unit", 0, 12);
        evaluator.provide(ROOT, vec![vec![unit]]);

        let offsets = offsets_for("int x;");
        let err = assemble(&evaluator, &offsets).unwrap_err();
        assert_eq!(
            err,
            AssembleError::Corrupt(CorruptRelationError::UnresolvableTokenRange {
                name: "unit".to_string(),
                start_token: 0,
                end_token: 12,
                token_count: 3,
            })
        );
    }
}
