//! The grammar evaluator seam
//!
//! Tree structure is not computed in this crate. Token facts are handed to a
//! rule-based grammar evaluator behind the `GrammarEvaluator` trait, and flat
//! relations come back. The trait is the whole contract: anything that can
//! accept the declared relations, absorb fact tuples, run its rules, and
//! serve the output relations is a drop-in evaluator: a Datalog engine, a
//! hand-written grammar, or the scripted replay double in `testing`.
//!
//! Two guarantees are assumed from the evaluator and never re-verified here:
//! the parent/child relations it emits describe a tree (every non-root node
//! has exactly one parent, no cycles), and record id `0` is the "no node"
//! sentinel, never a real node. What is *not* assumed: that `run()` is fast,
//! that its cost is proportional to input size, or that calling it twice on
//! one instance is safe; sessions that need a clean slate ask an
//! `EvaluatorFactory` for a fresh instance instead.

use std::fmt;

use crate::facts::RelationSchema;

/// Errors reported by a grammar evaluator implementation
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatorError {
    UnknownRelation(String),
    UnknownRecord(u32),
    UnknownSymbol(u32),
    WrongArity { id: u32, expected: usize, actual: usize },
    MalformedTuple { relation: String, expected: usize, actual: usize },
    Failed(String),
}

impl fmt::Display for EvaluatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorError::UnknownRelation(name) => {
                write!(f, "relation '{}' is not declared", name)
            }
            EvaluatorError::UnknownRecord(id) => {
                write!(f, "record id {} cannot be decoded", id)
            }
            EvaluatorError::UnknownSymbol(code) => {
                write!(f, "symbol code {} cannot be decoded", code)
            }
            EvaluatorError::WrongArity { id, expected, actual } => {
                write!(f, "record id {} has arity {}, expected {}", id, actual, expected)
            }
            EvaluatorError::MalformedTuple { relation, expected, actual } => {
                write!(
                    f,
                    "relation '{}' takes tuples of arity {}, got {}",
                    relation, expected, actual
                )
            }
            EvaluatorError::Failed(message) => write!(f, "evaluation failed: {}", message),
        }
    }
}

impl std::error::Error for EvaluatorError {}

/// External rule-based grammar evaluator
///
/// Call order within one parse: `declare_relations`, any number of
/// `insert_fact`, one `run()`, then reads through `iterate`,
/// `decode_record` and `decode_symbol`. Symbol codes showing up in output
/// records must resolve through `decode_symbol`; the conventional
/// arrangement is one symbol space shared with the fact side.
pub trait GrammarEvaluator {
    /// Short implementation name, for diagnostics
    fn name(&self) -> &'static str;

    /// Announce the relations and their schemas before any facts arrive
    fn declare_relations(&mut self, schemas: &[RelationSchema]) -> Result<(), EvaluatorError>;

    /// Add one fact tuple to `relation`
    fn insert_fact(&mut self, relation: &str, tuple: &[u32]) -> Result<(), EvaluatorError>;

    /// Evaluate the grammar rules over the inserted facts
    ///
    /// Blocking, and routinely the dominant cost of a parse; callers that
    /// need bounded latency must impose an external deadline around it.
    fn run(&mut self) -> Result<(), EvaluatorError>;

    /// All tuples currently in `relation`; an undeclared-but-empty relation
    /// reads as no tuples
    fn iterate(&self, relation: &str) -> Result<Vec<Vec<u32>>, EvaluatorError>;

    /// Unpack the composite record behind `id` into `arity` fields
    fn decode_record(&self, id: u32, arity: usize) -> Result<&[u32], EvaluatorError>;

    /// Resolve a symbol code minted by the evaluator
    fn decode_symbol(&self, code: u32) -> Result<&str, EvaluatorError>;
}

/// Produces fresh evaluator instances
///
/// One instance is good for one `declare → insert → run → read` cycle; a
/// session parsing several units separately asks for a new instance per
/// unit rather than reusing one.
pub trait EvaluatorFactory {
    /// Short implementation name, for diagnostics
    fn name(&self) -> &'static str;

    fn new_evaluator(&self) -> Result<Box<dyn GrammarEvaluator>, EvaluatorError>;
}
