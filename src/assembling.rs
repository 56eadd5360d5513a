//! Tree assembly from evaluator output
//!
//! Two assemblers turn flat relations into a [`SyntaxTree`](crate::tree::SyntaxTree),
//! one per grammar output shape. The [`relational`] variant follows explicit
//! `parent_of`/`parent_of_list` edges keyed by record id; the [`containment`]
//! variant has no edges at all and derives structure from byte-span nesting.
//!
//! Both trust the evaluator's tree guarantee and do not re-verify it, but
//! relation content that cannot be resolved at all (an undecodable record,
//! a token range beyond the unit, spans that overlap without nesting) is an
//! internal-consistency failure reported as [`CorruptRelationError`] with
//! full context, never repaired silently.

use std::fmt;
use std::ops::Range;

use crate::evaluator::EvaluatorError;
use crate::offsets::TokenOffsets;

pub mod containment;
pub mod relational;

/// Name and byte span of a node involved in a corrupt-relation report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpan {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for NodeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` [{}..{})", self.name, self.start, self.end)
    }
}

/// Evaluator output that violates the relation contract
#[derive(Debug, Clone, PartialEq)]
pub enum CorruptRelationError {
    MissingRecord { id: u32 },
    UnresolvableTokenRange { name: String, start_token: u32, end_token: u32, token_count: usize },
    AmbiguousRoot { count: usize },
    MalformedRow { relation: String, expected: usize, actual: usize },
    OverlappingSpans { first: NodeSpan, second: NodeSpan },
    MultipleRoots { root: NodeSpan, node: NodeSpan },
}

impl fmt::Display for CorruptRelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptRelationError::MissingRecord { id } => {
                write!(f, "node record {} is referenced but cannot be decoded", id)
            }
            CorruptRelationError::UnresolvableTokenRange {
                name,
                start_token,
                end_token,
                token_count,
            } => write!(
                f,
                "node `{}` claims token range [{}..{}) but the unit has {} tokens",
                name, start_token, end_token, token_count
            ),
            CorruptRelationError::AmbiguousRoot { count } => {
                write!(f, "root relation holds {} entries, expected exactly one", count)
            }
            CorruptRelationError::MalformedRow { relation, expected, actual } => {
                write!(
                    f,
                    "relation '{}' emitted a row of arity {}, expected {}",
                    relation, actual, expected
                )
            }
            CorruptRelationError::OverlappingSpans { first, second } => {
                write!(f, "node spans {} and {} overlap without nesting", first, second)
            }
            CorruptRelationError::MultipleRoots { root, node } => {
                write!(f, "node {} falls outside the single root {}", node, root)
            }
        }
    }
}

impl std::error::Error for CorruptRelationError {}

/// Failure while assembling a tree
#[derive(Debug, Clone, PartialEq)]
pub enum AssembleError {
    /// The evaluator refused a read operation
    Evaluator(EvaluatorError),
    /// The evaluator answered, but the answer breaks the relation contract
    Corrupt(CorruptRelationError),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::Evaluator(err) => write!(f, "{}", err),
            AssembleError::Corrupt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<EvaluatorError> for AssembleError {
    fn from(err: EvaluatorError) -> AssembleError {
        AssembleError::Evaluator(err)
    }
}

impl From<CorruptRelationError> for AssembleError {
    fn from(err: CorruptRelationError) -> AssembleError {
        AssembleError::Corrupt(err)
    }
}

/// Resolve a node's token index range to its byte span
pub(crate) fn resolve_span(
    name: &str,
    start_token: u32,
    end_token: u32,
    offsets: &TokenOffsets,
) -> Result<Range<usize>, CorruptRelationError> {
    offsets.span_of_tokens(start_token, end_token).ok_or_else(|| {
        CorruptRelationError::UnresolvableTokenRange {
            name: name.to_string(),
            start_token,
            end_token,
            token_count: offsets.token_count(),
        }
    })
}
