//! # jcst
//!
//! Token streams and concrete syntax trees for Java-like source text.
//!
//! The crate owns the lexical side of parsing: classifying tokens with
//! exact byte offsets, exporting them as fact relations, and assembling
//! the flat relations an external grammar evaluator derives back into a
//! navigable tree. The grammar itself lives behind the
//! [`GrammarEvaluator`] trait and is deliberately not part of this crate.
//!
//! ## Pipeline
//!
//! text → [`tokenize`] → facts → evaluator `run()` → relations →
//! assembly → [`SyntaxTree`]. A [`ParseSession`] drives all phases and
//! owns every piece of cross-phase state: the symbol interner, the
//! per-source token streams and offset tables, and the finished trees.
//!
//! ## Testing
//!
//! Pipeline tests script the evaluator seam with the doubles in the
//! [testing module](crate::testing) instead of a real rule engine.

pub mod assembling;
pub mod evaluator;
pub mod facts;
pub mod formats;
pub mod intern;
pub mod lexing;
pub mod offsets;
pub mod session;
pub mod testing;
pub mod token;
pub mod tree;

pub use assembling::{AssembleError, CorruptRelationError, NodeSpan};
pub use evaluator::{EvaluatorError, EvaluatorFactory, GrammarEvaluator};
pub use formats::{render_tokens, render_tree, FormatError, OutputFormat};
pub use lexing::{tokenize, LexicalError, Tokenization};
pub use offsets::TokenOffsets;
pub use session::{AssemblyStrategy, EvaluatorScope, ParseSession, SessionConfig, SessionError};
pub use token::{Token, TokenKind};
pub use tree::{Node, NodeId, SyntaxTree};
