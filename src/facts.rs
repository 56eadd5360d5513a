//! Relation schemas and fact export
//!
//! The evaluator sees one source unit as three fact relations: `token`
//! carries each lexeme (as an interned code) with its sequential index,
//! `token_type` tags the indices whose kind matters to grammar rules, and
//! `num_tokens` carries the total count. Output relations come back in one
//! of two shapes depending on the grammar: parent/child edges keyed by
//! record ids (`root`, `parent_of`, `parent_of_list`) or bare span
//! descriptors (`node`).

use crate::evaluator::{EvaluatorError, GrammarEvaluator};
use crate::intern::SymbolInterner;
use crate::token::Token;

pub const TOKEN: &str = "token";
pub const TOKEN_TYPE: &str = "token_type";
pub const NUM_TOKENS: &str = "num_tokens";
pub const PARENT_OF: &str = "parent_of";
pub const PARENT_OF_LIST: &str = "parent_of_list";
pub const ROOT: &str = "root";
pub const NODE: &str = "node";

/// Record id that stands for "no node" in evaluator output
pub const NO_NODE: u32 = 0;

/// What a relation field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// Interned string code
    Symbol,
    /// Zero-based token index
    TokenIndex,
    /// Composite record id, `0` reserved for [`NO_NODE`]
    RecordId,
    /// Plain count
    Count,
}

/// Name and field layout of one relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSchema {
    pub name: &'static str,
    pub terms: &'static [TermKind],
}

impl RelationSchema {
    pub fn arity(&self) -> usize {
        self.terms.len()
    }
}

/// Fact relations handed to the evaluator
pub const INPUT_SCHEMAS: [RelationSchema; 3] = [
    RelationSchema { name: TOKEN, terms: &[TermKind::Symbol, TermKind::TokenIndex] },
    RelationSchema { name: TOKEN_TYPE, terms: &[TermKind::TokenIndex, TermKind::Symbol] },
    RelationSchema { name: NUM_TOKENS, terms: &[TermKind::Count] },
];

/// Output relations of a grammar that emits parent/child edges
pub const RELATIONAL_OUTPUT_SCHEMAS: [RelationSchema; 3] = [
    RelationSchema { name: ROOT, terms: &[TermKind::RecordId] },
    RelationSchema {
        name: PARENT_OF,
        terms: &[TermKind::RecordId, TermKind::Symbol, TermKind::RecordId],
    },
    RelationSchema {
        name: PARENT_OF_LIST,
        terms: &[TermKind::RecordId, TermKind::Symbol, TermKind::RecordId],
    },
];

/// Output relation of a grammar that emits bare span descriptors
pub const CONTAINMENT_OUTPUT_SCHEMAS: [RelationSchema; 1] = [RelationSchema {
    name: NODE,
    terms: &[TermKind::Symbol, TermKind::TokenIndex, TermKind::TokenIndex],
}];

/// Insert the fact tuples for one token sequence
///
/// Lexemes and kind labels are interned through `interner`; the evaluator
/// shares that code space for the session. Tokens whose kind carries no
/// grammatical information beyond the lexeme (operators, separators,
/// brackets) get a `token` fact only. The end-of-input marker is not a
/// fact; `num_tokens` covers the real tokens.
pub fn export_facts(
    tokens: &[Token],
    interner: &mut SymbolInterner,
    evaluator: &mut dyn GrammarEvaluator,
) -> Result<(), EvaluatorError> {
    let mut count: u32 = 0;
    for token in tokens {
        if token.is_eof() {
            continue;
        }
        let index = token.index as u32;
        let text = interner.intern(&token.lexeme);
        evaluator.insert_fact(TOKEN, &[text.code(), index])?;
        if let Some(label) = token.kind.fact_label() {
            let kind = interner.intern(label);
            evaluator.insert_fact(TOKEN_TYPE, &[index, kind.code()])?;
        }
        count += 1;
    }
    evaluator.insert_fact(NUM_TOKENS, &[count])?;
    Ok(())
}
