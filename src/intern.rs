//! Session-scoped string interning
//!
//! Token lexemes repeat heavily in real source (every `;`, every keyword),
//! and the evaluator-facing fact relations carry strings as small integer
//! codes. `SymbolInterner` hands out dense codes in first-intern order and
//! resolves them back. One instance lives on each `ParseSession`, so codes
//! stay stable for the session's lifetime and nothing leaks into globals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Interned string code; only meaningful together with the interner that
/// produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    /// Raw code, as it appears in fact tuples
    pub fn code(self) -> u32 {
        self.0
    }
}

/// Deduplicating string table with dense first-come codes
#[derive(Debug, Default, Clone)]
pub struct SymbolInterner {
    codes: HashMap<String, Symbol>,
    texts: Vec<String>,
}

impl SymbolInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing code if it was seen before
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&symbol) = self.codes.get(text) {
            return symbol;
        }
        let symbol = Symbol(self.texts.len() as u32);
        self.codes.insert(text.to_string(), symbol);
        self.texts.push(text.to_string());
        symbol
    }

    /// Resolve a symbol back to its text
    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        self.resolve_code(symbol.0)
    }

    /// Resolve a raw code, as read out of a fact tuple
    pub fn resolve_code(&self, code: u32) -> Option<&str> {
        self.texts.get(code as usize).map(String::as_str)
    }

    /// Number of distinct strings interned so far
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
