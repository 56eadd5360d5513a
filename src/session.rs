//! Parse sessions
//!
//! A [`ParseSession`] owns everything with cross-phase lifetime: the symbol
//! interner shared by all fact export in the session, the per-source token
//! streams and offset tables, and the assembled trees. Nothing here is
//! global; two sessions share no state, and one session is single-threaded
//! by construction.
//!
//! Sources go in through [`ParseSession::add_file`] or
//! [`ParseSession::add_source`] (tokenization happens immediately), and
//! trees come out of [`ParseSession::run`], which drives a grammar
//! evaluator over every pending unit. Two points the original pipeline
//! left open are explicit configuration here: whether each unit gets a
//! fresh evaluator instance or all pending units share one `run()`
//! ([`EvaluatorScope`]), and which output shape the grammar emits
//! ([`AssemblyStrategy`]).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::assembling::{containment, relational, AssembleError, CorruptRelationError};
use crate::evaluator::{EvaluatorError, EvaluatorFactory, GrammarEvaluator};
use crate::facts::{
    export_facts, CONTAINMENT_OUTPUT_SCHEMAS, INPUT_SCHEMAS, RELATIONAL_OUTPUT_SCHEMAS,
};
use crate::intern::SymbolInterner;
use crate::lexing::{tokenize, LexicalError};
use crate::offsets::TokenOffsets;
use crate::token::Token;
use crate::tree::SyntaxTree;

/// Which output relations the grammar emits, and so which assembler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStrategy {
    /// `root`/`parent_of`/`parent_of_list` edges keyed by record id
    #[default]
    Relational,
    /// Bare `node` span descriptors, structure from nesting
    Containment,
}

impl AssemblyStrategy {
    pub fn from_string(text: &str) -> Option<AssemblyStrategy> {
        match text {
            "relational" => Some(AssemblyStrategy::Relational),
            "containment" => Some(AssemblyStrategy::Containment),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AssemblyStrategy::Relational => "relational",
            AssemblyStrategy::Containment => "containment",
        }
    }
}

/// How many source units one evaluator instance serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorScope {
    /// Fresh instance and `run()` per unit; units are fully isolated
    #[default]
    PerSource,
    /// One instance and one `run()` for all pending units
    ///
    /// Facts of every unit land in the same relations, with token indices
    /// counted per unit. Only meaningful for grammars written for that
    /// arrangement, or when a single unit is pending.
    Batched,
}

impl EvaluatorScope {
    pub fn from_string(text: &str) -> Option<EvaluatorScope> {
        match text {
            "per_source" => Some(EvaluatorScope::PerSource),
            "batched" => Some(EvaluatorScope::Batched),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EvaluatorScope::PerSource => "per_source",
            EvaluatorScope::Batched => "batched",
        }
    }
}

/// Session behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub strategy: AssemblyStrategy,
    pub scope: EvaluatorScope,
    /// Emit a warning before a lexical error aborts a unit
    pub log_lexical_errors: bool,
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            strategy: AssemblyStrategy::default(),
            scope: EvaluatorScope::default(),
            log_lexical_errors: true,
        }
    }
}

/// Failure of a session operation
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The source could not be read; nothing was tokenized
    SourceUnavailable { source: String, reason: String },
    /// Tokenization halted; the partial token stream stays queryable, but
    /// the unit is excluded from evaluation
    Lexical { source: String, error: LexicalError },
    /// The evaluator reported an internal failure; assembly was skipped
    Evaluation(EvaluatorError),
    /// The evaluator's output breaks the relation contract; assembly aborted
    CorruptRelation(CorruptRelationError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SourceUnavailable { source, reason } => {
                write!(f, "source '{}' is unavailable: {}", source, reason)
            }
            SessionError::Lexical { source, error } => {
                write!(f, "source '{}': {}", source, error)
            }
            SessionError::Evaluation(err) => write!(f, "{}", err),
            SessionError::CorruptRelation(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<EvaluatorError> for SessionError {
    fn from(err: EvaluatorError) -> SessionError {
        SessionError::Evaluation(err)
    }
}

impl From<AssembleError> for SessionError {
    fn from(err: AssembleError) -> SessionError {
        match err {
            AssembleError::Evaluator(err) => SessionError::Evaluation(err),
            AssembleError::Corrupt(err) => SessionError::CorruptRelation(err),
        }
    }
}

struct SourceUnit {
    tokens: Vec<Token>,
    offsets: TokenOffsets,
    lex_error: Option<LexicalError>,
}

/// Owner of all per-session parse state
pub struct ParseSession {
    config: SessionConfig,
    interner: SymbolInterner,
    units: BTreeMap<String, SourceUnit>,
    trees: BTreeMap<String, SyntaxTree>,
}

impl ParseSession {
    pub fn new() -> ParseSession {
        ParseSession::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> ParseSession {
        ParseSession {
            config,
            interner: SymbolInterner::new(),
            units: BTreeMap::new(),
            trees: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn interner(&self) -> &SymbolInterner {
        &self.interner
    }

    /// Read and tokenize a file, keyed by its path
    pub fn add_file(&mut self, path: &str) -> Result<(), SessionError> {
        let text = fs::read_to_string(path).map_err(|err| SessionError::SourceUnavailable {
            source: path.to_string(),
            reason: err.to_string(),
        })?;
        self.add_source(path, &text)
    }

    /// Tokenize an in-memory buffer under the given source identifier
    ///
    /// Replaces any earlier unit with the same identifier, dropping its
    /// tree. On a lexical error the tokens up to the error are kept and
    /// queryable, but the unit will not be evaluated.
    pub fn add_source(&mut self, source: &str, text: &str) -> Result<(), SessionError> {
        let tokenization = tokenize(text);
        let unit = SourceUnit {
            offsets: TokenOffsets::from_tokens(&tokenization.tokens),
            lex_error: tokenization.error,
            tokens: tokenization.tokens,
        };
        let lex_error = unit.lex_error;
        self.trees.remove(source);
        self.units.insert(source.to_string(), unit);
        match lex_error {
            None => Ok(()),
            Some(error) => {
                if self.config.log_lexical_errors {
                    tracing::warn!(
                        source = %source,
                        offset = error.offset,
                        "tokenization aborted by lexical error"
                    );
                }
                Err(SessionError::Lexical { source: source.to_string(), error })
            }
        }
    }

    /// Token stream of a unit, end-of-input marker included
    pub fn tokens(&self, source: &str) -> Option<&[Token]> {
        self.units.get(source).map(|unit| unit.tokens.as_slice())
    }

    /// Token-offset table of a unit
    pub fn offsets(&self, source: &str) -> Option<&TokenOffsets> {
        self.units.get(source).map(|unit| &unit.offsets)
    }

    /// The lexical error that aborted a unit's tokenization, if any
    pub fn lexical_error(&self, source: &str) -> Option<&LexicalError> {
        self.units.get(source).and_then(|unit| unit.lex_error.as_ref())
    }

    /// Evaluate the grammar for every pending unit and assemble trees
    ///
    /// Pending means tokenized without error and not yet carrying a tree;
    /// a unit whose grammar derives no tree stays pending. Returns the
    /// number of trees assembled by this call.
    pub fn run(&mut self, factory: &dyn EvaluatorFactory) -> Result<usize, SessionError> {
        let pending = self.pending_ids();
        if pending.is_empty() {
            return Ok(0);
        }
        match self.config.scope {
            EvaluatorScope::PerSource => self.run_per_source(factory, &pending),
            EvaluatorScope::Batched => self.run_batched(factory, &pending),
        }
    }

    pub fn tree(&self, source: &str) -> Option<&SyntaxTree> {
        self.trees.get(source)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> impl Iterator<Item = (&str, &SyntaxTree)> {
        self.trees.iter().map(|(source, tree)| (source.as_str(), tree))
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(|source| source.as_str())
    }

    fn run_per_source(
        &mut self,
        factory: &dyn EvaluatorFactory,
        pending: &[String],
    ) -> Result<usize, SessionError> {
        let mut assembled = 0;
        for source in pending {
            let mut evaluator = factory.new_evaluator()?;
            self.declare(evaluator.as_mut())?;
            self.export_unit(source, evaluator.as_mut())?;
            self.evaluate(evaluator.as_mut(), factory.name(), 1)?;
            if let Some(tree) = self.assemble_unit(evaluator.as_ref(), source)? {
                self.trees.insert(source.clone(), tree);
                assembled += 1;
            }
        }
        Ok(assembled)
    }

    fn run_batched(
        &mut self,
        factory: &dyn EvaluatorFactory,
        pending: &[String],
    ) -> Result<usize, SessionError> {
        let mut evaluator = factory.new_evaluator()?;
        self.declare(evaluator.as_mut())?;
        for source in pending {
            self.export_unit(source, evaluator.as_mut())?;
        }
        self.evaluate(evaluator.as_mut(), factory.name(), pending.len())?;
        let mut assembled = 0;
        for source in pending {
            if let Some(tree) = self.assemble_unit(evaluator.as_ref(), source)? {
                self.trees.insert(source.clone(), tree);
                assembled += 1;
            }
        }
        Ok(assembled)
    }

    fn declare(&self, evaluator: &mut dyn GrammarEvaluator) -> Result<(), EvaluatorError> {
        evaluator.declare_relations(&INPUT_SCHEMAS)?;
        match self.config.strategy {
            AssemblyStrategy::Relational => {
                evaluator.declare_relations(&RELATIONAL_OUTPUT_SCHEMAS)
            }
            AssemblyStrategy::Containment => {
                evaluator.declare_relations(&CONTAINMENT_OUTPUT_SCHEMAS)
            }
        }
    }

    fn export_unit(
        &mut self,
        source: &str,
        evaluator: &mut dyn GrammarEvaluator,
    ) -> Result<(), SessionError> {
        let Some(unit) = self.units.get(source) else {
            return Ok(());
        };
        export_facts(&unit.tokens, &mut self.interner, evaluator)?;
        Ok(())
    }

    // The evaluator is an opaque blocking call and routinely dominates the
    // pipeline, so its wall time is always measured.
    fn evaluate(
        &self,
        evaluator: &mut dyn GrammarEvaluator,
        evaluator_name: &str,
        units: usize,
    ) -> Result<(), SessionError> {
        let started = Instant::now();
        evaluator.run()?;
        tracing::debug!(
            evaluator = evaluator_name,
            units,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "grammar evaluation finished"
        );
        Ok(())
    }

    fn assemble_unit(
        &self,
        evaluator: &dyn GrammarEvaluator,
        source: &str,
    ) -> Result<Option<SyntaxTree>, SessionError> {
        let Some(unit) = self.units.get(source) else {
            return Ok(None);
        };
        let tree = match self.config.strategy {
            AssemblyStrategy::Relational => relational::assemble(evaluator, &unit.offsets)?,
            AssemblyStrategy::Containment => containment::assemble(evaluator, &unit.offsets)?,
        };
        Ok(tree)
    }

    fn pending_ids(&self) -> Vec<String> {
        self.units
            .iter()
            .filter(|(source, unit)| {
                unit.lex_error.is_none() && !self.trees.contains_key(*source)
            })
            .map(|(source, _)| source.clone())
            .collect()
    }
}

impl Default for ParseSession {
    fn default() -> ParseSession {
        ParseSession::new()
    }
}
