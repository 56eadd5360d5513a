//! Scripted evaluator doubles
//!
//! A real grammar evaluator is an external component; tests drive the
//! pipeline with a [`ReplayEvaluator`] instead, which records everything
//! the session feeds it and serves back pre-scripted output relations.
//! Record ids count from `1` so that `0` keeps its "no node" meaning, and
//! the double owns its own symbol table for the names it hands out.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::evaluator::{EvaluatorError, EvaluatorFactory, GrammarEvaluator};
use crate::facts::{RelationSchema, NO_NODE};
use crate::intern::SymbolInterner;

#[derive(Default)]
pub struct ReplayEvaluator {
    symbols: SymbolInterner,
    records: Vec<Vec<u32>>,
    outputs: HashMap<String, Vec<Vec<u32>>>,
    declared: Vec<RelationSchema>,
    facts: HashMap<String, Vec<Vec<u32>>>,
    runs: u32,
    run_failure: Option<String>,
}

impl ReplayEvaluator {
    pub fn new() -> ReplayEvaluator {
        ReplayEvaluator::default()
    }

    /// Intern a name in the double's own symbol table
    pub fn symbol(&mut self, text: &str) -> u32 {
        self.symbols.intern(text).code()
    }

    /// Register a composite record; ids start at `1`
    pub fn record(&mut self, fields: Vec<u32>) -> u32 {
        self.records.push(fields);
        self.records.len() as u32
    }

    /// Register a `(name, start_token, end_token)` node record
    pub fn node(&mut self, name: &str, start: u32, end: u32) -> u32 {
        let code = self.symbol(name);
        self.record(vec![code, start, end])
    }

    /// Chain children into `(child, next)` cells, returning the head id
    pub fn list(&mut self, children: &[u32]) -> u32 {
        let mut next = NO_NODE;
        for &child in children.iter().rev() {
            next = self.record(vec![child, next]);
        }
        next
    }

    /// Script the rows a relation will serve after `run()`
    pub fn provide(&mut self, relation: &str, rows: Vec<Vec<u32>>) {
        self.outputs.insert(relation.to_string(), rows);
    }

    /// Make `run()` report an internal failure
    pub fn fail_run(&mut self, message: &str) {
        self.run_failure = Some(message.to_string());
    }

    /// Everything inserted through `insert_fact`, by relation
    pub fn facts(&self) -> &HashMap<String, Vec<Vec<u32>>> {
        &self.facts
    }

    pub fn declared_relations(&self) -> Vec<&'static str> {
        self.declared.iter().map(|schema| schema.name).collect()
    }

    pub fn run_count(&self) -> u32 {
        self.runs
    }
}

impl GrammarEvaluator for ReplayEvaluator {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn declare_relations(&mut self, schemas: &[RelationSchema]) -> Result<(), EvaluatorError> {
        for schema in schemas {
            self.declared.push(*schema);
            self.facts.entry(schema.name.to_string()).or_default();
        }
        Ok(())
    }

    fn insert_fact(&mut self, relation: &str, tuple: &[u32]) -> Result<(), EvaluatorError> {
        let schema = self
            .declared
            .iter()
            .find(|schema| schema.name == relation)
            .ok_or_else(|| EvaluatorError::UnknownRelation(relation.to_string()))?;
        if tuple.len() != schema.arity() {
            return Err(EvaluatorError::MalformedTuple {
                relation: relation.to_string(),
                expected: schema.arity(),
                actual: tuple.len(),
            });
        }
        self.facts
            .entry(relation.to_string())
            .or_default()
            .push(tuple.to_vec());
        Ok(())
    }

    fn run(&mut self) -> Result<(), EvaluatorError> {
        self.runs += 1;
        match &self.run_failure {
            Some(message) => Err(EvaluatorError::Failed(message.clone())),
            None => Ok(()),
        }
    }

    fn iterate(&self, relation: &str) -> Result<Vec<Vec<u32>>, EvaluatorError> {
        Ok(self.outputs.get(relation).cloned().unwrap_or_default())
    }

    fn decode_record(&self, id: u32, arity: usize) -> Result<&[u32], EvaluatorError> {
        if id == NO_NODE {
            return Err(EvaluatorError::UnknownRecord(id));
        }
        let fields = self
            .records
            .get((id - 1) as usize)
            .ok_or(EvaluatorError::UnknownRecord(id))?;
        if fields.len() != arity {
            return Err(EvaluatorError::WrongArity {
                id,
                expected: arity,
                actual: fields.len(),
            });
        }
        Ok(fields)
    }

    fn decode_symbol(&self, code: u32) -> Result<&str, EvaluatorError> {
        self.symbols
            .resolve_code(code)
            .ok_or(EvaluatorError::UnknownSymbol(code))
    }
}

/// Hands out scripted evaluators in order, one per `new_evaluator` call
pub struct ReplayFactory {
    scripts: RefCell<VecDeque<ReplayEvaluator>>,
}

impl ReplayFactory {
    pub fn new(scripts: Vec<ReplayEvaluator>) -> ReplayFactory {
        ReplayFactory { scripts: RefCell::new(scripts.into()) }
    }

    pub fn single(script: ReplayEvaluator) -> ReplayFactory {
        ReplayFactory::new(vec![script])
    }

    pub fn remaining(&self) -> usize {
        self.scripts.borrow().len()
    }
}

impl EvaluatorFactory for ReplayFactory {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn new_evaluator(&self) -> Result<Box<dyn GrammarEvaluator>, EvaluatorError> {
        match self.scripts.borrow_mut().pop_front() {
            Some(script) => Ok(Box::new(script)),
            None => Err(EvaluatorError::Failed("no scripted evaluator left".to_string())),
        }
    }
}

/// Small Java-like sources shared by tests
pub mod corpus {
    pub const POINT_CLASS: &str = "class Point { int x; int y; }";

    pub const COUNTER_METHOD: &str = "class Counter {\n    int next() {\n        count += 1;\n        return count;\n    }\n}";

    pub const LITERAL_SOUP: &str =
        "long mask = 0xFF_00; int oct = 07; int bits = 0b101; double d = 3.14e-2; float f = 1.5f; char c = 'x'; String s = \"hi\";";
}
