//! Rendering of token streams and trees
//!
//! Plain-text output is the human-facing form: one token per line, or an
//! indented tree outline with grammar-symbol labels. The structured forms
//! go through serde as JSON or YAML and carry the same information.

use std::collections::HashMap;
use std::fmt;

use serde_json::{json, Value};

use crate::token::Token;
use crate::tree::{Node, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_string(text: &str) -> Option<OutputFormat> {
        match text {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "yaml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    Serialization(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Serialization(message) => {
                write!(f, "serialization failed: {}", message)
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// Render a token stream, end-of-input marker excluded
pub fn render_tokens(tokens: &[Token], format: OutputFormat) -> Result<String, FormatError> {
    let real: Vec<&Token> = tokens.iter().filter(|token| !token.is_eof()).collect();
    match format {
        OutputFormat::Text => {
            let lines: Vec<String> = real
                .iter()
                .map(|token| {
                    format!(
                        "{} {:?} [{}..{})",
                        token.kind, token.lexeme, token.start, token.end
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&real).map_err(serialization_error)
        }
        OutputFormat::Yaml => serde_yaml::to_string(&real).map_err(serialization_error),
    }
}

/// Render a tree as an indented outline or as structured data
pub fn render_tree(tree: &SyntaxTree, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => {
            let mut lines = Vec::new();
            outline(tree.root(), None, 0, &mut lines);
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&tree_value(tree)).map_err(serialization_error)
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&tree_value(tree)).map_err(serialization_error)
        }
    }
}

/// Structured form of a tree, shared by the JSON and YAML renderings
pub fn tree_value(tree: &SyntaxTree) -> Value {
    node_value(tree.root())
}

fn serialization_error(err: impl fmt::Display) -> FormatError {
    FormatError::Serialization(err.to_string())
}

fn outline(node: Node<'_>, label: Option<&str>, depth: usize, lines: &mut Vec<String>) {
    let range = node.byte_range();
    let mut line = "  ".repeat(depth);
    if let Some(label) = label {
        line.push_str(label);
        line.push_str(": ");
    }
    line.push_str(&format!("{} [{}..{})", node.name(), range.start, range.end));
    lines.push(line);

    // Children print in source order; labels come from the labeled edges.
    let mut labels = HashMap::new();
    for (label, child) in node.fields() {
        labels.insert(child.id(), label);
    }
    for name in node.list_names() {
        for child in node.list(name) {
            labels.insert(child.id(), name);
        }
    }
    for child in node.children() {
        outline(child, labels.get(&child.id()).copied(), depth + 1, lines);
    }
}

fn node_value(node: Node<'_>) -> Value {
    let range = node.byte_range();
    let mut object = serde_json::Map::new();
    object.insert("name".to_string(), json!(node.name()));
    object.insert("start".to_string(), json!(range.start));
    object.insert("end".to_string(), json!(range.end));

    let fields: serde_json::Map<String, Value> = node
        .fields()
        .map(|(label, child)| (label.to_string(), node_value(child)))
        .collect();
    let mut lists = serde_json::Map::new();
    for name in node.list_names() {
        let children: Vec<Value> = node.list(name).map(node_value).collect();
        lists.insert(name.to_string(), Value::Array(children));
    }
    let labeled = !fields.is_empty() || !lists.is_empty();
    if !fields.is_empty() {
        object.insert("fields".to_string(), Value::Object(fields));
    }
    if !lists.is_empty() {
        object.insert("lists".to_string(), Value::Object(lists));
    }
    if !labeled && node.child_count() > 0 {
        let children: Vec<Value> = node.children().map(node_value).collect();
        object.insert("children".to_string(), Value::Array(children));
    }
    Value::Object(object)
}
