//! Query command implementation.

use clap::ValueEnum;
use serde::Serialize;
use shelfdb_core::predicate::{self, Range};
use shelfdb_core::{Collection, CollectionSpec, Database, Document, IndexKind, QueryPlan, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Index built on the queried field before the query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexChoice {
    /// Ordered index.
    Ordered,
    /// Hash index.
    Hash,
    /// No index; the query scans every document.
    None,
}

/// Range operator selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeOp {
    /// `key == value`
    Eq,
    /// `key < value`
    Lt,
    /// `key <= value`
    Le,
    /// `key > value`
    Gt,
    /// `key >= value`
    Ge,
    /// `value <= key < upper`
    Range,
    /// `value < key < upper`
    Orange,
    /// `value <= key <= upper`
    Crange,
}

impl RangeOp {
    fn is_two_sided(self) -> bool {
        matches!(self, RangeOp::Range | RangeOp::Orange | RangeOp::Crange)
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per document.
    Text,
    /// A single JSON object.
    Json,
}

/// Arguments of the query command.
#[derive(Debug, Clone)]
pub struct QueryArgs {
    /// Input file.
    pub input: PathBuf,
    /// Queried field path.
    pub field: String,
    /// Index to build.
    pub index: IndexChoice,
    /// Whether the index is unique.
    pub unique: bool,
    /// Operator.
    pub op: RangeOp,
    /// Operand or lower bound.
    pub value: String,
    /// Upper bound.
    pub upper: Option<String>,
    /// Output format.
    pub format: OutputFormat,
}

/// Errors turning command-line input into documents and ranges.
#[derive(Debug, Error)]
pub enum InputError {
    /// The number is not an i64.
    #[error("unsupported number {0}: only 64-bit signed integers are allowed")]
    UnsupportedNumber(String),

    /// The input file does not hold an array.
    #[error("expected a JSON array of objects, got {0}")]
    NotAnArray(&'static str),

    /// An array element is not an object.
    #[error("document #{index} is not a JSON object")]
    NotAnObject {
        /// Position in the input array.
        index: usize,
    },

    /// A two-sided operator without `--upper`.
    #[error("--upper is required for {0:?}")]
    MissingUpper(RangeOp),

    /// `--upper` given to a one-sided operator.
    #[error("--upper is not valid for {0:?}")]
    UnexpectedUpper(RangeOp),
}

/// Query result as printed in JSON format.
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    /// How the query was answered.
    pub plan: QueryPlan,
    /// Number of matching documents.
    pub count: usize,
    /// Matching documents, each with its `_id`.
    pub documents: Vec<serde_json::Value>,
}

/// Runs the query command.
pub fn run(args: &QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read {:?}: {e}", args.input))?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let bodies = documents_from_json(&json)?;

    let db = Database::new();
    let collection = db.create(CollectionSpec::new(collection_name(&args.input)))?;
    match args.index {
        IndexChoice::Ordered => {
            collection.ensure_index(IndexKind::Ordered, vec![args.field.clone()], args.unique)?;
        }
        IndexChoice::Hash => {
            collection.ensure_index(IndexKind::Hash, vec![args.field.clone()], args.unique)?;
        }
        IndexChoice::None => {}
    }

    let count = bodies.len();
    for body in bodies {
        collection.insert(body)?;
    }
    info!(collection = %collection.name(), documents = count, "loaded input");

    let range = build_range(args.op, parse_operand(&args.value)?, args.upper.as_deref())?;
    debug!(field = %args.field, range = %range, "running query");

    let cursor = collection.query(&args.field, range)?;
    let plan = cursor.plan().clone();
    let documents = cursor.to_vec()?;

    match args.format {
        OutputFormat::Json => {
            let output = QueryOutput {
                plan,
                count: documents.len(),
                documents: documents.iter().map(document_to_json).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_text_output(&plan, &documents),
    }

    Ok(())
}

fn print_text_output(plan: &QueryPlan, documents: &[Document]) {
    println!("Plan: {plan}");
    println!();
    for document in documents {
        println!("{}  {}", document.id(), document.body());
    }
    println!();
    println!("{} document(s)", documents.len());
}

fn collection_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("input")
        .to_string()
}

/// Converts the input file contents to document bodies.
pub fn documents_from_json(json: &serde_json::Value) -> Result<Vec<Value>, InputError> {
    let items = json
        .as_array()
        .ok_or_else(|| InputError::NotAnArray(json_type(json)))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_object() {
                json_to_value(item)
            } else {
                Err(InputError::NotAnObject { index })
            }
        })
        .collect()
}

/// Converts a JSON value to a document value.
pub fn json_to_value(json: &serde_json::Value) -> Result<Value, InputError> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(n) => Value::Integer(n),
            None => return Err(InputError::UnsupportedNumber(n.to_string())),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => Value::Array(
            items
                .iter()
                .map(json_to_value)
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(fields) => Value::object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), json_to_value(v)?)))
                .collect::<Result<Vec<(String, Value)>, InputError>>()?,
        ),
    })
}

/// Converts a document value to JSON.
///
/// Byte strings become arrays of numbers; non-text map keys are printed.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(bytes) => bytes.iter().map(|b| serde_json::Value::from(*b)).collect(),
        Value::Array(items) => items.iter().map(value_to_json).collect(),
        Value::Map(pairs) => serde_json::Value::Object(
            pairs
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::Text(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key, value_to_json(v))
                })
                .collect(),
        ),
    }
}

fn document_to_json(document: &Document) -> serde_json::Value {
    let mut json = value_to_json(document.body());
    if let serde_json::Value::Object(fields) = &mut json {
        fields.insert(
            "_id".to_string(),
            serde_json::Value::String(document.id().to_string()),
        );
    }
    json
}

/// Parses an operand: JSON if it parses, plain text otherwise.
pub fn parse_operand(text: &str) -> Result<Value, InputError> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => json_to_value(&json),
        Err(_) => Ok(Value::Text(text.to_string())),
    }
}

/// Builds the range for an operator and its operands.
pub fn build_range(op: RangeOp, value: Value, upper: Option<&str>) -> Result<Range, InputError> {
    let upper = match (op.is_two_sided(), upper) {
        (true, Some(upper)) => Some(parse_operand(upper)?),
        (true, None) => return Err(InputError::MissingUpper(op)),
        (false, Some(_)) => return Err(InputError::UnexpectedUpper(op)),
        (false, None) => None,
    };

    Ok(match (op, upper) {
        (RangeOp::Eq, _) => predicate::eq(value),
        (RangeOp::Lt, _) => predicate::lt(value),
        (RangeOp::Le, _) => predicate::le(value),
        (RangeOp::Gt, _) => predicate::gt(value),
        (RangeOp::Ge, _) => predicate::ge(value),
        (RangeOp::Range, Some(hi)) => predicate::range(value, hi),
        (RangeOp::Orange, Some(hi)) => predicate::orange(value, hi),
        (RangeOp::Crange, Some(hi)) => predicate::crange(value, hi),
        (op, None) => return Err(InputError::MissingUpper(op)),
    })
}

fn json_type(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
