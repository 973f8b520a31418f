//! Generic block tree
//!
//! The decoder operates on a read-only tree of labeled blocks and key/value
//! attributes, each annotated with its 1-based source line. The tree is
//! produced from configuration text by the external grammar parser
//! (`hcl-edit`); this module owns only the thin adaptation layer, not the
//! grammar itself.

use hcl_edit::Span;
use hcl_edit::expr::{Expression, ObjectKey};
use hcl_edit::structure::{Body as HclBody, BlockLabel, Structure};

use crate::error::{Error, Result};
use crate::value::{Value, ValueMap};

/// The contents of one nesting level: attributes and child blocks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Key/value attributes, in declaration order
    pub attributes: Vec<Attribute>,

    /// Child blocks, in declaration order
    pub blocks: Vec<Block>,
}

/// A single key/value attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute key
    pub key: String,

    /// Attribute value
    pub value: Value,

    /// 1-based source line of the key, where available
    pub line: Option<usize>,
}

/// A labeled, possibly nested block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block identifier (e.g. `process`, `input`, `field`)
    pub ident: String,

    /// Block labels (e.g. the process name in `process "load" { … }`)
    pub labels: Vec<String>,

    /// 1-based source line of the identifier, where available
    pub line: Option<usize>,

    /// Nested contents
    pub body: Body,
}

/// Parse configuration text into a generic block tree
///
/// `origin` is an identifying path used only in error messages. Malformed
/// input fails as a whole with [`Error::Syntax`]; so do expression forms the
/// configuration data model has no place for (interpolation, variables,
/// function calls, null).
pub fn parse(src: &str, origin: &str) -> Result<Body> {
    let body = hcl_edit::parser::parse_body(src).map_err(|err| Error::Syntax {
        origin: origin.to_string(),
        message: err.to_string(),
    })?;
    let index = LineIndex::new(src);
    convert_body(&body, &index, origin)
}

fn convert_body(body: &HclBody, index: &LineIndex, origin: &str) -> Result<Body> {
    let mut attributes = Vec::new();
    let mut blocks = Vec::new();

    for structure in body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                let line = attr.key.span().map(|span| index.line(span.start));
                attributes.push(Attribute {
                    key: attr.key.as_str().to_string(),
                    value: convert_expr(&attr.value, index, origin)?,
                    line,
                });
            }
            Structure::Block(block) => {
                let line = block.ident.span().map(|span| index.line(span.start));
                let labels = block
                    .labels
                    .iter()
                    .map(|label| match label {
                        BlockLabel::Ident(ident) => ident.as_str().to_string(),
                        BlockLabel::String(s) => s.value().clone(),
                    })
                    .collect();
                blocks.push(Block {
                    ident: block.ident.as_str().to_string(),
                    labels,
                    line,
                    body: convert_body(&block.body, index, origin)?,
                });
            }
        }
    }

    Ok(Body { attributes, blocks })
}

fn convert_expr(expr: &Expression, index: &LineIndex, origin: &str) -> Result<Value> {
    match expr {
        Expression::String(s) => Ok(Value::String(s.value().clone())),
        Expression::Bool(b) => Ok(Value::Bool(*b.value())),
        Expression::Number(n) => {
            let number = n.value();
            if let Some(i) = number.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = number.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(unsupported(expr, "number literal out of range", index, origin))
            }
        }
        Expression::Array(array) => {
            let items = array
                .iter()
                .map(|item| convert_expr(item, index, origin))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(items))
        }
        Expression::Object(object) => {
            let mut map = ValueMap::new();
            for (key, item) in object.iter() {
                let key = match key {
                    ObjectKey::Ident(ident) => ident.as_str().to_string(),
                    ObjectKey::Expression(Expression::String(s)) => s.value().clone(),
                    _ => return Err(unsupported(expr, "unsupported object key", index, origin)),
                };
                map.insert(key, convert_expr(item.expr(), index, origin)?);
            }
            Ok(Value::Object(map))
        }
        _ => Err(unsupported(expr, "unsupported expression", index, origin)),
    }
}

fn unsupported(expr: &Expression, what: &str, index: &LineIndex, origin: &str) -> Error {
    let position = expr
        .span()
        .map(|span| format!(" on line {}", index.line(span.start)))
        .unwrap_or_default();
    Error::Syntax {
        origin: origin.to_string(),
        message: format!("{}{}", what, position),
    }
}

/// Byte-offset to 1-based-line conversion for parser spans
struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    fn new(src: &str) -> Self {
        let newlines = src
            .bytes()
            .enumerate()
            .filter(|(_, byte)| *byte == b'\n')
            .map(|(offset, _)| offset)
            .collect();
        Self { newlines }
    }

    fn line(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&newline| newline < offset) + 1
    }
}
