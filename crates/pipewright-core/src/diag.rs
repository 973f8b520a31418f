//! Aggregated validation diagnostics
//!
//! Decoding never stops at the first problem. Every component appends to a
//! [`Report`] and traversal continues, so one pass over a configuration
//! surfaces every independent error it contains.

use serde::Serialize;
use std::fmt;

/// Category of a single validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed tree shape (e.g. a scalar where an object was required)
    Syntax,

    /// Key not permitted by the block kind's schema
    Schema,

    /// Named sibling declared more than once in the same scope
    DuplicateName,

    /// Attribute value could not be coerced into its declared type
    TypeCoercion,

    /// Required structure missing or repeated (input/output/type/connection block)
    Structural,
}

/// One validation failure with its source position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Failure category
    pub kind: DiagnosticKind,

    /// Human-readable description
    pub message: String,

    /// 1-based source line, where available
    pub line: Option<usize>,
}

impl Diagnostic {
    /// Create a diagnostic without a source position
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    /// Attach a 1-based source line
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a source line when one is known
    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(line) = self.line {
            write!(f, " on line {}", line)?;
        }
        Ok(())
    }
}

/// Ordered collection of every failure from one decode pass
///
/// The report is the injectable error sink of the decoder: callers hand a
/// mutable report in, and check it for emptiness before using the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one diagnostic, preserving insertion order
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// True when no failures were recorded
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of recorded failures
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Iterate the diagnostics in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Consume the report, yielding the ordered diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
