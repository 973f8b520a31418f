//! Permitted-key schemas and scope-level name checks
//!
//! Each block kind allows a fixed set of attribute and child-block keys.
//! Connector bodies are the deliberate exception: their legal key set is
//! owned by the external connector selected by the type tag, so no key
//! validation happens there.

use std::collections::HashSet;

use crate::diag::{Diagnostic, DiagnosticKind, Report};
use crate::tree::Body;

/// Keys permitted at the configuration root
pub const ROOT_KEYS: &[&str] = &["process", "unidata", "mongodb"];

/// Keys permitted inside a `process` block
pub const PROCESS_KEYS: &[&str] = &["input", "output", "transform"];

/// Keys permitted inside a `field` block
pub const FIELD_KEYS: &[&str] = &["type", "is_multi"];

/// Keys permitted inside a `unidata` connection block
pub const UNIDATA_KEYS: &[&str] = &[
    "host", "username", "password", "udt_bin", "udt_home", "udt_acct",
];

/// Keys permitted inside a `mongodb` connection block
pub const MONGODB_KEYS: &[&str] = &["server", "database"];

/// Check every attribute and child-block key of `body` against a permitted
/// set, recording one [`DiagnosticKind::Schema`] entry per unknown key
///
/// `scope` prefixes each message (e.g. `"process 'load': "`); pass an empty
/// string at the root. The check is pure apart from appending to the report
/// and never stops at the first violation.
pub fn check_keys(body: &Body, permitted: &[&str], scope: &str, report: &mut Report) {
    for attr in &body.attributes {
        if !permitted.contains(&attr.key.as_str()) {
            report.push(
                Diagnostic::new(
                    DiagnosticKind::Schema,
                    format!("{}invalid key '{}'", scope, attr.key),
                )
                .with_line(attr.line),
            );
        }
    }
    for block in &body.blocks {
        if !permitted.contains(&block.ident.as_str()) {
            report.push(
                Diagnostic::new(
                    DiagnosticKind::Schema,
                    format!("{}invalid key '{}'", scope, block.ident),
                )
                .with_line(block.line),
            );
        }
    }
}

/// Duplicate detector for named siblings within one scope
///
/// The second and any further occurrence of a name is flagged, but
/// processing of the remaining siblings continues.
#[derive(Debug, Default)]
pub struct ScopeNames {
    seen: HashSet<String>,
}

impl ScopeNames {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named entity; returns false and reports a duplicate when
    /// the name was already present
    ///
    /// `noun` names the entity kind in the message (e.g. `process`, `field`).
    pub fn observe(
        &mut self,
        noun: &str,
        name: &str,
        line: Option<usize>,
        report: &mut Report,
    ) -> bool {
        if self.seen.insert(name.to_string()) {
            true
        } else {
            report.push(
                Diagnostic::new(
                    DiagnosticKind::DuplicateName,
                    format!("{} '{}' defined more than once", noun, name),
                )
                .with_line(line),
            );
            false
        }
    }
}
