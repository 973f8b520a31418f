//! Typed configuration model
//!
//! The decoded form of a pipewright configuration file: named processes,
//! each with one input, an ordered transform chain and one output, plus
//! optional global connection blocks for external services.
//!
//! The model is built once per decode and owned by the caller; nothing in it
//! points back at the tree it came from.

use serde::Serialize;
use std::io::Read;
use std::path::Path;

use crate::decode;
use crate::diag::Report;
use crate::error::{Error, Result};
use crate::tree;
use crate::value::ValueMap;

/// Root of the typed model
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    /// Processes in declaration order
    pub processes: Vec<ProcessInfo>,

    /// Remote-service connection block, at most one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unidata: Option<UnidataConfig>,

    /// Document-store connection block, at most one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mongodb: Option<MongoDbConfig>,
}

/// One named ETL process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInfo {
    /// Process name, unique among processes
    pub name: String,

    /// Input specification; `None` only when the decode reported its absence
    pub input: Option<InputInfo>,

    /// Transform chain in declaration order (declaration order is execution
    /// order)
    pub transforms: Vec<TransformInfo>,

    /// Output specification; `None` only when the decode reported its absence
    pub output: Option<OutputInfo>,
}

/// Input specification of a process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputInfo {
    /// Lower-cased connector type tag (e.g. `csv`, `json`, `unidata`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Connector-specific attributes, forwarded verbatim
    pub config: ValueMap,

    /// Record schema for connectors that need an explicit field list
    pub fields: Vec<FieldInfo>,
}

/// Output specification of a process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputInfo {
    /// Lower-cased connector type tag (e.g. `json`, `mongodb`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Connector-specific attributes, forwarded verbatim
    pub config: ValueMap,
}

/// One stage of a process's transform chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformInfo {
    /// Lower-cased transform type tag (e.g. `js`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Transform-specific attributes, forwarded verbatim
    pub config: ValueMap,
}

/// One field of an input's record schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    /// Field name, unique within its input
    pub name: String,

    /// Declared field type; empty only when the decode reported it missing
    #[serde(rename = "type")]
    pub kind: String,

    /// Whether the field holds multiple values; defaults to false
    pub is_multi: bool,
}

/// Credentials and environment for the remote Unidata service
///
/// Absence of individual attributes is deferred to the consuming connector;
/// the decoder only enforces that present values are strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnidataConfig {
    /// Remote host
    pub host: Option<String>,
    /// Login user
    pub username: Option<String>,
    /// Login password
    pub password: Option<String>,
    /// Path to the udt binary on the remote host
    pub udt_bin: Option<String>,
    /// UDTHOME directory on the remote host
    pub udt_home: Option<String>,
    /// UDTACCT directory on the remote host
    pub udt_acct: Option<String>,
}

/// Endpoint of the MongoDB document store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MongoDbConfig {
    /// Server address
    pub server: Option<String>,
    /// Database name
    pub database: Option<String>,
}

impl Config {
    /// Decode configuration text
    ///
    /// `origin` is an identifying path used only in error messages. Returns
    /// the typed model together with the aggregate report; when the report
    /// is non-empty the model is partial and must not be executed.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let (config, report) = Config::parse_str(src, "etl.conf")?;
    /// if !report.is_empty() {
    ///     for diagnostic in report.iter() {
    ///         eprintln!("{}", diagnostic);
    ///     }
    ///     return Err(...);
    /// }
    /// ```
    pub fn parse_str(src: &str, origin: &str) -> Result<(Self, Report)> {
        let body = tree::parse(src, origin)?;
        let mut report = Report::new();
        let config = decode::decode(&body, &mut report);
        tracing::debug!(
            processes = config.processes.len(),
            errors = report.len(),
            "decoded configuration from {}",
            origin
        );
        Ok((config, report))
    }

    /// Decode configuration from a byte stream
    pub fn parse<R: Read>(mut reader: R, origin: &str) -> Result<(Self, Report)> {
        let mut src = String::new();
        reader.read_to_string(&mut src)?;
        Self::parse_str(&src, origin)
    }

    /// Load and decode a configuration file
    ///
    /// Convenience wrapper over [`Config::parse`] that fails with
    /// [`Error::Invalid`] when any validation error was recorded. There is
    /// no partial success: a model with a non-empty report is never
    /// returned from here.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("loading configuration from {}", path.display());
        let file = std::fs::File::open(path)?;
        let (config, report) = Self::parse(file, &path.display().to_string())?;
        if report.is_empty() {
            Ok(config)
        } else {
            Err(Error::Invalid { report })
        }
    }
}
