//! Pipewright Core Library
//!
//! This crate decodes block-structured ETL configuration into a typed
//! pipeline description:
//! - Generic block tree parsed from configuration text
//! - Schema of permitted keys per block kind
//! - Weak-typed coercion of attribute values
//! - Aggregated, line-annotated validation diagnostics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Block tree  │────▶│  Tree-walk  │────▶│ Typed model │
//! │ (hcl-edit)  │     │   decoder   │     │  + report   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! The decoder collects every validation failure in one pass instead of
//! stopping at the first. A model that comes back with a non-empty report
//! must never be executed; readers, transforms and the scheduler live in
//! external connector libraries and only ever see a clean model.
//!
//! # Example
//!
//! ```rust,ignore
//! use pipewright_core::Config;
//!
//! let (config, report) = Config::parse_str(src, "etl.conf")?;
//! for process in &config.processes {
//!     println!("process: {}", process.name);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod decode;
pub mod diag;
pub mod error;
pub mod schema;
pub mod tree;
pub mod value;

pub use config::{Config, ProcessInfo};
pub use diag::{Diagnostic, DiagnosticKind, Report};
pub use error::{Error, Result};
pub use value::Value;
