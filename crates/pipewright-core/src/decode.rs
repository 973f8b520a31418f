//! Tree-walk decoding of the generic block tree into the typed model
//!
//! The walk is strictly top-down with no backtracking:
//! root → {connection blocks, processes} → each process →
//! {input, transforms, output} → input → fields.
//!
//! Every validation failure is appended to the caller-supplied [`Report`]
//! and the walk continues; only a grossly malformed block shape curtails
//! the subtree it sits in. Partially decoded entries stay in the model,
//! because a model with a non-empty report is never executed anyway.

use crate::config::{
    Config, FieldInfo, InputInfo, MongoDbConfig, OutputInfo, ProcessInfo, TransformInfo,
    UnidataConfig,
};
use crate::diag::{Diagnostic, DiagnosticKind, Report};
use crate::schema::{self, ScopeNames};
use crate::tree::Body;
use crate::value::{Value, ValueMap};

/// Decode a block tree into the typed model, appending every validation
/// failure to `report`
///
/// The model is returned even when failures were recorded; callers must
/// treat it as unusable unless the report is empty.
pub fn decode(body: &Body, report: &mut Report) -> Config {
    schema::check_keys(body, schema::ROOT_KEYS, "", report);

    let mut config = Config::default();

    let mut names = ScopeNames::new();
    for child in kind_children(body, "process", report) {
        names.observe("process", &child.name, child.line, report);
        config.processes.push(decode_process(&child, report));
    }

    if let Some(block) = connection_body(body, "unidata", report) {
        config.unidata = Some(decode_unidata(block, report));
    }
    if let Some(block) = connection_body(body, "mongodb", report) {
        config.mongodb = Some(decode_mongodb(block, report));
    }

    config
}

/// A resolved named child: either `kind "name" { … }` or the nested
/// `kind { name { … } }` form
struct Child<'a> {
    name: String,
    line: Option<usize>,
    body: &'a Body,
}

/// Collect the named children of every `kind` block, accepting both label
/// forms and flagging shapes that fit neither
fn kind_children<'a>(body: &'a Body, kind: &str, report: &mut Report) -> Vec<Child<'a>> {
    let mut children = Vec::new();
    for block in body.blocks.iter().filter(|b| b.ident == kind) {
        match block.labels.len() {
            0 => {
                // Wrapper form: the named children are nested blocks, and
                // stray attributes belong to no schema at all.
                for attr in &block.body.attributes {
                    report.push(
                        Diagnostic::new(
                            DiagnosticKind::Schema,
                            format!("'{}': invalid key '{}'", kind, attr.key),
                        )
                        .with_line(attr.line),
                    );
                }
                for nested in &block.body.blocks {
                    if nested.labels.is_empty() {
                        children.push(Child {
                            name: nested.ident.clone(),
                            line: nested.line,
                            body: &nested.body,
                        });
                    } else {
                        report.push(
                            Diagnostic::new(
                                DiagnosticKind::Syntax,
                                format!(
                                    "'{}' inside '{}' does not take a label",
                                    nested.ident, kind
                                ),
                            )
                            .with_line(nested.line),
                        );
                    }
                }
            }
            1 => children.push(Child {
                name: block.labels[0].clone(),
                line: block.line,
                body: &block.body,
            }),
            _ => report.push(
                Diagnostic::new(
                    DiagnosticKind::Syntax,
                    format!("'{}' block expects a single label", kind),
                )
                .with_line(block.line),
            ),
        }
    }
    children
}

/// Reduce the children of one process-level group to exactly one entry
fn exactly_one<'a>(
    mut children: Vec<Child<'a>>,
    what: &str,
    scope: &str,
    process_line: Option<usize>,
    report: &mut Report,
) -> Option<Child<'a>> {
    if children.is_empty() {
        report.push(
            Diagnostic::new(
                DiagnosticKind::Structural,
                format!("{}missing '{}' block", scope, what),
            )
            .with_line(process_line),
        );
        return None;
    }
    let first = children.remove(0);
    for extra in children {
        report.push(
            Diagnostic::new(
                DiagnosticKind::Structural,
                format!("{}only one '{}' block allowed", scope, what),
            )
            .with_line(extra.line),
        );
    }
    Some(first)
}

fn decode_process(child: &Child<'_>, report: &mut Report) -> ProcessInfo {
    let scope = format!("process '{}': ", child.name);
    schema::check_keys(child.body, schema::PROCESS_KEYS, &scope, report);

    let input = exactly_one(
        kind_children(child.body, "input", report),
        "input",
        &scope,
        child.line,
        report,
    )
    .map(|input| decode_input(&input, report));

    let transforms = kind_children(child.body, "transform", report)
        .iter()
        .map(|transform| TransformInfo {
            kind: transform.name.to_lowercase(),
            config: body_to_map(transform.body, &[]),
        })
        .collect();

    let output = exactly_one(
        kind_children(child.body, "output", report),
        "output",
        &scope,
        child.line,
        report,
    )
    .map(|output| OutputInfo {
        kind: output.name.to_lowercase(),
        config: body_to_map(output.body, &[]),
    });

    ProcessInfo {
        name: child.name.clone(),
        input,
        transforms,
        output,
    }
}

fn decode_input(child: &Child<'_>, report: &mut Report) -> InputInfo {
    // The connector owns the legal key set, so the attributes pass through
    // unvalidated; only `field` children get schema treatment.
    let config = body_to_map(child.body, &["field"]);

    let mut fields = Vec::new();
    let mut names = ScopeNames::new();
    for field in kind_children(child.body, "field", report) {
        names.observe("field", &field.name, field.line, report);
        fields.push(decode_field(&field, report));
    }

    InputInfo {
        kind: child.name.to_lowercase(),
        config,
        fields,
    }
}

fn decode_field(child: &Child<'_>, report: &mut Report) -> FieldInfo {
    let scope = format!("field '{}': ", child.name);
    schema::check_keys(child.body, schema::FIELD_KEYS, &scope, report);

    let kind = match child.body.attributes.iter().find(|a| a.key == "type") {
        Some(attr) => match attr.value.weak_string() {
            Ok(kind) if !kind.is_empty() => kind,
            Ok(_) => {
                report.push(missing_field_type(&child.name).with_line(attr.line));
                String::new()
            }
            Err(err) => {
                report.push(
                    Diagnostic::new(
                        DiagnosticKind::TypeCoercion,
                        format!("{}'type': {}", scope, err),
                    )
                    .with_line(attr.line),
                );
                String::new()
            }
        },
        None => {
            report.push(missing_field_type(&child.name).with_line(child.line));
            String::new()
        }
    };

    let is_multi = match child.body.attributes.iter().find(|a| a.key == "is_multi") {
        Some(attr) => match attr.value.weak_bool() {
            Ok(is_multi) => is_multi,
            Err(err) => {
                report.push(
                    Diagnostic::new(
                        DiagnosticKind::TypeCoercion,
                        format!("{}'is_multi': {}", scope, err),
                    )
                    .with_line(attr.line),
                );
                false
            }
        },
        None => false,
    };

    FieldInfo {
        name: child.name.clone(),
        kind,
        is_multi,
    }
}

fn missing_field_type(name: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::Structural,
        format!("you must specify a type for field '{}'", name),
    )
}

/// Find the single body of a connection block, flagging repeats and labels
fn connection_body<'a>(body: &'a Body, kind: &str, report: &mut Report) -> Option<&'a Body> {
    let mut blocks = body.blocks.iter().filter(|b| b.ident == kind);
    let first = blocks.next()?;
    for extra in blocks {
        report.push(
            Diagnostic::new(
                DiagnosticKind::Structural,
                format!("only one '{}' block allowed", kind),
            )
            .with_line(extra.line),
        );
    }
    if !first.labels.is_empty() {
        report.push(
            Diagnostic::new(
                DiagnosticKind::Syntax,
                format!("'{}' block does not take a label", kind),
            )
            .with_line(first.line),
        );
    }
    Some(&first.body)
}

fn decode_unidata(body: &Body, report: &mut Report) -> UnidataConfig {
    schema::check_keys(body, schema::UNIDATA_KEYS, "unidata: ", report);
    UnidataConfig {
        host: string_attr(body, "host", "unidata: ", report),
        username: string_attr(body, "username", "unidata: ", report),
        password: string_attr(body, "password", "unidata: ", report),
        udt_bin: string_attr(body, "udt_bin", "unidata: ", report),
        udt_home: string_attr(body, "udt_home", "unidata: ", report),
        udt_acct: string_attr(body, "udt_acct", "unidata: ", report),
    }
}

fn decode_mongodb(body: &Body, report: &mut Report) -> MongoDbConfig {
    schema::check_keys(body, schema::MONGODB_KEYS, "mongodb: ", report);
    MongoDbConfig {
        server: string_attr(body, "server", "mongodb: ", report),
        database: string_attr(body, "database", "mongodb: ", report),
    }
}

/// Weak-decode an optional string attribute, reporting a coercion failure
fn string_attr(body: &Body, key: &str, scope: &str, report: &mut Report) -> Option<String> {
    let attr = body.attributes.iter().find(|a| a.key == key)?;
    match attr.value.weak_string() {
        Ok(value) => Some(value),
        Err(err) => {
            report.push(
                Diagnostic::new(
                    DiagnosticKind::TypeCoercion,
                    format!("{}'{}': {}", scope, key, err),
                )
                .with_line(attr.line),
            );
            None
        }
    }
}

/// Flatten a block body into the opaque connector mapping: attributes
/// verbatim, nested blocks as nested objects (skipping `skip` idents at the
/// top level only)
fn body_to_map(body: &Body, skip: &[&str]) -> ValueMap {
    let mut map = ValueMap::new();
    for attr in &body.attributes {
        map.insert(attr.key.clone(), attr.value.clone());
    }
    for block in body
        .blocks
        .iter()
        .filter(|b| !skip.contains(&b.ident.as_str()))
    {
        let mut value = Value::Object(body_to_map(&block.body, &[]));
        for label in block.labels.iter().rev() {
            let mut wrapper = ValueMap::new();
            wrapper.insert(label.clone(), value);
            value = Value::Object(wrapper);
        }
        map.insert(block.ident.clone(), value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    fn decode_src(src: &str) -> (Config, Report) {
        let body = tree::parse(src, "test.conf").unwrap();
        let mut report = Report::new();
        let config = decode(&body, &mut report);
        (config, report)
    }

    fn kinds(report: &Report) -> Vec<DiagnosticKind> {
        report.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_labeled_and_nested_forms_are_equivalent() {
        let labeled = r#"
process "load" {
  input "csv" {
    path = "in.csv"
  }
  output "json" {
    path = "out.json"
  }
}
"#;
        let nested = r#"
process "load" {
  input {
    csv {
      path = "in.csv"
    }
  }
  output {
    json {
      path = "out.json"
    }
  }
}
"#;
        let (a, report_a) = decode_src(labeled);
        let (b, report_b) = decode_src(nested);
        assert!(report_a.is_empty(), "{}", report_a);
        assert!(report_b.is_empty(), "{}", report_b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_type_tags_are_lowercased() {
        let src = r#"
process "load" {
  input "CSV" {}
  transform "JS" {}
  output "JSON" {}
}
"#;
        let (config, report) = decode_src(src);
        assert!(report.is_empty(), "{}", report);
        let process = &config.processes[0];
        assert_eq!(process.input.as_ref().unwrap().kind, "csv");
        assert_eq!(process.transforms[0].kind, "js");
        assert_eq!(process.output.as_ref().unwrap().kind, "json");
    }

    #[test]
    fn test_transform_order_is_declaration_order() {
        let src = r#"
process "load" {
  input "csv" {}
  transform "js" {
    script = "one.js"
  }
  transform "js" {
    script = "two.js"
  }
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert!(report.is_empty(), "{}", report);
        let transforms = &config.processes[0].transforms;
        assert_eq!(transforms.len(), 2);
        assert_eq!(
            transforms[0].config.get("script"),
            Some(&Value::String("one.js".to_string()))
        );
        assert_eq!(
            transforms[1].config.get("script"),
            Some(&Value::String("two.js".to_string()))
        );
    }

    #[test]
    fn test_duplicate_process_names_keep_both() {
        let src = r#"
process "load" {
  input "csv" {}
  output "json" {}
}
process "load" {
  input "json" {}
  output "csv" {}
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(config.processes.len(), 2);
        assert_eq!(kinds(&report), vec![DiagnosticKind::DuplicateName]);
        assert_eq!(
            report.iter().next().unwrap().message,
            "process 'load' defined more than once"
        );
    }

    #[test]
    fn test_missing_input_and_output_reported_independently() {
        let src = r#"
process "a" {
  input "csv" {}
}
process "b" {
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(config.processes.len(), 2);
        assert!(config.processes[0].output.is_none());
        assert!(config.processes[1].input.is_none());
        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "process 'a': missing 'output' block",
                "process 'b': missing 'input' block",
            ]
        );
    }

    #[test]
    fn test_second_output_is_structural_error() {
        let src = r#"
process "a" {
  input "csv" {}
  output "json" {}
  output "csv" {}
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(kinds(&report), vec![DiagnosticKind::Structural]);
        assert_eq!(
            report.iter().next().unwrap().message,
            "process 'a': only one 'output' block allowed"
        );
        // The first declaration wins.
        assert_eq!(config.processes[0].output.as_ref().unwrap().kind, "json");
    }

    #[test]
    fn test_unknown_keys_do_not_stop_the_walk() {
        let src = r#"
bogus = true
process "a" {
  wrong = 1
  input "csv" {}
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(config.processes.len(), 1);
        assert_eq!(
            kinds(&report),
            vec![DiagnosticKind::Schema, DiagnosticKind::Schema]
        );
        let rendered: Vec<_> = report.iter().map(|d| d.to_string()).collect();
        assert_eq!(rendered[0], "invalid key 'bogus' on line 2");
        assert_eq!(rendered[1], "process 'a': invalid key 'wrong' on line 4");
    }

    #[test]
    fn test_fields_decode_with_defaults() {
        let src = r#"
process "a" {
  input "unidata" {
    file = "CUSTOMERS"
    field "CUSTNO" {
      type = "string"
    }
    field "ORDERS" {
      type = "string"
      is_multi = true
    }
  }
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert!(report.is_empty(), "{}", report);
        let input = config.processes[0].input.as_ref().unwrap();
        assert_eq!(input.fields.len(), 2);
        assert_eq!(input.fields[0].name, "CUSTNO");
        assert!(!input.fields[0].is_multi);
        assert!(input.fields[1].is_multi);
        // Field blocks stay out of the opaque connector mapping.
        assert_eq!(
            input.config.get("file"),
            Some(&Value::String("CUSTOMERS".to_string()))
        );
        assert!(!input.config.contains_key("field"));
    }

    #[test]
    fn test_field_is_multi_string_is_coercion_error() {
        let src = r#"
process "a" {
  input "unidata" {
    field "CUSTNO" {
      type = "string"
      is_multi = "yes"
    }
  }
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(kinds(&report), vec![DiagnosticKind::TypeCoercion]);
        assert_eq!(
            report.iter().next().unwrap().to_string(),
            "field 'CUSTNO': 'is_multi': expected bool, found string \"yes\" on line 6"
        );
        let field = &config.processes[0].input.as_ref().unwrap().fields[0];
        assert!(!field.is_multi);
    }

    #[test]
    fn test_field_without_type_is_structural_error() {
        let src = r#"
process "a" {
  input "unidata" {
    field "CUSTNO" {}
  }
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(kinds(&report), vec![DiagnosticKind::Structural]);
        assert_eq!(
            report.iter().next().unwrap().message,
            "you must specify a type for field 'CUSTNO'"
        );
        let field = &config.processes[0].input.as_ref().unwrap().fields[0];
        assert_eq!(field.kind, "");
    }

    #[test]
    fn test_duplicate_field_names() {
        let src = r#"
process "a" {
  input "unidata" {
    field "X" {
      type = "string"
    }
    field "X" {
      type = "number"
    }
  }
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(kinds(&report), vec![DiagnosticKind::DuplicateName]);
        assert_eq!(
            report.iter().next().unwrap().message,
            "field 'X' defined more than once"
        );
        assert_eq!(config.processes[0].input.as_ref().unwrap().fields.len(), 2);
    }

    #[test]
    fn test_connection_blocks_decode() {
        let src = r#"
unidata {
  host = "udt.example.com"
  username = "svc"
  password = "secret"
  udt_bin = "/usr/udthome/bin"
}
mongodb {
  server = "mongo.example.com"
  database = "etl"
}
"#;
        let (config, report) = decode_src(src);
        assert!(report.is_empty(), "{}", report);
        let unidata = config.unidata.unwrap();
        assert_eq!(unidata.host.as_deref(), Some("udt.example.com"));
        assert_eq!(unidata.udt_bin.as_deref(), Some("/usr/udthome/bin"));
        assert_eq!(unidata.udt_home, None);
        let mongodb = config.mongodb.unwrap();
        assert_eq!(mongodb.server.as_deref(), Some("mongo.example.com"));
        assert_eq!(mongodb.database.as_deref(), Some("etl"));
    }

    #[test]
    fn test_repeated_connection_block_is_structural_error() {
        let src = r#"
mongodb {
  server = "a"
}
mongodb {
  server = "b"
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(kinds(&report), vec![DiagnosticKind::Structural]);
        assert_eq!(
            report.iter().next().unwrap().to_string(),
            "only one 'mongodb' block allowed on line 5"
        );
        // The first declaration wins.
        assert_eq!(config.mongodb.unwrap().server.as_deref(), Some("a"));
    }

    #[test]
    fn test_connection_attr_wrong_type_is_coercion_error() {
        let src = r#"
mongodb {
  server = 27017
}
"#;
        let (config, report) = decode_src(src);
        assert_eq!(kinds(&report), vec![DiagnosticKind::TypeCoercion]);
        assert_eq!(
            report.iter().next().unwrap().to_string(),
            "mongodb: 'server': expected string, found int 27017 on line 3"
        );
        assert_eq!(config.mongodb.unwrap().server, None);
    }

    #[test]
    fn test_unknown_connection_key_is_schema_error() {
        let src = r#"
unidata {
  host = "a"
  port = 22
}
"#;
        let (_, report) = decode_src(src);
        assert_eq!(kinds(&report), vec![DiagnosticKind::Schema]);
        assert_eq!(
            report.iter().next().unwrap().to_string(),
            "unidata: invalid key 'port' on line 4"
        );
    }

    #[test]
    fn test_stray_attribute_in_wrapper_block() {
        let src = r#"
process "a" {
  input {
    path = "in.csv"
  }
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        // The stray attribute is flagged, and no typed child remains, so the
        // input is also missing.
        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["'input': invalid key 'path'", "process 'a': missing 'input' block"]
        );
        assert!(config.processes[0].input.is_none());
    }

    #[test]
    fn test_decode_is_idempotent() {
        let src = r#"
process "load" {
  input "csv" {
    path = "in.csv"
  }
  transform "js" {
    script = "clean.js"
  }
  output "json" {}
}
process "load" {
  input "csv" {}
  output "json" {}
}
"#;
        let (config_a, report_a) = decode_src(src);
        let (config_b, report_b) = decode_src(src);
        assert_eq!(config_a, config_b);
        assert_eq!(report_a, report_b);
    }

    #[test]
    fn test_nested_blocks_flatten_into_connector_map() {
        let src = r#"
process "a" {
  input "csv" {
    path = "in.csv"
    options {
      delimiter = ";"
    }
  }
  output "json" {}
}
"#;
        let (config, report) = decode_src(src);
        assert!(report.is_empty(), "{}", report);
        let input = config.processes[0].input.as_ref().unwrap();
        match input.config.get("options") {
            Some(Value::Object(options)) => {
                assert_eq!(
                    options.get("delimiter"),
                    Some(&Value::String(";".to_string()))
                );
            }
            other => panic!("expected nested object, got {:?}", other),
        }
    }
}
