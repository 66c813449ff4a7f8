//! Unit tests for CLI commands

use crate::cli::{describe_schema, execute, Cli, Commands};
use crate::runtime_config::DecodeLimits;
use crate::spec::{Format, ParameterLocation, SchemaNode};
use clap::Parser;
use std::io::Write;

const SPEC: &str = r#"openapi: 3.1.0
info:
  title: Pets
  version: '1.0.0'
paths:
  /pets/{id}:
    parameters:
      - name: id
        in: path
        required: true
        schema:
          type: integer
    get:
      operationId: get_pet
      parameters:
        - name: tags
          in: query
          style: form
          explode: false
          schema:
            type: array
            items:
              type: string
        - name: X-Limit
          in: header
          schema:
            type: integer
            default: 5
      responses:
        '200': { description: OK }
"#;

fn spec_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(SPEC.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> (bool, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let ok = execute(&cli, &DecodeLimits::default(), &mut out).unwrap();
    (ok, String::from_utf8(out).unwrap())
}

#[test]
fn test_decode_command_parses() {
    let cli = Cli::try_parse_from([
        "brrtparam", "decode", "--spec", "api.yaml", "--operation", "get_pet", "--param", "id",
        "--in", "path", "--value", "5",
    ])
    .unwrap();
    match cli.command {
        Commands::Decode {
            param,
            location,
            value,
            ..
        } => {
            assert_eq!(param, "id");
            assert_eq!(location, Some(ParameterLocation::Path));
            assert_eq!(value.as_deref(), Some("5"));
        }
        _ => panic!("Expected Decode command"),
    }
}

#[test]
fn test_unknown_location_is_rejected() {
    assert!(Cli::try_parse_from([
        "brrtparam", "decode", "--spec", "a.yaml", "-o", "x", "-p", "y", "--in", "body",
    ])
    .is_err());
}

#[test]
fn test_inspect_lists_parameters() {
    let file = spec_file();
    let path = file.path().to_str().unwrap();
    let (ok, output) = run(&["brrtparam", "inspect", "--spec", path]);
    assert!(ok);
    assert!(output.contains("get_pet (GET /pets/{id})"));
    assert!(output.contains("form explode=false array<string>"));
    assert!(output.contains("default=5"));
}

#[test]
fn test_decode_prints_json() {
    let file = spec_file();
    let path = file.path().to_str().unwrap();
    let (ok, output) = run(&[
        "brrtparam", "decode", "-s", path, "-o", "get_pet", "-p", "tags", "-v", "a,b",
    ]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json, serde_json::json!(["a", "b"]));
}

#[test]
fn test_decode_rejection_reports_status() {
    let file = spec_file();
    let path = file.path().to_str().unwrap();
    let (ok, output) = run(&[
        "brrtparam", "decode", "-s", path, "-o", "GET /pets/{id}", "-p", "id", "-v", "abc",
    ]);
    assert!(!ok);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["status"], 400);
    assert_eq!(json["in"], "path");
}

#[test]
fn test_request_decodes_all_parameters() {
    let file = spec_file();
    let path = file.path().to_str().unwrap();
    let (ok, output) = run(&[
        "brrtparam", "request", "-s", path, "-o", "get_pet", "-u", "/pets/7?tags=x,y",
    ]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["path"]["id"], 7);
    assert_eq!(json["query"]["tags"], serde_json::json!(["x", "y"]));
    assert_eq!(json["header"]["X-Limit"], 5);
}

#[test]
fn test_unknown_operation_is_an_error() {
    let file = spec_file();
    let path = file.path().to_str().unwrap();
    let cli = Cli::try_parse_from(["brrtparam", "inspect", "--spec", path]).unwrap();
    let mut out = Vec::new();
    assert!(execute(&cli, &DecodeLimits::default(), &mut out).is_ok());

    let cli = Cli::try_parse_from([
        "brrtparam", "decode", "-s", path, "-o", "nope", "-p", "id",
    ])
    .unwrap();
    let err = execute(&cli, &DecodeLimits::default(), &mut out).unwrap_err();
    assert!(err.to_string().contains("No operation 'nope'"));
}

#[test]
fn test_describe_schema() {
    let node = SchemaNode::object([
        ("when", SchemaNode::formatted(Format::DateTime)),
        ("ids", SchemaNode::array(SchemaNode::integer())),
    ]);
    assert_eq!(
        describe_schema(&node),
        "object{when: string(date-time), ids: array<integer>}"
    );
}
