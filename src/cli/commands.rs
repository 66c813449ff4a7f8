use crate::parse::{decode_parameter_with_limits, ParameterError, RawValue};
use crate::request::{decode_parameters, RawParameters};
use crate::runtime_config::DecodeLimits;
use crate::spec::{
    load_parameters_with_limits, OperationParameters, ParameterDefinition, ParameterLocation,
    SchemaNode,
};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Command-line interface for brrtparam
///
/// Inspects the parameters an OpenAPI document declares and decodes raw
/// values against them.
#[derive(Parser)]
#[command(name = "brrtparam")]
#[command(about = "OpenAPI parameter decoder", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List every operation's parameters
    Inspect {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,
    },
    /// Decode one raw value for one parameter and print it as JSON
    Decode {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// operationId, or "METHOD /path"
        #[arg(short, long)]
        operation: String,

        /// Parameter name
        #[arg(short, long)]
        param: String,

        /// Parameter location, needed when the name is declared in several places
        #[arg(short = 'l', long = "in")]
        location: Option<ParameterLocation>,

        /// Raw wire value; omit to decode an absent parameter
        #[arg(short, long)]
        value: Option<String>,
    },
    /// Extract and decode every parameter of an operation from a request
    Request {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// operationId, or "METHOD /path"
        #[arg(short, long)]
        operation: String,

        /// Request target, e.g. "/pets/5?tags=a&tags=b"
        #[arg(short, long)]
        url: String,

        /// Request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Cookie header value, e.g. "session=abc; theme=dark"
        #[arg(short, long)]
        cookie: Option<String>,

        /// application/x-www-form-urlencoded body for formData parameters
        #[arg(short, long)]
        form: Option<String>,
    },
}

/// Parse process arguments and run the selected command.
///
/// Returns `Ok(false)` when a value was rejected; the rejection has already
/// been printed.
pub fn run_cli() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    let limits = DecodeLimits::from_env();
    let stdout = std::io::stdout();
    execute(&cli, &limits, &mut stdout.lock())
}

/// Run a parsed command, writing results to `out`.
pub fn execute(cli: &Cli, limits: &DecodeLimits, out: &mut dyn Write) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Inspect { spec } => {
            let operations = load(spec, limits)?;
            write_inspection(&operations, out)?;
            Ok(true)
        }
        Commands::Decode {
            spec,
            operation,
            param,
            location,
            value,
        } => {
            let operations = load(spec, limits)?;
            let op = find_operation(&operations, operation)?;
            let definition = find_parameter(op, param, *location)?;
            let raw = value.clone().map(RawValue::Single);
            match decode_parameter_with_limits(definition, raw.as_ref(), limits) {
                Ok(Some(decoded)) => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&decoded.to_json())?)?;
                    Ok(true)
                }
                Ok(None) => {
                    writeln!(out, "(absent)")?;
                    Ok(true)
                }
                Err(e) => {
                    write_rejection(&e, out)?;
                    Ok(false)
                }
            }
        }
        Commands::Request {
            spec,
            operation,
            url,
            headers,
            cookie,
            form,
        } => {
            let operations = load(spec, limits)?;
            let op = find_operation(&operations, operation)?;

            let mut header_pairs = headers
                .iter()
                .map(|h| {
                    h.split_once(':')
                        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                        .ok_or_else(|| anyhow!("Header '{h}' is not in 'Name: value' form"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            if let Some(cookie) = cookie {
                header_pairs.push(("cookie".to_string(), cookie.clone()));
            }

            let mut raw = RawParameters::from_parts(&op.path, url, header_pairs);
            if let Some(body) = form {
                raw = raw.with_form_body(body);
            }

            match decode_parameters(&op.parameters, &raw, limits) {
                Ok(parsed) => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&parsed.to_json())?)?;
                    Ok(true)
                }
                Err(e) => {
                    write_rejection(&e, out)?;
                    Ok(false)
                }
            }
        }
    }
}

fn load(spec: &Path, limits: &DecodeLimits) -> anyhow::Result<Vec<OperationParameters>> {
    load_parameters_with_limits(spec, limits)
}

fn find_operation<'a>(
    operations: &'a [OperationParameters],
    key: &str,
) -> anyhow::Result<&'a OperationParameters> {
    operations
        .iter()
        .find(|op| op.matches(key))
        .ok_or_else(|| anyhow!("No operation '{key}' in spec"))
}

fn find_parameter<'a>(
    op: &'a OperationParameters,
    name: &str,
    location: Option<ParameterLocation>,
) -> anyhow::Result<&'a ParameterDefinition> {
    let mut candidates = op
        .parameters
        .iter()
        .filter(|p| p.name == name && location.map_or(true, |l| p.location == l));
    let found = candidates
        .next()
        .with_context(|| format!("Operation '{}' has no parameter '{name}'", op.display_name()))?;
    if candidates.next().is_some() {
        anyhow::bail!("Parameter '{name}' is declared in several locations; pass --in");
    }
    Ok(found)
}

fn write_rejection(e: &ParameterError, out: &mut dyn Write) -> anyhow::Result<()> {
    let report = serde_json::json!({
        "status": e.status().as_u16(),
        "parameter": e.name(),
        "in": e.location().as_str(),
        "path": e.path(),
        "message": e.message(),
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

/// `integer`, `string(date-time)`, `array<integer>`, `object{a: integer}`
pub fn describe_schema(node: &SchemaNode) -> String {
    match node {
        SchemaNode::Primitive(p) => match &p.format {
            Some(format) => format!("{}({})", p.kind.as_str(), format.as_str()),
            None => p.kind.as_str().to_string(),
        },
        SchemaNode::ArrayOf(items) => format!("array<{}>", describe_schema(items)),
        SchemaNode::ObjectOf(properties) => {
            let fields: Vec<String> = properties
                .iter()
                .map(|(k, v)| format!("{k}: {}", describe_schema(v)))
                .collect();
            format!("object{{{}}}", fields.join(", "))
        }
    }
}

fn describe_parameter(param: &ParameterDefinition) -> String {
    let required = if param.required { "required" } else { "optional" };
    let shape = match param.content_schema() {
        Some((mime, schema)) => format!("content {mime} {}", describe_schema(schema)),
        None => format!(
            "{} explode={} {}",
            param.effective_style(),
            param.explode,
            param
                .schema
                .as_ref()
                .map(describe_schema)
                .unwrap_or_else(|| "-".to_string())
        ),
    };
    let default = param
        .default
        .as_ref()
        .map(|d| format!(" default={d}"))
        .unwrap_or_default();
    format!("  {:<8} {:<20} {required:<8} {shape}{default}", param.location.as_str(), param.name)
}

fn write_inspection(operations: &[OperationParameters], out: &mut dyn Write) -> anyhow::Result<()> {
    for op in operations {
        writeln!(out, "{} ({} {})", op.display_name(), op.method, op.path)?;
        if op.parameters.is_empty() {
            writeln!(out, "  (no parameters)")?;
        }
        for param in &op.parameters {
            writeln!(out, "{}", describe_parameter(param))?;
        }
    }
    Ok(())
}
