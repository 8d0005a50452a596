#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smi_access_k8s_api::{
    AccessObject, ClusterTrafficTarget, Encoding, Resource, ResourceExt, TrafficTarget,
    TrafficTargetSpec,
};
use std::{
    fmt::Write as _,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[clap(name = "smi-access", about = "Converts and checks SMI access resources")]
pub struct Args {
    #[clap(long, default_value = "smi_access=info,warn", env = "SMI_ACCESS_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain", env = "SMI_ACCESS_LOG_FORMAT")]
    log_format: kubert::LogFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Re-encodes an access resource or list.
    Convert {
        /// Encoding of the input: json, yaml, or protobuf.
        #[clap(long, default_value = "yaml")]
        from: Encoding,

        /// Encoding of the output: json, yaml, or protobuf.
        #[clap(long, default_value = "json")]
        to: Encoding,

        /// Input file, or `-` for stdin.
        #[clap(long, short, default_value = "-")]
        input: PathBuf,

        /// Output file, or `-` for stdout.
        #[clap(long, short, default_value = "-")]
        output: PathBuf,
    },

    /// Decodes an access resource or list and describes it.
    Check {
        #[clap(long, default_value = "yaml")]
        from: Encoding,

        #[clap(long, short, default_value = "-")]
        input: PathBuf,
    },

    /// Prints the JSON schema of a resource kind.
    Schema {
        /// TrafficTarget or ClusterTrafficTarget.
        kind: SchemaKind,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SchemaKind {
    TrafficTarget,
    ClusterTrafficTarget,
}

#[derive(Debug, thiserror::Error)]
#[error("no schema for kind {0:?}; expected TrafficTarget or ClusterTrafficTarget")]
struct InvalidKind(String);

// === impl Args ===

impl Args {
    pub fn parse_and_run() -> Result<()> {
        let Args {
            log_level,
            log_format,
            command,
        } = Self::parse();

        log_format
            .try_init(log_level)
            .expect("must configure logging");

        command.run()
    }
}

// === impl Command ===

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::Convert {
                from,
                to,
                input,
                output,
            } => {
                let bytes = read_input(&input)?;
                let converted = convert(&bytes, from, to)?;
                write_output(&output, &converted)?;
                info!(%from, %to, bytes = converted.len(), "Converted");
            }

            Self::Check { from, input } => {
                let bytes = read_input(&input)?;
                let obj = AccessObject::decode(&bytes, from)
                    .with_context(|| format!("failed to decode {}", input.display()))?;
                let description = describe(&obj);
                io::stdout().write_all(description.as_bytes())?;
                info!(kind = %obj.type_meta().kind, "Valid");
            }

            Self::Schema { kind } => {
                let schema = schema(kind)?;
                io::stdout().write_all(schema.as_bytes())?;
            }
        }

        Ok(())
    }
}

/// Decodes an access object in one encoding and re-encodes it in another.
pub fn convert(bytes: &[u8], from: Encoding, to: Encoding) -> Result<Vec<u8>> {
    let obj = AccessObject::decode(bytes, from)?;
    debug!(kind = %obj.type_meta().kind, "Decoded");
    let mut out = obj.encode(to)?;
    if to == Encoding::Json {
        out.push(b'\n');
    }
    Ok(out)
}

/// Summarizes an access object, one line per resource.
pub fn describe(obj: &AccessObject) -> String {
    let mut out = String::new();
    match obj {
        AccessObject::TrafficTarget(t) => describe_traffic_target(&mut out, t),
        AccessObject::ClusterTrafficTarget(t) => describe_cluster_traffic_target(&mut out, t),
        AccessObject::TrafficTargetList(list) => {
            for t in list {
                describe_traffic_target(&mut out, t);
            }
        }
        AccessObject::ClusterTrafficTargetList(list) => {
            for t in list {
                describe_cluster_traffic_target(&mut out, t);
            }
        }
    }
    out
}

fn describe_traffic_target(out: &mut String, t: &TrafficTarget) {
    let selector = t
        .selector
        .match_labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(
        out,
        "TrafficTarget {}/{}: selector [{}], {}",
        t.namespace().unwrap_or_default(),
        t.name_any(),
        selector,
        describe_specs(&t.specs),
    );
}

fn describe_cluster_traffic_target(out: &mut String, t: &ClusterTrafficTarget) {
    let selector = t
        .selector
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(
        out,
        "ClusterTrafficTarget {}: selector [{}], {}",
        t.name_any(),
        selector,
        describe_specs(&t.specs),
    );
}

fn describe_specs(specs: &[TrafficTargetSpec]) -> String {
    if specs.is_empty() {
        return "no specs".to_string();
    }
    specs
        .iter()
        .map(|s| {
            let routes = if s.matches_all_routes() {
                "*".to_string()
            } else {
                s.matches.join(",")
            };
            format!("{} {}/{} [{}]", s.kind, s.namespace, s.name, routes)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Renders the JSON schema of a resource kind.
fn schema(kind: SchemaKind) -> Result<String> {
    let schema = match kind {
        SchemaKind::TrafficTarget => schemars::schema_for!(TrafficTarget),
        SchemaKind::ClusterTrafficTarget => schemars::schema_for!(ClusterTrafficTarget),
    };
    let mut json = serde_json::to_string_pretty(&schema)?;
    json.push('\n');
    Ok(json)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if path == Path::new("-") {
        io::stdin().read_to_end(&mut bytes)?;
    } else {
        bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    }
    debug!(path = %path.display(), bytes = bytes.len(), "Read input");
    Ok(bytes)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if path == Path::new("-") {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        return stdout.flush().map_err(Into::into);
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

// === impl SchemaKind ===

impl std::str::FromStr for SchemaKind {
    type Err = InvalidKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            TrafficTarget::KIND => Ok(Self::TrafficTarget),
            ClusterTrafficTarget::KIND => Ok(Self::ClusterTrafficTarget),
            _ => Err(InvalidKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests;
