//! Adapterhub CLI Entry Point
//!
//! Two diagnostic subcommands:
//! - `debug` - Validate a credentials profile and optionally open/close a connection
//! - `plugins` - Register built-in adapters and print their load order
//!
//! All output to stdout is JSON-only. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{debug, info};

use adapterhub::{
    apply_overrides, builtin_adapter, AdapterError, AdapterRegistry, AdapterTyped, Connection,
    CredentialsKind, ErrorEnvelope, InvocationContext, Metadata, StoredCredentials,
    SuccessEnvelope,
};

/// Adapterhub - database adapter registry and connection diagnostics
#[derive(Parser)]
#[command(name = "adapterhub")]
#[command(about = "Validate adapter credentials and resolve adapter plugin load order")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate credentials and print their display-safe projection
    Debug {
        /// Adapter type (postgres, mysql, sqlite)
        #[arg(long = "type")]
        adapter: String,

        /// JSON profile holding the credential fields
        #[arg(long)]
        profile: PathBuf,

        /// Override a field (key=value), may be repeated
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Open and close a connection through the built-in adapter
        #[arg(long)]
        open: bool,
    },

    /// Register built-in adapters and print the resolved load order
    Plugins {
        /// Plugin as name=include_path[:dep,dep], may be repeated
        #[arg(long = "include", value_name = "PLUGIN", required = true)]
        includes: Vec<String>,
    },
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Debug { .. } => "debug",
            Self::Plugins { .. } => "plugins",
        }
    }

    fn adapter(&self) -> &str {
        match self {
            Self::Debug { adapter, .. } => adapter.as_str(),
            Self::Plugins { .. } => "",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    adapterhub::logging::init_logging(cli.verbose, cli.quiet)?;

    let command = cli.command.name();
    let adapter = cli.command.adapter().to_string();
    let invocation = InvocationContext::start(command, None);
    debug!(invocation = ?invocation, "invocation started");

    let started = Instant::now();
    let result = match cli.command {
        Commands::Debug { adapter, profile, overrides, open } => {
            run_debug(&adapter, &profile, &overrides, open).await
        }
        Commands::Plugins { includes } => run_plugins(&includes),
    };
    let execution_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(data) => {
            let envelope = SuccessEnvelope::new(
                adapter,
                command,
                data,
                Metadata::for_invocation(&invocation, execution_ms),
            );
            println!("{}", serde_json::to_string(&envelope).context("Failed to serialize output")?);
            debug!(invocation = ?invocation.end("ok"), "invocation finished");
            Ok(())
        }
        Err(err) => {
            let envelope = ErrorEnvelope::from_error(adapter, command, &err);
            println!("{}", serde_json::to_string(&envelope).context("Failed to serialize output")?);
            debug!(invocation = ?invocation.invalid(err.error_code()), "invocation failed");
            std::process::exit(1);
        }
    }
}

async fn run_debug(
    adapter: &str,
    profile: &std::path::Path,
    overrides: &[String],
    open: bool,
) -> adapterhub::Result<Value> {
    let kind: CredentialsKind = adapter.parse()?;

    let stored: StoredCredentials = serde_json::from_value(Value::Object(
        adapterhub::load_raw_config(profile)?,
    ))
    .map_err(|e| AdapterError::config(format!("Invalid profile {}: {e}", profile.display())))?;
    let raw = apply_overrides(stored.resolve()?, overrides)?;

    let credentials = kind.from_raw_config(&raw)?;
    let connection_info: Vec<Value> = credentials
        .connection_info()?
        .into_iter()
        .map(|(key, value)| json!([key, value]))
        .collect();

    let mut data = json!({
        "type": credentials.adapter_type(),
        "connection_info": connection_info,
    });

    if open {
        let engine = builtin_adapter(kind).ok_or_else(|| {
            AdapterError::invalid_input(format!("The {kind} engine is not compiled into this build"))
        })?;

        let mut connection = Connection::new(kind.as_str(), Some("debug".to_string()), credentials)?;
        connection.open(engine).await?;
        info!(adapter = %kind, "connection test succeeded");
        connection.close().await?;

        data["connection"] = serde_json::to_value(&connection)
            .map_err(|e| AdapterError::invalid_input(format!("Failed to serialize connection: {e}")))?;
    }

    Ok(data)
}

fn run_plugins(includes: &[String]) -> adapterhub::Result<Value> {
    let mut registry = AdapterRegistry::new();

    for include in includes {
        let (name, path, deps) = parse_include(include)?;
        let kind: CredentialsKind = name.parse()?;
        let engine = builtin_adapter(kind).ok_or_else(|| {
            AdapterError::invalid_input(format!("The {kind} engine is not compiled into this build"))
        })?;
        registry.register(name, engine, kind, path, &deps)?;
    }

    let registry: Arc<AdapterRegistry> = registry.finish()?;
    let load_order = registry.resolve_load_order()?;

    let plugins = load_order
        .iter()
        .map(|name| {
            registry.get(name).map(|plugin| {
                json!({
                    "name": plugin.name(),
                    "project_name": plugin.project_name(),
                    "include_path": plugin.include_path(),
                    "dependencies": plugin.dependencies().collect::<Vec<_>>(),
                })
            })
        })
        .collect::<adapterhub::Result<Vec<_>>>()?;

    Ok(json!({ "load_order": load_order, "plugins": plugins }))
}

/// Split `name=path[:dep,dep]`
fn parse_include(include: &str) -> adapterhub::Result<(&str, &str, Vec<&str>)> {
    let (name, rest) = include.split_once('=').ok_or_else(|| {
        AdapterError::invalid_input(format!("Include '{include}' must have the form name=path[:dep,dep]"))
    })?;

    let (path, deps) = match rest.split_once(':') {
        Some((path, deps)) => (path, deps.split(',').map(str::trim).filter(|d| !d.is_empty()).collect()),
        None => (rest, Vec::new()),
    };

    if path.is_empty() {
        return Err(AdapterError::invalid_input(format!("Include '{include}' has an empty path")));
    }

    Ok((name.trim(), path, deps))
}
