//! wmiquery CLI.
//!
//! # Commands
//! ```text
//! wmiquery decode-json --class <Class> --file <response.json> [--mode last|collect|throw]
//! wmiquery query       --class <Class> [--where "<clause>"]
//! wmiquery classes
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use wmiquery_core::{
    classes::{Win32PerfRawDataPerfOsProcessor, Win32PerfRawDataTcpipNetworkInterface, Win32Process},
    create_query, Loader, MismatchMode, QueryError, Record,
};
use wmiquery_observability::{init_tracing, LogFormat, OtelDecodeMetrics};

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(
    name = "wmiquery",
    about = "Decode WMI query responses into typed records",
    version
)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// YAML settings file (log levels, default mismatch mode)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a captured JSON response into one of the bundled classes
    #[command(name = "decode-json")]
    DecodeJson {
        #[arg(long, value_enum)]
        class: Class,
        /// Response document, optionally with a 4-byte length prefix
        #[arg(long)]
        file: PathBuf,
        /// How field mismatches are reported (overrides the config file)
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },

    /// Print the projection query for a bundled class
    Query {
        #[arg(long, value_enum)]
        class: Class,
        /// Appended after the class name, e.g. "WHERE ProcessId = 4"
        #[arg(long = "where")]
        where_clause: Option<String>,
    },

    /// List the bundled classes
    Classes,
}

#[derive(Clone, Copy, ValueEnum)]
enum Class {
    #[value(name = "Win32_Process")]
    Process,
    #[value(name = "Win32_PerfRawData_PerfOS_Processor")]
    Processor,
    #[value(name = "Win32_PerfRawData_Tcpip_NetworkInterface")]
    NetworkInterface,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Last,
    Collect,
    Throw,
}

impl From<Mode> for MismatchMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Last => MismatchMode::Last,
            Mode::Collect => MismatchMode::Collect,
            Mode::Throw => MismatchMode::Throw,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if cli.verbose {
        cfg.log.level = "debug".into();
    }
    if cli.log_json {
        cfg.log.format = LogFormat::Json;
    }
    // A subscriber may already be installed by an embedding process.
    let _ = init_tracing(&cfg.log);

    match cli.command {
        Commands::DecodeJson { class, file, mode } => {
            let mode = mode.map(MismatchMode::from).unwrap_or(cfg.mismatch_mode);
            let data = std::fs::read(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let loader = Loader::new()
                .mode(mode)
                .metrics(Arc::new(OtelDecodeMetrics::global()));
            match class {
                Class::Process => cmd_decode_json::<Win32Process>(&loader, &data),
                Class::Processor => cmd_decode_json::<Win32PerfRawDataPerfOsProcessor>(&loader, &data),
                Class::NetworkInterface => {
                    cmd_decode_json::<Win32PerfRawDataTcpipNetworkInterface>(&loader, &data)
                }
            }
        }

        Commands::Query { class, where_clause } => {
            let clause = where_clause
                .map(|w| format!(" {}", w.trim()))
                .unwrap_or_default();
            let query = match class {
                Class::Process => create_query::<Win32Process>(&clause),
                Class::Processor => create_query::<Win32PerfRawDataPerfOsProcessor>(&clause),
                Class::NetworkInterface => create_query::<Win32PerfRawDataTcpipNetworkInterface>(&clause),
            };
            println!("{query}");
            Ok(())
        }

        Commands::Classes => {
            cmd_classes::<Win32Process>();
            cmd_classes::<Win32PerfRawDataPerfOsProcessor>();
            cmd_classes::<Win32PerfRawDataTcpipNetworkInterface>();
            Ok(())
        }
    }
}

// ─── Command implementations ─────────────────────────────────────────────────

/// Print decoded records as a JSON array. Field mismatches are reported on
/// stderr and do not fail the command.
fn cmd_decode_json<R: Record + Serialize>(loader: &Loader, data: &[u8]) -> Result<()> {
    let mut records: Vec<R> = Vec::new();
    match loader.load_json::<R>(data, &mut records) {
        Ok(()) => {}
        Err(QueryError::FieldMismatches(all)) => {
            for m in &all {
                eprintln!("warning: {m}");
            }
        }
        Err(e) if e.is_field_mismatch() => eprintln!("warning: {e}"),
        Err(e) => return Err(e).context(format!("decoding {}", R::layout().name())),
    }
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn cmd_classes<R: Record>() {
    let layout = R::layout();
    let optional = layout.fields().iter().filter(|f| f.optional).count();
    println!(
        "{:<42} {:>3} properties ({optional} nullable)",
        layout.name(),
        layout.fields().len()
    );
}
