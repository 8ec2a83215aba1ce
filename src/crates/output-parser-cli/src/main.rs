//! # outparse
//!
//! Command-line front-end for the output parser. Reads a model reply from a
//! file or stdin and prints the parsed result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use output_parser::config::ENV_PREFIX;
use output_parser::{
    ActionNormalizer, ConfigBuilder, ConfigOverrides, MemorySink, OutputParser, ParseError,
    ParserConfig, TaskNormalizer, TextNormalizer,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code used when the reply itself could not be parsed
const PARSE_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "outparse")]
#[command(about = "Parse language model replies into tool actions and task lists", long_about = None)]
#[command(version = output_parser::version())]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "OUTPUT_PARSER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reject replies larger than this many bytes (overrides config)
    #[arg(long, value_name = "BYTES")]
    max_input_bytes: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a tool-selection reply and print the action
    Action {
        /// Reply file ("-" or omitted for stdin)
        file: Option<PathBuf>,

        /// Also print the fields forwarded to the observability sink
        #[arg(long)]
        trace: bool,
    },

    /// Parse a task-list reply and print the tasks
    Tasks {
        /// Reply file ("-" or omitted for stdin)
        file: Option<PathBuf>,

        /// Also print the fields forwarded to the observability sink
        #[arg(long)]
        trace: bool,
    },

    /// Print the text handed to the decoder
    Normalize {
        /// Reply file ("-" or omitted for stdin)
        file: Option<PathBuf>,

        /// Which normalizer to run
        #[arg(short, long, value_enum, default_value_t = Mode::Action)]
        mode: Mode,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Action,
    Tasks,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Action { file, trace } => {
            let text = read_input(file.as_deref())?;
            let sink = MemorySink::new();
            let parser = build_parser(&config, trace, &sink);
            report(parser.parse(&text), trace.then_some(&sink))
        }
        Command::Tasks { file, trace } => {
            let text = read_input(file.as_deref())?;
            let sink = MemorySink::new();
            let parser = build_parser(&config, trace, &sink);
            report(parser.parse_tasks(&text), trace.then_some(&sink))
        }
        Command::Normalize { file, mode } => {
            let text = read_input(file.as_deref())?;
            let normalized = match mode {
                Mode::Action => ActionNormalizer.normalize(&text),
                Mode::Tasks => TaskNormalizer.normalize(&text),
            };
            println!("{}", normalized);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, then `OUTPUT_PARSER_*` variables, then the config file, then flags
fn load_config(cli: &Cli) -> Result<ParserConfig> {
    let mut config = ParserConfig::from_env_with_defaults(ENV_PREFIX)
        .context("Invalid environment configuration")?;

    if let Some(path) = &cli.config {
        ConfigOverrides::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
            .apply(&mut config);
    }

    let flags = ConfigOverrides {
        max_input_bytes: cli.max_input_bytes,
        ..ConfigOverrides::default()
    };
    flags.apply(&mut config);

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_parser(config: &ParserConfig, trace: bool, sink: &MemorySink) -> OutputParser {
    let parser = OutputParser::with_config(config.clone());
    if trace {
        parser.with_sink(sink.clone())
    } else {
        parser
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Print a result or parse error as JSON and pick the exit code
fn report<T: Serialize>(
    result: std::result::Result<T, ParseError>,
    trace: Option<&MemorySink>,
) -> Result<ExitCode> {
    let (mut output, code) = match result {
        Ok(value) => (
            serde_json::to_value(value).context("Failed to render output")?,
            ExitCode::SUCCESS,
        ),
        Err(err) => (
            json!({
                "error": {
                    "kind": err.kind(),
                    "message": err.to_string(),
                }
            }),
            ExitCode::from(PARSE_FAILURE),
        ),
    };

    if let (Some(sink), Value::Object(map)) = (trace, &mut output) {
        let entries = sink
            .entries()
            .into_iter()
            .map(|(field, value)| json!({"field": field, "value": value}))
            .collect();
        map.insert("trace".to_string(), Value::Array(entries));
    }

    let rendered = serde_json::to_string_pretty(&output).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(code)
}
