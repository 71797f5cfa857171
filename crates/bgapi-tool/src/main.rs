use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bgapi_codec::{CodecConfig, Direction, MessageValue};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::Catalogs;
use error::ToolResult;

#[derive(Parser)]
#[command(name = "bgapi-tool")]
#[command(author, version, about = "Encode and decode BGAPI messages", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Codec configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a command and print its bytes as hex
    Encode {
        /// Message name, e.g. gap_connect_direct
        kind: String,

        /// Field assignments as name=value
        fields: Vec<String>,
    },

    /// Decode hex bytes into messages
    Decode {
        /// Message bytes as hex; spaces and colons are ignored
        hex: String,

        /// Catalog to decode against
        #[arg(short, long, value_enum, default_value = "response")]
        direction: DirectionArg,
    },

    /// List the known message kinds
    Kinds {
        /// Catalog to list
        #[arg(short, long, value_enum, default_value = "command")]
        direction: DirectionArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DirectionArg {
    Command,
    Response,
    Event,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Command => Direction::Command,
            DirectionArg::Response => Direction::Response,
            DirectionArg::Event => Direction::Event,
        }
    }
}

/// JSON output of `encode`.
#[derive(Serialize)]
struct Encoded<'a> {
    message: &'a MessageValue,
    bytes: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> ToolResult<()> {
    let (config, catalogs) = match &cli.config {
        Some(path) => {
            let config = commands::load_config(path)?;
            let base = path.parent().unwrap_or(Path::new("."));
            let catalogs = Catalogs::from_config(&config, base)?;
            tracing::debug!("using config {}", path.display());
            (config, catalogs)
        }
        None => (CodecConfig::default(), Catalogs::builtin()),
    };

    match &cli.command {
        Commands::Encode { kind, fields } => {
            let (message, bytes) =
                commands::encode(catalogs.get(Direction::Command), kind, fields)?;
            if cli.json {
                let out = Encoded {
                    message: &message,
                    bytes: hex::encode(&bytes),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", message);
                println!("{}", hex::encode(&bytes));
            }
        }
        Commands::Decode { hex, direction } => {
            let data = commands::parse_hex(hex)?;
            let messages = commands::decode(catalogs.get((*direction).into()), &config, &data)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&messages)?);
            } else {
                for message in &messages {
                    println!("{}", message);
                }
            }
        }
        Commands::Kinds { direction } => {
            let listing = commands::kinds(catalogs.get((*direction).into()));
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for kind in &listing {
                    println!("0x{:02X}/0x{:02X} {}", kind.class, kind.method, kind.name);
                    for field in &kind.fields {
                        println!("    {}: {} [{}]", field.name, field.wire, field.constraint);
                    }
                }
            }
        }
    }
    Ok(())
}
