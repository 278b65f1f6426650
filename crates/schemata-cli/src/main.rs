//! Schemata CLI - offline schema tooling for evolution gating

use clap::Parser;
use schemata_core::format::canonicalize;
use schemata_core::policy::{self, HistoricalVersion};
use schemata_model::{CompatibilityLevel, SchemaFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schemata")]
#[command(about = "Schemata - schema parsing, fingerprints and compatibility checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Parse a schema file and report whether it is valid
    Parse {
        /// Schema file to parse
        file: PathBuf,
        /// Schema type: AVRO, JSON or PROTOBUF
        #[arg(short = 't', long = "type", default_value = "AVRO")]
        schema_type: String,
    },
    /// Print the canonical form of a schema file
    Canonicalize {
        file: PathBuf,
        #[arg(short = 't', long = "type", default_value = "AVRO")]
        schema_type: String,
    },
    /// Print the content fingerprint of a schema file
    Fingerprint {
        file: PathBuf,
        #[arg(short = 't', long = "type", default_value = "AVRO")]
        schema_type: String,
    },
    /// Check a proposed schema against an existing one
    Check {
        /// The proposed (new) schema file
        proposed: PathBuf,
        /// The existing (old) schema file
        existing: PathBuf,
        #[arg(short = 't', long = "type", default_value = "AVRO")]
        schema_type: String,
        /// Compatibility level to apply
        #[arg(short, long, default_value = "BACKWARD")]
        level: String,
        /// Print one message per incompatible decision point
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Commands::Parse { file, schema_type } => {
            let format = parse_format(&schema_type)?;
            let text = std::fs::read_to_string(&file)?;
            canonicalize(format, &text, &[], &[])?;
            println!("{}: valid {format} schema", file.display());
        }
        Commands::Canonicalize { file, schema_type } => {
            let format = parse_format(&schema_type)?;
            let text = std::fs::read_to_string(&file)?;
            let (_, canonical, _) = canonicalize(format, &text, &[], &[])?;
            println!("{canonical}");
        }
        Commands::Fingerprint { file, schema_type } => {
            let format = parse_format(&schema_type)?;
            let text = std::fs::read_to_string(&file)?;
            let (_, _, fingerprint) = canonicalize(format, &text, &[], &[])?;
            println!("{fingerprint}");
        }
        Commands::Check {
            proposed,
            existing,
            schema_type,
            level,
            verbose,
        } => {
            let format = parse_format(&schema_type)?;
            let level: CompatibilityLevel = level.parse()?;
            let proposed_text = std::fs::read_to_string(&proposed)?;
            let existing_text = std::fs::read_to_string(&existing)?;
            let (candidate, _, _) = canonicalize(format, &proposed_text, &[], &[])?;
            let (old, _, _) = canonicalize(format, &existing_text, &[], &[])?;

            let history = vec![HistoricalVersion {
                version: 1,
                schema: old,
            }];
            let verdict = policy::evaluate(level, &candidate, &history);
            if verdict.is_compatible() {
                println!("COMPATIBLE ({level})");
            } else {
                println!("INCOMPATIBLE ({level})");
                if verbose {
                    for message in verdict.messages() {
                        println!("  - {message}");
                    }
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn parse_format(name: &str) -> anyhow::Result<SchemaFormat> {
    Ok(name.to_uppercase().parse::<SchemaFormat>()?)
}
