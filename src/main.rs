//! Dirarc CLI
//!
//! Entry point for the `dirarc` command-line tool. Only the
//! configuration inspection commands live here; archive commands are
//! wired in separately.

use clap::{Parser, Subcommand};
use dirarc::config::ConfigLoader;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "dirarc")]
#[command(about = "Directory archiving and backup tool", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the resolved configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show every resolved value
    Show {
        /// Path to the root configuration document
        #[arg(long, short = 'c', default_value = ".dirarc.yml")]
        config: PathBuf,

        /// Include the source chain for each value
        #[arg(long)]
        sources: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show one resolved value with its source chain
    Get {
        /// Key to look up
        key: String,

        /// Path to the root configuration document
        #[arg(long, short = 'c', default_value = ".dirarc.yml")]
        config: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigCommands::Show {
                config,
                sources,
                json,
            } => {
                run_config_show(config, sources, json);
            }
            ConfigCommands::Get { key, config, json } => {
                run_config_get(key, config, json);
            }
        },
    }
}

fn run_config_show(config: PathBuf, sources: bool, json: bool) {
    let loader = ConfigLoader::new();
    let resolved = match loader.load(&config) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if json {
        match resolved.to_json() {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("Error: failed to serialize configuration: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    for (key, value) in &resolved.values {
        println!("{} = {}", key, value);
        if sources {
            if let Some(origin) = resolved.origin(key) {
                for entry in &origin.entries {
                    println!("    {} ({})", entry.document.display(), entry.strategy);
                }
            }
        }
    }

    if sources && !resolved.sources.is_empty() {
        println!();
        println!("Documents (merge order):");
        for source in &resolved.sources {
            println!("    {} sha256:{}", source.path.display(), &source.digest[..12]);
        }
    }
}

fn run_config_get(key: String, config: PathBuf, json: bool) {
    let loader = ConfigLoader::new();
    match loader.value_with_source(&config, &key) {
        Ok(Some((value, origin))) => {
            if json {
                let output = serde_json::json!({
                    "key": key,
                    "value": value,
                    "origin": origin,
                });
                match serde_json::to_string_pretty(&output) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error: failed to serialize value: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                println!("{} = {}", key, value);
                for (index, entry) in origin.entries.iter().enumerate() {
                    println!(
                        "  {}. {} ({})",
                        index + 1,
                        entry.document.display(),
                        entry.strategy
                    );
                }
                println!("  chain depth: {}", origin.chain_depth);
            }
        }
        Ok(None) => {
            eprintln!("Key '{}' is not set in the resolved configuration", key);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
