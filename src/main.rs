//! LightLock CLI
//!
//! Entry point for the `lightlock` command-line tool, used to inspect and
//! maintain cache files outside the host engine.

use clap::{Parser, Subcommand};
use lightlock::cache::{read_snapshot_file, write_snapshot_file};
use lightlock::{CacheConfig, LayeredConfig};
use lightlock_format::{encoded_len, Header, Snapshot};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Configuration file consulted when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "lightlock.toml";

#[derive(Parser)]
#[command(name = "lightlock")]
#[command(about = "Inspect and maintain LightLock cache files", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a cache file and print its header and tier sizes
    Inspect {
        /// Cache file to read
        file: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate a cache file (exit code 0 if valid, 1 otherwise)
    Verify {
        /// Cache file to read
        file: PathBuf,
    },

    /// Rewrite a cache file with an empty dynamic tier
    ClearDynamic {
        /// Cache file to rewrite
        file: PathBuf,
    },

    /// Print the effective cache configuration
    Config {
        /// Path to config file (default: lightlock.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Override the cache file path
        #[arg(long)]
        cache_path: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file, json } => run_inspect(&file, json),
        Commands::Verify { file } => run_verify(&file),
        Commands::ClearDynamic { file } => run_clear_dynamic(&file),
        Commands::Config {
            config,
            cache_path,
            json,
        } => run_config(config, cache_path, json),
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lightlock=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_snapshot_or_exit(file: &Path) -> Snapshot {
    match read_snapshot_file(file) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_inspect(file: &Path, json_output: bool) {
    let snapshot = load_snapshot_or_exit(file);
    let header = Header::CURRENT;
    let bytes = encoded_len(snapshot.permanent.len(), snapshot.dynamic.len());

    if json_output {
        let output = serde_json::json!({
            "path": file.display().to_string(),
            "magic": format!("{:#010x}", header.magic),
            "version": header.version,
            "permanent": snapshot.permanent.len(),
            "dynamic": snapshot.dynamic.len(),
            "bytes": bytes,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("Cache file: {}", file.display());
        println!("  Magic: {:#010x}", header.magic);
        println!("  Version: {}", header.version);
        println!("  Permanent entries: {}", snapshot.permanent.len());
        println!("  Dynamic entries: {}", snapshot.dynamic.len());
        println!("  Size: {} bytes", bytes);
    }
}

fn run_verify(file: &Path) {
    if let Err(e) = read_snapshot_file(file) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run_clear_dynamic(file: &Path) {
    let mut snapshot = load_snapshot_or_exit(file);
    let dropped = snapshot.dynamic.len();
    snapshot.dynamic.clear();

    match write_snapshot_file(file, &snapshot) {
        Ok(bytes) => info!(
            path = %file.display(),
            dropped,
            permanent = snapshot.permanent.len(),
            bytes,
            "Cleared dynamic tier"
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_config(config_path: Option<PathBuf>, cache_path: Option<PathBuf>, json_output: bool) {
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let overrides = cache_path.map(|p| serde_json::json!({ "cache_path": p.display().to_string() }));

    let layered = match CacheConfig::load(Some(&path), overrides) {
        Ok(layered) => layered,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&layered) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_config(&layered);
    }
}

fn print_config(layered: &LayeredConfig) {
    let config = &layered.config;
    println!("Effective configuration:");
    println!("  Permanent capacity: {}", config.permanent_capacity);
    println!("  Dynamic capacity: {}", config.dynamic_capacity);
    println!("  Cache path: {}", config.cache_path.display());
    println!("  Persist on drop: {}", config.persist_on_drop);
    println!();
    println!("Sources (lowest precedence first):");
    for source in &layered.sources {
        match &source.path {
            Some(path) => println!("  {:?}: {}", source.origin, path.display()),
            None => println!("  {:?}", source.origin),
        }
    }
}
