//! promisify-dts CLI - rewrites callback-style declarations into promise-returning ones

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output
// - Nothing is written unless the whole run succeeded

use anyhow::Context;
use clap::{Parser, Subcommand};
use promisify_core::config::{self, ResolvedConfig};
use promisify_core::output::write_all;
use promisify_core::{render_json, render_text, transform_path_with_config, RunOutput};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "promisify-dts")]
#[command(about = "Rewrite callback-style TypeScript declarations into promise-returning ones")]
#[command(version = env!("PROMISIFY_VERSION"))]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform declaration files and write the rewritten tree plus the runtime binder
    Transform {
        /// Path to a declaration file or a directory of them
        path: PathBuf,

        /// Directory the artifacts are written to
        #[arg(long, default_value = "promisified")]
        out_dir: PathBuf,

        /// Output format for the run report
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run the full transformation without writing anything
    Check {
        /// Path to a declaration file or a directory of them
        path: PathBuf,

        /// Output format for the run report
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or inspect a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running a transformation
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Transform {
            path,
            out_dir,
            format,
            config: config_path,
        } => {
            let run = run_transform(&path, config_path.as_deref())?;
            let written = write_all(&out_dir, &run.artifacts)
                .with_context(|| format!("failed to write output to {}", out_dir.display()))?;
            for file in &written {
                debug!("wrote {}", file.display());
            }
            print_report(&run, format);
            eprintln!(
                "Wrote {} file(s) to {}",
                written.len(),
                out_dir.display()
            );
        }
        Commands::Check {
            path,
            format,
            config: config_path,
        } => {
            let run = run_transform(&path, config_path.as_deref())?;
            print_report(&run, format);
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Load configuration for `path` and run the transformation
fn run_transform(
    path: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<RunOutput> {
    // Normalize path to absolute
    let normalized_path = if path.is_relative() {
        std::env::current_dir()?.join(path)
    } else {
        path.to_path_buf()
    };

    if !normalized_path.exists() {
        anyhow::bail!("Path does not exist: {}", normalized_path.display());
    }

    let project_root = if normalized_path.is_dir() {
        normalized_path.clone()
    } else {
        normalized_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| normalized_path.clone())
    };
    let resolved_config = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;

    if let Some(config_path) = &resolved_config.config_path {
        eprintln!("Using config: {}", config_path.display());
    }

    transform_path_with_config(&normalized_path, &resolved_config)
}

fn print_report(run: &RunOutput, format: OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", render_text(&run.report)),
        OutputFormat::Json => println!("{}", render_json(&run.report)),
    }
}

fn print_config(resolved: &ResolvedConfig) {
    let transform = &resolved.transform;
    let binder = &resolved.binder;

    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Transform:");
    println!(
        "  callback_param_names: {}",
        transform.callback_param_names.join(", ")
    );
    println!("  wrapper_type: {}", transform.wrapper_type);
    println!("  deferred_type: {}", transform.deferred_type);
    println!("  alias_suffix: {}", transform.alias_suffix);
    println!(
        "  root_namespace: {}",
        if transform.root_namespace.is_empty() {
            "(none)"
        } else {
            transform.root_namespace.as_str()
        }
    );
    println!("  strip_const_enums: {}", transform.strip_const_enums);
    println!("  verify_output: {}", resolved.verify_output);
    if transform.read_only_functions.is_empty() {
        println!("  read_only_functions: none");
    } else {
        println!("  read_only_functions:");
        for name in &transform.read_only_functions {
            println!("    {}", name);
        }
    }
    println!();
    println!("Binder:");
    println!("  global_binding: {}", binder.global_binding);
    println!("  success_field: {}", binder.success_field);
    println!("  error_field: {}", binder.error_field);
    println!("  fallback_error_message: {}", binder.fallback_error_message);
    println!(
        "  files: {}, {}",
        binder.file_name,
        binder.declaration_file_name()
    );
    println!();
    println!("Filters:");
    println!(
        "  include: {}",
        if resolved.include.is_some() {
            "custom patterns"
        } else {
            "all .d.ts files"
        }
    );
    println!(
        "  exclude: {} ({})",
        resolved.exclude_patterns.join(", "),
        if resolved.uses_default_excludes() {
            "default"
        } else {
            "custom"
        }
    );
}
