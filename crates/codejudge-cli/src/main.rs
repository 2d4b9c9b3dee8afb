//! codejudge CLI
//!
//! A command-line tool for running code snippets against JSON inputs and
//! judging them against expected outputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codejudge::{Config, EXAMPLE_CONFIG, ResourceLimits, Runner, TestCase};
use serde_json::Value;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codejudge")]
#[command(about = "A tool for judging untrusted code against test cases")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: codejudge.toml)
        #[arg(short, long, default_value = "codejudge.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a snippet once and print its outcome
    Run {
        /// File holding the function body
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., python3, cpp17)
        #[arg(short, long)]
        language: String,

        /// Input as inline JSON (default: {})
        #[arg(short, long, conflicts_with = "input_file")]
        input: Option<String>,

        /// Read the JSON input from a file
        #[arg(long, value_name = "PATH")]
        input_file: Option<PathBuf>,

        /// CPU time limit in seconds
        #[arg(short, long)]
        time_limit: Option<f64>,

        /// Memory limit in KB
        #[arg(short, long)]
        memory_limit: Option<u64>,
    },

    /// Run a snippet against a JSON array of test cases
    Judge {
        /// File holding the function body
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., python3, cpp17)
        #[arg(short, long)]
        language: String,

        /// JSON file with [{"input": ..., "expected": ...}, ...]
        #[arg(long, value_name = "PATH")]
        tests: PathBuf,

        /// CPU time limit in seconds
        #[arg(short, long)]
        time_limit: Option<f64>,

        /// Memory limit in KB
        #[arg(short, long)]
        memory_limit: Option<u64>,
    },

    /// List available languages
    Languages,

    /// Show default configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    // stdout carries JSON only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            source,
            language,
            input,
            input_file,
            time_limit,
            memory_limit,
        } => {
            apply_limit_flags(&mut config, time_limit, memory_limit);
            let input = read_input(input.as_deref(), input_file.as_deref()).await?;
            run_once(config, &source, &language, &input).await
        }
        Commands::Judge {
            source,
            language,
            tests,
            time_limit,
            memory_limit,
        } => {
            apply_limit_flags(&mut config, time_limit, memory_limit);
            run_judge(config, &source, &language, &tests).await
        }
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

/// Override the run-phase limits with explicitly given flags only
fn apply_limit_flags(config: &mut Config, time_limit: Option<f64>, memory_limit: Option<u64>) {
    let user_limits = ResourceLimits {
        time_limit,
        memory_limit,
        ..ResourceLimits::unlimited()
    };
    config.default_limits = config.default_limits.with_overrides(&user_limits);
}

async fn read_input(inline: Option<&str>, file: Option<&Path>) -> Result<Value> {
    let text = match (inline, file) {
        (Some(text), _) => text.to_owned(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .context("failed to read input file")?,
        (None, None) => return Ok(Value::Object(serde_json::Map::new())),
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

async fn read_code(source: &Path) -> Result<String> {
    tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")
}

async fn run_once(config: Config, source: &Path, language_id: &str, input: &Value) -> Result<()> {
    let code = read_code(source).await?;
    let runner = Runner::new(config);

    info!(language = language_id, "running program");
    let outcome = runner.execute(&code, language_id, input).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("failed to encode outcome")?
    );

    if outcome.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

async fn run_judge(config: Config, source: &Path, language_id: &str, tests: &Path) -> Result<()> {
    let code = read_code(source).await?;
    let cases_json = tokio::fs::read_to_string(tests)
        .await
        .context("failed to read test cases")?;
    let cases: Vec<TestCase> =
        serde_json::from_str(&cases_json).context("failed to parse test cases")?;

    let runner = Runner::new(config);

    info!(language = language_id, cases = cases.len(), "judging");
    let reports = runner.judge(&code, language_id, &cases).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&reports).context("failed to encode reports")?
    );

    let passed = reports.iter().filter(|r| r.verdict.is_passed()).count();
    info!(passed, total = reports.len(), "judging complete");

    if passed == reports.len() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    for id in config.language_ids() {
        let Ok(lang) = config.get_language(id) else {
            continue;
        };
        let lang_type = if lang.is_compiled() {
            "compiled"
        } else {
            "interpreted"
        };
        if lang.aliases.is_empty() {
            println!("  {:<15} {} ({})", id, lang.name, lang_type);
        } else {
            println!(
                "  {:<15} {} ({}, also: {})",
                id,
                lang.name,
                lang_type,
                lang.aliases.join(", ")
            );
        }
    }
}

fn show_config(config: &Config) {
    print_limits("Default resource limits", &config.default_limits);
    println!();
    print_limits("Compile resource limits", &config.compile_limits);
    println!();
    match config.workspace_root {
        Some(ref root) => println!("Workspace root: {}", root.display()),
        None => println!("Workspace root: {}", std::env::temp_dir().display()),
    }
    println!();
    println!("Languages configured: {}", config.languages.len());
}

fn print_limits(title: &str, limits: &ResourceLimits) {
    println!("{title}:");
    println!("  Time limit: {:?}", limits.time_limit);
    println!("  Wall time limit: {:?}", limits.wall_time_limit);
    println!("  Memory limit: {:?} KB", limits.memory_limit);
    println!("  Max open files: {:?}", limits.max_open_files);
    println!("  Max output: {:?} KB", limits.max_output);
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
