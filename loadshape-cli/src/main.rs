//! Loadshape CLI — inspect, validate, and preview rate distributions.
//!
//! Commands:
//! - `list` — registered strategies and presets
//! - `describe` — metadata and parameter schema of one strategy
//! - `validate` — check a run config and report every problem in its spec tree
//! - `preview` — resolve a run config and sample its rate curve

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use loadshape_core::curve::RateCurve;
use loadshape_core::validation::validate_spec;
use loadshape_core::{registry, EngineConfig, Resolver, RunConfig};

#[derive(Parser)]
#[command(
    name = "loadshape",
    about = "Loadshape CLI — rate distributions for load generation"
)]
struct Cli {
    /// Nesting ceiling for composite distributions (overrides LOADSHAPE_MAX_DEPTH).
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered strategies and presets.
    List,
    /// Show the metadata and parameter schema of a strategy.
    Describe {
        /// Strategy name (e.g., sine, mix).
        name: String,

        /// Print as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate a run config (TOML or JSON) without running it.
    Validate {
        /// Path to the run config file.
        #[arg(long)]
        config: PathBuf,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Resolve a run config and sample its rate curve.
    Preview {
        /// Path to the run config file.
        #[arg(long)]
        config: PathBuf,

        /// Sampling step in seconds.
        #[arg(long, default_value_t = 1.0)]
        step: f64,

        /// Print the sampled points as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut engine = EngineConfig::from_env()?;
    if let Some(max_depth) = cli.max_depth {
        engine.max_depth = max_depth;
    }

    match cli.command {
        Commands::List => run_list(),
        Commands::Describe { name, json } => run_describe(&name, json),
        Commands::Validate { config, json } => run_validate(&config, engine, json),
        Commands::Preview { config, step, json } => run_preview(&config, engine, step, json),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_list() -> Result<()> {
    let registry = registry::global();
    println!("Strategies:");
    for name in registry.list_all() {
        let metadata = registry.metadata(&name)?;
        println!("  {:<10} {}", name, metadata.description);
    }
    let presets = registry.list_presets();
    if !presets.is_empty() {
        println!();
        println!("Presets:");
        for name in presets {
            if let Some(spec) = registry.preset(&name) {
                println!("  {:<10} -> {}", name, spec.name);
            }
        }
    }
    Ok(())
}

fn run_describe(name: &str, json: bool) -> Result<()> {
    let metadata = registry::global()
        .metadata(name)
        .with_context(|| format!("describe '{name}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("{} v{} ({})", metadata.name, metadata.version, metadata.author);
    println!("{}", metadata.description);
    if metadata.parameters.is_empty() {
        return Ok(());
    }
    println!();
    println!("Parameters:");
    for (param, spec) in &metadata.parameters {
        let default = match (&spec.default, spec.required) {
            (_, true) => "required".to_string(),
            (Some(value), false) => format!("default {value}"),
            (None, false) => "optional".to_string(),
        };
        println!(
            "  {:<16} {:<6} {:<16} {}",
            param,
            spec.param_type.as_str(),
            default,
            spec.description
        );
    }
    Ok(())
}

fn load(path: &Path) -> Result<RunConfig> {
    RunConfig::from_file(path).with_context(|| format!("load run config {}", path.display()))
}

fn run_validate(path: &Path, engine: EngineConfig, json: bool) -> Result<()> {
    let run = load(path)?;
    let engine = run.engine(engine);
    let resolver = Resolver::with_config(registry::global(), &engine);
    let report = validate_spec(&resolver, &run.distribution);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_valid() {
        println!(
            "OK: {} ({})",
            run.distribution.name,
            run.distribution.fingerprint().short()
        );
    } else {
        for error in &report.errors {
            println!("ERROR: {error}");
        }
    }

    if !report.is_valid() {
        bail!("{} validation error(s)", report.errors.len());
    }
    Ok(())
}

fn run_preview(path: &Path, engine: EngineConfig, step: f64, json: bool) -> Result<()> {
    if !step.is_finite() || step <= 0.0 {
        bail!("--step must be > 0, got {step}");
    }
    let run = load(path)?;
    let engine = run.engine(engine);
    let distribution = Resolver::with_config(registry::global(), &engine)
        .resolve(&run.distribution)
        .context("resolve distribution")?;

    let curve = RateCurve::sample(
        distribution.as_ref(),
        run.target_rps,
        run.duration_seconds,
        step,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&curve)?);
        return Ok(());
    }

    println!("{:>10}  {:>12}", "time_s", "rate_rps");
    for point in &curve.points {
        println!("{:>10.2}  {:>12.3}", point.time, point.rate);
    }
    println!();
    println!("=== Preview ===");
    println!("Distribution:   {}", run.distribution.name);
    println!("Fingerprint:    {}", run.distribution.fingerprint().short());
    println!("Target RPS:     {:.3}", run.target_rps);
    println!("Duration:       {:.1}s", run.duration_seconds);
    println!("Peak RPS:       {:.3}", curve.peak());
    println!("Mean RPS:       {:.3}", curve.mean());
    println!("Expected Reqs:  {:.0}", curve.expected_requests());
    Ok(())
}
