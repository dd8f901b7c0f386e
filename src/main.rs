//! pxf - Pixel Formula Evaluator
//!
//! Evaluates one formula against up to four arguments, dispatching its
//! function calls through a plugin library.
//!
//! ```text
//! LIB=libpixcall_kernel.so pxf "toon(x1, 4)" 0.73
//! f(0.73+0i) = 0.75+0i
//! |f| = 0.75
//! ```
//!
//! Arguments not given are zero. A CSV line with `re,im,|z|` for each given
//! argument and the result is written to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use num_complex::Complex64;
use pixcall::config::parse_capacity;
use pixcall::{Domain, Formula, Numeric, PixcallConfig, Registry, MAX_ARITY};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "pxf")]
#[command(version)]
#[command(about = "Evaluate a pixel formula through a plugin function library", long_about = None)]
struct Cli {
    /// Function library (falls back to $LIB, then pixcall.toml)
    #[arg(long, value_name = "PATH")]
    lib: Option<PathBuf>,

    /// Cached names per arity (falls back to $NF, then pixcall.toml)
    #[arg(long, value_parser = capacity_arg)]
    capacity: Option<usize>,

    /// Numeric domain (falls back to pixcall.toml, then complex)
    #[arg(long, value_enum)]
    domain: Option<DomainArg>,

    /// Configuration file (default: pixcall.toml in this or a parent directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Formula over x1..x4, e.g. "toon(x1, 4) * 0.5"
    formula: String,

    /// Arguments bound to x1..x4, each a constant formula ("0.73", "_1", "2^0.5")
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DomainArg {
    Real,
    Complex,
}

impl From<DomainArg> for Domain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Real => Domain::Real,
            DomainArg::Complex => Domain::Complex,
        }
    }
}

fn capacity_arg(value: &str) -> Result<usize, String> {
    parse_capacity(value).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    if cli.args.len() > MAX_ARITY {
        bail!(
            "at most {} arguments are supported, got {}",
            MAX_ARITY,
            cli.args.len()
        );
    }

    let config = load_config(&cli)?;
    let domain = cli.domain.map(Domain::from).unwrap_or(config.formula.domain);

    match domain {
        Domain::Real => run::<f64>(&cli, &config),
        Domain::Complex => run::<Complex64>(&cli, &config),
    }
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file, then `LIB` / `NF`, then command-line flags.
fn load_config(cli: &Cli) -> Result<PixcallConfig> {
    let mut config = match &cli.config {
        Some(path) => PixcallConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PixcallConfig::load_from_cwd().context("Failed to load pixcall.toml")?,
    };

    config
        .apply_env()
        .context("Invalid LIB/NF environment settings")?;

    if let Some(lib) = &cli.lib {
        config.library.path = Some(lib.clone());
    }
    if let Some(capacity) = cli.capacity {
        config.library.capacity = capacity;
    }

    debug!(?config, "configuration loaded");
    Ok(config)
}

fn run<T: Numeric>(cli: &Cli, config: &PixcallConfig) -> Result<()> {
    let formula = Formula::parse(&cli.formula)
        .with_context(|| format!("Failed to parse formula: {}", cli.formula))?;

    let mut registry: Registry<T> = Registry::new();
    if let Some(path) = config.library.resolve_path() {
        registry
            .open(&path, config.library.capacity)
            .with_context(|| format!("Failed to open function library: {}", path.display()))?;
    }

    // Arguments not given on the command line are bound to zero
    let mut args = [T::zero(); MAX_ARITY];
    for (slot, text) in args.iter_mut().zip(&cli.args) {
        *slot = Formula::parse(text)
            .and_then(|arg| arg.eval(&mut registry, &[]))
            .with_context(|| format!("Invalid argument: {}", text))?;
    }

    // Resolve every function before the real evaluation
    formula
        .check(&mut registry, MAX_ARITY)
        .with_context(|| format!("Formula check failed: {}", formula))?;

    let value = formula
        .eval(&mut registry, &args)
        .with_context(|| format!("Failed to evaluate: {}", formula))?;

    let given = &args[..cli.args.len()];
    let shown: Vec<String> = given.iter().map(|a| a.to_string()).collect();
    println!("f({}) = {}", shown.join(", "), value);
    println!("|f| = {}", value.modulus());

    // re,im,|z| for every given argument, then for the result
    let csv: Vec<String> = given
        .iter()
        .chain(std::iter::once(&value))
        .map(|z| {
            let (re, im) = z.parts();
            format!("{},{},{}", re, im, z.modulus())
        })
        .collect();
    eprintln!("{}", csv.join(","));

    Ok(())
}
