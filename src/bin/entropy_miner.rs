//! # entropy-miner CLI
//!
//! Loads a headerless CSV relation, runs the chosen engine, and prints one
//! `Entropy for AttrSet{...}: v` line per subset.
//!
//! ## Usage
//!
//! ```bash
//! entropy-miner --input data.csv --columns 5
//! entropy-miner --input data.csv --columns 5 --engine buc --buc-variant materialize
//! entropy-miner --input data.csv --columns 5 --all-subsets
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use entropy_miner::config::{BucVariantChoice, Config, EngineChoice};
use entropy_miner::render;
use entropy_miner::tuple_store::memory::MemoryStore;
use entropy_miner::tuple_store::TupleStore;
use entropy_miner::{compute_entropies, EngineKind};

#[derive(Parser, Debug)]
#[command(name = "entropy-miner", about = "Empirical Shannon entropy of every attribute subset of a relation")]
struct Cli {
    /// Path to a headerless tabular source.
    #[arg(long)]
    input: PathBuf,

    /// Number of columns in the input.
    #[arg(long)]
    columns: usize,

    /// Override the configured engine.
    #[arg(long, value_enum)]
    engine: Option<CliEngine>,

    /// Override the configured BUC variant (ignored unless `--engine buc`).
    #[arg(long, value_enum)]
    buc_variant: Option<CliBucVariant>,

    /// Disable the most-distinct-first column reorder preprocessing step.
    #[arg(long)]
    no_reorder: bool,

    /// Emit every non-empty subset, filling absent ones with log2(n)
    /// instead of only the subsets the engine actually materialized.
    #[arg(long)]
    all_subsets: bool,

    /// Path to a config.toml to load instead of the default search path.
    #[arg(long)]
    config: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEngine {
    TidCnt,
    Buc,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBucVariant {
    Filter,
    Materialize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).context("failed to load config file")?,
        None => Config::load().unwrap_or_default(),
    };

    if let Some(engine) = cli.engine {
        config.engine.kind = match engine {
            CliEngine::TidCnt => EngineChoice::TidCnt,
            CliEngine::Buc => EngineChoice::Buc,
        };
    }
    if let Some(variant) = cli.buc_variant {
        config.engine.buc_variant = match variant {
            CliBucVariant::Filter => BucVariantChoice::Filter,
            CliBucVariant::Materialize => BucVariantChoice::Materialize,
        };
    }
    if cli.no_reorder {
        config.engine.reorder_columns = false;
    }

    init_tracing(&config.logging);

    let engine: EngineKind = config.engine.resolve();
    tracing::info!(
        input = %cli.input.display(),
        columns = cli.columns,
        engine = ?engine,
        reorder = config.engine.reorder_columns,
        "entropy_miner_starting"
    );

    let mut store = MemoryStore::new();
    let (rel, n) = store
        .load(&cli.input, cli.columns)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    let map = compute_entropies(
        &mut store,
        rel,
        cli.columns,
        n,
        engine,
        config.engine.reorder_columns,
    )
    .context("entropy computation failed")?;

    let lines = if cli.all_subsets {
        render::render_all(&map, cli.columns, n)
    } else {
        render::render_present(&map)
    };
    for line in lines {
        println!("{line}");
    }

    Ok(())
}

fn init_tracing(logging: &entropy_miner::config::LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if logging.format == "json" {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
