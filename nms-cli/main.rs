use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nms_cli::{
    batch_output_paths, init_thread_pool, load_response_map, output_path, write_dump,
    FrameSelector, Preset, SelectionDump, SelectorConfig, SuppressionPolicy,
};
use rayon::prelude::*;

#[derive(Parser)]
#[command(name = "nms")]
#[command(about = "Select keypoints from corner-response maps by non-maximum suppression")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select keypoints from one response map.
    Select {
        /// Response map: `.json` or any grayscale-convertible image. Images
        /// are min/max-stretched and truncated like any map unless --raw is set.
        #[arg(long)]
        input: PathBuf,

        /// Where to write the keypoints (JSON). Defaults to `<stem>.keypoints.json`
        /// next to the input.
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        params: SelectionArgs,
    },
    /// Select keypoints from several response maps in parallel.
    Batch {
        /// Response maps to process. Preprocessing follows the preset, see --raw.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the keypoint files. Defaults to next to each input.
        /// Inputs sharing a stem get their batch index appended.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        params: SelectionArgs,
    },
    /// Print a preset configuration.
    Config {
        #[arg(long, default_value = "harris-reference")]
        preset: Preset,

        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Json,
    Toml,
}

#[derive(Debug, Clone, Args)]
struct SelectionArgs {
    /// Configuration file (`.json` or `.toml`). Replaces --preset.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "harris-reference")]
    preset: Preset,

    /// Cells strictly above this value become candidates. Must be finite.
    #[arg(long)]
    threshold: Option<f32>,

    /// Keypoint diameter in pixels.
    #[arg(long)]
    size: Option<f32>,

    /// Largest tolerated overlap between kept keypoints (0-1).
    #[arg(long)]
    max_overlap: Option<f32>,

    /// `first-overlap` or `best-overlap`.
    #[arg(long)]
    policy: Option<SuppressionPolicy>,

    #[arg(long)]
    threads: Option<usize>,

    /// Threshold the map as stored, without normalization or truncation.
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Select { input, out, params } => run_select(&input, out, &params),
        Commands::Batch {
            inputs,
            out_dir,
            params,
        } => run_batch(&inputs, out_dir.as_deref(), &params),
        Commands::Config { preset, format } => run_config(preset, format),
    }
}

fn resolve_config(args: &SelectionArgs) -> Result<SelectorConfig> {
    let base = match &args.config {
        Some(path) => SelectorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => args.preset.config(),
    };

    let mut builder = base.to_builder();
    if let Some(threshold) = args.threshold {
        builder = builder.threshold(threshold);
    }
    if let Some(size) = args.size {
        builder = builder.neighborhood_size(size);
    }
    if let Some(max_overlap) = args.max_overlap {
        builder = builder.overlap_threshold(max_overlap);
    }
    if let Some(policy) = args.policy {
        builder = builder.policy(policy);
    }
    if let Some(threads) = args.threads {
        builder = builder.threads(threads);
    }
    if args.raw {
        builder = builder.normalize_responses(false).truncate_responses(false);
    }
    Ok(builder.to_config())
}

fn build_selector(args: &SelectionArgs) -> Result<FrameSelector> {
    let config = resolve_config(args)?;
    tracing::info!("{}", config.summary());

    let n_threads = config.core.n_threads;
    let selector = FrameSelector::new(config).context("invalid selector configuration")?;
    init_thread_pool(n_threads).context("failed to start thread pool")?;
    Ok(selector)
}

fn report(dump: &SelectionDump) {
    tracing::info!(
        source = %dump.source,
        candidates = dump.stats.candidates,
        kept = dump.keypoints.len(),
        replaced = dump.stats.replaced,
        discarded = dump.stats.discarded,
        "selected {} keypoints from {}x{} map",
        dump.keypoints.len(),
        dump.rows,
        dump.cols
    );
    if dump.overlapping_pairs > 0 {
        tracing::warn!(
            source = %dump.source,
            pairs = dump.overlapping_pairs,
            "kept keypoints still overlap; best-overlap policy removes these"
        );
    }
}

fn run_select(input: &Path, out: Option<PathBuf>, params: &SelectionArgs) -> Result<()> {
    let selector = build_selector(params)?;

    let t0 = Instant::now();
    let dump = selector
        .select_file(input)
        .with_context(|| format!("failed to process {}", input.display()))?;
    tracing::debug!("selection took {:.2?}", t0.elapsed());
    report(&dump);

    let out = out.unwrap_or_else(|| output_path(input, None));
    write_dump(&out, &dump).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!("wrote {}", out.display());
    Ok(())
}

fn run_batch(inputs: &[PathBuf], out_dir: Option<&Path>, params: &SelectionArgs) -> Result<()> {
    let selector = build_selector(params)?;
    let outputs = batch_output_paths(inputs, out_dir)?;

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let frames = inputs
        .par_iter()
        .map(|path| {
            load_response_map(path)
                .map(|map| (path.display().to_string(), map))
                .with_context(|| format!("failed to load {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let t0 = Instant::now();
    let dumps = selector.run_batch(&frames);
    tracing::info!("processed {} frames in {:.2?}", dumps.len(), t0.elapsed());

    for (out, dump) in outputs.iter().zip(&dumps) {
        report(dump);
        write_dump(out, dump).with_context(|| format!("failed to write {}", out.display()))?;
    }

    let total: usize = dumps.iter().map(|d| d.keypoints.len()).sum();
    tracing::info!("{} keypoints across {} frames", total, dumps.len());
    Ok(())
}

fn run_config(preset: Preset, format: ConfigFormat) -> Result<()> {
    let config = preset.config();
    let text = match format {
        ConfigFormat::Json => config.to_json()?,
        ConfigFormat::Toml => config.to_toml()?,
    };
    println!("{text}");
    Ok(())
}
