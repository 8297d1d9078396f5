use anyhow::{Context, Result};
use clap::Parser;
use desilence::config::Params;
use desilence::media::FfmpegBackend;
use desilence::pipeline::{print_summary, remove_silence, PipelineOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "desilence")]
#[command(version, about = "Remove silent intervals from a video")]
#[command(
    long_about = "Split a recorded lecture into chunks, detect silence per chunk, cut both audio and video to the non-silent intervals, and losslessly rejoin the result."
)]
struct Cli {
    /// Input video file
    input: PathBuf,

    /// Output video file
    #[arg(short, long, default_value = "cropped.mp4")]
    output: PathBuf,

    /// Minimum silence run length in milliseconds
    #[arg(short = 's', long)]
    min_silence_len: Option<u64>,

    /// Silence threshold as a dB offset from the chunk's average loudness
    #[arg(short = 't', long, allow_hyphen_values = true)]
    silence_thresh: Option<f64>,

    /// Margin in milliseconds added around each non-silent interval
    #[arg(short, long)]
    margin: Option<u64>,

    /// Number of chunks to split the input into
    #[arg(short = 'n', long)]
    parts: Option<usize>,

    /// Number of chunks processed concurrently
    #[arg(short = 'p', long)]
    pool_size: Option<usize>,

    /// Directory for temporary files
    #[arg(short = 'T', long)]
    temp_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn resolve_params(cli: &Cli) -> Result<Params> {
    let mut params = Params::load().context("Failed to load configuration")?;

    if let Some(v) = cli.min_silence_len {
        params.min_silence_len = v;
    }
    if let Some(v) = cli.silence_thresh {
        params.silence_thresh = v;
    }
    if let Some(v) = cli.margin {
        params.margin = v;
    }
    if let Some(v) = cli.parts {
        params.n_parts = v;
    }
    if let Some(v) = cli.pool_size {
        params.pool_size = v;
    }

    params.validate().context("Configuration validation failed")?;
    Ok(params)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    let params = resolve_params(&cli)?;

    info!("Input:    {}", cli.input.display());
    info!("Output:   {}", cli.output.display());
    info!("Chunks:   {}", params.n_parts);
    info!("Workers:  {}", params.pool_size);

    let options = PipelineOptions {
        params,
        temp_dir: cli.temp_dir.clone(),
        show_progress: true,
        skip_tool_check: false,
    };

    let backend = Arc::new(FfmpegBackend::new());
    let result = remove_silence(backend, &cli.input, &cli.output, options)
        .await
        .context("Silence removal failed")?;

    print_summary(&result);

    Ok(())
}
