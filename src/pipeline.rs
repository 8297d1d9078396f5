use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::audio::total_interval_duration;
use crate::chunk::{concatenate_chunks, split_video, Chunk};
use crate::config::Params;
use crate::detect::{detect_chunk, DetectedChunk};
use crate::error::{DesilenceError, Result};
use crate::media::{check_ffmpeg, check_ffprobe, MediaBackend};
use crate::trim::trim_chunk;

/// Options controlling one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Detection and split parameters.
    pub params: Params,
    /// Directory to create the temporary workspace in. Defaults to the
    /// system temp directory.
    pub temp_dir: Option<PathBuf>,
    /// Show progress bars for the parallel phases.
    pub show_progress: bool,
    /// Skip the ffmpeg/ffprobe preflight check. Used with non-ffmpeg
    /// backends.
    pub skip_tool_check: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            params: Params::default(),
            temp_dir: None,
            show_progress: true,
            skip_tool_check: false,
        }
    }
}

/// Statistics from one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total wall-clock time for the run.
    pub total_time: Duration,
    /// Time spent splitting the input.
    pub split_time: Duration,
    /// Time spent in the silence-detection phase.
    pub detect_time: Duration,
    /// Time spent in the trim phase.
    pub trim_time: Duration,
    /// Duration of the input file in milliseconds.
    pub input_duration_ms: u64,
    /// Total duration retained across all kept chunks, in milliseconds.
    pub kept_duration_ms: u64,
    /// Number of chunks the input was split into.
    pub chunks_total: usize,
    /// Number of chunks that contained non-silent audio.
    pub chunks_kept: usize,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Path to the final output file.
    pub output_path: PathBuf,
    /// Run statistics.
    pub stats: PipelineStats,
}

fn phase_progress_bar(total: usize, show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    Some(pb)
}

/// Remove silent intervals from a video file.
///
/// Drives the full sequence: probe + split (sequential), silence detection
/// over all chunks (parallel), filtering of fully silent chunks, interval
/// trimming over the remaining chunks (parallel), and stream-copy
/// concatenation into `output`. Any failure in any phase aborts the run; the
/// temporary workspace is removed when the run ends.
pub async fn remove_silence(
    backend: Arc<dyn MediaBackend>,
    input: &Path,
    output: &Path,
    options: PipelineOptions,
) -> Result<PipelineResult> {
    let start_time = Instant::now();

    if !input.exists() {
        return Err(DesilenceError::FileNotFound(input.display().to_string()));
    }

    options.params.validate()?;

    if !options.skip_tool_check {
        check_ffmpeg()?;
        check_ffprobe()?;
    }

    let workdir = create_workspace(options.temp_dir.as_deref())?;
    let workdir_path = workdir.path().to_path_buf();
    debug!("Using temp workspace: {}", workdir_path.display());

    let params = options.params.clone();

    // Stage 1: probe + split (inherently sequential).
    info!("Stage 1/4: Splitting {} into {} chunks", input.display(), params.n_parts);
    let split_start = Instant::now();
    let chunks = split_video(
        backend.as_ref(),
        input,
        &workdir_path,
        &params.prefix,
        params.n_parts,
    )
    .await?;
    let split_time = split_start.elapsed();

    let chunks_total = chunks.len();
    let input_duration_ms = chunks.last().map(|c| c.end_ms).unwrap_or(0);

    // Stage 2: silence detection, fan-out over chunks.
    info!(
        "Stage 2/4: Detecting silence ({} workers)",
        params.pool_size
    );
    let detect_start = Instant::now();
    let detected = detect_phase(backend.clone(), chunks, &params, options.show_progress).await?;
    let detect_time = detect_start.elapsed();

    // Filter out fully silent chunks; ordinal order is preserved because the
    // phase results were re-associated by chunk index.
    let kept: Vec<DetectedChunk> = detected.into_iter().filter(|d| !d.is_silent()).collect();
    let chunks_kept = kept.len();
    let kept_duration_ms: u64 = kept
        .iter()
        .map(|d| total_interval_duration(&d.intervals))
        .sum();

    info!(
        "Keeping {}/{} chunks ({} ms of {} ms)",
        chunks_kept, chunks_total, kept_duration_ms, input_duration_ms
    );

    // Stage 3: interval trimming, fan-out over kept chunks.
    info!("Stage 3/4: Trimming chunks ({} workers)", params.pool_size);
    let trim_start = Instant::now();
    let trimmed = trim_phase(
        backend.clone(),
        kept,
        &workdir_path,
        &params,
        options.show_progress,
    )
    .await?;
    let trim_time = trim_start.elapsed();

    // Stage 4: final concatenation.
    info!("Stage 4/4: Concatenating into {}", output.display());
    concatenate_chunks(backend.as_ref(), &workdir_path, &trimmed, output).await?;

    let stats = PipelineStats {
        total_time: start_time.elapsed(),
        split_time,
        detect_time,
        trim_time,
        input_duration_ms,
        kept_duration_ms,
        chunks_total,
        chunks_kept,
    };

    Ok(PipelineResult {
        output_path: output.to_path_buf(),
        stats,
    })
}

fn create_workspace(temp_dir: Option<&Path>) -> Result<TempDir> {
    let builder = {
        let mut b = tempfile::Builder::new();
        b.prefix("desilence-");
        b
    };

    let workdir = match temp_dir {
        Some(dir) => builder.tempdir_in(dir),
        None => builder.tempdir(),
    }
    .map_err(|e| {
        DesilenceError::Io(std::io::Error::other(format!(
            "Failed to create temp workspace: {e}"
        )))
    })?;

    Ok(workdir)
}

/// Run silence detection over all chunks with a bounded worker pool.
///
/// Work units complete in any order; results are re-associated with their
/// originating chunk index before being returned in ordinal order. The first
/// failure aborts the whole batch.
async fn detect_phase(
    backend: Arc<dyn MediaBackend>,
    chunks: Vec<Chunk>,
    params: &Params,
    show_progress: bool,
) -> Result<Vec<DetectedChunk>> {
    let total = chunks.len();
    let progress_bar = phase_progress_bar(total, show_progress);
    let semaphore = Arc::new(Semaphore::new(params.pool_size));

    let mut futures = FuturesUnordered::new();
    for chunk in chunks {
        let sem = semaphore.clone();
        let backend = backend.clone();
        let params = params.clone();
        let pb = progress_bar.clone();

        futures.push(async move {
            let _permit = sem.acquire().await.expect("Semaphore closed");
            let index = chunk.index;

            debug!("Detecting silence in chunk {}", index);
            let result = detect_chunk(backend.as_ref(), chunk, &params).await;

            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            (index, result)
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(result) = futures.next().await {
        results.push(result);
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Detection complete");
    }

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

/// Run interval trimming over the kept chunks with a bounded worker pool.
///
/// Returns the processed chunk paths in original chunk index order.
async fn trim_phase(
    backend: Arc<dyn MediaBackend>,
    kept: Vec<DetectedChunk>,
    output_dir: &Path,
    params: &Params,
    show_progress: bool,
) -> Result<Vec<PathBuf>> {
    let total = kept.len();
    let progress_bar = phase_progress_bar(total, show_progress);
    let semaphore = Arc::new(Semaphore::new(params.pool_size));

    let mut futures = FuturesUnordered::new();
    for detected in kept {
        let sem = semaphore.clone();
        let backend = backend.clone();
        let output_dir = output_dir.to_path_buf();
        let prefix = params.prefix.clone();
        let pb = progress_bar.clone();

        futures.push(async move {
            let _permit = sem.acquire().await.expect("Semaphore closed");
            let index = detected.chunk.index;

            let result = trim_chunk(backend.as_ref(), &detected, &output_dir, &prefix).await;

            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            (index, result)
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(result) = futures.next().await {
        results.push(result);
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Trimming complete");
    }

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    let stats = &result.stats;
    let removed_ms = stats.input_duration_ms.saturating_sub(stats.kept_duration_ms);

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                     Silence Removal Complete                   ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", result.output_path.display());
    println!(
        "  Input:      {:.1}s",
        stats.input_duration_ms as f64 / 1000.0
    );
    println!(
        "  Kept:       {:.1}s ({} of {} chunks)",
        stats.kept_duration_ms as f64 / 1000.0,
        stats.chunks_kept,
        stats.chunks_total
    );
    println!("  Removed:    {:.1}s", removed_ms as f64 / 1000.0);
    println!();
    println!("  Timing:");
    println!("    Split:    {:.2}s", stats.split_time.as_secs_f64());
    println!("    Detect:   {:.2}s", stats.detect_time.as_secs_f64());
    println!("    Trim:     {:.2}s", stats.trim_time.as_secs_f64());
    println!("    Total:    {:.2}s", stats.total_time.as_secs_f64());
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
