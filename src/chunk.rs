use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{DesilenceError, Result};
use crate::media::MediaBackend;

/// One time-bounded sub-range of the source video, materialized as a
/// standalone file via lossless stream copy.
///
/// The ordinal index determines the chunk's position in final output order.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: usize,
    pub path: PathBuf,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Chunk {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Partition `[0, duration_ms)` into `n_parts` equal-width ranges.
///
/// Boundaries are computed as exact rationals (`duration * i / n_parts`) so
/// no rounding drift accumulates across parts.
pub fn chunk_boundaries(duration_ms: u64, n_parts: usize) -> Vec<(u64, u64)> {
    let n = n_parts as u64;
    (0..n)
        .map(|i| (duration_ms * i / n, duration_ms * (i + 1) / n))
        .collect()
}

/// File extension of the input, including the leading dot, or empty.
fn extension_of(input: &Path) -> String {
    input
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Split the input into `n_parts` chunks using lossless stream copy.
///
/// Returns the chunks in ordinal order, index-aligned with their position in
/// the source. Any single extraction failure aborts the whole split.
pub async fn split_video(
    backend: &dyn MediaBackend,
    input: &Path,
    output_dir: &Path,
    prefix: &str,
    n_parts: usize,
) -> Result<Vec<Chunk>> {
    if !input.exists() {
        return Err(DesilenceError::FileNotFound(input.display().to_string()));
    }

    let duration_ms = backend.probe_duration(input).await?;
    let ext = extension_of(input);

    info!(
        "Splitting {} ({} ms) into {} chunks",
        input.display(),
        duration_ms,
        n_parts
    );

    let mut chunks = Vec::with_capacity(n_parts);
    for (index, (start_ms, end_ms)) in chunk_boundaries(duration_ms, n_parts).into_iter().enumerate()
    {
        let path = output_dir.join(format!("{prefix}_{index}{ext}"));
        debug!(
            "Extracting chunk {} [{} ms, {} ms) to {}",
            index,
            start_ms,
            end_ms,
            path.display()
        );

        backend.extract_range(input, &path, start_ms, end_ms).await?;

        chunks.push(Chunk {
            index,
            path,
            start_ms,
            end_ms,
        });
    }

    info!("Done splitting {}", input.display());
    Ok(chunks)
}

/// Join processed chunks, in original index order, into the final output via
/// stream-copy concatenation driven by a manifest file.
pub async fn concatenate_chunks(
    backend: &dyn MediaBackend,
    manifest_dir: &Path,
    parts: &[PathBuf],
    output: &Path,
) -> Result<()> {
    if parts.is_empty() {
        return Err(DesilenceError::Concat(
            "No non-silent chunks to concatenate".to_string(),
        ));
    }

    info!("Concatenating {} chunks into {}", parts.len(), output.display());
    backend.concatenate(manifest_dir, parts, output).await
}
