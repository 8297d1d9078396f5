use std::path::{Path, PathBuf};

use tracing::info;

use crate::detect::DetectedChunk;
use crate::error::{DesilenceError, Result};
use crate::media::MediaBackend;

/// Name of the processed chunk file for a given chunk index.
pub fn processed_chunk_name(prefix: &str, index: usize, ext: &str) -> String {
    format!("{prefix}_cropped_{index}{ext}")
}

/// Cut one chunk's video to its detected intervals and mux it with the
/// already-trimmed audio track.
///
/// The caller guarantees a non-empty interval list; silent chunks are
/// filtered out before this stage. Because video and audio are both built
/// from the same ordered interval set, the output streams have matching
/// total duration.
pub async fn trim_chunk(
    backend: &dyn MediaBackend,
    detected: &DetectedChunk,
    output_dir: &Path,
    prefix: &str,
) -> Result<PathBuf> {
    let index = detected.chunk.index;
    let audio_path = detected.audio_path.as_deref().ok_or_else(|| {
        DesilenceError::Trim(format!("Chunk {index} has no trimmed audio track"))
    })?;

    let ext = detected
        .chunk
        .path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let output = output_dir.join(processed_chunk_name(prefix, index, &ext));

    info!(
        "Trimming chunk {}: {} -> {}",
        index,
        detected.chunk.path.display(),
        output.display()
    );

    backend
        .trim_and_mux(&detected.chunk.path, audio_path, &output, &detected.intervals)
        .await?;

    Ok(output)
}
