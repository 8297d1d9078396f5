use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::audio::{detect_nonsilent, expand_intervals, total_interval_duration, AudioClip, Interval};
use crate::chunk::Chunk;
use crate::config::Params;
use crate::error::Result;
use crate::media::MediaBackend;

/// Outcome of silence detection for one chunk.
///
/// `audio_path` points at the trimmed audio track and is `None` exactly when
/// `intervals` is empty, i.e. the chunk is fully silent and contributes
/// nothing to the final output.
#[derive(Debug, Clone)]
pub struct DetectedChunk {
    pub chunk: Chunk,
    pub audio_path: Option<PathBuf>,
    pub intervals: Vec<Interval>,
}

impl DetectedChunk {
    pub fn is_silent(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Detect non-silent intervals in one chunk and synthesize its trimmed audio.
///
/// Extracts the chunk's audio track to WAV, runs detection with a threshold
/// relative to the chunk's own average loudness, expands each interval by the
/// configured margin (clamped to the clip bounds), and, when anything
/// non-silent was found, overwrites the intermediate WAV with the
/// concatenation of just the interval slices.
pub async fn detect_chunk(
    backend: &dyn MediaBackend,
    chunk: Chunk,
    params: &Params,
) -> Result<DetectedChunk> {
    let audio_path = chunk.path.with_extension("wav");

    debug!(
        "Extracting audio from {} to {}",
        chunk.path.display(),
        audio_path.display()
    );
    backend.extract_audio(&chunk.path, &audio_path).await?;

    let clip = AudioClip::load(&audio_path)?;

    // Relative threshold: quiet and loud chunks are judged against themselves.
    let threshold_db = clip.dbfs() + params.silence_thresh;

    let raw = detect_nonsilent(&clip, params.min_silence_len, threshold_db);
    let intervals = expand_intervals(&raw, params.margin, clip.duration_ms());

    if intervals.is_empty() {
        warn!("Chunk {} is fully silent, dropping it", chunk.index);
        return Ok(DetectedChunk {
            chunk,
            audio_path: None,
            intervals,
        });
    }

    info!(
        "Chunk {}: {} non-silent intervals, total duration {} ms",
        chunk.index,
        intervals.len(),
        total_interval_duration(&intervals)
    );

    let trimmed = clip.concat_intervals(&intervals);
    trimmed.save(&audio_path)?;
    debug!(
        "Wrote trimmed audio for chunk {} ({} ms)",
        chunk.index,
        trimmed.duration_ms()
    );

    Ok(DetectedChunk {
        chunk,
        audio_path: Some(audio_path),
        intervals,
    })
}
