pub mod ffmpeg;

pub use ffmpeg::{check_ffmpeg, check_ffprobe, FfmpegBackend};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::audio::Interval;
use crate::error::Result;

/// Narrow capability interface over the external transcoding tool.
///
/// The pipeline only ever talks to ffmpeg/ffprobe through this trait, so
/// tests can substitute a backend that returns deterministic results without
/// invoking real media tools.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Total stream duration of `input` in milliseconds.
    async fn probe_duration(&self, input: &Path) -> Result<u64>;

    /// Stream-copy `[start_ms, end_ms)` of `input` into `output`.
    async fn extract_range(
        &self,
        input: &Path,
        output: &Path,
        start_ms: u64,
        end_ms: u64,
    ) -> Result<()>;

    /// Extract the audio track of `input` to a decodable WAV at `output`.
    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()>;

    /// Cut `video` to each interval, reset timestamps per piece, concatenate
    /// the pieces, and mux the result with the already-trimmed `audio` track.
    async fn trim_and_mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        intervals: &[Interval],
    ) -> Result<()>;

    /// Stream-copy concatenate `parts`, in order, into `output`, using a
    /// manifest file written under `manifest_dir`.
    async fn concatenate(
        &self,
        manifest_dir: &Path,
        parts: &[PathBuf],
        output: &Path,
    ) -> Result<()>;
}

/// Format a millisecond offset as `HH:MM:SS.mmm` for ffmpeg seek arguments.
pub fn time_format(ms: u64) -> String {
    let msec = ms % 1000;
    let sec = ms / 1000;
    let minutes = sec / 60;
    let sec = sec % 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;
    format!("{hours:02}:{minutes:02}:{sec:02}.{msec:03}")
}
