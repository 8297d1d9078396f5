use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::audio::Interval;
use crate::error::{DesilenceError, Result};

use super::{time_format, MediaBackend};

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = std::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| {
            DesilenceError::Config(format!(
                "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(DesilenceError::Config("FFmpeg check failed".to_string()));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    let output = std::process::Command::new("ffprobe")
        .arg("-version")
        .output()
        .map_err(|e| {
            DesilenceError::Config(format!(
                "FFprobe not found. Please install FFmpeg (includes FFprobe). Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(DesilenceError::Config("FFprobe check failed".to_string()));
    }

    debug!("FFprobe is available");
    Ok(())
}

/// Production [`MediaBackend`] that shells out to ffmpeg and ffprobe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    /// Run an external tool, mapping failure through `make_err`.
    async fn run<F>(&self, program: &str, args: &[String], make_err: F) -> Result<Vec<u8>>
    where
        F: Fn(String) -> DesilenceError,
    {
        debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| make_err(format!("Failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("unknown error");
            return Err(make_err(format!("{program} exited with error: {detail}")));
        }

        Ok(output.stdout)
    }
}

// Common prefix for every ffmpeg invocation.
const FFMPEG_ARGS: [&str; 5] = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y"];

fn ffmpeg_args() -> Vec<String> {
    FFMPEG_ARGS.iter().map(|s| s.to_string()).collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn seconds_arg(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

/// Build the filter graph that cuts the video input to each interval, resets
/// each piece's timestamps to zero, and concatenates the pieces.
pub fn build_trim_filter(intervals: &[Interval]) -> String {
    let mut filter = String::new();
    for (i, interval) in intervals.iter().enumerate() {
        filter.push_str(&format!(
            "[0:v]trim=start={}:end={},setpts=PTS-STARTPTS[v{i}];",
            seconds_arg(interval.start_ms),
            seconds_arg(interval.stop_ms),
        ));
    }
    for i in 0..intervals.len() {
        filter.push_str(&format!("[v{i}]"));
    }
    filter.push_str(&format!("concat=n={}:v=1:a=0[v]", intervals.len()));
    filter
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_duration(&self, input: &Path) -> Result<u64> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path_arg(input),
        ];

        let stdout = self
            .run("ffprobe", &args, DesilenceError::Probe)
            .await?;

        let duration_str = String::from_utf8_lossy(&stdout);
        let duration_secs: f64 = duration_str.trim().parse().map_err(|e| {
            DesilenceError::Probe(format!(
                "Failed to parse duration '{}': {e}",
                duration_str.trim()
            ))
        })?;

        Ok((duration_secs * 1000.0).round() as u64)
    }

    async fn extract_range(
        &self,
        input: &Path,
        output: &Path,
        start_ms: u64,
        end_ms: u64,
    ) -> Result<()> {
        let mut args = ffmpeg_args();
        args.extend([
            "-i".to_string(),
            path_arg(input),
            "-ss".to_string(),
            time_format(start_ms),
            "-to".to_string(),
            time_format(end_ms),
            "-c".to_string(),
            "copy".to_string(),
            path_arg(output),
        ]);

        self.run("ffmpeg", &args, DesilenceError::Split).await?;
        Ok(())
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()> {
        let mut args = ffmpeg_args();
        args.extend([
            "-i".to_string(),
            path_arg(input),
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            path_arg(output),
        ]);

        self.run("ffmpeg", &args, DesilenceError::AudioExtraction)
            .await?;
        Ok(())
    }

    async fn trim_and_mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        intervals: &[Interval],
    ) -> Result<()> {
        if intervals.is_empty() {
            return Err(DesilenceError::Trim(
                "No intervals to trim".to_string(),
            ));
        }

        let mut args = ffmpeg_args();
        args.extend([
            "-i".to_string(),
            path_arg(video),
            "-i".to_string(),
            path_arg(audio),
            "-filter_complex".to_string(),
            build_trim_filter(intervals),
            "-map".to_string(),
            "[v]".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            path_arg(output),
        ]);

        self.run("ffmpeg", &args, DesilenceError::Trim).await?;
        Ok(())
    }

    async fn concatenate(
        &self,
        manifest_dir: &Path,
        parts: &[PathBuf],
        output: &Path,
    ) -> Result<()> {
        let manifest = manifest_dir.join("concat.txt");
        let contents: String = parts
            .iter()
            .map(|p| format!("file '{}'\n", p.display()))
            .collect();
        tokio::fs::write(&manifest, &contents)
            .await
            .map_err(|e| {
                DesilenceError::Concat(format!(
                    "Failed to write manifest {}: {e}",
                    manifest.display()
                ))
            })?;

        debug!("{} parts written to {}", parts.len(), manifest.display());

        let mut args = ffmpeg_args();
        args.extend([
            "-safe".to_string(),
            "0".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-i".to_string(),
            path_arg(&manifest),
            "-c".to_string(),
            "copy".to_string(),
            path_arg(output),
        ]);

        self.run("ffmpeg", &args, DesilenceError::Concat).await?;
        Ok(())
    }
}
