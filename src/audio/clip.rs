use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::error::{DesilenceError, Result};

use super::Interval;

/// Decoded audio samples for one chunk, interleaved across channels.
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Load a WAV file into memory.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path).map_err(|e| {
            DesilenceError::AudioExtraction(format!(
                "Failed to open WAV file {}: {e}",
                path.display()
            ))
        })?;

        let spec = reader.spec();
        debug!(
            "Loading audio: {} Hz, {} channels, {} bits",
            spec.sample_rate, spec.channels, spec.bits_per_sample
        );

        let samples: Vec<i16> = match spec.sample_format {
            SampleFormat::Int => reader
                .into_samples::<i16>()
                .map(|s| s.unwrap_or(0))
                .collect(),
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| (s.unwrap_or(0.0) * i16::MAX as f32) as i16)
                .collect(),
        };

        Ok(Self::new(samples, spec.sample_rate, spec.channels))
    }

    /// Write this clip as a 16-bit PCM WAV, overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec).map_err(|e| {
            DesilenceError::AudioExtraction(format!(
                "Failed to create WAV file {}: {e}",
                path.display()
            ))
        })?;

        for &sample in &self.samples {
            writer.write_sample(sample).map_err(|e| {
                DesilenceError::AudioExtraction(format!("Failed to write WAV sample: {e}"))
            })?;
        }

        writer.finalize().map_err(|e| {
            DesilenceError::AudioExtraction(format!("Failed to finalize WAV file: {e}"))
        })?;

        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Total clip duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.samples.is_empty() || self.channels == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        frames * 1000 / self.sample_rate as u64
    }

    /// Interleaved sample index for a millisecond offset, clamped to the clip.
    fn sample_index(&self, ms: u64) -> usize {
        let frame = ms * self.sample_rate as u64 / 1000;
        let index = (frame * self.channels as u64) as usize;
        index.min(self.samples.len())
    }

    /// Samples covering `[start_ms, stop_ms)`, clamped to clip bounds.
    pub fn slice_ms(&self, start_ms: u64, stop_ms: u64) -> &[i16] {
        let start = self.sample_index(start_ms);
        let stop = self.sample_index(stop_ms).max(start);
        &self.samples[start..stop]
    }

    /// Average loudness of the whole clip in dBFS.
    ///
    /// A clip of pure digital silence has no defined loudness and reports
    /// negative infinity.
    pub fn dbfs(&self) -> f64 {
        rms_dbfs(&self.samples)
    }

    /// Build a new clip by concatenating the given interval slices in order.
    pub fn concat_intervals(&self, intervals: &[Interval]) -> AudioClip {
        let mut samples = Vec::new();
        for interval in intervals {
            samples.extend_from_slice(self.slice_ms(interval.start_ms, interval.stop_ms));
        }
        AudioClip::new(samples, self.sample_rate, self.channels)
    }
}

/// RMS loudness of a sample slice in dBFS relative to i16 full scale.
pub fn rms_dbfs(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let rms = (sum_squares / samples.len() as f64).sqrt();
    if rms == 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * rms.log10()
    }
}
