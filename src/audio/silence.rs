use tracing::debug;

use super::clip::{rms_dbfs, AudioClip};
use super::Interval;

/// Detect non-silent intervals in a clip.
///
/// The clip is scanned in one-millisecond frames. A frame whose RMS loudness
/// is at or below `silence_thresh_db` (an absolute dBFS value) counts as
/// silent; maximal silent runs of at least `min_silence_len` milliseconds
/// split the clip, and everything between them is reported as non-silent.
/// Silent runs shorter than `min_silence_len` are absorbed into the
/// surrounding speech.
///
/// Returns ordered, non-overlapping intervals. An empty result means the
/// whole clip is silent.
pub fn detect_nonsilent(
    clip: &AudioClip,
    min_silence_len: u64,
    silence_thresh_db: f64,
) -> Vec<Interval> {
    let duration_ms = clip.duration_ms();
    if duration_ms == 0 {
        return vec![];
    }

    let silent_frames: Vec<bool> = (0..duration_ms)
        .map(|ms| rms_dbfs(clip.slice_ms(ms, ms + 1)) <= silence_thresh_db)
        .collect();

    let silent_runs = find_silent_runs(&silent_frames, min_silence_len);

    let mut intervals = Vec::new();
    let mut cursor = 0u64;
    for (start, end) in silent_runs {
        if start > cursor {
            intervals.push(Interval::new(cursor, start));
        }
        cursor = end;
    }
    if cursor < duration_ms {
        intervals.push(Interval::new(cursor, duration_ms));
    }

    debug!(
        "Detected {} non-silent intervals in {} ms of audio",
        intervals.len(),
        duration_ms
    );

    intervals
}

/// Maximal runs of silent frames that are long enough to count as silence.
fn find_silent_runs(silent_frames: &[bool], min_silence_len: u64) -> Vec<(u64, u64)> {
    let mut runs = Vec::new();
    let mut run_start: Option<u64> = None;

    for (ms, &silent) in silent_frames.iter().enumerate() {
        match (silent, run_start) {
            (true, None) => run_start = Some(ms as u64),
            (false, Some(start)) => {
                if ms as u64 - start >= min_silence_len {
                    runs.push((start, ms as u64));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        let end = silent_frames.len() as u64;
        if end - start >= min_silence_len {
            runs.push((start, end));
        }
    }

    runs
}

/// Expand each interval by `margin` on both ends, clamped to the clip bounds.
///
/// Adjacent expanded intervals may overlap; consumers tolerate that.
pub fn expand_intervals(intervals: &[Interval], margin: u64, clip_duration_ms: u64) -> Vec<Interval> {
    intervals
        .iter()
        .map(|interval| {
            Interval::new(
                interval.start_ms.saturating_sub(margin),
                (interval.stop_ms + margin).min(clip_duration_ms),
            )
        })
        .collect()
}

/// Total duration covered by a list of intervals, in milliseconds.
pub fn total_interval_duration(intervals: &[Interval]) -> u64 {
    intervals.iter().map(Interval::duration_ms).sum()
}
