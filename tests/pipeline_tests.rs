//! End-to-end pipeline tests against a deterministic media backend.
//!
//! The mock backend stands in for ffmpeg/ffprobe: it records every call and
//! writes synthetic WAV files so the real silence detection runs unchanged.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use desilence::audio::{AudioClip, Interval};
use desilence::config::Params;
use desilence::error::{DesilenceError, Result};
use desilence::media::MediaBackend;
use desilence::pipeline::{remove_silence, PipelineOptions};

/// Chunk index encoded in an index-qualified file name like `lecture_3.mp4`.
fn chunk_index(path: &Path) -> usize {
    path.file_stem()
        .and_then(|stem| stem.to_string_lossy().rsplit('_').next().map(String::from))
        .and_then(|digits| digits.parse().ok())
        .expect("index-qualified file name")
}

struct MockBackend {
    duration_ms: u64,
    silent_chunks: HashSet<usize>,
    fail_probe: bool,
    fail_trim_on: Option<usize>,
    extract_ranges: Mutex<Vec<(u64, u64)>>,
    trim_calls: Mutex<Vec<(usize, Vec<Interval>)>>,
    concat_parts: Mutex<Vec<PathBuf>>,
}

impl MockBackend {
    fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            silent_chunks: HashSet::new(),
            fail_probe: false,
            fail_trim_on: None,
            extract_ranges: Mutex::new(Vec::new()),
            trim_calls: Mutex::new(Vec::new()),
            concat_parts: Mutex::new(Vec::new()),
        }
    }

    fn with_silent_chunks(mut self, indices: &[usize]) -> Self {
        self.silent_chunks = indices.iter().copied().collect();
        self
    }

    fn with_failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    fn with_failing_trim_on(mut self, index: usize) -> Self {
        self.fail_trim_on = Some(index);
        self
    }
}

#[async_trait]
impl MediaBackend for MockBackend {
    async fn probe_duration(&self, _input: &Path) -> Result<u64> {
        if self.fail_probe {
            return Err(DesilenceError::Probe("mock: unreadable file".to_string()));
        }
        Ok(self.duration_ms)
    }

    async fn extract_range(
        &self,
        _input: &Path,
        output: &Path,
        start_ms: u64,
        end_ms: u64,
    ) -> Result<()> {
        self.extract_ranges.lock().unwrap().push((start_ms, end_ms));
        std::fs::write(output, b"")?;
        Ok(())
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()> {
        let index = chunk_index(input);

        // Let low-index chunks finish last so completion order differs from
        // ordinal order when running concurrently.
        tokio::time::sleep(Duration::from_millis(40 - 10 * (index as u64 % 4))).await;

        // 1000 Hz mono: one sample per millisecond, 10 s per chunk.
        let samples: Vec<i16> = if self.silent_chunks.contains(&index) {
            vec![0; 10_000]
        } else {
            let mut s = vec![0i16; 2000];
            s.extend(vec![10_000i16; 3000]);
            s.extend(vec![0i16; 5000]);
            s
        };

        AudioClip::new(samples, 1000, 1).save(output)
    }

    async fn trim_and_mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        intervals: &[Interval],
    ) -> Result<()> {
        let index = chunk_index(video);
        if self.fail_trim_on == Some(index) {
            return Err(DesilenceError::Trim(format!(
                "mock: trim failed for chunk {index}"
            )));
        }

        assert!(audio.exists(), "trimmed audio must exist before muxing");
        self.trim_calls
            .lock()
            .unwrap()
            .push((index, intervals.to_vec()));
        std::fs::write(output, b"")?;
        Ok(())
    }

    async fn concatenate(
        &self,
        _manifest_dir: &Path,
        parts: &[PathBuf],
        output: &Path,
    ) -> Result<()> {
        self.concat_parts.lock().unwrap().extend_from_slice(parts);
        std::fs::write(output, b"")?;
        Ok(())
    }
}

fn test_options(n_parts: usize, pool_size: usize) -> PipelineOptions {
    PipelineOptions {
        params: Params {
            min_silence_len: 300,
            silence_thresh: -16.0,
            margin: 100,
            n_parts,
            pool_size,
            prefix: "lecture".to_string(),
        },
        temp_dir: None,
        show_progress: false,
        skip_tool_check: true,
    }
}

fn make_input(dir: &Path) -> PathBuf {
    let input = dir.join("talk.mp4");
    std::fs::write(&input, b"video").unwrap();
    input
}

#[tokio::test]
async fn test_end_to_end_drops_silent_chunk_and_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path());
    let output = dir.path().join("out.mp4");

    let backend = Arc::new(MockBackend::new(40_000).with_silent_chunks(&[1]));
    let result = remove_silence(backend.clone(), &input, &output, test_options(4, 4))
        .await
        .unwrap();

    assert_eq!(result.stats.chunks_total, 4);
    assert_eq!(result.stats.chunks_kept, 3);
    assert_eq!(result.stats.input_duration_ms, 40_000);

    // Chunk 1 contributes nothing; the others stay in ascending index order
    // no matter which worker finished first.
    let parts = backend.concat_parts.lock().unwrap();
    let names: Vec<String> = parts
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "lecture_cropped_0.mp4",
            "lecture_cropped_2.mp4",
            "lecture_cropped_3.mp4"
        ]
    );
}

#[tokio::test]
async fn test_detected_intervals_carry_margin() {
    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path());
    let output = dir.path().join("out.mp4");

    let backend = Arc::new(MockBackend::new(40_000));
    let result = remove_silence(backend.clone(), &input, &output, test_options(4, 1))
        .await
        .unwrap();

    // Raw non-silent run (2000, 5000) expands by the 100 ms margin.
    let trim_calls = backend.trim_calls.lock().unwrap();
    assert_eq!(trim_calls.len(), 4);
    for (_, intervals) in trim_calls.iter() {
        assert_eq!(intervals, &vec![Interval::new(1900, 5100)]);
    }

    // Each kept chunk retains 3200 ms.
    assert_eq!(result.stats.kept_duration_ms, 4 * 3200);
}

#[tokio::test]
async fn test_split_ranges_are_contiguous_and_span_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path());
    let output = dir.path().join("out.mp4");

    let backend = Arc::new(MockBackend::new(100_000));
    remove_silence(backend.clone(), &input, &output, test_options(10, 1))
        .await
        .unwrap();

    let ranges = backend.extract_ranges.lock().unwrap();
    assert_eq!(ranges.len(), 10);
    assert_eq!(ranges.first().unwrap().0, 0);
    assert_eq!(ranges.last().unwrap().1, 100_000);
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].1, pair[1].0);
    }
    for &(start, end) in ranges.iter() {
        assert_eq!(end - start, 10_000);
    }
}

#[tokio::test]
async fn test_fully_silent_input_fails_concatenation() {
    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path());
    let output = dir.path().join("out.mp4");

    let backend = Arc::new(MockBackend::new(20_000).with_silent_chunks(&[0, 1]));
    let result = remove_silence(backend.clone(), &input, &output, test_options(2, 1)).await;

    assert!(matches!(result, Err(DesilenceError::Concat(_))));
    assert!(backend.trim_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_probe_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path());
    let output = dir.path().join("out.mp4");

    let backend = Arc::new(MockBackend::new(10_000).with_failing_probe());
    let result = remove_silence(backend, &input, &output, test_options(2, 1)).await;

    assert!(matches!(result, Err(DesilenceError::Probe(_))));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_trim_failure_aborts_before_concatenation() {
    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path());
    let output = dir.path().join("out.mp4");

    let backend = Arc::new(MockBackend::new(40_000).with_failing_trim_on(2));
    let result = remove_silence(backend.clone(), &input, &output, test_options(4, 4)).await;

    assert!(matches!(result, Err(DesilenceError::Trim(_))));
    assert!(backend.concat_parts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.mp4");

    let backend = Arc::new(MockBackend::new(10_000));
    let result = remove_silence(
        backend,
        &dir.path().join("missing.mp4"),
        &output,
        test_options(2, 1),
    )
    .await;

    assert!(matches!(result, Err(DesilenceError::FileNotFound(_))));
}

#[tokio::test]
async fn test_single_part_round_trip_duration() {
    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path());
    let output = dir.path().join("out.mp4");

    // One chunk, fully loud audio: everything is retained.
    struct LoudBackend(MockBackend);

    #[async_trait]
    impl MediaBackend for LoudBackend {
        async fn probe_duration(&self, input: &Path) -> Result<u64> {
            self.0.probe_duration(input).await
        }
        async fn extract_range(
            &self,
            input: &Path,
            output: &Path,
            start_ms: u64,
            end_ms: u64,
        ) -> Result<()> {
            self.0.extract_range(input, output, start_ms, end_ms).await
        }
        async fn extract_audio(&self, _input: &Path, output: &Path) -> Result<()> {
            AudioClip::new(vec![10_000i16; 10_000], 1000, 1).save(output)
        }
        async fn trim_and_mux(
            &self,
            video: &Path,
            audio: &Path,
            output: &Path,
            intervals: &[Interval],
        ) -> Result<()> {
            self.0.trim_and_mux(video, audio, output, intervals).await
        }
        async fn concatenate(
            &self,
            manifest_dir: &Path,
            parts: &[PathBuf],
            output: &Path,
        ) -> Result<()> {
            self.0.concatenate(manifest_dir, parts, output).await
        }
    }

    let backend = Arc::new(LoudBackend(MockBackend::new(10_000)));
    let result = remove_silence(backend.clone(), &input, &output, test_options(1, 1))
        .await
        .unwrap();

    // A fully non-silent input keeps its whole duration.
    assert_eq!(result.stats.kept_duration_ms, result.stats.input_duration_ms);
    let trim_calls = backend.0.trim_calls.lock().unwrap();
    assert_eq!(trim_calls[0].1, vec![Interval::new(0, 10_000)]);
}
