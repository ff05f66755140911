//! Feature extraction: one [`FeatureRecord`] per audio file.

use crate::audio_analysis::{analyze, AnalysisSettings};
use crate::config::ErrorPolicy;
use crate::decoder::decode_file;
use crate::error::ExtractionError;
use crate::features::FeatureRecord;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};

/// Produces a feature record for an audio file.
///
/// Implementations must be deterministic for a given file. They are shared
/// across extraction threads, hence `Send + Sync`.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<FeatureRecord, ExtractionError>;
}

impl<F> FeatureExtractor for F
where
    F: Fn(&Path) -> Result<FeatureRecord, ExtractionError> + Send + Sync,
{
    fn extract(&self, path: &Path) -> Result<FeatureRecord, ExtractionError> {
        self(path)
    }
}

/// Decodes with symphonia and analyses the whole file.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaExtractor {
    settings: AnalysisSettings,
}

impl SymphoniaExtractor {
    pub fn new(settings: AnalysisSettings) -> Self {
        SymphoniaExtractor { settings }
    }

    pub fn with_fingerprint_size(n_mfcc: usize) -> Self {
        SymphoniaExtractor {
            settings: AnalysisSettings {
                n_mfcc,
                ..AnalysisSettings::default()
            },
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }
}

impl FeatureExtractor for SymphoniaExtractor {
    fn extract(&self, path: &Path) -> Result<FeatureRecord, ExtractionError> {
        let audio = decode_file(path)?;
        let features = analyze(&audio.samples, audio.sample_rate, &self.settings);

        let record = FeatureRecord::new(
            path,
            features.tempo,
            features.tuning,
            features.energy,
            features.mfcc,
        );
        record.validate()?;

        debug!(
            path = %path.display(),
            tempo = format!("{:.1}", record.tempo()),
            key = format!("{:+.2}", record.key()),
            energy = format!("{:.4}", record.energy()),
            "Extracted features"
        );
        Ok(record)
    }
}

/// Records extracted from a batch of files.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Successful records, in input path order
    pub records: Vec<FeatureRecord>,
    /// Files left out under [`ErrorPolicy::Skip`], in input path order
    pub failures: Vec<ExtractionError>,
}

/// Extract features for every path.
///
/// With `jobs > 1` the paths are split into contiguous chunks, one scoped
/// thread per chunk. Results are always reassembled in input order, so the
/// outcome does not depend on `jobs`: under [`ErrorPolicy::Abort`] the
/// returned error is the first failure in path order.
///
/// # Arguments
/// * `extractor` - Extractor shared by all workers
/// * `paths` - Files to analyse
/// * `jobs` - Worker thread count (0 and 1 both mean sequential)
/// * `policy` - Abort on the first failure, or skip failed files
pub fn extract_all<E: FeatureExtractor + ?Sized>(
    extractor: &E,
    paths: &[PathBuf],
    jobs: usize,
    policy: ErrorPolicy,
) -> Result<ExtractionOutcome, ExtractionError> {
    info!(
        files = paths.len(),
        jobs = jobs.max(1),
        policy = policy.as_str(),
        "Extracting features"
    );

    let results = if jobs <= 1 || paths.len() <= 1 {
        extract_chunk(extractor, paths, policy)
    } else {
        let chunk_size = paths.len().div_ceil(jobs);
        thread::scope(|scope| {
            let handles: Vec<_> = paths
                .chunks(chunk_size)
                .map(|chunk| {
                    let first = chunk[0].clone();
                    (first, scope.spawn(move || extract_chunk(extractor, chunk, policy)))
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|(first, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| vec![Err(ExtractionError::Worker(first))])
                })
                .collect::<Vec<_>>()
        })
    };

    let mut outcome = ExtractionOutcome::default();
    for result in results {
        match result {
            Ok(record) => outcome.records.push(record),
            Err(err) => match policy {
                ErrorPolicy::Abort => return Err(err),
                ErrorPolicy::Skip => {
                    warn!(path = %err.path().display(), error = %err, "Skipping file");
                    outcome.failures.push(err);
                }
            },
        }
    }

    info!(
        extracted = outcome.records.len(),
        skipped = outcome.failures.len(),
        "Feature extraction complete"
    );
    Ok(outcome)
}

/// Extract a run of paths in order, stopping after the first failure when aborting.
fn extract_chunk<E: FeatureExtractor + ?Sized>(
    extractor: &E,
    paths: &[PathBuf],
    policy: ErrorPolicy,
) -> Vec<Result<FeatureRecord, ExtractionError>> {
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let result = extractor.extract(path);
        let failed = result.is_err();
        results.push(result);
        if failed && policy == ErrorPolicy::Abort {
            break;
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{write_click_wav, write_tone_wav};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fake_record(path: &Path) -> FeatureRecord {
        let len = path.to_string_lossy().len() as f64;
        FeatureRecord::new(path, len, 0.0, 0.1, vec![len, 0.0])
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_extract_all_preserves_order() {
        let input = paths(&["a", "bb", "ccc", "dddd", "eeeee", "ffffff", "g"]);
        let extractor =
            |path: &Path| -> Result<FeatureRecord, ExtractionError> { Ok(fake_record(path)) };

        for jobs in [1, 2, 3, 8] {
            let outcome = extract_all(&extractor, &input, jobs, ErrorPolicy::Abort).unwrap();
            let got: Vec<&Path> = outcome.records.iter().map(|r| r.path()).collect();
            let expected: Vec<&Path> = input.iter().map(|p| p.as_path()).collect();
            assert_eq!(got, expected, "jobs = {}", jobs);
            assert!(outcome.failures.is_empty());
        }
    }

    #[test]
    fn test_abort_reports_first_failure_in_path_order() {
        let input = paths(&["ok1", "bad1", "ok2", "ok3", "bad2", "ok4"]);
        let extractor = |path: &Path| -> Result<FeatureRecord, ExtractionError> {
            if path.to_string_lossy().starts_with("bad") {
                Err(ExtractionError::Empty(path.to_path_buf()))
            } else {
                Ok(fake_record(path))
            }
        };

        for jobs in [1, 2, 6] {
            let err = extract_all(&extractor, &input, jobs, ErrorPolicy::Abort).unwrap_err();
            assert_eq!(err.path(), Path::new("bad1"), "jobs = {}", jobs);
        }
    }

    #[test]
    fn test_abort_stops_extracting_sequentially() {
        let calls = AtomicUsize::new(0);
        let input = paths(&["bad", "ok1", "ok2"]);
        let extractor = |path: &Path| -> Result<FeatureRecord, ExtractionError> {
            calls.fetch_add(1, Ordering::SeqCst);
            if path == Path::new("bad") {
                Err(ExtractionError::Empty(path.to_path_buf()))
            } else {
                Ok(fake_record(path))
            }
        };

        assert!(extract_all(&extractor, &input, 1, ErrorPolicy::Abort).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_skip_collects_failures() {
        let input = paths(&["ok1", "bad1", "ok2", "bad2"]);
        let extractor = |path: &Path| -> Result<FeatureRecord, ExtractionError> {
            if path.to_string_lossy().starts_with("bad") {
                Err(ExtractionError::NoAudioTrack(path.to_path_buf()))
            } else {
                Ok(fake_record(path))
            }
        };

        for jobs in [1, 3] {
            let outcome = extract_all(&extractor, &input, jobs, ErrorPolicy::Skip).unwrap();
            assert_eq!(outcome.records.len(), 2);
            let failed: Vec<&Path> = outcome.failures.iter().map(|e| e.path()).collect();
            assert_eq!(failed, [Path::new("bad1"), Path::new("bad2")]);
        }
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let input = paths(&["a", "b", "c", "d"]);
        let extractor = |path: &Path| -> Result<FeatureRecord, ExtractionError> {
            if path == Path::new("c") {
                panic!("decoder blew up");
            }
            Ok(fake_record(path))
        };

        let err = extract_all(&extractor, &input, 2, ErrorPolicy::Abort).unwrap_err();
        assert!(matches!(err, ExtractionError::Worker(p) if p == Path::new("c")));
    }

    #[test]
    fn test_symphonia_extractor_on_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone_wav(&path, 22050, 440.0, 0.5, 2.0);

        let record = SymphoniaExtractor::default().extract(&path).unwrap();
        assert_eq!(record.path(), path.as_path());
        assert_eq!(record.fingerprint().len(), 20);
        assert!((record.energy() - 0.3536).abs() < 0.01);
        assert!(record.key().abs() <= 0.02);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_symphonia_extractor_tempo_of_click_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicks.wav");
        // One click every 20 hops: 60 * 22050 / 10240 BPM
        write_click_wav(&path, 22050, 10240, 12.0);

        let record = SymphoniaExtractor::default().extract(&path).unwrap();
        let expected = 60.0 * 22050.0 / 10240.0;
        assert!(
            (record.tempo() - expected).abs() / expected < 0.03,
            "tempo = {}",
            record.tempo()
        );
    }

    #[test]
    fn test_fingerprint_size_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone_wav(&path, 16000, 300.0, 0.2, 0.5);

        let record = SymphoniaExtractor::with_fingerprint_size(13).extract(&path).unwrap();
        assert_eq!(record.fingerprint().len(), 13);
    }

    #[test]
    fn test_symphonia_extractor_rejects_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.flac");
        fs::write(&path, "not audio at all").unwrap();

        let err = SymphoniaExtractor::default().extract(&path).unwrap_err();
        assert_eq!(err.path(), path.as_path());
    }
}
