//! Per-track acoustic feature records.

use crate::error::ExtractionError;
use std::path::{Path, PathBuf};

/// Acoustic descriptors computed for one audio file.
///
/// Records are immutable once produced: the fields are private and only
/// readable through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    path: PathBuf,
    tempo: f64,
    key: f64,
    energy: f64,
    fingerprint: Vec<f64>,
}

impl FeatureRecord {
    /// Build a record from already computed values.
    ///
    /// No validation happens here; see [`FeatureRecord::validate`].
    pub fn new(
        path: impl Into<PathBuf>,
        tempo: f64,
        key: f64,
        energy: f64,
        fingerprint: Vec<f64>,
    ) -> Self {
        FeatureRecord {
            path: path.into(),
            tempo,
            key,
            energy,
            fingerprint,
        }
    }

    /// Source file this record was computed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Estimated tempo in beats per minute.
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Key estimate (tuning deviation in fractions of a semitone).
    pub fn key(&self) -> f64 {
        self.key
    }

    /// Mean RMS energy.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Timbral fingerprint (mean MFCC vector).
    pub fn fingerprint(&self) -> &[f64] {
        &self.fingerprint
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Check that every field holds a usable value.
    ///
    /// All values must be finite; tempo and energy must also be non-negative.
    ///
    /// # Returns
    /// The name of the first offending field as an `ExtractionError::NonFinite`
    pub fn validate(&self) -> Result<(), ExtractionError> {
        let invalid = |field: &'static str| ExtractionError::NonFinite {
            path: self.path.clone(),
            field,
        };

        if !self.tempo.is_finite() || self.tempo < 0.0 {
            return Err(invalid("tempo"));
        }
        if !self.key.is_finite() {
            return Err(invalid("key"));
        }
        if !self.energy.is_finite() || self.energy < 0.0 {
            return Err(invalid("energy"));
        }
        if self.fingerprint.iter().any(|v| !v.is_finite()) {
            return Err(invalid("fingerprint"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let record = FeatureRecord::new("a.mp3", 120.0, 0.1, 0.3, vec![1.0, 2.0]);
        assert_eq!(record.path(), Path::new("a.mp3"));
        assert_eq!(record.tempo(), 120.0);
        assert_eq!(record.key(), 0.1);
        assert_eq!(record.energy(), 0.3);
        assert_eq!(record.fingerprint(), &[1.0, 2.0]);
        assert_eq!(record.into_path(), PathBuf::from("a.mp3"));
    }

    #[test]
    fn test_validate_accepts_finite_values() {
        let record = FeatureRecord::new("a.wav", 0.0, -0.4, 0.0, vec![-3.0, 0.0]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let cases = [
            (FeatureRecord::new("t", f64::NAN, 0.0, 0.0, vec![]), "tempo"),
            (FeatureRecord::new("t", -1.0, 0.0, 0.0, vec![]), "tempo"),
            (FeatureRecord::new("k", 1.0, f64::INFINITY, 0.0, vec![]), "key"),
            (FeatureRecord::new("e", 1.0, 0.0, -0.5, vec![]), "energy"),
            (FeatureRecord::new("f", 1.0, 0.0, 0.5, vec![0.0, f64::NAN]), "fingerprint"),
        ];

        for (record, expected) in cases {
            match record.validate() {
                Err(ExtractionError::NonFinite { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected NonFinite({}), got {:?}", expected, other),
            }
        }
    }
}
