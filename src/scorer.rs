//! Transition quality between two analysed tracks.
//!
//! The quality of moving from one track to another is `1 / (1 + d)`, where `d`
//! sums the absolute tempo, key and energy differences and the Euclidean
//! distance between the timbral fingerprints. A perfect transition (identical
//! features) scores 1.0 and the score falls towards 0 as the tracks diverge.

use crate::error::DimensionMismatch;
use crate::features::FeatureRecord;

/// Scores how well one track leads into another.
///
/// Scores are in `(0, 1]`, higher is smoother. The direction is part of the
/// signature: the sequencer evaluates both `score(a, b)` and `score(b, a)` so
/// an asymmetric implementation changes its choices.
pub trait TransitionScorer {
    fn score(&self, from: &FeatureRecord, to: &FeatureRecord) -> Result<f64, DimensionMismatch>;
}

/// Distance-based scorer. Symmetric: `score(a, b) == score(b, a)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceScorer;

impl TransitionScorer for DistanceScorer {
    fn score(&self, from: &FeatureRecord, to: &FeatureRecord) -> Result<f64, DimensionMismatch> {
        Ok(1.0 / (1.0 + distance(from, to)?))
    }
}

/// Score a transition with the default [`DistanceScorer`].
pub fn score(from: &FeatureRecord, to: &FeatureRecord) -> Result<f64, DimensionMismatch> {
    DistanceScorer.score(from, to)
}

/// Combined feature distance between two records.
///
/// # Returns
/// Sum of |Δtempo| + |Δkey| + |Δenergy| + ‖Δfingerprint‖, always ≥ 0
///
/// # Errors
/// `DimensionMismatch` if the fingerprints have different lengths
pub fn distance(from: &FeatureRecord, to: &FeatureRecord) -> Result<f64, DimensionMismatch> {
    let fingerprint = fingerprint_distance(from.fingerprint(), to.fingerprint()).ok_or_else(|| {
        DimensionMismatch {
            from: from.path().to_path_buf(),
            to: to.path().to_path_buf(),
            from_len: from.fingerprint().len(),
            to_len: to.fingerprint().len(),
        }
    })?;

    let tempo = (from.tempo() - to.tempo()).abs();
    let key = (from.key() - to.key()).abs();
    let energy = (from.energy() - to.energy()).abs();

    Ok(tempo + key + energy + fingerprint)
}

/// Euclidean norm of `a - b`, or `None` when the lengths differ.
pub fn fingerprint_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let sum_squares: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sum_squares.sqrt())
}
