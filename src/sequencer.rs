//! Playlist ordering by greedy recursive merge.
//!
//! The record list is split at its midpoint, each half is ordered
//! recursively, and the two halves are merged. At every merge step the heads
//! of both halves are compared in both directions with a
//! [`TransitionScorer`] and the winning head is emitted. This clusters
//! similar-sounding tracks locally; there is no global optimality guarantee.
//!
//! The recursion works on record indices with two read-only cursors per merge,
//! so no element is ever removed from the front of a list.

use crate::error::DimensionMismatch;
use crate::features::FeatureRecord;
use crate::scorer::{DistanceScorer, TransitionScorer};
use std::str::FromStr;
use tracing::debug;

/// Which head is emitted when both transition scores are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The right head wins only when its score is strictly greater.
    #[default]
    PreferLeft,
    /// The left head wins only when its score is strictly greater.
    PreferRight,
}

impl TieBreak {
    pub fn as_str(&self) -> &str {
        match self {
            TieBreak::PreferLeft => "left",
            TieBreak::PreferRight => "right",
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(TieBreak::PreferLeft),
            "right" => Ok(TieBreak::PreferRight),
            _ => Err(format!("Unsupported tie break: {} (expected left or right)", s)),
        }
    }
}

/// Orders feature records so neighbouring tracks transition smoothly.
#[derive(Debug, Clone, Default)]
pub struct Sequencer<S = DistanceScorer> {
    scorer: S,
    tie_break: TieBreak,
}

impl<S: TransitionScorer> Sequencer<S> {
    pub fn new(scorer: S, tie_break: TieBreak) -> Self {
        Sequencer { scorer, tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Order `records` into a playlist.
    ///
    /// The output is a permutation of the input: every record appears exactly
    /// once. Lists of zero or one record are returned unchanged.
    ///
    /// # Errors
    /// `DimensionMismatch` from the scorer when two compared records have
    /// fingerprints of different lengths
    pub fn sequence(&self, records: Vec<FeatureRecord>) -> Result<Vec<FeatureRecord>, DimensionMismatch> {
        if records.len() <= 1 {
            return Ok(records);
        }

        let mut comparisons = 0usize;
        let order = self.order(&records, 0, records.len(), &mut comparisons)?;
        debug!(
            records = records.len(),
            comparisons,
            tie_break = self.tie_break.as_str(),
            "Sequenced records"
        );

        let mut slots: Vec<Option<FeatureRecord>> = records.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect())
    }

    /// Ordered indices of `records[lo..hi]`.
    fn order(
        &self,
        records: &[FeatureRecord],
        lo: usize,
        hi: usize,
        comparisons: &mut usize,
    ) -> Result<Vec<usize>, DimensionMismatch> {
        if hi - lo <= 1 {
            return Ok((lo..hi).collect());
        }

        let mid = lo + (hi - lo) / 2;
        let left = self.order(records, lo, mid, comparisons)?;
        let right = self.order(records, mid, hi, comparisons)?;
        self.merge(records, &left, &right, comparisons)
    }

    fn merge(
        &self,
        records: &[FeatureRecord],
        left: &[usize],
        right: &[usize],
        comparisons: &mut usize,
    ) -> Result<Vec<usize>, DimensionMismatch> {
        let mut merged = Vec::with_capacity(left.len() + right.len());
        let (mut i, mut j) = (0, 0);

        while i < left.len() && j < right.len() {
            let l = &records[left[i]];
            let r = &records[right[j]];
            let left_to_right = self.scorer.score(l, r)?;
            let right_to_left = self.scorer.score(r, l)?;
            *comparisons += 1;

            // Both directions are scored even though the distance scorer is
            // symmetric; an asymmetric scorer must still be honoured.
            let take_right = match self.tie_break {
                TieBreak::PreferLeft => right_to_left > left_to_right,
                TieBreak::PreferRight => !(left_to_right > right_to_left),
            };

            if take_right {
                merged.push(right[j]);
                j += 1;
            } else {
                merged.push(left[i]);
                i += 1;
            }
        }

        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);
        Ok(merged)
    }
}

/// Sequence records with the default scorer and tie break.
pub fn sequence(records: Vec<FeatureRecord>) -> Result<Vec<FeatureRecord>, DimensionMismatch> {
    Sequencer::new(DistanceScorer, TieBreak::default()).sequence(records)
}
