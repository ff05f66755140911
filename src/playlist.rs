//! Playlist driver: collect, extract, sequence.

use crate::collector::collect;
use crate::config::PlaylistOptions;
use crate::error::{ExtractionError, PlaylistError};
use crate::extractor::{extract_all, FeatureExtractor, SymphoniaExtractor};
use crate::features::FeatureRecord;
use crate::scorer::{DistanceScorer, TransitionScorer};
use crate::sequencer::Sequencer;
use std::path::{Path, PathBuf};
use tracing::info;

/// The result of one run.
#[derive(Debug, Default)]
pub struct Playlist {
    /// Files in playback order
    pub entries: Vec<PathBuf>,
    /// Files that failed analysis and were left out (skip policy only)
    pub skipped: Vec<ExtractionError>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs the whole pipeline for a directory.
pub struct PlaylistDriver<E = SymphoniaExtractor, S = DistanceScorer> {
    extractor: E,
    sequencer: Sequencer<S>,
    options: PlaylistOptions,
}

impl PlaylistDriver {
    /// Driver with the symphonia extractor and the distance scorer.
    pub fn from_options(options: PlaylistOptions) -> Self {
        let extractor = SymphoniaExtractor::with_fingerprint_size(options.fingerprint_size);
        PlaylistDriver::new(extractor, DistanceScorer, options)
    }
}

impl<E: FeatureExtractor, S: TransitionScorer> PlaylistDriver<E, S> {
    pub fn new(extractor: E, scorer: S, options: PlaylistOptions) -> Self {
        PlaylistDriver {
            extractor,
            sequencer: Sequencer::new(scorer, options.tie_break),
            options,
        }
    }

    pub fn options(&self) -> &PlaylistOptions {
        &self.options
    }

    /// Build a playlist from every recognised audio file under `directory`.
    ///
    /// With the default abort policy any failure ends the run. Under the
    /// skip policy files that fail analysis are reported in
    /// [`Playlist::skipped`] instead.
    pub fn build(&self, directory: &Path) -> Result<Playlist, PlaylistError> {
        let paths = collect(directory, &self.options.collector)?;
        let outcome = extract_all(
            &self.extractor,
            &paths,
            self.options.jobs,
            self.options.on_error,
        )?;
        let ordered = self.sequencer.sequence(outcome.records)?;

        let playlist = Playlist {
            entries: ordered.into_iter().map(FeatureRecord::into_path).collect(),
            skipped: outcome.failures,
        };

        info!(
            directory = %directory.display(),
            tracks = playlist.len(),
            skipped = playlist.skipped.len(),
            "Playlist built"
        );
        Ok(playlist)
    }
}

/// Build a playlist for `directory` with default settings.
///
/// # Returns
/// The files in playback order
pub fn build_playlist(directory: &Path) -> Result<Vec<PathBuf>, PlaylistError> {
    PlaylistDriver::from_options(PlaylistOptions::default())
        .build(directory)
        .map(|playlist| playlist.entries)
}
