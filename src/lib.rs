pub mod audio_analysis;
pub mod collector;
pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod features;
pub mod mfcc;
pub mod playlist;
pub mod scorer;
pub mod sequencer;

#[cfg(test)]
mod test_util;

pub use collector::collect;
pub use config::{CollectorConfig, Config, ErrorPolicy, PlaylistOptions};
pub use error::{CollectionError, ConfigError, DimensionMismatch, ExtractionError, PlaylistError};
pub use extractor::{extract_all, FeatureExtractor, SymphoniaExtractor};
pub use features::FeatureRecord;
pub use playlist::{build_playlist, Playlist, PlaylistDriver};
pub use scorer::{score, DistanceScorer, TransitionScorer};
pub use sequencer::{sequence, Sequencer, TieBreak};
