//! Whole-file decoding to mono PCM.
//!
//! Uses symphonia for container probing and decoding, so anything it has a
//! reader and codec for (MP3, FLAC, WAV, ...) can be analysed.

use crate::error::ExtractionError;
use std::fs::File;
use std::io;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// A fully decoded audio file.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0] (channels averaged)
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode the first audio track of `path` into mono f32 samples.
///
/// Packets that fail to decode are skipped with a warning; any other
/// decoder or container error aborts.
///
/// # Errors
/// `Open`, `Probe`, `NoAudioTrack`, `Decode`, or `Empty` when not a single
/// sample could be decoded
pub fn decode_file(path: &Path) -> Result<DecodedAudio, ExtractionError> {
    let file = File::open(path).map_err(|source| ExtractionError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // The extension helps the probe pick a reader
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|source| ExtractionError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ExtractionError::NoAudioTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|source| ExtractionError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let mut samples: Vec<f32> = Vec::new();
    let mut bad_packets = 0usize;

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(source) => {
                return Err(ExtractionError::Decode {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channels.get_or_insert(spec.channels.count());
                append_mono(&decoded, &mut samples);
            }
            Err(SymphoniaError::DecodeError(reason)) => {
                bad_packets += 1;
                warn!(path = %path.display(), reason, "Skipping undecodable packet");
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(source) => {
                return Err(ExtractionError::Decode {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    let sample_rate = match sample_rate {
        Some(rate) if !samples.is_empty() => rate,
        _ => return Err(ExtractionError::Empty(path.to_path_buf())),
    };

    let audio = DecodedAudio {
        samples,
        sample_rate,
        channels: channels.unwrap_or(1),
    };

    debug!(
        path = %path.display(),
        sample_rate = audio.sample_rate,
        channels = audio.channels,
        duration = format!("{:.2}s", audio.duration_seconds()),
        bad_packets,
        "Decoded audio file"
    );

    Ok(audio)
}

/// Average all channels of a decoded buffer and append the result.
fn append_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => mix_down(&**buf, out),
        AudioBufferRef::U16(buf) => mix_down(&**buf, out),
        AudioBufferRef::U24(buf) => mix_down(&**buf, out),
        AudioBufferRef::U32(buf) => mix_down(&**buf, out),
        AudioBufferRef::S8(buf) => mix_down(&**buf, out),
        AudioBufferRef::S16(buf) => mix_down(&**buf, out),
        AudioBufferRef::S24(buf) => mix_down(&**buf, out),
        AudioBufferRef::S32(buf) => mix_down(&**buf, out),
        AudioBufferRef::F32(buf) => mix_down(&**buf, out),
        AudioBufferRef::F64(buf) => mix_down(&**buf, out),
    }
}

fn mix_down<S: Sample>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    let num_frames = buf.frames();
    if num_channels == 0 {
        return;
    }

    out.reserve(num_frames);
    for frame in 0..num_frames {
        let mut sum = 0.0f32;
        for ch in 0..num_channels {
            sum += f32::from_sample(buf.chan(ch)[frame]);
        }
        out.push(sum / num_channels as f32);
    }
}
