//! Audio analysis utilities: frame energy, tempo, tuning and timbre.
//!
//! [`analyze`] makes a single pass of Hann-windowed FFT frames over a mono
//! signal and derives every per-track feature from it.

use crate::config::DEFAULT_FINGERPRINT_SIZE;
use crate::mfcc::MfccAccumulator;
use chfft::RFft1D;

/// Analysis frame length in samples.
pub const FRAME_SIZE: usize = 2048;

/// Hop between consecutive frames in samples.
pub const HOP_SIZE: usize = 512;

const MIN_BPM: f64 = 30.0;
const MAX_BPM: f64 = 300.0;
const PRIOR_BPM: f64 = 120.0;

/// Pitch candidates are only taken from this band.
const PITCH_FMIN: f32 = 150.0;
const PITCH_FMAX: f32 = 4000.0;

const TUNING_RESOLUTION: f64 = 0.01;

const EPSILON: f32 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub frame_size: usize,
    pub hop_size: usize,
    /// Number of MFCC coefficients in the fingerprint
    pub n_mfcc: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            frame_size: FRAME_SIZE,
            hop_size: HOP_SIZE,
            n_mfcc: DEFAULT_FINGERPRINT_SIZE,
        }
    }
}

/// Raw analysis output for one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFeatures {
    /// Beats per minute, 0 when no periodicity was found
    pub tempo: f64,
    /// Deviation from A440 tuning in fractions of a semitone, in [-0.5, 0.5)
    pub tuning: f64,
    /// Mean frame RMS
    pub energy: f64,
    /// Mean MFCC vector
    pub mfcc: Vec<f64>,
}

/// Analyse a mono signal.
///
/// Signals shorter than one frame are zero-padded to a single frame; an
/// empty signal yields zero tempo, tuning and energy and an all-zero MFCC.
///
/// # Arguments
/// * `samples` - Mono samples in [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz
/// * `settings` - Frame geometry and fingerprint size
pub fn analyze(samples: &[f32], sample_rate: u32, settings: &AnalysisSettings) -> TrackFeatures {
    let frame_size = settings.frame_size.max(2);
    let hop_size = settings.hop_size.max(1);

    let window = hann_window(frame_size);
    let mut fft = RFft1D::<f32>::new(frame_size);
    let mut mfcc = MfccAccumulator::new(frame_size, sample_rate);

    let mut rms_values = Vec::new();
    let mut envelope = Vec::new();
    let mut pitches = Vec::new();
    let mut previous: Option<Vec<f32>> = None;
    let mut frame = vec![0.0f32; frame_size];

    for start in frame_starts(samples.len(), frame_size, hop_size) {
        let end = (start + frame_size).min(samples.len());
        let chunk = &samples[start..end];

        rms_values.push(frame_rms(chunk, frame_size));

        for (i, slot) in frame.iter_mut().enumerate() {
            *slot = chunk.get(i).map_or(0.0, |s| s * window[i]);
        }

        let spectrum = fft.forward(&frame);
        let magnitude: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();
        let power: Vec<f32> = magnitude.iter().map(|m| m * m).collect();
        mfcc.push(&power);

        collect_pitches(&magnitude, sample_rate, frame_size, &mut pitches);

        let compressed: Vec<f32> = magnitude.iter().map(|m| (1.0 + 100.0 * m).ln()).collect();
        if let Some(prev) = &previous {
            envelope.push(spectral_flux(prev, &compressed));
        }
        previous = Some(compressed);
    }

    let frame_rate = sample_rate as f64 / hop_size as f64;

    TrackFeatures {
        tempo: estimate_tempo(&envelope, frame_rate),
        tuning: estimate_tuning(&pitches),
        energy: mean(&rms_values),
        mfcc: mfcc.finish(settings.n_mfcc),
    }
}

/// Start offsets of analysis frames.
fn frame_starts(len: usize, frame_size: usize, hop_size: usize) -> impl Iterator<Item = usize> {
    let count = match len {
        0 => 0,
        n if n <= frame_size => 1,
        n => (n - frame_size) / hop_size + 1,
    };
    (0..count).map(move |i| i * hop_size)
}

pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 - 0.5 * phase.cos()
        })
        .collect()
}

/// RMS of one frame; missing samples past the end of the signal count as zeros.
pub fn frame_rms(chunk: &[f32], frame_size: usize) -> f32 {
    if frame_size == 0 {
        return 0.0;
    }
    let sum_squares: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / frame_size as f64).sqrt() as f32
}

/// Frame RMS values over a whole signal.
pub fn compute_rms_frames(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    frame_starts(samples.len(), frame_size, hop_size.max(1))
        .map(|start| {
            let end = (start + frame_size).min(samples.len());
            frame_rms(&samples[start..end], frame_size)
        })
        .collect()
}

fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Half-wave rectified difference between consecutive compressed spectra.
fn spectral_flux(previous: &[f32], current: &[f32]) -> f32 {
    let total: f32 = previous
        .iter()
        .zip(current)
        .map(|(p, c)| (c - p).max(0.0))
        .sum();
    total / current.len().max(1) as f32
}

/// Estimate tempo from an onset-strength envelope.
///
/// Autocorrelates the mean-removed envelope over lags covering 30-300 BPM and
/// weights each lag with a log-normal prior centred on 120 BPM (one octave
/// standard deviation). The winning lag is refined by parabolic
/// interpolation.
///
/// # Arguments
/// * `envelope` - Onset strength, one value per frame
/// * `frame_rate` - Envelope frames per second
///
/// # Returns
/// Tempo in BPM, or 0.0 for a flat or too-short envelope
pub fn estimate_tempo(envelope: &[f32], frame_rate: f64) -> f64 {
    if envelope.len() < 4 || frame_rate <= 0.0 {
        return 0.0;
    }

    let avg = mean(envelope);
    let centered: Vec<f64> = envelope.iter().map(|&v| v as f64 - avg).collect();
    let energy: f64 = centered.iter().map(|v| v * v).sum();
    if energy <= 1e-12 {
        return 0.0;
    }

    let min_lag = ((60.0 * frame_rate / MAX_BPM).floor() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / MIN_BPM).ceil() as usize).min(centered.len() - 1);
    if min_lag >= max_lag {
        return 0.0;
    }

    let autocorr: Vec<f64> = (0..=max_lag)
        .map(|lag| {
            if lag < min_lag {
                return 0.0;
            }
            let sum: f64 = centered
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum();
            sum / energy
        })
        .collect();

    let prior = |lag: f64| {
        let octaves = (60.0 * frame_rate / lag / PRIOR_BPM).log2();
        (-0.5 * octaves * octaves).exp()
    };

    let best = (min_lag..=max_lag)
        .filter(|&lag| autocorr[lag] > 0.0)
        .max_by(|&a, &b| {
            let wa = autocorr[a] * prior(a as f64);
            let wb = autocorr[b] * prior(b as f64);
            wa.total_cmp(&wb)
        });

    let Some(best) = best else {
        return 0.0;
    };

    let mut lag = best as f64;
    if best > min_lag && best < max_lag {
        let (a, b, c) = (autocorr[best - 1], autocorr[best], autocorr[best + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-12 {
            lag += (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
        }
    }

    60.0 * frame_rate / lag
}

/// Append `(frequency, magnitude)` pitch candidates found in one spectrum.
///
/// Candidates are local maxima above 10% of the frame's peak inside
/// 150-4000 Hz, with frequency refined by parabolic interpolation on log
/// magnitude.
pub fn collect_pitches(
    magnitude: &[f32],
    sample_rate: u32,
    frame_size: usize,
    out: &mut Vec<(f32, f32)>,
) {
    if magnitude.len() < 3 || frame_size == 0 {
        return;
    }

    let bin_hz = sample_rate as f32 / frame_size as f32;
    let lo = ((PITCH_FMIN / bin_hz).ceil() as usize).max(1);
    let hi = ((PITCH_FMAX / bin_hz).floor() as usize).min(magnitude.len() - 2);
    if lo > hi {
        return;
    }

    let peak = magnitude[lo..=hi].iter().fold(0.0f32, |m, &v| m.max(v));
    if peak <= EPSILON {
        return;
    }
    let threshold = 0.1 * peak;

    for k in lo..=hi {
        let m = magnitude[k];
        if m <= threshold || m <= magnitude[k - 1] || m < magnitude[k + 1] {
            continue;
        }

        let a = (magnitude[k - 1] + EPSILON).ln();
        let b = (m + EPSILON).ln();
        let c = (magnitude[k + 1] + EPSILON).ln();
        let denom = a - 2.0 * b + c;
        let offset = if denom.abs() > EPSILON {
            (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };

        out.push(((k as f32 + offset) * bin_hz, m));
    }
}

/// Estimate tuning deviation from A440 out of pitch candidates.
///
/// Candidates quieter than the median magnitude are dropped; the remaining
/// ones are reduced to their offset from the nearest equal-tempered semitone
/// and the mode of a histogram with 0.01 semitone bins is returned.
///
/// # Returns
/// Tuning in [-0.5, 0.5), or 0.0 with no candidates
pub fn estimate_tuning(pitches: &[(f32, f32)]) -> f64 {
    let mut magnitudes: Vec<f32> = pitches
        .iter()
        .filter(|(f, _)| *f > 0.0)
        .map(|&(_, m)| m)
        .collect();
    if magnitudes.is_empty() {
        return 0.0;
    }
    magnitudes.sort_by(|a, b| a.total_cmp(b));
    let median = magnitudes[magnitudes.len() / 2];

    let bins = (1.0 / TUNING_RESOLUTION).round() as usize;
    let mut histogram = vec![0usize; bins];
    for &(freq, mag) in pitches {
        if freq <= 0.0 || mag < median {
            continue;
        }
        let semitones = 12.0 * (freq as f64 / 440.0).log2();
        let mut residual = semitones - semitones.round();
        if residual >= 0.5 {
            residual -= 1.0;
        }
        let index = ((residual + 0.5) / TUNING_RESOLUTION).floor() as usize;
        histogram[index.min(bins - 1)] += 1;
    }

    let mode = histogram
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(i, _)| i)
        .unwrap_or(bins / 2);

    -0.5 + mode as f64 * TUNING_RESOLUTION
}
