//! Mel-frequency cepstral coefficients.
//!
//! Power spectra are pushed frame by frame into an [`MfccAccumulator`], which
//! keeps the log-mel frames and produces the mean MFCC vector once the whole
//! file has been seen.

/// Number of mel bands.
pub const N_MELS: usize = 128;

/// Dynamic range kept below the loudest mel bin, in dB.
const TOP_DB: f32 = 80.0;

/// Power floor before taking the logarithm.
const AMIN: f32 = 1e-10;

/// HTK mel scale.
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filters over the bins of a real FFT.
///
/// Filters are area-normalised so wide high-frequency bands do not dominate.
/// Weights are stored sparsely as `(bin, weight)` pairs.
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<Vec<(usize, f32)>>,
}

impl MelFilterbank {
    /// # Arguments
    /// * `n_mels` - Number of bands
    /// * `n_fft` - FFT length (the spectrum has `n_fft / 2 + 1` bins)
    /// * `sample_rate` - Sample rate in Hz; bands span 0 to Nyquist
    pub fn new(n_mels: usize, n_fft: usize, sample_rate: u32) -> Self {
        let n_bins = n_fft / 2 + 1;
        let bin_hz = sample_rate as f32 / n_fft as f32;
        let mel_max = hz_to_mel(sample_rate as f32 / 2.0);

        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let norm = 2.0 / (hi - lo);
                (0..n_bins)
                    .filter_map(|k| {
                        let f = k as f32 * bin_hz;
                        if f <= lo || f >= hi {
                            return None;
                        }
                        let w = if f <= center {
                            (f - lo) / (center - lo)
                        } else {
                            (hi - f) / (hi - center)
                        };
                        Some((k, w * norm))
                    })
                    .collect()
            })
            .collect();

        MelFilterbank { filters }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Mel band energies of one power spectrum.
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .filter_map(|&(k, w)| power.get(k).map(|p| p * w))
                    .sum()
            })
            .collect()
    }
}

/// Orthonormal DCT-II, keeping the first `n_out` coefficients.
pub fn dct_ortho(input: &[f64], n_out: usize) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }

    let scale_0 = (1.0 / n as f64).sqrt();
    let scale_k = (2.0 / n as f64).sqrt();
    (0..n_out)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, x)| {
                    x * (std::f64::consts::PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos()
                })
                .sum();
            sum * if k == 0 { scale_0 } else { scale_k }
        })
        .collect()
}

/// Collects log-mel frames for one file.
#[derive(Debug, Clone)]
pub struct MfccAccumulator {
    filterbank: MelFilterbank,
    frames: Vec<Vec<f32>>,
}

impl MfccAccumulator {
    pub fn new(n_fft: usize, sample_rate: u32) -> Self {
        MfccAccumulator {
            filterbank: MelFilterbank::new(N_MELS, n_fft, sample_rate),
            frames: Vec::new(),
        }
    }

    /// Add one frame's power spectrum.
    pub fn push(&mut self, power: &[f32]) {
        let db = self
            .filterbank
            .apply(power)
            .into_iter()
            .map(|p| 10.0 * p.max(AMIN).log10())
            .collect();
        self.frames.push(db);
    }

    /// Mean MFCC vector over all pushed frames.
    ///
    /// Log-mel values are clamped to `TOP_DB` below the loudest value in the
    /// file before averaging. With no frames the result is all zeros.
    pub fn finish(&self, n_mfcc: usize) -> Vec<f64> {
        if self.frames.is_empty() {
            return vec![0.0; n_mfcc];
        }

        let peak = self
            .frames
            .iter()
            .flatten()
            .fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let floor = peak - TOP_DB;

        // The DCT is linear, so the mean of per-frame MFCCs equals the DCT
        // of the mean log-mel frame.
        let n_mels = self.filterbank.n_mels();
        let mut mean = vec![0.0f64; n_mels];
        for frame in &self.frames {
            for (acc, &v) in mean.iter_mut().zip(frame) {
                *acc += v.max(floor) as f64;
            }
        }
        let count = self.frames.len() as f64;
        mean.iter_mut().for_each(|v| *v /= count);

        dct_ortho(&mean, n_mfcc)
    }
}
