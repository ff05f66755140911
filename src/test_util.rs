//! WAV fixtures for unit tests.

use std::path::Path;

fn mono_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Write a mono 16-bit sine tone.
pub fn write_tone_wav(path: &Path, sample_rate: u32, freq: f32, amplitude: f32, seconds: f32) {
    let mut writer = hound::WavWriter::create(path, mono_spec(sample_rate)).unwrap();
    let n = (sample_rate as f32 * seconds) as usize;
    for i in 0..n {
        let t = i as f32 / sample_rate as f32;
        let value = amplitude * (2.0 * std::f32::consts::PI * freq * t).sin();
        writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Write a stereo file holding constant `left` and `right` sample values.
pub fn write_stereo_wav(path: &Path, sample_rate: u32, frames: usize, left: i16, right: i16) {
    let spec = hound::WavSpec {
        channels: 2,
        ..mono_spec(sample_rate)
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..frames {
        writer.write_sample(left).unwrap();
        writer.write_sample(right).unwrap();
    }
    writer.finalize().unwrap();
}

/// Write a click track: a 10 ms 1 kHz burst every `period` samples.
pub fn write_click_wav(path: &Path, sample_rate: u32, period: usize, seconds: f32) {
    let mut writer = hound::WavWriter::create(path, mono_spec(sample_rate)).unwrap();
    let burst = sample_rate as usize / 100;
    let n = (sample_rate as f32 * seconds) as usize;
    for i in 0..n {
        let offset = i % period;
        let value = if offset < burst {
            let t = offset as f32 / sample_rate as f32;
            let decay = 1.0 - offset as f32 / burst as f32;
            0.8 * decay * (2.0 * std::f32::consts::PI * 1000.0 * t).sin()
        } else {
            0.0
        };
        writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}
