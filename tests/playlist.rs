use autoplaylist::{
    build_playlist, Config, DistanceScorer, ErrorPolicy, ExtractionError, FeatureRecord,
    PlaylistDriver, PlaylistError, PlaylistOptions, TieBreak,
};
use std::fs;
use std::path::{Path, PathBuf};

fn write_tone(path: &Path, freq: f32, amplitude: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..22050 {
        let t = i as f32 / 22050.0;
        let value = amplitude * (2.0 * std::f32::consts::PI * freq * t).sin();
        writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Feature records keyed by file stem, for the three-track scenario.
fn scenario(path: &Path) -> Result<FeatureRecord, ExtractionError> {
    let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
    let record = match stem.as_str() {
        "a" => FeatureRecord::new(path, 120.0, 0.0, 0.1, vec![0.0, 0.0]),
        "b" => FeatureRecord::new(path, 121.0, 0.0, 0.1, vec![0.0, 0.0]),
        "c" => FeatureRecord::new(path, 180.0, 5.0, 0.9, vec![10.0, 10.0]),
        _ => return Err(ExtractionError::Empty(path.to_path_buf())),
    };
    Ok(record)
}

fn stems(entries: &[PathBuf]) -> Vec<String> {
    entries
        .iter()
        .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn similar_tracks_are_adjacent_and_outlier_at_an_end() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }

    for tie_break in [TieBreak::PreferLeft, TieBreak::PreferRight] {
        let options = PlaylistOptions {
            tie_break,
            ..PlaylistOptions::default()
        };
        let driver = PlaylistDriver::new(scenario, DistanceScorer, options);
        let order = stems(&driver.build(dir.path()).unwrap().entries);

        assert_eq!(order.len(), 3);
        let pos = |s: &str| order.iter().position(|x| x == s).unwrap();
        assert_eq!(pos("a").abs_diff(pos("b")), 1, "{:?}", order);
        assert!(pos("c") == 0 || pos("c") == 2, "{:?}", order);
    }
}

#[test]
fn decodes_and_sequences_real_wav_files() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("low.wav"), 220.0, 0.3);
    write_tone(&dir.path().join("mid.WAV"), 440.0, 0.3);
    fs::create_dir(dir.path().join("more")).unwrap();
    write_tone(&dir.path().join("more").join("high.wav"), 1760.0, 0.6);
    fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();

    let entries = build_playlist(dir.path()).unwrap();
    assert_eq!(entries.len(), 3);

    let mut sorted = stems(&entries);
    sorted.sort();
    assert_eq!(sorted, ["high", "low", "mid"]);
}

#[test]
fn parallel_extraction_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    for (i, freq) in [200.0, 300.0, 450.0, 700.0, 1100.0].iter().enumerate() {
        write_tone(&dir.path().join(format!("{}.wav", i)), *freq, 0.1 + 0.1 * i as f32);
    }

    let sequential = PlaylistDriver::from_options(PlaylistOptions::default())
        .build(dir.path())
        .unwrap();
    let parallel = PlaylistDriver::from_options(PlaylistOptions {
        jobs: 3,
        ..PlaylistOptions::default()
    })
    .build(dir.path())
    .unwrap();

    assert_eq!(sequential.entries, parallel.entries);
}

#[test]
fn undecodable_file_aborts_by_default_and_is_skipped_on_request() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("good.wav"), 440.0, 0.3);
    write_tone(&dir.path().join("other.wav"), 330.0, 0.3);
    let broken = dir.path().join("broken.mp3");
    fs::write(&broken, b"garbage bytes, not an mp3 stream").unwrap();

    match build_playlist(dir.path()) {
        Err(PlaylistError::Extraction(err)) => assert_eq!(err.path(), broken.as_path()),
        other => panic!("expected extraction failure, got {:?}", other),
    }

    let options = Config {
        on_error: Some("skip".to_string()),
        ..Config::new()
    }
    .resolve()
    .unwrap();
    assert_eq!(options.on_error, ErrorPolicy::Skip);

    let playlist = PlaylistDriver::from_options(options).build(dir.path()).unwrap();
    assert_eq!(playlist.len(), 2);
    assert_eq!(playlist.skipped.len(), 1);
    assert_eq!(playlist.skipped[0].path(), broken.as_path());
}

#[test]
fn custom_extensions_limit_collection() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("keep.wav"), 440.0, 0.3);
    fs::write(dir.path().join("ignored.mp3"), b"would fail to decode").unwrap();

    let options = Config {
        extensions: Some(vec![".WAV".to_string()]),
        ..Config::new()
    }
    .resolve()
    .unwrap();

    let playlist = PlaylistDriver::from_options(options).build(dir.path()).unwrap();
    assert_eq!(stems(&playlist.entries), ["keep"]);
}
