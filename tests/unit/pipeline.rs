use super::*;
use crate::audio::AudioSource;

struct SineDecoder;

impl AudioDecoder for SineDecoder {
    fn decode(&self, path: &Path) -> LufsResult<AudioSource> {
        let samples = (0..8_000)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 8_000.0).sin())
            .collect();
        Ok(AudioSource::from_samples(path, samples, 8_000))
    }
}

fn tiny_config(out: &Path) -> PipelineConfig {
    PipelineConfig {
        fps: 4,
        duration_secs: 1,
        canvas_width: 36,
        canvas_height: 64,
        formats: OutputFormats { video: false },
        threads: Some(2),
        out_dir: Some(out.to_path_buf()),
        ..PipelineConfig::default()
    }
}

#[test]
fn default_config_is_valid() {
    let cfg = PipelineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.duration_secs, 8);
    assert_eq!((cfg.canvas_width, cfg.canvas_height), (720, 1280));
    assert!(cfg.formats.video);
    assert_eq!(cfg.saturation, Saturation::DEFAULT);
}

#[test]
fn json_config_fills_missing_fields() {
    let cfg: PipelineConfig =
        serde_json::from_str(r#"{ "saturation": 3.5, "fps": 12, "formats": { "video": false } }"#)
            .unwrap();
    assert_eq!(cfg.saturation.value(), 2.0);
    assert_eq!(cfg.fps, 12);
    assert!(!cfg.formats.video);
    assert_eq!(cfg.duration_secs, 8);
    assert!(serde_json::from_str::<PipelineConfig>(r#"{ "fsp": 12 }"#).is_err());
}

#[test]
fn json_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{ "duration_secs": 4, "threads": 3 }"#).unwrap();
    let cfg = PipelineConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.duration_secs, 4);
    assert_eq!(cfg.threads, Some(3));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        PipelineConfig::from_json_file(&path),
        Err(LufsError::Validation(_))
    ));
}

#[test]
fn validation_rejects_bad_values() {
    let bad = [
        PipelineConfig {
            threads: Some(0),
            ..PipelineConfig::default()
        },
        PipelineConfig {
            timeout_secs: Some(-1.0),
            ..PipelineConfig::default()
        },
        PipelineConfig {
            canvas_width: 1080,
            canvas_height: 1080,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            fps: 0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            glitch_intensity: -0.1,
            ..PipelineConfig::default()
        },
    ];
    for cfg in bad {
        assert!(
            matches!(cfg.validate(), Err(LufsError::Validation(_))),
            "{cfg:?}"
        );
    }
}

#[test]
fn default_output_root_sits_next_to_the_audio() {
    let cfg = PipelineConfig::default();
    assert_eq!(
        cfg.output_root(Path::new("/music/Track One.wav")),
        PathBuf::from("/music/id_Track One_wav_sat1.0")
    );
    let cfg = PipelineConfig {
        saturation: Saturation::new(0.75),
        ..PipelineConfig::default()
    };
    assert_eq!(
        cfg.output_root(Path::new("/music/a.FLAC")),
        PathBuf::from("/music/id_a_flac_sat0.75")
    );
    let cfg = PipelineConfig {
        out_dir: Some(PathBuf::from("/tmp/x")),
        ..PipelineConfig::default()
    };
    assert_eq!(cfg.output_root(Path::new("/music/a.wav")), PathBuf::from("/tmp/x"));
}

#[test]
fn artifact_layout() {
    let paths = ArtifactPaths::new(Path::new("/out"), "song");
    assert_eq!(paths.artwork, PathBuf::from("/out/artwork/song.png"));
    assert_eq!(
        paths.canvas_static,
        PathBuf::from("/out/canvas/song_canvas_static.png")
    );
    assert_eq!(paths.canvas_gif, PathBuf::from("/out/canvas/song_canvas.gif"));
    assert_eq!(paths.planned_mp4(), PathBuf::from("/out/canvas/song_canvas.mp4"));
    assert_eq!(paths.identicon, PathBuf::from("/out/components/identicon.png"));
    assert_eq!(
        paths.spectrogram_full,
        PathBuf::from("/out/components/rectangle_spectrogram.png")
    );
    assert_eq!(paths.catalog, PathBuf::from("/out/catalog.txt"));
}

#[test]
fn base_and_ext_fallbacks() {
    assert_eq!(
        base_and_ext(Path::new("dir/beat.mp3")),
        ("beat".to_string(), "mp3".to_string())
    );
    assert_eq!(
        base_and_ext(Path::new("dir/noext")),
        ("noext".to_string(), "bin".to_string())
    );
}

#[test]
fn runs_with_an_injected_decoder() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("fake.xyz");
    std::fs::write(&input, b"not really audio").unwrap();
    let out = dir.path().join("out");

    let report = Pipeline::new(tiny_config(&out))
        .unwrap()
        .with_decoder(SineDecoder)
        .run(&input)
        .unwrap();

    assert_eq!(report.frames, 4);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(report.seam_difference < SEAM_THRESHOLD);
    assert_eq!(report.fingerprint, Fingerprint::from_bytes(b"not really audio"));
    for p in [
        &report.artifacts.artwork,
        &report.artifacts.canvas_static,
        &report.artifacts.canvas_gif,
        &report.artifacts.identicon,
        &report.artifacts.spectrogram,
        &report.artifacts.spectrogram_full,
        &report.artifacts.catalog,
    ] {
        assert!(p.is_file(), "missing {}", p.display());
    }
    assert!(report.artifacts.canvas_mp4.is_none());
}

#[test]
fn cancelled_run_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.wav");
    std::fs::write(&input, b"bytes").unwrap();
    let out = dir.path().join("out");

    let token = CancelToken::new();
    token.cancel();
    let err = Pipeline::new(tiny_config(&out))
        .unwrap()
        .with_decoder(SineDecoder)
        .with_cancel_token(token)
        .run(&input)
        .unwrap_err();
    assert!(matches!(err, LufsError::Cancelled { stage: "fingerprint" }));
    assert!(!out.exists());
}

#[test]
fn missing_input_fails_before_output_exists() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let err = Pipeline::new(tiny_config(&out))
        .unwrap()
        .run(&dir.path().join("nope.wav"))
        .unwrap_err();
    assert!(matches!(err, LufsError::Input(_)), "{err}");
    assert!(!out.exists());
}
