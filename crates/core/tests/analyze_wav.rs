use bytes::Bytes;
use moodscope_core::config::{AnalysisWindow, DecoderKind, EngineConfig};
use moodscope_core::emotion::MoodPoint;
use moodscope_core::features::FEATURE_COUNT;
use moodscope_core::{AnalysisOutcome, MoodEngine, NoMoodReason};
use std::path::{Path, PathBuf};

fn write_wav(path: &Path, sample_rate: u32, secs: f32, amplitude: f32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (secs * sample_rate as f32) as usize;
    let beat = sample_rate as usize / 2;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let mut s = amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
        if i % beat < 200 {
            s += amplitude * 0.5;
        }
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(v).unwrap();
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_model(dir: &Path, name: &str, intercept: f64) -> PathBuf {
    let path = dir.join(name);
    let coefficients = vec![0.0; FEATURE_COUNT];
    let json = serde_json::json!({
        "kind": "linear",
        "n_features": FEATURE_COUNT,
        "intercept": intercept,
        "coefficients": coefficients,
    });
    std::fs::write(&path, json.to_string()).unwrap();
    path
}

fn engine(dir: &Path, valence: f64, arousal: f64) -> MoodEngine {
    let config = EngineConfig {
        valence_model: write_model(dir, "valence.json", valence),
        arousal_model: write_model(dir, "arousal.json", arousal),
        background: None,
        catalog: None,
        window: AnalysisWindow::new(5, 22_050).unwrap(),
        decoder: DecoderKind::Symphonia,
    };
    MoodEngine::from_config(&config).unwrap()
}

#[tokio::test]
async fn wav_file_produces_a_full_report() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("song.wav");
    write_wav(&wav, 44_100, 3.0, 0.5);

    let engine = engine(dir.path(), 0.5, 0.5);
    let bytes = Bytes::from(std::fs::read(&wav).unwrap());
    let outcome = engine.analyze(bytes).await.unwrap();

    let AnalysisOutcome::Detected(report) = outcome else {
        panic!("expected a detected mood, got {outcome:?}");
    };
    assert_eq!(report.mood, MoodPoint::new(0.5, 0.5));
    assert_eq!(report.emotions[0].name, "Neutral");
    assert!(report.emotions.iter().all(|e| e.percentage > 0.0));
    let img = image::load_from_memory(&report.image_png).unwrap();
    assert!(img.width() > 0 && img.height() > 0);
}

#[tokio::test]
async fn silent_wav_is_no_mood() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("quiet.wav");
    write_wav(&wav, 22_050, 1.0, 0.0);

    let engine = engine(dir.path(), 0.5, 0.5);
    let outcome = engine
        .analyze(Bytes::from(std::fs::read(&wav).unwrap()))
        .await
        .unwrap();
    assert_eq!(outcome, AnalysisOutcome::NoMood(NoMoodReason::Silent));
}

#[tokio::test]
async fn garbage_bytes_are_no_mood() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), 0.5, 0.5);
    let outcome = engine
        .analyze(Bytes::from_static(b"definitely not a media container"))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AnalysisOutcome::NoMood(NoMoodReason::Undecodable(_))
    ));
}

#[tokio::test]
async fn concurrent_requests_share_one_engine() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("song.wav");
    write_wav(&wav, 22_050, 1.5, 0.3);
    let bytes = Bytes::from(std::fs::read(&wav).unwrap());
    let engine = engine(dir.path(), 0.1, 0.9);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let bytes = bytes.clone();
            tokio::spawn(async move { engine.analyze(bytes).await })
        })
        .collect();
    for task in tasks {
        let AnalysisOutcome::Detected(report) = task.await.unwrap().unwrap() else {
            panic!("expected a detected mood");
        };
        assert_eq!(report.emotions[0].name, "Furious");
    }
}
