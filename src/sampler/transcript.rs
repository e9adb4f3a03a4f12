//! Speech transcript as a caption source.
//!
//! When a video comes without a subtitle file, its audio track can be run
//! through Whisper. The timed segments become an ordinary [`SubtitleTrack`],
//! so they reach the caption accumulator through the same cue changes as
//! subtitle cues.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::subtitles::{parse_timestamp, Cue, SubtitleTrack};
use crate::config::{SamplerConfig, TranscriptionConfig};

/// Whisper's optimal input rate
const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Runs the Whisper command line tool over an audio file
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    command: PathBuf,
    model: String,
    language: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self {
            command: config.whisper_path.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
        }
    }

    /// Arguments for a JSON transcript of `audio` written into `output_dir`
    pub fn command_args(&self, audio: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--verbose".to_string(),
            "False".to_string(),
            "--fp16".to_string(),
            "False".to_string(),
            "--temperature".to_string(),
            "0.0".to_string(),
        ];

        if let Some(language) = &self.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }

        args
    }

    /// Transcribe an audio file into timed cues
    pub async fn transcribe(&self, audio: &Path, output_dir: &Path) -> Result<SubtitleTrack> {
        let started = Instant::now();
        info!("🎤 Transcribing {} with Whisper ({})", audio.display(), self.model);

        let output = tokio::process::Command::new(&self.command)
            .args(self.command_args(audio, output_dir))
            .output()
            .await
            .map_err(|e| anyhow!("Failed to run {}: {}", self.command.display(), e))?;

        if !output.status.success() {
            return Err(anyhow!(
                "Whisper failed on {}: {}",
                audio.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let stem = audio
            .file_stem()
            .ok_or_else(|| anyhow!("Invalid audio filename: {}", audio.display()))?
            .to_string_lossy();
        let json_path = output_dir.join(format!("{}.json", stem));
        let content = tokio::fs::read_to_string(&json_path)
            .await
            .map_err(|e| anyhow!("No Whisper output at {}: {}", json_path.display(), e))?;

        let track = parse_whisper_json(&content)?;
        info!(
            "✅ Transcript ready in {:.1}s: {} segments",
            started.elapsed().as_secs_f64(),
            track.len()
        );
        Ok(track)
    }
}

/// Extract a mono 16 kHz WAV track for transcription
pub async fn extract_audio(ffmpeg: &Path, video: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = video
        .file_stem()
        .ok_or_else(|| anyhow!("Invalid video filename: {}", video.display()))?
        .to_string_lossy();
    let audio_path = output_dir.join(format!("{}.wav", stem));

    info!("🎵 Extracting audio from {}", video.display());

    let output = tokio::process::Command::new(ffmpeg)
        .arg("-v")
        .arg("error")
        .arg("-i")
        .arg(video)
        .args(["-vn", "-acodec", "pcm_s16le", "-ac", "1", "-f", "wav", "-y"])
        .arg("-ar")
        .arg(WHISPER_SAMPLE_RATE.to_string())
        .arg(&audio_path)
        .output()
        .await
        .map_err(|e| anyhow!("Failed to run ffmpeg: {}", e))?;

    if !output.status.success() {
        return Err(anyhow!(
            "Audio extraction failed for {}: {}",
            video.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(audio_path)
}

/// Extract the audio of `video` and transcribe it. Scratch files live in a
/// temporary directory removed on return.
pub async fn transcribe_video(video: &Path, config: &SamplerConfig) -> Result<SubtitleTrack> {
    let scratch = tempfile::Builder::new().prefix("video-qa-").tempdir()?;
    let audio = extract_audio(&config.ffmpeg_path, video, scratch.path()).await?;
    WhisperTranscriber::new(&config.transcription)
        .transcribe(&audio, scratch.path())
        .await
}

/// Whisper JSON, either openai-whisper's `segments` or whisper.cpp's `transcription`
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperCppSegment {
    timestamps: WhisperTimestamps,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperTimestamps {
    from: String,
    to: String,
}

/// Turn Whisper's JSON report into a subtitle track. Silent segments are dropped.
pub fn parse_whisper_json(content: &str) -> Result<SubtitleTrack> {
    let output: WhisperOutput = serde_json::from_str(content)
        .map_err(|e| anyhow!("Failed to parse Whisper output: {}", e))?;

    let mut cues = Vec::new();

    if !output.transcription.is_empty() {
        debug!("whisper.cpp format, {} segments", output.transcription.len());
        for segment in output.transcription {
            match (
                parse_timestamp(&segment.timestamps.from),
                parse_timestamp(&segment.timestamps.to),
            ) {
                (Ok(start), Ok(end)) => push_segment(&mut cues, start, end, &segment.text),
                _ => warn!(
                    "Skipping segment with unreadable timestamps: {} --> {}",
                    segment.timestamps.from, segment.timestamps.to
                ),
            }
        }
    } else {
        debug!("openai-whisper format, {} segments", output.segments.len());
        for segment in output.segments {
            let range = (
                Duration::try_from_secs_f64(segment.start),
                Duration::try_from_secs_f64(segment.end),
            );
            match range {
                (Ok(start), Ok(end)) => push_segment(&mut cues, start, end, &segment.text),
                _ => warn!(
                    "Skipping segment with invalid range: {} --> {}",
                    segment.start, segment.end
                ),
            }
        }
    }

    Ok(SubtitleTrack::new(cues))
}

fn push_segment(cues: &mut Vec<Cue>, start: Duration, end: Duration, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        cues.push(Cue::new(start, end, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_openai_segments() {
        let content = r#"{
            "text": " Bolt goes in. Panel closes.",
            "language": "en",
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.5, "text": " Bolt goes in."},
                {"id": 1, "start": 1.5, "end": 2.0, "text": "   "},
                {"id": 2, "start": 2.0, "end": 3.25, "text": " Panel closes."}
            ]
        }"#;

        let track = parse_whisper_json(content).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(
            track.cues()[0],
            Cue::new(Duration::ZERO, Duration::from_millis(1500), "Bolt goes in.")
        );
        assert_eq!(track.cues()[1].end, Duration::from_millis(3250));
    }

    #[test]
    fn test_parse_whisper_cpp_transcription() {
        let content = r#"{
            "transcription": [
                {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
                 "offsets": {"from": 0, "to": 2500}, "text": " Hello"},
                {"timestamps": {"from": "bad", "to": "00:00:04,000"},
                 "offsets": {"from": 2500, "to": 4000}, "text": " skipped"}
            ]
        }"#;

        let track = parse_whisper_json(content).unwrap();
        assert_eq!(track.len(), 1);
        assert_eq!(track.cues()[0].text, "Hello");
        assert_eq!(track.cues()[0].end, Duration::from_millis(2500));
    }

    #[test]
    fn test_negative_segment_skipped() {
        let content = r#"{"segments": [{"start": -1.0, "end": 1.0, "text": "x"}]}"#;
        assert!(parse_whisper_json(content).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_whisper_json("not json").is_err());
    }

    #[test]
    fn test_command_args() {
        let transcriber = WhisperTranscriber::new(&TranscriptionConfig {
            whisper_path: PathBuf::from("whisper"),
            model: "small".to_string(),
            language: Some("en".to_string()),
        });

        let args = transcriber.command_args(Path::new("/tmp/clip.wav"), Path::new("/tmp/out"));
        assert_eq!(args[0], "/tmp/clip.wav");
        assert!(args.windows(2).any(|pair| pair == ["--model", "small"]));
        assert!(args.windows(2).any(|pair| pair == ["--output_format", "json"]));
        assert!(args.ends_with(&["--language".to_string(), "en".to_string()]));
    }

    #[tokio::test]
    async fn test_missing_whisper_binary_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let transcriber = WhisperTranscriber::new(&TranscriptionConfig {
            whisper_path: temp_dir.path().join("no-such-whisper"),
            ..TranscriptionConfig::default()
        });

        let result = transcriber
            .transcribe(&temp_dir.path().join("clip.wav"), temp_dir.path())
            .await;
        assert!(result.is_err());
    }
}
