use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use super::frames::FrameSource;
use crate::config::SamplerConfig;

/// Video information extracted from file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub filename: String,
    pub duration: Duration,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub format: String,
}

/// Frame source backed by the ffprobe and ffmpeg command line tools
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    info: VideoInfo,
    ffmpeg: PathBuf,
    position: Duration,
}

impl FfmpegSource {
    /// Probe a video file and open it for sampling
    pub async fn open(path: &Path, config: &SamplerConfig) -> Result<Self> {
        let info = probe(&config.ffprobe_path, path).await?;
        Ok(Self {
            info,
            ffmpeg: config.ffmpeg_path.clone(),
            position: Duration::ZERO,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn position(&self) -> Duration {
        self.position
    }
}

#[async_trait]
impl FrameSource for FfmpegSource {
    fn duration(&self) -> Duration {
        self.info.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    async fn seek(&mut self, position: Duration) -> Result<()> {
        if position > self.info.duration {
            return Err(anyhow!(
                "Seek to {:.2}s is past the end of {} ({:.2}s)",
                position.as_secs_f64(),
                self.info.filename,
                self.info.duration.as_secs_f64()
            ));
        }
        self.position = position;
        Ok(())
    }

    async fn capture(&mut self, quality: f32) -> Result<Vec<u8>> {
        let path = self
            .info
            .path
            .to_str()
            .ok_or_else(|| anyhow!("Non UTF-8 video path: {}", self.info.path.display()))?;
        let timestamp = format!("{:.3}", self.position.as_secs_f64());
        let qscale = jpeg_qscale(quality).to_string();

        // -ss before -i seeks on the input; no scale filter keeps native resolution
        let output = tokio::process::Command::new(&self.ffmpeg)
            .args([
                "-v", "error",
                "-ss", &timestamp,
                "-i", path,
                "-frames:v", "1",
                "-f", "image2pipe",
                "-c:v", "mjpeg",
                "-q:v", &qscale,
                "-",
            ])
            .output()
            .await
            .map_err(|e| anyhow!("Failed to run ffmpeg: {}", e))?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffmpeg frame capture failed at {}s: {}",
                timestamp,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        if output.stdout.is_empty() {
            return Err(anyhow!("ffmpeg produced no frame at {}s", timestamp));
        }

        Ok(output.stdout)
    }
}

/// Map a (0, 1] quality onto ffmpeg's mjpeg qscale, 31 (worst) to 2 (best)
pub fn jpeg_qscale(quality: f32) -> u32 {
    let quality = quality.clamp(0.0, 1.0);
    (31.0 - quality * 29.0).round() as u32
}

/// Extract video information using ffprobe
pub async fn probe(ffprobe: &Path, video_path: &Path) -> Result<VideoInfo> {
    let path = video_path
        .to_str()
        .ok_or_else(|| anyhow!("Non UTF-8 video path: {}", video_path.display()))?;

    let output = tokio::process::Command::new(ffprobe)
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
            path,
        ])
        .output()
        .await
        .map_err(|e| anyhow!("Failed to run ffprobe: {}", e))?;

    if !output.status.success() {
        return Err(anyhow!("ffprobe failed for {}", video_path.display()));
    }

    let ffprobe_data: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let info = parse_probe(video_path, &ffprobe_data)?;

    info!(
        "📹 Analyzed video: {} ({}x{}, {:.1}fps, {:.1}s)",
        info.filename,
        info.width,
        info.height,
        info.fps,
        info.duration.as_secs_f64()
    );

    Ok(info)
}

/// Read ffprobe's JSON report
fn parse_probe(video_path: &Path, ffprobe_data: &serde_json::Value) -> Result<VideoInfo> {
    let format = &ffprobe_data["format"];
    let streams = ffprobe_data["streams"]
        .as_array()
        .ok_or_else(|| anyhow!("ffprobe reported no streams"))?;

    let video_stream = streams
        .iter()
        .find(|s| s["codec_type"] == "video")
        .ok_or_else(|| anyhow!("No video stream found in {}", video_path.display()))?;

    // Container duration first, stream duration as fallback
    let duration_seconds: f64 = format["duration"]
        .as_str()
        .or_else(|| video_stream["duration"].as_str())
        .and_then(|s| s.parse().ok())
        .filter(|d: &f64| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| anyhow!("Unknown duration for {}", video_path.display()))?;

    let fps = video_stream["r_frame_rate"]
        .as_str()
        .and_then(|s| match s.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.parse().ok()?;
                let den: f64 = den.parse().ok()?;
                (den != 0.0).then(|| num / den)
            }
            None => s.parse().ok(),
        })
        .unwrap_or(0.0);

    Ok(VideoInfo {
        path: video_path.to_path_buf(),
        filename: video_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        duration: Duration::from_secs_f64(duration_seconds),
        width: video_stream["width"].as_u64().unwrap_or(0) as u32,
        height: video_stream["height"].as_u64().unwrap_or(0) as u32,
        fps,
        format: format["format_name"].as_str().unwrap_or("unknown").to_string(),
    })
}
