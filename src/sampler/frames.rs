use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::time::Duration;
use tracing::{debug, info};

/// A still image captured at a timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub timestamp: Duration,
    pub jpeg: Vec<u8>,
}

impl Frame {
    pub fn new(timestamp: Duration, jpeg: Vec<u8>) -> Self {
        Self { timestamp, jpeg }
    }

    /// Base64 JPEG data without a data URI prefix
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

/// A seekable video that can render its current frame as JPEG
#[async_trait]
pub trait FrameSource: Send {
    fn duration(&self) -> Duration;

    /// Native resolution (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// Move the playhead. Resolves once the seek has completed.
    async fn seek(&mut self, position: Duration) -> Result<()>;

    /// Encode the frame at the playhead as JPEG at native resolution.
    /// `quality` is in (0, 1].
    async fn capture(&mut self, quality: f32) -> Result<Vec<u8>>;
}

/// Sample one frame per second of video.
///
/// Offsets 0, 1, 2, ... are visited while `offset < duration`, so a video of
/// D seconds yields ceil(D) frames. Each seek is awaited before the capture
/// and before the next seek; `on_seek` runs after every completed seek.
pub async fn extract_frames<F>(
    source: &mut dyn FrameSource,
    quality: f32,
    mut on_seek: F,
) -> Result<Vec<Frame>>
where
    F: FnMut(Duration) + Send,
{
    let duration = source.duration();
    let (width, height) = source.dimensions();
    let mut frames = Vec::new();
    let mut offset: u64 = 0;

    info!(
        "🎞️ Extracting frames at 1s intervals ({:.1}s, {}x{})",
        duration.as_secs_f64(),
        width,
        height
    );

    while Duration::from_secs(offset) < duration {
        let position = Duration::from_secs(offset);
        source.seek(position).await?;
        on_seek(position);

        let jpeg = source.capture(quality).await?;
        if jpeg.is_empty() {
            bail!("Empty frame captured at {}s", offset);
        }

        debug!("Captured frame at {}s ({} bytes)", offset, jpeg.len());
        frames.push(Frame::new(position, jpeg));
        offset += 1;
    }

    info!("✅ Extracted {} frames", frames.len());
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every call so ordering can be checked
    struct ScriptedSource {
        duration: Duration,
        position: Option<Duration>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedSource {
        fn new(seconds: f64) -> Self {
            Self {
                duration: Duration::from_secs_f64(seconds),
                position: None,
                log: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl FrameSource for ScriptedSource {
        fn duration(&self) -> Duration {
            self.duration
        }

        fn dimensions(&self) -> (u32, u32) {
            (640, 360)
        }

        async fn seek(&mut self, position: Duration) -> Result<()> {
            self.log.lock().unwrap().push(format!("seek {}", position.as_secs()));
            tokio::task::yield_now().await;
            self.position = Some(position);
            Ok(())
        }

        async fn capture(&mut self, _quality: f32) -> Result<Vec<u8>> {
            let position = self.position.expect("capture before seek");
            self.log.lock().unwrap().push(format!("capture {}", position.as_secs()));
            Ok(vec![0xFF, 0xD8, position.as_secs() as u8])
        }
    }

    #[tokio::test]
    async fn test_frame_count_is_ceiling_of_duration() {
        for (seconds, expected) in [(0.0, 0), (0.4, 1), (3.0, 3), (3.2, 4), (9.99, 10)] {
            let mut source = ScriptedSource::new(seconds);
            let frames = extract_frames(&mut source, 0.5, |_| {}).await.unwrap();
            assert_eq!(frames.len(), expected, "duration {}", seconds);
        }
    }

    #[tokio::test]
    async fn test_frames_in_increasing_order_and_non_empty() {
        let mut source = ScriptedSource::new(4.5);
        let frames = extract_frames(&mut source, 0.5, |_| {}).await.unwrap();

        for (index, frame) in frames.iter().enumerate() {
            assert_eq!(frame.timestamp, Duration::from_secs(index as u64));
            assert!(!frame.jpeg.is_empty());
        }
    }

    #[tokio::test]
    async fn test_strictly_sequential_seek_then_capture() {
        let mut source = ScriptedSource::new(2.5);
        let log = source.log.clone();
        let mut seen = Vec::new();

        extract_frames(&mut source, 0.5, |position| seen.push(position)).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["seek 0", "capture 0", "seek 1", "capture 1", "seek 2", "capture 2"]
        );
        assert_eq!(seen, vec![Duration::from_secs(0), Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[test]
    fn test_base64_has_no_prefix() {
        let frame = Frame::new(Duration::ZERO, b"ABC".to_vec());
        assert_eq!(frame.to_base64(), "QUJD");
    }
}
