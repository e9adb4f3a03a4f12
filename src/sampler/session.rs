//! One user session: the loaded video, its subtitle track, the accumulated
//! caption text, the question and the visible controls.

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use super::client::AnswerService;
use super::frames::{extract_frames, Frame, FrameSource};
use super::subtitles::{CaptionAccumulator, CueTracker, SubtitleTrack};
use crate::api::AskRequest;

pub const MISSING_INPUT_NOTICE: &str = "Please upload a video and enter a question";
pub const PROCESSING_PLACEHOLDER: &str = "Processing...";

/// The ask button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    enabled: bool,
}

impl SubmitControl {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Precondition failed; nothing was sent
    Rejected(String),
    Answered(String),
    Failed(String),
}

pub struct Session {
    video: Option<Box<dyn FrameSource>>,
    cues: Option<CueTracker>,
    captions: CaptionAccumulator,
    question: String,
    jpeg_quality: f32,
    control: SubmitControl,
    result: String,
}

impl Session {
    pub fn new(jpeg_quality: f32) -> Self {
        Self {
            video: None,
            cues: None,
            captions: CaptionAccumulator::new(),
            question: String::new(),
            jpeg_quality,
            control: SubmitControl::default(),
            result: String::new(),
        }
    }

    /// Load a video. Starts a fresh caption accumulator and cue state.
    pub fn load_video(&mut self, source: Box<dyn FrameSource>) {
        info!("📼 Video loaded ({:.1}s)", source.duration().as_secs_f64());
        self.video = Some(source);
        self.captions.clear();
        if let Some(cues) = self.cues.as_mut() {
            cues.reset();
        }
    }

    /// Attach a subtitle track; cue changes are followed from here on
    pub fn load_subtitles(&mut self, track: SubtitleTrack) {
        info!("💬 Subtitle track loaded ({} cues)", track.len());
        self.cues = Some(CueTracker::new(track));
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn captions(&self) -> &str {
        self.captions.text()
    }

    pub fn control(&self) -> &SubmitControl {
        &self.control
    }

    /// Text of the result area
    pub fn result(&self) -> &str {
        &self.result
    }

    /// Seek the video, letting the subtitle track report any cue change
    pub async fn seek(&mut self, position: std::time::Duration) -> Result<()> {
        let video = self.video.as_mut().ok_or_else(|| anyhow!("No video loaded"))?;
        video.seek(position).await?;
        if let Some(cues) = self.cues.as_mut() {
            cues.observe(position, &mut self.captions);
        }
        Ok(())
    }

    /// Play the subtitle track through once, accumulating every cue
    pub fn play_captions(&mut self) -> usize {
        match self.cues.as_mut() {
            Some(cues) => cues.play(&mut self.captions),
            None => 0,
        }
    }

    /// Sample one frame per second. Each seek also drives the subtitle track.
    pub async fn extract_frames(&mut self) -> Result<Vec<Frame>> {
        let video = self.video.as_mut().ok_or_else(|| anyhow!("No video loaded"))?;
        let cues = &mut self.cues;
        let captions = &mut self.captions;

        extract_frames(video.as_mut(), self.jpeg_quality, |position| {
            if let Some(cues) = cues.as_mut() {
                cues.observe(position, captions);
            }
        })
        .await
    }

    /// Ask the current question about the loaded video.
    ///
    /// The control is disabled while the request runs and enabled again
    /// whatever the outcome. Failures are rendered as `Error: <message>`.
    pub async fn submit(&mut self, service: &dyn AnswerService) -> SubmitOutcome {
        if self.video.is_none() || self.question.trim().is_empty() {
            warn!("{}", MISSING_INPUT_NOTICE);
            return SubmitOutcome::Rejected(MISSING_INPUT_NOTICE.to_string());
        }

        self.control.enabled = false;
        self.result = PROCESSING_PLACEHOLDER.to_string();

        let outcome = match self.ask(service).await {
            Ok(answer) => {
                self.result = answer.clone();
                SubmitOutcome::Answered(answer)
            }
            Err(e) => {
                warn!("Question failed: {:#}", e);
                self.result = format!("Error: {}", e);
                SubmitOutcome::Failed(e.to_string())
            }
        };

        self.control.enabled = true;
        outcome
    }

    async fn ask(&mut self, service: &dyn AnswerService) -> Result<String> {
        let frames = self.extract_frames().await?;
        let request = AskRequest::new(
            self.question.clone(),
            frames.iter().map(Frame::to_base64).collect(),
            self.captions.text(),
        );
        service.ask(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::intake::SubtitleFormat;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct StillSource {
        duration: Duration,
    }

    #[async_trait]
    impl FrameSource for StillSource {
        fn duration(&self) -> Duration {
            self.duration
        }

        fn dimensions(&self) -> (u32, u32) {
            (320, 240)
        }

        async fn seek(&mut self, _position: Duration) -> Result<()> {
            Ok(())
        }

        async fn capture(&mut self, _quality: f32) -> Result<Vec<u8>> {
            Ok(b"jpeg".to_vec())
        }
    }

    fn still(seconds: u64) -> Box<dyn FrameSource> {
        Box::new(StillSource {
            duration: Duration::from_secs(seconds),
        })
    }

    /// Counts calls, remembers the last payload and replays a canned reply
    struct CountingService {
        calls: AtomicUsize,
        last: Mutex<Option<AskRequest>>,
        reply: Result<String, String>,
    }

    impl CountingService {
        fn replying(reply: Result<&str, &str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                reply: reply.map(str::to_string).map_err(str::to_string),
            }
        }
    }

    #[async_trait]
    impl AnswerService for CountingService {
        async fn ask(&self, request: &AskRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            self.reply.clone().map_err(|e| anyhow!(e))
        }
    }

    const SRT: &str = "1\n00:00:00,500 --> 00:00:01,500\nfirst\n\n2\n00:00:02,000 --> 00:00:03,000\nsecond\n";

    #[tokio::test]
    async fn test_no_video_sends_nothing() {
        let service = CountingService::replying(Ok("unused"));
        let mut session = Session::new(0.5);
        session.set_question("what is happening?");

        let outcome = session.submit(&service).await;
        assert_eq!(outcome, SubmitOutcome::Rejected(MISSING_INPUT_NOTICE.to_string()));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert!(session.control().is_enabled());
    }

    #[tokio::test]
    async fn test_blank_question_sends_nothing() {
        let service = CountingService::replying(Ok("unused"));
        let mut session = Session::new(0.5);
        session.load_video(still(3));

        for question in ["", "   ", "\n\t"] {
            session.set_question(question);
            assert!(matches!(session.submit(&service).await, SubmitOutcome::Rejected(_)));
        }
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_rendered_and_control_reenabled() {
        let service = CountingService::replying(Ok("A robot arm welds the frame."));
        let mut session = Session::new(0.5);
        session.load_video(still(3));
        session.set_question("what happens?");

        let outcome = session.submit(&service).await;
        assert_eq!(outcome, SubmitOutcome::Answered("A robot arm welds the frame.".to_string()));
        assert_eq!(session.result(), "A robot arm welds the frame.");
        assert!(session.control().is_enabled());

        let sent = service.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.question(), "what happens?");
        assert_eq!(sent.frames().len(), 3);
        assert_eq!(sent.frames()[0], "anBlZw==");
    }

    #[tokio::test]
    async fn test_error_rendered_and_control_reenabled() {
        let service = CountingService::replying(Err("Gemini API Error: quota exceeded"));
        let mut session = Session::new(0.5);
        session.load_video(still(1));
        session.set_question("what happens?");

        let outcome = session.submit(&service).await;
        assert_eq!(outcome, SubmitOutcome::Failed("Gemini API Error: quota exceeded".to_string()));
        assert_eq!(session.result(), "Error: Gemini API Error: quota exceeded");
        assert!(session.control().is_enabled());
    }

    #[tokio::test]
    async fn test_extraction_drives_caption_accumulation() {
        let service = CountingService::replying(Ok("ok"));
        let mut session = Session::new(0.5);
        session.load_video(still(4));
        session.load_subtitles(SubtitleTrack::parse(SRT, SubtitleFormat::Srt).unwrap());
        session.set_question("q");

        session.submit(&service).await;

        // seeks at 0,1,2,3: "first" is active at 1, "second" at 2, none at 3
        let sent = service.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.caption_text(), Some("first second "));
        assert_eq!(session.captions(), "first second ");
    }

    #[tokio::test]
    async fn test_new_video_resets_captions() {
        let mut session = Session::new(0.5);
        session.load_video(still(4));
        session.load_subtitles(SubtitleTrack::parse(SRT, SubtitleFormat::Srt).unwrap());
        assert_eq!(session.play_captions(), 4);
        assert_eq!(session.captions(), "first second ");

        session.load_video(still(2));
        assert_eq!(session.captions(), "");
    }

    #[tokio::test]
    async fn test_reloaded_video_sends_cues_active_at_start() {
        let service = CountingService::replying(Ok("ok"));
        let mut session = Session::new(0.5);
        session.load_subtitles(
            SubtitleTrack::parse("1\n00:00:00,000 --> 00:00:10,000\nhello\n", SubtitleFormat::Srt).unwrap(),
        );
        session.set_question("q");

        session.load_video(still(3));
        session.submit(&service).await;
        let first = service.last.lock().unwrap().clone().unwrap();
        assert_eq!(first.caption_text(), Some("hello "));

        session.load_video(still(3));
        session.submit(&service).await;
        let second = service.last.lock().unwrap().clone().unwrap();
        assert_eq!(second.caption_text(), Some("hello "));
    }

    #[tokio::test]
    async fn test_manual_seek_appends_without_dedup() {
        let mut session = Session::new(0.5);
        session.load_video(still(4));
        session.load_subtitles(SubtitleTrack::parse(SRT, SubtitleFormat::Srt).unwrap());

        session.seek(Duration::from_secs(1)).await.unwrap();
        session.seek(Duration::from_secs(3)).await.unwrap();
        session.seek(Duration::from_secs(1)).await.unwrap();
        assert_eq!(session.captions(), "first first ");
    }
}
