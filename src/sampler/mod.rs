//! Client side: samples frames from a video, gathers subtitle or transcript
//! text and submits questions to the proxy.

pub mod client;
pub mod frames;
pub mod intake;
pub mod session;
pub mod subtitles;
pub mod transcript;
pub mod video;

pub use client::{AnswerService, ProxyClient};
pub use frames::{extract_frames, Frame, FrameSource};
pub use intake::{classify, FileKind, SubtitleFormat};
pub use session::{Session, SubmitOutcome};
pub use subtitles::{CaptionAccumulator, Cue, CueTracker, SubtitleTrack};
pub use transcript::{extract_audio, parse_whisper_json, transcribe_video, WhisperTranscriber};
pub use video::{FfmpegSource, VideoInfo};
