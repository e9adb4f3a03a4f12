//! Subtitle tracks, cue-change tracking and the caption accumulator.
//!
//! Caption text is gathered the way a media element reports it: every time
//! the set of active cues changes, the text of all active cues is appended.
//! Nothing is de-duplicated, so seeking back or replaying appends again.

use anyhow::{anyhow, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use super::intake::SubtitleFormat;

/// A subtitle entry with an active time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl Cue {
    pub fn new(start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn is_active_at(&self, position: Duration) -> bool {
        self.start <= position && position < self.end
    }
}

/// Parsed subtitle file
#[derive(Debug, Clone, Default)]
pub struct SubtitleTrack {
    cues: Vec<Cue>,
}

impl SubtitleTrack {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    /// Read and parse a subtitle file, detecting the format from its extension
    pub async fn load(path: &Path) -> Result<Self> {
        let format = SubtitleFormat::from_path(path)
            .ok_or_else(|| anyhow!("Unrecognized subtitle file: {}", path.display()))?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read subtitles {}: {}", path.display(), e))?;

        let track = Self::parse(&content, format)?;
        debug!("Loaded {} cues from {}", track.len(), path.display());
        Ok(track)
    }

    /// Parse SRT or WebVTT content.
    ///
    /// Blocks without a timing line (SRT indices, the WEBVTT header, NOTE and
    /// STYLE blocks) are ignored; blocks with an unreadable timing line are
    /// skipped with a warning.
    pub fn parse(content: &str, format: SubtitleFormat) -> Result<Self> {
        let timing = Regex::new(
            r"^\s*((?:\d+:)?\d{1,2}:\d{2}[,.]\d{1,3})\s*-->\s*((?:\d+:)?\d{1,2}:\d{2}[,.]\d{1,3})",
        )?;

        let normalized = content.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");
        let mut cues = Vec::new();

        for block in normalized.split("\n\n") {
            let lines: Vec<&str> = block.lines().filter(|line| !line.trim().is_empty()).collect();
            let Some(timing_index) = lines.iter().position(|line| line.contains("-->")) else {
                continue;
            };

            if format == SubtitleFormat::Vtt && lines[0].starts_with("NOTE") {
                continue;
            }

            let Some(captures) = timing.captures(lines[timing_index]) else {
                warn!("Skipping cue with malformed timing: {:?}", lines[timing_index]);
                continue;
            };

            let (start, end) = match (parse_timestamp(&captures[1]), parse_timestamp(&captures[2])) {
                (Ok(start), Ok(end)) => (start, end),
                _ => {
                    warn!("Skipping cue with unreadable timestamps: {:?}", lines[timing_index]);
                    continue;
                }
            };

            let text = lines[timing_index + 1..].join("\n");
            cues.push(Cue::new(start, end, text));
        }

        Ok(Self { cues })
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Indices of cues active at a position
    pub fn active_at(&self, position: Duration) -> Vec<usize> {
        self.cues
            .iter()
            .enumerate()
            .filter(|(_, cue)| cue.is_active_at(position))
            .map(|(index, _)| index)
            .collect()
    }

    /// Every cue start and end, sorted and de-duplicated
    pub fn boundaries(&self) -> Vec<Duration> {
        let mut points: Vec<Duration> = self
            .cues
            .iter()
            .flat_map(|cue| [cue.start, cue.end])
            .collect();
        points.sort();
        points.dedup();
        points
    }
}

/// Append-only caption text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionAccumulator {
    text: String,
}

impl CaptionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append each cue's text followed by a single space
    pub fn append_cues<'a, I>(&mut self, cues: I)
    where
        I: IntoIterator<Item = &'a Cue>,
    {
        for cue in cues {
            self.text.push_str(&cue.text);
            self.text.push(' ');
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

/// Follows the playhead over a track and reports cue changes
#[derive(Debug, Clone)]
pub struct CueTracker {
    track: SubtitleTrack,
    active: Vec<usize>,
}

impl CueTracker {
    pub fn new(track: SubtitleTrack) -> Self {
        Self {
            track,
            active: Vec::new(),
        }
    }

    /// Forget the active cue set, as when the media element gets a new source
    pub fn reset(&mut self) {
        self.active.clear();
    }

    /// Move the playhead. When the active cue set changes, the text of every
    /// active cue goes into `captions` and true is returned.
    pub fn observe(&mut self, position: Duration, captions: &mut CaptionAccumulator) -> bool {
        let active = self.track.active_at(position);
        if active == self.active {
            return false;
        }

        self.active = active;
        captions.append_cues(self.active.iter().map(|&index| &self.track.cues[index]));
        true
    }

    /// Play the whole track from the start, reporting every cue change
    pub fn play(&mut self, captions: &mut CaptionAccumulator) -> usize {
        let mut changes = 0;
        if self.observe(Duration::ZERO, captions) {
            changes += 1;
        }
        for point in self.track.boundaries() {
            if self.observe(point, captions) {
                changes += 1;
            }
        }
        changes
    }
}

/// Parse `[HH:]MM:SS,mmm` or `[HH:]MM:SS.mmm`
pub(crate) fn parse_timestamp(timestamp: &str) -> Result<Duration> {
    let (clock, fraction) = timestamp
        .split_once([',', '.'])
        .ok_or_else(|| anyhow!("Invalid timestamp format: {}", timestamp))?;

    let hms: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds): (u64, u64, u64) = match hms.as_slice() {
        [h, m, s] => (h.parse()?, m.parse()?, s.parse()?),
        [m, s] => (0, m.parse()?, s.parse()?),
        _ => return Err(anyhow!("Invalid time format: {}", timestamp)),
    };

    if minutes >= 60 || seconds >= 60 || fraction.is_empty() || fraction.len() > 3 {
        return Err(anyhow!("Invalid time format: {}", timestamp));
    }

    // "5" means 500 ms
    let milliseconds: u64 = format!("{:0<3}", fraction).parse()?;

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1000 + milliseconds))
        .map(Duration::from_millis)
        .ok_or_else(|| anyhow!("Timestamp out of range: {}", timestamp))
}
