use std::path::Path;

/// Subtitle formats recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SubRip, `.srt`
    Srt,
    /// WebVTT, `.vtt`
    Vtt,
}

/// What a selected file is taken to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Subtitle(SubtitleFormat),
}

impl SubtitleFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "srt" => Some(SubtitleFormat::Srt),
            "vtt" => Some(SubtitleFormat::Vtt),
            _ => None,
        }
    }
}

/// Classify a selected file. Anything that is not a subtitle file is offered
/// to the video decoder, which decides whether it can play it.
pub fn classify(path: &Path) -> FileKind {
    match SubtitleFormat::from_path(path) {
        Some(format) => FileKind::Subtitle(format),
        None => FileKind::Video,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(Path::new("talk.srt")), FileKind::Subtitle(SubtitleFormat::Srt));
        assert_eq!(classify(Path::new("talk.VTT")), FileKind::Subtitle(SubtitleFormat::Vtt));
        assert_eq!(classify(Path::new("talk.mp4")), FileKind::Video);
        assert_eq!(classify(Path::new("no_extension")), FileKind::Video);
    }
}
