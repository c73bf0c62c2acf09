//! Media entries
//!
//! A media entry is what the media bin hands to the timeline: an imported file,
//! a text item, or a previously extracted group. The timeline only reads it to
//! seed a new clip.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ClipGroup;

/// The kind of content a clip or media entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
    Text,
    /// A group of other clips.
    Composite,
}

impl MediaKind {
    /// Transitions are disallowed on audio and composite clips.
    pub fn accepts_transitions(self) -> bool {
        !matches!(self, MediaKind::Audio | MediaKind::Composite)
    }

    /// Kinds whose initial timeline width follows the natural duration.
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            MediaKind::Video | MediaKind::Audio | MediaKind::Composite
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Text => "text",
            MediaKind::Composite => "grouped",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Normal,
    Bold,
}

/// Page template for styled captions. Templates may override the text style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTemplate {
    Normal,
    Glassy,
}

/// Style of a text clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProperties {
    pub content: String,
    pub font_size: f64,
    pub font_family: String,
    /// Hex color string, e.g. "#ffffff"
    pub color: String,
    pub align: TextAlign,
    pub font_weight: FontWeight,
    #[serde(default)]
    pub template: Option<TextTemplate>,
}

impl TextProperties {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: crate::constants::DEFAULT_TEXT_FONT_SIZE,
            font_family: "Arial".to_string(),
            color: "#ffffff".to_string(),
            align: TextAlign::Center,
            font_weight: FontWeight::Normal,
            template: None,
        }
    }
}

/// An entry in the media bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Unique identifier, referenced by clips as their source
    pub id: Uuid,
    /// User-facing display name
    pub name: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub media_url_local: Option<String>,
    #[serde(default)]
    pub media_url_remote: Option<String>,
    /// Natural duration in seconds (0 for text and images)
    #[serde(default)]
    pub duration_seconds: f64,
    /// Natural width in pixels
    #[serde(default)]
    pub media_width: f64,
    /// Natural height in pixels
    #[serde(default)]
    pub media_height: f64,
    #[serde(default)]
    pub text: Option<TextProperties>,
    /// Children of an extracted group
    #[serde(default)]
    pub group: Option<ClipGroup>,
}

impl MediaEntry {
    fn base(name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            media_url_local: None,
            media_url_remote: None,
            duration_seconds: 0.0,
            media_width: 0.0,
            media_height: 0.0,
            text: None,
            group: None,
        }
    }

    /// Create a video entry with its natural duration and frame size
    pub fn new_video(name: impl Into<String>, duration_seconds: f64, width: f64, height: f64) -> Self {
        Self {
            duration_seconds,
            media_width: width,
            media_height: height,
            ..Self::base(name, MediaKind::Video)
        }
    }

    /// Create an image entry
    pub fn new_image(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            media_width: width,
            media_height: height,
            ..Self::base(name, MediaKind::Image)
        }
    }

    /// Create an audio entry
    pub fn new_audio(name: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            ..Self::base(name, MediaKind::Audio)
        }
    }

    /// Create a text entry. Its natural size is derived on drop.
    pub fn new_text(name: impl Into<String>, text: TextProperties) -> Self {
        Self {
            text: Some(text),
            ..Self::base(name, MediaKind::Text)
        }
    }

    /// Create a composite entry from a group of clips
    pub fn new_group(name: impl Into<String>, duration_seconds: f64, group: ClipGroup) -> Self {
        Self {
            duration_seconds,
            group: Some(group),
            ..Self::base(name, MediaKind::Composite)
        }
    }

    pub fn with_local_url(mut self, url: impl Into<String>) -> Self {
        self.media_url_local = Some(url.into());
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.media_url_remote = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_and_composite_reject_transitions() {
        assert!(MediaKind::Video.accepts_transitions());
        assert!(MediaKind::Image.accepts_transitions());
        assert!(MediaKind::Text.accepts_transitions());
        assert!(!MediaKind::Audio.accepts_transitions());
        assert!(!MediaKind::Composite.accepts_transitions());
    }

    #[test]
    fn media_entry_serialization() {
        let entry = MediaEntry::new_video("intro.mp4", 12.5, 1920.0, 1080.0)
            .with_remote_url("https://cdn.example.com/intro.mp4");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"kind\":\"video\""));
        let parsed: MediaEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn text_entry_has_no_duration() {
        let entry = MediaEntry::new_text("Title", TextProperties::new("Hello"));
        assert_eq!(entry.duration_seconds, 0.0);
        assert_eq!(entry.text.as_ref().map(|t| t.font_size), Some(48.0));
    }
}
