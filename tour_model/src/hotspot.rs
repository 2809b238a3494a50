use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::scene::SceneId;

pub type HotspotId = u64;

/// Closed set of hotspot behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HotspotKind {
    #[default]
    Text,
    Audio,
    TextAudio,
    Navigation,
}

impl HotspotKind {
    pub const ALL: [HotspotKind; 4] = [
        HotspotKind::Text,
        HotspotKind::Audio,
        HotspotKind::TextAudio,
        HotspotKind::Navigation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HotspotKind::Text => "text",
            HotspotKind::Audio => "audio",
            HotspotKind::TextAudio => "text-audio",
            HotspotKind::Navigation => "navigation",
        }
    }

    pub fn needs_text(&self) -> bool {
        matches!(self, HotspotKind::Text | HotspotKind::TextAudio)
    }

    pub fn needs_audio(&self) -> bool {
        matches!(self, HotspotKind::Audio | HotspotKind::TextAudio)
    }
}

impl fmt::Display for HotspotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audio file picked by the author that has not been written out yet.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Audio attached to a hotspot. A URL and an uploaded file are mutually
/// exclusive: assigning one replaces the other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AudioRef {
    #[default]
    None,
    Url(String),
    UploadedFile(UploadedFile),
}

impl AudioRef {
    /// Treats blank URLs as no audio at all.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        if url.trim().is_empty() {
            AudioRef::None
        } else {
            AudioRef::Url(url)
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, AudioRef::None)
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            AudioRef::Url(url) => Some(url.as_str()),
            _ => None,
        }
    }
}

/// Type-specific payload of a hotspot.
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotContent {
    Text { text: String },
    Audio { audio: AudioRef },
    TextAudio { text: String, audio: AudioRef },
    Navigation { target: SceneId },
}

impl HotspotContent {
    pub fn kind(&self) -> HotspotKind {
        match self {
            HotspotContent::Text { .. } => HotspotKind::Text,
            HotspotContent::Audio { .. } => HotspotKind::Audio,
            HotspotContent::TextAudio { .. } => HotspotKind::TextAudio,
            HotspotContent::Navigation { .. } => HotspotKind::Navigation,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            HotspotContent::Text { text } | HotspotContent::TextAudio { text, .. } => {
                Some(text.as_str())
            }
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioRef> {
        match self {
            HotspotContent::Audio { audio } | HotspotContent::TextAudio { audio, .. } => {
                Some(audio)
            }
            _ => None,
        }
    }

    pub fn navigation_target(&self) -> Option<&str> {
        match self {
            HotspotContent::Navigation { target } => Some(target.as_str()),
            _ => None,
        }
    }
}

/// A positioned marker inside one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: HotspotId,
    pub position: Position,
    pub label: String,
    pub content: HotspotContent,
    /// Owning scene, mirrored from the scene that holds this hotspot.
    pub scene: SceneId,
}

impl Hotspot {
    pub fn default_label(id: HotspotId) -> String {
        format!("Hotspot {id}")
    }

    pub fn kind(&self) -> HotspotKind {
        self.content.kind()
    }

    pub fn text(&self) -> Option<&str> {
        self.content.text()
    }

    pub fn audio(&self) -> Option<&AudioRef> {
        self.content.audio()
    }

    pub fn navigation_target(&self) -> Option<&str> {
        self.content.navigation_target()
    }
}
