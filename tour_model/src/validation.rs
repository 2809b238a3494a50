//! Pending hotspot form values and the per-type checks run before they are
//! committed to a scene.

use thiserror::Error;

use crate::hotspot::{AudioRef, Hotspot, HotspotContent, HotspotId, HotspotKind, UploadedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("text content required")]
    TextRequired,
    #[error("audio file or URL required")]
    AudioRequired,
    #[error("text and audio both required")]
    TextAndAudioRequired,
    #[error("label required")]
    LabelRequired,
    #[error("target scene required")]
    TargetSceneRequired,
}

/// Form values for a hotspot that is about to be placed or edited.
///
/// Every field is kept regardless of `kind` so switching the type back and
/// forth in a form does not lose input; only the fields the kind needs are
/// checked and carried into the hotspot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HotspotDraft {
    pub kind: HotspotKind,
    pub label: String,
    pub text: String,
    pub audio: AudioRef,
    pub navigation_target: String,
}

impl HotspotDraft {
    pub fn new(kind: HotspotKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn from_hotspot(hotspot: &Hotspot) -> Self {
        Self {
            kind: hotspot.kind(),
            label: hotspot.label.clone(),
            text: hotspot.text().unwrap_or_default().to_string(),
            audio: hotspot.audio().cloned().unwrap_or_default(),
            navigation_target: hotspot.navigation_target().unwrap_or_default().to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.set_audio_url(url);
        self
    }

    pub fn with_audio_file(mut self, file: UploadedFile) -> Self {
        self.set_audio_file(file);
        self
    }

    pub fn with_target(mut self, scene: impl Into<String>) -> Self {
        self.navigation_target = scene.into();
        self
    }

    /// Replaces any uploaded file. A blank URL clears a previous URL but
    /// leaves an uploaded file in place.
    pub fn set_audio_url(&mut self, url: impl Into<String>) {
        let audio = AudioRef::from_url(url);
        if audio.is_set() || !matches!(self.audio, AudioRef::UploadedFile(_)) {
            self.audio = audio;
        }
    }

    /// Replaces any audio URL.
    pub fn set_audio_file(&mut self, file: UploadedFile) {
        self.audio = AudioRef::UploadedFile(file);
    }

    pub fn clear_audio(&mut self) {
        self.audio = AudioRef::None;
    }

    /// Check the fields required by `kind` and build the hotspot payload.
    ///
    /// `owner` is the scene the hotspot lives in; a navigation hotspot must
    /// point at some other scene for which `scene_exists` holds.
    pub fn validate<F>(&self, owner: &str, scene_exists: F) -> Result<HotspotContent, ValidationError>
    where
        F: Fn(&str) -> bool,
    {
        let has_text = !self.text.trim().is_empty();
        let has_audio = self.audio.is_set();
        match self.kind {
            HotspotKind::Text => {
                if !has_text {
                    return Err(ValidationError::TextRequired);
                }
                Ok(HotspotContent::Text {
                    text: self.text.clone(),
                })
            }
            HotspotKind::Audio => {
                if !has_audio {
                    return Err(ValidationError::AudioRequired);
                }
                Ok(HotspotContent::Audio {
                    audio: self.audio.clone(),
                })
            }
            HotspotKind::TextAudio => {
                if !has_text || !has_audio {
                    return Err(ValidationError::TextAndAudioRequired);
                }
                Ok(HotspotContent::TextAudio {
                    text: self.text.clone(),
                    audio: self.audio.clone(),
                })
            }
            HotspotKind::Navigation => {
                if self.label.trim().is_empty() {
                    return Err(ValidationError::LabelRequired);
                }
                let target = self.navigation_target.trim();
                if target.is_empty() || target == owner || !scene_exists(target) {
                    return Err(ValidationError::TargetSceneRequired);
                }
                Ok(HotspotContent::Navigation {
                    target: target.to_string(),
                })
            }
        }
    }

    pub(crate) fn label_for(&self, id: HotspotId) -> String {
        let label = self.label.trim();
        if label.is_empty() {
            Hotspot::default_label(id)
        } else {
            label.to_string()
        }
    }
}
