use serde::{Deserialize, Serialize};
use url::Url;

use crate::data_url;
use crate::hotspot::{Hotspot, HotspotId};

pub type SceneId = String;

/// Scene every tour starts with. It can never be removed.
pub const DEFAULT_SCENE_ID: &str = "room1";

/// Panorama shipped with a fresh tour.
pub const DEFAULT_SCENE_IMAGE: &str = "./images/room1.jpg";

/// Camera orientation in degrees, applied when a scene becomes current.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// How a scene's panorama is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Absolute URL (`https://…`, `blob:…`).
    Url,
    /// Image embedded in the tour as a `data:` URL.
    DataUrl,
    /// Path relative to the tour package, e.g. `./images/room1.jpg`.
    RelativePath,
}

pub fn classify_image(reference: &str) -> ImageKind {
    if data_url::is_data_url(reference) {
        return ImageKind::DataUrl;
    }
    match Url::parse(reference) {
        Ok(url) if url.has_host() || url.scheme() == "blob" => ImageKind::Url,
        _ => ImageKind::RelativePath,
    }
}

/// One 360° panorama and the hotspots placed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub image: String,
    pub hotspots: Vec<Hotspot>,
    pub starting_point: Option<Rotation>,
}

impl Scene {
    pub fn new(id: impl Into<SceneId>, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            hotspots: Vec::new(),
            starting_point: None,
        }
    }

    pub fn default_scene() -> Self {
        Self::new(DEFAULT_SCENE_ID, "Room 1", DEFAULT_SCENE_IMAGE)
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_SCENE_ID
    }

    pub fn image_kind(&self) -> ImageKind {
        classify_image(&self.image)
    }

    pub fn hotspot(&self, id: HotspotId) -> Option<&Hotspot> {
        self.hotspots.iter().find(|hotspot| hotspot.id == id)
    }

    pub(crate) fn hotspot_mut(&mut self, id: HotspotId) -> Option<&mut Hotspot> {
        self.hotspots.iter_mut().find(|hotspot| hotspot.id == id)
    }
}
