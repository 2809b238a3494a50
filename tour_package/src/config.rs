//! JSON shape of a saved tour.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tour_model::{
    AudioRef, Hotspot, HotspotContent, HotspotId, HotspotKind, Position, Rotation, Scene,
};

/// Top-level configuration document.
///
/// Multi-scene configurations carry `scenes` and `currentScene`. Older
/// single-scene tours only have a top-level `hotspots` list; exports keep
/// writing that list as a mirror of the current scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenes: Option<BTreeMap<String, SceneConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_scene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspots: Option<Vec<HotspotConfig>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
    #[serde(default)]
    pub hotspots: Vec<HotspotConfig>,
    #[serde(default)]
    pub starting_point: Option<StartingPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartingPoint {
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotConfig {
    pub id: HotspotId,
    #[serde(rename = "type")]
    pub kind: HotspotKind,
    pub position: Position,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scene: String,
    #[serde(default)]
    pub navigation_target: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SceneConfig {
    /// Serialize a scene, letting `hotspot` decide how each one is written.
    pub fn from_scene<F>(scene: &Scene, image: String, hotspot: F) -> Self
    where
        F: FnMut(&Hotspot) -> HotspotConfig,
    {
        Self {
            name: scene.name.clone(),
            image,
            hotspots: scene.hotspots.iter().map(hotspot).collect(),
            starting_point: scene
                .starting_point
                .map(|rotation| StartingPoint { rotation }),
        }
    }

    pub fn into_scene(self, id: &str) -> Scene {
        let mut scene = Scene::new(id, self.name, self.image);
        scene.starting_point = self.starting_point.map(|point| point.rotation);
        scene.hotspots = self
            .hotspots
            .into_iter()
            .map(|hotspot| hotspot.into_hotspot(id))
            .collect();
        scene
    }
}

impl HotspotConfig {
    /// `audio` is the already-resolved persisted form of the hotspot's audio.
    pub fn from_hotspot(hotspot: &Hotspot, audio: Option<String>) -> Self {
        Self {
            id: hotspot.id,
            kind: hotspot.kind(),
            position: hotspot.position,
            label: hotspot.label.clone(),
            text: hotspot.text().unwrap_or_default().to_string(),
            audio,
            scene: hotspot.scene.clone(),
            navigation_target: hotspot.navigation_target().map(str::to_string),
        }
    }

    /// Rebuild a hotspot owned by `owner`. Fields that do not belong to the
    /// hotspot's type are dropped.
    pub fn into_hotspot(self, owner: &str) -> Hotspot {
        let audio = self.audio.map(AudioRef::from_url).unwrap_or_default();
        let content = match self.kind {
            HotspotKind::Text => HotspotContent::Text { text: self.text },
            HotspotKind::Audio => HotspotContent::Audio { audio },
            HotspotKind::TextAudio => HotspotContent::TextAudio {
                text: self.text,
                audio,
            },
            HotspotKind::Navigation => {
                let target = self.navigation_target.unwrap_or_default();
                if target.is_empty() {
                    log::warn!("navigation hotspot {} has no target scene", self.id);
                }
                HotspotContent::Navigation { target }
            }
        };
        let label = if self.label.trim().is_empty() && self.kind != HotspotKind::Navigation {
            Hotspot::default_label(self.id)
        } else {
            self.label
        };
        let scene = if self.scene.is_empty() {
            owner.to_string()
        } else {
            self.scene
        };
        Hotspot {
            id: self.id,
            position: self.position,
            label,
            content,
            scene,
        }
    }
}
