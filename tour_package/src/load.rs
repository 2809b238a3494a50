use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tour_model::{Scene, Tour, DEFAULT_SCENE_ID};

use crate::config::TourConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("package {0} contains no files")]
    EmptyPackage(PathBuf),
    #[error("package {dir} has no {entry}")]
    MissingEntry { dir: PathBuf, entry: &'static str },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which shape a configuration document has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `{ scenes, currentScene }`
    MultiScene,
    /// `{ hotspots: [...] }` from single-scene tours.
    Legacy,
    /// Neither key present.
    Empty,
}

impl TourConfig {
    pub fn format(&self) -> ConfigFormat {
        if self.scenes.is_some() {
            ConfigFormat::MultiScene
        } else if self.hotspots.is_some() {
            ConfigFormat::Legacy
        } else {
            ConfigFormat::Empty
        }
    }
}

pub fn parse_config(json: &str) -> Result<TourConfig, LoadError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse and load a configuration document. Invalid JSON is the only error;
/// the caller's current tour stays untouched because a new one is returned.
pub fn load_str(json: &str) -> Result<Tour, LoadError> {
    parse_config(json).map(load_config)
}

/// Build a tour from either configuration shape. A document with neither
/// shape yields the default tour.
pub fn load_config(config: TourConfig) -> Tour {
    match config.format() {
        ConfigFormat::MultiScene => {
            let current = config.current_scene;
            let scenes = config
                .scenes
                .unwrap_or_default()
                .into_iter()
                .map(|(id, scene)| scene.into_scene(&id));
            let tour = Tour::from_scenes(scenes, current.as_deref());
            log::info!(
                "loaded tour with {} scene(s) and {} hotspot(s)",
                tour.scene_count(),
                tour.hotspot_count()
            );
            tour
        }
        ConfigFormat::Legacy => {
            let mut scene = Scene::default_scene();
            scene.hotspots = config
                .hotspots
                .unwrap_or_default()
                .into_iter()
                .map(|hotspot| hotspot.into_hotspot(DEFAULT_SCENE_ID))
                .collect();
            log::warn!(
                "configuration uses the single-scene format; wrapped {} hotspot(s) into `{DEFAULT_SCENE_ID}`",
                scene.hotspots.len()
            );
            Tour::from_scenes([scene], Some(DEFAULT_SCENE_ID))
        }
        ConfigFormat::Empty => {
            log::warn!("configuration has neither scenes nor hotspots; starting an empty tour");
            Tour::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tour_model::HotspotKind;

    #[test]
    fn loads_multi_scene_config() {
        let json = r#"{
            "name": "Campus",
            "created": "2026-01-02T03:04:05Z",
            "scenes": {
                "room1": {"name": "Lobby", "image": "./images/room1.jpg", "hotspots": [
                    {"id": 1, "type": "navigation", "position": "0.00 0.00 -7.50",
                     "label": "Office", "text": "", "audio": null,
                     "scene": "room1", "navigationTarget": "office"}
                ], "startingPoint": null},
                "office": {"name": "Office", "image": "https://x/img.jpg", "hotspots": [
                    {"id": 4, "type": "text", "position": "1.00 2.00 -3.00",
                     "label": "Desk", "text": "Welcome", "audio": null,
                     "scene": "office", "navigationTarget": null}
                ], "startingPoint": {"rotation": {"x": 0, "y": 45, "z": 0}}}
            },
            "currentScene": "office"
        }"#;
        let tour = load_str(json).expect("load");
        assert_eq!(tour.scene_count(), 2);
        assert_eq!(tour.current_scene_id(), "office");
        assert_eq!(tour.current_hotspots()[0].text(), Some("Welcome"));
        assert_eq!(tour.navigation_edges(), vec![("room1", 1, "office")]);
        assert_eq!(tour.last_hotspot_id(), 4);
    }

    #[test]
    fn wraps_legacy_hotspots_into_default_scene() {
        let json = r#"{"hotspots": [
            {"id": 2, "type": "text", "position": "1 2 3", "label": "", "text": "Hi"},
            {"id": 7, "type": "audio", "position": "0 0 -7.5", "audio": "https://x/a.mp3"}
        ]}"#;
        let config = parse_config(json).expect("parse");
        assert_eq!(config.format(), ConfigFormat::Legacy);
        let tour = load_config(config);
        assert_eq!(tour.scene_count(), 1);
        assert_eq!(tour.current_scene_id(), DEFAULT_SCENE_ID);
        let hotspots = tour.current_hotspots();
        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].label, "Hotspot 2");
        assert_eq!(hotspots[1].kind(), HotspotKind::Audio);
        assert!(hotspots.iter().all(|h| h.scene == DEFAULT_SCENE_ID));
    }

    #[test]
    fn scenes_take_precedence_over_legacy_mirror() {
        let json = r#"{
            "scenes": {"room1": {"name": "Room", "image": "./images/room1.jpg", "hotspots": []}},
            "currentScene": "room1",
            "hotspots": [{"id": 1, "type": "text", "position": "0 0 0", "text": "stale"}]
        }"#;
        let tour = load_str(json).expect("load");
        assert_eq!(tour.hotspot_count(), 0);
    }

    #[test]
    fn config_without_known_keys_yields_default_tour() {
        let tour = load_str(r#"{"name": "nothing here"}"#).expect("load");
        assert_eq!(tour, Tour::new());
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(load_str("{ not json"), Err(LoadError::Parse(_))));
        assert!(matches!(
            load_str(r#"{"hotspots": [{"id": 1, "type": "video", "position": "0 0 0"}]}"#),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn missing_default_scene_is_restored() {
        let json = r#"{
            "scenes": {"office": {"name": "Office", "image": "https://x/img.jpg"}},
            "currentScene": "office"
        }"#;
        let tour = load_str(json).expect("load");
        assert!(tour.contains_scene(DEFAULT_SCENE_ID));
        assert_eq!(tour.current_scene_id(), "office");
    }
}
