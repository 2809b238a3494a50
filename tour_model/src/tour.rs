use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;

use crate::data_url;
use crate::hotspot::{Hotspot, HotspotId};
use crate::position::Position;
use crate::scene::{Rotation, Scene, SceneId, DEFAULT_SCENE_ID};
use crate::validation::{HotspotDraft, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourError {
    #[error("scene `{0}` does not exist")]
    UnknownScene(SceneId),
    #[error("the default scene `{DEFAULT_SCENE_ID}` cannot be deleted")]
    DefaultSceneProtected,
    #[error("could not load image {url}: {reason}")]
    ImageUnavailable { url: String, reason: String },
    #[error("hotspot {0} does not exist")]
    UnknownHotspot(HotspotId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Where a new scene's panorama comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file picked by the author; stored inline as a `data:` URL.
    Upload { mime: String, bytes: Vec<u8> },
    /// A remote image, test-loaded before the scene is accepted.
    Url(String),
}

/// Test-loads a remote panorama before a scene referencing it is created.
pub trait ImageProbe {
    fn probe(&mut self, url: &str) -> Result<(), String>;
}

impl<F> ImageProbe for F
where
    F: FnMut(&str) -> Result<(), String>,
{
    fn probe(&mut self, url: &str) -> Result<(), String> {
        self(url)
    }
}

/// Aggregate root: every scene of the tour plus which one is current.
///
/// Each scene owns the only copy of its hotspot list; the "current
/// hotspots" are a borrow of the current scene's list.
#[derive(Debug, Clone)]
pub struct Tour {
    scenes: BTreeMap<SceneId, Scene>,
    current: SceneId,
    last_hotspot_id: HotspotId,
}

impl Default for Tour {
    fn default() -> Self {
        Self::new()
    }
}

// The id counter is session state and is not part of a tour's identity.
impl PartialEq for Tour {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current && self.scenes == other.scenes
    }
}

impl Tour {
    pub fn new() -> Self {
        let mut scenes = BTreeMap::new();
        scenes.insert(DEFAULT_SCENE_ID.to_string(), Scene::default_scene());
        Self {
            scenes,
            current: DEFAULT_SCENE_ID.to_string(),
            last_hotspot_id: 0,
        }
    }

    /// Assemble a tour from already-built scenes.
    ///
    /// The default scene is added when missing, an unknown `current` falls
    /// back to it, hotspot `scene` fields are pointed at their owning scene
    /// and the id counter resumes after the largest hotspot id.
    pub fn from_scenes<I>(scenes: I, current: Option<&str>) -> Self
    where
        I: IntoIterator<Item = Scene>,
    {
        let mut map = BTreeMap::new();
        let mut last_hotspot_id = 0;
        for mut scene in scenes {
            for hotspot in &mut scene.hotspots {
                if hotspot.scene != scene.id {
                    if !hotspot.scene.is_empty() {
                        log::warn!(
                            "hotspot {} claims scene `{}` but is stored in `{}`",
                            hotspot.id,
                            hotspot.scene,
                            scene.id
                        );
                    }
                    hotspot.scene = scene.id.clone();
                }
                last_hotspot_id = last_hotspot_id.max(hotspot.id);
            }
            if map.contains_key(&scene.id) {
                log::warn!("duplicate scene id `{}`; keeping the last one", scene.id);
            }
            map.insert(scene.id.clone(), scene);
        }

        if !map.contains_key(DEFAULT_SCENE_ID) {
            log::warn!("tour has no `{DEFAULT_SCENE_ID}` scene; adding an empty one");
            map.insert(DEFAULT_SCENE_ID.to_string(), Scene::default_scene());
        }

        let current = match current {
            Some(id) if map.contains_key(id) => id.to_string(),
            Some(id) => {
                log::warn!("current scene `{id}` does not exist; using `{DEFAULT_SCENE_ID}`");
                DEFAULT_SCENE_ID.to_string()
            }
            None => DEFAULT_SCENE_ID.to_string(),
        };

        Self {
            scenes: map,
            current,
            last_hotspot_id,
        }
    }

    pub fn scenes(&self) -> impl ExactSizeIterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn contains_scene(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn current_scene_id(&self) -> &str {
        &self.current
    }

    pub fn current_scene(&self) -> &Scene {
        // `current` always names a stored scene.
        &self.scenes[&self.current]
    }

    pub fn current_hotspots(&self) -> &[Hotspot] {
        &self.current_scene().hotspots
    }

    pub fn hotspot(&self, id: HotspotId) -> Option<&Hotspot> {
        self.scenes.values().find_map(|scene| scene.hotspot(id))
    }

    pub fn hotspot_count(&self) -> usize {
        self.scenes.values().map(|scene| scene.hotspots.len()).sum()
    }

    /// Largest hotspot id handed out so far. Never decreases.
    pub fn last_hotspot_id(&self) -> HotspotId {
        self.last_hotspot_id
    }

    /// Every navigation hotspot as `(scene, hotspot, target)`.
    pub fn navigation_edges(&self) -> Vec<(&str, HotspotId, &str)> {
        self.scenes
            .values()
            .flat_map(|scene| {
                scene.hotspots.iter().filter_map(move |hotspot| {
                    hotspot
                        .navigation_target()
                        .map(|target| (scene.id.as_str(), hotspot.id, target))
                })
            })
            .collect()
    }

    /// Navigation edges whose target scene no longer exists.
    pub fn dangling_navigation(&self) -> Vec<(&str, HotspotId, &str)> {
        self.navigation_edges()
            .into_iter()
            .filter(|(_, _, target)| !self.scenes.contains_key(*target))
            .collect()
    }

    /// Add a scene and make it current.
    ///
    /// Remote images are probed first; a failed probe leaves the tour as it
    /// was.
    pub fn add_scene<P>(
        &mut self,
        name: impl Into<String>,
        source: ImageSource,
        probe: &mut P,
    ) -> Result<SceneId, TourError>
    where
        P: ImageProbe + ?Sized,
    {
        let image = match source {
            ImageSource::Upload { mime, bytes } => data_url::encode(&mime, &bytes),
            ImageSource::Url(url) => {
                probe
                    .probe(&url)
                    .map_err(|reason| TourError::ImageUnavailable {
                        url: url.clone(),
                        reason,
                    })?;
                url
            }
        };
        let id = self.fresh_scene_id();
        self.scenes
            .insert(id.clone(), Scene::new(id.clone(), name, image));
        self.current = id.clone();
        log::debug!("added scene `{id}`");
        Ok(id)
    }

    /// Remove a scene. Falls back to the default scene when the removed one
    /// was current. Navigation hotspots that pointed at it are left alone.
    pub fn remove_scene(&mut self, id: &str) -> Result<Scene, TourError> {
        if id == DEFAULT_SCENE_ID {
            return Err(TourError::DefaultSceneProtected);
        }
        let scene = self
            .scenes
            .remove(id)
            .ok_or_else(|| TourError::UnknownScene(id.to_string()))?;
        if self.current == id {
            self.current = DEFAULT_SCENE_ID.to_string();
        }
        Ok(scene)
    }

    /// Make `id` current. Returns `false` and changes nothing for an unknown
    /// id.
    pub fn switch_scene(&mut self, id: &str) -> bool {
        if !self.scenes.contains_key(id) {
            return false;
        }
        self.current = id.to_string();
        true
    }

    pub fn set_starting_point(&mut self, rotation: Rotation) {
        self.current_scene_mut().starting_point = Some(rotation);
    }

    pub fn clear_starting_point(&mut self) {
        self.current_scene_mut().starting_point = None;
    }

    /// Validate `draft` and append the hotspot to the current scene.
    pub fn add_hotspot(
        &mut self,
        draft: &HotspotDraft,
        position: Position,
    ) -> Result<HotspotId, ValidationError> {
        let content = draft.validate(&self.current, |id| self.scenes.contains_key(id))?;
        self.last_hotspot_id += 1;
        let id = self.last_hotspot_id;
        let scene_id = self.current.clone();
        let hotspot = Hotspot {
            id,
            position,
            label: draft.label_for(id),
            content,
            scene: scene_id,
        };
        self.current_scene_mut().hotspots.push(hotspot);
        Ok(id)
    }

    /// Replace a hotspot's label and payload. Nothing changes when the draft
    /// does not validate.
    pub fn update_hotspot(&mut self, id: HotspotId, draft: &HotspotDraft) -> Result<(), TourError> {
        let owner = self
            .hotspot(id)
            .map(|hotspot| hotspot.scene.clone())
            .ok_or(TourError::UnknownHotspot(id))?;
        let content = draft.validate(&owner, |scene| self.scenes.contains_key(scene))?;
        let hotspot = self
            .hotspot_mut(id)
            .ok_or(TourError::UnknownHotspot(id))?;
        hotspot.label = draft.label_for(id);
        hotspot.content = content;
        Ok(())
    }

    pub fn move_hotspot(&mut self, id: HotspotId, position: Position) -> Result<(), TourError> {
        let hotspot = self
            .hotspot_mut(id)
            .ok_or(TourError::UnknownHotspot(id))?;
        hotspot.position = position;
        Ok(())
    }

    /// Remove a hotspot from its owning scene. Its id is never reissued.
    pub fn remove_hotspot(&mut self, id: HotspotId) -> Result<Hotspot, TourError> {
        for scene in self.scenes.values_mut() {
            if let Some(index) = scene.hotspots.iter().position(|hotspot| hotspot.id == id) {
                return Ok(scene.hotspots.remove(index));
            }
        }
        Err(TourError::UnknownHotspot(id))
    }

    fn hotspot_mut(&mut self, id: HotspotId) -> Option<&mut Hotspot> {
        self.scenes
            .values_mut()
            .find_map(|scene| scene.hotspot_mut(id))
    }

    fn current_scene_mut(&mut self) -> &mut Scene {
        // `current` always names a stored scene.
        self.scenes
            .get_mut(&self.current)
            .unwrap_or_else(|| unreachable!("current scene missing from tour"))
    }

    fn fresh_scene_id(&self) -> SceneId {
        let millis = Utc::now().timestamp_millis();
        let base = format!("scene_{millis}");
        if !self.scenes.contains_key(&base) {
            return base;
        }
        (1..)
            .map(|suffix| format!("{base}_{suffix}"))
            .find(|candidate| !self.scenes.contains_key(candidate))
            .unwrap_or(base)
    }
}
