//! Authoring state machine.
//!
//! The editor is always in one [`EditorMode`]. Panorama clicks mean
//! different things depending on the mode: nothing while idle, "place the
//! pending draft here" while placing, and "move this hotspot here" while
//! repositioning. Scene-level operations are only accepted while idle.

use std::fmt;

use glam::Vec3;
use thiserror::Error;
use tour_model::{
    HotspotDraft, HotspotId, ImageProbe, ImageSource, Projector, Rotation, SceneId, Tour,
    TourError, ValidationError, DEFAULT_SCENE_ID,
};

use crate::runtime::{ActivationOutcome, ActivationTicket, RuntimeMode, TourRuntime, Viewer};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Idle,
    PlacingHotspot,
    Repositioning { hotspot: HotspotId },
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorMode::Idle => f.write_str("idle"),
            EditorMode::PlacingHotspot => f.write_str("placing a hotspot"),
            EditorMode::Repositioning { hotspot } => write!(f, "repositioning hotspot {hotspot}"),
        }
    }
}

/// A click on the panorama sphere as reported by the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanoramaHit {
    pub point: Vec3,
    pub camera: Vec3,
}

impl PanoramaHit {
    pub fn new(point: Vec3, camera: Vec3) -> Self {
        Self { point, camera }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    Created(HotspotId),
    Moved(HotspotId),
}

/// Visual feedback the host should apply, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    PlacingIndicator(bool),
    /// Shown translucent and pulsing while it is being moved.
    HotspotHighlighted(HotspotId),
    HotspotRestored(HotspotId),
    HotspotCreated(HotspotId),
    HotspotUpdated(HotspotId),
    HotspotMoved(HotspotId),
    HotspotDeleted(HotspotId),
    SceneAdded(SceneId),
    SceneSwitched(SceneId),
    SceneDeleted(SceneId),
    StartingPointSet(SceneId),
    StartingPointCleared(SceneId),
    TourLoaded,
}

/// Yes/no confirmation for destructive actions.
pub trait Prompt {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Prompt for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Tour(TourError),
    #[error("cannot {action} while {mode}")]
    Busy {
        action: &'static str,
        mode: EditorMode,
    },
    #[error("finish or cancel repositioning first")]
    RepositionInProgress,
    #[error("{0} was not confirmed")]
    Declined(&'static str),
}

impl From<TourError> for EditorError {
    fn from(err: TourError) -> Self {
        match err {
            TourError::Validation(err) => EditorError::Validation(err),
            other => EditorError::Tour(other),
        }
    }
}

#[derive(Debug)]
pub struct Editor {
    runtime: TourRuntime,
    mode: EditorMode,
    draft: HotspotDraft,
    projector: Projector,
    events: Vec<EditorEvent>,
}

impl Editor {
    pub fn new(tour: Tour, settings: &Settings) -> Self {
        let runtime = TourRuntime::new(tour, RuntimeMode::Editing)
            .with_layout(settings.layout.clone())
            .with_cache_param(settings.cache_bust_param.clone());
        Self {
            runtime,
            mode: EditorMode::Idle,
            draft: HotspotDraft::default(),
            projector: settings.projector(),
            events: Vec::new(),
        }
    }

    pub fn tour(&self) -> &Tour {
        self.runtime.tour()
    }

    pub fn runtime(&self) -> &TourRuntime {
        &self.runtime
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn draft(&self) -> &HotspotDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut HotspotDraft {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: HotspotDraft) {
        self.draft = draft;
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: EditorEvent) {
        log::debug!("editor event: {event:?}");
        self.events.push(event);
    }

    fn require_idle(&self, action: &'static str) -> Result<(), EditorError> {
        match self.mode {
            EditorMode::Idle => Ok(()),
            mode => Err(EditorError::Busy { action, mode }),
        }
    }

    /// Arm placement: the next panorama click creates a hotspot from the
    /// current draft.
    pub fn enter_placing(&mut self) -> Result<(), EditorError> {
        match self.mode {
            EditorMode::Idle => {
                self.mode = EditorMode::PlacingHotspot;
                self.emit(EditorEvent::PlacingIndicator(true));
                Ok(())
            }
            EditorMode::PlacingHotspot => Ok(()),
            EditorMode::Repositioning { .. } => Err(EditorError::RepositionInProgress),
        }
    }

    pub fn click_panorama(&mut self, hit: PanoramaHit) -> Result<ClickOutcome, EditorError> {
        match self.mode {
            EditorMode::Idle => Ok(ClickOutcome::Ignored),
            EditorMode::PlacingHotspot => {
                // Validation failures keep the editor in placing mode.
                let position = self.projector.project(hit.point, hit.camera);
                let id = self
                    .runtime
                    .tour_mut()
                    .add_hotspot(&self.draft, position)?;
                self.mode = EditorMode::Idle;
                self.draft = HotspotDraft::new(self.draft.kind);
                self.emit(EditorEvent::PlacingIndicator(false));
                self.emit(EditorEvent::HotspotCreated(id));
                log::info!("placed hotspot {id} at {position}");
                Ok(ClickOutcome::Created(id))
            }
            EditorMode::Repositioning { hotspot } => {
                let position = self.projector.project(hit.point, hit.camera);
                self.runtime.tour_mut().move_hotspot(hotspot, position)?;
                self.mode = EditorMode::Idle;
                self.emit(EditorEvent::HotspotMoved(hotspot));
                self.emit(EditorEvent::HotspotRestored(hotspot));
                Ok(ClickOutcome::Moved(hotspot))
            }
        }
    }

    /// Pick up a hotspot of the current scene so the next click moves it.
    pub fn begin_reposition(&mut self, id: HotspotId) -> Result<(), EditorError> {
        self.require_idle("reposition a hotspot")?;
        if self.tour().current_scene().hotspot(id).is_none() {
            return Err(TourError::UnknownHotspot(id).into());
        }
        self.mode = EditorMode::Repositioning { hotspot: id };
        self.emit(EditorEvent::HotspotHighlighted(id));
        Ok(())
    }

    /// Leave placing or repositioning without changing anything.
    pub fn cancel(&mut self) {
        match std::mem::take(&mut self.mode) {
            EditorMode::Idle => {}
            EditorMode::PlacingHotspot => self.emit(EditorEvent::PlacingIndicator(false)),
            EditorMode::Repositioning { hotspot } => {
                self.emit(EditorEvent::HotspotRestored(hotspot))
            }
        }
    }

    /// Apply edited form values to an existing hotspot. Nothing changes when
    /// they do not validate.
    pub fn edit_hotspot(&mut self, id: HotspotId, draft: &HotspotDraft) -> Result<(), EditorError> {
        self.runtime.tour_mut().update_hotspot(id, draft)?;
        self.emit(EditorEvent::HotspotUpdated(id));
        Ok(())
    }

    pub fn delete_hotspot<P>(&mut self, id: HotspotId, prompt: &mut P) -> Result<(), EditorError>
    where
        P: Prompt + ?Sized,
    {
        if matches!(self.mode, EditorMode::Repositioning { .. }) {
            return Err(EditorError::RepositionInProgress);
        }
        let label = self
            .tour()
            .hotspot(id)
            .map(|hotspot| hotspot.label.clone())
            .ok_or(TourError::UnknownHotspot(id))?;
        if !prompt.confirm(&format!(
            "Delete hotspot \"{label}\"? This cannot be undone."
        )) {
            return Err(EditorError::Declined("hotspot deletion"));
        }
        self.runtime.tour_mut().remove_hotspot(id)?;
        self.emit(EditorEvent::HotspotDeleted(id));
        Ok(())
    }

    /// Switch to another scene and start loading it. Unknown ids change
    /// nothing and return `None`.
    pub fn switch_scene<V>(
        &mut self,
        id: &str,
        viewer: &mut V,
    ) -> Result<Option<ActivationTicket>, EditorError>
    where
        V: Viewer + ?Sized,
    {
        self.require_idle("switch scenes")?;
        let ticket = self.runtime.activate_scene(id, viewer);
        if ticket.is_some() {
            self.emit(EditorEvent::SceneSwitched(id.to_string()));
        }
        Ok(ticket)
    }

    /// Add a scene, make it current and start loading it.
    pub fn add_scene<P, V>(
        &mut self,
        name: &str,
        source: ImageSource,
        probe: &mut P,
        viewer: &mut V,
    ) -> Result<SceneId, EditorError>
    where
        P: ImageProbe + ?Sized,
        V: Viewer + ?Sized,
    {
        self.require_idle("add a scene")?;
        let id = self.runtime.tour_mut().add_scene(name, source, probe)?;
        self.emit(EditorEvent::SceneAdded(id.clone()));
        self.runtime.activate_current(viewer);
        log::info!("added scene `{id}` ({name})");
        Ok(id)
    }

    /// Delete a scene after confirmation. Deleting the current scene falls
    /// back to the default scene and reloads it.
    pub fn delete_scene<P, V>(
        &mut self,
        id: &str,
        prompt: &mut P,
        viewer: &mut V,
    ) -> Result<(), EditorError>
    where
        P: Prompt + ?Sized,
        V: Viewer + ?Sized,
    {
        self.require_idle("delete a scene")?;
        if id == DEFAULT_SCENE_ID {
            return Err(TourError::DefaultSceneProtected.into());
        }
        let name = self
            .tour()
            .scene(id)
            .map(|scene| scene.name.clone())
            .ok_or_else(|| TourError::UnknownScene(id.to_string()))?;
        if !prompt.confirm(&format!(
            "Delete scene \"{name}\" and all of its hotspots? This cannot be undone."
        )) {
            return Err(EditorError::Declined("scene deletion"));
        }
        let was_current = self.tour().current_scene_id() == id;
        let removed = self.runtime.tour_mut().remove_scene(id)?;
        self.emit(EditorEvent::SceneDeleted(removed.id.clone()));
        if was_current {
            self.emit(EditorEvent::SceneSwitched(DEFAULT_SCENE_ID.to_string()));
            self.runtime.activate_current(viewer);
        }
        log::info!(
            "deleted scene `{}` with {} hotspot(s)",
            removed.id,
            removed.hotspots.len()
        );
        Ok(())
    }

    /// Store where the viewer's camera is looking now as the current
    /// scene's starting point.
    pub fn capture_starting_point<V>(&mut self, viewer: &V) -> Rotation
    where
        V: Viewer + ?Sized,
    {
        let rotation = viewer.camera_rotation();
        self.set_starting_point(rotation);
        rotation
    }

    /// Use `rotation` as the current scene's initial camera orientation.
    pub fn set_starting_point(&mut self, rotation: Rotation) {
        self.runtime.tour_mut().set_starting_point(rotation);
        let scene = self.tour().current_scene_id().to_string();
        self.emit(EditorEvent::StartingPointSet(scene));
    }

    pub fn clear_starting_point(&mut self) {
        self.runtime.tour_mut().clear_starting_point();
        let scene = self.tour().current_scene_id().to_string();
        self.emit(EditorEvent::StartingPointCleared(scene));
    }

    /// Replace the whole tour, abandoning any pending placement or move.
    pub fn load_tour<V>(&mut self, tour: Tour, viewer: &mut V) -> ActivationTicket
    where
        V: Viewer + ?Sized,
    {
        self.cancel();
        self.runtime.replace_tour(tour);
        self.emit(EditorEvent::TourLoaded);
        self.runtime.activate_current(viewer)
    }

    pub fn complete_activation<V>(
        &mut self,
        ticket: &ActivationTicket,
        result: Result<(), String>,
        viewer: &mut V,
    ) -> ActivationOutcome
    where
        V: Viewer + ?Sized,
    {
        self.runtime.complete_activation(ticket, result, viewer)
    }
}
