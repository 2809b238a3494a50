use chrono::Utc;
use tour_model::{
    classify_image, AudioRef, Hotspot, HotspotContent, HotspotId, ImageKind, Rotation, SceneId,
    Tour,
};
use tour_package::AssetLayout;

/// Query parameter appended to panorama URLs to defeat browser caching.
pub const DEFAULT_CACHE_PARAM: &str = "t";

/// Hooks into the rendering engine that displays the tour.
pub trait Viewer {
    /// Begin loading the ticket's panorama. The host reports the result
    /// through [`TourRuntime::complete_activation`].
    fn request_panorama(&mut self, ticket: &ActivationTicket);
    fn show_panorama(&mut self, url: &str);
    fn clear_hotspots(&mut self);
    fn spawn_hotspot(&mut self, hotspot: &Hotspot);
    fn set_camera_rotation(&mut self, rotation: Rotation);
    /// Where the camera is looking right now, in degrees.
    fn camera_rotation(&self) -> Rotation;
    fn show_error(&mut self, message: &str);
    /// Brief indicator naming the scene a portal leads to.
    fn show_transition(&mut self, destination: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Visitors browse the tour; portals switch scenes.
    Navigation,
    /// The tour is being authored; portal clicks are not followed.
    Editing,
}

/// One in-flight panorama load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationTicket {
    generation: u64,
    scene: SceneId,
    path: String,
    url: String,
}

impl ActivationTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    /// Resolved panorama path, as shown in error messages.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path with the cache-busting parameter; what the viewer should load.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Applied,
    Failed,
    /// A newer activation was requested after this one.
    Stale,
}

/// Result of clicking a hotspot in the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Ignored,
    ShowText(String),
    PlayAudio(AudioRef),
    ShowTextAndPlayAudio { text: String, audio: AudioRef },
    Navigating(ActivationTicket),
    /// The portal points at a scene that no longer exists.
    MissingTarget(SceneId),
}

/// Where the viewer should load a scene's panorama from in a played-back
/// package.
///
/// Exported packages store embedded images as files, so `data:` URLs map to
/// the image the exporter would have written. The editor shows `data:` URLs
/// as they are.
pub fn resolve_image_path(scene_id: &str, image: &str, layout: &AssetLayout) -> String {
    match classify_image(image) {
        ImageKind::Url => image.to_string(),
        ImageKind::DataUrl => layout.image_path(scene_id),
        ImageKind::RelativePath => {
            if image.starts_with("./") || image.starts_with("../") || image.starts_with('/') {
                image.to_string()
            } else {
                format!("./{image}")
            }
        }
    }
}

pub fn cache_busted(path: &str, param: &str, token: i64) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{param}={token}")
}

/// Drives scene activation and hotspot interaction against a [`Viewer`].
///
/// Panorama loads finish asynchronously. Each activation gets a ticket with
/// a new generation and only the latest ticket is applied, so a slow load
/// can never replace the scene the user switched to afterwards.
#[derive(Debug)]
pub struct TourRuntime {
    tour: Tour,
    mode: RuntimeMode,
    layout: AssetLayout,
    cache_param: String,
    generation: u64,
    pending: Option<ActivationTicket>,
    displayed: Option<SceneId>,
}

impl TourRuntime {
    pub fn new(tour: Tour, mode: RuntimeMode) -> Self {
        Self {
            tour,
            mode,
            layout: AssetLayout::default(),
            cache_param: DEFAULT_CACHE_PARAM.to_string(),
            generation: 0,
            pending: None,
            displayed: None,
        }
    }

    pub fn with_layout(mut self, layout: AssetLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_cache_param(mut self, param: impl Into<String>) -> Self {
        self.cache_param = param.into();
        self
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn tour_mut(&mut self) -> &mut Tour {
        &mut self.tour
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RuntimeMode) {
        self.mode = mode;
    }

    /// Scene whose panorama is currently on screen.
    pub fn displayed_scene(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    pub fn pending(&self) -> Option<&ActivationTicket> {
        self.pending.as_ref()
    }

    /// Swap in a freshly loaded tour and return the previous one. Loads
    /// still in flight for the old tour become stale.
    pub fn replace_tour(&mut self, tour: Tour) -> Tour {
        self.pending = None;
        self.displayed = None;
        std::mem::replace(&mut self.tour, tour)
    }

    /// Make `id` current and start loading its panorama. Unknown ids are
    /// ignored.
    pub fn activate_scene<V>(&mut self, id: &str, viewer: &mut V) -> Option<ActivationTicket>
    where
        V: Viewer + ?Sized,
    {
        if !self.tour.switch_scene(id) {
            log::warn!("cannot activate unknown scene `{id}`");
            return None;
        }
        Some(self.activate_current(viewer))
    }

    /// Reload the current scene.
    pub fn activate_current<V>(&mut self, viewer: &mut V) -> ActivationTicket
    where
        V: Viewer + ?Sized,
    {
        let scene = self.tour.current_scene();
        let (path, url) = match (self.mode, classify_image(&scene.image)) {
            // While authoring, uploads only exist inline; nothing is on disk yet.
            (RuntimeMode::Editing, ImageKind::DataUrl) => (
                format!("embedded image of scene `{}`", scene.id),
                scene.image.clone(),
            ),
            _ => {
                let path = resolve_image_path(&scene.id, &scene.image, &self.layout);
                let url = cache_busted(&path, &self.cache_param, Utc::now().timestamp_millis());
                (path, url)
            }
        };
        self.generation += 1;
        let ticket = ActivationTicket {
            generation: self.generation,
            scene: scene.id.clone(),
            path,
            url,
        };
        log::debug!(
            "activating scene `{}` (generation {})",
            ticket.scene,
            ticket.generation
        );
        self.pending = Some(ticket.clone());
        viewer.request_panorama(&ticket);
        ticket
    }

    /// Apply the result of a panorama load.
    ///
    /// On success the panorama is swapped, hotspot markers are rebuilt from
    /// the scene and its starting orientation is applied. On failure the
    /// viewer shows an error naming the path and the previous panorama stays
    /// up.
    pub fn complete_activation<V>(
        &mut self,
        ticket: &ActivationTicket,
        result: Result<(), String>,
        viewer: &mut V,
    ) -> ActivationOutcome
    where
        V: Viewer + ?Sized,
    {
        let is_latest = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation);
        if !is_latest {
            log::debug!(
                "dropping stale panorama load for `{}` (generation {})",
                ticket.scene,
                ticket.generation
            );
            return ActivationOutcome::Stale;
        }
        self.pending = None;

        if let Err(reason) = result {
            log::warn!("panorama {} failed to load: {reason}", ticket.path);
            viewer.show_error(&format!("Could not load panorama {}: {reason}", ticket.path));
            return ActivationOutcome::Failed;
        }

        let Some(scene) = self.tour.scene(&ticket.scene) else {
            log::warn!("scene `{}` was removed while loading", ticket.scene);
            return ActivationOutcome::Stale;
        };
        viewer.show_panorama(&ticket.url);
        viewer.clear_hotspots();
        for hotspot in &scene.hotspots {
            viewer.spawn_hotspot(hotspot);
        }
        if let Some(rotation) = scene.starting_point {
            viewer.set_camera_rotation(rotation);
        }
        self.displayed = Some(scene.id.clone());
        log::info!(
            "showing scene `{}` with {} hotspot(s)",
            scene.id,
            scene.hotspots.len()
        );
        ActivationOutcome::Applied
    }

    /// React to a click on a hotspot of the current scene.
    pub fn click_hotspot<V>(&mut self, id: HotspotId, viewer: &mut V) -> Interaction
    where
        V: Viewer + ?Sized,
    {
        if self.mode != RuntimeMode::Navigation {
            return Interaction::Ignored;
        }
        let Some(hotspot) = self.tour.current_scene().hotspot(id) else {
            log::debug!("click on unknown hotspot {id}");
            return Interaction::Ignored;
        };
        let target = match &hotspot.content {
            HotspotContent::Text { text } => return Interaction::ShowText(text.clone()),
            HotspotContent::Audio { audio } => return Interaction::PlayAudio(audio.clone()),
            HotspotContent::TextAudio { text, audio } => {
                return Interaction::ShowTextAndPlayAudio {
                    text: text.clone(),
                    audio: audio.clone(),
                }
            }
            HotspotContent::Navigation { target } => target.clone(),
        };

        let Some(destination) = self.tour.scene(&target) else {
            log::warn!("hotspot {id} points at missing scene `{target}`");
            return Interaction::MissingTarget(target);
        };
        viewer.show_transition(&destination.name);
        match self.activate_scene(&target, viewer) {
            Some(ticket) => Interaction::Navigating(ticket),
            None => Interaction::MissingTarget(target),
        }
    }
}
