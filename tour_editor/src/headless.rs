use std::collections::VecDeque;

use tour_model::{Hotspot, HotspotId, Rotation, SceneId};

use crate::runtime::{ActivationTicket, Viewer};

/// One call made against a [`HeadlessViewer`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCall {
    RequestPanorama { scene: SceneId, url: String },
    ShowPanorama(String),
    ClearHotspots,
    SpawnHotspot(HotspotId),
    SetCameraRotation(Rotation),
    ShowError(String),
    ShowTransition(String),
}

/// Viewer without a renderer. Records every call and queues panorama
/// requests so a driver can complete them in any order.
#[derive(Debug, Default)]
pub struct HeadlessViewer {
    pending: VecDeque<ActivationTicket>,
    history: Vec<ViewerCall>,
    rotation: Rotation,
}

impl HeadlessViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[ViewerCall] {
        &self.history
    }

    pub fn take_calls(&mut self) -> Vec<ViewerCall> {
        std::mem::take(&mut self.history)
    }

    /// Turn the camera the way a user dragging the panorama would. Not
    /// recorded as a call.
    pub fn look(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Oldest panorama request that has not been picked up yet.
    pub fn next_request(&mut self) -> Option<ActivationTicket> {
        self.pending.pop_front()
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.history.iter().filter_map(|call| match call {
            ViewerCall::ShowError(message) => Some(message.as_str()),
            _ => None,
        })
    }

    /// Ids of the markers currently on screen.
    pub fn spawned(&self) -> Vec<HotspotId> {
        let start = self
            .history
            .iter()
            .rposition(|call| *call == ViewerCall::ClearHotspots)
            .map_or(0, |index| index + 1);
        self.history[start..]
            .iter()
            .filter_map(|call| match call {
                ViewerCall::SpawnHotspot(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl Viewer for HeadlessViewer {
    fn request_panorama(&mut self, ticket: &ActivationTicket) {
        self.history.push(ViewerCall::RequestPanorama {
            scene: ticket.scene().to_string(),
            url: ticket.url().to_string(),
        });
        self.pending.push_back(ticket.clone());
    }

    fn show_panorama(&mut self, url: &str) {
        self.history.push(ViewerCall::ShowPanorama(url.to_string()));
    }

    fn clear_hotspots(&mut self) {
        self.history.push(ViewerCall::ClearHotspots);
    }

    fn spawn_hotspot(&mut self, hotspot: &Hotspot) {
        self.history.push(ViewerCall::SpawnHotspot(hotspot.id));
    }

    fn set_camera_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        self.history.push(ViewerCall::SetCameraRotation(rotation));
    }

    fn camera_rotation(&self) -> Rotation {
        self.rotation
    }

    fn show_error(&mut self, message: &str) {
        self.history.push(ViewerCall::ShowError(message.to_string()));
    }

    fn show_transition(&mut self, destination: &str) {
        self.history
            .push(ViewerCall::ShowTransition(destination.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{RuntimeMode, TourRuntime};
    use tour_model::Tour;

    #[test]
    fn queues_requests_in_order() {
        let mut runtime = TourRuntime::new(Tour::new(), RuntimeMode::Navigation);
        let mut viewer = HeadlessViewer::new();
        let first = runtime.activate_current(&mut viewer);
        let second = runtime.activate_current(&mut viewer);
        assert_eq!(viewer.pending_requests(), 2);
        assert_eq!(viewer.next_request(), Some(first));
        assert_eq!(viewer.next_request(), Some(second));
        assert_eq!(viewer.next_request(), None);
    }

    #[test]
    fn camera_follows_look_and_scene_rotation() {
        let mut viewer = HeadlessViewer::new();
        assert_eq!(viewer.camera_rotation(), Rotation::default());
        viewer.look(Rotation::new(10.0, 20.0, 0.0));
        assert_eq!(viewer.camera_rotation(), Rotation::new(10.0, 20.0, 0.0));
        assert!(viewer.calls().is_empty());
        viewer.set_camera_rotation(Rotation::new(0.0, 90.0, 0.0));
        assert_eq!(viewer.camera_rotation(), Rotation::new(0.0, 90.0, 0.0));
    }

    #[test]
    fn spawned_tracks_last_rebuild() {
        let mut viewer = HeadlessViewer::new();
        viewer.history = vec![
            ViewerCall::ClearHotspots,
            ViewerCall::SpawnHotspot(1),
            ViewerCall::ClearHotspots,
            ViewerCall::SpawnHotspot(4),
            ViewerCall::SpawnHotspot(5),
        ];
        assert_eq!(viewer.spawned(), vec![4, 5]);
        assert_eq!(viewer.take_calls().len(), 5);
        assert!(viewer.calls().is_empty());
    }
}
