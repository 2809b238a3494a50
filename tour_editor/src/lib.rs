//! Authoring and playback on top of the tour scene graph.
//!
//! [`editor::Editor`] drives hotspot placement and scene management;
//! [`runtime::TourRuntime`] turns the current scene into calls on a
//! [`runtime::Viewer`], the rendering engine the host provides.

pub mod editor;
pub mod headless;
pub mod runtime;
pub mod settings;
pub mod walk;

pub use editor::{ClickOutcome, Editor, EditorError, EditorEvent, EditorMode, PanoramaHit, Prompt};
pub use headless::{HeadlessViewer, ViewerCall};
pub use runtime::{
    cache_busted, resolve_image_path, ActivationOutcome, ActivationTicket, Interaction,
    RuntimeMode, TourRuntime, Viewer,
};
pub use settings::{load_settings, Settings};
pub use walk::{walk_tour, BrokenPanorama, DanglingPortal, WalkReport};
