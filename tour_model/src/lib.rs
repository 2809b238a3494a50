//! Scene graph for 360° hotspot tours.
//!
//! A [`Tour`] owns a set of panorama [`Scene`]s, each holding its own ordered
//! list of [`Hotspot`]s. Everything here is plain data plus the operations that
//! keep the tour invariants intact; rendering and persistence live in the
//! sibling crates.

pub mod data_url;
pub mod hotspot;
pub mod position;
pub mod scene;
pub mod tour;
pub mod validation;

pub use hotspot::{AudioRef, Hotspot, HotspotContent, HotspotId, HotspotKind, UploadedFile};
pub use position::{Position, PositionParseError, Projector, OPTIMAL_DISTANCE};
pub use scene::{
    classify_image, ImageKind, Rotation, Scene, SceneId, DEFAULT_SCENE_ID, DEFAULT_SCENE_IMAGE,
};
pub use tour::{ImageProbe, ImageSource, Tour, TourError};
pub use validation::{HotspotDraft, ValidationError};
