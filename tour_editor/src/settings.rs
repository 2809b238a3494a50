use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tour_model::{Projector, OPTIMAL_DISTANCE};
use tour_package::AssetLayout;

use crate::runtime::DEFAULT_CACHE_PARAM;

/// Optional JSON settings file. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Radius from the camera at which new hotspots are placed.
    pub hotspot_distance: f32,
    /// Query parameter used to bust panorama caches.
    pub cache_bust_param: String,
    /// Directory names for images and audio inside exported packages.
    pub layout: AssetLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotspot_distance: OPTIMAL_DISTANCE,
            cache_bust_param: DEFAULT_CACHE_PARAM.to_string(),
            layout: AssetLayout::default(),
        }
    }
}

impl Settings {
    pub fn projector(&self) -> Projector {
        Projector::with_distance(self.hotspot_distance)
    }
}

/// Read settings from `path`, or return the defaults when no path is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let data =
        fs::read_to_string(path).with_context(|| format!("reading settings {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&data)
        .with_context(|| format!("parsing settings {}", path.display()))?;
    ensure!(
        settings.hotspot_distance.is_finite() && settings.hotspot_distance > 0.0,
        "hotspot_distance must be a positive number (got {})",
        settings.hotspot_distance
    );
    ensure!(
        !settings.cache_bust_param.trim().is_empty(),
        "cache_bust_param must not be empty"
    );
    Ok(settings)
}
