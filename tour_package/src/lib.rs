//! Serialized tour configurations and the packages built around them.
//!
//! The loader and the exporter are two directions of one contract: feeding
//! an exported `config.json` back through [`load::load_config`] rebuilds an
//! equivalent [`tour_model::Tour`], with embedded images and uploaded audio
//! pointing at the asset files written next to it.

pub mod config;
pub mod export;
pub mod load;
pub mod package;

pub use config::{HotspotConfig, SceneConfig, StartingPoint, TourConfig};
pub use export::{
    export_package, export_template, iso8601_utc, AssetLayout, ExportOptions, Package,
    PackageAsset,
};
pub use load::{load_config, load_str, parse_config, ConfigFormat, LoadError};
pub use package::{missing_assets, read_package, write_config, write_package, LoadedPackage};
