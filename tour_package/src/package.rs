//! Reading and writing package directories (`config.json` plus assets).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use tour_model::{classify_image, ImageKind, Tour};
use walkdir::WalkDir;

use crate::config::TourConfig;
use crate::export::Package;
use crate::load::{load_config, parse_config, LoadError};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug)]
pub struct LoadedPackage {
    pub tour: Tour,
    pub config: TourConfig,
    /// Every file in the package, relative to its root with `/` separators.
    pub files: BTreeSet<String>,
}

impl LoadedPackage {
    pub fn missing_assets(&self) -> Vec<String> {
        missing_assets(&self.files, &self.config)
    }
}

pub fn write_config(path: &Path, config: &TourConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(config).context("serializing tour configuration")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Write every asset below `dir`, then `config.json`. Assets whose path
/// would leave `dir` are skipped with a warning.
pub fn write_package(dir: &Path, package: &Package) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating package {}", dir.display()))?;
    let mut written = 0;
    for asset in &package.assets {
        let relative = Path::new(&asset.path);
        if !is_contained(relative) {
            log::warn!(
                "skipping asset {}: path escapes the package directory",
                asset.path
            );
            continue;
        }
        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        fs::write(&target, &asset.bytes)
            .with_context(|| format!("writing asset {}", target.display()))?;
        written += 1;
    }
    write_config(&dir.join(CONFIG_FILE), &package.config)?;
    log::info!("wrote package to {} ({written} asset(s))", dir.display());
    Ok(())
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Load a package directory. The directory must contain files and a
/// `config.json` entry.
pub fn read_package(dir: &Path) -> Result<LoadedPackage, LoadError> {
    let files = inventory(dir)?;
    if files.is_empty() {
        return Err(LoadError::EmptyPackage(dir.to_path_buf()));
    }
    if !files.contains(CONFIG_FILE) {
        return Err(LoadError::MissingEntry {
            dir: dir.to_path_buf(),
            entry: CONFIG_FILE,
        });
    }
    let config_path = dir.join(CONFIG_FILE);
    let raw = fs::read_to_string(&config_path).map_err(|source| LoadError::Io {
        path: config_path.clone(),
        source,
    })?;
    let config = parse_config(&raw)?;
    let tour = load_config(config.clone());
    Ok(LoadedPackage {
        tour,
        config,
        files,
    })
}

fn inventory(dir: &Path) -> Result<BTreeSet<String>, LoadError> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            LoadError::Io {
                path,
                source: err.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let key = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(key);
    }
    Ok(files)
}

/// Package-relative asset references in `config` that `files` does not
/// contain. URLs and embedded data are not checked.
pub fn missing_assets(files: &BTreeSet<String>, config: &TourConfig) -> Vec<String> {
    let scenes = config.scenes.iter().flat_map(|scenes| scenes.values());
    let scene_hotspots = scenes.clone().flat_map(|scene| scene.hotspots.iter());
    let legacy_hotspots = config.hotspots.iter().flatten();

    let references = scenes
        .map(|scene| scene.image.as_str())
        .chain(
            scene_hotspots
                .chain(legacy_hotspots)
                .filter_map(|hotspot| hotspot.audio.as_deref()),
        )
        .filter(|reference| !reference.is_empty())
        .filter(|reference| classify_image(reference) == ImageKind::RelativePath);

    let mut missing = BTreeSet::new();
    for reference in references {
        let normalized = reference.trim_start_matches("./");
        if !files.contains(normalized) {
            missing.insert(reference.to_string());
        }
    }
    missing.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{export_package, AssetLayout, ExportOptions};
    use tempfile::tempdir;
    use tour_model::{HotspotDraft, HotspotKind, ImageSource, Position, UploadedFile};

    fn options() -> ExportOptions {
        ExportOptions {
            name: "Test".to_string(),
            created: "2026-10-19T00:00:00Z".to_string(),
            layout: AssetLayout::default(),
        }
    }

    fn embedded_tour() -> Tour {
        let mut tour = Tour::new();
        let mut accept = |_: &str| -> Result<(), String> { Ok(()) };
        tour.add_scene(
            "Lab",
            ImageSource::Upload {
                mime: "image/jpeg".to_string(),
                bytes: vec![9, 9, 9],
            },
            &mut accept,
        )
        .expect("scene");
        tour.add_hotspot(
            &HotspotDraft::new(HotspotKind::Audio)
                .with_audio_file(UploadedFile::new("hum.ogg", vec![4, 5])),
            Position::new(0.0, 0.0, -7.5),
        )
        .expect("hotspot");
        tour
    }

    #[test]
    fn writes_and_reads_package() -> Result<()> {
        let dir = tempdir()?;
        let tour = embedded_tour();
        let package = export_package(&tour, &options());
        write_package(dir.path(), &package)?;

        let lab = tour.current_scene_id().to_string();
        assert!(dir.path().join(CONFIG_FILE).is_file());
        assert_eq!(fs::read(dir.path().join(format!("images/{lab}.jpg")))?, vec![9, 9, 9]);
        assert_eq!(
            fs::read(dir.path().join(format!("audio/{lab}_1_hum.ogg")))?,
            vec![4, 5]
        );

        let loaded = read_package(dir.path())?;
        assert_eq!(loaded.tour.current_scene_id(), lab);
        assert!(loaded.files.contains(&format!("images/{lab}.jpg")));
        // room1 ships its own panorama, which this package never wrote.
        assert_eq!(loaded.missing_assets(), vec!["./images/room1.jpg".to_string()]);
        Ok(())
    }

    #[test]
    fn empty_directory_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        assert!(matches!(
            read_package(dir.path()),
            Err(LoadError::EmptyPackage(_))
        ));
        Ok(())
    }

    #[test]
    fn directory_without_config_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("images"))?;
        fs::write(dir.path().join("images/room1.jpg"), [1u8])?;
        assert!(matches!(
            read_package(dir.path()),
            Err(LoadError::MissingEntry { entry: CONFIG_FILE, .. })
        ));
        Ok(())
    }

    #[test]
    fn malformed_config_is_reported() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE), "{\"scenes\": [")?;
        assert!(matches!(read_package(dir.path()), Err(LoadError::Parse(_))));
        Ok(())
    }

    #[test]
    fn skips_assets_outside_package() -> Result<()> {
        let dir = tempdir()?;
        let mut package = export_package(&Tour::new(), &options());
        package.assets.push(crate::export::PackageAsset {
            path: "../escape.bin".to_string(),
            bytes: vec![0],
        });
        write_package(&dir.path().join("pkg"), &package)?;
        assert!(!dir.path().join("escape.bin").exists());
        assert!(dir.path().join("pkg").join(CONFIG_FILE).is_file());
        Ok(())
    }

    #[test]
    fn hostile_scene_id_does_not_block_other_assets() -> Result<()> {
        let json = r#"{
            "scenes": {
                "lab": {"name": "Lab", "image": "data:image/jpeg;base64,AQID"},
                "../evil": {"name": "Evil", "image": "data:image/jpeg;base64,BAUG"}
            },
            "currentScene": "lab"
        }"#;
        let tour = crate::load::load_str(json)?;
        let package = export_package(&tour, &options());
        let dir = tempdir()?;
        let root = dir.path().join("pkg");
        write_package(&root, &package)?;

        assert_eq!(fs::read(root.join("images/lab.jpg"))?, vec![1, 2, 3]);
        assert!(!root.join("evil.jpg").exists());
        assert!(!dir.path().join("evil.jpg").exists());
        let loaded = read_package(&root)?;
        assert_eq!(loaded.tour.current_scene_id(), "lab");
        Ok(())
    }

    #[test]
    fn missing_assets_ignores_remote_and_inline_references() {
        let json = r#"{
            "scenes": {
                "room1": {"name": "Room", "image": "./images/room1.jpg", "hotspots": [
                    {"id": 1, "type": "audio", "position": "0 0 0", "audio": "./audio/room1_1_a.mp3"},
                    {"id": 2, "type": "audio", "position": "0 0 0", "audio": "https://cdn/b.mp3"}
                ]},
                "web": {"name": "Web", "image": "https://x/web.jpg"},
                "inline": {"name": "Inline", "image": "data:image/jpeg;base64,AAAA"}
            },
            "currentScene": "room1"
        }"#;
        let config = parse_config(json).expect("parse");
        let files: BTreeSet<String> = ["images/room1.jpg".to_string()].into_iter().collect();
        assert_eq!(
            missing_assets(&files, &config),
            vec!["./audio/room1_1_a.mp3".to_string()]
        );
    }
}
