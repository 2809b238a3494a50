use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tour_model::data_url;
use tour_model::{AudioRef, Hotspot, HotspotId, ImageKind, Tour};

use crate::config::{HotspotConfig, SceneConfig, TourConfig};

/// Directory names used for assets inside an exported package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLayout {
    pub image_dir: String,
    pub audio_dir: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            image_dir: "images".to_string(),
            audio_dir: "audio".to_string(),
        }
    }
}

impl AssetLayout {
    /// Config reference for a scene's embedded panorama.
    pub fn image_path(&self, scene_id: &str) -> String {
        format!("./{}/{scene_id}.jpg", self.image_dir)
    }

    /// Config reference for an uploaded audio file.
    pub fn audio_path(&self, scene_id: &str, hotspot_id: HotspotId, file_name: &str) -> String {
        format!(
            "./{}/{scene_id}_{hotspot_id}_{}",
            self.audio_dir,
            bare_file_name(file_name)
        )
    }
}

fn bare_file_name(name: &str) -> &str {
    name.rsplit(|c| c == '/' || c == '\\')
        .next()
        .filter(|part| !part.is_empty())
        .unwrap_or("audio")
}

/// A binary file written next to `config.json`.
#[derive(Clone, PartialEq, Eq)]
pub struct PackageAsset {
    /// Path relative to the package root, without a leading `./`.
    pub path: String,
    pub bytes: Vec<u8>,
}

impl PackageAsset {
    fn new(config_path: &str, bytes: Vec<u8>) -> Self {
        Self {
            path: config_path.trim_start_matches("./").to_string(),
            bytes,
        }
    }
}

impl std::fmt::Debug for PackageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageAsset")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub config: TourConfig,
    pub assets: Vec<PackageAsset>,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub name: String,
    pub created: String,
    pub layout: AssetLayout,
}

impl ExportOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: iso8601_utc(Utc::now()),
            layout: AssetLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: AssetLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Serialize a tour into a portable package.
///
/// Embedded panoramas become `images/{scene}.jpg` and uploaded audio becomes
/// `audio/{scene}_{hotspot}_{file}`; the config points at those files. An
/// embedded image that cannot be decoded is skipped with a warning and keeps
/// its original reference.
pub fn export_package(tour: &Tour, options: &ExportOptions) -> Package {
    let mut assets = Vec::new();
    let config = build_config(tour, options, Some(&mut assets));
    log::info!(
        "exported tour `{}` with {} scene(s) and {} asset(s)",
        options.name,
        tour.scene_count(),
        assets.len()
    );
    Package { config, assets }
}

/// Serialize a tour as a standalone configuration without asset files.
///
/// Embedded images stay inline. Uploaded audio is written as the path it
/// would have inside a package, so the template can sit next to an existing
/// asset folder.
pub fn export_template(tour: &Tour, options: &ExportOptions) -> TourConfig {
    build_config(tour, options, None)
}

fn build_config(
    tour: &Tour,
    options: &ExportOptions,
    mut assets: Option<&mut Vec<PackageAsset>>,
) -> TourConfig {
    let layout = &options.layout;
    let mut scenes = BTreeMap::new();
    for scene in tour.scenes() {
        let image = match (scene.image_kind(), assets.as_deref_mut()) {
            (ImageKind::DataUrl, Some(assets)) => match data_url::decode(&scene.image) {
                Ok(decoded) => {
                    let path = layout.image_path(&scene.id);
                    assets.push(PackageAsset::new(&path, decoded.bytes));
                    path
                }
                Err(err) => {
                    log::warn!("skipping embedded image of scene `{}`: {err}", scene.id);
                    scene.image.clone()
                }
            },
            _ => scene.image.clone(),
        };

        let config = SceneConfig::from_scene(scene, image, |hotspot| {
            let audio = persisted_audio(hotspot, layout, assets.as_deref_mut());
            HotspotConfig::from_hotspot(hotspot, audio)
        });
        scenes.insert(scene.id.clone(), config);
    }

    let mirror = scenes
        .get(tour.current_scene_id())
        .map(|scene| scene.hotspots.clone());

    TourConfig {
        name: Some(options.name.clone()),
        created: Some(options.created.clone()),
        scenes: Some(scenes),
        current_scene: Some(tour.current_scene_id().to_string()),
        hotspots: mirror,
    }
}

fn persisted_audio(
    hotspot: &Hotspot,
    layout: &AssetLayout,
    assets: Option<&mut Vec<PackageAsset>>,
) -> Option<String> {
    match hotspot.audio()? {
        AudioRef::None => None,
        AudioRef::Url(url) => Some(url.clone()),
        AudioRef::UploadedFile(file) => {
            let path = layout.audio_path(&hotspot.scene, hotspot.id, &file.name);
            if let Some(assets) = assets {
                assets.push(PackageAsset::new(&path, file.bytes.clone()));
            }
            Some(path)
        }
    }
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn iso8601_utc(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::load::load_config;
    use tour_model::{
        HotspotDraft, HotspotKind, ImageSource, Position, Rotation, UploadedFile,
        DEFAULT_SCENE_ID,
    };

    fn accept(_: &str) -> Result<(), String> {
        Ok(())
    }

    fn options() -> ExportOptions {
        ExportOptions {
            name: "Campus".to_string(),
            created: "2026-10-19T00:00:00Z".to_string(),
            layout: AssetLayout::default(),
        }
    }

    /// room1 (relative image) + an uploaded scene + a remote scene, with
    /// hotspots of every kind.
    fn sample_tour() -> (Tour, String, String) {
        let mut tour = Tour::new();
        let remote = tour
            .add_scene("Office", ImageSource::Url("https://x/img.jpg".into()), &mut accept)
            .expect("remote scene");
        tour.add_hotspot(
            &HotspotDraft::new(HotspotKind::Text).with_text("Welcome"),
            Position::new(1.0, 2.0, -3.0),
        )
        .expect("text");
        tour.set_starting_point(Rotation::new(0.0, 45.0, 0.0));

        let uploaded = tour
            .add_scene(
                "Lab",
                ImageSource::Upload {
                    mime: "image/jpeg".to_string(),
                    bytes: vec![0xff, 0xd8, 0xff, 0xe0],
                },
                &mut accept,
            )
            .expect("uploaded scene");
        tour.add_hotspot(
            &HotspotDraft::new(HotspotKind::TextAudio)
                .with_text("Listen")
                .with_audio_file(UploadedFile::new("clips/intro.mp3", vec![1, 2, 3])),
            Position::new(0.0, 0.0, -7.5),
        )
        .expect("text-audio");
        tour.add_hotspot(
            &HotspotDraft::new(HotspotKind::Audio).with_audio_url("https://cdn/a.mp3"),
            Position::new(7.5, 0.0, 0.0),
        )
        .expect("audio");
        tour.add_hotspot(
            &HotspotDraft::new(HotspotKind::Navigation)
                .with_label("Back to office")
                .with_target(remote.clone()),
            Position::new(-7.5, 0.0, 0.0),
        )
        .expect("navigation");
        tour.switch_scene(DEFAULT_SCENE_ID);
        (tour, remote, uploaded)
    }

    #[test]
    fn package_rewrites_embedded_assets() {
        let (tour, remote, uploaded) = sample_tour();
        let package = export_package(&tour, &options());
        let scenes = package.config.scenes.as_ref().expect("scenes");

        assert_eq!(scenes[&remote].image, "https://x/img.jpg");
        assert_eq!(scenes[DEFAULT_SCENE_ID].image, "./images/room1.jpg");
        assert_eq!(scenes[&uploaded].image, format!("./images/{uploaded}.jpg"));

        let audio = scenes[&uploaded].hotspots[0].audio.as_deref();
        assert_eq!(audio, Some(format!("./audio/{uploaded}_2_intro.mp3").as_str()));
        assert_eq!(
            scenes[&uploaded].hotspots[1].audio.as_deref(),
            Some("https://cdn/a.mp3")
        );

        let paths: Vec<&str> = package.assets.iter().map(|a| a.path.as_str()).collect();
        let image_path = format!("images/{uploaded}.jpg");
        let audio_path = format!("audio/{uploaded}_2_intro.mp3");
        assert_eq!(paths, vec![image_path.as_str(), audio_path.as_str()]);
        assert_eq!(package.assets.len(), 2);
        let image = package
            .assets
            .iter()
            .find(|asset| asset.path.starts_with("images/"))
            .expect("image asset");
        assert_eq!(image.bytes, vec![0xff, 0xd8, 0xff, 0xe0]);
    }

    #[test]
    fn package_config_round_trips() {
        let (tour, remote, uploaded) = sample_tour();
        let package = export_package(&tour, &options());
        let json = serde_json::to_string_pretty(&package.config).expect("serialize");
        let reloaded = crate::load::load_str(&json).expect("reload");

        assert_eq!(reloaded.current_scene_id(), tour.current_scene_id());
        assert_eq!(reloaded.scene_count(), tour.scene_count());
        assert_eq!(reloaded.navigation_edges(), tour.navigation_edges());
        assert_eq!(reloaded.scene(&remote), tour.scene(&remote));
        assert_eq!(reloaded.scene(DEFAULT_SCENE_ID), tour.scene(DEFAULT_SCENE_ID));

        let original = tour.scene(&uploaded).expect("original");
        let restored = reloaded.scene(&uploaded).expect("restored");
        assert_eq!(restored.image, format!("./images/{uploaded}.jpg"));
        assert_eq!(
            restored.hotspots[0].audio().and_then(AudioRef::as_url),
            Some(format!("./audio/{uploaded}_2_intro.mp3").as_str())
        );
        for (before, after) in original.hotspots.iter().zip(&restored.hotspots) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.position, after.position);
            assert_eq!(before.label, after.label);
            assert_eq!(before.kind(), after.kind());
            assert_eq!(before.text(), after.text());
            assert_eq!(before.navigation_target(), after.navigation_target());
        }
    }

    #[test]
    fn package_without_embedded_assets_round_trips_exactly() {
        let mut tour = Tour::new();
        tour.add_scene("Office", ImageSource::Url("https://x/img.jpg".into()), &mut accept)
            .expect("scene");
        tour.add_hotspot(
            &HotspotDraft::new(HotspotKind::Text).with_text("Hi"),
            Position::new(0.5, 0.25, -7.0),
        )
        .expect("hotspot");
        let package = export_package(&tour, &options());
        assert!(package.assets.is_empty());
        assert_eq!(load_config(package.config), tour);
    }

    #[test]
    fn template_keeps_embedded_images_inline() {
        let (tour, _, uploaded) = sample_tour();
        let config = export_template(&tour, &options());
        let scene = &config.scenes.as_ref().expect("scenes")[&uploaded];
        assert!(scene.image.starts_with("data:image/jpeg;base64,"));
        assert_eq!(
            scene.hotspots[0].audio.as_deref(),
            Some(format!("./audio/{uploaded}_2_intro.mp3").as_str())
        );
        assert_eq!(config.name.as_deref(), Some("Campus"));
        assert_eq!(config.created.as_deref(), Some("2026-10-19T00:00:00Z"));
    }

    #[test]
    fn legacy_mirror_tracks_current_scene() {
        let (tour, _, _) = sample_tour();
        let config = export_template(&tour, &options());
        assert_eq!(config.current_scene.as_deref(), Some(DEFAULT_SCENE_ID));
        assert_eq!(config.hotspots, Some(Vec::new()));
    }

    #[test]
    fn undecodable_image_is_skipped() {
        let broken = tour_model::Scene::new("broken", "Broken", "data:image/jpeg;base64,@@@");
        let tour = Tour::from_scenes([broken], Some("broken"));
        let package = export_package(&tour, &options());
        assert!(package.assets.is_empty());
        let scenes = package.config.scenes.expect("scenes");
        assert_eq!(scenes["broken"].image, "data:image/jpeg;base64,@@@");
    }

    #[test]
    fn formats_iso8601_timestamps() {
        let at = |secs: i64| Utc.timestamp_opt(secs, 0).single().expect("valid timestamp");
        assert_eq!(iso8601_utc(at(0)), "1970-01-01T00:00:00Z");
        assert_eq!(iso8601_utc(at(1_700_000_000)), "2023-11-14T22:13:20Z");
        assert_eq!(iso8601_utc(at(951_782_400)), "2000-02-29T00:00:00Z");
    }

    #[test]
    fn audio_names_drop_directories() {
        let layout = AssetLayout::default();
        assert_eq!(
            layout.audio_path("room1", 3, "C:\\music\\theme.mp3"),
            "./audio/room1_3_theme.mp3"
        );
        assert_eq!(layout.audio_path("room1", 3, "dir/"), "./audio/room1_3_audio");
    }
}
