mod cli;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tour_editor::{load_settings, resolve_image_path, walk_tour, Settings};
use tour_model::{classify_image, AudioRef, HotspotContent, ImageKind, Tour};
use tour_package::{
    export_package, export_template, load_config, parse_config, read_package, write_config,
    write_package, ExportOptions, TourConfig,
};

use crate::cli::{Args, Command};

const UNTITLED: &str = "Untitled Tour";

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let settings = load_settings(args.settings.as_deref())?;

    match args.command {
        Command::Inspect { source } => inspect(&source, &settings),
        Command::Export { source, out, name } => export(&source, &out, name, &settings),
        Command::Template { source, out, name } => template(&source, &out, name, &settings),
        Command::Check { package } => check(&package),
        Command::Walk { source } => walk(&source, &settings),
    }
}

/// A tour read from disk plus the directory its relative asset paths start at.
struct Source {
    tour: Tour,
    config: TourConfig,
    base: PathBuf,
}

fn load_source(path: &Path) -> Result<Source> {
    if path.is_dir() {
        let package = read_package(path)
            .with_context(|| format!("reading package {}", path.display()))?;
        return Ok(Source {
            tour: package.tour,
            config: package.config,
            base: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading configuration {}", path.display()))?;
    let config =
        parse_config(&raw).with_context(|| format!("parsing configuration {}", path.display()))?;
    let tour = load_config(config.clone());
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(Source { tour, config, base })
}

fn export_options(source: &Source, name: Option<String>, settings: &Settings) -> ExportOptions {
    let name = name
        .or_else(|| source.config.name.clone())
        .unwrap_or_else(|| UNTITLED.to_string());
    ExportOptions::new(name).with_layout(settings.layout.clone())
}

fn inspect(path: &Path, settings: &Settings) -> Result<()> {
    let source = load_source(path)?;
    let tour = &source.tour;
    if let Some(name) = &source.config.name {
        println!("Tour: {name}");
    }
    println!(
        "{} scene(s), {} hotspot(s), current scene `{}`",
        tour.scene_count(),
        tour.hotspot_count(),
        tour.current_scene_id()
    );
    for scene in tour.scenes() {
        let marker = if scene.id == tour.current_scene_id() {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {} \"{}\" -> {}",
            scene.id,
            scene.name,
            display_image(&scene.id, &scene.image, settings)
        );
        if let Some(rotation) = scene.starting_point {
            println!(
                "    starting point: {:.1} {:.1} {:.1}",
                rotation.x, rotation.y, rotation.z
            );
        }
        for hotspot in &scene.hotspots {
            let detail = match &hotspot.content {
                HotspotContent::Navigation { target } => format!("-> {target}"),
                HotspotContent::Text { text } => format!("\"{text}\""),
                HotspotContent::Audio { audio } => describe_audio(audio),
                HotspotContent::TextAudio { text, audio } => {
                    format!("\"{text}\" + {}", describe_audio(audio))
                }
            };
            println!(
                "    #{} {} [{}] at {} {detail}",
                hotspot.id,
                hotspot.label,
                hotspot.kind(),
                hotspot.position
            );
        }
    }
    let dangling = tour.dangling_navigation();
    for (scene, hotspot, target) in &dangling {
        log::warn!("hotspot {hotspot} in `{scene}` points at missing scene `{target}`");
    }
    if !dangling.is_empty() {
        println!("{} navigation hotspot(s) with missing targets", dangling.len());
    }
    Ok(())
}

fn describe_audio(audio: &AudioRef) -> String {
    match audio {
        AudioRef::None => "(no audio)".to_string(),
        AudioRef::Url(url) => url.clone(),
        AudioRef::UploadedFile(file) => format!("(uploaded {})", file.name),
    }
}

fn display_image(scene_id: &str, image: &str, settings: &Settings) -> String {
    match classify_image(image) {
        ImageKind::DataUrl => format!(
            "(embedded image, exported as {})",
            resolve_image_path(scene_id, image, &settings.layout)
        ),
        _ => image.to_string(),
    }
}

fn export(path: &Path, out: &Path, name: Option<String>, settings: &Settings) -> Result<()> {
    let source = load_source(path)?;
    let options = export_options(&source, name, settings);
    let package = export_package(&source.tour, &options);
    write_package(out, &package)
        .with_context(|| format!("exporting tour to {}", out.display()))?;
    println!(
        "wrote {} with {} asset file(s)",
        out.display(),
        package.assets.len()
    );
    Ok(())
}

fn template(path: &Path, out: &Path, name: Option<String>, settings: &Settings) -> Result<()> {
    let source = load_source(path)?;
    let options = export_options(&source, name, settings);
    let config = export_template(&source.tour, &options);
    write_config(out, &config).with_context(|| format!("writing template {}", out.display()))?;
    println!("wrote template {}", out.display());
    Ok(())
}

fn check(dir: &Path) -> Result<()> {
    let package =
        read_package(dir).with_context(|| format!("reading package {}", dir.display()))?;
    let missing = package.missing_assets();
    if missing.is_empty() {
        println!(
            "{}: {} file(s), all referenced assets present",
            dir.display(),
            package.files.len()
        );
        return Ok(());
    }
    for asset in &missing {
        println!("missing: {asset}");
    }
    bail!(
        "{} referenced asset(s) missing from {}",
        missing.len(),
        dir.display()
    );
}

fn walk(path: &Path, settings: &Settings) -> Result<()> {
    let source = load_source(path)?;
    let base = source.base.clone();
    let mut probe = |resolved: &str| -> Result<(), String> {
        if classify_image(resolved) != ImageKind::RelativePath {
            log::debug!("not probing remote panorama {resolved}");
            return Ok(());
        }
        let file = base.join(resolved.trim_start_matches("./"));
        if file.is_file() {
            Ok(())
        } else {
            Err(format!("{} not found", file.display()))
        }
    };
    let report = walk_tour(&source.tour, &settings.layout, &mut probe);

    println!("visited: {}", report.visited.join(", "));
    if !report.unreachable.is_empty() {
        println!("unreachable: {}", report.unreachable.join(", "));
    }
    for broken in &report.broken_panoramas {
        println!(
            "broken panorama in `{}`: {} ({})",
            broken.scene, broken.path, broken.reason
        );
    }
    for portal in &report.dangling {
        println!(
            "hotspot {} in `{}` points at missing scene `{}`",
            portal.hotspot, portal.scene, portal.target
        );
    }
    if !report.is_clean() {
        bail!(
            "walk found {} broken panorama(s) and {} dangling portal(s)",
            report.broken_panoramas.len(),
            report.dangling.len()
        );
    }
    Ok(())
}
