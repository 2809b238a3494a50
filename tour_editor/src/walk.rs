//! Visitor walk-through: follow every navigation portal from the entry scene
//! the way the runtime would, loading each panorama on the way.

use std::collections::{BTreeSet, VecDeque};

use tour_model::{HotspotId, HotspotKind, ImageProbe, SceneId, Tour};
use tour_package::AssetLayout;

use crate::headless::HeadlessViewer;
use crate::runtime::{ActivationOutcome, Interaction, RuntimeMode, TourRuntime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenPanorama {
    pub scene: SceneId,
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingPortal {
    pub scene: SceneId,
    pub hotspot: HotspotId,
    pub target: SceneId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Scenes reached from the entry scene, in visiting order.
    pub visited: Vec<SceneId>,
    /// Scenes no chain of portals leads to.
    pub unreachable: Vec<SceneId>,
    pub broken_panoramas: Vec<BrokenPanorama>,
    pub dangling: Vec<DanglingPortal>,
}

impl WalkReport {
    pub fn is_clean(&self) -> bool {
        self.broken_panoramas.is_empty() && self.dangling.is_empty()
    }
}

/// Walk `tour` breadth-first from its current scene. `probe` receives each
/// resolved panorama path and reports whether it loads.
pub fn walk_tour<P>(tour: &Tour, layout: &AssetLayout, probe: &mut P) -> WalkReport
where
    P: ImageProbe + ?Sized,
{
    let entry = tour.current_scene_id().to_string();
    let mut runtime =
        TourRuntime::new(tour.clone(), RuntimeMode::Navigation).with_layout(layout.clone());
    let mut viewer = HeadlessViewer::new();
    let mut report = WalkReport::default();
    let mut seen = BTreeSet::from([entry.clone()]);
    let mut queue = VecDeque::from([entry]);

    while let Some(scene_id) = queue.pop_front() {
        let Some(ticket) = runtime.activate_scene(&scene_id, &mut viewer) else {
            continue;
        };
        let result = probe.probe(ticket.path());
        if let Err(reason) = &result {
            report.broken_panoramas.push(BrokenPanorama {
                scene: scene_id.clone(),
                path: ticket.path().to_string(),
                reason: reason.clone(),
            });
        }
        if runtime.complete_activation(&ticket, result, &mut viewer) == ActivationOutcome::Stale {
            log::warn!("walk lost track of scene `{scene_id}`");
        }
        report.visited.push(scene_id.clone());

        let portals: Vec<HotspotId> = runtime
            .tour()
            .current_hotspots()
            .iter()
            .filter(|hotspot| hotspot.kind() == HotspotKind::Navigation)
            .map(|hotspot| hotspot.id)
            .collect();
        for hotspot in portals {
            // Each click navigates away, so step back before the next one.
            runtime.tour_mut().switch_scene(&scene_id);
            match runtime.click_hotspot(hotspot, &mut viewer) {
                Interaction::Navigating(next) => {
                    if seen.insert(next.scene().to_string()) {
                        queue.push_back(next.scene().to_string());
                    }
                }
                Interaction::MissingTarget(target) => report.dangling.push(DanglingPortal {
                    scene: scene_id.clone(),
                    hotspot,
                    target,
                }),
                other => log::debug!("portal {hotspot} produced {other:?}"),
            }
        }
    }

    report.unreachable = tour
        .scenes()
        .map(|scene| scene.id.clone())
        .filter(|id| !seen.contains(id))
        .collect();
    log::info!(
        "walked {} scene(s); {} unreachable, {} broken panorama(s), {} dangling portal(s)",
        report.visited.len(),
        report.unreachable.len(),
        report.broken_panoramas.len(),
        report.dangling.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tour_model::{HotspotDraft, ImageSource, Position, DEFAULT_SCENE_ID};

    fn accept(_: &str) -> Result<(), String> {
        Ok(())
    }

    fn portal(tour: &mut Tour, label: &str, target: &str) -> HotspotId {
        tour.add_hotspot(
            &HotspotDraft::new(HotspotKind::Navigation)
                .with_label(label)
                .with_target(target),
            Position::new(0.0, 0.0, -7.5),
        )
        .expect("portal")
    }

    #[test]
    fn follows_portals_breadth_first() {
        let mut tour = Tour::new();
        let office = tour
            .add_scene("Office", ImageSource::Url("https://x/o.jpg".into()), &mut accept)
            .expect("office");
        let attic = tour
            .add_scene("Attic", ImageSource::Url("https://x/a.jpg".into()), &mut accept)
            .expect("attic");
        tour.switch_scene(&office);
        portal(&mut tour, "Back", DEFAULT_SCENE_ID);
        tour.switch_scene(DEFAULT_SCENE_ID);
        portal(&mut tour, "Office", &office);

        let report = walk_tour(&tour, &AssetLayout::default(), &mut accept);
        assert_eq!(report.visited, vec![DEFAULT_SCENE_ID.to_string(), office]);
        assert_eq!(report.unreachable, vec![attic]);
        assert!(report.is_clean());
    }

    #[test]
    fn reports_broken_panoramas_and_dangling_portals() {
        let mut tour = Tour::new();
        let office = tour
            .add_scene("Office", ImageSource::Url("https://x/o.jpg".into()), &mut accept)
            .expect("office");
        tour.switch_scene(DEFAULT_SCENE_ID);
        let id = portal(&mut tour, "Office", &office);
        tour.remove_scene(&office).expect("remove");

        let mut missing_local = |path: &str| -> Result<(), String> {
            if path.starts_with("./") {
                Err("not found".to_string())
            } else {
                Ok(())
            }
        };
        let report = walk_tour(&tour, &AssetLayout::default(), &mut missing_local);
        assert_eq!(
            report.broken_panoramas,
            vec![BrokenPanorama {
                scene: DEFAULT_SCENE_ID.to_string(),
                path: "./images/room1.jpg".to_string(),
                reason: "not found".to_string(),
            }]
        );
        assert_eq!(
            report.dangling,
            vec![DanglingPortal {
                scene: DEFAULT_SCENE_ID.to_string(),
                hotspot: id,
                target: office,
            }]
        );
        assert!(!report.is_clean());
    }
}
