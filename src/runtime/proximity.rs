use eframe::egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::atlas::{Dataset, PositionedIdea};
use crate::runtime::quadtree::Quadtree;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub query_radius: f32,
    /// Query once every this many ticks.
    pub throttle_ticks: u32,
    pub full_detail_distance: f32,
    pub label_distance: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            query_radius: 1200.0,
            throttle_ticks: 3,
            full_detail_distance: 180.0,
            label_distance: 600.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Full,
    Label,
    Marker,
}

impl DetailLevel {
    fn for_distance(distance: f32, config: &ProximityConfig) -> Self {
        if distance <= config.full_detail_distance {
            Self::Full
        } else if distance <= config.label_distance {
            Self::Label
        } else {
            Self::Marker
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProximityCandidate {
    /// Index into `Dataset::ideas`.
    pub index: usize,
    pub distance: f32,
    pub detail: DetailLevel,
}

impl ProximityCandidate {
    pub fn idea<'a>(&self, dataset: &'a Dataset) -> Option<&'a PositionedIdea> {
        dataset.ideas.get(self.index)
    }
}

#[derive(Clone, Debug)]
pub struct ProximityManager {
    config: ProximityConfig,
    tick: u64,
}

impl ProximityManager {
    pub fn new(config: ProximityConfig) -> Self {
        Self { config, tick: 0 }
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.tick = 0;
    }

    /// Advances one tick. Returns `None` on throttled ticks; callers keep their previous list.
    pub fn poll(&mut self, tree: &Quadtree, viewpoint: Pos2) -> Option<Vec<ProximityCandidate>> {
        let throttle = u64::from(self.config.throttle_ticks.max(1));
        let due = self.tick % throttle == 0;
        self.tick = self.tick.wrapping_add(1);

        due.then(|| self.query_nearby(tree, viewpoint))
    }

    /// Unthrottled query, sorted by distance then dataset index.
    pub fn query_nearby(&self, tree: &Quadtree, viewpoint: Pos2) -> Vec<ProximityCandidate> {
        let mut candidates = tree
            .query_radius(viewpoint, self.config.query_radius)
            .into_iter()
            .map(|entry| {
                let distance = entry.position.distance(viewpoint);
                ProximityCandidate {
                    index: entry.index,
                    distance,
                    detail: DetailLevel::for_distance(distance, &self.config),
                }
            })
            .collect::<Vec<_>>();

        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        candidates
    }
}

/// Distance of the nearest candidate not rejected by `dimmed`.
pub fn nearest_distance(
    candidates: &[ProximityCandidate],
    mut dimmed: impl FnMut(usize) -> bool,
) -> Option<f32> {
    candidates
        .iter()
        .find(|candidate| !dimmed(candidate.index))
        .map(|candidate| candidate.distance)
}
