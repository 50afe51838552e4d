pub mod camera;
pub mod dive;
pub mod proximity;
pub mod quadtree;
pub mod ship;

use eframe::egui::{Pos2, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::atlas::{Dataset, PositionedIdea};
use crate::config::AtlasConfig;
use camera::{Camera, CameraFrame, CameraInput};
use dive::{DiveController, DiveState, DiveSwitch};
use proximity::{ProximityCandidate, ProximityManager, nearest_distance};
use quadtree::{DEFAULT_CAPACITY, DEFAULT_MAX_DEPTH, QuadBounds, Quadtree};
use ship::{Ship, ShipConfig};

const FALLBACK_HALF_EXTENT: f32 = 5000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub capacity: usize,
    pub max_depth: usize,
    /// World units added around the dataset's extent.
    pub padding: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            padding: 250.0,
        }
    }
}

/// Builds a quadtree whose root fits every finite idea position.
pub fn build_index(ideas: &[PositionedIdea], config: &IndexConfig) -> Quadtree {
    let bounds = QuadBounds::from_points(ideas.iter().map(PositionedIdea::position), config.padding)
        .unwrap_or_else(|| {
            QuadBounds::new(
                pos2(-FALLBACK_HALF_EXTENT, -FALLBACK_HALF_EXTENT),
                pos2(FALLBACK_HALF_EXTENT, FALLBACK_HALF_EXTENT),
            )
        });

    let mut tree = Quadtree::with_max_depth(bounds, config.capacity, config.max_depth);
    tree.insert_ideas(ideas);
    tree
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionInput {
    pub thrust: Vec2,
    pub request_dive: bool,
    pub request_exit: bool,
    pub screen_size: Vec2,
    pub delta_seconds: f32,
}

impl Default for SessionInput {
    fn default() -> Self {
        Self {
            thrust: Vec2::ZERO,
            request_dive: false,
            request_exit: false,
            screen_size: vec2(1440.0, 920.0),
            delta_seconds: 1.0 / 60.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub tick: u64,
    pub ship: Ship,
    pub camera: CameraFrame,
    pub dive: DiveState,
    pub switched: Option<DiveSwitch>,
    pub candidates_refreshed: bool,
    pub nearest: Option<ProximityCandidate>,
    pub nearest_distance: Option<f32>,
}

/// One navigation session over a loaded dataset.
pub struct Session {
    dataset: Dataset,
    index: Quadtree,
    index_config: IndexConfig,
    proximity: ProximityManager,
    dive: DiveController,
    camera: Camera,
    ship: Ship,
    ship_config: ShipConfig,
    candidates: Vec<ProximityCandidate>,
    topic_filter: Option<String>,
    tick: u64,
}

impl Session {
    pub fn new(dataset: Dataset, config: &AtlasConfig) -> Self {
        let index = build_index(&dataset.ideas, &config.index);
        let start = dataset
            .ideas
            .first()
            .map_or(Pos2::ZERO, PositionedIdea::position);
        info!(ideas = dataset.len(), "session started");

        Self {
            dataset,
            index,
            index_config: config.index.clone(),
            proximity: ProximityManager::new(config.proximity.clone()),
            dive: DiveController::new(config.dive.clone()),
            camera: Camera::new(config.camera.clone(), start),
            ship: Ship::at(start),
            ship_config: config.ship.clone(),
            candidates: Vec::new(),
            topic_filter: None,
            tick: 0,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn index(&self) -> &Quadtree {
        &self.index
    }

    pub fn candidates(&self) -> &[ProximityCandidate] {
        &self.candidates
    }

    pub fn ship(&self) -> Ship {
        self.ship
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn dive(&self) -> &DiveController {
        &self.dive
    }

    pub fn teleport(&mut self, position: Pos2) {
        self.ship = Ship::at(position);
        self.camera.snap_to(position);
        self.proximity.reset();
    }

    /// Ideas outside the filtered topic are dimmed and ignored by the zoom heuristic.
    pub fn set_topic_filter(&mut self, topic: Option<String>) {
        self.topic_filter = topic;
    }

    pub fn is_dimmed(&self, index: usize) -> bool {
        is_dimmed(&self.dataset, self.topic_filter.as_deref(), index)
    }

    /// Swaps in a new dataset. Dive, proximity and camera targets reset before the next tick.
    pub fn reload(&mut self, dataset: Dataset) {
        self.index = build_index(&dataset.ideas, &self.index_config);
        self.dataset = dataset;
        self.proximity.reset();
        self.dive.exit();
        self.camera.reset_zoom();
        self.candidates.clear();
        info!(ideas = self.dataset.len(), "session reloaded");
    }

    pub fn tick(&mut self, input: &SessionInput) -> FrameReport {
        self.tick += 1;
        self.ship
            .step(input.thrust, &self.ship_config, input.delta_seconds);

        let refreshed = match self.proximity.poll(&self.index, self.ship.position) {
            Some(candidates) => {
                self.candidates = candidates;
                true
            }
            None => false,
        };

        if input.request_exit {
            self.dive.exit();
        } else if input.request_dive
            && !self.dive.is_active()
            && let Some(target) = self.dive.trigger_candidate(&self.candidates)
        {
            self.dive.enter(target);
        }

        let mut switched = None;
        if self.dive.is_active() {
            switched = self.dive.check_proximity_switch(&self.candidates);
            match self
                .dive
                .target()
                .and_then(|target| self.dataset.ideas.get(target))
            {
                Some(target) => self.dive.apply_magnet(
                    self.ship.position,
                    target.position(),
                    &mut self.ship.velocity,
                    input.delta_seconds,
                ),
                None => {
                    debug!("dive target vanished");
                    self.dive.exit();
                }
            }
        }

        let filter = self.topic_filter.as_deref();
        let dataset = &self.dataset;
        let nearest_distance =
            nearest_distance(&self.candidates, |index| is_dimmed(dataset, filter, index));
        let camera = self.camera.update(&CameraInput {
            followed: self.ship.position,
            velocity: self.ship.velocity,
            diving: self.dive.is_active(),
            nearest_distance,
            screen_size: input.screen_size,
            delta_seconds: input.delta_seconds,
        });

        FrameReport {
            tick: self.tick,
            ship: self.ship,
            camera,
            dive: self.dive.state(),
            switched,
            candidates_refreshed: refreshed,
            nearest: self.candidates.first().copied(),
            nearest_distance,
        }
    }
}

fn is_dimmed(dataset: &Dataset, filter: Option<&str>, index: usize) -> bool {
    match (filter, dataset.ideas.get(index)) {
        (Some(topic), Some(idea)) => idea.idea.topic != topic,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
