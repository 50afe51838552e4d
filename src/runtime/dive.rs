use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::runtime::proximity::ProximityCandidate;
use crate::util::time_step_scale;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiveConfig {
    pub trigger_distance: f32,
    /// Clamped to `trigger_distance`.
    pub switch_distance: f32,
    /// Fraction of the target offset added to velocity per 60 Hz frame.
    pub magnet_strength: f32,
}

impl Default for DiveConfig {
    fn default() -> Self {
        Self {
            trigger_distance: 140.0,
            switch_distance: 80.0,
            magnet_strength: 0.045,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "target", rename_all = "lowercase")]
pub enum DiveState {
    #[default]
    Idle,
    Diving(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DiveSwitch {
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Debug)]
pub struct DiveController {
    config: DiveConfig,
    state: DiveState,
}

impl DiveController {
    pub fn new(mut config: DiveConfig) -> Self {
        if config.switch_distance > config.trigger_distance {
            warn!(
                switch_distance = config.switch_distance,
                trigger_distance = config.trigger_distance,
                "switch distance exceeds trigger distance; clamping"
            );
            config.switch_distance = config.trigger_distance;
        }

        Self {
            config,
            state: DiveState::Idle,
        }
    }

    pub fn state(&self) -> DiveState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DiveState::Diving(_))
    }

    pub fn target(&self) -> Option<usize> {
        match self.state {
            DiveState::Diving(target) => Some(target),
            DiveState::Idle => None,
        }
    }

    pub fn enter(&mut self, target: usize) {
        debug!(target, previous = ?self.target(), "dive enter");
        self.state = DiveState::Diving(target);
    }

    pub fn exit(&mut self) -> bool {
        let was_active = self.is_active();
        if was_active {
            debug!(target = ?self.target(), "dive exit");
        }
        self.state = DiveState::Idle;
        was_active
    }

    /// Spring pull toward the target. No effect while idle.
    pub fn apply_magnet(
        &self,
        viewpoint: Pos2,
        target: Pos2,
        velocity: &mut Vec2,
        delta_seconds: f32,
    ) {
        if !self.is_active() {
            return;
        }

        let time_step_scale = time_step_scale(delta_seconds, 3.0);
        *velocity += (target - viewpoint) * (self.config.magnet_strength * time_step_scale);
    }

    /// Retargets to the nearest candidate when it differs from the target and sits within
    /// `switch_distance`. `candidates` must be sorted ascending by distance.
    pub fn check_proximity_switch(
        &mut self,
        candidates: &[ProximityCandidate],
    ) -> Option<DiveSwitch> {
        let current = self.target()?;
        let nearest = candidates.first()?;
        if nearest.index == current || nearest.distance > self.config.switch_distance {
            return None;
        }

        self.state = DiveState::Diving(nearest.index);
        debug!(from = current, to = nearest.index, "dive switch");
        Some(DiveSwitch {
            from: current,
            to: nearest.index,
        })
    }

    /// Nearest candidate close enough to start a dive on.
    pub fn trigger_candidate(&self, candidates: &[ProximityCandidate]) -> Option<usize> {
        candidates
            .first()
            .filter(|candidate| candidate.distance <= self.config.trigger_distance)
            .map(|candidate| candidate.index)
    }
}
