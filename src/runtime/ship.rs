use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::util::time_step_scale;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Velocity gained per 60 Hz frame at full thrust.
    pub thrust: f32,
    /// Velocity kept per 60 Hz frame.
    pub damping: f32,
    pub max_speed: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            thrust: 0.9,
            damping: 0.92,
            max_speed: 22.0,
        }
    }
}

/// The user-controlled viewpoint. Velocity is in world units per 60 Hz frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ship {
    pub position: Pos2,
    pub velocity: Vec2,
}

impl Ship {
    pub fn at(position: Pos2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// `input` is a steering direction; lengths above 1 are normalized.
    pub fn step(&mut self, input: Vec2, config: &ShipConfig, delta_seconds: f32) {
        let time_step_scale = time_step_scale(delta_seconds, 3.0);
        let input = if input.length_sq() > 1.0 {
            input.normalized()
        } else {
            input
        };

        let damping_factor = config.damping.clamp(0.0, 1.0).powf(time_step_scale);
        let mut velocity =
            (self.velocity + (input * (config.thrust * time_step_scale))) * damping_factor;

        let max_speed = config.max_speed.max(0.0);
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed * max_speed {
            velocity *= max_speed / speed_sq.sqrt();
        }
        if !velocity.x.is_finite() || !velocity.y.is_finite() {
            velocity = Vec2::ZERO;
        }

        self.velocity = velocity;
        self.position += velocity * time_step_scale;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}
