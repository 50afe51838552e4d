use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

use crate::util::{frame_lerp_factor, lerp_pos};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Per 60 Hz frame.
    pub follow_lerp: f32,
    /// Per 60 Hz frame.
    pub zoom_lerp: f32,
    pub close_distance: f32,
    pub far_distance: f32,
    pub zoom_in_max: f32,
    pub zoom_out_min: f32,
    pub cruise_zoom: f32,
    /// Screen-space speed (world speed times zoom) where cruising starts to blend in.
    pub cruise_speed_start: f32,
    pub cruise_speed_full: f32,
    pub dive_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Screen pixels on the right occluded by a side panel.
    pub sidebar_width: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_lerp: 0.08,
            zoom_lerp: 0.015,
            close_distance: 60.0,
            far_distance: 900.0,
            zoom_in_max: 1.6,
            zoom_out_min: 0.35,
            cruise_zoom: 0.5,
            cruise_speed_start: 4.0,
            cruise_speed_full: 14.0,
            dive_zoom: 2.2,
            min_zoom: 0.1,
            max_zoom: 3.0,
            sidebar_width: 0.0,
        }
    }
}

impl CameraConfig {
    fn clamp_zoom(&self, zoom: f32) -> f32 {
        let low = self.min_zoom.max(f32::EPSILON);
        let high = self.max_zoom.max(low);
        if zoom.is_finite() {
            zoom.clamp(low, high)
        } else {
            low
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraInput {
    pub followed: Pos2,
    /// World units per 60 Hz frame.
    pub velocity: Vec2,
    pub diving: bool,
    /// Nearest non-dimmed candidate, if any.
    pub nearest_distance: Option<f32>,
    pub screen_size: Vec2,
    pub delta_seconds: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub position: Pos2,
    pub zoom: f32,
    pub target_zoom: f32,
    pub viewport: Rect,
}

#[derive(Clone, Debug)]
pub struct Camera {
    position: Pos2,
    zoom: f32,
    target_zoom: f32,
    config: CameraConfig,
}

impl Camera {
    pub fn new(config: CameraConfig, position: Pos2) -> Self {
        let zoom = config.clamp_zoom(config.zoom_out_min);
        Self {
            position,
            zoom,
            target_zoom: zoom,
            config,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    /// Jumps to `position` without smoothing. Initialization and reload only.
    pub fn snap_to(&mut self, position: Pos2) {
        self.position = position;
    }

    pub fn reset_zoom(&mut self) {
        self.target_zoom = self.config.clamp_zoom(self.config.zoom_out_min);
    }

    pub fn target_zoom_for(&self, input: &CameraInput) -> f32 {
        let config = &self.config;
        if input.diving {
            return config.clamp_zoom(config.dive_zoom);
        }

        let proximity_zoom = match input.nearest_distance {
            Some(distance) => {
                let close = config.close_distance;
                let far = config.far_distance.max(close);
                let t = ((distance.clamp(close, far) - close) / (far - close).max(1e-3))
                    .clamp(0.0, 1.0);
                let eased = t * t;
                config.zoom_in_max + ((config.zoom_out_min - config.zoom_in_max) * eased)
            }
            None => config.zoom_out_min,
        };

        let screen_speed = input.velocity.length() * self.zoom;
        let cruise_span = (config.cruise_speed_full - config.cruise_speed_start).max(1e-3);
        let blend = ((screen_speed - config.cruise_speed_start) / cruise_span).clamp(0.0, 1.0);
        let zoom = proximity_zoom + ((config.cruise_zoom - proximity_zoom) * blend);

        config.clamp_zoom(zoom)
    }

    pub fn update(&mut self, input: &CameraInput) -> CameraFrame {
        self.target_zoom = self.target_zoom_for(input);

        let zoom_step = frame_lerp_factor(self.config.zoom_lerp, input.delta_seconds);
        self.zoom = self
            .config
            .clamp_zoom(self.zoom + ((self.target_zoom - self.zoom) * zoom_step));

        let follow_step = frame_lerp_factor(self.config.follow_lerp, input.delta_seconds);
        if input.followed.x.is_finite() && input.followed.y.is_finite() {
            self.position = lerp_pos(self.position, input.followed, follow_step);
        }

        CameraFrame {
            position: self.position,
            zoom: self.zoom,
            target_zoom: self.target_zoom,
            viewport: self.viewport(input.screen_size),
        }
    }

    fn visible_screen(&self, screen_size: Vec2) -> Vec2 {
        vec2(
            (screen_size.x - self.config.sidebar_width).max(1.0),
            screen_size.y.max(1.0),
        )
    }

    /// World-space rectangle visible in the unoccluded part of the screen.
    pub fn viewport(&self, screen_size: Vec2) -> Rect {
        Rect::from_center_size(self.position, self.visible_screen(screen_size) / self.zoom)
    }

    pub fn world_to_screen(&self, screen_size: Vec2, world: Pos2) -> Pos2 {
        let center = self.visible_screen(screen_size) * 0.5;
        pos2(center.x, center.y) + ((world - self.position) * self.zoom)
    }

    pub fn screen_to_world(&self, screen_size: Vec2, screen: Pos2) -> Pos2 {
        let center = self.visible_screen(screen_size) * 0.5;
        self.position + ((screen - pos2(center.x, center.y)) / self.zoom)
    }
}
