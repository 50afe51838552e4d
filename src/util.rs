use eframe::egui::{Pos2, Vec2};

pub const COSINE_EPSILON: f64 = 1e-10;

/// Cosine similarity with an epsilon in the denominator so zero vectors compare as 0.
///
/// Accumulates in `f64`; the result stays within `[-1 - ε, 1 + ε]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot / ((norm_a.sqrt() * norm_b.sqrt()) + COSINE_EPSILON)
}

pub fn round2(value: f32) -> f32 {
    ((f64::from(value) * 100.0).round() / 100.0) as f32
}

pub fn short_label(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head = chars.by_ref().take(max_chars).collect::<String>();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Elapsed time in 60 Hz frames, clamped to `[0, max_steps]`. Non-finite input counts as 0.
pub fn time_step_scale(delta_seconds: f32, max_steps: f32) -> f32 {
    let steps = delta_seconds * 60.0;
    if steps.is_finite() {
        steps.clamp(0.0, max_steps)
    } else {
        0.0
    }
}

/// Frame-rate independent smoothing factor for a per-60Hz-frame lerp `factor`.
pub fn frame_lerp_factor(factor: f32, delta_seconds: f32) -> f32 {
    let steps = time_step_scale(delta_seconds, 8.0);
    1.0 - (1.0 - factor.clamp(0.0, 1.0)).powf(steps)
}

pub fn lerp_pos(from: Pos2, to: Pos2, t: f32) -> Pos2 {
    from + (to - from) * t
}

pub fn unit_or(delta: Vec2, fallback: Vec2) -> Vec2 {
    let length = delta.length();
    if length > 0.0001 {
        delta / length
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_of_parallel_vectors_is_near_one() {
        let similarity = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((similarity - 1.0).abs() < 1e-9);
        assert!(similarity <= 1.0 + COSINE_EPSILON);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-4.006), -4.01);
    }

    #[test]
    fn short_label_appends_ellipsis_only_when_truncated() {
        assert_eq!(short_label("drift", 10), "drift");
        assert_eq!(short_label("continental drift", 5), "conti…");
    }

    #[test]
    fn frame_lerp_matches_factor_at_sixty_hz() {
        let t = frame_lerp_factor(0.08, 1.0 / 60.0);
        assert!((t - 0.08).abs() < 1e-5);
    }

    #[test]
    fn non_finite_delta_is_no_time() {
        assert_eq!(time_step_scale(f32::NAN, 3.0), 0.0);
        assert_eq!(time_step_scale(f32::INFINITY, 3.0), 0.0);
        assert_eq!(time_step_scale(-1.0, 3.0), 0.0);
        assert_eq!(frame_lerp_factor(0.08, f32::NAN), 0.0);
    }
}
