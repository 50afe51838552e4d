use eframe::egui::{Pos2, pos2};

/// Affine rescale of raw projector output into the unit square.
///
/// An axis with zero range uses a range of 1, which collapses it to 0.
pub fn normalize_points(raw: &[[f32; 2]]) -> Vec<Pos2> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];
    for point in raw {
        for axis in 0..2 {
            min[axis] = min[axis].min(point[axis]);
            max[axis] = max[axis].max(point[axis]);
        }
    }

    let range = [0, 1].map(|axis| {
        let span = max[axis] - min[axis];
        if span > 0.0 && span.is_finite() { span } else { 1.0 }
    });

    raw.iter()
        .map(|point| {
            pos2(
                (point[0] - min[0]) / range[0],
                (point[1] - min[1]) / range[1],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_extremes_onto_unit_square() {
        let normalized = normalize_points(&[[-10.0, 4.0], [30.0, 8.0], [10.0, 6.0]]);
        assert_eq!(normalized, vec![pos2(0.0, 0.0), pos2(1.0, 1.0), pos2(0.5, 0.5)]);
    }

    #[test]
    fn zero_range_axis_collapses_to_zero() {
        let normalized = normalize_points(&[[3.0, 7.0], [5.0, 7.0]]);
        assert_eq!(normalized, vec![pos2(0.0, 0.0), pos2(1.0, 0.0)]);
    }

    #[test]
    fn single_point_and_empty_input() {
        assert_eq!(normalize_points(&[[42.0, -1.0]]), vec![pos2(0.0, 0.0)]);
        assert!(normalize_points(&[]).is_empty());
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let raw = [[0.3, -2.0], [1.7, 5.5], [0.9, 0.25], [-4.0, 1.0]];
        let once = normalize_points(&raw);
        let again = normalize_points(&once.iter().map(|p| [p.x, p.y]).collect::<Vec<_>>());
        assert_eq!(once, again);
        assert_eq!(once, normalize_points(&raw));
    }
}
