use std::collections::HashMap;

use eframe::egui::{Pos2, vec2};
use rand::Rng;

/// Nudges same-source points that sit closer than `threshold` by a uniform offset in
/// `[-radius, radius]²`. One pass; pairs still close afterwards are left as they are.
///
/// Returns the number of pairs that were jittered.
pub fn declutter_sources<R: Rng>(
    points: &mut [Pos2],
    sources: &[&str],
    threshold: f32,
    radius: f32,
    rng: &mut R,
) -> usize {
    let radius = radius.max(0.0);
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut group_order = Vec::new();
    for (index, &source) in sources.iter().enumerate().take(points.len()) {
        groups
            .entry(source)
            .or_insert_with(|| {
                group_order.push(source);
                Vec::new()
            })
            .push(index);
    }

    let mut jittered = 0usize;
    for source in group_order {
        let Some(members) = groups.get(source) else {
            continue;
        };

        for (position, &first) in members.iter().enumerate() {
            for &second in &members[(position + 1)..] {
                if points[first].distance(points[second]) >= threshold {
                    continue;
                }

                points[first] += vec2(
                    rng.random_range(-radius..=radius),
                    rng.random_range(-radius..=radius),
                );
                points[second] += vec2(
                    rng.random_range(-radius..=radius),
                    rng.random_range(-radius..=radius),
                );
                jittered += 1;
            }
        }
    }

    jittered
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn separated_points_are_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let original = vec![pos2(0.0, 0.0), pos2(100.0, 0.0), pos2(0.0, 5.0)];
        let mut points = original.clone();

        let jittered = declutter_sources(&mut points, &["a", "a", "b"], 20.0, 30.0, &mut rng);
        assert_eq!(jittered, 0);
        assert_eq!(points, original);
    }

    #[test]
    fn close_pair_from_same_source_moves_within_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let original = vec![pos2(10.0, 10.0), pos2(12.0, 11.0), pos2(500.0, 500.0)];
        let mut points = original.clone();

        let jittered = declutter_sources(&mut points, &["a", "a", "a"], 20.0, 30.0, &mut rng);
        assert_eq!(jittered, 1);
        for index in 0..2 {
            let offset = points[index] - original[index];
            assert!(offset.x.abs() <= 30.0 && offset.y.abs() <= 30.0);
        }
        assert_eq!(points[2], original[2]);
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let start = vec![pos2(0.0, 0.0), pos2(1.0, 1.0), pos2(2.0, 0.5)];
        let sources = ["a", "a", "a"];

        let mut first = start.clone();
        declutter_sources(&mut first, &sources, 20.0, 30.0, &mut ChaCha8Rng::seed_from_u64(11));
        let mut second = start.clone();
        declutter_sources(&mut second, &sources, 20.0, 30.0, &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(first, second);
    }
}
