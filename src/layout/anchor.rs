use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, pos2};
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct TopicCentroid {
    pub name: String,
    pub position: Pos2,
    pub members: Vec<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeparationOutcome {
    pub passes: usize,
    pub converged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorParams {
    pub contraction: f32,
    pub min_gap: f32,
    pub max_passes: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnchoredLayout {
    pub points: Vec<Pos2>,
    pub centroids: Vec<TopicCentroid>,
    pub separation: SeparationOutcome,
}

/// Mean position per topic, in first-seen topic order.
pub fn topic_centroids(topics: &[&str], points: &[Pos2]) -> Vec<TopicCentroid> {
    let mut slot_by_topic: HashMap<&str, usize> = HashMap::new();
    let mut centroids: Vec<TopicCentroid> = Vec::new();

    for (index, (&topic, _)) in topics.iter().zip(points).enumerate() {
        let slot = *slot_by_topic.entry(topic).or_insert_with(|| {
            centroids.push(TopicCentroid {
                name: topic.to_owned(),
                position: Pos2::ZERO,
                members: Vec::new(),
            });
            centroids.len() - 1
        });
        centroids[slot].members.push(index);
    }

    for centroid in &mut centroids {
        let mut sum = Vec2::ZERO;
        for &member in &centroid.members {
            sum += points[member].to_vec2();
        }
        centroid.position = (sum / centroid.members.len() as f32).to_pos2();
    }

    centroids
}

/// Pulls every member a `contraction` fraction of the way toward its topic centroid.
pub fn contract_toward_centroids(
    points: &mut [Pos2],
    centroids: &[TopicCentroid],
    contraction: f32,
) {
    let keep = 1.0 - contraction.clamp(0.0, 1.0);
    for centroid in centroids {
        for &member in &centroid.members {
            let offset = points[member] - centroid.position;
            points[member] = centroid.position + offset * keep;
        }
    }
}

/// Pushes centroid pairs closer than `min_gap` apart, half the shortfall each.
///
/// Coincident centroids have no direction to push along and are left alone. Stops after a
/// pass with no violations or after `max_passes`.
pub fn separate_centroids(
    centroids: &mut [Pos2],
    min_gap: f32,
    max_passes: usize,
) -> SeparationOutcome {
    let mut outcome = SeparationOutcome::default();
    if centroids.len() < 2 || min_gap <= 0.0 {
        outcome.converged = true;
        return outcome;
    }

    for _ in 0..max_passes {
        outcome.passes += 1;
        let mut moved = false;

        for i in 0..centroids.len() {
            for j in (i + 1)..centroids.len() {
                let delta = centroids[j] - centroids[i];
                let distance = delta.length();
                if distance <= 0.0 || distance >= min_gap {
                    continue;
                }

                let push = delta / distance * ((min_gap - distance) * 0.5);
                centroids[i] -= push;
                centroids[j] += push;
                moved = true;
            }
        }

        if !moved {
            outcome.converged = true;
            break;
        }
    }

    outcome
}

/// Contracts topics into islands, then separates the islands.
///
/// Each point ends at `separated_centroid + contracted_offset`, so a topic moves as a unit
/// when its centroid is pushed away from a neighbour.
pub fn anchor_topics(
    topics: &[&str],
    normalized: &[Pos2],
    params: AnchorParams,
) -> AnchoredLayout {
    let mut points = normalized.to_vec();
    let mut centroids = topic_centroids(topics, &points);
    contract_toward_centroids(&mut points, &centroids, params.contraction);

    let mut separated = centroids
        .iter()
        .map(|centroid| centroid.position)
        .collect::<Vec<_>>();
    let separation = separate_centroids(&mut separated, params.min_gap, params.max_passes);

    for (centroid, &moved_to) in centroids.iter_mut().zip(&separated) {
        let shift = moved_to - centroid.position;
        for &member in &centroid.members {
            points[member] += shift;
        }
        centroid.position = moved_to;
    }

    debug!(
        topics = centroids.len(),
        passes = separation.passes,
        converged = separation.converged,
        "anchored topics"
    );

    AnchoredLayout {
        points,
        centroids,
        separation,
    }
}

/// Maps a unit-square coordinate onto `[world_min, world_max]` on both axes.
pub fn to_world(point: Pos2, world_min: f32, world_max: f32) -> Pos2 {
    let span = world_max - world_min;
    pos2(world_min + point.x * span, world_min + point.y * span)
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::layout::normalize::normalize_points;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn scenario_three_plus_one() {
        let topics = ["A", "A", "A", "B"];
        let normalized = normalize_points(&[[0.0, 0.0], [0.1, 0.1], [0.05, 0.05], [0.9, 0.9]]);
        for point in &normalized {
            assert!((0.0..=1.0).contains(&point.x) && (0.0..=1.0).contains(&point.y));
        }

        let centroids = topic_centroids(&topics, &normalized);
        assert_eq!(centroids.len(), 2);
        let a_center = centroids[0].position;
        assert!(close(a_center, pos2(0.05 / 0.9, 0.05 / 0.9)));

        let mut contracted = normalized.clone();
        contract_toward_centroids(&mut contracted, &centroids, 0.82);
        for index in 0..3 {
            let before = (normalized[index] - a_center).length();
            let after = (contracted[index] - a_center).length();
            assert!(after <= before);
            assert!((after - before * 0.18).abs() < 1e-5);
        }
        assert_eq!(contracted[3], normalized[3]);

        let mut separated = centroids.iter().map(|c| c.position).collect::<Vec<_>>();
        let before = separated.clone();
        let gap = (before[1] - before[0]).length() + 0.5;
        let outcome = separate_centroids(&mut separated, gap, 20);
        assert!(outcome.converged);
        let shift_a = separated[0] - before[0];
        let shift_b = separated[1] - before[1];
        assert!((shift_a + shift_b).length() < 1e-5);
        assert!((shift_a.length() - 0.25).abs() < 1e-4);
        assert!(((separated[1] - separated[0]).length() - gap).abs() < 1e-4);
    }

    #[test]
    fn separation_leaves_distant_and_coincident_centroids() {
        let mut far_apart = vec![pos2(0.0, 0.0), pos2(1.0, 0.0)];
        let outcome = separate_centroids(&mut far_apart, 0.2, 20);
        assert_eq!(outcome, SeparationOutcome { passes: 1, converged: true });
        assert_eq!(far_apart, vec![pos2(0.0, 0.0), pos2(1.0, 0.0)]);

        let mut stacked = vec![pos2(0.5, 0.5), pos2(0.5, 0.5)];
        separate_centroids(&mut stacked, 0.2, 20);
        assert_eq!(stacked, vec![pos2(0.5, 0.5), pos2(0.5, 0.5)]);
    }

    #[test]
    fn separation_is_best_effort_within_budget() {
        let mut crowded = vec![pos2(0.5, 0.5), pos2(0.6, 0.5), pos2(0.7, 0.5)];
        let outcome = separate_centroids(&mut crowded, 0.5, 1);
        assert_eq!(outcome, SeparationOutcome { passes: 1, converged: false });
        assert!(crowded.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert!(crowded[0].x < 0.5);
    }

    #[test]
    fn anchored_points_follow_their_centroid() {
        let topics = ["A", "A", "B", "B"];
        let normalized = vec![pos2(0.4, 0.5), pos2(0.5, 0.5), pos2(0.55, 0.5), pos2(0.65, 0.5)];
        let layout = anchor_topics(
            &topics,
            &normalized,
            AnchorParams {
                contraction: 0.5,
                min_gap: 0.4,
                max_passes: 20,
            },
        );

        let a = &layout.centroids[0];
        let b = &layout.centroids[1];
        assert!(((b.position - a.position).length() - 0.4).abs() < 1e-4);
        assert!(close(layout.points[0], a.position + vec2(-0.025, 0.0)));
        assert!(close(layout.points[3], b.position + vec2(0.025, 0.0)));
    }

    #[test]
    fn world_mapping_spans_extent() {
        assert_eq!(to_world(pos2(0.0, 1.0), -5000.0, 5000.0), pos2(-5000.0, 5000.0));
        assert_eq!(to_world(pos2(0.5, 0.25), -5000.0, 5000.0), pos2(0.0, -2500.0));
    }
}
