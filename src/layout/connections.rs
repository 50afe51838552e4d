use tracing::debug;

use crate::atlas::PositionedIdea;
use crate::util::cosine_similarity;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionIndices {
    pub nearby: Option<usize>,
    pub far: Option<usize>,
}

/// Nearest neighbour from another source, plus the most similar idea from another source
/// lying farther away than `far_distance`.
///
/// When every other idea shares the source, `nearby` falls back to the nearest of them.
pub fn find_connections(ideas: &[PositionedIdea], far_distance: f32) -> Vec<ConnectionIndices> {
    let far_distance_sq = far_distance * far_distance;
    let mut connections = Vec::with_capacity(ideas.len());

    for (i, idea) in ideas.iter().enumerate() {
        let position = idea.position();
        let mut nearest_other_source: Option<(usize, f32)> = None;
        let mut nearest_any: Option<(usize, f32)> = None;
        let mut best_far: Option<(usize, f64)> = None;

        for (j, other) in ideas.iter().enumerate() {
            if i == j {
                continue;
            }

            let distance_sq = position.distance_sq(other.position());
            if nearest_any.is_none_or(|(_, best)| distance_sq < best) {
                nearest_any = Some((j, distance_sq));
            }

            if other.idea.source_id == idea.idea.source_id {
                continue;
            }

            if nearest_other_source.is_none_or(|(_, best)| distance_sq < best) {
                nearest_other_source = Some((j, distance_sq));
            }

            if distance_sq > far_distance_sq {
                let similarity = cosine_similarity(&idea.idea.embedding, &other.idea.embedding);
                if best_far.is_none_or(|(_, best)| similarity > best) {
                    best_far = Some((j, similarity));
                }
            }
        }

        connections.push(ConnectionIndices {
            nearby: nearest_other_source.or(nearest_any).map(|(index, _)| index),
            far: best_far.map(|(index, _)| index),
        });
    }

    connections
}

/// Resolves connections to ids and stores them on each idea.
pub fn link_connections(ideas: &mut [PositionedIdea], far_distance: f32) {
    let found = find_connections(ideas, far_distance);
    let ids = ideas
        .iter()
        .map(|idea| idea.id().to_owned())
        .collect::<Vec<_>>();

    let mut far_links = 0usize;
    for (idea, indices) in ideas.iter_mut().zip(found) {
        idea.connections.nearby = indices.nearby.map(|index| ids[index].clone());
        idea.connections.far = indices.far.map(|index| ids[index].clone());
        far_links += usize::from(indices.far.is_some());
    }

    debug!(ideas = ideas.len(), far_links, "linked connections");
}
