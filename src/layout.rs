pub mod anchor;
pub mod connections;
pub mod dedup;
pub mod jitter;
pub mod normalize;
pub mod project;

use eframe::egui::Pos2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::atlas::{
    Dataset, EmbeddingMap, Idea, LayoutInput, PositionedIdea, Topic, assemble_ideas,
};
use crate::error::{AtlasError, AtlasResult};
use anchor::{AnchorParams, anchor_topics, to_world};
use connections::link_connections;
use dedup::dedup_ideas;
use jitter::declutter_sources;
use normalize::normalize_points;
use project::Projector;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub dedup_threshold: f64,
    pub contraction: f32,
    /// Minimum centroid gap in unit-square coordinates.
    pub min_topic_gap: f32,
    pub separation_passes: usize,
    pub world_min: f32,
    pub world_max: f32,
    pub jitter_threshold: f32,
    pub jitter_radius: f32,
    pub far_distance: f32,
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: 0.92,
            contraction: 0.82,
            min_topic_gap: 0.12,
            separation_passes: 20,
            world_min: -5000.0,
            world_max: 5000.0,
            jitter_threshold: 20.0,
            jitter_radius: 30.0,
            far_distance: 1500.0,
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub input_ideas: usize,
    pub missing_embeddings: usize,
    pub dropped_duplicates: usize,
    pub placed_ideas: usize,
    pub topics: usize,
    pub separation_passes: usize,
    pub separation_converged: bool,
    pub jittered_pairs: usize,
    pub far_links: usize,
}

#[derive(Clone, Debug)]
pub struct LayoutOutput {
    pub dataset: Dataset,
    pub report: LayoutReport,
}

/// Runs the offline pipeline: dedup, projection, normalization, topic anchoring, jitter and
/// connection linking.
pub fn run_layout<P, R>(
    input: LayoutInput,
    embeddings: &EmbeddingMap,
    projector: &P,
    config: &LayoutConfig,
    rng: &mut R,
) -> AtlasResult<LayoutOutput>
where
    P: Projector + ?Sized,
    R: Rng,
{
    let mut report = LayoutReport {
        input_ideas: input.ideas.len(),
        ..LayoutReport::default()
    };

    let assembled = assemble_ideas(input.ideas, embeddings)?;
    report.missing_embeddings = assembled.missing_embeddings;

    let (ideas, dedup) = dedup_ideas(assembled.ideas, config.dedup_threshold);
    report.dropped_duplicates = dedup.dropped;

    let raw = projector.project(&ideas)?;
    if raw.len() != ideas.len() {
        return Err(AtlasError::ProjectionCount {
            expected: ideas.len(),
            actual: raw.len(),
        });
    }

    let normalized = normalize_points(&raw);
    let topics = ideas.iter().map(|idea| idea.topic.as_str()).collect::<Vec<_>>();
    let anchored = anchor_topics(
        &topics,
        &normalized,
        AnchorParams {
            contraction: config.contraction,
            min_gap: config.min_topic_gap,
            max_passes: config.separation_passes,
        },
    );
    report.topics = anchored.centroids.len();
    report.separation_passes = anchored.separation.passes;
    report.separation_converged = anchored.separation.converged;

    let mut world = anchored
        .points
        .iter()
        .map(|&point| to_world(point, config.world_min, config.world_max))
        .collect::<Vec<_>>();
    let sources = ideas
        .iter()
        .map(|idea| idea.source_id.as_str())
        .collect::<Vec<_>>();
    report.jittered_pairs = declutter_sources(
        &mut world,
        &sources,
        config.jitter_threshold,
        config.jitter_radius,
        rng,
    );

    let mut placed = place(ideas, &world);
    link_connections(&mut placed, config.far_distance);
    report.far_links = placed
        .iter()
        .filter(|idea| idea.connections.far.is_some())
        .count();
    report.placed_ideas = placed.len();

    let topics = Topic::summarize(&placed);
    info!(
        ideas = report.placed_ideas,
        dropped = report.dropped_duplicates,
        topics = report.topics,
        jittered = report.jittered_pairs,
        "layout complete"
    );

    Ok(LayoutOutput {
        dataset: Dataset::new(placed, topics, input.posts),
        report,
    })
}

fn place(ideas: Vec<Idea>, world: &[Pos2]) -> Vec<PositionedIdea> {
    ideas
        .into_iter()
        .zip(world)
        .map(|(idea, &position)| PositionedIdea::new(idea, position))
        .collect()
}
