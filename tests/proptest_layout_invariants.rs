//! Property-based tests for the offline layout pipeline.
//!
//! 1. **Cosine bounds**: similarity stays within `[-1 - ε, 1 + ε]`, zero vectors score 0.
//!
//! 2. **Normalizer**: output lies in the unit square and is a pure function of its input.
//!
//! 3. **Dedup idempotence**: running dedup on its own output drops nothing.
//!
//! 4. **Connection resolution**: every linked id exists in the dataset and is never the
//!    idea itself.

use eframe::egui::pos2;
use idea_atlas::atlas::{Idea, PositionedIdea};
use idea_atlas::layout::connections::link_connections;
use idea_atlas::layout::dedup::dedup_ideas;
use idea_atlas::layout::normalize::normalize_points;
use idea_atlas::util::{COSINE_EPSILON, cosine_similarity};
use proptest::prelude::*;

fn idea(ordinal: usize, topic: usize, source: usize, quote_len: usize, embedding: Vec<f32>) -> Idea {
    Idea {
        id: format!("idea-{ordinal}"),
        source_id: format!("post-{source}"),
        topic: format!("topic-{topic}"),
        kind: None,
        label: format!("idea {ordinal}"),
        synthesis: None,
        quote: "q".repeat(quote_len),
        embedding,
    }
}

fn ideas(dimensions: usize) -> impl Strategy<Value = Vec<Idea>> {
    prop::collection::vec(
        (
            0usize..3,
            0usize..4,
            0usize..60,
            prop::collection::vec(-1.0f32..1.0, dimensions),
        ),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(ordinal, (topic, source, quote_len, embedding))| {
                idea(ordinal, topic, source, quote_len, embedding)
            })
            .collect()
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Cosine similarity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn cosine_stays_bounded(
        pairs in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 0..64),
    ) {
        let (a, b): (Vec<f32>, Vec<f32>) = pairs.into_iter().unzip();
        let similarity = cosine_similarity(&a, &b);
        prop_assert!(similarity.abs() <= 1.0 + COSINE_EPSILON, "similarity {}", similarity);

        let zeros = vec![0.0; a.len()];
        prop_assert_eq!(cosine_similarity(&a, &zeros), 0.0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Normalizer
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn normalized_points_fill_unit_square(
        raw in prop::collection::vec((-1.0e4f32..1.0e4, -1.0e4f32..1.0e4), 0..80),
    ) {
        let raw = raw.into_iter().map(|(x, y)| [x, y]).collect::<Vec<_>>();
        let normalized = normalize_points(&raw);

        prop_assert_eq!(normalized.len(), raw.len());
        for point in &normalized {
            prop_assert!((0.0..=1.0).contains(&point.x) && (0.0..=1.0).contains(&point.y));
        }
        prop_assert_eq!(normalized, normalize_points(&raw));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Dedup idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn dedup_is_idempotent(ideas in ideas(3), threshold in 0.5f64..0.99) {
        let (once, report) = dedup_ideas(ideas.clone(), threshold);
        prop_assert_eq!(report.kept + report.dropped, ideas.len());
        prop_assert_eq!(once.len(), report.kept);

        let (twice, again) = dedup_ideas(once.clone(), threshold);
        prop_assert_eq!(again.dropped, 0);
        prop_assert_eq!(twice, once);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Connection resolution
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn connections_resolve_inside_dataset(
        ideas in ideas(4),
        positions in prop::collection::vec((-5000.0f32..5000.0, -5000.0f32..5000.0), 40),
        far_distance in 100.0f32..3000.0,
    ) {
        let mut placed = ideas
            .into_iter()
            .zip(positions)
            .map(|(idea, (x, y))| PositionedIdea::new(idea, pos2(x, y)))
            .collect::<Vec<_>>();
        link_connections(&mut placed, far_distance);

        let ids = placed.iter().map(|idea| idea.id().to_owned()).collect::<Vec<_>>();
        for idea in &placed {
            prop_assert_eq!(idea.connections.nearby.is_some(), placed.len() > 1);
            for target in [&idea.connections.nearby, &idea.connections.far].into_iter().flatten() {
                prop_assert!(ids.contains(target));
                prop_assert_ne!(target.as_str(), idea.id());
            }
        }
    }
}
