use std::collections::HashMap;

use tracing::debug;

use crate::atlas::Idea;
use crate::util::cosine_similarity;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub kept: usize,
    pub dropped: usize,
    pub dropped_ids: Vec<String>,
}

/// Collapses near-duplicate ideas inside each topic.
///
/// Of two ideas whose embeddings are more similar than `threshold`, the one with the shorter
/// quote is dropped (the later one on equal length). Dropped ideas take no further part in
/// comparisons. Survivors keep their input order.
pub fn dedup_ideas(ideas: Vec<Idea>, threshold: f64) -> (Vec<Idea>, DedupReport) {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut group_order = Vec::new();
    for (index, idea) in ideas.iter().enumerate() {
        groups
            .entry(idea.topic.as_str())
            .or_insert_with(|| {
                group_order.push(idea.topic.as_str());
                Vec::new()
            })
            .push(index);
    }

    let mut dropped = vec![false; ideas.len()];
    for topic in group_order {
        let Some(members) = groups.get(topic) else {
            continue;
        };

        for (position, &first) in members.iter().enumerate() {
            if dropped[first] {
                continue;
            }

            for &second in &members[(position + 1)..] {
                if dropped[second] {
                    continue;
                }

                let similarity =
                    cosine_similarity(&ideas[first].embedding, &ideas[second].embedding);
                if similarity <= threshold {
                    continue;
                }

                if ideas[first].quote_len() < ideas[second].quote_len() {
                    dropped[first] = true;
                    break;
                }
                dropped[second] = true;
            }
        }
    }

    let mut report = DedupReport::default();
    let kept = ideas
        .into_iter()
        .zip(dropped)
        .filter_map(|(idea, is_dropped)| {
            if is_dropped {
                report.dropped_ids.push(idea.id);
                None
            } else {
                Some(idea)
            }
        })
        .collect::<Vec<_>>();
    report.kept = kept.len();
    report.dropped = report.dropped_ids.len();

    debug!(kept = report.kept, dropped = report.dropped, "deduplicated ideas");
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea(id: &str, topic: &str, quote_len: usize, embedding: Vec<f32>) -> Idea {
        Idea {
            id: id.to_owned(),
            source_id: format!("src-{id}"),
            topic: topic.to_owned(),
            kind: None,
            label: id.to_owned(),
            synthesis: None,
            quote: "q".repeat(quote_len),
            embedding,
        }
    }

    fn ids(ideas: &[Idea]) -> Vec<&str> {
        ideas.iter().map(|idea| idea.id.as_str()).collect()
    }

    #[test]
    fn shorter_quote_is_dropped_above_threshold() {
        // cos([1, 0], [0.95, sqrt(1 - 0.95^2)]) == 0.95
        let second = vec![0.95, (1.0_f32 - 0.95 * 0.95).sqrt()];
        let ideas = vec![
            idea("short", "grief", 40, vec![1.0, 0.0]),
            idea("long", "grief", 60, second),
        ];

        let (kept, report) = dedup_ideas(ideas, 0.92);
        assert_eq!(ids(&kept), ["long"]);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.dropped_ids, ["short"]);
    }

    #[test]
    fn equal_quotes_drop_the_second_seen() {
        let ideas = vec![
            idea("first", "grief", 10, vec![1.0, 0.0]),
            idea("second", "grief", 10, vec![1.0, 0.0]),
        ];

        let (kept, _) = dedup_ideas(ideas, 0.92);
        assert_eq!(ids(&kept), ["first"]);
    }

    #[test]
    fn duplicates_across_topics_survive() {
        let ideas = vec![
            idea("a", "grief", 10, vec![1.0, 0.0]),
            idea("b", "joy", 5, vec![1.0, 0.0]),
        ];

        let (kept, report) = dedup_ideas(ideas, 0.92);
        assert_eq!(ids(&kept), ["a", "b"]);
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn dropped_idea_is_not_compared_again() {
        // "a" matches both others, but it loses to "b" first and must not then knock out "c".
        let ideas = vec![
            idea("a", "t", 5, vec![1.0, 1.0]),
            idea("b", "t", 50, vec![1.0, 0.9]),
            idea("c", "t", 3, vec![0.9, 1.0]),
        ];

        let (kept, report) = dedup_ideas(ideas, 0.995);
        assert_eq!(ids(&kept), ["b", "c"]);
        assert_eq!(report.dropped_ids, ["a"]);
    }

    #[test]
    fn second_pass_drops_nothing() {
        let ideas = vec![
            idea("a", "t", 12, vec![1.0, 0.0, 0.0]),
            idea("b", "t", 30, vec![0.99, 0.05, 0.0]),
            idea("c", "t", 8, vec![0.0, 1.0, 0.0]),
            idea("d", "t", 9, vec![0.0, 0.98, 0.1]),
            idea("e", "u", 9, vec![0.0, 0.0, 1.0]),
        ];

        let (once, first_report) = dedup_ideas(ideas, 0.92);
        assert_eq!(first_report.dropped, 2);
        let (twice, second_report) = dedup_ideas(once.clone(), 0.92);
        assert_eq!(second_report.dropped, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let (kept, report) = dedup_ideas(Vec::new(), 0.92);
        assert!(kept.is_empty());
        assert_eq!(report, DedupReport::default());
    }
}
