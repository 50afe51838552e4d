use std::collections::HashMap;

use crate::atlas::Idea;
use crate::error::{AtlasError, AtlasResult};

const POWER_ITERATIONS: usize = 96;

/// Maps embeddings to a raw 2D scatter with no guaranteed scale or origin.
///
/// Must return exactly one point per idea, in input order.
pub trait Projector {
    fn project(&self, ideas: &[Idea]) -> AtlasResult<Vec<[f32; 2]>>;
}

/// Positions computed ahead of time by an external reducer, keyed by idea id.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedProjection {
    positions: HashMap<String, [f32; 2]>,
}

impl PrecomputedProjection {
    pub fn new(positions: HashMap<String, [f32; 2]>) -> Self {
        Self { positions }
    }
}

impl Projector for PrecomputedProjection {
    fn project(&self, ideas: &[Idea]) -> AtlasResult<Vec<[f32; 2]>> {
        ideas
            .iter()
            .map(|idea| {
                self.positions
                    .get(&idea.id)
                    .copied()
                    .ok_or_else(|| AtlasError::MissingProjection {
                        id: idea.id.clone(),
                    })
            })
            .collect()
    }
}

/// Projects onto the two leading principal axes of the embeddings.
///
/// Deterministic power iteration over the centered data; a stand-in when no external
/// reducer output is supplied.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrincipalAxes;

impl Projector for PrincipalAxes {
    fn project(&self, ideas: &[Idea]) -> AtlasResult<Vec<[f32; 2]>> {
        let dimensions = ideas.first().map_or(0, |idea| idea.embedding.len());
        if ideas.is_empty() || dimensions == 0 {
            return Ok(vec![[0.0, 0.0]; ideas.len()]);
        }

        let mut mean = vec![0.0_f64; dimensions];
        for idea in ideas {
            for (slot, &value) in mean.iter_mut().zip(&idea.embedding) {
                *slot += f64::from(value);
            }
        }
        for slot in &mut mean {
            *slot /= ideas.len() as f64;
        }

        let centered = ideas
            .iter()
            .map(|idea| {
                (0..dimensions)
                    .map(|axis| {
                        f64::from(idea.embedding.get(axis).copied().unwrap_or(0.0)) - mean[axis]
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let first = leading_axis(&centered, dimensions, &[]);
        let second = leading_axis(&centered, dimensions, &[first.clone()]);

        Ok(centered
            .iter()
            .map(|row| [dot(row, &first) as f32, dot(row, &second) as f32])
            .collect())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn orthonormalize(vector: &mut [f64], against: &[Vec<f64>]) -> f64 {
    for axis in against {
        let projection = dot(vector, axis);
        for (value, basis) in vector.iter_mut().zip(axis) {
            *value -= projection * basis;
        }
    }

    let norm = dot(vector, vector).sqrt();
    if norm > 1e-12 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    norm
}

fn leading_axis(rows: &[Vec<f64>], dimensions: usize, against: &[Vec<f64>]) -> Vec<f64> {
    let mut axis = (0..dimensions)
        .map(|index| 1.0 / (index as f64 + 1.0) + if index % 2 == 0 { 0.0 } else { 0.25 })
        .collect::<Vec<_>>();
    if orthonormalize(&mut axis, against) <= 1e-12 {
        return vec![0.0; dimensions];
    }

    for _ in 0..POWER_ITERATIONS {
        let mut next = vec![0.0_f64; dimensions];
        for row in rows {
            let weight = dot(row, &axis);
            for (slot, &value) in next.iter_mut().zip(row) {
                *slot += weight * value;
            }
        }

        if orthonormalize(&mut next, against) <= 1e-12 {
            break;
        }
        axis = next;
    }

    axis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea(id: &str, embedding: Vec<f32>) -> Idea {
        Idea {
            id: id.to_owned(),
            source_id: "p".to_owned(),
            topic: "t".to_owned(),
            kind: None,
            label: String::new(),
            synthesis: None,
            quote: String::new(),
            embedding,
        }
    }

    #[test]
    fn precomputed_requires_every_id() {
        let mut positions = HashMap::new();
        positions.insert("a".to_owned(), [1.0, 2.0]);
        let projector = PrecomputedProjection::new(positions);

        let ideas = vec![idea("a", Vec::new())];
        assert_eq!(projector.project(&ideas).expect("projects"), vec![[1.0, 2.0]]);

        let ideas = vec![idea("a", Vec::new()), idea("b", Vec::new())];
        assert!(matches!(
            projector.project(&ideas),
            Err(AtlasError::MissingProjection { id }) if id == "b"
        ));
    }

    #[test]
    fn principal_axes_separates_along_dominant_direction() {
        let ideas = vec![
            idea("a", vec![-10.0, 0.1, 0.0]),
            idea("b", vec![-9.0, -0.1, 0.0]),
            idea("c", vec![9.0, 0.1, 0.0]),
            idea("d", vec![10.0, -0.1, 0.0]),
        ];

        let projected = PrincipalAxes.project(&ideas).expect("projects");
        assert_eq!(projected.len(), 4);
        let spread_x = (projected[3][0] - projected[0][0]).abs();
        let spread_y = (projected[3][1] - projected[0][1]).abs();
        assert!(spread_x > 15.0);
        assert!(spread_y < 1.0);
        assert_eq!(projected, PrincipalAxes.project(&ideas).expect("projects"));
    }

    #[test]
    fn principal_axes_handles_degenerate_input() {
        assert!(PrincipalAxes.project(&[]).expect("projects").is_empty());
        let zeros = vec![idea("a", vec![0.0; 4]), idea("b", vec![0.0; 4])];
        assert_eq!(PrincipalAxes.project(&zeros).expect("projects"), vec![[0.0, 0.0]; 2]);
    }
}
