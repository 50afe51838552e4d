use std::collections::HashMap;

use eframe::egui::{Pos2, pos2};
use serde::{Deserialize, Serialize, Serializer};

use crate::util::round2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaKind {
    Question,
    Tension,
    Image,
    Turn,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub source_id: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IdeaKind>,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<String>,
    #[serde(default)]
    pub quote: String,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

impl Idea {
    pub fn quote_len(&self) -> usize {
        self.quote.chars().count()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    #[serde(default)]
    pub nearby: Option<String>,
    #[serde(default)]
    pub far: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionedIdea {
    #[serde(flatten)]
    pub idea: Idea,
    #[serde(serialize_with = "serialize_rounded")]
    pub x: f32,
    #[serde(serialize_with = "serialize_rounded")]
    pub y: f32,
    #[serde(default)]
    pub connections: Connections,
}

impl PositionedIdea {
    pub fn new(idea: Idea, position: Pos2) -> Self {
        Self {
            idea,
            x: position.x,
            y: position.y,
            connections: Connections::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.idea.id
    }

    pub fn position(&self) -> Pos2 {
        pos2(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(serialize_with = "serialize_rounded")]
    pub x: f32,
    #[serde(serialize_with = "serialize_rounded")]
    pub y: f32,
    pub count: usize,
}

impl Topic {
    /// One topic per distinct name, centroid taken over final positions, in first-seen order.
    pub fn summarize(ideas: &[PositionedIdea]) -> Vec<Topic> {
        let mut order = Vec::new();
        let mut sums: HashMap<&str, (f64, f64, usize)> = HashMap::new();
        for idea in ideas {
            let entry = sums.entry(idea.idea.topic.as_str()).or_insert_with(|| {
                order.push(idea.idea.topic.as_str());
                (0.0, 0.0, 0)
            });
            entry.0 += f64::from(idea.x);
            entry.1 += f64::from(idea.y);
            entry.2 += 1;
        }

        order
            .into_iter()
            .filter_map(|name| {
                let &(sum_x, sum_y, count) = sums.get(name)?;
                Some(Topic {
                    name: name.to_owned(),
                    x: (sum_x / count as f64) as f32,
                    y: (sum_y / count as f64) as f32,
                    count,
                })
            })
            .collect()
    }

    pub fn position(&self) -> Pos2 {
        pos2(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

fn serialize_rounded<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((f64::from(round2(*value)) * 100.0).round() / 100.0)
}
