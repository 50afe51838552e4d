use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AtlasError, AtlasResult};

use super::model::{Idea, IdeaKind, Post};

/// Output of the extraction stage: source documents plus the ideas pulled from them.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LayoutInput {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub ideas: Vec<IdeaRecord>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub source_id: String,
    pub topic: String,
    #[serde(default)]
    pub kind: Option<IdeaKind>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub synthesis: Option<String>,
    #[serde(default)]
    pub quote: String,
}

pub type EmbeddingMap = HashMap<String, Vec<f32>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledIdeas {
    pub ideas: Vec<Idea>,
    pub missing_embeddings: usize,
    pub dimensions: usize,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> AtlasResult<T> {
    let raw = fs::read_to_string(path).map_err(|source| AtlasError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| AtlasError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> AtlasResult<()> {
    let raw = serde_json::to_string_pretty(value).map_err(|source| AtlasError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, raw).map_err(|source| AtlasError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Attaches embeddings to extracted records and fills in ids for records without one.
///
/// Derived ids take the form `{source_id}-{ordinal}`, counting records per source in input
/// order and skipping ordinals whose id is already taken. Explicit ids must be unique. A record
/// with no embedding gets a zero vector of the dataset's dimensionality.
pub fn assemble_ideas(
    records: Vec<IdeaRecord>,
    embeddings: &EmbeddingMap,
) -> AtlasResult<AssembledIdeas> {
    let mut issued: HashSet<String> = HashSet::new();
    for id in records.iter().filter_map(explicit_id) {
        if !issued.insert(id.to_owned()) {
            return Err(AtlasError::DuplicateId { id: id.to_owned() });
        }
    }

    let mut ordinals: HashMap<String, usize> = HashMap::new();
    let mut ideas = Vec::with_capacity(records.len());

    for record in records {
        let ordinal = ordinals.entry(record.source_id.clone()).or_insert(0);
        let id = match explicit_id(&record) {
            Some(id) => {
                *ordinal += 1;
                id.to_owned()
            }
            None => loop {
                let candidate = format!("{}-{}", record.source_id, ordinal);
                *ordinal += 1;
                if issued.insert(candidate.clone()) {
                    break candidate;
                }
            },
        };

        ideas.push(Idea {
            id,
            source_id: record.source_id,
            topic: record.topic,
            kind: record.kind,
            label: record.label,
            synthesis: record.synthesis,
            quote: record.quote,
            embedding: Vec::new(),
        });
    }

    let dimensions = ideas
        .iter()
        .find_map(|idea| embeddings.get(&idea.id))
        .map(Vec::len)
        .unwrap_or(0);

    let mut missing_embeddings = 0usize;
    for idea in &mut ideas {
        match embeddings.get(&idea.id) {
            Some(vector) if vector.len() == dimensions => idea.embedding = vector.clone(),
            Some(vector) => {
                return Err(AtlasError::EmbeddingDimension {
                    id: idea.id.clone(),
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            None => {
                warn!(id = %idea.id, "missing embedding; substituting zero vector");
                idea.embedding = vec![0.0; dimensions];
                missing_embeddings += 1;
            }
        }
    }

    Ok(AssembledIdeas {
        ideas,
        missing_embeddings,
        dimensions,
    })
}

fn explicit_id(record: &IdeaRecord) -> Option<&str> {
    record.id.as_deref().filter(|id| !id.trim().is_empty())
}
