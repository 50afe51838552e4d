use std::collections::HashMap;
use std::fs;
use std::path::Path;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::{debug, warn};

use crate::error::{AtlasError, AtlasResult};

use super::model::{Post, PositionedIdea, Topic};
use super::parse::{read_json, write_json};

pub const IDEAS_FILE: &str = "ideas.json";
pub const TOPICS_FILE: &str = "topics.json";
pub const POSTS_FILE: &str = "posts.json";

/// The persisted output of the layout pipeline and the input of the runtime.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub ideas: Vec<PositionedIdea>,
    pub topics: Vec<Topic>,
    pub posts: Vec<Post>,
    index_by_id: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(ideas: Vec<PositionedIdea>, topics: Vec<Topic>, posts: Vec<Post>) -> Self {
        let index_by_id = ideas
            .iter()
            .enumerate()
            .map(|(index, idea)| (idea.id().to_owned(), index))
            .collect::<HashMap<_, _>>();
        if index_by_id.len() != ideas.len() {
            warn!(
                ideas = ideas.len(),
                unique = index_by_id.len(),
                "dataset contains duplicate idea ids"
            );
        }

        Self {
            ideas,
            topics,
            posts,
            index_by_id,
        }
    }

    pub fn load(dir: &Path) -> AtlasResult<Self> {
        let ideas: Vec<PositionedIdea> = read_json(&dir.join(IDEAS_FILE))?;
        let topics: Vec<Topic> = read_json(&dir.join(TOPICS_FILE))?;
        let posts_path = dir.join(POSTS_FILE);
        let posts: Vec<Post> = if posts_path.exists() {
            read_json(&posts_path)?
        } else {
            Vec::new()
        };

        debug!(
            ideas = ideas.len(),
            topics = topics.len(),
            posts = posts.len(),
            dir = %dir.display(),
            "loaded dataset"
        );
        Ok(Self::new(ideas, topics, posts))
    }

    pub fn save(&self, dir: &Path) -> AtlasResult<()> {
        fs::create_dir_all(dir).map_err(|source| AtlasError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        write_json(&dir.join(IDEAS_FILE), &self.ideas)?;
        write_json(&dir.join(TOPICS_FILE), &self.topics)?;
        write_json(&dir.join(POSTS_FILE), &self.posts)
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&PositionedIdea> {
        self.index_of(id).and_then(|index| self.ideas.get(index))
    }

    pub fn post(&self, source_id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == source_id)
    }

    /// Ids referenced by `connections` that do not resolve inside this dataset.
    pub fn dangling_connections(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for idea in &self.ideas {
            for target in [&idea.connections.nearby, &idea.connections.far]
                .into_iter()
                .flatten()
            {
                if !self.index_by_id.contains_key(target) {
                    dangling.push((idea.id().to_owned(), target.clone()));
                }
            }
        }
        dangling
    }

    /// Fuzzy label search, best score first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<usize> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .ideas
            .iter()
            .enumerate()
            .filter_map(|(index, idea)| {
                let text = if idea.idea.label.is_empty() {
                    &idea.idea.quote
                } else {
                    &idea.idea.label
                };
                matcher
                    .fuzzy_match(text, query)
                    .or_else(|| {
                        matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase())
                    })
                    .map(|score| (score, index))
            })
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        scored.truncate(limit);
        scored.into_iter().map(|(_, index)| index).collect()
    }
}
