mod dataset;
mod model;
mod parse;

pub use dataset::{Dataset, IDEAS_FILE, POSTS_FILE, TOPICS_FILE};
pub use model::{Connections, Idea, IdeaKind, PositionedIdea, Post, Topic};
pub use parse::{
    AssembledIdeas, EmbeddingMap, IdeaRecord, LayoutInput, assemble_ideas, read_json, write_json,
};
