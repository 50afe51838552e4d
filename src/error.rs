use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("projector returned {actual} points for {expected} vectors")]
    ProjectionCount { expected: usize, actual: usize },

    #[error("idea id {id} appears more than once")]
    DuplicateId { id: String },

    #[error("no projected position for idea {id}")]
    MissingProjection { id: String },

    #[error("embedding for {id} has {actual} dimensions, expected {expected}")]
    EmbeddingDimension {
        id: String,
        expected: usize,
        actual: usize,
    },
}

pub type AtlasResult<T> = Result<T, AtlasError>;
