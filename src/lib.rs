pub mod atlas;
pub mod config;
pub mod error;
pub mod layout;
pub mod runtime;
pub mod util;

pub use config::AtlasConfig;
pub use error::{AtlasError, AtlasResult};
