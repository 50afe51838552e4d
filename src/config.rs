use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::atlas::read_json;
use crate::error::AtlasResult;
use crate::layout::LayoutConfig;
use crate::runtime::IndexConfig;
use crate::runtime::camera::CameraConfig;
use crate::runtime::dive::DiveConfig;
use crate::runtime::proximity::ProximityConfig;
use crate::runtime::ship::ShipConfig;

/// Every tunable of the layout pipeline and the navigation runtime.
///
/// Sections and fields missing from a config file keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub layout: LayoutConfig,
    pub index: IndexConfig,
    pub proximity: ProximityConfig,
    pub dive: DiveConfig,
    pub camera: CameraConfig,
    pub ship: ShipConfig,
}

impl AtlasConfig {
    pub fn load(path: &Path) -> AtlasResult<Self> {
        let config = read_json(path)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> AtlasResult<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_keep_defaults() {
        let config: AtlasConfig = serde_json::from_str(
            r#"{ "layout": { "seed": 7 }, "camera": { "sidebar_width": 320 } }"#,
        )
        .expect("parses");

        assert_eq!(config.layout.seed, 7);
        assert_eq!(config.layout.dedup_threshold, 0.92);
        assert_eq!(config.camera.sidebar_width, 320.0);
        assert_eq!(config.camera.dive_zoom, 2.2);
        assert_eq!(config.proximity, ProximityConfig::default());
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join("idea-atlas-missing-config.json");
        assert!(AtlasConfig::load(&path).is_err());
        assert_eq!(
            AtlasConfig::load_or_default(None).expect("default"),
            AtlasConfig::default()
        );
    }
}
