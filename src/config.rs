//! Thresholds and policies for view selection.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the initialization pair search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitializationParams {
    /// Score a pair must strictly exceed to be considered at all.
    /// The score is the sum of track lengths over covisible points.
    pub min_track_count: usize,

    /// Pairs with a larger depth/baseline ratio are skipped (baseline too
    /// short for reliable triangulation).
    pub max_depth_ratio: f64,
}

impl Default for InitializationParams {
    fn default() -> Self {
        Self {
            min_track_count: 20,
            max_depth_ratio: 50.0,
        }
    }
}

/// Parameters of the next-view search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextViewParams {
    /// Count every occurrence of a registered point id instead of
    /// de-duplicating the set first.
    pub count_duplicate_points: bool,
}

/// Full configuration, loadable from YAML.
///
/// ```yaml
/// initialization:
///   min_track_count: 30
///   max_depth_ratio: 40.0
/// next_view:
///   count_duplicate_points: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSelectionConfig {
    pub initialization: InitializationParams,
    pub next_view: NextViewParams,
}

impl ViewSelectionConfig {
    /// Load a configuration file. Missing fields keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
