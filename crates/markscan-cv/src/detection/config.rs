//! Detection configuration

use super::arrow::ArrowParams;
use super::blob::BlobParams;
use super::health::HealthBarParams;
use super::shapes::ShapeDetectorParams;
use super::template::TemplateParams;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One parameter set per detector family.
///
/// Missing sections fall back to their defaults, so a config file only has
/// to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub blobs: BlobParams,
    pub monsters: BlobParams,
    pub arrow: ArrowParams,
    pub health_bar: HealthBarParams,
    pub shape: ShapeDetectorParams,
    pub template: TemplateParams,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blobs: BlobParams::map_points(),
            monsters: BlobParams::monsters(),
            arrow: ArrowParams::default(),
            health_bar: HealthBarParams::default(),
            shape: ShapeDetectorParams::default(),
            template: TemplateParams::default(),
        }
    }
}

impl DetectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse detection config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize detection config")
    }

    /// Rejects values no detector can work with
    pub fn validate(&self) -> Result<()> {
        use crate::error::ensure_finite;

        ensure_finite("template.search.threshold", self.template.search.threshold)?;
        ensure_finite("blobs.merge_radius", self.blobs.merge_radius)?;
        ensure_finite("monsters.merge_radius", self.monsters.merge_radius)?;
        ensure_finite("arrow.orientation.tip_angle_threshold", self.arrow.orientation.tip_angle_threshold)?;
        Ok(())
    }
}
