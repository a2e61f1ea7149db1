//! Canvas tuning knobs.
//!
//! Defaults reproduce the stock canvas behavior. Every field is optional
//! when loading from JSON; missing keys fall back to the default.

use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid canvas config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid zoom range: min {min} must be positive and below max {max}")]
    ZoomRange { min: f32, max: f32 },
}

/// Zoom limits and steps.
///
/// Manual zoom (buttons, wheel) and fit-to-view clamp to different floors.
/// Both are kept configurable; set `fit_min` equal to `min` to unify them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Lower clamp for zoom in/out and wheel zoom.
    pub min: f32,
    /// Upper clamp for zoom in/out and wheel zoom.
    pub max: f32,
    /// Increment for zoom in/out buttons and shortcuts.
    pub step: f32,
    /// Increment per wheel notch (modifier held).
    pub wheel_step: f32,
    /// Fit-to-view never zooms in past this.
    pub fit_max: f32,
    /// Fit-to-view never zooms out past this.
    pub fit_min: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.3,
            max: 2.0,
            step: 0.1,
            wheel_step: 0.1,
            fit_max: 1.2,
            fit_min: 0.2,
        }
    }
}

impl ZoomConfig {
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min, self.max)
    }
}

/// Configuration for a mind-map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// World-space box every node is approximated by for hit testing,
    /// connection anchors and fit-to-view.
    pub node_size: Size,
    /// Screen padding added around content by fit-to-view.
    pub fit_padding: f32,
    pub zoom: ZoomConfig,
    /// Connection bend, as a fraction of the source→target distance.
    pub curvature: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            node_size: Size::new(160.0, 50.0),
            fit_padding: 50.0,
            zoom: ZoomConfig::default(),
            curvature: 0.15,
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON config.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: CanvasConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let z = &self.zoom;
        if z.min <= 0.0 || z.min >= z.max || z.fit_min <= 0.0 || z.fit_min > z.fit_max {
            return Err(ConfigError::ZoomRange {
                min: z.min.min(z.fit_min),
                max: z.max.max(z.fit_max),
            });
        }
        Ok(())
    }
}
