//! Export settings
//!
//! Every field has a default, so a YAML file only needs the values it
//! changes:
//!
//! ```yaml
//! encoder: /opt/android-sdk/tools/etc1tool
//! epsilon: 0.001
//! resize_filter: triangle
//! ```

use std::path::Path;

use image::imageops::FilterType;
use runner_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tolerance under which two vertex components are considered equal
pub const DEFAULT_EPSILON: f32 = 0.0001;

/// Resampling filter used between mip levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// ETC1 encoder program
    pub encoder: String,
    /// Vertex deduplication tolerance
    pub epsilon: f32,
    /// Aspect ratio written into every camera
    pub camera_aspect: f32,
    /// Horizontal field of view written into every camera, in degrees
    pub camera_fovx: f32,
    /// Extension of packed textures
    pub texture_extension: String,
    pub resize_filter: ResizeFilter,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            encoder: "etc1tool".to_string(),
            epsilon: DEFAULT_EPSILON,
            camera_aspect: 800.0 / 480.0,
            camera_fovx: 90.0,
            texture_extension: "texture".to_string(),
            resize_filter: ResizeFilter::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|e| e.with_context(format!("config {}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::InvalidConfig {
                message: message.to_string(),
            })
        };

        if self.encoder.trim().is_empty() {
            return invalid("encoder must not be empty");
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return invalid("epsilon must be a finite non-negative number");
        }
        if !self.camera_aspect.is_finite() || self.camera_aspect <= 0.0 {
            return invalid("camera_aspect must be finite and positive");
        }
        if !self.camera_fovx.is_finite() || self.camera_fovx <= 0.0 {
            return invalid("camera_fovx must be finite and positive");
        }
        if self.texture_extension.is_empty() || self.texture_extension.contains(['.', '/', '\\']) {
            return invalid("texture_extension must be a bare extension");
        }
        Ok(())
    }
}
