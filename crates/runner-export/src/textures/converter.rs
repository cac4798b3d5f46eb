//! Texture converter
//!
//! Packs images into `.texture` containers.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use runner_format::{Mipmap, TextureFile};
use tracing::{debug, info};

use super::encoder::{Etc1Encoder, Etc1Tool};
use super::mipmap::build_chain;
use super::{TextureError, TextureResult};
use crate::config::ExportConfig;

/// Texture conversion options
#[derive(Debug, Clone)]
pub struct TextureConvertOptions {
    /// Filter used to halve each level
    pub filter: FilterType,

    /// Extension of the written container
    pub extension: String,
}

impl Default for TextureConvertOptions {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            extension: "texture".to_string(),
        }
    }
}

impl From<&ExportConfig> for TextureConvertOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            filter: config.resize_filter.into(),
            extension: config.texture_extension.clone(),
        }
    }
}

/// Texture converter
pub struct TextureConverter {
    options: TextureConvertOptions,
    encoder: Box<dyn Etc1Encoder>,
}

impl TextureConverter {
    /// Converter running `etc1tool` from `PATH` with default options
    pub fn new() -> Self {
        Self::with_options(TextureConvertOptions::default(), Etc1Tool::default())
    }

    /// Create converter with custom options and encoder
    pub fn with_options(options: TextureConvertOptions, encoder: impl Etc1Encoder + 'static) -> Self {
        Self {
            options,
            encoder: Box::new(encoder),
        }
    }

    /// Converter configured from export settings
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::with_options(config.into(), Etc1Tool::new(&config.encoder))
    }

    /// Build the mipmap chain of `image` and compress every level
    pub fn build(&self, image: &DynamicImage) -> TextureResult<TextureFile> {
        let chain = build_chain(image, self.options.filter)?;
        debug!(levels = chain.len(), "Built mipmap chain");

        let mut texture = TextureFile::new(u32::from(image.color().channel_count()));
        for (level, mip) in chain.iter().enumerate() {
            let (width, height) = mip.dimensions();
            let data = self
                .encoder
                .encode(mip)
                .map_err(|e| match e {
                    TextureError::Encoder(msg) => TextureError::Encoder(format!("level {level} ({width}x{height}): {msg}")),
                    other => other,
                })?;
            texture.mipmaps.push(Mipmap { width, height, data });
        }
        Ok(texture)
    }

    /// Complete `.texture` container bytes for `image`
    pub fn pack(&self, image: &DynamicImage) -> TextureResult<Vec<u8>> {
        Ok(self.build(image)?.to_bytes()?)
    }

    /// Path the container for `input` is written to
    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.options.extension)
    }

    /// Convert one image file into a sibling container and return its path
    pub fn convert_file(&self, input: impl AsRef<Path>) -> TextureResult<PathBuf> {
        let input = input.as_ref();
        info!(path = %input.display(), "Processing texture");

        let image = image::open(input)?;
        let bytes = self.pack(&image)?;

        let output = self.output_path(input);
        std::fs::write(&output, &bytes)?;
        info!(path = %output.display(), size = bytes.len(), "Wrote texture");
        Ok(output)
    }

    /// Convert files in order, stopping at the first failure
    pub fn convert_batch<P: AsRef<Path>>(&self, inputs: &[P]) -> TextureResult<Vec<PathBuf>> {
        inputs.iter().map(|input| self.convert_file(input)).collect()
    }
}

impl Default for TextureConverter {
    fn default() -> Self {
        Self::new()
    }
}
