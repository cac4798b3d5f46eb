//! Texture packing
//!
//! Builds a flipped, halving mipmap chain from a source image, compresses each
//! level to ETC1 with an external encoder and writes a `.texture` container.

mod converter;
mod encoder;
pub mod mipmap;

pub use converter::{TextureConvertOptions, TextureConverter};
pub use encoder::{etc1_size, Etc1Encoder, Etc1Tool};
pub use mipmap::{build_chain, mipmap_count};

use thiserror::Error;

/// Texture conversion errors
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Encoder failed: {0}")]
    Encoder(String),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Format error: {0}")]
    Format(#[from] runner_core::Error),
}

pub type TextureResult<T> = Result<T, TextureError>;
