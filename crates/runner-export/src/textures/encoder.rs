//! ETC1 encoder collaborator

use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::{debug, warn};

use super::{TextureError, TextureResult};

/// Compresses one mip level to raw ETC1 blocks (no PKM header)
pub trait Etc1Encoder {
    fn encode(&self, level: &DynamicImage) -> TextureResult<Vec<u8>>;
}

/// Size of an ETC1 payload: one 8-byte block per started 4x4 tile
pub fn etc1_size(width: u32, height: u32) -> usize {
    width.div_ceil(4) as usize * height.div_ceil(4) as usize * 8
}

/// Runs `etc1tool --encodeNoHeader <in.png> -o <out>` once per level
#[derive(Debug, Clone)]
pub struct Etc1Tool {
    program: PathBuf,
}

impl Etc1Tool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Etc1Tool {
    fn default() -> Self {
        Self::new("etc1tool")
    }
}

impl Etc1Encoder for Etc1Tool {
    fn encode(&self, level: &DynamicImage) -> TextureResult<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("level.png");
        let output = dir.path().join("level.etc1");
        level.save_with_format(&input, ImageFormat::Png)?;

        let result = Command::new(&self.program)
            .arg("--encodeNoHeader")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .output()
            .map_err(|e| TextureError::Encoder(format!("cannot run {}: {e}", self.program.display())))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TextureError::Encoder(format!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                stderr.trim()
            )));
        }

        let data = std::fs::read(&output)
            .map_err(|e| TextureError::Encoder(format!("no output from {}: {e}", self.program.display())))?;

        let (width, height) = level.dimensions();
        debug!(width, height, size = data.len(), "Encoded level");
        if data.len() != etc1_size(width, height) {
            warn!(
                width,
                height,
                size = data.len(),
                expected = etc1_size(width, height),
                "Unexpected ETC1 payload size"
            );
        }
        Ok(data)
    }
}
