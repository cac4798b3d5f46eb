//! Runner Export Pipeline
//!
//! Turns authoring data into the containers the runner engine loads:
//! - `.texture` (ETC1 mipmap chains, through an external encoder)
//! - `.runner` (worlds: cameras, materials, textures, meshes, lamps, scenes)

pub mod config;
pub mod scene;
pub mod textures;

pub use config::{ExportConfig, ResizeFilter, DEFAULT_EPSILON};
pub use scene::{SceneDocument, WorldExporter};
pub use textures::{Etc1Encoder, Etc1Tool, TextureConvertOptions, TextureConverter, TextureError};
