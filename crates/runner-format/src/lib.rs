//! runner-format
//!
//! Binary layouts consumed by the runner engine at load time.
//!
//! # Containers
//!
//! | Format  | Extension  | Magic      | Content |
//! |---------|------------|------------|---------|
//! | Texture | `.texture` | `RNNRTXTR` | ETC1 mipmap chain |
//! | World   | `.runner`  | `RNNRWRLD` | cameras, materials, textures, meshes, lamps, scenes |
//!
//! Both start with a 20-byte [`FileHeader`] followed by a data section made of
//! fixed-size records. Variable-length payloads are referenced by offsets that
//! are absolute from the start of the data section, so the runtime can load
//! the section into one buffer and relocate pointers in place.
//!
//! # Example
//!
//! ```rust,ignore
//! use runner_format::{Parser, WorldParser};
//!
//! let world = WorldParser::new().parse_file("level.runner".as_ref())?;
//! println!("{} meshes", world.meshes.len());
//! ```

pub mod header;
pub mod logging;
pub mod table;
pub mod texture;
pub mod traits;
pub mod world;

pub use header::{read_container, write_container, FileHeader, FORMAT_VERSION, TEXTURE_MAGIC, WORLD_MAGIC};
pub use table::{Layout, Table};
pub use texture::{Mipmap, TextureFile, TextureParser};
pub use traits::{Parser, Record, NAME_LEN};
pub use world::{World, WorldParser};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
