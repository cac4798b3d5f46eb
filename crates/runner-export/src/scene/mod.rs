//! Scene export
//!
//! `input` describes the modelling tool's scene, `validate` resolves every
//! name in it, `mesh` and `nodes` reshape meshes and the object tree, and
//! `export` assembles and writes the world.

mod export;
pub mod input;
pub mod mesh;
pub mod nodes;
pub mod validate;

pub use export::{physics, sampling, WorldExporter};
pub use input::SceneDocument;
pub use mesh::{build_mesh, MeshBuilder};
pub use nodes::{flatten, FlatNode};
pub use validate::validate;
