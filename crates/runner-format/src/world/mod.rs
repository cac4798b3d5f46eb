//! `.runner` world container
//!
//! ```text
//! data section
//! ├── WorldRecord      name, six counts, six table offsets
//! ├── Camera[]
//! ├── Material[]
//! ├── Texture[]
//! ├── mesh table       MeshRecord[] then per mesh: Vertex[], UV-map table, submesh table
//! ├── Lamp[]
//! └── scene table      SceneRecord[] then per scene: Node[]
//! ```
//!
//! The types in this module are the fully resolved world: every name a
//! record refers to is already a plain string and nodes are already in
//! parent-before-child order.

mod reader;
mod records;
mod writer;

pub use reader::WorldParser;
pub use records::{MeshRecord, SceneRecord, SubmeshRecord, UvMapRecord, WorldRecord};
pub use writer::WorldWriter;

use runner_core::{BoundingBox, Mat4x4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Declares a `u32` wire enum with its conversions
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        $(#[$meta])*
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Value stored in the file
            pub fn to_u32(self) -> u32 {
                match self {
                    $( Self::$variant => $value ),+
                }
            }

            /// Decode a stored value
            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $( v if v == $value => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

wire_enum! {
    /// Camera projection; host strings `PERSP` / `ORTHO`
    CameraKind {
        #[serde(rename = "PERSP")]
        Perspective = 0,
        #[serde(rename = "ORTHO")]
        Orthographic = 1,
    }
}

wire_enum! {
    /// Lamp type
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    LampKind {
        Point = 0,
        Spot = 1,
    }
}

wire_enum! {
    /// Lamp light falloff
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    Falloff {
        InverseLinear = 0,
        InverseSquare = 1,
        Constant = 2,
    }
}

wire_enum! {
    /// What a scene node's data name refers to
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    NodeKind {
        Mesh = 0,
        Camera = 1,
        Lamp = 2,
    }
}

wire_enum! {
    /// Physics body type
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    BodyKind {
        NoCollision = 0,
        RigidBody = 1,
        Static = 2,
    }
}

wire_enum! {
    /// Collision shape type
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    ShapeKind {
        Box = 0,
        Sphere = 1,
        Capsule = 2,
        Cone = 3,
        Cylinder = 4,
        ConvexHull = 5,
        TriangleMesh = 6,
    }
}

wire_enum! {
    /// GL texture filter (`GL_NEAREST` ... `GL_LINEAR_MIPMAP_LINEAR`)
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    TextureFilter {
        Nearest = 0x2600,
        Linear = 0x2601,
        NearestMipmapNearest = 0x2700,
        LinearMipmapNearest = 0x2701,
        NearestMipmapLinear = 0x2702,
        LinearMipmapLinear = 0x2703,
    }
}

wire_enum! {
    /// GL texture wrap mode
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    TextureWrap {
        Repeat = 0x2901,
        ClampToEdge = 0x812F,
        MirroredRepeat = 0x8370,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    pub name: String,
    pub kind: CameraKind,
    pub fovx: f32,
    pub fovy: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    pub view: Mat4x4,
    pub projection: Mat4x4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    /// Shader path, relative to the assets root
    pub shader: String,
    /// Name of the texture record, empty when untextured
    pub texture: String,
    /// Diffuse colour premultiplied by its intensity
    pub diffuse: Vec3,
    /// Specular colour premultiplied by its intensity
    pub specular: Vec3,
    pub hardness: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Texture {
    pub name: String,
    /// Image path, relative to the assets root
    pub path: String,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

/// One UV layer, index-aligned with the owning mesh's vertices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UvMap {
    pub name: String,
    pub uvs: Vec<Vec2>,
}

/// Triangles of one material, indexing the mesh's shared vertices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submesh {
    pub material: String,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh {
    pub name: String,
    pub active_uv_index: u32,
    pub vertices: Vec<Vertex>,
    pub uv_maps: Vec<UvMap>,
    pub submeshes: Vec<Submesh>,
}

impl Mesh {
    /// Total index count over all submeshes
    pub fn index_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.indices.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lamp {
    pub name: String,
    pub kind: LampKind,
    pub falloff: Falloff,
    pub energy: f32,
    pub distance: f32,
    pub spot_size: f32,
    pub spot_blend: f32,
    pub color: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub margin: f32,
    pub radius: f32,
    pub extents: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Physics {
    pub body: BodyKind,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub linear_sleeping_threshold: f32,
    pub angular_sleeping_threshold: f32,
    pub form_factor: f32,
    /// 0.0 on locked axes, 1.0 on free ones
    pub linear_factor: Vec3,
    pub angular_factor: Vec3,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    /// Name of the mesh, camera or lamp this node instances
    pub data: String,
    pub kind: NodeKind,
    pub transform: Mat4x4,
    pub bbox: BoundingBox,
    pub physics: Physics,
    /// Index of the parent in the same node array, -1 for roots
    pub parent_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub name: String,
    /// Name of the active camera object
    pub camera: String,
    pub gravity: Vec3,
    /// Parent-before-child order
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct World {
    pub name: String,
    pub cameras: Vec<Camera>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub meshes: Vec<Mesh>,
    pub lamps: Vec<Lamp>,
    pub scenes: Vec<Scene>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(TextureFilter::LinearMipmapLinear.to_u32(), 0x2703);
        assert_eq!(TextureWrap::from_u32(0x812F), Some(TextureWrap::ClampToEdge));
        assert_eq!(ShapeKind::from_u32(6), Some(ShapeKind::TriangleMesh));
        assert_eq!(NodeKind::from_u32(3), None);
    }

    #[test]
    fn test_host_type_strings() {
        let kind: CameraKind = serde_json::from_str("\"ORTHO\"").unwrap();
        assert_eq!(kind, CameraKind::Orthographic);
        let body: BodyKind = serde_json::from_str("\"RIGID_BODY\"").unwrap();
        assert_eq!(body, BodyKind::RigidBody);
        let shape: ShapeKind = serde_json::from_str("\"CONVEX_HULL\"").unwrap();
        assert_eq!(shape, ShapeKind::ConvexHull);
        let falloff: Falloff = serde_json::from_str("\"INVERSE_SQUARE\"").unwrap();
        assert_eq!(falloff, Falloff::InverseSquare);
        assert!(serde_json::from_str::<LampKind>("\"SUN\"").is_err());
    }
}
