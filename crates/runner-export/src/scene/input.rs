//! Scene document: the modelling tool's data, exported as JSON
//!
//! Datablocks (cameras, materials, textures, meshes, lamps) are listed once
//! and referenced by name from objects; objects reference their parent by
//! name; scenes list the objects they contain. Type fields use the modelling
//! tool's own strings (`PERSP`, `RIGID_BODY`, `CONVEX_HULL`, ...).

use std::path::{Path, PathBuf};

use runner_core::{Error, Mat4x4, Result, Vec2, Vec3};
use runner_format::world::{BodyKind, CameraKind, Falloff, LampKind, NodeKind, ShapeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Directory asset paths are made relative to, itself relative to the
    /// document's directory
    #[serde(default)]
    pub assets_root: Option<String>,
    #[serde(default)]
    pub cameras: Vec<CameraData>,
    #[serde(default)]
    pub materials: Vec<MaterialData>,
    #[serde(default)]
    pub textures: Vec<TextureData>,
    #[serde(default)]
    pub meshes: Vec<MeshData>,
    #[serde(default)]
    pub lamps: Vec<LampData>,
    #[serde(default)]
    pub objects: Vec<ObjectData>,
    #[serde(default)]
    pub scenes: Vec<SceneData>,

    /// Directory the document was loaded from
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl SceneDocument {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::invalid_data(format!("scene document: {e}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut document = Self::from_json_str(&text).map_err(|e| e.with_context(path.display().to_string()))?;
        document.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(document)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectData> {
        self.objects.iter().find(|o| o.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    pub name: String,
    #[serde(rename = "type", default = "default_camera_kind")]
    pub kind: CameraKind,
    /// Vertical field of view, radians
    #[serde(default = "default_angle")]
    pub angle: f32,
    #[serde(default = "default_clip_start")]
    pub clip_start: f32,
    #[serde(default = "default_clip_end")]
    pub clip_end: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialData {
    pub name: String,
    /// Shader path; required by the exporter
    #[serde(default)]
    pub shader: Option<String>,
    /// Texture names per slot, `null` for an empty slot
    #[serde(default)]
    pub texture_slots: Vec<Option<String>>,
    #[serde(default = "default_color")]
    pub diffuse_color: Vec3,
    #[serde(default = "default_diffuse_intensity")]
    pub diffuse_intensity: f32,
    #[serde(default = "default_color")]
    pub specular_color: Vec3,
    #[serde(default = "default_specular_intensity")]
    pub specular_intensity: f32,
    #[serde(default = "default_hardness")]
    pub specular_hardness: f32,
}

/// Texture addressing outside `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextureExtension {
    #[default]
    Repeat,
    Extend,
    Clip,
    ClipCube,
    Checker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureData {
    pub name: String,
    /// Image file path; required by the exporter
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub use_interpolation: bool,
    #[serde(default = "default_true")]
    pub use_mipmap: bool,
    #[serde(default)]
    pub extension: TextureExtension,
    #[serde(default)]
    pub use_mirror_x: bool,
    #[serde(default)]
    pub use_mirror_y: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub co: Vec3,
    pub normal: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Corner vertex indices, in winding order
    pub vertices: Vec<u32>,
    pub normal: Vec3,
    #[serde(default)]
    pub use_smooth: bool,
    #[serde(default)]
    pub material_index: u32,
}

/// One UV coordinate per face corner, faces in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvLayer {
    pub name: String,
    pub uvs: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<Face>,
    /// Material name per slot, `null` for an empty slot
    #[serde(default)]
    pub materials: Vec<Option<String>>,
    #[serde(default)]
    pub uv_layers: Vec<UvLayer>,
    #[serde(default)]
    pub active_uv_index: u32,
}

impl MeshData {
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(|f| f.vertices.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LampData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LampKind,
    #[serde(default = "default_falloff")]
    pub falloff_type: Falloff,
    #[serde(default = "default_one")]
    pub energy: f32,
    #[serde(default = "default_lamp_distance")]
    pub distance: f32,
    #[serde(default)]
    pub spot_size: f32,
    #[serde(default)]
    pub spot_blend: f32,
    #[serde(default = "default_color")]
    pub color: Vec3,
}

/// Object type; anything other than a mesh, camera or lamp is kept in the
/// document but never becomes a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Mesh,
    Camera,
    Lamp,
    #[serde(other)]
    Unsupported,
}

impl ObjectKind {
    pub fn node_kind(self) -> Option<NodeKind> {
        match self {
            ObjectKind::Mesh => Some(NodeKind::Mesh),
            ObjectKind::Camera => Some(NodeKind::Camera),
            ObjectKind::Lamp => Some(NodeKind::Lamp),
            ObjectKind::Unsupported => None,
        }
    }
}

/// Game-engine physics settings of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub physics_type: BodyKind,
    pub mass: f32,
    pub damping: f32,
    pub rotation_damping: f32,
    pub form_factor: f32,
    pub collision_bounds_type: ShapeKind,
    pub collision_margin: f32,
    pub radius: f32,
    pub lock_location_x: bool,
    pub lock_location_y: bool,
    pub lock_location_z: bool,
    pub lock_rotation_x: bool,
    pub lock_rotation_y: bool,
    pub lock_rotation_z: bool,
    /// Overrides of the fixed defaults
    pub friction: Option<f32>,
    pub restitution: Option<f32>,
    pub linear_sleeping_threshold: Option<f32>,
    pub angular_sleeping_threshold: Option<f32>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            physics_type: BodyKind::Static,
            mass: 1.0,
            damping: 0.04,
            rotation_damping: 0.1,
            form_factor: 0.4,
            collision_bounds_type: ShapeKind::Box,
            collision_margin: 0.04,
            radius: 1.0,
            lock_location_x: false,
            lock_location_y: false,
            lock_location_z: false,
            lock_rotation_x: false,
            lock_rotation_y: false,
            lock_rotation_z: false,
            friction: None,
            restitution: None,
            linear_sleeping_threshold: None,
            angular_sleeping_threshold: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Name of the datablock this object instances
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    /// Transform relative to the parent
    #[serde(default)]
    pub matrix_local: Mat4x4,
    /// Corners of the local bounding box (8 for the modelling tool)
    #[serde(default)]
    pub bound_box: Vec<Vec3>,
    #[serde(default)]
    pub game: GameSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    pub name: String,
    /// Active camera object
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    /// Names of the objects in this scene
    #[serde(default)]
    pub objects: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

fn default_camera_kind() -> CameraKind {
    CameraKind::Perspective
}

fn default_angle() -> f32 {
    0.857_556
}

fn default_clip_start() -> f32 {
    0.1
}

fn default_clip_end() -> f32 {
    100.0
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_diffuse_intensity() -> f32 {
    0.8
}

fn default_specular_intensity() -> f32 {
    0.5
}

fn default_hardness() -> f32 {
    50.0
}

fn default_falloff() -> Falloff {
    Falloff::InverseSquare
}

fn default_lamp_distance() -> f32 {
    25.0
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, 0.0, -9.81)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document() {
        let doc = SceneDocument::from_json_str(
            r#"{
                "objects": [
                    {"name": "Empty", "type": "EMPTY"},
                    {"name": "Cam", "type": "CAMERA", "data": "CamData"}
                ],
                "cameras": [{"name": "CamData", "type": "ORTHO", "angle": 0.5}]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.objects[0].kind, ObjectKind::Unsupported);
        assert_eq!(doc.objects[1].kind.node_kind(), Some(NodeKind::Camera));
        assert_eq!(doc.objects[1].matrix_local, Mat4x4::IDENTITY);
        assert_eq!(doc.cameras[0].kind, CameraKind::Orthographic);
        assert_eq!(doc.cameras[0].clip_end, 100.0);
        assert!(doc.object("Cam").is_some());
    }

    #[test]
    fn test_game_settings_defaults_and_overrides() {
        let obj: ObjectData = serde_json::from_str(
            r#"{"name": "Ball", "type": "MESH", "data": "Sphere",
                "game": {"physics_type": "RIGID_BODY", "collision_bounds_type": "SPHERE",
                         "friction": 0.9, "lock_rotation_z": true}}"#,
        )
        .unwrap();

        assert_eq!(obj.game.physics_type, BodyKind::RigidBody);
        assert_eq!(obj.game.collision_bounds_type, ShapeKind::Sphere);
        assert_eq!(obj.game.friction, Some(0.9));
        assert_eq!(obj.game.restitution, None);
        assert!(obj.game.lock_rotation_z);
        assert_eq!(obj.game.mass, 1.0);
    }

    #[test]
    fn test_bad_json_is_invalid_data() {
        let err = SceneDocument::from_json_str("{\"objects\": 3}").unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_unknown_lamp_type_rejected() {
        let result = serde_json::from_str::<LampData>(r#"{"name": "L", "type": "SUN"}"#);
        assert!(result.is_err());
    }
}
