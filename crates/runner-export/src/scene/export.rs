//! World assembly
//!
//! Converts a validated [`SceneDocument`] into the resolved
//! [`runner_format::World`] and writes it as a `.runner` container.

use std::path::{Component, Path, PathBuf};

use runner_core::{BoundingBox, Error, Mat4x4, Result, ResultExt, Vec3};
use runner_format::world::{
    Camera, Lamp, LampKind, Material, Node, NodeKind, Physics, Scene, Shape, Texture, TextureFilter, TextureWrap,
    WorldWriter,
};
use runner_format::World;
use tracing::{debug, info};

use super::input::{
    CameraData, GameSettings, LampData, MaterialData, ObjectData, SceneData, SceneDocument, TextureData,
    TextureExtension,
};
use super::mesh::build_mesh;
use super::nodes::flatten;
use super::validate::validate;
use crate::config::ExportConfig;

/// Physics constants the modelling tool does not expose
const DEFAULT_FRICTION: f32 = 0.5;
const DEFAULT_RESTITUTION: f32 = 0.1;
const DEFAULT_LINEAR_SLEEPING_THRESHOLD: f32 = 0.8;
const DEFAULT_ANGULAR_SLEEPING_THRESHOLD: f32 = 1.0;

/// Scene document to `.runner` exporter
#[derive(Debug, Clone, Default)]
pub struct WorldExporter {
    config: ExportConfig,
}

impl WorldExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Validate `doc` and resolve it into a world called `name`
    pub fn build_world(&self, doc: &SceneDocument, name: &str) -> Result<World> {
        validate(doc)?;

        let paths = AssetPaths::new(doc);
        let world = World {
            name: name.to_string(),
            cameras: doc.cameras.iter().map(|c| self.camera(c)).collect(),
            materials: doc.materials.iter().map(|m| material(m, &paths)).collect(),
            textures: doc.textures.iter().map(|t| texture(t, &paths)).collect(),
            meshes: doc.meshes.iter().map(|m| build_mesh(m, self.config.epsilon)).collect(),
            lamps: doc.lamps.iter().map(lamp).collect(),
            scenes: doc.scenes.iter().map(|s| scene(doc, s)).collect(),
        };

        info!(
            world = %world.name,
            cameras = world.cameras.len(),
            materials = world.materials.len(),
            textures = world.textures.len(),
            meshes = world.meshes.len(),
            lamps = world.lamps.len(),
            scenes = world.scenes.len(),
            "Assembled world"
        );
        Ok(world)
    }

    /// Build and write `doc` to `output`; the world is named after the file stem
    pub fn export(&self, doc: &SceneDocument, output: &Path) -> Result<World> {
        let name = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_data(format!("output path {} has no file name", output.display())))?;

        let world = self.build_world(doc, &name)?;
        WorldWriter::new().write_file(&world, output)?;
        Ok(world)
    }

    /// Load a JSON scene document and export it. Without `output` the world
    /// is written next to the input as `<stem>.runner`.
    pub fn export_file(&self, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
        let doc = SceneDocument::from_json_file(input)?;
        let output = output.map_or_else(|| input.with_extension("runner"), Path::to_path_buf);
        self.export(&doc, &output)
            .with_context(|| format!("exporting {}", input.display()))?;
        Ok(output)
    }

    fn camera(&self, data: &CameraData) -> Camera {
        debug!(camera = %data.name, "Camera");
        Camera {
            name: data.name.clone(),
            kind: data.kind,
            fovx: self.config.camera_fovx,
            fovy: data.angle,
            aspect: self.config.camera_aspect,
            znear: data.clip_start,
            zfar: data.clip_end,
            view: Mat4x4::IDENTITY,
            projection: Mat4x4::IDENTITY,
        }
    }
}

fn material(data: &MaterialData, paths: &AssetPaths) -> Material {
    let texture = data.texture_slots.first().cloned().flatten().unwrap_or_default();
    debug!(material = %data.name, texture = %texture, "Material");
    Material {
        name: data.name.clone(),
        shader: paths.convert(data.shader.as_deref().unwrap_or_default()),
        texture,
        diffuse: data.diffuse_color.scale(data.diffuse_intensity),
        specular: data.specular_color.scale(data.specular_intensity),
        hardness: data.specular_hardness,
    }
}

/// GL filters and wrap modes from the texture's sampling flags
pub fn sampling(data: &TextureData) -> (TextureFilter, TextureFilter, TextureWrap, TextureWrap) {
    let (min_filter, mag_filter) = match (data.use_interpolation, data.use_mipmap) {
        (true, true) => (TextureFilter::LinearMipmapLinear, TextureFilter::Linear),
        (true, false) => (TextureFilter::Linear, TextureFilter::Linear),
        (false, true) => (TextureFilter::NearestMipmapNearest, TextureFilter::Nearest),
        (false, false) => (TextureFilter::Nearest, TextureFilter::Nearest),
    };

    let wrap = |mirror: bool| match (data.extension, mirror) {
        (TextureExtension::Repeat, true) => TextureWrap::MirroredRepeat,
        (TextureExtension::Repeat, false) => TextureWrap::Repeat,
        _ => TextureWrap::ClampToEdge,
    };

    (min_filter, mag_filter, wrap(data.use_mirror_x), wrap(data.use_mirror_y))
}

fn texture(data: &TextureData, paths: &AssetPaths) -> Texture {
    let (min_filter, mag_filter, wrap_s, wrap_t) = sampling(data);
    let path = paths.convert(data.image.as_deref().unwrap_or_default());
    debug!(texture = %data.name, path = %path, "Texture");
    Texture {
        name: data.name.clone(),
        path,
        min_filter,
        mag_filter,
        wrap_s,
        wrap_t,
    }
}

fn lamp(data: &LampData) -> Lamp {
    let (spot_size, spot_blend) = match data.kind {
        LampKind::Spot => (data.spot_size, data.spot_blend),
        LampKind::Point => (0.0, 0.0),
    };
    Lamp {
        name: data.name.clone(),
        kind: data.kind,
        falloff: data.falloff_type,
        energy: data.energy,
        distance: data.distance,
        spot_size,
        spot_blend,
        color: data.color,
    }
}

fn lock_factor(x: bool, y: bool, z: bool) -> Vec3 {
    let factor = |locked: bool| if locked { 0.0 } else { 1.0 };
    Vec3::new(factor(x), factor(y), factor(z))
}

pub fn physics(game: &GameSettings, bbox: &BoundingBox) -> Physics {
    Physics {
        body: game.physics_type,
        mass: game.mass,
        friction: game.friction.unwrap_or(DEFAULT_FRICTION),
        restitution: game.restitution.unwrap_or(DEFAULT_RESTITUTION),
        linear_damping: game.damping,
        angular_damping: game.rotation_damping,
        linear_sleeping_threshold: game
            .linear_sleeping_threshold
            .unwrap_or(DEFAULT_LINEAR_SLEEPING_THRESHOLD),
        angular_sleeping_threshold: game
            .angular_sleeping_threshold
            .unwrap_or(DEFAULT_ANGULAR_SLEEPING_THRESHOLD),
        form_factor: game.form_factor,
        linear_factor: lock_factor(game.lock_location_x, game.lock_location_y, game.lock_location_z),
        angular_factor: lock_factor(game.lock_rotation_x, game.lock_rotation_y, game.lock_rotation_z),
        shape: Shape {
            kind: game.collision_bounds_type,
            margin: game.collision_margin,
            radius: game.radius,
            extents: bbox.size(),
        },
    }
}

fn node(object: &ObjectData, kind: NodeKind, parent_index: i32) -> Node {
    let bbox = BoundingBox::from_points(object.bound_box.iter().copied()).unwrap_or(BoundingBox::ZERO);
    debug!(node = %object.name, parent = parent_index, "Node");
    Node {
        name: object.name.clone(),
        data: object.data.clone().unwrap_or_default(),
        kind,
        transform: object.matrix_local,
        bbox,
        physics: physics(&object.game, &bbox),
        parent_index,
    }
}

fn scene(doc: &SceneDocument, data: &SceneData) -> Scene {
    let nodes: Vec<Node> = flatten(doc, data)
        .into_iter()
        .map(|flat| node(flat.object, flat.kind, flat.parent_index))
        .collect();
    info!(scene = %data.name, nodes = nodes.len(), "Scene");
    Scene {
        name: data.name.clone(),
        camera: data.camera.clone().unwrap_or_default(),
        gravity: data.gravity,
        nodes,
    }
}

/// Rewrites document-relative asset paths relative to the assets root
struct AssetPaths {
    base: PathBuf,
    root: Option<PathBuf>,
}

impl AssetPaths {
    fn new(doc: &SceneDocument) -> Self {
        Self {
            base: doc.base_dir.clone(),
            root: doc.assets_root.as_deref().map(|root| normalize(&doc.base_dir.join(root))),
        }
    }

    fn convert(&self, path: &str) -> String {
        // `//` marks a path relative to the document
        let path = path.strip_prefix("//").unwrap_or(path);
        match &self.root {
            Some(root) => to_slashes(&relative_to(&normalize(&self.base.join(path)), root)),
            None => to_slashes(&normalize(Path::new(path))),
        }
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `path` relative to `base`; both already normalized
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = path.iter().zip(&base).take_while(|(a, b)| a == b).count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &path[common..] {
        out.push(component);
    }
    out
}

fn to_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
