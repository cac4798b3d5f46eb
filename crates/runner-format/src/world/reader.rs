use std::collections::HashSet;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use runner_core::{Error, Result, ResultExt};
use tracing::{debug, trace};

use super::records::{MeshRecord, SceneRecord, SubmeshRecord, UvMapRecord, WorldRecord};
use super::{Camera, Lamp, Material, Mesh, Node, NodeKind, Scene, Submesh, Texture, UvMap, Vertex, World};
use crate::header::{read_container, WORLD_MAGIC};
use crate::traits::{decode_records, read_vec2, slice_at, Parser, Record};

/// Reader for `.runner` world containers
///
/// Decoding checks every offset and the structural invariants the runtime
/// relies on: UV layers match their mesh's vertex count, indices stay inside
/// the vertex array and nodes come after their parent.
#[derive(Debug, Default)]
pub struct WorldParser {
    /// Also resolve names: submesh materials, material textures, node data
    /// and scene cameras
    pub check_references: bool,
}

impl WorldParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that also checks name references after decoding
    pub fn strict() -> Self {
        Self {
            check_references: true,
        }
    }

    /// Decode a data section
    pub fn parse_data(&self, data: &[u8]) -> Result<World> {
        let record = WorldRecord::read_from(&mut slice_at(data, 0, WorldRecord::SIZE as u64, "world record")?)?;
        debug!(
            name = %record.name,
            cameras = record.camera_count,
            materials = record.material_count,
            textures = record.texture_count,
            meshes = record.mesh_count,
            lamps = record.lamp_count,
            scenes = record.scene_count,
            "World record"
        );

        let cameras: Vec<Camera> = decode_records(data, record.cameras_offset, record.camera_count, "cameras")?;
        let materials: Vec<Material> =
            decode_records(data, record.materials_offset, record.material_count, "materials")?;
        let textures: Vec<Texture> = decode_records(data, record.textures_offset, record.texture_count, "textures")?;
        let lamps: Vec<Lamp> = decode_records(data, record.lamps_offset, record.lamp_count, "lamps")?;

        let mesh_records: Vec<MeshRecord> = decode_records(data, record.meshes_offset, record.mesh_count, "meshes")?;
        let meshes = mesh_records
            .iter()
            .map(|mesh| read_mesh(data, mesh).with_context(|| format!("mesh '{}'", mesh.name)))
            .collect::<Result<Vec<_>>>()?;

        let scene_records: Vec<SceneRecord> =
            decode_records(data, record.scenes_offset, record.scene_count, "scenes")?;
        let scenes = scene_records
            .iter()
            .map(|scene| read_scene(data, scene).with_context(|| format!("scene '{}'", scene.name)))
            .collect::<Result<Vec<_>>>()?;

        let world = World {
            name: record.name,
            cameras,
            materials,
            textures,
            meshes,
            lamps,
            scenes,
        };

        if self.check_references {
            check_references(&world)?;
        }
        Ok(world)
    }
}

impl Parser for WorldParser {
    type Output = World;

    fn name(&self) -> &str {
        "Runner World"
    }

    fn extensions(&self) -> &[&str] {
        &["runner"]
    }

    fn magic_bytes(&self) -> &[u8] {
        &WORLD_MAGIC
    }

    fn parse_bytes(&self, bytes: &[u8]) -> Result<World> {
        let (_, data) = read_container(WORLD_MAGIC, bytes)?;
        self.parse_data(data)
    }
}

fn read_mesh(data: &[u8], record: &MeshRecord) -> Result<Mesh> {
    trace!(mesh = %record.name, offset = record.vertices_offset, "Reading mesh");
    let vertices: Vec<Vertex> = decode_records(data, record.vertices_offset, record.vertex_count, "vertices")?;

    let uv_records: Vec<UvMapRecord> = decode_records(data, record.uv_maps_offset, record.uv_map_count, "uv maps")?;
    let mut uv_maps = Vec::with_capacity(uv_records.len());
    for uv in uv_records {
        if uv.uv_count != record.vertex_count {
            return Err(Error::invalid_data(format!(
                "uv map '{}' has {} entries for {} vertices",
                uv.name, uv.uv_count, record.vertex_count
            )));
        }
        let bytes = slice_at(data, uv.uvs_offset, u64::from(uv.uv_count) * 8, "uvs")?;
        let mut cursor = Cursor::new(bytes);
        let uvs = (0..uv.uv_count)
            .map(|_| read_vec2(&mut cursor))
            .collect::<Result<Vec<_>>>()?;
        uv_maps.push(UvMap { name: uv.name, uvs });
    }

    if !uv_maps.is_empty() && record.active_uv_index as usize >= uv_maps.len() {
        return Err(Error::invalid_data(format!(
            "active uv index {} with {} uv maps",
            record.active_uv_index,
            uv_maps.len()
        )));
    }

    let submesh_records: Vec<SubmeshRecord> =
        decode_records(data, record.submeshes_offset, record.submesh_count, "submeshes")?;
    let mut submeshes = Vec::with_capacity(submesh_records.len());
    for submesh in submesh_records {
        let bytes = slice_at(data, submesh.indices_offset, u64::from(submesh.index_count) * 4, "indices")?;
        let mut indices = vec![0u32; submesh.index_count as usize];
        Cursor::new(bytes).read_u32_into::<LittleEndian>(&mut indices)?;

        if let Some(&bad) = indices.iter().find(|&&i| i >= record.vertex_count) {
            return Err(Error::invalid_data(format!(
                "submesh '{}' index {} outside {} vertices",
                submesh.material, bad, record.vertex_count
            )));
        }
        submeshes.push(Submesh {
            material: submesh.material,
            indices,
        });
    }

    Ok(Mesh {
        name: record.name.clone(),
        active_uv_index: record.active_uv_index,
        vertices,
        uv_maps,
        submeshes,
    })
}

fn read_scene(data: &[u8], record: &SceneRecord) -> Result<Scene> {
    let nodes: Vec<Node> = decode_records(data, record.nodes_offset, record.node_count, "nodes")?;
    for (index, node) in nodes.iter().enumerate() {
        let parent = node.parent_index;
        if parent < -1 || (parent >= 0 && parent as usize >= index) {
            return Err(Error::invalid_data(format!(
                "node '{}' at {} has parent index {}",
                node.name, index, parent
            )));
        }
    }

    Ok(Scene {
        name: record.name.clone(),
        camera: record.camera.clone(),
        gravity: record.gravity,
        nodes,
    })
}

fn names<'a>(items: impl Iterator<Item = &'a String>) -> HashSet<&'a str> {
    items.map(String::as_str).collect()
}

/// Every name a record refers to must exist in the world
fn check_references(world: &World) -> Result<()> {
    let materials = names(world.materials.iter().map(|m| &m.name));
    let textures = names(world.textures.iter().map(|t| &t.name));
    let meshes = names(world.meshes.iter().map(|m| &m.name));
    let cameras = names(world.cameras.iter().map(|c| &c.name));
    let lamps = names(world.lamps.iter().map(|l| &l.name));

    for material in &world.materials {
        if !material.texture.is_empty() && !textures.contains(material.texture.as_str()) {
            return Err(Error::invalid_reference(format!(
                "material '{}' texture '{}'",
                material.name, material.texture
            )));
        }
    }

    for mesh in &world.meshes {
        for submesh in &mesh.submeshes {
            if !materials.contains(submesh.material.as_str()) {
                return Err(Error::invalid_reference(format!(
                    "mesh '{}' material '{}'",
                    mesh.name, submesh.material
                )));
            }
        }
    }

    for scene in &world.scenes {
        let mut objects = HashSet::new();
        for node in &scene.nodes {
            let known = match node.kind {
                NodeKind::Mesh => &meshes,
                NodeKind::Camera => &cameras,
                NodeKind::Lamp => &lamps,
            };
            if !known.contains(node.data.as_str()) {
                return Err(Error::invalid_reference(format!(
                    "node '{}' data '{}'",
                    node.name, node.data
                )));
            }
            objects.insert(node.name.as_str());
        }
        if !scene.camera.is_empty() && !objects.contains(scene.camera.as_str()) {
            return Err(Error::invalid_reference(format!(
                "scene '{}' camera '{}'",
                scene.name, scene.camera
            )));
        }
    }

    Ok(())
}
