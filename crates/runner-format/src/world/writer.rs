use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use runner_core::{Error, Result, ResultExt};
use tracing::{debug, info};

use super::records::{MeshRecord, SceneRecord, SubmeshRecord, UvMapRecord, WorldRecord};
use super::{Mesh, Scene, World};
use crate::header::{write_container, WORLD_MAGIC};
use crate::table::{Layout, Table};
use crate::traits::{encode_records, write_vec2, Record};

fn count(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::invalid_data(format!("too many {what}: {len}")))
}

/// Serializes a [`World`] into a `.runner` container
#[derive(Debug, Default)]
pub struct WorldWriter;

impl WorldWriter {
    pub fn new() -> Self {
        Self
    }

    /// Encode the data section
    pub fn encode_data(&self, world: &World) -> Result<Vec<u8>> {
        let mut layout = Layout::new(WorldRecord::SIZE as u32);

        let cameras_offset = layout.place(encode_records(&world.cameras)?)?;
        let materials_offset = layout.place(encode_records(&world.materials)?)?;
        let textures_offset = layout.place(encode_records(&world.textures)?)?;

        let mut meshes = Table::<MeshRecord>::new(layout.cursor(), world.meshes.len())?;
        for mesh in &world.meshes {
            meshes
                .push(|offset| encode_mesh(mesh, offset))
                .with_context(|| format!("mesh '{}'", mesh.name))?;
        }
        let meshes_offset = layout.place(meshes.finish()?)?;

        let lamps_offset = layout.place(encode_records(&world.lamps)?)?;

        let mut scenes = Table::<SceneRecord>::new(layout.cursor(), world.scenes.len())?;
        for scene in &world.scenes {
            scenes
                .push(|offset| encode_scene(scene, offset))
                .with_context(|| format!("scene '{}'", scene.name))?;
        }
        let scenes_offset = layout.place(scenes.finish()?)?;

        let record = WorldRecord {
            name: world.name.clone(),
            camera_count: count(world.cameras.len(), "cameras")?,
            material_count: count(world.materials.len(), "materials")?,
            texture_count: count(world.textures.len(), "textures")?,
            mesh_count: count(world.meshes.len(), "meshes")?,
            lamp_count: count(world.lamps.len(), "lamps")?,
            scene_count: count(world.scenes.len(), "scenes")?,
            cameras_offset,
            materials_offset,
            textures_offset,
            meshes_offset,
            lamps_offset,
            scenes_offset,
        };

        let mut data = Vec::with_capacity(WorldRecord::SIZE + layout.cursor() as usize);
        record.write_to(&mut data)?;
        data.extend(layout.into_bytes());
        Ok(data)
    }

    /// Encode the complete container, header included
    pub fn to_bytes(&self, world: &World) -> Result<Vec<u8>> {
        write_container(WORLD_MAGIC, &self.encode_data(world)?)
    }

    /// Write the container to `path`, replacing any existing file
    pub fn write_file(&self, world: &World, path: &Path) -> Result<()> {
        let bytes = self.to_bytes(world)?;
        std::fs::write(path, &bytes)
            .map_err(Error::from)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), size = bytes.len(), "Wrote world '{}'", world.name);
        Ok(())
    }
}

/// Mesh payload: vertices, UV-map table, submesh table
fn encode_mesh(mesh: &Mesh, offset: u32) -> Result<(MeshRecord, Vec<u8>)> {
    let mut layout = Layout::new(offset);
    let vertices_offset = layout.place(encode_records(&mesh.vertices)?)?;

    let mut uv_maps = Table::<UvMapRecord>::new(layout.cursor(), mesh.uv_maps.len())?;
    for uv_map in &mesh.uv_maps {
        uv_maps.push(|uvs_offset| {
            let mut uvs = Vec::with_capacity(uv_map.uvs.len() * 8);
            for uv in &uv_map.uvs {
                write_vec2(&mut uvs, *uv)?;
            }
            let record = UvMapRecord {
                name: uv_map.name.clone(),
                uv_count: count(uv_map.uvs.len(), "uvs")?,
                uvs_offset,
            };
            Ok((record, uvs))
        })?;
    }
    let uv_maps_offset = layout.place(uv_maps.finish()?)?;

    let mut submeshes = Table::<SubmeshRecord>::new(layout.cursor(), mesh.submeshes.len())?;
    for submesh in &mesh.submeshes {
        submeshes.push(|indices_offset| {
            let mut indices = Vec::with_capacity(submesh.indices.len() * 4);
            for &index in &submesh.indices {
                indices.write_u32::<LittleEndian>(index)?;
            }
            let record = SubmeshRecord {
                material: submesh.material.clone(),
                index_count: count(submesh.indices.len(), "indices")?,
                indices_offset,
            };
            Ok((record, indices))
        })?;
    }
    let submeshes_offset = layout.place(submeshes.finish()?)?;

    debug!(
        mesh = %mesh.name,
        vertices = mesh.vertices.len(),
        uv_maps = mesh.uv_maps.len(),
        submeshes = mesh.submeshes.len(),
        "Encoded mesh"
    );

    let record = MeshRecord {
        name: mesh.name.clone(),
        active_uv_index: mesh.active_uv_index,
        vertex_count: count(mesh.vertices.len(), "vertices")?,
        uv_map_count: count(mesh.uv_maps.len(), "uv maps")?,
        submesh_count: count(mesh.submeshes.len(), "submeshes")?,
        vertices_offset,
        uv_maps_offset,
        submeshes_offset,
    };
    Ok((record, layout.into_bytes()))
}

fn encode_scene(scene: &Scene, nodes_offset: u32) -> Result<(SceneRecord, Vec<u8>)> {
    let record = SceneRecord {
        name: scene.name.clone(),
        camera: scene.camera.clone(),
        gravity: scene.gravity,
        node_count: count(scene.nodes.len(), "nodes")?,
        nodes_offset,
    };
    Ok((record, encode_records(&scene.nodes)?))
}

impl World {
    /// Encode the complete `.runner` container
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        WorldWriter::new().to_bytes(self)
    }
}
