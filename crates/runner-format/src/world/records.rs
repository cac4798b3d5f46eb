//! Fixed-size world records
//!
//! Records without a payload are implemented directly on the model types.
//! Mesh, UV-map, submesh, scene and world headers carry counts and offsets
//! into their payloads and get a record struct of their own.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use runner_core::{BoundingBox, Error, Result, Vec3};

use super::{
    BodyKind, Camera, CameraKind, Falloff, Lamp, LampKind, Material, Node, NodeKind, Physics, Shape, ShapeKind,
    Texture, TextureFilter, TextureWrap, Vertex,
};
use crate::traits::{read_mat4, read_name, read_vec3, write_mat4, write_name, write_vec3, Record};

fn read_enum<R: Read, T>(reader: &mut R, decode: fn(u32) -> Option<T>, what: &str) -> Result<T> {
    let value = reader.read_u32::<LittleEndian>()?;
    decode(value).ok_or_else(|| Error::invalid_data(format!("unknown {what} value {value:#x}")))
}

// ==== Headers with payloads ====

/// World record (112 bytes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldRecord {
    pub name: String,
    pub camera_count: u32,
    pub material_count: u32,
    pub texture_count: u32,
    pub mesh_count: u32,
    pub lamp_count: u32,
    pub scene_count: u32,
    pub cameras_offset: u32,
    pub materials_offset: u32,
    pub textures_offset: u32,
    pub meshes_offset: u32,
    pub lamps_offset: u32,
    pub scenes_offset: u32,
}

impl Record for WorldRecord {
    const SIZE: usize = 112;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        for value in [
            self.camera_count,
            self.material_count,
            self.texture_count,
            self.mesh_count,
            self.lamp_count,
            self.scene_count,
            self.cameras_offset,
            self.materials_offset,
            self.textures_offset,
            self.meshes_offset,
            self.lamps_offset,
            self.scenes_offset,
        ] {
            writer.write_u32::<LittleEndian>(value)?;
        }
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let name = read_name(reader)?;
        let mut v = [0u32; 12];
        reader.read_u32_into::<LittleEndian>(&mut v)?;
        Ok(Self {
            name,
            camera_count: v[0],
            material_count: v[1],
            texture_count: v[2],
            mesh_count: v[3],
            lamp_count: v[4],
            scene_count: v[5],
            cameras_offset: v[6],
            materials_offset: v[7],
            textures_offset: v[8],
            meshes_offset: v[9],
            lamps_offset: v[10],
            scenes_offset: v[11],
        })
    }
}

/// Mesh record (92 bytes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshRecord {
    pub name: String,
    pub active_uv_index: u32,
    pub vertex_count: u32,
    pub uv_map_count: u32,
    pub submesh_count: u32,
    pub vertices_offset: u32,
    pub uv_maps_offset: u32,
    pub submeshes_offset: u32,
}

impl Record for MeshRecord {
    const SIZE: usize = 92;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        writer.write_u32::<LittleEndian>(self.active_uv_index)?;
        writer.write_u32::<LittleEndian>(self.vertex_count)?;
        writer.write_u32::<LittleEndian>(self.uv_map_count)?;
        writer.write_u32::<LittleEndian>(self.submesh_count)?;
        writer.write_u32::<LittleEndian>(self.vertices_offset)?;
        writer.write_u32::<LittleEndian>(self.uv_maps_offset)?;
        writer.write_u32::<LittleEndian>(self.submeshes_offset)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            active_uv_index: reader.read_u32::<LittleEndian>()?,
            vertex_count: reader.read_u32::<LittleEndian>()?,
            uv_map_count: reader.read_u32::<LittleEndian>()?,
            submesh_count: reader.read_u32::<LittleEndian>()?,
            vertices_offset: reader.read_u32::<LittleEndian>()?,
            uv_maps_offset: reader.read_u32::<LittleEndian>()?,
            submeshes_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// UV map record (72 bytes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UvMapRecord {
    pub name: String,
    pub uv_count: u32,
    pub uvs_offset: u32,
}

impl Record for UvMapRecord {
    const SIZE: usize = 72;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        writer.write_u32::<LittleEndian>(self.uv_count)?;
        writer.write_u32::<LittleEndian>(self.uvs_offset)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            uv_count: reader.read_u32::<LittleEndian>()?,
            uvs_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Submesh record (72 bytes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmeshRecord {
    pub material: String,
    pub index_count: u32,
    pub indices_offset: u32,
}

impl Record for SubmeshRecord {
    const SIZE: usize = 72;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.material)?;
        writer.write_u32::<LittleEndian>(self.index_count)?;
        writer.write_u32::<LittleEndian>(self.indices_offset)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            material: read_name(reader)?,
            index_count: reader.read_u32::<LittleEndian>()?,
            indices_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Scene record (148 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
    pub name: String,
    pub camera: String,
    pub gravity: Vec3,
    pub node_count: u32,
    pub nodes_offset: u32,
}

impl Record for SceneRecord {
    const SIZE: usize = 148;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        write_name(writer, &self.camera)?;
        write_vec3(writer, self.gravity)?;
        writer.write_u32::<LittleEndian>(self.node_count)?;
        writer.write_u32::<LittleEndian>(self.nodes_offset)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            camera: read_name(reader)?,
            gravity: read_vec3(reader)?,
            node_count: reader.read_u32::<LittleEndian>()?,
            nodes_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

// ==== Plain records ====

impl Record for Camera {
    const SIZE: usize = 216;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        writer.write_u32::<LittleEndian>(self.kind.to_u32())?;
        writer.write_f32::<LittleEndian>(self.fovx)?;
        writer.write_f32::<LittleEndian>(self.fovy)?;
        writer.write_f32::<LittleEndian>(self.aspect)?;
        writer.write_f32::<LittleEndian>(self.znear)?;
        writer.write_f32::<LittleEndian>(self.zfar)?;
        write_mat4(writer, &self.view)?;
        write_mat4(writer, &self.projection)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            kind: read_enum(reader, CameraKind::from_u32, "camera type")?,
            fovx: reader.read_f32::<LittleEndian>()?,
            fovy: reader.read_f32::<LittleEndian>()?,
            aspect: reader.read_f32::<LittleEndian>()?,
            znear: reader.read_f32::<LittleEndian>()?,
            zfar: reader.read_f32::<LittleEndian>()?,
            view: read_mat4(reader)?,
            projection: read_mat4(reader)?,
        })
    }
}

impl Record for Material {
    const SIZE: usize = 220;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        write_name(writer, &self.shader)?;
        write_name(writer, &self.texture)?;
        write_vec3(writer, self.diffuse)?;
        write_vec3(writer, self.specular)?;
        writer.write_f32::<LittleEndian>(self.hardness)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            shader: read_name(reader)?,
            texture: read_name(reader)?,
            diffuse: read_vec3(reader)?,
            specular: read_vec3(reader)?,
            hardness: reader.read_f32::<LittleEndian>()?,
        })
    }
}

impl Record for Texture {
    const SIZE: usize = 144;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        write_name(writer, &self.path)?;
        writer.write_u32::<LittleEndian>(self.min_filter.to_u32())?;
        writer.write_u32::<LittleEndian>(self.mag_filter.to_u32())?;
        writer.write_u32::<LittleEndian>(self.wrap_s.to_u32())?;
        writer.write_u32::<LittleEndian>(self.wrap_t.to_u32())?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            path: read_name(reader)?,
            min_filter: read_enum(reader, TextureFilter::from_u32, "min filter")?,
            mag_filter: read_enum(reader, TextureFilter::from_u32, "mag filter")?,
            wrap_s: read_enum(reader, TextureWrap::from_u32, "wrap mode")?,
            wrap_t: read_enum(reader, TextureWrap::from_u32, "wrap mode")?,
        })
    }
}

impl Record for Vertex {
    const SIZE: usize = 24;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_vec3(writer, self.position)?;
        write_vec3(writer, self.normal)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            position: read_vec3(reader)?,
            normal: read_vec3(reader)?,
        })
    }
}

impl Record for Lamp {
    const SIZE: usize = 100;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        writer.write_u32::<LittleEndian>(self.kind.to_u32())?;
        writer.write_u32::<LittleEndian>(self.falloff.to_u32())?;
        writer.write_f32::<LittleEndian>(self.energy)?;
        writer.write_f32::<LittleEndian>(self.distance)?;
        writer.write_f32::<LittleEndian>(self.spot_size)?;
        writer.write_f32::<LittleEndian>(self.spot_blend)?;
        write_vec3(writer, self.color)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            kind: read_enum(reader, LampKind::from_u32, "lamp type")?,
            falloff: read_enum(reader, Falloff::from_u32, "falloff")?,
            energy: reader.read_f32::<LittleEndian>()?,
            distance: reader.read_f32::<LittleEndian>()?,
            spot_size: reader.read_f32::<LittleEndian>()?,
            spot_blend: reader.read_f32::<LittleEndian>()?,
            color: read_vec3(reader)?,
        })
    }
}

impl Record for Shape {
    const SIZE: usize = 24;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.kind.to_u32())?;
        writer.write_f32::<LittleEndian>(self.margin)?;
        writer.write_f32::<LittleEndian>(self.radius)?;
        write_vec3(writer, self.extents)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            kind: read_enum(reader, ShapeKind::from_u32, "shape type")?,
            margin: reader.read_f32::<LittleEndian>()?,
            radius: reader.read_f32::<LittleEndian>()?,
            extents: read_vec3(reader)?,
        })
    }
}

impl Record for Physics {
    const SIZE: usize = 84;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.body.to_u32())?;
        for value in [
            self.mass,
            self.friction,
            self.restitution,
            self.linear_damping,
            self.angular_damping,
            self.linear_sleeping_threshold,
            self.angular_sleeping_threshold,
            self.form_factor,
        ] {
            writer.write_f32::<LittleEndian>(value)?;
        }
        write_vec3(writer, self.linear_factor)?;
        write_vec3(writer, self.angular_factor)?;
        self.shape.write_to(writer)
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let body = read_enum(reader, BodyKind::from_u32, "body type")?;
        let mut f = [0f32; 8];
        reader.read_f32_into::<LittleEndian>(&mut f)?;
        Ok(Self {
            body,
            mass: f[0],
            friction: f[1],
            restitution: f[2],
            linear_damping: f[3],
            angular_damping: f[4],
            linear_sleeping_threshold: f[5],
            angular_sleeping_threshold: f[6],
            form_factor: f[7],
            linear_factor: read_vec3(reader)?,
            angular_factor: read_vec3(reader)?,
            shape: Shape::read_from(reader)?,
        })
    }
}

impl Record for Node {
    const SIZE: usize = 308;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_name(writer, &self.name)?;
        write_name(writer, &self.data)?;
        writer.write_u32::<LittleEndian>(self.kind.to_u32())?;
        write_mat4(writer, &self.transform)?;
        write_vec3(writer, self.bbox.min)?;
        write_vec3(writer, self.bbox.max)?;
        self.physics.write_to(writer)?;
        writer.write_i32::<LittleEndian>(self.parent_index)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name: read_name(reader)?,
            data: read_name(reader)?,
            kind: read_enum(reader, NodeKind::from_u32, "node type")?,
            transform: read_mat4(reader)?,
            bbox: BoundingBox {
                min: read_vec3(reader)?,
                max: read_vec3(reader)?,
            },
            physics: Physics::read_from(reader)?,
            parent_index: reader.read_i32::<LittleEndian>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner_core::Mat4x4;

    fn encoded_len<T: Record>(record: &T) -> usize {
        let mut out = Vec::new();
        record.write_to(&mut out).unwrap();
        out.len()
    }

    fn physics() -> Physics {
        Physics {
            body: BodyKind::RigidBody,
            mass: 2.0,
            friction: 0.5,
            restitution: 0.1,
            linear_damping: 0.04,
            angular_damping: 0.1,
            linear_sleeping_threshold: 0.8,
            angular_sleeping_threshold: 1.0,
            form_factor: 0.4,
            linear_factor: Vec3::ONE,
            angular_factor: Vec3::new(0.0, 0.0, 1.0),
            shape: Shape {
                kind: ShapeKind::Sphere,
                margin: 0.04,
                radius: 1.0,
                extents: Vec3::new(2.0, 2.0, 2.0),
            },
        }
    }

    #[test]
    fn test_encoded_sizes_match_declared_sizes() {
        let node = Node {
            name: "Cube".into(),
            data: "CubeMesh".into(),
            kind: NodeKind::Mesh,
            transform: Mat4x4::IDENTITY,
            bbox: BoundingBox::ZERO,
            physics: physics(),
            parent_index: -1,
        };
        let camera = Camera {
            name: "Camera".into(),
            kind: CameraKind::Perspective,
            fovx: 90.0,
            fovy: 0.8575,
            aspect: 800.0 / 480.0,
            znear: 0.1,
            zfar: 100.0,
            view: Mat4x4::IDENTITY,
            projection: Mat4x4::IDENTITY,
        };

        assert_eq!(encoded_len(&node), Node::SIZE);
        assert_eq!(encoded_len(&node.physics), Physics::SIZE);
        assert_eq!(encoded_len(&camera), Camera::SIZE);
        assert_eq!(encoded_len(&WorldRecord::default()), WorldRecord::SIZE);
        assert_eq!(encoded_len(&MeshRecord::default()), MeshRecord::SIZE);
        assert_eq!(encoded_len(&UvMapRecord::default()), UvMapRecord::SIZE);
        assert_eq!(encoded_len(&SubmeshRecord::default()), SubmeshRecord::SIZE);
    }

    #[test]
    fn test_node_parent_index_is_last_field() {
        let node = Node {
            name: "Child".into(),
            data: "Lamp".into(),
            kind: NodeKind::Lamp,
            transform: Mat4x4::IDENTITY,
            bbox: BoundingBox::ZERO,
            physics: physics(),
            parent_index: 3,
        };
        let mut out = Vec::new();
        node.write_to(&mut out).unwrap();

        assert_eq!(&out[304..308], &3i32.to_le_bytes());
        assert_eq!(&out[128..132], &2u32.to_le_bytes());
        let back = Node::read_from(&mut out.as_slice()).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let mut out = Vec::new();
        physics().shape.write_to(&mut out).unwrap();
        out[0] = 9;
        let err = Shape::read_from(&mut out.as_slice()).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn test_texture_record_uses_gl_enums() {
        let texture = Texture {
            name: "Tex".into(),
            path: "textures/tex.texture".into(),
            min_filter: TextureFilter::LinearMipmapLinear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::MirroredRepeat,
        };
        let mut out = Vec::new();
        texture.write_to(&mut out).unwrap();

        assert_eq!(out.len(), Texture::SIZE);
        assert_eq!(&out[128..132], &0x2703u32.to_le_bytes());
        assert_eq!(&out[140..144], &0x8370u32.to_le_bytes());
    }
}
