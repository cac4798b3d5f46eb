//! Mesh conversion: fan triangulation, vertex deduplication, submeshes
//!
//! A corner becomes a vertex of position, normal and one coordinate per UV
//! layer. Corners whose components all lie within `epsilon` of an existing
//! vertex reuse its index. Triangles are then grouped by material slot.

use runner_core::{Vec2, Vec3};
use runner_format::world::{Mesh, Submesh, UvMap, Vertex};
use tracing::{debug, warn};

use super::input::{Face, MeshData};

fn close(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

fn close3(a: Vec3, b: Vec3, epsilon: f32) -> bool {
    close(a.x, b.x, epsilon) && close(a.y, b.y, epsilon) && close(a.z, b.z, epsilon)
}

fn close2(a: Vec2, b: Vec2, epsilon: f32) -> bool {
    close(a.x, b.x, epsilon) && close(a.y, b.y, epsilon)
}

/// Accumulates unique corners
#[derive(Debug)]
pub struct MeshBuilder {
    epsilon: f32,
    vertices: Vec<Vertex>,
    /// One column per UV layer, index-aligned with `vertices`
    uvs: Vec<Vec<Vec2>>,
}

impl MeshBuilder {
    pub fn new(layer_count: usize, epsilon: f32) -> Self {
        Self {
            epsilon,
            vertices: Vec::new(),
            uvs: vec![Vec::new(); layer_count],
        }
    }

    /// Index of an equal vertex, appending one when none matches.
    /// `uvs` holds one coordinate per layer.
    pub fn add(&mut self, vertex: Vertex, uvs: &[Vec2]) -> u32 {
        let eps = self.epsilon;
        let found = self.vertices.iter().enumerate().position(|(i, v)| {
            close3(v.position, vertex.position, eps)
                && close3(v.normal, vertex.normal, eps)
                && self.uvs.iter().zip(uvs).all(|(column, uv)| close2(column[i], *uv, eps))
        });

        match found {
            Some(index) => index as u32,
            None => {
                self.vertices.push(vertex);
                for (column, uv) in self.uvs.iter_mut().zip(uvs) {
                    column.push(*uv);
                }
                (self.vertices.len() - 1) as u32
            }
        }
    }

    pub fn into_parts(self) -> (Vec<Vertex>, Vec<Vec<Vec2>>) {
        (self.vertices, self.uvs)
    }
}

/// Convert a validated mesh datablock
pub fn build_mesh(data: &MeshData, epsilon: f32) -> Mesh {
    let mut builder = MeshBuilder::new(data.uv_layers.len(), epsilon);
    // (material slot, index) per triangle corner
    let mut triangles: Vec<(u32, u32)> = Vec::new();

    let mut corner_base = 0;
    for (face_index, face) in data.faces.iter().enumerate() {
        let corners = face.vertices.len();
        if corners < 3 {
            warn!(mesh = %data.name, face = face_index, corners, "Skipping degenerate face");
            corner_base += corners;
            continue;
        }

        let indices: Vec<u32> = (0..corners)
            .map(|corner| {
                let (vertex, uvs) = corner_vertex(data, face, corner_base + corner, face.vertices[corner]);
                builder.add(vertex, &uvs)
            })
            .collect();

        for i in 1..corners - 1 {
            for index in [indices[0], indices[i], indices[i + 1]] {
                triangles.push((face.material_index, index));
            }
        }
        corner_base += corners;
    }

    let mut submeshes = Vec::new();
    for (slot, material) in data.materials.iter().enumerate() {
        let indices: Vec<u32> = triangles
            .iter()
            .filter(|(s, _)| *s as usize == slot)
            .map(|&(_, index)| index)
            .collect();
        if indices.is_empty() {
            continue;
        }
        match material {
            Some(material) => submeshes.push(Submesh {
                material: material.clone(),
                indices,
            }),
            None => warn!(mesh = %data.name, slot, triangles = indices.len() / 3, "Dropping triangles of empty slot"),
        }
    }
    if data.materials.is_empty() && !triangles.is_empty() {
        warn!(mesh = %data.name, "Mesh has no material slots, no submesh written");
    }

    let (vertices, columns) = builder.into_parts();
    let uv_maps = data
        .uv_layers
        .iter()
        .zip(columns)
        .map(|(layer, uvs)| UvMap {
            name: layer.name.clone(),
            uvs,
        })
        .collect();

    debug!(
        mesh = %data.name,
        corners = data.corner_count(),
        vertices = vertices.len(),
        submeshes = submeshes.len(),
        "Built mesh"
    );

    Mesh {
        name: data.name.clone(),
        active_uv_index: data.active_uv_index,
        vertices,
        uv_maps,
        submeshes,
    }
}

fn corner_vertex(data: &MeshData, face: &Face, corner: usize, vertex_index: u32) -> (Vertex, Vec<Vec2>) {
    let source = &data.vertices[vertex_index as usize];
    let normal = if face.use_smooth { source.normal } else { face.normal };
    let uvs = data.uv_layers.iter().map(|layer| layer.uvs[corner]).collect();
    (
        Vertex {
            position: source.co,
            normal,
        },
        uvs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EPSILON;
    use crate::scene::input::{MeshVertex, UvLayer};

    fn vertex(x: f32, y: f32) -> MeshVertex {
        MeshVertex {
            co: Vec3::new(x, y, 0.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    fn face(vertices: &[u32], material_index: u32) -> Face {
        Face {
            vertices: vertices.to_vec(),
            normal: Vec3::new(0.0, 0.0, 1.0),
            use_smooth: false,
            material_index,
        }
    }

    fn quad() -> MeshData {
        MeshData {
            name: "Quad".to_string(),
            vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(1.0, 1.0), vertex(0.0, 1.0)],
            faces: vec![face(&[0, 1, 2, 3], 0)],
            materials: vec![Some("Mat".to_string())],
            uv_layers: Vec::new(),
            active_uv_index: 0,
        }
    }

    #[test]
    fn test_quad_fan_triangulation() {
        let mesh = build_mesh(&quad(), DEFAULT_EPSILON);

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.submeshes.len(), 1);
        assert_eq!(mesh.submeshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_shared_corners_deduplicated() {
        let mut data = quad();
        data.faces = vec![face(&[0, 1, 2], 0), face(&[0, 2, 3], 0)];
        let mesh = build_mesh(&data, DEFAULT_EPSILON);

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.submeshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_near_equal_positions_merge() {
        let mut builder = MeshBuilder::new(0, DEFAULT_EPSILON);
        let a = Vertex {
            position: Vec3::new(1.0, 2.0, 3.0),
            normal: Vec3::new(0.0, 1.0, 0.0),
        };
        let b = Vertex {
            position: Vec3::new(1.00005, 2.0, 3.0),
            ..a
        };
        let c = Vertex {
            position: Vec3::new(1.001, 2.0, 3.0),
            ..a
        };

        assert_eq!(builder.add(a, &[]), 0);
        assert_eq!(builder.add(b, &[]), 0);
        assert_eq!(builder.add(c, &[]), 1);
    }

    #[test]
    fn test_uv_seam_splits_vertex() {
        let mut data = quad();
        data.faces = vec![face(&[0, 1, 2], 0), face(&[0, 2, 3], 0)];
        data.uv_layers = vec![UvLayer {
            name: "UVMap".to_string(),
            // corner 0 of the second face disagrees with corner 0 of the first
            uvs: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.5, 0.5),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
        }];
        let mesh = build_mesh(&data, DEFAULT_EPSILON);

        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.uv_maps[0].uvs.len(), 5);
        assert_eq!(mesh.submeshes[0].indices, vec![0, 1, 2, 3, 2, 4]);
    }

    #[test]
    fn test_flat_faces_use_face_normal() {
        let mut data = quad();
        data.faces = vec![face(&[0, 1, 2], 0), face(&[0, 2, 3], 0)];
        data.faces[1].normal = Vec3::new(0.0, 1.0, 0.0);
        let mesh = build_mesh(&data, DEFAULT_EPSILON);
        // second face cannot share corners with the first
        assert_eq!(mesh.vertices.len(), 6);

        data.faces[1].use_smooth = true;
        data.faces[0].use_smooth = true;
        let mesh = build_mesh(&data, DEFAULT_EPSILON);
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn test_submeshes_follow_slot_order_and_skip_empty() {
        let mut data = quad();
        data.materials = vec![Some("A".to_string()), Some("Unused".to_string()), Some("B".to_string())];
        data.faces = vec![face(&[0, 1, 2], 2), face(&[0, 2, 3], 0)];
        let mesh = build_mesh(&data, DEFAULT_EPSILON);

        let names: Vec<&str> = mesh.submeshes.iter().map(|s| s.material.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(mesh.submeshes[0].indices, vec![0, 2, 3]);
        assert_eq!(mesh.submeshes[1].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_degenerate_face_skipped() {
        let mut data = quad();
        data.faces = vec![face(&[0, 1], 0), face(&[0, 1, 2], 0)];
        let mesh = build_mesh(&data, DEFAULT_EPSILON);

        assert_eq!(mesh.submeshes[0].indices, vec![0, 1, 2]);
    }
}
