//! Scene document checks
//!
//! Everything the exporter later looks up by name is resolved here first, so
//! assembly itself cannot fail on a dangling reference. The first problem
//! found is returned.

use std::collections::{HashMap, HashSet};

use runner_core::{Error, Result};

use super::input::{MeshData, ObjectKind, SceneDocument};
use super::nodes::flatten;

fn names<'a, T>(items: &'a [T], name: impl Fn(&'a T) -> &'a str) -> HashSet<&'a str> {
    items.iter().map(name).collect()
}

pub fn validate(doc: &SceneDocument) -> Result<()> {
    let textures = names(&doc.textures, |t| t.name.as_str());
    let materials = names(&doc.materials, |m| m.name.as_str());
    let meshes = names(&doc.meshes, |m| m.name.as_str());
    let cameras = names(&doc.cameras, |c| c.name.as_str());
    let lamps = names(&doc.lamps, |l| l.name.as_str());

    for material in &doc.materials {
        if material.shader.as_deref().map_or(true, str::is_empty) {
            return Err(Error::missing_field(format!("material '{}' shader", material.name)));
        }
        for texture in material.texture_slots.iter().flatten() {
            if !textures.contains(texture.as_str()) {
                return Err(Error::invalid_reference(format!(
                    "material '{}' texture '{}'",
                    material.name, texture
                )));
            }
        }
    }

    for texture in &doc.textures {
        if texture.image.as_deref().map_or(true, str::is_empty) {
            return Err(Error::missing_field(format!("texture '{}' image", texture.name)));
        }
    }

    for mesh in &doc.meshes {
        validate_mesh(mesh, &materials).map_err(|e| e.with_context(format!("mesh '{}'", mesh.name)))?;
    }

    let mut objects = HashMap::with_capacity(doc.objects.len());
    for object in &doc.objects {
        if objects.insert(object.name.as_str(), object).is_some() {
            return Err(Error::invalid_data(format!("duplicate object name '{}'", object.name)));
        }
    }

    for object in &doc.objects {
        let known = match object.kind {
            ObjectKind::Mesh => &meshes,
            ObjectKind::Camera => &cameras,
            ObjectKind::Lamp => &lamps,
            ObjectKind::Unsupported => continue,
        };
        let data = object
            .data
            .as_deref()
            .ok_or_else(|| Error::missing_field(format!("object '{}' data", object.name)))?;
        if !known.contains(data) {
            return Err(Error::invalid_reference(format!(
                "object '{}' data '{}'",
                object.name, data
            )));
        }
    }

    for object in &doc.objects {
        let mut seen = HashSet::from([object.name.as_str()]);
        let mut current = object;
        while let Some(parent) = current.parent.as_deref() {
            current = objects.get(parent).copied().ok_or_else(|| {
                Error::invalid_reference(format!("object '{}' parent '{}'", current.name, parent))
            })?;
            if !seen.insert(parent) {
                return Err(Error::invalid_data(format!(
                    "object '{}' is its own ancestor",
                    object.name
                )));
            }
        }
    }

    for scene in &doc.scenes {
        for name in &scene.objects {
            if !objects.contains_key(name.as_str()) {
                return Err(Error::invalid_reference(format!("scene '{}' object '{}'", scene.name, name)));
            }
        }
        if let Some(camera) = scene.camera.as_deref() {
            match objects.get(camera) {
                Some(object) if object.kind == ObjectKind::Camera => {
                    // the camera must survive flattening to be referenced by the scene
                    if !flatten(doc, scene).iter().any(|node| node.object.name == camera) {
                        return Err(Error::invalid_reference(format!(
                            "scene '{}' camera '{}' is not a node of the scene",
                            scene.name, camera
                        )));
                    }
                }
                Some(_) => {
                    return Err(Error::invalid_reference(format!(
                        "scene '{}' camera '{}' is not a camera object",
                        scene.name, camera
                    )))
                }
                None => {
                    return Err(Error::invalid_reference(format!(
                        "scene '{}' camera '{}'",
                        scene.name, camera
                    )))
                }
            }
        }
    }

    Ok(())
}

fn validate_mesh(mesh: &MeshData, materials: &HashSet<&str>) -> Result<()> {
    for material in mesh.materials.iter().flatten() {
        if !materials.contains(material.as_str()) {
            return Err(Error::invalid_reference(format!("material '{material}'")));
        }
    }

    let vertex_count = mesh.vertices.len();
    let slot_count = mesh.materials.len().max(1);
    for (index, face) in mesh.faces.iter().enumerate() {
        if let Some(&bad) = face.vertices.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(Error::invalid_data(format!(
                "face {index} uses vertex {bad} of {vertex_count}"
            )));
        }
        if face.material_index as usize >= slot_count {
            return Err(Error::invalid_data(format!(
                "face {index} uses material slot {} of {}",
                face.material_index,
                mesh.materials.len()
            )));
        }
    }

    let corners = mesh.corner_count();
    for layer in &mesh.uv_layers {
        if layer.uvs.len() != corners {
            return Err(Error::invalid_data(format!(
                "uv layer '{}' has {} entries for {} face corners",
                layer.name,
                layer.uvs.len(),
                corners
            )));
        }
    }

    if !mesh.uv_layers.is_empty() && mesh.active_uv_index as usize >= mesh.uv_layers.len() {
        return Err(Error::invalid_data(format!(
            "active uv index {} of {} layers",
            mesh.active_uv_index,
            mesh.uv_layers.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> SceneDocument {
        SceneDocument::from_json_str(json).unwrap()
    }

    const MESH: &str = r#"{"name": "Quad",
        "vertices": [{"co": [0,0,0], "normal": [0,0,1]}, {"co": [1,0,0], "normal": [0,0,1]},
                     {"co": [1,1,0], "normal": [0,0,1]}, {"co": [0,1,0], "normal": [0,0,1]}],
        "faces": [{"vertices": [0,1,2,3], "normal": [0,0,1]}],
        "materials": ["Mat"]}"#;

    #[test]
    fn test_valid_document() {
        let doc = doc(&format!(
            r#"{{"materials": [{{"name": "Mat", "shader": "shaders/plain"}}],
                "meshes": [{MESH}],
                "objects": [{{"name": "Quad", "type": "MESH", "data": "Quad"}},
                            {{"name": "Helper", "type": "EMPTY", "parent": "Quad"}}],
                "scenes": [{{"name": "Scene", "objects": ["Quad", "Helper"]}}]}}"#
        ));
        validate(&doc).unwrap();
    }

    #[test]
    fn test_material_without_shader() {
        let err = validate(&doc(r#"{"materials": [{"name": "Mat"}]}"#)).unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_texture_slot_must_exist() {
        let err = validate(&doc(
            r#"{"materials": [{"name": "Mat", "shader": "s", "texture_slots": [null, "Grass"]}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_mesh_slot_material_must_exist() {
        let err = validate(&doc(&format!(r#"{{"meshes": [{MESH}]}}"#))).unwrap_err();
        assert!(err.is_scene_error());
        assert!(err.to_string().contains("Quad"));
    }

    #[test]
    fn test_face_vertex_out_of_range() {
        let mesh = MESH.replace("[0,1,2,3]", "[0,1,7]");
        let err = validate(&doc(&format!(
            r#"{{"materials": [{{"name": "Mat", "shader": "s"}}], "meshes": [{mesh}]}}"#
        )))
        .unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_uv_layer_needs_one_entry_per_corner() {
        let mesh = MESH.replace(
            r#""materials": ["Mat"]"#,
            r#""materials": ["Mat"], "uv_layers": [{"name": "UV", "uvs": [[0,0],[1,0],[1,1]]}]"#,
        );
        let err = validate(&doc(&format!(
            r#"{{"materials": [{{"name": "Mat", "shader": "s"}}], "meshes": [{mesh}]}}"#
        )))
        .unwrap_err();
        assert!(err.to_string().contains("4 face corners"));
    }

    #[test]
    fn test_object_data_kind_must_match() {
        let err = validate(&doc(
            r#"{"cameras": [{"name": "Cam"}],
                "objects": [{"name": "Thing", "type": "LAMP", "data": "Cam"}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_parent_cycle_detected() {
        let err = validate(&doc(
            r#"{"objects": [{"name": "A", "type": "EMPTY", "parent": "B"},
                            {"name": "B", "type": "EMPTY", "parent": "A"}]}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("own ancestor"));
    }

    #[test]
    fn test_missing_parent() {
        let err = validate(&doc(r#"{"objects": [{"name": "A", "type": "EMPTY", "parent": "Ghost"}]}"#)).unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_scene_camera_must_be_camera_object() {
        let err = validate(&doc(
            r#"{"objects": [{"name": "A", "type": "EMPTY"}],
                "scenes": [{"name": "S", "camera": "A", "objects": ["A"]}]}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("not a camera"));
    }

    #[test]
    fn test_scene_camera_must_be_in_scene() {
        let err = validate(&doc(
            r#"{"cameras": [{"name": "C"}],
                "objects": [{"name": "Cam", "type": "CAMERA", "data": "C"}],
                "scenes": [{"name": "S", "camera": "Cam", "objects": []}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
        assert!(err.to_string().contains("not a node"));
    }

    #[test]
    fn test_scene_camera_under_unsupported_parent() {
        let err = validate(&doc(
            r#"{"cameras": [{"name": "C"}],
                "objects": [{"name": "Rig", "type": "EMPTY"},
                            {"name": "Cam", "type": "CAMERA", "data": "C", "parent": "Rig"}],
                "scenes": [{"name": "S", "camera": "Cam", "objects": ["Rig", "Cam"]}]}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("not a node"));
    }

    #[test]
    fn test_scene_camera_as_child_node() {
        let doc = doc(
            r#"{"cameras": [{"name": "C"}],
                "lamps": [{"name": "L", "type": "POINT"}],
                "objects": [{"name": "Light", "type": "LAMP", "data": "L"},
                            {"name": "Cam", "type": "CAMERA", "data": "C", "parent": "Light"}],
                "scenes": [{"name": "S", "camera": "Cam", "objects": ["Light", "Cam"]}]}"#,
        );
        validate(&doc).unwrap();
    }
}
