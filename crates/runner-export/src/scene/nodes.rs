//! Scene-node flattening
//!
//! Nodes are stored in one array where every parent precedes its children.
//! Roots (supported objects without a parent) come first with parent `-1`,
//! then, walking the array from the start, each node's supported children
//! are appended with that node's index. Objects of other kinds are dropped
//! together with everything below them.

use std::collections::{HashMap, HashSet};

use runner_format::world::NodeKind;
use tracing::debug;

use super::input::{ObjectData, SceneData, SceneDocument};

/// An object placed in the node array
#[derive(Debug, Clone, Copy)]
pub struct FlatNode<'a> {
    pub object: &'a ObjectData,
    pub kind: NodeKind,
    /// Index of the parent in the same array, -1 for roots
    pub parent_index: i32,
}

pub fn flatten<'a>(doc: &'a SceneDocument, scene: &SceneData) -> Vec<FlatNode<'a>> {
    let members: HashSet<&str> = scene.objects.iter().map(String::as_str).collect();

    let mut children: HashMap<&str, Vec<&ObjectData>> = HashMap::new();
    for object in &doc.objects {
        if let Some(parent) = object.parent.as_deref() {
            if members.contains(object.name.as_str()) {
                children.entry(parent).or_default().push(object);
            }
        }
    }

    let mut nodes: Vec<FlatNode<'a>> = Vec::new();
    let mut placed = HashSet::new();
    for name in &scene.objects {
        let Some(object) = doc.object(name) else { continue };
        if object.parent.is_some() || !placed.insert(object.name.as_str()) {
            continue;
        }
        match object.kind.node_kind() {
            Some(kind) => nodes.push(FlatNode {
                object,
                kind,
                parent_index: -1,
            }),
            None => debug!(object = %object.name, "Skipping unsupported root"),
        }
    }

    let mut next = 0;
    while next < nodes.len() {
        let parent = nodes[next].object;
        for &child in children.get(parent.name.as_str()).into_iter().flatten() {
            match child.kind.node_kind() {
                Some(kind) if placed.insert(child.name.as_str()) => nodes.push(FlatNode {
                    object: child,
                    kind,
                    parent_index: next as i32,
                }),
                Some(_) => {}
                None => debug!(object = %child.name, parent = %parent.name, "Skipping unsupported subtree"),
            }
        }
        next += 1;
    }

    nodes
}
