//! Node and scene tables.
//!
//! glTF nodes are already addressed by index, so the parser's node index is
//! the node identity. Mesh references are rewritten into ranges of the
//! flattened mesh array, and the node graph is checked for cycles so the
//! recursive draw traversal always terminates.

use std::ops::Range;

use anyhow::{Context, ensure};

use crate::data_structures::{
    scene_graph::{Node, Scene},
    transform::Transform,
};

#[derive(Debug, Default)]
pub struct Hierarchy {
    pub nodes: Vec<Node>,
    pub scenes: Vec<Scene>,
    pub scene: Option<usize>,
}

/// Build nodes and scenes. `ranges` maps source mesh index to flattened range.
pub fn build_hierarchy(
    document: &gltf::Document,
    ranges: &[Range<usize>],
) -> anyhow::Result<Hierarchy> {
    let node_count = document.nodes().count();

    let mut nodes = Vec::with_capacity(node_count);
    for node in document.nodes() {
        // matrix-form nodes come back decomposed
        let (translation, rotation, scale) = node.transform().decomposed();
        let mut out = Node::new(Transform::from_decomposed(translation, rotation, scale));
        out.name = node.name().map(str::to_string);
        out.children = node.children().map(|child| child.index()).collect();
        if let Some(child) = out.children.iter().find(|&&child| child >= node_count) {
            anyhow::bail!("node {} references missing child {}", node.index(), child);
        }
        if let Some(mesh) = node.mesh() {
            let range = ranges
                .get(mesh.index())
                .with_context(|| format!("node {} references missing mesh {}", node.index(), mesh.index()))?;
            out.meshes = Some(range.clone());
        }
        nodes.push(out);
    }
    check_acyclic(&nodes)?;

    let mut scenes = Vec::new();
    for scene in document.scenes() {
        let roots: Vec<usize> = scene.nodes().map(|node| node.index()).collect();
        ensure!(
            roots.iter().all(|&root| root < node_count),
            "scene {} references a missing node",
            scene.index()
        );
        scenes.push(Scene {
            name: scene.name().map(str::to_string),
            nodes: roots,
        });
    }

    Ok(Hierarchy {
        nodes,
        scenes,
        scene: document.default_scene().map(|scene| scene.index()),
    })
}

/// Fail if any node can reach itself through its children.
///
/// Shared subtrees are fine; only back edges count.
pub fn check_acyclic(nodes: &[Node]) -> anyhow::Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::New; nodes.len()];
    for root in 0..nodes.len() {
        if marks[root] != Mark::New {
            continue;
        }
        // (node, next child to visit)
        let mut stack = vec![(root, 0)];
        marks[root] = Mark::OnStack;
        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            match nodes[node].children.get(*next) {
                Some(&child) => {
                    *next += 1;
                    match marks.get(child) {
                        Some(Mark::New) => {
                            marks[child] = Mark::OnStack;
                            stack.push((child, 0));
                        }
                        Some(Mark::OnStack) => {
                            anyhow::bail!("node graph has a cycle through nodes {} and {}", node, child)
                        }
                        Some(Mark::Done) => {}
                        None => anyhow::bail!("node {} references missing child {}", node, child),
                    }
                }
                None => {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }
    Ok(())
}
