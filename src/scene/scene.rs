use crate::color::{self, Color};
use crate::light::Light;
use serde::{Deserialize, Serialize};

/// Linear fog between two distances from the camera.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    /// Fog color.
    pub color: Color,
    /// Distance at which fog starts.
    pub near: f32,
    /// Distance at which fog is opaque.
    pub far: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Fog {
            color: color::CHARCOAL,
            near: 1.0,
            far: 5000.0,
        }
    }
}

/// Helper drawing the X (red), Y (green) and Z (blue) axes from the origin.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxesHelper {
    /// Length of each axis line.
    pub size: f32,
}

impl Default for AxesHelper {
    fn default() -> Self {
        AxesHelper { size: 1000.0 }
    }
}

/// An element of the scene.
///
/// `M` is the engine's handle type for loaded models.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode<M> {
    /// A model produced by one of the engine's loaders.
    Model(M),
    /// A light source.
    Light(Light),
    /// An axes helper.
    Axes(AxesHelper),
}

/// The top-level scene container.
///
/// Nodes are append-only while the viewer is alive, so the render loop can
/// keep drawing while assets are attached mid-frame. [`Scene::clear`] empties
/// the scene on teardown.
#[derive(Clone, Debug)]
pub struct Scene<M> {
    /// Name of the scene, for debugging.
    pub name: String,
    /// Clear color.
    pub background: Color,
    /// Optional fog.
    pub fog: Option<Fog>,
    nodes: Vec<SceneNode<M>>,
}

impl<M> Default for Scene<M> {
    fn default() -> Self {
        Scene {
            name: String::from("Fz3dScene"),
            background: color::CHARCOAL,
            fog: Some(Fog::default()),
            nodes: Vec::new(),
        }
    }
}

impl<M> Scene<M> {
    /// Creates an empty scene with the default background and fog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    pub fn add(&mut self, node: SceneNode<M>) {
        self.nodes.push(node);
    }

    /// Appends a model.
    pub fn add_model(&mut self, model: M) {
        self.add(SceneNode::Model(model));
    }

    /// Appends a light.
    pub fn add_light(&mut self, light: Light) {
        self.add(SceneNode::Light(light));
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[SceneNode<M>] {
        &self.nodes
    }

    /// Iterates over the models of the scene.
    pub fn models(&self) -> impl Iterator<Item = &M> {
        self.nodes.iter().filter_map(|node| match node {
            SceneNode::Model(model) => Some(model),
            _ => None,
        })
    }

    /// Iterates over the lights of the scene.
    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.nodes.iter().filter_map(|node| match node {
            SceneNode::Light(light) => Some(light),
            _ => None,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes and returns every node.
    pub fn clear(&mut self) -> Vec<SceneNode<M>> {
        std::mem::take(&mut self.nodes)
    }
}
