/// Scene nodes and per-draw matrix composition
use crate::builder::{MeshBuilder, MeshData};
use crate::error::Result;
use crate::layout::{AttributeLayout, ScalarType, Semantics, VertexLayout};
use crate::matrix::Mat4;
use crate::projection::Camera;
use crate::quaternion::Quaternion;
use crate::transform::Transform;
use crate::vector::Vec3;

/// Named transform with optional finished buffers
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<MeshData>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            mesh: None,
        }
    }

    pub fn with_mesh(mut self, mesh: MeshData) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.transform.position = Vec3::new(x, y, z);
    }

    pub fn set_quaternion(&mut self, x: f32, y: f32, z: f32, w: f32) {
        self.transform.rotation = Quaternion::new(x, y, z, w);
    }
}

/// Matrices for drawing one node: `model * view * projection`
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub view: Mat4,
    pub projection: Mat4,
    pub light_dir: Vec3,
    model: Mat4,
}

impl RenderContext {
    pub fn new(camera: &Camera, light_dir: Vec3) -> Self {
        Self {
            view: camera.view(),
            projection: camera.projection(),
            light_dir,
            model: Mat4::identity(),
        }
    }

    pub fn set_model(&mut self, transform: &Transform) {
        self.model = transform.to_mat4();
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn model_view(&self) -> Mat4 {
        self.model * self.view
    }

    pub fn mvp(&self) -> Mat4 {
        Transform::mvp_matrix(&self.model, &self.view, &self.projection)
    }
}

/// Position f32x3, normal f32x3, color f32x4, texcoord f32x2
pub fn gizmo_layout() -> Result<VertexLayout> {
    VertexLayout::new(vec![
        AttributeLayout::new(Semantics::Position, ScalarType::F32, 3),
        AttributeLayout::new(Semantics::Normal, ScalarType::F32, 3),
        AttributeLayout::new(Semantics::Color, ScalarType::F32, 4),
        AttributeLayout::new(Semantics::TexCoord, ScalarType::F32, 2),
    ])
}

/// Gizmos (axis, grid), camera, light and the loaded model nodes
#[derive(Debug, Clone)]
pub struct Scene {
    pub gizmos: Vec<Node>,
    pub nodes: Vec<Node>,
    pub camera: Camera,
    pub light_dir: Vec3,
}

impl Scene {
    /// Direction the scene light travels, `normalize(1, -3, 10)`
    pub fn default_light_dir() -> Vec3 {
        Vec3::new(1.0, -3.0, 10.0).normalized()
    }

    pub fn new() -> Result<Self> {
        let mut axis = MeshBuilder::new(gizmo_layout()?)?;
        axis.create_axis(5.0);
        let mut axis_node = Node::new("axis").with_mesh(axis.finish());
        // lifted so the axis is not hidden by the grid
        axis_node.set_position(0.0, 0.001, 0.0);

        let mut grid = MeshBuilder::new(gizmo_layout()?)?;
        grid.create_grid(1.0, 5);
        let grid_node = Node::new("grid").with_mesh(grid.finish());

        Ok(Self {
            gizmos: vec![axis_node, grid_node, Node::new("camera"), Node::new("light")],
            nodes: Vec::new(),
            camera: Camera::default(),
            light_dir: Self::default_light_dir(),
        })
    }

    /// Replace the loaded nodes with a single mesh node
    pub fn add_mesh(&mut self, name: impl Into<String>, mesh: MeshData) {
        self.nodes.clear();
        self.nodes.push(Node::new(name).with_mesh(mesh));
    }

    /// Gizmos then nodes, each with its render context
    pub fn draw_list(&self) -> Vec<(&Node, RenderContext)> {
        let mut context = RenderContext::new(&self.camera, self.light_dir);
        self.gizmos
            .iter()
            .chain(self.nodes.iter())
            .filter(|node| node.mesh.is_some())
            .map(|node| {
                context.set_model(&node.transform);
                (node, context)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Topology;

    #[test]
    fn test_scene_gizmos() {
        let scene = Scene::new().unwrap();
        let names: Vec<&str> = scene.gizmos.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["axis", "grid", "camera", "light"]);

        let axis = scene.gizmos[0].mesh.as_ref().unwrap();
        assert_eq!(axis.topology, Topology::Line);
        assert_eq!(axis.vertex_count, 6);
        assert_eq!(axis.stride(), 48);
        assert_eq!(scene.gizmos[0].transform.position, Vec3::new(0.0, 0.001, 0.0));

        let grid = scene.gizmos[1].mesh.as_ref().unwrap();
        assert_eq!(grid.vertex_count, 44);
        assert!((scene.light_dir.norm() - 1.0).abs() < 1e-6);
        assert_eq!(scene.light_dir, Scene::default_light_dir());
        let l = Scene::default_light_dir() * 110.0f32.sqrt();
        assert!((l - Vec3::new(1.0, -3.0, 10.0)).norm() < 1e-4);
    }

    #[test]
    fn test_add_mesh_replaces_nodes() {
        let mut scene = Scene::new().unwrap();
        let mut builder = MeshBuilder::new(gizmo_layout().unwrap()).unwrap();
        builder.create_cube(1.0);
        scene.add_mesh("first", builder.clone().finish());
        scene.add_mesh("second", builder.finish());
        assert_eq!(scene.nodes.len(), 1);
        assert_eq!(scene.nodes[0].name, "second");
        // axis, grid, cube
        assert_eq!(scene.draw_list().len(), 3);
    }

    #[test]
    fn test_render_context_composition() {
        let mut camera = Camera::default();
        camera.resize(640, 480);
        let mut context = RenderContext::new(&camera, Vec3::new(0.0, 0.0, 1.0));
        let mut node = Node::new("n");
        node.set_position(1.0, 2.0, 3.0);
        context.set_model(&node.transform);

        let p = Vec3::new(0.5, 0.0, 0.0);
        let expected = camera.view().apply(p + Vec3::new(1.0, 2.0, 3.0));
        assert!((context.model_view().apply(p) - expected).norm() < 1e-5);
        assert_eq!(
            context.mvp(),
            context.model() * camera.view() * camera.projection()
        );
    }

    #[test]
    fn test_set_quaternion() {
        let mut node = Node::new("n");
        node.set_quaternion(0.0, 0.0, 0.0, 1.0);
        assert_eq!(node.transform.to_mat4(), Mat4::identity());
    }
}
