/// Example: print the axis and grid gizmo buffers of a fresh scene
///
/// Usage: cargo run --example gizmos
use vbokit_core::Scene;

fn main() -> vbokit_core::Result<()> {
    env_logger::init();

    let mut scene = Scene::new()?;
    scene.camera.resize(800, 600);

    for (node, context) in scene.draw_list() {
        let Some(mesh) = &node.mesh else { continue };
        println!(
            "{}: {:?}, {} vertices, stride {} ({}), {} indices",
            node.name,
            mesh.topology,
            mesh.vertex_count,
            mesh.stride(),
            mesh.layout.pack_format(),
            mesh.indices.len()
        );
        println!("  layout: {}", mesh.layout);
        println!("  mvp (column-major): {:?}", context.mvp().to_column_major());
    }
    Ok(())
}
