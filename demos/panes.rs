//! Reference scene: tiled ground plane, four semi-transparent panes, and a
//! handful of scattered boxes under one light of each kind.
//!
//! Pass an OBJ path as the first argument to drop the model into the scene.
//!
//! Run with `cargo run --example panes`.

use anyhow::Context;
use cgmath::Vector3;

use gloam::app::{demo_world, scatter_crates};
use gloam::gfx::scene::components::{MaterialComponent, MeshComponent, TransformComponent};
use gloam::gfx::scene::mesh::Mesh;

fn main() -> anyhow::Result<()> {
    let mut app = gloam::default();

    *app.world_mut() = demo_world();
    scatter_crates(app.world_mut(), 12);

    if let Some(path) = std::env::args().nth(1) {
        let meshes = Mesh::load_obj(&path).with_context(|| format!("loading {path}"))?;
        let world = app.world_mut();
        for mesh in meshes {
            let entity = world.spawn();
            world.add_transform(entity, TransformComponent::at(Vector3::new(0.0, 0.0, 0.0)));
            world.add_mesh(entity, MeshComponent::new(mesh));
            world.add_material(entity, MaterialComponent::new([0.8, 0.8, 0.85, 1.0]));
        }
    }

    app.run();
    Ok(())
}
