//! Opaque scene pass.
//!
//! Clears the scene color and depth targets, then draws every renderable
//! whose material alpha is effectively one. Transparent entities are left
//! for the weighted-blended pass.

use std::collections::HashMap;

use crate::gfx::rendering::pipeline_manager::PipelineManager;
use crate::gfx::scene::mesh::DrawMesh;
use crate::gfx::scene::{Entity, World};

use super::EntityDraw;

pub const PIPELINE: &str = "opaque";

#[allow(clippy::too_many_arguments)]
pub fn record(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &mut PipelineManager,
    scene_color: &wgpu::TextureView,
    scene_depth: &wgpu::TextureView,
    frame_bind_group: &wgpu::BindGroup,
    lights_bind_group: &wgpu::BindGroup,
    world: &World,
    draws: &HashMap<Entity, EntityDraw>,
    clear_color: wgpu::Color,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Opaque Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: scene_color,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_color),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: scene_depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    if world.renderables().is_empty() {
        return;
    }
    let Some(pipeline) = pipelines.get_pipeline(PIPELINE) else {
        return;
    };
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, frame_bind_group, &[]);
    pass.set_bind_group(3, lights_bind_group, &[]);

    for &entity in world.renderables() {
        let Some(material) = world.material(entity) else {
            continue;
        };
        if !material.is_opaque() {
            continue;
        }
        let Some(mesh) = world.mesh(entity) else {
            continue;
        };
        let Some(draw) = draws.get(&entity) else {
            continue;
        };
        pass.set_bind_group(1, &draw.transform_bind_group, &[]);
        pass.set_bind_group(2, draw.material_bindings.bind_group(), &[]);
        pass.draw_mesh(&mesh.mesh);
    }
}
