//! Weighted-blended order-independent transparency.
//!
//! Transparent surfaces accumulate premultiplied, depth-weighted color into
//! a float target while a second target tracks how much of the background
//! remains visible. A fullscreen composite then resolves both over the
//! scene color. Neither pass writes depth; the opaque depth buffer still
//! rejects hidden fragments.

use std::collections::HashMap;

use crate::gfx::rendering::pipeline_manager::PipelineManager;
use crate::gfx::scene::mesh::DrawMesh;
use crate::gfx::scene::{Entity, World};

use super::EntityDraw;

pub const TRANSPARENT_PIPELINE: &str = "oit";
pub const COMPOSITE_PIPELINE: &str = "composite";

pub const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const REVEAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Both color and weight sum additively.
pub const ACCUMULATION_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Multiplies the stored revealage by one minus the fragment alpha.
pub const REVEAL_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::OneMinusSrc,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Standard over blend for the fullscreen resolve.
pub const COMPOSITE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

#[allow(clippy::too_many_arguments)]
pub fn record(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &mut PipelineManager,
    scene_color: &wgpu::TextureView,
    scene_depth: &wgpu::TextureView,
    accumulation: &wgpu::TextureView,
    reveal: &wgpu::TextureView,
    frame_bind_group: &wgpu::BindGroup,
    lights_bind_group: &wgpu::BindGroup,
    composite_bind_group: &wgpu::BindGroup,
    world: &World,
    draws: &HashMap<Entity, EntityDraw>,
) {
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Transparent Pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: accumulation,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: reveal,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: scene_depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(pipeline) = pipelines.get_pipeline(TRANSPARENT_PIPELINE) {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, frame_bind_group, &[]);
            pass.set_bind_group(3, lights_bind_group, &[]);

            for &entity in world.renderables() {
                let Some(material) = world.material(entity) else {
                    continue;
                };
                if material.is_opaque() {
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
    }

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Composite Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: scene_color,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    let Some(pipeline) = pipelines.get_pipeline(COMPOSITE_PIPELINE) else {
        return;
    };
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, composite_bind_group, &[]);
    pass.draw(0..3, 0..1);
}
