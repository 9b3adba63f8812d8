//! Skybox pass.
//!
//! Runs after the opaque pass with depth writes off and a less-or-equal
//! compare, so the box only fills pixels the scene left at the far plane.
//! The cube is drawn at w == 0 in the shader, skipping when no skybox has
//! been uploaded.

use crate::gfx::rendering::pipeline_manager::PipelineManager;
use crate::gfx::scene::mesh::{DrawMesh, Mesh};

pub const PIPELINE: &str = "skybox";

pub fn record(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &mut PipelineManager,
    scene_color: &wgpu::TextureView,
    scene_depth: &wgpu::TextureView,
    frame_bind_group: &wgpu::BindGroup,
    skybox_bind_group: Option<&wgpu::BindGroup>,
    cube: &Mesh,
) {
    let Some(skybox_bind_group) = skybox_bind_group else {
        return;
    };

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Skybox Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: scene_color,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
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

    let Some(pipeline) = pipelines.get_pipeline(PIPELINE) else {
        return;
    };
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, frame_bind_group, &[]);
    pass.set_bind_group(1, skybox_bind_group, &[]);
    pass.draw_mesh(cube);
}
