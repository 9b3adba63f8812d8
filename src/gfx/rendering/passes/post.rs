//! Gamma post pass.
//!
//! Resolves the linear scene color to the swapchain with a fullscreen
//! triangle, applying the configured gamma on the way out. The surface
//! format is non-sRGB, so this is the only place the correction happens.

use crate::gfx::rendering::pipeline_manager::PipelineManager;

pub const PIPELINE: &str = "gamma";

/// Bind group 0 of the gamma shader; only `x` is read, the rest is padding
/// to the uniform block size.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostSettingsUniform {
    pub gamma: [f32; 4],
}

impl PostSettingsUniform {
    pub fn new(gamma: f32) -> Self {
        PostSettingsUniform {
            gamma: [gamma, 0.0, 0.0, 0.0],
        }
    }
}

pub fn record(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &mut PipelineManager,
    surface_view: &wgpu::TextureView,
    post_bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Gamma Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: surface_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    let Some(pipeline) = pipelines.get_pipeline(PIPELINE) else {
        return;
    };
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, post_bind_group, &[]);
    pass.draw(0..3, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_settings_is_16_bytes() {
        assert_eq!(std::mem::size_of::<PostSettingsUniform>(), 16);
    }

    #[test]
    fn gamma_lands_in_x() {
        let s = PostSettingsUniform::new(2.2);
        assert_eq!(s.gamma[0], 2.2);
    }
}
