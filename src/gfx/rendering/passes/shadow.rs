//! Shadow map rendering, one render pass per array layer.
//!
//! Directional lights render into a 2D array: one layer per cascade, or one
//! layer per light when the single-map technique is active. Point lights
//! render one layer per cube face, spot lights one layer each. Every layer
//! carries a small uniform with its light-space matrix; the directional
//! layers also write a per-layer tint into a color array so the cascade
//! coverage can be inspected.

use std::collections::HashMap;

use crate::config::{DirectionalShadowing, CASCADE_COUNT};
use crate::gfx::camera::camera_utils::convert_matrix4_to_array;
use crate::gfx::rendering::frame_graph::targets;
use crate::gfx::rendering::pipeline_manager::PipelineManager;
use crate::gfx::resources::cache::ResourceCache;
use crate::gfx::resources::lights::FrameLights;
use crate::gfx::resources::texture::TextureResource;
use crate::gfx::scene::mesh::DrawMesh;
use crate::gfx::scene::{Entity, World};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::EntityDraw;

/// Depth plus debug color, used for the directional array layers.
pub const CASCADE_PIPELINE: &str = "shadow_cascade";
/// Depth only, used for point cube faces and spot layers.
pub const DEPTH_PIPELINE: &str = "shadow_depth";

/// Tints written into the directional debug color array, one per layer.
pub const CASCADE_TINTS: [[f32; 4]; CASCADE_COUNT] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
    [1.0, 0.0, 1.0, 1.0],
];

/// Bind group 0 of the shadow shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LayerUniform {
    pub light_space: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

struct ShadowLayer {
    ubo: UniformBuffer<LayerUniform>,
    bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    color_view: Option<wgpu::TextureView>,
}

impl ShadowLayer {
    fn new(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        depth_view: wgpu::TextureView,
        color_view: Option<wgpu::TextureView>,
    ) -> Self {
        let ubo = UniformBuffer::<LayerUniform>::new(device);
        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .create(device, "Shadow Layer Bind Group");
        ShadowLayer {
            ubo,
            bind_group,
            depth_view,
            color_view,
        }
    }
}

/// Owns the per-layer views and uniforms for all shadow targets.
pub struct ShadowPasses {
    layer_layout: BindGroupLayoutWithDesc,
    directional: Vec<ShadowLayer>,
    point: Vec<ShadowLayer>,
    spot: Vec<ShadowLayer>,
}

impl ShadowPasses {
    pub fn new(device: &wgpu::Device, cache: &ResourceCache) -> Self {
        let layer_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Shadow Layer Bind Group Layout");

        let directional_depth = cache.get::<TextureResource>(targets::DIRECTIONAL_SHADOW_DEPTH);
        let directional_color = cache.get::<TextureResource>(targets::DIRECTIONAL_SHADOW_COLOR);
        let directional = (0..CASCADE_COUNT as u32)
            .map(|layer| {
                ShadowLayer::new(
                    device,
                    &layer_layout,
                    directional_depth.layer_view(layer, "Directional Shadow Layer"),
                    Some(directional_color.layer_view(layer, "Directional Shadow Color Layer")),
                )
            })
            .collect();

        let point_depth = cache.get::<TextureResource>(targets::POINT_SHADOW_DEPTH);
        let point_layers = point_depth.texture.depth_or_array_layers();
        let point = (0..point_layers)
            .map(|layer| {
                ShadowLayer::new(
                    device,
                    &layer_layout,
                    point_depth.layer_view(layer, "Point Shadow Face"),
                    None,
                )
            })
            .collect();

        let spot_depth = cache.get::<TextureResource>(targets::SPOT_SHADOW_DEPTH);
        let spot_layers = spot_depth.texture.depth_or_array_layers();
        let spot = (0..spot_layers)
            .map(|layer| {
                ShadowLayer::new(
                    device,
                    &layer_layout,
                    spot_depth.layer_view(layer, "Spot Shadow Layer"),
                    None,
                )
            })
            .collect();

        ShadowPasses {
            layer_layout,
            directional,
            point,
            spot,
        }
    }

    pub fn layer_layout(&self) -> &BindGroupLayoutWithDesc {
        &self.layer_layout
    }

    /// Records every shadow layer for this frame.
    ///
    /// The directional layers are cleared every frame even when nothing is
    /// drawn into them, since the lighting shader samples them whenever
    /// shadowing is on. Point and spot layers are only touched for lights
    /// that are actually active; stale layers are never sampled.
    pub fn record(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        pipelines: &mut PipelineManager,
        world: &World,
        draws: &HashMap<Entity, EntityDraw>,
        lights: &FrameLights,
        mode: DirectionalShadowing,
    ) {
        let directional_active = match mode {
            DirectionalShadowing::Off => 0,
            DirectionalShadowing::SingleMap => lights.directional_count,
            DirectionalShadowing::Cascaded if lights.directional_count > 0 => CASCADE_COUNT,
            DirectionalShadowing::Cascaded => 0,
        };

        for (i, layer) in self.directional.iter_mut().enumerate() {
            if i < directional_active {
                let light_space = match mode {
                    DirectionalShadowing::SingleMap => lights.directional_singles[i],
                    _ => lights.cascades[i],
                };
                layer.ubo.update_content(
                    queue,
                    LayerUniform {
                        light_space: convert_matrix4_to_array(light_space),
                        tint: CASCADE_TINTS[i],
                    },
                );
            }

            let color_view = layer
                .color_view
                .as_ref()
                .expect("directional layers carry a color view");
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Directional Shadow Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &layer.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if i >= directional_active {
                continue;
            }
            let Some(pipeline) = pipelines.get_pipeline(CASCADE_PIPELINE) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &layer.bind_group, &[]);
            draw_casters(&mut pass, world, draws);
        }

        for light in 0..lights.point_count {
            for face in 0..6 {
                let layer = &mut self.point[light * 6 + face];
                layer.ubo.update_content(
                    queue,
                    LayerUniform {
                        light_space: convert_matrix4_to_array(lights.point_faces[light][face]),
                        tint: [0.0; 4],
                    },
                );
                record_depth_layer(encoder, pipelines, layer, world, draws, "Point Shadow Pass");
            }
        }

        for light in 0..lights.spot_count {
            let layer = &mut self.spot[light];
            layer.ubo.update_content(
                queue,
                LayerUniform {
                    light_space: convert_matrix4_to_array(lights.spot_matrices[light]),
                    tint: [0.0; 4],
                },
            );
            record_depth_layer(encoder, pipelines, layer, world, draws, "Spot Shadow Pass");
        }
    }
}

fn record_depth_layer(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &mut PipelineManager,
    layer: &ShadowLayer,
    world: &World,
    draws: &HashMap<Entity, EntityDraw>,
    label: &str,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &layer.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    let Some(pipeline) = pipelines.get_pipeline(DEPTH_PIPELINE) else {
        return;
    };
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, &layer.bind_group, &[]);
    draw_casters(&mut pass, world, draws);
}

fn draw_casters(
    pass: &mut wgpu::RenderPass<'_>,
    world: &World,
    draws: &HashMap<Entity, EntityDraw>,
) {
    for &entity in world.renderables() {
        let Some(mesh) = world.mesh(entity) else {
            continue;
        };
        if !mesh.cast_shadows {
            continue;
        }
        let Some(draw) = draws.get(&entity) else {
            continue;
        };
        pass.set_bind_group(1, &draw.transform_bind_group, &[]);
        pass.draw_mesh(&mesh.mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_uniform_is_80_bytes() {
        assert_eq!(std::mem::size_of::<LayerUniform>(), 80);
    }

    #[test]
    fn cascade_tints_are_distinct() {
        for i in 0..CASCADE_TINTS.len() {
            for j in (i + 1)..CASCADE_TINTS.len() {
                assert_ne!(CASCADE_TINTS[i], CASCADE_TINTS[j]);
            }
        }
    }
}
