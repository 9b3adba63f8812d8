//! Render pass recording.
//!
//! Each submodule records one pass of the frame: shadow map layers, the
//! opaque scene pass, the skybox, weighted-blended transparency with its
//! composite, and the gamma post pass. The frame graph owns the targets and
//! pipelines and hands each pass the views and bind groups it needs.

pub mod oit;
pub mod opaque;
pub mod post;
pub mod shadow;
pub mod skybox;

use crate::gfx::resources::material::{MaterialBindings, MaterialUBO};
use crate::gfx::resources::texture::TextureResource;
use crate::gfx::scene::components::MaterialComponent;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutWithDesc},
    uniform_buffer::UniformBuffer,
};

/// Bind group 1: per-entity transforms, updated every frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EntityUniform {
    pub transform: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

/// GPU-side draw state for one renderable entity.
///
/// Created lazily the first time an entity shows up with a mesh and a
/// material. The uniform buffers are content-diffed on update, so entities
/// that do not move cost nothing per frame.
pub struct EntityDraw {
    pub transform: UniformBuffer<EntityUniform>,
    pub transform_bind_group: wgpu::BindGroup,
    pub material: MaterialUBO,
    pub material_bindings: MaterialBindings,
}

impl EntityDraw {
    pub fn new(
        device: &wgpu::Device,
        entity_layout: &BindGroupLayoutWithDesc,
        material: &MaterialComponent,
        placeholder: &TextureResource,
    ) -> Self {
        let transform = UniformBuffer::<EntityUniform>::new(device);
        let transform_bind_group = BindGroupBuilder::new(entity_layout)
            .resource(transform.binding_resource())
            .create(device, "Entity Bind Group");

        let material_ubo = MaterialUBO::new(device);
        let mut material_bindings = MaterialBindings::new(device);
        material_bindings.create_bind_group(
            device,
            &material_ubo,
            material.diffuse_gpu.as_ref().unwrap_or(placeholder),
            material.normal_gpu.as_ref().unwrap_or(placeholder),
            material.height_gpu.as_ref().unwrap_or(placeholder),
        );

        EntityDraw {
            transform,
            transform_bind_group,
            material: material_ubo,
            material_bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_uniform_is_128_bytes() {
        assert_eq!(std::mem::size_of::<EntityUniform>(), 128);
    }
}
