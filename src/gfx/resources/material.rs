use crate::gfx::resources::texture::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Per-draw material parameters, shared by the opaque and transparent passes.
///
/// `enable_normal_mapping` / `enable_parallax_mapping` gate the optional map
/// bindings; when a map is absent a placeholder texture is bound and the flag
/// stays zero. 48 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub tiling: [f32; 2],
    pub shininess: f32,
    pub depth_map_scale: f32,
    pub enable_normal_mapping: u32,
    pub enable_parallax_mapping: u32,
    pub receive_shadows: u32,
    pub _padding: u32,
}

impl Default for MaterialUniform {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            tiling: [1.0, 1.0],
            shininess: 32.0,
            depth_map_scale: 0.1,
            enable_normal_mapping: 0,
            enable_parallax_mapping: 0,
            receive_shadows: 1,
            _padding: 0,
        }
    }
}

pub type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Bind group 2: material parameters plus diffuse/normal/height maps.
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl MaterialBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .create(device, "Material Bind Group Layout");

        MaterialBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// `normal` and `height` take placeholder textures when the material has
    /// no such map; the uniform flags tell the shader which ones are real.
    pub fn create_bind_group(
        &mut self,
        device: &wgpu::Device,
        ubo: &MaterialUBO,
        diffuse: &TextureResource,
        normal: &TextureResource,
        height: &TextureResource,
    ) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .texture(&diffuse.view)
                .sampler(&diffuse.sampler)
                .texture(&normal.view)
                .texture(&height.view)
                .create(device, "Material Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_uniform_is_48_bytes() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn default_material_is_opaque_white() {
        let m = MaterialUniform::default();
        assert_eq!(m.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(m.enable_normal_mapping, 0);
        assert_eq!(m.receive_shadows, 1);
    }
}
