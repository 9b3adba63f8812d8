//! Frame graph: owns the render targets, pipelines, and per-frame bind
//! groups, and records the full pass sequence into one encoder.
//!
//! Pass order per frame: shadow layers (directional, point, spot), opaque
//! scene, skybox, weighted-blended transparency with its composite, and the
//! gamma resolve to the swapchain. Targets live in a [`ResourceCache`] under
//! the keys in [`targets`]; window-sized targets are replaced on resize
//! while the shadow arrays keep their construction-time size.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{GraphConfig, Transparency, CASCADE_COUNT, MAX_LIGHTS};
use crate::error::RenderError;
use crate::gfx::camera::camera_utils::convert_matrix4_to_array;
use crate::gfx::camera::{CameraUniform, OrbitCamera};
use crate::gfx::geometry::generate_skybox_cube;
use crate::gfx::resources::cache::ResourceCache;
use crate::gfx::resources::lights::{build_frame_lights, LightsUniform};
use crate::gfx::resources::material::{MaterialBindings, MaterialUniform};
use crate::gfx::resources::texture::TextureResource;
use crate::gfx::scene::mesh::Mesh;
use crate::gfx::scene::{Entity, World};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::passes::post::PostSettingsUniform;
use super::passes::shadow::ShadowPasses;
use super::passes::{self, EntityDraw, EntityUniform};
use super::pipeline_manager::{PipelineConfig, PipelineManager};

/// Cache keys of the graph-owned render targets.
pub mod targets {
    pub const SCENE_COLOR: &str = "scene.color";
    pub const SCENE_DEPTH: &str = "scene.depth";
    pub const OIT_ACCUMULATION: &str = "oit.accumulation";
    pub const OIT_REVEAL: &str = "oit.reveal";
    pub const DIRECTIONAL_SHADOW_DEPTH: &str = "shadow.directional.depth";
    pub const DIRECTIONAL_SHADOW_COLOR: &str = "shadow.directional.color";
    pub const POINT_SHADOW_DEPTH: &str = "shadow.point.depth";
    pub const SPOT_SHADOW_DEPTH: &str = "shadow.spot.depth";
}

/// Linear HDR format of the scene target; the gamma pass resolves it to the
/// non-sRGB swapchain.
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Polygon offset applied to every shadow caster pipeline.
pub const SHADOW_DEPTH_BIAS: wgpu::DepthBiasState = wgpu::DepthBiasState {
    constant: 40,
    slope_scale: 6.0,
    clamp: 1.0,
};

pub struct FrameGraph {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: GraphConfig,
    cache: ResourceCache,
    pipeline_manager: PipelineManager,

    frame_ubo: UniformBuffer<CameraUniform>,
    frame_bind_group: wgpu::BindGroup,
    lights_ubo: UniformBuffer<LightsUniform>,
    lights_bind_group: wgpu::BindGroup,

    entity_layout: BindGroupLayoutWithDesc,
    skybox_layout: BindGroupLayoutWithDesc,
    composite_layout: BindGroupLayoutWithDesc,
    post_layout: BindGroupLayoutWithDesc,

    shadow: ShadowPasses,
    entity_draws: HashMap<Entity, EntityDraw>,

    skybox_sampler: wgpu::Sampler,
    skybox_mesh: Mesh,
    skybox_bind_group: Option<wgpu::BindGroup>,

    composite_bind_group: wgpu::BindGroup,
    post_settings: UniformBuffer<PostSettingsUniform>,
    post_bind_group: wgpu::BindGroup,

    /// 1x1 white texture bound in place of absent material maps.
    placeholder_texture: TextureResource,
    width: u32,
    height: u32,
}

impl FrameGraph {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: GraphConfig,
    ) -> Result<Self, RenderError> {
        let mut cache = ResourceCache::new();

        cache.add(
            targets::DIRECTIONAL_SHADOW_DEPTH,
            TextureResource::create_shadow_map_array(
                &device,
                config.shadow_map_size,
                CASCADE_COUNT as u32,
                "Directional Shadow Map",
            ),
        );
        cache.add(
            targets::DIRECTIONAL_SHADOW_COLOR,
            TextureResource::create_color_array(
                &device,
                config.shadow_map_size,
                CASCADE_COUNT as u32,
                "Directional Shadow Color",
            ),
        );
        cache.add(
            targets::POINT_SHADOW_DEPTH,
            TextureResource::create_shadow_cube_array(
                &device,
                config.shadow_map_size,
                MAX_LIGHTS as u32,
                "Point Shadow Map",
            ),
        );
        cache.add(
            targets::SPOT_SHADOW_DEPTH,
            TextureResource::create_shadow_map_array(
                &device,
                config.shadow_map_size,
                MAX_LIGHTS as u32,
                "Spot Shadow Map",
            ),
        );
        Self::create_window_targets(&device, &mut cache, width, height);

        let frame_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(&device, "Frame Bind Group Layout");
        let entity_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Entity Bind Group Layout");
        let lights_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::depth_texture_2d_array())
            .next_binding_fragment(binding_types::depth_texture_cube_array())
            .next_binding_fragment(binding_types::depth_texture_2d_array())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Lights Bind Group Layout");
        let skybox_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Skybox Bind Group Layout");
        let composite_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .create(&device, "Composite Bind Group Layout");
        let post_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Post Bind Group Layout");

        let frame_ubo = UniformBuffer::<CameraUniform>::new(&device);
        let frame_bind_group = BindGroupBuilder::new(&frame_layout)
            .resource(frame_ubo.binding_resource())
            .create(&device, "Frame Bind Group");

        let lights_ubo = UniformBuffer::<LightsUniform>::new(&device);
        let directional_depth = cache.get::<TextureResource>(targets::DIRECTIONAL_SHADOW_DEPTH);
        let point_depth = cache.get::<TextureResource>(targets::POINT_SHADOW_DEPTH);
        let spot_depth = cache.get::<TextureResource>(targets::SPOT_SHADOW_DEPTH);
        let lights_bind_group = BindGroupBuilder::new(&lights_layout)
            .resource(lights_ubo.binding_resource())
            .texture(&directional_depth.view)
            .texture(&point_depth.view)
            .texture(&spot_depth.view)
            .sampler(&directional_depth.sampler)
            .create(&device, "Lights Bind Group");

        let directional_depth_texture = directional_depth.texture.clone();
        let point_depth_texture = point_depth.texture.clone();
        let directional_color_format = cache
            .get::<TextureResource>(targets::DIRECTIONAL_SHADOW_COLOR)
            .texture
            .format();
        let scene_depth_texture = cache
            .get::<TextureResource>(targets::SCENE_DEPTH)
            .texture
            .clone();

        let shadow = ShadowPasses::new(&device, &cache);

        let skybox_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Skybox Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let mut skybox_mesh = Mesh::from_geometry(&generate_skybox_cube());
        skybox_mesh.init_gpu_resources(&device);

        let composite_bind_group =
            Self::create_composite_bind_group(&device, &cache, &composite_layout);
        let post_settings =
            UniformBuffer::new_with_data(&device, &PostSettingsUniform::new(config.gamma));
        let post_bind_group =
            Self::create_post_bind_group(&device, &cache, &post_layout, &post_settings);

        let placeholder_texture = TextureResource::create_from_rgba_data(
            &device,
            &queue,
            &[255, 255, 255, 255],
            1,
            1,
            "Placeholder Texture",
        );

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager
            .load_shader("phong", include_str!("shaders/phong.wgsl"))
            .map_err(RenderError::PipelineCreation)?;
        pipeline_manager
            .load_shader("shadow", include_str!("shaders/shadow.wgsl"))
            .map_err(RenderError::PipelineCreation)?;
        pipeline_manager
            .load_shader("skybox", include_str!("shaders/skybox.wgsl"))
            .map_err(RenderError::PipelineCreation)?;
        pipeline_manager
            .load_shader("composite", include_str!("shaders/composite.wgsl"))
            .map_err(RenderError::PipelineCreation)?;
        pipeline_manager
            .load_shader("gamma", include_str!("shaders/gamma.wgsl"))
            .map_err(RenderError::PipelineCreation)?;

        let material_layout = MaterialBindings::new(&device);

        pipeline_manager.register_pipeline(
            passes::shadow::CASCADE_PIPELINE,
            PipelineConfig::default_with_shader("shadow")
                .with_label("Shadow Cascade Pipeline")
                .with_bind_group_layouts(vec![
                    shadow.layer_layout().layout.clone(),
                    entity_layout.layout.clone(),
                ])
                .with_cull_mode(None)
                .with_depth_stencil(directional_depth_texture)
                .with_depth_bias(SHADOW_DEPTH_BIAS)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: directional_color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );
        pipeline_manager.register_pipeline(
            passes::shadow::DEPTH_PIPELINE,
            PipelineConfig::default_with_shader("shadow")
                .with_label("Shadow Depth Pipeline")
                .with_vertex_only()
                .with_bind_group_layouts(vec![
                    shadow.layer_layout().layout.clone(),
                    entity_layout.layout.clone(),
                ])
                .with_cull_mode(None)
                .with_depth_stencil(point_depth_texture)
                .with_depth_bias(SHADOW_DEPTH_BIAS)
                .with_color_targets(Vec::new()),
        );
        pipeline_manager.register_pipeline(
            passes::opaque::PIPELINE,
            PipelineConfig::default_with_shader("phong")
                .with_label("Opaque Pipeline")
                .with_fragment_entry("fs_opaque")
                .with_bind_group_layouts(vec![
                    frame_layout.layout.clone(),
                    entity_layout.layout.clone(),
                    material_layout.bind_group_layout().clone(),
                    lights_layout.layout.clone(),
                ])
                .with_depth_stencil(scene_depth_texture.clone())
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: SCENE_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );
        pipeline_manager.register_pipeline(
            passes::skybox::PIPELINE,
            PipelineConfig::default_with_shader("skybox")
                .with_label("Skybox Pipeline")
                .with_bind_group_layouts(vec![
                    frame_layout.layout.clone(),
                    skybox_layout.layout.clone(),
                ])
                .with_cull_mode(None)
                .with_depth_stencil(scene_depth_texture.clone())
                .with_depth_write(false)
                .with_depth_compare(wgpu::CompareFunction::LessEqual)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: SCENE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );
        pipeline_manager.register_pipeline(
            passes::oit::TRANSPARENT_PIPELINE,
            PipelineConfig::default_with_shader("phong")
                .with_label("Transparent Pipeline")
                .with_fragment_entry("fs_oit")
                .with_bind_group_layouts(vec![
                    frame_layout.layout.clone(),
                    entity_layout.layout.clone(),
                    material_layout.bind_group_layout().clone(),
                    lights_layout.layout.clone(),
                ])
                .with_cull_mode(None)
                .with_depth_stencil(scene_depth_texture)
                .with_depth_write(false)
                .with_color_targets(vec![
                    Some(wgpu::ColorTargetState {
                        format: passes::oit::ACCUMULATION_FORMAT,
                        blend: Some(passes::oit::ACCUMULATION_BLEND),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: passes::oit::REVEAL_FORMAT,
                        blend: Some(passes::oit::REVEAL_BLEND),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ]),
        );
        pipeline_manager.register_pipeline(
            passes::oit::COMPOSITE_PIPELINE,
            PipelineConfig::default_with_shader("composite")
                .with_label("Composite Pipeline")
                .with_no_vertex_buffers()
                .with_bind_group_layouts(vec![composite_layout.layout.clone()])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: SCENE_FORMAT,
                    blend: Some(passes::oit::COMPOSITE_BLEND),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );
        pipeline_manager.register_pipeline(
            passes::post::PIPELINE,
            PipelineConfig::default_with_shader("gamma")
                .with_label("Gamma Pipeline")
                .with_no_vertex_buffers()
                .with_bind_group_layouts(vec![post_layout.layout.clone()])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );

        pipeline_manager
            .create_all_pipelines()
            .map_err(|errors| RenderError::PipelineCreation(errors.join("; ")))?;

        Ok(FrameGraph {
            device,
            queue,
            config,
            cache,
            pipeline_manager,
            frame_ubo,
            frame_bind_group,
            lights_ubo,
            lights_bind_group,
            entity_layout,
            skybox_layout,
            composite_layout,
            post_layout,
            shadow,
            entity_draws: HashMap::new(),
            skybox_sampler,
            skybox_mesh,
            skybox_bind_group: None,
            composite_bind_group,
            post_settings,
            post_bind_group,
            placeholder_texture,
            width,
            height,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Shadowing technique, transparency, gamma, and clear color take effect
    /// the next frame. The shadow map size is fixed at construction.
    pub fn config_mut(&mut self) -> &mut GraphConfig {
        &mut self.config
    }

    /// Records the whole frame into `encoder`, targeting `surface_view` with
    /// the final gamma resolve.
    pub fn execute(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        world: &World,
        camera: &OrbitCamera,
    ) {
        self.frame_ubo.update_content(&self.queue, camera.uniform);
        let lights = build_frame_lights(world, &camera.frustum(), &self.config);
        self.lights_ubo.update_content(&self.queue, lights.uniform);
        self.post_settings
            .update_content(&self.queue, PostSettingsUniform::new(self.config.gamma));

        self.refresh_entity_draws(world);
        self.refresh_skybox_binding(world);

        self.shadow.record(
            encoder,
            &self.queue,
            &mut self.pipeline_manager,
            world,
            &self.entity_draws,
            &lights,
            self.config.directional_shadowing,
        );

        let scene_color = self.cache.get::<TextureResource>(targets::SCENE_COLOR);
        let scene_depth = self.cache.get::<TextureResource>(targets::SCENE_DEPTH);
        passes::opaque::record(
            encoder,
            &mut self.pipeline_manager,
            &scene_color.view,
            &scene_depth.view,
            &self.frame_bind_group,
            &self.lights_bind_group,
            world,
            &self.entity_draws,
            self.config.clear_color,
        );
        passes::skybox::record(
            encoder,
            &mut self.pipeline_manager,
            &scene_color.view,
            &scene_depth.view,
            &self.frame_bind_group,
            self.skybox_bind_group.as_ref(),
            &self.skybox_mesh,
        );

        if self.config.transparency == Transparency::WeightedBlended {
            let accumulation = self.cache.get::<TextureResource>(targets::OIT_ACCUMULATION);
            let reveal = self.cache.get::<TextureResource>(targets::OIT_REVEAL);
            passes::oit::record(
                encoder,
                &mut self.pipeline_manager,
                &scene_color.view,
                &scene_depth.view,
                &accumulation.view,
                &reveal.view,
                &self.frame_bind_group,
                &self.lights_bind_group,
                &self.composite_bind_group,
                world,
                &self.entity_draws,
            );
        }

        passes::post::record(
            encoder,
            &mut self.pipeline_manager,
            surface_view,
            &self.post_bind_group,
        );
    }

    /// Replaces the window-sized targets and the bind groups that reference
    /// them. Zero-sized requests are dropped.
    pub fn resize_views(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("ignoring zero-sized frame graph resize");
            return;
        }
        self.width = width;
        self.height = height;

        Self::create_window_targets(&self.device, &mut self.cache, width, height);
        self.composite_bind_group =
            Self::create_composite_bind_group(&self.device, &self.cache, &self.composite_layout);
        self.post_bind_group = Self::create_post_bind_group(
            &self.device,
            &self.cache,
            &self.post_layout,
            &self.post_settings,
        );
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_window_targets(
        device: &wgpu::Device,
        cache: &mut ResourceCache,
        width: u32,
        height: u32,
    ) {
        cache.replace(
            targets::SCENE_COLOR,
            TextureResource::create_render_target(device, width, height, SCENE_FORMAT, "Scene Color"),
        );
        cache.replace(
            targets::SCENE_DEPTH,
            TextureResource::create_depth_texture(device, width, height, "Scene Depth"),
        );
        cache.replace(
            targets::OIT_ACCUMULATION,
            TextureResource::create_render_target(
                device,
                width,
                height,
                passes::oit::ACCUMULATION_FORMAT,
                "Transparency Accumulation",
            ),
        );
        cache.replace(
            targets::OIT_REVEAL,
            TextureResource::create_render_target(
                device,
                width,
                height,
                passes::oit::REVEAL_FORMAT,
                "Transparency Reveal",
            ),
        );
    }

    fn create_composite_bind_group(
        device: &wgpu::Device,
        cache: &ResourceCache,
        layout: &BindGroupLayoutWithDesc,
    ) -> wgpu::BindGroup {
        let accumulation = cache.get::<TextureResource>(targets::OIT_ACCUMULATION);
        let reveal = cache.get::<TextureResource>(targets::OIT_REVEAL);
        BindGroupBuilder::new(layout)
            .texture(&accumulation.view)
            .texture(&reveal.view)
            .create(device, "Composite Bind Group")
    }

    fn create_post_bind_group(
        device: &wgpu::Device,
        cache: &ResourceCache,
        layout: &BindGroupLayoutWithDesc,
        settings: &UniformBuffer<PostSettingsUniform>,
    ) -> wgpu::BindGroup {
        let scene_color = cache.get::<TextureResource>(targets::SCENE_COLOR);
        BindGroupBuilder::new(layout)
            .resource(settings.binding_resource())
            .texture(&scene_color.view)
            .sampler(&scene_color.sampler)
            .create(device, "Post Bind Group")
    }

    /// Creates missing per-entity draw state, pushes this frame's transform
    /// and material values, and drops state for despawned entities.
    fn refresh_entity_draws(&mut self, world: &World) {
        let device = &self.device;
        let queue = &self.queue;
        let entity_layout = &self.entity_layout;
        let placeholder = &self.placeholder_texture;

        for &entity in world.renderables() {
            let Some(transform) = world.transform(entity) else {
                continue;
            };
            let Some(mesh) = world.mesh(entity) else {
                continue;
            };
            let Some(material) = world.material(entity) else {
                continue;
            };

            let draw = self
                .entity_draws
                .entry(entity)
                .or_insert_with(|| EntityDraw::new(device, entity_layout, material, placeholder));

            draw.transform.update_content(
                queue,
                EntityUniform {
                    transform: convert_matrix4_to_array(transform.matrix()),
                    normal_matrix: convert_matrix4_to_array(transform.normal_matrix()),
                },
            );
            draw.material.update_content(
                queue,
                MaterialUniform {
                    color: material.color,
                    tiling: material.tiling,
                    shininess: material.shininess,
                    depth_map_scale: material.depth_map_scale,
                    enable_normal_mapping: material.normal_gpu.is_some() as u32,
                    enable_parallax_mapping: material.height_gpu.is_some() as u32,
                    receive_shadows: mesh.receive_shadows as u32,
                    _padding: 0,
                },
            );
        }

        self.entity_draws
            .retain(|entity, _| world.renderables().contains(entity));
    }

    /// Rebuilt every frame so a swapped skybox takes effect immediately.
    fn refresh_skybox_binding(&mut self, world: &World) {
        self.skybox_bind_group = world.skybox().and_then(|s| s.gpu.as_ref()).map(|texture| {
            BindGroupBuilder::new(&self.skybox_layout)
                .texture(&texture.view)
                .sampler(&self.skybox_sampler)
                .create(&self.device, "Skybox Bind Group")
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_keys_are_unique() {
        let keys = [
            targets::SCENE_COLOR,
            targets::SCENE_DEPTH,
            targets::OIT_ACCUMULATION,
            targets::OIT_REVEAL,
            targets::DIRECTIONAL_SHADOW_DEPTH,
            targets::DIRECTIONAL_SHADOW_COLOR,
            targets::POINT_SHADOW_DEPTH,
            targets::SPOT_SHADOW_DEPTH,
        ];
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                assert_ne!(keys[i], keys[j]);
            }
        }
    }
}
