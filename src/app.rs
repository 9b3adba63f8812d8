// src/app.rs
//! Application shell
//!
//! Owns the window, event loop, render engine, world, and camera. Scenes
//! are assembled through [`GloamApp::world_mut`] before `run()`; the
//! [`demo_world`] helper builds the reference scene with a tiled ground
//! plane and semi-transparent panes.

use cgmath::Vector3;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use rand::Rng;

use crate::config::{init_logging, GraphConfig, LoggingConfig};
use crate::error::RenderError;
use crate::gfx::{
    camera::{
        camera_controller::CameraController, camera_utils::CameraManager, orbit_camera::OrbitCamera,
    },
    geometry::{generate_cube, generate_plane},
    rendering::render_engine::RenderEngine,
    scene::components::{
        DirectionalLightComponent, MaterialComponent, MeshComponent, PointLightComponent,
        SkyboxComponent, SpotLightComponent, TextureData, TransformComponent,
    },
    scene::mesh::Mesh,
    scene::World,
};

pub struct GloamApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    world: World,
    camera_manager: CameraManager,
    graph_config: GraphConfig,
}

impl GloamApp {
    /// Create a new application with default settings
    pub async fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create a new application with an explicit frame graph configuration
    pub fn with_config(graph_config: GraphConfig) -> Self {
        init_logging(LoggingConfig::default());

        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let mut camera = OrbitCamera::new(5.0, 0.4, 0.2, Vector3::new(0.0, 0.0, 0.0), 1.0);
        camera.bounds.min_distance = Some(1.1);
        let controller = CameraController::new(0.005, 0.1);
        let camera_manager = CameraManager::new(camera, controller);

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                world: World::new(),
                camera_manager,
                graph_config,
            },
        }
    }

    pub fn world(&self) -> &World {
        &self.app_state.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.app_state.world
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("gloam")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
        ) else {
            log::error!("window creation failed");
            event_loop.exit();
            return;
        };

        let window_handle = Arc::new(window);
        self.window = Some(window_handle.clone());

        let (width, height) = window_handle.inner_size().into();

        let window_clone = window_handle.clone();
        let graph_config = self.graph_config.clone();
        let renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, graph_config).await
        });

        match renderer {
            Ok(renderer) => {
                self.world
                    .init_gpu_resources(renderer.device(), renderer.queue());
                self.camera_manager.camera.resize_projection(width, height);
                self.render_engine = Some(renderer);
            }
            Err(error) => {
                log::error!("render engine initialization failed: {error}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if matches!(
                    key_event.physical_key,
                    winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::Escape)
                ) {
                    event_loop.exit();
                    return;
                }
                self.camera_manager.process_keyboard_event(&key_event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.camera_manager.camera.resize_projection(width, height);
                render_engine.resize(width, height);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.camera_manager.camera.update_view_proj();
                match render_engine.render_frame(&mut self.world, &self.camera_manager.camera) {
                    Ok(()) => {}
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let (width, height) = render_engine.get_surface_size();
                        render_engine.resize(width, height);
                    }
                    Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                        log::warn!("surface timeout, skipping frame");
                    }
                    Err(error) => {
                        log::error!("render failed: {error}");
                        event_loop.exit();
                    }
                }
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        self.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

/// Builds the reference scene: a tiled ground plane, four semi-transparent
/// panes, one light of each kind, and a gradient sky.
pub fn demo_world() -> World {
    let mut world = World::new();

    let plane_geometry = generate_plane(1.0, 1.0, 1, 1);

    let ground = world.spawn();
    world.add_transform(
        ground,
        TransformComponent::at(Vector3::new(0.0, -1.0, 0.0))
            .with_scale(Vector3::new(10.0, 1.0, 10.0)),
    );
    world.add_mesh(ground, MeshComponent::new(Mesh::from_geometry(&plane_geometry)));
    world.add_material(
        ground,
        MaterialComponent::new([1.0, 1.0, 1.0, 1.0])
            .with_diffuse(TextureData::checkerboard(
                256,
                8,
                [177, 98, 74, 255],
                [146, 74, 53, 255],
            ))
            .with_tiling([10.0, 10.0])
            .with_shininess(25.0),
    );

    let pane_texture = TextureData::solid([173, 203, 255, 255], 1, 1);
    let panes: [(Vector3<f32>, Vector3<f32>, Vector3<f32>, [f32; 2], f32); 4] = [
        (
            Vector3::new(-0.5, 0.0, 1.0),
            Vector3::new(-90.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            [1.0, 1.0],
            0.6,
        ),
        (
            Vector3::new(0.5, 0.0, 0.0),
            Vector3::new(-90.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            [1.0, 1.0],
            0.45,
        ),
        (
            Vector3::new(-0.5, 0.0, -1.0),
            Vector3::new(-90.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            [1.0, 1.0],
            0.3,
        ),
        (
            Vector3::new(0.0, 2.0, -3.0),
            Vector3::new(-45.0, 0.0, 0.0),
            Vector3::new(3.0, 1.0, 3.0),
            [3.0, 3.0],
            0.2,
        ),
    ];
    for (position, rotation, scale, tiling, alpha) in panes {
        let pane = world.spawn();
        world.add_transform(
            pane,
            TransformComponent::at(position)
                .with_rotation(rotation)
                .with_scale(scale),
        );
        world.add_mesh(
            pane,
            MeshComponent::new(Mesh::from_geometry(&plane_geometry)).with_cast_shadows(false),
        );
        world.add_material(
            pane,
            MaterialComponent::new([1.0, 1.0, 1.0, alpha])
                .with_diffuse(pane_texture.clone())
                .with_tiling(tiling)
                .with_shininess(25.0),
        );
    }

    let sun = world.spawn();
    world.add_transform(
        sun,
        TransformComponent::at(Vector3::new(0.0, 0.0, 0.0))
            .with_rotation(Vector3::new(50.0, -30.0, 0.0)),
    );
    world.add_directional_light(sun, DirectionalLightComponent::default());

    let lamp = world.spawn();
    world.add_transform(lamp, TransformComponent::at(Vector3::new(2.0, 1.5, 2.0)));
    world.add_point_light(
        lamp,
        PointLightComponent {
            color: [1.0, 0.85, 0.6],
            ..Default::default()
        },
    );

    let spot = world.spawn();
    world.add_transform(
        spot,
        TransformComponent::at(Vector3::new(-3.0, 3.0, 0.0))
            .with_rotation(Vector3::new(45.0, 90.0, 0.0)),
    );
    world.add_spot_light(spot, SpotLightComponent::default());

    let sky = world.spawn();
    let top = [92, 148, 236, 255];
    let bottom = [226, 238, 252, 255];
    world.add_skybox(
        sky,
        SkyboxComponent::new([
            TextureData::vertical_gradient(64, top, bottom),
            TextureData::vertical_gradient(64, top, bottom),
            TextureData::solid(top, 64, 64),
            TextureData::solid(bottom, 64, 64),
            TextureData::vertical_gradient(64, top, bottom),
            TextureData::vertical_gradient(64, top, bottom),
        ]),
    );

    world
}

/// Drops `count` boxes at random spots on the ground plane with warm random
/// tints. All of them cast and receive shadows.
pub fn scatter_crates(world: &mut World, count: usize) {
    let mut rng = rand::rng();
    let cube_geometry = generate_cube();

    for _ in 0..count {
        let size = 0.3 + rng.random::<f32>() * 0.4;
        let crate_box = world.spawn();
        world.add_transform(
            crate_box,
            TransformComponent::at(Vector3::new(
                (rng.random::<f32>() - 0.5) * 8.0,
                -1.0 + size / 2.0,
                (rng.random::<f32>() - 0.5) * 8.0,
            ))
            .with_rotation(Vector3::new(0.0, rng.random::<f32>() * 360.0, 0.0))
            .with_scale(Vector3::new(size, size, size)),
        );
        world.add_mesh(crate_box, MeshComponent::new(Mesh::from_geometry(&cube_geometry)));
        world.add_material(
            crate_box,
            MaterialComponent::new([
                0.6 + rng.random::<f32>() * 0.4,
                0.4 + rng.random::<f32>() * 0.3,
                0.2 + rng.random::<f32>() * 0.2,
                1.0,
            ])
            .with_shininess(25.0),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_world_contents() {
        let world = demo_world();
        assert_eq!(world.renderables().len(), 5);
        assert_eq!(world.directional_lights().count(), 1);
        assert_eq!(world.point_lights().count(), 1);
        assert_eq!(world.spot_lights().count(), 1);
        assert!(world.skybox().is_some());
    }

    #[test]
    fn demo_panes_are_transparent() {
        let world = demo_world();
        let transparent = world
            .renderables()
            .iter()
            .filter(|&&e| world.material(e).map(|m| !m.is_opaque()).unwrap_or(false))
            .count();
        assert_eq!(transparent, 4);
    }

    #[test]
    fn scattered_crates_are_opaque_casters() {
        let mut world = World::new();
        scatter_crates(&mut world, 8);
        assert_eq!(world.renderables().len(), 8);
        for &e in world.renderables() {
            assert!(world.material(e).is_some_and(|m| m.is_opaque()));
            assert!(world.mesh(e).is_some_and(|m| m.cast_shadows));
        }
    }
}
