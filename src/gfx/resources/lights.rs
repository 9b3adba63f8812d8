//! Light uniform packing and shadow view-projection builders.
//!
//! Each frame the world's lights are flattened into one `LightsUniform`
//! (bind group 3) together with the matrices each shadow layer renders
//! with. Layout mirrors the WGSL `Lights` struct field for field; the size
//! assertions below guard the mirror.

use bytemuck::Zeroable;
use cgmath::{Angle, Deg, EuclideanSpace, Matrix4, Point3, SquareMatrix, Vector3};

use crate::config::{
    DirectionalShadowing, GraphConfig, SingleMapConfig, CASCADE_COUNT, MAX_LIGHTS,
    SHADOW_PROJECTION_FOV_DEG,
};
use crate::gfx::camera::camera_utils::convert_matrix4_to_array;
use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::rendering::cascade::{cascade_matrices, CameraFrustum};
use crate::gfx::scene::components::{SpotLightComponent, TransformComponent};
use crate::gfx::scene::World;

/// One directional light record. 96 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightUniform {
    pub color: [f32; 3],
    pub ambient_intensity: f32,
    pub direction: [f32; 3],
    pub intensity: f32,
    /// Single-map light space; ignored by the shader in cascaded mode.
    pub light_space: [[f32; 4]; 4],
}

/// One point light record. 48 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub color: [f32; 3],
    pub ambient_intensity: f32,
    pub position: [f32; 3],
    pub intensity: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub _padding: [f32; 2],
}

/// One spot light record. 128 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightUniform {
    pub color: [f32; 3],
    pub ambient_intensity: f32,
    pub direction: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub inner_cutoff_cos: f32,
    pub outer_cutoff_cos: f32,
    pub _padding: [f32; 3],
    pub light_space: [[f32; 4]; 4],
}

/// Complete per-frame light set, uploaded as a single uniform buffer.
///
/// `counts` packs [directional, point, spot, directional shadow mode].
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub directional: [DirectionalLightUniform; MAX_LIGHTS],
    pub point: [PointLightUniform; MAX_LIGHTS],
    pub spot: [SpotLightUniform; MAX_LIGHTS],
    pub cascades: [[[f32; 4]; 4]; CASCADE_COUNT],
    /// x holds the cascade far distance; padded to vec4 stride.
    pub cascade_splits: [[f32; 4]; CASCADE_COUNT],
    pub counts: [u32; 4],
}

/// Light space of a single-map directional light: fixed-extent orthographic
/// volume anchored at the light's transform, looking along its forward.
pub fn directional_light_space(
    transform: &TransformComponent,
    config: &SingleMapConfig,
) -> Matrix4<f32> {
    let half_w = config.width / 2.0;
    let half_h = config.height / 2.0;
    let proj = cgmath::ortho(-half_w, half_w, -half_h, half_h, config.near, config.far);
    let eye = Point3::from_vec(transform.position);
    let view = Matrix4::look_at_rh(eye, eye + transform.forward(), Vector3::unit_y());
    OPENGL_TO_WGPU_MATRIX * proj * view
}

/// Light space of a spot light.
///
/// The projection uses the fixed 90 degree shadow FOV, not the cone angle.
pub fn spot_light_space(
    transform: &TransformComponent,
    light: &SpotLightComponent,
) -> Matrix4<f32> {
    let proj = cgmath::perspective(
        Deg(SHADOW_PROJECTION_FOV_DEG),
        1.0,
        light.shadow_near_z,
        light.shadow_far_z,
    );
    let eye = Point3::from_vec(transform.position);
    let view = Matrix4::look_at_rh(eye, eye + transform.forward(), Vector3::unit_y());
    OPENGL_TO_WGPU_MATRIX * proj * view
}

/// Clip-space Y flip for cube face rendering. Cube sampling reads face rows
/// top-down while our projection puts clip +Y at row zero, so each face
/// renders through this flip to land in sampling order. Reverses triangle
/// winding; the cube shadow pipeline must not cull.
#[rustfmt::skip]
const CUBE_FACE_FLIP_Y: Matrix4<f32> = Matrix4::new(
    1.0,  0.0, 0.0, 0.0,
    0.0, -1.0, 0.0, 0.0,
    0.0,  0.0, 1.0, 0.0,
    0.0,  0.0, 0.0, 1.0,
);

/// View-projections for the six faces of a point light's shadow cube, in
/// layer order +X, -X, +Y, -Y, +Z, -Z.
///
/// Up vectors follow the cube map face convention so rendered faces line up
/// with hardware cube sampling.
pub fn point_light_faces(position: Point3<f32>, near: f32, far: f32) -> [Matrix4<f32>; 6] {
    let proj = CUBE_FACE_FLIP_Y
        * OPENGL_TO_WGPU_MATRIX
        * cgmath::perspective(Deg(SHADOW_PROJECTION_FOV_DEG), 1.0, near, far);

    let faces: [(Vector3<f32>, Vector3<f32>); 6] = [
        (Vector3::unit_x(), -Vector3::unit_y()),
        (-Vector3::unit_x(), -Vector3::unit_y()),
        (Vector3::unit_y(), Vector3::unit_z()),
        (-Vector3::unit_y(), -Vector3::unit_z()),
        (Vector3::unit_z(), -Vector3::unit_y()),
        (-Vector3::unit_z(), -Vector3::unit_y()),
    ];

    faces.map(|(dir, up)| proj * Matrix4::look_at_rh(position, position + dir, up))
}

/// Everything the shadow and shading passes need for one frame's lights:
/// the packed uniform plus the matrices each shadow layer renders with.
pub struct FrameLights {
    pub uniform: LightsUniform,
    pub cascades: [Matrix4<f32>; CASCADE_COUNT],
    /// Per-light single-map light spaces; layer i of the directional array
    /// belongs to light i when the single-map technique is active.
    pub directional_singles: Vec<Matrix4<f32>>,
    /// Face matrices per active point light.
    pub point_faces: Vec<[Matrix4<f32>; 6]>,
    /// Light space per active spot light.
    pub spot_matrices: Vec<Matrix4<f32>>,
    pub directional_count: usize,
    pub point_count: usize,
    pub spot_count: usize,
}

/// Flattens the world's lights into uniform + shadow matrices.
///
/// At most [`MAX_LIGHTS`] per type are kept, in query order; the cascade
/// matrices derive from the first directional light and the current camera
/// frustum.
pub fn build_frame_lights(
    world: &World,
    frustum: &CameraFrustum,
    config: &GraphConfig,
) -> FrameLights {
    let mut uniform = LightsUniform::zeroed();

    let directional: Vec<_> = world.directional_lights().collect();
    let point: Vec<_> = world.point_lights().collect();
    let spot: Vec<_> = world.spot_lights().collect();

    if directional.len() > MAX_LIGHTS {
        log::debug!(
            "ignoring {} excess directional lights",
            directional.len() - MAX_LIGHTS
        );
    }
    if point.len() > MAX_LIGHTS {
        log::debug!("ignoring {} excess point lights", point.len() - MAX_LIGHTS);
    }
    if spot.len() > MAX_LIGHTS {
        log::debug!("ignoring {} excess spot lights", spot.len() - MAX_LIGHTS);
    }

    let mut directional_singles = Vec::new();
    for (slot, (_, transform, light)) in directional.iter().take(MAX_LIGHTS).enumerate() {
        let light_space = directional_light_space(transform, &config.single_map);
        uniform.directional[slot] = DirectionalLightUniform {
            color: light.color,
            ambient_intensity: light.ambient_intensity,
            direction: transform.forward().into(),
            intensity: light.intensity,
            light_space: convert_matrix4_to_array(light_space),
        };
        directional_singles.push(light_space);
    }

    let mut point_faces = Vec::new();
    for (slot, (_, transform, light)) in point.iter().take(MAX_LIGHTS).enumerate() {
        uniform.point[slot] = PointLightUniform {
            color: light.color,
            ambient_intensity: light.ambient_intensity,
            position: transform.position.into(),
            intensity: light.intensity,
            shadow_near: light.shadow_near_z,
            shadow_far: light.shadow_far_z,
            _padding: [0.0; 2],
        };
        point_faces.push(point_light_faces(
            Point3::from_vec(transform.position),
            light.shadow_near_z,
            light.shadow_far_z,
        ));
    }

    let mut spot_matrices = Vec::new();
    for (slot, (_, transform, light)) in spot.iter().take(MAX_LIGHTS).enumerate() {
        let light_space = spot_light_space(transform, light);
        uniform.spot[slot] = SpotLightUniform {
            color: light.color,
            ambient_intensity: light.ambient_intensity,
            direction: transform.forward().into(),
            intensity: light.intensity,
            position: transform.position.into(),
            inner_cutoff_cos: Deg(light.inner_cutoff_deg).cos(),
            outer_cutoff_cos: Deg(light.outer_cutoff_deg).cos(),
            _padding: [0.0; 3],
            light_space: convert_matrix4_to_array(light_space),
        };
        spot_matrices.push(light_space);
    }

    let mut cascades = [Matrix4::identity(); CASCADE_COUNT];
    if config.directional_shadowing == DirectionalShadowing::Cascaded {
        if let Some((_, transform, _)) = directional.first() {
            let (matrices, distances) =
                cascade_matrices(frustum, transform.forward(), &config.cascade);
            cascades = matrices;
            for i in 0..CASCADE_COUNT {
                uniform.cascades[i] = convert_matrix4_to_array(matrices[i]);
                uniform.cascade_splits[i] = [distances[i], 0.0, 0.0, 0.0];
            }
        }
    }

    let directional_count = directional.len().min(MAX_LIGHTS);
    let point_count = point.len().min(MAX_LIGHTS);
    let spot_count = spot.len().min(MAX_LIGHTS);

    uniform.counts = [
        directional_count as u32,
        point_count as u32,
        spot_count as u32,
        config.directional_shadowing.shader_index(),
    ];

    FrameLights {
        uniform,
        cascades,
        directional_singles,
        point_faces,
        spot_matrices,
        directional_count,
        point_count,
        spot_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::components::{
        DirectionalLightComponent, PointLightComponent, SpotLightComponent, TransformComponent,
    };
    use cgmath::{assert_relative_eq, Rad, Vector4};

    fn test_frustum() -> CameraFrustum {
        CameraFrustum {
            fovy: Rad::from(Deg(60.0)),
            aspect: 1.5,
            near: 0.1,
            far: 1000.0,
            view: Matrix4::look_at_rh(
                Point3::new(0.0, 3.0, 8.0),
                Point3::new(0.0, 0.0, 0.0),
                Vector3::unit_y(),
            ),
        }
    }

    #[test]
    fn uniform_layouts_match_shader_striding() {
        assert_eq!(std::mem::size_of::<DirectionalLightUniform>(), 96);
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 48);
        assert_eq!(std::mem::size_of::<SpotLightUniform>(), 128);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 1776);
    }

    #[test]
    fn excess_lights_are_capped() {
        let mut world = World::new();
        for i in 0..7 {
            let e = world.spawn();
            world.add_transform(e, TransformComponent::at(Vector3::new(i as f32, 2.0, 0.0)));
            world.add_point_light(e, PointLightComponent::default());
        }

        let lights = build_frame_lights(&world, &test_frustum(), &GraphConfig::default());
        assert_eq!(lights.uniform.counts[1], MAX_LIGHTS as u32);
        assert_eq!(lights.point_count, MAX_LIGHTS);
        assert_eq!(lights.point_faces.len(), MAX_LIGHTS);
        // First five lights kept in query order.
        assert_eq!(lights.uniform.point[4].position[0], 4.0);
    }

    #[test]
    fn empty_world_still_records_shadow_mode() {
        let world = World::new();
        let lights = build_frame_lights(&world, &test_frustum(), &GraphConfig::default());
        assert_eq!(lights.uniform.counts, [0, 0, 0, 2]);
        assert!(lights.point_faces.is_empty());
        assert!(lights.spot_matrices.is_empty());
    }

    #[test]
    fn shadow_mode_follows_config() {
        let world = World::new();
        let mut config = GraphConfig::default();
        config.directional_shadowing = DirectionalShadowing::SingleMap;
        let lights = build_frame_lights(&world, &test_frustum(), &config);
        assert_eq!(lights.uniform.counts[3], 1);
    }

    #[test]
    fn cascades_fill_only_in_cascaded_mode_with_a_light() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_transform(
            e,
            TransformComponent::at(Vector3::new(0.0, 10.0, 0.0))
                .with_rotation(Vector3::new(50.0, -30.0, 0.0)),
        );
        world.add_directional_light(e, DirectionalLightComponent::default());

        let lights = build_frame_lights(&world, &test_frustum(), &GraphConfig::default());
        assert_eq!(lights.uniform.counts[0], 1);
        // Split distances: far / [50, 25, 10, 2, 1].
        assert_relative_eq!(lights.uniform.cascade_splits[0][0], 20.0);
        assert_relative_eq!(lights.uniform.cascade_splits[4][0], 1000.0);
        assert!(lights.cascades[0] != Matrix4::identity());

        let mut single = GraphConfig::default();
        single.directional_shadowing = DirectionalShadowing::SingleMap;
        let lights = build_frame_lights(&world, &test_frustum(), &single);
        assert_eq!(lights.cascades[0], Matrix4::identity());
        assert_eq!(lights.uniform.cascade_splits[0][0], 0.0);
    }

    #[test]
    fn point_face_depth_matches_sampling_formula() {
        let near = 0.5;
        let far = 100.0;
        let faces = point_light_faces(Point3::new(0.0, 0.0, 0.0), near, far);

        // A fragment straight out the +X face at distance d.
        let d = 10.0;
        let clip = faces[0] * Vector4::new(d, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);

        // Shaders reconstruct the stored depth from the major axis distance.
        let expected = far / (far - near) - far * near / ((far - near) * d);
        assert_relative_eq!(ndc.z, expected, epsilon = 1e-4);
    }

    #[test]
    fn point_faces_match_cube_sampling_orientation() {
        let faces = point_light_faces(Point3::new(0.0, 0.0, 0.0), 0.5, 100.0);
        let d = 10.0;

        // Cube convention for the +X face: t = (1 - y/d) / 2, so a point
        // above the light must land in the upper rows (positive clip y).
        let clip = faces[0] * Vector4::new(d, 0.3 * d, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.y, 0.3, epsilon = 1e-4);

        // s = (1 - z/d) / 2 on the +X face: positive z maps left of center.
        let clip = faces[0] * Vector4::new(d, 0.0, 0.3 * d, 1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.x, -0.3, epsilon = 1e-4);

        // +Y face: t = (1 + z/d) / 2, so positive z lands in the lower rows.
        let clip = faces[2] * Vector4::new(0.0, d, 0.3 * d, 1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.y, -0.3, epsilon = 1e-4);
    }

    #[test]
    fn point_faces_cover_all_six_directions() {
        let faces = point_light_faces(Point3::new(1.0, 2.0, 3.0), 0.5, 50.0);
        let center = Point3::new(1.0, 2.0, 3.0);
        let dirs = [
            Vector3::unit_x(),
            -Vector3::unit_x(),
            Vector3::unit_y(),
            -Vector3::unit_y(),
            Vector3::unit_z(),
            -Vector3::unit_z(),
        ];
        for (face, dir) in faces.iter().zip(dirs.iter()) {
            let p = center + dir * 5.0;
            let clip = face * Vector4::new(p.x, p.y, p.z, 1.0);
            let ndc = clip / clip.w;
            assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
            assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn spot_projection_centers_on_forward_axis() {
        let transform = TransformComponent::at(Vector3::new(1.0, 4.0, -2.0))
            .with_rotation(Vector3::new(80.0, 15.0, 0.0));
        let light = SpotLightComponent::default();
        let matrix = spot_light_space(&transform, &light);

        let target = transform.position + transform.forward() * 10.0;
        let clip = matrix * Vector4::new(target.x, target.y, target.z, 1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn spot_cutoffs_stored_as_cosines() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_transform(e, TransformComponent::at(Vector3::new(0.0, 5.0, 0.0)));
        world.add_spot_light(
            e,
            SpotLightComponent {
                inner_cutoff_deg: 15.0,
                outer_cutoff_deg: 25.0,
                ..Default::default()
            },
        );

        let lights = build_frame_lights(&world, &test_frustum(), &GraphConfig::default());
        assert_relative_eq!(
            lights.uniform.spot[0].inner_cutoff_cos,
            Deg(15.0f32).cos(),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            lights.uniform.spot[0].outer_cutoff_cos,
            Deg(25.0f32).cos(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn single_map_volume_spans_configured_extent() {
        let config = SingleMapConfig::default();
        // Light at the origin with identity rotation looks along +Z.
        let transform = TransformComponent::default();
        let matrix = directional_light_space(&transform, &config);

        // Near and far planes map to depth 0 and 1.
        let near_clip = matrix * Vector4::new(0.0, 0.0, config.near, 1.0);
        assert_relative_eq!(near_clip.z / near_clip.w, 0.0, epsilon = 1e-4);
        let far_clip = matrix * Vector4::new(0.0, 0.0, config.far, 1.0);
        assert_relative_eq!(far_clip.z / far_clip.w, 1.0, epsilon = 1e-4);

        // The horizontal extent reaches the edge at half the map width.
        let edge = matrix * Vector4::new(config.width / 2.0, 0.0, 10.0, 1.0);
        assert_relative_eq!((edge.x / edge.w).abs(), 1.0, epsilon = 1e-4);
    }
}
