// src/gfx/rendering/cascade.rs
//! Cascade split calculator
//!
//! Slices the camera frustum into depth ranges and fits one orthographic
//! light volume per slice. Split distances are fixed fractions of the far
//! plane rather than a logarithmic scheme, and every matrix is re-derived
//! from the current camera pose each frame; nothing here is cached.

use cgmath::{
    Angle, EuclideanSpace, Matrix4, Point3, Rad, SquareMatrix, Transform, Vector3,
};

use crate::config::{CascadeConfig, CASCADE_COUNT};
use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;

/// Camera parameters the split calculator needs each frame.
///
/// `view` is the world-to-view matrix the camera rendered with; slices are
/// built in view space and carried to world space through its inverse.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrustum {
    pub fovy: Rad<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub view: Matrix4<f32>,
}

/// Eight corners of a view-frustum slice, in view space.
///
/// The camera looks down -z, so corners sit at negative z.
#[derive(Debug, Clone, Copy)]
pub struct FrustumCorners {
    pub corners: [Point3<f32>; 8],
}

impl FrustumCorners {
    /// Corners of the sub-frustum covering view depths `[near, far]`.
    pub fn slice(fovy: Rad<f32>, aspect: f32, near: f32, far: f32) -> Self {
        let tan_half = (fovy / 2.0).tan();
        let mut corners = [Point3::origin(); 8];
        for (plane, depth) in [near, far].into_iter().enumerate() {
            let half_y = depth * tan_half;
            let half_x = half_y * aspect;
            for i in 0..4 {
                let x = if i & 1 == 0 { -half_x } else { half_x };
                let y = if i & 2 == 0 { -half_y } else { half_y };
                corners[plane * 4 + i] = Point3::new(x, y, -depth);
            }
        }
        Self { corners }
    }

    /// Transforms the corners into world space via the inverse camera view.
    pub fn to_world(&self, inverse_view: &Matrix4<f32>) -> [Point3<f32>; 8] {
        self.corners.map(|c| inverse_view.transform_point(c))
    }
}

/// Far distance of each cascade: `far / divisor[i]`.
pub fn cascade_far_distances(far: f32, divisors: &[f32; CASCADE_COUNT]) -> [f32; CASCADE_COUNT] {
    divisors.map(|d| far / d)
}

fn centroid(points: &[Point3<f32>; 8]) -> Point3<f32> {
    let sum = points
        .iter()
        .fold(Vector3::new(0.0, 0.0, 0.0), |acc, p| acc + p.to_vec());
    Point3::from_vec(sum / 8.0)
}

/// Depth-range inflation keeping casters outside the slice in the map.
///
/// Values are stretched away from zero when already outside and pulled
/// toward zero when inside, always widening the interval. Heuristic, not
/// physically derived.
fn pad_depth_range(min_z: f32, max_z: f32, factor: f32) -> (f32, f32) {
    let min_z = if min_z < 0.0 {
        min_z * factor
    } else {
        min_z / factor
    };
    let max_z = if max_z < 0.0 {
        max_z / factor
    } else {
        max_z * factor
    };
    (min_z, max_z)
}

/// Fits an orthographic light volume around one slice's world corners.
///
/// The light eye retreats from the corner centroid along the reversed
/// (unit) light direction, looks back at the centroid with world up, and
/// the volume is the axis-aligned bounds of the corners in that view with
/// the padded depth range.
pub fn light_space_matrix(
    world_corners: &[Point3<f32>; 8],
    light_dir: Vector3<f32>,
    config: &CascadeConfig,
) -> Matrix4<f32> {
    let center = centroid(world_corners);
    let eye = center - light_dir * config.light_retreat;
    let light_view = Matrix4::look_at_rh(eye, center, Vector3::unit_y());

    let mut min = Vector3::new(f32::MAX, f32::MAX, f32::MAX);
    let mut max = Vector3::new(f32::MIN, f32::MIN, f32::MIN);
    for corner in world_corners {
        let p = light_view.transform_point(*corner);
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    let (min_z, max_z) = pad_depth_range(min.z, max.z, config.depth_padding);

    // Light space is right-handed: corners in front of the light sit at
    // negative z, so the ortho near/far distances come from -max/-min.
    let light_proj = cgmath::ortho(min.x, max.x, min.y, max.y, -max_z, -min_z);
    OPENGL_TO_WGPU_MATRIX * light_proj * light_view
}

/// Computes all cascade light-space matrices plus their far distances.
///
/// Slice i covers `[previous far (or camera near), far_distances[i]]` of
/// the camera's view depth.
pub fn cascade_matrices(
    frustum: &CameraFrustum,
    light_dir: Vector3<f32>,
    config: &CascadeConfig,
) -> ([Matrix4<f32>; CASCADE_COUNT], [f32; CASCADE_COUNT]) {
    let far_distances = cascade_far_distances(frustum.far, &config.split_divisors);
    let inverse_view = frustum
        .view
        .invert()
        .unwrap_or_else(Matrix4::identity);

    let mut matrices = [Matrix4::identity(); CASCADE_COUNT];
    let mut slice_near = frustum.near;
    for (i, &slice_far) in far_distances.iter().enumerate() {
        let corners = FrustumCorners::slice(frustum.fovy, frustum.aspect, slice_near, slice_far);
        let world = corners.to_world(&inverse_view);
        matrices[i] = light_space_matrix(&world, light_dir, config);
        slice_near = slice_far;
    }

    (matrices, far_distances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{assert_relative_eq, Deg, InnerSpace};

    fn unit(v: Vector3<f32>) -> Vector3<f32> {
        v.normalize()
    }

    #[test]
    fn far_distances_match_fixed_fractions() {
        let config = CascadeConfig::default();
        let distances = cascade_far_distances(1000.0, &config.split_divisors);
        assert_eq!(distances, [20.0, 40.0, 100.0, 500.0, 1000.0]);
    }

    #[test]
    fn far_distances_strictly_increase_and_end_at_far() {
        let config = CascadeConfig::default();
        let far = 730.0;
        let distances = cascade_far_distances(far, &config.split_divisors);
        for pair in distances.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(distances[CASCADE_COUNT - 1], far);
    }

    #[test]
    fn slice_corners_for_square_frustum() {
        // 90 degree vertical fov, aspect 1: half extent equals depth.
        let corners = FrustumCorners::slice(Rad::from(Deg(90.0)), 1.0, 1.0, 10.0);
        for c in &corners.corners[0..4] {
            assert_relative_eq!(c.x.abs(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(c.y.abs(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(c.z, -1.0, epsilon = 1e-5);
        }
        for c in &corners.corners[4..8] {
            assert_relative_eq!(c.x.abs(), 10.0, epsilon = 1e-4);
            assert_relative_eq!(c.y.abs(), 10.0, epsilon = 1e-4);
            assert_relative_eq!(c.z, -10.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn aspect_scales_horizontal_extent_only() {
        let corners = FrustumCorners::slice(Rad::from(Deg(90.0)), 2.0, 1.0, 2.0);
        assert_relative_eq!(corners.corners[0].x.abs(), 2.0, epsilon = 1e-5);
        assert_relative_eq!(corners.corners[0].y.abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn depth_padding_always_widens_the_range() {
        // Both negative: far end stretched, near end pulled in.
        assert_eq!(pad_depth_range(-5.0, -1.0, 10.0), (-50.0, -0.1));
        // Straddling zero: both ends stretched outward.
        assert_eq!(pad_depth_range(-5.0, 2.0, 10.0), (-50.0, 20.0));
        // Both positive (entirely behind the light).
        let (min_z, max_z) = pad_depth_range(3.0, 8.0, 10.0);
        assert_relative_eq!(min_z, 0.3, epsilon = 1e-6);
        assert_relative_eq!(max_z, 80.0, epsilon = 1e-6);
        // The padded interval always contains the original.
        assert!(min_z <= 3.0 && max_z >= 8.0);
    }

    #[test]
    fn light_volume_encloses_slice_corners() {
        let frustum = CameraFrustum {
            fovy: Rad::from(Deg(60.0)),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            view: Matrix4::look_at_rh(
                Point3::new(3.0, 4.0, 8.0),
                Point3::new(0.0, 0.0, 0.0),
                Vector3::unit_y(),
            ),
        };
        let light_dir = unit(Vector3::new(-0.4, -0.8, 0.3));
        let config = CascadeConfig::default();
        let inverse_view = frustum.view.invert().unwrap();

        let (matrices, distances) = cascade_matrices(&frustum, light_dir, &config);

        let mut slice_near = frustum.near;
        for (matrix, &slice_far) in matrices.iter().zip(distances.iter()) {
            let corners =
                FrustumCorners::slice(frustum.fovy, frustum.aspect, slice_near, slice_far);
            for corner in corners.to_world(&inverse_view) {
                let clip = matrix * corner.to_homogeneous();
                let ndc = clip.truncate() / clip.w;
                assert!(ndc.x >= -1.0 - 1e-3 && ndc.x <= 1.0 + 1e-3);
                assert!(ndc.y >= -1.0 - 1e-3 && ndc.y <= 1.0 + 1e-3);
                // Depth padding keeps corners strictly inside [0, 1].
                assert!(ndc.z > 0.0 && ndc.z < 1.0);
            }
            slice_near = slice_far;
        }
    }

    #[test]
    fn light_volume_is_tight_in_xy() {
        // At least one corner must land on each x/y edge of the volume.
        let corners = FrustumCorners::slice(Rad::from(Deg(45.0)), 1.5, 1.0, 50.0);
        let world = corners.to_world(&Matrix4::identity());
        let matrix = light_space_matrix(
            &world,
            unit(Vector3::new(0.2, -1.0, 0.1)),
            &CascadeConfig::default(),
        );

        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for corner in world {
            let clip = matrix * corner.to_homogeneous();
            let ndc = clip.truncate() / clip.w;
            min_x = min_x.min(ndc.x);
            max_x = max_x.max(ndc.x);
            min_y = min_y.min(ndc.y);
            max_y = max_y.max(ndc.y);
        }
        assert_relative_eq!(min_x, -1.0, epsilon = 1e-3);
        assert_relative_eq!(max_x, 1.0, epsilon = 1e-3);
        assert_relative_eq!(min_y, -1.0, epsilon = 1e-3);
        assert_relative_eq!(max_y, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn matrices_track_the_camera_pose() {
        let config = CascadeConfig::default();
        let light_dir = unit(Vector3::new(0.0, -1.0, 0.2));
        let base = CameraFrustum {
            fovy: Rad::from(Deg(60.0)),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            view: Matrix4::look_at_rh(
                Point3::new(0.0, 2.0, 5.0),
                Point3::origin(),
                Vector3::unit_y(),
            ),
        };
        let moved = CameraFrustum {
            view: Matrix4::look_at_rh(
                Point3::new(40.0, 2.0, 5.0),
                Point3::new(40.0, 0.0, 0.0),
                Vector3::unit_y(),
            ),
            ..base
        };

        let (a, _) = cascade_matrices(&base, light_dir, &config);
        let (b, _) = cascade_matrices(&moved, light_dir, &config);
        assert!(a[0] != b[0], "cascades must be re-derived per camera pose");
    }
}
