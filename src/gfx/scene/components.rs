//! Data components attached to entities.
//!
//! Components hold CPU-side state; GPU resources are filled in by
//! `World::init_gpu_resources` once a device exists, so a `World` can be
//! built and queried without any GPU at all.

use cgmath::{
    Deg, InnerSpace, Matrix, Matrix4, Quaternion, Rotation, Rotation3, SquareMatrix, Vector3,
};

use crate::config::ALPHA_EPSILON;
use crate::gfx::resources::texture::TextureResource;
use crate::gfx::scene::mesh::Mesh;

/// Position, orientation, and scale of an entity.
///
/// Rotation is stored as Euler angles in degrees (pitch around X, yaw
/// around Y, roll around Z).
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// Orientation as a quaternion, yaw applied after pitch after roll.
    pub fn orientation(&self) -> Quaternion<f32> {
        Quaternion::from_angle_y(Deg(self.rotation.y))
            * Quaternion::from_angle_x(Deg(self.rotation.x))
            * Quaternion::from_angle_z(Deg(self.rotation.z))
    }

    /// Direction the entity faces: rotated +Z.
    ///
    /// Used as the emit direction for directional and spot lights.
    pub fn forward(&self) -> Vector3<f32> {
        self.orientation().rotate_vector(Vector3::unit_z()).normalize()
    }

    /// Model matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.orientation())
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse-transpose of the model matrix for transforming normals.
    ///
    /// Falls back to identity for non-invertible (zero-scale) transforms.
    pub fn normal_matrix(&self) -> Matrix4<f32> {
        self.matrix()
            .invert()
            .map(|m| m.transpose())
            .unwrap_or_else(Matrix4::identity)
    }
}

/// Raw RGBA8 pixel data for procedural or loaded textures.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureData {
    pub fn solid(color: [u8; 4], width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&color);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Two-color checkerboard with `cells` squares per side.
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            pixels,
            width: size,
            height: size,
        }
    }

    /// Vertical gradient from `top` (row 0) to `bottom`.
    pub fn vertical_gradient(size: u32, top: [u8; 4], bottom: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            let t = y as f32 / (size.max(2) - 1) as f32;
            let mut color = [0u8; 4];
            for c in 0..4 {
                color[c] = (top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * t) as u8;
            }
            for _ in 0..size {
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            pixels,
            width: size,
            height: size,
        }
    }
}

/// Geometry to draw for an entity.
pub struct MeshComponent {
    pub mesh: Mesh,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl MeshComponent {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            cast_shadows: true,
            receive_shadows: true,
        }
    }

    pub fn with_cast_shadows(mut self, cast: bool) -> Self {
        self.cast_shadows = cast;
        self
    }

    pub fn with_receive_shadows(mut self, receive: bool) -> Self {
        self.receive_shadows = receive;
        self
    }
}

/// Surface appearance of an entity.
///
/// A diffuse map is expected; normal and height maps are optional and gate
/// the corresponding shader paths. Alpha in `color` decides each frame
/// whether the entity renders in the opaque or the transparent pass.
pub struct MaterialComponent {
    pub color: [f32; 4],
    pub tiling: [f32; 2],
    pub shininess: f32,
    pub depth_map_scale: f32,
    pub diffuse: Option<TextureData>,
    pub normal: Option<TextureData>,
    pub height: Option<TextureData>,
    pub(crate) diffuse_gpu: Option<TextureResource>,
    pub(crate) normal_gpu: Option<TextureResource>,
    pub(crate) height_gpu: Option<TextureResource>,
}

impl MaterialComponent {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            color,
            tiling: [1.0, 1.0],
            shininess: 32.0,
            depth_map_scale: 0.1,
            diffuse: None,
            normal: None,
            height: None,
            diffuse_gpu: None,
            normal_gpu: None,
            height_gpu: None,
        }
    }

    pub fn with_diffuse(mut self, texture: TextureData) -> Self {
        self.diffuse = Some(texture);
        self
    }

    pub fn with_normal_map(mut self, texture: TextureData) -> Self {
        self.normal = Some(texture);
        self
    }

    pub fn with_height_map(mut self, texture: TextureData) -> Self {
        self.height = Some(texture);
        self
    }

    pub fn with_tiling(mut self, tiling: [f32; 2]) -> Self {
        self.tiling = tiling;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    /// Opaque iff alpha is within `ALPHA_EPSILON` of fully opaque.
    ///
    /// Evaluated per frame; an entity whose alpha animates below the
    /// threshold moves to the transparent pass on the next frame.
    pub fn is_opaque(&self) -> bool {
        self.color[3] >= 1.0 - ALPHA_EPSILON
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DirectionalLightComponent {
    pub color: [f32; 3],
    pub ambient_intensity: f32,
    pub intensity: f32,
}

impl Default for DirectionalLightComponent {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.2,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PointLightComponent {
    pub color: [f32; 3],
    pub ambient_intensity: f32,
    pub intensity: f32,
    pub shadow_near_z: f32,
    pub shadow_far_z: f32,
}

impl Default for PointLightComponent {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.05,
            intensity: 1.0,
            shadow_near_z: 0.5,
            shadow_far_z: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpotLightComponent {
    pub color: [f32; 3],
    pub ambient_intensity: f32,
    pub intensity: f32,
    /// Full-intensity cone half-angle, degrees.
    pub inner_cutoff_deg: f32,
    /// Zero-intensity cone half-angle, degrees.
    pub outer_cutoff_deg: f32,
    pub shadow_near_z: f32,
    pub shadow_far_z: f32,
}

impl Default for SpotLightComponent {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.05,
            intensity: 1.0,
            inner_cutoff_deg: 15.0,
            outer_cutoff_deg: 25.0,
            shadow_near_z: 0.5,
            shadow_far_z: 100.0,
        }
    }
}

/// Background cube texture; at most one per world is rendered.
pub struct SkyboxComponent {
    /// Face order +X, -X, +Y, -Y, +Z, -Z; all faces square and equal size.
    pub faces: Box<[TextureData; 6]>,
    pub(crate) gpu: Option<TextureResource>,
}

impl SkyboxComponent {
    pub fn new(faces: [TextureData; 6]) -> Self {
        Self {
            faces: Box::new(faces),
            gpu: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{assert_relative_eq, Point3, Transform as _};

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let t = TransformComponent::at(Vector3::new(1.0, 0.0, 0.0))
            .with_rotation(Vector3::new(0.0, 90.0, 0.0))
            .with_scale(Vector3::new(2.0, 2.0, 2.0));
        let p = t.matrix().transform_point(Point3::new(1.0, 0.0, 0.0));
        // (1,0,0) scales to (2,0,0), yaw 90 takes it to (0,0,-2), then the
        // translation shifts x by one.
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn forward_follows_yaw_and_pitch() {
        let identity = TransformComponent::default();
        let f = identity.forward();
        assert_relative_eq!(f.z, 1.0, epsilon = 1e-5);

        let yawed = TransformComponent::default().with_rotation(Vector3::new(0.0, 90.0, 0.0));
        let f = yawed.forward();
        assert_relative_eq!(f.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(f.z, 0.0, epsilon = 1e-5);

        let pitched = TransformComponent::default().with_rotation(Vector3::new(90.0, 0.0, 0.0));
        let f = pitched.forward();
        assert_relative_eq!(f.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_of_zero_scale_falls_back_to_identity() {
        let t = TransformComponent::default().with_scale(Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(t.normal_matrix(), Matrix4::identity());
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let t = TransformComponent::default().with_scale(Vector3::new(2.0, 1.0, 1.0));
        let n = t
            .normal_matrix()
            .transform_vector(cgmath::Vector3::new(1.0, 0.0, 0.0));
        // A +X face normal on a mesh stretched along X stays +X after
        // normalization, not scaled.
        let n = n.normalize();
        assert_relative_eq!(n.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn opacity_threshold_uses_alpha_epsilon() {
        let opaque = MaterialComponent::new([1.0, 1.0, 1.0, 1.0]);
        assert!(opaque.is_opaque());

        let barely = MaterialComponent::new([1.0, 1.0, 1.0, 1.0 - ALPHA_EPSILON]);
        assert!(barely.is_opaque());

        let translucent = MaterialComponent::new([1.0, 1.0, 1.0, 1.0 - ALPHA_EPSILON * 10.0]);
        assert!(!translucent.is_opaque());
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let tex = TextureData::checkerboard(4, 2, [255, 0, 0, 255], [0, 255, 0, 255]);
        assert_eq!(tex.pixels.len(), 64);
        // First pixel red, pixel at (2,0) green.
        assert_eq!(&tex.pixels[0..4], &[255, 0, 0, 255]);
        assert_eq!(&tex.pixels[8..12], &[0, 255, 0, 255]);
    }

    #[test]
    fn solid_texture_fills_every_pixel() {
        let tex = TextureData::solid([1, 2, 3, 4], 3, 2);
        assert_eq!(tex.pixels.len(), 24);
        for px in tex.pixels.chunks(4) {
            assert_eq!(px, &[1, 2, 3, 4]);
        }
    }
}
