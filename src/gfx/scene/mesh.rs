use crate::error::RenderError;
use crate::gfx::geometry::{GeometryData, Vertex3D};

/// Indexed triangle mesh with lazily created GPU buffers.
///
/// CPU data is kept so meshes can be built and inspected before a device
/// exists; `init_gpu_resources` uploads once.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
}

impl Mesh {
    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    pub fn from_geometry(geometry: &GeometryData) -> Self {
        let (vertices, indices) = geometry.to_scene_format();
        Self::from_vertices(vertices, indices)
    }

    /// Loads all models from an OBJ file.
    ///
    /// Positions and indices are required; normals are generated from faces
    /// when the file has none, and missing texture coordinates default to
    /// (0, 0). OBJ texture coordinates are flipped to top-left origin.
    pub fn load_obj(path: &str) -> Result<Vec<Mesh>, RenderError> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| RenderError::MeshLoad {
            path: path.to_string(),
            source,
        })?;

        let mut meshes = Vec::with_capacity(models.len());
        for model in &models {
            let mesh = &model.mesh;

            let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len()
            {
                mesh.normals.clone()
            } else {
                log::debug!("model '{}' has no normals, generating from faces", model.name);
                Self::calculate_face_normals(&mesh.positions, &mesh.indices)
            };

            let vertex_count = mesh.positions.len() / 3;
            let mut vertices = Vec::with_capacity(vertex_count);
            for i in 0..vertex_count {
                let uv = if mesh.texcoords.len() >= (i + 1) * 2 {
                    [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                };
                vertices.push(Vertex3D {
                    position: [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ],
                    normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                    uv,
                });
            }

            meshes.push(Mesh::from_vertices(vertices, mesh.indices.clone()));
        }

        Ok(meshes)
    }

    /// Averaged per-vertex normals from face cross products.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];
        let mut counts = vec![0; vertex_count];

        for triangle in indices.chunks(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let v0 = [
                positions[i0 * 3],
                positions[i0 * 3 + 1],
                positions[i0 * 3 + 2],
            ];
            let v1 = [
                positions[i1 * 3],
                positions[i1 * 3 + 1],
                positions[i1 * 3 + 2],
            ];
            let v2 = [
                positions[i2 * 3],
                positions[i2 * 3 + 1],
                positions[i2 * 3 + 2],
            ];

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal[0];
                normals[vertex_idx * 3 + 1] += face_normal[1];
                normals[vertex_idx * 3 + 2] += face_normal[2];
                counts[vertex_idx] += 1;
            }
        }

        for i in 0..vertex_count {
            if counts[i] > 0 {
                normals[i * 3] /= counts[i] as f32;
                normals[i * 3 + 1] /= counts[i] as f32;
                normals[i * 3 + 2] /= counts[i] as f32;

                let length = (normals[i * 3].powi(2)
                    + normals[i * 3 + 1].powi(2)
                    + normals[i * 3 + 2].powi(2))
                .sqrt();
                if length > 0.0 {
                    normals[i * 3] /= length;
                    normals[i * 3 + 1] /= length;
                    normals[i * 3 + 2] /= length;
                }
            }
        }

        normals
    }

    /// Uploads vertex and index buffers; a second call is a no-op.
    pub fn init_gpu_resources(&mut self, device: &wgpu::Device) {
        if self.vertex_buffer.is_some() {
            return;
        }

        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index_buffer.as_ref()
    }
}

/// Extension trait binding a mesh's buffers and issuing the indexed draw.
///
/// Meshes without uploaded buffers are skipped silently, so passes never
/// have to check upload state themselves.
pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        if let (Some(vertex_buffer), Some(index_buffer)) =
            (mesh.vertex_buffer(), mesh.index_buffer())
        {
            self.set_vertex_buffer(0, vertex_buffer.slice(..));
            self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            self.draw_indexed(0..mesh.index_count(), 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;

    #[test]
    fn from_geometry_preserves_counts() {
        let mesh = Mesh::from_geometry(&generate_cube());
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn face_normals_point_away_from_winding() {
        // One triangle in the XZ plane wound counter-clockwise seen from +Y.
        let positions = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        let indices = [0u32, 1, 2];
        let normals = Mesh::calculate_face_normals(&positions, &indices);
        for i in 0..3 {
            assert!((normals[i * 3 + 1] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn face_normals_average_shared_vertices() {
        // Two triangles sharing an edge, one facing +Y, folded 90 degrees.
        let positions = [
            0.0, 0.0, 0.0, // shared
            1.0, 0.0, 0.0, // shared
            0.0, 0.0, 1.0, // flat triangle vertex
            0.0, 1.0, 0.0, // folded triangle vertex
        ];
        let indices = [0u32, 2, 1, 0, 1, 3];
        let normals = Mesh::calculate_face_normals(&positions, &indices);
        // Shared vertex 0 averages +Y and +Z face normals.
        let n = [normals[0], normals[1], normals[2]];
        assert!(n[1] > 0.0 && n[2] > 0.0);
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }

    #[test]
    fn missing_obj_file_reports_path() {
        let err = Mesh::load_obj("does/not/exist.obj").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("does/not/exist.obj"));
    }
}
