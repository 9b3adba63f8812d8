// src/error.rs
//! Engine error types
//!
//! Device-level failures (adapter/device acquisition, surface loss, GPU
//! out-of-memory) are terminal for the frame graph and propagate to the
//! application shell. Contract violations such as resource cache misuse
//! panic instead; they indicate a defect, not a runtime condition.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    AdapterNotFound(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create rendering surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to load mesh '{path}': {source}")]
    MeshLoad {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("pipeline creation failed: {0}")]
    PipelineCreation(String),
}
