// src/lib.rs
//! gloam
//!
//! A real-time render graph built on wgpu and winit: cascaded shadow maps,
//! Blinn-Phong shading, weighted-blended transparency, and a gamma resolve,
//! driven by a small entity world.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::GloamApp;
pub use config::{GraphConfig, LoggingConfig};
pub use error::RenderError;

/// Creates a default application instance
pub fn default() -> GloamApp {
    pollster::block_on(GloamApp::new())
}
