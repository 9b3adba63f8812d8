// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! The typed resource cache, texture constructors, material bindings, and
//! per-frame light packing.

pub mod cache;
pub mod lights;
pub mod material;
pub mod texture;

// Re-export main types
pub use cache::ResourceCache;
pub use lights::{build_frame_lights, FrameLights, LightsUniform};
pub use material::{MaterialBindings, MaterialUniform};
pub use texture::TextureResource;
