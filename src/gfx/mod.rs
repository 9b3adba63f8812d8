//! # Graphics Module
//!
//! This module contains all graphics-related functionality for the gloam
//! render graph, including camera systems, geometry generation, the
//! rendering pipeline, scene management, and resource handling.
//!
//! ## Architecture Overview
//!
//! The graphics system is organized into several key components:
//!
//! - **Camera System** ([`camera`]) - Orbit camera with smooth controls
//! - **Geometry** ([`geometry`]) - Procedural primitives and the vertex layout
//! - **Rendering Pipeline** ([`rendering`]) - Frame graph with shadow maps,
//!   Blinn-Phong shading, weighted-blended transparency, and gamma resolve
//! - **Scene Management** ([`scene`]) - Entities, components, and queries
//! - **Resource Management** ([`resources`]) - Materials, textures, lights,
//!   and the typed resource cache
//!
//! ## Usage
//!
//! The graphics system is primarily used through the [`RenderEngine`] and
//! [`scene::World`] types:
//!
//! ```no_run
//! use gloam::gfx::scene::World;
//!
//! // The render engine is typically created automatically by GloamApp;
//! // scenes are edited through the world it owns.
//! let mut world = World::new();
//! let entity = world.spawn();
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
