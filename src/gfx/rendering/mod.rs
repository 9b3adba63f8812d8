// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, the frame graph pass sequence, and frame
//! rendering.

pub mod cascade;
pub mod frame_graph;
pub mod passes;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use frame_graph::FrameGraph;
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;
