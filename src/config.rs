// src/config.rs
//! Pipeline configuration
//!
//! All tunables of the frame graph live here: shadow map resolution, the
//! cascade split scheme, feature selection for directional shadowing and
//! transparency, and the post-process gamma. The defaults reproduce the
//! reference scene; changing the cascade heuristics changes visual output,
//! so treat them as named constants rather than knobs to tune.

use std::sync::Once;

/// Upper bound of lights uploaded per type; excess lights are ignored.
pub const MAX_LIGHTS: usize = 5;

/// Number of cascades rendered for a cascaded directional light.
pub const CASCADE_COUNT: usize = 5;

/// Renderables with `color.w >= 1 - ALPHA_EPSILON` draw in the opaque pass,
/// everything else goes through the transparency resolver.
pub const ALPHA_EPSILON: f32 = 1e-5;

/// Field of view used for every point-light cube face and for spot lights.
///
/// Spot lights keep this fixed 90 degree frustum regardless of their actual
/// cutoff angle. The mismatch is intentional.
pub const SHADOW_PROJECTION_FOV_DEG: f32 = 90.0;

/// How a directional light renders its shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionalShadowing {
    /// No directional shadow rendering; receivers skip the shadow lookup.
    Off,
    /// One fixed orthographic map per directional light.
    SingleMap,
    /// Cascaded shadow maps driven by the first directional light.
    Cascaded,
}

impl DirectionalShadowing {
    /// Value uploaded in the lights uniform selecting the shader's
    /// directional shadow path.
    pub fn shader_index(self) -> u32 {
        match self {
            DirectionalShadowing::Off => 0,
            DirectionalShadowing::SingleMap => 1,
            DirectionalShadowing::Cascaded => 2,
        }
    }
}

/// How partially transparent renderables resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    /// Transparent renderables are skipped entirely.
    Off,
    /// Weighted-blended order-independent transparency.
    WeightedBlended,
}

/// Cascade split scheme and light-space fitting heuristics.
#[derive(Debug, Clone)]
pub struct CascadeConfig {
    /// Far-plane divisors for each cascade; split i ends at `far / divisor[i]`.
    /// The last divisor must be 1 so the final cascade reaches the far plane.
    pub split_divisors: [f32; CASCADE_COUNT],
    /// Depth range inflation factor applied to the light-space min/max z,
    /// keeping casters outside a slice inside its shadow volume.
    pub depth_padding: f32,
    /// Distance the light eye retreats from the slice centroid along the
    /// reversed light direction before fitting the orthographic volume.
    pub light_retreat: f32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            split_divisors: [50.0, 25.0, 10.0, 2.0, 1.0],
            depth_padding: 10.0,
            light_retreat: 50.0,
        }
    }
}

/// Extent of the single-map directional orthographic volume.
#[derive(Debug, Clone, Copy)]
pub struct SingleMapConfig {
    pub width: f32,
    pub height: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for SingleMapConfig {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            near: 0.1,
            far: 500.0,
        }
    }
}

/// Frame graph configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Shadow map edge length in texels. Fixed at graph construction;
    /// window resizes never touch shadow targets.
    pub shadow_map_size: u32,
    pub cascade: CascadeConfig,
    pub single_map: SingleMapConfig,
    pub directional_shadowing: DirectionalShadowing,
    pub transparency: Transparency,
    /// Display gamma applied by the post-process pass.
    pub gamma: f32,
    /// Clear color of the scene target before the opaque pass.
    pub clear_color: wgpu::Color,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            shadow_map_size: 2048,
            cascade: CascadeConfig::default(),
            single_map: SingleMapConfig::default(),
            directional_shadowing: DirectionalShadowing::Cascaded,
            transparency: Transparency::WeightedBlended,
            gamma: 2.2,
            clear_color: wgpu::Color::TRANSPARENT,
        }
    }
}

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "gloam=debug,wgpu=warn"). When unset, `RUST_LOG` is honored, falling
/// back to info level. `write_style` picks the ANSI color behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Idempotent; subsequent calls are ignored. Intended usage is early in
/// `main` or at application construction.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_splits_match_reference_scheme() {
        let config = CascadeConfig::default();
        assert_eq!(config.split_divisors, [50.0, 25.0, 10.0, 2.0, 1.0]);
        assert_eq!(config.depth_padding, 10.0);
        assert_eq!(config.light_retreat, 50.0);
    }

    #[test]
    fn default_graph_config() {
        let config = GraphConfig::default();
        assert_eq!(config.shadow_map_size, 2048);
        assert_eq!(config.gamma, 2.2);
        assert_eq!(config.directional_shadowing, DirectionalShadowing::Cascaded);
        assert_eq!(config.transparency, Transparency::WeightedBlended);
    }

    #[test]
    fn last_divisor_reaches_far_plane() {
        let config = CascadeConfig::default();
        assert_eq!(config.split_divisors[CASCADE_COUNT - 1], 1.0);
    }
}
