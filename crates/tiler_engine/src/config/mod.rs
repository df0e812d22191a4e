//! Configuration system
//!
//! Capacities and limits of the display list and the traversal engine. Every
//! structure has a `Default` matching the engine's built-in constants and can be
//! loaded from `.toml` or `.ron` through the [`Config`] trait.

pub use serde::{Deserialize, Serialize};

use crate::lighting::MAX_SHADOW_SLOTS;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_str_with_format(&contents, path)
    }

    /// Parse configuration text, picking the format from the file name
    fn from_str_with_format(contents: &str, path: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside the range the engine supports
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Capacity of each render-state stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Material stack slots
    pub material: usize,
    /// Transform stack slots
    pub transform: usize,
    /// Lights stack slots
    pub lights: usize,
    /// Quality stack slots
    pub quality: usize,
    /// Collision-point stack slots
    pub collision: usize,
    /// Instance-substitution stack slots
    pub substitution: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            material: 32,
            transform: 32,
            lights: 16,
            quality: 16,
            collision: 16,
            substitution: 16,
        }
    }
}

/// Limits of the display list and its traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Deepest list nesting the traversal will descend into
    pub max_depth: usize,
    /// Deepest recursion `dump_list` will print
    pub max_dump_depth: usize,
    /// Maximum number of live nodes in the store
    pub max_nodes: usize,
    /// Maximum number of named nodes in the name table
    pub max_names: usize,
    /// Pairs held by one substitution table
    pub max_substitutions: usize,
    /// Active collision points held by one collision state
    pub max_points: usize,
    /// Tolerance used by plane and adjacency tests
    pub plane_epsilon: f32,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: 40,
            max_dump_depth: 64,
            max_nodes: 1 << 20,
            max_names: 1 << 16,
            max_substitutions: 32,
            max_points: 64,
            plane_epsilon: 1e-4,
        }
    }
}

/// Light-state limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Lights held by one lights state
    pub max_lights: usize,
    /// Shadow slots available for shadow-casting lights
    pub max_shadow_slots: usize,
    /// Diffuse and specular terms below this are skipped
    pub shade_epsilon: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            max_lights: 32,
            max_shadow_slots: MAX_SHADOW_SLOTS,
            shade_epsilon: 1e-3,
        }
    }
}

/// Screen and tile geometry of the target device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Screen width in pixels
    pub width: u32,
    /// Screen height in pixels
    pub height: u32,
    /// Edge length of a square tile in pixels
    pub tile_size: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            tile_size: 32,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// State stack capacities
    pub stacks: StackConfig,
    /// Display-list and traversal limits
    pub traversal: TraversalConfig,
    /// Light-state limits
    pub lighting: LightingConfig,
    /// Target screen geometry
    pub viewport: ViewportConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check the values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lighting.max_shadow_slots > MAX_SHADOW_SLOTS {
            return Err(ConfigError::Invalid {
                field: "lighting.max_shadow_slots",
                reason: format!("at most {MAX_SHADOW_SLOTS} slots are supported"),
            });
        }
        if self.viewport.tile_size == 0 || self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid {
                field: "viewport",
                reason: "width, height and tile_size must be non-zero".to_string(),
            });
        }
        let stacks = &self.stacks;
        if [
            stacks.material,
            stacks.transform,
            stacks.lights,
            stacks.quality,
            stacks.collision,
            stacks.substitution,
        ]
        .contains(&0)
        {
            return Err(ConfigError::Invalid {
                field: "stacks",
                reason: "every stack needs at least one slot".to_string(),
            });
        }
        Ok(())
    }
}
