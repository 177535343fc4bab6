//! Context configuration
//!
//! Loaded from JSON; every field is optional and falls back to its default.

use anyhow::{Context, Result};
use picagl_core::memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for a [`crate::GlContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Memory domain sizes
    pub memory: MemoryConfig,
    /// Maximum model-view stack depth
    pub modelview_depth: usize,
    /// Maximum projection stack depth
    pub projection_depth: usize,
    /// Maximum depth of each texture-unit stack
    pub texture_depth: usize,
    /// Delay the simulated GPU adds to every command, in microseconds
    pub gpu_latency_us: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            modelview_depth: 32,
            projection_depth: 4,
            texture_depth: 4,
            gpu_latency_us: 0,
        }
    }
}

impl ContextConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse context configuration")
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize context configuration")
    }

    pub fn gpu_latency(&self) -> Duration {
        Duration::from_micros(self.gpu_latency_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            ContextConfig::from_json_str(r#"{ "projection_depth": 8, "memory": { "heap_size": 4096 } }"#)
                .unwrap();
        assert_eq!(config.projection_depth, 8);
        assert_eq!(config.modelview_depth, 32);
        assert_eq!(config.memory.heap_size, 4096);
        assert_eq!(config.memory.linear_size, MemoryConfig::default().linear_size);
    }

    #[test]
    fn json_round_trip() {
        let config = ContextConfig {
            gpu_latency_us: 250,
            texture_depth: 2,
            ..ContextConfig::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(ContextConfig::from_json_str(&json).unwrap(), config);
        assert_eq!(config.gpu_latency(), Duration::from_micros(250));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ContextConfig::from_json_str("{ \"modelview_depth\": -1 }").is_err());
        assert!(ContextConfig::load(Path::new("/nonexistent/picagl.json")).is_err());
    }
}
