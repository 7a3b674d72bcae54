//! Engine configuration.
//!
//! [`EngineConfig`] deserializes with per-field defaults, so a host
//! application can embed it in its own configuration files and name only the
//! settings it changes:
//!
//! ```rust
//! use weft_render::EngineConfig;
//!
//! let config: EngineConfig = serde_json::from_str(r#"{"directive_prefix": "p-"}"#).unwrap();
//! assert_eq!(config.directive_prefix, "p-");
//! assert_eq!(config.max_depth, 64);
//! ```

use serde::{Deserialize, Serialize};

/// Default limit on nested directive renders.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit on fixed-point passes per render.
pub const DEFAULT_MAX_PASSES: usize = 256;

/// Settings for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix of directive attribute names: with `"p-"` the directives are
    /// `p-if`, `p-for` and `p-bind:ATTR`.
    pub directive_prefix: String,

    /// Maximum nesting of directive elements rendered inside one another.
    pub max_depth: usize,

    /// Maximum directive passes before a render gives up.
    pub max_passes: usize,

    /// Render fatal failures as a `<!-- Template Error: ... -->` comment.
    /// When off they render as an empty string.
    pub diagnostics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            directive_prefix: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_passes: DEFAULT_MAX_PASSES,
            diagnostics: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directive_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.directive_prefix = prefix.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the pass limit; values below 1 are raised to 1.
    pub fn max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.directive_prefix, "");
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.max_passes, 256);
        assert!(config.diagnostics);
    }

    #[test]
    fn partial_deserialization_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"max_depth": 8, "diagnostics": false}"#).unwrap();
        assert_eq!(config.max_depth, 8);
        assert!(!config.diagnostics);
        assert_eq!(config.max_passes, DEFAULT_MAX_PASSES);

        let empty: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, EngineConfig::default());
    }

    #[test]
    fn builder() {
        let config = EngineConfig::new()
            .directive_prefix("x-")
            .max_depth(3)
            .max_passes(0)
            .diagnostics(false);
        assert_eq!(config.directive_prefix, "x-");
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_passes, 1);
        assert!(!config.diagnostics);
    }
}
