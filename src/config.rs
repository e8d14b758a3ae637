//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default limit for inputs handed to pattern operators (1 MiB)
pub const DEFAULT_MAX_PATTERN_INPUT: usize = 1024 * 1024;

/// Settings that shape evaluation but never the tree itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// chrono format for string/date conversions without an explicit format.
    /// `None` means RFC 3339.
    pub date_format: Option<String>,
    /// Longest input, in bytes, accepted by regular-expression operators
    pub max_pattern_input: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            max_pattern_input: Some(DEFAULT_MAX_PATTERN_INPUT),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn with_max_pattern_input(mut self, limit: Option<usize>) -> Self {
        self.max_pattern_input = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.date_format, None);
        assert_eq!(config.max_pattern_input, Some(DEFAULT_MAX_PATTERN_INPUT));
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .with_date_format("%Y-%m-%d")
            .with_max_pattern_input(None);
        assert_eq!(config.date_format.as_deref(), Some("%Y-%m-%d"));
        assert_eq!(config.max_pattern_input, None);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"date_format": "%Y"}"#).unwrap();
        assert_eq!(config.date_format.as_deref(), Some("%Y"));
        assert_eq!(config.max_pattern_input, Some(DEFAULT_MAX_PATTERN_INPUT));

        let config: EngineConfig = serde_json::from_str(r#"{"max_pattern_input": null}"#).unwrap();
        assert_eq!(config.max_pattern_input, None);
    }
}
