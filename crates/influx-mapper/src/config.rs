// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML configuration for the mapper.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::time::TimeUnit;

/// Encoding of a tag column whose attribute has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullTagPolicy {
    /// Fail with `EncodingError::NullTag`.
    #[default]
    Reject,
    /// Leave the tag out of the point.
    Omit,
}

/// Mapper configuration.
///
/// ```yaml
/// null_tags: reject        # or omit
/// query_epoch: ms          # precision requested by the select-all query
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapperConfig {
    /// How absent tag values are encoded.
    #[serde(default)]
    pub null_tags: NullTagPolicy,
    /// Epoch precision for [`InfluxMapper::query`](crate::InfluxMapper::query).
    /// None = the schema's time unit.
    #[serde(default)]
    pub query_epoch: Option<TimeUnit>,
}

/// Configuration parsing errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MapperConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: MapperConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL_YAML: &str = r#"
null_tags: omit
query_epoch: ns
"#;

    #[test]
    fn test_config_parse_defaults() {
        let config = MapperConfig::from_yaml("{}").expect("parse empty mapping");
        assert_eq!(config, MapperConfig::default());
        assert_eq!(config.null_tags, NullTagPolicy::Reject);
        assert!(config.query_epoch.is_none());
    }

    #[test]
    fn test_config_parse_all_fields() {
        let config = MapperConfig::from_yaml(FULL_YAML).expect("parse full yaml");
        assert_eq!(config.null_tags, NullTagPolicy::Omit);
        assert_eq!(config.query_epoch, Some(TimeUnit::Nanos));
    }

    #[test]
    fn test_config_long_unit_names() {
        let config = MapperConfig::from_yaml("query_epoch: seconds").expect("parse");
        assert_eq!(config.query_epoch, Some(TimeUnit::Seconds));
    }

    #[test]
    fn test_config_rejects_unknown_keys_and_values() {
        assert!(matches!(
            MapperConfig::from_yaml("null_tags: drop"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            MapperConfig::from_yaml("batch_size: 10"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(FULL_YAML.as_bytes()).expect("write yaml");

        let config = MapperConfig::from_file(file.path()).expect("load file");
        assert_eq!(config.null_tags, NullTagPolicy::Omit);

        let missing = MapperConfig::from_file(Path::new("/nonexistent/mapper.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
