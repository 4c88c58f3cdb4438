//! Wrapper configuration loaded from YAML files
//!
//! Every key is optional; command-line flags take precedence over values
//! read here.

use crate::{GeneratorKind, Result, WrapperError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name used for descriptor sets written by the `descriptors` generator
pub const DEFAULT_DESCRIPTOR_SET_NAME: &str = "descriptor_set.dsc";

/// Root structure of a `protoc-wrapper` YAML configuration file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WrapperConfig {
    /// Directories searched for imports, in order
    pub include_paths: Vec<PathBuf>,
    /// Emit the transitive closure of the roots instead of the roots only
    pub include_imports: bool,
    /// Keep `source_code_info` in emitted descriptors
    pub include_source_info: bool,
    /// Descriptor set output settings
    pub descriptor_set: DescriptorSetConfig,
    /// External plugin programs backing the Java generators
    pub plugins: PluginsConfig,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            include_imports: true,
            include_source_info: false,
            descriptor_set: DescriptorSetConfig::default(),
            plugins: PluginsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DescriptorSetConfig {
    /// File name of the serialized set (e.g., "descriptor_set.dsc")
    pub name: String,
    /// Directory the set is written to instead of the generator output directory
    pub output_dir: Option<PathBuf>,
}

impl Default for DescriptorSetConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DESCRIPTOR_SET_NAME.to_string(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginsConfig {
    pub java: Option<PathBuf>,
    #[serde(rename = "grpc-java")]
    pub grpc_java: Option<PathBuf>,
}

impl WrapperConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WrapperError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml_str(&content).map_err(|e| match e {
            WrapperError::Config(msg) => {
                WrapperError::Config(format!("{} (in {:?})", msg, path))
            }
            other => other,
        })
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a struct
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content)
            .map_err(|e| WrapperError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Search paths to hand to the resolver; the current directory when none are set
    pub fn search_paths(&self, overrides: &[PathBuf]) -> Vec<PathBuf> {
        if !overrides.is_empty() {
            overrides.to_vec()
        } else if !self.include_paths.is_empty() {
            self.include_paths.clone()
        } else {
            vec![PathBuf::from(".")]
        }
    }

    /// Program implementing the given plugin-backed generator
    ///
    /// Returns `None` for generators that run in-process.
    pub fn plugin_program(&self, kind: GeneratorKind) -> Option<PathBuf> {
        match kind {
            GeneratorKind::Descriptors => None,
            GeneratorKind::JavaMessages => Some(
                self.plugins
                    .java
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("protoc-gen-java")),
            ),
            GeneratorKind::JavaGrpc => Some(
                self.plugins
                    .grpc_java
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("protoc-gen-grpc-java")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WrapperConfig::default();
        assert!(config.include_imports);
        assert!(!config.include_source_info);
        assert_eq!(config.descriptor_set.name, "descriptor_set.dsc");
        assert_eq!(config.search_paths(&[]), vec![PathBuf::from(".")]);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
include_paths: [proto, third_party]
include_imports: false
include_source_info: true
descriptor_set:
  name: api.desc
  output_dir: target/descriptors
plugins:
  java: /opt/protoc/bin/protoc-gen-java
  grpc-java: /opt/protoc/bin/protoc-gen-grpc-java
"#;
        let config = WrapperConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.include_paths,
            vec![PathBuf::from("proto"), PathBuf::from("third_party")]
        );
        assert!(!config.include_imports);
        assert!(config.include_source_info);
        assert_eq!(config.descriptor_set.name, "api.desc");
        assert_eq!(
            config.descriptor_set.output_dir,
            Some(PathBuf::from("target/descriptors"))
        );
        assert_eq!(
            config.plugin_program(GeneratorKind::JavaGrpc),
            Some(PathBuf::from("/opt/protoc/bin/protoc-gen-grpc-java"))
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = WrapperConfig::from_yaml_str("include_paths: [src/main/proto]\n").unwrap();
        assert!(config.include_imports);
        assert_eq!(config.descriptor_set.name, DEFAULT_DESCRIPTOR_SET_NAME);
        assert_eq!(
            config.plugin_program(GeneratorKind::JavaMessages),
            Some(PathBuf::from("protoc-gen-java"))
        );
        assert_eq!(config.plugin_program(GeneratorKind::Descriptors), None);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            WrapperConfig::from_yaml_str("  \n").unwrap(),
            WrapperConfig::default()
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = WrapperConfig::from_yaml_str("include_path: [proto]\n").unwrap_err();
        assert!(matches!(err, WrapperError::Config(_)));
    }

    #[test]
    fn test_search_path_precedence() {
        let config = WrapperConfig::from_yaml_str("include_paths: [from_config]\n").unwrap();
        assert_eq!(config.search_paths(&[]), vec![PathBuf::from("from_config")]);
        assert_eq!(
            config.search_paths(&[PathBuf::from("from_cli")]),
            vec![PathBuf::from("from_cli")]
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "descriptor_set:\n  name: out.pb").unwrap();

        let config = WrapperConfig::load(file.path()).unwrap();
        assert_eq!(config.descriptor_set.name, "out.pb");
    }

    #[test]
    fn test_load_missing_file() {
        let err = WrapperConfig::load(Path::new("/nonexistent/protoc-wrapper.yaml")).unwrap_err();
        assert!(matches!(err, WrapperError::Config(_)));
    }
}
