//! Common types and utilities for protoc-wrapper
//!
//! This crate contains the error taxonomy, source identifiers, generator
//! selection and configuration shared by the descriptor, generator and CLI
//! components.

mod config;

pub use config::{DescriptorSetConfig, PluginsConfig, WrapperConfig, DEFAULT_DESCRIPTOR_SET_NAME};

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while building descriptor sets or running generators
#[derive(Error, Debug)]
pub enum WrapperError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Failed to resolve '{identifier}': {message}")]
    Resolution { identifier: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[source] std::io::Error),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WrapperError {
    /// Build a resolution error naming the identifier that failed
    pub fn resolution(identifier: &SourceIdentifier, message: impl fmt::Display) -> Self {
        WrapperError::Resolution {
            identifier: identifier.to_string(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error class
    pub fn exit_code(&self) -> u8 {
        match self {
            WrapperError::Input(_) => 2,
            WrapperError::Resolution { .. } => 3,
            WrapperError::Serialization(_) => 4,
            WrapperError::Generation(_) | WrapperError::Config(_) | WrapperError::Io(_) => 1,
        }
    }
}

/// Result type for protoc-wrapper operations
pub type Result<T> = std::result::Result<T, WrapperError>;

/// Name of a `.proto` source unit as known to the import resolver
///
/// Identifiers always use `/` separators and are relative to one of the
/// configured search paths, e.g. `google/protobuf/timestamp.proto`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceIdentifier(String);

impl SourceIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceIdentifier {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for SourceIdentifier {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for SourceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SourceIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Which generator a command dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneratorKind {
    /// Serialized FileDescriptorSet
    Descriptors,
    /// Java message classes
    JavaMessages,
    /// Java gRPC service stubs
    JavaGrpc,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 3] = [
        GeneratorKind::Descriptors,
        GeneratorKind::JavaMessages,
        GeneratorKind::JavaGrpc,
    ];

    /// Command-line and configuration name of the generator
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Descriptors => "descriptors",
            GeneratorKind::JavaMessages => "java",
            GeneratorKind::JavaGrpc => "grpc-java",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = WrapperError;

    fn from_str(s: &str) -> Result<Self> {
        GeneratorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                WrapperError::Input(format!(
                    "Unknown generator '{}' (expected one of: {})",
                    s,
                    GeneratorKind::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}
