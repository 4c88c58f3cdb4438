//! Destinations for generated files

use prost_types::compiler::{code_generator_response::File, CodeGeneratorResponse};
use protoc_wrapper_common::{Result, WrapperError};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// File-opening capability handed to generators
pub trait OutputDirectory {
    /// Write a generated file; `name` is `/`-separated and relative
    fn write_file(&mut self, name: &str, content: &[u8]) -> Result<()>;
}

/// Writes generated files below a root directory
#[derive(Debug)]
pub struct DiskOutput {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DiskOutput {
    /// Create the root directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            WrapperError::Generation(format!(
                "Failed to create output directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self {
            root,
            written: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths written so far, in write order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputDirectory for DiskOutput {
    fn write_file(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let relative = checked_relative_path(name)?;
        let path = self.root.join(relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                WrapperError::Generation(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        fs::write(&path, content).map_err(|e| {
            WrapperError::Generation(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), bytes = content.len(), "generated file written");
        self.written.push(path);
        Ok(())
    }
}

/// Collects generated files into a `CodeGeneratorResponse`
#[derive(Debug, Default)]
pub struct ResponseOutput {
    files: Vec<File>,
}

impl ResponseOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn into_files(self) -> Vec<File> {
        self.files
    }

    pub fn into_response(self) -> CodeGeneratorResponse {
        CodeGeneratorResponse {
            file: self.files,
            ..Default::default()
        }
    }
}

impl OutputDirectory for ResponseOutput {
    fn write_file(&mut self, name: &str, content: &[u8]) -> Result<()> {
        checked_relative_path(name)?;
        // The response carries file content as a proto `string`
        let content = String::from_utf8(content.to_vec()).map_err(|_| {
            WrapperError::Generation(format!(
                "{} is binary and cannot be returned in a plugin response",
                name
            ))
        })?;
        self.files.push(File {
            name: Some(name.to_string()),
            content: Some(content),
            ..Default::default()
        });
        Ok(())
    }
}

/// Reject names that would land outside the output root
fn checked_relative_path(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    if name.is_empty() {
        return Err(WrapperError::Generation(
            "Generated file has an empty name".to_string(),
        ));
    }
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(WrapperError::Generation(format!(
            "Generated file name '{}' escapes the output directory",
            name
        )));
    }
    Ok(path.to_path_buf())
}
