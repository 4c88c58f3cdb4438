//! Import resolution backed by the `protox` compiler

use crate::DescriptorRecord;
use prost_reflect::FileDescriptor;
use protoc_wrapper_common::{Result, SourceIdentifier, WrapperError};
use protox::Compiler;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Locates and parses `.proto` files by name
#[cfg_attr(test, mockall::automock)]
pub trait Resolver {
    /// Resolve one file; fails with `WrapperError::Resolution` naming `id`
    fn resolve(&mut self, id: &SourceIdentifier) -> Result<DescriptorRecord>;
}

/// Resolver that compiles files from a list of search paths
///
/// Opening a file also compiles everything it imports, so imports
/// requested afterwards come straight from the compiler's pool. The
/// well-known `google/protobuf/*.proto` files are always available.
pub struct ProtoxResolver {
    compiler: Compiler,
    search_paths: Vec<PathBuf>,
    include_source_info: bool,
}

impl std::fmt::Debug for ProtoxResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtoxResolver")
            .field("search_paths", &self.search_paths)
            .field("include_source_info", &self.include_source_info)
            .finish_non_exhaustive()
    }
}

impl ProtoxResolver {
    /// Create a resolver searching `search_paths` in order
    ///
    /// An empty list searches the current directory.
    pub fn new<I, P>(search_paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut paths: Vec<PathBuf> = search_paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        if paths.is_empty() {
            paths.push(PathBuf::from("."));
        }

        // Absolute include paths let the compiler map opened paths back to names
        let search_paths = paths
            .iter()
            .map(|p| {
                p.canonicalize().map_err(|e| {
                    WrapperError::Input(format!("Invalid include path {}: {}", p.display(), e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let compiler = Compiler::new(&search_paths).map_err(|e| {
            WrapperError::Input(format!("Failed to configure include paths: {}", e))
        })?;
        debug!(search_paths = ?search_paths, "configured import resolver");

        Ok(Self {
            compiler,
            search_paths,
            include_source_info: false,
        })
    }

    /// Keep `source_code_info` in resolved descriptors
    pub fn include_source_info(mut self, include_source_info: bool) -> Self {
        self.compiler.include_source_info(include_source_info);
        self.include_source_info = include_source_info;
        self
    }

    /// Canonical search paths, in lookup order
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn lookup(&self, id: &SourceIdentifier) -> Option<FileDescriptor> {
        self.compiler.descriptor_pool().get_file_by_name(id.as_str())
    }

    /// Map a compile failure onto the file it is about
    ///
    /// Opening `id` compiles its whole import tree, so the failure may
    /// belong to a transitive import rather than to `id` itself.
    fn compile_error(&self, id: &SourceIdentifier, err: protox::Error) -> WrapperError {
        let message = err.to_string();
        let missing = if err.is_file_not_found() || message.contains("not found") {
            quoted_name(&message)
        } else {
            None
        };
        let failing = missing
            .or_else(|| err.file())
            .map(|name| self.identifier_for(name))
            .unwrap_or_else(|| id.clone());

        if &failing != id {
            debug!(root = %id, file = %failing, "import failed to compile");
        }
        WrapperError::resolution(&failing, message)
    }

    /// Import name for a file the compiler reported, absolute or not
    fn identifier_for(&self, name: &str) -> SourceIdentifier {
        let path = Path::new(name);
        if path.is_absolute() {
            if let Some(relative) = self
                .search_paths
                .iter()
                .find_map(|dir| path.strip_prefix(dir).ok())
            {
                let joined = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                return SourceIdentifier::new(joined);
            }
        }
        SourceIdentifier::from(name)
    }

    fn record(&self, file: &FileDescriptor) -> DescriptorRecord {
        let mut proto = file.file_descriptor_proto().clone();
        if !self.include_source_info {
            proto.source_code_info = None;
        }
        DescriptorRecord::from_proto(proto)
    }
}

impl Resolver for ProtoxResolver {
    fn resolve(&mut self, id: &SourceIdentifier) -> Result<DescriptorRecord> {
        if let Some(file) = self.lookup(id) {
            trace!(file = %id, "resolved from compiled pool");
            return Ok(self.record(&file));
        }

        // First search path holding the file wins; otherwise let the
        // compiler try its own resolvers (well-known types)
        let on_disk = self
            .search_paths
            .iter()
            .map(|dir| dir.join(id.as_str()))
            .find(|candidate| candidate.is_file());
        let target = on_disk.unwrap_or_else(|| PathBuf::from(id.as_str()));

        debug!(file = %id, path = %target.display(), "compiling");
        let opened = self.compiler.open_file(&target).map(|_| ());
        opened.map_err(|e| self.compile_error(id, e))?;

        let file = self
            .lookup(id)
            .ok_or_else(|| WrapperError::resolution(id, "file is not in any search path"))?;
        Ok(self.record(&file))
    }
}

/// First single- or double-quoted name in a compiler message
fn quoted_name(message: &str) -> Option<&str> {
    let start = message.find(['\'', '"'])?;
    let quote = message[start..].chars().next()?;
    let rest = &message[start + 1..];
    let end = rest.find(quote)?;
    Some(&rest[..end]).filter(|name| !name.is_empty())
}
