//! Transitive descriptor set assembly

use crate::{DescriptorCollection, DescriptorRecord, Resolver};
use protoc_wrapper_common::{Result, SourceIdentifier, WrapperError};
use std::collections::{HashSet, VecDeque};
use std::io::Write;
use tracing::{debug, trace};

/// Builds a flat, duplicate-free descriptor set from a list of roots
///
/// Roots are resolved first, in order. Their imports are then walked
/// breadth-first, each file resolved once; a file already collected is
/// skipped, which also terminates cycles and self-imports.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSetBuilder {
    include_imports: bool,
}

impl Default for DescriptorSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject an empty root list
pub fn ensure_roots(roots: &[SourceIdentifier]) -> Result<()> {
    if roots.is_empty() {
        return Err(WrapperError::Input("No .proto files specified".to_string()));
    }
    Ok(())
}

impl DescriptorSetBuilder {
    pub fn new() -> Self {
        Self {
            include_imports: true,
        }
    }

    /// When disabled only the roots are collected
    pub fn include_imports(mut self, include_imports: bool) -> Self {
        self.include_imports = include_imports;
        self
    }

    /// Resolve `roots` and everything they import
    ///
    /// Fails on the first identifier the resolver cannot handle; nothing
    /// collected so far is returned in that case.
    pub fn build<R>(
        &self,
        roots: &[SourceIdentifier],
        resolver: &mut R,
    ) -> Result<DescriptorCollection>
    where
        R: Resolver + ?Sized,
    {
        ensure_roots(roots)?;
        debug!(
            roots = roots.len(),
            include_imports = self.include_imports,
            "building descriptor set"
        );

        let mut collection = DescriptorCollection::new();
        let mut visited: HashSet<SourceIdentifier> = HashSet::new();
        let mut queue: VecDeque<DescriptorRecord> = VecDeque::new();

        for root in roots {
            if visited.contains(root) {
                trace!(root = %root, "root already collected");
                continue;
            }
            let record = resolver.resolve(root)?;
            visited.insert(root.clone());
            if collect(&mut collection, &mut visited, &record) {
                queue.push_back(record);
            }
        }

        if self.include_imports {
            while let Some(record) = queue.pop_front() {
                for dep in record.dependencies() {
                    if visited.contains(&dep) {
                        continue;
                    }
                    trace!(file = %record.identifier(), import = %dep, "resolving import");
                    let resolved = resolver.resolve(&dep)?;
                    visited.insert(dep);
                    if collect(&mut collection, &mut visited, &resolved) {
                        queue.push_back(resolved);
                    }
                }
            }
        }

        debug!(files = collection.len(), "descriptor set complete");
        Ok(collection)
    }

    /// Build the set, then serialize it to `sink`
    ///
    /// The sink is not touched unless the build succeeds. Returns the
    /// collection that was written.
    pub fn build_to<R, W>(
        &self,
        roots: &[SourceIdentifier],
        resolver: &mut R,
        sink: &mut W,
    ) -> Result<DescriptorCollection>
    where
        R: Resolver + ?Sized,
        W: Write + ?Sized,
    {
        let collection = self.build(roots, resolver)?;
        let bytes = collection.write_to(sink)?;
        debug!(bytes, "descriptor set written");
        Ok(collection)
    }
}

/// Add a resolved record under its own name; `false` if that name was already collected
fn collect(
    collection: &mut DescriptorCollection,
    visited: &mut HashSet<SourceIdentifier>,
    record: &DescriptorRecord,
) -> bool {
    visited.insert(record.identifier().clone());
    collection.push(record.clone())
}
