//! In-memory resolver over a fixed set of records

use crate::{DescriptorRecord, Resolver};
use protoc_wrapper_common::{Result, SourceIdentifier, WrapperError};
use std::collections::{HashMap, HashSet};

/// Resolver serving pre-built records, for tests and tooling
///
/// Records every lookup so callers can assert on resolution order.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    records: HashMap<SourceIdentifier, DescriptorRecord>,
    failing: HashSet<SourceIdentifier>,
    calls: Vec<SourceIdentifier>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file named `name` importing `dependencies`
    pub fn with_file<I, S>(mut self, name: &str, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(DescriptorRecord::new(name, dependencies));
        self
    }

    /// Make lookups of `name` fail as if the file did not parse
    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.insert(SourceIdentifier::from(name));
        self
    }

    pub fn insert(&mut self, record: DescriptorRecord) {
        self.records.insert(record.identifier().clone(), record);
    }

    /// Identifiers requested so far, in call order
    pub fn calls(&self) -> &[SourceIdentifier] {
        &self.calls
    }
}

impl Resolver for MemoryResolver {
    fn resolve(&mut self, id: &SourceIdentifier) -> Result<DescriptorRecord> {
        self.calls.push(id.clone());
        if self.failing.contains(id) {
            return Err(WrapperError::resolution(id, "failed to parse"));
        }
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| WrapperError::resolution(id, "File not found"))
    }
}
