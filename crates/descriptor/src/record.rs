//! Descriptor records and the ordered, duplicate-free collection built from them

use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use protoc_wrapper_common::{Result, SourceIdentifier, WrapperError};
use std::collections::HashMap;
use std::io::Write;

/// A resolved `.proto` file
///
/// Produced by a [`Resolver`](crate::Resolver); the builder only reads the
/// identifier and dependency list and copies the descriptor into its output.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorRecord {
    identifier: SourceIdentifier,
    proto: FileDescriptorProto,
}

impl DescriptorRecord {
    /// Wrap a descriptor; its `name` becomes the record's identifier
    pub fn from_proto(proto: FileDescriptorProto) -> Self {
        Self {
            identifier: SourceIdentifier::new(proto.name()),
            proto,
        }
    }

    /// Minimal record carrying only a name and its imports
    pub fn new<I, S>(name: &str, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_proto(FileDescriptorProto {
            name: Some(name.to_string()),
            dependency: dependencies.into_iter().map(Into::into).collect(),
            ..Default::default()
        })
    }

    pub fn identifier(&self) -> &SourceIdentifier {
        &self.identifier
    }

    /// Direct imports, in declaration order
    pub fn dependencies(&self) -> impl ExactSizeIterator<Item = SourceIdentifier> + '_ {
        self.proto
            .dependency
            .iter()
            .map(|dep| SourceIdentifier::new(dep.as_str()))
    }

    pub fn proto(&self) -> &FileDescriptorProto {
        &self.proto
    }

    pub fn into_proto(self) -> FileDescriptorProto {
        self.proto
    }
}

/// Insertion-ordered records with no two sharing an identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorCollection {
    records: Vec<DescriptorRecord>,
    positions: HashMap<SourceIdentifier, usize>,
}

impl DescriptorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; returns `false` and drops it if the identifier is already present
    pub fn push(&mut self, record: DescriptorRecord) -> bool {
        if self.positions.contains_key(record.identifier()) {
            return false;
        }
        self.positions
            .insert(record.identifier().clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn contains(&self, identifier: &SourceIdentifier) -> bool {
        self.positions.contains_key(identifier)
    }

    pub fn get(&self, identifier: &SourceIdentifier) -> Option<&DescriptorRecord> {
        self.positions.get(identifier).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &DescriptorRecord> {
        self.records.iter()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.identifier().as_str()).collect()
    }

    /// Records ordered so every file follows the files it imports
    ///
    /// Ties keep collection order. Imports that are not part of the
    /// collection are ignored, and a cycle is broken at the edge that
    /// closes it.
    pub fn topological_order(&self) -> Vec<&DescriptorRecord> {
        let mut entered = vec![false; self.records.len()];
        let mut ordered = Vec::with_capacity(self.records.len());
        // (record index, next dependency to visit)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for start in 0..self.records.len() {
            if entered[start] {
                continue;
            }
            entered[start] = true;
            stack.push((start, 0));

            while let Some(top) = stack.last_mut() {
                let (index, next) = *top;
                let dependencies = &self.records[index].proto.dependency;
                match dependencies.get(next) {
                    Some(dep) => {
                        top.1 += 1;
                        if let Some(&dep_index) = self.positions.get(dep.as_str()) {
                            if !entered[dep_index] {
                                entered[dep_index] = true;
                                stack.push((dep_index, 0));
                            }
                        }
                    }
                    None => {
                        ordered.push(&self.records[index]);
                        stack.pop();
                    }
                }
            }
        }
        ordered
    }

    /// Copy the records into a `FileDescriptorSet`, preserving insertion order
    pub fn to_file_descriptor_set(&self) -> FileDescriptorSet {
        FileDescriptorSet {
            file: self.records.iter().map(|r| r.proto.clone()).collect(),
        }
    }

    pub fn into_file_descriptor_set(self) -> FileDescriptorSet {
        FileDescriptorSet {
            file: self.records.into_iter().map(DescriptorRecord::into_proto).collect(),
        }
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        self.to_file_descriptor_set().encode_to_vec()
    }

    /// Serialize the whole set to `sink` in one write
    ///
    /// Returns the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<usize> {
        let bytes = self.encode_to_vec();
        sink.write_all(&bytes)
            .and_then(|_| sink.flush())
            .map_err(WrapperError::Serialization)?;
        Ok(bytes.len())
    }
}

impl<'a> IntoIterator for &'a DescriptorCollection {
    type Item = &'a DescriptorRecord;
    type IntoIter = std::slice::Iter<'a, DescriptorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(records: Vec<DescriptorRecord>) -> DescriptorCollection {
        let mut collection = DescriptorCollection::new();
        for record in records {
            collection.push(record);
        }
        collection
    }

    #[test]
    fn test_push_rejects_duplicate_identifier() {
        let mut collection = DescriptorCollection::new();
        assert!(collection.push(DescriptorRecord::new("a.proto", ["b.proto"])));
        assert!(!collection.push(DescriptorRecord::new("a.proto", Vec::<String>::new())));
        assert_eq!(collection.len(), 1);
        assert_eq!(
            collection.get(&"a.proto".into()).unwrap().proto().dependency,
            vec!["b.proto".to_string()]
        );
    }

    #[test]
    fn test_topological_order_puts_imports_first() {
        let collection = collection(vec![
            DescriptorRecord::new("a.proto", ["b.proto", "c.proto"]),
            DescriptorRecord::new("b.proto", ["c.proto"]),
            DescriptorRecord::new("c.proto", Vec::<String>::new()),
        ]);

        let names: Vec<_> = collection
            .topological_order()
            .iter()
            .map(|r| r.identifier().as_str())
            .collect();
        assert_eq!(names, vec!["c.proto", "b.proto", "a.proto"]);
    }

    #[test]
    fn test_topological_order_survives_cycles() {
        let collection = collection(vec![
            DescriptorRecord::new("a.proto", ["b.proto"]),
            DescriptorRecord::new("b.proto", ["a.proto"]),
        ]);

        let names: Vec<_> = collection
            .topological_order()
            .iter()
            .map(|r| r.identifier().as_str())
            .collect();
        assert_eq!(names, vec!["b.proto", "a.proto"]);
    }

    #[test]
    fn test_topological_order_handles_long_import_chains() {
        // file_0 imports file_1 imports ... file_N
        let depth = 50_000;
        let records = (0..depth)
            .map(|i| {
                let name = format!("file_{i}.proto");
                if i + 1 < depth {
                    DescriptorRecord::new(&name, [format!("file_{}.proto", i + 1)])
                } else {
                    DescriptorRecord::new(&name, Vec::<String>::new())
                }
            })
            .collect();
        let collection = collection(records);

        let ordered = collection.topological_order();
        assert_eq!(ordered.len(), depth);
        assert_eq!(ordered[0].identifier().as_str(), "file_49999.proto");
        assert_eq!(ordered[depth - 1].identifier().as_str(), "file_0.proto");
    }

    #[test]
    fn test_topological_order_ignores_missing_imports() {
        let collection = collection(vec![DescriptorRecord::new("a.proto", ["absent.proto"])]);
        assert_eq!(collection.topological_order().len(), 1);
    }

    #[test]
    fn test_write_to_encodes_set_in_order() {
        let collection = collection(vec![
            DescriptorRecord::new("a.proto", ["b.proto"]),
            DescriptorRecord::new("b.proto", Vec::<String>::new()),
        ]);

        let mut sink = Vec::new();
        let written = collection.write_to(&mut sink).unwrap();
        assert_eq!(written, sink.len());

        let decoded = FileDescriptorSet::decode(sink.as_slice()).unwrap();
        let names: Vec<_> = decoded.file.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a.proto", "b.proto"]);
    }

    #[test]
    fn test_write_to_broken_sink_is_serialization_error() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let collection = collection(vec![DescriptorRecord::new("a.proto", Vec::<String>::new())]);
        let err = collection.write_to(&mut Closed).unwrap_err();
        assert!(matches!(err, WrapperError::Serialization(_)));
    }
}
