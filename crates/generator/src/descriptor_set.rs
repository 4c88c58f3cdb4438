//! In-process generator emitting the request's files as a descriptor set

use crate::{CodeGenerator, OutputDirectory};
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::FileDescriptorSet;
use protoc_wrapper_common::{GeneratorKind, Result, DEFAULT_DESCRIPTOR_SET_NAME};
use tracing::debug;

/// Writes `request.proto_file` as one serialized `FileDescriptorSet`
#[derive(Debug, Clone)]
pub struct DescriptorSetGenerator {
    file_name: String,
}

impl Default for DescriptorSetGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_DESCRIPTOR_SET_NAME)
    }
}

impl DescriptorSetGenerator {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl CodeGenerator for DescriptorSetGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Descriptors
    }

    fn generate(
        &self,
        request: &CodeGeneratorRequest,
        output: &mut dyn OutputDirectory,
    ) -> Result<()> {
        let set = FileDescriptorSet {
            file: request.proto_file.clone(),
        };
        debug!(files = set.file.len(), name = %self.file_name, "writing descriptor set");
        output.write_file(&self.file_name, &set.encode_to_vec())
    }
}
