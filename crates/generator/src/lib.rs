//! Code generator dispatch for protoc-wrapper
//!
//! Generators consume a `CodeGeneratorRequest` (the same message protoc
//! hands to its plugins) and emit named files through an
//! [`OutputDirectory`]. The [`GeneratorRegistry`] maps each
//! [`GeneratorKind`] onto the generator that implements it:
//! - `descriptors`: in-process, writes the request's files as a
//!   `FileDescriptorSet`
//! - `java` / `grpc-java`: external plugin programs spoken to over the
//!   protoc plugin protocol

mod descriptor_set;
mod output;
mod plugin;
mod process;
mod registry;
mod request;

pub use descriptor_set::DescriptorSetGenerator;
pub use output::{DiskOutput, OutputDirectory, ResponseOutput};
pub use plugin::run_as_plugin;
pub use process::PluginProcess;
pub use registry::GeneratorRegistry;
pub use request::{build_request, join_parameters, COMPILER_VERSION};

use prost_types::compiler::CodeGeneratorRequest;
use protoc_wrapper_common::{GeneratorKind, Result};

/// A code generator capability
pub trait CodeGenerator {
    /// Which generator this is; the registry key
    fn kind(&self) -> GeneratorKind;

    /// Generate files for `request.file_to_generate` into `output`
    fn generate(
        &self,
        request: &CodeGeneratorRequest,
        output: &mut dyn OutputDirectory,
    ) -> Result<()>;
}
