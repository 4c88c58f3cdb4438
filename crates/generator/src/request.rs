//! Assembling `CodeGeneratorRequest`s from descriptor sets

use prost_types::compiler::{CodeGeneratorRequest, Version};
use protoc_wrapper_common::SourceIdentifier;
use protoc_wrapper_descriptor::DescriptorCollection;

/// Protobuf release whose plugin protocol the wrapper speaks
pub const COMPILER_VERSION: (i32, i32, i32) = (3, 21, 12);

/// Join generator flags into a plugin parameter string
///
/// Returns `None` when there are no non-empty flags.
pub fn join_parameters<I, S>(flags: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = flags
        .into_iter()
        .map(|f| f.as_ref().trim().to_string())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(joined)
}

/// Build the request a protoc plugin would receive for `roots`
///
/// `proto_file` lists the whole collection with every file after its
/// imports; roots missing from the collection are still requested.
pub fn build_request(
    collection: &DescriptorCollection,
    roots: &[SourceIdentifier],
    parameter: Option<String>,
) -> CodeGeneratorRequest {
    let (major, minor, patch) = COMPILER_VERSION;

    let mut file_to_generate: Vec<String> = Vec::with_capacity(roots.len());
    for root in roots {
        if !file_to_generate.iter().any(|f| f == root.as_str()) {
            file_to_generate.push(root.to_string());
        }
    }

    CodeGeneratorRequest {
        file_to_generate,
        parameter,
        proto_file: collection
            .topological_order()
            .into_iter()
            .map(|record| record.proto().clone())
            .collect(),
        compiler_version: Some(Version {
            major: Some(major),
            minor: Some(minor),
            patch: Some(patch),
            suffix: Some(String::new()),
        }),
        ..Default::default()
    }
}
