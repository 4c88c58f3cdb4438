//! Running a generator as a protoc plugin over stdin/stdout

use crate::{join_parameters, CodeGenerator, ResponseOutput};
use prost::Message;
use prost_types::compiler::{
    code_generator_response::Feature, CodeGeneratorRequest, CodeGeneratorResponse,
};
use protoc_wrapper_common::{Result, WrapperError};
use std::io::{Read, Write};
use tracing::{debug, warn};

/// Serve one plugin invocation
///
/// Reads a `CodeGeneratorRequest` from `input`, appends `extra_parameters`
/// to its parameter, runs `generator` and writes the
/// `CodeGeneratorResponse` to `output`. Generator failures are reported in
/// the response's `error` field; only I/O and decoding problems are
/// returned as errors.
pub fn run_as_plugin<R, W>(
    generator: &dyn CodeGenerator,
    input: &mut R,
    output: &mut W,
    extra_parameters: &[String],
) -> Result<()>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;

    let mut request = CodeGeneratorRequest::decode(bytes.as_slice()).map_err(|e| {
        WrapperError::Input(format!(
            "Failed to decode CodeGeneratorRequest from stdin ({}); run this as a protoc plugin",
            e
        ))
    })?;
    request.parameter = join_parameters(
        request
            .parameter
            .iter()
            .map(String::as_str)
            .chain(extra_parameters.iter().map(String::as_str)),
    );
    debug!(
        generator = %generator.kind(),
        files = request.file_to_generate.len(),
        parameter = request.parameter(),
        "plugin request received"
    );

    let mut files = ResponseOutput::new();
    let mut response = match generator.generate(&request, &mut files) {
        Ok(()) => files.into_response(),
        Err(e) => {
            warn!(generator = %generator.kind(), error = %e, "generation failed");
            CodeGeneratorResponse {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };
    response.supported_features = Some(Feature::Proto3Optional as u64);

    output
        .write_all(&response.encode_to_vec())
        .and_then(|_| output.flush())
        .map_err(WrapperError::Serialization)
}
