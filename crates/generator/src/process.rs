//! Generators backed by external protoc plugin programs

use crate::{CodeGenerator, OutputDirectory};
use prost::Message;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use protoc_wrapper_common::{GeneratorKind, Result, WrapperError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Runs a protoc plugin program, feeding it the request on stdin
///
/// The program must speak the protoc plugin protocol: read a serialized
/// `CodeGeneratorRequest` from stdin, write a `CodeGeneratorResponse` to
/// stdout.
#[derive(Debug, Clone)]
pub struct PluginProcess {
    kind: GeneratorKind,
    program: PathBuf,
}

impl PluginProcess {
    pub fn new(kind: GeneratorKind, program: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn fail(&self, message: impl std::fmt::Display) -> WrapperError {
        WrapperError::Generation(format!(
            "{} plugin ({}): {}",
            self.kind,
            self.program.display(),
            message
        ))
    }

    /// Exchange one request for one response with the plugin process
    fn exchange(&self, request: &CodeGeneratorRequest) -> Result<CodeGeneratorResponse> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.fail(format!("failed to start: {}", e)))?;

        // Feed stdin from its own thread so a chatty plugin cannot fill
        // stdout or stderr while we are still writing
        let stdin = child.stdin.take();
        let request_bytes = request.encode_to_vec();
        let (write_result, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&request_bytes),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let write_result = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("request writer panicked")));
            (write_result, output)
        });
        let output = output.map_err(|e| self.fail(format!("failed to wait for exit: {}", e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(plugin = %self.program.display(), "{}", stderr.trim());
        }
        if !output.status.success() {
            return Err(self.fail(format!("exited with {}", output.status)));
        }
        write_result.map_err(|e| self.fail(format!("failed to send request: {}", e)))?;

        CodeGeneratorResponse::decode(output.stdout.as_slice())
            .map_err(|e| self.fail(format!("invalid response: {}", e)))
    }
}

impl CodeGenerator for PluginProcess {
    fn kind(&self) -> GeneratorKind {
        self.kind
    }

    fn generate(
        &self,
        request: &CodeGeneratorRequest,
        output: &mut dyn OutputDirectory,
    ) -> Result<()> {
        debug!(
            plugin = %self.program.display(),
            files = request.file_to_generate.len(),
            "running plugin"
        );
        let response = self.exchange(request)?;

        if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(self.fail(error));
        }

        // Reject the whole response before anything reaches the output
        if let Some(file) = response
            .file
            .iter()
            .find(|f| f.insertion_point.as_deref().is_some_and(|p| !p.is_empty()))
        {
            return Err(self.fail(format!(
                "insertion point '{}' in {} is not supported",
                file.insertion_point(),
                file.name()
            )));
        }

        for file in &response.file {
            output.write_file(file.name(), file.content().as_bytes())?;
        }

        debug!(plugin = %self.program.display(), files = response.file.len(), "plugin finished");
        Ok(())
    }
}
