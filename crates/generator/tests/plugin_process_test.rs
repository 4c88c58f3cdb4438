//! Integration test driving a stand-in protoc plugin program

#![cfg(unix)]

use prost::Message;
use prost_types::compiler::{
    code_generator_response::File, CodeGeneratorRequest, CodeGeneratorResponse,
};
use protoc_wrapper_common::{GeneratorKind, WrapperConfig, WrapperError};
use protoc_wrapper_generator::{DiskOutput, GeneratorRegistry, ResponseOutput};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write a script that drains stdin and replays `response` on stdout
fn fake_plugin(dir: &Path, response: &CodeGeneratorResponse) -> PathBuf {
    fake_plugin_with(dir, response, "")
}

/// Like [`fake_plugin`], running the `before_read` shell line first
fn fake_plugin_with(dir: &Path, response: &CodeGeneratorResponse, before_read: &str) -> PathBuf {
    let response_path = dir.join("response.bin");
    fs::write(&response_path, response.encode_to_vec()).unwrap();

    let script = dir.join("protoc-gen-fake");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\n{}\ncat > /dev/null\ncat '{}'\n",
            before_read,
            response_path.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn registry_with(kind: GeneratorKind, program: &Path) -> GeneratorRegistry {
    let yaml = match kind {
        GeneratorKind::JavaMessages => format!("plugins:\n  java: {}\n", program.display()),
        _ => format!("plugins:\n  grpc-java: {}\n", program.display()),
    };
    GeneratorRegistry::from_config(&WrapperConfig::from_yaml_str(&yaml).unwrap())
}

fn request() -> CodeGeneratorRequest {
    CodeGeneratorRequest {
        file_to_generate: vec!["greeter.proto".to_string()],
        ..Default::default()
    }
}

#[test]
fn test_plugin_files_written_to_disk() {
    let work = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let plugin = fake_plugin(
        work.path(),
        &CodeGeneratorResponse {
            file: vec![
                File {
                    name: Some("io/acme/GreeterGrpc.java".to_string()),
                    content: Some("public final class GreeterGrpc {}".to_string()),
                    ..Default::default()
                },
                File {
                    name: Some("io/acme/Greeter.java".to_string()),
                    content: Some("public final class Greeter {}".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
    );

    let registry = registry_with(GeneratorKind::JavaGrpc, &plugin);
    let mut output = DiskOutput::new(out.path()).unwrap();
    registry
        .get(GeneratorKind::JavaGrpc)
        .unwrap()
        .generate(&request(), &mut output)
        .unwrap();

    assert_eq!(
        fs::read_to_string(out.path().join("io/acme/GreeterGrpc.java")).unwrap(),
        "public final class GreeterGrpc {}"
    );
    assert_eq!(output.written().len(), 2);
}

#[test]
fn test_plugin_reported_error_is_generation_error() {
    let work = tempfile::tempdir().unwrap();
    let plugin = fake_plugin(
        work.path(),
        &CodeGeneratorResponse {
            error: Some("greeter.proto: unsupported option".to_string()),
            ..Default::default()
        },
    );

    let registry = registry_with(GeneratorKind::JavaMessages, &plugin);
    let mut output = ResponseOutput::new();
    let err = registry
        .get(GeneratorKind::JavaMessages)
        .unwrap()
        .generate(&request(), &mut output)
        .unwrap_err();

    assert!(matches!(err, WrapperError::Generation(_)));
    assert!(err.to_string().contains("unsupported option"));
}

#[test]
fn test_insertion_points_rejected() {
    let work = tempfile::tempdir().unwrap();
    let plugin = fake_plugin(
        work.path(),
        &CodeGeneratorResponse {
            file: vec![File {
                name: Some("Greeter.java".to_string()),
                insertion_point: Some("class_scope:acme.Greeter".to_string()),
                content: Some("// extra".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        },
    );

    let registry = registry_with(GeneratorKind::JavaMessages, &plugin);
    let mut output = ResponseOutput::new();
    let err = registry
        .get(GeneratorKind::JavaMessages)
        .unwrap()
        .generate(&request(), &mut output)
        .unwrap_err();

    assert!(err.to_string().contains("insertion point"));
    assert!(output.files().is_empty());
}

#[test]
fn test_insertion_point_leaves_output_untouched() {
    let work = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let plugin = fake_plugin(
        work.path(),
        &CodeGeneratorResponse {
            file: vec![
                File {
                    name: Some("io/acme/Greeter.java".to_string()),
                    content: Some("public final class Greeter {}".to_string()),
                    ..Default::default()
                },
                File {
                    name: Some("io/acme/Greeter.java".to_string()),
                    insertion_point: Some("class_scope:acme.Greeter".to_string()),
                    content: Some("// extra".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
    );

    let registry = registry_with(GeneratorKind::JavaMessages, &plugin);
    let mut output = DiskOutput::new(out.path()).unwrap();
    let err = registry
        .get(GeneratorKind::JavaMessages)
        .unwrap()
        .generate(&request(), &mut output)
        .unwrap_err();

    assert!(matches!(err, WrapperError::Generation(_)));
    assert!(output.written().is_empty());
    assert!(!out.path().join("io/acme/Greeter.java").exists());
}

#[test]
fn test_noisy_plugin_with_large_request_completes() {
    let work = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    // 1 MiB of diagnostics before the plugin starts reading its request
    let plugin = fake_plugin_with(
        work.path(),
        &CodeGeneratorResponse {
            file: vec![File {
                name: Some("Greeter.java".to_string()),
                content: Some("public final class Greeter {}".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        },
        "head -c 1048576 /dev/zero | tr '\\0' x >&2",
    );
    let large_request = CodeGeneratorRequest {
        file_to_generate: (0..50_000)
            .map(|i| format!("acme/generated/file_{i:05}.proto"))
            .collect(),
        ..Default::default()
    };

    let registry = registry_with(GeneratorKind::JavaMessages, &plugin);
    let mut output = DiskOutput::new(out.path()).unwrap();
    registry
        .get(GeneratorKind::JavaMessages)
        .unwrap()
        .generate(&large_request, &mut output)
        .unwrap();

    assert!(out.path().join("Greeter.java").is_file());
}
