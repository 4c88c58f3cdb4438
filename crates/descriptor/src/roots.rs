//! Mapping command-line paths onto resolver identifiers

use protoc_wrapper_common::SourceIdentifier;
use std::path::{Component, Path, PathBuf};

/// Turn a root given on the command line into an import name
///
/// - A path that exists and lies under a search path becomes relative to
///   the first such search path (`proto/foo/bar.proto` with `-I proto` is
///   `foo/bar.proto`).
/// - A path that exists outside every search path falls back to its file
///   name.
/// - Anything else is already an import name and is kept as given.
pub fn normalize_root(path: &Path, search_paths: &[PathBuf]) -> SourceIdentifier {
    let Ok(absolute) = path.canonicalize() else {
        return SourceIdentifier::new(to_import_name(path));
    };

    for dir in search_paths {
        let Ok(dir) = dir.canonicalize() else {
            continue;
        };
        if let Ok(relative) = absolute.strip_prefix(&dir) {
            return SourceIdentifier::new(to_import_name(relative));
        }
    }

    let file_name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| to_import_name(path));
    SourceIdentifier::new(file_name)
}

/// `/`-separated name without `.` components
fn to_import_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}
