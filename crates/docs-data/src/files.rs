//! Filesystem helpers shared by the loaders.

use crate::deps::Dependencies;
use crate::error::{DocsError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Read and parse a JSON file.
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|source| DocsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DocsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON file whose top-level value must be an object.
pub(crate) fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    match read_json(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(DocsError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a JSON file straight into a typed value.
pub(crate) fn read_json_as<T: DeserializeOwned>(path: &Path) -> Result<T> {
    serde_json::from_value(read_json(path)?).map_err(|source| DocsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Expand `pattern` relative to `dir` into a sorted list of files.
///
/// `dir` is escaped so that glob metacharacters in install paths are taken
/// literally.
pub(crate) fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let mut files: Vec<PathBuf> = glob::glob(&full)
        .map_err(|source| DocsError::Glob {
            pattern: full.clone(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// One module's parsed data files for a given glob.
#[derive(Debug)]
pub(crate) struct ModuleFiles {
    pub module: String,
    pub files: Vec<(PathBuf, Value)>,
}

/// Glob `pattern` inside every module root and parse each match as JSON.
///
/// Modules are visited in discovery order. Modules without matches are left
/// out; files that fail to read or parse are logged and skipped.
pub(crate) fn load_module_files(deps: &Dependencies, pattern: &str) -> Vec<ModuleFiles> {
    deps.values()
        .filter_map(|dep| {
            let paths = match glob_files(&dep.root_dir, pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::warn!(module = %dep.name, error = %e, "skipping module files");
                    return None;
                }
            };
            let files: Vec<(PathBuf, Value)> = paths
                .into_iter()
                .filter_map(|path| match read_json(&path) {
                    Ok(value) => Some((path, value)),
                    Err(e) => {
                        tracing::warn!(module = %dep.name, error = %e, "skipping unreadable file");
                        None
                    }
                })
                .collect();
            if files.is_empty() {
                return None;
            }
            Some(ModuleFiles {
                module: dep.name.clone(),
                files,
            })
        })
        .collect()
}
