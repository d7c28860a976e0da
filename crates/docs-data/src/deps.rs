//! Dependency scanner: discover installed modules and their merged descriptors.
//!
//! A module is any directory under `node_modules` carrying a metadata file
//! (`adapt-authoring.json`). Its descriptor is the module's `package.json`
//! with the metadata fields layered on top, plus the install directory.

use crate::conventions::Conventions;
use crate::error::{DocsError, Result};
use crate::files::{glob_files, read_json_object};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Discovered modules keyed by package name, in discovery order.
pub type Dependencies = IndexMap<String, ModuleDescriptor>;

/// Merged package + metadata descriptor of one installed module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Install directory; always set from the scan, never from the files.
    #[serde(default)]
    pub root_dir: PathBuf,
    /// `Some(false)` marks a plain library rather than a bootable app module.
    /// Non-boolean values (npm's ESM entry point string) read as `None`.
    #[serde(
        default,
        deserialize_with = "bool_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub module: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<DocumentationConfig>,
    /// Every other descriptor field, in file order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleDescriptor {
    /// Whether the descriptor marks a bootable module (anything but `module: false`).
    pub fn is_module(&self) -> bool {
        self.module != Some(false)
    }
}

fn bool_or_none<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Option<bool>, D::Error> {
    Ok(Value::deserialize(de)?.as_bool())
}

/// The `documentation` block of a module's metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_plugins: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_sections: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_pages: Option<Value>,
    /// Module names left out of the build (only read from the root package).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scan `root_dir` for installed modules.
///
/// Candidates are processed shortest path first, so a top-level install of a
/// module shadows copies nested deeper in the tree. Modules whose package or
/// metadata file is missing or unparseable are logged and skipped.
pub fn load_dependencies(root_dir: &Path, conventions: &Conventions) -> Result<Dependencies> {
    let pattern = format!(
        "{}/**/{}",
        conventions.modules_dir, conventions.metadata_file
    );
    let mut candidates = glob_files(root_dir, &pattern)?;
    candidates.sort_by(|a, b| {
        a.as_os_str()
            .len()
            .cmp(&b.as_os_str().len())
            .then_with(|| a.cmp(b))
    });

    let mut seen = HashSet::new();
    let mut deps = Dependencies::new();
    for metadata_path in candidates {
        let Some(dir) = metadata_path.parent() else {
            continue;
        };
        let package_path = dir.join(&conventions.package_file);
        let package = match read_json_object(&package_path) {
            Ok(package) => package,
            Err(e) => {
                tracing::warn!(error = %e, "skipping module with unreadable package");
                continue;
            }
        };
        let Some(name) = package.get("name").and_then(Value::as_str).map(str::to_string) else {
            tracing::warn!(path = %package_path.display(), "skipping module without a package name");
            continue;
        };
        if !seen.insert(name.clone()) {
            tracing::debug!(module = %name, path = %dir.display(), "shadowed by a shallower install");
            continue;
        }
        let metadata = match read_json_object(&metadata_path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(module = %name, error = %e, "skipping module with unreadable metadata");
                continue;
            }
        };
        match merge_descriptor(package, metadata, dir) {
            Ok(descriptor) => {
                tracing::debug!(module = %name, path = %dir.display(), "discovered module");
                deps.insert(name, descriptor);
            }
            Err(e) => {
                tracing::warn!(module = %name, error = %e, "skipping module with malformed descriptor");
            }
        }
    }
    Ok(deps)
}

/// Load the application root's own descriptor.
///
/// The package file is required; the metadata file is optional.
pub fn load_root_package(root_dir: &Path, conventions: &Conventions) -> Result<ModuleDescriptor> {
    let fail = |reason: String| DocsError::RootPackage {
        root: root_dir.to_path_buf(),
        reason,
    };
    let package = read_json_object(&root_dir.join(&conventions.package_file))
        .map_err(|e| fail(e.to_string()))?;
    let metadata_path = root_dir.join(&conventions.metadata_file);
    let metadata = if metadata_path.is_file() {
        read_json_object(&metadata_path).map_err(|e| fail(e.to_string()))?
    } else {
        Map::new()
    };
    merge_descriptor(package, metadata, root_dir).map_err(|e| fail(e.to_string()))
}

/// Layer `metadata` over `package` (metadata wins per top-level key).
fn merge_descriptor(
    package: Map<String, Value>,
    metadata: Map<String, Value>,
    dir: &Path,
) -> std::result::Result<ModuleDescriptor, serde_json::Error> {
    let mut merged = package;
    merged.extend(metadata);
    let mut descriptor: ModuleDescriptor = serde_json::from_value(Value::Object(merged))?;
    descriptor.root_dir = dir.to_path_buf();
    Ok(descriptor)
}
