//! Decide which modules take part in a documentation build.

use docs_data::{Dependencies, DocumentationConfig, ModuleDescriptor, StaticAppContext};
use std::path::{Path, PathBuf};

/// One module's documentation settings, as fed to the generators.
#[derive(Debug, Clone)]
pub struct DocEntry {
    pub name: String,
    pub version: Option<String>,
    pub root_dir: PathBuf,
    /// False for plain libraries (`module: false`).
    pub module: bool,
    pub config: DocumentationConfig,
}

/// Participating modules plus the build-wide index files they declared.
#[derive(Debug, Clone, Default)]
pub struct Collation {
    pub entries: Vec<DocEntry>,
    pub manual_index: Option<PathBuf>,
    pub manual_cover: Option<PathBuf>,
    pub source_index: Option<PathBuf>,
}

pub fn collate(ctx: &StaticAppContext) -> Collation {
    collate_modules(ctx.pkg(), ctx.dependencies(), ctx.root_dir())
}

/// Collate the installed modules, then append the application itself.
///
/// Index files are claimed first come, first served. A module declaring an
/// index that another module already claimed is left out entirely.
pub fn collate_modules(pkg: &ModuleDescriptor, deps: &Dependencies, root_dir: &Path) -> Collation {
    let excludes: &[String] = pkg
        .documentation
        .as_ref()
        .map(|d| d.excludes.as_slice())
        .unwrap_or_default();

    let mut collation = Collation::default();
    for dep in deps.values() {
        let config = match &dep.documentation {
            None => {
                tracing::info!(module = %dep.name, "omitting module, no documentation config defined");
                continue;
            }
            Some(c) if !c.enable => {
                tracing::info!(module = %dep.name, "omitting module, documentation.enable is false");
                continue;
            }
            Some(_) if excludes.contains(&dep.name) => {
                tracing::info!(module = %dep.name, "omitting module, excluded in documentation config");
                continue;
            }
            Some(c) => c,
        };

        let claims = [
            ("manualIndex", &config.manual_index, &collation.manual_index),
            ("manualCover", &config.manual_cover, &collation.manual_cover),
            ("sourceIndex", &config.source_index, &collation.source_index),
        ];
        if let Some((field, _, Some(existing))) = claims
            .iter()
            .find(|(_, declared, claimed)| declared.is_some() && claimed.is_some())
        {
            tracing::info!(
                module = %dep.name,
                field,
                existing = %existing.display(),
                "omitting module, index already declared by another module"
            );
            continue;
        }

        let resolve = |rel: &Option<String>| rel.as_ref().map(|r| dep.root_dir.join(r));
        if config.manual_index.is_some() {
            collation.manual_index = resolve(&config.manual_index);
        }
        if config.manual_cover.is_some() {
            collation.manual_cover = resolve(&config.manual_cover);
        }
        if config.source_index.is_some() {
            collation.source_index = resolve(&config.source_index);
        }

        collation.entries.push(DocEntry {
            name: dep.name.clone(),
            version: dep.version.clone(),
            root_dir: dep.root_dir.clone(),
            module: dep.is_module(),
            config: config.clone(),
        });
    }

    let mut root_config = pkg.documentation.clone().unwrap_or_default();
    root_config.enable = true;
    collation.entries.push(DocEntry {
        name: pkg.name.clone(),
        version: pkg.version.clone(),
        root_dir: root_dir.to_path_buf(),
        module: false,
        config: root_config,
    });
    collation
}
