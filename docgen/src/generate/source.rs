//! API reference: gathers module sources for an external doc tool.

use super::{ExternalCommand, Generator, GeneratorContext};
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Sources are only read from each module's `lib/` tree.
const SOURCE_GLOB: &str = "lib/**/*.js";

pub struct SourceGenerator {
    command: Option<ExternalCommand>,
}

impl SourceGenerator {
    pub fn new(command: Option<ExternalCommand>) -> Self {
        Self { command }
    }
}

impl Generator for SourceGenerator {
    fn name(&self) -> &'static str {
        "source"
    }

    fn run(&self, ctx: &GeneratorContext) -> Result<()> {
        let dir = ctx.output_dir.join("jsdoc");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let mut includes: Vec<String> = ctx
            .collation
            .source_index
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        for entry in &ctx.collation.entries {
            let files = module_sources(&entry.root_dir)?;
            tracing::debug!(
                module = %entry.name,
                version = entry.version.as_deref().unwrap_or("unknown"),
                library = !entry.module,
                files = files.len(),
                "collected module sources"
            );
            includes.extend(files.iter().map(|p| p.to_string_lossy().into_owned()));
        }
        tracing::debug!(files = includes.len(), "collected source files");

        let pkg = ctx.app.pkg();
        let version = pkg.version.as_deref().unwrap_or_default();
        let config = json!({
            "source": { "include": includes },
            "opts": { "destination": dir.to_string_lossy(), "recurse": false },
            "meta": {
                "title": format!("{} API documentation", pkg.name),
                "keyword": format!("v{version}"),
            },
        });
        let config_path = dir.join("sources.json");
        let text = serde_json::to_string_pretty(&config)?;
        fs::write(&config_path, text)
            .with_context(|| format!("failed to write {}", config_path.display()))?;

        match &self.command {
            Some(cmd) => {
                tracing::info!(command = %cmd.program, "running API reference tool");
                cmd.run(&["-c", &config_path.to_string_lossy()])
            }
            None => {
                tracing::debug!("no API reference tool configured, wrote source list only");
                Ok(())
            }
        }
    }
}

fn module_sources(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/{}", glob::Pattern::escape(&root.to_string_lossy()), SOURCE_GLOB);
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}
