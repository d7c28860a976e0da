//! Manual site: guide pages gathered from every module's `docs/` folder.
//!
//! Modules may also declare manual plugins. A plugin is an executable run
//! from the module root with the staging directory as its only argument;
//! each line it prints is the path of a page it generated.

use super::{Generator, GeneratorContext};
use crate::collate::DocEntry;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#[ \t]*([^#\s].*?)\s*$").unwrap());

const PAGES_GLOB: &str = "docs/*.md";

pub struct ManualGenerator;

impl Generator for ManualGenerator {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn run(&self, ctx: &GeneratorContext) -> Result<()> {
        let dir = ctx.output_dir.join("manual");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let source_index = ctx.collation.source_index.as_deref();
        // Keyed by title; a later page with the same title replaces an earlier one.
        let mut pages: BTreeMap<String, PathBuf> = BTreeMap::new();
        for entry in &ctx.collation.entries {
            let mut files = run_plugins(entry, &dir);
            files.extend(module_pages(&entry.root_dir)?);
            for file in files {
                if source_index.is_some_and(|idx| same_file(idx, &file)) {
                    continue;
                }
                pages.insert(page_title(&file), file);
            }
        }

        for file in pages.values() {
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = dir.join(name);
            if same_file(file, &dest) {
                continue;
            }
            fs::copy(file, &dest).with_context(|| {
                format!("failed to copy {} to {}", file.display(), dest.display())
            })?;
        }

        let cover = ctx
            .collation
            .manual_cover
            .as_deref()
            .or(ctx.collation.manual_index.as_deref());
        if let Some(cover) = cover {
            let dest = dir.join("_coverpage.md");
            fs::copy(cover, &dest)
                .with_context(|| format!("failed to copy cover page {}", cover.display()))?;
        }

        let manual_index = ctx.collation.manual_index.as_deref();
        let mut listing: Vec<(String, String)> = pages
            .iter()
            .filter(|(_, file)| !manual_index.is_some_and(|idx| same_file(idx, file)))
            .filter_map(|(title, file)| {
                let name = file.file_name()?.to_string_lossy().into_owned();
                Some((title.clone(), name))
            })
            .collect();
        listing.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()).then_with(|| a.0.cmp(&b.0)));

        let pages_path = dir.join("pages.json");
        fs::write(&pages_path, serde_json::to_string_pretty(&listing)?)
            .with_context(|| format!("failed to write {}", pages_path.display()))?;
        fs::write(dir.join("_sidebar.md"), sidebar(&listing))
            .with_context(|| format!("failed to write sidebar in {}", dir.display()))?;

        tracing::info!(pages = listing.len(), "wrote manual");
        Ok(())
    }
}

/// Run a module's manual plugins and collect the pages they report.
fn run_plugins(entry: &DocEntry, staging: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for plugin in &entry.config.manual_plugins {
        let program = entry.root_dir.join(plugin);
        let output = Command::new(&program)
            .arg(staging)
            .current_dir(&entry.root_dir)
            .output();
        match output {
            Ok(out) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                files.extend(
                    stdout
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(|l| entry.root_dir.join(l)),
                );
            }
            Ok(out) => {
                tracing::warn!(
                    module = %entry.name,
                    plugin = %plugin,
                    status = %out.status,
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "manual plugin failed"
                );
            }
            Err(e) => {
                tracing::warn!(module = %entry.name, plugin = %plugin, error = %e, "failed to run manual plugin");
            }
        }
    }
    files
}

fn module_pages(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/{}", glob::Pattern::escape(&root.to_string_lossy()), PAGES_GLOB);
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// First top-level heading, or the file name.
fn page_title(file: &Path) -> String {
    fs::read_to_string(file)
        .ok()
        .and_then(|text| title_from(&text))
        .unwrap_or_else(|| {
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

fn title_from(text: &str) -> Option<String> {
    TITLE_RE.captures(text).map(|c| c[1].to_string())
}

fn sidebar(listing: &[(String, String)]) -> String {
    let mut out = String::from("\n\n<ul class=\"header\"><li>Guides</li></ul>\n\n");
    for (title, file) in listing {
        out.push_str(&format!("  - [{}]({})\n", title, file));
    }
    out
}

/// Whether two paths name the same file. Paths that cannot be resolved
/// (e.g. not yet created) are compared as written.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn title_is_first_level_one_heading() {
        assert_eq!(title_from("# Getting started\n\ntext").as_deref(), Some("Getting started"));
        assert_eq!(
            title_from("<!-- intro -->\n## Sub\n#Plugins  \n").as_deref(),
            Some("Plugins")
        );
        assert_eq!(title_from("## Only subheadings\n"), None);
    }

    #[test]
    fn title_falls_back_to_file_name() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.md");
        fs::write(&file, "no heading here").unwrap();
        assert_eq!(page_title(&file), "notes.md");
    }

    #[test]
    fn same_file_resolves_relative_segments() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("docs/a.md");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "").unwrap();
        assert!(same_file(&file, &tmp.path().join("docs/../docs/a.md")));
        assert!(!same_file(&file, &tmp.path().join("docs/b.md")));
    }

    #[test]
    fn sidebar_lists_pages() {
        let listing = vec![("Intro".to_string(), "intro.md".to_string())];
        assert!(sidebar(&listing).contains("  - [Intro](intro.md)\n"));
    }
}
