//! docgen: build the documentation site for an adapt-authoring installation.
//!
//! Everything is derived from files on disk; the application is never
//! started. Outputs land in one directory:
//!
//! - `jsdoc/`  API reference sources (and the reference itself with `--jsdoc-command`)
//! - `manual/` guide pages from every module's `docs/`
//! - `rest/`   OpenAPI document for the REST explorer

mod collate;
mod generate;

use anyhow::{bail, Context, Result};
use clap::Parser;
use docs_data::{Conventions, StaticAppContext};
use generate::{ExternalCommand, GeneratorContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Module whose config declares the default output directory.
const DOCS_MODULE: &str = "adapt-authoring-docs";

#[derive(Parser)]
#[command(
    name = "docgen",
    about = "Generate documentation for the modules of an adapt-authoring installation"
)]
struct Cli {
    /// Application root (where package.json lives)
    #[arg(long, default_value = ".")]
    root_dir: PathBuf,

    /// Output directory. Defaults to the docs module's `outputDir` setting.
    /// Cleared before every build.
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Run only these generators (source, manual, rest).
    /// Can be specified multiple times.
    #[arg(long, value_name = "NAME")]
    only: Vec<String>,

    /// Command that renders the API reference, e.g. "npx jsdoc".
    /// Invoked as `<CMD> -c <output>/jsdoc/sources.json`.
    #[arg(long, value_name = "CMD")]
    jsdoc_command: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    build(&cli)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build(cli: &Cli) -> Result<()> {
    let jsdoc = cli
        .jsdoc_command
        .as_deref()
        .map(ExternalCommand::parse)
        .transpose()
        .context("invalid --jsdoc-command")?;
    let generators = generate::select(&cli.only, jsdoc.as_ref())?;

    let app = StaticAppContext::init(&cli.root_dir, Conventions::default())
        .context("failed to load application data")?;
    let pkg = app.pkg();
    tracing::info!(
        name = %pkg.name,
        version = pkg.version.as_deref().unwrap_or("unknown"),
        "generating documentation"
    );
    app.on_ready()?;

    let output_dir = resolve_output_dir(cli.output_dir.as_deref(), &app)?;
    let collation = collate::collate(&app);
    tracing::debug!(modules = collation.entries.len(), "collated documentation configs");

    prepare_output_dir(&output_dir, app.root_dir())?;

    let ctx = GeneratorContext {
        app: &app,
        collation: &collation,
        output_dir: &output_dir,
    };
    for generator in &generators {
        tracing::info!(generator = generator.name(), "running generator");
        generator
            .run(&ctx)
            .with_context(|| format!("{} generator failed", generator.name()))?;
    }

    tracing::info!(output = %output_dir.display(), "documentation build complete");
    Ok(())
}

/// The explicit flag, else the docs module's configured default, made absolute
/// against the current directory.
fn resolve_output_dir(flag: Option<&Path>, app: &StaticAppContext) -> Result<PathBuf> {
    let dir = match flag {
        Some(dir) => dir.to_path_buf(),
        None => match app.config().get_str(&format!("{DOCS_MODULE}.outputDir")) {
            Some(dir) => PathBuf::from(dir),
            None => bail!("no output directory: pass --output-dir or set {DOCS_MODULE}.outputDir"),
        },
    };
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(dir))
}

/// Remove any previous build and recreate the directory.
fn prepare_output_dir(dir: &Path, root_dir: &Path) -> Result<()> {
    if let (Ok(out), Ok(root)) = (fs::canonicalize(dir), fs::canonicalize(root_dir)) {
        if root.starts_with(&out) {
            bail!(
                "refusing to clear {}: it contains the application root",
                dir.display()
            );
        }
    }
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("failed to clear output directory: {}", dir.display()))?;
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prepare_clears_previous_build() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(out.join("stale")).unwrap();
        fs::write(out.join("stale/file.txt"), "old").unwrap();

        prepare_output_dir(&out, &tmp.path().join("app")).unwrap();
        assert!(out.is_dir());
        assert!(!out.join("stale").exists());
    }

    #[test]
    fn prepare_refuses_app_root() {
        let tmp = TempDir::new().unwrap();
        let app = tmp.path().join("app");
        fs::create_dir_all(&app).unwrap();
        assert!(prepare_output_dir(tmp.path(), &app).is_err());
        assert!(prepare_output_dir(&app, &app).is_err());
        assert!(app.exists());
    }
}
