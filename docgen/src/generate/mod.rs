//! Generators: trait-based output dispatch.

pub mod manual;
pub mod rest;
pub mod source;

use crate::collate::Collation;
use anyhow::{anyhow, bail, Context, Result};
use docs_data::StaticAppContext;
use std::path::Path;
use std::process::Command;

/// Every generator, in the order a full build runs them.
pub const GENERATOR_NAMES: [&str; 3] = ["source", "manual", "rest"];

/// Shared inputs for one build.
pub struct GeneratorContext<'a> {
    pub app: &'a StaticAppContext,
    pub collation: &'a Collation,
    pub output_dir: &'a Path,
}

/// One documentation output, written under the build's output directory.
pub trait Generator {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &GeneratorContext) -> Result<()>;
}

/// Create a generator by name.
pub fn create_generator(name: &str, jsdoc: Option<&ExternalCommand>) -> Result<Box<dyn Generator>> {
    match name {
        "source" => Ok(Box::new(source::SourceGenerator::new(jsdoc.cloned()))),
        "manual" => Ok(Box::new(manual::ManualGenerator)),
        "rest" => Ok(Box::new(rest::RestGenerator)),
        _ => Err(anyhow!(
            "unknown generator: {}. Use {}",
            name,
            GENERATOR_NAMES.join(", ")
        )),
    }
}

/// Generators to run, in build order. An empty `only` selects all of them.
pub fn select(only: &[String], jsdoc: Option<&ExternalCommand>) -> Result<Vec<Box<dyn Generator>>> {
    for name in only {
        if !GENERATOR_NAMES.contains(&name.as_str()) {
            create_generator(name, jsdoc)?;
        }
    }
    GENERATOR_NAMES
        .iter()
        .filter(|name| only.is_empty() || only.iter().any(|o| o == *name))
        .map(|name| create_generator(name, jsdoc))
        .collect()
}

/// A command line supplied by the user, e.g. `npx jsdoc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let Some(program) = words.next() else {
            bail!("empty command");
        };
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run with `extra` arguments appended; a non-zero exit is an error.
    pub fn run(&self, extra: &[&str]) -> Result<()> {
        let status = self
            .command()
            .args(extra)
            .status()
            .with_context(|| format!("failed to start {}", self.program))?;
        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(gens: &[Box<dyn Generator>]) -> Vec<&'static str> {
        gens.iter().map(|g| g.name()).collect()
    }

    #[test]
    fn selects_all_in_build_order() {
        assert_eq!(names(&select(&[], None).unwrap()), GENERATOR_NAMES);
    }

    #[test]
    fn only_keeps_build_order() {
        let only = vec!["rest".to_string(), "source".to_string()];
        assert_eq!(names(&select(&only, None).unwrap()), vec!["source", "rest"]);
    }

    #[test]
    fn unknown_generator_is_an_error() {
        let err = select(&["swagger".to_string()], None).err().unwrap();
        assert!(err.to_string().contains("unknown generator: swagger"));
    }

    #[test]
    fn command_line_is_split_on_whitespace() {
        let cmd = ExternalCommand::parse("  npx  jsdoc --verbose ").unwrap();
        assert_eq!(cmd.program, "npx");
        assert_eq!(cmd.args, vec!["jsdoc", "--verbose"]);
        assert!(ExternalCommand::parse("   ").is_err());
    }
}
