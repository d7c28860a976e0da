//! Static stand-in for a booted application.
//!
//! Generators written against the running app ask it for modules by name
//! and wait for readiness. [`StaticAppContext`] answers the same questions
//! from data scanned off disk, so a build never starts a server or touches a
//! database.

use crate::config::ConfigDefaults;
use crate::conventions::Conventions;
use crate::deps::{load_dependencies, load_root_package, Dependencies, ModuleDescriptor};
use crate::error::Result;
use crate::error_table::ErrorTable;
use crate::permissions::PermissionIndex;
use crate::routes::tree::build_router_tree;
use crate::routes::RouterNode;
use crate::schemas::SchemaRegistry;
use std::path::{Path, PathBuf};

/// What [`StaticAppContext::wait_for_module`] hands back.
#[derive(Debug, Clone, Copy)]
pub enum ModuleHandle<'a> {
    /// The server module: its `/api` router tree.
    Server { api: &'a RouterNode },
    /// The jsonschema module: the schema registry.
    JsonSchema(&'a SchemaRegistry),
    /// The auth module: its permission store.
    Auth { permissions: &'a PermissionIndex },
    /// Any other module. Generators treat it as having no data.
    Empty,
}

/// Everything a documentation build knows about the installation.
#[derive(Debug)]
pub struct StaticAppContext {
    root_dir: PathBuf,
    pkg: ModuleDescriptor,
    dependencies: Dependencies,
    config: ConfigDefaults,
    errors: ErrorTable,
    schemas: SchemaRegistry,
    router_tree: RouterNode,
    permissions: PermissionIndex,
}

impl StaticAppContext {
    /// Scan `root_dir` and build every derived view.
    ///
    /// Only a missing or unreadable root package is an error; per-module
    /// problems are logged by the individual loaders.
    pub fn init(root_dir: impl Into<PathBuf>, conventions: Conventions) -> Result<Self> {
        let root_dir = root_dir.into();
        let pkg = load_root_package(&root_dir, &conventions)?;
        let dependencies = load_dependencies(&root_dir, &conventions)?;
        tracing::debug!(count = dependencies.len(), "loaded dependencies");

        let config = ConfigDefaults::load(&dependencies, &conventions);
        let errors = ErrorTable::load(&dependencies, &conventions);
        let schemas = SchemaRegistry::load(&dependencies, &conventions);
        let router_tree = build_router_tree(&dependencies, &conventions);
        let permissions = PermissionIndex::build(&router_tree);
        tracing::debug!(
            errors = errors.len(),
            schemas = schemas.len(),
            permissions = permissions.len(),
            "built static app context"
        );

        Ok(Self {
            root_dir,
            pkg,
            dependencies,
            config,
            errors,
            schemas,
            router_tree,
            permissions,
        })
    }

    /// The context is complete once constructed.
    pub fn on_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Look up a module by short (`server`) or full (`adapt-authoring-server`) name.
    pub fn wait_for_module(&self, name: &str) -> ModuleHandle<'_> {
        let short = name.strip_prefix("adapt-authoring-").unwrap_or(name);
        match short {
            "server" => ModuleHandle::Server {
                api: &self.router_tree,
            },
            "jsonschema" => ModuleHandle::JsonSchema(&self.schemas),
            "auth" => ModuleHandle::Auth {
                permissions: &self.permissions,
            },
            _ => ModuleHandle::Empty,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The application's own merged package descriptor.
    pub fn pkg(&self) -> &ModuleDescriptor {
        &self.pkg
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub fn config(&self) -> &ConfigDefaults {
        &self.config
    }

    pub fn errors(&self) -> &ErrorTable {
        &self.errors
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn router_tree(&self) -> &RouterNode {
        &self.router_tree
    }

    pub fn permissions(&self) -> &PermissionIndex {
        &self.permissions
    }
}
