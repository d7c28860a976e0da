//! Static documentation data for an adapt-authoring installation.
//!
//! Scans an application root without booting it and derives what the
//! documentation generators need: the installed modules, config defaults,
//! JSON schemas, the error table, the `/api` router tree and the permission
//! index built from it. [`StaticAppContext`] bundles all of these.

pub mod config;
pub mod context;
pub mod conventions;
pub mod deps;
pub mod error;
pub mod error_table;
mod files;
pub mod openapi;
pub mod pattern;
pub mod permissions;
pub mod routes;
pub mod schemas;

pub use config::ConfigDefaults;
pub use context::{ModuleHandle, StaticAppContext};
pub use conventions::Conventions;
pub use deps::{load_dependencies, load_root_package, Dependencies, DocumentationConfig, ModuleDescriptor};
pub use error::{DocsError, Result};
pub use error_table::{ErrorEntry, ErrorMeta, ErrorTable};
pub use pattern::{PathKey, PathPattern, PatternError};
pub use permissions::{PermissionEntry, PermissionIndex, STANDARD_METHODS};
pub use routes::merge::merge_with_defaults;
pub use routes::tree::build_router_tree;
pub use routes::{NoopHandler, RouteConfig, RouteDefinition, RouterNode, StaticRoute};
pub use schemas::{BuiltSchema, SchemaRegistry};
