//! Router tree builder.
//!
//! Reproduces the mount layout a running app would register, from the
//! route descriptors alone:
//!
//! ```text
//! /api
//! ├── /api/auth            auth module's own routes (lib/routes.json)
//! │   └── /api/auth/{type} auth strategies, merged with auth defaults
//! └── /api/{root}          REST resources, merged with api defaults
//! ```

use super::merge::merge_with_defaults;
use super::placeholder::Placeholders;
use super::{RouteConfig, RouteDefinition, RouterNode, StaticRoute, API_ROOT};
use crate::conventions::Conventions;
use crate::deps::{Dependencies, ModuleDescriptor};
use crate::files::read_json_as;

/// Where a module's router attaches.
enum Mount {
    /// Under the auth router.
    Auth(RouterNode),
    /// Directly under `/api`.
    Api(RouterNode),
}

/// Build the `/api` router tree for every routed module.
///
/// Unreadable descriptors and templates are logged and skipped; the result
/// is always a tree, possibly with no children.
pub fn build_router_tree(deps: &Dependencies, conventions: &Conventions) -> RouterNode {
    let mut root = RouterNode::new(API_ROOT);
    let auth_path = format!("{API_ROOT}/auth");

    let api_defaults = deps
        .get(&conventions.api_module)
        .map(|dep| load_template(dep, conventions))
        .unwrap_or_default();
    let auth_dep = deps.get(&conventions.auth_module);
    let auth_defaults = auth_dep
        .map(|dep| load_template(dep, conventions))
        .unwrap_or_default();

    // The auth router is mounted before anything else so it stays first.
    let has_auth_router = auth_dep
        .and_then(|dep| load_auth_router(dep, conventions, &auth_path))
        .is_some_and(|router| root.mount(router));

    let mounts: Vec<(String, Mount)> = deps
        .values()
        .filter(|dep| dep.is_module())
        .filter_map(|dep| {
            let config = load_route_config(dep, conventions)?;
            let mount = module_router(config, &auth_path, &api_defaults, &auth_defaults)?;
            Some((dep.name.clone(), mount))
        })
        .collect();

    for (module, mount) in mounts {
        match mount {
            Mount::Api(router) => {
                root.mount(router);
            }
            Mount::Auth(router) => match root.child_mut(&auth_path) {
                Some(auth) if has_auth_router => {
                    auth.mount(router);
                }
                _ => tracing::warn!(
                    module = %module,
                    path = %router.path,
                    "no auth router to attach auth strategy to, skipping"
                ),
            },
        }
    }
    root
}

/// Turn one module's descriptor into its router, or `None` when the module
/// declares neither `type` nor `root`.
fn module_router(
    config: RouteConfig,
    auth_path: &str,
    api_defaults: &[RouteDefinition],
    auth_defaults: &[RouteDefinition],
) -> Option<Mount> {
    if let Some(auth_type) = &config.auth_type {
        let routes = merge_with_defaults(config.routes, auth_defaults);
        let mut router = RouterNode::new(format!("{auth_path}/{auth_type}"));
        router.routes = routes.into_iter().map(StaticRoute::from).collect();
        return Some(Mount::Auth(router));
    }

    let root = config.root.as_deref().filter(|r| !r.is_empty())?;
    let placeholders = Placeholders::for_config(&config, root);
    let mut router = RouterNode::new(format!("{API_ROOT}/{root}"));
    let routes = if config.use_default_routes {
        merge_with_defaults(config.routes, api_defaults)
    } else {
        config.routes
    };
    router.routes = routes
        .into_iter()
        .map(|r| StaticRoute::from(placeholders.apply_route(r)))
        .collect();
    Some(Mount::Api(router))
}

/// A module's `routes.json`, if it ships a readable one.
fn load_route_config(dep: &ModuleDescriptor, conventions: &Conventions) -> Option<RouteConfig> {
    let path = dep.root_dir.join(&conventions.routes_file);
    if !path.is_file() {
        return None;
    }
    read_json_as::<RouteConfig>(&path)
        .inspect_err(|e| tracing::warn!(module = %dep.name, error = %e, "skipping route descriptor"))
        .ok()
}

/// Routes of a default-routes template; empty when the template is missing.
fn load_template(dep: &ModuleDescriptor, conventions: &Conventions) -> Vec<RouteDefinition> {
    let path = dep.root_dir.join(&conventions.default_routes_file);
    if !path.is_file() {
        tracing::debug!(module = %dep.name, "no default routes template");
        return Vec::new();
    }
    match read_json_as::<RouteConfig>(&path) {
        Ok(template) => template.routes,
        Err(e) => {
            tracing::warn!(module = %dep.name, error = %e, "ignoring default routes template");
            Vec::new()
        }
    }
}

/// The auth module's own router, mounted unmerged.
fn load_auth_router(
    dep: &ModuleDescriptor,
    conventions: &Conventions,
    auth_path: &str,
) -> Option<RouterNode> {
    let path = dep.root_dir.join(&conventions.auth_routes_file);
    if !path.is_file() {
        tracing::debug!(module = %dep.name, "auth module has no routes of its own");
        return None;
    }
    let config = read_json_as::<RouteConfig>(&path)
        .inspect_err(|e| tracing::warn!(module = %dep.name, error = %e, "skipping auth routes"))
        .ok()?;
    let mut router = RouterNode::new(auth_path);
    router.routes = config.routes.into_iter().map(StaticRoute::from).collect();
    Some(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        deps: Dependencies,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                deps: Dependencies::new(),
            }
        }

        fn module(&mut self, name: &str, module: Option<bool>, files: &[(&str, Value)]) {
            let root = self.dir.path().join(name);
            for (file, content) in files {
                write(&root.join(file), content);
            }
            fs::create_dir_all(&root).unwrap();
            self.deps.insert(
                name.to_string(),
                ModuleDescriptor {
                    name: name.to_string(),
                    version: Some("1.0.0".to_string()),
                    root_dir: root,
                    module,
                    documentation: None,
                    extra: Map::new(),
                },
            );
        }

        fn tree(&self) -> RouterNode {
            build_router_tree(&self.deps, &Conventions::default())
        }
    }

    fn write(path: &Path, content: &Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content.to_string()).unwrap();
    }

    fn child_paths(node: &RouterNode) -> Vec<&str> {
        node.child_routers.iter().map(|c| c.path.as_str()).collect()
    }

    fn auth_module(f: &mut Fixture) {
        f.module(
            "adapt-authoring-auth",
            None,
            &[
                (
                    "lib/routes.json",
                    json!({ "routes": [{ "route": "/check", "handlers": { "get": "h" } }] }),
                ),
                (
                    "lib/default-routes.json",
                    json!({ "routes": [{ "route": "/", "handlers": { "post": "h" } }] }),
                ),
            ],
        );
    }

    #[test]
    fn empty_installation_yields_bare_root() {
        let tree = Fixture::new().tree();
        assert_eq!(tree.path, "/api");
        assert!(tree.routes.is_empty());
        assert!(tree.child_routers.is_empty());
    }

    #[test]
    fn auth_router_is_first_child() {
        let mut f = Fixture::new();
        f.module(
            "adapt-authoring-content",
            None,
            &[("routes.json", json!({ "root": "content", "routes": [] }))],
        );
        auth_module(&mut f);
        let tree = f.tree();
        assert_eq!(child_paths(&tree), vec!["/api/auth", "/api/content"]);
    }

    #[test]
    fn libraries_are_not_routed() {
        let mut f = Fixture::new();
        f.module(
            "adapt-authoring-helpers",
            Some(false),
            &[("routes.json", json!({ "root": "helpers", "routes": [{ "route": "/x" }] }))],
        );
        assert!(f.tree().child_routers.is_empty());
    }

    #[test]
    fn auth_strategy_without_auth_router_is_skipped() {
        let mut f = Fixture::new();
        f.module(
            "adapt-authoring-auth-local",
            None,
            &[("routes.json", json!({ "type": "local", "routes": [] }))],
        );
        assert!(f.tree().find("/api/auth/local").is_none());
    }

    #[test]
    fn auth_strategy_mounts_under_auth_router() {
        let mut f = Fixture::new();
        auth_module(&mut f);
        f.module(
            "adapt-authoring-auth-local",
            None,
            &[("routes.json", json!({ "type": "local", "routes": [{ "route": "/changepass" }] }))],
        );
        let tree = f.tree();
        let auth = tree.child("/api/auth").unwrap();
        assert_eq!(auth.routes[0].route, "/check");
        let local = auth.child("/api/auth/local").unwrap();
        let routes: Vec<&str> = local.routes.iter().map(|r| r.route.as_str()).collect();
        assert_eq!(routes, vec!["/", "/changepass"]);
    }

    #[test]
    fn duplicate_roots_keep_first_module() {
        let mut f = Fixture::new();
        f.module(
            "first",
            None,
            &[("routes.json", json!({ "root": "tags", "routes": [{ "route": "/a" }] }))],
        );
        f.module(
            "second",
            None,
            &[("routes.json", json!({ "root": "tags", "routes": [{ "route": "/b" }] }))],
        );
        let tree = f.tree();
        assert_eq!(child_paths(&tree), vec!["/api/tags"]);
        assert_eq!(tree.child_routers[0].routes[0].route, "/a");
    }

    #[test]
    fn broken_descriptor_skips_module() {
        let mut f = Fixture::new();
        f.module("broken", None, &[]);
        fs::write(f.dir.path().join("broken/routes.json"), "{ not json").unwrap();
        f.module(
            "content",
            None,
            &[("routes.json", json!({ "root": "content", "routes": [] }))],
        );
        assert_eq!(child_paths(&f.tree()), vec!["/api/content"]);
    }

    #[test]
    fn malformed_route_keeps_rest_of_module() {
        let mut f = Fixture::new();
        f.module(
            "m",
            None,
            &[(
                "routes.json",
                json!({
                    "root": "m",
                    "routes": [
                        { "route": "/a", "handlers": { "get": "h" }, "permissions": { "get": ["read:m"] } },
                        { "route": "/b", "handlers": { "get": "h" }, "internal": "true" },
                        { "handlers": { "post": "h" } }
                    ]
                }),
            )],
        );
        let tree = f.tree();
        let m = tree.child("/api/m").unwrap();
        let routes: Vec<&str> = m.routes.iter().map(|r| r.route.as_str()).collect();
        assert_eq!(routes, vec!["/a", "/b"]);
        assert!(!m.routes[0].internal);
        assert!(m.routes[1].internal);
    }

    #[test]
    fn modules_without_root_or_type_are_not_routed() {
        let mut f = Fixture::new();
        f.module(
            "odd",
            None,
            &[("routes.json", json!({ "root": "", "routes": [{ "route": "/x" }] }))],
        );
        assert!(f.tree().child_routers.is_empty());
    }
}
