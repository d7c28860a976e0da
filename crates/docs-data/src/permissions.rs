//! Permission index: which scopes each secured route requires.
//!
//! Entries are grouped by HTTP method and kept in router-tree traversal
//! order. Lookups return the first matching entry, the same way the live
//! auth module resolves a request.

use crate::error::Result;
use crate::pattern::PathPattern;
use crate::routes::RouterNode;
use indexmap::IndexMap;

/// Methods that always have an entry list, even when empty.
pub const STANDARD_METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// One secured route: its compiled path and the scopes it requires.
#[derive(Debug, Clone)]
pub struct PermissionEntry {
    pub pattern: PathPattern,
    pub scopes: Vec<String>,
}

/// Secured routes grouped by lowercase method.
#[derive(Debug, Clone)]
pub struct PermissionIndex {
    methods: IndexMap<String, Vec<PermissionEntry>>,
}

impl Default for PermissionIndex {
    fn default() -> Self {
        Self {
            methods: STANDARD_METHODS
                .iter()
                .map(|m| (m.to_string(), Vec::new()))
                .collect(),
        }
    }
}

impl PermissionIndex {
    /// Walk `tree` depth-first (a node's routes before its children) and
    /// index every method with declared scopes.
    ///
    /// Methods declared with `null` permissions are unauthenticated and left
    /// out. Routes whose path does not compile are logged and skipped.
    pub fn build(tree: &RouterNode) -> Self {
        let mut index = Self::default();
        for node in tree.iter() {
            for route in &node.routes {
                let secured: Vec<(&String, &Vec<String>)> = route
                    .permissions
                    .iter()
                    .filter_map(|(method, scopes)| scopes.as_ref().map(|s| (method, s)))
                    .collect();
                if secured.is_empty() {
                    continue;
                }
                let path = node.full_path(route);
                let pattern = match PathPattern::compile(&path) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "skipping route with unusual pattern");
                        continue;
                    }
                };
                for (method, scopes) in secured {
                    index.push(method, pattern.clone(), scopes.clone());
                }
            }
        }
        index
    }

    /// Compile `path` and append an entry for `method`.
    pub fn insert(&mut self, method: &str, path: &str, scopes: Vec<String>) -> Result<()> {
        let pattern = PathPattern::compile(path)?;
        self.push(method, pattern, scopes);
        Ok(())
    }

    fn push(&mut self, method: &str, pattern: PathPattern, scopes: Vec<String>) {
        self.methods
            .entry(method.to_ascii_lowercase())
            .or_default()
            .push(PermissionEntry { pattern, scopes });
    }

    /// First entry for `method` whose pattern matches `path`.
    pub fn lookup(&self, method: &str, path: &str) -> Option<&PermissionEntry> {
        self.methods
            .get(&method.to_ascii_lowercase())?
            .iter()
            .find(|entry| entry.pattern.is_match(path))
    }

    /// Scopes required for `method` on `path`; `None` when the route is not secured.
    pub fn scopes_for(&self, method: &str, path: &str) -> Option<&[String]> {
        self.lookup(method, path).map(|e| e.scopes.as_slice())
    }

    /// All entries for `method`, in lookup order.
    pub fn entries(&self, method: &str) -> &[PermissionEntry] {
        self.methods
            .get(&method.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Total number of indexed entries across all methods.
    pub fn len(&self) -> usize {
        self.methods.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{RouteDefinition, StaticRoute};
    use serde_json::{json, Value};

    fn node(path: &str, routes: Value) -> RouterNode {
        let defs: Vec<RouteDefinition> = serde_json::from_value(routes).unwrap();
        let mut node = RouterNode::new(path);
        node.routes = defs.into_iter().map(StaticRoute::from).collect();
        node
    }

    fn tree() -> RouterNode {
        let mut root = node("/api", json!([]));
        let mut auth = node(
            "/api/auth",
            json!([{ "route": "/check", "handlers": { "get": "h" }, "permissions": { "get": null } }]),
        );
        auth.child_routers.push(node(
            "/api/auth/local",
            json!([{ "route": "/register", "permissions": { "POST": ["register:users"] } }]),
        ));
        root.child_routers.push(auth);
        root.child_routers.push(node(
            "/api/content",
            json!([
                { "route": "/", "permissions": { "get": ["read:content"], "post": ["write:content"] } },
                { "route": "/:_id", "permissions": { "get": ["read:content"], "delete": ["write:content"] } },
                { "route": "/clone", "permissions": { "get": ["clone:content"] } },
                { "route": "/bad/*", "permissions": { "get": ["never"] } }
            ]),
        ));
        root
    }

    #[test]
    fn standard_methods_always_present() {
        let index = PermissionIndex::build(&RouterNode::new("/api"));
        assert_eq!(index.methods().collect::<Vec<_>>(), STANDARD_METHODS);
        assert!(index.entries("put").is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn null_permissions_are_not_indexed() {
        let index = PermissionIndex::build(&tree());
        assert!(index.lookup("get", "/api/auth/check").is_none());
    }

    #[test]
    fn methods_are_lowercased() {
        let index = PermissionIndex::build(&tree());
        assert_eq!(
            index.scopes_for("post", "/api/auth/local/register"),
            Some(&["register:users".to_string()][..])
        );
        assert!(index.lookup("POST", "/api/auth/local/register").is_some());
    }

    #[test]
    fn root_route_maps_to_mount_path() {
        let index = PermissionIndex::build(&tree());
        assert_eq!(
            index.scopes_for("post", "/api/content"),
            Some(&["write:content".to_string()][..])
        );
    }

    #[test]
    fn first_match_wins_in_traversal_order() {
        let index = PermissionIndex::build(&tree());
        // `/:_id` is declared before `/clone` and matches it too
        assert_eq!(
            index.scopes_for("get", "/api/content/clone"),
            Some(&["read:content".to_string()][..])
        );
        let paths: Vec<&str> = index
            .entries("get")
            .iter()
            .map(|e| e.pattern.source())
            .collect();
        assert_eq!(
            paths,
            vec!["/api/content", "/api/content/:_id", "/api/content/clone"]
        );
    }

    #[test]
    fn unusual_patterns_are_skipped() {
        let index = PermissionIndex::build(&tree());
        assert!(index
            .entries("get")
            .iter()
            .all(|e| !e.scopes.contains(&"never".to_string())));
    }

    #[test]
    fn insert_adds_methods_on_demand() {
        let mut index = PermissionIndex::default();
        index
            .insert("OPTIONS", "/api/things/:id", vec!["read:things".to_string()])
            .unwrap();
        assert!(index.methods().any(|m| m == "options"));
        assert!(index.lookup("options", "/api/things/42").is_some());
        assert!(index.insert("get", "/api/(x)", Vec::new()).is_err());
    }
}
