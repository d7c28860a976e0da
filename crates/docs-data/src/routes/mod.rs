//! Route model: declared route definitions and the assembled router tree.
//!
//! Route descriptors are read as [`RouteDefinition`]s, merged with the
//! default-route templates, and finally converted into [`StaticRoute`]s
//! hanging off a [`RouterNode`] tree that mirrors the live server's mounts.

pub mod merge;
pub mod placeholder;
pub mod tree;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Mount path of the tree root.
pub const API_ROOT: &str = "/api";

/// Declared scopes per HTTP method. `None` marks an explicitly
/// unauthenticated method, which is different from the method being absent.
pub type Permissions = IndexMap<String, Option<Vec<String>>>;

/// A route as declared in `routes.json` or a default-routes template.
///
/// Optional fields stay `None` when undeclared so an override can tell
/// "not mentioned" apart from "set to empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    /// Read by truthiness, so `"true"` or `1` count as set.
    #[serde(
        default,
        deserialize_with = "truthy",
        skip_serializing_if = "Option::is_none"
    )]
    pub internal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(rename = "override", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_override: bool,
}

/// A module's route descriptor file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// Mount segment of a REST-resource module (`/api/{root}`).
    #[serde(default)]
    pub root: Option<String>,
    /// Auth strategy name of an auth-type module (`/api/auth/{type}`).
    #[serde(default, rename = "type")]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub permissions_scope: Option<String>,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default = "default_true")]
    pub use_default_routes: bool,
    /// Entries that don't describe a route are logged and dropped one by one.
    #[serde(default, deserialize_with = "well_formed_routes")]
    pub routes: Vec<RouteDefinition>,
}

fn default_true() -> bool {
    true
}

fn truthy<'de, D: Deserializer<'de>>(de: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Null => None,
        Value::Bool(b) => Some(b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => Some(!s.is_empty()),
        Value::Array(_) | Value::Object(_) => Some(true),
    })
}

fn well_formed_routes<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<RouteDefinition>, D::Error> {
    let entries = Option::<Vec<Value>>::deserialize(de)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let route = entry
                .get("route")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>")
                .to_string();
            serde_json::from_value(entry)
                .inspect_err(|e| tracing::warn!(route = %route, error = %e, "skipping malformed route"))
                .ok()
        })
        .collect())
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            root: None,
            auth_type: None,
            permissions_scope: None,
            schema_name: None,
            collection_name: None,
            use_default_routes: true,
            routes: Vec::new(),
        }
    }
}

/// Stand-in for a request handler. Documentation never dispatches requests,
/// so every declared handler becomes one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoopHandler;

/// A route in its assembled, static form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticRoute {
    pub route: String,
    pub handlers: IndexMap<String, NoopHandler>,
    pub meta: Map<String, Value>,
    pub internal: bool,
    pub permissions: Permissions,
}

impl StaticRoute {
    /// HTTP methods with a handler, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Documentation metadata for one method.
    pub fn meta_for(&self, method: &str) -> Option<&Map<String, Value>> {
        self.meta.get(method).and_then(Value::as_object)
    }
}

impl From<RouteDefinition> for StaticRoute {
    fn from(def: RouteDefinition) -> Self {
        Self {
            handlers: def
                .handlers
                .unwrap_or_default()
                .into_iter()
                .map(|(method, _)| (method, NoopHandler))
                .collect(),
            route: def.route,
            meta: def.meta.unwrap_or_default(),
            internal: def.internal.unwrap_or(false),
            permissions: def.permissions.unwrap_or_default(),
        }
    }
}

/// One router in the mount tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterNode {
    /// Absolute mount prefix, e.g. `/api/auth/local`.
    pub path: String,
    pub routes: Vec<StaticRoute>,
    pub child_routers: Vec<RouterNode>,
}

impl RouterNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            routes: Vec::new(),
            child_routers: Vec::new(),
        }
    }

    /// Absolute path of one of this node's routes. The `/` route maps to the
    /// mount path itself.
    pub fn full_path(&self, route: &StaticRoute) -> String {
        if route.route == "/" {
            self.path.clone()
        } else {
            format!("{}{}", self.path, route.route)
        }
    }

    /// Direct child mounted at `path`.
    pub fn child(&self, path: &str) -> Option<&RouterNode> {
        self.child_routers.iter().find(|c| c.path == path)
    }

    /// Any node in this subtree mounted at `path`.
    pub fn find(&self, path: &str) -> Option<&RouterNode> {
        self.iter().find(|node| node.path == path)
    }

    /// Depth-first pre-order walk: a node, then each child subtree in order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    pub(crate) fn child_mut(&mut self, path: &str) -> Option<&mut RouterNode> {
        self.child_routers.iter_mut().find(|c| c.path == path)
    }

    /// Mount `child` unless a sibling already owns its path.
    pub(crate) fn mount(&mut self, child: RouterNode) -> bool {
        if self.child(&child.path).is_some() {
            tracing::warn!(path = %child.path, "router already mounted, skipping duplicate");
            return false;
        }
        self.child_routers.push(child);
        true
    }
}

/// Pre-order iterator over a [`RouterNode`] tree.
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a RouterNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a RouterNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.child_routers.iter().rev());
        Some(node)
    }
}
