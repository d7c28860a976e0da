//! `${scope}`, `${schemaName}` and `${collectionName}` substitution for
//! REST-resource routes inherited from the api module's template.

use super::{RouteConfig, RouteDefinition};
use serde_json::{Map, Value};

/// Resolved placeholder values for one REST-resource module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    pairs: [(&'static str, String); 3],
}

impl Placeholders {
    /// Resolve placeholders for a module mounted at `root`.
    ///
    /// `permissionsScope` falls back to `root` when missing or empty;
    /// `schemaName` and `collectionName` only when missing.
    pub fn for_config(config: &RouteConfig, root: &str) -> Self {
        let scope = config
            .permissions_scope
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(root);
        let schema_name = config.schema_name.as_deref().unwrap_or(root);
        let collection_name = config.collection_name.as_deref().unwrap_or(root);
        Self::new(scope, schema_name, collection_name)
    }

    pub fn new(scope: &str, schema_name: &str, collection_name: &str) -> Self {
        Self {
            pairs: [
                ("${scope}", scope.to_string()),
                ("${schemaName}", schema_name.to_string()),
                ("${collectionName}", collection_name.to_string()),
            ],
        }
    }

    pub fn apply(&self, s: &str) -> String {
        self.pairs
            .iter()
            .fold(s.to_string(), |acc, (token, value)| acc.replace(token, value))
    }

    /// Substitute in every string leaf; object keys are left alone.
    pub fn apply_value(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.apply(&s)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.apply_value(v)).collect())
            }
            Value::Object(map) => Value::Object(self.apply_map(map)),
            other => other,
        }
    }

    fn apply_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        map.into_iter()
            .map(|(k, v)| (k, self.apply_value(v)))
            .collect()
    }

    /// Substitute through every string field of a route definition.
    pub fn apply_route(&self, route: RouteDefinition) -> RouteDefinition {
        RouteDefinition {
            route: self.apply(&route.route),
            handlers: route.handlers.map(|h| self.apply_map(h)),
            meta: route.meta.map(|m| self.apply_map(m)),
            internal: route.internal,
            permissions: route.permissions.map(|perms| {
                perms
                    .into_iter()
                    .map(|(method, scopes)| {
                        let scopes =
                            scopes.map(|s| s.iter().map(|scope| self.apply(scope)).collect());
                        (method, scopes)
                    })
                    .collect()
            }),
            is_override: route.is_override,
        }
    }
}
