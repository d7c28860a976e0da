//! Merge a module's custom routes with an inherited default-route template.
//!
//! Defaults come first, in template order. A custom route flagged
//! `override` is folded into the default with the same `route` value; every
//! other custom route is appended afterwards in declared order.

use super::RouteDefinition;
use std::collections::{HashMap, HashSet};

/// Merge `custom` routes into `defaults`.
///
/// An override whose `route` matches no default is kept and appended like a
/// plain custom route rather than dropped.
pub fn merge_with_defaults(
    custom: Vec<RouteDefinition>,
    defaults: &[RouteDefinition],
) -> Vec<RouteDefinition> {
    // Last override per route wins
    let overrides: HashMap<&str, &RouteDefinition> = custom
        .iter()
        .filter(|r| r.is_override)
        .map(|r| (r.route.as_str(), r))
        .collect();

    let mut consumed: HashSet<String> = HashSet::new();
    let mut merged: Vec<RouteDefinition> = defaults
        .iter()
        .map(|default| match overrides.get(default.route.as_str()) {
            Some(o) => {
                consumed.insert(default.route.clone());
                apply_override(default, o)
            }
            None => default.clone(),
        })
        .collect();

    merged.extend(
        custom
            .into_iter()
            .filter(|r| !(r.is_override && consumed.contains(&r.route)))
            .map(|mut r| {
                if r.is_override {
                    tracing::debug!(route = %r.route, "override has no default route, keeping as custom route");
                    r.is_override = false;
                }
                r
            }),
    );
    merged
}

/// Field precedence for an overridden default:
///
/// | field         | result                                   |
/// |---------------|------------------------------------------|
/// | `handlers`    | default's methods, override's on top     |
/// | `meta`        | override's if declared, else default's   |
/// | `internal`    | override's if declared, else default's   |
/// | `permissions` | override's if declared, else default's   |
fn apply_override(default: &RouteDefinition, o: &RouteDefinition) -> RouteDefinition {
    let mut handlers = default.handlers.clone().unwrap_or_default();
    if let Some(extra) = &o.handlers {
        handlers.extend(extra.clone());
    }
    RouteDefinition {
        route: default.route.clone(),
        handlers: Some(handlers),
        meta: o.meta.clone().or_else(|| default.meta.clone()),
        internal: o.internal.or(default.internal),
        permissions: o.permissions.clone().or_else(|| default.permissions.clone()),
        is_override: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn routes(value: Value) -> Vec<RouteDefinition> {
        serde_json::from_value(value).unwrap()
    }

    fn paths(routes: &[RouteDefinition]) -> Vec<&str> {
        routes.iter().map(|r| r.route.as_str()).collect()
    }

    fn auth_defaults() -> Vec<RouteDefinition> {
        routes(json!([
            {
                "route": "/",
                "handlers": { "post": "authenticateHandler", "get": "statusHandler" },
                "meta": { "post": { "summary": "Authenticate" } },
                "permissions": { "post": null }
            },
            {
                "route": "/register",
                "handlers": { "post": "registerHandler" },
                "permissions": { "post": ["register:users"] }
            }
        ]))
    }

    #[test]
    fn defaults_then_customs_in_order() {
        let custom = routes(json!([
            { "route": "/", "override": true, "handlers": { "post": "localAuth" } },
            { "route": "/changepass", "handlers": { "post": "changePasswordHandler" } },
            { "route": "/forgot", "handlers": { "post": "forgotHandler" } }
        ]));
        let merged = merge_with_defaults(custom, &auth_defaults());
        assert_eq!(paths(&merged), vec!["/", "/register", "/changepass", "/forgot"]);
    }

    #[test]
    fn override_superimposes_handlers() {
        let custom = routes(json!([
            {
                "route": "/",
                "override": true,
                "handlers": { "post": "localAuth", "put": "refresh" },
                "meta": { "post": { "summary": "Local auth" } }
            }
        ]));
        let merged = merge_with_defaults(custom, &auth_defaults());
        let root = &merged[0];

        let handlers = root.handlers.as_ref().unwrap();
        assert_eq!(handlers["post"], "localAuth");
        assert_eq!(handlers["get"], "statusHandler");
        assert_eq!(handlers["put"], "refresh");
        // default method order is kept, new methods appended
        assert_eq!(handlers.keys().collect::<Vec<_>>(), vec!["post", "get", "put"]);

        // declared override fields replace the default's
        assert_eq!(root.meta.as_ref().unwrap()["post"]["summary"], "Local auth");
        // undeclared override fields fall back to the default's
        assert_eq!(root.permissions.as_ref().unwrap()["post"], None);
        assert!(!root.is_override);
    }

    #[test]
    fn unmatched_override_is_appended() {
        let custom = routes(json!([
            { "route": "/extra", "override": true, "handlers": { "get": "extraHandler" } }
        ]));
        let merged = merge_with_defaults(custom, &auth_defaults());
        assert_eq!(paths(&merged), vec!["/", "/register", "/extra"]);
        assert!(!merged[2].is_override);
    }

    #[test]
    fn empty_defaults_keep_customs() {
        let custom = routes(json!([{ "route": "/query" }]));
        let merged = merge_with_defaults(custom, &[]);
        assert_eq!(paths(&merged), vec!["/query"]);
    }
}
