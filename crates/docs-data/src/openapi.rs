//! OpenAPI 3 document for the REST explorer.
//!
//! Built purely from the router tree, the schema registry and the permission
//! index, so the explorer documents exactly what the static context derived.

use crate::context::StaticAppContext;
use crate::permissions::PermissionIndex;
use crate::routes::{RouterNode, StaticRoute, API_ROOT};
use crate::schemas::SchemaRegistry;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const OPENAPI_VERSION: &str = "3.0.3";

/// Appended to the description of routes only reachable from the host itself.
pub const INTERNAL_NOTICE: &str = "ONLY ACCESSIBLE FROM LOCALHOST";

const NO_AUTH: &str = "Route requires no authentication";

/// Build the document for a loaded context.
pub fn document_for(ctx: &StaticAppContext) -> Value {
    let version = ctx.pkg().version.as_deref().unwrap_or("0.0.0");
    build_document(version, ctx.schemas(), ctx.router_tree(), ctx.permissions())
}

pub fn build_document(
    version: &str,
    schemas: &SchemaRegistry,
    tree: &RouterNode,
    permissions: &PermissionIndex,
) -> Value {
    let components: Map<String, Value> = schemas
        .schemas()
        .map(|name| (name.to_string(), sanitise_schema(schemas.get_schema(name).built)))
        .collect();

    // A child router's `/` route and a parent route can share a path.
    let mut paths: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for node in tree.iter() {
        for route in &node.routes {
            let path = node.full_path(route);
            let operations = path_item(node, route, &path, permissions);
            let item = paths.entry(path.clone()).or_default();
            for (method, op) in operations {
                if item.insert(method.clone(), op).is_some() {
                    tracing::warn!(path = %path, method = %method, "operation declared twice, keeping the later one");
                }
            }
        }
    }

    json!({
        "openapi": OPENAPI_VERSION,
        "info": { "version": version },
        "components": { "schemas": components },
        "paths": paths
            .into_iter()
            .map(|(path, item)| (path, Value::Object(item)))
            .collect::<Map<String, Value>>(),
    })
}

/// One operation per handled method.
fn path_item(
    node: &RouterNode,
    route: &StaticRoute,
    path: &str,
    permissions: &PermissionIndex,
) -> Map<String, Value> {
    let tag = tag_for(&node.path);
    let path_params = path_parameters(&route.route);

    route
        .methods()
        .map(|method| {
            let meta = route.meta_for(method);
            let field = |key: &str| meta.and_then(|m| m.get(key)).cloned();
            let scopes = permissions.scopes_for(method, path);

            let mut description = match scopes {
                Some(scopes) => format!(
                    "Required scopes: {}",
                    scopes
                        .iter()
                        .map(|s| format!("<span>{s}</span>"))
                        .collect::<Vec<_>>()
                        .join(" ")
                ),
                None => NO_AUTH.to_string(),
            };
            if route.internal {
                description = format!("{description}. {INTERNAL_NOTICE}");
            }

            let mut parameters = path_params.clone();
            if let Some(Value::Array(declared)) = field("parameters") {
                parameters.extend(declared);
            }

            let mut op = Map::new();
            op.insert("tags".into(), json!([tag]));
            if let Some(summary) = field("description") {
                op.insert("summary".into(), summary);
            }
            op.insert("description".into(), Value::String(description));
            op.insert("parameters".into(), Value::Array(parameters));
            if let Some(body) = field("requestBody") {
                op.insert("requestBody".into(), body);
            }
            if let Some(responses) = field("responses") {
                op.insert("responses".into(), responses);
            }
            op.insert(
                "security".into(),
                json!([{ "roles": scopes.unwrap_or_default() }]),
            );
            (method.to_string(), Value::Object(op))
        })
        .collect()
}

/// `/api/auth/local` is tagged `auth local`.
fn tag_for(node_path: &str) -> String {
    node_path
        .strip_prefix(API_ROOT)
        .unwrap_or(node_path)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn path_parameters(route: &str) -> Vec<Value> {
    route
        .split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(|param| {
            let (name, required) = match param.strip_suffix('?') {
                Some(name) => (name, false),
                None => (param, true),
            };
            json!({ "name": name, "in": "path", "required": required })
        })
        .collect()
}

/// Drop properties flagged `isInternal` or `isReadOnly`, at every depth.
fn sanitise_schema(mut schema: Value) -> Value {
    if let Some(obj) = schema.as_object_mut() {
        if let Some(Value::Object(props)) = obj.get_mut("properties") {
            let kept: Map<String, Value> = std::mem::take(props)
                .into_iter()
                .filter(|(_, prop)| !is_flagged(prop, "isInternal") && !is_flagged(prop, "isReadOnly"))
                .map(|(key, prop)| (key, sanitise_schema(prop)))
                .collect();
            *props = kept;
        }
        if let Some(items) = obj.remove("items") {
            obj.insert("items".into(), sanitise_schema(items));
        }
    }
    schema
}

fn is_flagged(prop: &Value, flag: &str) -> bool {
    prop.get(flag).and_then(Value::as_bool).unwrap_or(false)
}
