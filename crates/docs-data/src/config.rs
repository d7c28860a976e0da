//! Config default resolver.
//!
//! Each module may ship `conf/config.schema.json`; the `default` of every
//! declared property becomes the value a running app would see when nothing
//! overrides it. Lookup mirrors the app's own `config.get("module.key")`.

use crate::conventions::Conventions;
use crate::deps::Dependencies;
use crate::files::read_json;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Per-module config defaults extracted from config schemas.
#[derive(Debug, Clone, Default)]
pub struct ConfigDefaults {
    defaults: IndexMap<String, Map<String, Value>>,
    temp_token: String,
}

impl ConfigDefaults {
    /// Read every module's config schema and keep the declared defaults.
    ///
    /// Modules without a schema contribute nothing; unparseable schemas are
    /// logged and skipped.
    pub fn load(deps: &Dependencies, conventions: &Conventions) -> Self {
        let defaults = deps
            .values()
            .filter_map(|dep| {
                let path = dep.root_dir.join(&conventions.config_schema);
                if !path.is_file() {
                    return None;
                }
                match read_json(&path) {
                    Ok(schema) => Some((dep.name.clone(), extract_defaults(&schema))),
                    Err(e) => {
                        tracing::warn!(module = %dep.name, error = %e, "skipping config schema");
                        None
                    }
                }
            })
            .filter(|(_, defaults)| !defaults.is_empty())
            .collect();
        Self::from_defaults(defaults, &conventions.temp_token)
    }

    /// Build a resolver from already-extracted defaults.
    pub fn from_defaults(defaults: IndexMap<String, Map<String, Value>>, temp_token: &str) -> Self {
        Self {
            defaults,
            temp_token: temp_token.to_string(),
        }
    }

    /// Look up `module.property`, or a whole module's defaults with `module`.
    ///
    /// Only the first dot separates module from property, so property names
    /// may themselves contain dots. String values have the temp token replaced
    /// by the current OS temp directory on every call.
    pub fn get(&self, key: &str) -> Option<Value> {
        let Some((module, property)) = key.split_once('.') else {
            return self.defaults.get(key).cloned().map(Value::Object);
        };
        match self.defaults.get(module)?.get(property)? {
            Value::String(s) => Some(Value::String(self.resolve_temp(s))),
            other => Some(other.clone()),
        }
    }

    /// [`get`](Self::get) narrowed to string values.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn resolve_temp(&self, value: &str) -> String {
        if self.temp_token.is_empty() || !value.contains(&self.temp_token) {
            return value.to_string();
        }
        let temp = std::env::temp_dir();
        value.replace(&self.temp_token, &temp.to_string_lossy())
    }
}

/// Collect `properties.*.default` from a config schema.
///
/// An explicit `"default": null` counts as a declared default.
fn extract_defaults(schema: &Value) -> Map<String, Value> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Map::new();
    };
    properties
        .iter()
        .filter_map(|(key, prop)| prop.get("default").map(|d| (key.clone(), d.clone())))
        .collect()
}
