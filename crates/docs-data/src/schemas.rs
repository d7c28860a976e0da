//! Schema loader: every module's JSON-schema fragments, keyed by anchor or id.

use crate::conventions::Conventions;
use crate::deps::Dependencies;
use crate::files::load_module_files;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Key used for fragments that declare neither `$anchor` nor `$id`.
pub const UNKNOWN_SCHEMA: &str = "unknown";

/// Result of [`SchemaRegistry::get_schema`], shaped like the app's own
/// `jsonschema.getSchema()` return value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltSchema {
    pub built: Value,
}

/// All schema fragments found across modules.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaRegistry {
    raw: IndexMap<String, Value>,
}

impl SchemaRegistry {
    /// Load `schema/*.schema.json` from every module, in discovery order.
    ///
    /// A later fragment with the same key replaces an earlier one.
    pub fn load(deps: &Dependencies, conventions: &Conventions) -> Self {
        let mut registry = Self::default();
        for module in load_module_files(deps, &conventions.schema_glob) {
            for (path, schema) in module.files {
                let key = schema_key(&schema);
                if key == UNKNOWN_SCHEMA {
                    tracing::warn!(
                        module = %module.module,
                        path = %path.display(),
                        "schema declares neither $anchor nor $id"
                    );
                }
                registry.insert(key, schema);
            }
        }
        registry
    }

    /// Register a fragment under `name`.
    pub fn insert(&mut self, name: impl Into<String>, schema: Value) {
        self.raw.insert(name.into(), schema);
    }

    /// Names of all registered schemas.
    pub fn schemas(&self) -> impl Iterator<Item = &str> {
        self.raw.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.raw.contains_key(name)
    }

    /// The fragment exactly as read from disk.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    /// The fragment wrapped as `{ built }`; unknown names give an empty object.
    pub fn get_schema(&self, name: &str) -> BuiltSchema {
        BuiltSchema {
            built: self
                .raw
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

fn schema_key(schema: &Value) -> String {
    ["$anchor", "$id"]
        .iter()
        .filter_map(|field| schema.get(*field).and_then(Value::as_str))
        .find(|key| !key.is_empty())
        .unwrap_or(UNKNOWN_SCHEMA)
        .to_string()
}
