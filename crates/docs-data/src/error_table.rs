//! Error table loader: every module's `errors/*.json`, flattened by code.

use crate::conventions::Conventions;
use crate::deps::Dependencies;
use crate::files::load_module_files;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One application error, shaped like the app's runtime error objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub code: String,
    pub status_code: u16,
    pub meta: ErrorMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMeta {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// An entry as declared in an error descriptor file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeclaredError {
    #[serde(default)]
    description: String,
    status_code: u16,
    #[serde(default)]
    data: Option<Value>,
}

/// All error definitions, ordered by code.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ErrorTable {
    entries: BTreeMap<String, ErrorEntry>,
}

impl ErrorTable {
    /// Merge every module's error files in discovery order.
    ///
    /// On a duplicate code the later module wins and the collision is logged.
    pub fn load(deps: &Dependencies, conventions: &Conventions) -> Self {
        let mut table = Self::default();
        let mut origins: BTreeMap<String, String> = BTreeMap::new();
        for module in load_module_files(deps, &conventions.errors_glob) {
            for (path, file) in module.files {
                let Value::Object(declared) = file else {
                    tracing::warn!(path = %path.display(), "error file is not an object");
                    continue;
                };
                for (code, definition) in declared {
                    let declared: DeclaredError = match serde_json::from_value(definition) {
                        Ok(d) => d,
                        Err(e) => {
                            tracing::warn!(code = %code, path = %path.display(), error = %e, "skipping malformed error");
                            continue;
                        }
                    };
                    if let Some(previous) = origins.insert(code.clone(), module.module.clone()) {
                        if previous != module.module {
                            tracing::warn!(
                                code = %code,
                                previous = %previous,
                                module = %module.module,
                                "error code redefined, keeping the later definition"
                            );
                        }
                    }
                    table.insert(code, declared);
                }
            }
        }
        table
    }

    fn insert(&mut self, code: String, declared: DeclaredError) {
        let entry = ErrorEntry {
            code: code.clone(),
            status_code: declared.status_code,
            meta: ErrorMeta {
                description: declared.description,
                data: declared.data.filter(|d| !d.is_null()),
            },
        };
        self.entries.insert(code, entry);
    }

    pub fn get(&self, code: &str) -> Option<&ErrorEntry> {
        self.entries.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declared(value: Value) -> DeclaredError {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn data_is_omitted_when_absent() {
        let mut table = ErrorTable::default();
        table.insert(
            "CONTENT_NOT_FOUND".to_string(),
            declared(json!({ "statusCode": 404, "description": "Content not found" })),
        );
        let entry = serde_json::to_value(table.get("CONTENT_NOT_FOUND").unwrap()).unwrap();
        assert_eq!(
            entry,
            json!({
                "code": "CONTENT_NOT_FOUND",
                "statusCode": 404,
                "meta": { "description": "Content not found" }
            })
        );
    }

    #[test]
    fn data_is_kept_when_present() {
        let mut table = ErrorTable::default();
        table.insert(
            "INVALID_PARAMS".to_string(),
            declared(json!({
                "statusCode": 400,
                "description": "Invalid parameters",
                "data": { "params": "List of invalid params" }
            })),
        );
        let entry = table.get("INVALID_PARAMS").unwrap();
        assert_eq!(entry.meta.data, Some(json!({ "params": "List of invalid params" })));
    }

    #[test]
    fn entries_are_ordered_by_code() {
        let mut table = ErrorTable::default();
        for code in ["ZED", "ALPHA", "MIDDLE"] {
            table.insert(code.to_string(), declared(json!({ "statusCode": 500 })));
        }
        let codes: Vec<&str> = table.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["ALPHA", "MIDDLE", "ZED"]);
    }
}
