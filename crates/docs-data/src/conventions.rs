//! Conventional file locations inside an adapt-authoring installation.

/// File names and globs the loaders look for, plus the two distinguished
/// module names that supply default-route templates.
///
/// Every loader takes a `&Conventions` so fixtures and alternative layouts
/// can be described without touching global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Directory (relative to the app root) holding installed modules.
    pub modules_dir: String,
    /// Per-module metadata descriptor; its presence marks a module.
    pub metadata_file: String,
    /// Per-module package descriptor, merged under the metadata.
    pub package_file: String,
    /// Config schema whose property defaults feed [`crate::ConfigDefaults`].
    pub config_schema: String,
    /// Schema fragments, relative to a module root.
    pub schema_glob: String,
    /// Error descriptors, relative to a module root.
    pub errors_glob: String,
    /// Route descriptor of a REST-resource or auth-strategy module.
    pub routes_file: String,
    /// The auth module's own routes, mounted at `/api/auth`.
    pub auth_routes_file: String,
    /// Default-route template shipped by the api and auth modules.
    pub default_routes_file: String,
    pub auth_module: String,
    pub api_module: String,
    /// Token replaced with the OS temp directory in string config defaults.
    pub temp_token: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            modules_dir: "node_modules".to_string(),
            metadata_file: "adapt-authoring.json".to_string(),
            package_file: "package.json".to_string(),
            config_schema: "conf/config.schema.json".to_string(),
            schema_glob: "schema/*.schema.json".to_string(),
            errors_glob: "errors/*.json".to_string(),
            routes_file: "routes.json".to_string(),
            auth_routes_file: "lib/routes.json".to_string(),
            default_routes_file: "lib/default-routes.json".to_string(),
            auth_module: "adapt-authoring-auth".to_string(),
            api_module: "adapt-authoring-api".to_string(),
            temp_token: "$TEMP".to_string(),
        }
    }
}
