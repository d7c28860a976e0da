//! REST explorer: the OpenAPI document plus a static viewer page.

use super::{Generator, GeneratorContext};
use anyhow::{Context, Result};
use docs_data::openapi;
use std::fs;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>REST API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    SwaggerUIBundle({ url: 'api.json', dom_id: '#swagger' });
  </script>
</body>
</html>
"#;

pub struct RestGenerator;

impl Generator for RestGenerator {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn run(&self, ctx: &GeneratorContext) -> Result<()> {
        let dir = ctx.output_dir.join("rest");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let document = openapi::document_for(ctx.app);
        let paths = document["paths"].as_object().map_or(0, |p| p.len());

        let api_path = dir.join("api.json");
        fs::write(&api_path, serde_json::to_string_pretty(&document)?)
            .with_context(|| format!("failed to write {}", api_path.display()))?;
        fs::write(dir.join("index.html"), INDEX_HTML)
            .with_context(|| format!("failed to write viewer page in {}", dir.display()))?;

        tracing::info!(paths, "wrote REST API document");
        Ok(())
    }
}
