//! Shared test helpers for template engine tests

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::loader::MemorySource;
use serde_json::Value;

pub(super) const ROOT: &str = "/views";

/// In-memory source with `files` placed under [`ROOT`]
pub(super) fn source(files: &[(&str, &str)]) -> MemorySource {
    let source = MemorySource::new();
    for (name, text) in files {
        source.insert(format!("{}/{}", ROOT, name), *text);
    }
    source
}

pub(super) fn config() -> EngineConfig {
    EngineConfig::default().with_template_root(ROOT)
}

pub(super) fn engine(files: &[(&str, &str)]) -> Engine {
    engine_with(config(), files)
}

pub(super) fn engine_with(config: EngineConfig, files: &[(&str, &str)]) -> Engine {
    Engine::with_source(config, source(files)).unwrap()
}

/// Render `page.kiln` holding `template`
pub(super) async fn render_page(template: &str, locals: &Value) -> Result<String> {
    engine(&[("page.kiln", template)]).render("page", locals).await
}
