//! Render orchestrator
//!
//! [`Engine`] owns the configuration, the template cache and the set of
//! declared dependencies. Rendering loads, compiles and executes a template:
//!
//! ```no_run
//! # async fn demo() -> kiln_core::Result<()> {
//! use kiln_core::{Engine, EngineConfig};
//! use serde_json::json;
//!
//! let engine = Engine::new(EngineConfig::default().with_template_root("views"))?;
//! engine.declare_dependency("layouts/base");
//! let html = engine.render("index", &json!({ "title": "Home" })).await?;
//! # let _ = html;
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheStats, TemplateCache, lock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::loader::{FsSource, Loader, TemplateSource};
use crate::path::{PathResolver, TemplatePath};
use crate::template::{Runtime, compile};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct Engine {
    config: EngineConfig,
    resolver: PathResolver,
    source: Arc<dyn TemplateSource>,
    cache: Mutex<TemplateCache>,
    pending: Mutex<HashSet<TemplatePath>>,
}

impl Engine {
    /// Engine reading templates from the filesystem
    ///
    /// # Errors
    ///
    /// `ConfigInvalid` if the configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_source(config, FsSource)
    }

    /// Engine reading templates from `source`
    pub fn with_source(config: EngineConfig, source: impl TemplateSource + 'static) -> Result<Self> {
        let config = config.validated()?;
        let resolver = PathResolver::new(
            config.template_root.clone(),
            config.template_extension.clone(),
        );
        debug!(
            root = %resolver.root().display(),
            extension = %config.template_extension,
            caching = config.enable_caching,
            "engine created"
        );

        Ok(Self {
            config,
            resolver,
            source: Arc::new(source),
            cache: Mutex::new(TemplateCache::new()),
            pending: Mutex::new(HashSet::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a reference against the template root
    pub fn resolve(&self, reference: impl AsRef<Path>) -> TemplatePath {
        self.resolver.resolve(reference)
    }

    /// Mark a template to be loaded before the next render
    ///
    /// Partials declared this way are available to `render(...)` from any
    /// template, in addition to those declared with `@`.
    pub fn declare_dependency(&self, reference: impl AsRef<Path>) {
        let path = self.resolver.resolve(reference);
        debug!(path = %path, "dependency declared");
        lock(&self.pending).insert(path);
    }

    /// Load, compile and execute the template at `reference`
    ///
    /// Pending declarations are loaded first, one at a time, stopping at the
    /// first failure. With caching disabled the render runs against a private
    /// cache generation that is dropped when this returns.
    ///
    /// # Errors
    ///
    /// Every failure of the load, compile or execution stage, see
    /// [`TemplateError`](crate::TemplateError).
    pub async fn render(&self, reference: impl AsRef<Path>, locals: &Value) -> Result<String> {
        let target = self.resolver.resolve(reference);

        if self.config.enable_caching {
            return self.render_in(&self.cache, target, locals).await;
        }

        let generation = Mutex::new(TemplateCache::new());
        let result = self.render_in(&generation, target, locals).await;
        debug!(stats = ?lock(&generation).stats(), "dropping cache generation");
        result
    }

    async fn render_in(
        &self,
        cache: &Mutex<TemplateCache>,
        target: TemplatePath,
        locals: &Value,
    ) -> Result<String> {
        let loader = Loader {
            source: &self.source,
            cache,
            resolver: &self.resolver,
            delimiters: &self.config.delimiters,
        };

        while let Some(declared) = self.take_pending() {
            loader.load(declared).await?;
        }
        loader.load(target.clone()).await?;

        let mut cache = lock(cache);
        let renderer = compile(&mut cache, &self.config.delimiters, &target)?;
        Runtime::new(&mut cache, &self.resolver, &self.config.delimiters).run(&renderer, locals)
    }

    fn take_pending(&self) -> Option<TemplatePath> {
        let mut pending = lock(&self.pending);
        let next = pending.iter().next().cloned()?;
        pending.remove(&next);
        Some(next)
    }

    /// Entry counts of the shared cache
    ///
    /// Always empty when caching is disabled.
    pub fn cache_stats(&self) -> CacheStats {
        lock(&self.cache).stats()
    }

    /// Drop every cached text and renderer
    pub fn clear_cache(&self) {
        debug!("cache cleared");
        lock(&self.cache).clear();
    }
}
