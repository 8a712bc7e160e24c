//! Text and renderer caches
//!
//! Both maps are keyed by [`TemplatePath`] and are append-only within a cache
//! generation. [`TemplateCache::clear`] ends a generation.

use crate::path::TemplatePath;
use crate::template::Renderer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lock a cache-side mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State of a renderer cache entry
#[derive(Debug, Clone)]
pub(crate) enum RendererSlot {
    /// Placeholder installed before the body is generated
    InProgress,
    Ready(Arc<Renderer>),
}

/// Entry counts, for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub texts: usize,
    pub renderers: usize,
}

impl CacheStats {
    pub fn is_empty(&self) -> bool {
        self.texts == 0 && self.renderers == 0
    }
}

#[derive(Debug, Default)]
pub(crate) struct TemplateCache {
    texts: HashMap<TemplatePath, Arc<str>>,
    renderers: HashMap<TemplatePath, RendererSlot>,
}

impl TemplateCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store raw text; an existing entry for the same path is kept
    pub(crate) fn insert_text(&mut self, path: TemplatePath, text: Arc<str>) {
        self.texts.entry(path).or_insert(text);
    }

    pub(crate) fn text(&self, path: &TemplatePath) -> Option<Arc<str>> {
        self.texts.get(path).cloned()
    }

    pub(crate) fn has_text(&self, path: &TemplatePath) -> bool {
        self.texts.contains_key(path)
    }

    pub(crate) fn renderer(&self, path: &TemplatePath) -> Option<&RendererSlot> {
        self.renderers.get(path)
    }

    /// Install the in-progress placeholder for `path`
    pub(crate) fn begin(&mut self, path: TemplatePath) {
        self.renderers.insert(path, RendererSlot::InProgress);
    }

    /// Replace the placeholder with the compiled renderer
    pub(crate) fn install(&mut self, path: TemplatePath, renderer: Arc<Renderer>) {
        self.renderers.insert(path, RendererSlot::Ready(renderer));
    }

    /// Drop the placeholder after a failed compilation
    pub(crate) fn abandon(&mut self, path: &TemplatePath) {
        if let Some(RendererSlot::InProgress) = self.renderers.get(path) {
            self.renderers.remove(path);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.texts.clear();
        self.renderers.clear();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            texts: self.texts.len(),
            renderers: self.renderers.len(),
        }
    }
}
