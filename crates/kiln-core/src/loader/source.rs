//! Where template text comes from

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Asynchronous "read file by path"
///
/// Paths passed in are resolved template paths. The returned future must not
/// borrow from `self`; the loader runs reads as independent tasks.
pub trait TemplateSource: Send + Sync {
    fn read(&self, path: PathBuf) -> BoxFuture<'static, io::Result<String>>;
}

/// Reads templates from the filesystem with `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl TemplateSource for FsSource {
    fn read(&self, path: PathBuf) -> BoxFuture<'static, io::Result<String>> {
        tokio::fs::read_to_string(path).boxed()
    }
}

/// In-memory templates keyed by absolute path
///
/// Clones share the same map, so templates can be added or replaced after the
/// source has been handed to an engine.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    reads: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemorySource::insert`]
    pub fn with(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let mut files = self.files.lock().unwrap_or_else(|p| p.into_inner());
        files.insert(path.into(), text.into());
    }

    /// Number of reads served so far, including failed ones
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TemplateSource for MemorySource {
    fn read(&self, path: PathBuf) -> BoxFuture<'static, io::Result<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let files = self.files.lock().unwrap_or_else(|p| p.into_inner());
        let result = files.get(&path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no template at {}", path.display()),
            )
        });
        async move { result }.boxed()
    }
}
