//! Dependency loader
//!
//! Reads a root template and, transitively, every partial it declares with `@`,
//! filling the text cache. Reads run concurrently as tasks on a [`JoinSet`];
//! the load finishes when the set drains, or at the first error.

mod source;

pub use source::{FsSource, MemorySource, TemplateSource};

use crate::cache::{TemplateCache, lock};
use crate::config::Delimiters;
use crate::error::{Result, TemplateError};
use crate::path::{PathResolver, TemplatePath};
use crate::template::{DirectiveKind, SyntaxError, tokenize};
use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, trace};

type ReadSet = JoinSet<(TemplatePath, io::Result<String>)>;

/// Shared inputs of one load
pub(crate) struct Loader<'a> {
    pub source: &'a Arc<dyn TemplateSource>,
    pub cache: &'a Mutex<TemplateCache>,
    pub resolver: &'a PathResolver,
    pub delimiters: &'a Delimiters,
}

impl Loader<'_> {
    /// Load `root` and everything it transitively declares
    ///
    /// A root whose text is already cached completes without I/O. After the
    /// first error, reads still in flight are detached: they run to completion
    /// and their results are dropped.
    pub(crate) async fn load(&self, root: TemplatePath) -> Result<()> {
        if lock(self.cache).has_text(&root) {
            trace!(path = %root, "text cache hit");
            return Ok(());
        }

        let mut reads = ReadSet::new();
        let mut queued = HashSet::new();
        queued.insert(root.clone());
        self.spawn_read(&mut reads, root);

        let result = self.drain(&mut reads, &mut queued).await;
        if let Err(err) = &result {
            debug!(error = %err, outstanding = reads.len(), "load failed, detaching reads");
            reads.detach_all();
        }
        result
    }

    async fn drain(
        &self,
        reads: &mut ReadSet,
        queued: &mut HashSet<TemplatePath>,
    ) -> Result<()> {
        while let Some(joined) = reads.join_next().await {
            let (path, read) = joined?;
            let text = read.map_err(|source| TemplateError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            let tokens =
                tokenize(&text, self.delimiters).map_err(|err| err.in_template(path.as_path()))?;

            for directive in tokens.directives() {
                if directive.kind != DirectiveKind::Declaration {
                    continue;
                }
                if directive.body.is_empty() {
                    return Err(SyntaxError {
                        offset: directive.offset,
                        line: directive.line,
                        message: "Empty dependency declaration".to_string(),
                    }
                    .in_template(path.as_path()));
                }

                let dependency = self.resolver.resolve_from(&directive.body, path.dir());
                if lock(self.cache).has_text(&dependency) || !queued.insert(dependency.clone()) {
                    continue;
                }
                debug!(from = %path, path = %dependency, "discovered dependency");
                self.spawn_read(reads, dependency);
            }

            lock(self.cache).insert_text(path, Arc::from(text));
        }
        Ok(())
    }

    fn spawn_read(&self, reads: &mut ReadSet, path: TemplatePath) {
        trace!(path = %path, "reading template");
        let read = self.source.read(path.to_path_buf());
        reads.spawn(async move { (path, read.await) });
    }
}
