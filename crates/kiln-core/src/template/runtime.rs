//! Renderer execution

use super::compile::{Node, Renderer, compile};
use super::escape::escape_html;
use super::script::{EvalError, Expr, PartialHost, Scope, eval, is_truthy, stringify, type_name};
use crate::cache::{RendererSlot, TemplateCache};
use crate::config::Delimiters;
use crate::error::{Result, TemplateError};
use crate::path::{PathResolver, TemplatePath};
use serde_json::Value;
use tracing::{debug, trace};

/// Deepest chain of nested `render(...)` calls
pub(crate) const MAX_PARTIAL_DEPTH: usize = 64;

/// Executes renderers against one cache generation
///
/// Partials are compiled on first use. Templates may render themselves; a
/// chain of partial calls deeper than [`MAX_PARTIAL_DEPTH`] fails instead.
pub(crate) struct Runtime<'a> {
    cache: &'a mut TemplateCache,
    resolver: &'a PathResolver,
    delimiters: &'a Delimiters,
    active: Vec<TemplatePath>,
}

impl<'a> Runtime<'a> {
    pub(crate) fn new(
        cache: &'a mut TemplateCache,
        resolver: &'a PathResolver,
        delimiters: &'a Delimiters,
    ) -> Self {
        Self {
            cache,
            resolver,
            delimiters,
            active: Vec::new(),
        }
    }

    pub(crate) fn run(&mut self, renderer: &Renderer, locals: &Value) -> Result<String> {
        let path = renderer.path();
        self.active.push(path.clone());
        let mut out = String::new();
        let mut scope = Scope::new(locals);
        let result = self.exec(renderer.nodes(), &mut scope, path, &mut out);
        self.active.pop();

        result.map(|()| out)
    }

    fn exec(
        &mut self,
        nodes: &[Node],
        scope: &mut Scope<'_>,
        path: &TemplatePath,
        out: &mut String,
    ) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output { expr, escape, line } => {
                    let value = self.value(expr, scope, path, *line)?;
                    let text = stringify(&value);
                    if *escape {
                        out.push_str(&escape_html(&text));
                    } else {
                        out.push_str(&text);
                    }
                }
                Node::Eval { expr, line } => {
                    self.value(expr, scope, path, *line)?;
                }
                Node::Let { name, value, line } => {
                    let value = self.value(value, scope, path, *line)?;
                    scope.bind(name, value);
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = None;
                    for branch in branches {
                        let condition = self.value(&branch.condition, scope, path, branch.line)?;
                        if is_truthy(&condition) {
                            taken = Some(branch.body.as_slice());
                            break;
                        }
                    }
                    if let Some(body) = taken.or(otherwise.as_deref()) {
                        let mark = scope.mark();
                        let result = self.exec(body, scope, path, out);
                        scope.reset(mark);
                        result?;
                    }
                }
                Node::For {
                    key,
                    value,
                    iterable,
                    line,
                    body,
                } => {
                    let items = match self.value(iterable, scope, path, *line)? {
                        Value::Array(items) => items
                            .into_iter()
                            .enumerate()
                            .map(|(i, item)| (Value::from(i), item))
                            .collect::<Vec<_>>(),
                        Value::Object(map) => map
                            .into_iter()
                            .map(|(k, v)| (Value::String(k), v))
                            .collect(),
                        other => {
                            return Err(runtime_error(
                                path,
                                *line,
                                format!("Cannot iterate over a {}", type_name(&other)),
                            ));
                        }
                    };

                    for (item_key, item) in items {
                        let mark = scope.mark();
                        if let Some(key) = key {
                            scope.bind(key, item_key);
                        }
                        scope.bind(value, item);
                        let result = self.exec(body, scope, path, out);
                        scope.reset(mark);
                        result?;
                    }
                }
            }
        }
        Ok(())
    }

    fn value(
        &mut self,
        expr: &Expr,
        scope: &Scope<'_>,
        path: &TemplatePath,
        line: usize,
    ) -> Result<Value> {
        eval(expr, scope, self).map_err(|err| match err {
            EvalError::Message(message) => runtime_error(path, line, message),
            EvalError::Template(err) => *err,
        })
    }
}

impl PartialHost for Runtime<'_> {
    fn render_partial(
        &mut self,
        reference: &str,
        locals: &Value,
    ) -> std::result::Result<String, EvalError> {
        // the root template is the first entry, partials follow
        if self.active.len() > MAX_PARTIAL_DEPTH {
            debug!(reference, depth = self.active.len(), "partial nesting limit reached");
            return Err(EvalError::Message(format!(
                "Partial nesting deeper than {} levels rendering '{}'",
                MAX_PARTIAL_DEPTH, reference
            )));
        }

        let caller = self.active.last().cloned();
        let path = match &caller {
            Some(caller) => self.resolver.resolve_from(reference, caller.dir()),
            None => self.resolver.resolve(reference),
        };

        let slot = self.cache.renderer(&path).cloned();
        let renderer = match slot {
            Some(RendererSlot::Ready(renderer)) => renderer,
            Some(RendererSlot::InProgress) => {
                trace!(path = %path, "partial is being compiled, rendering nothing");
                return Ok(String::new());
            }
            None if self.cache.has_text(&path) => compile(self.cache, self.delimiters, &path)?,
            None => {
                return Err(TemplateError::MissingDependency {
                    path: path.to_path_buf(),
                    from: caller
                        .map(|c| c.to_path_buf())
                        .unwrap_or_else(|| self.resolver.root().to_path_buf()),
                }
                .into());
            }
        };

        trace!(path = %path, "rendering partial");
        Ok(self.run(&renderer, locals)?)
    }
}

fn runtime_error(path: &TemplatePath, line: usize, message: String) -> TemplateError {
    TemplateError::Runtime {
        path: path.to_path_buf(),
        line,
        message,
    }
}
