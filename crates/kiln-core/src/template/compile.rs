//! Code generation: token sequence to renderer
//!
//! Directive bodies are parsed once into expression nodes and block statements
//! are matched into a tree, so executing a renderer never re-parses text.

use super::script::{Expr, Statement, parse_expression, parse_statement};
use super::tokenize::{Directive, DirectiveKind, Segment, SyntaxError, tokenize};
use crate::cache::{RendererSlot, TemplateCache};
use crate::config::Delimiters;
use crate::error::{Result, TemplateError};
use crate::path::TemplatePath;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug)]
pub(crate) enum Node {
    Text(String),
    /// `<%= %>` when `escape`, `<%- %>` otherwise
    Output { expr: Expr, escape: bool, line: usize },
    /// Bare expression statement, evaluated for effect
    Eval { expr: Expr, line: usize },
    Let { name: String, value: Expr, line: usize },
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Node>>,
    },
    For {
        key: Option<String>,
        value: String,
        iterable: Expr,
        line: usize,
        body: Vec<Node>,
    },
}

#[derive(Debug)]
pub(crate) struct Branch {
    pub condition: Expr,
    pub line: usize,
    pub body: Vec<Node>,
}

/// Compiled program for one template
#[derive(Debug)]
pub(crate) struct Renderer {
    path: TemplatePath,
    nodes: Vec<Node>,
}

impl Renderer {
    /// Renderer producing no output
    pub(crate) fn empty(path: TemplatePath) -> Self {
        Self {
            path,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn path(&self) -> &TemplatePath {
        &self.path
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Compile the template at `path` from its cached text
///
/// Returns the cached renderer when there is one. While the template is being
/// compiled its slot holds a placeholder, and asking for it again yields an empty
/// renderer instead of recursing.
///
/// # Errors
///
/// - `LoadOrder` if the text was never loaded
/// - `Syntax` for delimiter errors, unparsable directive bodies, and unbalanced
///   blocks
pub(crate) fn compile(
    cache: &mut TemplateCache,
    delimiters: &Delimiters,
    path: &TemplatePath,
) -> Result<Arc<Renderer>> {
    let Some(text) = cache.text(path) else {
        return Err(TemplateError::LoadOrder {
            path: path.to_path_buf(),
        });
    };

    match cache.renderer(path) {
        Some(RendererSlot::Ready(renderer)) => {
            trace!(path = %path, "renderer cache hit");
            return Ok(Arc::clone(renderer));
        }
        Some(RendererSlot::InProgress) => {
            debug!(path = %path, "template is being compiled, using empty renderer");
            return Ok(Arc::new(Renderer::empty(path.clone())));
        }
        None => {}
    }

    cache.begin(path.clone());
    match generate(&text, delimiters, path) {
        Ok(renderer) => {
            debug!(path = %path, nodes = renderer.nodes.len(), "compiled template");
            let renderer = Arc::new(renderer);
            cache.install(path.clone(), Arc::clone(&renderer));
            Ok(renderer)
        }
        Err(err) => {
            cache.abandon(path);
            Err(err)
        }
    }
}

fn generate(text: &str, delimiters: &Delimiters, path: &TemplatePath) -> Result<Renderer> {
    let tokens = tokenize(text, delimiters)
        .map_err(|err| err.in_template(path.as_path()))?
        .strip_declarations();

    let mut builder = TreeBuilder::default();
    for segment in tokens.segments() {
        let step = match segment {
            Segment::Literal(literal) => {
                builder.push_text(literal);
                Ok(())
            }
            Segment::Directive(directive) => builder.push_directive(directive),
        };
        step.map_err(|err| err.in_template(path.as_path()))?;
    }

    let nodes = builder
        .finish()
        .map_err(|err| err.in_template(path.as_path()))?;
    Ok(Renderer {
        path: path.clone(),
        nodes,
    })
}

/// Block opened by `if` or `for` and not yet closed by `end`
struct OpenBlock {
    kind: BlockKind,
    /// Nodes of the branch or loop body currently being filled
    body: Vec<Node>,
    offset: usize,
    line: usize,
}

enum BlockKind {
    If {
        done: Vec<Branch>,
        /// Condition of the branch being filled; `None` once inside `else`
        condition: Option<(Expr, usize)>,
    },
    For {
        key: Option<String>,
        value: String,
        iterable: Expr,
        line: usize,
    },
}

impl BlockKind {
    fn keyword(&self) -> &'static str {
        match self {
            BlockKind::If { .. } => "if",
            BlockKind::For { .. } => "for",
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    open: Vec<OpenBlock>,
}

impl TreeBuilder {
    fn current(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(block) => &mut block.body,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, literal: &str) {
        if !literal.is_empty() {
            self.current().push(Node::Text(literal.to_string()));
        }
    }

    fn push_directive(&mut self, directive: &Directive) -> std::result::Result<(), SyntaxError> {
        let line = directive.line;
        match directive.kind {
            DirectiveKind::Escaped | DirectiveKind::Raw => {
                let expr = parse_expression(&directive.body)
                    .map_err(|err| directive_error(directive, err.message))?;
                self.current().push(Node::Output {
                    expr,
                    escape: directive.kind == DirectiveKind::Escaped,
                    line,
                });
            }
            // stripped before code generation
            DirectiveKind::Declaration => {}
            DirectiveKind::Statement => {
                let statement = parse_statement(&directive.body)
                    .map_err(|err| directive_error(directive, err.message))?;
                self.push_statement(directive, statement)?;
            }
        }
        Ok(())
    }

    fn push_statement(
        &mut self,
        directive: &Directive,
        statement: Statement,
    ) -> std::result::Result<(), SyntaxError> {
        let line = directive.line;
        match statement {
            Statement::Empty => {}
            Statement::Expr(expr) => self.current().push(Node::Eval { expr, line }),
            Statement::Let { name, value } => {
                self.current().push(Node::Let { name, value, line })
            }
            Statement::If(condition) => self.open(
                directive,
                BlockKind::If {
                    done: Vec::new(),
                    condition: Some((condition, line)),
                },
            ),
            Statement::For {
                key,
                value,
                iterable,
            } => self.open(
                directive,
                BlockKind::For {
                    key,
                    value,
                    iterable,
                    line,
                },
            ),
            Statement::ElseIf(next) => self.next_branch(directive, Some((next, line)))?,
            Statement::Else => self.next_branch(directive, None)?,
            Statement::End => self.close(directive)?,
        }
        Ok(())
    }

    fn open(&mut self, directive: &Directive, kind: BlockKind) {
        self.open.push(OpenBlock {
            kind,
            body: Vec::new(),
            offset: directive.offset,
            line: directive.line,
        });
    }

    fn next_branch(
        &mut self,
        directive: &Directive,
        next: Option<(Expr, usize)>,
    ) -> std::result::Result<(), SyntaxError> {
        let Some(OpenBlock {
            kind: BlockKind::If { done, condition },
            body,
            ..
        }) = self.open.last_mut()
        else {
            return Err(directive_error(directive, "'else' without 'if'"));
        };

        let Some((finished, finished_line)) = condition.take() else {
            return Err(directive_error(directive, "'else' after 'else'"));
        };
        done.push(Branch {
            condition: finished,
            line: finished_line,
            body: std::mem::take(body),
        });
        *condition = next;
        Ok(())
    }

    fn close(&mut self, directive: &Directive) -> std::result::Result<(), SyntaxError> {
        let Some(block) = self.open.pop() else {
            return Err(directive_error(directive, "'end' without an open block"));
        };

        let node = match block.kind {
            BlockKind::If {
                mut done,
                condition,
            } => {
                let otherwise = match condition {
                    Some((condition, line)) => {
                        done.push(Branch {
                            condition,
                            line,
                            body: block.body,
                        });
                        None
                    }
                    None => Some(block.body),
                };
                Node::If {
                    branches: done,
                    otherwise,
                }
            }
            BlockKind::For {
                key,
                value,
                iterable,
                line,
            } => Node::For {
                key,
                value,
                iterable,
                line,
                body: block.body,
            },
        };

        self.current().push(node);
        Ok(())
    }

    fn finish(mut self) -> std::result::Result<Vec<Node>, SyntaxError> {
        match self.open.pop() {
            Some(block) => Err(SyntaxError {
                offset: block.offset,
                line: block.line,
                message: format!("Missing 'end' for '{}'", block.kind.keyword()),
            }),
            None => Ok(self.root),
        }
    }
}

fn directive_error(directive: &Directive, message: impl Into<String>) -> SyntaxError {
    SyntaxError {
        offset: directive.offset,
        line: directive.line,
        message: format!("{} in directive '{}'", message.into(), directive.body),
    }
}
