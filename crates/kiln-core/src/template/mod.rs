//! Template module - tokenizer, code generator and renderer runtime
//!
//! Templates are literal text interleaved with directives. Directives are
//! compiled once into a [`Renderer`] and executed against a JSON locals mapping.
//!
//! ## Syntax
//!
//! - Escaped output: `<%= expr %>` (HTML-escapes `& " ' < >`)
//! - Raw output: `<%- expr %>`
//! - Statement: `<% if cond %> ... <% else %> ... <% end %>`, `<% for x in xs %>`,
//!   `<% let name = expr %>`
//! - Dependency declaration: `<%@ partial %>` (no output; loads `partial` before
//!   compilation so `render('partial')` can find it)
//! - Literal delimiters: `<%%` renders `<%`, `%%>` renders `%>`
//!
//! With a single-sigil delimiter such as `$`, directives read `$= expr$` and `$$`
//! renders a literal `$`.

mod compile;
pub mod escape;
mod runtime;
mod script;
pub mod tokenize;

pub(crate) use compile::{Renderer, compile};
pub(crate) use runtime::Runtime;

pub use escape::escape_html;
pub use tokenize::{Directive, DirectiveKind, Segment, SyntaxError, TokenSequence, tokenize};

#[cfg(test)]
mod tests;
