//! Directive body language
//!
//! Bodies of output directives are expressions over the locals mapping:
//! literals, variables, member and index access, arithmetic, comparison,
//! `&&`/`||`/`!`, array and object literals, and calls to built-in functions
//! (`render`, `len`, `json`, `upper`, `lower`).
//!
//! Bodies of bare statement directives may additionally be control flow:
//!
//! ```text
//! <% if user.admin %> ... <% else if user.staff %> ... <% else %> ... <% end %>
//! <% for item in items %> ... <% end %>
//! <% for key, value in mapping %> ... <% end %>
//! <% let total = price * count %>
//! ```

mod eval;
mod lexer;
mod parser;
mod value;

pub(crate) use eval::{EvalError, PartialHost, Scope, eval};
pub(crate) use parser::{Expr, Statement, parse_expression, parse_statement};
pub(crate) use value::{is_truthy, stringify, type_name};

/// Lexing or parsing failure inside a directive body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptError {
    /// Byte position within the directive body
    pub pos: usize,
    pub message: String,
}

impl ScriptError {
    pub(crate) fn new(pos: usize, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}
