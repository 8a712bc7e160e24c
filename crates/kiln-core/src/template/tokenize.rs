//! Tokenization of template text
//!
//! Splits template text into alternating literal and directive segments. The
//! sequence always starts and ends with a literal (possibly empty), which
//! [`TokenSequence`] guarantees by construction.

use crate::config::Delimiters;
use crate::error::TemplateError;
use std::path::Path;

/// Directive classification, taken from the first character of its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `<% stmt %>`
    Statement,
    /// `<%= expr %>`, HTML-escaped output
    Escaped,
    /// `<%- expr %>`, raw output
    Raw,
    /// `<%@ path %>`, dependency declaration
    Declaration,
}

/// A single directive with position metadata for error reporting
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Content with the sigil removed and surrounding whitespace trimmed
    pub body: String,
    /// Absolute byte position of the opening mark
    pub offset: usize,
    /// Line number of the opening mark
    pub line: usize,
}

impl Directive {
    fn classify(content: &str, offset: usize, line: usize) -> Self {
        let (kind, rest) = match content.chars().next() {
            Some('=') => (DirectiveKind::Escaped, &content[1..]),
            Some('-') => (DirectiveKind::Raw, &content[1..]),
            Some('@') => (DirectiveKind::Declaration, &content[1..]),
            _ => (DirectiveKind::Statement, content),
        };
        Self {
            kind,
            body: rest.trim().to_string(),
            offset,
            line,
        }
    }
}

/// Borrowed view of one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Directive(&'a Directive),
}

/// Ordered literal/directive segments
///
/// `literals.len() == directives.len() + 1`: literal `i` precedes directive `i`
/// and literal `i + 1` follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSequence {
    literals: Vec<String>,
    directives: Vec<Directive>,
}

impl TokenSequence {
    fn new() -> Self {
        Self {
            literals: vec![String::new()],
            directives: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(last) = self.literals.last_mut() {
            last.push_str(text);
        }
    }

    fn push_directive(&mut self, directive: Directive) {
        self.directives.push(directive);
        self.literals.push(String::new());
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Segments in source order, starting and ending with a literal
    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        let tail = self.directives.iter().zip(self.literals.iter().skip(1));
        std::iter::once(Segment::Literal(self.literals[0].as_str())).chain(tail.flat_map(
            |(directive, literal)| {
                [
                    Segment::Directive(directive),
                    Segment::Literal(literal.as_str()),
                ]
            },
        ))
    }

    /// Partial references declared with `@`
    pub fn declarations(&self) -> impl Iterator<Item = &str> {
        self.directives
            .iter()
            .filter(|d| d.kind == DirectiveKind::Declaration)
            .map(|d| d.body.as_str())
    }

    /// Remove `@` directives, joining the literal after each onto the one before
    pub fn strip_declarations(self) -> Self {
        let mut literals = self.literals.into_iter();
        let mut stripped = Self {
            literals: vec![literals.next().unwrap_or_default()],
            directives: Vec::with_capacity(self.directives.len()),
        };

        for (directive, literal) in self.directives.into_iter().zip(literals) {
            if directive.kind != DirectiveKind::Declaration {
                stripped.push_directive(directive);
            }
            stripped.push_text(&literal);
        }

        stripped
    }
}

/// Unbalanced or malformed delimiters, before a template path is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn at(text: &str, offset: usize, message: String) -> Self {
        Self {
            offset,
            line: line_at(text, offset),
            message,
        }
    }

    pub fn in_template(self, path: &Path) -> TemplateError {
        TemplateError::Syntax {
            path: path.to_path_buf(),
            offset: self.offset,
            line: self.line,
            message: self.message,
        }
    }
}

/// Tokenization state
///
/// ```text
/// Text ──open──> Directive ──close──> [Yield Directive] → Text
///  │  └─escaped open/close──> literal mark, stay in Text
///  └─stray close──> SyntaxError
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ScanState {
    /// Scanning literal text
    Text,
    /// Inside a directive
    Directive {
        /// Byte position of the opening mark
        open_at: usize,
        /// Byte position where directive content starts
        content_start: usize,
    },
}

/// Split `text` into literal and directive segments
pub fn tokenize(text: &str, delimiters: &Delimiters) -> Result<TokenSequence, SyntaxError> {
    match delimiters {
        Delimiters::Pair { open, close } => PairScanner::new(text, open, close).run(),
        Delimiters::Sigil { sigil } => tokenize_sigil(text, *sigil),
    }
}

/// Next mark found in literal text
enum Mark {
    Open(usize),
    Close(usize),
}

/// Scanner for two-character open/close marks
///
/// `open` followed by its own last character (`<%%`) is a literal open mark, and
/// `close` preceded by its own first character (`%%>`) a literal close mark.
struct PairScanner<'a> {
    text: &'a str,
    open: &'a str,
    close: &'a str,
    /// `<%%`
    escaped_open: String,
    /// `%%>`
    escaped_close: String,
    pos: usize,
    state: ScanState,
    tokens: TokenSequence,
}

impl<'a> PairScanner<'a> {
    fn new(text: &'a str, open: &'a str, close: &'a str) -> Self {
        let mut escaped_open = open.to_string();
        escaped_open.extend(open.chars().last());
        let mut escaped_close: String = close.chars().take(1).collect();
        escaped_close.push_str(close);

        Self {
            text,
            open,
            close,
            escaped_open,
            escaped_close,
            pos: 0,
            state: ScanState::Text,
            tokens: TokenSequence::new(),
        }
    }

    fn find(&self, pattern: &str, from: usize) -> Option<usize> {
        self.text[from..].find(pattern).map(|i| from + i)
    }

    fn run(mut self) -> Result<TokenSequence, SyntaxError> {
        loop {
            match self.state {
                ScanState::Text => {
                    if !self.process_text()? {
                        return Ok(self.tokens);
                    }
                }
                ScanState::Directive {
                    open_at,
                    content_start,
                } => self.process_directive(open_at, content_start)?,
            }
        }
    }

    /// Consume literal text up to the next mark
    ///
    /// Returns false once the end of input is reached.
    fn process_text(&mut self) -> Result<bool, SyntaxError> {
        let next_open = self.find(self.open, self.pos);
        let next_close = self.find(self.close, self.pos);

        let next = match (next_open, next_close) {
            (None, None) => None,
            (Some(open_at), Some(close_at)) if close_at < open_at => Some(Mark::Close(close_at)),
            (Some(open_at), _) => Some(Mark::Open(open_at)),
            (None, Some(close_at)) => Some(Mark::Close(close_at)),
        };

        match next {
            None => {
                self.tokens.push_text(&self.text[self.pos..]);
                self.pos = self.text.len();
                Ok(false)
            }
            Some(Mark::Open(open_at)) => {
                self.tokens.push_text(&self.text[self.pos..open_at]);
                if self.text[open_at..].starts_with(self.escaped_open.as_str()) {
                    self.tokens.push_text(self.open);
                    self.pos = open_at + self.escaped_open.len();
                } else {
                    self.state = ScanState::Directive {
                        open_at,
                        content_start: open_at + self.open.len(),
                    };
                }
                Ok(true)
            }
            Some(Mark::Close(close_at)) => {
                let lead = &self.escaped_close[..self.escaped_close.len() - self.close.len()];
                // with marks like `}}` the escape `}}}` begins at the found mark
                let escape_start = if self.text[close_at..].starts_with(self.escaped_close.as_str()) {
                    Some(close_at)
                } else if self.text[self.pos..close_at].ends_with(lead) {
                    Some(close_at - lead.len())
                } else {
                    None
                };
                match escape_start {
                    Some(start) => {
                        self.tokens.push_text(&self.text[self.pos..start]);
                        self.tokens.push_text(self.close);
                        self.pos = start + self.escaped_close.len();
                        Ok(true)
                    }
                    None => Err(SyntaxError::at(
                        self.text,
                        close_at,
                        format!("Unexpected '{}'", self.close),
                    )),
                }
            }
        }
    }

    /// Consume one directive, from after the open mark through the close mark
    fn process_directive(&mut self, open_at: usize, content_start: usize) -> Result<(), SyntaxError> {
        let close_at = self.find(self.close, content_start).ok_or_else(|| {
            SyntaxError::at(self.text, open_at, format!("Missing '{}'", self.close))
        })?;

        if let Some(nested) = self.find(self.open, content_start) {
            if nested < close_at {
                return Err(SyntaxError::at(
                    self.text,
                    nested,
                    format!("Unexpected '{}'", self.open),
                ));
            }
        }

        let content = &self.text[content_start..close_at];
        let line = line_at(self.text, open_at);
        self.tokens
            .push_directive(Directive::classify(content, open_at, line));
        self.pos = close_at + self.close.len();
        self.state = ScanState::Text;
        Ok(())
    }
}

/// Tokenize with one character opening and closing directives
///
/// A doubled sigil with nothing between is a literal sigil.
fn tokenize_sigil(text: &str, sigil: char) -> Result<TokenSequence, SyntaxError> {
    let width = sigil.len_utf8();
    let mut tokens = TokenSequence::new();
    let mut pos = 0;

    while let Some(found) = text[pos..].find(sigil) {
        let open_at = pos + found;
        tokens.push_text(&text[pos..open_at]);

        let content_start = open_at + width;
        let close_at = text[content_start..]
            .find(sigil)
            .map(|i| content_start + i)
            .ok_or_else(|| SyntaxError::at(text, open_at, format!("Missing closing '{}'", sigil)))?;

        if close_at == content_start {
            tokens.push_text(&text[open_at..content_start]);
        } else {
            let content = &text[content_start..close_at];
            tokens.push_directive(Directive::classify(content, open_at, line_at(text, open_at)));
        }
        pos = close_at + width;
    }

    tokens.push_text(&text[pos..]);
    Ok(tokens)
}

/// 1-based line number of a byte position
fn line_at(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}
