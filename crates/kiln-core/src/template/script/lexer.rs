//! Lexer for directive bodies

use super::ScriptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Punct {
    Dot,
    Comma,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Not,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

impl Punct {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Punct::Dot => ".",
            Punct::Comma => ",",
            Punct::Colon => ":",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::Not => "!",
            Punct::Assign => "=",
            Punct::EqEq => "==",
            Punct::NotEq => "!=",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::AndAnd => "&&",
            Punct::OrOr => "||",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(Punct),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte position within the directive body
    pub pos: usize,
}

/// Split a directive body into tokens
pub(crate) fn lex(src: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = if ch.is_ascii_digit() {
            lex_number(src, &mut chars)?
        } else if ch == '_' || ch.is_alphabetic() {
            let mut ident = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c == '_' || c.is_alphanumeric() {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            TokenKind::Ident(ident)
        } else if ch == '"' || ch == '\'' {
            chars.next();
            TokenKind::Str(lex_string(ch, pos, &mut chars)?)
        } else {
            chars.next();
            let next = chars.peek().map(|&(_, c)| c);
            let (punct, doubled) = match (ch, next) {
                ('=', Some('=')) => (Punct::EqEq, true),
                ('!', Some('=')) => (Punct::NotEq, true),
                ('<', Some('=')) => (Punct::Le, true),
                ('>', Some('=')) => (Punct::Ge, true),
                ('&', Some('&')) => (Punct::AndAnd, true),
                ('|', Some('|')) => (Punct::OrOr, true),
                ('=', _) => (Punct::Assign, false),
                ('!', _) => (Punct::Not, false),
                ('<', _) => (Punct::Lt, false),
                ('>', _) => (Punct::Gt, false),
                ('.', _) => (Punct::Dot, false),
                (',', _) => (Punct::Comma, false),
                (':', _) => (Punct::Colon, false),
                ('(', _) => (Punct::LParen, false),
                (')', _) => (Punct::RParen, false),
                ('[', _) => (Punct::LBracket, false),
                (']', _) => (Punct::RBracket, false),
                ('{', _) => (Punct::LBrace, false),
                ('}', _) => (Punct::RBrace, false),
                ('+', _) => (Punct::Plus, false),
                ('-', _) => (Punct::Minus, false),
                ('*', _) => (Punct::Star, false),
                ('/', _) => (Punct::Slash, false),
                ('%', _) => (Punct::Percent, false),
                _ => {
                    return Err(ScriptError::new(
                        pos,
                        format!("Unexpected character '{}'", ch),
                    ));
                }
            };
            if doubled {
                chars.next();
            }
            TokenKind::Punct(punct)
        };

        tokens.push(Token { kind, pos });
    }

    Ok(tokens)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn lex_number(src: &str, chars: &mut Chars<'_>) -> Result<TokenKind, ScriptError> {
    let start = chars.peek().map(|&(p, _)| p).unwrap_or(src.len());
    let mut end = start;
    let mut is_float = false;

    while let Some(&(p, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = p + 1;
            chars.next();
        } else if c == '.' && !is_float && src[p + 1..].starts_with(|d: char| d.is_ascii_digit()) {
            is_float = true;
            end = p + 1;
            chars.next();
        } else {
            break;
        }
    }

    let text = &src[start..end];
    if !is_float {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(TokenKind::Int(value));
        }
    }
    text.parse::<f64>()
        .map(TokenKind::Float)
        .map_err(|_| ScriptError::new(start, format!("Invalid number '{}'", text)))
}

fn lex_string(quote: char, start: usize, chars: &mut Chars<'_>) -> Result<String, ScriptError> {
    let mut value = String::new();

    while let Some((_, c)) = chars.next() {
        match c {
            c if c == quote => return Ok(value),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, '0')) => value.push('\0'),
                Some((_, other)) => value.push(other),
                None => break,
            },
            other => value.push(other),
        }
    }

    Err(ScriptError::new(start, "Unterminated string literal"))
}
