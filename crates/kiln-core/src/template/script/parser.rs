//! Recursive descent parser for directive bodies

use super::ScriptError;
use super::lexer::{Punct, Token, TokenKind, lex};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

/// Short-circuit operators; the right side is evaluated only when needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    Or,
    And,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Var(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Entry of the precedence table
#[derive(Clone, Copy)]
enum Operator {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

impl Operator {
    fn apply(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            Operator::Logical(op) => Expr::Logical(op, Box::new(lhs), Box::new(rhs)),
            Operator::Binary(op) => Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
        }
    }
}

/// Parsed body of a bare `<% %>` directive
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    Empty,
    If(Expr),
    ElseIf(Expr),
    Else,
    End,
    For {
        key: Option<String>,
        value: String,
        iterable: Expr,
    },
    Let {
        name: String,
        value: Expr,
    },
    Expr(Expr),
}

const KEYWORDS: &[&str] = &[
    "if", "else", "end", "for", "in", "let", "true", "false", "null",
];

/// Parse an output directive body (`<%= %>`, `<%- %>`)
pub(crate) fn parse_expression(src: &str) -> Result<Expr, ScriptError> {
    let mut parser = Parser::new(src)?;
    if parser.at_end() {
        return Err(ScriptError::new(0, "Expected an expression"));
    }
    let expr = parser.expression()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse a statement directive body (`<% %>`)
pub(crate) fn parse_statement(src: &str) -> Result<Statement, ScriptError> {
    let mut parser = Parser::new(src)?;

    let keyword = parser.peek_keyword().map(str::to_owned);
    let statement = match keyword.as_deref() {
        None if parser.at_end() => Statement::Empty,
        Some("if") => {
            parser.advance();
            Statement::If(parser.expression()?)
        }
        Some("else") => {
            parser.advance();
            if parser.peek_keyword() == Some("if") {
                parser.advance();
                Statement::ElseIf(parser.expression()?)
            } else {
                Statement::Else
            }
        }
        Some("end") => {
            parser.advance();
            Statement::End
        }
        Some("for") => {
            parser.advance();
            let first = parser.binding_name()?;
            let (key, value) = if parser.eat(Punct::Comma) {
                (Some(first), parser.binding_name()?)
            } else {
                (None, first)
            };
            parser.expect_keyword("in")?;
            Statement::For {
                key,
                value,
                iterable: parser.expression()?,
            }
        }
        Some("let") => {
            parser.advance();
            let name = parser.binding_name()?;
            parser.expect(Punct::Assign)?;
            Statement::Let {
                name,
                value: parser.expression()?,
            }
        }
        _ => Statement::Expr(parser.expression()?),
    };

    parser.finish()?;
    Ok(statement)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    src_len: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Self, ScriptError> {
        Ok(Self {
            tokens: lex(src)?,
            pos: 0,
            src_len: src.len(),
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.pos)
            .unwrap_or(self.src_len)
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.pos).map(|t| t.kind.clone());
        self.pos += 1;
        token
    }

    fn peek_keyword(&self) -> Option<&str> {
        match self.peek() {
            Some(TokenKind::Ident(name)) if KEYWORDS.contains(&name.as_str()) => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.peek() == Some(&TokenKind::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct) -> Result<(), ScriptError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}'", punct.as_str())))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ScriptError> {
        if self.peek_keyword() == Some(keyword) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}'", keyword)))
        }
    }

    fn binding_name(&mut self) -> Result<String, ScriptError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("Expected a variable name")),
        }
    }

    fn finish(&self) -> Result<(), ScriptError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("Unexpected trailing input"))
        }
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::new(self.position(), message)
    }

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        self.binary(0)
    }

    /// Precedence climbing over the binary operator table
    fn binary(&mut self, level: usize) -> Result<Expr, ScriptError> {
        use Operator::Binary as B;
        const LEVELS: &[&[(Punct, Operator)]] = &[
            &[(Punct::OrOr, Operator::Logical(LogicalOp::Or))],
            &[(Punct::AndAnd, Operator::Logical(LogicalOp::And))],
            &[(Punct::EqEq, B(BinaryOp::Eq)), (Punct::NotEq, B(BinaryOp::NotEq))],
            &[
                (Punct::Lt, B(BinaryOp::Lt)),
                (Punct::Le, B(BinaryOp::Le)),
                (Punct::Gt, B(BinaryOp::Gt)),
                (Punct::Ge, B(BinaryOp::Ge)),
            ],
            &[(Punct::Plus, B(BinaryOp::Add)), (Punct::Minus, B(BinaryOp::Sub))],
            &[
                (Punct::Star, B(BinaryOp::Mul)),
                (Punct::Slash, B(BinaryOp::Div)),
                (Punct::Percent, B(BinaryOp::Rem)),
            ],
        ];

        let Some(operators) = LEVELS.get(level) else {
            return self.unary();
        };

        let mut lhs = self.binary(level + 1)?;
        'outer: loop {
            for &(punct, op) in operators.iter() {
                if self.eat(punct) {
                    let rhs = self.binary(level + 1)?;
                    lhs = op.apply(lhs, rhs);
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        if self.eat(Punct::Not) {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(Punct::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;

        loop {
            if self.eat(Punct::Dot) {
                match self.advance() {
                    Some(TokenKind::Ident(name)) => expr = Expr::Member(Box::new(expr), name),
                    _ => {
                        self.pos -= 1;
                        return Err(self.error("Expected a property name after '.'"));
                    }
                }
            } else if self.eat(Punct::LBracket) {
                let index = self.expression()?;
                self.expect(Punct::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.peek() == Some(&TokenKind::Punct(Punct::LParen)) {
                let Expr::Var(name) = expr else {
                    return Err(self.error("Only named functions can be called"));
                };
                self.pos += 1;
                let args = self.list(Punct::RParen)?;
                expr = Expr::Call(name, args);
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma separated expressions up to `close`, which is consumed
    fn list(&mut self, close: Punct) -> Result<Vec<Expr>, ScriptError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(Punct::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let start = self.position();
        match self.advance() {
            Some(TokenKind::Int(i)) => Ok(Expr::Literal(Value::from(i))),
            Some(TokenKind::Float(f)) => Ok(Expr::Literal(Value::from(f))),
            Some(TokenKind::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(TokenKind::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                keyword if KEYWORDS.contains(&keyword) => Err(ScriptError::new(
                    start,
                    format!("Unexpected keyword '{}'", keyword),
                )),
                _ => Ok(Expr::Var(name)),
            },
            Some(TokenKind::Punct(Punct::LParen)) => {
                let inner = self.expression()?;
                self.expect(Punct::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::Punct(Punct::LBracket)) => Ok(Expr::Array(self.list(Punct::RBracket)?)),
            Some(TokenKind::Punct(Punct::LBrace)) => self.object(),
            Some(TokenKind::Punct(punct)) => Err(ScriptError::new(
                start,
                format!("Unexpected '{}'", punct.as_str()),
            )),
            None => Err(ScriptError::new(start, "Unexpected end of expression")),
        }
    }

    fn object(&mut self) -> Result<Expr, ScriptError> {
        let mut fields = Vec::new();
        while !self.eat(Punct::RBrace) {
            let key = match self.advance() {
                Some(TokenKind::Ident(name)) | Some(TokenKind::Str(name)) => name,
                _ => {
                    self.pos -= 1;
                    return Err(self.error("Expected an object key"));
                }
            };
            self.expect(Punct::Colon)?;
            fields.push((key, self.expression()?));
            if !self.eat(Punct::Comma) {
                self.expect(Punct::RBrace)?;
                break;
            }
        }
        Ok(Expr::Object(fields))
    }
}
