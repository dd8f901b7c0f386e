//! Formula lexer and recursive-descent parser
//!
//! Precedence, lowest first: `+ -`, `* /`, `^` (right associative), then a
//! factor with any number of leading signs. Signs bind tighter than `^`, so
//! `-2^2` is `(-2)^2`.

use std::fmt;

use super::FormulaError;
use crate::registry::MAX_ARITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Imaginary(f64),
    /// 1-based argument index (`x1`, `x2`, ...)
    Var(usize),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Highest variable index referenced, 0 if none
    pub(crate) fn arity(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Imaginary(_) => 0,
            Expr::Var(index) => *index,
            Expr::Neg(inner) => inner.arity(),
            Expr::Binary { lhs, rhs, .. } => lhs.arity().max(rhs.arity()),
            Expr::Call { args, .. } => args.iter().map(Expr::arity).max().unwrap_or(0),
        }
    }

    /// Visit every call, outermost first
    pub(crate) fn visit_calls<'a>(&'a self, visit: &mut impl FnMut(&'a str, usize)) {
        match self {
            Expr::Number(_) | Expr::Imaginary(_) | Expr::Var(_) => {}
            Expr::Neg(inner) => inner.visit_calls(visit),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.visit_calls(visit);
                rhs.visit_calls(visit);
            }
            Expr::Call { name, args } => {
                visit(name, args.len());
                for arg in args {
                    arg.visit_calls(visit);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Imaginary(f64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "number {}", v),
            Token::Imaginary(v) => write!(f, "imaginary number _{}", v),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Caret => write!(f, "'^'"),
            Token::End => write!(f, "end of formula"),
        }
    }
}

fn is_number_byte(b: u8) -> bool {
    b.is_ascii_digit() || b == b'.'
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_lowercase() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Split preprocessed formula text into tokens with their byte positions
fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let token = match b {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b',' => Token::Comma,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'^' => Token::Caret,
            b'_' if bytes.get(pos + 1).copied().is_some_and(is_number_byte) => {
                pos += 1;
                let value = read_number(src, &mut pos)?;
                tokens.push((Token::Imaginary(value), start));
                continue;
            }
            b if is_number_byte(b) => {
                let value = read_number(src, &mut pos)?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            b if is_ident_start(b) => {
                while pos < bytes.len() && is_ident_byte(bytes[pos]) {
                    pos += 1;
                }
                tokens.push((Token::Ident(src[start..pos].to_string()), start));
                continue;
            }
            _ => {
                let found = src[start..].chars().next().unwrap_or('?');
                return Err(FormulaError::Unexpected {
                    position: start,
                    found: format!("'{}'", found),
                    expected: "a number, name, operator or parenthesis",
                });
            }
        };
        tokens.push((token, start));
        pos += 1;
    }

    tokens.push((Token::End, bytes.len()));
    Ok(tokens)
}

fn read_number(src: &str, pos: &mut usize) -> Result<f64, FormulaError> {
    let bytes = src.as_bytes();
    let start = *pos;
    while *pos < bytes.len() && is_number_byte(bytes[*pos]) {
        *pos += 1;
    }
    let text = &src[start..*pos];
    text.parse::<f64>().map_err(|_| FormulaError::InvalidNumber {
        position: start,
        text: text.to_string(),
    })
}

/// Interpret `xN` as a variable reference
fn variable_index(name: &str, position: usize) -> Result<Option<usize>, FormulaError> {
    let Some(digits) = name.strip_prefix('x') else {
        return Ok(None);
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    match digits.parse::<usize>() {
        Ok(index) if index >= 1 => Ok(Some(index)),
        _ => Err(FormulaError::InvalidVariable {
            position,
            name: name.to_string(),
        }),
    }
}

/// Deepest nesting a formula may have, counting parentheses, calls,
/// operators and signs. Keeps parsing, evaluation and drop off the stack limit.
pub(crate) const MAX_DEPTH: usize = 256;

/// A parsed subexpression and the height of its tree
struct Node {
    expr: Expr,
    depth: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, depth: 1 }
    }
}

pub(crate) struct Parser {
    tokens: Vec<(Token, usize)>,
    index: usize,
    /// Current recursion depth of the descent
    nesting: usize,
}

impl Parser {
    pub(crate) fn new(src: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            tokens: tokenize(src)?,
            index: 0,
            nesting: 0,
        })
    }

    /// Parse the whole input as one expression
    pub(crate) fn parse(mut self) -> Result<Expr, FormulaError> {
        let node = self.expression()?;
        if self.peek() != &Token::End {
            return Err(self.unexpected("an operator or end of formula"));
        }
        Ok(node.expr)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index].0
    }

    fn position(&self) -> usize {
        self.tokens[self.index].1
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index].0.clone();
        if token != Token::End {
            self.index += 1;
        }
        token
    }

    fn unexpected(&self, expected: &'static str) -> FormulaError {
        FormulaError::Unexpected {
            position: self.position(),
            found: self.peek().to_string(),
            expected,
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), FormulaError> {
        if self.peek() == &token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn too_deep(position: usize) -> FormulaError {
        FormulaError::TooDeep {
            position,
            limit: MAX_DEPTH,
        }
    }

    /// Run `parse` one recursion level deeper, for the construct at `position`
    fn nested(
        &mut self,
        position: usize,
        parse: impl FnOnce(&mut Self) -> Result<Node, FormulaError>,
    ) -> Result<Node, FormulaError> {
        if self.nesting >= MAX_DEPTH {
            return Err(Self::too_deep(position));
        }
        self.nesting += 1;
        let node = parse(self)?;
        self.nesting -= 1;
        Ok(node)
    }

    fn node(expr: Expr, depth: usize, position: usize) -> Result<Node, FormulaError> {
        if depth > MAX_DEPTH {
            return Err(Self::too_deep(position));
        }
        Ok(Node { expr, depth })
    }

    fn binary(op: BinOp, lhs: Node, rhs: Node, position: usize) -> Result<Node, FormulaError> {
        let depth = lhs.depth.max(rhs.depth) + 1;
        let expr = Expr::Binary {
            op,
            lhs: Box::new(lhs.expr),
            rhs: Box::new(rhs.expr),
        };
        Self::node(expr, depth, position)
    }

    fn expression(&mut self) -> Result<Node, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            let position = self.position();
            self.advance();
            let rhs = self.term()?;
            lhs = Self::binary(op, lhs, rhs, position)?;
        }
    }

    fn term(&mut self) -> Result<Node, FormulaError> {
        let mut lhs = self.power()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            let position = self.position();
            self.advance();
            let rhs = self.power()?;
            lhs = Self::binary(op, lhs, rhs, position)?;
        }
    }

    fn power(&mut self) -> Result<Node, FormulaError> {
        let base = self.factor()?;
        if self.peek() != &Token::Caret {
            return Ok(base);
        }
        let position = self.position();
        self.advance();
        let exponent = self.nested(position, Self::power)?;
        Self::binary(BinOp::Pow, base, exponent, position)
    }

    fn factor(&mut self) -> Result<Node, FormulaError> {
        let mut negative = false;
        let position = self.position();
        loop {
            match self.peek() {
                Token::Plus => {}
                Token::Minus => negative = !negative,
                _ => break,
            }
            self.advance();
        }

        let primary = self.primary()?;
        if !negative {
            return Ok(primary);
        }
        let depth = primary.depth + 1;
        Self::node(Expr::Neg(Box::new(primary.expr)), depth, position)
    }

    fn primary(&mut self) -> Result<Node, FormulaError> {
        let position = self.position();
        match self.peek().clone() {
            Token::Number(v) => {
                self.advance();
                Ok(Node::leaf(Expr::Number(v)))
            }
            Token::Imaginary(v) => {
                self.advance();
                Ok(Node::leaf(Expr::Imaginary(v)))
            }
            Token::LParen => {
                self.advance();
                let inner = self.nested(position, Self::expression)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                self.advance();
                if self.peek() == &Token::LParen {
                    self.advance();
                    return self.nested(position, |parser| parser.call(name, position));
                }
                match variable_index(&name, position)? {
                    Some(index) => Ok(Node::leaf(Expr::Var(index))),
                    None => Err(FormulaError::UnknownIdentifier { position, name }),
                }
            }
            _ => Err(self.unexpected("a number, variable, function call or '('")),
        }
    }

    /// Arguments of `name(`, the opening parenthesis already consumed
    fn call(&mut self, name: String, position: usize) -> Result<Node, FormulaError> {
        let mut args = vec![self.expression()?];
        while self.peek() == &Token::Comma {
            self.advance();
            args.push(self.expression()?);
        }
        self.expect(Token::RParen, "',' or ')'")?;

        if args.len() > MAX_ARITY {
            return Err(FormulaError::TooManyArguments {
                position,
                name,
                count: args.len(),
            });
        }
        let depth = args.iter().map(|arg| arg.depth).max().unwrap_or(0) + 1;
        let args = args.into_iter().map(|arg| arg.expr).collect();
        Self::node(Expr::Call { name, args }, depth, position)
    }
}
