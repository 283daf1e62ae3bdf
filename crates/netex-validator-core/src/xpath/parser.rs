//! Recursive-descent compiler from XPath source text to [`Expr`].
//!
//! Covers exactly the grammar documented in `spec.md` §4.2: the eight axes,
//! name/wildcard/`text()` node tests, predicates with the listed functions
//! and comparators, and path union. `current()` is deliberately rejected —
//! rules that need it are disabled by the registry (see `DESIGN.md`).

use std::fmt;

use super::ast::{Axis, CompareOp, Expr, NodeTest, Step};

/// A rule's XPath expression failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathError {
    UnexpectedEnd,
    UnexpectedToken(String),
    UnsupportedFunction(String),
}

impl fmt::Display for XPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Self::UnexpectedToken(t) => write!(f, "unexpected token: {t}"),
            Self::UnsupportedFunction(name) => {
                write!(f, "unsupported function: {name}()")
            }
        }
    }
}

impl std::error::Error for XPathError {}

/// Compiles `src` into an [`Expr`] tree.
pub fn compile(src: &str) -> Result<Expr, XPathError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(XPathError::UnexpectedToken(format!(
            "trailing input at token {}",
            parser.pos
        )));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    SlashSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Dot,
    DotDot,
    Star,
    Pipe,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    DoubleColon,
    Ident(String),
    Number(f64),
    Str(String),
}

fn tokenize(src: &str) -> Result<Vec<Token>, XPathError> {
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    let mut tokens = Vec::new();
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::SlashSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '@' => {
                tokens.push(Token::At);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '.' => {
                if chars.get(i + 1) == Some(&'.') {
                    tokens.push(Token::DotDot);
                    i += 2;
                } else {
                    tokens.push(Token::Dot);
                    i += 1;
                }
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                tokens.push(Token::DoubleColon);
                i += 2;
            }
            '\'' | '"' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    s.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(XPathError::UnexpectedEnd);
                }
                i += 1;
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text.parse::<f64>().map_err(|_| {
                    XPathError::UnexpectedToken(format!("invalid number literal: {text}"))
                })?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            }
            other => {
                return Err(XPathError::UnexpectedToken(other.to_string()));
            }
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Recursive-descent parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: &Token) -> Result<(), XPathError> {
        match self.advance() {
            Some(t) if &t == expected => Ok(()),
            Some(t) => Err(XPathError::UnexpectedToken(format!("{t:?}"))),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    // or-expr := and-expr ('or' and-expr)*
    fn parse_or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.peek(), Some(Token::Ident(n)) if n == "or") {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // and-expr := equality-expr ('and' equality-expr)*
    fn parse_and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_equality_expr()?;
        while matches!(self.peek(), Some(Token::Ident(n)) if n == "and") {
            self.advance();
            let right = self.parse_equality_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // equality-expr := relational-expr (('=' | '!=') relational-expr)*
    fn parse_equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::Ne) => CompareOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            left = Expr::Compare(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // relational-expr := union-expr (('<' | '<=' | '>' | '>=') union-expr)*
    fn parse_relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_union_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_union_expr()?;
            left = Expr::Compare(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // union-expr := path-or-primary ('|' path-or-primary)*
    fn parse_union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path_or_primary()?;
        while matches!(self.peek(), Some(Token::Pipe)) {
            self.advance();
            let right = self.parse_path_or_primary()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path_or_primary(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_or_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Str(_)) => {
                if let Some(Token::Str(s)) = self.advance() {
                    Ok(Expr::StringLiteral(s))
                } else {
                    unreachable!()
                }
            }
            Some(Token::Number(_)) => {
                if let Some(Token::Number(n)) = self.advance() {
                    Ok(Expr::NumberLiteral(n))
                } else {
                    unreachable!()
                }
            }
            Some(Token::Ident(name)) if self.is_function_call(name) => self.parse_function_call(),
            Some(Token::Slash) | Some(Token::SlashSlash) | Some(Token::At) | Some(Token::Dot)
            | Some(Token::DotDot) | Some(Token::Star) | Some(Token::Ident(_)) => {
                self.parse_location_path()
            }
            Some(t) => Err(XPathError::UnexpectedToken(format!("{t:?}"))),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    fn is_function_call(&self, name: &str) -> bool {
        matches!(self.tokens.get(self.pos + 1), Some(Token::LParen))
            && !matches!(name, "text")
    }

    fn parse_function_call(&mut self) -> Result<Expr, XPathError> {
        let name = match self.advance() {
            Some(Token::Ident(n)) => n,
            _ => return Err(XPathError::UnexpectedEnd),
        };
        if name == "current" {
            return Err(XPathError::UnsupportedFunction(name));
        }
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            args.push(self.parse_or_expr()?);
            while matches!(self.peek(), Some(Token::Comma)) {
                self.advance();
                args.push(self.parse_or_expr()?);
            }
        }
        self.expect(&Token::RParen)?;
        match name.as_str() {
            "not" | "normalize-space" | "contains" | "starts-with" | "count" | "position"
            | "last" | "local-name" | "name" | "string-length" | "boolean" | "string"
            | "number" | "concat" | "substring" | "substring-before" | "substring-after" => {
                Ok(Expr::Call(name, args))
            }
            other => Err(XPathError::UnsupportedFunction(other.to_owned())),
        }
    }

    // location-path := ('//' | '/')? step ('/' step | '//' step)*
    fn parse_location_path(&mut self) -> Result<Expr, XPathError> {
        let mut absolute = false;
        let mut force_descendant_first = false;
        match self.peek() {
            Some(Token::SlashSlash) => {
                self.advance();
                absolute = true;
                force_descendant_first = true;
            }
            Some(Token::Slash) => {
                self.advance();
                absolute = true;
            }
            _ => {}
        }

        let mut steps = Vec::new();
        if absolute && !self.starts_step() {
            // Bare "/" selecting the document root.
            return Ok(Expr::Path {
                absolute: true,
                steps,
            });
        }

        let mut step = self.parse_step()?;
        if force_descendant_first && step.axis == Axis::Child {
            step.axis = Axis::Descendant;
        }
        steps.push(step);

        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.advance();
                    steps.push(self.parse_step()?);
                }
                Some(Token::SlashSlash) => {
                    self.advance();
                    let mut s = self.parse_step()?;
                    if s.axis == Axis::Child {
                        s.axis = Axis::Descendant;
                    }
                    steps.push(s);
                }
                _ => break,
            }
        }
        Ok(Expr::Path { absolute, steps })
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::At) | Some(Token::Dot) | Some(Token::DotDot) | Some(Token::Star)
                | Some(Token::Ident(_))
        )
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        let (axis, test) = match self.peek().cloned() {
            Some(Token::Dot) => {
                self.advance();
                (Axis::SelfAxis, NodeTest::Wildcard)
            }
            Some(Token::DotDot) => {
                self.advance();
                (Axis::Parent, NodeTest::Wildcard)
            }
            Some(Token::At) => {
                self.advance();
                (Axis::Attribute, self.parse_node_test()?)
            }
            Some(Token::Ident(name)) if matches!(self.tokens.get(self.pos + 1), Some(Token::DoubleColon)) => {
                self.advance();
                self.advance();
                let axis = axis_from_name(&name)?;
                (axis, self.parse_node_test()?)
            }
            _ => (Axis::Child, self.parse_node_test()?),
        };
        let mut predicates = Vec::new();
        while matches!(self.peek(), Some(Token::LBracket)) {
            self.advance();
            predicates.push(self.parse_or_expr()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Wildcard),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) && name == "text" {
                    self.advance();
                    self.expect(&Token::RParen)?;
                    Ok(NodeTest::Text)
                } else if matches!(self.peek(), Some(Token::LParen)) && name == "node" {
                    self.advance();
                    self.expect(&Token::RParen)?;
                    Ok(NodeTest::Wildcard)
                } else {
                    Ok(NodeTest::Name(name))
                }
            }
            Some(t) => Err(XPathError::UnexpectedToken(format!("{t:?}"))),
            None => Err(XPathError::UnexpectedEnd),
        }
    }
}

fn axis_from_name(name: &str) -> Result<Axis, XPathError> {
    match name {
        "child" => Ok(Axis::Child),
        "descendant" => Ok(Axis::Descendant),
        "descendant-or-self" => Ok(Axis::Descendant),
        "self" => Ok(Axis::SelfAxis),
        "attribute" => Ok(Axis::Attribute),
        "following-sibling" => Ok(Axis::FollowingSibling),
        "preceding-sibling" => Ok(Axis::PrecedingSibling),
        "parent" => Ok(Axis::Parent),
        "ancestor" => Ok(Axis::Ancestor),
        other => Err(XPathError::UnexpectedToken(format!("axis {other}")))
    }
}
