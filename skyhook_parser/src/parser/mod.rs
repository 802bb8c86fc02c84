//! Recursive-descent parser with Pratt expression parsing.

mod expr;
mod stmt;

use crate::ast::{Expr, Program, Stmt};
use crate::lexer::Lexer;
use crate::token::{Keyword, Token, TokenKind};
use skyhook_core::{SkyhookError, SkyhookResult, Span};

pub use expr::ExprParser;
pub use stmt::StmtParser;

// =============================================================================
// Parser Core
// =============================================================================

/// Parser for the JavaScript subset.
#[derive(Debug, Clone)]
pub struct Parser<'src> {
    /// Lexer for tokenization.
    lexer: Lexer<'src>,
    /// Current token.
    current: Token,
    /// Previous token (for span tracking).
    previous: Token,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'src str) -> SkyhookResult<Self> {
        let mut lexer = Lexer::new(source);
        let first = lexer.next_token()?;
        Ok(Self {
            lexer,
            current: first.clone(),
            previous: first,
        })
    }

    /// Parse a whole program.
    pub fn parse_program(&mut self) -> SkyhookResult<Program> {
        let start = self.current.span.start;
        let mut body = Vec::new();
        while !self.check(&TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        let end = self.previous.span.end;
        Ok(Program::new(body, Span::new(start, end)))
    }

    /// Parse a single statement.
    pub fn parse_statement(&mut self) -> SkyhookResult<Stmt> {
        StmtParser::parse(self)
    }

    /// Parse an assignment-level expression.
    pub fn parse_expression(&mut self) -> SkyhookResult<Expr> {
        ExprParser::parse_assign(self, true)
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// The current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// The previous token.
    #[inline]
    pub fn previous(&self) -> &Token {
        &self.previous
    }

    /// Advance to the next token.
    pub fn advance(&mut self) -> SkyhookResult<&Token> {
        let next = self.lexer.next_token()?;
        self.previous = std::mem::replace(&mut self.current, next);
        Ok(&self.previous)
    }

    /// Whether the current token matches the given kind (by discriminant).
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Whether the current token is a specific keyword.
    #[inline]
    pub fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(k) if *k == kw)
    }

    /// Whether the current token is an identifier with the given text
    /// (used for contextual keywords such as `async`, `of`, `static`).
    #[inline]
    pub fn check_ident(&self, text: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Ident(name) if name == text)
    }

    /// Consume the current token if it matches the kind.
    pub fn match_token(&mut self, kind: &TokenKind) -> SkyhookResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the current token if it is the given keyword.
    pub fn match_keyword(&mut self, kw: Keyword) -> SkyhookResult<bool> {
        if self.check_keyword(kw) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the current token if it is an identifier with the given text.
    pub fn match_ident(&mut self, text: &str) -> SkyhookResult<bool> {
        if self.check_ident(text) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Expect and consume a specific token, or error.
    pub fn expect(&mut self, kind: &TokenKind, msg: &str) -> SkyhookResult<&Token> {
        if self.check(kind) {
            self.advance()?;
            Ok(&self.previous)
        } else {
            Err(self.error_at_current(msg))
        }
    }

    /// Expect and consume an identifier, returning its text.
    pub fn expect_ident(&mut self, msg: &str) -> SkyhookResult<String> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let name = name.clone();
            self.advance()?;
            Ok(name)
        } else {
            Err(self.error_at_current(msg))
        }
    }

    /// Expect a statement terminator, applying automatic semicolon
    /// insertion: an explicit `;` is consumed; a `}` , end of input, or a
    /// preceding line terminator also satisfy the grammar.
    pub fn expect_semi(&mut self) -> SkyhookResult<()> {
        if self.match_token(&TokenKind::Semi)? {
            return Ok(());
        }
        if self.check(&TokenKind::RBrace)
            || self.check(&TokenKind::Eof)
            || self.current.newline_before
        {
            return Ok(());
        }
        Err(self.error_at_current("expected `;`"))
    }

    /// Whether the parser is at end of input.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    /// A disposable copy of the full parser state, for speculative
    /// lookahead (arrow-parameter disambiguation).
    #[inline]
    pub fn fork(&self) -> Parser<'src> {
        self.clone()
    }

    // =========================================================================
    // Span Tracking
    // =========================================================================

    /// The start offset of the current token.
    #[inline]
    pub fn start_span(&self) -> u32 {
        self.current.span.start
    }

    /// A span from `start` to the end of the previous token.
    #[inline]
    pub fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.previous.span.end)
    }

    // =========================================================================
    // Error Handling
    // =========================================================================

    /// Create an error at the current token.
    pub fn error_at_current(&self, msg: &str) -> SkyhookError {
        let location = match &self.current.kind {
            TokenKind::Eof => "at end of input".to_string(),
            other => format!("at `{other}`"),
        };
        SkyhookError::syntax(format!("{location}: {msg}"), self.current.span)
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Parse source code into a program.
pub fn parse(source: &str) -> SkyhookResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parse a single expression; trailing tokens are an error.
pub fn parse_expression(source: &str) -> SkyhookResult<Expr> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_expression()?;
    if !parser.is_at_end() {
        return Err(parser.error_at_current("unexpected trailing tokens after expression"));
    }
    Ok(expr)
}
