//! plox-par - Recursive descent parser for Plox.
//!
//! Consumes the spanned token stream produced by `plox-lex` and builds the
//! AST defined in [`ast`]. Statements are parsed by dedicated productions
//! (`stmt` module); expressions use Pratt-style binding powers (`expr`
//! module).
//!
//! Syntax errors are reported through the shared handler and the parser
//! synchronizes at the next statement boundary, so one pass can report
//! several independent errors. Any reported error inhibits the resolver
//! and interpreter stages.

pub mod ast;
mod expr;
pub mod printer;
mod stmt;

pub use ast::*;
pub use printer::TreePrinter;

use plox_lex::{Token, TokenWithSpan};
use plox_util::{Handler, Span, Stage, Symbol};

/// Recursive descent parser over a spanned token stream.
///
/// # Example
///
/// ```
/// use plox_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = plox_lex::tokenize("print 1 + 2;", &handler);
/// let program = plox_par::Parser::new(tokens, &handler).parse();
///
/// assert!(!handler.has_errors());
/// assert_eq!(program.len(), 1);
/// ```
pub struct Parser<'a> {
    /// Token stream, always terminated by an Eof token.
    tokens: Vec<TokenWithSpan>,

    /// Current position in the token stream.
    position: usize,

    /// Diagnostic handler for syntax errors.
    handler: &'a Handler,

    /// Next [`ExprId`] to hand out.
    next_id: u32,
}

impl<'a> Parser<'a> {
    /// Create a parser over `tokens`, reporting errors to `handler`.
    pub fn new(tokens: Vec<TokenWithSpan>, handler: &'a Handler) -> Self {
        Self {
            tokens,
            position: 0,
            handler,
            next_id: 0,
        }
    }

    /// Parse the whole token stream into a list of top-level statements.
    ///
    /// On a syntax error the parser reports, skips to the next statement
    /// boundary, and keeps going; callers gate on `handler.has_errors()`.
    pub fn parse(&mut self) -> Program {
        let mut program = Vec::new();
        while !self.check(&Token::Eof) {
            match self.declaration() {
                Some(stmt) => program.push(stmt),
                None => self.synchronize(),
            }
        }
        program
    }

    // =========================================================================
    // TOKEN STREAM HELPERS
    // =========================================================================

    /// The current token, by reference.
    pub(crate) fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    /// The current token, cloned.
    pub(crate) fn current_token(&self) -> Token {
        self.current().clone()
    }

    /// Span of the current token.
    fn current_span(&self) -> Span {
        self.tokens
            .get(self.position)
            .map(|t| t.span)
            .unwrap_or(Span::DUMMY)
    }

    /// Line of the current token.
    pub(crate) fn current_line(&self) -> u32 {
        self.current_span().line
    }

    /// Line of the most recently consumed token.
    pub(crate) fn previous_line(&self) -> u32 {
        if self.position == 0 {
            return self.current_line();
        }
        self.tokens
            .get(self.position - 1)
            .map(|t| t.span.line)
            .unwrap_or(0)
    }

    /// The most recently consumed token, if any.
    fn previous(&self) -> Option<&Token> {
        if self.position == 0 {
            return None;
        }
        self.tokens.get(self.position - 1).map(|t| &t.token)
    }

    /// Advance past the current token. The final Eof is never consumed.
    pub(crate) fn advance(&mut self) {
        if !self.check(&Token::Eof) {
            self.position += 1;
        }
    }

    /// Whether the current token equals `token`.
    pub(crate) fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    /// Consume the current token if it equals `token`.
    pub(crate) fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume an identifier, or report `message` and fail.
    pub(crate) fn expect_ident(&mut self, message: &str) -> Option<Symbol> {
        if let Token::Ident(name) = self.current_token() {
            self.advance();
            Some(name)
        } else {
            self.error(message);
            None
        }
    }

    /// Consume a semicolon, or report the standard message and fail.
    pub(crate) fn expect_semicolon(&mut self) -> Option<()> {
        if self.match_token(Token::Semicolon) {
            Some(())
        } else {
            self.error("Expected ; after statement.");
            None
        }
    }

    // =========================================================================
    // ERROR REPORTING AND RECOVERY
    // =========================================================================

    /// Report a syntax error at the current token.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.handler.emit(plox_util::Diagnostic::new(
            Stage::Syntax,
            message,
            span,
        ));
    }

    /// Report a syntax error on a specific line.
    pub(crate) fn error_at(&mut self, message: impl Into<String>, line: u32) {
        self.handler
            .error(Stage::Syntax, message, Span::point(line));
    }

    /// Hand out the next expression id.
    pub(crate) fn next_expr_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Skip tokens until the next statement boundary.
    ///
    /// A boundary is the token after a semicolon, or a token that can
    /// begin a declaration or statement.
    fn synchronize(&mut self) {
        if self.check(&Token::Eof) {
            return;
        }
        self.advance();
        while !self.check(&Token::Eof) {
            if self.previous() == Some(&Token::Semicolon) {
                return;
            }
            match self.current() {
                Token::Class
                | Token::Fun
                | Token::Var
                | Token::If
                | Token::While
                | Token::Print
                | Token::Return
                | Token::Break
                | Token::LBrace => return,
                _ => self.advance(),
            }
        }
    }
}
