//! Main lexer implementation for Plox.
//!
//! The [`Lexer`] transforms source code into a stream of tokens by
//! dispatching on the first character of each lexeme. It maintains a
//! [`Cursor`] for position tracking and reports lexical errors through a
//! shared [`Handler`], continuing past each error so a single pass can
//! surface all of them.

use plox_util::{Handler, Span, Stage, Symbol};

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token, TokenWithSpan};

/// The Plox lexer.
///
/// # Example
///
/// ```
/// use plox_lex::{Lexer, Token};
/// use plox_util::Handler;
///
/// let handler = Handler::new();
/// let mut lexer = Lexer::new("var x = 42;", &handler);
///
/// assert_eq!(lexer.next_token(), Token::Var);
/// assert_eq!(lexer.next_token(), Token::Ident(plox_util::Symbol::intern("x")));
/// ```
pub struct Lexer<'a> {
    /// Character cursor over the source.
    cursor: Cursor<'a>,

    /// Diagnostic handler for error reporting.
    handler: &'a Handler,

    /// Start byte offset of the current token.
    token_start: usize,

    /// Line the current token starts on.
    token_start_line: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over `source`, reporting errors to `handler`.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
        }
    }

    /// Returns the next token from the source, or [`Token::Eof`] at the
    /// end of input.
    ///
    /// Unknown characters are reported and skipped; the scan keeps going
    /// with the following character.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();

            self.token_start = self.cursor.position();
            self.token_start_line = self.cursor.line();

            if self.cursor.is_at_end() {
                return Token::Eof;
            }

            let c = self.cursor.current_char();
            match c {
                '(' => {
                    self.cursor.advance();
                    return Token::LParen;
                }
                ')' => {
                    self.cursor.advance();
                    return Token::RParen;
                }
                '{' => {
                    self.cursor.advance();
                    return Token::LBrace;
                }
                '}' => {
                    self.cursor.advance();
                    return Token::RBrace;
                }
                ',' => {
                    self.cursor.advance();
                    return Token::Comma;
                }
                '.' => {
                    self.cursor.advance();
                    return Token::Dot;
                }
                ';' => {
                    self.cursor.advance();
                    return Token::Semicolon;
                }
                '+' => {
                    self.cursor.advance();
                    return Token::Plus;
                }
                '-' => {
                    self.cursor.advance();
                    return Token::Minus;
                }
                '*' => {
                    self.cursor.advance();
                    return Token::Star;
                }
                '/' => {
                    self.cursor.advance();
                    return Token::Slash;
                }
                '=' => return self.lex_equals(),
                '!' => return self.lex_bang(),
                '<' => return self.lex_less(),
                '>' => return self.lex_greater(),
                '"' => return self.lex_string(),
                _ if c.is_ascii_alphabetic() || c == '_' => return self.lex_identifier(),
                _ if c.is_ascii_digit() => return self.lex_number(),
                _ => {
                    self.report_error(format!("Unrecognized symbol '{}'.", c));
                    self.cursor.advance();
                    // Keep scanning so later errors are reported too.
                }
            }
        }
    }

    /// The span of the most recently returned token.
    pub fn last_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
        )
    }

    /// Current line number of the cursor.
    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    /// Lexes an identifier or keyword.
    ///
    /// Identifiers match `[A-Za-z_][A-Za-z0-9_]*`. After reading, the text
    /// is checked against the reserved-word table.
    fn lex_identifier(&mut self) -> Token {
        loop {
            let c = self.cursor.current_char();
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(Symbol::intern(text)))
    }

    /// Lexes a numeric literal: `[0-9]+ ('.' [0-9]+)?`.
    ///
    /// A second decimal point in one literal is a lexical error.
    fn lex_number(&mut self) -> Token {
        let mut seen_dot = false;
        loop {
            let c = self.cursor.current_char();
            if c.is_ascii_digit() {
                self.cursor.advance();
            } else if c == '.' {
                if seen_dot {
                    self.report_error("Too many decimal points in numeric.".to_string());
                    // Skip the rest of the malformed literal.
                    loop {
                        let c = self.cursor.current_char();
                        if !c.is_ascii_digit() && c != '.' {
                            break;
                        }
                        self.cursor.advance();
                    }
                    return Token::Number(0.0);
                }
                seen_dot = true;
                self.cursor.advance();
            } else {
                break;
            }
        }

        let text = self.cursor.slice_from(self.token_start);
        match text.parse::<f64>() {
            Ok(value) => Token::Number(value),
            Err(_) => {
                self.report_error(format!("Invalid numeric literal '{}'.", text));
                Token::Number(0.0)
            }
        }
    }

    /// Lexes a string literal.
    ///
    /// Strings are verbatim between double quotes; there is no escape
    /// processing. Reaching end of input before the closing quote is a
    /// lexical error. Newlines inside strings are permitted and counted.
    fn lex_string(&mut self) -> Token {
        self.cursor.advance(); // opening quote
        let content_start = self.cursor.position();

        while !self.cursor.is_at_end() && self.cursor.current_char() != '"' {
            self.cursor.advance();
        }

        let content = self.cursor.slice_from(content_start);
        if self.cursor.is_at_end() {
            self.report_error("Reached EOF without closing \".".to_string());
        } else {
            self.cursor.advance(); // closing quote
        }

        Token::String(Symbol::intern(content))
    }

    /// Lexes `=` or `==`.
    fn lex_equals(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::EqEq
        } else {
            Token::Eq
        }
    }

    /// Lexes `!` or `!=`.
    fn lex_bang(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::NotEq
        } else {
            Token::Bang
        }
    }

    /// Lexes `<` or `<=`.
    fn lex_less(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::LtEq
        } else {
            Token::Lt
        }
    }

    /// Lexes `>` or `>=`.
    fn lex_greater(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::GtEq
        } else {
            Token::Gt
        }
    }

    /// Skips whitespace and `//` line comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                self.cursor.advance();
            } else if c == '/' && self.cursor.peek_char(1) == '/' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Reports a lexical error at the current token position.
    fn report_error(&mut self, message: String) {
        self.handler.error(
            Stage::Lexical,
            message,
            Span::new(
                self.token_start,
                self.cursor.position(),
                self.token_start_line,
            ),
        );
    }
}

/// Make the lexer an iterator over tokens (exclusive of [`Token::Eof`]).
impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token == Token::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Scan a whole source string into spanned tokens.
///
/// The returned vector always ends with an [`Token::Eof`] entry. Lexical
/// errors are reported through `handler`; callers should gate on
/// `handler.has_errors()` before parsing.
pub fn tokenize(source: &str, handler: &Handler) -> Vec<TokenWithSpan> {
    let mut lexer = Lexer::new(source, handler);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let span = lexer.last_span();
        let at_end = token == Token::Eof;
        tokens.push(TokenWithSpan::new(token, span));
        if at_end {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to collect all tokens (without Eof) from source.
    fn lex_tokens(source: &str) -> Vec<Token> {
        let handler = Handler::new();
        Lexer::new(source, &handler).collect()
    }

    /// Helper to get the first token from source.
    fn first_token(source: &str) -> Token {
        let handler = Handler::new();
        Lexer::new(source, &handler).next_token()
    }

    fn ident(name: &str) -> Token {
        Token::Ident(Symbol::intern(name))
    }

    // ========================================================================
    // IDENTIFIER AND KEYWORD TESTS
    // ========================================================================

    #[test]
    fn test_simple_identifier() {
        assert_eq!(first_token("x"), ident("x"));
        assert_eq!(first_token("foo"), ident("foo"));
        assert_eq!(first_token("bar123"), ident("bar123"));
    }

    #[test]
    fn test_identifier_with_underscore() {
        assert_eq!(first_token("_private"), ident("_private"));
        assert_eq!(first_token("my_var"), ident("my_var"));
        assert_eq!(first_token("_"), ident("_"));
    }

    #[test]
    fn test_keywords() {
        assert_eq!(first_token("var"), Token::Var);
        assert_eq!(first_token("fun"), Token::Fun);
        assert_eq!(first_token("class"), Token::Class);
        assert_eq!(first_token("if"), Token::If);
        assert_eq!(first_token("else"), Token::Else);
        assert_eq!(first_token("while"), Token::While);
        assert_eq!(first_token("for"), Token::For);
        assert_eq!(first_token("return"), Token::Return);
        assert_eq!(first_token("break"), Token::Break);
        assert_eq!(first_token("print"), Token::Print);
        assert_eq!(first_token("and"), Token::And);
        assert_eq!(first_token("or"), Token::Or);
        assert_eq!(first_token("true"), Token::True);
        assert_eq!(first_token("false"), Token::False);
        assert_eq!(first_token("nil"), Token::Nil);
        assert_eq!(first_token("this"), Token::This);
        assert_eq!(first_token("super"), Token::Super);
        assert_eq!(first_token("__init__"), Token::Init);
    }

    #[test]
    fn test_identifier_not_keyword() {
        assert_eq!(first_token("variable"), ident("variable"));
        assert_eq!(first_token("iffy"), ident("iffy"));
        assert_eq!(first_token("superb"), ident("superb"));
        assert_eq!(first_token("classes"), ident("classes"));
    }

    // ========================================================================
    // NUMBER LITERAL TESTS
    // ========================================================================

    #[test]
    fn test_integers() {
        assert_eq!(first_token("0"), Token::Number(0.0));
        assert_eq!(first_token("42"), Token::Number(42.0));
        assert_eq!(first_token("123456"), Token::Number(123456.0));
    }

    #[test]
    fn test_floats() {
        assert_eq!(first_token("3.14"), Token::Number(3.14));
        assert_eq!(first_token("0.5"), Token::Number(0.5));
        assert_eq!(first_token("432.0322"), Token::Number(432.0322));
    }

    #[test]
    fn test_double_decimal_point_is_error() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("1.2.3", &handler);
        let _ = lexer.next_token();
        assert!(handler.has_errors());
    }

    #[test]
    fn test_leading_dot_is_not_a_number() {
        let tokens = lex_tokens(".5");
        assert_eq!(tokens, vec![Token::Dot, Token::Number(5.0)]);
    }

    // ========================================================================
    // STRING LITERAL TESTS
    // ========================================================================

    #[test]
    fn test_simple_string() {
        assert_eq!(
            first_token("\"hello\""),
            Token::String(Symbol::intern("hello"))
        );
        assert_eq!(first_token("\"\""), Token::String(Symbol::intern("")));
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(
            first_token("\"a \\ b\""),
            Token::String(Symbol::intern("a \\ b"))
        );
    }

    #[test]
    fn test_unterminated_string() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("\"no closing quote", &handler);
        let token = lexer.next_token();
        assert!(handler.has_errors());
        assert!(matches!(token, Token::String(_)));
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("\"a\nb\" x", &handler);
        let _ = lexer.next_token();
        let _ = lexer.next_token(); // x
        assert_eq!(lexer.last_span().line, 2);
    }

    // ========================================================================
    // OPERATOR TESTS
    // ========================================================================

    #[test]
    fn test_single_char_operators() {
        assert_eq!(first_token("+"), Token::Plus);
        assert_eq!(first_token("-"), Token::Minus);
        assert_eq!(first_token("*"), Token::Star);
        assert_eq!(first_token("/"), Token::Slash);
        assert_eq!(first_token("!"), Token::Bang);
        assert_eq!(first_token("="), Token::Eq);
        assert_eq!(first_token("<"), Token::Lt);
        assert_eq!(first_token(">"), Token::Gt);
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(first_token("=="), Token::EqEq);
        assert_eq!(first_token("!="), Token::NotEq);
        assert_eq!(first_token("<="), Token::LtEq);
        assert_eq!(first_token(">="), Token::GtEq);
    }

    #[test]
    fn test_compound_operator_sequences() {
        assert_eq!(lex_tokens("= =="), vec![Token::Eq, Token::EqEq]);
        assert_eq!(lex_tokens("===" ), vec![Token::EqEq, Token::Eq]);
        assert_eq!(lex_tokens("<=>"), vec![Token::LtEq, Token::Gt]);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            lex_tokens("(){},.;"),
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::Comma,
                Token::Dot,
                Token::Semicolon,
            ]
        );
    }

    // ========================================================================
    // COMMENT AND WHITESPACE TESTS
    // ========================================================================

    #[test]
    fn test_line_comment() {
        assert_eq!(lex_tokens("// this is a comment\nvar"), vec![Token::Var]);
    }

    #[test]
    fn test_line_comment_at_eof() {
        assert!(lex_tokens("// comment at end").is_empty());
    }

    #[test]
    fn test_slash_is_not_comment() {
        assert_eq!(
            lex_tokens("8 / 2"),
            vec![Token::Number(8.0), Token::Slash, Token::Number(2.0)]
        );
    }

    #[test]
    fn test_whitespace_skipping() {
        assert_eq!(
            lex_tokens("  var \t x \n = \n 42  "),
            vec![Token::Var, ident("x"), Token::Eq, Token::Number(42.0)]
        );
    }

    // ========================================================================
    // LINE NUMBER TESTS
    // ========================================================================

    #[test]
    fn test_line_numbers_on_spans() {
        let handler = Handler::new();
        let tokens = tokenize("var x;\nvar y;", &handler);
        assert_eq!(tokens[0].span.line, 1); // var
        assert_eq!(tokens[3].span.line, 2); // var
        assert_eq!(tokens.last().unwrap().token, Token::Eof);
        assert_eq!(tokens.last().unwrap().span.line, 2);
    }

    #[test]
    fn test_comment_advances_line() {
        let handler = Handler::new();
        let tokens = tokenize("// one\n// two\nprint 1;", &handler);
        assert_eq!(tokens[0].span.line, 3);
    }

    // ========================================================================
    // ERROR RECOVERY TESTS
    // ========================================================================

    #[test]
    fn test_unknown_character_reported_and_skipped() {
        let handler = Handler::new();
        let tokens: Vec<_> = Lexer::new("@ var", &handler).collect();
        assert!(handler.has_errors());
        assert_eq!(tokens, vec![Token::Var]);
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let handler = Handler::new();
        let _tokens: Vec<_> = Lexer::new("@ # $", &handler).collect();
        assert_eq!(handler.error_count(), 3);
    }

    #[test]
    fn test_error_line_number() {
        let handler = Handler::new();
        let _tokens: Vec<_> = Lexer::new("var x;\n@", &handler).collect();
        let diags = handler.take();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].span.line, 2);
        assert_eq!(diags[0].render(), "[ Line 2 ] Lexical Error: Unrecognized symbol '@'.");
    }

    // ========================================================================
    // WHOLE-PROGRAM TESTS
    // ========================================================================

    #[test]
    fn test_program_token_counts() {
        let source = "if(x == true) { var k = 100; var z = 432.0322; } else { print \"else\"; }";
        let tokens = lex_tokens(source);
        let count = |t: &Token| tokens.iter().filter(|x| *x == t).count();
        assert_eq!(count(&Token::LParen), 1);
        assert_eq!(count(&Token::RParen), 1);
        assert_eq!(count(&Token::LBrace), 2);
        assert_eq!(count(&Token::RBrace), 2);
        assert_eq!(count(&Token::Var), 2);
        assert_eq!(count(&Token::Semicolon), 3);
        assert_eq!(tokens.iter().filter(|t| matches!(t, Token::Number(_))).count(), 2);
    }

    #[test]
    fn test_class_declaration_tokens() {
        let tokens = lex_tokens("class Bakery > Store { fun __init__(t) { this.t = t; } }");
        assert!(tokens.contains(&Token::Class));
        assert!(tokens.contains(&Token::Gt));
        assert!(tokens.contains(&Token::Init));
        assert!(tokens.contains(&Token::This));
        assert!(tokens.contains(&Token::Dot));
    }

    #[test]
    fn test_eof_is_stable() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("", &handler);
        assert_eq!(lexer.next_token(), Token::Eof);
        assert_eq!(lexer.next_token(), Token::Eof);
    }
}
