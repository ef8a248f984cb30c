//! Statement parsing - declarations, control flow, blocks.

use std::rc::Rc;

use plox_lex::Token;
use plox_util::Symbol;

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse a declaration or statement.
    pub(crate) fn declaration(&mut self) -> Option<Stmt> {
        match self.current() {
            Token::Var => {
                self.advance();
                self.var_declaration()
            }
            Token::Fun => {
                self.advance();
                self.func_declaration().map(Stmt::Func)
            }
            Token::Class => {
                self.advance();
                self.class_declaration()
            }
            Token::LBrace => {
                self.advance();
                self.block().map(Stmt::Block)
            }
            _ => self.statement(),
        }
    }

    /// Parse a non-declaration statement.
    fn statement(&mut self) -> Option<Stmt> {
        match self.current() {
            Token::Print => {
                self.advance();
                self.print_statement()
            }
            Token::If => {
                self.advance();
                self.if_statement()
            }
            Token::While => {
                self.advance();
                self.while_statement()
            }
            Token::Return => {
                self.advance();
                self.return_statement()
            }
            Token::Break => {
                self.advance();
                self.break_statement()
            }
            Token::For => {
                self.error("'for' loops are not implemented.");
                None
            }
            _ => self.expression_statement(),
        }
    }

    /// `var IDENT ( "=" expression )? ";"`
    fn var_declaration(&mut self) -> Option<Stmt> {
        let line = self.previous_line();
        let name = self.expect_ident("Expected identifier in variable declaration.")?;
        let init = if self.match_token(Token::Eq) {
            let init = self.parse_expression()?;
            if matches!(init, Expr::Construct(_)) {
                self.error("Cannot assign a constructor.");
                return None;
            }
            Some(init)
        } else {
            None
        };
        self.expect_semicolon()?;
        Some(Stmt::Var(VarDecl { name, init, line }))
    }

    /// `fun ( IDENT | "__init__" ) "(" params? ")" block`
    ///
    /// Also used for class methods; `__init__` names a constructor. The
    /// resolver rejects constructors declared outside a class body.
    pub(crate) fn func_declaration(&mut self) -> Option<Rc<FuncDecl>> {
        let line = self.previous_line();
        let (name, is_initializer) = match self.current_token() {
            Token::Ident(name) => {
                self.advance();
                (name, false)
            }
            Token::Init => {
                self.advance();
                (Symbol::intern("__init__"), true)
            }
            _ => {
                self.error("Expected function declaration.");
                return None;
            }
        };

        if !self.match_token(Token::LParen) {
            self.error("Function declaration expected parameter list.");
            return None;
        }
        let mut params = Vec::new();
        while !self.match_token(Token::RParen) {
            if self.check(&Token::Eof) {
                self.error("Reached EOF without finding closing \")\".");
                return None;
            }
            if !params.is_empty() && !self.match_token(Token::Comma) {
                self.error("Expected , separator in parameter list.");
                return None;
            }
            params.push(self.expect_ident("Invalid parameter declaration.")?);
        }

        if !self.match_token(Token::LBrace) {
            self.error("Expected function body definition.");
            return None;
        }
        let body = self.block()?;

        Some(Rc::new(FuncDecl {
            name,
            params,
            body,
            is_initializer,
            line,
        }))
    }

    /// `class IDENT ( ">" IDENT )? "{" funDecl* "}"`
    fn class_declaration(&mut self) -> Option<Stmt> {
        let line = self.previous_line();
        let name = self.expect_ident("Expected class declaration.")?;

        let superclass = if self.match_token(Token::Gt) {
            let super_line = self.current_line();
            let super_name = self.expect_ident("Expected superclass name.")?;
            let id = self.next_expr_id();
            Some(IdentExpr {
                name: super_name,
                line: super_line,
                id,
            })
        } else {
            None
        };

        if !self.match_token(Token::LBrace) {
            self.error("Expected \"{\" in class declaration.");
            return None;
        }

        let mut methods = Vec::new();
        while !self.match_token(Token::RBrace) {
            if self.check(&Token::Eof) {
                self.error("Reached EOF without finding closing \"}\".");
                return None;
            }
            if !self.match_token(Token::Fun) {
                self.error("Expected class method declaration.");
                return None;
            }
            methods.push(self.func_declaration()?);
        }

        Some(Stmt::Class(ClassDecl {
            name,
            superclass,
            methods,
            line,
        }))
    }

    /// `print expression ";"`
    fn print_statement(&mut self) -> Option<Stmt> {
        let line = self.previous_line();
        let expr = self.parse_expression()?;
        self.expect_semicolon()?;
        Some(Stmt::Print(PrintStmt { expr, line }))
    }

    /// `if "(" expression ")" block ( else block )?`
    ///
    /// The condition must parse as a grouping; `if x { }` is a syntax
    /// error, as is a branch without braces.
    fn if_statement(&mut self) -> Option<Stmt> {
        let cond = self.parse_expression()?;
        if !matches!(cond, Expr::Grouping(_)) {
            self.error("Expected valid expression after \"if\" statement.");
            return None;
        }

        if !self.match_token(Token::LBrace) {
            self.error("Missing valid execution block \"{...}\" for if-statement true branch.");
            return None;
        }
        let then_block = self.block()?;

        let else_block = if self.match_token(Token::Else) {
            if !self.match_token(Token::LBrace) {
                self.error("Missing valid execution block \"{...}\" for else branch.");
                return None;
            }
            Some(self.block()?)
        } else {
            None
        };

        Some(Stmt::If(IfStmt {
            cond,
            then_block,
            else_block,
        }))
    }

    /// `while "(" expression ")" block`
    fn while_statement(&mut self) -> Option<Stmt> {
        let cond = self.parse_expression()?;
        if !matches!(cond, Expr::Grouping(_)) {
            self.error("Expected valid expression after \"while\" statement.");
            return None;
        }

        if !self.match_token(Token::LBrace) {
            self.error("Expected valid execution block \"{...}\" for while statement.");
            return None;
        }
        let body = self.block()?;

        Some(Stmt::While(WhileStmt { cond, body }))
    }

    /// `return expression? ";"`
    fn return_statement(&mut self) -> Option<Stmt> {
        let line = self.previous_line();
        if self.match_token(Token::Semicolon) {
            return Some(Stmt::Return(ReturnStmt { value: None, line }));
        }

        let value = self.parse_expression()?;
        if matches!(value, Expr::Construct(_)) {
            self.error("Cannot return a constructor.");
            return None;
        }
        self.expect_semicolon()?;
        Some(Stmt::Return(ReturnStmt {
            value: Some(value),
            line,
        }))
    }

    /// `break ";"`
    fn break_statement(&mut self) -> Option<Stmt> {
        let line = self.previous_line();
        if !self.match_token(Token::Semicolon) {
            self.error("Expected ; after break statement.");
            return None;
        }
        Some(Stmt::Break(BreakStmt { line }))
    }

    /// An expression in statement position.
    ///
    /// The trailing semicolon is required only when the expression is an
    /// assignment or a call; other bare expressions are accepted without
    /// one so a console line like `1 + 2` still evaluates.
    fn expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        let semicolon_required = matches!(expr, Expr::Assign(_) | Expr::Call(_));
        if !self.match_token(Token::Semicolon) && semicolon_required {
            self.error("Expected ; after statement.");
            return None;
        }
        Some(Stmt::Expr(ExprStmt { expr }))
    }

    /// The inside of a block; the opening brace is already consumed.
    pub(crate) fn block(&mut self) -> Option<Block> {
        let mut stmts = Vec::new();
        while !self.match_token(Token::RBrace) {
            if self.check(&Token::Eof) {
                self.error("Missing }.");
                return None;
            }
            stmts.push(self.declaration()?);
        }
        Some(Block { stmts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plox_util::Handler;

    fn parse_source(source: &str) -> (Program, Handler) {
        let handler = Handler::new();
        let tokens = plox_lex::tokenize(source, &handler);
        let program = Parser::new(tokens, &handler).parse();
        (program, handler)
    }

    fn parse_ok(source: &str) -> Program {
        let (program, handler) = parse_source(source);
        assert!(
            !handler.has_errors(),
            "unexpected errors: {:?}",
            handler.take()
        );
        program
    }

    fn parse_err(source: &str) -> Handler {
        let (_, handler) = parse_source(source);
        assert!(handler.has_errors(), "expected a syntax error");
        handler
    }

    // =========================================================================
    // VARIABLE DECLARATIONS
    // =========================================================================

    #[test]
    fn test_var_with_initializer() {
        let program = parse_ok("var x = 42;");
        match &program[0] {
            Stmt::Var(var) => {
                assert_eq!(var.name.as_str(), "x");
                assert!(var.init.is_some());
            }
            other => panic!("expected var declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_var_without_initializer() {
        let program = parse_ok("var x;");
        match &program[0] {
            Stmt::Var(var) => assert!(var.init.is_none()),
            other => panic!("expected var declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_var_requires_semicolon() {
        parse_err("var x = 1");
    }

    #[test]
    fn test_var_requires_identifier() {
        parse_err("var 3 = 1;");
        parse_err("var __init__ = 0;");
        parse_err("var if = 0;");
    }

    #[test]
    fn test_var_initializer_rejects_constructor() {
        let handler = parse_err("var x = __init__;");
        assert!(handler
            .take()
            .iter()
            .any(|d| d.message.contains("Cannot assign a constructor.")));
    }

    // =========================================================================
    // FUNCTION DECLARATIONS
    // =========================================================================

    #[test]
    fn test_function_declaration() {
        let program = parse_ok("fun f(a, b) { return a; }");
        match &program[0] {
            Stmt::Func(func) => {
                assert_eq!(func.name.as_str(), "f");
                assert_eq!(func.params.len(), 2);
                assert!(!func.is_initializer);
                assert_eq!(func.body.stmts.len(), 1);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_no_params() {
        let program = parse_ok("fun f() { }");
        match &program[0] {
            Stmt::Func(func) => assert!(func.params.is_empty()),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_missing_comma() {
        parse_err("fun f(a b) { }");
    }

    #[test]
    fn test_function_requires_body() {
        parse_err("fun f();");
    }

    #[test]
    fn test_function_unclosed_params() {
        parse_err("fun f(a,");
    }

    // =========================================================================
    // CLASS DECLARATIONS
    // =========================================================================

    #[test]
    fn test_empty_class() {
        let program = parse_ok("class Simple { }");
        match &program[0] {
            Stmt::Class(class) => {
                assert_eq!(class.name.as_str(), "Simple");
                assert!(class.superclass.is_none());
                assert!(class.methods.is_empty());
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_methods_and_constructor() {
        let program = parse_ok(
            "class Bakery { fun __init__(style) { this.style = style; } fun bake() { print this.style; } }",
        );
        match &program[0] {
            Stmt::Class(class) => {
                assert_eq!(class.methods.len(), 2);
                assert!(class.methods[0].is_initializer);
                assert_eq!(class.methods[0].name.as_str(), "__init__");
                assert!(!class.methods[1].is_initializer);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_superclass() {
        let program = parse_ok("class Bakery > Store { }");
        match &program[0] {
            Stmt::Class(class) => {
                let superclass = class.superclass.as_ref().expect("superclass");
                assert_eq!(superclass.name.as_str(), "Store");
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_class_body_rejects_non_methods() {
        parse_err("class C { var x = 1; }");
    }

    #[test]
    fn test_class_unclosed_body() {
        parse_err("class C { fun f() { }");
    }

    // =========================================================================
    // CONTROL FLOW
    // =========================================================================

    #[test]
    fn test_if_else() {
        let program = parse_ok("if (true) { print 1; } else { print 2; }");
        match &program[0] {
            Stmt::If(stmt) => {
                assert!(matches!(stmt.cond, Expr::Grouping(_)));
                assert!(stmt.else_block.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_if_condition_must_be_parenthesised() {
        parse_err("if true { print 1; }");
    }

    #[test]
    fn test_if_branch_must_be_block() {
        parse_err("if (true) print 1;");
    }

    #[test]
    fn test_while() {
        let program = parse_ok("while (x > 0) { x = x - 1; }");
        assert!(matches!(program[0], Stmt::While(_)));
    }

    #[test]
    fn test_while_condition_must_be_parenthesised() {
        parse_err("while x { }");
    }

    #[test]
    fn test_for_is_not_implemented() {
        let handler = parse_err("for (;;) { }");
        let messages: Vec<_> = handler.take();
        assert!(messages
            .iter()
            .any(|d| d.message.contains("'for' loops are not implemented")));
    }

    #[test]
    fn test_return_forms() {
        let program = parse_ok("fun f() { return; } fun g() { return 1; }");
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_return_requires_semicolon() {
        parse_err("fun f() { return 1 }");
    }

    #[test]
    fn test_return_constructor_rejected() {
        parse_err("fun f() { return __init__; }");
    }

    #[test]
    fn test_break_requires_semicolon() {
        parse_err("while (true) { break }");
    }

    // =========================================================================
    // BLOCKS AND SEMICOLON POLICY
    // =========================================================================

    #[test]
    fn test_nested_blocks() {
        let program = parse_ok("{ var x = 1; { var y = 2; } }");
        match &program[0] {
            Stmt::Block(block) => {
                assert_eq!(block.stmts.len(), 2);
                assert!(matches!(block.stmts[1], Stmt::Block(_)));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_block() {
        parse_err("{ var x = 1;");
    }

    #[test]
    fn test_bare_expression_without_semicolon_ok() {
        let program = parse_ok("1 + 2");
        assert!(matches!(program[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_assignment_requires_semicolon() {
        parse_err("x = 1");
    }

    #[test]
    fn test_call_requires_semicolon() {
        parse_err("f()");
    }

    #[test]
    fn test_call_with_semicolon_ok() {
        let program = parse_ok("f();");
        assert!(matches!(program[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_field_set_semicolon_optional() {
        // Only assignments to plain names and calls require the
        // semicolon; a field set without one still parses.
        let program = parse_ok("x.field = 1");
        assert!(matches!(program[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_print_requires_semicolon() {
        parse_err("print 1");
    }
}
