//! Expression parsing using Pratt-style binding powers.
//!
//! Precedence, lowest to highest:
//!
//! | Level | Operators |
//! |-------|-----------|
//! | 1 | `or` |
//! | 2 | `and` |
//! | 3 | `==`, `!=` |
//! | 4 | `<`, `<=`, `>`, `>=` |
//! | 5 | `+`, `-` |
//! | 6 | `*`, `/` |
//! | 7 | unary `!`, `-` |
//! | 8 | calls and field access |
//!
//! All infix operators are left-associative. Assignment sits above the
//! table: it is right-associative and validates its target after the
//! left-hand side has been parsed.

use plox_lex::Token;

use crate::ast::*;
use crate::Parser;

/// Binding power levels. Higher numbers bind tighter; each infix level
/// uses `(n, n + 1)` for left associativity.
mod bp {
    /// Minimum binding power (start of expression).
    pub const MIN: u8 = 0;

    /// Logical `or`.
    pub const LOGICAL_OR: u8 = 2;

    /// Logical `and`.
    pub const LOGICAL_AND: u8 = 4;

    /// `==`, `!=`.
    pub const EQUALITY: u8 = 6;

    /// `<`, `<=`, `>`, `>=`.
    pub const COMPARISON: u8 = 8;

    /// `+`, `-`.
    pub const TERM: u8 = 10;

    /// `*`, `/`.
    pub const FACTOR: u8 = 12;
}

impl<'a> Parser<'a> {
    /// Main expression entry point.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    /// Assignment is right-associative: `a = b = c` assigns `c` to `b`
    /// first. The left-hand side is parsed as an ordinary expression and
    /// then checked: a plain name becomes [`Expr::Assign`], a field
    /// access becomes [`Expr::Set`], anything else is a syntax error.
    fn parse_assignment(&mut self) -> Option<Expr> {
        let expr = self.parse_expr_bp(bp::MIN)?;

        if self.match_token(Token::Eq) {
            let line = self.previous_line();
            let value = Box::new(self.parse_assignment()?);
            if matches!(value.as_ref(), Expr::Construct(_)) {
                self.error_at("Cannot assign a constructor.", line);
                return None;
            }
            return match expr {
                Expr::Identifier(ident) => {
                    let id = self.next_expr_id();
                    Some(Expr::Assign(AssignExpr {
                        name: ident.name,
                        value,
                        line,
                        id,
                    }))
                }
                Expr::Get(get) => Some(Expr::Set(SetExpr {
                    object: get.object,
                    field: get.field,
                    value,
                    line,
                })),
                Expr::Construct(_) => {
                    self.error_at("Reassignment of class constructor not allowed.", line);
                    None
                }
                _ => {
                    self.error_at("Assignment target wrong type.", line);
                    None
                }
            };
        }

        Some(expr)
    }

    /// Pratt loop: parse a unary expression, then fold in infix operators
    /// whose left binding power is at least `min_bp`.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            let (_lbp, rbp) = match self.infix_binding_power() {
                Some(powers) if powers.0 >= min_bp => powers,
                _ => break,
            };

            let op_token = self.current_token();
            let line = self.current_line();
            self.advance();

            let rhs = self.parse_expr_bp(rbp)?;
            lhs = match op_token {
                Token::Or => Expr::Logical(LogicalExpr {
                    left: Box::new(lhs),
                    op: LogicalOp::Or,
                    right: Box::new(rhs),
                    line,
                }),
                Token::And => Expr::Logical(LogicalExpr {
                    left: Box::new(lhs),
                    op: LogicalOp::And,
                    right: Box::new(rhs),
                    line,
                }),
                other => {
                    let op = match Self::token_to_binop(&other) {
                        Some(op) => op,
                        None => {
                            self.error("Invalid PLOX expression.");
                            return None;
                        }
                    };
                    Expr::Binary(BinaryExpr {
                        left: Box::new(lhs),
                        op,
                        right: Box::new(rhs),
                        line,
                    })
                }
            };
        }

        Some(lhs)
    }

    /// Binding powers `(left, right)` for the current token as an infix
    /// operator, or `None` when the token cannot continue an expression.
    fn infix_binding_power(&self) -> Option<(u8, u8)> {
        let powers = match self.current() {
            Token::Or => (bp::LOGICAL_OR, bp::LOGICAL_OR + 1),
            Token::And => (bp::LOGICAL_AND, bp::LOGICAL_AND + 1),
            Token::EqEq | Token::NotEq => (bp::EQUALITY, bp::EQUALITY + 1),
            Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => {
                (bp::COMPARISON, bp::COMPARISON + 1)
            }
            Token::Plus | Token::Minus => (bp::TERM, bp::TERM + 1),
            Token::Star | Token::Slash => (bp::FACTOR, bp::FACTOR + 1),
            _ => return None,
        };
        Some(powers)
    }

    fn token_to_binop(token: &Token) -> Option<BinOp> {
        let op = match token {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::EqEq => BinOp::Eq,
            Token::NotEq => BinOp::Ne,
            Token::Lt => BinOp::Lt,
            Token::LtEq => BinOp::Le,
            Token::Gt => BinOp::Gt,
            Token::GtEq => BinOp::Ge,
            _ => return None,
        };
        Some(op)
    }

    /// `( "!" | "-" ) unary | call`
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.current() {
            Token::Bang => UnOp::Not,
            Token::Minus => UnOp::Neg,
            _ => return self.parse_call(),
        };
        let line = self.current_line();
        self.advance();
        let operand = Box::new(self.parse_unary()?);
        Some(Expr::Unary(UnaryExpr { op, operand, line }))
    }

    /// `primary ( "(" args? ")" | "." IDENT )*`
    ///
    /// A call chain can mix invocations and field accesses freely:
    /// `shop.branch("north").owner.greet()`. A `.` may not be followed by
    /// `__init__` and a constructor reference may not be invoked.
    fn parse_call(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::LParen) {
                if matches!(expr, Expr::Construct(_)) {
                    self.error("Explicit invocation of a constructor is not allowed.");
                    return None;
                }
                self.advance();
                expr = self.finish_call(expr)?;
            } else if self.match_token(Token::Dot) {
                if self.check(&Token::Init) {
                    self.error("Explicit invocation of a constructor is not allowed.");
                    return None;
                }
                let field = self.expect_ident("Expected method or property.")?;
                let line = self.previous_line();
                expr = Expr::Get(GetExpr {
                    object: Box::new(expr),
                    field,
                    line,
                });
            } else {
                break;
            }
        }

        Some(expr)
    }

    /// Argument list; the opening paren is already consumed.
    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut args = Vec::new();
        while !self.match_token(Token::RParen) {
            if self.check(&Token::Eof) {
                self.error("Expected matching \")\" for function call.");
                return None;
            }
            if !args.is_empty() && !self.match_token(Token::Comma) {
                self.error("Expected , separator in argument list.");
                return None;
            }
            args.push(self.parse_expression()?);
        }
        Some(Expr::Call(CallExpr {
            callee: Box::new(callee),
            args,
            line: self.previous_line(),
        }))
    }

    /// Literals, names, grouping, `this`, `super`, `__init__`.
    fn parse_primary(&mut self) -> Option<Expr> {
        let line = self.current_line();
        match self.current_token() {
            Token::Number(value) => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: LitValue::Number(value),
                    line,
                }))
            }
            Token::String(value) => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: LitValue::Str(value),
                    line,
                }))
            }
            Token::True => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: LitValue::Bool(true),
                    line,
                }))
            }
            Token::False => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: LitValue::Bool(false),
                    line,
                }))
            }
            Token::Nil => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: LitValue::Nil,
                    line,
                }))
            }
            Token::Ident(name) => {
                self.advance();
                let id = self.next_expr_id();
                Some(Expr::Identifier(IdentExpr { name, line, id }))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                if !self.match_token(Token::RParen) {
                    self.error("Missing \")\".");
                    return None;
                }
                Some(Expr::Grouping(GroupingExpr {
                    expr: Box::new(inner),
                    line,
                }))
            }
            Token::This => {
                self.advance();
                let id = self.next_expr_id();
                Some(Expr::This(ThisExpr { line, id }))
            }
            Token::Super => {
                self.advance();
                if !self.check(&Token::Dot) {
                    self.error("Expected '.' after 'super'.");
                    return None;
                }
                let id = self.next_expr_id();
                Some(Expr::Super(SuperExpr { line, id }))
            }
            Token::Init => {
                self.advance();
                Some(Expr::Construct(ConstructExpr { line }))
            }
            _ => {
                self.error("Invalid PLOX expression.");
                None
            }
        }
    }
}
