//! Deterministic parenthesized rendering of the AST.
//!
//! Used by the driver's `--emit-ast` mode and by tests: printing a fixed
//! tree always yields the same text, so two parses of the same source can
//! be compared through their printed forms.

use crate::ast::*;

/// Renders statements and expressions as parenthesized trees.
///
/// # Example
///
/// ```
/// use plox_util::Handler;
/// use plox_par::{Parser, TreePrinter};
///
/// let handler = Handler::new();
/// let tokens = plox_lex::tokenize("print 1 + 2;", &handler);
/// let program = Parser::new(tokens, &handler).parse();
///
/// let printed = TreePrinter.print_program(&program);
/// assert_eq!(printed, "( PRINT ( + ( 1 ) ( 2 ) ) )");
/// ```
pub struct TreePrinter;

impl TreePrinter {
    /// Render a whole program, one statement per line.
    pub fn print_program(&self, program: &[Stmt]) -> String {
        program
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render a single statement.
    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expr(s) => self.print_expr(&s.expr),
            Stmt::Print(s) => format!("( PRINT {} )", self.print_expr(&s.expr)),
            Stmt::Var(s) => match &s.init {
                Some(init) => format!("( VAR = {} {} )", s.name, self.print_expr(init)),
                None => format!("( VAR {} )", s.name),
            },
            Stmt::Block(block) => self.print_block(block),
            Stmt::If(s) => {
                let mut out = format!(
                    "( IF {} {}",
                    self.print_expr(&s.cond),
                    self.print_block(&s.then_block)
                );
                if let Some(else_block) = &s.else_block {
                    out.push_str(&format!(" ELSE {}", self.print_block(else_block)));
                }
                out.push_str(" )");
                out
            }
            Stmt::While(s) => format!(
                "( WHILE {} {} )",
                self.print_expr(&s.cond),
                self.print_block(&s.body)
            ),
            Stmt::Func(func) => self.print_func(func),
            Stmt::Return(s) => match &s.value {
                Some(value) => format!("( RETURN {} )", self.print_expr(value)),
                None => "( RETURN )".to_string(),
            },
            Stmt::Break(_) => "( BREAK )".to_string(),
            Stmt::Class(class) => {
                let mut out = format!("( CLASS {}", class.name);
                if let Some(superclass) = &class.superclass {
                    out.push_str(&format!(" > {}", superclass.name));
                }
                for method in &class.methods {
                    out.push(' ');
                    out.push_str(&self.print_func(method));
                }
                out.push_str(" )");
                out
            }
        }
    }

    /// Render a single expression.
    pub fn print_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(e) => format!("( {} )", e.value),
            Expr::Grouping(e) => format!("( Group {} )", self.print_expr(&e.expr)),
            Expr::Unary(e) => format!("( {}{} )", e.op.symbol(), self.print_expr(&e.operand)),
            Expr::Binary(e) => format!(
                "( {} {} {} )",
                e.op.symbol(),
                self.print_expr(&e.left),
                self.print_expr(&e.right)
            ),
            Expr::Logical(e) => format!(
                "( {} {} {} )",
                e.op.symbol(),
                self.print_expr(&e.left),
                self.print_expr(&e.right)
            ),
            Expr::Identifier(e) => e.name.to_string(),
            Expr::Assign(e) => format!("( = {} {} )", e.name, self.print_expr(&e.value)),
            Expr::Call(e) => {
                let mut out = format!("( Call {}", self.print_expr(&e.callee));
                for arg in &e.args {
                    out.push(' ');
                    out.push_str(&self.print_expr(arg));
                }
                out.push_str(" )");
                out
            }
            Expr::Get(e) => format!("( Get {} {} )", self.print_expr(&e.object), e.field),
            Expr::Set(e) => format!(
                "( Set {} {} {} )",
                self.print_expr(&e.object),
                e.field,
                self.print_expr(&e.value)
            ),
            Expr::This(_) => "this".to_string(),
            Expr::Super(_) => "super".to_string(),
            Expr::Construct(_) => "__init__".to_string(),
        }
    }

    fn print_block(&self, block: &Block) -> String {
        let mut out = String::from("( Block");
        for stmt in &block.stmts {
            out.push(' ');
            out.push_str(&self.print_stmt(stmt));
        }
        out.push_str(" )");
        out
    }

    fn print_func(&self, func: &FuncDecl) -> String {
        let params = func
            .params
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "( FUN {} ({}) {} )",
            func.name,
            params,
            self.print_block(&func.body)
        )
    }
}
