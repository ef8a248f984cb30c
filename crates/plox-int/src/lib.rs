//! plox-int - Tree-walking evaluator for Plox.
//!
//! Executes a resolved AST against a stack of shared scope frames. The
//! resolver's distance map is consulted for every `Identifier`, `Assign`,
//! `this`, and `super` use: a recorded distance D reads the frame at
//! `height - 1 - D`, while unresolved names fall back to the global frame
//! by name.
//!
//! Program output goes through a generic [`io::Write`] sink so embedders
//! and tests can capture it; the default is stdout. Runtime errors abort
//! the current top-level statement, are reported through the shared
//! handler, and execution continues with the next statement.

pub mod env;
pub mod error;
pub mod value;

pub use env::{EnvStack, Frame, FrameRef};
pub use error::{Exec, RuntimeError, Unwind};
pub use value::{Class, Function, Instance, Value};

use std::io::{self, Write};
use std::rc::Rc;

use plox_par::{
    BinOp, BinaryExpr, Block, CallExpr, ClassDecl, Expr, ExprId, GetExpr, LitValue, LogicalOp,
    Program, Stmt, SuperExpr, UnaryExpr, UnOp,
};
use plox_sem::Resolutions;
use plox_util::{FxHashMap, Handler, Span, Stage, Symbol};

/// The Plox interpreter.
///
/// Holds the environment stack, so one interpreter can run several
/// programs in sequence (a REPL session keeps its globals between lines).
pub struct Interpreter<W: Write = io::Stdout> {
    env: EnvStack,
    out: W,
    repl_echo: bool,
    this_sym: Symbol,
    super_sym: Symbol,
    init_sym: Symbol,
}

impl Interpreter<io::Stdout> {
    /// An interpreter writing program output to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// An interpreter writing program output to `out`.
    pub fn with_output(out: W) -> Self {
        Self {
            env: EnvStack::new(),
            out,
            repl_echo: false,
            this_sym: Symbol::intern("this"),
            super_sym: Symbol::intern("super"),
            init_sym: Symbol::intern("__init__"),
        }
    }

    /// In echo mode every expression statement prints its value in the
    /// console `Result:` form.
    pub fn set_repl_echo(&mut self, on: bool) {
        self.repl_echo = on;
    }

    /// Current frame-stack height (1 = globals only).
    pub fn frame_height(&self) -> usize {
        self.env.height()
    }

    /// Consume the interpreter, returning its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Execute top-level statements in order.
    ///
    /// A runtime error (or a control signal escaping its legal context,
    /// which is converted to one) aborts the offending statement and is
    /// reported through `handler`; execution continues with the next
    /// statement. Returns whether any runtime error occurred.
    pub fn interpret(
        &mut self,
        program: &Program,
        resolutions: &Resolutions,
        handler: &Handler,
    ) -> bool {
        let mut had_runtime_error = false;
        for stmt in program {
            if let Err(unwind) = self.exec_stmt(stmt, resolutions) {
                let error = match unwind {
                    Unwind::Error(error) => error,
                    Unwind::Return { line, .. } => {
                        RuntimeError::new("'return' used outside of a function.", line)
                    }
                    Unwind::Break(line) => {
                        RuntimeError::new("'break' used outside of a loop.", line)
                    }
                };
                handler.error(Stage::Runtime, error.message, Span::point(error.line));
                had_runtime_error = true;
            }
        }
        had_runtime_error
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn exec_stmt(&mut self, stmt: &Stmt, res: &Resolutions) -> Exec<()> {
        match stmt {
            Stmt::Expr(s) => {
                let line = s.expr.line();
                let value = self.eval(&s.expr, res)?;
                if self.repl_echo {
                    self.write_line("    Result:", line)?;
                    self.write_line(&format!("            {}", value), line)?;
                }
                Ok(())
            }
            Stmt::Print(s) => {
                let value = self.eval(&s.expr, res)?;
                self.write_line(&value.to_string(), s.line)
            }
            Stmt::Var(var) => {
                let value = match &var.init {
                    Some(init) => self.eval(init, res)?,
                    None => Value::Nil,
                };
                if !self.env.define(var.name, value) {
                    return Err(RuntimeError::new(
                        format!("Variable {} already declared in this scope.", var.name),
                        var.line,
                    )
                    .into());
                }
                Ok(())
            }
            Stmt::Block(block) => self.exec_block(block, res),
            Stmt::If(s) => {
                if self.eval(&s.cond, res)?.is_truthy() {
                    self.exec_block(&s.then_block, res)
                } else if let Some(else_block) = &s.else_block {
                    self.exec_block(else_block, res)
                } else {
                    Ok(())
                }
            }
            Stmt::While(s) => {
                while self.eval(&s.cond, res)?.is_truthy() {
                    match self.exec_block(&s.body, res) {
                        Ok(()) => {}
                        Err(Unwind::Break(_)) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::Func(decl) => {
                // The snapshot shares frames with the current stack, so
                // the binding made just below is already visible to the
                // closure: recursion works.
                let function = Function {
                    decl: decl.clone(),
                    closure: self.env.snapshot(),
                };
                self.env.set(decl.name, Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return(s) => {
                let value = match &s.value {
                    Some(expr) => self.eval(expr, res)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return {
                    value,
                    line: s.line,
                })
            }
            Stmt::Break(s) => Err(Unwind::Break(s.line)),
            Stmt::Class(class) => self.exec_class_decl(class, res),
        }
    }

    /// Run a block in a fresh frame. The frame is popped on every path,
    /// including control signals and errors in flight.
    fn exec_block(&mut self, block: &Block, res: &Resolutions) -> Exec<()> {
        self.env.push_frame();
        let result = self.exec_stmts(&block.stmts, res);
        self.env.pop_frame();
        result
    }

    fn exec_stmts(&mut self, stmts: &[Stmt], res: &Resolutions) -> Exec<()> {
        for stmt in stmts {
            self.exec_stmt(stmt, res)?;
        }
        Ok(())
    }

    fn exec_class_decl(&mut self, class: &ClassDecl, res: &Resolutions) -> Exec<()> {
        let superclass = match &class.superclass {
            Some(ident) => {
                let value = self.lookup_name(ident.id, ident.name, ident.line, res)?;
                match value {
                    Value::Class(superclass) => Some(superclass),
                    _ => {
                        return Err(RuntimeError::new(
                            "Superclass must be a class.",
                            ident.line,
                        )
                        .into())
                    }
                }
            }
            None => None,
        };

        // Methods of a subclass close over a `super` frame baked in once
        // at declaration; binding to an instance later adds the `this`
        // frame on top.
        let mut method_closure = self.env.snapshot();
        if let Some(superclass) = &superclass {
            let frame = Frame::new_ref();
            frame
                .borrow_mut()
                .set(self.super_sym, Value::Class(superclass.clone()));
            method_closure.push(frame);
        }

        let mut methods = FxHashMap::default();
        for method in &class.methods {
            let function = Function {
                decl: method.clone(),
                closure: method_closure.clone(),
            };
            methods.insert(method.name, Rc::new(function));
        }

        let class_value = Class {
            name: class.name,
            methods,
            superclass,
        };
        self.env.set(class.name, Value::Class(Rc::new(class_value)));
        Ok(())
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn eval(&mut self, expr: &Expr, res: &Resolutions) -> Exec<Value> {
        match expr {
            Expr::Literal(e) => Ok(match &e.value {
                LitValue::Number(n) => Value::Number(*n),
                LitValue::Str(s) => Value::Str(Rc::from(s.as_str())),
                LitValue::Bool(b) => Value::Bool(*b),
                LitValue::Nil => Value::Nil,
            }),
            Expr::Grouping(e) => self.eval(&e.expr, res),
            Expr::Unary(e) => self.eval_unary(e, res),
            Expr::Binary(e) => self.eval_binary(e, res),
            Expr::Logical(e) => {
                // Short-circuit; the result is the last evaluated
                // operand, not a coerced boolean.
                let left = self.eval(&e.left, res)?;
                match e.op {
                    LogicalOp::Or if left.is_truthy() => Ok(left),
                    LogicalOp::And if !left.is_truthy() => Ok(left),
                    _ => self.eval(&e.right, res),
                }
            }
            Expr::Identifier(e) => self.lookup_name(e.id, e.name, e.line, res),
            Expr::Assign(e) => {
                let value = self.eval(&e.value, res)?;
                let written = match res.distance(e.id) {
                    Some(distance) => self.env.assign_at(distance, e.name, value.clone()),
                    None => self.env.assign_global(e.name, value.clone()),
                };
                if !written {
                    return Err(RuntimeError::new(
                        format!("Implicit Declaration of Variable {}.", e.name),
                        e.line,
                    )
                    .into());
                }
                Ok(value)
            }
            Expr::Call(e) => self.eval_call(e, res),
            Expr::Get(e) => self.eval_get(e, res),
            Expr::Set(e) => {
                let object = self.eval(&e.object, res)?;
                let instance = match object {
                    Value::Instance(instance) => instance,
                    _ => {
                        return Err(RuntimeError::new(
                            "Only class instances have fields.",
                            e.line,
                        )
                        .into())
                    }
                };
                let value = self.eval(&e.value, res)?;
                instance.set_field(e.field, value.clone());
                Ok(value)
            }
            Expr::This(e) => {
                let value = res
                    .distance(e.id)
                    .and_then(|distance| self.env.get_at(distance, self.this_sym));
                value.ok_or_else(|| {
                    Unwind::from(RuntimeError::new(
                        "Cannot use 'this' outside of a class.",
                        e.line,
                    ))
                })
            }
            Expr::Super(e) => self.lookup_superclass(e, res).map(Value::Class),
            Expr::Construct(e) => Err(RuntimeError::new(
                "Explicit use of a constructor is not allowed.",
                e.line,
            )
            .into()),
        }
    }

    fn eval_unary(&mut self, e: &UnaryExpr, res: &Resolutions) -> Exec<Value> {
        let operand = self.eval(&e.operand, res)?;
        match e.op {
            UnOp::Not => Ok(Value::Bool(!operand.is_truthy())),
            UnOp::Neg => match operand {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new("Negation expects NUMBER", e.line).into()),
            },
        }
    }

    fn eval_binary(&mut self, e: &BinaryExpr, res: &Resolutions) -> Exec<Value> {
        let left = self.eval(&e.left, res)?;
        let right = self.eval(&e.right, res)?;

        match e.op {
            BinOp::Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => {
                    Ok(Value::Str(Rc::from(format!("{}{}", a, b))))
                }
                // A number meeting a string is coerced to its display
                // form, so "$" + 2 is "$2".
                (Value::Str(a), Value::Number(b)) => {
                    Ok(Value::Str(Rc::from(format!("{}{}", a, Value::Number(b)))))
                }
                (Value::Number(a), Value::Str(b)) => {
                    Ok(Value::Str(Rc::from(format!("{}{}", Value::Number(a), b))))
                }
                _ => Err(self.operator_error("+", "Expected NUMBER or STRING", e.line)),
            },
            BinOp::Sub => self.arithmetic(left, right, e, |a, b| a - b),
            BinOp::Mul => self.arithmetic(left, right, e, |a, b| a * b),
            // Division by zero follows IEEE-754 and yields an infinity
            // or NaN, not an error.
            BinOp::Div => self.arithmetic(left, right, e, |a, b| a / b),
            BinOp::Eq => Ok(Value::Bool(left == right)),
            BinOp::Ne => Ok(Value::Bool(left != right)),
            BinOp::Lt => self.comparison(left, right, e, |a, b| a < b),
            BinOp::Le => self.comparison(left, right, e, |a, b| a <= b),
            BinOp::Gt => self.comparison(left, right, e, |a, b| a > b),
            BinOp::Ge => self.comparison(left, right, e, |a, b| a >= b),
        }
    }

    fn arithmetic(
        &self,
        left: Value,
        right: Value,
        e: &BinaryExpr,
        apply: impl Fn(f64, f64) -> f64,
    ) -> Exec<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(a, b))),
            _ => Err(self.operator_error(e.op.symbol(), "Expected NUMBER", e.line)),
        }
    }

    fn comparison(
        &self,
        left: Value,
        right: Value,
        e: &BinaryExpr,
        apply: impl Fn(f64, f64) -> bool,
    ) -> Exec<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(apply(a, b))),
            _ => Err(self.operator_error(e.op.symbol(), "Expected NUMBER", e.line)),
        }
    }

    fn operator_error(&self, op: &str, expected: &str, line: u32) -> Unwind {
        Unwind::from(RuntimeError::new(
            format!("{} Operator: {}", op, expected),
            line,
        ))
    }

    // =========================================================================
    // CALLS
    // =========================================================================

    fn eval_call(&mut self, e: &CallExpr, res: &Resolutions) -> Exec<Value> {
        let callee = self.eval(&e.callee, res)?;

        let mut args = Vec::with_capacity(e.args.len());
        for arg in &e.args {
            args.push(self.eval(arg, res)?);
        }

        match callee {
            Value::Function(function) => self.call_function(&function, args, e.line, res),
            Value::Class(class) => self.instantiate(&class, args, e.line, res),
            _ => Err(RuntimeError::new("Can only call functions and classes.", e.line).into()),
        }
    }

    /// Invoke a function value: install its captured closure as the
    /// active stack, push a frame binding parameters to arguments, run
    /// the body, and catch the `return` signal.
    fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
        line: u32,
        res: &Resolutions,
    ) -> Exec<Value> {
        if args.len() != function.arity() {
            return Err(RuntimeError::new(
                format!(
                    "Function {} expected {} arguments but got {}.",
                    function.name(),
                    function.arity(),
                    args.len()
                ),
                line,
            )
            .into());
        }

        let saved = std::mem::replace(
            &mut self.env,
            EnvStack::from_frames(function.closure.clone()),
        );
        self.env.push_frame();
        for (&param, arg) in function.decl.params.iter().zip(args) {
            self.env.set(param, arg);
        }

        let outcome = self.exec_block(&function.decl.body, res);

        self.env.pop_frame();
        self.env = saved;

        let value = match outcome {
            Ok(()) => Value::Nil,
            Err(Unwind::Return { value, .. }) => value,
            Err(Unwind::Break(break_line)) => {
                return Err(
                    RuntimeError::new("'break' used outside of a loop.", break_line).into(),
                )
            }
            Err(other) => return Err(other),
        };

        if function.is_initializer() {
            // Constructors always yield their instance; an explicit
            // return value is discarded.
            return self.bound_this(function, line);
        }
        Ok(value)
    }

    /// Calling a class constructs an instance, running a bound
    /// `__init__` when the class (or an ancestor) declares one.
    fn instantiate(
        &mut self,
        class: &Rc<Class>,
        args: Vec<Value>,
        line: u32,
        res: &Resolutions,
    ) -> Exec<Value> {
        let instance = Rc::new(Instance::new(class.clone()));

        if let Some(init) = class.find_method(self.init_sym) {
            let bound = Rc::new(init.bind(&instance, self.this_sym));
            self.call_function(&bound, args, line, res)?;
        } else if !args.is_empty() {
            return Err(RuntimeError::new(
                format!(
                    "Class {} expected 0 arguments but got {}.",
                    class.name,
                    args.len()
                ),
                line,
            )
            .into());
        }

        Ok(Value::Instance(instance))
    }

    /// The instance a bound method was attached to: the top closure
    /// frame holds `this`.
    fn bound_this(&self, function: &Rc<Function>, line: u32) -> Exec<Value> {
        function
            .closure
            .last()
            .and_then(|frame| frame.borrow().get(self.this_sym))
            .ok_or_else(|| {
                Unwind::from(RuntimeError::new(
                    "Constructor invoked without an instance.",
                    line,
                ))
            })
    }

    // =========================================================================
    // FIELD ACCESS
    // =========================================================================

    fn eval_get(&mut self, e: &GetExpr, res: &Resolutions) -> Exec<Value> {
        // `super.name` is a special form: lookup starts at the
        // superclass and `this` comes from the current binding.
        if let Expr::Super(superexpr) = e.object.as_ref() {
            return self.eval_super_get(superexpr, e.field, e.line, res);
        }

        let object = self.eval(&e.object, res)?;
        match object {
            Value::Instance(instance) => {
                if let Some(value) = instance.get_field(e.field) {
                    return Ok(value);
                }
                if let Some(method) = instance.class.find_method(e.field) {
                    return Ok(Value::Function(Rc::new(
                        method.bind(&instance, self.this_sym),
                    )));
                }
                Err(RuntimeError::new(
                    format!("Undefined property {}.", e.field),
                    e.line,
                )
                .into())
            }
            _ => Err(RuntimeError::new("Only class instances have properties.", e.line).into()),
        }
    }

    fn eval_super_get(
        &mut self,
        superexpr: &SuperExpr,
        field: Symbol,
        line: u32,
        res: &Resolutions,
    ) -> Exec<Value> {
        let distance = match res.distance(superexpr.id) {
            Some(distance) => distance,
            None => {
                return Err(RuntimeError::new(
                    "Cannot use 'super' in a class with no superclass.",
                    superexpr.line,
                )
                .into())
            }
        };
        let superclass = match self.env.get_at(distance, self.super_sym) {
            Some(Value::Class(superclass)) => superclass,
            _ => {
                return Err(RuntimeError::new(
                    "Cannot use 'super' in a class with no superclass.",
                    superexpr.line,
                )
                .into())
            }
        };

        // The `this` frame sits directly inside the `super` frame.
        let instance = distance
            .checked_sub(1)
            .and_then(|d| self.env.get_at(d, self.this_sym));
        let instance = match instance {
            Some(Value::Instance(instance)) => instance,
            _ => {
                return Err(RuntimeError::new(
                    "'super' requires a bound 'this'.",
                    line,
                )
                .into())
            }
        };

        let method = superclass.find_method(field).ok_or_else(|| {
            Unwind::from(RuntimeError::new(
                format!("Undefined property {}.", field),
                line,
            ))
        })?;

        Ok(Value::Function(Rc::new(
            method.bind(&instance, self.this_sym),
        )))
    }

    fn lookup_superclass(&self, e: &SuperExpr, res: &Resolutions) -> Exec<Rc<Class>> {
        let value = res
            .distance(e.id)
            .and_then(|distance| self.env.get_at(distance, self.super_sym));
        match value {
            Some(Value::Class(superclass)) => Ok(superclass),
            _ => Err(RuntimeError::new(
                "Cannot use 'super' in a class with no superclass.",
                e.line,
            )
            .into()),
        }
    }

    // =========================================================================
    // NAME LOOKUP AND OUTPUT
    // =========================================================================

    /// Read a name: resolved uses index their frame by distance,
    /// unresolved uses are globals looked up by name.
    fn lookup_name(
        &self,
        id: ExprId,
        name: Symbol,
        line: u32,
        res: &Resolutions,
    ) -> Exec<Value> {
        let value = match res.distance(id) {
            Some(distance) => self.env.get_at(distance, name),
            None => self.env.get_global(name),
        };
        value.ok_or_else(|| {
            Unwind::from(RuntimeError::new(
                format!("Implicit Declaration of Variable {}.", name),
                line,
            ))
        })
    }

    fn write_line(&mut self, text: &str, line: u32) -> Exec<()> {
        writeln!(self.out, "{}", text)
            .map_err(|e| Unwind::from(RuntimeError::new(format!("Output failed: {}.", e), line)))
    }
}
