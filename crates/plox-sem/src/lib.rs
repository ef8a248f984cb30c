//! plox-sem - Static resolution for Plox.
//!
//! A single recursive walk over the AST, run after parsing and before
//! execution. For every `Identifier`, `Assign`, `this`, and `super` use it
//! computes the number of lexical scopes between the use and its binding
//! and records it in a [`Resolutions`] map keyed by [`ExprId`]. The
//! interpreter consults that map for every resolved access; names that
//! are not in the map are globals and are looked up by name at run time.
//!
//! The walk also diagnoses illegal constructs that are visible without
//! executing anything: `break` outside a loop, `return` outside a
//! function, `this`/`super` outside a class, `__init__` declared outside
//! a class, and reading a variable inside its own initializer.

pub mod scope;

pub use scope::{BindingState, ScopeStack};

use plox_par::{Block, Expr, ExprId, FuncDecl, Program, Stmt};
use plox_util::{FxHashMap, Handler, Span, Stage, Symbol};

/// The resolver's output: scope distances keyed by expression id.
///
/// Resolution is idempotent; resolving the same tree twice yields equal
/// maps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolutions {
    distances: FxHashMap<ExprId, usize>,
}

impl Resolutions {
    /// The recorded scope distance for a node, if the node resolved to a
    /// local binding. `None` means the name is a global.
    pub fn distance(&self, id: ExprId) -> Option<usize> {
        self.distances.get(&id).copied()
    }

    /// Number of resolved references.
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// The static resolution pass.
pub struct Resolver<'a> {
    handler: &'a Handler,

    /// Static mirror of the runtime frame stack (globals excluded).
    scopes: ScopeStack,

    /// Declared/defined states for top-level names. Used only for the
    /// self-referential-initializer check; top-level references are never
    /// given distances.
    globals: FxHashMap<Symbol, BindingState>,

    /// Distances collected so far.
    distances: FxHashMap<ExprId, usize>,

    /// Nesting depth of function bodies.
    function_depth: usize,

    /// Nesting depth of class bodies.
    class_depth: usize,

    /// Nesting depth of loops within the current function.
    loop_depth: usize,

    this_sym: Symbol,
    super_sym: Symbol,
}

impl<'a> Resolver<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        Self {
            handler,
            scopes: ScopeStack::new(),
            globals: FxHashMap::default(),
            distances: FxHashMap::default(),
            function_depth: 0,
            class_depth: 0,
            loop_depth: 0,
            this_sym: Symbol::intern("this"),
            super_sym: Symbol::intern("super"),
        }
    }

    /// Resolve a whole program, consuming the resolver.
    pub fn resolve(mut self, program: &Program) -> Resolutions {
        for stmt in program {
            self.resolve_stmt(stmt);
        }
        Resolutions {
            distances: self.distances,
        }
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(s) => self.resolve_expr(&s.expr),
            Stmt::Print(s) => self.resolve_expr(&s.expr),
            Stmt::Var(var) => {
                // Declared-but-not-defined while the initializer resolves,
                // so `var x = x;` is caught.
                self.declare(var.name);
                if let Some(init) = &var.init {
                    self.resolve_expr(init);
                }
                self.define(var.name);
            }
            Stmt::Block(block) => {
                self.scopes.push();
                self.resolve_block_stmts(block);
                self.scopes.pop();
            }
            Stmt::If(s) => {
                self.resolve_expr(&s.cond);
                self.resolve_block(&s.then_block);
                if let Some(else_block) = &s.else_block {
                    self.resolve_block(else_block);
                }
            }
            Stmt::While(s) => {
                self.resolve_expr(&s.cond);
                self.loop_depth += 1;
                self.resolve_block(&s.body);
                self.loop_depth -= 1;
            }
            Stmt::Func(func) => {
                self.declare(func.name);
                self.define(func.name);
                self.resolve_function(func);
            }
            Stmt::Return(s) => {
                if self.function_depth == 0 {
                    self.error("Cannot return from top-level code.", s.line);
                }
                if let Some(value) = &s.value {
                    self.resolve_expr(value);
                }
            }
            Stmt::Break(s) => {
                if self.loop_depth == 0 {
                    self.error("Cannot use 'break' outside of a loop.", s.line);
                }
            }
            Stmt::Class(class) => {
                self.declare(class.name);
                if let Some(superclass) = &class.superclass {
                    self.resolve_name_use(superclass.id, superclass.name, superclass.line);
                }

                self.class_depth += 1;

                // Static scopes mirror the runtime closure layout: methods
                // of a subclass see a `super` frame below their `this`
                // frame. Method names themselves are not bindings; the
                // runtime frames hold only `this` and `super`.
                let has_super = class.superclass.is_some();
                if has_super {
                    self.scopes.push();
                    self.scopes.define(self.super_sym);
                }
                self.scopes.push();
                self.scopes.define(self.this_sym);

                for method in &class.methods {
                    self.resolve_function(method);
                }

                self.scopes.pop();
                if has_super {
                    self.scopes.pop();
                }

                self.class_depth -= 1;
                self.define(class.name);
            }
        }
    }

    /// Resolve a block that introduces its own scope.
    fn resolve_block(&mut self, block: &Block) {
        self.scopes.push();
        self.resolve_block_stmts(block);
        self.scopes.pop();
    }

    fn resolve_block_stmts(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.resolve_stmt(stmt);
        }
    }

    /// Resolve a function body: one scope for parameters, then the body
    /// block's own scope, matching the frames the interpreter pushes at
    /// call time. Loop depth resets for the duration so a `break` cannot
    /// cross a function boundary.
    fn resolve_function(&mut self, func: &FuncDecl) {
        if func.is_initializer && self.class_depth == 0 {
            self.error("Cannot declare '__init__' outside of a class.", func.line);
        }

        self.function_depth += 1;
        let enclosing_loop_depth = std::mem::replace(&mut self.loop_depth, 0);

        self.scopes.push();
        for &param in &func.params {
            self.scopes.declare(param);
            self.scopes.define(param);
        }
        self.resolve_block(&func.body);
        self.scopes.pop();

        self.loop_depth = enclosing_loop_depth;
        self.function_depth -= 1;
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) | Expr::Construct(_) => {}
            Expr::Grouping(e) => self.resolve_expr(&e.expr),
            Expr::Unary(e) => self.resolve_expr(&e.operand),
            Expr::Binary(e) => {
                self.resolve_expr(&e.left);
                self.resolve_expr(&e.right);
            }
            Expr::Logical(e) => {
                self.resolve_expr(&e.left);
                self.resolve_expr(&e.right);
            }
            Expr::Identifier(e) => self.resolve_name_use(e.id, e.name, e.line),
            Expr::Assign(e) => {
                self.resolve_expr(&e.value);
                self.resolve_name_use(e.id, e.name, e.line);
            }
            Expr::Call(e) => {
                self.resolve_expr(&e.callee);
                for arg in &e.args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get(e) => self.resolve_expr(&e.object),
            Expr::Set(e) => {
                self.resolve_expr(&e.value);
                self.resolve_expr(&e.object);
            }
            Expr::This(e) => {
                if self.class_depth == 0 {
                    self.error("Cannot use 'this' outside of a class.", e.line);
                    return;
                }
                self.resolve_local(e.id, self.this_sym);
            }
            Expr::Super(e) => {
                if self.class_depth == 0 {
                    self.error("Cannot use 'super' outside of a class.", e.line);
                    return;
                }
                self.resolve_local(e.id, self.super_sym);
            }
        }
    }

    // =========================================================================
    // NAME RESOLUTION
    // =========================================================================

    /// Resolve a read or write of `name`, recording a distance when the
    /// name lives on the static scope stack.
    fn resolve_name_use(&mut self, id: ExprId, name: Symbol, line: u32) {
        if self.scopes.is_empty() {
            // Top level: no distances, but the declared/defined side table
            // still catches a self-referential initializer.
            if self.globals.get(&name) == Some(&BindingState::Declared) {
                self.error("Can't read local variable in its own initializer.", line);
            }
            return;
        }

        if self.scopes.innermost_state(name) == Some(BindingState::Declared) {
            self.error("Can't read local variable in its own initializer.", line);
            return;
        }

        self.resolve_local(id, name);
    }

    /// Record the scope distance for `name` if it is on the stack;
    /// otherwise leave the node unresolved (a global).
    fn resolve_local(&mut self, id: ExprId, name: Symbol) {
        if let Some(distance) = self.scopes.distance_of(name) {
            self.distances.insert(id, distance);
        }
    }

    fn declare(&mut self, name: Symbol) {
        if self.scopes.is_empty() {
            self.globals.insert(name, BindingState::Declared);
        } else {
            self.scopes.declare(name);
        }
    }

    fn define(&mut self, name: Symbol) {
        if self.scopes.is_empty() {
            self.globals.insert(name, BindingState::Defined);
        } else {
            self.scopes.define(name);
        }
    }

    fn error(&mut self, message: &str, line: u32) {
        self.handler
            .error(Stage::Static, message, Span::point(line));
    }
}
