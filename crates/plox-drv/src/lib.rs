//! plox-drv - Pipeline driver for the Plox interpreter.
//!
//! Orchestrates the staged pipeline: tokenize, parse, resolve, interpret.
//! Each stage is gated on the previous one reporting no errors; a gate
//! failure reports the collected diagnostics and skips everything
//! downstream. A [`Session`] owns the interpreter, so globals persist
//! across `run` calls - that is what keeps a console session stateful.
//!
//! Exit-code mapping for the command line wrapper: 0 on success, 65 when
//! any compile-time (lex/parse/resolve) error was reported, 70 when a
//! runtime error occurred.

use std::io::{self, Write};

use plox_int::Interpreter;
use plox_par::{Parser, TreePrinter};
use plox_sem::Resolver;
use plox_util::{Diagnostic, Handler};

/// What the driver should produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Emit {
    /// Execute the program (the default).
    #[default]
    Run,
    /// Dump the token stream and stop.
    Tokens,
    /// Dump the parsed tree and stop.
    Ast,
}

/// Driver configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// Output selection.
    pub emit: Emit,
    /// Console mode: expression statements echo their value.
    pub repl: bool,
}

/// Outcome of one `run` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunStatus {
    /// A lexical, syntax, or static error was reported.
    pub had_error: bool,
    /// A runtime error was reported.
    pub had_runtime_error: bool,
}

impl RunStatus {
    pub fn success() -> Self {
        Self {
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Process exit code for a file run.
    pub fn exit_code(&self) -> i32 {
        if self.had_error {
            65
        } else if self.had_runtime_error {
            70
        } else {
            0
        }
    }
}

/// One interpreter session. Program output goes to the interpreter's
/// sink; diagnostics are rendered to stderr and kept for inspection.
pub struct Session<W: Write = io::Stdout> {
    config: Config,
    interpreter: Interpreter<W>,
    diagnostics: Vec<Diagnostic>,
}

impl Session<io::Stdout> {
    /// A session writing program output to stdout.
    pub fn new(config: Config) -> Self {
        Self::with_output(config, io::stdout())
    }
}

impl<W: Write> Session<W> {
    /// A session writing program output to `out`.
    pub fn with_output(config: Config, out: W) -> Self {
        let mut interpreter = Interpreter::with_output(out);
        interpreter.set_repl_echo(config.repl);
        Self {
            config,
            interpreter,
            diagnostics: Vec::new(),
        }
    }

    /// Run one source text through the staged pipeline.
    pub fn run(&mut self, source: &str) -> RunStatus {
        self.diagnostics.clear();
        let handler = Handler::new();

        let tokens = plox_lex::tokenize(source, &handler);
        if handler.has_errors() {
            return self.fail_compile(&handler);
        }
        if self.config.emit == Emit::Tokens {
            for token in &tokens {
                println!("{:?} @ line {}", token.token, token.span.line);
            }
            return RunStatus::success();
        }

        let program = Parser::new(tokens, &handler).parse();
        if handler.has_errors() {
            return self.fail_compile(&handler);
        }
        if self.config.emit == Emit::Ast {
            println!("{}", TreePrinter.print_program(&program));
            return RunStatus::success();
        }

        let resolutions = Resolver::new(&handler).resolve(&program);
        if handler.has_errors() {
            return self.fail_compile(&handler);
        }

        let had_runtime_error = self.interpreter.interpret(&program, &resolutions, &handler);
        self.report(&handler);
        RunStatus {
            had_error: false,
            had_runtime_error,
        }
    }

    /// Diagnostics reported by the most recent `run`.
    pub fn last_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the session, returning the interpreter's output sink.
    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }

    fn fail_compile(&mut self, handler: &Handler) -> RunStatus {
        self.report(handler);
        RunStatus {
            had_error: true,
            had_runtime_error: false,
        }
    }

    fn report(&mut self, handler: &Handler) {
        self.diagnostics = handler.take();
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic.render());
        }
    }
}
