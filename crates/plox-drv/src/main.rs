//! The `plox` command line entry point.
//!
//! `plox <script>` runs a file and exits 0/65/70 for success / compile
//! error / runtime error. With no script, an interactive console starts:
//! expression results echo, globals persist between lines, and `exit`
//! quits. `--emit-tokens` and `--emit-ast` dump intermediate stages
//! instead of executing.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use plox_drv::{Config, Emit, Session};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {:#}", error);
            std::process::exit(1);
        }
    }
}

fn run() -> anyhow::Result<i32> {
    let mut emit = Emit::Run;
    let mut script: Option<PathBuf> = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--emit-tokens" => emit = Emit::Tokens,
            "--emit-ast" => emit = Emit::Ast,
            "--help" | "-h" => {
                print_usage();
                return Ok(0);
            }
            "--version" | "-V" => {
                println!("plox {}", env!("CARGO_PKG_VERSION"));
                return Ok(0);
            }
            _ if arg.starts_with('-') => {
                anyhow::bail!("unknown option '{}' (try --help)", arg)
            }
            _ => {
                if script.is_some() {
                    anyhow::bail!("expected a single script path");
                }
                script = Some(PathBuf::from(arg));
            }
        }
    }

    match script {
        Some(path) => run_file(&path, emit),
        None => run_console(emit),
    }
}

fn run_file(path: &PathBuf, emit: Emit) -> anyhow::Result<i32> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let mut session = Session::new(Config { emit, repl: false });
    let status = session.run(&source);
    Ok(status.exit_code())
}

fn run_console(emit: Emit) -> anyhow::Result<i32> {
    println!("WELCOME TO THE PLOX CONSOLE");
    println!();

    let mut session = Session::new(Config { emit, repl: true });
    let stdin = io::stdin();

    loop {
        print!(">> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // end of input
        }
        let line = line.trim();
        if line == "exit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        session.run(line);
    }

    Ok(0)
}

fn print_usage() {
    println!("Usage: plox [options] [script]");
    println!();
    println!("Runs a Plox script, or starts the interactive console when");
    println!("no script is given.");
    println!();
    println!("Options:");
    println!("  --emit-tokens   print the token stream and stop");
    println!("  --emit-ast      print the parsed tree and stop");
    println!("  -h, --help      print this help");
    println!("  -V, --version   print the version");
}
