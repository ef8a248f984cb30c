//! CLI end-to-end tests driving the `plox` binary.

use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn plox_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_plox"))
}

/// Write a script to a temp file and return the file handle.
fn script_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp script");
    file.write_all(source.as_bytes())
        .expect("failed to write temp script");
    file
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(plox_bin());
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage: plox"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(plox_bin());
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("plox "));
}

#[test]
fn test_cli_runs_script() {
    let script = script_file("print (3 * 4) + (17 - 3);");

    let mut cmd = Command::new(plox_bin());
    cmd.arg(script.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("26"));
}

#[test]
fn test_cli_compile_error_exit_code() {
    let script = script_file("var = 3;");

    let mut cmd = Command::new(plox_bin());
    cmd.arg(script.path());

    cmd.assert()
        .code(65)
        .stderr(predicate::str::contains("Syntax Error"));
}

#[test]
fn test_cli_runtime_error_exit_code() {
    let script = script_file("\"a\" - 1;");

    let mut cmd = Command::new(plox_bin());
    cmd.arg(script.path());

    cmd.assert().code(70).stderr(predicate::str::contains(
        "[ Line 1 ] Runtime Error: - Operator: Expected NUMBER",
    ));
}

#[test]
fn test_cli_missing_file() {
    let mut cmd = Command::new(plox_bin());
    cmd.arg("no_such_file.plox");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("could not read"));
}

#[test]
fn test_cli_unknown_option() {
    let mut cmd = Command::new(plox_bin());
    cmd.arg("--bogus");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("unknown option"));
}

#[test]
fn test_cli_emit_ast() {
    let script = script_file("print 1 + 2;");

    let mut cmd = Command::new(plox_bin());
    cmd.arg("--emit-ast").arg(script.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("( PRINT ( + ( 1 ) ( 2 ) ) )"));
}

#[test]
fn test_cli_emit_tokens() {
    let script = script_file("var x;");

    let mut cmd = Command::new(plox_bin());
    cmd.arg("--emit-tokens").arg(script.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Var").and(predicate::str::contains("Eof")));
}

#[test]
fn test_console_banner_and_echo() {
    let mut cmd = Command::new(plox_bin());
    cmd.write_stdin("1 + 2\nexit\n");

    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("WELCOME TO THE PLOX CONSOLE")
                .and(predicate::str::contains("Result:"))
                .and(predicate::str::contains("            3")),
        );
}

#[test]
fn test_console_state_persists_between_lines() {
    let mut cmd = Command::new(plox_bin());
    cmd.write_stdin("var x = 40;\nprint x + 2;\nexit\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("42"));
}

#[test]
fn test_console_survives_errors() {
    let mut cmd = Command::new(plox_bin());
    cmd.write_stdin("print ghost;\nprint \"ok\";\nexit\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ok"))
        .stderr(predicate::str::contains("Implicit Declaration of Variable ghost."));
}
