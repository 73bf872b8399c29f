//! Top-level entry used by command-line hosts.

use colored::Colorize;

use crate::ast::Program;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;

/// Exit status for a program that failed with a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 1;

/// One-line report for an error that escaped the program.
pub fn render_error(err: &RuntimeError) -> String {
    format!(
        "{} {} {}",
        "error".red().bold(),
        format!("[{}]", err.code()).dimmed(),
        err.message()
    )
}

/// Run `program` on a fresh interpreter writing to stdout. Returns the process exit code.
pub fn run(program: &Program) -> i32 {
    RuntimeConfig::from_env().apply();
    run_with(&mut Interpreter::stdout(), program)
}

/// Run `program` on an existing interpreter, reporting failure on stderr.
pub fn run_with(interpreter: &mut Interpreter, program: &Program) -> i32 {
    match interpreter.run(program) {
        Ok(_) => 0,
        Err(err) => {
            tracing::debug!(code = err.code(), line = err.line(), "program failed");
            eprintln!("{}", render_error(&err));
            EXIT_RUNTIME_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::{call, expr_stmt, ident, int};
    use crate::error::ErrorKind;
    use crate::interpreter::environment::{OutputBuffer, Scope};
    use crate::span::Span;

    #[test]
    fn test_render_error_plain() {
        colored::control::set_override(false);
        let err = RuntimeError::new(ErrorKind::DivideByZero, Span::at_line(3));
        let text = render_error(&err);
        assert!(text.starts_with("error [DIVIDE_BY_ZERO]"));
        assert!(text.contains("line 3"));
    }

    #[test]
    fn test_run_with_exit_codes() {
        let buffer = OutputBuffer::new();
        let mut interp = Interpreter::new(Scope::with_buffer(&buffer));
        let ok = Program::new(vec![expr_stmt(call(ident("println"), vec![int(1)]))]);
        assert_eq!(run_with(&mut interp, &ok), 0);
        assert_eq!(buffer.contents(), "1\n");

        let failing = Program::new(vec![expr_stmt(ident("missing"))]);
        assert_eq!(run_with(&mut interp, &failing), EXIT_RUNTIME_ERROR);
    }
}
