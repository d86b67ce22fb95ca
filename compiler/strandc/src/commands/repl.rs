//! The `repl` command: an interpreter-mode session over stdin.

use std::io::{self, BufRead, Write};

use strand_engine::{EngineConfig, EvalOptions, ScriptEngine};
use strand_runtime::{OutputSink, Value};

use super::report::report_error;

const PROMPT: &str = "strand> ";
const SOURCE_NAME: &str = "<repl>";

/// What a line of REPL input asks for.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Input<'a> {
    Empty,
    Quit,
    Reset,
    Eval(&'a str),
    Unknown(&'a str),
}

pub(super) fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Empty,
        ":quit" | ":q" | ":exit" => Input::Quit,
        ":reset" => Input::Reset,
        command if command.starts_with(':') => Input::Unknown(command),
        source => Input::Eval(source),
    }
}

/// Run the REPL until `:quit` or end of input. Returns the exit code.
pub fn repl() -> i32 {
    let config = EngineConfig::new().with_interpreter_mode(true);
    let engine = match ScriptEngine::with_config(config) {
        Ok(engine) => engine.with_output(OutputSink::stdout()),
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{PROMPT}");
        if io::stdout().flush().is_err() {
            return 1;
        }
        let Some(Ok(line)) = lines.next() else {
            println!();
            return 0;
        };

        match classify(&line) {
            Input::Empty => {}
            Input::Quit => return 0,
            Input::Reset => match engine.reset() {
                Ok(()) => println!("session reset"),
                Err(e) => eprintln!("error: {e}"),
            },
            Input::Unknown(command) => eprintln!("error: unknown command '{command}'"),
            Input::Eval(source) => match engine.eval(source, EvalOptions::new()) {
                Ok(Value::Null) => {}
                Ok(value) => println!("{value}"),
                Err(err) => report_error(SOURCE_NAME, source, &err),
            },
        }
    }
}
