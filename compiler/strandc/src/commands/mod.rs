//! CLI commands.

mod repl;
mod report;
mod run;
mod translate;

pub use repl::repl;
pub use run::{run_file, RunArgs, RUN_USAGE};
pub use translate::{translate_file, TranslateArgs, TRANSLATE_USAGE};

/// Read a file, printing an error and returning the exit code on failure.
fn read_file(path: &str) -> Result<String, i32> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })
}
