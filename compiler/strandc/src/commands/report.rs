//! Error reporting for the terminal.

use ariadne::{Color, Label, Report, ReportKind, Source};
use strand_engine::EngineError;
use strand_runtime::CompileError;

/// Print an engine error. Compile errors get a source snippet.
pub fn report_error(path: &str, source: &str, err: &EngineError) {
    match err {
        EngineError::Compilation(compile) => report_compile_error(path, source, compile),
        EngineError::Runtime(eval) => {
            eprintln!("error: {eval}");
            for (depth, frame) in eval.backtrace.frames().iter().enumerate() {
                eprintln!("  {depth}: in {frame}");
            }
        }
        other => eprintln!("error: {other}"),
    }
}

fn report_compile_error(path: &str, source: &str, err: &CompileError) {
    let range = err.span.to_range();
    let start = char_offset(source, range.start);
    let end = char_offset(source, range.end).max(start + 1);

    let printed = Report::build(ReportKind::Error, path, start)
        .with_message("compilation failed")
        .with_label(
            Label::new((path, start..end))
                .with_message(&err.message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((path, Source::from(source)));
    if printed.is_err() {
        eprintln!("error: {err}");
    }
}

/// Ariadne positions are in characters, spans are in bytes.
fn char_offset(source: &str, byte: usize) -> usize {
    let byte = byte.min(source.len());
    source
        .char_indices()
        .take_while(|(index, _)| *index < byte)
        .count()
}
