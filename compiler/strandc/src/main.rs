//! Strand CLI
//!
//! Runs scripts, hosts an interpreter-mode REPL and translates structural
//! programs into source text.

mod commands;

use commands::{repl, run_file, translate_file, RunArgs, TranslateArgs, RUN_USAGE, TRANSLATE_USAGE};

fn main() {
    strand_engine::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let code = match args[1].as_str() {
        "run" => match RunArgs::parse(&args[2..]) {
            Ok(run_args) => run_file(&run_args),
            Err(message) => usage_error(&message, RUN_USAGE),
        },
        "repl" => repl(),
        "translate" => match TranslateArgs::parse(&args[2..]) {
            Ok(translate_args) => translate_file(&translate_args),
            Err(message) => usage_error(&message, TRANSLATE_USAGE),
        },
        "help" | "--help" | "-h" => {
            print_usage();
            0
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            print_usage();
            1
        }
    };
    std::process::exit(code);
}

fn usage_error(message: &str, usage: &str) -> i32 {
    eprintln!("error: {message}");
    eprintln!("Usage: {usage}");
    1
}

fn print_usage() {
    println!("Strand script engine");
    println!();
    println!("Usage: strand <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file>                Run a script");
    println!("      --interpreter         Keep top-level variables in the session");
    println!("      --retention=<policy>  permanent, soft, weak or ephemeral");
    println!("      --config=<json>       Engine configuration file");
    println!("  repl                      Interactive session (interpreter mode)");
    println!("  translate <program.json>  Print a structural program as source text");
    println!("      --dialect=<name>      strand (default) or python");
    println!("      --root=<name>         Root variable (default: the traversal source, or g)");
    println!("  help                      Show this message");
    println!();
    println!("Set RUST_LOG (for example RUST_LOG=strand_engine=debug) for tracing output.");
}
