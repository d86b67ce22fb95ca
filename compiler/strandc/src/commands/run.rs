//! The `run` command: evaluate a script file.

use strand_engine::{EngineConfig, EvalOptions, RetentionPolicy, ScriptEngine};
use strand_runtime::OutputSink;

use super::read_file;
use super::report::report_error;

pub const RUN_USAGE: &str =
    "strand run <file> [--interpreter] [--retention=<policy>] [--config=<json>]";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub path: String,
    pub interpreter: bool,
    pub retention: Option<RetentionPolicy>,
    pub config: Option<String>,
}

impl RunArgs {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut parsed = RunArgs::default();
        let mut path = None;
        for arg in args {
            if arg == "--interpreter" || arg == "-i" {
                parsed.interpreter = true;
            } else if let Some(policy) = arg.strip_prefix("--retention=") {
                parsed.retention = Some(policy.parse().map_err(|e| format!("{e}"))?);
            } else if let Some(config) = arg.strip_prefix("--config=") {
                parsed.config = Some(config.to_string());
            } else if arg.starts_with('-') {
                return Err(format!("unknown option '{arg}'"));
            } else if path.is_none() {
                path = Some(arg.clone());
            } else {
                return Err(format!("unexpected argument '{arg}'"));
            }
        }
        parsed.path = path.ok_or("missing file path")?;
        Ok(parsed)
    }
}

/// Run a script file. Returns the process exit code.
pub fn run_file(args: &RunArgs) -> i32 {
    let config = match &args.config {
        Some(path) => match EngineConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                return 1;
            }
        },
        None => EngineConfig::default(),
    };
    let config = if args.interpreter {
        config.with_interpreter_mode(true)
    } else {
        config
    };

    let engine = match ScriptEngine::with_config(config) {
        Ok(engine) => engine.with_output(OutputSink::stdout()),
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let source = match read_file(&args.path) {
        Ok(source) => source,
        Err(code) => return code,
    };

    let mut options = EvalOptions::new();
    if let Some(retention) = args.retention {
        options = options.with_retention(retention);
    }

    match engine.eval(&source, options) {
        Ok(_) => 0,
        Err(err) => {
            tracing::debug!(path = %args.path, "script failed");
            report_error(&args.path, &source, &err);
            1
        }
    }
}
