//! The `translate` command: print a structural program as source text.

use strand_engine::{root_variable, Dialect, ScriptEngine};
use strand_ir::StructuralProgram;

use super::read_file;

pub const TRANSLATE_USAGE: &str =
    "strand translate <program.json> [--dialect=strand|python] [--root=<name>]";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslateArgs {
    pub path: String,
    pub dialect: Dialect,
    pub root: Option<String>,
}

impl TranslateArgs {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut parsed = TranslateArgs::default();
        let mut path = None;
        for arg in args {
            if let Some(dialect) = arg.strip_prefix("--dialect=") {
                parsed.dialect = dialect.parse().map_err(|e| format!("{e}"))?;
            } else if let Some(root) = arg.strip_prefix("--root=") {
                if root.is_empty() {
                    return Err("--root needs a variable name".to_string());
                }
                parsed.root = Some(root.to_string());
            } else if arg.starts_with('-') {
                return Err(format!("unknown option '{arg}'"));
            } else if path.is_none() {
                path = Some(arg.clone());
            } else {
                return Err(format!("unexpected argument '{arg}'"));
            }
        }
        parsed.path = path.ok_or("missing program file")?;
        Ok(parsed)
    }
}

/// Translate a JSON program file. Returns the process exit code.
pub fn translate_file(args: &TranslateArgs) -> i32 {
    let json = match read_file(&args.path) {
        Ok(json) => json,
        Err(code) => return code,
    };
    let program: StructuralProgram = match serde_json::from_str(&json) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: '{}' is not a structural program: {e}", args.path);
            return 1;
        }
    };

    let engine = ScriptEngine::new();
    let root = args.root.as_deref().unwrap_or_else(|| root_variable(&program));
    match engine.translate_with(&program, args.dialect, root) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}
