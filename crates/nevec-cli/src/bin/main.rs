use std::env;
use std::fs;
use std::process::ExitCode;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

struct Args {
    path: String,
    no_opt: bool,
}

fn parse_args(raw: &[String]) -> Option<Args> {
    let mut path = None;
    let mut no_opt = false;

    for arg in raw {
        if arg == "--no-opt" {
            no_opt = true;
        } else if path.is_none() {
            path = Some(arg.clone());
        } else {
            return None;
        }
    }

    Some(Args {
        path: path?,
        no_opt,
    })
}

fn output_path(source_path: &str) -> String {
    match source_path.strip_suffix(".neve") {
        Some(stem) => format!("{stem}.geada"),
        None => format!("{source_path}.geada"),
    }
}

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();

    let Some(args) = parse_args(&raw) else {
        eprintln!("usage: nevec <file> [--no-opt]");
        return ExitCode::FAILURE;
    };

    let source = match fs::read_to_string(&args.path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("nevec: couldn't read '{}': {e}", args.path);
            return ExitCode::FAILURE;
        }
    };

    let program = match nevec_syntax::parse(&source) {
        Ok(program) => program,
        Err(errors) => {
            for err in errors {
                eprintln!("{err}");
            }
            return ExitCode::FAILURE;
        }
    };

    if program.expr.contains_unknown() {
        eprintln!("nevec: '{}' did not type-check", args.path);
        return ExitCode::FAILURE;
    }

    let abs_path = match fs::canonicalize(&args.path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("nevec: couldn't resolve '{}': {e}", args.path);
            return ExitCode::FAILURE;
        }
    };
    let abs_path = abs_path.to_string_lossy();

    let bytes = nevec_core::compile(program, !args.no_opt, &abs_path);

    let out_path = output_path(&args.path);
    if let Err(e) = fs::write(&out_path, bytes) {
        eprintln!("nevec: couldn't write '{out_path}': {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
