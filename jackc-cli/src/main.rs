//! Entrypoint for CLI
use std::{
    env,
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use jackc::{
    lex::{Lexer, TokenKind},
    prelude::*,
    IMPL_VERSION,
};
use log::{debug, error, info};

static USAGE: &str = r#"
usage: jackc CMD PATH

commands:
    build   Compile a .jack file, or every .jack file in a directory,
            writing a .vm file next to each source
    tokens  Print the tokens of a .jack file

examples:
    jackc build Square/
    jackc build Main.jack
    jackc tokens Main.jack

Log verbosity is controlled with RUST_LOG.
"#;

/// Source files to compile, in a stable order.
fn discover_sources(path: &Path) -> JackResult<Vec<PathBuf>> {
    let mut sources = if path.is_dir() {
        let mut files = vec![];
        for entry in fs::read_dir(path)? {
            let file = entry?.path();
            if file.is_file() && is_jack_file(&file) {
                files.push(file);
            }
        }
        files
    } else if is_jack_file(path) {
        vec![path.to_path_buf()]
    } else {
        vec![]
    };

    if sources.is_empty() {
        return Err(JackError::NoSources(path.to_path_buf()));
    }

    sources.sort();
    Ok(sources)
}

fn is_jack_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == "jack").unwrap_or(false)
}

fn read_source(path: &Path) -> JackResult<String> {
    let file_bytes = fs::read(path)?;
    Ok(std::str::from_utf8(&file_bytes)?.to_string())
}

/// Class name a file must declare.
fn class_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compile the unit, returning `false` if anything failed.
fn run_build(path: impl AsRef<Path>) -> JackResult<bool> {
    let sources = discover_sources(path.as_ref())?;
    info!("compiling {} file(s)", sources.len());

    let mut compiler = Compiler::new(CompilerConf::default());
    let mut failed = 0;

    for source_path in &sources {
        let source_code = read_source(source_path)?;
        let class = class_name(source_path);

        let output = compiler.compile_file(&class, &source_code);
        if !output.is_ok() {
            // Already logged by the compiler.
            failed += 1;
            continue;
        }

        let mut text = String::new();
        write_vm(&mut text, &output.code)?;

        let out_path = source_path.with_extension("vm");
        fs::write(&out_path, text)?;
        debug!("wrote {}", out_path.display());
    }

    // Unit errors are logged by the compiler.
    let validated = match compiler.finish() {
        Ok(registry) => {
            debug!(
                "unit references {} class(es), {} subroutine(s)",
                registry.classes().count(),
                registry.subroutines().count()
            );
            true
        }
        Err(_) => false,
    };

    if failed > 0 {
        error!("{} of {} file(s) failed to compile", failed, sources.len());
    }
    if failed == 0 && validated {
        info!("done");
    }

    Ok(failed == 0 && validated)
}

fn run_tokens(filepath: impl AsRef<Path>) -> JackResult<()> {
    let source_code = read_source(filepath.as_ref())?;
    let mut lexer = Lexer::new(source_code.as_str());

    println!(" line | offset:len | token                | fragment");
    loop {
        let token = lexer.next_token();
        let line = token.line;
        let offset = token.span.index;
        let len = token.span.size;
        let kind = token.kind.to_string();
        let fragment = token.span.fragment(lexer.source_code());
        println!("{line:5} | {offset:6}:{len: <3} | {kind: <20} | {fragment:?}");

        if matches!(token.kind, TokenKind::EOF) {
            break;
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    let result = match parse_args() {
        Some(Cmd::Build { path }) => run_build(path),
        Some(Cmd::Tokens { filepath }) => run_tokens(filepath).map(|_| true),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!("{err}");
            std::process::exit(1)
        }
    }
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    let cmd = args.next()?;
    let arg = args.next()?;

    match cmd.as_str() {
        "build" => Some(Cmd::Build { path: arg }),
        "tokens" => Some(Cmd::Tokens { filepath: arg }),
        _ => None,
    }
}

fn print_usage() {
    println!("jackc v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Compile a file or directory
    Build { path: String },
    /// Dump the token stream
    Tokens { filepath: String },
}
