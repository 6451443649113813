//! Tarn interpreter CLI
//!
//! Main entry point for the `tarn` command.

use std::path::{Path, PathBuf};

use clap::Parser;
use miette::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tarn::{Compiler, Env, Error, Form};

#[derive(Parser)]
#[command(name = "tarn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The Tarn programming language", long_about = None)]
struct Cli {
    /// Script to run; starts the REPL when omitted
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Arguments exposed to the script as *ARGV*
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,

    /// Enable unit-level tracing
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so they never mix with
    // program output.
    let filter = if cli.verbose {
        EnvFilter::new("tarn=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let vm = Compiler::new();
    let env = tarn::core::top_env(&vm).map_err(|e| miette::miette!("{e}"))?;

    match cli.script {
        Some(script) => run_script(&script, &cli.args, &env, &vm),
        None => repl(&env, &vm),
    }
}

fn run_script(script: &Path, args: &[String], env: &Env, vm: &Compiler) -> Result<()> {
    let argv = args.iter().map(Form::string).collect();
    env.define("*ARGV*", Form::list(argv));
    let load = Form::list(vec![
        Form::symbol("load-file"),
        Form::string(script.display().to_string()),
    ]);
    vm.eval(&load, env).map_err(|e| miette::miette!("{e}"))?;
    Ok(())
}

fn repl(env: &Env, vm: &Compiler) -> Result<()> {
    println!("Tarn v{}", tarn::VERSION);

    let mut editor = DefaultEditor::new().map_err(|e| miette::miette!("readline: {e}"))?;
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("user> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(&line);
                }
                match tarn::rep(&line, env, vm) {
                    Ok(printed) => println!("{printed}"),
                    Err(Error::Blank) => {}
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(miette::miette!("readline: {e}")),
        }
    }

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
    Ok(())
}

/// History lives beside the user's other dotfiles; a missing home
/// directory just disables persistence.
fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| Path::new(&home).join(".tarn-history"))
}
