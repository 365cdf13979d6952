//! The `minilang` driver: reads a source file, compiles it, and runs it.
//!
//! A single clap-derive `Cli` struct drives everything: there's only one
//! mode of operation (run a file), plus a couple of flags for disassembly
//! and banner suppression.

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

/// Run a MiniLang program.
#[derive(Debug, Parser)]
#[command(name = "minilang", version, about)]
struct Cli {
  /// Path to a MiniLang source file.
  path: String,

  /// Print the compiled chunk's disassembly to stderr before running it.
  #[arg(long)]
  dump_chunk: bool,

  /// Suppress the startup banner.
  #[arg(long)]
  no_banner: bool,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  if !cli.no_banner {
    println!("MiniLang {}", env!("CARGO_PKG_VERSION"));
  }

  match run(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
  let source = fs::read_to_string(&cli.path)?;

  let tokens = minilang::lexer::Lexer::new(&source).scan()?;
  let program = minilang::parser::parse(tokens)?;
  let (chunk, functions) = minilang::compiler::compile(&program)?;

  if cli.dump_chunk {
    eprint!("{}", chunk.disassemble("main"));
    for (name, func) in &functions {
      eprint!("{}", func.chunk.disassemble(name));
    }
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();
  let stdin = io::stdin();
  let mut input = stdin.lock();
  let mut vm = minilang::vm::Vm::new(chunk, functions, &mut out, &mut input);
  vm.run()?;
  out.flush()?;
  Ok(())
}
