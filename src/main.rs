use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use um::bytecode::{assemble_with_symbols, disassemble_with_symbols, read_program, write_program,
                   Word};
use um::symboltable::SymbolTable;
use um::{UmError, UVM};

/// Runs a Universal Machine program with standard input and output as its byte streams.
#[derive(Parser, Debug)]
#[command(name = "um", version)]
struct Cli {
  /// The program binary, or assembly text with `--assemble`
  program: PathBuf,

  /// Assemble PROGRAM and write the binary to OUTPUT instead of running it
  #[arg(short, long, value_name = "OUTPUT")]
  assemble: Option<PathBuf>,

  /// Print an assembly listing of PROGRAM instead of running it. With `--assemble`, the
  /// listing is of the assembled words and carries their labels.
  #[arg(short, long)]
  disassemble: bool,

  /// Print the machine state to stderr once the run ends
  #[arg(long)]
  dump: bool,

  /// Print the number of instructions executed to stderr once the run ends
  #[arg(long)]
  stats: bool,
}

fn main() {
  let cli = Cli::parse();

  if let Err(e) = execute(&cli) {
    eprintln!("error: {}", e);
    process::exit(1);
  }
}

fn print_listing(words: &[Word], symbols: &SymbolTable) -> Result<(), UmError> {
  let stdout = io::stdout();
  let mut out = stdout.lock();
  for (address, line) in disassemble_with_symbols(words, symbols).iter().enumerate() {
    writeln!(out, "{:<32}% {}", line, address)?;
  }
  Ok(())
}

fn execute(cli: &Cli) -> Result<(), UmError> {
  if let Some(output) = &cli.assemble {
    let text             = fs::read_to_string(&cli.program)?;
    let (words, symbols) = assemble_with_symbols(&text)?;
    fs::write(output, write_program(&words))?;
    if cli.disassemble {
      print_listing(&words, &symbols)?;
    }
    return Ok(());
  }

  let program = read_program(&fs::read(&cli.program)?)?;

  if cli.disassemble {
    return print_listing(&program, &SymbolTable::new());
  }

  #[cfg(feature = "trace_computation")]
  eprintln!("Computation Tracing ENABLED");

  let stdin  = io::stdin();
  let stdout = io::stdout();
  let mut machine = UVM::new(program, stdin.lock(), stdout.lock());

  let result = machine.run();
  if cli.dump {
    eprintln!("{}", machine);
  }
  if cli.stats {
    eprintln!("{} instructions executed", machine.ncycles());
  }
  result
}
