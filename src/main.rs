mod chunk;
mod compiler;
#[cfg(feature = "trace")]
mod debug;
mod errors;
mod lexer;
mod object;
mod table;
mod value;
mod virtual_machine;

#[cfg(test)]
mod tests;

use std::io::Write;
use std::{env, fs, io, process};

use virtual_machine::{InterpretResult, Vm};

fn main() {
   let args: Vec<String> = env::args().collect();

   match args.len() {
      1 => repl(),
      2 => run_file(&args[1]),
      _ => {
         eprintln!("Usage: glint [path]");
         process::exit(64);
      }
   }
}

/// Runs one source file to completion and exits with the status the
/// interpreter result maps to (spec §6's top-level contract).
fn run_file(path: &str) {
   let source = fs::read_to_string(path).unwrap_or_else(|err| {
      eprintln!("Could not read '{}': {}", path, err);
      process::exit(74);
   });

   let mut vm = Vm::new();
   let result = vm.interpret(&source);

   match result {
      InterpretResult::Ok => process::exit(0),
      InterpretResult::CompileError => process::exit(65),
      InterpretResult::RuntimeError => process::exit(70),
   }
}

/// A line-at-a-time prompt. One `Vm` lives for the whole session, so
/// globals and interned strings defined on one line are visible on the
/// next (spec §7: "this supports REPL use").
fn repl() {
   let mut vm = Vm::new();
   let stdin = io::stdin();
   let mut line = String::new();

   loop {
      print!("> ");
      io::stdout().flush().expect("failed to flush stdout");

      line.clear();
      let bytes_read = stdin.read_line(&mut line).expect("failed to read from stdin");
      if bytes_read == 0 {
         println!();
         break;
      }

      vm.interpret(&line);
   }
}
