//! Diagnostics reported by the compiler and the virtual machine.
//!
//! Compile-time diagnostics accumulate into a list so that one `interpret`
//! call can surface every syntax error it finds instead of bailing out on
//! the first one. Runtime diagnostics are always fatal for the current
//! `interpret` call (see `Vm::interpret`).

use std::fmt;

/// A single compile-time error, anchored at a source line.
#[derive(Debug, Clone)]
pub struct ErrorReport {
   pub line: usize,
   pub message: String,
}

impl fmt::Display for ErrorReport {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "[line {}] {}", self.line, self.message)
   }
}

/// Prints every accumulated compile error to standard error.
pub fn report_compile_errors(errors: &[ErrorReport]) {
   for report in errors {
      eprintln!("\x1b[31;1mSyntaxError\x1b[0m\x1b[1m {}\x1b[0m", report);
   }
}

/// The categories of runtime error the VM can raise. Kept narrow on purpose:
/// spec §7 only names these three families of runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorType {
   /// An operand had the wrong type for the operator (`-true`, `1 + "a"`, ...).
   TypeError,
   /// A global was read or assigned before it was ever defined.
   ReferenceError,
   /// The value stack grew past its fixed capacity.
   StackOverflow,
}

impl fmt::Display for RuntimeErrorType {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let name = match self {
         RuntimeErrorType::TypeError => "TypeError",
         RuntimeErrorType::ReferenceError => "ReferenceError",
         RuntimeErrorType::StackOverflow => "StackOverflow",
      };
      write!(f, "{}", name)
   }
}

/// Prints a runtime error to standard error in the format spec §6 mandates:
/// a free-form message followed by `"[line N] in script"`.
pub fn report_runtime_error(kind: RuntimeErrorType, message: &str, line: usize) {
   eprintln!("\x1b[31;1m{}:\x1b[0m\x1b[1m {}\x1b[0m", kind, message);
   eprintln!("[line {}] in script", line);
}
