//! The stack-based virtual machine from spec §4.5.

mod run;

use crate::chunk::op_codes::OpCode;
use crate::chunk::Chunk;
use crate::compiler;
use crate::errors::{report_compile_errors, report_runtime_error, RuntimeErrorType};
use crate::object::Heap;
use crate::table::Table;
use crate::value::Value;

/// Fixed stack capacity. Unlike the source this was built from — which has
/// no bounds check at all — overflowing this raises a `StackOverflow`
/// runtime error instead of corrupting memory (spec §5: "Implementers
/// should add a bound check").
const STACK_MAX: usize = 256;

/// The three outcomes `interpret` can produce, handed back to the driver
/// so it can pick an exit code.
pub enum InterpretResult {
   Ok,
   CompileError,
   RuntimeError,
}

/// A runtime failure, carrying everything `interpret` needs to report it:
/// the error category, a message, and the source line it happened at.
struct RuntimeFault {
   kind: RuntimeErrorType,
   message: String,
   line: usize,
}

/// Process-wide interpreter state. `globals` and `heap` deliberately persist
/// across `interpret` calls on the same `Vm` — a REPL relies on variables
/// and interned strings from one line surviving into the next.
pub struct Vm {
   chunk: Chunk,
   ip: usize,
   stack: Vec<Value>,
   heap: Heap,
   globals: Table<Value>,
   /// The source line of the instruction currently being executed, kept up
   /// to date at the top of the dispatch loop so a fault raised mid-op can
   /// report where it happened without re-deriving it from `ip`.
   current_line: usize,
}

impl Vm {
   pub fn new() -> Self {
      Self {
         chunk: Chunk::new(),
         ip: 0,
         stack: Vec::with_capacity(STACK_MAX),
         heap: Heap::new(),
         globals: Table::new(),
         current_line: 0,
      }
   }

   /// Compiles `source` and, if that succeeds, runs it to completion.
   /// Diagnostics are written to standard error as a side effect; the
   /// return value only tells the driver which exit code to use.
   pub fn interpret(&mut self, source: &str) -> InterpretResult {
      let chunk = match compiler::compile(source, &mut self.heap) {
         Ok(chunk) => chunk,
         Err(errors) => {
            report_compile_errors(&errors);
            return InterpretResult::CompileError;
         }
      };

      self.chunk = chunk;
      self.ip = 0;
      self.stack.clear();

      #[cfg(feature = "trace")]
      crate::debug::disassemble_chunk(&self.chunk, "script", &self.heap);

      match self.run() {
         Ok(()) => InterpretResult::Ok,
         Err(fault) => {
            report_runtime_error(fault.kind, &fault.message, fault.line);
            self.stack.clear();
            InterpretResult::RuntimeError
         }
      }
   }

   fn fault(&self, kind: RuntimeErrorType, message: String) -> RuntimeFault {
      RuntimeFault {
         kind,
         message,
         line: self.current_line,
      }
   }

   // ---- stack ----------------------------------------------------------

   fn push(&mut self, value: Value) -> Result<(), RuntimeFault> {
      if self.stack.len() >= STACK_MAX {
         return Err(self.fault(RuntimeErrorType::StackOverflow, "Stack overflow.".to_string()));
      }
      self.stack.push(value);
      Ok(())
   }

   fn pop(&mut self) -> Value {
      self.stack.pop().expect("the compiler only emits balanced push/pop sequences")
   }

   fn peek(&self, distance: usize) -> Value {
      self.stack[self.stack.len() - 1 - distance]
   }

   // ---- bytecode stream --------------------------------------------------

   fn read_byte(&mut self) -> u8 {
      let byte = self.chunk.read_byte(self.ip);
      self.ip += 1;
      byte
   }

   fn read_op(&mut self) -> OpCode {
      let op = self.chunk.read_op(self.ip);
      self.ip += 1;
      op
   }

   fn read_u16(&mut self) -> u16 {
      let value = self.chunk.read_u16(self.ip);
      self.ip += 2;
      value
   }

   fn read_constant(&mut self) -> Value {
      let index = self.read_byte();
      self.chunk.constant(index)
   }
}

impl Default for Vm {
   fn default() -> Self {
      Self::new()
   }
}

#[cfg(test)]
impl Vm {
   /// Looks up a global by name after an `interpret` call, for asserting
   /// on program results without needing to capture stdout.
   pub(crate) fn global_value(&self, name: &str) -> Option<Value> {
      let id = self.heap.find_interned(name)?;
      let hash = self.heap.hash_of(id);
      self.globals.get(id, hash).copied()
   }

   pub(crate) fn global_string(&self, name: &str) -> Option<&str> {
      match self.global_value(name)? {
         Value::Str(id) => Some(self.heap.chars(id)),
         _ => None,
      }
   }
}
