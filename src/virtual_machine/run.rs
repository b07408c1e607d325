//! The dispatch loop: reads one instruction at `ip`, executes it, repeats.

use crate::chunk::op_codes::OpCode;
use crate::errors::RuntimeErrorType;
use crate::object::StringId;
use crate::value::Value;

use super::{RuntimeFault, Vm};

impl Vm {
   /// Runs `self.chunk` from `self.ip` to an `OP_RETURN`, or until a
   /// runtime fault is raised.
   pub(super) fn run(&mut self) -> Result<(), RuntimeFault> {
      loop {
         #[cfg(feature = "trace")]
         {
            print!("          ");
            for value in &self.stack {
               print!("[ {} ]", value.print(&self.heap));
            }
            println!();
            crate::debug::disassemble_instruction(&self.chunk, self.ip, &self.heap);
         }

         self.current_line = self.chunk.line(self.ip);
         let instruction = self.read_op();

         match instruction {
            OpCode::OP_CONSTANT => {
               let value = self.read_constant();
               self.push(value)?;
            }
            OpCode::OP_NIL => self.push(Value::Nil)?,
            OpCode::OP_TRUE => self.push(Value::Bool(true))?,
            OpCode::OP_FALSE => self.push(Value::Bool(false))?,
            OpCode::OP_POP => {
               self.pop();
            }
            OpCode::OP_GET_LOCAL => {
               let slot = self.read_byte() as usize;
               self.push(self.stack[slot])?;
            }
            OpCode::OP_SET_LOCAL => {
               let slot = self.read_byte() as usize;
               self.stack[slot] = self.peek(0);
            }
            OpCode::OP_GET_GLOBAL => {
               let name = self.read_string_constant();
               let hash = self.heap.hash_of(name);
               match self.globals.get(name, hash) {
                  Some(value) => {
                     let value = *value;
                     self.push(value)?;
                  }
                  None => return Err(self.undefined_variable(name)),
               }
            }
            OpCode::OP_DEFINE_GLOBAL => {
               let name = self.read_string_constant();
               let hash = self.heap.hash_of(name);
               let value = self.pop();
               self.globals.set(name, hash, value);
            }
            OpCode::OP_SET_GLOBAL => {
               let name = self.read_string_constant();
               let hash = self.heap.hash_of(name);
               let value = self.peek(0);
               if self.globals.set(name, hash, value) {
                  // `set` returns `true` for a brand new key — there was
                  // no such global to assign to, so undo the insert.
                  self.globals.delete(name, hash);
                  return Err(self.undefined_variable(name));
               }
            }
            OpCode::OP_EQUAL => {
               let b = self.pop();
               let a = self.pop();
               self.push(Value::Bool(a == b))?;
            }
            OpCode::OP_GREATER => self.number_comparison(|a, b| a > b)?,
            OpCode::OP_LESS => self.number_comparison(|a, b| a < b)?,
            OpCode::OP_ADD => self.add()?,
            OpCode::OP_SUBTRACT => self.number_binary_op(|a, b| a - b)?,
            OpCode::OP_MULTIPLY => self.number_binary_op(|a, b| a * b)?,
            OpCode::OP_DIVIDE => self.number_binary_op(|a, b| a / b)?,
            OpCode::OP_NOT => {
               let value = self.pop();
               self.push(Value::Bool(value.is_falsey()))?;
            }
            OpCode::OP_NEGATE => {
               let value = self.peek(0);
               match value {
                  Value::Number(n) => {
                     self.pop();
                     self.push(Value::Number(-n))?;
                  }
                  _ => return Err(self.fault(RuntimeErrorType::TypeError, "Operand must be a number.".to_string())),
               }
            }
            OpCode::OP_PRINT => {
               let value = self.pop();
               println!("{}", value.print(&self.heap));
            }
            OpCode::OP_JUMP => {
               let offset = self.read_u16();
               self.ip += offset as usize;
            }
            OpCode::OP_JUMP_IF_FALSE => {
               let offset = self.read_u16();
               if self.peek(0).is_falsey() {
                  self.ip += offset as usize;
               }
            }
            OpCode::OP_LOOP => {
               let offset = self.read_u16();
               self.ip -= offset as usize;
            }
            OpCode::OP_RETURN => return Ok(()),
         }
      }
   }

   fn read_string_constant(&mut self) -> StringId {
      match self.read_constant() {
         Value::Str(id) => id,
         other => panic!("compiler emitted a non-string constant ({:?}) where a name was expected", other),
      }
   }

   fn undefined_variable(&self, name: StringId) -> RuntimeFault {
      let message = format!("Undefined variable '{}'.", self.heap.chars(name));
      self.fault(RuntimeErrorType::ReferenceError, message)
   }

   fn number_binary_op(&mut self, op: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeFault> {
      let (a, b) = self.pop_number_pair()?;
      self.push(Value::Number(op(a, b)))
   }

   fn number_comparison(&mut self, op: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeFault> {
      let (a, b) = self.pop_number_pair()?;
      self.push(Value::Bool(op(a, b)))
   }

   fn pop_number_pair(&mut self) -> Result<(f64, f64), RuntimeFault> {
      let b = self.pop();
      let a = self.pop();
      match (a, b) {
         (Value::Number(a), Value::Number(b)) => Ok((a, b)),
         _ => Err(self.fault(RuntimeErrorType::TypeError, "Operands must be numbers.".to_string())),
      }
   }

   /// `OP_ADD` is the one arithmetic opcode with two legal operand shapes:
   /// two numbers, or two strings (concatenated).
   fn add(&mut self) -> Result<(), RuntimeFault> {
      let b = self.peek(0);
      let a = self.peek(1);
      match (a, b) {
         (Value::Number(a), Value::Number(b)) => {
            self.pop();
            self.pop();
            self.push(Value::Number(a + b))
         }
         (Value::Str(_), Value::Str(_)) => {
            self.pop();
            self.pop();
            let concatenated = self.concatenate(a, b);
            self.push(concatenated)
         }
         _ => Err(self.fault(
            RuntimeErrorType::TypeError,
            "Operands must be two numbers or two strings.".to_string(),
         )),
      }
   }

   /// Builds the concatenation of two string values and interns it. Unlike
   /// the source this was built from — where concatenation always
   /// allocates a fresh object regardless of whether an identical string
   /// already exists — this routes through `Heap::take_string`, so two
   /// concatenations that happen to produce the same text share a handle
   /// (spec §9 open question 6 flags the same gap for `takeString`).
   fn concatenate(&mut self, a: Value, b: Value) -> Value {
      let (a, b) = match (a, b) {
         (Value::Str(a), Value::Str(b)) => (a, b),
         _ => unreachable!("concatenate called with non-string operands"),
      };
      let mut joined = String::with_capacity(self.heap.chars(a).len() + self.heap.chars(b).len());
      joined.push_str(self.heap.chars(a));
      joined.push_str(self.heap.chars(b));
      Value::Str(self.heap.take_string(joined))
   }
}
