pub mod op_codes;

use crate::value::Value;
use num_traits::FromPrimitive;
use op_codes::OpCode;

/// A compiled unit: bytecode, a parallel per-byte line map (spec §3 keeps
/// this uncompressed — it's only ever consulted for error messages), and
/// the constant pool the byte operands of `OP_CONSTANT` and the variable
/// opcodes index into.
#[derive(Default)]
pub struct Chunk {
   code: Vec<u8>,
   lines: Vec<usize>,
   constants: Vec<Value>,
}

/// The maximum number of entries a single chunk's constant pool may hold —
/// the constant opcodes only carry a one-byte operand.
const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

impl Chunk {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn len(&self) -> usize {
      self.code.len()
   }

   pub fn is_empty(&self) -> bool {
      self.code.is_empty()
   }

   /// Appends one raw byte (an opcode or an operand byte) and the source
   /// line it came from.
   pub fn write_byte(&mut self, byte: u8, line: usize) {
      self.code.push(byte);
      self.lines.push(line);
   }

   pub fn write_op(&mut self, op: OpCode, line: usize) {
      self.write_byte(op as u8, line);
   }

   /// Appends a constant to the pool. Returns `None` once the pool is full
   /// (spec §3: "max 256 entries per chunk").
   pub fn add_constant(&mut self, value: Value) -> Option<u8> {
      if self.constants.len() >= MAX_CONSTANTS {
         return None;
      }
      self.constants.push(value);
      Some((self.constants.len() - 1) as u8)
   }

   pub fn constant(&self, index: u8) -> Value {
      self.constants[index as usize]
   }

   pub fn read_byte(&self, offset: usize) -> u8 {
      self.code[offset]
   }

   pub fn read_op(&self, offset: usize) -> OpCode {
      FromPrimitive::from_u8(self.code[offset]).expect("invalid opcode byte in chunk")
   }

   pub fn read_u16(&self, offset: usize) -> u16 {
      u16::from_be_bytes([self.code[offset], self.code[offset + 1]])
   }

   pub fn line(&self, offset: usize) -> usize {
      self.lines[offset]
   }

   pub fn constants_len(&self) -> usize {
      self.constants.len()
   }

   /// Patches the 16-bit big-endian jump operand written at `offset` (the
   /// position of the first of its two placeholder bytes) so that it
   /// encodes the distance from just after the operand to the current end
   /// of the chunk. Returns `Err` if that distance can't fit (spec §4.4:
   /// "Too much code to jump over.").
   pub fn patch_jump(&mut self, offset: usize) -> Result<(), ()> {
      let jump = self.code.len() - offset - 2;
      if jump > u16::MAX as usize {
         return Err(());
      }
      let bytes = (jump as u16).to_be_bytes();
      self.code[offset] = bytes[0];
      self.code[offset + 1] = bytes[1];
      Ok(())
   }

   /// Emits a backward jump (`OP_LOOP`) from the current end of the chunk
   /// to `loop_start`. Returns `Err` if the distance overflows a u16 —
   /// this is the fix for the missing backward-jump opcode flagged in spec
   /// §9 (open question 1): without it, `while` bodies run at most once.
   pub fn emit_loop(&mut self, loop_start: usize, line: usize) -> Result<(), ()> {
      self.write_op(OpCode::OP_LOOP, line);
      let offset = self.code.len() - loop_start + 2;
      if offset > u16::MAX as usize {
         return Err(());
      }
      let bytes = (offset as u16).to_be_bytes();
      self.write_byte(bytes[0], line);
      self.write_byte(bytes[1], line);
      Ok(())
   }
}

#[cfg(test)]
impl Chunk {
   /// Exposes the line map's length so tests can check the
   /// `code.length == lines.length` invariant from the outside.
   pub(crate) fn lines_len(&self) -> usize {
      self.lines.len()
   }
}
