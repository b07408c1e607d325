//! The disassembler from spec §6. Purely diagnostic — out of scope per
//! spec §1 ("considered optional") — so every entry point here is only
//! compiled in when the `trace` feature is on, the same way the source
//! this was built from gates its bytecode dumps behind `show_bytecode`.

use crate::chunk::op_codes::OpCode;
use crate::chunk::Chunk;
use crate::object::Heap;

/// Disassembles every instruction in `chunk`, labeled with `name`.
pub fn disassemble_chunk(chunk: &Chunk, name: &str, heap: &Heap) {
   println!("== {} ==", name);

   let mut offset = 0;
   while offset < chunk.len() {
      offset = disassemble_instruction(chunk, offset, heap);
   }
}

/// Prints one line describing the instruction at `offset`, and returns the
/// offset of the next one. The layout is `<offset> <line> <name> <operand>`,
/// with the line column collapsed to `   |` when it repeats the previous
/// instruction's line.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, heap: &Heap) -> usize {
   print!("{:04} ", offset);
   if offset > 0 && chunk.line(offset) == chunk.line(offset - 1) {
      print!("   | ");
   } else {
      print!("{:4} ", chunk.line(offset));
   }

   match chunk.read_op(offset) {
      OpCode::OP_CONSTANT => constant_instruction("OP_CONSTANT", chunk, offset, heap),
      OpCode::OP_NIL => simple_instruction("OP_NIL", offset),
      OpCode::OP_TRUE => simple_instruction("OP_TRUE", offset),
      OpCode::OP_FALSE => simple_instruction("OP_FALSE", offset),
      OpCode::OP_POP => simple_instruction("OP_POP", offset),
      OpCode::OP_GET_LOCAL => byte_instruction("OP_GET_LOCAL", chunk, offset),
      OpCode::OP_SET_LOCAL => byte_instruction("OP_SET_LOCAL", chunk, offset),
      OpCode::OP_GET_GLOBAL => constant_instruction("OP_GET_GLOBAL", chunk, offset, heap),
      OpCode::OP_DEFINE_GLOBAL => constant_instruction("OP_DEFINE_GLOBAL", chunk, offset, heap),
      OpCode::OP_SET_GLOBAL => constant_instruction("OP_SET_GLOBAL", chunk, offset, heap),
      OpCode::OP_EQUAL => simple_instruction("OP_EQUAL", offset),
      OpCode::OP_GREATER => simple_instruction("OP_GREATER", offset),
      OpCode::OP_LESS => simple_instruction("OP_LESS", offset),
      OpCode::OP_ADD => simple_instruction("OP_ADD", offset),
      OpCode::OP_SUBTRACT => simple_instruction("OP_SUBTRACT", offset),
      OpCode::OP_MULTIPLY => simple_instruction("OP_MULTIPLY", offset),
      OpCode::OP_DIVIDE => simple_instruction("OP_DIVIDE", offset),
      OpCode::OP_NOT => simple_instruction("OP_NOT", offset),
      OpCode::OP_NEGATE => simple_instruction("OP_NEGATE", offset),
      OpCode::OP_PRINT => simple_instruction("OP_PRINT", offset),
      OpCode::OP_JUMP => jump_instruction("OP_JUMP", 1, chunk, offset),
      OpCode::OP_JUMP_IF_FALSE => jump_instruction("OP_JUMP_IF_FALSE", 1, chunk, offset),
      OpCode::OP_LOOP => jump_instruction("OP_LOOP", -1, chunk, offset),
      OpCode::OP_RETURN => simple_instruction("OP_RETURN", offset),
   }
}

fn simple_instruction(name: &str, offset: usize) -> usize {
   println!("{:<16}", name);
   offset + 1
}

/// A one-byte operand with no meaning outside the running stack (a local
/// slot) — there's nothing to resolve to a printable value at disassembly
/// time, so only the raw index is shown.
fn byte_instruction(name: &str, chunk: &Chunk, offset: usize) -> usize {
   let slot = chunk.read_byte(offset + 1);
   println!("{:<16} {:4}", name, slot);
   offset + 2
}

/// A one-byte operand indexing the constant pool.
fn constant_instruction(name: &str, chunk: &Chunk, offset: usize, heap: &Heap) -> usize {
   let index = chunk.read_byte(offset + 1);
   let value = chunk.constant(index);
   println!("{:<16} {:4} '{}'", name, index, value.print(heap));
   offset + 2
}

/// A two-byte big-endian jump offset. `sign` is `1` for a forward jump and
/// `-1` for `OP_LOOP`'s backward one, so the printed target is where
/// execution actually lands.
fn jump_instruction(name: &str, sign: i64, chunk: &Chunk, offset: usize) -> usize {
   let jump = chunk.read_u16(offset + 1);
   let target = offset as i64 + 3 + sign * jump as i64;
   println!("{:<16} {:4} -> {}", name, jump, target);
   offset + 3
}
