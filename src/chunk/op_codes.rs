use num_derive::FromPrimitive;

/// The set of instructions supported by the virtual machine.
///
/// **NOTE:** Changing the order in which members are declared creates
/// incompatibilities between different versions of the interpreter, since
/// bytecode is decoded by numeric value (see `num_traits::FromPrimitive`
/// below).
#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum OpCode {
   OP_CONSTANT,
   OP_NIL,
   OP_TRUE,
   OP_FALSE,
   OP_POP,
   OP_GET_LOCAL,
   OP_SET_LOCAL,
   OP_GET_GLOBAL,
   OP_DEFINE_GLOBAL,
   OP_SET_GLOBAL,
   OP_EQUAL,
   OP_GREATER,
   OP_LESS,
   OP_ADD,
   OP_SUBTRACT,
   OP_MULTIPLY,
   OP_DIVIDE,
   OP_NOT,
   OP_NEGATE,
   OP_PRINT,
   OP_JUMP,
   OP_JUMP_IF_FALSE,
   OP_LOOP,
   OP_RETURN,
}

impl OpCode {
   /// The number of operand bytes that follow this opcode in the bytecode
   /// stream. Used by the disassembler (spec §6).
   pub fn operand_bytes(&self) -> usize {
      use OpCode::*;
      match self {
         OP_CONSTANT | OP_GET_LOCAL | OP_SET_LOCAL | OP_GET_GLOBAL | OP_DEFINE_GLOBAL | OP_SET_GLOBAL => 1,
         OP_JUMP | OP_JUMP_IF_FALSE | OP_LOOP => 2,
         _ => 0,
      }
   }
}
