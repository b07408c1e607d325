//! The single-pass Pratt compiler from spec §4.4.
//!
//! Parsing and code generation are fused: there is no intermediate AST.
//! Each grammar production either emits bytecode directly into the chunk
//! being built or records a placeholder to be backpatched once its target
//! is known (see `emit_jump` / `patch_jump` / `emit_loop`).

mod rules;

use crate::chunk::op_codes::OpCode;
use crate::chunk::Chunk;
use crate::errors::ErrorReport;
use crate::lexer::token::{Token, TokenKind};
use crate::lexer::Lexer;
use crate::object::Heap;
use crate::value::Value;
use rules::{infix_precedence, Precedence};

/// The largest number of locals a single compile may track at once — a
/// local's runtime stack slot is a one-byte operand, so 256 is the most
/// that can ever be addressed.
const MAX_LOCALS: usize = u8::MAX as usize + 1;

/// One entry in the compiler's local-variable stack: the lexeme that names
/// it and the scope depth it was declared at. A depth of `-1` marks a local
/// that has been declared but whose initializer hasn't finished running yet
/// — reading it in that state is the `var a = a;` bug spec §4.4 guards
/// against.
struct Local<'src> {
   name: &'src str,
   depth: i32,
}

/// Everything live for the duration of one `compile` call: the token
/// stream, the parser's error-recovery state, the chunk under construction,
/// and the local-variable/scope bookkeeping. Spec §9 calls out `parser`,
/// the current compiler, and `compilingChunk` as process-wide globals in
/// the source this was built from; here they're just fields of one struct
/// threaded through the call stack instead.
pub struct Compiler<'src, 'heap> {
   lexer: Lexer<'src>,
   previous: Token<'src>,
   current: Token<'src>,
   had_error: bool,
   panic_mode: bool,
   chunk: Chunk,
   heap: &'heap mut Heap,
   locals: Vec<Local<'src>>,
   scope_depth: i32,
   errors: Vec<ErrorReport>,
}

/// Compiles `source` into a `Chunk`, interning any string constants into
/// `heap` along the way. On failure, returns every syntax error found
/// rather than just the first (spec §4.4's `synchronize` keeps the parser
/// going after an error instead of bailing out immediately).
pub fn compile(source: &str, heap: &mut Heap) -> Result<Chunk, Vec<ErrorReport>> {
   let mut compiler = Compiler::new(source, heap);

   compiler.advance();
   while !compiler.matches(TokenKind::Eof) {
      compiler.declaration();
   }
   compiler.emit_op(OpCode::OP_RETURN);

   if compiler.had_error {
      Err(compiler.errors)
   } else {
      Ok(compiler.chunk)
   }
}

impl<'src, 'heap> Compiler<'src, 'heap> {
   fn new(source: &'src str, heap: &'heap mut Heap) -> Self {
      // A placeholder so `previous`/`current` have something to hold before
      // the first real `advance()`. Unlike the source this was built from,
      // `panic_mode` starts `false` — starting it `true` would silently
      // swallow a scanner error on the very first token.
      let placeholder = Token {
         kind: TokenKind::Eof,
         lexeme: "",
         line: 0,
      };
      Self {
         lexer: Lexer::new(source),
         previous: placeholder,
         current: placeholder,
         had_error: false,
         panic_mode: false,
         chunk: Chunk::new(),
         heap,
         locals: Vec::with_capacity(MAX_LOCALS),
         scope_depth: 0,
         errors: Vec::new(),
      }
   }

   // ---- token stream -----------------------------------------------

   fn advance(&mut self) {
      self.previous = self.current;
      loop {
         self.current = self.lexer.scan_token();
         if self.current.kind != TokenKind::Error {
            break;
         }
         let message = self.current.lexeme;
         self.error_at_current(message);
      }
   }

   fn check(&self, kind: TokenKind) -> bool {
      self.current.kind == kind
   }

   fn matches(&mut self, kind: TokenKind) -> bool {
      if !self.check(kind) {
         return false;
      }
      self.advance();
      true
   }

   fn consume(&mut self, kind: TokenKind, message: &str) {
      if self.check(kind) {
         self.advance();
         return;
      }
      self.error_at_current(message);
   }

   // ---- error reporting ---------------------------------------------

   fn error_at_current(&mut self, message: &str) {
      let token = self.current;
      self.error_at(token, message);
   }

   fn error_at_previous(&mut self, message: &str) {
      let token = self.previous;
      self.error_at(token, message);
   }

   fn error_at(&mut self, token: Token<'src>, message: &str) {
      if self.panic_mode {
         return;
      }
      self.panic_mode = true;
      self.had_error = true;

      let location = match token.kind {
         TokenKind::Eof => " at end".to_string(),
         TokenKind::Error => String::new(),
         _ => format!(" at '{}'", token.lexeme),
      };
      self.errors.push(ErrorReport {
         line: token.line,
         message: format!("Error{}: {}", location, message),
      });
   }

   /// After a parse error, skip tokens until we're at a statement boundary
   /// — either the token just consumed was a `;`, or the next one starts a
   /// new declaration/statement. Keeps one bad line from cascading into a
   /// wall of follow-on errors.
   fn synchronize(&mut self) {
      self.panic_mode = false;

      while self.current.kind != TokenKind::Eof {
         if self.previous.kind == TokenKind::Semicolon {
            return;
         }
         match self.current.kind {
            TokenKind::Class
            | TokenKind::Fun
            | TokenKind::Var
            | TokenKind::For
            | TokenKind::If
            | TokenKind::While
            | TokenKind::Print
            | TokenKind::Return => return,
            _ => {}
         }
         self.advance();
      }
   }

   // ---- bytecode emission --------------------------------------------

   fn emit_byte(&mut self, byte: u8) {
      let line = self.previous.line;
      self.chunk.write_byte(byte, line);
   }

   fn emit_op(&mut self, op: OpCode) {
      let line = self.previous.line;
      self.chunk.write_op(op, line);
   }

   /// Emits `op` followed by a two-byte placeholder, returning the offset
   /// of the placeholder's first byte so `patch_jump` can fill it in later.
   fn emit_jump(&mut self, op: OpCode) -> usize {
      self.emit_op(op);
      self.emit_byte(0xff);
      self.emit_byte(0xff);
      self.chunk.len() - 2
   }

   fn patch_jump(&mut self, offset: usize) {
      if self.chunk.patch_jump(offset).is_err() {
         self.error_at_previous("Too much code to jump over.");
      }
   }

   fn emit_loop(&mut self, loop_start: usize) {
      let line = self.previous.line;
      if self.chunk.emit_loop(loop_start, line).is_err() {
         self.error_at_previous("Too much code to jump over.");
      }
   }

   fn make_constant(&mut self, value: Value) -> u8 {
      match self.chunk.add_constant(value) {
         Some(index) => index,
         None => {
            self.error_at_previous("Too many constants in one chunk.");
            0
         }
      }
   }

   fn emit_constant(&mut self, value: Value) {
      let index = self.make_constant(value);
      self.emit_op(OpCode::OP_CONSTANT);
      self.emit_byte(index);
   }

   // ---- declarations and statements -----------------------------------

   fn declaration(&mut self) {
      if self.matches(TokenKind::Var) {
         self.var_declaration();
      } else {
         self.statement();
      }

      if self.panic_mode {
         self.synchronize();
      }
   }

   fn var_declaration(&mut self) {
      let global = self.parse_variable("Expect variable name.");

      if self.matches(TokenKind::Equal) {
         self.expression();
      } else {
         self.emit_op(OpCode::OP_NIL);
      }
      self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.");

      self.define_variable(global);
   }

   fn statement(&mut self) {
      if self.matches(TokenKind::Print) {
         self.print_statement();
      } else if self.matches(TokenKind::If) {
         self.if_statement();
      } else if self.matches(TokenKind::While) {
         self.while_statement();
      } else if self.matches(TokenKind::LeftBrace) {
         self.begin_scope();
         self.block();
         self.end_scope();
      } else {
         self.expression_statement();
      }
   }

   fn print_statement(&mut self) {
      self.expression();
      self.consume(TokenKind::Semicolon, "Expect ';' after value.");
      self.emit_op(OpCode::OP_PRINT);
   }

   fn expression_statement(&mut self) {
      self.expression();
      self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
      self.emit_op(OpCode::OP_POP);
   }

   fn block(&mut self) {
      while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
         self.declaration();
      }
      self.consume(TokenKind::RightBrace, "Expect '}' after block.");
   }

   fn begin_scope(&mut self) {
      self.scope_depth += 1;
   }

   fn end_scope(&mut self) {
      self.scope_depth -= 1;
      while let Some(local) = self.locals.last() {
         if local.depth <= self.scope_depth {
            break;
         }
         self.emit_op(OpCode::OP_POP);
         self.locals.pop();
      }
   }

   /// `if (c) S1 else S2` — see spec §4.4 for the exact sequence; the two
   /// `OP_POP`s drop the condition value on whichever branch runs.
   fn if_statement(&mut self) {
      self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
      self.expression();
      self.consume(TokenKind::RightParen, "Expect ')' after condition.");

      let then_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
      self.emit_op(OpCode::OP_POP);
      self.statement();

      let else_jump = self.emit_jump(OpCode::OP_JUMP);
      self.patch_jump(then_jump);
      self.emit_op(OpCode::OP_POP);

      if self.matches(TokenKind::Else) {
         self.statement();
      }
      self.patch_jump(else_jump);
   }

   /// `while (c) S`. The backward `OP_LOOP` at the end of the body is the
   /// fix for the open question in spec §9 — without it the body can only
   /// ever run once.
   fn while_statement(&mut self) {
      let loop_start = self.chunk.len();

      self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
      self.expression();
      self.consume(TokenKind::RightParen, "Expect ')' after condition.");

      let exit_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
      self.emit_op(OpCode::OP_POP);
      self.statement();
      self.emit_loop(loop_start);

      self.patch_jump(exit_jump);
      self.emit_op(OpCode::OP_POP);
   }

   // ---- variables -----------------------------------------------------

   fn parse_variable(&mut self, error_message: &str) -> u8 {
      self.consume(TokenKind::Identifier, error_message);

      self.declare_variable();
      if self.scope_depth > 0 {
         return 0;
      }

      self.identifier_constant(self.previous)
   }

   fn identifier_constant(&mut self, name: Token<'src>) -> u8 {
      let id = self.heap.copy_string(name.lexeme);
      self.make_constant(Value::Str(id))
   }

   fn declare_variable(&mut self) {
      if self.scope_depth == 0 {
         return;
      }
      let name = self.previous;
      for local in self.locals.iter().rev() {
         if local.depth != -1 && local.depth < self.scope_depth {
            break;
         }
         if local.name == name.lexeme {
            self.error_at_previous("Already a variable with this name in this scope.");
         }
      }
      self.add_local(name);
   }

   fn add_local(&mut self, name: Token<'src>) {
      if self.locals.len() >= MAX_LOCALS {
         self.error_at_previous("Too many local variables in function.");
         return;
      }
      self.locals.push(Local {
         name: name.lexeme,
         depth: -1,
      });
   }

   fn mark_initialized(&mut self) {
      let depth = self.scope_depth;
      self.locals.last_mut().expect("a local was just declared").depth = depth;
   }

   fn define_variable(&mut self, global: u8) {
      if self.scope_depth > 0 {
         self.mark_initialized();
         return;
      }
      self.emit_op(OpCode::OP_DEFINE_GLOBAL);
      self.emit_byte(global);
   }

   fn resolve_local(&mut self, name: Token<'src>) -> Option<u8> {
      for (slot, local) in self.locals.iter().enumerate().rev() {
         if local.name == name.lexeme {
            if local.depth == -1 {
               self.error_at_previous("Can't read local variable in its own initializer.");
            }
            return Some(slot as u8);
         }
      }
      None
   }

   fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
      let (get_op, set_op, arg) = match self.resolve_local(name) {
         Some(slot) => (OpCode::OP_GET_LOCAL, OpCode::OP_SET_LOCAL, slot),
         None => {
            let arg = self.identifier_constant(name);
            (OpCode::OP_GET_GLOBAL, OpCode::OP_SET_GLOBAL, arg)
         }
      };

      if can_assign && self.matches(TokenKind::Equal) {
         self.expression();
         self.emit_op(set_op);
      } else {
         self.emit_op(get_op);
      }
      self.emit_byte(arg);
   }

   // ---- expressions: Pratt parsing ------------------------------------

   fn expression(&mut self) {
      self.parse_precedence(Precedence::Assignment);
   }

   /// The heart of the Pratt parser (spec §4.4). Parses one prefix
   /// expression, then keeps folding in infix operators as long as they
   /// bind at least as tightly as `precedence`.
   fn parse_precedence(&mut self, precedence: Precedence) {
      self.advance();
      let can_assign = precedence <= Precedence::Assignment;
      if !self.prefix_rule(self.previous.kind, can_assign) {
         self.error_at_previous("Expect expression.");
         return;
      }

      while precedence <= infix_precedence(self.current.kind) {
         self.advance();
         self.infix_rule(self.previous.kind);
      }

      if can_assign && self.matches(TokenKind::Equal) {
         self.error_at_previous("Invalid assignment target.");
      }
   }

   /// Dispatches to the prefix parse function for `kind`, if one exists.
   /// Returns `false` for a token with no prefix rule, which
   /// `parse_precedence` turns into "Expect expression.".
   fn prefix_rule(&mut self, kind: TokenKind, can_assign: bool) -> bool {
      match kind {
         TokenKind::LeftParen => self.grouping(),
         TokenKind::Minus | TokenKind::Bang => self.unary(),
         TokenKind::Number => self.number(),
         TokenKind::Str => self.string(),
         TokenKind::False | TokenKind::True | TokenKind::Nil => self.literal(),
         TokenKind::Identifier => self.variable(can_assign),
         _ => return false,
      }
      true
   }

   fn infix_rule(&mut self, kind: TokenKind) {
      match kind {
         TokenKind::Minus
         | TokenKind::Plus
         | TokenKind::Slash
         | TokenKind::Star
         | TokenKind::BangEqual
         | TokenKind::EqualEqual
         | TokenKind::Greater
         | TokenKind::GreaterEqual
         | TokenKind::Less
         | TokenKind::LessEqual => self.binary(),
         TokenKind::And => self.and(),
         TokenKind::Or => self.or(),
         _ => unreachable!("infix_rule called for {:?}, which has no infix rule", kind),
      }
   }

   fn grouping(&mut self) {
      self.expression();
      self.consume(TokenKind::RightParen, "Expect ')' after expression.");
   }

   fn unary(&mut self) {
      let operator = self.previous.kind;
      self.parse_precedence(Precedence::Unary);
      match operator {
         TokenKind::Bang => self.emit_op(OpCode::OP_NOT),
         TokenKind::Minus => self.emit_op(OpCode::OP_NEGATE),
         _ => unreachable!(),
      }
   }

   fn binary(&mut self) {
      let operator = self.previous.kind;
      let precedence = infix_precedence(operator);
      self.parse_precedence(precedence.next_higher());

      match operator {
         TokenKind::BangEqual => {
            self.emit_op(OpCode::OP_EQUAL);
            self.emit_op(OpCode::OP_NOT);
         }
         TokenKind::EqualEqual => self.emit_op(OpCode::OP_EQUAL),
         TokenKind::Greater => self.emit_op(OpCode::OP_GREATER),
         TokenKind::GreaterEqual => {
            self.emit_op(OpCode::OP_LESS);
            self.emit_op(OpCode::OP_NOT);
         }
         TokenKind::Less => self.emit_op(OpCode::OP_LESS),
         TokenKind::LessEqual => {
            self.emit_op(OpCode::OP_GREATER);
            self.emit_op(OpCode::OP_NOT);
         }
         TokenKind::Plus => self.emit_op(OpCode::OP_ADD),
         TokenKind::Minus => self.emit_op(OpCode::OP_SUBTRACT),
         TokenKind::Star => self.emit_op(OpCode::OP_MULTIPLY),
         TokenKind::Slash => self.emit_op(OpCode::OP_DIVIDE),
         _ => unreachable!(),
      }
   }

   fn and(&mut self) {
      let end_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
      self.emit_op(OpCode::OP_POP);
      self.parse_precedence(Precedence::And);
      self.patch_jump(end_jump);
   }

   fn or(&mut self) {
      let else_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
      let end_jump = self.emit_jump(OpCode::OP_JUMP);
      self.patch_jump(else_jump);
      self.emit_op(OpCode::OP_POP);
      self.parse_precedence(Precedence::Or);
      self.patch_jump(end_jump);
   }

   fn number(&mut self) {
      let value: f64 = self
         .previous
         .lexeme
         .parse()
         .expect("the scanner only produces valid decimal-number lexemes");
      self.emit_constant(Value::Number(value));
   }

   fn string(&mut self) {
      let lexeme = self.previous.lexeme;
      let contents = &lexeme[1..lexeme.len() - 1];
      let id = self.heap.copy_string(contents);
      self.emit_constant(Value::Str(id));
   }

   fn literal(&mut self) {
      match self.previous.kind {
         TokenKind::False => self.emit_op(OpCode::OP_FALSE),
         TokenKind::True => self.emit_op(OpCode::OP_TRUE),
         TokenKind::Nil => self.emit_op(OpCode::OP_NIL),
         _ => unreachable!(),
      }
   }

   fn variable(&mut self, can_assign: bool) {
      let name = self.previous;
      self.named_variable(name, can_assign);
   }
}
