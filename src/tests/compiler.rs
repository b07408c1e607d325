use crate::compiler::compile;
use crate::object::Heap;

fn compile_ok(source: &str) -> crate::chunk::Chunk {
   let mut heap = Heap::new();
   compile(source, &mut heap).unwrap_or_else(|errors| {
      panic!("expected {:?} to compile, got errors: {:?}", source, messages(&errors))
   })
}

fn compile_err(source: &str) -> Vec<String> {
   let mut heap = Heap::new();
   match compile(source, &mut heap) {
      Ok(_) => panic!("expected {:?} to fail to compile", source),
      Err(errors) => messages(&errors),
   }
}

fn messages(errors: &[crate::errors::ErrorReport]) -> Vec<String> {
   errors.iter().map(|e| e.message.clone()).collect()
}

#[test]
fn code_and_lines_stay_in_lockstep() {
   let chunk = compile_ok("var a = 1;\nvar b = 2;\nprint a + b;");
   assert_eq!(chunk.len(), chunk.lines_len());
}

#[test]
fn empty_program_compiles_to_just_a_return() {
   let chunk = compile_ok("");
   assert_eq!(chunk.len(), chunk.lines_len());
}

#[test]
fn reading_a_local_in_its_own_initializer_is_a_compile_error() {
   let errors = compile_err("{ var a = a; }");
   assert!(
      errors.iter().any(|m| m.contains("Can't read local variable in its own initializer.")),
      "got {:?}",
      errors
   );
}

#[test]
fn a_global_may_reference_itself_in_its_initializer() {
   // No local-shadowing check applies at the top level — this is a runtime
   // "Undefined variable" error, not a compile error (spec §4.4 scenario 7).
   compile_ok("var a = a;");
}

#[test]
fn duplicate_local_in_the_same_scope_is_a_compile_error() {
   let errors = compile_err("{ var a = 1; var a = 2; }");
   assert!(
      errors.iter().any(|m| m.contains("Already a variable with this name in this scope.")),
      "got {:?}",
      errors
   );
}

#[test]
fn shadowing_in_a_nested_scope_is_allowed() {
   compile_ok("var a = 1; { var a = 2; print a; } print a;");
}

#[test]
fn missing_semicolon_is_a_compile_error() {
   let errors = compile_err("print 1");
   assert!(errors.iter().any(|m| m.contains("Expect ';' after value.")), "got {:?}", errors);
}

#[test]
fn unexpected_token_is_a_compile_error() {
   let errors = compile_err("print ;");
   assert!(errors.iter().any(|m| m.contains("Expect expression.")), "got {:?}", errors);
}

#[test]
fn assigning_to_a_non_lvalue_is_a_compile_error() {
   let errors = compile_err("1 = 2;");
   assert!(errors.iter().any(|m| m.contains("Invalid assignment target.")), "got {:?}", errors);
}

#[test]
fn a_single_bad_line_does_not_cascade_into_unrelated_errors() {
   // `synchronize` should recover at the `;` and let the next statement
   // compile cleanly, rather than reporting one error per remaining token.
   let errors = compile_err("print 1\nprint 2;");
   assert_eq!(errors.len(), 1, "got {:?}", errors);
}

#[test]
fn multiple_independent_errors_are_all_reported() {
   let errors = compile_err("print ;\nprint ;");
   assert_eq!(errors.len(), 2, "got {:?}", errors);
}
