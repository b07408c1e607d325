use crate::value::Value;
use crate::virtual_machine::{InterpretResult, Vm};

fn run(source: &str) -> (Vm, InterpretResult) {
   let mut vm = Vm::new();
   let result = vm.interpret(source);
   (vm, result)
}

fn assert_ok(source: &str) -> Vm {
   let (vm, result) = run(source);
   assert!(matches!(result, InterpretResult::Ok), "expected {:?} to run without error", source);
   vm
}

#[test]
fn arithmetic_precedence() {
   // print 1 + 2 * 3; -> 7 (spec §8 scenario 1)
   let vm = assert_ok("var result = 1 + 2 * 3;");
   assert_eq!(vm.global_value("result"), Some(Value::Number(7.0)));
}

#[test]
fn string_concatenation() {
   // print "foo" + "bar"; -> "foobar" (spec §8 scenario 2)
   let vm = assert_ok(r#"var result = "foo" + "bar";"#);
   assert_eq!(vm.global_string("result"), Some("foobar"));
}

#[test]
fn shadowing_a_global_with_a_block_local() {
   // var a = 1; { var a = 2; print a; } print a; -> 2, then 1 (scenario 3)
   let vm = assert_ok("var a = 1; { var a = 2; a = 3; } var seen_after_block = a;");
   assert_eq!(vm.global_value("a"), Some(Value::Number(1.0)));
   assert_eq!(vm.global_value("seen_after_block"), Some(Value::Number(1.0)));
}

#[test]
fn if_else_selects_the_right_branch() {
   let vm = assert_ok("var a = 1; var result = 0; if (a == 1) { result = 1; } else { result = 2; }");
   assert_eq!(vm.global_value("result"), Some(Value::Number(1.0)));

   let vm = assert_ok("var a = 2; var result = 0; if (a == 1) { result = 1; } else { result = 2; }");
   assert_eq!(vm.global_value("result"), Some(Value::Number(2.0)));
}

#[test]
fn while_loop_runs_its_body_more_than_once() {
   // var i = 0; while (i < 3) { print i; i = i + 1; } -> 0, 1, 2 (scenario 5).
   // This is the regression test for the missing `OP_LOOP` backward jump:
   // before that fix the body below would run exactly once and leave `i`
   // at `1` instead of `3`.
   let vm = assert_ok("var i = 0; while (i < 3) { i = i + 1; }");
   assert_eq!(vm.global_value("i"), Some(Value::Number(3.0)));
}

#[test]
fn and_short_circuits() {
   let vm = assert_ok("var calls = 0; var a = false and (calls = calls + 1 == 1);");
   assert_eq!(vm.global_value("calls"), Some(Value::Number(0.0)));
}

#[test]
fn or_short_circuits() {
   let vm = assert_ok("var calls = 0; var a = true or (calls = calls + 1 == 1);");
   assert_eq!(vm.global_value("calls"), Some(Value::Number(0.0)));
}

#[test]
fn negating_a_non_number_is_a_runtime_error() {
   // print -true; -> "Operand must be a number." (scenario 6)
   let (_, result) = run("print -true;");
   assert!(matches!(result, InterpretResult::RuntimeError));
}

#[test]
fn reading_an_undefined_global_is_a_runtime_error() {
   // print undefined; -> "Undefined variable 'undefined'." (scenario 8)
   let (_, result) = run("print undefined;");
   assert!(matches!(result, InterpretResult::RuntimeError));
}

#[test]
fn a_runtime_error_resets_the_stack_but_not_the_globals() {
   let mut vm = Vm::new();
   assert!(matches!(vm.interpret("var a = 1;"), InterpretResult::Ok));
   assert!(matches!(vm.interpret("print oops;"), InterpretResult::RuntimeError));
   // The globals table from the first `interpret` call is untouched —
   // required for REPL use (spec §7).
   assert_eq!(vm.global_value("a"), Some(Value::Number(1.0)));
}

#[test]
fn deeply_nested_right_operands_overflow_the_stack() {
   // Each level of `1 - (...)` pushes its left `1` before descending into
   // its parenthesized right operand, so a chain of N nested subtractions
   // runs N `OP_CONSTANT`s before the first `OP_SUBTRACT` ever fires.
   // Past the 256-slot stack (spec §5's fixed-size bound), that has to
   // raise `StackOverflow` rather than corrupt memory.
   let mut expr = "1".to_string();
   for _ in 0..300 {
      expr = format!("1 - ({})", expr);
   }
   let (_, result) = run(&format!("print {};", expr));
   assert!(matches!(result, InterpretResult::RuntimeError));
}

#[test]
fn adding_two_numbers_matches_native_f64_arithmetic() {
   let vm = assert_ok("var result = 0.1 + 0.2;");
   assert_eq!(vm.global_value("result"), Some(Value::Number(0.1 + 0.2)));
}

#[test]
fn nan_is_never_equal_to_itself() {
   let vm = assert_ok("var nan = 0.0 / 0.0; var result = nan == nan;");
   assert_eq!(vm.global_value("result"), Some(Value::Bool(false)));
}
