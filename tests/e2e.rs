//! End-to-end tests: source text in, program output (or a pipeline error)
//! out, exercising the full scan/parse/compile/run pipeline through
//! [`minilang::run_source`].

use std::io::Cursor;
use indoc::indoc;
use minilang::run_source;

fn run(source: &str) -> String {
  let mut out = Vec::new();
  let mut input = std::io::empty();
  run_source(source, &mut out, &mut input).expect("program should run to completion");
  String::from_utf8(out).unwrap()
}

fn run_with_input(source: &str, input: &str) -> String {
  let mut out = Vec::new();
  let mut input = Cursor::new(input.as_bytes().to_vec());
  run_source(source, &mut out, &mut input).expect("program should run to completion");
  String::from_utf8(out).unwrap()
}

#[test]
fn while_loop_prints_an_ascending_count() {
  let out = run("let i = 0; while (i < 3) { print(i); i = i + 1; }");
  assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn for_loop_breaks_before_the_limit() {
  let out = run("for (let i = 0; i < 5; i = i + 1) { if (i == 3) { break; } print(i); }");
  assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn for_loop_skips_one_iteration_with_continue() {
  let out = run("for (let i = 0; i < 4; i = i + 1) { if (i == 2) { continue; } print(i); }");
  assert_eq!(out, "0\n1\n3\n");
}

#[test]
fn while_loop_counts_down() {
  let src = indoc! {"
        let n = 3;
        while (n > 0) {
            print(n);
            n = n - 1;
        }
    "};
  assert_eq!(run(src), "3\n2\n1\n");
}

#[test]
fn nested_if_else_chooses_the_right_branch() {
  let src = indoc! {"
        func classify(n) {
            if (n < 0) {
                return -1;
            } else if (n == 0) {
                return 0;
            } else {
                return 1;
            }
        }
        print(classify(-5));
        print(classify(0));
        print(classify(5));
    "};
  assert_eq!(run(src), "-1\n0\n1\n");
}

#[test]
fn mutual_recursion_between_top_level_functions() {
  let src = indoc! {"
        func is_even(n) {
            if (n == 0) {
                return 1;
            }
            return is_odd(n - 1);
        }
        func is_odd(n) {
            if (n == 0) {
                return 0;
            }
            return is_even(n - 1);
        }
        print(is_even(10));
        print(is_odd(10));
    "};
  assert_eq!(run(src), "1\n0\n");
}

#[test]
fn input_builtin_round_trips_through_str2int() {
  let src = indoc! {r#"
        let line = input("name? ");
        print(line);
        let n = str2int("42");
        print(n + 1);
    "#};
  let out = run_with_input(src, "ferris\n");
  assert_eq!(out, "name? ferris\n43\n");
}

#[test]
fn block_scoped_let_does_not_leak_into_the_enclosing_scope() {
  let src = indoc! {"
        let x = 1;
        {
            let x = 2;
            print(x);
        }
        print(x);
    "};
  assert_eq!(run(src), "2\n1\n");
}

#[test]
fn for_loop_variable_outlives_the_loop() {
  let src = indoc! {"
        for (let i = 0; i < 3; i = i + 1) {
            print(i);
        }
        print(i);
    "};
  assert_eq!(run(src), "0\n1\n2\n3\n");
}

#[test]
fn unbounded_recursion_fails_with_a_runtime_error_instead_of_a_stack_overflow() {
  let src = indoc! {"
        func loop_forever(n) {
            return loop_forever(n + 1);
        }
        print(loop_forever(0));
    "};
  let mut out = Vec::new();
  let mut input = std::io::empty();
  let err = run_source(src, &mut out, &mut input).unwrap_err();
  assert!(err.to_string().contains("depth"));
}

#[test]
fn calling_an_undefined_function_is_a_runtime_error() {
  let mut out = Vec::new();
  let mut input = std::io::empty();
  let err = run_source("missing_fn();", &mut out, &mut input).unwrap_err();
  assert!(err.to_string().contains("undefined function"));
}

#[test]
fn wrong_arity_call_is_a_runtime_error() {
  let src = indoc! {"
        func add(a, b) {
            return a + b;
        }
        add(1);
    "};
  let mut out = Vec::new();
  let mut input = std::io::empty();
  let err = run_source(src, &mut out, &mut input).unwrap_err();
  assert!(err.to_string().contains("expects"));
}

#[test]
fn referencing_an_undefined_variable_is_a_compile_error() {
  let mut out = Vec::new();
  let mut input = std::io::empty();
  let err = run_source("print(nope);", &mut out, &mut input).unwrap_err();
  assert!(err.to_string().contains("undefined variable"));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
  let mut out = Vec::new();
  let mut input = std::io::empty();
  let err = run_source("print(1 / 0);", &mut out, &mut input).unwrap_err();
  assert!(err.to_string().contains("division by zero"));
}

#[test]
fn unterminated_string_is_a_lex_error() {
  let mut out = Vec::new();
  let mut input = std::io::empty();
  let err = run_source(r#"print("unterminated);"#, &mut out, &mut input).unwrap_err();
  assert!(matches!(err, minilang::Error::Lex(_)));
}

#[test]
fn trailing_garbage_after_a_statement_is_a_parse_error() {
  let mut out = Vec::new();
  let mut input = std::io::empty();
  let err = run_source("let a = 1", &mut out, &mut input).unwrap_err();
  assert!(matches!(err, minilang::Error::Parse(_)));
}

#[test]
fn a_callees_side_effects_do_not_leak_into_the_callers_registers() {
  let src = indoc! {"
        func mutate(x) {
            x = 99;
            return x;
        }
        let a = 1;
        let b = mutate(a);
        print(a);
        print(b);
    "};
  assert_eq!(run(src), "1\n99\n");
}

#[test]
fn comparison_chain_and_boolean_literals() {
  let src = indoc! {"
        let a = true;
        let b = false;
        print(a);
        print(b);
        print(3 <= 3);
        print(3 >= 4);
    "};
  assert_eq!(run(src), "1\n0\n1\n0\n");
}
