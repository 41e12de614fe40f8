use treelox::{
    interpreter::{Interpreter, RuntimeError},
    parse_source, Diagnostic,
};

fn run(source: &str) -> (String, Result<(), RuntimeError>) {
    let (statements, diagnostics) = parse_source(source);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics for {source:?}: {diagnostics:?}"
    );

    let mut buffer = Vec::new();
    let mut interpreter = Interpreter::new(&mut buffer);
    let result = interpreter.interpret(&statements);

    (String::from_utf8(buffer).unwrap(), result)
}

fn assert_prints(source: &str, expected: &str) {
    let (output, result) = run(source);
    result.unwrap_or_else(|error| panic!("{source:?} failed: {error}"));
    assert_eq!(output, expected, "for {source:?}");
}

fn assert_runtime_error(source: &str, expected_message: &str) {
    let (_, result) = run(source);
    match result {
        Ok(()) => panic!("{source:?} succeeded but was expected to fail"),
        Err(error) => assert_eq!(error.to_string(), expected_message, "for {source:?}"),
    }
}

fn diagnostics_of(source: &str) -> Vec<Diagnostic> {
    parse_source(source).1
}

#[test]
fn arithmetic_and_precedence() {
    assert_prints("print 1 + 2 * 3;", "7\n");
    assert_prints("print (1 + 2) * 3;", "9\n");
    assert_prints("print 1 - 2 - 3;", "-4\n");
    assert_prints("print 3 * ((10 - 6) * (4 + 4)) / 2;", "48\n");
}

#[test]
fn comparison_and_equality() {
    assert_prints("print 1 < 2;", "true\n");
    assert_prints("print 2 <= 2;", "true\n");
    assert_prints("print 1 > 2;", "false\n");
    assert_prints("print 1 >= 2;", "false\n");
    assert_prints("print 1 == 1.0;", "true\n");
    assert_prints("print 1 != 2;", "true\n");
    assert_prints("print nil == false;", "false\n");
}

#[test]
fn strings() {
    assert_prints("print \"a\" + \"b\";", "ab\n");
    assert_prints("print \"\" == \"\";", "true\n");
}

#[test]
fn print_stringifies_values() {
    assert_prints("print 4.0;", "4\n");
    assert_prints("print 2.5;", "2.5\n");
    assert_prints("print nil;", "nil\n");
    assert_prints("print true;", "true\n");
}

#[test]
fn variables_and_scoping() {
    assert_prints("var x = 1; { var x = 2; print x; } print x;", "2\n1\n");
    assert_prints("var x = 1; { x = 2; } print x;", "2\n");
    assert_prints(
        "var a; var b; a = b = 3; print a; print b;",
        "3\n3\n",
    );
    assert_prints("{ { var deep = 1; print deep; } }", "1\n");
}

#[test]
fn comments_are_ignored() {
    assert_prints("print 1; // trailing comment\nprint 2;", "1\n2\n");
    assert_prints("/* a /* nested */ comment */ print 1;", "1\n");
}

#[test]
fn runtime_errors() {
    assert_runtime_error("print y;", "Undefined variable 'y'.");
    assert_runtime_error("print 1 + \"a\";", "Operands must be two numbers or two strings.");
    assert_runtime_error("print 1 / 0;", "Division by zero.");
    assert_runtime_error("print -nil;", "Operand must be a number.");
    assert_runtime_error("print 1 < nil;", "Operands must be numbers.");
}

#[test]
fn syntax_errors_are_collected_not_evaluated() {
    let diagnostics = diagnostics_of("print 1\nprint 2\nprint 3;");
    assert_eq!(diagnostics.len(), 2);

    let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "[line 2] Error at 'print': Expected ';' after value.".to_string(),
            "[line 3] Error at 'print': Expected ';' after value.".to_string(),
        ]
    );
}

#[test]
fn lexical_errors_surface_with_their_line() {
    let diagnostics = diagnostics_of("var a = 1;\n#\nvar b = 2;");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].to_string(), "[line 2] Error: Unexpected character.");
}

#[test]
fn consecutive_runs_are_independent() {
    // A bad line must not poison a later, valid one (REPL contract).
    assert!(!diagnostics_of("print ;").is_empty());
    assert!(diagnostics_of("print 1;").is_empty());
}

#[test]
fn statements_before_a_failure_take_effect() {
    let (output, result) = run("var a = 1; print a; print a + nil; print 99;");
    assert!(result.is_err());
    assert_eq!(output, "1\n");
}
