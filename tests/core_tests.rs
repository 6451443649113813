//! Builtin function tests
//!
//! Exercises the installed builtins through full programs rather than by
//! calling the host functions directly.

use pretty_assertions::assert_eq;
use tarn::core::top_env;
use tarn::{Compiler, Env, Error, Form};

/// Fresh compiler and top-level environment for one test session.
fn session() -> (Compiler, Env) {
    let vm = Compiler::new();
    let env = top_env(&vm).expect("startup definitions evaluate");
    (vm, env)
}

/// Evaluate one form in an existing session.
fn eval_in(vm: &Compiler, env: &Env, source: &str) -> Result<Form, Error> {
    vm.eval(&tarn::read_str(source)?, env)
}

/// Evaluate one form in a fresh session.
fn eval(source: &str) -> Result<Form, Error> {
    let (vm, env) = session();
    eval_in(&vm, &env, source)
}

fn assert_form(source: &str, expected: Form) {
    match eval(source) {
        Ok(value) => assert_eq!(value, expected, "for input {source}"),
        Err(e) => panic!("evaluation of {source} failed: {e}"),
    }
}

fn assert_number(source: &str, expected: i64) {
    assert_form(source, Form::Number(expected));
}

fn assert_bool(source: &str, expected: bool) {
    assert_form(source, Form::Bool(expected));
}

// ==================== Arithmetic ====================

#[test]
fn test_division_truncates_toward_zero() {
    assert_number("(/ 7 2)", 3);
    assert_number("(/ -7 2)", -3);
    assert_number("(/ 100 2 5)", 10);
}

#[test]
fn test_division_by_zero_is_an_error() {
    assert!(matches!(eval("(/ 1 0)"), Err(Error::DivisionByZero)));
    assert!(matches!(eval("(% 7 0)"), Err(Error::DivisionByZero)));
}

#[test]
fn test_modulo() {
    assert_number("(% 7 3)", 1);
    assert_number("(% 10 2)", 0);
}

#[test]
fn test_arithmetic_rejects_non_numbers() {
    assert!(matches!(eval("(+ 1 \"a\")"), Err(Error::Type { .. })));
    assert!(matches!(eval("(< \"a\" 1)"), Err(Error::Type { .. })));
}

// ==================== Comparison ====================

#[test]
fn test_numeric_ordering() {
    assert_bool("(< 1 2)", true);
    assert_bool("(< 2 1)", false);
    assert_bool("(<= 2 2)", true);
    assert_bool("(> 1 2)", false);
    assert_bool("(>= 3 2)", true);
}

#[test]
fn test_equality_is_structural() {
    assert_bool("(= 2 (+ 1 1))", true);
    assert_bool("(= nil nil)", true);
    assert_bool("(= nil false)", false);
    assert_bool("(= (list 1 2) (list 1 2))", true);
    assert_bool("(= (list 1 2) (list 1 3))", false);
    assert_bool("(= (hash-map \"a\" 1) (hash-map \"a\" 1))", true);
    assert_bool("(= (hash-map \"a\" 1) (hash-map \"a\" 2))", false);
}

#[test]
fn test_lists_and_vectors_compare_equal_by_contents() {
    assert_bool("(= (list 1 2) (vector 1 2))", true);
    assert_bool("(= (vector) (list))", true);
}

#[test]
fn test_functions_and_atoms_compare_by_identity() {
    assert_bool("(let* (f (fn* () 1) g (fn* () 1)) (= f g))", false);
    assert_bool("(let* (f (fn* () 1) g f) (= f g))", true);
    assert_bool("(let* (a (atom 1) b (atom 1)) (= a b))", false);
    assert_bool("(let* (a (atom 1) b a) (= a b))", true);
    assert_bool("(= + +)", true);
    assert_bool("(= + -)", false);
}

// ==================== Sequences ====================

#[test]
fn test_cons_prepends() {
    assert_form(
        "(cons 1 '(2 3))",
        Form::list(vec![Form::Number(1), Form::Number(2), Form::Number(3)]),
    );
    assert_form(
        "(cons '(1) '(2))",
        Form::list(vec![
            Form::list(vec![Form::Number(1)]),
            Form::Number(2),
        ]),
    );
}

#[test]
fn test_concat_flattens_one_level() {
    assert_form("(concat)", Form::list(vec![]));
    assert_form(
        "(concat '(1 2) '(3) (vector 4))",
        Form::list(vec![
            Form::Number(1),
            Form::Number(2),
            Form::Number(3),
            Form::Number(4),
        ]),
    );
}

#[test]
fn test_first_and_rest_tolerate_nil_and_empty() {
    assert_number("(first '(7 8))", 7);
    assert_form("(first '())", Form::Nil);
    assert_form("(first nil)", Form::Nil);
    assert_form("(rest '(7 8))", Form::list(vec![Form::Number(8)]));
    assert_form("(rest '())", Form::list(vec![]));
    assert_form("(rest nil)", Form::list(vec![]));
}

#[test]
fn test_nth_checks_bounds() {
    assert_number("(nth '(1 2) 1)", 2);
    assert!(matches!(
        eval("(nth '(1 2) 2)"),
        Err(Error::OutOfBounds { index: 2, length: 2 })
    ));
    assert!(matches!(
        eval("(nth '(1 2) -1)"),
        Err(Error::OutOfBounds { index: -1, length: 2 })
    ));
}

#[test]
fn test_count_and_empty() {
    assert_number("(count '(1 2 3))", 3);
    assert_number("(count nil)", 0);
    assert_bool("(empty? '())", true);
    assert_bool("(empty? '(1))", false);
    assert_bool("(empty? nil)", true);
    assert!(matches!(eval("(count 5)"), Err(Error::Type { .. })));
}

// ==================== Maps ====================

#[test]
fn test_map_construction_and_lookup() {
    assert_number("(get (hash-map \"a\" 1 :b 2) :b)", 2);
    assert_number("(get '{\"a\" 1} \"a\")", 1);
    assert_form("(get (hash-map) \"x\")", Form::Nil);
    assert_form("(get nil \"x\")", Form::Nil);
    assert_form("(get (hash-map \"a\" 1) (list 1))", Form::Nil);
}

#[test]
fn test_assoc_copies_instead_of_mutating() {
    assert_number("(get (assoc (hash-map \"a\" 1) \"b\" 2 :c 3) :c)", 3);
    assert_number(
        "(let* (m (hash-map \"a\" 1) n (assoc m \"a\" 2)) (get m \"a\"))",
        1,
    );
}

#[test]
fn test_keys_and_vals_preserve_insertion_order() {
    assert_form(
        "(keys (hash-map \"a\" 1 :b 2))",
        Form::list(vec![Form::string("a"), Form::keyword("b")]),
    );
    assert_form(
        "(vals (hash-map \"a\" 1 :b 2))",
        Form::list(vec![Form::Number(1), Form::Number(2)]),
    );
}

#[test]
fn test_contains_coerces_symbol_keys() {
    assert_bool("(contains? (hash-map \"a\" 1) \"a\")", true);
    assert_bool("(contains? (hash-map \"a\" 1) \"b\")", false);
    assert_bool("(contains? (hash-map \"a\" 1) 'a)", true);
}

#[test]
fn test_map_keys_must_be_strings_or_keywords() {
    assert!(matches!(eval("(hash-map 1 2)"), Err(Error::InvalidMapKey(_))));
    assert!(matches!(eval("(hash-map \"a\")"), Err(Error::InvalidMapKey(_))));
    assert!(matches!(
        eval("(assoc (hash-map) \"k\")"),
        Err(Error::InvalidMapKey(_))
    ));
}

// ==================== Printing ====================

#[test]
fn test_pr_str_quotes_strings() {
    assert_form("(pr-str \"a\" \"b\")", Form::string("\"a\" \"b\""));
    assert_form("(pr-str '(1 \"x\"))", Form::string("(1 \"x\")"));
    assert_form("(pr-str \"esc\\\"aped\")", Form::string("\"esc\\\"aped\""));
}

#[test]
fn test_str_concatenates_raw_text() {
    assert_form("(str \"a\" \"b\")", Form::string("ab"));
    assert_form("(str 1 2 nil)", Form::string("12nil"));
    assert_form("(str :k)", Form::string(":k"));
    assert_form("(str)", Form::string(""));
}

#[test]
fn test_output_builtins_return_nil() {
    assert_form("(prn \"side effect\")", Form::Nil);
    assert_form("(println \"side effect\")", Form::Nil);
}

// ==================== Reading and files ====================

#[test]
fn test_read_string_produces_a_form() {
    assert_form(
        "(read-string \"(1 2)\")",
        Form::list(vec![Form::Number(1), Form::Number(2)]),
    );
    assert_number("(eval (read-string \"(+ 1 2)\"))", 3);
}

#[test]
fn test_slurp_reports_missing_files() {
    match eval("(slurp \"/nonexistent/no-such-file\")") {
        Err(Error::Eval(message)) => assert!(message.contains("unable to read")),
        other => panic!("expected a read failure, got {other:?}"),
    }
}

#[test]
fn test_load_file_defines_into_the_session() {
    let path = std::env::temp_dir().join("tarn-core-tests-load.tarn");
    std::fs::write(&path, "(def! loaded-value 41)\n(def! bump (fn* (n) (+ n 1)))\n")
        .expect("temp file is writable");
    let (vm, env) = session();
    let program = format!("(load-file {:?})", path.display().to_string());
    assert_eq!(eval_in(&vm, &env, &program).unwrap(), Form::Nil);
    assert_eq!(
        eval_in(&vm, &env, "(bump loaded-value)").unwrap(),
        Form::Number(42)
    );
    std::fs::remove_file(&path).ok();
}

// ==================== Predicates ====================

#[test]
fn test_type_predicates() {
    assert_bool("(nil? nil)", true);
    assert_bool("(nil? false)", false);
    assert_bool("(true? true)", true);
    assert_bool("(true? 1)", false);
    assert_bool("(false? false)", true);
    assert_bool("(number? 3)", true);
    assert_bool("(number? \"3\")", false);
    assert_bool("(symbol? 'a)", true);
    assert_bool("(symbol? \"a\")", false);
    assert_bool("(keyword? :a)", true);
    assert_bool("(keyword? \"a\")", false);
    assert_bool("(list? '(1))", true);
    assert_bool("(list? (vector 1))", false);
    assert_bool("(vector? (vector 1))", true);
    assert_bool("(map? (hash-map))", true);
    assert_bool("(atom? (atom 1))", true);
    assert_bool("(atom? 1)", false);
}

#[test]
fn test_callable_predicates() {
    assert_bool("(fn? +)", true);
    assert_bool("(fn? (fn* () 1))", true);
    assert_bool("(fn? 'x)", false);
    assert_bool("(macro? +)", false);
    assert_bool("(macro? cond)", true);
    assert_bool("(fn? cond)", false);
}

// ==================== Metadata ====================

#[test]
fn test_meta_defaults_to_nil() {
    assert_form("(meta (fn* () 1))", Form::Nil);
    assert_form("(meta '(1 2))", Form::Nil);
}

#[test]
fn test_with_meta_attaches_without_mutating() {
    assert_number("(meta (with-meta (fn* () 1) 7))", 7);
    assert_form("(meta (with-meta '(1) \"m\"))", Form::string("m"));
    assert_form("(let* (a '(1) b (with-meta a 2)) (meta a))", Form::Nil);
}

#[test]
fn test_with_meta_preserves_behavior_and_equality() {
    assert_number("((with-meta (fn* (a) a) 9) 5)", 5);
    assert_bool("(= (with-meta '(1) 2) '(1))", true);
}

#[test]
fn test_with_meta_rejects_scalars() {
    assert!(matches!(eval("(with-meta 1 2)"), Err(Error::Type { .. })));
    assert!(matches!(eval("(meta 1)"), Err(Error::Type { .. })));
}

// ==================== Exceptions ====================

#[test]
fn test_throw_carries_the_value() {
    match eval("(throw 1)") {
        Err(Error::Thrown(payload)) => assert_eq!(payload, Form::Number(1)),
        other => panic!("expected a thrown value, got {other:?}"),
    }
    match eval("(throw (list 1 2))") {
        Err(Error::Thrown(payload)) => {
            assert_eq!(payload, Form::list(vec![Form::Number(1), Form::Number(2)]));
        }
        other => panic!("expected a thrown value, got {other:?}"),
    }
}

// ==================== Macro flag ====================

#[test]
fn test_macro_flag_rejects_builtins() {
    assert!(matches!(eval("(set-ismacro +)"), Err(Error::Type { .. })));
    assert!(matches!(eval("(unset-ismacro +)"), Err(Error::Type { .. })));
}

#[test]
fn test_ismacro_reads_the_flag() {
    assert_bool("(ismacro (fn* () 1))", false);
    assert_bool("(ismacro cond)", true);
    assert_bool("(ismacro +)", false);
}

// ==================== Arity ====================

#[test]
fn test_arity_errors_name_the_builtin() {
    match eval("(nth '(1))") {
        Err(Error::Arity { name, .. }) => assert_eq!(name, "nth"),
        other => panic!("expected an arity error, got {other:?}"),
    }
    match eval("(= 1)") {
        Err(Error::Arity { name, .. }) => assert_eq!(name, "="),
        other => panic!("expected an arity error, got {other:?}"),
    }
}
