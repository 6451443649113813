//! Reader tests
//!
//! Fixed cases for the token-to-form layer plus a property check that
//! printed forms read back unchanged.

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tarn::form::MapKey;
use tarn::{Error, Form, pr_str, read_str};

fn assert_reads(source: &str, expected: Form) {
    match read_str(source) {
        Ok(form) => assert_eq!(form, expected, "for input {source}"),
        Err(e) => panic!("reading {source} failed: {e}"),
    }
}

// ==================== Blank input ====================

#[test]
fn test_blank_inputs_are_reported_as_blank() {
    for source in ["", "   ", "; only a comment", " , ,, ", "\n\n"] {
        assert!(
            matches!(read_str(source), Err(Error::Blank)),
            "for input {source:?}"
        );
    }
}

// ==================== One form at a time ====================

#[test]
fn test_reads_only_the_first_form() {
    assert_reads("1 2 3", Form::Number(1));
    // Whatever follows the first complete form is never inspected.
    assert_reads(
        "(+ 1 2) (junk",
        Form::list(vec![Form::symbol("+"), Form::Number(1), Form::Number(2)]),
    );
}

// ==================== Delimiters ====================

#[test]
fn test_unterminated_collections_name_the_missing_closer() {
    match read_str("(1 2") {
        Err(Error::Unbalanced(message)) => assert!(message.contains("expected ')'")),
        other => panic!("expected an unbalanced error, got {other:?}"),
    }
    match read_str("[1") {
        Err(Error::Unbalanced(message)) => assert!(message.contains("expected ']'")),
        other => panic!("expected an unbalanced error, got {other:?}"),
    }
    match read_str("{\"a\" 1") {
        Err(Error::Unbalanced(message)) => assert!(message.contains("expected '}'")),
        other => panic!("expected an unbalanced error, got {other:?}"),
    }
    match read_str("\"abc") {
        Err(Error::Unbalanced(message)) => assert!(message.contains("expected '\"'")),
        other => panic!("expected an unbalanced error, got {other:?}"),
    }
}

#[test]
fn test_stray_closers_are_rejected() {
    for source in [")", "]", "}", "  )"] {
        assert!(
            matches!(read_str(source), Err(Error::Unbalanced(_))),
            "for input {source:?}"
        );
    }
}

#[test]
fn test_empty_collections() {
    assert_reads("()", Form::list(vec![]));
    assert_reads("[]", Form::vector(vec![]));
    assert_reads("{}", Form::map(IndexMap::new()));
}

// ==================== Scalars ====================

#[test]
fn test_integer_literals() {
    assert_reads("123", Form::Number(123));
    assert_reads("-9", Form::Number(-9));
    assert_reads("9223372036854775807", Form::Number(i64::MAX));
}

#[test]
fn test_oversized_integer_literals_are_errors() {
    match read_str("9223372036854775808") {
        Err(Error::Eval(message)) => assert!(message.contains("out of range")),
        other => panic!("expected an overflow error, got {other:?}"),
    }
}

#[test]
fn test_reserved_words_and_near_misses() {
    assert_reads("nil", Form::Nil);
    assert_reads("true", Form::Bool(true));
    assert_reads("false", Form::Bool(false));
    // Longest match wins, so these are ordinary symbols.
    assert_reads("nils", Form::symbol("nils"));
    assert_reads("true?", Form::symbol("true?"));
}

#[test]
fn test_string_escapes() {
    assert_reads(r#""a\nb""#, Form::string("a\nb"));
    assert_reads(r#""say \"hi\"""#, Form::string("say \"hi\""));
    assert_reads(r#""back\\slash""#, Form::string("back\\slash"));
    // Unknown escapes keep the escaped character.
    assert_reads(r#""\q""#, Form::string("q"));
}

#[test]
fn test_keywords() {
    assert_reads(":kw", Form::keyword("kw"));
    assert_reads(":a1-b?", Form::keyword("a1-b?"));
}

// ==================== Sugar ====================

#[test]
fn test_quote_family_sugar() {
    let cases = [
        ("'x", "quote"),
        ("`x", "quasiquote"),
        ("~x", "unquote"),
        ("~@x", "splice-unquote"),
        ("@x", "deref"),
    ];
    for (source, symbol) in cases {
        assert_reads(
            source,
            Form::list(vec![Form::symbol(symbol), Form::symbol("x")]),
        );
    }
}

#[test]
fn test_meta_sugar_wraps_in_with_meta() {
    let mut entries = IndexMap::new();
    entries.insert(MapKey::Str("a".into()), Form::Number(1));
    assert_reads(
        "^{\"a\" 1} [1 2]",
        Form::list(vec![
            Form::symbol("with-meta"),
            Form::vector(vec![Form::Number(1), Form::Number(2)]),
            Form::map(entries),
        ]),
    );
}

// ==================== Collections ====================

#[test]
fn test_commas_and_comments_are_whitespace() {
    assert_reads(
        "(1, 2, ; trailing\n 3)",
        Form::list(vec![Form::Number(1), Form::Number(2), Form::Number(3)]),
    );
}

#[test]
fn test_map_literals() {
    let mut entries = IndexMap::new();
    entries.insert(MapKey::Str("a".into()), Form::Number(1));
    entries.insert(MapKey::Keyword("b".into()), Form::Number(2));
    assert_reads("{\"a\" 1 :b 2}", Form::map(entries));
}

#[test]
fn test_map_literals_reject_bad_shapes() {
    match read_str("{\"a\"}") {
        Err(Error::InvalidMapKey(message)) => assert!(message.contains("odd number")),
        other => panic!("expected an invalid key error, got {other:?}"),
    }
    assert!(matches!(read_str("{1 2}"), Err(Error::InvalidMapKey(_))));
}

// ==================== Nesting depth ====================

#[test]
fn test_deeply_nested_input_is_rejected() {
    let source = "(".repeat(100_000);
    assert!(matches!(read_str(&source), Err(Error::RecursionLimit)));
}

#[test]
fn test_long_quote_chains_are_rejected() {
    let mut source = "'".repeat(100_000);
    source.push('x');
    assert!(matches!(read_str(&source), Err(Error::RecursionLimit)));
}

#[test]
fn test_moderate_nesting_reads_fine() {
    let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    let mut expected = Form::Number(1);
    for _ in 0..100 {
        expected = Form::list(vec![expected]);
    }
    assert_reads(&source, expected);
}

// ==================== Round trip ====================

/// Forms whose printed representation is unambiguous. Symbols that look
/// like numbers or reserved words are filtered out because they read back
/// as the thing they look like.
fn arb_form() -> impl Strategy<Value = Form> {
    let scalar = prop_oneof![
        Just(Form::Nil),
        any::<bool>().prop_map(Form::Bool),
        any::<i64>().prop_map(Form::Number),
        "[a-z+*!?_<>=-][a-z0-9+*!?_<>=-]{0,6}"
            .prop_filter("reads back as itself", |s| {
                !matches!(s.as_str(), "nil" | "true" | "false")
                    && !(s.starts_with('-')
                        && s[1..].starts_with(|c: char| c.is_ascii_digit()))
            })
            .prop_map(Form::symbol),
        "[ -~\n]{0,12}".prop_map(Form::string),
        "[a-z][a-z0-9-]{0,6}".prop_map(Form::keyword),
    ];
    scalar.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Form::list),
            prop::collection::vec(inner.clone(), 0..5).prop_map(Form::vector),
            prop::collection::vec(("[a-z]{1,5}", inner), 0..4).prop_map(|pairs| {
                let mut entries = IndexMap::new();
                for (key, value) in pairs {
                    entries.insert(MapKey::Str(key), value);
                }
                Form::map(entries)
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_printed_forms_read_back_unchanged(form in arb_form()) {
        let printed = pr_str(&form, true);
        let reread = read_str(&printed);
        prop_assert!(reread.is_ok(), "{} does not read back: {:?}", printed, reread);
        prop_assert_eq!(reread.unwrap(), form, "printed as {}", printed);
    }

    #[test]
    fn test_reading_arbitrary_text_never_panics(source in "[ -~\n]{0,40}") {
        let _ = read_str(&source);
    }
}
