//! Tests for the term-list parser.

use super::*;

#[test]
fn test_bare_fields() {
    let terms = parse_terms("name, likes");
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].name, "name");
    assert_eq!(terms[1].name, "likes");
    assert!(terms[0].alias.is_none());
    assert!(!terms[0].is_call());
}

#[test]
fn test_aliased_field() {
    let terms = parse_terms("name AS firstName");
    assert_eq!(terms[0].name, "name");
    assert_eq!(terms[0].alias.as_deref(), Some("firstName"));
    assert_eq!(terms[0].output_name(), "firstName");
}

#[test]
fn test_alias_keyword_is_case_insensitive() {
    let terms = parse_terms("UPPER(name) as uppername");
    assert_eq!(terms[0].function.as_deref(), Some("UPPER"));
    assert_eq!(terms[0].alias.as_deref(), Some("uppername"));
}

#[test]
fn test_function_call() {
    let terms = parse_terms("name, UPPER(name) AS upperName, likes");
    assert_eq!(terms.len(), 3);
    let call = &terms[1];
    assert_eq!(call.function.as_deref(), Some("UPPER"));
    assert_eq!(call.args_raw, "name");
    assert_eq!(call.args.len(), 1);
    assert_eq!(call.args[0].argument(), Argument::Field("name"));
    assert_eq!(call.output_name(), "upperName");
}

#[test]
fn test_quoted_argument_with_comma() {
    let terms = parse_terms("id, FORMAT(\"%d,%s\",id,name) AS v");
    assert_eq!(terms.len(), 2);
    let call = &terms[1];
    assert_eq!(call.args.len(), 3);
    assert_eq!(call.args[0].argument(), Argument::Literal("%d,%s"));
    assert_eq!(call.args[1].argument(), Argument::Field("id"));
    assert_eq!(call.args[2].argument(), Argument::Field("name"));
}

#[test]
fn test_single_quoted_literal() {
    let terms = parse_terms("DATEFORMAT('Y-m-d H:i:s',date) AS d");
    let args = &terms[0].args;
    assert_eq!(args[0].argument(), Argument::Literal("Y-m-d H:i:s"));
    assert_eq!(args[1].argument(), Argument::Field("date"));
}

#[test]
fn test_nested_call() {
    let terms = parse_terms("UPPER(TRIM(name, ' x')) AS n, id");
    assert_eq!(terms.len(), 2);
    let outer = &terms[0];
    assert_eq!(outer.function.as_deref(), Some("UPPER"));
    assert_eq!(outer.args.len(), 1);
    let inner = &outer.args[0];
    assert_eq!(inner.function.as_deref(), Some("TRIM"));
    assert!(matches!(inner.argument(), Argument::Call(_)));
    assert_eq!(inner.args[1].argument(), Argument::Literal(" x"));
}

#[test]
fn test_order_modifiers() {
    let terms = parse_order_terms("name ASC, likes DESC, code natural");
    assert_eq!(terms.len(), 3);
    assert!(!terms[0].descending);
    assert_eq!(terms[0].rest, "ASC");
    assert!(terms[1].descending);
    assert_eq!(terms[1].mode, CompareMode::Default);
    assert_eq!(terms[2].mode, CompareMode::Natural);
}

#[test]
fn test_order_by_function_with_modifier() {
    let terms = parse_order_terms("DATEFORMAT('Y-m-d',date) DESC, id");
    assert_eq!(terms[0].function.as_deref(), Some("DATEFORMAT"));
    assert_eq!(terms[0].args_raw, "'Y-m-d',date");
    assert_eq!(terms[0].rest, "DESC");
    assert!(terms[0].descending);
    assert!(!terms[1].descending);
}

#[test]
fn test_whitespace_and_line_breaks() {
    let terms = parse_terms("  name ,\n  likes  ,");
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].raw, "name");
    assert_eq!(terms[1].raw, "likes");
}

#[test]
fn test_unbalanced_parenthesis_is_not_fatal() {
    let terms = parse_terms("UPPER(name AS x, id");
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].function.as_deref(), Some("UPPER"));
}

#[test]
fn test_as_inside_quotes_is_not_an_alias() {
    let terms = parse_terms("CONCAT(name,' as ',id) AS label");
    assert_eq!(terms[0].alias.as_deref(), Some("label"));
    assert_eq!(terms[0].args.len(), 3);
    assert_eq!(terms[0].args[1].argument(), Argument::Literal(" as "));
}

#[test]
fn test_strip_quotes() {
    assert_eq!(strip_quotes("'abc'"), "abc");
    assert_eq!(strip_quotes("\"abc\""), "abc");
    assert_eq!(strip_quotes("abc"), "abc");
}
