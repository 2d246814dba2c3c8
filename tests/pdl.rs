//! PDL grammar tests: what parses, what the AST looks like, and how malformed input fails.

use pdl_json::ast::{Primitive, TypeRef};
use pdl_json::error::LexErrorKind;
use pdl_json::lexer::Keyword;
use pdl_json::parser::{parse_with_indent_unit, MAX_NESTING};
use pdl_json::{parse, tokenize, EmptyInputError, Error, TokenKind};

// ==================== Syntax: valid documents ====================

#[test]
fn parse_inline_version() {
    let p = parse("version 1 3\ndomain A\n").expect("parse");
    assert_eq!((p.version.major, p.version.minor), (1, 3));
    assert_eq!(p.domains[0].name, "A");
}

#[test]
fn parse_block_version() {
    let src = "version\n  major 1\n  minor 3\n\ndomain A\n";
    let p = parse(src).expect("parse");
    assert_eq!((p.version.major, p.version.minor), (1, 3));
}

#[test]
fn parse_block_version_in_any_order() {
    let src = "version\n  minor 7\n  major 2\ndomain A\n";
    let p = parse(src).expect("parse");
    assert_eq!((p.version.major, p.version.minor), (2, 7));
}

#[test]
fn parse_domain_flags_leading_and_trailing() {
    let src = "\
version 1 0
experimental domain A
domain B deprecated
experimental domain C deprecated
";
    let p = parse(src).expect("parse");
    assert!(p.domains[0].flags.experimental && !p.domains[0].flags.deprecated);
    assert!(!p.domains[1].flags.experimental && p.domains[1].flags.deprecated);
    assert!(p.domains[2].flags.experimental && p.domains[2].flags.deprecated);
}

#[test]
fn parse_dependencies_inline_and_in_block() {
    let src = "\
version 1 0
domain Page depends on DOM, Network
  depends on Runtime
  depends on IO
";
    let p = parse(src).expect("parse");
    assert_eq!(p.domains[0].dependencies, vec!["DOM", "Network", "Runtime", "IO"]);
}

#[test]
fn parse_all_primitive_types() {
    let src = "\
version 1 0
domain A
  command c
    parameters
      integer a
      number b
      boolean c
      string d
      object e
      any f
      array g
      binary h
";
    let p = parse(src).expect("parse");
    let kinds: Vec<&TypeRef> = p.domains[0].commands[0].parameters.iter().map(|p| &p.ty).collect();
    assert_eq!(
        kinds,
        vec![
            &TypeRef::Primitive(Primitive::Integer),
            &TypeRef::Primitive(Primitive::Number),
            &TypeRef::Primitive(Primitive::Boolean),
            &TypeRef::Primitive(Primitive::String),
            &TypeRef::Primitive(Primitive::Object),
            &TypeRef::Primitive(Primitive::Any),
            &TypeRef::Primitive(Primitive::Array),
            &TypeRef::Primitive(Primitive::Binary),
        ]
    );
}

#[test]
fn parse_type_references_and_arrays() {
    let src = "\
version 1 0
domain A
  type Ids extends array of integer
  type Grid extends array of array of Runtime.RemoteObject
  type Alias extends Ids
";
    let p = parse(src).expect("parse");
    let types = &p.domains[0].types;
    assert_eq!(
        types[0].kind,
        TypeRef::Array(Box::new(TypeRef::Primitive(Primitive::Integer)))
    );
    assert_eq!(
        types[1].kind,
        TypeRef::Array(Box::new(TypeRef::Array(Box::new(TypeRef::Named(
            "Runtime.RemoteObject".to_string()
        )))))
    );
    assert_eq!(types[2].kind, TypeRef::Named("Ids".to_string()));
}

#[test]
fn parse_enum_type() {
    let src = "\
version 1 0
domain A
  type Mode extends string
    enum
      light
      dark
      \"high contrast\"
      2x
";
    let p = parse(src).expect("parse");
    assert_eq!(
        p.domains[0].types[0].kind,
        TypeRef::Enum(vec![
            "light".to_string(),
            "dark".to_string(),
            "high contrast".to_string(),
            "2x".to_string(),
        ])
    );
}

#[test]
fn parse_object_type_with_properties() {
    let src = "\
version 1 0
domain A
  type Rect extends object
    properties
      number x
      optional number y
      array of Rect children
";
    let p = parse(src).expect("parse");
    let TypeRef::Object(properties) = &p.domains[0].types[0].kind else {
        panic!("expected object type");
    };
    assert_eq!(properties.len(), 3);
    assert!(properties[1].optional);
    assert_eq!(
        properties[2].ty,
        TypeRef::Array(Box::new(TypeRef::Named("Rect".to_string())))
    );
}

#[test]
fn parse_inline_enum_and_object_parameters() {
    let src = "\
version 1 0
domain A
  event changed
    parameters
      optional enum reason
        user
        script
      object detail
        string id
      array of enum levels
        low
        high
";
    let p = parse(src).expect("parse");
    let params = &p.domains[0].events[0].parameters;
    assert_eq!(params[0].ty, TypeRef::Enum(vec!["user".to_string(), "script".to_string()]));
    assert!(params[0].optional);
    let TypeRef::Object(detail) = &params[1].ty else {
        panic!("expected inline object");
    };
    assert_eq!(detail[0].name, "id");
    assert_eq!(
        params[2].ty,
        TypeRef::Array(Box::new(TypeRef::Enum(vec!["low".to_string(), "high".to_string()])))
    );
}

#[test]
fn parse_redirect_inline_and_in_block() {
    let src = "\
version 1 0
domain A
  command a redirect B
  event e
    redirect C
";
    let p = parse(src).expect("parse");
    assert_eq!(p.domains[0].commands[0].redirect.as_deref(), Some("B"));
    assert_eq!(p.domains[0].events[0].redirect.as_deref(), Some("C"));
}

#[test]
fn parse_parameter_flags() {
    let src = "\
version 1 0
domain A
  command a
    parameters
      experimental optional string x
      deprecated integer y
";
    let p = parse(src).expect("parse");
    let params = &p.domains[0].commands[0].parameters;
    assert!(params[0].flags.experimental && params[0].optional);
    assert!(params[1].flags.deprecated && !params[1].optional);
}

#[test]
fn parse_comments_attach_to_next_declaration() {
    let src = "\
# Protocol notes.
version 1 0

# About A.
# Second line.
domain A
  # Detached.

  # About T.
  type T extends string # trailing
";
    let p = parse(src).expect("parse");
    assert_eq!(p.comments, vec![" Protocol notes."]);
    assert_eq!(p.domains[0].comments, vec![" About A.", " Second line."]);
    assert_eq!(p.domains[0].types[0].comments, vec![" About T.", " trailing"]);
}

#[test]
fn parse_windows_line_endings() {
    let src = "version 1 0\r\ndomain A\r\n  command c\r\n";
    let p = parse(src).expect("parse");
    assert_eq!(p.domains[0].commands[0].name, "c");
}

#[test]
fn parse_custom_indent_unit() {
    let src = "version 1 0\ndomain A\n    command c\n        parameters\n            string x\n";
    let p = parse_with_indent_unit(src, 4).expect("parse");
    assert_eq!(p.domains[0].commands[0].parameters[0].name, "x");
}

#[test]
fn lexer_keywords_and_words() {
    let tokens = tokenize("experimental type Runtime.RemoteObject $x").expect("tokenize");
    assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Experimental));
    assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::Type));
    assert_eq!(tokens[2].kind, TokenKind::Identifier("Runtime.RemoteObject".to_string()));
    assert_eq!(tokens[3].kind, TokenKind::Identifier("$x".to_string()));
}

// ==================== Syntax: invalid documents ====================

fn parse_error(src: &str) -> (usize, String) {
    match parse(src) {
        Err(Error::Parse(err)) => (err.position.line, err.message),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn empty_input_is_missing_version() {
    assert!(matches!(parse(""), Err(Error::Empty(EmptyInputError::MissingVersion))));
    assert!(matches!(
        parse("# only a comment\n\n"),
        Err(Error::Empty(EmptyInputError::MissingVersion))
    ));
    assert!(matches!(
        parse("domain A\n"),
        Err(Error::Empty(EmptyInputError::MissingVersion))
    ));
}

#[test]
fn version_without_domains_is_empty() {
    assert!(matches!(
        parse("version 1 0\n"),
        Err(Error::Empty(EmptyInputError::NoDomains))
    ));
}

#[test]
fn reject_duplicate_version() {
    let (line, message) = parse_error("version 1 0\nversion 1 1\ndomain A\n");
    assert_eq!(line, 2);
    assert!(message.contains("duplicate version"), "{}", message);
}

#[test]
fn reject_incomplete_block_version() {
    let (_, message) = parse_error("version\n  major 1\ndomain A\n");
    assert!(message.contains("missing `minor`"), "{}", message);
}

#[test]
fn reject_non_numeric_version() {
    let (line, message) = parse_error("version one 0\ndomain A\n");
    assert_eq!(line, 1);
    assert!(message.contains("expected"), "{}", message);
}

#[test]
fn reject_duplicate_domain() {
    let (line, message) = parse_error("version 1 0\ndomain A\ndomain A\n");
    assert_eq!(line, 3);
    assert!(message.contains("duplicate domain `A`"), "{}", message);
}

#[test]
fn reject_duplicate_members() {
    let (line, message) =
        parse_error("version 1 0\ndomain A\n  type T extends string\n  type T extends integer\n");
    assert_eq!(line, 4);
    assert!(message.contains("duplicate type `T` in domain `A`"), "{}", message);

    let (_, message) = parse_error("version 1 0\ndomain A\n  event e\n  event e\n");
    assert!(message.contains("duplicate event `e`"), "{}", message);
}

#[test]
fn reject_returns_on_event() {
    let (line, message) =
        parse_error("version 1 0\ndomain A\n  event e\n    returns\n      string x\n");
    assert_eq!(line, 4);
    assert!(message.contains("events cannot declare `returns`"), "{}", message);
}

#[test]
fn reject_enum_on_non_string_type() {
    let (_, message) =
        parse_error("version 1 0\ndomain A\n  type T extends integer\n    enum\n      a\n");
    assert!(message.contains("requires `extends string`"), "{}", message);
}

#[test]
fn reject_properties_on_non_object_type() {
    let (_, message) = parse_error(
        "version 1 0\ndomain A\n  type T extends string\n    properties\n      string a\n",
    );
    assert!(message.contains("requires `extends object`"), "{}", message);
}

#[test]
fn reject_missing_parameter_name() {
    let (line, message) =
        parse_error("version 1 0\ndomain A\n  command c\n    parameters\n      string\n");
    assert_eq!(line, 5);
    assert!(message.contains("expected parameter name"), "{}", message);
}

#[test]
fn reject_unknown_domain_member() {
    let (line, message) = parse_error("version 1 0\ndomain A\n  method m\n");
    assert_eq!(line, 3);
    assert!(message.contains("`type`, `command`, `event`"), "{}", message);
}

#[test]
fn reject_indentation_skipping_a_level() {
    let (line, message) = parse_error("version 1 0\ndomain A\n  command c\n      parameters\n");
    assert_eq!(line, 4);
    assert!(message.contains("expected 4 spaces, found 6"), "{}", message);
}

#[test]
fn accept_array_nesting_up_to_limit() {
    let src = format!(
        "version 1 0\ndomain A\n  command c\n    parameters\n      {}string x\n",
        "array of ".repeat(MAX_NESTING)
    );
    let p = parse(&src).expect("parse");
    let mut ty = &p.domains[0].commands[0].parameters[0].ty;
    let mut depth = 0;
    while let TypeRef::Array(inner) = ty {
        depth += 1;
        ty = &**inner;
    }
    assert_eq!(depth, MAX_NESTING);
    assert_eq!(*ty, TypeRef::Primitive(Primitive::String));
}

#[test]
fn reject_deep_array_nesting() {
    let src = format!(
        "version 1 0\ndomain A\n  command c\n    parameters\n      {}string x\n",
        "array of ".repeat(5000)
    );
    let (line, message) = parse_error(&src);
    assert_eq!(line, 5);
    assert!(message.contains("array nesting too deep"), "{}", message);
}

#[test]
fn reject_deep_block_nesting() {
    let mut src = String::from("version 1 0\ndomain A\n  command c\n    parameters\n");
    for level in 3..(MAX_NESTING + 4) {
        src.push_str(&format!("{}object o{}\n", "  ".repeat(level), level));
    }
    let (_, message) = parse_error(&src);
    assert!(message.contains("blocks nested too deep"), "{}", message);
}

#[test]
fn blank_lines_may_contain_tabs() {
    let p = parse("version 1 0\n\t\ndomain A\n  \t\n  command c\n").expect("parse");
    assert_eq!(p.domains[0].commands[0].name, "c");
}

#[test]
fn reject_tab_indentation() {
    match parse("version 1 0\ndomain A\n\tcommand c\n") {
        Err(Error::Lex(err)) => {
            assert_eq!(err.kind, LexErrorKind::TabIndent);
            assert_eq!((err.position.line, err.position.column), (3, 1));
        }
        other => panic!("expected lex error, got {:?}", other),
    }
}

#[test]
fn reject_misaligned_indentation() {
    match parse("version 1 0\ndomain A\n   command c\n") {
        Err(Error::Lex(err)) => {
            assert_eq!(err.kind, LexErrorKind::MisalignedIndent { width: 3, unit: 2 });
        }
        other => panic!("expected lex error, got {:?}", other),
    }
}

#[test]
fn reject_dedent_to_unopened_level() {
    let err = tokenize("a\n    b\n  c\n").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::InconsistentDedent { width: 2 });
    assert_eq!(err.position.line, 3);
}

#[test]
fn reject_invalid_character() {
    match parse("version 1 0\ndomain A@\n") {
        Err(Error::Lex(err)) => {
            assert_eq!(err.kind, LexErrorKind::InvalidCharacter('@'));
            assert_eq!((err.position.line, err.position.column), (2, 9));
        }
        other => panic!("expected lex error, got {:?}", other),
    }
}

#[test]
fn error_display_includes_position() {
    let err = parse("version 1 0\ndomain A\n  method m\n").unwrap_err();
    assert_eq!(err.position().map(|p| (p.line, p.column)), Some((3, 3)));
    assert!(err.to_string().starts_with("parse error at 3:3: "), "{}", err);
}
