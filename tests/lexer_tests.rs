mod common;

use audiolang::config::Config;
use audiolang::error::LexError;
use audiolang::lexer::{Lexer, Token, TokenKind, TokenValue};

use common::lex;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source)
        .expect("lexing failed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn declaration_token_stream() {
    assert_eq!(
        kinds("int x = 10;"),
        vec![
            TokenKind::Int,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::IntLiteral,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn identifier_carries_its_text() {
    let tokens = lex("foo_bar2").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].text(), "foo_bar2");
}

#[test]
fn keywords_are_not_identifiers() {
    assert_eq!(
        kinds("func void while Audio"),
        vec![
            TokenKind::Func,
            TokenKind::Void,
            TokenKind::While,
            TokenKind::Audio,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn integer_and_float_literals() {
    let tokens = lex("42 3.25").unwrap();
    assert_eq!(tokens[0].value, TokenValue::Int(42));
    assert_eq!(tokens[1].value, TokenValue::Float(3.25));
}

#[test]
fn trailing_dot_is_not_part_of_the_number() {
    let tokens = lex("10.").unwrap();
    assert_eq!(tokens[0].value, TokenValue::Int(10));
    assert_eq!(tokens[1].kind, TokenKind::Dot);
}

#[test]
fn second_dot_ends_a_float() {
    let tokens = lex("1.2.3").unwrap();
    assert_eq!(tokens[0].value, TokenValue::Float(1.2));
    assert_eq!(tokens[1].kind, TokenKind::Dot);
    assert_eq!(tokens[2].value, TokenValue::Int(3));
}

#[test]
fn integer_overflow_is_a_lex_error() {
    let err = lex("99999999999999999999").unwrap_err();
    assert!(matches!(err, LexError::InvalidNumber { .. }));
}

#[test]
fn string_escapes() {
    let tokens = lex(r#""a\nb\t\"c\\""#).unwrap();
    assert_eq!(tokens[0].text(), "a\nb\t\"c\\");
}

#[test]
fn invalid_escape_is_rejected() {
    let err = lex(r#""\q""#).unwrap_err();
    assert!(matches!(err, LexError::InvalidEscape { found: 'q', .. }));
}

#[test]
fn unterminated_string() {
    let err = lex("\"hello").unwrap_err();
    assert!(matches!(err, LexError::UnterminatedString { .. }));
}

#[test]
fn lone_ampersand_is_invalid() {
    let err = lex("a & b").unwrap_err();
    assert!(matches!(err, LexError::InvalidCharacter { found: '&', .. }));
}

#[test]
fn two_character_operators() {
    assert_eq!(
        kinds("== != <= >= && ||"),
        vec![
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LessEq,
            TokenKind::GreaterEq,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_are_skipped() {
    assert_eq!(
        kinds("1 /* a comment */ 2"),
        vec![TokenKind::IntLiteral, TokenKind::IntLiteral, TokenKind::Eof]
    );
}

#[test]
fn comment_directly_after_identifier() {
    let tokens = lex("abc/*c*/def").unwrap();
    assert_eq!(tokens[0].text(), "abc");
    assert_eq!(tokens[1].text(), "def");
    assert_eq!(tokens[2].kind, TokenKind::Eof);
}

#[test]
fn unterminated_comment() {
    let err = lex("1 /* never closed").unwrap_err();
    assert!(matches!(err, LexError::UnterminatedComment { .. }));
}

#[test]
fn identifier_length_limit() {
    let config = Config {
        max_identifier_length: 4,
        ..Config::default()
    };
    // Exactly at the limit is fine.
    let tokens = Lexer::new("abcd", &config).tokenize().unwrap();
    assert_eq!(tokens[0].text(), "abcd");
    let err = Lexer::new("abcde", &config).tokenize().unwrap_err();
    assert!(matches!(err, LexError::IdentifierTooLong { limit: 4, .. }));
}

#[test]
fn string_length_limit() {
    let config = Config {
        max_string_length: 3,
        ..Config::default()
    };
    assert!(Lexer::new("\"abc\"", &config).tokenize().is_ok());
    let err = Lexer::new("\"abcd\"", &config).tokenize().unwrap_err();
    assert!(matches!(err, LexError::StringTooLong { limit: 3, .. }));
}

#[test]
fn positions_track_lines_and_columns() {
    let tokens = lex("int x\nx = 1").unwrap();
    assert_eq!(tokens[0].pos.line, 1);
    assert_eq!(tokens[0].pos.column, 1);
    assert_eq!(tokens[2].pos.line, 2);
    assert_eq!(tokens[2].pos.column, 1);
}

#[test]
fn crlf_counts_as_one_newline() {
    let tokens = lex("1\r\n2").unwrap();
    assert_eq!(tokens[1].pos.line, 2);
}

#[test]
fn error_display_format() {
    let err = lex("\"open").unwrap_err();
    assert_eq!(err.to_string(), "[1, 1] ERROR Unterminated string literal.");
}

#[test]
fn iterator_stops_after_eof() {
    let mut lexer = Lexer::new("1", &Config::default());
    let collected: Vec<_> = lexer.by_ref().collect();
    assert_eq!(collected.len(), 2);
    assert!(lexer.next().is_none());
}

/// Source text a token would have been lexed from. Keywords, operators,
/// and punctuation come straight out of the kind's display form.
fn render(token: &Token) -> String {
    match (&token.kind, &token.value) {
        (TokenKind::Identifier, _) => token.text().to_string(),
        (TokenKind::StringLiteral, _) => format!("\"{}\"", token.text()),
        (_, TokenValue::Int(v)) => v.to_string(),
        (_, TokenValue::Float(v)) => v.to_string(),
        (kind, _) => kind.to_string().trim_matches('\'').to_string(),
    }
}

#[test]
fn relexing_rendered_tokens_reproduces_the_stream() {
    let source = "func int add(int a, int b) { return a + b; } \
                  List<float> xs = [1.5, 0.25]; \
                  string s = \"hi\"; \
                  bool ok = 1 <= 2 && s != \"no\";";
    let first = lex(source).expect("lexing failed");
    let rendered = first
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(render)
        .collect::<Vec<_>>()
        .join(" ");
    let second = lex(&rendered).expect("relexing failed");

    // Positions differ; kinds and payloads must not.
    let strip = |tokens: &[Token]| -> Vec<(TokenKind, TokenValue)> {
        tokens.iter().map(|t| (t.kind, t.value.clone())).collect()
    };
    assert_eq!(strip(&first), strip(&second));
    assert_eq!(second.last().map(|t| t.kind), Some(TokenKind::Eof));
}
