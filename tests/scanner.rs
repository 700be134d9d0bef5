#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use quill::error::QuillError;
    use quill::scanner::*;
    use quill::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, QuillError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_maximal_munch() {
        assert_token_sequence(
            "a >>> b ?:: ?. ?? ??= ** **= ... -> :: ++ -- >= <<",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::UNSIGNED_SHIFT_RIGHT, ">>>"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::OPTIONAL_STATIC, "?::"),
                (TokenType::OPTIONAL_DOT, "?."),
                (TokenType::NULLISH, "??"),
                (TokenType::NULLISH_EQUAL, "??="),
                (TokenType::POWER, "**"),
                (TokenType::POWER_EQUAL, "**="),
                (TokenType::TRIPLE_DOT, "..."),
                (TokenType::ARROW, "->"),
                (TokenType::DOUBLE_COLON, "::"),
                (TokenType::INC, "++"),
                (TokenType::DEC, "--"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SHIFT_LEFT, "<<"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var count = none\nclass Foo extends Bar",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "count"),
                (TokenType::EQUAL, "="),
                (TokenType::NONE, "none"),
                (TokenType::NEWLINE, "\n"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::EXTENDS, "extends"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_comments_keep_the_newline() {
        assert_token_sequence(
            "1 // ignored ( } \n2",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::NEWLINE, "\n"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_literal_values() {
        let tokens = tokenize(r#"1_000 3.14 "a\tb" 'it\'s'"#).unwrap();

        let values: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            values,
            vec![
                "NUMBER 1_000 1000.0".to_string(),
                "NUMBER 3.14 3.14".to_string(),
                "STRING \"a\\tb\" a\tb".to_string(),
                "STRING 'it\\'s' it's".to_string(),
                "EOF  null".to_string(),
            ]
        );
    }

    #[test]
    fn test_scanner_06_spans_track_lines_and_columns() {
        let tokens = tokenize("x\n  yy").unwrap();

        let yy = &tokens[2];
        assert_eq!(yy.lexeme, "yy");
        assert_eq!(yy.span.start.line, 2);
        assert_eq!(yy.span.start.col, 3);
        assert_eq!(yy.span.end.col, 5);
    }

    #[test]
    fn test_scanner_07_eof_span_follows_the_last_line() {
        let tokens = tokenize("a\nbc").unwrap();

        let eof = tokens.last().unwrap();
        assert_eq!(eof.token_type, TokenType::EOF);
        assert_eq!(eof.span.start.line, 2);
        assert_eq!(eof.span.start.col, 3);
        assert_eq!(eof.span.start, eof.span.end);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // `#` is a token of its own (HTML ids), `$` is not
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert!(results[2].is_err());
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[4], TokenType::HASH, "#");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error = results[2].as_ref().unwrap_err();
        assert!(
            error.to_string().contains("Unexpected character: $"),
            "got: {}",
            error
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let error = tokenize("\"never closed").unwrap_err();

        assert!(matches!(error, QuillError::Lex { .. }));
        assert!(error.to_string().contains("Unterminated string"));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let bytes = [b'1', 0xFF, b'2'];

        assert!(matches!(Scanner::from_bytes(&bytes), Err(QuillError::Utf8(_))));
    }
}
