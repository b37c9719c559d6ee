//! Tokenizer Tests
//!
//! Token kinds, text and positions for single tokens and whole stylesheets.

use csskit::tokenizer::tokenize;
use csskit::{ProcessOptions, Session};

type Expected<'a> = (&'a str, &'a str, Option<(usize, usize)>, Option<(usize, usize)>);

fn run(css: &str, ignore_errors: bool) -> csskit::Result<Vec<(String, String, Option<(usize, usize)>, Option<(usize, usize)>)>> {
    let input = Session::new().input(css, &ProcessOptions::default())?;
    let tokens = tokenize(&input, ignore_errors)?;
    Ok(tokens
        .iter()
        .map(|token| {
            (
                token.kind.as_str().to_string(),
                token.text.to_string(),
                token.start.map(|p| (p.line, p.column)),
                token.end.map(|p| (p.line, p.column)),
            )
        })
        .collect())
}

fn check(css: &str, expected: &[Expected<'_>]) {
    check_with(css, false, expected);
}

fn check_with(css: &str, ignore_errors: bool, expected: &[Expected<'_>]) {
    let actual = run(css, ignore_errors).unwrap();
    let expected: Vec<_> = expected
        .iter()
        .map(|(kind, text, start, end)| (kind.to_string(), text.to_string(), *start, *end))
        .collect();
    assert_eq!(actual, expected);
}

fn word<'a>(text: &'a str, start: (usize, usize), end: (usize, usize)) -> Expected<'a> {
    ("word", text, Some(start), Some(end))
}

fn punct<'a>(kind: &'a str, at: (usize, usize)) -> Expected<'a> {
    (kind, kind, Some(at), None)
}

fn space(text: &str) -> Expected<'_> {
    ("space", text, None, None)
}

fn error_message(css: &str) -> String {
    let error = run(css, false).unwrap_err();
    error.as_syntax().unwrap().message().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_tokenize_empty_file() {
        check("", &[]);
    }

    #[test]
    fn should_tokenize_space() {
        check("\r\n \x0c\t", &[space("\r\n \x0c\t")]);
    }

    #[test]
    fn should_tokenize_word() {
        check("ab", &[word("ab", (1, 1), (1, 2))]);
    }

    #[test]
    fn should_split_word_by_exclamation_mark() {
        check("aa!bb", &[word("aa", (1, 1), (1, 2)), word("!bb", (1, 3), (1, 5))]);
    }

    #[test]
    fn should_change_lines_in_spaces() {
        check(
            "a \n b",
            &[word("a", (1, 1), (1, 1)), space(" \n "), word("b", (2, 2), (2, 2))],
        );
    }

    #[test]
    fn should_tokenize_control_chars() {
        check(
            "{:;}",
            &[
                punct("{", (1, 1)),
                punct(":", (1, 2)),
                punct(";", (1, 3)),
                punct("}", (1, 4)),
            ],
        );
    }

    #[test]
    fn should_escape_control_symbols() {
        check(
            r#"\(\{\"\@\\"""#,
            &[
                word(r"\(", (1, 1), (1, 2)),
                word(r"\{", (1, 3), (1, 4)),
                word(r#"\""#, (1, 5), (1, 6)),
                word(r"\@", (1, 7), (1, 8)),
                word(r"\\", (1, 9), (1, 10)),
                ("string", r#""""#, Some((1, 11)), Some((1, 12))),
            ],
        );
    }

    #[test]
    fn should_escape_backslash() {
        check(r"\\\\{", &[word(r"\\\\", (1, 1), (1, 4)), punct("{", (1, 5))]);
    }

    #[test]
    fn should_escape_multibyte_characters() {
        check(
            "a\\é{}",
            &[
                word("a", (1, 1), (1, 1)),
                word("\\é", (1, 2), (1, 4)),
                punct("{", (1, 5)),
                punct("}", (1, 6)),
            ],
        );
        check(
            ".\\日本",
            &[
                word(".", (1, 1), (1, 1)),
                word("\\日", (1, 2), (1, 5)),
                word("本", (1, 6), (1, 8)),
            ],
        );
    }

    #[test]
    fn should_keep_backslash_at_end_of_input() {
        check("a\\", &[word("a", (1, 1), (1, 1)), word("\\", (1, 2), (1, 3))]);
    }

    #[test]
    fn should_tokenize_simple_brackets() {
        check("(ab)", &[("brackets", "(ab)", Some((1, 1)), Some((1, 4)))]);
    }

    #[test]
    fn should_tokenize_square_brackets() {
        check(
            "a[bc]",
            &[
                word("a", (1, 1), (1, 1)),
                punct("[", (1, 2)),
                word("bc", (1, 3), (1, 4)),
                punct("]", (1, 5)),
            ],
        );
    }

    #[test]
    fn should_tokenize_complicated_brackets() {
        check(
            "(())(\"\")(/**/)(\\\\)(\n)(",
            &[
                punct("(", (1, 1)),
                ("brackets", "()", Some((1, 2)), Some((1, 3))),
                punct(")", (1, 4)),
                punct("(", (1, 5)),
                ("string", "\"\"", Some((1, 6)), Some((1, 7))),
                punct(")", (1, 8)),
                punct("(", (1, 9)),
                ("comment", "/**/", Some((1, 10)), Some((1, 13))),
                punct(")", (1, 14)),
                punct("(", (1, 15)),
                word("\\\\", (1, 16), (1, 17)),
                punct(")", (1, 18)),
                punct("(", (1, 19)),
                space("\n"),
                punct(")", (2, 1)),
                punct("(", (2, 2)),
            ],
        );
    }

    #[test]
    fn should_tokenize_strings() {
        check(
            r#"'"'"\"""#,
            &[
                ("string", r#"'"'"#, Some((1, 1)), Some((1, 3))),
                ("string", r#""\"""#, Some((1, 4)), Some((1, 7))),
            ],
        );
        check(r#""\\""#, &[("string", r#""\\""#, Some((1, 1)), Some((1, 4)))]);
    }

    #[test]
    fn should_change_lines_in_strings() {
        check(
            "\"\n\n\"\"\n\n\"",
            &[
                ("string", "\"\n\n\"", Some((1, 1)), Some((3, 1))),
                ("string", "\"\n\n\"", Some((3, 2)), Some((5, 1))),
            ],
        );
    }

    #[test]
    fn should_tokenize_at_words() {
        check("@word ", &[("at-word", "@word", Some((1, 1)), Some((1, 5))), space(" ")]);
        check("@", &[("at-word", "@", Some((1, 1)), Some((1, 1)))]);
        check(
            r#"@one{@two()@three""@four;"#,
            &[
                ("at-word", "@one", Some((1, 1)), Some((1, 4))),
                punct("{", (1, 5)),
                ("at-word", "@two", Some((1, 6)), Some((1, 9))),
                ("brackets", "()", Some((1, 10)), Some((1, 11))),
                ("at-word", "@three", Some((1, 12)), Some((1, 17))),
                ("string", "\"\"", Some((1, 18)), Some((1, 19))),
                ("at-word", "@four", Some((1, 20)), Some((1, 24))),
                punct(";", (1, 25)),
            ],
        );
    }

    #[test]
    fn should_tokenize_urls() {
        check(
            r"url(/*\))",
            &[
                word("url", (1, 1), (1, 3)),
                ("brackets", r"(/*\))", Some((1, 4)), Some((1, 9))),
            ],
        );
        check(
            r#"url(")")"#,
            &[
                word("url", (1, 1), (1, 3)),
                punct("(", (1, 4)),
                ("string", r#"")""#, Some((1, 5)), Some((1, 7))),
                punct(")", (1, 8)),
            ],
        );
    }

    #[test]
    fn should_tokenize_comments() {
        check("/* a\nb */", &[("comment", "/* a\nb */", Some((1, 1)), Some((2, 4)))]);
        check(
            "a/* \n */b",
            &[
                word("a", (1, 1), (1, 1)),
                ("comment", "/* \n */", Some((1, 2)), Some((2, 3))),
                word("b", (2, 4), (2, 4)),
            ],
        );
    }

    #[test]
    fn should_support_line_feed_and_carriage_return() {
        check(
            "a\x0cb",
            &[word("a", (1, 1), (1, 1)), space("\x0c"), word("b", (2, 1), (2, 1))],
        );
        check(
            "a\rb\r\nc",
            &[
                word("a", (1, 1), (1, 1)),
                space("\r"),
                word("b", (2, 1), (2, 1)),
                space("\r\n"),
                word("c", (3, 1), (3, 1)),
            ],
        );
    }

    #[test]
    fn should_tokenize_stylesheet() {
        let css = "a {\n  content: \"a\";\n  width: calc(1px;)\n  }\n/* small screen */\n@media screen {}";
        check(
            css,
            &[
                word("a", (1, 1), (1, 1)),
                space(" "),
                punct("{", (1, 3)),
                space("\n  "),
                word("content", (2, 3), (2, 9)),
                punct(":", (2, 10)),
                space(" "),
                ("string", "\"a\"", Some((2, 12)), Some((2, 14))),
                punct(";", (2, 15)),
                space("\n  "),
                word("width", (3, 3), (3, 7)),
                punct(":", (3, 8)),
                space(" "),
                word("calc", (3, 10), (3, 13)),
                ("brackets", "(1px;)", Some((3, 14)), Some((3, 19))),
                space("\n  "),
                punct("}", (4, 3)),
                space("\n"),
                ("comment", "/* small screen */", Some((5, 1)), Some((5, 18))),
                space("\n"),
                ("at-word", "@media", Some((6, 1)), Some((6, 6))),
                space(" "),
                word("screen", (6, 8), (6, 13)),
                space(" "),
                punct("{", (6, 15)),
                punct("}", (6, 16)),
            ],
        );
    }

    #[test]
    fn should_fail_on_unclosed_constructs() {
        assert_eq!(error_message(" \""), "<css input>:1:2: Unclosed quote");
        assert_eq!(error_message(" /*"), "<css input>:1:2: Unclosed comment");
        assert_eq!(error_message("url("), "<css input>:1:4: Unclosed bracket");
    }

    #[test]
    fn should_ignore_unclosed_constructs_on_request() {
        check_with(" \"", true, &[space(" "), ("string", "\"", Some((1, 2)), Some((1, 3)))]);
        check_with(" /*", true, &[space(" "), ("comment", "/*", Some((1, 2)), Some((1, 4)))]);
        check_with(
            "url(",
            true,
            &[word("url", (1, 1), (1, 3)), ("brackets", "(", Some((1, 4)), Some((1, 4)))],
        );
    }
}
