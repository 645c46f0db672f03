//! Message-body splitting.
//!
//! [`tokenize`] turns the argument part of a message into tokens:
//!
//! - Space-separated words; runs of spaces never produce empty tokens
//! - Double-quoted spans become a single token with the quotes removed
//! - A closing quote must be followed by a space or the end of input
//!
//! A quote always opens a span, even in the middle of a word; the part of
//! the word before it is emitted as its own token. There are no escape
//! sequences.

use crate::error::ParsingError;

const QUOTE: char = '"';
const SEPARATOR: char = ' ';

/// Splits `input` into tokens, honoring double-quoted spans.
///
/// # Errors
///
/// - [`ParsingError::UnterminatedQuote`] when input ends inside a span
/// - [`ParsingError::ExpectedSpaceAfterQuote`] when a closing quote is
///   immediately followed by a non-space character
pub fn tokenize(input: &str) -> Result<Vec<String>, ParsingError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            QUOTE => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }

                let mut quoted = String::new();
                loop {
                    match chars.next() {
                        Some(QUOTE) => break,
                        Some(c) => quoted.push(c),
                        None => return Err(ParsingError::UnterminatedQuote),
                    }
                }

                // The separator after a span is consumed here.
                match chars.next() {
                    None | Some(SEPARATOR) => {}
                    Some(_) => return Err(ParsingError::ExpectedSpaceAfterQuote),
                }

                tokens.push(quoted);
            }
            SEPARATOR => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Splits a prefix-stripped body into the command name and the remainder.
///
/// The body is trimmed first; the name is the first whitespace-delimited
/// word. Returns `None` for a blank body.
pub fn split_command(body: &str) -> Option<(&str, &str)> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match body.split_once(char::is_whitespace) {
        Some((name, rest)) => Some((name, rest.trim_start())),
        None => Some((body, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_spaces() {
        assert_eq!(tokenize("hello world").unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(tokenize(r#""hello" "world""#).unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_words_and_quotes() {
        let tokens = tokenize(r#""hello, world!" hello world oh "snap!" "another""#).unwrap();
        assert_eq!(
            tokens,
            vec!["hello, world!", "hello", "world", "oh", "snap!", "another"]
        );
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        assert_eq!(
            tokenize(r#""Invalid"#).unwrap_err(),
            ParsingError::UnterminatedQuote
        );
    }

    #[test]
    fn test_tokenize_non_space_after_quote() {
        assert_eq!(
            tokenize(r#""uh oh!"@"#).unwrap_err(),
            ParsingError::ExpectedSpaceAfterQuote
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("     ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_collapses_spaces() {
        assert_eq!(tokenize("  a    b  ").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_tokenize_quote_mid_word() {
        assert_eq!(tokenize(r#"ab"c d" e"#).unwrap(), vec!["ab", "c d", "e"]);
    }

    #[test]
    fn test_tokenize_empty_quotes() {
        assert_eq!(tokenize(r#""" x"#).unwrap(), vec!["", "x"]);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("greet Ada 3"), Some(("greet", "Ada 3")));
        assert_eq!(split_command("  ping  "), Some(("ping", "")));
        assert_eq!(split_command("say \t hi there"), Some(("say", "hi there")));
        assert_eq!(split_command("   "), None);
    }
}
