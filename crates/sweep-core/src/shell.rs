//! Shell-word splitting.
//!
//! Rendered commands are executed directly, not through a shell, so the
//! tokenization into argv is an explicit part of the contract: words are
//! whitespace-delimited; single quotes are literal; double quotes group
//! and honor backslash escapes of `"` `\` `$` and backtick; a backslash
//! outside quotes escapes the next character.

use crate::error::{CoreError, CoreResult};

/// Split a command line into argv tokens with POSIX-style quoting rules.
pub fn split(command: &str) -> CoreResult<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    // Empty quoted strings ("" or '') still produce a word.
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\\' => {
                let escaped = chars.next().ok_or(CoreError::TrailingEscape)?;
                current.push(escaped);
                in_word = true;
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(CoreError::UnclosedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(e @ ('"' | '\\' | '$' | '`')) => current.push(e),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(CoreError::UnclosedQuote('"')),
                        },
                        Some(c) => current.push(c),
                        None => return Err(CoreError::UnclosedQuote('"')),
                    }
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}
