use thiserror::Error;

use crate::env::EnvMap;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("invalid placeholder name: {0}")]
    InvalidName(String),
    #[error("unresolved placeholder: {0}")]
    Unresolved(String),
}

/// Replaces `{KEY}` with the value from `env`, falling back to the process
/// environment. `\{` and `\}` produce literal braces, and a brace that is not
/// followed by an identifier start is copied through, so JSON text survives.
pub fn expand_placeholders(input: &str, env: &EnvMap) -> Result<String, PlaceholderError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&next) if next == '{' || next == '}' => {
                    output.push(next);
                    chars.next();
                }
                _ => output.push('\\'),
            },
            '{' if chars.peek().copied().is_some_and(is_start_char) => {
                let mut key = String::new();
                for next in chars.by_ref() {
                    if next == '}' {
                        break;
                    }
                    key.push(next);
                }
                output.push_str(&lookup(&key, env)?);
            }
            _ => output.push(ch),
        }
    }

    Ok(output)
}

fn lookup(key: &str, env: &EnvMap) -> Result<String, PlaceholderError> {
    if !is_valid_key(key) {
        return Err(PlaceholderError::InvalidName(key.to_string()));
    }
    env.get(key)
        .cloned()
        .or_else(|| std::env::var(key).ok())
        .ok_or_else(|| PlaceholderError::Unresolved(key.to_string()))
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(is_start_char)
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
}

fn is_start_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}
