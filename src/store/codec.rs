//! Text encoding of list-valued columns.
//!
//! Lists are written as JSON arrays (`[]` when empty). Decoding is strict
//! JSON, with one extension: string lists in Python repr form
//! (`['Action', 'Drama']`), which older tables contain, are accepted too.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A list cell that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid list {value:?}: {reason}")]
pub struct CodecError {
    pub value: String,
    pub reason: String,
}

fn encode<T: Serialize>(items: &[T]) -> String {
    // Serializing plain integers and strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn decode_json<T: DeserializeOwned>(value: &str) -> Result<Vec<T>, CodecError> {
    serde_json::from_str(value.trim()).map_err(|e| CodecError {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

pub fn encode_ids(ids: &[i64]) -> String {
    encode(ids)
}

pub fn encode_names(names: &[String]) -> String {
    encode(names)
}

pub fn decode_ids(value: &str) -> Result<Vec<i64>, CodecError> {
    decode_json(value)
}

pub fn decode_names(value: &str) -> Result<Vec<String>, CodecError> {
    match decode_json(value) {
        Ok(names) => Ok(names),
        Err(json_err) => parse_quoted_list(value).ok_or(json_err),
    }
}

/// Parse a bracketed list of single- or double-quoted strings.
fn parse_quoted_list(value: &str) -> Option<Vec<String>> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    let mut items = Vec::new();
    if inner.is_empty() {
        return Some(items);
    }

    let mut chars = inner.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let quote = chars.next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => match chars.next()? {
                    'n' => item.push('\n'),
                    't' => item.push('\t'),
                    other => item.push(other),
                },
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => return Some(items),
            Some(',') => continue,
            Some(_) => return None,
        }
    }
}
