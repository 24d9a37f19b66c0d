//! Parsing of `key=value` override lines.

use std::collections::HashMap;

use crate::error::{Result, UpdateError};
use crate::types::ParameterOverride;

/// Requested overrides keyed by parameter name.
pub type Overrides = HashMap<String, String>;

/// Parse a single line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ParameterOverride>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (key, value) = line
        .split_once('=')
        .ok_or_else(|| UpdateError::Format(line.to_string()))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(UpdateError::EmptyPart(line.to_string()));
    }
    Ok(Some(ParameterOverride {
        key: key.to_string(),
        value: value.to_string(),
    }))
}

/// Parse every line into an override map. The first malformed line or
/// repeated key fails the whole parse. Empty input is a valid, empty result.
pub fn parse_lines<I, S>(lines: I) -> Result<Overrides>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Overrides::new();
    for line in lines {
        let Some(ParameterOverride { key, value }) = parse_line(line.as_ref())? else {
            continue;
        };
        if out.contains_key(&key) {
            return Err(UpdateError::DuplicateKey(key));
        }
        out.insert(key, value);
    }
    Ok(out)
}

/// Build the override map for single-parameter mode from a separate key and
/// value, applying the same trimming and non-empty rules as line parsing.
pub fn single(key: &str, value: &str) -> Result<Overrides> {
    let (k, v) = (key.trim(), value.trim());
    if k.is_empty() || v.is_empty() {
        return Err(UpdateError::EmptyPart(format!("{key}={value}")));
    }
    Ok(Overrides::from([(k.to_string(), v.to_string())]))
}
