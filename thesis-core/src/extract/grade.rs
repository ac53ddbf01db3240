use regex::Regex;
use std::sync::LazyLock;

use super::{ExtractError, Result};

/// First signed ASCII integer anywhere in the text. No word boundary
/// before the sign, so `-1` is read as minus one.
static FIRST_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+").expect("valid regex"));

/// Verdict of the grading call on one draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Accept,
    Reject(i64),
}

impl Grade {
    /// Reads a grading response. Exactly `1` accepts; any other integer
    /// rejects.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] when the response has no integer.
    pub fn parse(response: &str) -> Result<Self> {
        match extract_first_int(response)? {
            1 => Ok(Grade::Accept),
            other => Ok(Grade::Reject(other)),
        }
    }
}

pub fn extract_first_int(text: &str) -> Result<i64> {
    let token = FIRST_INT
        .find(text)
        .ok_or_else(|| ExtractError::Parse(format!("no integer in grading response: {:?}", text)))?;

    token
        .as_str()
        .parse()
        .map_err(|e| ExtractError::Parse(format!("bad integer {:?}: {}", token.as_str(), e)))
}
