//! Word list used to generate aliases.

use std::path::Path;

use tracing::info;

use crate::{OvooError, Result};

/// Built-in word list, one word per line.
const BUILTIN: &str = include_str!("../data/dictionary.txt");

/// Split newline-separated text into words, skipping blank lines.
pub fn parse(text: &str) -> Result<Vec<String>> {
    let words: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    if words.is_empty() {
        return Err(OvooError::Config("dictionary is empty".to_string()));
    }
    Ok(words)
}

/// The built-in word list.
pub fn builtin() -> Result<Vec<String>> {
    parse(BUILTIN)
}

/// Load the word list from `path`, or the built-in one when `None`.
pub fn load(path: Option<&Path>) -> Result<Vec<String>> {
    let words = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                OvooError::Config(format!("reading dictionary {}: {e}", path.display()))
            })?;
            parse(&text)?
        }
        None => builtin()?,
    };
    info!("Loaded dictionary with {} words", words.len());
    Ok(words)
}
