//! Watchlist parsing.
//!
//! Symbols are comma separated six-character KRX short codes, e.g.
//! `005930, 000660, 035420`.

use std::collections::HashSet;

pub const SYMBOL_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in watchlist")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("invalid symbol {0:?}: expected {SYMBOL_LEN} alphanumeric characters")]
    InvalidSymbol(String),
}

pub fn parse_watchlist(input: &str) -> Result<Vec<String>, WatchlistError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if symbol.len() != SYMBOL_LEN || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(WatchlistError::InvalidSymbol(symbol));
        }
        if !seen.insert(symbol.clone()) {
            return Err(WatchlistError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}
