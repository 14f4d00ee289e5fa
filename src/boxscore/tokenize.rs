//! Splits a located row into field tokens.
//!
//! OCR often reads a fraction like "9/16" as three tokens `9`, `/`, `16`;
//! [`repair_fractions`] glues those back together.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::error::ExtractError;
use super::parse::MIN_ROW_TOKENS;

/// Ordered tokens believed to belong to one player's stat line.
pub type StatRow = Vec<String>;

/// Whole-row pattern: identifier, grade, seven counting stats, then three
/// made/attempted pairs joined by `/` or `-`.
const ROW_PATTERN: &str = r"(?:^|\s)(\S+)\s+(\S+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s*[/-]\s*(\d+)\s+(\d+)\s*[/-]\s*(\d+)\s+(\d+)\s*[/-]\s*(\d+)";

static ROW_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ROW_PATTERN).expect("row pattern is valid"));

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerMode {
    /// Pipe split for fully `|`-delimited rows, whitespace split otherwise.
    #[default]
    Auto,
    Whitespace,
    Pipe,
    Pattern,
}

/// Tokenizes `row` according to `mode`.
pub fn tokenize(row: &str, mode: TokenizerMode) -> Result<StatRow, ExtractError> {
    match mode {
        TokenizerMode::Auto if is_pipe_delimited(row) => Ok(split_pipes(row)),
        // A lone `|` is usually a table rule misread between columns
        TokenizerMode::Auto => Ok(repair_fractions(&split_whitespace(&row.replace('|', " ")))),
        TokenizerMode::Whitespace => Ok(repair_fractions(&split_whitespace(row))),
        TokenizerMode::Pipe => Ok(split_pipes(row)),
        TokenizerMode::Pattern => match_row_pattern(row).ok_or_else(|| {
            let found = split_whitespace(row).len();
            if found < MIN_ROW_TOKENS {
                ExtractError::IncompleteRow {
                    found,
                    required: MIN_ROW_TOKENS,
                }
            } else {
                ExtractError::MalformedField {
                    field: "row",
                    value: row.to_string(),
                }
            }
        }),
    }
}

/// True when `|` separates every column rather than showing up once or twice.
fn is_pipe_delimited(row: &str) -> bool {
    row.matches('|').count() >= MIN_ROW_TOKENS - 1
}

pub fn split_whitespace(row: &str) -> StatRow {
    row.split_whitespace().map(str::to_string).collect()
}

/// Splits a `|`-delimited row, dropping empty cells.
pub fn split_pipes(row: &str) -> StatRow {
    row.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Merges `prev`, `/`, `next` triples into `prev/next`.
///
/// A slash directly after a merged token extends it (`9 / 16 / 3` becomes
/// `9/16/3`), so a second pass never finds anything left to merge. Every
/// other token keeps its relative order.
pub fn repair_fractions(tokens: &[String]) -> StatRow {
    let mut repaired: StatRow = Vec::with_capacity(tokens.len());
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if token == "/" && !repaired.is_empty() {
            if let Some(next) = iter.next() {
                if let Some(prev) = repaired.last_mut() {
                    prev.push('/');
                    prev.push_str(next);
                }
                continue;
            }
        }
        repaired.push(token.clone());
    }

    repaired
}

/// Matches the whole row against [`ROW_PATTERN`] and returns the 12
/// canonical tokens, with pairs normalized to `made/attempted`.
pub fn match_row_pattern(row: &str) -> Option<StatRow> {
    let caps = ROW_REGEX.captures(row)?;
    let field = |i: usize| caps[i].to_string();

    let mut tokens: StatRow = (1..=9).map(field).collect();
    for made in [10, 12, 14] {
        tokens.push(format!("{}/{}", &caps[made], &caps[made + 1]));
    }
    Some(tokens)
}
