//! Screenshot → stats record.
//!
//! Runs the OCR engine once, then locate → tokenize → parse. Nothing is
//! retried; callers decide whether to ask for a clearer screenshot.
//!
//! When the text carries a recognizable column header and the row lines up
//! with it cell for cell, fields are read by header label. Otherwise they
//! are read by position.

use super::error::ExtractError;
use super::locate::{LocateOptions, locate_row, scan_rows};
use super::parse::{HeaderLayout, detect_date, parse_stat_row};
use super::stats::BoxScoreStats;
use super::tokenize::{StatRow, TokenizerMode, tokenize};
use crate::log;
use crate::ocr::{OcrEngine, RecognizedText};

/// Everything the pipeline needs besides the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExtractorSettings {
    pub locate: LocateOptions,
    pub tokenizer: TokenizerMode,
}

/// Anything that can turn a screenshot into one player's stats: the local
/// OCR pipeline or a remote parser.
pub trait BoxScoreSource {
    fn extract(&self, image: &[u8], identifier: &str) -> Result<BoxScoreStats, ExtractError>;
}

pub struct BoxScoreExtractor<E> {
    engine: E,
    settings: ExtractorSettings,
}

impl<E: OcrEngine> BoxScoreExtractor<E> {
    pub fn new(engine: E, settings: ExtractorSettings) -> Self {
        Self { engine, settings }
    }

    /// Recognizes `image` and extracts the stat line for `identifier`.
    pub fn extract(&self, image: &[u8], identifier: &str) -> Result<BoxScoreStats, ExtractError> {
        let text = self
            .engine
            .recognize(image)
            .map_err(|e| ExtractError::OcrUnavailable {
                reason: format!("{:#}", e),
            })?;

        if text.is_empty() {
            return Err(ExtractError::OcrUnavailable {
                reason: "no text recognized".to_string(),
            });
        }

        extract_from_text(&text, identifier, &self.settings)
    }
}

impl<E: OcrEngine> BoxScoreSource for BoxScoreExtractor<E> {
    fn extract(&self, image: &[u8], identifier: &str) -> Result<BoxScoreStats, ExtractError> {
        BoxScoreExtractor::extract(self, image, identifier)
    }
}

/// Runs the text stages on output the caller already has.
pub fn extract_from_text(
    text: &RecognizedText,
    identifier: &str,
    settings: &ExtractorSettings,
) -> Result<BoxScoreStats, ExtractError> {
    let row = locate_row(text, identifier, &settings.locate)?;
    log(&format!("Located row for '{}': {}", identifier, row.text));

    let tokens = tokenize(&row.text, settings.tokenizer)?;
    let header = scan_rows(text, &settings.locate, |line| {
        read_header(line, settings.tokenizer)
    });

    let mut stats = match header {
        Some(layout) if layout.width() == tokens.len() => {
            log("Reading row by header columns");
            layout.parse_row(&tokens)?
        }
        _ => parse_stat_row(&anchor_on_identifier(tokens, identifier))?,
    };
    stats.date = detect_date(&text.full_text());
    stats.team = stats.team.or(row.team);

    let anomalies = stats.shooting_anomalies();
    if !anomalies.is_empty() {
        log(&format!(
            "Warning: made > attempted for {} ({:?})",
            stats.username, anomalies
        ));
    }

    Ok(stats)
}

fn read_header(line: &str, mode: TokenizerMode) -> Option<HeaderLayout> {
    let tokens = tokenize(line, mode).ok()?;
    HeaderLayout::from_tokens(&tokens)
}

/// Drops tokens before the one containing the identifier (rank numbers,
/// team tags). Rows without such a token are returned unchanged.
fn anchor_on_identifier(tokens: StatRow, identifier: &str) -> StatRow {
    let target = identifier.trim().to_uppercase();
    match tokens
        .iter()
        .position(|t| t.to_uppercase().contains(&target))
    {
        Some(start) if start > 0 => tokens.into_iter().skip(start).collect(),
        _ => tokens,
    }
}

/// Discriminated outcome of one extraction, for callers that branch on the
/// failure class rather than propagate it.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Success(BoxScoreStats),
    PlayerNotFound(String),
    IncompleteRow(String),
    MalformedField(String),
    OcrUnavailable(String),
    RemoteFailure(String),
}

impl Extraction {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Human-readable message for failures.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::PlayerNotFound(msg)
            | Self::IncompleteRow(msg)
            | Self::MalformedField(msg)
            | Self::OcrUnavailable(msg)
            | Self::RemoteFailure(msg) => Some(msg),
        }
    }
}

impl From<Result<BoxScoreStats, ExtractError>> for Extraction {
    fn from(result: Result<BoxScoreStats, ExtractError>) -> Self {
        match result {
            Ok(stats) => Self::Success(stats),
            Err(e) => {
                let msg = e.to_string();
                match e {
                    ExtractError::PlayerNotFound { .. } => Self::PlayerNotFound(msg),
                    ExtractError::IncompleteRow { .. } => Self::IncompleteRow(msg),
                    ExtractError::MalformedField { .. } => Self::MalformedField(msg),
                    ExtractError::OcrUnavailable { .. } => Self::OcrUnavailable(msg),
                    ExtractError::Remote { .. } | ExtractError::Network(_) => {
                        Self::RemoteFailure(msg)
                    }
                }
            }
        }
    }
}
