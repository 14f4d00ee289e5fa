//! Box-score extraction: recognized text → one player's stat line.
//!
//! This module provides:
//! - Row location by username (line text or word bounding boxes), with the
//!   team section the row sits under
//! - Tokenizing with fraction repair, pipe splitting or a whole-row pattern
//! - Field parsing into [`BoxScoreStats`], by position or by header label
//! - The orchestrator tying those stages to an [`crate::ocr::OcrEngine`]

pub mod error;
pub mod extract;
pub mod locate;
pub mod parse;
pub mod stats;
pub mod tokenize;

pub use error::ExtractError;
pub use extract::{BoxScoreExtractor, BoxScoreSource, Extraction, ExtractorSettings};
pub use locate::{LocateOptions, RowAnchor};
pub use stats::BoxScoreStats;
pub use tokenize::TokenizerMode;
