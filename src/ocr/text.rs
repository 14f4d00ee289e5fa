//! Recognition output shared by every OCR backend.
//!
//! The extraction core only ever sees these types, so tests can hand it
//! synthetic recognition output instead of running a real engine.

use anyhow::Result;

/// Pixel rectangle locating a recognized token in the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BoundingBox {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Vertical midpoint, rounded down.
    pub fn mid_y(&self) -> i32 {
        (self.y0 + self.y1).div_euclid(2)
    }
}

/// A single recognized word with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// A line of recognized text. `words` may be empty for engines that only
/// report line strings.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub words: Vec<OcrWord>,
    pub confidence: f32,
}

impl OcrLine {
    /// The line's text, rebuilt from its words when the engine left it blank.
    pub fn display_text(&self) -> String {
        if self.text.trim().is_empty() {
            self.words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            self.text.clone()
        }
    }
}

/// Whatever shape of output the OCR capability provides.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizedText {
    /// Plain text, lines separated by newlines.
    Flat(String),
    Lines(Vec<OcrLine>),
    Words(Vec<OcrWord>),
}

impl RecognizedText {
    /// True when the engine produced no non-blank text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Flat(text) => text.trim().is_empty(),
            Self::Lines(lines) => lines.iter().all(|l| l.display_text().trim().is_empty()),
            Self::Words(words) => words.iter().all(|w| w.text.trim().is_empty()),
        }
    }

    /// All recognized text joined by newlines. Words are emitted one per line.
    pub fn full_text(&self) -> String {
        match self {
            Self::Flat(text) => text.clone(),
            Self::Lines(lines) => lines
                .iter()
                .map(|l| l.display_text())
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Words(words) => words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// An external text recognition capability.
///
/// Implementations may block for a long time (process spawn, GPU inference);
/// callers that need concurrency run independent calls on separate threads.
pub trait OcrEngine {
    fn recognize(&self, image: &[u8]) -> Result<RecognizedText>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &E {
    fn recognize(&self, image: &[u8]) -> Result<RecognizedText> {
        (**self).recognize(image)
    }
}
