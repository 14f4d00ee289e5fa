//! Application configuration.
//!
//! Loads settings from config.json at startup. Provides row matching
//! tolerances, tokenizer selection, Tesseract location, preprocessing and
//! remote parser settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::boxscore::{ExtractorSettings, LocateOptions, RowAnchor, TokenizerMode};
use crate::ocr::{OcrLayout, PreprocessOptions};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// A rectangle in relative coordinates (0.0 to 1.0).
/// Used to crop the stats table out of a full-screen capture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of image width
    pub width: f32,
    /// Height as fraction of image height
    pub height: f32,
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Max vertical distance (pixels) between a word and the username word
    /// for both to count as the same table row, in screenshot pixels
    pub row_tolerance_px: i32,
    /// Which edge of the username box defines the row: "midpoint" or "top"
    pub row_anchor: RowAnchor,
    /// Similarity (0.0-1.0) above which a misread username still matches.
    /// Null disables fuzzy matching.
    pub fuzzy_threshold: Option<f32>,
    /// Match the username as a whole word instead of a substring
    pub exact_username: bool,
    /// Row tokenizer: "auto", "whitespace", "pipe" or "pattern"
    pub tokenizer: TokenizerMode,
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<String>,
    /// Explicit tessdata directory
    pub tessdata_dir: Option<String>,
    /// Tesseract page segmentation mode
    pub tesseract_psm: u8,
    /// Hand the core positioned words ("words") or Tesseract's lines ("lines")
    pub ocr_layout: OcrLayout,
    /// Contrast multiplier applied before binarization
    pub contrast: f32,
    /// Upscale the image 2x before OCR
    pub upscale: bool,
    /// Invert the binarized image (light text on a dark table)
    pub invert: bool,
    /// Region of the screenshot containing the stats table
    pub crop: Option<RelativeRect>,
    /// Base URL of a remote box-score parser; when set, local OCR is skipped
    pub remote_url: Option<String>,
    /// Timeout for remote parser requests (seconds)
    pub remote_timeout_secs: u64,
    /// Worker threads used by batch mode
    pub batch_workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            row_tolerance_px: 10,
            row_anchor: RowAnchor::Midpoint,
            fuzzy_threshold: None,
            exact_username: false,
            tokenizer: TokenizerMode::Auto,
            tesseract_path: None,
            tessdata_dir: None,
            tesseract_psm: 6,
            ocr_layout: OcrLayout::Words,
            contrast: 1.5,
            upscale: true,
            invert: false,
            crop: None,
            remote_url: None,
            remote_timeout_secs: 30,
            batch_workers: 2,
        }
    }
}

impl AppConfig {
    /// Settings handed to the extraction core.
    pub fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            locate: LocateOptions {
                row_tolerance: self.row_tolerance_px,
                anchor: self.row_anchor,
                fuzzy_threshold: self.fuzzy_threshold,
                exact: self.exact_username,
            },
            tokenizer: self.tokenizer,
        }
    }

    /// Image cleanup applied before local OCR.
    pub fn preprocess_options(&self) -> PreprocessOptions {
        PreprocessOptions {
            contrast: self.contrast,
            upscale: self.upscale,
            invert: self.invert,
            crop: self.crop,
        }
    }
}

/// Loads configuration from `path` or returns defaults.
pub fn load_config(config_path: &Path) -> AppConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    AppConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config(config_path: &Path) {
    let _ = CONFIG.set(load_config(config_path));
}

/// Returns the global configuration, or defaults if `init_config` was never called.
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::default)
}
