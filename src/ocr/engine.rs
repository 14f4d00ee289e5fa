use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::preprocess::{PreprocessOptions, SourceMapping, preprocess_image};
use super::setup::TesseractPaths;
use super::text::{BoundingBox, OcrEngine, OcrLine, OcrWord, RecognizedText};
use crate::log;

/// Shape of the output handed to the extraction core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrLayout {
    /// Individual words with boxes; rows are rebuilt by vertical position
    #[default]
    Words,
    /// Tesseract's own line grouping
    Lines,
}

/// Runs the Tesseract CLI on preprocessed screenshots.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    psm: u8,
    preprocess: PreprocessOptions,
    layout: OcrLayout,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, psm: u8, preprocess: PreprocessOptions, layout: OcrLayout) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            psm,
            preprocess,
            layout,
        }
    }

    /// Runs Tesseract with TSV output on an image already on disk.
    fn run_tsv(&self, input: &std::path::Path) -> Result<String> {
        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let mut cmd = Command::new(&self.executable);
        cmd.arg(input).arg(&output_base);
        if let Some(tessdata) = &self.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata);
        }
        let output = cmd
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to launch {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        Ok(tsv_content)
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &[u8]) -> Result<RecognizedText> {
        let (processed, mapping) = preprocess_image(image, &self.preprocess)?;

        let temp_input = NamedTempFile::with_suffix(".png")?;
        processed
            .save(temp_input.path())
            .context("Failed to write preprocessed image")?;

        let tsv = self.run_tsv(temp_input.path())?;
        let lines = to_source_coordinates(parse_tsv(&tsv), &mapping);
        log(&format!(
            "Tesseract recognized {} lines, {} words",
            lines.len(),
            lines.iter().map(|l| l.words.len()).sum::<usize>()
        ));

        Ok(match self.layout {
            OcrLayout::Lines => RecognizedText::Lines(lines),
            OcrLayout::Words => {
                RecognizedText::Words(lines.into_iter().flat_map(|l| l.words).collect())
            }
        })
    }
}

/// Parses Tesseract TSV output into lines of positioned words.
///
/// Words are grouped by (block, paragraph, line). Rows with negative
/// confidence or blank text are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<OcrWord> = Vec::new();

    // Skip header
    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let num = |i: usize| fields[i].trim().parse::<i32>().unwrap_or(-1);
        let level = num(0);
        let key = (num(2), num(3), num(4));
        let conf: f32 = fields[10].trim().parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        // Level 5 = word
        if level != 5 || text.is_empty() || conf < 0.0 {
            continue;
        }

        if current_key.is_some_and(|k| k != key) {
            push_line(&mut lines, std::mem::take(&mut current_words));
        }
        current_key = Some(key);

        let (left, top, width, height) = (num(6), num(7), num(8), num(9));
        current_words.push(OcrWord {
            text: text.to_string(),
            bbox: BoundingBox::new(left, top, left + width, top + height),
            confidence: conf,
        });
    }

    push_line(&mut lines, current_words);
    lines
}

/// Moves every word box from preprocessed-image pixels back to screenshot
/// pixels, so row tolerances mean the same thing with or without upscaling.
pub fn to_source_coordinates(mut lines: Vec<OcrLine>, mapping: &SourceMapping) -> Vec<OcrLine> {
    for word in lines.iter_mut().flat_map(|l| l.words.iter_mut()) {
        word.bbox = mapping.to_source(word.bbox);
    }
    lines
}

fn push_line(lines: &mut Vec<OcrLine>, words: Vec<OcrWord>) {
    if words.is_empty() {
        return;
    }
    let confidence = words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32;
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(OcrLine {
        text,
        words,
        confidence,
    });
}
