//! Finds the text row belonging to one player.
//!
//! Matching is case-insensitive substring containment, so "ausWen" finds a
//! row containing "AUSWEN23". An identifier that is a substring of another
//! player's name matches whichever row comes first.

use serde::{Deserialize, Serialize};

use super::error::ExtractError;
use super::stats::Team;
use crate::ocr::{OcrWord, RecognizedText};

/// Default vertical band (pixels) for row reconstruction.
pub const DEFAULT_ROW_TOLERANCE: i32 = 10;

/// Which part of the username's bounding box defines the row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAnchor {
    #[default]
    Midpoint,
    Top,
}

impl RowAnchor {
    fn measure(self, word: &OcrWord) -> i32 {
        match self {
            Self::Midpoint => word.bbox.mid_y(),
            Self::Top => word.bbox.y0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocateOptions {
    pub row_tolerance: i32,
    pub anchor: RowAnchor,
    /// Fallback for misread usernames; `None` keeps matching exact-substring only.
    pub fuzzy_threshold: Option<f32>,
    /// Require a whole token equal to the identifier instead of a substring.
    pub exact: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            anchor: RowAnchor::Midpoint,
            fuzzy_threshold: None,
            exact: false,
        }
    }
}

/// A player's row plus the box-score section it was listed under.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatedRow {
    pub text: String,
    /// Nearest "AWAY"/"HOME" label at or above the row
    pub team: Option<Team>,
}

/// Returns the row for `identifier`, or `PlayerNotFound`.
pub fn locate_row(
    text: &RecognizedText,
    identifier: &str,
    opts: &LocateOptions,
) -> Result<LocatedRow, ExtractError> {
    let target = identifier.trim().to_uppercase();
    let not_found = || ExtractError::PlayerNotFound {
        identifier: identifier.to_string(),
    };

    if target.is_empty() {
        return Err(not_found());
    }

    let row = match text {
        RecognizedText::Flat(flat) => {
            let lines: Vec<String> = flat.lines().map(str::to_string).collect();
            locate_in_lines(&lines, &target, opts)
        }
        RecognizedText::Lines(lines) => {
            let lines: Vec<String> = lines.iter().map(|l| l.display_text()).collect();
            locate_in_lines(&lines, &target, opts)
        }
        RecognizedText::Words(words) => locate_in_words(words, &target, opts),
    };

    row.ok_or_else(not_found)
}

/// Rebuilds every row in reading order and returns the first one `read`
/// accepts. Used for rows that are not keyed by a player, like the header.
pub fn scan_rows<T>(
    text: &RecognizedText,
    opts: &LocateOptions,
    read: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    match text {
        RecognizedText::Flat(flat) => flat.lines().find_map(|l| read(l.trim())),
        RecognizedText::Lines(lines) => lines.iter().find_map(|l| read(l.display_text().trim())),
        RecognizedText::Words(words) => {
            let mut anchors: Vec<&OcrWord> = words.iter().collect();
            anchors.sort_by_key(|w| (opts.anchor.measure(w), w.bbox.x0));
            anchors
                .into_iter()
                .find_map(|anchor| read(&row_band(words, anchor, opts)))
        }
    }
}

fn matches_target(text: &str, target: &str, exact: bool) -> bool {
    let upper = text.to_uppercase();
    if exact {
        upper.split_whitespace().any(|token| token == target)
    } else {
        upper.contains(target)
    }
}

fn team_label(text: &str) -> Option<Team> {
    text.split_whitespace().find_map(Team::from_label)
}

/// Line strategy: first line containing the identifier.
fn locate_in_lines(lines: &[String], target: &str, opts: &LocateOptions) -> Option<LocatedRow> {
    let idx = lines
        .iter()
        .position(|l| matches_target(l, target, opts.exact))
        .or_else(|| fuzzy_line(lines, target, opts))?;

    Some(LocatedRow {
        text: lines[idx].trim().to_string(),
        team: lines[..=idx].iter().rev().find_map(|l| team_label(l)),
    })
}

fn fuzzy_line(lines: &[String], target: &str, opts: &LocateOptions) -> Option<usize> {
    let threshold = opts.fuzzy_threshold?;
    let mut best: Option<(usize, f32)> = None;
    for (idx, line) in lines.iter().enumerate() {
        for token in line.split_whitespace() {
            let score = similarity(&token.to_uppercase(), target);
            if score > threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
    }

    best.map(|(idx, score)| {
        crate::log(&format!(
            "Fuzzy matched '{}' on line {} (similarity {:.2})",
            target, idx, score
        ));
        idx
    })
}

/// Word strategy: rebuild the row from every word sharing the anchor word's
/// vertical band, ordered left to right.
fn locate_in_words(words: &[OcrWord], target: &str, opts: &LocateOptions) -> Option<LocatedRow> {
    let anchor = find_anchor_word(words, target, opts)?;
    let limit = opts.anchor.measure(anchor) + opts.row_tolerance;

    let team = words
        .iter()
        .filter(|w| opts.anchor.measure(w) <= limit)
        .filter_map(|w| Team::from_label(&w.text).map(|team| (opts.anchor.measure(w), team)))
        .max_by_key(|(y, _)| *y)
        .map(|(_, team)| team);

    Some(LocatedRow {
        text: row_band(words, anchor, opts),
        team,
    })
}

fn row_band(words: &[OcrWord], anchor: &OcrWord, opts: &LocateOptions) -> String {
    let center = opts.anchor.measure(anchor);

    let mut row: Vec<&OcrWord> = words
        .iter()
        .filter(|w| !w.text.trim().is_empty())
        .filter(|w| (opts.anchor.measure(w) - center).abs() <= opts.row_tolerance)
        .collect();
    row.sort_by_key(|w| w.bbox.x0);

    row.iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_anchor_word<'a>(
    words: &'a [OcrWord],
    target: &str,
    opts: &LocateOptions,
) -> Option<&'a OcrWord> {
    if let Some(word) = words
        .iter()
        .find(|w| matches_target(&w.text, target, opts.exact))
    {
        return Some(word);
    }

    let threshold = opts.fuzzy_threshold?;
    let mut best: Option<(&OcrWord, f32)> = None;
    for word in words {
        let candidate = word.text.trim().to_uppercase();
        if candidate.is_empty() {
            continue;
        }
        let score = similarity(&candidate, target);
        if score > threshold && best.is_none_or(|(_, s)| score > s) {
            best = Some((word, score));
        }
    }

    best.map(|(word, score)| {
        crate::log(&format!(
            "Fuzzy matched '{}' to word '{}' (similarity {:.2})",
            target, word.text, score
        ));
        word
    })
}

/// Normalized Levenshtein similarity in 0.0..=1.0.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    1.0 - prev[b.len()] as f32 / longest as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::text::{BoundingBox, OcrLine};

    fn word(text: &str, x0: i32, y0: i32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            bbox: BoundingBox::new(x0, y0, x0 + 40, y0 + 20),
            confidence: 90.0,
        }
    }

    fn line(text: &str) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            words: vec![],
            confidence: 90.0,
        }
    }

    #[test]
    fn test_line_match_is_case_insensitive_substring() {
        let text = RecognizedText::Lines(vec![
            line("PLAYER GRD PTS REB"),
            line("AUSWEN23 A+ 24 8 5 2 1 3 4 9/16 2/5 4/4"),
        ]);
        let row = locate_row(&text, "ausWen", &LocateOptions::default()).unwrap().text;
        assert!(row.starts_with("AUSWEN23 A+ 24"));
    }

    #[test]
    fn test_flat_text_scans_lines() {
        let text = RecognizedText::Flat("HOME\n  OtherUser B 10 4\n auswen A 21 5\n".into());
        let row = locate_row(&text, "AUSWEN", &LocateOptions::default()).unwrap().text;
        assert_eq!(row, "auswen A 21 5");
    }

    #[test]
    fn test_first_matching_line_wins() {
        let text = RecognizedText::Lines(vec![line("JOHNNY B 4"), line("JOHN A 20")]);
        let row = locate_row(&text, "john", &LocateOptions::default()).unwrap().text;
        assert_eq!(row, "JOHNNY B 4");
    }

    #[test]
    fn test_missing_identifier_is_player_not_found() {
        let text = RecognizedText::Lines(vec![line("AUSWEN A 21")]);
        let err = locate_row(&text, "NOBODY", &LocateOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ExtractError::PlayerNotFound {
                identifier: "NOBODY".to_string()
            }
        );
    }

    #[test]
    fn test_blank_identifier_never_matches() {
        let text = RecognizedText::Flat("AUSWEN A 21".into());
        assert!(locate_row(&text, "  ", &LocateOptions::default()).is_err());
    }

    #[test]
    fn test_word_row_reconstruction_orders_by_x() {
        // Words arrive out of order with slight vertical jitter
        let words = vec![
            word("24", 300, 102),
            word("OTHER", 0, 200),
            word("AUSWEN", 0, 100),
            word("A+", 150, 98),
            word("9/16", 900, 107),
            word("88", 150, 200),
        ];
        let text = RecognizedText::Words(words);
        let row = locate_row(&text, "auswen", &LocateOptions::default()).unwrap().text;
        assert_eq!(row, "AUSWEN A+ 24 9/16");
    }

    #[test]
    fn test_word_band_tolerance_is_inclusive() {
        let words = vec![
            word("AUSWEN", 0, 100),
            word("IN", 100, 110),  // exactly 10 px lower
            word("OUT", 200, 111), // 11 px lower
        ];
        let text = RecognizedText::Words(words);
        let row = locate_row(&text, "AUSWEN", &LocateOptions::default()).unwrap().text;
        assert_eq!(row, "AUSWEN IN");
    }

    #[test]
    fn test_top_anchor_uses_top_edge() {
        let tall = OcrWord {
            text: "TALL".into(),
            bbox: BoundingBox::new(100, 95, 140, 160),
            confidence: 90.0,
        };
        let text = RecognizedText::Words(vec![word("AUSWEN", 0, 100), tall]);
        let opts = LocateOptions {
            anchor: RowAnchor::Top,
            ..LocateOptions::default()
        };
        assert_eq!(locate_row(&text, "AUSWEN", &opts).unwrap().text, "AUSWEN TALL");

        // The tall box's midpoint sits far below the row
        let row = locate_row(&text, "AUSWEN", &LocateOptions::default()).unwrap().text;
        assert_eq!(row, "AUSWEN");
    }

    #[test]
    fn test_fuzzy_fallback_handles_misread_name() {
        let words = vec![word("T3STUSER", 0, 0), word("A", 100, 0), word("10", 200, 0)];
        let text = RecognizedText::Words(words);

        assert!(locate_row(&text, "TESTUSER", &LocateOptions::default()).is_err());

        let opts = LocateOptions {
            fuzzy_threshold: Some(0.8),
            ..LocateOptions::default()
        };
        assert_eq!(locate_row(&text, "TESTUSER", &opts).unwrap().text, "T3STUSER A 10");
    }

    #[test]
    fn test_fuzzy_fallback_on_lines() {
        let text = RecognizedText::Lines(vec![line("PLAYER GRD"), line("AUSVVEN A 21")]);
        let opts = LocateOptions {
            fuzzy_threshold: Some(0.6),
            ..LocateOptions::default()
        };
        assert_eq!(locate_row(&text, "AUSWEN", &opts).unwrap().text, "AUSVVEN A 21");
    }

    #[test]
    fn test_exact_mode_skips_longer_names() {
        let text = RecognizedText::Lines(vec![line("JOHNNY B 4"), line("JOHN A 20")]);
        let opts = LocateOptions {
            exact: true,
            ..LocateOptions::default()
        };
        assert_eq!(locate_row(&text, "john", &opts).unwrap().text, "JOHN A 20");
        assert!(locate_row(&text, "JOH", &opts).is_err());
    }

    #[test]
    fn test_team_from_section_heading() {
        let text = RecognizedText::Flat(
            "AWAY\nAUSWEN A 21 5\nHOME\nOtherUser B+ 10 4\n".into(),
        );
        let opts = LocateOptions::default();
        assert_eq!(locate_row(&text, "auswen", &opts).unwrap().team, Some(Team::Away));
        assert_eq!(locate_row(&text, "otheruser", &opts).unwrap().team, Some(Team::Home));

        let unlabeled = RecognizedText::Flat("AUSWEN A 21 5".into());
        assert_eq!(locate_row(&unlabeled, "auswen", &opts).unwrap().team, None);
    }

    #[test]
    fn test_team_from_nearest_label_above_word_row() {
        let words = vec![
            word("AWAY", 0, 20),
            word("AUSWEN", 0, 60),
            word("HOME", 0, 120),
            word("OTHER", 0, 160),
        ];
        let text = RecognizedText::Words(words);
        let opts = LocateOptions::default();
        assert_eq!(locate_row(&text, "AUSWEN", &opts).unwrap().team, Some(Team::Away));
        assert_eq!(locate_row(&text, "OTHER", &opts).unwrap().team, Some(Team::Home));
    }

    #[test]
    fn test_scan_rows_finds_first_accepted_row() {
        let words = vec![
            word("24", 300, 100),
            word("AUSWEN", 0, 100),
            word("PTS", 300, 40),
            word("PLAYER", 0, 42),
        ];
        let text = RecognizedText::Words(words);
        let header = scan_rows(&text, &LocateOptions::default(), |row| {
            row.contains("PTS").then(|| row.to_string())
        });
        assert_eq!(header.as_deref(), Some("PLAYER PTS"));

        let flat = RecognizedText::Flat("a\n b c \nd".into());
        assert_eq!(
            scan_rows(&flat, &LocateOptions::default(), |row| row.contains('b').then_some(row.len())),
            Some(3)
        );
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("TESTUSER", "TESTUSER"), 1.0);
        assert_eq!(similarity("T3STUSER", "TESTUSER"), 0.875);
        assert_eq!(similarity("", ""), 1.0);
        assert!(similarity("NOBODY", "AUSWEN") < 0.5);
    }
}
