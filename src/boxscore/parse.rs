//! Maps row tokens to named stat fields, by position or by the table's
//! column header when one was recognized.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use super::error::ExtractError;
use super::stats::{BoxScoreStats, Team};

/// identifier, grade, seven counting stats, three shooting splits.
pub const MIN_ROW_TOKENS: usize = 12;

const COUNT_FIELDS: [&str; 7] = [
    "points",
    "rebounds",
    "assists",
    "steals",
    "blocks",
    "fouls",
    "turnovers",
];

const SPLIT_FIELDS: [&str; 3] = ["fgm/fga", "3pm/3pa", "ftm/fta"];

/// `2026-10-16` or `2026/10/16`
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b").expect("date pattern is valid")
});

/// `10/16/2026` or `10/16/26`
static US_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b").expect("date pattern is valid")
});

/// Parses a repaired token row.
///
/// Columns: `[identifier, grade, pts, reb, ast, stl, blk, fouls, to,
/// fgm/fga, 3pm/3pa, ftm/fta]`. A shooting split without a separator is
/// read from two consecutive tokens. Tokens after the last split are
/// ignored. The date is left empty.
pub fn parse_stat_row(tokens: &[String]) -> Result<BoxScoreStats, ExtractError> {
    if tokens.len() < MIN_ROW_TOKENS {
        return Err(ExtractError::IncompleteRow {
            found: tokens.len(),
            required: MIN_ROW_TOKENS,
        });
    }

    let mut counts = [0u32; 7];
    for (i, &field) in COUNT_FIELDS.iter().enumerate() {
        counts[i] = parse_count(&tokens[2 + i], field)?;
    }

    let mut idx = 2 + COUNT_FIELDS.len();
    let mut splits = [(0u32, 0u32); 3];
    for (i, &field) in SPLIT_FIELDS.iter().enumerate() {
        splits[i] = parse_split(tokens, &mut idx, field)?;
    }

    Ok(assemble(tokens[0].clone(), tokens[1].clone(), counts, splits))
}

fn assemble(
    username: String,
    grade: String,
    counts: [u32; 7],
    splits: [(u32, u32); 3],
) -> BoxScoreStats {
    let [points, rebounds, assists, steals, blocks, fouls, turnovers] = counts;
    let [(fgm, fga), (three_pm, three_pa), (ftm, fta)] = splits;

    BoxScoreStats {
        team: None,
        username,
        date: None,
        grade,
        points,
        rebounds,
        assists,
        steals,
        blocks,
        fouls,
        turnovers,
        fgm,
        fga,
        three_pm,
        three_pa,
        ftm,
        fta,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Column {
    Player,
    Team,
    Grade,
    /// Index into `COUNT_FIELDS`
    Count(usize),
    /// Index into `SPLIT_FIELDS`
    Split(usize),
    Unknown,
}

impl Column {
    fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "PLAYER" | "USERNAME" | "NAME" => Self::Player,
            "TEAM" => Self::Team,
            "GRD" | "GRADE" => Self::Grade,
            "PTS" => Self::Count(0),
            "REB" => Self::Count(1),
            "AST" => Self::Count(2),
            "STL" => Self::Count(3),
            "BLK" => Self::Count(4),
            "FOULS" | "PF" => Self::Count(5),
            "TO" | "TOV" => Self::Count(6),
            "FGM/FGA" => Self::Split(0),
            "3PM/3PA" => Self::Split(1),
            "FTM/FTA" => Self::Split(2),
            _ => Self::Unknown,
        }
    }
}

/// Column order read from the table header, e.g.
/// `PLAYER GRD PTS REB AST STL BLK FOULS TO FGM/FGA 3PM/3PA FTM/FTA`.
///
/// Labels are matched case-insensitively and may come in any order.
/// Unrecognized columns are kept as placeholders so later cells still
/// line up.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderLayout {
    columns: Vec<Column>,
}

impl HeaderLayout {
    /// Recognizes a header row. The player, grade and every stat column
    /// must be present.
    pub fn from_tokens(tokens: &[String]) -> Option<Self> {
        let columns: Vec<Column> = tokens.iter().map(|t| Column::from_label(t)).collect();
        let has = |column: Column| columns.contains(&column);

        let complete = has(Column::Player)
            && has(Column::Grade)
            && (0..COUNT_FIELDS.len()).all(|i| has(Column::Count(i)))
            && (0..SPLIT_FIELDS.len()).all(|i| has(Column::Split(i)));

        complete.then_some(Self { columns })
    }

    /// Number of cells a row needs to line up with this header.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Reads `row` cell by cell under the header's labels. A `TEAM` column,
    /// when present, fills [`BoxScoreStats::team`].
    pub fn parse_row(&self, row: &[String]) -> Result<BoxScoreStats, ExtractError> {
        if row.len() < self.width() {
            return Err(ExtractError::IncompleteRow {
                found: row.len(),
                required: self.width(),
            });
        }

        let mut username = String::new();
        let mut grade = String::new();
        let mut team = None;
        let mut counts = [0u32; 7];
        let mut splits = [(0u32, 0u32); 3];

        for (column, cell) in self.columns.iter().zip(row) {
            match *column {
                Column::Player => username = cell.clone(),
                Column::Team => team = Team::from_label(cell),
                Column::Grade => grade = cell.clone(),
                Column::Count(i) => counts[i] = parse_count(cell, COUNT_FIELDS[i])?,
                Column::Split(i) => {
                    splits[i] = parse_pair(cell, SPLIT_FIELDS[i])?.ok_or_else(|| {
                        ExtractError::MalformedField {
                            field: SPLIT_FIELDS[i],
                            value: cell.clone(),
                        }
                    })?
                }
                Column::Unknown => {}
            }
        }

        let mut stats = assemble(username, grade, counts, splits);
        stats.team = team;
        Ok(stats)
    }
}

fn parse_count(value: &str, field: &'static str) -> Result<u32, ExtractError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ExtractError::MalformedField {
            field,
            value: value.to_string(),
        })
}

/// Reads one made/attempted split starting at `*idx` and advances past it.
fn parse_split(
    tokens: &[String],
    idx: &mut usize,
    field: &'static str,
) -> Result<(u32, u32), ExtractError> {
    let Some(token) = tokens.get(*idx) else {
        return Err(ExtractError::IncompleteRow {
            found: tokens.len(),
            required: *idx + 1,
        });
    };

    if let Some(pair) = parse_pair(token, field)? {
        *idx += 1;
        return Ok(pair);
    }

    // "9 16": the separator was dropped entirely
    let made = parse_count(token, field)?;
    let Some(attempted) = tokens.get(*idx + 1) else {
        return Err(ExtractError::IncompleteRow {
            found: tokens.len(),
            required: *idx + 2,
        });
    };
    let attempted = parse_count(attempted, field)?;
    *idx += 2;
    Ok((made, attempted))
}

/// Reads `made/attempted` (or `made-attempted`) from one token. Returns
/// `None` when the token has no separator at all.
fn parse_pair(token: &str, field: &'static str) -> Result<Option<(u32, u32)>, ExtractError> {
    let Some((made, attempted)) = token.split_once(['/', '-']) else {
        return Ok(None);
    };
    let malformed = || ExtractError::MalformedField {
        field,
        value: token.to_string(),
    };
    let made = made.trim().parse::<u32>().map_err(|_| malformed())?;
    let attempted = attempted.trim().parse::<u32>().map_err(|_| malformed())?;
    Ok(Some((made, attempted)))
}

/// Finds the first plausible calendar date in the recognized text.
///
/// A year is always required, so shooting splits like `9/16` never match.
pub fn detect_date(text: &str) -> Option<NaiveDate> {
    let iso = ISO_DATE.captures_iter(text).find_map(|caps| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });
    if iso.is_some() {
        return iso;
    }

    US_DATE.captures_iter(text).find_map(|caps| {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let year = if caps[3].len() == 2 { 2000 + year } else { year };
        NaiveDate::from_ymd_opt(year, month, day)
    })
}
