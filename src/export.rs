//! Output for extracted stat lines.
//!
//! CSV is append-only so completed rows survive a crash mid-batch.
//! Each row contains: extraction time, source screenshot, every stat, then
//! the team side when known.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::boxscore::BoxScoreStats;
use crate::boxscore::stats::Team;

/// CSV header row.
const CSV_HEADER: &str = "extracted_at,screenshot,username,date,grade,points,rebounds,assists,steals,blocks,fouls,turnovers,fgm,fga,three_pm,three_pa,ftm,fta,team";

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Appends one stat line to the CSV file.
///
/// Opens the file in append mode for each write.
pub fn append_stats(path: &Path, screenshot: &Path, stats: &BoxScoreStats) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    let line = format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        Local::now().format("%Y-%m-%dT%H:%M:%S"),
        csv_field(&screenshot.display().to_string()),
        csv_field(&stats.username),
        stats.date.map(|d| d.to_string()).unwrap_or_default(),
        csv_field(&stats.grade),
        stats.points,
        stats.rebounds,
        stats.assists,
        stats.steals,
        stats.blocks,
        stats.fouls,
        stats.turnovers,
        stats.fgm,
        stats.fga,
        stats.three_pm,
        stats.three_pa,
        stats.ftm,
        stats.fta,
        match stats.team {
            Some(Team::Away) => "away",
            Some(Team::Home) => "home",
            None => "",
        },
    );

    writeln!(file, "{}", line).context("Failed to write CSV row")?;
    Ok(())
}

/// Quotes a value containing commas, quotes or newlines.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Pretty JSON for stdout.
pub fn to_json(stats: &BoxScoreStats) -> Result<String> {
    serde_json::to_string_pretty(stats).context("Failed to serialize stats")
}
