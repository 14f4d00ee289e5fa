use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Side of the box score a player's row was listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Away,
    Home,
}

impl Team {
    /// Reads a section heading or team cell such as "AWAY" or "home".
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "away" => Some(Self::Away),
            "home" => Some(Self::Home),
            _ => None,
        }
    }
}

/// One player's box-score line.
///
/// Made/attempted pairs are stored as read; made > attempted is reported by
/// [`BoxScoreStats::shooting_anomalies`] but never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxScoreStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    pub username: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub grade: String,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub fouls: u32,
    pub turnovers: u32,
    pub fgm: u32,
    pub fga: u32,
    #[serde(alias = "tpm")]
    pub three_pm: u32,
    #[serde(alias = "tpa")]
    pub three_pa: u32,
    pub ftm: u32,
    pub fta: u32,
}

impl BoxScoreStats {
    /// Uses `date` when none was detected on the screenshot.
    pub fn with_default_date(mut self, date: NaiveDate) -> Self {
        self.date.get_or_insert(date);
        self
    }

    /// Shooting splits where more shots were made than attempted.
    pub fn shooting_anomalies(&self) -> Vec<&'static str> {
        [
            ("fgm/fga", self.fgm, self.fga),
            ("3pm/3pa", self.three_pm, self.three_pa),
            ("ftm/fta", self.ftm, self.fta),
        ]
        .into_iter()
        .filter(|(_, made, attempted)| made > attempted)
        .map(|(name, _, _)| name)
        .collect()
    }
}
