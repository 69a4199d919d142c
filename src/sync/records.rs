//! Normalized records produced by the sync workers.
//!
//! These are what gets persisted, cached and published. Field names are
//! camelCase on the wire to match the subscriber protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub source: String,
    pub name: String,
    pub sport: String,
    pub league: String,
    pub division: String,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub source: String,
    pub sport: String,
    pub home_team_id: String,
    pub home_team: String,
    pub away_team_id: String,
    pub away_team: String,
    pub game_date: String,
    pub status: String,
    pub live: bool,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub period: Option<String>,
    pub time_remaining: Option<String>,
    pub inning_state: Option<String>,
    pub last_play: Option<String>,
}

impl Game {
    pub fn involves_team(&self, needle_lower: &str) -> bool {
        self.home_team.to_lowercase().contains(needle_lower)
            || self.away_team.to_lowercase().contains(needle_lower)
    }

    /// Fields every score-style event carries.
    pub fn score_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("sport".into(), self.sport.clone().into());
        payload.insert("homeTeam".into(), self.home_team.clone().into());
        payload.insert("awayTeam".into(), self.away_team.clone().into());
        payload.insert("homeScore".into(), self.home_score.into());
        payload.insert("awayScore".into(), self.away_score.into());
        payload.insert("status".into(), self.status.clone().into());
        if let Some(period) = &self.period {
            payload.insert("period".into(), period.clone().into());
        }
        if let Some(clock) = &self.time_remaining {
            payload.insert("timeRemaining".into(), clock.clone().into());
        }
        payload
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub team_id: String,
    pub team_name: String,
    pub season: i32,
    pub division: String,
    pub wins: u32,
    pub losses: u32,
    pub win_percentage: String,
    pub games_back: String,
    pub streak: Option<String>,
    pub last_ten: Option<String>,
}

/// Line score from a live game feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveScore {
    pub game_id: String,
    pub status: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub inning: Option<u32>,
    pub inning_state: Option<String>,
}

/// A live feed: the line score plus the box score players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeed {
    pub score: LiveScore,
    pub player_stats: Vec<PlayerStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub team_id: String,
    pub player_id: String,
    pub full_name: String,
    pub position: String,
    pub jersey_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStat {
    pub display_name: String,
    pub position: String,
    pub jersey_number: Option<String>,
    pub stats: Value,
}
