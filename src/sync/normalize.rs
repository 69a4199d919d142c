//! Upstream payload → normalized records.
//!
//! Optional fields degrade to `None` or "Unknown". A payload that lacks its
//! root collection is an error: an empty success would overwrite good cached
//! data with nothing.

use chrono::{Datelike, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::sync::records::{Game, LiveFeed, LiveScore, PlayerStat, RosterEntry, Standing, Team};

#[derive(Debug, Clone, Error)]
pub enum NormalizeError {
    #[error("{context} payload is missing '{field}'")]
    MissingField {
        context: &'static str,
        field: &'static str,
    },
}

const UNKNOWN: &str = "Unknown";

fn text(v: &Value, ptr: &str) -> Option<String> {
    match v.pointer(ptr)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_or_unknown(v: &Value, ptr: &str) -> String {
    text(v, ptr).unwrap_or_else(|| UNKNOWN.to_string())
}

/// A score the upstream reports. Negative, fractional or oversized values are absent.
fn score(v: &Value, ptr: &str) -> Option<u32> {
    match v.pointer(ptr)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number(v: &Value, ptr: &str) -> Option<u32> {
    v.pointer(ptr)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn root<'a>(v: &'a Value, ptr: &str, context: &'static str, field: &'static str) -> Result<&'a Vec<Value>, NormalizeError> {
    v.pointer(ptr)
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingField { context, field })
}

pub fn mlb_teams(data: &Value) -> Result<Vec<Team>, NormalizeError> {
    let teams = root(data, "/teams", "MLB teams", "teams")?;
    Ok(teams
        .iter()
        .filter_map(|t| {
            Some(Team {
                id: text(t, "/id")?,
                source: "mlb".into(),
                name: text_or_unknown(t, "/name"),
                sport: "MLB".into(),
                league: text_or_unknown(t, "/league/name"),
                division: text_or_unknown(t, "/division/name"),
                venue: text(t, "/venue/name"),
                city: text(t, "/venue/city").or_else(|| text(t, "/locationName")),
                state: text(t, "/venue/state"),
            })
        })
        .collect())
}

pub fn espn_teams(data: &Value, sport: &str) -> Result<Vec<Team>, NormalizeError> {
    let teams = root(data, "/sports/0/leagues/0/teams", "ESPN teams", "sports[0].leagues[0].teams")?;
    Ok(teams
        .iter()
        .filter_map(|entry| {
            let t = entry.get("team")?;
            Some(Team {
                id: text(t, "/id")?,
                source: "espn".into(),
                name: text_or_unknown(t, "/displayName"),
                sport: sport.to_string(),
                league: text_or_unknown(t, "/groups/0/name"),
                division: UNKNOWN.into(),
                venue: None,
                city: text(t, "/location"),
                state: None,
            })
        })
        .collect())
}

pub fn mlb_schedule(data: &Value) -> Result<Vec<Game>, NormalizeError> {
    let dates = root(data, "/dates", "MLB schedule", "dates")?;
    let games = dates
        .iter()
        .filter_map(|d| d.get("games").and_then(Value::as_array))
        .flatten()
        .filter_map(|g| {
            let status = text_or_unknown(g, "/status/abstractGameState");
            Some(Game {
                id: text(g, "/gamePk")?,
                source: "mlb".into(),
                sport: "MLB".into(),
                home_team_id: text(g, "/teams/home/team/id")?,
                home_team: text_or_unknown(g, "/teams/home/team/name"),
                away_team_id: text(g, "/teams/away/team/id")?,
                away_team: text_or_unknown(g, "/teams/away/team/name"),
                game_date: text(g, "/gameDate").unwrap_or_default(),
                live: status == "Live",
                status,
                home_score: score(g, "/teams/home/score"),
                away_score: score(g, "/teams/away/score"),
                period: None,
                time_remaining: None,
                inning_state: None,
                last_play: None,
            })
        })
        .collect();
    Ok(games)
}

pub fn espn_scoreboard(data: &Value, sport: &str) -> Result<Vec<Game>, NormalizeError> {
    let events = root(data, "/events", "ESPN scoreboard", "events")?;
    Ok(events
        .iter()
        .filter_map(|event| {
            let competition = event.pointer("/competitions/0")?;
            let competitors = competition.get("competitors")?.as_array()?;
            let side = |which: &str| {
                competitors
                    .iter()
                    .find(|c| c.get("homeAway").and_then(Value::as_str) == Some(which))
            };
            let home = side("home")?;
            let away = side("away")?;

            Some(Game {
                id: text(event, "/id")?,
                source: "espn".into(),
                sport: sport.to_string(),
                home_team_id: text(home, "/id")?,
                home_team: text_or_unknown(home, "/team/displayName"),
                away_team_id: text(away, "/id")?,
                away_team: text_or_unknown(away, "/team/displayName"),
                game_date: text(event, "/date").unwrap_or_default(),
                status: text_or_unknown(competition, "/status/type/name"),
                live: text(competition, "/status/type/state").as_deref() == Some("in"),
                home_score: score(home, "/score"),
                away_score: score(away, "/score"),
                period: text(competition, "/status/period"),
                time_remaining: text(competition, "/status/displayClock"),
                inning_state: None,
                last_play: text(competition, "/situation/lastPlay/text"),
            })
        })
        .collect())
}

pub fn mlb_live_feed(data: &Value, game_id: &str) -> Result<LiveFeed, NormalizeError> {
    let linescore = data
        .pointer("/liveData/linescore")
        .filter(|v| v.is_object())
        .ok_or(NormalizeError::MissingField {
            context: "MLB live feed",
            field: "liveData.linescore",
        })?;

    let line = LiveScore {
        game_id: game_id.to_string(),
        status: text_or_unknown(data, "/gameData/status/abstractGameState"),
        home_score: score(linescore, "/teams/home/runs"),
        away_score: score(linescore, "/teams/away/runs"),
        inning: number(linescore, "/currentInning"),
        inning_state: text(linescore, "/inningState"),
    };

    Ok(LiveFeed {
        score: line,
        player_stats: boxscore_players(data),
    })
}

/// Box score players from both sides. The box score is optional early in a game.
fn boxscore_players(data: &Value) -> Vec<PlayerStat> {
    ["home", "away"]
        .iter()
        .filter_map(|side| {
            data.pointer(&format!("/liveData/boxscore/teams/{side}/players"))
                .and_then(Value::as_object)
        })
        .flat_map(|players| players.values())
        .filter_map(|p| {
            Some(PlayerStat {
                display_name: text(p, "/person/fullName")?,
                position: text_or_unknown(p, "/position/abbreviation"),
                jersey_number: text(p, "/jerseyNumber"),
                stats: p.get("stats").cloned().unwrap_or_else(|| Value::Object(Default::default())),
            })
        })
        .collect()
}

pub fn mlb_standings(data: &Value) -> Result<Vec<Standing>, NormalizeError> {
    let records = root(data, "/records", "MLB standings", "records")?;
    let this_year = Utc::now().year();

    Ok(records
        .iter()
        .flat_map(|record| {
            let division = text(record, "/division/name")
                .or_else(|| text(record, "/division/id"))
                .unwrap_or_else(|| UNKNOWN.to_string());
            let season = text(record, "/season").and_then(|s| s.parse().ok()).unwrap_or(this_year);

            record
                .get("teamRecords")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(move |tr| {
                    let last_ten = tr
                        .pointer("/records/splitRecords")
                        .and_then(Value::as_array)
                        .and_then(|splits| {
                            splits
                                .iter()
                                .find(|s| s.get("type").and_then(Value::as_str) == Some("lastTen"))
                        })
                        .and_then(|s| Some(format!("{}-{}", text(s, "/wins")?, text(s, "/losses")?)));

                    Some(Standing {
                        team_id: text(tr, "/team/id")?,
                        team_name: text_or_unknown(tr, "/team/name"),
                        season,
                        division: division.clone(),
                        wins: number(tr, "/wins").unwrap_or(0),
                        losses: number(tr, "/losses").unwrap_or(0),
                        win_percentage: text(tr, "/winningPercentage").unwrap_or_default(),
                        games_back: text(tr, "/gamesBack").unwrap_or_default(),
                        streak: text(tr, "/streak/streakCode"),
                        last_ten,
                    })
                })
        })
        .collect())
}

pub fn mlb_roster(data: &Value, team_id: &str) -> Result<Vec<RosterEntry>, NormalizeError> {
    let roster = root(data, "/roster", "MLB roster", "roster")?;
    Ok(roster
        .iter()
        .filter_map(|p| {
            Some(RosterEntry {
                team_id: team_id.to_string(),
                player_id: text(p, "/person/id")?,
                full_name: text_or_unknown(p, "/person/fullName"),
                position: text_or_unknown(p, "/position/abbreviation"),
                jersey_number: text(p, "/jerseyNumber"),
            })
        })
        .collect())
}
