//! Record store boundary.
//!
//! A relational store is an external collaborator; the relay only needs the
//! operations below. The in-memory implementation backs the binary and the
//! tests.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::sync::records::{Game, LiveScore, PlayerStat, RosterEntry, Standing, Team};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn upsert_teams(&self, teams: &[Team]) -> StoreResult<()>;
    async fn upsert_games(&self, games: &[Game]) -> StoreResult<()>;
    async fn upsert_standings(&self, standings: &[Standing]) -> StoreResult<()>;
    async fn replace_roster(&self, team_id: &str, roster: &[RosterEntry]) -> StoreResult<()>;
    async fn replace_player_stats(&self, game_id: &str, stats: &[PlayerStat]) -> StoreResult<()>;

    /// Apply a live line score to a known game. Returns the updated game.
    async fn apply_live_score(&self, score: &LiveScore) -> StoreResult<Option<Game>>;

    async fn teams(&self, source: &str) -> StoreResult<Vec<Team>>;
    async fn live_games(&self) -> StoreResult<Vec<Game>>;
    async fn game(&self, id: &str) -> StoreResult<Option<Game>>;

    /// Games where either side's name contains `team`, case-insensitive.
    async fn games_for_team(&self, team: &str) -> StoreResult<Vec<Game>>;
    async fn games_for_sport(&self, sport: &str) -> StoreResult<Vec<Game>>;
    async fn player_stats(&self, game_id: &str) -> StoreResult<Vec<PlayerStat>>;
}

#[derive(Default)]
pub struct InMemoryRepository {
    teams: DashMap<String, Team>,
    games: DashMap<String, Game>,
    standings: DashMap<String, Standing>,
    rosters: DashMap<String, Vec<RosterEntry>>,
    player_stats: DashMap<String, Vec<PlayerStat>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roster(&self, team_id: &str) -> Vec<RosterEntry> {
        self.rosters.get(team_id).map(|r| r.value().clone()).unwrap_or_default()
    }

    pub fn standings(&self) -> Vec<Standing> {
        self.standings.iter().map(|s| s.value().clone()).collect()
    }

    fn collect_games(&self, pred: impl Fn(&Game) -> bool) -> Vec<Game> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|g| pred(g.value()))
            .map(|g| g.value().clone())
            .collect();
        games.sort_by(|a, b| a.game_date.cmp(&b.game_date).then_with(|| a.id.cmp(&b.id)));
        games
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn upsert_teams(&self, teams: &[Team]) -> StoreResult<()> {
        for team in teams {
            self.teams.insert(format!("{}:{}", team.source, team.id), team.clone());
        }
        Ok(())
    }

    async fn upsert_games(&self, games: &[Game]) -> StoreResult<()> {
        for game in games {
            self.games.insert(game.id.clone(), game.clone());
        }
        Ok(())
    }

    async fn upsert_standings(&self, standings: &[Standing]) -> StoreResult<()> {
        for standing in standings {
            self.standings.insert(standing.team_id.clone(), standing.clone());
        }
        Ok(())
    }

    async fn replace_roster(&self, team_id: &str, roster: &[RosterEntry]) -> StoreResult<()> {
        self.rosters.insert(team_id.to_string(), roster.to_vec());
        Ok(())
    }

    async fn replace_player_stats(&self, game_id: &str, stats: &[PlayerStat]) -> StoreResult<()> {
        self.player_stats.insert(game_id.to_string(), stats.to_vec());
        Ok(())
    }

    async fn apply_live_score(&self, score: &LiveScore) -> StoreResult<Option<Game>> {
        let Some(mut game) = self.games.get_mut(&score.game_id) else {
            return Ok(None);
        };
        if score.home_score.is_some() {
            game.home_score = score.home_score;
        }
        if score.away_score.is_some() {
            game.away_score = score.away_score;
        }
        game.live = score.status == "Live";
        game.status = score.status.clone();
        game.period = score.inning.map(|i| i.to_string());
        game.inning_state = score.inning_state.clone();
        Ok(Some(game.clone()))
    }

    async fn teams(&self, source: &str) -> StoreResult<Vec<Team>> {
        let mut teams: Vec<Team> = self
            .teams
            .iter()
            .filter(|t| t.source == source)
            .map(|t| t.value().clone())
            .collect();
        teams.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(teams)
    }

    async fn live_games(&self) -> StoreResult<Vec<Game>> {
        Ok(self.collect_games(|g| g.live))
    }

    async fn game(&self, id: &str) -> StoreResult<Option<Game>> {
        Ok(self.games.get(id).map(|g| g.value().clone()))
    }

    async fn games_for_team(&self, team: &str) -> StoreResult<Vec<Game>> {
        let needle = team.to_lowercase();
        Ok(self.collect_games(|g| g.involves_team(&needle)))
    }

    async fn games_for_sport(&self, sport: &str) -> StoreResult<Vec<Game>> {
        Ok(self.collect_games(|g| g.sport.eq_ignore_ascii_case(sport)))
    }

    async fn player_stats(&self, game_id: &str) -> StoreResult<Vec<PlayerStat>> {
        Ok(self.player_stats.get(game_id).map(|s| s.value().clone()).unwrap_or_default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn game(id: &str, sport: &str, home: &str, away: &str, live: bool) -> Game {
        Game {
            id: id.to_string(),
            source: "mlb".to_string(),
            sport: sport.to_string(),
            home_team_id: format!("{id}-h"),
            home_team: home.to_string(),
            away_team_id: format!("{id}-a"),
            away_team: away.to_string(),
            game_date: "2024-07-04T23:05:00Z".to_string(),
            status: if live { "Live" } else { "Preview" }.to_string(),
            live,
            home_score: Some(0),
            away_score: Some(0),
            period: None,
            time_remaining: None,
            inning_state: None,
            last_play: None,
        }
    }

    #[tokio::test]
    async fn test_team_and_sport_queries() {
        let repo = InMemoryRepository::new();
        repo.upsert_games(&[
            game("1", "MLB", "St. Louis Cardinals", "Chicago Cubs", true),
            game("2", "NFL", "Dallas Cowboys", "New York Giants", false),
        ])
        .await
        .unwrap();

        let cards = repo.games_for_team("cardinals").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "1");

        assert_eq!(repo.games_for_sport("nfl").await.unwrap().len(), 1);
        assert_eq!(repo.live_games().await.unwrap().len(), 1);
        assert!(repo.game("3").await.unwrap().is_none());
        assert!(repo.player_stats("1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_live_score() {
        let repo = InMemoryRepository::new();
        repo.upsert_games(&[game("1", "MLB", "Cardinals", "Cubs", true)]).await.unwrap();

        let updated = repo
            .apply_live_score(&LiveScore {
                game_id: "1".into(),
                status: "Final".into(),
                home_score: Some(5),
                away_score: Some(4),
                inning: Some(9),
                inning_state: Some("End".into()),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.home_score, Some(5));
        assert!(!updated.live);
        assert!(repo.live_games().await.unwrap().is_empty());
    }
}
