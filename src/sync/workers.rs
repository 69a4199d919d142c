//! Per-domain sync workers.
//!
//! Each worker covers one domain across every source and owns the cache keys
//! `<source>:<domain>[:<qualifier>]` for that domain. A target that fails is
//! counted and logged; the worker only fails as a whole when nothing could
//! be served at all.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::config::{LeagueConfig, SyncConfig};
use crate::distribution::events::{EventKind, LiveUpdateEvent};
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::normalize;
use crate::sync::pipeline::{Fetched, SyncContext, Target};
use crate::sync::records::{Game, LiveScore, RosterEntry, Standing, Team};
use crate::upstream::UpstreamRequest;

/// Counts for one worker run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub fresh: usize,
    pub stale: usize,
    pub failed: usize,
    pub events: usize,
}

impl SyncReport {
    fn fresh(events: usize) -> Self {
        Self {
            fresh: 1,
            events,
            ..Self::default()
        }
    }

    fn stale() -> Self {
        Self {
            stale: 1,
            ..Self::default()
        }
    }
}

/// Folds per-target results into one report.
#[derive(Default)]
struct Tally {
    report: SyncReport,
    first_error: Option<SyncError>,
}

impl Tally {
    fn add(&mut self, target: &Target, result: SyncResult<SyncReport>) {
        match result {
            Ok(r) => {
                self.report.fresh += r.fresh;
                self.report.stale += r.stale;
                self.report.events += r.events;
            }
            Err(e) => {
                tracing::warn!(cache_key = %target.key, error = %e, "Sync target failed");
                self.report.failed += 1;
                self.first_error.get_or_insert(e);
            }
        }
    }

    fn finish(self) -> SyncResult<SyncReport> {
        match self.first_error {
            Some(e) if self.report.fresh + self.report.stale == 0 => Err(e),
            _ => Ok(self.report),
        }
    }
}

/// One sync domain.
#[async_trait]
pub trait SyncWorker: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: &SyncContext) -> SyncResult<SyncReport>;
}

/// A worker with the interval it should run at.
pub struct Cadence {
    pub name: &'static str,
    pub interval: Duration,
    pub worker: Arc<dyn SyncWorker>,
}

/// The standard cadences: live, scores, standings, rosters, teams.
pub fn cadences(config: &SyncConfig) -> Vec<Cadence> {
    let c = &config.cadences;
    vec![
        cadence(c.live_secs, Arc::new(LiveWorker::new(config.clone()))),
        cadence(c.scores_secs, Arc::new(ScoresWorker::new(config.clone()))),
        cadence(c.standings_secs, Arc::new(StandingsWorker::new(config.clone()))),
        cadence(c.rosters_secs, Arc::new(RostersWorker::new(config.clone()))),
        cadence(c.teams_secs, Arc::new(TeamsWorker::new(config.clone()))),
    ]
}

fn cadence(interval_secs: u64, worker: Arc<dyn SyncWorker>) -> Cadence {
    Cadence {
        name: worker.name(),
        interval: Duration::from_secs(interval_secs),
        worker,
    }
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn espn_path(league: &LeagueConfig, resource: &str) -> String {
    format!("/apis/site/v2/sports/{}/{}", league.path, resource)
}

fn game_event(kind: EventKind, game: &Game) -> LiveUpdateEvent {
    LiveUpdateEvent::new(kind, game.id.clone(), game.score_payload())
        .with_sport(game.sport.clone())
        .with_teams([game.home_team.clone(), game.away_team.clone()])
}

/// Score changes become `scoreUpdate`; status-only changes become `gameStateChange`.
/// Games seen for the first time produce nothing.
pub fn diff_games(previous: Option<&[Game]>, next: &[Game]) -> Vec<LiveUpdateEvent> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    let before: HashMap<&str, &Game> = previous.iter().map(|g| (g.id.as_str(), g)).collect();

    next.iter()
        .filter_map(|game| {
            let old = before.get(game.id.as_str())?;
            if old.home_score != game.home_score || old.away_score != game.away_score {
                Some(game_event(EventKind::ScoreUpdate, game))
            } else if old.status != game.status {
                let mut event = game_event(EventKind::GameStateChange, game);
                event.payload.insert("previousStatus".into(), old.status.clone().into());
                Some(event)
            } else {
                None
            }
        })
        .collect()
}

async fn sync_teams(ctx: &SyncContext, target: &Target, fetched: SyncResult<Fetched<Vec<Team>>>) -> SyncResult<SyncReport> {
    match fetched? {
        Fetched::Fresh { records, .. } => {
            ctx.repository.upsert_teams(&records).await?;
            ctx.store(target, &records);
            Ok(SyncReport::fresh(0))
        }
        Fetched::Cached(records) => {
            ctx.repository.upsert_teams(&records).await?;
            Ok(SyncReport::fresh(0))
        }
        Fetched::Stale(_) => Ok(SyncReport::stale()),
    }
}

/// Team directories.
pub struct TeamsWorker {
    config: SyncConfig,
}

impl TeamsWorker {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SyncWorker for TeamsWorker {
    fn name(&self) -> &'static str {
        "teams"
    }

    async fn run(&self, ctx: &SyncContext) -> SyncResult<SyncReport> {
        let ttl = secs(self.config.ttl.teams_secs);
        let mut tally = Tally::default();

        let target = Target::new(
            "mlb",
            "mlb:teams",
            UpstreamRequest::get("/api/v1/teams").query("sportId", self.config.mlb_sport_id),
            ttl,
        );
        let result = sync_teams(ctx, &target, ctx.fetch(&target, normalize::mlb_teams).await).await;
        tally.add(&target, result);

        for league in &self.config.espn_leagues {
            let target = Target::new(
                "espn",
                format!("espn:teams:{}", league.key),
                UpstreamRequest::get(espn_path(league, "teams")),
                ttl,
            );
            let fetched = ctx.fetch(&target, |v| normalize::espn_teams(v, &league.sport)).await;
            let result = sync_teams(ctx, &target, fetched).await;
            tally.add(&target, result);
        }

        tally.finish()
    }
}

/// Schedules and scoreboards; publishes score and state changes.
pub struct ScoresWorker {
    config: SyncConfig,
}

impl ScoresWorker {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    async fn sync_games(&self, ctx: &SyncContext, target: &Target, fetched: SyncResult<Fetched<Vec<Game>>>) -> SyncResult<SyncReport> {
        match fetched? {
            Fetched::Fresh { records, previous } => {
                ctx.repository.upsert_games(&records).await?;
                ctx.store(target, &records);
                let events = diff_games(previous.as_deref(), &records);
                let published = ctx.publish_all(events).await?;
                Ok(SyncReport::fresh(published))
            }
            Fetched::Cached(records) => {
                ctx.repository.upsert_games(&records).await?;
                Ok(SyncReport::fresh(0))
            }
            Fetched::Stale(_) => Ok(SyncReport::stale()),
        }
    }
}

#[async_trait]
impl SyncWorker for ScoresWorker {
    fn name(&self) -> &'static str {
        "scores"
    }

    async fn run(&self, ctx: &SyncContext) -> SyncResult<SyncReport> {
        let ttl = secs(self.config.ttl.scores_secs);
        let mut tally = Tally::default();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let target = Target::new(
            "mlb",
            "mlb:scores",
            UpstreamRequest::get("/api/v1/schedule")
                .query("sportId", self.config.mlb_sport_id)
                .query("date", today),
            ttl,
        );
        let fetched = ctx.fetch(&target, normalize::mlb_schedule).await;
        let result = self.sync_games(ctx, &target, fetched).await;
        tally.add(&target, result);

        for league in &self.config.espn_leagues {
            let target = Target::new(
                "espn",
                format!("espn:scores:{}", league.key),
                UpstreamRequest::get(espn_path(league, "scoreboard")),
                ttl,
            );
            let fetched = ctx.fetch(&target, |v| normalize::espn_scoreboard(v, &league.sport)).await;
            let result = self.sync_games(ctx, &target, fetched).await;
            tally.add(&target, result);
        }

        tally.finish()
    }
}

/// Polls games the store reports as live.
pub struct LiveWorker {
    config: SyncConfig,
}

impl LiveWorker {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    async fn sync_mlb_game(&self, ctx: &SyncContext, target: &Target, game: &Game) -> SyncResult<SyncReport> {
        let fetched = ctx
            .fetch(target, |v: &Value| normalize::mlb_live_feed(v, &game.id))
            .await?;
        let (feed, previous, cached) = match fetched {
            Fetched::Fresh { records, previous } => (records, previous, false),
            Fetched::Cached(records) => (records, None, true),
            Fetched::Stale(_) => return Ok(SyncReport::stale()),
        };

        let updated = ctx.repository.apply_live_score(&feed.score).await?;
        if !feed.player_stats.is_empty() {
            ctx.repository.replace_player_stats(&game.id, &feed.player_stats).await?;
        }
        if cached {
            return Ok(SyncReport::fresh(0));
        }
        ctx.store(target, &feed);

        if previous.as_ref().map(|p| &p.score) == Some(&feed.score) {
            return Ok(SyncReport::fresh(0));
        }
        let game = updated.as_ref().unwrap_or(game);
        let event = live_event(game, &feed.score);
        let published = ctx.publish_all(vec![event]).await?;
        Ok(SyncReport::fresh(published))
    }

    async fn sync_espn_league(&self, ctx: &SyncContext, target: &Target, league: &LeagueConfig) -> SyncResult<SyncReport> {
        let fetched = ctx
            .fetch(target, |v| normalize::espn_scoreboard(v, &league.sport))
            .await?;
        let (games, previous) = match fetched {
            Fetched::Fresh { records, previous } => (records, previous),
            Fetched::Cached(records) => {
                ctx.repository.upsert_games(&records).await?;
                return Ok(SyncReport::fresh(0));
            }
            Fetched::Stale(_) => return Ok(SyncReport::stale()),
        };

        ctx.repository.upsert_games(&games).await?;
        ctx.store(target, &games);

        let before: HashMap<&str, &Game> = previous
            .iter()
            .flatten()
            .map(|g| (g.id.as_str(), g))
            .collect();
        let events = games
            .iter()
            .filter(|g| {
                let old = before.get(g.id.as_str());
                (g.live || old.is_some_and(|o| o.live)) && old.map_or(true, |o| *o != *g)
            })
            .map(|g| {
                let mut event = game_event(EventKind::LiveGameUpdate, g);
                if let Some(play) = &g.last_play {
                    event.payload.insert("lastPlay".into(), play.clone().into());
                }
                event
            })
            .collect();

        let published = ctx.publish_all(events).await?;
        Ok(SyncReport::fresh(published))
    }
}

fn live_event(game: &Game, score: &LiveScore) -> LiveUpdateEvent {
    let mut payload = game.score_payload();
    payload.insert("homeScore".into(), score.home_score.into());
    payload.insert("awayScore".into(), score.away_score.into());
    payload.insert("status".into(), score.status.clone().into());
    payload.insert("inning".into(), score.inning.into());
    payload.insert("inningState".into(), score.inning_state.clone().into());

    LiveUpdateEvent::new(EventKind::LiveGameUpdate, score.game_id.clone(), payload)
        .with_sport(game.sport.clone())
        .with_teams([game.home_team.clone(), game.away_team.clone()])
}

#[async_trait]
impl SyncWorker for LiveWorker {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn run(&self, ctx: &SyncContext) -> SyncResult<SyncReport> {
        let ttl = secs(self.config.ttl.live_secs);
        let live = ctx.repository.live_games().await?;
        let mut tally = Tally::default();

        for game in live.iter().filter(|g| g.source == "mlb") {
            let target = Target::new(
                "mlb",
                format!("mlb:live:{}", game.id),
                UpstreamRequest::get(format!("/api/v1.1/game/{}/feed/live", game.id)),
                ttl,
            );
            let result = self.sync_mlb_game(ctx, &target, game).await;
            tally.add(&target, result);
        }

        let live_sports: BTreeSet<&str> = live
            .iter()
            .filter(|g| g.source == "espn")
            .map(|g| g.sport.as_str())
            .collect();
        for league in self
            .config
            .espn_leagues
            .iter()
            .filter(|l| live_sports.contains(l.sport.as_str()))
        {
            let target = Target::new(
                "espn",
                format!("espn:live:{}", league.key),
                UpstreamRequest::get(espn_path(league, "scoreboard")),
                ttl,
            );
            let result = self.sync_espn_league(ctx, &target, league).await;
            tally.add(&target, result);
        }

        tally.finish()
    }
}

/// MLB standings.
pub struct StandingsWorker {
    config: SyncConfig,
}

impl StandingsWorker {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    async fn persist(&self, ctx: &SyncContext, target: &Target, records: &[Standing]) -> SyncResult<SyncReport> {
        ctx.repository.upsert_standings(records).await?;
        ctx.store(target, &records);
        Ok(SyncReport::fresh(0))
    }
}

#[async_trait]
impl SyncWorker for StandingsWorker {
    fn name(&self) -> &'static str {
        "standings"
    }

    async fn run(&self, ctx: &SyncContext) -> SyncResult<SyncReport> {
        let target = Target::new(
            "mlb",
            "mlb:standings",
            UpstreamRequest::get("/api/v1/standings").query("leagueId", &self.config.mlb_standings_leagues),
            secs(self.config.ttl.standings_secs),
        );
        let result = match ctx.fetch(&target, normalize::mlb_standings).await {
            Ok(Fetched::Fresh { records, .. }) => self.persist(ctx, &target, &records).await,
            Ok(Fetched::Cached(records)) => ctx
                .repository
                .upsert_standings(&records)
                .await
                .map(|_| SyncReport::fresh(0))
                .map_err(Into::into),
            Ok(Fetched::Stale(_)) => Ok(SyncReport::stale()),
            Err(e) => Err(e),
        };
        let mut tally = Tally::default();
        tally.add(&target, result);
        tally.finish()
    }
}

/// MLB rosters for every known MLB team.
pub struct RostersWorker {
    config: SyncConfig,
}

impl RostersWorker {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    async fn sync_roster(
        &self,
        ctx: &SyncContext,
        target: &Target,
        team_id: &str,
        fetched: SyncResult<Fetched<Vec<RosterEntry>>>,
    ) -> SyncResult<SyncReport> {
        match fetched? {
            Fetched::Fresh { records, .. } => {
                ctx.repository.replace_roster(team_id, &records).await?;
                ctx.store(target, &records);
                Ok(SyncReport::fresh(0))
            }
            Fetched::Cached(records) => {
                ctx.repository.replace_roster(team_id, &records).await?;
                Ok(SyncReport::fresh(0))
            }
            Fetched::Stale(_) => Ok(SyncReport::stale()),
        }
    }
}

#[async_trait]
impl SyncWorker for RostersWorker {
    fn name(&self) -> &'static str {
        "rosters"
    }

    async fn run(&self, ctx: &SyncContext) -> SyncResult<SyncReport> {
        let ttl = secs(self.config.ttl.rosters_secs);
        let teams = ctx.repository.teams("mlb").await?;
        let mut tally = Tally::default();

        for team in &teams {
            let target = Target::new(
                "mlb",
                format!("mlb:roster:{}", team.id),
                UpstreamRequest::get(format!("/api/v1/teams/{}/roster", team.id)),
                ttl,
            );
            let fetched = ctx.fetch(&target, |v| normalize::mlb_roster(v, &team.id)).await;
            let result = self.sync_roster(ctx, &target, &team.id, fetched).await;
            tally.add(&target, result);
        }

        tally.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheLayer;
    use crate::config::{default_sources, CircuitBreakerConfig, RetryConfig, SourceConfig};
    use crate::distribution::bus::{EventBus, EventReceiver};
    use crate::sync::repository::tests::game;
    use crate::sync::repository::{InMemoryRepository, Repository};
    use crate::upstream::{SyncCoordinator, Transport, UpstreamError, UpstreamResult};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Serves a fixed body per path; unknown paths get a 404.
    #[derive(Default)]
    struct RouteTransport {
        routes: Mutex<HashMap<String, Value>>,
        calls: AtomicU32,
    }

    impl RouteTransport {
        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn set(&self, path: &str, body: Value) {
            self.routes.lock().unwrap().insert(path.to_string(), body);
        }

        fn clear(&self) {
            self.routes.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Transport for RouteTransport {
        async fn execute(&self, source: &SourceConfig, request: &UpstreamRequest) -> UpstreamResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.routes
                .lock()
                .unwrap()
                .get(&request.path)
                .cloned()
                .ok_or_else(|| UpstreamError::Rejected {
                    upstream: source.name.clone(),
                    status: 404,
                })
        }
    }

    fn setup() -> (Arc<RouteTransport>, SyncContext, Arc<InMemoryRepository>, EventReceiver, SyncConfig) {
        let transport = Arc::new(RouteTransport::default());
        let coordinator = SyncCoordinator::new(
            &default_sources(),
            &CircuitBreakerConfig::default(),
            &RetryConfig {
                max_attempts: 1,
                ..RetryConfig::default()
            },
            transport.clone(),
        );
        let repository = Arc::new(InMemoryRepository::new());
        let (bus, rx) = EventBus::channel(64);
        let ctx = SyncContext::new(Arc::new(coordinator), CacheLayer::new(), repository.clone(), bus);
        let config = SyncConfig {
            espn_leagues: vec![],
            ..SyncConfig::default()
        };
        (transport, ctx, repository, rx, config)
    }

    fn schedule(home_score: u32, status: &str) -> Value {
        json!({"dates": [{"games": [{
            "gamePk": 12345,
            "gameDate": "2024-07-04T23:05:00Z",
            "status": {"abstractGameState": status},
            "teams": {
                "home": {"score": home_score, "team": {"id": 138, "name": "St. Louis Cardinals"}},
                "away": {"score": 1, "team": {"id": 112, "name": "Chicago Cubs"}}
            }
        }]}]})
    }

    #[tokio::test]
    async fn test_scores_publish_only_on_change() {
        let (transport, ctx, repo, mut rx, config) = setup();
        let worker = ScoresWorker::new(config);

        transport.set("/api/v1/schedule", schedule(0, "Live"));
        let report = worker.run(&ctx).await.unwrap();
        assert_eq!(report, SyncReport { fresh: 1, ..SyncReport::default() });
        assert!(rx.try_recv().is_err());
        assert!(repo.game("12345").await.unwrap().is_some());

        // Same data again: nothing to publish.
        worker.run(&ctx).await.unwrap();
        assert!(rx.try_recv().is_err());

        transport.set("/api/v1/schedule", schedule(2, "Live"));
        assert_eq!(worker.run(&ctx).await.unwrap().events, 1);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::ScoreUpdate);
        assert_eq!(event.game_id, "12345");
        assert_eq!(event.payload["homeScore"], 2);

        transport.set("/api/v1/schedule", schedule(2, "Final"));
        worker.run(&ctx).await.unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::GameStateChange);
        assert_eq!(event.payload["previousStatus"], "Live");
    }

    #[tokio::test]
    async fn test_warm_start_reuses_fresh_cache() {
        let (transport, ctx, _repo, mut rx, config) = setup();
        let worker = ScoresWorker::new(config);
        transport.set("/api/v1/schedule", schedule(3, "Live"));
        worker.run(&ctx).await.unwrap();
        assert_eq!(transport.calls(), 1);

        // Restarted with a restored cache and an empty store.
        let restored = Arc::new(InMemoryRepository::new());
        let restarted = SyncContext::new(ctx.coordinator.clone(), ctx.cache.clone(), restored.clone(), ctx.bus.clone());
        let report = worker.run(&restarted.warm_start()).await.unwrap();
        assert_eq!(transport.calls(), 1);
        assert_eq!(report.events, 0);
        assert_eq!(restored.game("12345").await.unwrap().unwrap().home_score, Some(3));
        assert!(rx.try_recv().is_err());

        // Cadence ticks still go upstream.
        worker.run(&restarted).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_serves_stale_cache() {
        let (transport, ctx, _repo, _rx, config) = setup();
        let worker = TeamsWorker::new(config);

        transport.set("/api/v1/teams", json!({"teams": [{"id": 138, "name": "St. Louis Cardinals"}]}));
        assert_eq!(worker.run(&ctx).await.unwrap().fresh, 1);

        transport.clear();
        let report = worker.run(&ctx).await.unwrap();
        assert_eq!(report.stale, 1);
        assert_eq!(report.fresh, 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_without_cache_is_cache_miss() {
        let (_transport, ctx, _repo, _rx, config) = setup();
        let err = StandingsWorker::new(config).run(&ctx).await.unwrap_err();
        assert!(err.is_cache_miss());
        assert!(ctx.cache.peek("mlb:standings").is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_not_cached() {
        let (transport, ctx, _repo, _rx, config) = setup();
        transport.set("/api/v1/standings", json!({"message": "maintenance"}));
        let err = StandingsWorker::new(config).run(&ctx).await.unwrap_err();
        assert!(err.is_cache_miss());
        assert!(ctx.cache.is_empty());
    }

    #[tokio::test]
    async fn test_live_worker_publishes_live_game_update() {
        let (transport, ctx, repo, mut rx, config) = setup();
        repo.upsert_games(&[game("12345", "MLB", "St. Louis Cardinals", "Chicago Cubs", true)])
            .await
            .unwrap();
        transport.set(
            "/api/v1.1/game/12345/feed/live",
            json!({
                "gameData": {"status": {"abstractGameState": "Live"}},
                "liveData": {"linescore": {"currentInning": 3, "inningState": "Bottom",
                    "teams": {"home": {"runs": 1}, "away": {"runs": 0}}}}
            }),
        );

        let report = LiveWorker::new(config).run(&ctx).await.unwrap();
        assert_eq!(report.events, 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::LiveGameUpdate);
        assert_eq!(event.payload["inning"], 3);
        assert_eq!(event.payload["inningState"], "Bottom");
        assert_eq!(event.teams, ["St. Louis Cardinals", "Chicago Cubs"]);
        assert_eq!(repo.game("12345").await.unwrap().unwrap().home_score, Some(1));
    }

    #[tokio::test]
    async fn test_rosters_follow_known_teams() {
        let (transport, ctx, repo, _rx, config) = setup();
        transport.set("/api/v1/teams", json!({"teams": [{"id": 138, "name": "St. Louis Cardinals"}]}));
        transport.set(
            "/api/v1/teams/138/roster",
            json!({"roster": [{"person": {"id": 1, "fullName": "A Player"}, "position": {"abbreviation": "P"}}]}),
        );

        TeamsWorker::new(config.clone()).run(&ctx).await.unwrap();
        let report = RostersWorker::new(config).run(&ctx).await.unwrap();
        assert_eq!(report.fresh, 1);
        assert_eq!(repo.roster("138").len(), 1);
    }

    #[test]
    fn test_cadence_names() {
        let names: Vec<_> = cadences(&SyncConfig::default()).iter().map(|c| c.name).collect();
        assert_eq!(names, ["live", "scores", "standings", "rosters", "teams"]);
    }
}
