//! Subscription registry.
//!
//! Two indexes kept in step under one lock: filter → connections, used by the
//! dispatcher on every event, and connection → filters, used to drop a
//! connection in O(its filters).

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::distribution::events::LiveUpdateEvent;
use crate::net::connection::ConnectionId;

/// One subscription filter. Team and sport names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Game(String),
    Team(String),
    Sport(String),
    All,
}

impl FilterKey {
    pub fn game(id: impl Into<String>) -> Self {
        FilterKey::Game(id.into())
    }

    pub fn team(name: &str) -> Self {
        FilterKey::Team(name.trim().to_lowercase())
    }

    pub fn sport(name: &str) -> Self {
        FilterKey::Sport(name.trim().to_lowercase())
    }
}

/// Filters one connection holds.
///
/// Game filters added by a team or sport subscription are remembered under
/// that membership filter, so dropping it drops them too. A game the client
/// also asked for by id stays.
#[derive(Default)]
struct Held {
    filters: HashSet<FilterKey>,
    direct_games: HashSet<String>,
    expansions: HashMap<FilterKey, HashSet<String>>,
}

impl Held {
    /// Game ids `membership` added that nothing else still holds.
    fn release_expansion(&mut self, membership: &FilterKey) -> Vec<FilterKey> {
        let Some(games) = self.expansions.remove(membership) else {
            return Vec::new();
        };
        let mut released = Vec::new();
        for game_id in games {
            let kept = self.direct_games.contains(&game_id)
                || self.expansions.values().any(|other| other.contains(&game_id));
            if kept {
                continue;
            }
            let key = FilterKey::Game(game_id);
            if self.filters.remove(&key) {
                released.push(key);
            }
        }
        released
    }
}

#[derive(Default)]
struct Index {
    by_filter: HashMap<FilterKey, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, Held>,
}

impl Index {
    fn link(&mut self, id: ConnectionId, filter: FilterKey) -> bool {
        let Some(held) = self.by_connection.get_mut(&id) else {
            return false;
        };
        if !held.filters.insert(filter.clone()) {
            return false;
        }
        self.by_filter.entry(filter).or_default().insert(id);
        true
    }

    fn unlink(&mut self, id: ConnectionId, filter: &FilterKey) {
        if let Some(ids) = self.by_filter.get_mut(filter) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_filter.remove(filter);
            }
        }
    }
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    index: RwLock<Index>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with an empty filter set.
    pub fn register_connection(&self, id: ConnectionId) {
        let mut index = self.index.write().expect("registry lock poisoned");
        index.by_connection.entry(id).or_default();
    }

    /// Add a filter the client asked for directly. Returns false if the
    /// connection is unknown or already had it.
    pub fn add(&self, id: ConnectionId, filter: FilterKey) -> bool {
        let mut index = self.index.write().expect("registry lock poisoned");
        if let (FilterKey::Game(game_id), Some(held)) = (&filter, index.by_connection.get_mut(&id)) {
            held.direct_games.insert(game_id.clone());
        }
        index.link(id, filter)
    }

    /// Add a team or sport filter together with the game filters it resolved
    /// to. Returns false if the connection is unknown.
    pub fn add_expanded(
        &self,
        id: ConnectionId,
        membership: FilterKey,
        game_ids: impl IntoIterator<Item = String>,
    ) -> bool {
        let mut index = self.index.write().expect("registry lock poisoned");
        if !index.by_connection.contains_key(&id) {
            return false;
        }
        let mut added = HashSet::new();
        for game_id in game_ids {
            index.link(id, FilterKey::Game(game_id.clone()));
            added.insert(game_id);
        }
        index.link(id, membership.clone());
        if let Some(held) = index.by_connection.get_mut(&id) {
            held.expansions.entry(membership).or_default().extend(added);
        }
        true
    }

    /// Remove a filter. Removing a team or sport filter also removes the game
    /// filters it added.
    pub fn remove(&self, id: ConnectionId, filter: &FilterKey) -> bool {
        let mut index = self.index.write().expect("registry lock poisoned");
        let Some(held) = index.by_connection.get_mut(&id) else {
            return false;
        };
        let removed = held.filters.remove(filter);
        let mut released = match filter {
            FilterKey::Game(game_id) => {
                held.direct_games.remove(game_id);
                Vec::new()
            }
            FilterKey::Team(_) | FilterKey::Sport(_) => held.release_expansion(filter),
            FilterKey::All => Vec::new(),
        };
        if removed {
            released.push(filter.clone());
        }
        for key in &released {
            index.unlink(id, key);
        }
        removed
    }

    /// Drop every filter but keep the connection registered.
    pub fn clear(&self, id: ConnectionId) -> usize {
        let mut index = self.index.write().expect("registry lock poisoned");
        let held = match index.by_connection.get_mut(&id) {
            Some(held) => std::mem::take(held),
            None => return 0,
        };
        for filter in &held.filters {
            index.unlink(id, filter);
        }
        held.filters.len()
    }

    /// Forget a connection entirely. Returns how many filters it held.
    pub fn remove_connection(&self, id: ConnectionId) -> usize {
        let mut index = self.index.write().expect("registry lock poisoned");
        let Some(held) = index.by_connection.remove(&id) else {
            return 0;
        };
        for filter in &held.filters {
            index.unlink(id, filter);
        }
        held.filters.len()
    }

    pub fn filters(&self, id: ConnectionId) -> Vec<FilterKey> {
        let index = self.index.read().expect("registry lock poisoned");
        index
            .by_connection
            .get(&id)
            .map(|held| held.filters.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Connections interested in an event: by game id, wildcard, sport, or a
    /// team filter contained in either team name. Each connection appears once.
    pub fn matching(&self, event: &LiveUpdateEvent) -> Vec<ConnectionId> {
        let index = self.index.read().expect("registry lock poisoned");
        let mut out: HashSet<ConnectionId> = HashSet::new();

        let mut take = |key: &FilterKey| {
            if let Some(ids) = index.by_filter.get(key) {
                out.extend(ids.iter().copied());
            }
        };
        take(&FilterKey::Game(event.game_id.clone()));
        take(&FilterKey::All);
        if let Some(sport) = &event.sport {
            take(&FilterKey::sport(sport));
        }

        if !event.teams.is_empty() {
            let teams: Vec<String> = event.teams.iter().map(|t| t.to_lowercase()).collect();
            for (key, ids) in &index.by_filter {
                if let FilterKey::Team(needle) = key {
                    if teams.iter().any(|t| t.contains(needle.as_str())) {
                        out.extend(ids.iter().copied());
                    }
                }
            }
        }

        out.into_iter().collect()
    }

    pub fn connection_count(&self) -> usize {
        self.index.read().expect("registry lock poisoned").by_connection.len()
    }

    pub fn subscription_count(&self) -> usize {
        let index = self.index.read().expect("registry lock poisoned");
        index.by_connection.values().map(|held| held.filters.len()).sum()
    }
}
