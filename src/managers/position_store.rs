//! Position Store for Scrollkeeper.
//!
//! Maps a route key to its last scroll snapshot across two tiers: a volatile
//! map owned by the running instance and a durable session storage written
//! through on every store. The volatile tier is always consulted first and
//! stays authoritative when the durable tier fails.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::services::session_storage::SessionStorage;
use crate::types::scroll::{RouteKey, ScrollPosition};
use crate::types::settings::StorageSettings;

/// Trait defining position store operations. None of them fail: durable
/// tier problems are logged and absorbed.
pub trait PositionStoreTrait {
    fn store(&mut self, route: &RouteKey, position: ScrollPosition);
    fn get(&self, route: &RouteKey) -> Option<ScrollPosition>;
    fn has(&self, route: &RouteKey) -> bool;
    fn clear(&mut self, route: &RouteKey);
    fn clear_all(&mut self);
    fn entries(&self) -> Vec<(RouteKey, ScrollPosition)>;
}

/// Two-tier route → position store.
pub struct PositionStore<S: SessionStorage> {
    volatile: HashMap<RouteKey, ScrollPosition>,
    durable: S,
    key_prefix: String,
    max_positions: usize,
}

impl<S: SessionStorage> PositionStore<S> {
    pub fn new(durable: S, settings: &StorageSettings) -> Self {
        Self {
            volatile: HashMap::new(),
            durable,
            key_prefix: settings.key_prefix.clone(),
            max_positions: settings.max_positions,
        }
    }

    /// Durable key for `route`: prefix followed by the route key.
    pub fn durable_key(&self, route: &RouteKey) -> String {
        format!("{}{}", self.key_prefix, route.as_str())
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// 0 means unbounded.
    pub fn set_max_positions(&mut self, max_positions: usize) {
        self.max_positions = max_positions;
    }

    /// Number of entries in the volatile tier.
    pub fn volatile_len(&self) -> usize {
        self.volatile.len()
    }

    /// Forgets the volatile tier, as a page reload would.
    pub fn drop_volatile(&mut self) {
        self.volatile.clear();
    }

    pub fn durable(&self) -> &S {
        &self.durable
    }

    pub fn durable_mut(&mut self) -> &mut S {
        &mut self.durable
    }

    pub fn into_durable(self) -> S {
        self.durable
    }

    fn read_durable(&self, route: &RouteKey) -> Option<ScrollPosition> {
        let key = self.durable_key(route);
        match self.durable.get_item(&key) {
            Ok(Some(text)) => match serde_json::from_str::<ScrollPosition>(&text) {
                Ok(position) => Some(position),
                Err(e) => {
                    debug!(route = %route, error = %e, "ignoring unparseable durable position");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(route = %route, error = %e, "durable read failed");
                None
            }
        }
    }

    fn write_durable(&mut self, route: &RouteKey, position: &ScrollPosition) {
        let key = self.durable_key(route);
        let text = match serde_json::to_string(position) {
            Ok(text) => text,
            Err(e) => {
                warn!(route = %route, error = %e, "durable write skipped: serialization failed");
                return;
            }
        };
        if let Err(e) = self.durable.set_item(&key, &text) {
            warn!(route = %route, error = %e, "durable write skipped");
        }
    }

    fn remove_durable(&mut self, route: &RouteKey) {
        let key = self.durable_key(route);
        if let Err(e) = self.durable.remove_item(&key) {
            warn!(route = %route, error = %e, "durable remove failed");
        }
    }

    /// Evicts the oldest snapshots until storing `incoming` stays within the
    /// bound. Both tiers count, so durable entries left over from before a
    /// reload are evicted too.
    fn evict_if_full(&mut self, incoming: &RouteKey) {
        if self.max_positions == 0 || self.has(incoming) {
            return;
        }
        let mut known = self.entries();
        if known.len() < self.max_positions {
            return;
        }
        known.sort_by_key(|(_, p)| p.timestamp);
        let excess = known.len() + 1 - self.max_positions;
        for (route, _) in known.into_iter().take(excess) {
            debug!(route = %route, "evicting oldest scroll position");
            self.volatile.remove(&route);
            self.remove_durable(&route);
        }
    }
}

impl<S: SessionStorage> PositionStoreTrait for PositionStore<S> {
    /// Overwrites the volatile entry, then writes through to the durable tier.
    fn store(&mut self, route: &RouteKey, position: ScrollPosition) {
        self.evict_if_full(route);
        self.volatile.insert(route.clone(), position);
        self.write_durable(route, &position);
    }

    fn get(&self, route: &RouteKey) -> Option<ScrollPosition> {
        if let Some(position) = self.volatile.get(route) {
            return Some(*position);
        }
        self.read_durable(route)
    }

    /// True if either tier holds an entry, parseable or not.
    fn has(&self, route: &RouteKey) -> bool {
        if self.volatile.contains_key(route) {
            return true;
        }
        matches!(self.durable.get_item(&self.durable_key(route)), Ok(Some(_)))
    }

    fn clear(&mut self, route: &RouteKey) {
        self.volatile.remove(route);
        self.remove_durable(route);
    }

    /// Empties the volatile tier and removes every prefixed durable key.
    /// Durable keys without the prefix are left alone.
    fn clear_all(&mut self) {
        self.volatile.clear();
        let keys = match self.durable.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "durable clear skipped: cannot list keys");
                return;
            }
        };
        for key in keys.iter().filter(|k| k.starts_with(&self.key_prefix)) {
            if let Err(e) = self.durable.remove_item(key) {
                warn!(key = %key, error = %e, "durable remove failed");
            }
        }
    }

    /// All known positions sorted by route; volatile entries win over durable ones.
    fn entries(&self) -> Vec<(RouteKey, ScrollPosition)> {
        let mut merged: Vec<(RouteKey, ScrollPosition)> = self
            .volatile
            .iter()
            .map(|(route, position)| (route.clone(), *position))
            .collect();

        if let Ok(keys) = self.durable.keys() {
            for key in keys {
                let Some(raw_route) = key.strip_prefix(&self.key_prefix) else {
                    continue;
                };
                let route = RouteKey::new(raw_route);
                if self.volatile.contains_key(&route) {
                    continue;
                }
                if let Some(position) = self.read_durable(&route) {
                    merged.push((route, position));
                }
            }
        }

        merged.sort_by(|a, b| a.0.cmp(&b.0));
        merged
    }
}
