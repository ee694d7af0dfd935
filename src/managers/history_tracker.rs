//! History Stack Tracker for Scrollkeeper.
//!
//! Keeps the ordered sequence of visited route keys. Revisiting a key
//! truncates the sequence back to it, so the retained prefix is always what
//! further "back" actions can reach.

use tracing::trace;

use crate::types::scroll::RouteKey;
use crate::types::settings::HistorySettings;

/// Bounded navigation history.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    entries: Vec<RouteKey>,
    max_entries: usize,
    retain_on_overflow: usize,
}

impl HistoryTracker {
    /// Creates an empty tracker with the default bounds (50, trimmed to 25).
    pub fn new() -> Self {
        Self::with_settings(&HistorySettings::default())
    }

    pub fn with_settings(settings: &HistorySettings) -> Self {
        let mut tracker = Self {
            entries: Vec::new(),
            max_entries: 0,
            retain_on_overflow: 0,
        };
        tracker.set_limits(settings.max_entries, settings.retain_on_overflow);
        tracker
    }

    /// Updates the bounds. `retain_on_overflow` is clamped to `1..=max_entries`.
    pub fn set_limits(&mut self, max_entries: usize, retain_on_overflow: usize) {
        self.max_entries = max_entries.max(1);
        self.retain_on_overflow = retain_on_overflow.clamp(1, self.max_entries);
    }

    /// Records the destination of a completed transition.
    ///
    /// A known key truncates the sequence to end at it; a new key is appended
    /// and the sequence trimmed to the most recent entries when it overflows.
    pub fn record_transition(&mut self, route: &RouteKey) {
        if let Some(index) = self.position(route) {
            self.entries.truncate(index + 1);
            return;
        }

        self.entries.push(route.clone());
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.retain_on_overflow;
            self.entries.drain(..excess);
            trace!(retained = self.entries.len(), "navigation history trimmed");
        }
    }

    /// True iff `route` appears before the tail. Must be asked before
    /// `record_transition` runs for the same transition.
    pub fn is_backward(&self, route: &RouteKey) -> bool {
        match self.position(route) {
            Some(index) => index + 1 < self.entries.len(),
            None => false,
        }
    }

    pub fn position(&self, route: &RouteKey) -> Option<usize> {
        self.entries.iter().position(|r| r == route)
    }

    pub fn entries(&self) -> &[RouteKey] {
        &self.entries
    }

    pub fn current(&self) -> Option<&RouteKey> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new()
    }
}
