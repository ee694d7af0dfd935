//! Restoration Scheduler for Scrollkeeper.
//!
//! Decides between restoring a stored offset and resetting to the top, and
//! holds that decision until the host's next tick. Only the latest scheduled
//! action can run: each one carries a fresh token, and scheduling or
//! cancelling invalidates the previous token.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::navigation::{ScrollAction, TransitionVerdict};
use crate::types::scroll::{RouteKey, ScrollPosition};

/// Identifies one scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestorationToken(u64);

impl RestorationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// An action waiting for the next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRestoration {
    pub token: RestorationToken,
    pub route: RouteKey,
    pub action: ScrollAction,
}

/// Latest-wins deferral of restore/reset actions.
#[derive(Debug, Clone)]
pub struct RestorationScheduler {
    next_token: u64,
    pending: Option<PendingRestoration>,
    enabled: bool,
}

impl RestorationScheduler {
    pub fn new(enabled: bool) -> Self {
        Self {
            next_token: 1,
            pending: None,
            enabled,
        }
    }

    /// Restore only for a backward transition with a stored position while
    /// restoration is enabled; reset to the top otherwise.
    pub fn decide(&self, verdict: &TransitionVerdict, stored: Option<ScrollPosition>) -> ScrollAction {
        match stored {
            Some(position) if verdict.is_backward() && self.enabled => ScrollAction::Restore {
                x: position.x,
                y: position.y,
            },
            _ => ScrollAction::ResetToTop,
        }
    }

    /// Queues `action` for the next tick, superseding anything pending.
    pub fn schedule(&mut self, route: &RouteKey, action: ScrollAction) -> RestorationToken {
        let token = RestorationToken(self.next_token);
        self.next_token += 1;
        if let Some(previous) = self.pending.replace(PendingRestoration {
            token,
            route: route.clone(),
            action,
        }) {
            trace!(superseded = previous.token.value(), "pending restoration superseded");
        }
        trace!(token = token.value(), route = %route, ?action, "restoration scheduled");
        token
    }

    pub fn cancel(&mut self) -> Option<PendingRestoration> {
        let cancelled = self.pending.take();
        if let Some(p) = &cancelled {
            trace!(token = p.token.value(), "pending restoration cancelled");
        }
        cancelled
    }

    /// Takes whatever is pending; called once per host tick.
    pub fn take_due(&mut self) -> Option<PendingRestoration> {
        self.pending.take()
    }

    /// Takes the pending action only if it still belongs to `token`.
    pub fn take_if_current(&mut self, token: RestorationToken) -> Option<PendingRestoration> {
        if self.is_current(token) {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn is_current(&self, token: RestorationToken) -> bool {
        self.pending.as_ref().map(|p| p.token) == Some(token)
    }

    pub fn pending(&self) -> Option<&PendingRestoration> {
        self.pending.as_ref()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for RestorationScheduler {
    fn default() -> Self {
        Self::new(true)
    }
}
