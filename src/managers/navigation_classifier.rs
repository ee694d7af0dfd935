//! Navigation Event Classifier for Scrollkeeper.
//!
//! Browsers never say "this SPA transition came from the back button", so the
//! classifier fuses two sources: membership of the destination in the history
//! stack, and a latch set by the raw pop signal (or a popstate-triggered
//! router start). The latch is cleared when the transition completes.

use tracing::debug;

use crate::managers::history_tracker::HistoryTracker;
use crate::types::navigation::{NavigationKind, NavigationTrigger, TransitionVerdict};
use crate::types::scroll::RouteKey;

#[derive(Debug, Clone)]
struct InFlight {
    target: RouteKey,
    backward: bool,
}

/// Turns router and browser signals into one verdict per transition.
#[derive(Debug, Clone, Default)]
pub struct NavigationClassifier {
    pending_pop: bool,
    in_flight: Option<InFlight>,
    current: Option<RouteKey>,
}

impl NavigationClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Browser changed the history entry outside router control.
    pub fn on_pop_state(&mut self) {
        self.pending_pop = true;
    }

    /// Router is leaving the current route for `target`.
    ///
    /// Returns the provisional backward verdict. The caller snapshots the
    /// route being left before invoking this.
    pub fn on_navigation_start(
        &mut self,
        target: &RouteKey,
        trigger: NavigationTrigger,
        tracker: &HistoryTracker,
    ) -> bool {
        if trigger == NavigationTrigger::Popstate {
            self.pending_pop = true;
        }
        let backward = tracker.is_backward(target) || self.pending_pop;
        debug!(target = %target, backward, "navigation started");
        self.in_flight = Some(InFlight {
            target: target.clone(),
            backward,
        });
        backward
    }

    /// Router settled on `resolved`. Finalizes the verdict, records the
    /// transition in `tracker` and clears the pop latch.
    pub fn on_navigation_end(
        &mut self,
        resolved: &RouteKey,
        tracker: &mut HistoryTracker,
    ) -> TransitionVerdict {
        let started_backward = match self.in_flight.take() {
            Some(flight) if &flight.target == resolved => flight.backward,
            Some(flight) => {
                debug!(target = %flight.target, resolved = %resolved, "navigation redirected");
                false
            }
            None => false,
        };
        let backward = started_backward || self.pending_pop || tracker.is_backward(resolved);

        let kind = if backward {
            NavigationKind::Pop
        } else if self.current.as_ref() == Some(resolved) {
            NavigationKind::Replace
        } else {
            NavigationKind::Push
        };

        tracker.record_transition(resolved);
        self.pending_pop = false;
        self.current = Some(resolved.clone());

        debug!(route = %resolved, ?kind, "navigation classified");
        TransitionVerdict {
            route: resolved.clone(),
            kind,
        }
    }

    /// Router abandoned the in-flight navigation. The pop latch survives,
    /// since the browser entry already changed.
    pub fn on_navigation_cancel(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            debug!(target = %flight.target, "navigation cancelled");
        }
    }

    pub fn current_route(&self) -> Option<&RouteKey> {
        self.current.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_pop_pending(&self) -> bool {
        self.pending_pop
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
