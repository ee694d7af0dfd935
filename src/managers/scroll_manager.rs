//! Scroll Manager for Scrollkeeper.
//!
//! Owns the position store, history tracker, classifier and scheduler, and
//! wires them to the injected viewport, session storage and clock. It is a
//! plain value built by the application root; independent instances share
//! nothing.
//!
//! Event flow per transition:
//! `Start` snapshots the route being left and cancels any pending action,
//! `End` classifies, records history and schedules restore-or-reset, and the
//! host's next tick (`run_pending_restoration`) applies it.

use tracing::{debug, info};

use crate::managers::history_tracker::HistoryTracker;
use crate::managers::navigation_classifier::NavigationClassifier;
use crate::managers::position_store::{PositionStore, PositionStoreTrait};
use crate::managers::restoration_scheduler::{RestorationScheduler, RestorationToken};
use crate::services::clock::{Clock, SystemClock};
use crate::services::session_storage::SessionStorage;
use crate::services::viewport::Viewport;
use crate::types::navigation::{
    DebugInfo, NavigationEvent, NavigationTrigger, ScrollAction, TransitionVerdict,
};
use crate::types::scroll::{RouteKey, ScrollBehavior, ScrollPosition, StoredPosition};
use crate::types::settings::ScrollSettings;

/// Trait defining the scroll manager's public surface.
///
/// Control operations act on the store and viewport directly and never
/// influence how transitions are classified.
pub trait ScrollManagerTrait {
    fn handle_event(&mut self, event: NavigationEvent) -> Option<RestorationToken>;
    fn run_pending_restoration(&mut self) -> Option<ScrollAction>;
    fn scroll_to_top(&mut self, behavior: ScrollBehavior);
    fn scroll_to_element(&mut self, element_id: &str, behavior: ScrollBehavior) -> bool;
    fn scroll_to(&mut self, x: f64, y: f64, behavior: ScrollBehavior);
    fn save_current_position(&mut self) -> Option<ScrollPosition>;
    fn clear_position(&mut self, route: &RouteKey);
    fn clear_all_positions(&mut self);
    fn enable_restoration(&mut self);
    fn disable_restoration(&mut self);
    fn is_restoration_enabled(&self) -> bool;
    fn reset_history(&mut self);
    fn debug_info(&self) -> DebugInfo;
}

/// Navigation-aware scroll position manager.
pub struct ScrollManager<V: Viewport, S: SessionStorage> {
    viewport: V,
    store: PositionStore<S>,
    tracker: HistoryTracker,
    classifier: NavigationClassifier,
    scheduler: RestorationScheduler,
    clock: Box<dyn Clock>,
    smooth_scroll_to_top: bool,
}

impl<V: Viewport, S: SessionStorage> ScrollManager<V, S> {
    pub fn new(viewport: V, storage: S, settings: &ScrollSettings) -> Self {
        Self::with_clock(viewport, storage, settings, Box::new(SystemClock))
    }

    pub fn with_clock(
        viewport: V,
        storage: S,
        settings: &ScrollSettings,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            viewport,
            store: PositionStore::new(storage, &settings.storage),
            tracker: HistoryTracker::with_settings(&settings.history),
            classifier: NavigationClassifier::new(),
            scheduler: RestorationScheduler::new(settings.restoration.enabled),
            clock,
            smooth_scroll_to_top: settings.restoration.smooth_scroll_to_top,
        }
    }

    /// Applies changed settings to a running manager. A new key prefix only
    /// takes effect for managers built afterwards.
    ///
    /// The enabled flag is left alone: a runtime `disable_restoration` holds
    /// until it is changed explicitly.
    pub fn apply_settings(&mut self, settings: &ScrollSettings) {
        self.smooth_scroll_to_top = settings.restoration.smooth_scroll_to_top;
        self.tracker
            .set_limits(settings.history.max_entries, settings.history.retain_on_overflow);
        self.store.set_max_positions(settings.storage.max_positions);
    }

    fn snapshot(&self) -> ScrollPosition {
        let (x, y) = self.viewport.scroll_offset();
        ScrollPosition::new(x, y, self.clock.now_millis())
    }

    /// Router is about to leave the current route for `url`.
    ///
    /// The outgoing route is snapshotted first, then any action still
    /// pending from the previous transition is dropped.
    pub fn on_navigation_start(&mut self, url: &str, trigger: NavigationTrigger) -> bool {
        self.on_navigation_start_at(url, trigger, None)
    }

    /// Like [`on_navigation_start`](Self::on_navigation_start), with the
    /// offset the host reported alongside the signal.
    ///
    /// Without a reported offset, a still-pending action stands in for the
    /// viewport: the outgoing route was about to be moved to its target, and
    /// the viewport still shows the page before it.
    pub fn on_navigation_start_at(
        &mut self,
        url: &str,
        trigger: NavigationTrigger,
        reported: Option<(f64, f64)>,
    ) -> bool {
        if let Some(current) = self.classifier.current_route().cloned() {
            let (x, y) = match (reported, self.scheduler.pending()) {
                (Some(offset), _) => offset,
                (None, Some(pending)) => pending.action.target(),
                (None, None) => self.viewport.scroll_offset(),
            };
            let position = ScrollPosition::new(x, y, self.clock.now_millis());
            self.store.store(&current, position);
        }
        self.scheduler.cancel();
        let target = RouteKey::new(url);
        self.classifier
            .on_navigation_start(&target, trigger, &self.tracker)
    }

    /// Router settled on `url`: classify and schedule restore-or-reset.
    pub fn on_navigation_end(&mut self, url: &str) -> (TransitionVerdict, RestorationToken) {
        let resolved = RouteKey::new(url);
        let verdict = self
            .classifier
            .on_navigation_end(&resolved, &mut self.tracker);
        let stored = if verdict.is_backward() {
            self.store.get(&verdict.route)
        } else {
            None
        };
        let action = self.scheduler.decide(&verdict, stored);
        let token = self.scheduler.schedule(&verdict.route, action);
        (verdict, token)
    }

    pub fn on_navigation_cancel(&mut self) {
        self.classifier.on_navigation_cancel();
    }

    pub fn on_pop_state(&mut self) {
        self.classifier.on_pop_state();
    }

    /// Records a user scroll for the current route.
    ///
    /// Ignored while a transition is in flight or its action is pending, so
    /// the incoming page cannot overwrite the outgoing snapshot.
    pub fn on_scroll(&mut self, x: f64, y: f64) {
        if self.classifier.is_in_flight() || self.scheduler.pending().is_some() {
            return;
        }
        if let Some(current) = self.classifier.current_route().cloned() {
            let position = ScrollPosition::new(x, y, self.clock.now_millis());
            self.store.store(&current, position);
        }
    }

    /// Page is about to be discarded: persist where the user is.
    pub fn on_before_unload(&mut self) {
        if self.classifier.is_in_flight() {
            return;
        }
        self.save_current_position();
    }

    /// Applies the pending action only if `token` is still the latest one.
    pub fn run_restoration(&mut self, token: RestorationToken) -> Option<ScrollAction> {
        let due = self.scheduler.take_if_current(token)?;
        let (x, y) = due.action.target();
        self.viewport.scroll_to(x, y, ScrollBehavior::Instant);
        debug!(route = %due.route, action = ?due.action, "scroll action applied");
        Some(due.action)
    }

    pub fn has_pending_restoration(&self) -> bool {
        self.scheduler.pending().is_some()
    }

    pub fn pending_action(&self) -> Option<ScrollAction> {
        self.scheduler.pending().map(|p| p.action)
    }

    pub fn stored_position(&self, route: &RouteKey) -> Option<ScrollPosition> {
        self.store.get(route)
    }

    pub fn has_stored_position(&self, route: &RouteKey) -> bool {
        self.store.has(route)
    }

    pub fn history(&self) -> &[RouteKey] {
        self.tracker.entries()
    }

    pub fn current_route(&self) -> Option<&RouteKey> {
        self.classifier.current_route()
    }

    pub fn smooth_scroll_to_top(&self) -> bool {
        self.smooth_scroll_to_top
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn storage(&self) -> &S {
        self.store.durable()
    }

    pub fn storage_mut(&mut self) -> &mut S {
        self.store.durable_mut()
    }

    /// Starts over as a reloaded page would: volatile positions, history,
    /// classifier state and any pending action are dropped; the durable tier
    /// is kept.
    pub fn reload(&mut self) {
        self.store.drop_volatile();
        self.tracker.reset();
        self.classifier.reset();
        self.scheduler.cancel();
        info!("scroll manager reloaded");
    }

    /// Tears the manager down, handing back its environment.
    pub fn into_environment(self) -> (V, S) {
        (self.viewport, self.store.into_durable())
    }
}

impl<V: Viewport, S: SessionStorage> ScrollManagerTrait for ScrollManager<V, S> {
    /// Dispatches one signal. Returns the token of the action scheduled by a
    /// completed transition.
    fn handle_event(&mut self, event: NavigationEvent) -> Option<RestorationToken> {
        match event {
            NavigationEvent::Start { url, trigger } => {
                self.on_navigation_start(&url, trigger);
                None
            }
            NavigationEvent::End { url } => Some(self.on_navigation_end(&url).1),
            NavigationEvent::Cancel => {
                self.on_navigation_cancel();
                None
            }
            NavigationEvent::PopState => {
                self.on_pop_state();
                None
            }
            NavigationEvent::Scroll { x, y } => {
                self.on_scroll(x, y);
                None
            }
            NavigationEvent::BeforeUnload => {
                self.on_before_unload();
                None
            }
        }
    }

    /// The host's next tick: applies whatever is pending.
    fn run_pending_restoration(&mut self) -> Option<ScrollAction> {
        let token = self.scheduler.pending()?.token;
        self.run_restoration(token)
    }

    fn scroll_to_top(&mut self, behavior: ScrollBehavior) {
        self.viewport.scroll_to(0.0, 0.0, behavior);
    }

    fn scroll_to_element(&mut self, element_id: &str, behavior: ScrollBehavior) -> bool {
        let found = self.viewport.scroll_element_into_view(element_id, behavior);
        if !found {
            debug!(element_id, "scroll target not found");
        }
        found
    }

    fn scroll_to(&mut self, x: f64, y: f64, behavior: ScrollBehavior) {
        self.viewport.scroll_to(x, y, behavior);
    }

    fn save_current_position(&mut self) -> Option<ScrollPosition> {
        let current = self.classifier.current_route()?.clone();
        let position = self.snapshot();
        self.store.store(&current, position);
        Some(position)
    }

    fn clear_position(&mut self, route: &RouteKey) {
        self.store.clear(route);
    }

    fn clear_all_positions(&mut self) {
        self.store.clear_all();
    }

    fn enable_restoration(&mut self) {
        self.scheduler.set_enabled(true);
    }

    fn disable_restoration(&mut self) {
        self.scheduler.set_enabled(false);
    }

    fn is_restoration_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    fn reset_history(&mut self) {
        self.tracker.reset();
    }

    fn debug_info(&self) -> DebugInfo {
        let now = self.clock.now_millis();
        DebugInfo {
            history: self.tracker.entries().to_vec(),
            positions: self
                .store
                .entries()
                .into_iter()
                .map(|(route, position)| StoredPosition {
                    route,
                    age_ms: now.saturating_sub(position.timestamp).max(0),
                    position,
                })
                .collect(),
            restoration_enabled: self.scheduler.is_enabled(),
            current_route: self.classifier.current_route().cloned(),
            pending: self.pending_action(),
        }
    }
}
