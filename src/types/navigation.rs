use serde::{Deserialize, Serialize};

use super::scroll::{RouteKey, StoredPosition};

/// What caused a router navigation to start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTrigger {
    /// Link click or programmatic navigation.
    #[default]
    Imperative,
    /// The router reacted to a browser history traversal.
    Popstate,
}

/// Signals consumed by the scroll manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// The router is about to navigate to `url`.
    Start {
        url: String,
        #[serde(default)]
        trigger: NavigationTrigger,
    },
    /// The router finished navigating; `url` is the resolved location.
    End { url: String },
    /// The router abandoned the in-flight navigation.
    Cancel,
    /// The browser changed the session history entry outside router control.
    PopState,
    /// The user scrolled the viewport.
    Scroll { x: f64, y: f64 },
    /// The page is about to be discarded.
    BeforeUnload,
}

/// Normalized kind of a completed transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    Push,
    Replace,
    Pop,
}

/// Final classification of a completed transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionVerdict {
    pub route: RouteKey,
    pub kind: NavigationKind,
}

impl TransitionVerdict {
    pub fn is_backward(&self) -> bool {
        self.kind == NavigationKind::Pop
    }
}

/// Viewport change requested by the restoration scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScrollAction {
    Restore { x: f64, y: f64 },
    ResetToTop,
}

impl ScrollAction {
    pub fn target(&self) -> (f64, f64) {
        match self {
            ScrollAction::Restore { x, y } => (*x, *y),
            ScrollAction::ResetToTop => (0.0, 0.0),
        }
    }
}

/// Snapshot of manager state for inspection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugInfo {
    pub history: Vec<RouteKey>,
    pub positions: Vec<StoredPosition>,
    pub restoration_enabled: bool,
    pub current_route: Option<RouteKey>,
    pub pending: Option<ScrollAction>,
}
