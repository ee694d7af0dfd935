//! Viewport capability: read and change the page scroll offset.
//!
//! `RemoteViewport` is the implementation used when the page lives in another
//! process (the RPC bridge). It mirrors the last offset the host reported and
//! queues commands for the host to apply.

use serde::{Deserialize, Serialize};

use crate::types::scroll::ScrollBehavior;

/// Trait defining the viewport primitives the scroll manager drives.
pub trait Viewport {
    /// Current `(x, y)` scroll offset.
    fn scroll_offset(&self) -> (f64, f64);
    fn scroll_to(&mut self, x: f64, y: f64, behavior: ScrollBehavior);
    /// Scrolls the element with `element_id` into view.
    /// Returns false (and does nothing) when no such element exists.
    fn scroll_element_into_view(&mut self, element_id: &str, behavior: ScrollBehavior) -> bool;
}

/// A viewport change to be applied by the host page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ViewportCommand {
    ScrollTo {
        x: f64,
        y: f64,
        behavior: ScrollBehavior,
    },
    ScrollToElement {
        id: String,
        behavior: ScrollBehavior,
    },
}

/// Viewport mirrored from a host process.
#[derive(Debug, Clone, Default)]
pub struct RemoteViewport {
    offset: (f64, f64),
    anchors: Option<Vec<String>>,
    commands: Vec<ViewportCommand>,
}

impl RemoteViewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the offset the host reports after a user scroll.
    pub fn report_offset(&mut self, x: f64, y: f64) {
        self.offset = (x, y);
    }

    /// Declares which element ids exist on the current page. Until called,
    /// every id is assumed to exist and the host ignores unknown ones.
    pub fn set_anchors(&mut self, anchors: Option<Vec<String>>) {
        self.anchors = anchors;
    }

    /// Commands queued since the last drain, oldest first.
    pub fn pending_commands(&self) -> &[ViewportCommand] {
        &self.commands
    }

    pub fn drain_commands(&mut self) -> Vec<ViewportCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Viewport for RemoteViewport {
    fn scroll_offset(&self) -> (f64, f64) {
        self.offset
    }

    fn scroll_to(&mut self, x: f64, y: f64, behavior: ScrollBehavior) {
        self.offset = (x, y);
        self.commands.push(ViewportCommand::ScrollTo { x, y, behavior });
    }

    fn scroll_element_into_view(&mut self, element_id: &str, behavior: ScrollBehavior) -> bool {
        if let Some(anchors) = &self.anchors {
            if !anchors.iter().any(|a| a == element_id) {
                return false;
            }
        }
        self.commands.push(ViewportCommand::ScrollToElement {
            id: element_id.to_string(),
            behavior,
        });
        true
    }
}
