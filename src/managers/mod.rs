// Scrollkeeper state managers
// Position store, history stack, navigation classification, restoration scheduling,
// and the scroll manager that owns them.

pub mod history_tracker;
pub mod navigation_classifier;
pub mod position_store;
pub mod restoration_scheduler;
pub mod scroll_manager;
