// Scrollkeeper services
// Environment capabilities (viewport, session storage, clock) and settings.

pub mod clock;
pub mod session_storage;
pub mod settings_engine;
pub mod viewport;
