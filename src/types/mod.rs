// Scrollkeeper shared type definitions
// Each submodule defines types used across the crate.

pub mod errors;
pub mod navigation;
pub mod scroll;
pub mod settings;
