//! Presence: who is reachable right now, and the persisted flags that
//! mirror it.

pub mod flags;
pub mod registry;

pub use flags::PresenceFlagWriter;
pub use registry::PresenceRegistry;
