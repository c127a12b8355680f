//! Presence resolution: the current-status board, resolve-at-instant and
//! the rolling week view. Read-only over stored segments.

pub mod resolve;
pub mod service;
pub mod week;

pub use resolve::{PresenceKind, ResolvedStatus};
pub use service::{CurrentPresence, PresenceService};
pub use week::{WeekDay, WeekEntry};
