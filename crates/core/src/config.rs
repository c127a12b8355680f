use std::time::Duration;

use chrono_tz::Tz;

use crate::registry::DEFAULT_REGISTRY_TTL;

/// Settings shared by the planner and the presence resolver.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Zone in which staff dates and `HH:MM` times are interpreted.
    pub timezone: Tz,
    /// Lifetime of a cached registry snapshot.
    pub registry_ttl: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Los_Angeles,
            registry_ttl: DEFAULT_REGISTRY_TTL,
        }
    }
}
