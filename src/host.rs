//! The host's "set time zone" service.
//!
//! The orchestrator only asks; the host validates the identifier and decides.

use chrono_tz::Tz;
use parking_lot::RwLock;

use crate::error::HostError;

/// Host-side time zone setting.
pub trait HostTimezone: Send + Sync {
    fn current_timezone(&self) -> Option<String>;

    /// Adopt `tz_id` as the host's time zone.
    fn set_timezone(&self, tz_id: &str) -> Result<(), HostError>;
}

/// In-process host holding the adopted zone in memory.
#[derive(Debug, Default)]
pub struct HostClock {
    timezone: RwLock<Option<Tz>>,
}

impl HostClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostTimezone for HostClock {
    fn current_timezone(&self) -> Option<String> {
        let tz = *self.timezone.read();
        tz.map(|tz| tz.name().to_string())
    }

    fn set_timezone(&self, tz_id: &str) -> Result<(), HostError> {
        let tz: Tz = tz_id
            .trim()
            .parse()
            .map_err(|_| HostError::InvalidTimezone(tz_id.to_string()))?;
        let previous = self.timezone.write().replace(tz);
        if previous != Some(tz) {
            tracing::info!(from = ?previous.map(|p| p.name()), to = tz.name(), "host time zone changed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_valid_timezone() {
        let host = HostClock::new();
        assert!(host.current_timezone().is_none());
        host.set_timezone("Europe/Paris").unwrap();
        assert_eq!(host.current_timezone().as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn test_reject_invalid_timezone() {
        let host = HostClock::new();
        host.set_timezone("Asia/Tokyo").unwrap();
        assert!(matches!(
            host.set_timezone("Mars/Olympus_Mons"),
            Err(HostError::InvalidTimezone(_))
        ));
        assert_eq!(host.current_timezone().as_deref(), Some("Asia/Tokyo"));
    }
}
