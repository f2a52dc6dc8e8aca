//! Offline time zone lookup from bundled boundary polygons.
//!
//! Used when the active provider yields no time zone. The polygon set is
//! decoded on first use and shared by every instance afterwards; lookups
//! are CPU-bound and belong on a blocking thread.

use std::sync::OnceLock;

use tzf_rs::DefaultFinder;

use super::types::Coordinate;

/// Point-in-polygon time zone resolver.
pub struct FallbackResolver {
    finder: OnceLock<DefaultFinder>,
}

impl Default for FallbackResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FallbackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResolver")
            .field("loaded", &self.finder.get().is_some())
            .finish()
    }
}

impl FallbackResolver {
    pub fn new() -> Self {
        Self {
            finder: OnceLock::new(),
        }
    }

    /// Decode the polygon set now instead of on the first lookup.
    pub fn warm(&self) {
        self.finder();
    }

    fn finder(&self) -> &DefaultFinder {
        self.finder.get_or_init(DefaultFinder::new)
    }

    /// IANA zone containing `coord`, or `None` over open water.
    pub fn lookup(&self, coord: Coordinate) -> Option<String> {
        let name = self.finder().get_tz_name(coord.lon, coord.lat);
        land_zone(name).map(str::to_string)
    }
}

/// The polygon set covers the oceans with nautical `Etc/GMT±N` zones; those
/// (and an empty answer) mean no land polygon matched.
fn land_zone(name: &str) -> Option<&str> {
    let name = name.trim();
    if name.is_empty() || name.starts_with("Etc/") {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_zone_filter() {
        assert_eq!(land_zone("Europe/Paris"), Some("Europe/Paris"));
        assert_eq!(land_zone("Etc/GMT+9"), None);
        assert_eq!(land_zone(""), None);
    }

    #[test]
    fn test_lookup_paris() {
        let resolver = FallbackResolver::new();
        let coord = Coordinate::new(48.8566, 2.3522).unwrap();
        assert_eq!(resolver.lookup(coord).as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn test_lookup_tokyo() {
        let resolver = FallbackResolver::new();
        let coord = Coordinate::new(35.6762, 139.6503).unwrap();
        assert_eq!(resolver.lookup(coord).as_deref(), Some("Asia/Tokyo"));
    }

    #[test]
    fn test_lookup_open_ocean() {
        let resolver = FallbackResolver::new();
        // South Pacific, far from any coast.
        let coord = Coordinate::new(-30.0, -130.0).unwrap();
        assert_eq!(resolver.lookup(coord), None);
    }

    #[test]
    fn test_warm_is_reused() {
        let resolver = FallbackResolver::new();
        resolver.warm();
        assert!(format!("{:?}", resolver).contains("loaded: true"));
    }
}
