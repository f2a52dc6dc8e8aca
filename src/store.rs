//! In-memory snapshot store: latest resolution per activated instance.
//!
//! One writer per entry (the instance's update cycle), any number of
//! readers. A snapshot is replaced whole behind an `Arc`, so readers never
//! see a half-written one. Entries are only dropped on deactivation.
//!
//! Every activation gets a fresh generation. A write carrying an older
//! generation is rejected, so a cycle that outlives its configuration
//! cannot overwrite its successor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::location::{AddressSnapshot, ProviderKind, PublicLandRecord, TimezoneResolution};

/// Everything one update cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub provider: ProviderKind,
    pub address: AddressSnapshot,
    pub timezone: TimezoneResolution,
    pub public_land: Option<PublicLandRecord>,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Flatten into the attribute set the presentation layer reads.
    pub fn attributes(&self) -> PublishedAttributes {
        // Offline instances only ever publish time zone attributes.
        let address = if self.provider == ProviderKind::Offline {
            AddressSnapshot {
                plus_code: self.address.plus_code.clone(),
                ..AddressSnapshot::default()
            }
        } else {
            self.address.clone()
        };

        PublishedAttributes {
            current_address: address.current_address,
            city: address.city,
            state: address.state,
            country: address.country,
            neighborhood: address.neighborhood,
            plus_code: address.plus_code,
            timezone_id: self.timezone.timezone_id.clone(),
            timezone_abbreviation: self.timezone.abbreviation.clone(),
            timezone_full: self.timezone.full_display_name.clone(),
            timezone_source: self.timezone.source.to_string(),
            public_lands: self.public_land.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Read-only attributes exposed per instance. Absent values are unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plus_code: Option<String>,
    pub timezone_id: Option<String>,
    pub timezone_abbreviation: Option<String>,
    pub timezone_full: Option<String>,
    pub timezone_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_lands: Option<PublicLandRecord>,
    pub updated_at: DateTime<Utc>,
}

/// Update sink notified after every publish.
pub trait SnapshotObserver: Send + Sync {
    fn snapshot_updated(&self, instance_id: &str, snapshot: &Snapshot);
}

#[derive(Default)]
struct Entry {
    generation: u64,
    snapshot: Option<Arc<Snapshot>>,
    observers: Vec<Arc<dyn SnapshotObserver>>,
}

/// Instance id → latest snapshot plus observers.
#[derive(Default)]
pub struct SnapshotStore {
    entries: RwLock<HashMap<String, Entry>>,
    last_generation: AtomicU64,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("instances", &self.ids())
            .finish()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&self) -> u64 {
        self.last_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Create an empty entry at activation, replacing any existing one
    /// together with its observers. Returns the entry's generation.
    pub fn create(&self, instance_id: &str) -> u64 {
        let generation = self.next_generation();
        self.entries.write().insert(
            instance_id.to_string(),
            Entry {
                generation,
                ..Entry::default()
            },
        );
        generation
    }

    /// Start a new generation for a reconfigured instance. The snapshot is
    /// cleared and observers are kept. `None` if the instance is not active.
    pub fn renew(&self, instance_id: &str) -> Option<u64> {
        let generation = self.next_generation();
        let mut entries = self.entries.write();
        let entry = entries.get_mut(instance_id)?;
        entry.generation = generation;
        entry.snapshot = None;
        Some(generation)
    }

    /// Latest snapshot, or `None` before the first cycle completes.
    pub fn get(&self, instance_id: &str) -> Option<Arc<Snapshot>> {
        self.entries
            .read()
            .get(instance_id)
            .and_then(|e| e.snapshot.clone())
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.entries.read().contains_key(instance_id)
    }

    /// Replace the snapshot and notify observers. Returns `None` (and drops
    /// the snapshot) when the instance was deactivated or reconfigured since
    /// `generation` was handed out.
    pub fn put(&self, instance_id: &str, generation: u64, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let snapshot = Arc::new(snapshot);
        let observers = {
            let mut entries = self.entries.write();
            let entry = entries
                .get_mut(instance_id)
                .filter(|e| e.generation == generation)?;
            entry.snapshot = Some(Arc::clone(&snapshot));
            entry.observers.clone()
        };

        for observer in &observers {
            observer.snapshot_updated(instance_id, &snapshot);
        }
        Some(snapshot)
    }

    /// Returns false if the instance is not active.
    pub fn register_observer(&self, instance_id: &str, observer: Arc<dyn SnapshotObserver>) -> bool {
        match self.entries.write().get_mut(instance_id) {
            Some(entry) => {
                entry.observers.push(observer);
                true
            }
            None => false,
        }
    }

    /// Drop the entry and its observers. Returns whether it existed.
    pub fn remove(&self, instance_id: &str) -> bool {
        self.entries.write().remove(instance_id).is_some()
    }

    /// Active instance ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Observer that logs each published snapshot.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl SnapshotObserver for LoggingObserver {
    fn snapshot_updated(&self, instance_id: &str, snapshot: &Snapshot) {
        tracing::info!(
            instance = instance_id,
            timezone = snapshot.timezone.timezone_id.as_deref().unwrap_or("-"),
            source = %snapshot.timezone.source,
            city = snapshot.address.city.as_deref().unwrap_or("-"),
            "location updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::TimezoneSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(city: &str, tz: &str) -> Snapshot {
        Snapshot {
            provider: ProviderKind::Osm,
            address: AddressSnapshot {
                city: Some(city.to_string()),
                ..AddressSnapshot::default()
            },
            timezone: TimezoneResolution {
                timezone_id: Some(tz.to_string()),
                source: TimezoneSource::LocalFallback,
                abbreviation: None,
                full_display_name: None,
                is_dst: None,
            },
            public_land: None,
            updated_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl SnapshotObserver for CountingObserver {
        fn snapshot_updated(&self, _instance_id: &str, _snapshot: &Snapshot) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_put_get() {
        let store = SnapshotStore::new();
        let generation = store.create("home");
        assert!(store.get("home").is_none());

        store.put("home", generation, snapshot("Paris", "Europe/Paris")).unwrap();
        let got = store.get("home").unwrap();
        assert_eq!(got.address.city.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_put_replaces_whole_snapshot() {
        let store = SnapshotStore::new();
        let generation = store.create("home");
        store.put("home", generation, snapshot("Paris", "Europe/Paris"));
        let before = store.get("home").unwrap();

        store.put("home", generation, snapshot("Tokyo", "Asia/Tokyo"));
        let after = store.get("home").unwrap();

        // Readers holding the old Arc keep a consistent view.
        assert_eq!(before.address.city.as_deref(), Some("Paris"));
        assert_eq!(before.timezone.timezone_id.as_deref(), Some("Europe/Paris"));
        assert_eq!(after.address.city.as_deref(), Some("Tokyo"));
        assert_eq!(after.timezone.timezone_id.as_deref(), Some("Asia/Tokyo"));
    }

    #[test]
    fn test_put_without_entry_is_dropped() {
        let store = SnapshotStore::new();
        assert!(store.put("ghost", 1, snapshot("Paris", "Europe/Paris")).is_none());
        assert!(!store.contains("ghost"));
    }

    #[test]
    fn test_observers_notified() {
        let store = SnapshotStore::new();
        let generation = store.create("home");
        let observer = Arc::new(CountingObserver::default());
        assert!(store.register_observer("home", observer.clone()));
        assert!(!store.register_observer("other", observer.clone()));

        store.put("home", generation, snapshot("Paris", "Europe/Paris"));
        store.put("home", generation, snapshot("Paris", "Europe/Paris"));
        assert_eq!(observer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stale_generation_is_rejected() {
        let store = SnapshotStore::new();
        let old = store.create("home");
        let observer = Arc::new(CountingObserver::default());
        store.register_observer("home", observer.clone());
        store.put("home", old, snapshot("Paris", "Europe/Paris"));

        let new = store.renew("home").unwrap();
        assert_ne!(old, new);
        assert!(store.get("home").is_none());

        assert!(store.put("home", old, snapshot("Paris", "Europe/Paris")).is_none());
        assert!(store.get("home").is_none());

        store.put("home", new, snapshot("Tokyo", "Asia/Tokyo")).unwrap();
        assert_eq!(store.get("home").unwrap().timezone.timezone_id.as_deref(), Some("Asia/Tokyo"));
        // Observers survive the renewal; the rejected write notified no one.
        assert_eq!(observer.calls.load(Ordering::SeqCst), 2);
        assert!(store.renew("ghost").is_none());
    }

    #[test]
    fn test_create_replaces_entry_and_observers() {
        let store = SnapshotStore::new();
        let first = store.create("home");
        let observer = Arc::new(CountingObserver::default());
        store.register_observer("home", observer.clone());

        let second = store.create("home");
        assert!(store.put("home", first, snapshot("Paris", "Europe/Paris")).is_none());
        store.put("home", second, snapshot("Paris", "Europe/Paris")).unwrap();
        assert_eq!(observer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove() {
        let store = SnapshotStore::new();
        store.create("b");
        store.create("a");
        assert_eq!(store.ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_offline_attributes_hide_address() {
        let mut snap = snapshot("Paris", "Europe/Paris");
        snap.provider = ProviderKind::Offline;
        snap.address.plus_code = Some("8FW4V75V+8Q".into());
        let attrs = snap.attributes();
        assert!(attrs.city.is_none());
        assert_eq!(attrs.plus_code.as_deref(), Some("8FW4V75V+8Q"));
        assert_eq!(attrs.timezone_source, "Local Fallback");
    }
}
