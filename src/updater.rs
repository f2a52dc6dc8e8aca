//! Update orchestration: one resolution cycle per instance, plus the
//! registry of active instances and their scheduled refresh tasks.
//!
//! A cycle runs provider lookup, local fallback, display-name enrichment,
//! plus code and the public-land overlay, then publishes the snapshot and
//! asks the host to adopt the time zone. No step's failure escapes; each one
//! degrades to an absent value.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::InstanceConfig;
use crate::error::ConfigError;
use crate::host::HostTimezone;
use crate::location::{
    plus_code, timezone_name, AddressFields, AddressSnapshot, Coordinate, FallbackResolver, Provider, ProviderKind,
    ProviderLookup, PublicLandsClient, TimezoneResolution, TimezoneSource,
};
use crate::store::{Snapshot, SnapshotObserver, SnapshotStore};

// ─── Instance ───────────────────────────────────────────────────

/// Everything one configured location needs for a cycle. Built at
/// activation and dropped at deactivation.
#[derive(Debug)]
pub struct Instance {
    id: String,
    kind: ProviderKind,
    provider: Option<Provider>,
    coordinate: Coordinate,
    language: String,
    public_lands: Option<PublicLandsClient>,
    /// Store generation handed out at registration; 0 until then.
    generation: u64,
    /// Held for the whole cycle; a second trigger waits its turn.
    cycle: tokio::sync::Mutex<()>,
}

impl Instance {
    /// `provider` is `None` for offline mode.
    pub fn new(id: impl Into<String>, coordinate: Coordinate, provider: Option<Provider>) -> Self {
        let kind = provider.as_ref().map_or(ProviderKind::Offline, Provider::kind);
        Self {
            id: id.into(),
            kind,
            provider,
            coordinate,
            language: "en".to_string(),
            public_lands: None,
            generation: 0,
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_public_lands(mut self, client: PublicLandsClient) -> Self {
        self.public_lands = Some(client);
        self
    }

    /// Validate a config and select its provider.
    pub fn from_config(config: &InstanceConfig) -> Result<Self, ConfigError> {
        let provider_config = config.provider_config()?;
        let coordinate = config.coordinate()?;
        let provider = Provider::from_config(&provider_config, config.user_agent.as_deref());

        let mut instance = Self::new(config.id.clone(), coordinate, provider).with_language(config.language.clone());
        if config.enable_public_lands {
            instance = instance.with_public_lands(PublicLandsClient::new());
        }
        Ok(instance)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn public_lands_enabled(&self) -> bool {
        self.public_lands.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ─── Cycle ──────────────────────────────────────────────────────

/// Runs update cycles against shared collaborators. Cheap to clone.
#[derive(Clone)]
pub struct Updater {
    store: Arc<SnapshotStore>,
    host: Arc<dyn HostTimezone>,
    fallback: Arc<FallbackResolver>,
}

impl Updater {
    pub fn new(store: Arc<SnapshotStore>, host: Arc<dyn HostTimezone>, fallback: Arc<FallbackResolver>) -> Self {
        Self { store, host, fallback }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn host(&self) -> &Arc<dyn HostTimezone> {
        &self.host
    }

    /// Run one full cycle for `instance` and return what was published.
    /// Never fails; cycles for the same instance are serialized.
    pub async fn update(&self, instance: &Instance) -> Arc<Snapshot> {
        let _cycle = instance.cycle.lock().await;
        let started = Instant::now();
        let coord = instance.coordinate;

        let (mut address, provider_tz) = match &instance.provider {
            None => (AddressSnapshot::default(), None),
            Some(provider) => match self.provider_lookup(instance, provider).await {
                Some(lookup) => (lookup.payload.to_snapshot(), lookup.timezone),
                // Keep the last good address; the source label shows the gap.
                None => {
                    let previous = self.store.get(&instance.id).map(|s| s.address.clone());
                    (previous.unwrap_or_default(), None)
                }
            },
        };

        let mut timezone = match provider_tz {
            Some(id) => TimezoneResolution {
                timezone_id: Some(id),
                source: TimezoneSource::Provider(instance.kind),
                ..TimezoneResolution::unresolved()
            },
            None => self.fallback_lookup(instance).await,
        };

        if let Some(tz_id) = timezone.timezone_id.clone() {
            let language = instance.language.clone();
            let display = off_thread("display name", move || timezone_name::describe(&tz_id, Utc::now(), &language)).await;
            if let Some(display) = display {
                timezone.abbreviation = Some(display.abbreviation);
                timezone.full_display_name = Some(display.full_name);
                timezone.is_dst = Some(display.is_dst);
            }
        }

        if address.plus_code.is_none() {
            address.plus_code = Some(plus_code::encode(coord));
        }

        let public_land = match &instance.public_lands {
            Some(client) => {
                let client = client.clone();
                off_thread("public lands", move || client.fetch(coord)).await
            }
            None => None,
        };

        let snapshot = Snapshot {
            provider: instance.kind,
            address,
            timezone,
            public_land,
            updated_at: Utc::now(),
        };
        let Some(published) = self.store.put(&instance.id, instance.generation, snapshot.clone()) else {
            debug!(instance = %instance.id, "instance replaced during update, snapshot dropped");
            return Arc::new(snapshot);
        };

        if let Some(tz_id) = published.timezone.timezone_id.as_deref() {
            if let Err(e) = self.host.set_timezone(tz_id) {
                warn!(instance = %instance.id, "host rejected time zone: {}", e);
            }
        }

        debug!(
            instance = %instance.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            source = %published.timezone.source,
            "update cycle finished"
        );
        published
    }

    async fn provider_lookup(&self, instance: &Instance, provider: &Provider) -> Option<ProviderLookup> {
        let provider = provider.clone();
        let coord = instance.coordinate;
        let language = instance.language.clone();
        let joined = tokio::task::spawn_blocking(move || provider.lookup(coord, &language)).await;
        match joined {
            Ok(Ok(lookup)) => Some(lookup),
            Ok(Err(e)) => {
                warn!(instance = %instance.id, provider = %instance.kind, "provider lookup failed: {}", e);
                None
            }
            Err(e) => {
                error!(instance = %instance.id, "provider task failed: {}", e);
                None
            }
        }
    }

    async fn fallback_lookup(&self, instance: &Instance) -> TimezoneResolution {
        let fallback = Arc::clone(&self.fallback);
        let coord = instance.coordinate;
        match off_thread("fallback lookup", move || fallback.lookup(coord)).await {
            Some(id) => TimezoneResolution {
                timezone_id: Some(id),
                source: TimezoneSource::LocalFallback,
                ..TimezoneResolution::unresolved()
            },
            None => {
                warn!(instance = %instance.id, %coord, "no time zone found for location");
                TimezoneResolution::unresolved()
            }
        }
    }
}

/// Run a blocking step on the blocking pool. A panicked step reads as no data.
async fn off_thread<T, F>(step: &'static str, f: F) -> Option<T>
where
    F: FnOnce() -> Option<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(value) => value,
        Err(e) => {
            error!(step, "blocking task failed: {}", e);
            None
        }
    }
}

// ─── Registry ───────────────────────────────────────────────────

struct Active {
    instance: Arc<Instance>,
    refresh: Option<JoinHandle<()>>,
}

/// Active instances keyed by id, with optional periodic refresh.
pub struct Geolocator {
    updater: Updater,
    active: RwLock<HashMap<String, Active>>,
    refresh_interval: Option<Duration>,
    /// Attached to every instance at activation.
    observers: Vec<Arc<dyn SnapshotObserver>>,
}

impl Geolocator {
    pub fn new(updater: Updater) -> Self {
        Self {
            updater,
            active: RwLock::new(HashMap::new()),
            refresh_interval: None,
            observers: Vec::new(),
        }
    }

    /// Refresh every instance on this period, starting right at activation.
    /// A zero period disables scheduled refresh.
    pub fn with_refresh_interval(mut self, period: Duration) -> Self {
        self.refresh_interval = (!period.is_zero()).then_some(period);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SnapshotObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        self.updater.store()
    }

    pub fn activate(&self, config: &InstanceConfig) -> Result<Arc<Instance>, ConfigError> {
        let instance = Instance::from_config(config)?;
        self.register(instance)
    }

    /// Add a built instance. Fails if the id is already active.
    pub fn register(&self, instance: Instance) -> Result<Arc<Instance>, ConfigError> {
        let mut active = self.active.write();
        if active.contains_key(&instance.id) {
            return Err(ConfigError::DuplicateInstance(instance.id));
        }

        let generation = self.create_entry(&instance.id);
        let instance = self.install(&mut active, instance, generation);
        info!(
            instance = %instance.id,
            provider = %instance.kind,
            coord = %instance.coordinate,
            "instance activated"
        );
        Ok(instance)
    }

    /// Fresh store entry with the default observers attached.
    fn create_entry(&self, id: &str) -> u64 {
        let store = &self.updater.store;
        let generation = store.create(id);
        for observer in &self.observers {
            store.register_observer(id, Arc::clone(observer));
        }
        generation
    }

    /// Stamp the generation and start refreshing. Observers must already be
    /// attached, since the first tick fires immediately.
    fn install(&self, active: &mut HashMap<String, Active>, mut instance: Instance, generation: u64) -> Arc<Instance> {
        instance.generation = generation;
        let instance = Arc::new(instance);
        let refresh = self.refresh_interval.and_then(|period| self.spawn_refresh(&instance, period));
        active.insert(
            instance.id.clone(),
            Active {
                instance: Arc::clone(&instance),
                refresh,
            },
        );
        instance
    }

    fn spawn_refresh(&self, instance: &Arc<Instance>, period: Duration) -> Option<JoinHandle<()>> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(instance = %instance.id, "no async runtime, scheduled refresh disabled");
            return None;
        };
        let updater = self.updater.clone();
        let instance = Arc::clone(instance);
        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                updater.update(&instance).await;
            }
        }))
    }

    /// Stop refreshing and drop the instance's store entry.
    pub fn deactivate(&self, id: &str) -> bool {
        let mut active = self.active.write();
        let Some(removed) = active.remove(id) else {
            return false;
        };
        if let Some(task) = removed.refresh {
            task.abort();
        }
        self.updater.store.remove(id);
        info!(instance = id, "instance deactivated");
        true
    }

    /// Replace an instance's configuration. The new config is validated
    /// before the old instance is torn down. Observers stay attached; a
    /// cycle still running for the old configuration publishes nothing.
    /// An id that is not active is activated.
    pub fn reconfigure(&self, config: &InstanceConfig) -> Result<Arc<Instance>, ConfigError> {
        let instance = Instance::from_config(config)?;
        let mut active = self.active.write();
        let Some(previous) = active.remove(&config.id) else {
            drop(active);
            return self.register(instance);
        };
        if let Some(task) = previous.refresh {
            task.abort();
        }

        let generation = match self.updater.store.renew(&config.id) {
            Some(generation) => generation,
            None => self.create_entry(&config.id),
        };
        let instance = self.install(&mut active, instance, generation);
        info!(instance = %instance.id, provider = %instance.kind, "instance reconfigured");
        Ok(instance)
    }

    pub fn instance(&self, id: &str) -> Option<Arc<Instance>> {
        self.active.read().get(id).map(|a| Arc::clone(&a.instance))
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// "Update now" for one instance.
    pub async fn update_now(&self, id: &str) -> Result<Arc<Snapshot>, ConfigError> {
        let instance = self
            .instance(id)
            .ok_or_else(|| ConfigError::UnknownInstance(id.to_string()))?;
        Ok(self.updater.update(&instance).await)
    }

    /// Run a cycle for every active instance, in parallel.
    pub async fn update_all(&self) {
        let instances: Vec<Arc<Instance>> = self.active.read().values().map(|a| Arc::clone(&a.instance)).collect();
        let mut tasks = JoinSet::new();
        for instance in instances {
            let updater = self.updater.clone();
            tasks.spawn(async move {
                updater.update(&instance).await;
            });
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!("update task failed: {}", e);
            }
        }
    }
}

impl Drop for Geolocator {
    fn drop(&mut self) {
        for active in self.active.get_mut().values_mut() {
            if let Some(task) = active.refresh.take() {
                task.abort();
            }
        }
    }
}
