//! Update coordinator holding the latest snapshot of sensor values.
//!
//! The coordinator is the only writer of the snapshot. A refresh builds a
//! complete new snapshot and publishes it with a single pointer swap, so
//! readers see either the old or the new snapshot, never a mix. Readers never
//! wait for a refresh in flight.

use crate::error::Result;
use crate::input::source::{DataSource, SensorValues};
use crate::sensors::{Reading, SensorValue};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Immutable set of sensor values from one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSnapshot {
    values: SensorValues,
    version: u64,
    fetched_at: Option<DateTime<Utc>>,
}

impl ValueSnapshot {
    pub fn new(values: SensorValues, version: u64) -> Self {
        Self {
            values,
            version,
            fetched_at: Some(Utc::now()),
        }
    }

    /// Whether the data source reported this sensor (with or without a value).
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Option<SensorValue>> {
        self.values.get(name).copied()
    }

    pub fn reading(&self, name: &str) -> Reading {
        match self.values.get(name) {
            Some(value) => Reading::from(*value),
            None => Reading::Unavailable,
        }
    }

    pub fn values(&self) -> &SensorValues {
        &self.values
    }

    /// Number of successful refreshes that led to this snapshot; 0 before the first.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct UpdateCoordinator {
    source: Arc<dyn DataSource>,
    snapshot: watch::Sender<Arc<ValueSnapshot>>,
    /// Serializes refreshes; readers never take it.
    refresh_lock: Mutex<()>,
    last_update_success: AtomicBool,
    consecutive_failures: AtomicU32,
}

impl UpdateCoordinator {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(ValueSnapshot::default()));
        Self {
            source,
            snapshot,
            refresh_lock: Mutex::new(()),
            last_update_success: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// The data source writes are forwarded to.
    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// Latest committed snapshot. Never blocks on a refresh in flight.
    pub fn current(&self) -> Arc<ValueSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver woken each time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ValueSnapshot>> {
        self.snapshot.subscribe()
    }

    /// False before the first successful refresh and after any failed one.
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Fetch all values and publish them as the new snapshot.
    ///
    /// On failure the previous snapshot stays published and the error is
    /// returned to the caller driving the refresh.
    pub async fn refresh(&self) -> Result<Arc<ValueSnapshot>> {
        let _guard = self.refresh_lock.lock().await;
        let previous = self.current();

        match self.source.fetch_all().await {
            Ok(values) => {
                let snapshot = Arc::new(ValueSnapshot::new(values, previous.version() + 1));

                let dropped: Vec<&String> = previous
                    .values()
                    .keys()
                    .filter(|name| !snapshot.contains(name))
                    .collect();
                if !dropped.is_empty() {
                    info!(
                        "[Coordinator] {} sensor(s) no longer reported: {:?}",
                        dropped.len(),
                        dropped
                    );
                }

                self.snapshot.send_replace(snapshot.clone());

                let failures = self.consecutive_failures.swap(0, Ordering::SeqCst);
                if failures > 0 {
                    info!(
                        "[Coordinator] Data source recovered after {} failed refresh(es)",
                        failures
                    );
                }
                self.last_update_success.store(true, Ordering::SeqCst);
                debug!(
                    "[Coordinator] Published snapshot v{} with {} sensors",
                    snapshot.version(),
                    snapshot.len()
                );
                Ok(snapshot)
            }
            Err(e) => {
                self.last_update_success.store(false, Ordering::SeqCst);
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(
                    "[Coordinator] Refresh failed ({} in a row), keeping snapshot v{}: {}",
                    failures,
                    previous.version(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Spawn the periodic refresh loop.
    ///
    /// The first refresh runs immediately. Returns a `JoinHandle` that can be
    /// used to abort the loop on shutdown.
    pub fn start(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("[Coordinator] Polling every {:?}", period);
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                // Failures are logged by refresh and reflected in availability
                let _ = self.refresh().await;
            }
        })
    }
}
