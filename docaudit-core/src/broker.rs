//! The source-status broker: an in-flight status map plus the process-wide
//! store-write mutex that serialises every ingest and deindex call.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::error::StoreError;
use crate::store::VectorStore;

/// The five statuses a source can be reported as. `Indexed`/`NotFound` are
/// never stored in the map; they're derived on lookup when no in-flight
/// entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Waiting,
    Indexing,
    Aborted,
    Indexed,
    NotFound,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Waiting => "waiting",
            SourceStatus::Indexing => "indexing",
            SourceStatus::Aborted => "aborted",
            SourceStatus::Indexed => "indexed",
            SourceStatus::NotFound => "not_found",
        }
    }
}

/// In-flight-only state, the broker's actual tagged union. `Aborted` and
/// `Indexing` are terminal-ish: only `set_completed` ever removes an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Waiting,
    Indexing,
    Aborted,
}

impl From<InFlight> for SourceStatus {
    fn from(state: InFlight) -> Self {
        match state {
            InFlight::Waiting => SourceStatus::Waiting,
            InFlight::Indexing => SourceStatus::Indexing,
            InFlight::Aborted => SourceStatus::Aborted,
        }
    }
}

/// Process-wide singleton tracking in-flight source activity and owning the
/// store-write mutex. Cheap to construct; intended to be shared behind an
/// `Arc` from application state rather than recreated per request.
pub struct Broker {
    in_flight: Mutex<HashMap<String, InFlight>>,
    store_write: AsyncMutex<()>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            store_write: AsyncMutex::new(()),
        }
    }

    /// Acquires the store-write mutex. Held across the entire body of an
    /// ingest or deindex call by the caller.
    pub async fn acquire_store_write(&self) -> MutexGuard<'_, ()> {
        self.store_write.lock().await
    }

    /// Marks `id` as `waiting`. Always succeeds; overwrites any prior entry.
    pub fn set_waiting(&self, id: &str) {
        let mut map = self.in_flight.lock().expect("status map lock poisoned");
        map.insert(id.to_string(), InFlight::Waiting);
    }

    /// Transitions `id` to `indexing`. No-op unless the current state is
    /// `waiting` (prevents a late transition after an abort).
    pub fn set_indexing(&self, id: &str) {
        let mut map = self.in_flight.lock().expect("status map lock poisoned");
        if map.get(id) == Some(&InFlight::Waiting) {
            map.insert(id.to_string(), InFlight::Indexing);
        }
    }

    /// Transitions `id` to `aborted`. No-op unless the current state is
    /// `waiting`; once indexing has begun the cost is already committed.
    pub fn set_aborted(&self, id: &str) {
        let mut map = self.in_flight.lock().expect("status map lock poisoned");
        if map.get(id) == Some(&InFlight::Waiting) {
            map.insert(id.to_string(), InFlight::Aborted);
        }
    }

    /// Removes `id` from the in-flight map unconditionally.
    pub fn set_completed(&self, id: &str) {
        let mut map = self.in_flight.lock().expect("status map lock poisoned");
        map.remove(id);
    }

    /// Returns the in-flight state for `id`, if any, without touching the
    /// store.
    fn in_flight_status(&self, id: &str) -> Option<SourceStatus> {
        let map = self.in_flight.lock().expect("status map lock poisoned");
        map.get(id).copied().map(SourceStatus::from)
    }

    /// Resolves `id`'s status: in-flight state if present, otherwise
    /// consults the store for `indexed`/`not_found`.
    pub async fn status(
        &self,
        store: &dyn VectorStore,
        id: &str,
    ) -> Result<SourceStatus, StoreError> {
        if let Some(status) = self.in_flight_status(id) {
            return Ok(status);
        }
        Ok(if store.has_location(id).await? {
            SourceStatus::Indexed
        } else {
            SourceStatus::NotFound
        })
    }

    /// Batched variant of [`Broker::status`]: answers the derived portion
    /// (`indexed`/`not_found`) in a single store round-trip.
    pub async fn statuses(
        &self,
        store: &dyn VectorStore,
        ids: &[String],
    ) -> Result<Vec<(String, SourceStatus)>, StoreError> {
        let mut need_store_lookup = Vec::new();
        let mut results = vec![None; ids.len()];

        for (i, id) in ids.iter().enumerate() {
            if let Some(status) = self.in_flight_status(id) {
                results[i] = Some(status);
            } else {
                need_store_lookup.push(id.clone());
            }
        }

        if !need_store_lookup.is_empty() {
            let found = store.filter_by_location_ids(&need_store_lookup).await?;
            let indexed: std::collections::HashSet<&str> = found
                .iter()
                .flat_map(|p| p.locations.iter().map(|l| l.id.as_str()))
                .collect();

            for (i, id) in ids.iter().enumerate() {
                if results[i].is_none() {
                    results[i] = Some(if indexed.contains(id.as_str()) {
                        SourceStatus::Indexed
                    } else {
                        SourceStatus::NotFound
                    });
                }
            }
        }

        Ok(ids
            .iter()
            .cloned()
            .zip(results.into_iter().map(|s| s.expect("every id resolved")))
            .collect())
    }

    /// Checks whether `id` should be skipped by an in-flight ingest worker
    /// immediately after it acquires the store-write mutex: `true` if the
    /// job was aborted while waiting.
    pub fn is_aborted(&self, id: &str) -> bool {
        self.in_flight_status(id) == Some(SourceStatus::Aborted)
    }

    /// Implements the "status-for-delete" policy: any `waiting` id is moved
    /// to `aborted` and excluded from the actual delete; any `indexed` id is
    /// scheduled for deindex; everything else is ignored. Returns the ids to
    /// actually deindex against the store.
    pub async fn prepare_delete(
        &self,
        store: &dyn VectorStore,
        ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let statuses = self.statuses(store, ids).await?;
        let mut to_deindex = Vec::new();
        for (id, status) in statuses {
            match status {
                SourceStatus::Waiting => self.set_aborted(&id),
                SourceStatus::Indexed => to_deindex.push(id),
                SourceStatus::Indexing | SourceStatus::Aborted | SourceStatus::NotFound => {}
            }
        }
        Ok(to_deindex)
    }
}
