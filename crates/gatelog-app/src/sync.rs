//! Sync controller: the registry and the checkpoint log for one session
//!
//! Owns one optimistic store per collection. Reads (classification) go
//! against the in-memory registry; writes are applied locally first and
//! confirmed or rolled back by the remote store.

use log::{info, warn};
use tokio::sync::watch;

use gatelog_domain::repository::RemoteCollection;
use gatelog_domain::service::{classify, normalize, Classification, NormalizedPlate};
use gatelog_store::{OptimisticStore, PendingOp};
use gatelog_types::{Direction, Error, LogEntry, RegisteredVehicle, Result};

/// Outcome of [`SyncController::load_all`]. Each collection is reported on
/// its own; a failed fetch leaves that collection as it was.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub registry: Option<Error>,
    pub log: Option<Error>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.registry.is_none() && self.log.is_none()
    }

    /// Fail with the registry error, if any.
    ///
    /// Classifying against a registry that did not load turns every plate
    /// into a visitor, and log entries freeze that result.
    pub fn require_registry(self) -> Result<Self> {
        match self.registry {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// A log entry accepted for submission
pub struct SubmittedEntry {
    /// Classification frozen into the entry
    pub classification: Classification,
    /// Remote round trip; the entry is already in the local log
    pub confirmation: PendingOp<LogEntry>,
}

pub struct SyncController<R, L>
where
    R: RemoteCollection<RegisteredVehicle> + 'static,
    L: RemoteCollection<LogEntry> + 'static,
{
    registry: OptimisticStore<RegisteredVehicle, R>,
    log: OptimisticStore<LogEntry, L>,
}

impl<R, L> SyncController<R, L>
where
    R: RemoteCollection<RegisteredVehicle> + 'static,
    L: RemoteCollection<LogEntry> + 'static,
{
    /// Controller with both collections empty; call [`load_all`](Self::load_all)
    /// to populate them
    pub fn new(registry_remote: R, log_remote: L) -> Self {
        Self {
            registry: OptimisticStore::new("registry", registry_remote),
            log: OptimisticStore::new("log", log_remote),
        }
    }

    /// Fetch both collections from the remote store and replace the local ones.
    /// Safe to call again as a retry after a partial failure.
    pub async fn load_all(&self) -> LoadReport {
        let (registry, log) = tokio::join!(self.registry.refresh(), self.log.refresh());
        let report = LoadReport {
            registry: registry.err(),
            log: log.err(),
        };
        if report.is_complete() {
            info!(
                "event=load_all status=ok vehicles={} entries={}",
                self.registry.with_items(|items| items.len()),
                self.log.with_items(|items| items.len())
            );
        } else {
            warn!(
                "event=load_all status=partial registry_ok={} log_ok={}",
                report.registry.is_none(),
                report.log.is_none()
            );
        }
        report
    }

    pub fn normalize(&self, raw: &str) -> NormalizedPlate {
        normalize(raw)
    }

    /// Classify `raw_plate` against the current registry
    pub fn classify(&self, raw_plate: &str) -> Classification {
        self.registry.with_items(|registry| classify(raw_plate, registry))
    }

    /// Log a vehicle passing the checkpoint.
    ///
    /// Rejects a blank plate without touching state. Otherwise the
    /// classification is computed now, frozen into the entry, and the entry
    /// is added to the log optimistically.
    pub fn submit_log_entry(
        &self,
        raw_plate: &str,
        direction: Direction,
        image: Option<String>,
        note: Option<String>,
    ) -> Result<SubmittedEntry> {
        let plate = raw_plate.trim();
        if plate.is_empty() {
            return Err(Error::Validation("plate number is required".to_string()));
        }

        let classification = self.classify(plate);
        let mut entry = LogEntry::new(plate.to_string(), direction, classification.vehicle_type());
        entry.image_url = image;
        entry.note = note.filter(|n| !n.trim().is_empty());

        info!(
            "event=submit_log_entry direction={} vehicle_type={}",
            direction,
            entry.vehicle_type
        );

        Ok(SubmittedEntry {
            classification,
            confirmation: self.log.add(entry),
        })
    }

    /// Add a vehicle to the registry. Plate and owner are required; a blank
    /// department is stored as none.
    pub fn register_vehicle(
        &self,
        plate: &str,
        owner: &str,
        department: &str,
    ) -> Result<PendingOp<RegisteredVehicle>> {
        if plate.trim().is_empty() {
            return Err(Error::Validation("plate number is required".to_string()));
        }
        if owner.trim().is_empty() {
            return Err(Error::Validation("owner name is required".to_string()));
        }

        let mut vehicle = RegisteredVehicle::new(plate.to_string(), owner.to_string());
        if !department.trim().is_empty() {
            vehicle = vehicle.with_department(department.to_string());
        }

        info!("event=register_vehicle");
        Ok(self.registry.add(vehicle))
    }

    pub fn unregister_vehicle(&self, id: &str) -> Result<PendingOp<()>> {
        info!("event=unregister_vehicle id={}", id);
        self.registry.remove(id)
    }

    /// Remote collaborators for the registry and the log
    pub fn remotes(&self) -> (&R, &L) {
        (self.registry.remote(), self.log.remote())
    }

    /// Current registry, in matching order
    pub fn registry(&self) -> Vec<RegisteredVehicle> {
        self.registry.snapshot()
    }

    /// Current log, newest first
    pub fn log(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    pub fn subscribe_registry(&self) -> watch::Receiver<Vec<RegisteredVehicle>> {
        self.registry.subscribe()
    }

    pub fn subscribe_log(&self) -> watch::Receiver<Vec<LogEntry>> {
        self.log.subscribe()
    }
}
