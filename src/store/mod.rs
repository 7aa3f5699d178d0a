//! Multi-trail graph store.
//!
//! Each trail lives behind its own `RwLock`, so concurrent tracker calls
//! against the same trail serialize their writes (preserving idempotent
//! registration) while independent trails proceed in parallel. Readers
//! of an in-progress trail simply see a partial graph; trails are
//! conceptually sealed before being queried.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use crate::error::{TrailError, TrailResult};
use crate::model::{Trail, TrailId};
use crate::tracker::{Tracker, UsageRecorder};

/// Shared handle to one trail's graph.
pub(crate) type SharedTrail = Arc<RwLock<Trail>>;

/// In-memory store of all live trails.
#[derive(Debug, Default)]
pub struct TrailStore {
    trails: DashMap<TrailId, SharedTrail>,
}

impl TrailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh trail for one execution run.
    pub fn create_trail(
        &self,
        name: impl Into<String>,
        context: Option<serde_json::Value>,
    ) -> TrailId {
        let trail = Trail::new(name, context);
        let id = trail.id.clone();
        self.trails.insert(id.clone(), Arc::new(RwLock::new(trail)));
        id
    }

    /// Insert an existing trail, e.g. one loaded from the archive.
    /// Replaces any trail with the same id.
    pub fn insert_trail(&self, trail: Trail) -> TrailId {
        let id = trail.id.clone();
        self.trails.insert(id.clone(), Arc::new(RwLock::new(trail)));
        id
    }

    /// Delete a trail and its entire graph. Returns true if it existed.
    pub fn delete_trail(&self, id: &TrailId) -> bool {
        self.trails.remove(id).is_some()
    }

    pub fn contains(&self, id: &TrailId) -> bool {
        self.trails.contains_key(id)
    }

    /// Identifiers of all live trails, in no particular order.
    pub fn trail_ids(&self) -> Vec<TrailId> {
        self.trails.iter().map(|e| e.key().clone()).collect()
    }

    /// Tracker handle bound to one trail.
    pub fn tracker(&self, id: &TrailId) -> TrailResult<Tracker> {
        Ok(Tracker::new(self.shared(id)?))
    }

    /// Usage-recorder handle bound to one trail.
    pub fn usage(&self, id: &TrailId) -> TrailResult<UsageRecorder> {
        Ok(UsageRecorder::new(self.shared(id)?))
    }

    /// Run a read-only closure against a trail.
    pub fn with_trail<R>(&self, id: &TrailId, f: impl FnOnce(&Trail) -> R) -> TrailResult<R> {
        let shared = self.shared(id)?;
        let guard = shared.read().unwrap_or_else(|e| e.into_inner());
        Ok(f(&guard))
    }

    /// Run a mutating closure against a trail, holding its write lock.
    pub fn with_trail_mut<R>(
        &self,
        id: &TrailId,
        f: impl FnOnce(&mut Trail) -> R,
    ) -> TrailResult<R> {
        let shared = self.shared(id)?;
        let mut guard = shared.write().unwrap_or_else(|e| e.into_inner());
        Ok(f(&mut guard))
    }

    /// Clone a trail's graph out of the store, e.g. for archiving.
    pub fn export_trail(&self, id: &TrailId) -> TrailResult<Trail> {
        self.with_trail(id, |trail| trail.clone())
    }

    pub(crate) fn shared(&self, id: &TrailId) -> TrailResult<SharedTrail> {
        self.trails
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| TrailError::UnknownTrail(id.clone()))
    }
}
