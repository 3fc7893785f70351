use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use crate::types::{Job, JobId};

/// Insertion-ordered job store shared by callers and the engine thread.
///
/// One table-wide mutex; every method takes it for the duration of a single
/// map operation and readers get owned copies back.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Mutex<IndexMap<JobId, Job>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.lock().insert(job.id.clone(), job);
    }

    /// Remove `id`, keeping the order of the remaining jobs.
    /// Removing an absent id is not an error; it returns `None`.
    pub fn remove(&self, id: &JobId) -> Option<Job> {
        self.lock().shift_remove(id)
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.lock().contains_key(id)
    }

    /// Point-in-time copy in insertion order.
    pub fn snapshot(&self) -> Vec<Job> {
        self.lock().values().cloned().collect()
    }

    /// Empty the table and return how many jobs were dropped.
    pub fn clear(&self) -> usize {
        let mut jobs = self.lock();
        let n = jobs.len();
        jobs.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<JobId, Job>> {
        // A panic while holding the guard cannot leave the map half-updated.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
