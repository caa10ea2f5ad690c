//! Process-wide store of download jobs
//!
//! The registry owns every [`Job`]. Callers only ever receive clones, and all
//! mutation goes through the operations below. Each operation takes the lock
//! for exactly one map read or mutation and never awaits or performs I/O while
//! holding it.

use crate::core::job::{Job, JobTicket};
use crate::error::ApiError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Concurrent map from video identifier to the job tracking it
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Job>>,
    generations: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        // Mutations are single assignments, so a poisoned map is still consistent
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fresh job for `video_id`, replacing any previous one
    pub fn create(&self, video_id: &str) -> JobTicket {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let job = Job::new(video_id, generation);
        let ticket = job.ticket();
        self.put(job);
        ticket
    }

    /// Insert or replace the entry for the job's video id
    pub fn put(&self, job: Job) {
        let video_id = job.video_id.clone();
        let generation = job.generation;
        let replaced = self.write().insert(video_id.clone(), job);

        match replaced {
            Some(old) => debug!(
                "[{}] job generation {} replaced generation {}",
                video_id, generation, old.generation
            ),
            None => debug!("[{}] job generation {} registered", video_id, generation),
        }
    }

    /// Snapshot of the current job for `video_id`
    pub fn get(&self, video_id: &str) -> Result<Job, ApiError> {
        self.read()
            .get(video_id)
            .cloned()
            .ok_or_else(|| ApiError::NoSuchJob(video_id.to_string()))
    }

    /// Raise the job's progress to `percent`, returning the stored value.
    ///
    /// Values above 100 are clamped and values below the current progress are
    /// ignored. A completed job is left untouched. Fails with
    /// [`ApiError::NoSuchJob`] when nothing is registered and with
    /// [`ApiError::JobSuperseded`] when the ticket's job has been replaced; in
    /// neither case is an entry created.
    pub fn update_progress(&self, ticket: &JobTicket, percent: u8) -> Result<u8, ApiError> {
        let percent = percent.min(100);
        let mut jobs = self.write();
        let job = owned_job(&mut jobs, ticket)?;

        if !job.completed && percent > job.progress {
            job.progress = percent;
        }

        Ok(job.progress)
    }

    /// Move the job to its terminal state.
    ///
    /// Without an error the progress is pinned to 100. Calling this on an
    /// already completed job has no effect, so the first outcome wins.
    pub fn mark_completed(&self, ticket: &JobTicket, error: Option<String>) -> Result<(), ApiError> {
        let mut jobs = self.write();
        let job = owned_job(&mut jobs, ticket)?;

        if job.completed {
            return Ok(());
        }

        match error {
            Some(message) if message.trim().is_empty() => {
                job.error = Some("unknown error".to_string());
            }
            Some(message) => job.error = Some(message),
            None => job.progress = 100,
        }
        job.completed = true;
        job.finished_at = Some(Utc::now());
        job.completed_at = Some(Instant::now());

        Ok(())
    }

    /// Drop completed jobs that finished more than `ttl` ago
    pub fn evict_completed(&self, ttl: Duration) -> usize {
        let mut jobs = self.write();
        let before = jobs.len();

        jobs.retain(|_, job| match job.completed_at {
            Some(completed_at) => completed_at.elapsed() <= ttl,
            None => true,
        });

        before - jobs.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn owned_job<'a>(
    jobs: &'a mut HashMap<String, Job>,
    ticket: &JobTicket,
) -> Result<&'a mut Job, ApiError> {
    match jobs.get_mut(&ticket.video_id) {
        Some(job) if job.generation == ticket.generation => Ok(job),
        Some(_) => Err(ApiError::JobSuperseded(ticket.video_id.clone())),
        None => Err(ApiError::NoSuchJob(ticket.video_id.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::JobState;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_create_registers_initial_state() {
        let registry = JobRegistry::new();
        let ticket = registry.create("abc123");

        let job = registry.get("abc123").unwrap();
        assert_eq!(job.generation, ticket.generation);
        assert_eq!(job.progress, 0);
        assert!(!job.completed);
        assert!(job.error.is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let registry = JobRegistry::new();
        assert!(matches!(
            registry.get("missing"),
            Err(ApiError::NoSuchJob(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let registry = JobRegistry::new();
        registry.create("abc123");

        let mut replacement = Job::new("abc123", 99);
        replacement.progress = 60;
        registry.put(replacement);

        let job = registry.get("abc123").unwrap();
        assert_eq!(job.generation, 99);
        assert_eq!(job.progress, 60);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_progress_is_monotonic_and_clamped() {
        let registry = JobRegistry::new();
        let ticket = registry.create("abc123");

        assert_eq!(registry.update_progress(&ticket, 40).unwrap(), 40);
        assert_eq!(registry.update_progress(&ticket, 20).unwrap(), 40);
        assert_eq!(registry.update_progress(&ticket, 250).unwrap(), 100);
        assert_eq!(registry.get("abc123").unwrap().progress, 100);
    }

    #[test]
    fn test_update_progress_without_entry_creates_nothing() {
        let registry = JobRegistry::new();
        let ticket = JobTicket {
            video_id: "ghost".to_string(),
            generation: 1,
        };

        assert_err!(registry.update_progress(&ticket, 50));
        assert!(matches!(
            registry.mark_completed(&ticket, None),
            Err(ApiError::NoSuchJob(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mark_completed_is_idempotent() {
        let registry = JobRegistry::new();
        let ticket = registry.create("abc123");
        registry.update_progress(&ticket, 80).unwrap();

        assert_ok!(registry.mark_completed(&ticket, None));
        let first = assert_ok!(registry.get("abc123"));

        assert_ok!(registry.mark_completed(&ticket, Some("late failure".to_string())));
        let second = assert_ok!(registry.get("abc123"));

        assert_eq!(first.state(), JobState::Done);
        assert_eq!(second.state(), JobState::Done);
        assert_eq!(second.progress, 100);
        assert!(second.error.is_none());
        assert_eq!(first.finished_at, second.finished_at);
    }

    #[test]
    fn test_completed_job_ignores_progress() {
        let registry = JobRegistry::new();
        let ticket = registry.create("abc123");
        registry.update_progress(&ticket, 20).unwrap();
        registry.mark_completed(&ticket, Some("disk full".to_string())).unwrap();

        assert_eq!(registry.update_progress(&ticket, 90).unwrap(), 20);

        let job = registry.get("abc123").unwrap();
        assert_eq!(job.state(), JobState::Failed);
        assert_eq!(job.error.as_deref(), Some("disk full"));
        assert_eq!(job.progress, 20);
    }

    #[test]
    fn test_blank_error_is_replaced() {
        let registry = JobRegistry::new();
        let ticket = registry.create("abc123");
        registry.mark_completed(&ticket, Some("  ".to_string())).unwrap();

        let job = registry.get("abc123").unwrap();
        assert_eq!(job.error.as_deref(), Some("unknown error"));
    }

    #[test]
    fn test_superseded_ticket_cannot_write() {
        let registry = JobRegistry::new();
        let old = registry.create("abc123");
        registry.update_progress(&old, 60).unwrap();

        let new = registry.create("abc123");
        assert_ne!(old.generation, new.generation);

        assert!(matches!(
            registry.update_progress(&old, 80),
            Err(ApiError::JobSuperseded(_))
        ));
        assert!(matches!(
            registry.mark_completed(&old, None),
            Err(ApiError::JobSuperseded(_))
        ));

        let job = registry.get("abc123").unwrap();
        assert_eq!(job.generation, new.generation);
        assert_eq!(job.state(), JobState::Created);
    }

    #[test]
    fn test_evict_completed_keeps_active_jobs() {
        let registry = JobRegistry::new();
        let done = registry.create("done");
        registry.create("active");
        registry.mark_completed(&done, None).unwrap();

        assert_eq!(registry.evict_completed(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 2);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(registry.evict_completed(Duration::from_millis(5)), 1);
        assert!(registry.get("done").is_err());
        assert!(registry.get("active").is_ok());
    }

    #[test]
    fn test_concurrent_readers_never_see_progress_decrease() {
        let registry = Arc::new(JobRegistry::new());
        let ticket = registry.create("abc123");
        let finished = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let finished = Arc::clone(&finished);
                thread::spawn(move || {
                    let mut last = 0;
                    while !finished.load(Ordering::SeqCst) {
                        let job = registry.get("abc123").unwrap();
                        assert!(job.progress >= last);
                        last = job.progress;
                    }
                })
            })
            .collect();

        for percent in 0..=100 {
            registry.update_progress(&ticket, percent).unwrap();
        }
        registry.mark_completed(&ticket, None).unwrap();
        finished.store(true, Ordering::SeqCst);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.get("abc123").unwrap().state(), JobState::Done);
    }
}
