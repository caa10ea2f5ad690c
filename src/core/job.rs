//! Download job records

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

/// Observable lifecycle state of a job, derived from its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Registered, no progress reported yet
    Created,
    /// Transfer under way
    Running,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
}

impl JobState {
    /// Whether no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

/// One tracked download attempt
#[derive(Debug, Clone)]
pub struct Job {
    /// Identifier the download was requested for
    pub video_id: String,
    /// Registry-issued generation, unique per created job
    pub generation: u64,
    /// Percentage in 0..=100
    pub progress: u8,
    /// Set once, never cleared
    pub completed: bool,
    /// Failure description, only on the error path
    pub error: Option<String>,
    /// Wall-clock creation time
    pub started_at: DateTime<Utc>,
    /// Wall-clock completion time
    pub finished_at: Option<DateTime<Utc>>,
    /// Monotonic completion time, used for retention
    pub completed_at: Option<Instant>,
}

impl Job {
    /// Create a job in the `Created` state
    pub fn new(video_id: impl Into<String>, generation: u64) -> Self {
        Self {
            video_id: video_id.into(),
            generation,
            progress: 0,
            completed: false,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
            completed_at: None,
        }
    }

    pub fn state(&self) -> JobState {
        match (self.completed, self.error.is_some(), self.progress) {
            (true, true, _) => JobState::Failed,
            (true, false, _) => JobState::Done,
            (false, _, 0) => JobState::Created,
            (false, _, _) => JobState::Running,
        }
    }

    /// Address used by the runner that owns this job
    pub fn ticket(&self) -> JobTicket {
        JobTicket {
            video_id: self.video_id.clone(),
            generation: self.generation,
        }
    }
}

/// Handle a runner uses to address the one job it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub video_id: String,
    pub generation: u64,
}
