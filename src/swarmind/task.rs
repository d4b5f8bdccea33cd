//! Task records and the board that tracks them.
//!
//! A task moves `pending → processing → completed | failed` and never
//! regresses. Completion is decided by the convergence check at the end of
//! each gossip round; failure is only reachable when a per-task round
//! deadline is configured.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::swarmind::message::Message;

/// Failure reason recorded when a task exceeds its round deadline.
pub const CONVERGENCE_TIMEOUT: &str = "convergence_timeout";

/// Lifecycle status of a task. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Completed | TaskStatus::Failed => 2,
        }
    }
}

/// A submitted reasoning task and everything the swarm has accumulated
/// for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id, returned by `submit_task`.
    pub id: Uuid,
    /// The natural-language query being reasoned about.
    pub query: String,
    /// Raw context supplied at submission, if any.
    pub context: Option<String>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Ids of the agents seeded with the initial discovery.
    pub assigned: Vec<String>,
    /// Qualifying discoveries captured at convergence.
    pub results: Vec<Message>,
    /// The synthesized report, present once completed.
    pub synthesis: Option<String>,
    /// Terminal failure reason, present once failed.
    pub failure_reason: Option<String>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of reaching a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Rounds spent in `Processing`, for deadline bookkeeping.
    pub(crate) rounds_in_processing: u64,
}

impl Task {
    pub(crate) fn new(id: Uuid, query: String, context: Option<String>) -> Self {
        Self {
            id,
            query,
            context,
            status: TaskStatus::Pending,
            assigned: Vec::new(),
            results: Vec::new(),
            synthesis: None,
            failure_reason: None,
            created_at: Utc::now(),
            completed_at: None,
            rounds_in_processing: 0,
        }
    }

    /// Move to `next` if that is a forward transition; regressions and
    /// transitions out of a terminal status are ignored.
    pub(crate) fn advance(&mut self, next: TaskStatus) {
        if next.rank() > self.status.rank() {
            self.status = next;
        }
    }
}

/// All tasks known to a swarm, in submission order.
#[derive(Debug, Default)]
pub(crate) struct TaskBoard {
    tasks: HashMap<Uuid, Task>,
    order: Vec<Uuid>,
}

impl TaskBoard {
    pub(crate) fn insert(&mut self, task: Task) {
        self.order.push(task.id);
        self.tasks.insert(task.id, task);
    }

    pub(crate) fn get(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &Uuid) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub(crate) fn ids(&self) -> Vec<Uuid> {
        self.order.clone()
    }

    pub(crate) fn count_by_status(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status == status).count()
    }

    pub(crate) fn clear(&mut self) {
        self.tasks.clear();
        self.order.clear();
    }
}
