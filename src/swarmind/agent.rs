//! Agent records and role definitions.
//!
//! A swarm is a population of lightweight, role-specialized micro-agents.
//! Unlike a conventional actor system, agents here carry no behavior of
//! their own: they are passive records (mailboxes, retained discoveries,
//! counters) that the gossip scheduler mutates in strictly ordered phases.
//! The [`AgentPool`](crate::swarmind::pool::AgentPool) owns every record;
//! nothing else holds a reference between rounds.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::swarmind::message::Message;

/// The eight fixed agent specialties.
///
/// Roles determine two things: which aggregation template an agent applies
/// when it composes a composite message from its discoveries, and whether
/// the agent is a candidate for keyword-based task seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Analyst,
    Researcher,
    Coder,
    Reviewer,
    Synthesizer,
    Validator,
    Creative,
    Optimizer,
}

impl AgentRole {
    /// The fixed role cycle used when initializing a swarm: agent `i` gets
    /// role `CYCLE[i % 8]`.
    pub const CYCLE: [AgentRole; 8] = [
        AgentRole::Analyst,
        AgentRole::Researcher,
        AgentRole::Coder,
        AgentRole::Reviewer,
        AgentRole::Synthesizer,
        AgentRole::Validator,
        AgentRole::Creative,
        AgentRole::Optimizer,
    ];

    /// Lowercase name of the role, used in agent ids and message tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Analyst => "analyst",
            AgentRole::Researcher => "researcher",
            AgentRole::Coder => "coder",
            AgentRole::Reviewer => "reviewer",
            AgentRole::Synthesizer => "synthesizer",
            AgentRole::Validator => "validator",
            AgentRole::Creative => "creative",
            AgentRole::Optimizer => "optimizer",
        }
    }

    /// Parse a message tag back into a role, if it names one.
    ///
    /// Used by synthesis to attribute a discovery to its originating role.
    pub fn from_tag(tag: &str) -> Option<AgentRole> {
        AgentRole::CYCLE.iter().copied().find(|r| r.as_str() == tag)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an agent.
///
/// Only `Idle`, `Thinking`, and `Working` are reachable in the base round
/// state machine (`Idle → Thinking → Working → Idle` within a single
/// round). `Waiting`, `Completed`, and `Failed` are part of the declared
/// status surface but no current code path produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Working,
    Waiting,
    Completed,
    Failed,
}

/// Per-agent counters maintained by the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentStats {
    /// Messages drained from the inbox over the agent's lifetime.
    pub received: u64,
    /// Composite messages the agent has produced.
    pub sent: u64,
    /// Tasks this agent was assigned to that reached convergence.
    pub tasks_completed: u64,
    /// Running mean of the confidence of every received message.
    pub avg_confidence: f32,
}

/// A single micro-agent record.
///
/// Mutated only during scheduler phases, plus the two seeding paths
/// (task submission and discovery injection), which only push to `inbox`.
///
/// Neighbors are kept in a `BTreeSet` so that iteration order, and with it
/// delivery order under a fixed RNG seed, is reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier, `"{role}-{n}"` (e.g. `"analyst-1"`).
    pub id: String,
    /// The agent's fixed specialty.
    pub role: AgentRole,
    /// Current lifecycle status.
    pub status: AgentStatus,
    /// Ids of graph neighbors. The relation is kept symmetric by the
    /// topology builder.
    pub neighbors: BTreeSet<String>,
    /// Messages awaiting intake next round.
    pub inbox: VecDeque<Message>,
    /// Composite messages awaiting propagation this round.
    pub outbox: VecDeque<Message>,
    /// Retained high-confidence messages, cleared when an assigned task
    /// converges.
    pub discoveries: Vec<Message>,
    /// Free-form scratch space for host extensions.
    pub working_memory: HashMap<String, serde_json::Value>,
    /// Lifetime counters.
    pub stats: AgentStats,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last round in which the agent took part in intake.
    pub last_active: DateTime<Utc>,
}

impl Agent {
    pub(crate) fn new(id: impl Into<String>, role: AgentRole) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            role,
            status: AgentStatus::Idle,
            neighbors: BTreeSet::new(),
            inbox: VecDeque::new(),
            outbox: VecDeque::new(),
            discoveries: Vec::new(),
            working_memory: HashMap::new(),
            stats: AgentStats::default(),
            created_at: now,
            last_active: now,
        }
    }

    /// Bump the received counter and fold `confidence` into the running mean.
    pub(crate) fn record_received(&mut self, confidence: f32) {
        self.stats.received += 1;
        self.stats.avg_confidence +=
            (confidence - self.stats.avg_confidence) / self.stats.received as f32;
    }
}
