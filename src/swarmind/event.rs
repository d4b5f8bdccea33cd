//! Swarm event system.
//!
//! A callback-based observability layer for swarm lifecycle and gossip
//! telemetry. Implement [`EventHandler`] to receive real-time
//! notifications about:
//!
//! - **Lifecycle**: initialization, agent spawns, shutdown
//! - **Gossip**: scheduler start/stop and per-round telemetry
//! - **Tasks**: submission, convergence, and deadline failure
//!
//! Handlers are registered with
//! [`Swarm::subscribe`](crate::swarmind::swarm::Swarm::subscribe), which
//! returns a [`SubscriptionId`] usable with
//! [`Swarm::unsubscribe`](crate::swarmind::swarm::Swarm::unsubscribe).
//! Each swarm owns its own subscriber set; there are no global listeners.
//!
//! Events are emitted after the round's state lock is released, so a
//! handler may freely call back into the swarm (submit a follow-up task,
//! read stats) without deadlocking. The one exception: do not call
//! [`stop_gossip`](crate::swarmind::swarm::Swarm::stop_gossip) or
//! [`shutdown`](crate::swarmind::swarm::Swarm::shutdown) from inside a
//! handler, because stopping waits for the driver task that is mid-way through
//! delivering your event.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use swarmind::{EventHandler, SwarmEvent};
//!
//! struct Logger;
//!
//! #[async_trait]
//! impl EventHandler for Logger {
//!     async fn on_swarm_event(&self, event: &SwarmEvent) {
//!         match event {
//!             SwarmEvent::GossipRound { round, active_agents, .. } => {
//!                 println!("round {}: {} agents active", round, active_agents);
//!             }
//!             SwarmEvent::TaskCompleted { task_id, confidence, .. } => {
//!                 println!("task {} converged at {:.2}", task_id, confidence);
//!             }
//!             _ => {}
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::swarmind::agent::AgentRole;

/// Events emitted by a [`Swarm`](crate::swarmind::swarm::Swarm).
///
/// Every variant carries the `swarm_id` so a handler shared across several
/// swarms can tell the sources apart.
#[derive(Debug, Clone)]
pub enum SwarmEvent {
    /// The swarm finished spawning and wiring its initial population.
    Initialized {
        swarm_id: String,
        agent_count: usize,
    },

    /// A single agent was spawned (during initialization or on demand).
    AgentSpawned {
        swarm_id: String,
        agent_id: String,
        role: AgentRole,
    },

    /// A task was accepted and its seed discoveries were queued.
    TaskSubmitted { swarm_id: String, task_id: Uuid },

    /// The gossip scheduler started ticking.
    GossipStarted { swarm_id: String },

    /// The gossip scheduler stopped. Any in-flight round finished first.
    GossipStopped { swarm_id: String },

    /// Per-round telemetry, emitted once per completed round.
    GossipRound {
        swarm_id: String,
        /// 1-based round counter.
        round: u64,
        /// Agents that drained a non-empty inbox this round.
        active_agents: usize,
        /// Messages sitting in inboxes after the propagate phase.
        queued_messages: usize,
    },

    /// A task accumulated enough corroborating evidence and was
    /// synthesized. Read the report via
    /// [`get_task`](crate::swarmind::swarm::Swarm::get_task).
    TaskCompleted {
        swarm_id: String,
        task_id: Uuid,
        /// Mean confidence of the report's quoted discoveries.
        confidence: f32,
        /// Distinct senders across all qualifying discoveries.
        contributing_agents: usize,
    },

    /// A task hit its configured round deadline without converging.
    /// Only emitted when `SwarmConfig::max_task_rounds` is set.
    TaskFailed {
        swarm_id: String,
        task_id: Uuid,
        reason: String,
    },

    /// The swarm was torn down; all agents, trails, and tasks are gone.
    Shutdown { swarm_id: String },
}

/// Trait for receiving swarm events.
///
/// The single method has a **default no-op implementation**; a handler can
/// match only the variants it cares about. The `Send + Sync` bound lets
/// handlers be shared with the scheduler's driver task via
/// `Arc<dyn EventHandler>`; guard any internal state accordingly.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called for every event the swarm emits, in emission order.
    async fn on_swarm_event(&self, _event: &SwarmEvent) {}
}

/// Handle returned by `subscribe`, redeemable with `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The per-swarm subscriber set.
#[derive(Default)]
pub(crate) struct EventBus {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<u64, Arc<dyn EventHandler>>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.insert(id, handler);
        }
        SubscriptionId(id)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.handlers.write() {
            Ok(mut handlers) => handlers.remove(&id.0).is_some(),
            Err(_) => false,
        }
    }

    /// Deliver `event` to every subscriber, sequentially.
    ///
    /// The handler list is snapshotted first so delivery happens without
    /// holding the registry lock.
    pub(crate) async fn emit(&self, event: &SwarmEvent) {
        let snapshot: Vec<Arc<dyn EventHandler>> = match self.handlers.read() {
            Ok(handlers) => handlers.values().cloned().collect(),
            Err(_) => return,
        };
        for handler in snapshot {
            handler.on_swarm_event(event).await;
        }
    }
}
