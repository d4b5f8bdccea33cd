//! The swarm facade: lifecycle, task submission, and observation.
//!
//! A [`Swarm`] is an embeddable, in-process engine: the host drives and
//! observes it, and no network, file, or database I/O happens inside. It owns
//! the agent pool, the pheromone ledger, the task board, and the gossip
//! scheduler that ticks rounds over them.
//!
//! # Architecture
//!
//! ```text
//! Swarm (facade)
//!   ├─ SwarmConfig            (immutable tunables)
//!   ├─ EventBus               (subscribe/unsubscribe, per-swarm stream)
//!   ├─ GossipScheduler        (driver task, explicit start/stop)
//!   └─ RwLock<SwarmState>
//!        ├─ AgentPool         (agent records, keyword task selection)
//!        ├─ PheromoneLedger   (directed decaying trails)
//!        ├─ TaskBoard         (submitted tasks)
//!        └─ StdRng            (seedable; rewiring, sampling)
//! ```
//!
//! The write lock is held for a whole round, making each round an atomic
//! batch transform; submission and injection take the same lock briefly
//! between rounds. Events are emitted after the lock is released.
//!
//! # Example
//!
//! ```rust,no_run
//! use swarmind::{Swarm, SwarmConfig};
//!
//! # async {
//! let swarm = Swarm::new("research", "Research Swarm", SwarmConfig::default());
//! swarm.initialize(None).await;
//!
//! let task_id = swarm.submit_task("find prior art for gossip engines", None).await;
//!
//! // Completion is asynchronous: poll get_task or subscribe for events.
//! if let Some(task) = swarm.get_task(task_id).await {
//!     println!("status: {:?}", task.status);
//! }
//! # };
//! ```

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::swarmind::agent::{AgentRole, AgentStatus};
use crate::swarmind::config::SwarmConfig;
use crate::swarmind::event::{EventBus, EventHandler, SubscriptionId, SwarmEvent};
use crate::swarmind::message::{ContextCompressor, Message, MessageKind, MessagePayload};
use crate::swarmind::pheromone::PheromoneLedger;
use crate::swarmind::pool::AgentPool;
use crate::swarmind::scheduler::{run_round, GossipScheduler, RoundOutcome};
use crate::swarmind::task::{Task, TaskBoard, TaskStatus};
use crate::swarmind::topology;

/// Pseudo-sender id on task seed messages.
const COORDINATOR_SENDER: &str = "coordinator";

/// Pseudo-sender id on injected discoveries.
const EXTERNAL_SENDER: &str = "external";

/// Errors surfaced by swarm and registry operations.
#[derive(Debug, Clone)]
pub enum SwarmError {
    /// `spawn_agent` would exceed `SwarmConfig::max_agents`.
    CapacityReached(usize),
    /// The registry has no swarm under the given name.
    SwarmNotFound(String),
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwarmError::CapacityReached(limit) => {
                write!(f, "Agent capacity reached: {}", limit)
            }
            SwarmError::SwarmNotFound(name) => write!(f, "Swarm not found: {}", name),
        }
    }
}

impl Error for SwarmError {}

/// Point-in-time counters for a swarm.
#[derive(Debug, Clone, Serialize)]
pub struct SwarmStats {
    pub agent_count: usize,
    pub idle_agents: usize,
    pub queued_messages: usize,
    pub total_discoveries: usize,
    pub pheromone_trails: usize,
    pub tasks_pending: usize,
    pub tasks_processing: usize,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
    pub rounds_executed: u64,
    pub messages_received: u64,
    pub messages_sent: u64,
}

/// One agent in the topology view.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyNode {
    pub id: String,
    pub role: AgentRole,
    pub status: AgentStatus,
    pub degree: usize,
}

/// One deduplicated undirected edge in the topology view, annotated with
/// the current pheromone strength (the stronger of the two directions).
#[derive(Debug, Clone, Serialize)]
pub struct TopologyEdge {
    pub a: String,
    pub b: String,
    pub strength: f32,
}

/// Snapshot of the agent graph for visualization.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyView {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}

/// Everything the round engine mutates, guarded by one lock.
pub(crate) struct SwarmState {
    pub(crate) pool: AgentPool,
    pub(crate) ledger: PheromoneLedger,
    pub(crate) tasks: TaskBoard,
    pub(crate) rng: StdRng,
    pub(crate) round: u64,
}

impl SwarmState {
    pub(crate) fn new(config: &SwarmConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            pool: AgentPool::new(),
            ledger: PheromoneLedger::new(),
            tasks: TaskBoard::default(),
            rng,
            round: 0,
        }
    }
}

/// Shared core: config, state, and the event bus. The scheduler's driver
/// task holds an `Arc` to this, so it lives as long as the loop does.
pub(crate) struct SwarmInner {
    pub(crate) id: String,
    pub(crate) config: SwarmConfig,
    pub(crate) state: RwLock<SwarmState>,
    pub(crate) events: EventBus,
}

impl SwarmInner {
    /// Run one round under the write lock, then emit telemetry with the
    /// lock released.
    pub(crate) async fn execute_round(self: &Arc<Self>) -> RoundOutcome {
        let outcome = {
            let mut state = self.state.write().await;
            run_round(&mut state, &self.config)
        };

        log::debug!(
            "swarm '{}' round {}: {} active agents, {} queued messages",
            self.id,
            outcome.round,
            outcome.active_agents,
            outcome.queued_messages
        );

        self.events
            .emit(&SwarmEvent::GossipRound {
                swarm_id: self.id.clone(),
                round: outcome.round,
                active_agents: outcome.active_agents,
                queued_messages: outcome.queued_messages,
            })
            .await;

        for completion in &outcome.completed_tasks {
            log::info!(
                "swarm '{}': task {} converged (confidence {:.2}, {} contributing agents)",
                self.id,
                completion.task_id,
                completion.confidence,
                completion.contributing_agents
            );
            self.events
                .emit(&SwarmEvent::TaskCompleted {
                    swarm_id: self.id.clone(),
                    task_id: completion.task_id,
                    confidence: completion.confidence,
                    contributing_agents: completion.contributing_agents,
                })
                .await;
        }

        for (task_id, reason) in &outcome.failed_tasks {
            log::warn!(
                "swarm '{}': task {} failed ({})",
                self.id,
                task_id,
                reason
            );
            self.events
                .emit(&SwarmEvent::TaskFailed {
                    swarm_id: self.id.clone(),
                    task_id: *task_id,
                    reason: reason.clone(),
                })
                .await;
        }

        outcome
    }
}

/// A named swarm instance. See the module docs for the architecture.
pub struct Swarm {
    name: String,
    inner: Arc<SwarmInner>,
    scheduler: GossipScheduler,
    compressor: Option<Arc<dyn ContextCompressor>>,
}

impl Swarm {
    /// Create an empty swarm. Call
    /// [`initialize`](Swarm::initialize) to spawn and wire the population.
    pub fn new(id: impl Into<String>, name: impl Into<String>, config: SwarmConfig) -> Self {
        let state = SwarmState::new(&config);
        Self {
            name: name.into(),
            inner: Arc::new(SwarmInner {
                id: id.into(),
                config,
                state: RwLock::new(state),
                events: EventBus::new(),
            }),
            scheduler: GossipScheduler::new(),
            compressor: None,
        }
    }

    /// Attach the context-compression collaborator (builder pattern).
    ///
    /// When set, `submit_task` runs raw context through it and attaches the
    /// opaque result to the task's seed messages.
    pub fn with_compressor(mut self, compressor: Arc<dyn ContextCompressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Stable identifier of this swarm.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Human-readable name of this swarm.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration this swarm was built with.
    pub fn config(&self) -> &SwarmConfig {
        &self.inner.config
    }

    /// Register an event handler. Returns a handle for
    /// [`unsubscribe`](Swarm::unsubscribe).
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        self.inner.events.subscribe(handler)
    }

    /// Remove a previously registered handler. Returns `false` if the
    /// handle was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Whether the gossip driver loop is currently running.
    pub fn is_gossiping(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Spawn the initial population and wire the small-world graph.
    ///
    /// Roles are assigned by cycling the fixed eight-role order, so
    /// `initialize(Some(6))` yields analyst, researcher, coder, reviewer,
    /// synthesizer, validator. With `None` the configured `min_agents` is
    /// used; either way the count is capped at `max_agents`.
    ///
    /// Idempotent: a swarm that already has agents keeps them and returns
    /// the existing count.
    pub async fn initialize(&self, agent_count: Option<usize>) -> usize {
        let target = agent_count
            .unwrap_or(self.inner.config.min_agents)
            .min(self.inner.config.max_agents);

        let spawned: Vec<(String, AgentRole)> = {
            let mut state = self.inner.state.write().await;
            if !state.pool.is_empty() {
                return state.pool.len();
            }
            let mut spawned = Vec::with_capacity(target);
            for i in 0..target {
                let role = AgentRole::CYCLE[i % AgentRole::CYCLE.len()];
                let id = state.pool.spawn(role);
                spawned.push((id, role));
            }
            let SwarmState { pool, rng, .. } = &mut *state;
            topology::build_topology(pool, rng);
            spawned
        };

        for (agent_id, role) in &spawned {
            self.inner
                .events
                .emit(&SwarmEvent::AgentSpawned {
                    swarm_id: self.inner.id.clone(),
                    agent_id: agent_id.clone(),
                    role: *role,
                })
                .await;
        }
        self.inner
            .events
            .emit(&SwarmEvent::Initialized {
                swarm_id: self.inner.id.clone(),
                agent_count: spawned.len(),
            })
            .await;
        log::info!(
            "swarm '{}' initialized with {} agents",
            self.inner.id,
            spawned.len()
        );
        spawned.len()
    }

    /// Spawn one agent on demand and wire it into the existing graph.
    ///
    /// When at least two agents already exist the newcomer is connected to
    /// up to three random existing agents, reciprocally.
    pub async fn spawn_agent(&self, role: AgentRole) -> Result<String, SwarmError> {
        let agent_id = {
            let mut state = self.inner.state.write().await;
            if state.pool.len() >= self.inner.config.max_agents {
                return Err(SwarmError::CapacityReached(self.inner.config.max_agents));
            }
            let prior_population = state.pool.len();
            let id = state.pool.spawn(role);
            if prior_population >= 2 {
                let SwarmState { pool, rng, .. } = &mut *state;
                topology::connect_to_neighbors(pool, &id, rng);
            }
            id
        };

        self.inner
            .events
            .emit(&SwarmEvent::AgentSpawned {
                swarm_id: self.inner.id.clone(),
                agent_id: agent_id.clone(),
                role,
            })
            .await;
        log::debug!("swarm '{}': spawned {}", self.inner.id, agent_id);
        Ok(agent_id)
    }

    /// Submit a reasoning task and return its id immediately.
    ///
    /// Seeds one synthetic discovery (confidence 1.0, tags
    /// `["task", "initial"]`) into each selected agent's inbox, marks the
    /// task processing, and starts the gossip scheduler if it is idle.
    /// Completion is asynchronous; subscribe for
    /// [`SwarmEvent::TaskCompleted`] or poll [`get_task`](Swarm::get_task).
    ///
    /// Submitting against an empty swarm (or a query that selects nobody)
    /// is not an error: the task simply stays processing and never
    /// converges. Non-convergence is a first-class signal.
    pub async fn submit_task(&self, query: impl Into<String>, context: Option<String>) -> Uuid {
        let query = query.into();
        let task_id = Uuid::new_v4();

        let compressed = match (&self.compressor, context.as_deref()) {
            (Some(compressor), Some(text)) => Some(compressor.compress(text, task_id).await),
            _ => None,
        };

        {
            let mut state = self.inner.state.write().await;
            let selected = state.pool.select_agents_for_task(&query);

            let mut task = Task::new(task_id, query.clone(), context);
            task.assigned = selected.clone();
            task.advance(TaskStatus::Processing);

            let mut payload = MessagePayload::new(query.clone(), 1.0)
                .with_relevance(1.0)
                .with_tags(vec!["task".to_string(), "initial".to_string()]);
            if let Some(context) = compressed {
                payload = payload.with_context(context);
            }
            let seed = Message::new(
                COORDINATOR_SENDER,
                MessageKind::Discovery,
                payload,
                self.inner.config.default_ttl,
            );
            for agent_id in &selected {
                if let Some(agent) = state.pool.get_mut(agent_id) {
                    agent.inbox.push_back(seed.clone());
                }
            }

            log::info!(
                "swarm '{}': task {} submitted, seeded to {:?}",
                self.inner.id,
                task_id,
                selected
            );
            state.tasks.insert(task);
        }

        self.inner
            .events
            .emit(&SwarmEvent::TaskSubmitted {
                swarm_id: self.inner.id.clone(),
                task_id,
            })
            .await;

        self.start_gossip().await;
        task_id
    }

    /// Broadcast a discovery to a random third of the population
    /// (⌈n/3⌉ agents), independent of any task. Returns how many agents
    /// received it.
    ///
    /// The conventional confidence for host-injected hints is 0.8, high
    /// enough to be retained as a discovery under the default threshold.
    pub async fn inject_discovery(
        &self,
        content: &str,
        confidence: f32,
        tags: Vec<String>,
    ) -> usize {
        let mut state = self.inner.state.write().await;
        let population = state.pool.len();
        if population == 0 {
            return 0;
        }
        let sample_size = (population + 2) / 3;
        let ids: Vec<String> = state.pool.ids().to_vec();
        let targets: Vec<String> = {
            let SwarmState { rng, .. } = &mut *state;
            ids.choose_multiple(rng, sample_size).cloned().collect()
        };

        let message = Message::new(
            EXTERNAL_SENDER,
            MessageKind::Discovery,
            MessagePayload::new(content, confidence).with_tags(tags),
            self.inner.config.default_ttl,
        );
        for agent_id in &targets {
            if let Some(agent) = state.pool.get_mut(agent_id) {
                agent.inbox.push_back(message.clone());
            }
        }
        log::debug!(
            "swarm '{}': injected discovery into {} agents",
            self.inner.id,
            targets.len()
        );
        targets.len()
    }

    /// Start the gossip driver loop. Returns `false` if already running.
    pub async fn start_gossip(&self) -> bool {
        if self.scheduler.start(Arc::clone(&self.inner)) {
            log::info!("swarm '{}': gossip started", self.inner.id);
            self.inner
                .events
                .emit(&SwarmEvent::GossipStarted {
                    swarm_id: self.inner.id.clone(),
                })
                .await;
            true
        } else {
            false
        }
    }

    /// Stop the gossip driver loop, waiting for any in-flight round to
    /// finish. Returns `false` if it was not running.
    pub async fn stop_gossip(&self) -> bool {
        if self.scheduler.stop().await {
            log::info!("swarm '{}': gossip stopped", self.inner.id);
            self.inner
                .events
                .emit(&SwarmEvent::GossipStopped {
                    swarm_id: self.inner.id.clone(),
                })
                .await;
            true
        } else {
            false
        }
    }

    /// Execute exactly one gossip round synchronously.
    ///
    /// This is the same entry point the scheduler's driver loop uses;
    /// exposing it lets hosts and tests step the swarm deterministically
    /// without the timer.
    pub async fn run_round(&self) -> RoundOutcome {
        self.inner.execute_round().await
    }

    /// Fetch a snapshot of a task by id.
    pub async fn get_task(&self, id: Uuid) -> Option<Task> {
        let state = self.inner.state.read().await;
        state.tasks.get(&id).cloned()
    }

    /// The agent subset that a task with this query would be seeded to.
    /// Advisory only; gossip decides who actually contributes.
    pub async fn select_agents_for_task(&self, query: &str) -> Vec<String> {
        let state = self.inner.state.read().await;
        state.pool.select_agents_for_task(query)
    }

    /// Point-in-time counters.
    pub async fn stats(&self) -> SwarmStats {
        let state = self.inner.state.read().await;
        let mut stats = SwarmStats {
            agent_count: state.pool.len(),
            idle_agents: 0,
            queued_messages: 0,
            total_discoveries: 0,
            pheromone_trails: state.ledger.len(),
            tasks_pending: state.tasks.count_by_status(TaskStatus::Pending),
            tasks_processing: state.tasks.count_by_status(TaskStatus::Processing),
            tasks_completed: state.tasks.count_by_status(TaskStatus::Completed),
            tasks_failed: state.tasks.count_by_status(TaskStatus::Failed),
            rounds_executed: state.round,
            messages_received: 0,
            messages_sent: 0,
        };
        for agent in state.pool.iter() {
            if agent.status == AgentStatus::Idle {
                stats.idle_agents += 1;
            }
            stats.queued_messages += agent.inbox.len();
            stats.total_discoveries += agent.discoveries.len();
            stats.messages_received += agent.stats.received;
            stats.messages_sent += agent.stats.sent;
        }
        stats
    }

    /// Snapshot of the agent graph: nodes plus deduplicated undirected
    /// edges annotated with current pheromone strength.
    pub async fn topology(&self) -> TopologyView {
        let state = self.inner.state.read().await;
        let nodes: Vec<TopologyNode> = state
            .pool
            .iter()
            .map(|agent| TopologyNode {
                id: agent.id.clone(),
                role: agent.role,
                status: agent.status,
                degree: agent.neighbors.len(),
            })
            .collect();

        let mut pairs: BTreeSet<(String, String)> = BTreeSet::new();
        for agent in state.pool.iter() {
            for neighbor in &agent.neighbors {
                let pair = if agent.id < *neighbor {
                    (agent.id.clone(), neighbor.clone())
                } else {
                    (neighbor.clone(), agent.id.clone())
                };
                pairs.insert(pair);
            }
        }
        let edges = pairs
            .into_iter()
            .map(|(a, b)| {
                let strength = state.ledger.undirected_strength(&a, &b);
                TopologyEdge { a, b, strength }
            })
            .collect();

        TopologyView { nodes, edges }
    }

    /// Tear the swarm down: stop the scheduler and clear all agents,
    /// trails, and tasks. The instance can be re-initialized afterwards.
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
        {
            let mut state = self.inner.state.write().await;
            state.pool.clear();
            state.ledger.clear();
            state.tasks.clear();
        }
        self.inner
            .events
            .emit(&SwarmEvent::Shutdown {
                swarm_id: self.inner.id.clone(),
            })
            .await;
        log::info!("swarm '{}' shut down", self.inner.id);
    }
}
