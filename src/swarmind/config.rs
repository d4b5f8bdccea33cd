//! Configuration for a swarm instance.
//!
//! Provides the [`SwarmConfig`] struct consumed by
//! [`Swarm::new`](crate::swarmind::swarm::Swarm::new). Users construct it
//! manually or through the `with_*` builders; no file parsing dependencies
//! are required.
//!
//! # Example
//!
//! ```rust
//! use swarmind::SwarmConfig;
//!
//! // Defaults: 6 agents minimum, 100ms rounds, 0.95 decay, ttl 5.
//! let config = SwarmConfig::default();
//! assert_eq!(config.gossip_interval_ms, 100);
//!
//! // Tuned for a fast, deterministic test run.
//! let config = SwarmConfig::default()
//!     .with_gossip_interval_ms(10)
//!     .with_rng_seed(42);
//! ```

use serde::{Deserialize, Serialize};

/// Tunables for swarm construction and the gossip round loop.
///
/// Every field has a sensible default; override only what you need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Agent count used by [`initialize`](crate::swarmind::swarm::Swarm::initialize)
    /// when the caller does not specify one, and by
    /// [`SwarmRegistry::get_or_create`](crate::swarmind::registry::SwarmRegistry::get_or_create).
    pub min_agents: usize,

    /// Hard ceiling on the agent population.
    /// [`spawn_agent`](crate::swarmind::swarm::Swarm::spawn_agent) refuses to
    /// grow the swarm past this.
    pub max_agents: usize,

    /// Milliseconds between gossip rounds when the scheduler is running.
    pub gossip_interval_ms: u64,

    /// Multiplier applied to every pheromone trail each round. Trails whose
    /// strength falls below the prune floor (0.01) are removed.
    pub pheromone_decay: f32,

    /// Hop budget assigned to newly created messages.
    pub default_ttl: u32,

    /// Confidence cutoff (`0.0..=1.0`) for retaining a message as a
    /// discovery and for counting it toward task convergence.
    pub convergence_threshold: f32,

    /// Seed for the swarm's internal RNG (topology rewiring, selection
    /// padding, injection sampling). `None` seeds from entropy; set a value
    /// for reproducible runs and tests.
    pub rng_seed: Option<u64>,

    /// Optional per-task deadline, in rounds. A task still processing after
    /// this many rounds fails terminally with reason `convergence_timeout`.
    /// `None` (the default) lets tasks gossip indefinitely.
    pub max_task_rounds: Option<u64>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            min_agents: 6,
            max_agents: 64,
            gossip_interval_ms: 100,
            pheromone_decay: 0.95,
            default_ttl: 5,
            convergence_threshold: 0.7,
            rng_seed: None,
            max_task_rounds: None,
        }
    }
}

impl SwarmConfig {
    /// Override the default agent count (builder pattern).
    pub fn with_min_agents(mut self, min_agents: usize) -> Self {
        self.min_agents = min_agents;
        self
    }

    /// Override the agent population ceiling (builder pattern).
    pub fn with_max_agents(mut self, max_agents: usize) -> Self {
        self.max_agents = max_agents;
        self
    }

    /// Override the round interval in milliseconds (builder pattern).
    pub fn with_gossip_interval_ms(mut self, interval_ms: u64) -> Self {
        self.gossip_interval_ms = interval_ms;
        self
    }

    /// Override the per-round pheromone decay factor (builder pattern).
    pub fn with_pheromone_decay(mut self, decay: f32) -> Self {
        self.pheromone_decay = decay;
        self
    }

    /// Override the default message hop budget (builder pattern).
    pub fn with_default_ttl(mut self, ttl: u32) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Override the convergence confidence threshold (builder pattern).
    pub fn with_convergence_threshold(mut self, threshold: f32) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Fix the RNG seed for reproducible topology and sampling (builder pattern).
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Enable the per-task round deadline (builder pattern).
    pub fn with_max_task_rounds(mut self, rounds: u64) -> Self {
        self.max_task_rounds = Some(rounds);
        self
    }
}
