//! # Swarmind
//!
//! Swarmind is an embeddable swarm-intelligence engine that decomposes a
//! reasoning task across many lightweight, role-specialized micro-agents.
//! Agents communicate by epidemic (gossip) message propagation over a
//! small-world graph, reinforce successful paths with decaying pheromone
//! trails, and synthesize a ranked, multi-perspective answer once enough
//! corroborating evidence accumulates, with no single monolithic reasoning
//! call required.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Swarm lifecycle**: [`Swarm`] owns the agent population, the
//!   pheromone ledger, the task board, and an explicitly started/stopped
//!   gossip scheduler
//! * **Topology**: Watts–Strogatz small-world construction
//!   ([`swarmind::topology`]): ring lattice plus random rewiring, with
//!   reciprocal wiring for agents spawned later
//! * **Gossip rounds**: five strictly ordered phases per round (intake,
//!   think, propagate, decay, convergence), each round an atomic batch
//!   transform over the whole population
//! * **Stigmergy**: directed, decaying trail weights
//!   ([`PheromoneLedger`]) reinforced by message flow and pruned below a
//!   floor
//! * **Tasks**: keyword-seeded assignment, convergence-triggered
//!   synthesis with fixed per-role aggregation templates, and an optional
//!   per-task round deadline
//! * **Observability**: a per-swarm [`EventHandler`] subscription stream
//!   ([`SwarmEvent`]) plus `log`-facade diagnostics
//! * **Multi-swarm hosting**: [`SwarmRegistry`] for named, lazily created
//!   swarm instances
//!
//! Everything runs in-process: the engine performs no network, file, or
//! database I/O. The "reasoning" inside an agent's think step is a
//! structural stub (per-role aggregation templates); real systems plug
//! their inference in at that seam, and attach host-side context
//! compression through the [`ContextCompressor`] collaborator.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use swarmind::{Swarm, SwarmConfig, SwarmEvent, EventHandler};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_swarm_event(&self, event: &SwarmEvent) {
//!         if let SwarmEvent::TaskCompleted { task_id, confidence, .. } = event {
//!             println!("task {} converged at {:.2}", task_id, confidence);
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let swarm = Swarm::new("demo", "Demo Swarm", SwarmConfig::default());
//!     swarm.subscribe(Arc::new(Printer));
//!     swarm.initialize(None).await;
//!
//!     // Submission returns immediately; the scheduler gossips in the
//!     // background until the task converges.
//!     let task_id = swarm.submit_task("review this code for bugs", None).await;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     if let Some(task) = swarm.get_task(task_id).await {
//!         if let Some(report) = task.synthesis {
//!             println!("{}", report);
//!         }
//!     }
//!     swarm.shutdown().await;
//! }
//! ```
//!
//! ## Deterministic stepping
//!
//! The timer is a convenience, not a requirement. Hosts and tests can hold
//! the scheduler stopped and step rounds by hand:
//!
//! ```rust,no_run
//! # async {
//! use swarmind::{Swarm, SwarmConfig};
//!
//! let config = SwarmConfig::default().with_rng_seed(42);
//! let swarm = Swarm::new("t", "T", config);
//! swarm.initialize(Some(6)).await;
//!
//! let task_id = swarm.submit_task("find the root cause", None).await;
//! swarm.stop_gossip().await;
//!
//! for _ in 0..10 {
//!     let outcome = swarm.run_round().await;
//!     if !outcome.completed_tasks.is_empty() {
//!         break;
//!     }
//! }
//! # };
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding
/// Swarmind can opt in to simple `RUST_LOG` driven diagnostics without
/// having to choose a specific logging backend upfront.
///
/// ```rust
/// swarmind::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `swarmind` module.
pub mod swarmind;

// Re-exporting key items for easier external access.
pub use crate::swarmind::agent::{Agent, AgentRole, AgentStats, AgentStatus};
pub use crate::swarmind::config::SwarmConfig;
pub use crate::swarmind::event::{EventHandler, SubscriptionId, SwarmEvent};
pub use crate::swarmind::message::{
    CompressedContext, ContextCompressor, Message, MessageKind, MessagePayload,
};
pub use crate::swarmind::pheromone::{PheromoneLedger, PheromoneTrail};
pub use crate::swarmind::pool::AgentPool;
pub use crate::swarmind::registry::SwarmRegistry;
pub use crate::swarmind::scheduler::{RoundOutcome, TaskCompletion};
pub use crate::swarmind::swarm::{
    Swarm, SwarmError, SwarmStats, TopologyEdge, TopologyNode, TopologyView,
};
pub use crate::swarmind::synthesis::{aggregate_for_role, synthesize, SynthesisReport};
pub use crate::swarmind::task::{Task, TaskStatus, CONVERGENCE_TIMEOUT};
