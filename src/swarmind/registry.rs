//! Named-swarm registry.
//!
//! An explicit registry object the host constructs once and passes down,
//! not a process-wide singleton. Swarms are created and initialized lazily
//! on first lookup, listed with live stats, and torn down on delete.
//!
//! # Example
//!
//! ```rust,no_run
//! use swarmind::{SwarmConfig, SwarmRegistry};
//!
//! # async {
//! let registry = SwarmRegistry::new(SwarmConfig::default());
//!
//! // First lookup creates and initializes the swarm.
//! let swarm = registry.get_or_create("research").await;
//! swarm.submit_task("map the design space", None).await;
//!
//! for (name, stats) in registry.list().await {
//!     println!("{}: {} agents", name, stats.agent_count);
//! }
//!
//! registry.delete("research").await?;
//! # Ok::<(), swarmind::SwarmError>(())
//! # };
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::swarmind::config::SwarmConfig;
use crate::swarmind::swarm::{Swarm, SwarmError, SwarmStats};

/// Owns every named swarm created through it.
pub struct SwarmRegistry {
    config: SwarmConfig,
    swarms: RwLock<HashMap<String, Arc<Swarm>>>,
}

impl SwarmRegistry {
    /// Create a registry whose swarms share the given configuration.
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            config,
            swarms: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a swarm by name, creating and auto-initializing it (with
    /// the configured `min_agents`) on first access.
    pub async fn get_or_create(&self, name: &str) -> Arc<Swarm> {
        if let Some(swarm) = self.swarms.read().await.get(name) {
            return Arc::clone(swarm);
        }

        let mut swarms = self.swarms.write().await;
        // Re-check: another caller may have won the race for the write lock.
        if let Some(swarm) = swarms.get(name) {
            return Arc::clone(swarm);
        }
        let swarm = Arc::new(Swarm::new(name, name, self.config.clone()));
        swarm.initialize(None).await;
        swarms.insert(name.to_string(), Arc::clone(&swarm));
        log::info!("registry: created swarm '{}'", name);
        swarm
    }

    /// Borrow an existing swarm without creating one.
    pub async fn get(&self, name: &str) -> Option<Arc<Swarm>> {
        self.swarms.read().await.get(name).map(Arc::clone)
    }

    /// Names and live stats of every registered swarm.
    pub async fn list(&self) -> Vec<(String, SwarmStats)> {
        let snapshot: Vec<(String, Arc<Swarm>)> = {
            let swarms = self.swarms.read().await;
            swarms
                .iter()
                .map(|(name, swarm)| (name.clone(), Arc::clone(swarm)))
                .collect()
        };
        let mut listed = Vec::with_capacity(snapshot.len());
        for (name, swarm) in snapshot {
            let stats = swarm.stats().await;
            listed.push((name, stats));
        }
        listed.sort_by(|a, b| a.0.cmp(&b.0));
        listed
    }

    /// Stop and remove a swarm. The scheduler is stopped and all of the
    /// swarm's state is cleared before the entry is dropped.
    pub async fn delete(&self, name: &str) -> Result<(), SwarmError> {
        let removed = self.swarms.write().await.remove(name);
        match removed {
            Some(swarm) => {
                swarm.shutdown().await;
                log::info!("registry: deleted swarm '{}'", name);
                Ok(())
            }
            None => Err(SwarmError::SwarmNotFound(name.to_string())),
        }
    }
}
