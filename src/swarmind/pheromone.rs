//! Pheromone trail ledger: stigmergic coordination state.
//!
//! Trails are directed, weighted edges between ordered agent pairs.
//! Message flow reinforces them, every round decays them, and trails that
//! decay below the prune floor disappear. Absent reinforcement a trail's
//! strength after `N` rounds is exactly `initial × decay^N`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trails weaker than this are removed during decay.
const PRUNE_FLOOR: f32 = 0.01;

/// Fraction of the incoming signal added to an existing trail.
const REINFORCE_GAIN: f32 = 0.2;

/// Fraction of the incoming signal a brand-new trail starts at.
const INITIAL_FACTOR: f32 = 0.5;

/// A directed, decaying edge weight between two agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PheromoneTrail {
    /// Sending agent id.
    pub from: String,
    /// Receiving agent id.
    pub to: String,
    /// Current weight, `0.0..=1.0`.
    pub strength: f32,
    /// Timestamp of the last reinforcement or creation.
    pub last_update: DateTime<Utc>,
    /// Task the reinforcing traffic belonged to, when known.
    pub task_id: Option<Uuid>,
}

/// The swarm's full set of directed trails.
#[derive(Debug, Default)]
pub struct PheromoneLedger {
    trails: HashMap<(String, String), PheromoneTrail>,
}

impl PheromoneLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live trails.
    pub fn len(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    /// Strengthen the `from → to` trail with an incoming signal.
    ///
    /// An existing trail gains `incoming × 0.2`, saturating at 1.0; a new
    /// trail is created at `incoming × 0.5`. Either way the trail's
    /// timestamp is refreshed.
    pub fn reinforce(&mut self, from: &str, to: &str, incoming: f32) {
        let incoming = incoming.clamp(0.0, 1.0);
        let now = Utc::now();
        let key = (from.to_string(), to.to_string());
        match self.trails.get_mut(&key) {
            Some(trail) => {
                trail.strength = (trail.strength + incoming * REINFORCE_GAIN).min(1.0);
                trail.last_update = now;
            }
            None => {
                self.trails.insert(
                    key,
                    PheromoneTrail {
                        from: from.to_string(),
                        to: to.to_string(),
                        strength: incoming * INITIAL_FACTOR,
                        last_update: now,
                        task_id: None,
                    },
                );
            }
        }
    }

    /// Current strength of the directed `from → to` trail, 0.0 if absent.
    pub fn strength(&self, from: &str, to: &str) -> f32 {
        self.trails
            .get(&(from.to_string(), to.to_string()))
            .map(|t| t.strength)
            .unwrap_or(0.0)
    }

    /// Strength of the undirected `a <-> b` edge: the stronger of the two
    /// directions. Used by the topology view.
    pub fn undirected_strength(&self, a: &str, b: &str) -> f32 {
        self.strength(a, b).max(self.strength(b, a))
    }

    /// Multiply every trail by `factor` and prune those that fall below the
    /// floor. A no-op on an empty ledger.
    pub fn decay(&mut self, factor: f32) {
        self.trails.retain(|_, trail| {
            trail.strength *= factor;
            trail.strength >= PRUNE_FLOOR
        });
    }

    /// Iterate over live trails in unspecified order.
    pub fn trails(&self) -> impl Iterator<Item = &PheromoneTrail> {
        self.trails.values()
    }

    pub(crate) fn clear(&mut self) {
        self.trails.clear();
    }
}
