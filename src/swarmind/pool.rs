//! The agent pool: exclusive owner of every agent record.
//!
//! Keyed by agent id with a parallel insertion-order vector so iteration is
//! stable, the same registry shape the rest of the engine relies on for
//! reproducible rounds. Also home of the keyword heuristics that pick a
//! task's initial agent subset. That selection is advisory seeding only; the gossip protocol
//! decides which agents actually contribute.

use std::collections::HashMap;

use crate::swarmind::agent::{Agent, AgentRole, AgentStatus};

/// Keyword triggers for optional role seeding, checked in this order.
const ROLE_TRIGGERS: &[(AgentRole, &[&str])] = &[
    (AgentRole::Coder, &["code", "implement", "function"]),
    (AgentRole::Reviewer, &["review", "check", "bug"]),
    (AgentRole::Researcher, &["research", "find", "search"]),
    (AgentRole::Creative, &["idea", "alternative", "creative"]),
];

/// Minimum seeded subset before padding with arbitrary agents kicks in.
const MIN_SELECTED: usize = 2;

/// Padding target when the keyword pass selected too few agents.
const PADDED_SELECTION: usize = 3;

/// Owns agent records, keyed by id, in stable insertion order.
#[derive(Debug, Default)]
pub struct AgentPool {
    agents: HashMap<String, Agent>,
    order: Vec<String>,
}

impl AgentPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Borrow an agent by id.
    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    /// Agent ids in spawn order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Iterate agents in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.order.iter().filter_map(move |id| self.agents.get(id))
    }

    /// Create an idle agent with empty queues and return its id.
    ///
    /// Ids are `"{role}-{n}"` where `n` counts prior agents of the same
    /// role, so a freshly initialized swarm reads `analyst-1`,
    /// `researcher-1`, and so on. Topology wiring is the caller's job.
    pub fn spawn(&mut self, role: AgentRole) -> String {
        let nth = self.iter().filter(|a| a.role == role).count() + 1;
        let id = format!("{}-{}", role.as_str(), nth);
        self.order.push(id.clone());
        self.agents.insert(id.clone(), Agent::new(id.clone(), role));
        id
    }

    /// Make `a` and `b` mutual neighbors.
    pub fn connect(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        if let Some(agent) = self.agents.get_mut(a) {
            agent.neighbors.insert(b.to_string());
        }
        if let Some(agent) = self.agents.get_mut(b) {
            agent.neighbors.insert(a.to_string());
        }
    }

    /// Remove the mutual neighbor link between `a` and `b`.
    pub fn disconnect(&mut self, a: &str, b: &str) {
        if let Some(agent) = self.agents.get_mut(a) {
            agent.neighbors.remove(b);
        }
        if let Some(agent) = self.agents.get_mut(b) {
            agent.neighbors.remove(a);
        }
    }

    /// Pick the initial agent subset for a task by keyword heuristics.
    ///
    /// Deterministic rule set: always an idle analyst (fallback: any
    /// analyst); one agent per keyword-triggered role; always
    /// a trailing synthesizer. If fewer than two agents were selected the
    /// result is padded with arbitrary unselected agents, up to three.
    ///
    /// An empty pool yields an empty selection: the task will simply
    /// never converge, which callers treat as a first-class signal.
    pub fn select_agents_for_task(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        let mut selected: Vec<String> = Vec::new();

        let analyst = self
            .iter()
            .find(|a| a.role == AgentRole::Analyst && a.status == AgentStatus::Idle)
            .or_else(|| self.iter().find(|a| a.role == AgentRole::Analyst));
        if let Some(agent) = analyst {
            selected.push(agent.id.clone());
        }

        for (role, keywords) in ROLE_TRIGGERS {
            if keywords.iter().any(|k| query.contains(k)) {
                if let Some(agent) = self
                    .iter()
                    .find(|a| a.role == *role && !selected.contains(&a.id))
                {
                    selected.push(agent.id.clone());
                }
            }
        }

        if let Some(agent) = self
            .iter()
            .find(|a| a.role == AgentRole::Synthesizer && !selected.contains(&a.id))
        {
            selected.push(agent.id.clone());
        }

        if selected.len() < MIN_SELECTED {
            for id in &self.order {
                if selected.len() >= PADDED_SELECTION {
                    break;
                }
                if !selected.contains(id) {
                    selected.push(id.clone());
                }
            }
        }

        selected
    }

    pub(crate) fn clear(&mut self) {
        self.agents.clear();
        self.order.clear();
    }
}
