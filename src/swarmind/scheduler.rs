//! The gossip scheduler: five ordered phases per round, one driver loop.
//!
//! This is the concurrency core of the engine. A single driver task ticks
//! at the configured interval and runs [`run_round`] over the whole agent
//! population. The round is an atomic batch transform: the state write
//! lock is held across all five phases, so phase 2 of one agent can never
//! interleave with phase 1 of another within the same round.
//!
//! ```text
//! tick ──▶ 1. inbox intake      (drain mailboxes, retain discoveries,
//! │                              reinforce trails)
//! │        2. think             (one composite message per role, via the
//! │                              aggregation templates)
//! │        3. propagate         (hop-budgeted fan-out to neighbors not in
//! │                              the hop path)
//! │        4. decay             (pheromone multiply + prune)
//! │        5. convergence check (synthesize tasks with enough evidence)
//! └─◀───── emit telemetry, next tick
//! ```
//!
//! Phase 2 is the intended hook for real reasoning. The engine ships the
//! structural stub, template aggregation over retained discoveries. A
//! variant that fans think-calls out to a worker pool must still
//! barrier-wait for all of them before starting phase 3, or the ordering
//! contract above is broken.
//!
//! Stopping the scheduler signals a watch channel and joins the driver
//! task; an in-flight round always runs to completion first. There is no
//! partial-round cancellation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::swarmind::agent::AgentStatus;
use crate::swarmind::config::SwarmConfig;
use crate::swarmind::message::{Message, MessageKind, MessagePayload};
use crate::swarmind::swarm::{SwarmInner, SwarmState};
use crate::swarmind::synthesis::{aggregate_for_role, synthesize, MIN_CORROBORATING_DISCOVERIES};
use crate::swarmind::task::{TaskStatus, CONVERGENCE_TIMEOUT};

/// A task that converged this round.
#[derive(Debug, Clone)]
pub struct TaskCompletion {
    pub task_id: Uuid,
    /// Mean confidence of the report's quoted discoveries.
    pub confidence: f32,
    /// Distinct senders across all qualifying discoveries.
    pub contributing_agents: usize,
}

/// What a single round did, returned by
/// [`Swarm::run_round`](crate::swarmind::swarm::Swarm::run_round) and used
/// for telemetry.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    /// 1-based round counter.
    pub round: u64,
    /// Agents that drained a non-empty inbox this round.
    pub active_agents: usize,
    /// Messages queued in inboxes after the propagate phase.
    pub queued_messages: usize,
    /// Tasks that converged this round.
    pub completed_tasks: Vec<TaskCompletion>,
    /// Tasks that hit their round deadline this round, with the reason.
    pub failed_tasks: Vec<(Uuid, String)>,
}

/// Execute one full five-phase round over the whole population.
///
/// The caller holds the state write lock for the duration, which is what
/// makes the round atomic.
pub(crate) fn run_round(state: &mut SwarmState, config: &SwarmConfig) -> RoundOutcome {
    state.round += 1;
    let now = Utc::now();
    let ids: Vec<String> = state.pool.ids().to_vec();
    let mut active_agents = 0;

    // Phase 1: inbox intake.
    let mut reinforcements: Vec<(String, String, f32)> = Vec::new();
    for id in &ids {
        let agent = match state.pool.get_mut(id) {
            Some(a) => a,
            None => continue,
        };
        if agent.inbox.is_empty() {
            continue;
        }
        agent.status = AgentStatus::Thinking;
        agent.last_active = now;
        active_agents += 1;
        let incoming: Vec<Message> = agent.inbox.drain(..).collect();
        for msg in incoming {
            agent.record_received(msg.payload.confidence);
            if matches!(msg.kind, MessageKind::Discovery | MessageKind::Answer) {
                reinforcements.push((msg.sender.clone(), id.clone(), msg.payload.confidence));
            }
            if msg.payload.confidence > config.convergence_threshold {
                agent.discoveries.push(msg);
            }
        }
    }
    for (from, to, confidence) in reinforcements {
        state.ledger.reinforce(&from, &to, confidence);
    }

    // Phase 2: think. Exactly one composite message per agent that has
    // something to aggregate; everyone returns to idle either way.
    for id in &ids {
        let agent = match state.pool.get_mut(id) {
            Some(a) => a,
            None => continue,
        };
        if agent.status != AgentStatus::Thinking {
            continue;
        }
        if agent.discoveries.is_empty() {
            agent.status = AgentStatus::Idle;
            continue;
        }
        agent.status = AgentStatus::Working;

        let parts: Vec<&str> = agent
            .discoveries
            .iter()
            .map(|m| m.payload.content.as_str())
            .collect();
        let content = aggregate_for_role(agent.role, &parts);
        let confidence = agent
            .discoveries
            .iter()
            .map(|m| m.payload.confidence)
            .sum::<f32>()
            / agent.discoveries.len() as f32;
        let mut tags: Vec<String> = vec![agent.role.as_str().to_string()];
        for msg in &agent.discoveries {
            for tag in &msg.payload.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }

        let payload = MessagePayload::new(content, confidence).with_tags(tags);
        let composite = Message::new(id.clone(), MessageKind::Answer, payload, config.default_ttl);
        agent.outbox.push_back(composite);
        agent.stats.sent += 1;
        agent.status = AgentStatus::Idle;
    }

    // Phase 3: propagate. Hop-budgeted fan-out; a clone per eligible
    // neighbor, never back along the hop path.
    let mut deliveries: Vec<(String, Message)> = Vec::new();
    for id in &ids {
        let agent = match state.pool.get_mut(id) {
            Some(a) => a,
            None => continue,
        };
        if agent.outbox.is_empty() {
            continue;
        }
        let neighbors: Vec<String> = agent.neighbors.iter().cloned().collect();
        let outgoing: Vec<Message> = agent.outbox.drain(..).collect();
        for mut msg in outgoing {
            if msg.ttl == 0 {
                continue;
            }
            msg.hop_path.push(id.clone());
            msg.ttl -= 1;
            for neighbor in &neighbors {
                if msg.hop_path.iter().any(|hop| hop == neighbor) {
                    continue;
                }
                deliveries.push((neighbor.clone(), msg.clone()));
            }
        }
    }
    for (to, msg) in deliveries {
        if let Some(agent) = state.pool.get_mut(&to) {
            agent.inbox.push_back(msg);
        }
    }
    let queued_messages = state.pool.iter().map(|a| a.inbox.len()).sum();

    // Phase 4: pheromone decay.
    state.ledger.decay(config.pheromone_decay);

    // Phase 5: convergence check.
    let mut completed_tasks = Vec::new();
    let mut failed_tasks = Vec::new();
    for task_id in state.tasks.ids() {
        let (assigned, rounds_so_far) = match state.tasks.get(&task_id) {
            Some(task) if task.status == TaskStatus::Processing => {
                (task.assigned.clone(), task.rounds_in_processing + 1)
            }
            _ => continue,
        };

        // Union of discoveries currently held by the assigned agents,
        // deduplicated by message id (fan-out clones share ids).
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut qualifying: Vec<Message> = Vec::new();
        for agent_id in &assigned {
            if let Some(agent) = state.pool.get(agent_id) {
                for discovery in &agent.discoveries {
                    if discovery.payload.confidence > config.convergence_threshold
                        && seen.insert(discovery.id)
                    {
                        qualifying.push(discovery.clone());
                    }
                }
            }
        }

        if qualifying.len() >= MIN_CORROBORATING_DISCOVERIES {
            let report = match state.tasks.get_mut(&task_id) {
                Some(task) => {
                    let report = synthesize(&task.query, &qualifying);
                    task.synthesis = Some(report.text.clone());
                    task.results = qualifying;
                    task.advance(TaskStatus::Completed);
                    task.completed_at = Some(now);
                    report
                }
                None => continue,
            };
            // Free the assigned agents for reuse.
            for agent_id in &assigned {
                if let Some(agent) = state.pool.get_mut(agent_id) {
                    agent.discoveries.clear();
                    agent.stats.tasks_completed += 1;
                }
            }
            completed_tasks.push(TaskCompletion {
                task_id,
                confidence: report.confidence,
                contributing_agents: report.contributing_agents,
            });
        } else if let Some(task) = state.tasks.get_mut(&task_id) {
            task.rounds_in_processing = rounds_so_far;
            if let Some(limit) = config.max_task_rounds {
                if rounds_so_far >= limit {
                    task.advance(TaskStatus::Failed);
                    task.failure_reason = Some(CONVERGENCE_TIMEOUT.to_string());
                    task.completed_at = Some(now);
                    failed_tasks.push((task_id, CONVERGENCE_TIMEOUT.to_string()));
                }
            }
        }
    }

    RoundOutcome {
        round: state.round,
        active_agents,
        queued_messages,
        completed_tasks,
        failed_tasks,
    }
}

/// Owns the driver task that ticks rounds at a fixed interval.
///
/// Explicitly started and stopped by the swarm facade; there is no hidden
/// global timer. `start` is idempotent while running, and `stop` joins the
/// driver so any in-flight round finishes before it returns.
pub(crate) struct GossipScheduler {
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl GossipScheduler {
    pub(crate) fn new() -> Self {
        Self {
            stop_tx: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.stop_tx
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Spawn the driver loop. Returns `false` if it is already running.
    pub(crate) fn start(&self, inner: Arc<SwarmInner>) -> bool {
        let mut tx_guard = match self.stop_tx.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        if tx_guard.is_some() {
            return false;
        }

        let (tx, mut rx) = watch::channel(false);
        let interval_ms = inner.config.gossip_interval_ms.max(1);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately; consume
            // it so the first round runs one full interval after start.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        inner.execute_round().await;
                    }
                    result = rx.changed() => {
                        let _ = result;
                        break;
                    }
                }
            }
        });

        *tx_guard = Some(tx);
        if let Ok(mut handle_guard) = self.handle.lock() {
            *handle_guard = Some(handle);
        }
        true
    }

    /// Signal the driver to stop and wait for it. Returns `false` if it
    /// was not running.
    pub(crate) async fn stop(&self) -> bool {
        let tx = match self.stop_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        match (tx, handle) {
            (Some(tx), Some(handle)) => {
                let _ = tx.send(true);
                let _ = handle.await;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarmind::agent::AgentRole;
    use crate::swarmind::swarm::SwarmState;

    fn test_config() -> SwarmConfig {
        SwarmConfig::default().with_rng_seed(1)
    }

    /// Three agents in a line: analyst-1 <-> researcher-1 <-> coder-1.
    fn line_state(config: &SwarmConfig) -> SwarmState {
        let mut state = SwarmState::new(config);
        state.pool.spawn(AgentRole::Analyst);
        state.pool.spawn(AgentRole::Researcher);
        state.pool.spawn(AgentRole::Coder);
        state.pool.connect("analyst-1", "researcher-1");
        state.pool.connect("researcher-1", "coder-1");
        state
    }

    fn outbox_message(ttl: u32) -> Message {
        Message::new(
            "analyst-1",
            MessageKind::Discovery,
            MessagePayload::new("lead", 0.9),
            ttl,
        )
    }

    #[test]
    fn propagation_decrements_ttl_and_records_hop() {
        let config = test_config();
        let mut state = line_state(&config);
        state
            .pool
            .get_mut("analyst-1")
            .unwrap()
            .outbox
            .push_back(outbox_message(2));

        let outcome = run_round(&mut state, &config);
        assert_eq!(outcome.queued_messages, 1);

        // Delivered only to the direct neighbor, one hop spent.
        let outcome = run_round(&mut state, &config);
        assert_eq!(outcome.active_agents, 1);
        let researcher = state.pool.get("researcher-1").unwrap();
        assert_eq!(researcher.discoveries.len(), 1);
        assert_eq!(researcher.discoveries[0].ttl, 1);
        assert_eq!(researcher.discoveries[0].hop_path, vec!["analyst-1".to_string()]);
        assert!(state.pool.get("coder-1").unwrap().discoveries.is_empty());
    }

    #[test]
    fn exhausted_ttl_drops_message() {
        let config = test_config();
        let mut state = line_state(&config);
        state
            .pool
            .get_mut("analyst-1")
            .unwrap()
            .outbox
            .push_back(outbox_message(0));

        let outcome = run_round(&mut state, &config);
        assert_eq!(outcome.queued_messages, 0);
        assert!(state.pool.get("analyst-1").unwrap().outbox.is_empty());
    }

    #[test]
    fn hop_path_members_are_never_redelivered() {
        let config = test_config();
        let mut state = line_state(&config);
        let mut message = outbox_message(5);
        message.hop_path.push("researcher-1".to_string());
        state
            .pool
            .get_mut("analyst-1")
            .unwrap()
            .outbox
            .push_back(message);

        let outcome = run_round(&mut state, &config);
        // analyst-1's only neighbor is already in the hop path.
        assert_eq!(outcome.queued_messages, 0);
    }

    #[test]
    fn intake_retains_discoveries_and_reinforces_trails() {
        let config = test_config();
        let mut state = line_state(&config);
        let seed = Message::new(
            "coordinator",
            MessageKind::Discovery,
            MessagePayload::new("the task", 1.0),
            config.default_ttl,
        );
        state
            .pool
            .get_mut("analyst-1")
            .unwrap()
            .inbox
            .push_back(seed);

        let outcome = run_round(&mut state, &config);
        assert_eq!(outcome.active_agents, 1);

        let analyst = state.pool.get("analyst-1").unwrap();
        assert_eq!(analyst.stats.received, 1);
        assert_eq!(analyst.stats.sent, 1);
        assert_eq!(analyst.discoveries.len(), 1);
        assert_eq!(analyst.status, AgentStatus::Idle);
        // Created at 1.0 * 0.5, then one decay at 0.95.
        let strength = state.ledger.strength("coordinator", "analyst-1");
        assert!((strength - 0.475).abs() < 1e-6);
    }

    #[test]
    fn think_applies_role_template_and_low_confidence_is_not_retained() {
        let config = test_config();
        let mut state = line_state(&config);
        let weak = Message::new(
            "external",
            MessageKind::Discovery,
            MessagePayload::new("rumor", 0.3),
            config.default_ttl,
        );
        let strong = Message::new(
            "external",
            MessageKind::Discovery,
            MessagePayload::new("fact", 0.9),
            config.default_ttl,
        );
        {
            let analyst = state.pool.get_mut("analyst-1").unwrap();
            analyst.inbox.push_back(weak);
            analyst.inbox.push_back(strong);
        }

        run_round(&mut state, &config);

        let analyst = state.pool.get("analyst-1").unwrap();
        assert_eq!(analyst.discoveries.len(), 1);
        assert_eq!(analyst.stats.received, 2);

        // The composite was fanned out to researcher-1; it carries the
        // analyst template and the role tag.
        let researcher = state.pool.get("researcher-1").unwrap();
        assert_eq!(researcher.inbox.len(), 1);
        let composite = &researcher.inbox[0];
        assert!(composite
            .payload
            .content
            .starts_with("[Analysis] Breaking down: fact"));
        assert_eq!(composite.payload.tags[0], "analyst");
        assert_eq!(composite.kind, MessageKind::Answer);
    }
}
