use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use swarmind::{
    AgentRole, CompressedContext, ContextCompressor, EventHandler, Swarm, SwarmConfig, SwarmError,
    SwarmEvent, TaskStatus, CONVERGENCE_TIMEOUT,
};
use uuid::Uuid;

fn test_swarm(config: SwarmConfig) -> Swarm {
    Swarm::new("test", "Test Swarm", config.with_rng_seed(42))
}

/// Step rounds by hand until the task reaches a terminal status, bounded.
async fn drive_to_completion(swarm: &Swarm, task_id: Uuid, max_rounds: usize) -> TaskStatus {
    for _ in 0..max_rounds {
        swarm.run_round().await;
        if let Some(task) = swarm.get_task(task_id).await {
            match task.status {
                TaskStatus::Completed | TaskStatus::Failed => return task.status,
                _ => {}
            }
        }
    }
    TaskStatus::Processing
}

#[tokio::test]
async fn initialize_six_agents_cycles_the_first_six_roles() {
    let swarm = test_swarm(SwarmConfig::default());
    let count = swarm.initialize(Some(6)).await;
    assert_eq!(count, 6);

    let view = swarm.topology().await;
    let roles: Vec<AgentRole> = view.nodes.iter().map(|n| n.role).collect();
    assert_eq!(
        roles,
        vec![
            AgentRole::Analyst,
            AgentRole::Researcher,
            AgentRole::Coder,
            AgentRole::Reviewer,
            AgentRole::Synthesizer,
            AgentRole::Validator,
        ]
    );
    assert_eq!(view.nodes[0].id, "analyst-1");

    // Undirected edges are deduplicated: the edge count must not exceed
    // the sum of degrees halved.
    let degree_sum: usize = view.nodes.iter().map(|n| n.degree).sum();
    assert_eq!(view.edges.len(), degree_sum / 2);
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let swarm = test_swarm(SwarmConfig::default());
    assert_eq!(swarm.initialize(Some(4)).await, 4);
    assert_eq!(swarm.initialize(Some(10)).await, 4);
}

#[tokio::test]
async fn selection_picks_triggered_roles_plus_synthesizer() {
    let swarm = test_swarm(SwarmConfig::default());
    swarm.initialize(Some(6)).await;

    let selected = swarm.select_agents_for_task("review this code for bugs").await;
    assert!(selected.contains(&"analyst-1".to_string()));
    assert!(selected.contains(&"reviewer-1".to_string()));
    assert!(selected.contains(&"synthesizer-1".to_string()));
}

#[tokio::test]
async fn inject_discovery_reaches_a_third_of_the_population() {
    let swarm = test_swarm(SwarmConfig::default());
    swarm.initialize(Some(9)).await;

    let delivered = swarm.inject_discovery("x", 0.9, Vec::new()).await;
    assert_eq!(delivered, 3); // ⌈9/3⌉

    let stats = swarm.stats().await;
    assert_eq!(stats.queued_messages, 3);
}

#[tokio::test]
async fn inject_discovery_on_empty_swarm_is_a_noop() {
    let swarm = test_swarm(SwarmConfig::default());
    assert_eq!(swarm.inject_discovery("x", 0.9, Vec::new()).await, 0);
}

#[tokio::test]
async fn spawn_agent_respects_capacity_and_wires_newcomers() {
    let swarm = test_swarm(SwarmConfig::default().with_max_agents(7));
    swarm.initialize(Some(6)).await;

    let id = swarm.spawn_agent(AgentRole::Optimizer).await.unwrap();
    assert_eq!(id, "optimizer-1");
    let view = swarm.topology().await;
    let newcomer = view.nodes.iter().find(|n| n.id == id).unwrap();
    assert!(newcomer.degree >= 1 && newcomer.degree <= 3);

    match swarm.spawn_agent(AgentRole::Analyst).await {
        Err(SwarmError::CapacityReached(limit)) => assert_eq!(limit, 7),
        other => panic!("expected capacity error, got {:?}", other),
    }
}

#[tokio::test]
async fn submitted_task_converges_and_reports_all_contributors() {
    let swarm = test_swarm(SwarmConfig::default());
    swarm.initialize(Some(6)).await;

    let task_id = swarm.submit_task("review this code for bugs", None).await;
    // Step deterministically instead of racing the timer.
    swarm.stop_gossip().await;

    let status = drive_to_completion(&swarm, task_id, 10).await;
    assert_eq!(status, TaskStatus::Completed);

    let task = swarm.get_task(task_id).await.unwrap();
    let report = task.synthesis.clone().expect("completed task has a report");
    assert!(report.starts_with("Task synthesis: review this code for bugs"));
    assert!(report.contains("Overall confidence:"));

    // The contributing-agent count covers every qualifying discovery's
    // sender, not just the quoted top five.
    let mut senders: Vec<String> = task.results.iter().map(|m| m.sender.clone()).collect();
    senders.sort();
    senders.dedup();
    assert!(report.contains(&format!("Contributing agents: {}", senders.len())));

    // Converged task freed its assigned agents.
    let stats = swarm.stats().await;
    assert_eq!(stats.tasks_completed, 1);
    assert_eq!(stats.tasks_processing, 0);
}

#[tokio::test]
async fn convergence_clears_assigned_discoveries_for_reuse() {
    let swarm = test_swarm(SwarmConfig::default());
    swarm.initialize(Some(6)).await;

    let first = swarm.submit_task("review this code for bugs", None).await;
    swarm.stop_gossip().await;
    assert_eq!(drive_to_completion(&swarm, first, 10).await, TaskStatus::Completed);

    // The same agents can carry a second task to convergence.
    let second = swarm.submit_task("research alternatives for caching", None).await;
    swarm.stop_gossip().await;
    assert_eq!(
        drive_to_completion(&swarm, second, 15).await,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn task_without_agents_fails_at_the_configured_deadline() {
    let swarm = test_swarm(SwarmConfig::default().with_max_task_rounds(2));
    swarm.initialize(Some(0)).await;

    let task_id = swarm.submit_task("nothing can pick this up", None).await;
    swarm.stop_gossip().await;

    let status = drive_to_completion(&swarm, task_id, 5).await;
    assert_eq!(status, TaskStatus::Failed);

    let task = swarm.get_task(task_id).await.unwrap();
    assert_eq!(task.failure_reason.as_deref(), Some(CONVERGENCE_TIMEOUT));
    assert!(task.completed_at.is_some());
}

#[tokio::test]
async fn task_without_deadline_stays_processing() {
    let swarm = test_swarm(SwarmConfig::default());
    swarm.initialize(Some(0)).await;

    let task_id = swarm.submit_task("nothing can pick this up", None).await;
    swarm.stop_gossip().await;

    let status = drive_to_completion(&swarm, task_id, 5).await;
    // Non-convergence is a signal, not an error.
    assert_eq!(status, TaskStatus::Processing);
}

#[tokio::test]
async fn gossip_start_and_stop_are_idempotent() {
    let swarm = test_swarm(SwarmConfig::default().with_gossip_interval_ms(10));
    swarm.initialize(Some(4)).await;

    assert!(swarm.start_gossip().await);
    assert!(!swarm.start_gossip().await);
    assert!(swarm.is_gossiping());
    assert!(swarm.stop_gossip().await);
    assert!(!swarm.stop_gossip().await);
    assert!(!swarm.is_gossiping());
}

struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn names(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for Recorder {
    async fn on_swarm_event(&self, event: &SwarmEvent) {
        let name = match event {
            SwarmEvent::Initialized { .. } => "initialized",
            SwarmEvent::AgentSpawned { .. } => "agent_spawned",
            SwarmEvent::TaskSubmitted { .. } => "task_submitted",
            SwarmEvent::GossipStarted { .. } => "gossip_started",
            SwarmEvent::GossipStopped { .. } => "gossip_stopped",
            SwarmEvent::GossipRound { .. } => "gossip_round",
            SwarmEvent::TaskCompleted { .. } => "task_completed",
            SwarmEvent::TaskFailed { .. } => "task_failed",
            SwarmEvent::Shutdown { .. } => "shutdown",
        };
        self.events.lock().unwrap().push(name.to_string());
    }
}

#[tokio::test]
async fn lifecycle_events_flow_through_subscriptions() {
    let swarm = test_swarm(SwarmConfig::default());
    let recorder = Arc::new(Recorder::new());
    let subscription = swarm.subscribe(Arc::clone(&recorder) as Arc<dyn EventHandler>);

    swarm.initialize(Some(6)).await;
    let task_id = swarm.submit_task("review this code for bugs", None).await;
    swarm.stop_gossip().await;
    drive_to_completion(&swarm, task_id, 10).await;
    swarm.shutdown().await;

    let names = recorder.names();
    for expected in [
        "initialized",
        "agent_spawned",
        "task_submitted",
        "gossip_started",
        "gossip_stopped",
        "gossip_round",
        "task_completed",
        "shutdown",
    ]
    .iter()
    {
        assert!(
            names.iter().any(|n| n == expected),
            "missing event {:?} in {:?}",
            expected,
            names
        );
    }

    // After unsubscribing the stream goes quiet.
    assert!(swarm.unsubscribe(subscription));
    let before = recorder.names().len();
    swarm.initialize(Some(2)).await;
    assert_eq!(recorder.names().len(), before);
}

struct StubCompressor;

#[async_trait]
impl ContextCompressor for StubCompressor {
    async fn compress(&self, text: &str, task_id: Uuid) -> CompressedContext {
        CompressedContext(serde_json::json!({
            "task": task_id.to_string(),
            "length": text.len(),
        }))
    }
}

#[tokio::test]
async fn submitted_context_is_compressed_and_attached_to_the_seed() {
    let swarm = Swarm::new(
        "ctx",
        "Context Swarm",
        SwarmConfig::default().with_rng_seed(42),
    )
    .with_compressor(Arc::new(StubCompressor));
    swarm.initialize(Some(6)).await;

    let task_id = swarm
        .submit_task(
            "review this code for bugs",
            Some("fn main() { unreachable_code(); }".to_string()),
        )
        .await;
    swarm.stop_gossip().await;
    assert_eq!(
        drive_to_completion(&swarm, task_id, 10).await,
        TaskStatus::Completed
    );

    let task = swarm.get_task(task_id).await.unwrap();
    assert_eq!(task.context.as_deref(), Some("fn main() { unreachable_code(); }"));
    // The seed discovery carries the opaque compressed context.
    assert!(task
        .results
        .iter()
        .any(|m| m.sender == "coordinator" && m.payload.context.is_some()));
}

#[tokio::test]
async fn shutdown_clears_all_state() {
    let swarm = test_swarm(SwarmConfig::default());
    swarm.initialize(Some(6)).await;
    swarm.submit_task("review this code for bugs", None).await;
    swarm.shutdown().await;

    let stats = swarm.stats().await;
    assert_eq!(stats.agent_count, 0);
    assert_eq!(stats.pheromone_trails, 0);
    assert_eq!(
        stats.tasks_pending + stats.tasks_processing + stats.tasks_completed + stats.tasks_failed,
        0
    );
    assert!(!swarm.is_gossiping());
}
