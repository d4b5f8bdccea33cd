//! Swarm Gossip Demonstration
//!
//! Walks through the engine's surface end to end:
//! - initialize a small-world population and inspect the topology
//! - subscribe to the event stream
//! - submit a task and watch it converge through gossip rounds
//! - inject a task-less discovery and read the stats afterwards
//!
//! Run: cargo run --example swarm_demo
//! Set RUST_LOG=debug for per-round scheduler diagnostics.

use std::sync::Arc;

use async_trait::async_trait;
use swarmind::{EventHandler, Swarm, SwarmConfig, SwarmEvent, TaskStatus};

struct ConsoleReporter;

#[async_trait]
impl EventHandler for ConsoleReporter {
    async fn on_swarm_event(&self, event: &SwarmEvent) {
        match event {
            SwarmEvent::Initialized { agent_count, .. } => {
                println!("swarm ready: {} agents", agent_count);
            }
            SwarmEvent::GossipRound {
                round,
                active_agents,
                queued_messages,
                ..
            } => {
                println!(
                    "  round {:>2}: {} active, {} queued",
                    round, active_agents, queued_messages
                );
            }
            SwarmEvent::TaskCompleted {
                task_id,
                confidence,
                contributing_agents,
                ..
            } => {
                println!(
                    "task {} converged: confidence {:.2}, {} contributors",
                    task_id, confidence, contributing_agents
                );
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() {
    swarmind::init_logger();

    println!("=== Swarmind Gossip Demonstration ===\n");

    let config = SwarmConfig::default()
        .with_gossip_interval_ms(50)
        .with_rng_seed(2024);
    let swarm = Swarm::new("demo", "Demo Swarm", config);
    swarm.subscribe(Arc::new(ConsoleReporter));
    swarm.initialize(Some(8)).await;

    let view = swarm.topology().await;
    println!(
        "topology: {} nodes, {} undirected edges\n",
        view.nodes.len(),
        view.edges.len()
    );

    let task_id = swarm
        .submit_task(
            "review this code for bugs and suggest alternatives",
            Some("fn main() { loop {} }".to_string()),
        )
        .await;

    // The scheduler gossips in the background; poll until convergence.
    loop {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Some(task) = swarm.get_task(task_id).await {
            if task.status == TaskStatus::Completed {
                if let Some(report) = task.synthesis {
                    println!("\n{}\n", report);
                }
                break;
            }
        }
    }

    // A task-less hint for whatever the swarm works on next.
    let reached = swarm.inject_discovery("prefer bounded loops", 0.8, vec![]).await;
    println!("injected hint into {} agents", reached);

    let stats = swarm.stats().await;
    println!(
        "stats: {} agents, {} trails, {} rounds, {} messages sent",
        stats.agent_count, stats.pheromone_trails, stats.rounds_executed, stats.messages_sent
    );

    swarm.shutdown().await;
    println!("swarm shut down");
}
