//! Small-world topology construction (Watts–Strogatz).
//!
//! Agents are arranged in a ring lattice (each connected to its `k`
//! nearest neighbors on each side) and a fraction of the edges is then
//! rewired to random distant agents. The result has the short average path
//! length and high clustering gossip propagation wants.
//!
//! All edges are reciprocal, before and after rewiring, and agents spawned
//! after initialization are wired in through [`connect_to_neighbors`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::swarmind::pool::AgentPool;

/// Probability that an existing lattice edge is rewired to a random
/// non-neighbor.
const REWIRE_PROBABILITY: f32 = 0.3;

/// How many random existing agents a late-spawned agent connects to.
const DYNAMIC_NEIGHBOR_COUNT: usize = 3;

/// Build the full small-world graph over the current population.
///
/// Clears any existing edges first, so it can be called on a freshly
/// spawned population or to rebuild from scratch. With fewer than two
/// agents there is nothing to wire.
pub fn build_topology(pool: &mut AgentPool, rng: &mut StdRng) {
    let ids: Vec<String> = pool.ids().to_vec();
    let n = ids.len();
    if n < 2 {
        return;
    }

    for id in &ids {
        if let Some(agent) = pool.get_mut(id) {
            agent.neighbors.clear();
        }
    }

    // Ring lattice: k nearest neighbors on each side, reciprocal.
    let k = 4.min(n / 2);
    for i in 0..n {
        for d in 1..=k {
            let j = (i + d) % n;
            if i != j {
                pool.connect(&ids[i], &ids[j]);
            }
        }
    }

    // Rewire pass. Edges are enumerated in id order so a seeded RNG gives
    // a reproducible graph.
    let mut edges: Vec<(String, String)> = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if let Some(agent) = pool.get(&ids[i]) {
                if agent.neighbors.contains(&ids[j]) {
                    edges.push((ids[i].clone(), ids[j].clone()));
                }
            }
        }
    }

    for (a, b) in edges {
        if rng.gen::<f32>() >= REWIRE_PROBABILITY {
            continue;
        }
        let candidates: Vec<&String> = ids
            .iter()
            .filter(|c| {
                c.as_str() != a
                    && pool
                        .get(&a)
                        .map(|agent| !agent.neighbors.contains(c.as_str()))
                        .unwrap_or(false)
            })
            .collect();
        if let Some(target) = candidates.choose(rng) {
            let target = (*target).clone();
            pool.disconnect(&a, &b);
            pool.connect(&a, &target);
        }
    }
}

/// Wire a late-spawned agent into the existing graph: up to three random
/// existing agents, each connection reciprocal.
pub fn connect_to_neighbors(pool: &mut AgentPool, agent_id: &str, rng: &mut StdRng) {
    let others: Vec<String> = pool
        .ids()
        .iter()
        .filter(|id| id.as_str() != agent_id)
        .cloned()
        .collect();
    let picks: Vec<String> = others
        .choose_multiple(rng, DYNAMIC_NEIGHBOR_COUNT)
        .cloned()
        .collect();
    for other in picks {
        pool.connect(agent_id, &other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarmind::agent::AgentRole;
    use rand::SeedableRng;

    fn seeded_pool(n: usize) -> (AgentPool, StdRng) {
        let mut pool = AgentPool::new();
        for i in 0..n {
            pool.spawn(AgentRole::CYCLE[i % AgentRole::CYCLE.len()]);
        }
        (pool, StdRng::seed_from_u64(7))
    }

    fn assert_symmetric(pool: &AgentPool) {
        for agent in pool.iter() {
            for neighbor in &agent.neighbors {
                let other = pool.get(neighbor).expect("neighbor exists");
                assert!(
                    other.neighbors.contains(&agent.id),
                    "{} -> {} is not reciprocal",
                    agent.id,
                    neighbor
                );
            }
        }
    }

    #[test]
    fn ring_with_rewiring_stays_symmetric() {
        let (mut pool, mut rng) = seeded_pool(12);
        build_topology(&mut pool, &mut rng);
        assert_symmetric(&pool);
        // Every agent is wired to someone.
        for agent in pool.iter() {
            assert!(!agent.neighbors.is_empty());
        }
    }

    #[test]
    fn tiny_population_is_a_noop_or_pair() {
        let (mut pool, mut rng) = seeded_pool(1);
        build_topology(&mut pool, &mut rng);
        assert!(pool.iter().all(|a| a.neighbors.is_empty()));

        let (mut pool, mut rng) = seeded_pool(2);
        build_topology(&mut pool, &mut rng);
        assert_symmetric(&pool);
        assert_eq!(pool.iter().map(|a| a.neighbors.len()).sum::<usize>(), 2);
    }

    #[test]
    fn dynamic_wiring_is_symmetric_and_bounded() {
        let (mut pool, mut rng) = seeded_pool(10);
        build_topology(&mut pool, &mut rng);
        let id = pool.spawn(AgentRole::Optimizer);
        connect_to_neighbors(&mut pool, &id, &mut rng);
        assert_symmetric(&pool);
        let degree = pool.get(&id).unwrap().neighbors.len();
        assert!(degree >= 1 && degree <= 3, "degree {} out of range", degree);
    }

    #[test]
    fn six_agents_form_a_complete_ring() {
        // k = min(4, 6/2) = 3, so offsets ±1..=3 cover all other agents.
        let (mut pool, mut rng) = seeded_pool(6);
        build_topology(&mut pool, &mut rng);
        for agent in pool.iter() {
            assert_eq!(agent.neighbors.len(), 5);
        }
    }
}
