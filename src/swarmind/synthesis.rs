//! Per-role aggregation templates and the convergence synthesizer.
//!
//! Five roles render their composite messages through fixed literal
//! templates; the remaining roles concatenate raw content. The exact
//! prefixes are part of the public output contract; downstream formatting
//! and tests assert on them, so they must not be reworded.
//!
//! Once a task accumulates enough corroborating evidence, [`synthesize`]
//! ranks the qualifying discoveries and renders the final report.

use crate::swarmind::agent::AgentRole;
use crate::swarmind::message::Message;

/// How many high-confidence discoveries a task needs before it converges.
pub(crate) const MIN_CORROBORATING_DISCOVERIES: usize = 3;

/// How many top discoveries the report quotes.
const TOP_DISCOVERIES: usize = 5;

/// Character budget for the query in the report heading.
const QUERY_HEADING_LIMIT: usize = 60;

/// Character budget for each quoted discovery.
const BULLET_TEXT_LIMIT: usize = 200;

impl AgentRole {
    /// The literal aggregation prefix for this role, if it has one.
    ///
    /// Roles without a template (researcher, validator, optimizer)
    /// concatenate raw content instead.
    fn template_prefix(self) -> Option<&'static str> {
        match self {
            AgentRole::Analyst => Some("[Analysis] Breaking down: "),
            AgentRole::Synthesizer => Some("[Synthesis] Combining insights: "),
            AgentRole::Coder => Some("[Code] Implementation consideration: "),
            AgentRole::Reviewer => Some("[Review] Quality check: "),
            AgentRole::Creative => Some("[Creative] Alternative approaches: "),
            _ => None,
        }
    }
}

/// Render a role's composite message body from its discovery texts.
pub fn aggregate_for_role(role: AgentRole, parts: &[&str]) -> String {
    let joined = parts.join("; ");
    match role.template_prefix() {
        Some(prefix) => format!("{}{}", prefix, joined),
        None => joined,
    }
}

/// The final result of a converged task.
#[derive(Debug, Clone)]
pub struct SynthesisReport {
    /// The rendered report text.
    pub text: String,
    /// Mean confidence of the quoted top discoveries.
    pub confidence: f32,
    /// Distinct senders across *all* qualifying discoveries, not just the
    /// quoted top.
    pub contributing_agents: usize,
}

/// Rank the qualifying discoveries and render the report.
pub fn synthesize(query: &str, qualifying: &[Message]) -> SynthesisReport {
    let mut ranked: Vec<&Message> = qualifying.iter().collect();
    ranked.sort_by(|a, b| {
        b.payload
            .confidence
            .partial_cmp(&a.payload.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top = &ranked[..TOP_DISCOVERIES.min(ranked.len())];

    let confidence = if top.is_empty() {
        0.0
    } else {
        top.iter().map(|m| m.payload.confidence).sum::<f32>() / top.len() as f32
    };

    let mut senders: Vec<&str> = qualifying.iter().map(|m| m.sender.as_str()).collect();
    senders.sort_unstable();
    senders.dedup();
    let contributing_agents = senders.len();

    let mut text = format!("Task synthesis: {}\n\n", truncate(query, QUERY_HEADING_LIMIT));
    for msg in top {
        text.push_str(&format!(
            "- [{}] {}\n",
            role_tag(msg),
            truncate(&msg.payload.content, BULLET_TEXT_LIMIT)
        ));
    }
    text.push_str(&format!("\nOverall confidence: {:.2}\n", confidence));
    text.push_str(&format!("Contributing agents: {}", contributing_agents));

    SynthesisReport {
        text,
        confidence,
        contributing_agents,
    }
}

/// First tag naming a known role, else the generic `"agent"`.
fn role_tag(msg: &Message) -> &'static str {
    msg.payload
        .tags
        .iter()
        .find_map(|t| AgentRole::from_tag(t))
        .map(|r| r.as_str())
        .unwrap_or("agent")
}

/// Character-boundary-safe truncation with an ellipsis marker.
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarmind::message::{MessageKind, MessagePayload};

    fn discovery(sender: &str, confidence: f32, tags: Vec<String>) -> Message {
        Message::new(
            sender,
            MessageKind::Discovery,
            MessagePayload::new(format!("finding from {}", sender), confidence).with_tags(tags),
            5,
        )
    }

    #[test]
    fn templates_use_exact_prefixes() {
        assert_eq!(
            aggregate_for_role(AgentRole::Analyst, &["a", "b"]),
            "[Analysis] Breaking down: a; b"
        );
        assert_eq!(
            aggregate_for_role(AgentRole::Synthesizer, &["x"]),
            "[Synthesis] Combining insights: x"
        );
        assert_eq!(
            aggregate_for_role(AgentRole::Coder, &["y"]),
            "[Code] Implementation consideration: y"
        );
        assert_eq!(
            aggregate_for_role(AgentRole::Reviewer, &["z"]),
            "[Review] Quality check: z"
        );
        assert_eq!(
            aggregate_for_role(AgentRole::Creative, &["w"]),
            "[Creative] Alternative approaches: w"
        );
        // No template: raw concatenation.
        assert_eq!(aggregate_for_role(AgentRole::Validator, &["p", "q"]), "p; q");
    }

    #[test]
    fn contributing_agents_counts_all_qualifying_senders() {
        // Seven discoveries from seven senders; only five are quoted but
        // all seven senders count.
        let qualifying: Vec<Message> = (0..7)
            .map(|i| discovery(&format!("agent-{}", i), 0.9 - i as f32 * 0.01, vec![]))
            .collect();
        let report = synthesize("explain the design", &qualifying);
        assert_eq!(report.contributing_agents, 7);
        assert_eq!(report.text.matches("- [").count(), 5);
        assert!(report.text.contains("Contributing agents: 7"));
    }

    #[test]
    fn confidence_is_mean_of_top_five() {
        let qualifying = vec![
            discovery("a", 1.0, vec![]),
            discovery("b", 0.8, vec![]),
            discovery("c", 0.9, vec![]),
        ];
        let report = synthesize("q", &qualifying);
        assert!((report.confidence - 0.9).abs() < 1e-6);
        assert!(report.text.contains("Overall confidence: 0.90"));
    }

    #[test]
    fn bullets_carry_role_tags_or_generic_agent() {
        let qualifying = vec![
            discovery("reviewer-1", 0.9, vec!["reviewer".into(), "task".into()]),
            discovery("coordinator", 0.8, vec!["task".into(), "initial".into()]),
        ];
        let report = synthesize("q", &qualifying);
        assert!(report.text.contains("- [reviewer]"));
        assert!(report.text.contains("- [agent]"));
    }

    #[test]
    fn long_queries_are_truncated_in_heading() {
        let long_query = "x".repeat(200);
        let report = synthesize(&long_query, &[discovery("a", 0.9, vec![])]);
        let heading = report.text.lines().next().unwrap_or("");
        assert!(heading.len() < 90);
        assert!(heading.ends_with("..."));
    }
}
