//! The gossip unit and the context-compression collaborator contract.
//!
//! A [`Message`] is the only thing agents exchange. It carries a payload
//! (text, confidence, tags), a remaining hop budget (`ttl`), and the ordered
//! list of agents it has already visited (`hop_path`). Two invariants hold
//! for every message instance:
//!
//! - `ttl` strictly decreases each hop; a message with `ttl` 0 in an outbox
//!   is dropped, never delivered.
//! - A message is never delivered to an agent already present in its
//!   `hop_path` (cycle and duplicate-delivery prevention).
//!
//! Context compression is an external collaborator: the engine attaches the
//! opaque [`CompressedContext`] produced by a host-supplied
//! [`ContextCompressor`] to seed messages and never looks inside it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a gossip message.
///
/// `Discovery` and `Answer` messages reinforce the pheromone trail from
/// sender to receiver on intake; the other kinds flow without leaving a
/// trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Discovery,
    Question,
    Answer,
    Alert,
    Pheromone,
}

/// Opaque compressed-context blob produced by a [`ContextCompressor`].
///
/// The engine attaches it to payloads verbatim and never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedContext(pub serde_json::Value);

/// The content an agent actually reads: text plus scoring metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Free-form message text.
    pub content: String,
    /// Sender's confidence in the content, clamped to `0.0..=1.0`.
    pub confidence: f32,
    /// Relevance score, same range. Advisory; the engine only acts on
    /// confidence.
    pub relevance: f32,
    /// Free-form tags. By convention the first role-named tag identifies
    /// the originating specialty.
    pub tags: Vec<String>,
    /// Optional opaque compressed context attached at task submission.
    pub context: Option<CompressedContext>,
}

impl MessagePayload {
    /// Create a payload with the given text and confidence. Relevance
    /// defaults to the confidence; tags start empty.
    pub fn new(content: impl Into<String>, confidence: f32) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            content: content.into(),
            confidence,
            relevance: confidence,
            tags: Vec::new(),
            context: None,
        }
    }

    /// Override the relevance score (builder pattern).
    pub fn with_relevance(mut self, relevance: f32) -> Self {
        self.relevance = relevance.clamp(0.0, 1.0);
        self
    }

    /// Replace the tag list (builder pattern).
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attach an opaque compressed context (builder pattern).
    pub fn with_context(mut self, context: CompressedContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// A single gossip message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id. Clones fanned out to multiple neighbors share it, which
    /// is what makes union-by-id deduplication during the convergence check
    /// meaningful.
    pub id: Uuid,
    /// Id of the producing agent (or a pseudo-sender such as
    /// `"coordinator"` for task seeds and `"external"` for injections).
    pub sender: String,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Message classification.
    pub kind: MessageKind,
    /// Text and scoring metadata.
    pub payload: MessagePayload,
    /// Remaining hop budget.
    pub ttl: u32,
    /// Ordered ids of agents this instance has already visited.
    pub hop_path: Vec<String>,
}

impl Message {
    /// Create a fresh message with an empty hop path.
    pub fn new(
        sender: impl Into<String>,
        kind: MessageKind,
        payload: MessagePayload,
        ttl: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            timestamp: Utc::now(),
            kind,
            payload,
            ttl,
            hop_path: Vec::new(),
        }
    }
}

/// External collaborator that condenses raw task context into an opaque
/// value the swarm can attach to seed messages.
///
/// The engine ships no implementation; hosts plug in whatever compression
/// they use (an LLM summarizer, an embedding index key, a plain truncation).
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use swarmind::{CompressedContext, ContextCompressor};
/// use uuid::Uuid;
///
/// struct Truncating;
///
/// #[async_trait]
/// impl ContextCompressor for Truncating {
///     async fn compress(&self, text: &str, task_id: Uuid) -> CompressedContext {
///         CompressedContext(serde_json::json!({
///             "task": task_id.to_string(),
///             "summary": text.chars().take(280).collect::<String>(),
///         }))
///     }
/// }
/// ```
#[async_trait]
pub trait ContextCompressor: Send + Sync {
    /// Compress `text` for the given task.
    async fn compress(&self, text: &str, task_id: Uuid) -> CompressedContext;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_clamps_confidence() {
        let payload = MessagePayload::new("x", 1.7);
        assert_eq!(payload.confidence, 1.0);
        let payload = MessagePayload::new("x", -0.2).with_relevance(2.0);
        assert_eq!(payload.confidence, 0.0);
        assert_eq!(payload.relevance, 1.0);
    }

    #[test]
    fn new_message_has_empty_hop_path() {
        let msg = Message::new("analyst-1", MessageKind::Discovery, MessagePayload::new("x", 0.9), 5);
        assert!(msg.hop_path.is_empty());
        assert_eq!(msg.ttl, 5);
    }
}
