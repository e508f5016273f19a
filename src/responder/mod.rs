// Retrieval-augmented responder
// Retrieves supporting documents, hands them to the chat provider as a
// single structured prompt, and degrades to the deterministic fallback
// router when generation fails. Never surfaces a raw provider error.

pub mod fallback;


use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::knowledge::{KnowledgeBase, KnowledgeHit};
use crate::openai::{ChatMessage, OpenAiClient};
use crate::Result;

use fallback::FallbackRouter;

/// How many trailing history messages are forwarded to the chat provider.
const HISTORY_TAIL: usize = 6;

const SYSTEM_PREAMBLE: &str = "You are the assistant on a personal portfolio website. \
    Answer questions about the owner's projects, skills, and work experience using only \
    the context below. Keep answers short and conversational. If the context does not \
    cover the question, say so instead of inventing details.";

/// Where a chat reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Generated,
    Fallback,
}

/// A chat reply plus its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub reply: String,
    pub source: ResponseSource,
}

pub struct Responder {
    openai: OpenAiClient,
    knowledge: Arc<KnowledgeBase>,
    fallback: FallbackRouter,
    context_limit: usize,
    context_threshold: f32,
}

impl Responder {
    #[inline]
    pub fn new(config: &Config, openai: OpenAiClient, knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            openai,
            fallback: FallbackRouter::new(Arc::clone(&knowledge)),
            knowledge,
            context_limit: config.search.chat_context_limit,
            context_threshold: config.search.chat_context_threshold,
        }
    }

    /// Answer a chat query. Infallible by design: any failure along the
    /// generative path (retrieval, generation, malformed response) falls
    /// through to the pattern-matching fallback.
    #[inline]
    pub async fn answer(&self, query: &str, history: &[ChatMessage]) -> ChatAnswer {
        match self.generate(query, history).await {
            Ok(reply) => ChatAnswer {
                reply,
                source: ResponseSource::Generated,
            },
            Err(error) => {
                warn!("Generation failed, using fallback router: {}", error);
                ChatAnswer {
                    reply: self.fallback.route(query, history).await,
                    source: ResponseSource::Fallback,
                }
            }
        }
    }

    async fn generate(&self, query: &str, history: &[ChatMessage]) -> Result<String> {
        let hits = self
            .knowledge
            .search(query, self.context_limit, self.context_threshold)
            .await?;
        debug!("Retrieved {} context documents for chat", hits.len());

        let messages = build_messages(query, history, &hits);
        self.openai.chat(&messages).await
    }
}

/// Assemble the provider message list: system prompt with retrieved
/// context, then the trailing slice of history, then the query itself.
fn build_messages(query: &str, history: &[ChatMessage], hits: &[KnowledgeHit]) -> Vec<ChatMessage> {
    let mut system = String::from(SYSTEM_PREAMBLE);
    if hits.is_empty() {
        system.push_str("\n\nNo matching context was found for this question.");
    } else {
        system.push_str("\n\nContext:");
        for hit in hits {
            system.push_str(&format!(
                "\n### {} ({})\n{}",
                hit.document.title(),
                hit.category,
                hit.document.embedding_text()
            ));
        }
    }

    let tail_start = history.len().saturating_sub(HISTORY_TAIL);
    let mut messages = Vec::with_capacity(2 + history.len() - tail_start);
    messages.push(ChatMessage::system(system));
    messages.extend(
        history[tail_start..]
            .iter()
            .filter(|message| message.role == "user" || message.role == "assistant")
            .cloned(),
    );
    messages.push(ChatMessage::user(query));
    messages
}
