//! Request classification.
//!
//! `classify` never errors and never blocks past its timeout budget. The
//! layers run in order, first hit wins: cache → heuristic rule table →
//! circuit-broken remote fallback → safe default.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use switchboard_domain::{
    Intent, IntentKind, Turn, heuristic_intent, truncate_words,
};

use crate::cache::IntentCache;
use crate::config::PipelineParams;
use crate::ports::model_gateway::{ModelGatewayPort, ModelReply};
use crate::resilience::CircuitBreaker;

/// Intent classifier with cache, heuristics and a guarded remote fallback.
pub struct Classifier {
    cache: Arc<IntentCache>,
    gateway: Arc<dyn ModelGatewayPort>,
    breaker: Arc<CircuitBreaker>,
    timeout: Duration,
    max_words: usize,
    context_turns: usize,
}

impl Classifier {
    pub fn new(
        cache: Arc<IntentCache>,
        gateway: Arc<dyn ModelGatewayPort>,
        breaker: Arc<CircuitBreaker>,
        params: &PipelineParams,
    ) -> Self {
        Self {
            cache,
            gateway,
            breaker,
            timeout: params.classify_timeout,
            max_words: params.classify_max_words,
            context_turns: params.context_turns,
        }
    }

    /// Classify request text. Total: always returns an intent.
    pub async fn classify(&self, text: &str, context: &[Turn]) -> Intent {
        // Empty input short-circuits everything, including heuristics.
        if text.trim().is_empty() {
            return Intent::fallback_default();
        }

        if let Some(intent) = self.cache.get(text) {
            debug!(%intent, "Classification cache hit");
            return intent;
        }

        if let Some(intent) = heuristic_intent(text) {
            self.cache.insert(text, intent);
            return intent;
        }

        // Heuristics were ambiguous: one guarded remote call, then the safe
        // default. Errors never propagate out of here.
        match self.remote_classify(text, context).await {
            Some(kind) => {
                let intent = Intent::model(kind);
                self.cache.insert(text, intent);
                intent
            }
            None => Intent::fallback_default(),
        }
    }

    async fn remote_classify(&self, text: &str, context: &[Turn]) -> Option<IntentKind> {
        let prompt = self.classification_prompt(text, context);

        let reply = match self
            .breaker
            .call(self.timeout, self.gateway.complete(&prompt, None))
            .await
        {
            Ok(reply) => reply,
            Err(error) => {
                warn!(%error, "Remote classification unavailable, using default");
                return None;
            }
        };

        match reply {
            ModelReply::Text(answer) => {
                let parsed = IntentKind::parse(&answer);
                if parsed.is_none() {
                    warn!(answer = %answer.trim(), "Out-of-schema classification answer");
                }
                parsed
            }
            ModelReply::ToolCall(_) => {
                warn!("Classification call answered with a tool call");
                None
            }
        }
    }

    /// Closed-schema prompt: the model picks one category name verbatim.
    fn classification_prompt(&self, text: &str, context: &[Turn]) -> String {
        let categories = IntentKind::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut prompt = format!(
            "Classify the user request into exactly one category.\n\
             Categories: {categories}\n\
             Answer with the category name only.\n"
        );

        let recent = context.len().saturating_sub(self.context_turns);
        for turn in &context[recent..] {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.text));
        }

        // Long input is truncated before it goes on the wire.
        prompt.push_str(&format!(
            "Request: {}\n",
            truncate_words(text, self.max_words)
        ));
        prompt
    }
}
