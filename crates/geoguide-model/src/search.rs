//! Grounded search: build request, call the model once, extract the reply.

use std::sync::Arc;

use geoguide_core::types::{Coordinates, Message, Reply};

use crate::client::GenerativeModel;
use crate::error::ModelError;
use crate::request::RequestAdapter;
use crate::response::ResponseExtractor;

/// One maps-grounded question/answer round-trip.
///
/// Owns an injected model handle; cheap to share behind an `Arc`.
pub struct GroundedSearch {
    model: Arc<dyn GenerativeModel>,
    adapter: RequestAdapter,
    extractor: ResponseExtractor,
}

impl GroundedSearch {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            adapter: RequestAdapter::default(),
            extractor: ResponseExtractor::default(),
        }
    }

    /// Replay at most `max_turns` prior messages per request.
    pub fn with_history_window(mut self, max_turns: Option<usize>) -> Self {
        self.adapter = RequestAdapter::new(max_turns);
        self
    }

    /// Text substituted when the model has no answer.
    pub fn with_fallback_text(mut self, text: impl Into<String>) -> Self {
        self.extractor = ResponseExtractor::new(text);
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Answer `prompt` given prior `history` and an optional position.
    pub async fn answer(
        &self,
        history: &[Message],
        prompt: &str,
        location: Option<Coordinates>,
    ) -> Result<Reply, ModelError> {
        let request = self.adapter.build(history, prompt, location);
        let response = self.model.generate_content(&request).await?;
        let reply = self.extractor.extract(response);

        let (places, web) = reply
            .grounding
            .as_ref()
            .map(|g| (g.places().count(), g.web_sources().count()))
            .unwrap_or((0, 0));
        tracing::info!(
            history = history.len(),
            has_location = location.is_some(),
            places,
            web,
            "Grounded search answered"
        );
        Ok(reply)
    }
}
