//! Chat session: the transcript, the location probe result, and the single
//! in-flight request gate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use geoguide_core::config::GeoguideConfig;
use geoguide_core::types::{ConnectionState, Message};

use crate::backend::ChatBackend;
use crate::error::ChatError;
use crate::location::{acquire_location, LocationProvider, LocationStatus, PositionOptions};
use crate::store::ConversationStore;
use crate::view::{self, MessageView};

const DEFAULT_APOLOGY: &str = "Sorry, I had trouble reaching the search service. Please try again.";

/// Result of a submission that passed input validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend answered; carries the appended assistant message.
    Answered(Message),
    /// The backend failed; carries the appended apology.
    Failed(Message),
    /// A request was already in flight. Nothing was appended or sent.
    Busy,
}

/// Clears the busy flag when the in-flight request finishes, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    locator: Arc<dyn LocationProvider>,
    position_options: PositionOptions,
    store: Mutex<ConversationStore>,
    location: Mutex<LocationStatus>,
    busy: AtomicBool,
    apology_text: String,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, locator: Arc<dyn LocationProvider>) -> Self {
        Self {
            backend,
            locator,
            position_options: PositionOptions::default(),
            store: Mutex::new(ConversationStore::new()),
            location: Mutex::new(LocationStatus::default()),
            busy: AtomicBool::new(false),
            apology_text: DEFAULT_APOLOGY.to_string(),
        }
    }

    /// Build a session with greeting, apology and probe options from config.
    pub fn from_config(
        backend: Arc<dyn ChatBackend>,
        locator: Arc<dyn LocationProvider>,
        config: &GeoguideConfig,
    ) -> Self {
        Self::new(backend, locator)
            .with_position_options(PositionOptions::from(&config.location))
            .with_apology_text(config.chat.apology_text.clone())
            .with_greeting(&config.chat.greeting)
    }

    /// Open the transcript with an assistant greeting. Blank text adds nothing.
    pub fn with_greeting(self, greeting: &str) -> Self {
        if !greeting.trim().is_empty() {
            if let Ok(mut store) = self.store.lock() {
                store.append(Message::assistant(greeting, None));
            }
        }
        self
    }

    pub fn with_apology_text(mut self, text: impl Into<String>) -> Self {
        self.apology_text = text.into();
        self
    }

    pub fn with_position_options(mut self, options: PositionOptions) -> Self {
        self.position_options = options;
        self
    }

    /// Send one user turn.
    ///
    /// Blank input is rejected before anything is recorded. While another
    /// submission is outstanding this returns [`SubmitOutcome::Busy`]. Otherwise
    /// exactly one user and one assistant message are appended and the backend
    /// is called once.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, ChatError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Submission ignored: request already in flight");
            return Ok(SubmitOutcome::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let history = {
            let mut store = self.lock_store()?;
            store.append(Message::user(prompt));
            store.history_before_last().to_vec()
        };
        let location = self.location()?.coordinates();

        match self.backend.send(&history, prompt, location).await {
            Ok(reply) => {
                let message = Message::from_reply(reply);
                self.lock_store()?.append(message.clone());
                Ok(SubmitOutcome::Answered(message))
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat request failed");
                let message = Message::assistant(self.apology_text.clone(), None);
                self.lock_store()?.append(message.clone());
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    /// Run the location probe once and record its outcome. Once the state is
    /// terminal the provider is not asked again.
    pub async fn probe_location(&self) -> Result<ConnectionState, ChatError> {
        let current = self.lock_location()?.state();
        if current.is_terminal() {
            return Ok(current);
        }

        let outcome = acquire_location(self.locator.as_ref(), &self.position_options).await;
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "Location unavailable, continuing without it");
        }

        let mut status = self.lock_location()?;
        if status.resolve(&outcome) {
            tracing::info!(state = %status.state().label(), "Location probe finished");
        }
        Ok(status.state())
    }

    /// Spawn [`probe_location`](Self::probe_location) in the background.
    pub fn start_location_probe(self: &Arc<Self>) -> JoinHandle<Result<ConnectionState, ChatError>> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.probe_location().await })
    }

    pub fn messages(&self) -> Result<Vec<Message>, ChatError> {
        Ok(self.lock_store()?.all().to_vec())
    }

    pub fn len(&self) -> Result<usize, ChatError> {
        Ok(self.lock_store()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ChatError> {
        Ok(self.lock_store()?.is_empty())
    }

    pub fn location(&self) -> Result<LocationStatus, ChatError> {
        Ok(*self.lock_location()?)
    }

    pub fn connection_state(&self) -> Result<ConnectionState, ChatError> {
        Ok(self.lock_location()?.state())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// View models for the whole transcript.
    pub fn render(&self) -> Result<Vec<MessageView>, ChatError> {
        Ok(view::render(self.lock_store()?.all()))
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, ConversationStore>, ChatError> {
        self.store
            .lock()
            .map_err(|e| ChatError::State(format!("conversation lock poisoned: {}", e)))
    }

    fn lock_location(&self) -> Result<MutexGuard<'_, LocationStatus>, ChatError> {
        self.location
            .lock()
            .map_err(|e| ChatError::State(format!("location lock poisoned: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use geoguide_core::types::{
        Citation, Coordinates, GroundingResult, PlaceCitation, Reply, Role,
    };

    use crate::location::{FixedLocation, LocationError, NoLocation};

    /// Backend that records what it was sent and answers with an echo.
    #[derive(Default)]
    struct RecordingBackend {
        calls: AtomicUsize,
        seen: Mutex<Vec<(usize, String, Option<Coordinates>)>>,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        async fn send(
            &self,
            history: &[Message],
            prompt: &str,
            location: Option<Coordinates>,
        ) -> Result<Reply, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((history.len(), prompt.to_string(), location));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(ChatError::Service("connection refused".to_string()));
            }
            Ok(Reply {
                text: format!("about {}", prompt),
                grounding: Some(GroundingResult {
                    citations: vec![Citation::Place(PlaceCitation {
                        source_id: "p1".to_string(),
                        title: "Cafe Uno".to_string(),
                        uri: "https://maps.google.com/?cid=1".to_string(),
                        review_snippets: vec![],
                    })],
                    queries: vec![],
                }),
            })
        }
    }

    struct SlowLocation;

    #[async_trait]
    impl LocationProvider for SlowLocation {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Coordinates {
                latitude: 0.0,
                longitude: 0.0,
            })
        }
    }

    fn madrid() -> Coordinates {
        Coordinates {
            latitude: 40.4168,
            longitude: -3.7038,
        }
    }

    fn session_with(backend: Arc<RecordingBackend>) -> ChatSession {
        ChatSession::new(backend, Arc::new(NoLocation))
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_assistant() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session_with(backend.clone());

        let outcome = session.submit("  coffee near me ").await.unwrap();
        let SubmitOutcome::Answered(reply) = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(reply.text, "about coffee near me");

        let messages = session.messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "coffee near me");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(
            messages[1].grounding.as_ref().unwrap().places().count(),
            1
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_blank_submission_is_rejected() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session_with(backend.clone());

        for text in ["", "   ", "\n\t"] {
            let err = session.submit(text).await.unwrap_err();
            assert!(matches!(err, ChatError::EmptyMessage));
        }
        assert_eq!(session.len().unwrap(), 0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_submission_while_busy_is_ignored() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(RecordingBackend {
            gate: Some(gate.clone()),
            ..RecordingBackend::default()
        });
        let session = session_with(backend.clone());

        let first = session.submit("first");
        let second = async {
            // Wait until the first request is outstanding.
            while backend.calls.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            assert!(session.is_busy());
            let len_before = session.len().unwrap();
            let outcome = session.submit("second").await.unwrap();
            assert_eq!(session.len().unwrap(), len_before);
            gate.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);
        assert!(matches!(first.unwrap(), SubmitOutcome::Answered(_)));
        assert_eq!(second, SubmitOutcome::Busy);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.len().unwrap(), 2);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_failure_appends_one_apology_and_clears_busy() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..RecordingBackend::default()
        });
        let session = session_with(backend.clone()).with_apology_text("Sorry!");

        let outcome = session.submit("coffee").await.unwrap();
        match outcome {
            SubmitOutcome::Failed(msg) => {
                assert_eq!(msg.text, "Sorry!");
                assert_eq!(msg.role, Role::Assistant);
                assert!(msg.grounding.is_none());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(session.len().unwrap(), 2);
        assert!(!session.is_busy());

        // Next submission is accepted.
        let outcome = session.submit("again").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.len().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_prior_history_is_sent_without_new_turn() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session_with(backend.clone()).with_greeting("Hello!");

        session.submit("one").await.unwrap();
        session.submit("two").await.unwrap();

        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen[0].0, 1);
        assert_eq!(seen[0].1, "one");
        assert_eq!(seen[1].0, 3);
        assert_eq!(seen[1].1, "two");
    }

    #[tokio::test]
    async fn test_greeting_opens_transcript() {
        let session = session_with(Arc::new(RecordingBackend::default())).with_greeting("Hi there");
        let messages = session.messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].text, "Hi there");

        let session = session_with(Arc::new(RecordingBackend::default())).with_greeting("  ");
        assert!(session.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_from_config_uses_greeting_and_apology() {
        let mut config = GeoguideConfig::default();
        config.chat.greeting = "Welcome".to_string();
        config.chat.apology_text = "Try later".to_string();

        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..RecordingBackend::default()
        });
        let session = ChatSession::from_config(backend, Arc::new(NoLocation), &config);
        assert_eq!(session.messages().unwrap()[0].text, "Welcome");

        let outcome = session.submit("x").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(ref m) if m.text == "Try later"));
    }

    #[tokio::test]
    async fn test_location_used_once_probe_connects() {
        let backend = Arc::new(RecordingBackend::default());
        let session = Arc::new(ChatSession::new(
            backend.clone(),
            Arc::new(FixedLocation(madrid())),
        ));
        assert_eq!(session.connection_state().unwrap(), ConnectionState::Connecting);

        session.submit("before").await.unwrap();

        let state = session.start_location_probe().await.unwrap().unwrap();
        assert_eq!(state, ConnectionState::Connected);

        session.submit("after").await.unwrap();

        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen[0].2, None);
        assert_eq!(seen[1].2, Some(madrid()));
    }

    #[tokio::test]
    async fn test_missing_location_degrades() {
        let backend = Arc::new(RecordingBackend::default());
        let session = ChatSession::new(backend.clone(), Arc::new(NoLocation));

        let state = session.probe_location().await.unwrap();
        assert_eq!(state, ConnectionState::Error);

        let outcome = session.submit("pizza").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Answered(_)));
        assert_eq!(backend.seen.lock().unwrap()[0].2, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_times_out_to_error() {
        let session = ChatSession::new(
            Arc::new(RecordingBackend::default()),
            Arc::new(SlowLocation),
        )
        .with_position_options(PositionOptions {
            timeout: Duration::from_secs(5),
            ..PositionOptions::default()
        });

        let state = session.probe_location().await.unwrap();
        assert_eq!(state, ConnectionState::Error);
        assert!(session.location().unwrap().coordinates().is_none());
    }

    #[tokio::test]
    async fn test_probe_transitions_only_once() {
        let session = ChatSession::new(
            Arc::new(RecordingBackend::default()),
            Arc::new(FixedLocation(madrid())),
        );
        assert_eq!(session.probe_location().await.unwrap(), ConnectionState::Connected);
        assert_eq!(session.probe_location().await.unwrap(), ConnectionState::Connected);
        assert_eq!(session.location().unwrap().coordinates(), Some(madrid()));
    }

    /// Answers with a fixed position and counts how often it is asked.
    struct CountingLocation(AtomicUsize);

    #[async_trait]
    impl LocationProvider for CountingLocation {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(madrid())
        }
    }

    #[tokio::test]
    async fn test_location_provider_asked_once() {
        let locator = Arc::new(CountingLocation(AtomicUsize::new(0)));
        let session = Arc::new(ChatSession::new(
            Arc::new(RecordingBackend::default()),
            locator.clone(),
        ));

        assert_eq!(session.probe_location().await.unwrap(), ConnectionState::Connected);
        assert_eq!(session.probe_location().await.unwrap(), ConnectionState::Connected);
        let state = session.start_location_probe().await.unwrap().unwrap();
        assert_eq!(state, ConnectionState::Connected);

        assert_eq!(locator.0.load(Ordering::SeqCst), 1);
        assert_eq!(session.location().unwrap().coordinates(), Some(madrid()));
    }

    #[tokio::test]
    async fn test_render_covers_transcript() {
        let session = session_with(Arc::new(RecordingBackend::default())).with_greeting("Hi");
        session.submit("tapas").await.unwrap();

        let views = session.render().unwrap();
        assert_eq!(views.len(), 3);
        assert!(views[1].place_cards.is_empty());
        assert_eq!(views[2].place_cards.len(), 1);
        assert_eq!(views[2].place_cards[0].title, "Cafe Uno");
    }
}
