//! Mock implementations for testing
//!
//! These mocks let whole turns run without a real assistant service.

use crate::remote::{AssistantBackend, MarkedCard, PreprocessVerdict, RemoteError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Backend
// ============================================================================

/// Which endpoint a recorded call hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Preprocess(String),
    Generate(String),
}

/// Back-end that answers from queued results
#[derive(Default)]
pub struct MockBackend {
    verdicts: Mutex<VecDeque<Result<PreprocessVerdict, RemoteError>>>,
    replies: Mutex<VecDeque<Result<String, RemoteError>>>,
    cards: Mutex<Vec<MarkedCard>>,
    /// Record of all calls made, in order
    pub calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_verdict(&self, verdict: PreprocessVerdict) {
        self.verdicts.lock().unwrap().push_back(Ok(verdict));
    }

    pub fn queue_preprocess_error(&self, error: RemoteError) {
        self.verdicts.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn queue_generate_error(&self, error: RemoteError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn set_cards(&self, cards: Vec<MarkedCard>) {
        *self.cards.lock().unwrap() = cards;
    }

    pub fn recorded_calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> usize {
        self.recorded_calls()
            .iter()
            .filter(|c| matches!(c, Call::Generate(_)))
            .count()
    }
}

#[async_trait]
impl AssistantBackend for MockBackend {
    async fn preprocess(&self, prompt: &str) -> Result<PreprocessVerdict, RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Preprocess(prompt.to_string()));
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::network("No mock verdict queued")))
    }

    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Generate(prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::network("No mock reply queued")))
    }

    async fn export_cards(&self) -> Result<Vec<MarkedCard>, RemoteError> {
        Ok(self.cards.lock().unwrap().clone())
    }

    async fn export_pdf(&self) -> Result<Vec<u8>, RemoteError> {
        Ok(b"%PDF-1.4 mock".to_vec())
    }
}

// ============================================================================
// Delayed Mock Backend (for overlap testing)
// ============================================================================

/// Back-end whose preprocess call waits before answering
pub struct DelayedMockBackend {
    inner: MockBackend,
    delay: Duration,
    /// Notified when a preprocess request starts
    pub request_started: Arc<Notify>,
}

impl DelayedMockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockBackend::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn inner(&self) -> &MockBackend {
        &self.inner
    }
}

#[async_trait]
impl AssistantBackend for DelayedMockBackend {
    async fn preprocess(&self, prompt: &str) -> Result<PreprocessVerdict, RemoteError> {
        // notify_one keeps a permit if nobody is waiting yet
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.preprocess(prompt).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        self.inner.generate(prompt).await
    }

    async fn export_cards(&self) -> Result<Vec<MarkedCard>, RemoteError> {
        self.inner.export_cards().await
    }

    async fn export_pdf(&self) -> Result<Vec<u8>, RemoteError> {
        self.inner.export_pdf().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatEvent, ChatStore, Message, Sender};
    use crate::kv::KvStore;
    use crate::runtime::{ChatService, IgnoreReason, SendOutcome};
    use crate::settings::{SettingsStore, Theme};
    use crate::workflow::TurnOutcome;

    fn service<B: AssistantBackend + 'static>(backend: B) -> ChatService<B> {
        let kv = KvStore::open_in_memory().unwrap();
        let store = ChatStore::load(kv.clone()).unwrap();
        let settings = SettingsStore::load(kv, Theme::Light)
            .unwrap()
            .with_events(store.event_sender());
        ChatService::new(store, settings, backend)
    }

    fn log(messages: &[Message]) -> Vec<(Sender, &str)> {
        messages
            .iter()
            .map(|m| (m.sender, m.content.as_str()))
            .collect()
    }

    fn pass(prompt: &str) -> PreprocessVerdict {
        PreprocessVerdict::Pass {
            original_prompt: Some(prompt.to_string()),
        }
    }

    #[tokio::test]
    async fn test_pass_then_generate() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(pass("cleaned prompt"));
        mock.queue_reply("Here you go");

        let svc = service(Arc::clone(&mock));
        let outcome = svc.send_message("raw prompt").await;
        assert_eq!(outcome, SendOutcome::Completed(TurnOutcome::Generated));

        let messages = svc.store().messages().unwrap();
        assert_eq!(
            log(&messages),
            vec![(Sender::User, "raw prompt"), (Sender::Assistant, "Here you go")]
        );
        assert_eq!(
            mock.recorded_calls(),
            vec![
                Call::Preprocess("raw prompt".to_string()),
                Call::Generate("cleaned prompt".to_string()),
            ]
        );
        assert!(!svc.is_busy("1"));
    }

    #[tokio::test]
    async fn test_user_message_recorded_even_when_everything_fails() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_preprocess_error(RemoteError::network("connection refused"));

        let svc = service(Arc::clone(&mock));
        let outcome = svc.send_message("hello").await;
        assert_eq!(outcome, SendOutcome::Completed(TurnOutcome::PreprocessFailed));

        let messages = svc.store().messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(log(&messages)[0], (Sender::User, "hello"));
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert!(messages[1]
            .content
            .starts_with("Sorry, I couldn't process your message"));
        assert!(messages[1].content.contains("connection refused"));
        assert_eq!(mock.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_user_message_visible_before_network_call() {
        let mock = Arc::new(MockBackend::new());
        let svc = service(Arc::clone(&mock));

        let turn = svc.begin_turn("first").unwrap();
        assert_eq!(turn.conversation_id(), "1");
        assert_eq!(log(&svc.store().messages().unwrap()), vec![(Sender::User, "first")]);
        assert!(mock.recorded_calls().is_empty());

        // Nothing queued: preprocess fails, the turn still completes
        assert_eq!(turn.run().await, TurnOutcome::PreprocessFailed);
    }

    #[tokio::test]
    async fn test_blank_input_is_a_no_op() {
        let mock = Arc::new(MockBackend::new());
        let svc = service(Arc::clone(&mock));
        let mut rx = svc.store().subscribe();

        for text in ["", "   ", "\n\t "] {
            assert_eq!(
                svc.send_message(text).await,
                SendOutcome::Ignored(IgnoreReason::EmptyInput)
            );
        }

        assert!(svc.store().messages().unwrap().is_empty());
        assert!(mock.recorded_calls().is_empty());
        assert!(rx.try_recv().is_err());
        assert!(!svc.is_busy("1"));
    }

    #[tokio::test]
    async fn test_raw_text_is_kept_untrimmed() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(PreprocessVerdict::Reject { message: None });

        let svc = service(Arc::clone(&mock));
        svc.send_message("  padded  ").await;

        assert_eq!(svc.store().messages().unwrap()[0].content, "  padded  ");
        assert_eq!(
            mock.recorded_calls(),
            vec![Call::Preprocess("  padded  ".to_string())]
        );
    }

    #[tokio::test]
    async fn test_second_send_refused_while_turn_in_flight() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(pass("one"));
        mock.queue_reply("reply one");
        mock.queue_verdict(pass("two"));
        mock.queue_reply("reply two");

        let svc = service(Arc::clone(&mock));
        let turn = svc.begin_turn("one").unwrap();
        assert!(svc.is_busy("1"));

        assert_eq!(
            svc.send_message("two").await,
            SendOutcome::Ignored(IgnoreReason::TurnInProgress)
        );
        assert_eq!(svc.store().messages().unwrap().len(), 1);

        assert_eq!(turn.run().await, TurnOutcome::Generated);
        assert!(!svc.is_busy("1"));

        assert_eq!(
            svc.send_message("two").await,
            SendOutcome::Completed(TurnOutcome::Generated)
        );
        let messages = svc.store().messages().unwrap();
        assert_eq!(
            log(&messages),
            vec![
                (Sender::User, "one"),
                (Sender::Assistant, "reply one"),
                (Sender::User, "two"),
                (Sender::Assistant, "reply two"),
            ]
        );
    }

    #[tokio::test]
    async fn test_guard_held_across_slow_preprocess() {
        let backend = Arc::new(DelayedMockBackend::new(Duration::from_millis(50)));
        backend.inner().queue_verdict(PreprocessVerdict::Reject {
            message: Some("no".to_string()),
        });

        let svc = service(Arc::clone(&backend));
        let turn = svc.begin_turn("slow").unwrap();
        let handle = tokio::spawn(turn.run());

        backend.request_started.notified().await;
        assert!(svc.is_busy("1"));
        assert_eq!(
            svc.send_message("again").await,
            SendOutcome::Ignored(IgnoreReason::TurnInProgress)
        );

        assert_eq!(handle.await.unwrap(), TurnOutcome::Rejected);
        assert!(!svc.is_busy("1"));
    }

    #[tokio::test]
    async fn test_reject_shows_one_message_and_skips_generate() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(PreprocessVerdict::Reject {
            message: Some("I can't help with that.".to_string()),
        });

        let svc = service(Arc::clone(&mock));
        let outcome = svc.send_message("bad request").await;
        assert_eq!(outcome, SendOutcome::Completed(TurnOutcome::Rejected));

        assert_eq!(
            log(&svc.store().messages().unwrap()),
            vec![
                (Sender::User, "bad request"),
                (Sender::Assistant, "I can't help with that."),
            ]
        );
        assert_eq!(mock.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_failure_shows_error_not_reply() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(pass("p"));
        mock.queue_generate_error(RemoteError::status(503, Some("overloaded".to_string())));

        let svc = service(Arc::clone(&mock));
        let outcome = svc.send_message("q").await;
        assert_eq!(outcome, SendOutcome::Completed(TurnOutcome::GenerateFailed));

        let messages = svc.store().messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[1]
            .content
            .starts_with("Sorry, I couldn't generate a response"));
        assert!(messages[1].content.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_inform_and_pass_shows_note_then_reply() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(PreprocessVerdict::InformAndPass {
            message: Some("Note: rephrased".to_string()),
            original_prompt: Some("better prompt".to_string()),
        });
        mock.queue_reply("Answer");

        let svc = service(Arc::clone(&mock))
            .with_delays(Duration::from_millis(5), Duration::from_millis(5));
        let outcome = svc.send_message("prompt").await;
        assert_eq!(outcome, SendOutcome::Completed(TurnOutcome::Generated));

        assert_eq!(
            log(&svc.store().messages().unwrap()),
            vec![
                (Sender::User, "prompt"),
                (Sender::Assistant, "Note: rephrased"),
                (Sender::Assistant, "Answer"),
            ]
        );
        assert_eq!(mock.recorded_calls()[1], Call::Generate("better prompt".to_string()));
    }

    #[tokio::test]
    async fn test_pass_without_prompt_ends_quietly() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(PreprocessVerdict::Pass {
            original_prompt: None,
        });

        let svc = service(Arc::clone(&mock));
        assert_eq!(
            svc.send_message("hi").await,
            SendOutcome::Completed(TurnOutcome::NoPrompt)
        );
        assert_eq!(svc.store().messages().unwrap().len(), 1);
        assert_eq!(mock.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_active_conversation_is_ignored() {
        let kv = KvStore::open_in_memory().unwrap();
        kv.set(
            crate::chat::ACTIVE_CONVERSATION_KEY,
            &Option::<String>::None,
        )
        .unwrap();
        let store = ChatStore::load(kv.clone()).unwrap();
        let settings = SettingsStore::load(kv, Theme::Light).unwrap();
        let mock = Arc::new(MockBackend::new());
        let svc = ChatService::new(store, settings, Arc::clone(&mock));

        assert_eq!(
            svc.send_message("hello").await,
            SendOutcome::Ignored(IgnoreReason::NoActiveConversation)
        );
        assert!(mock.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn test_reply_lands_in_original_conversation_after_switch() {
        let backend = Arc::new(DelayedMockBackend::new(Duration::from_millis(50)));
        backend.inner().queue_verdict(pass("p"));
        backend.inner().queue_reply("late reply");

        let svc = service(Arc::clone(&backend));
        let turn = svc.begin_turn("question").unwrap();
        let handle = tokio::spawn(turn.run());

        backend.request_started.notified().await;
        svc.store().set_active_conversation("2").unwrap();

        assert_eq!(handle.await.unwrap(), TurnOutcome::Generated);

        assert!(svc.store().messages().unwrap().is_empty());
        assert_eq!(
            log(&svc.store().messages_for("1").unwrap()),
            vec![(Sender::User, "question"), (Sender::Assistant, "late reply")]
        );
        let conv1 = svc
            .store()
            .conversations()
            .unwrap()
            .into_iter()
            .find(|c| c.id == "1")
            .unwrap();
        assert!(conv1.unread);

        svc.store().set_active_conversation("1").unwrap();
        assert_eq!(svc.store().messages().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_conversations_do_not_block_each_other() {
        let backend = Arc::new(DelayedMockBackend::new(Duration::from_millis(50)));
        backend.inner().queue_verdict(PreprocessVerdict::Reject { message: None });
        backend.inner().queue_verdict(PreprocessVerdict::Reject { message: None });

        let svc = service(Arc::clone(&backend));
        let first = svc.begin_turn("in one").unwrap();
        let first = tokio::spawn(first.run());
        backend.request_started.notified().await;

        svc.store().set_active_conversation("3").unwrap();
        let second = svc.begin_turn("in three").unwrap();
        assert_eq!(second.conversation_id(), "3");
        assert!(svc.is_busy("1"));
        assert!(svc.is_busy("3"));

        assert_eq!(second.run().await, TurnOutcome::Rejected);
        assert_eq!(first.await.unwrap(), TurnOutcome::Rejected);
        assert!(!svc.is_busy("1"));
        assert!(!svc.is_busy("3"));
    }

    #[tokio::test]
    async fn test_turn_finished_is_broadcast() {
        let mock = Arc::new(MockBackend::new());
        mock.queue_verdict(pass("p"));
        mock.queue_reply("r");

        let svc = service(Arc::clone(&mock));
        let mut rx = svc.store().subscribe();
        svc.send_message("q").await;

        let mut finished = None;
        while let Ok(event) = rx.try_recv() {
            if let ChatEvent::TurnFinished {
                conversation_id,
                outcome,
            } = event
            {
                finished = Some((conversation_id, outcome));
            }
        }
        assert_eq!(finished, Some(("1".to_string(), "generated".to_string())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_guard_released_before_turn_finished_is_seen() {
        let mock = Arc::new(MockBackend::new());
        let svc = service(Arc::clone(&mock));

        for _ in 0..200 {
            mock.queue_verdict(PreprocessVerdict::Reject { message: None });
            let mut rx = svc.store().subscribe();
            let turn = svc.begin_turn("again").unwrap();
            let handle = tokio::spawn(turn.run());

            loop {
                if let ChatEvent::TurnFinished { .. } = rx.recv().await.unwrap() {
                    break;
                }
            }
            assert!(!svc.is_busy("1"));
            assert_eq!(handle.await.unwrap(), TurnOutcome::Rejected);
        }
    }
}
