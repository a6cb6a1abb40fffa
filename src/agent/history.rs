//! Conversation Store
//!
//! Holds the visible transcript and the mirrored model-context history for
//! one session, in process memory. Committed turns append to both in
//! lockstep; presentation-only messages (greeting, failure fallback) reach
//! the transcript but never the model context.

use crate::types::{Content, Message};

#[derive(Default)]
pub struct ConversationStore {
    /// Everything the user sees, in order. Never truncated within a session.
    messages: Vec<Message>,
    /// Committed (user, model) wire content, the source for the context
    /// window sent to the model.
    history: Vec<Content>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Append a transcript-only message. Used for the greeting and for the
    /// fallback shown on a failed turn; the model context is untouched.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Commit one finalized turn to the model context: exactly one user entry
    /// and one model entry, in order. The raw user text is committed, not the
    /// location-annotated variant sent on the wire.
    pub fn commit_turn(&mut self, user_text: &str, model_text: &str) {
        self.history.push(Content::user_text(user_text));
        self.history.push(Content::model_text(model_text));
    }

    /// The prior history to send with the next request: a sliding window of
    /// the most recent `window` entries. The transcript itself is unbounded;
    /// only the outbound context is capped.
    pub fn context_window(&self, window: usize) -> Vec<Content> {
        let start = self.history.len().saturating_sub(window);
        self.history[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentRole, MessageRole, Part};

    #[test]
    fn commit_turn_appends_exactly_two_history_entries() {
        let mut store = ConversationStore::new();
        store.commit_turn("Qual meu saldo?", "Vi aqui, tem R$ 15.450 na conta.");
        assert_eq!(store.history_len(), 2);

        let window = store.context_window(10);
        assert_eq!(window[0].role, ContentRole::User);
        assert_eq!(window[1].role, ContentRole::Model);
        match &window[0].parts[0] {
            Part::Text(t) => assert_eq!(t, "Qual meu saldo?"),
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn transcript_only_messages_do_not_touch_history() {
        let mut store = ConversationStore::new();
        store.push_message(Message::model("Oi! Sou a Cassia, da TravelCash.", None));
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].role, MessageRole::Model);
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn context_window_keeps_most_recent_entries() {
        let mut store = ConversationStore::new();
        for i in 0..5 {
            store.commit_turn(&format!("pergunta {i}"), &format!("resposta {i}"));
        }
        assert_eq!(store.history_len(), 10);

        let window = store.context_window(4);
        assert_eq!(window.len(), 4);
        match &window[0].parts[0] {
            Part::Text(t) => assert_eq!(t, "pergunta 3"),
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn context_window_larger_than_history_returns_everything() {
        let mut store = ConversationStore::new();
        store.commit_turn("oi", "olá");
        assert_eq!(store.context_window(40).len(), 2);
    }
}
