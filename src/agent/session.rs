//! The Agent Loop
//!
//! `ChatSession` orchestrates one user turn: build the outbound request,
//! send it to the model, execute any requested tools locally, feed the
//! results back, and repeat until the model yields a final text answer.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CassiaConfig;
use crate::error::ModelError;
use crate::types::{
    ChatStatus, Content, ContentRole, FunctionResponse, GenerateRequest, GroundingMetadata,
    Message, ModelClient, Part,
};

use super::history::ConversationStore;
use super::system_prompt::build_system_instruction;
use super::tools::{execute_tool, select_tools};

/// Shown when the model finalizes with empty text.
pub const EMPTY_REPLY_FALLBACK: &str = "Não consegui ver isso agora. Tenta de novo?";

/// Shown by the presentation layer when a turn fails at the model boundary.
pub const TURN_FAILURE_FALLBACK: &str = "Eita, minha net oscilou. Manda de novo?";

/// One chat session: conversation state plus the model endpoint. Explicitly
/// constructed and owned by the caller; `&mut self` on [`send_message`]
/// keeps at most one turn in flight.
///
/// [`send_message`]: ChatSession::send_message
pub struct ChatSession {
    config: CassiaConfig,
    model: Arc<dyn ModelClient>,
    store: ConversationStore,
    location: Option<String>,
    status: ChatStatus,
}

impl ChatSession {
    pub fn new(config: CassiaConfig, model: Arc<dyn ModelClient>) -> Self {
        Self {
            config,
            model,
            store: ConversationStore::new(),
            location: None,
            status: ChatStatus::Idle,
        }
    }

    /// Attach the one-shot location annotation. Appended to every outbound
    /// user message for the rest of the session; never committed to history.
    pub fn set_location(&mut self, annotation: Option<String>) {
        self.location = annotation;
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    /// Append a presentation-only model message (greeting, failure fallback)
    /// to the transcript without touching the model context.
    pub fn push_local(&mut self, text: &str) {
        self.store.push_message(Message::model(text, None));
    }

    /// Run one full turn. On success the turn is committed (transcript and
    /// model context each gain exactly one user and one model entry) and the
    /// finalized reply is returned. On failure the model context is left
    /// exactly as it was; only the user's bubble remains in the transcript
    /// and the session enters the error status.
    pub async fn send_message(&mut self, text: &str) -> Result<Message, ModelError> {
        self.status = ChatStatus::Thinking;
        self.store.push_message(Message::user(text));

        match self.exchange(text).await {
            Ok((final_text, grounding)) => {
                let reply = Message::model(final_text, grounding);
                self.store.commit_turn(text, &reply.text);
                self.store.push_message(reply.clone());
                self.status = ChatStatus::Idle;
                Ok(reply)
            }
            Err(err) => {
                warn!(error = %err, "turn failed, conversation state not committed");
                self.status = ChatStatus::Error;
                Err(err)
            }
        }
    }

    /// The tool-dispatch loop for one turn. Returns the final text and any
    /// grounding metadata attached to the finalizing response.
    async fn exchange(
        &self,
        text: &str,
    ) -> Result<(String, Option<GroundingMetadata>), ModelError> {
        let tools = select_tools(text);
        let system_instruction = build_system_instruction();

        let outbound_text = match &self.location {
            Some(annotation) => format!("{text}\n\n[Contexto (Localização): {annotation}]"),
            None => text.to_string(),
        };

        let mut contents = self.store.context_window(self.config.history_window);
        contents.push(Content::user_text(outbound_text));

        info!(
            model = self.model.model_id(),
            search = tools.is_search(),
            history = contents.len() - 1,
            "sending turn"
        );

        let mut response = self
            .model
            .generate(GenerateRequest {
                contents: contents.clone(),
                tools: tools.clone(),
                system_instruction: system_instruction.clone(),
            })
            .await?;

        let mut rounds = 0;
        while !response.function_calls.is_empty() && rounds < self.config.max_tool_rounds {
            rounds += 1;

            let mut result_parts: Vec<Part> = Vec::new();
            for call in &response.function_calls {
                match execute_tool(&call.name) {
                    Some(payload) => {
                        debug!(tool = %call.name, "tool executed");
                        result_parts.push(Part::FunctionResponse(FunctionResponse {
                            name: call.name.clone(),
                            id: call.id.clone(),
                            response: serde_json::json!({ "result": payload }),
                        }));
                    }
                    None => {
                        warn!(tool = %call.name, "model requested unregistered tool, skipping");
                    }
                }
            }

            // No executable calls this round: finalize with whatever text the
            // model has already produced.
            if result_parts.is_empty() {
                break;
            }

            if let Some(model_content) = response.content.clone() {
                contents.push(model_content);
            }
            contents.push(Content {
                role: ContentRole::User,
                parts: result_parts,
            });

            response = self
                .model
                .generate(GenerateRequest {
                    contents: contents.clone(),
                    tools: tools.clone(),
                    system_instruction: system_instruction.clone(),
                })
                .await?;
        }

        if rounds == self.config.max_tool_rounds && !response.function_calls.is_empty() {
            warn!(rounds, "tool round cap reached, finalizing with current text");
        }

        debug!(
            prompt_tokens = response.usage.prompt_tokens,
            response_tokens = response.usage.response_tokens,
            rounds,
            "turn finalized"
        );

        let final_text = if response.text.trim().is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            response.text.clone()
        };

        Ok((final_text, response.grounding))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::types::{FunctionCall, ModelResponse, ToolSet};

    /// Scripted model: pops one canned result per request and records every
    /// request it receives.
    struct ScriptedModel {
        script: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedModel {
        fn new(script: Vec<Result<ModelResponse, ModelError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, index: usize) -> GenerateRequest {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate(&self, request: GenerateRequest) -> Result<ModelResponse, ModelError> {
            self.requests.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ModelError::EmptyResponse))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    fn text_response(text: &str) -> ModelResponse {
        ModelResponse {
            content: Some(Content::model_text(text)),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn tool_call_response(name: &str) -> ModelResponse {
        ModelResponse {
            content: Some(Content {
                role: ContentRole::Model,
                parts: vec![Part::FunctionCall(FunctionCall {
                    name: name.to_string(),
                    id: Some("call-1".to_string()),
                    args: serde_json::json!({ "check": "status" }),
                })],
            }),
            function_calls: vec![FunctionCall {
                name: name.to_string(),
                id: Some("call-1".to_string()),
                args: serde_json::json!({ "check": "status" }),
            }],
            ..Default::default()
        }
    }

    fn session_with(script: Vec<Result<ModelResponse, ModelError>>) -> (ChatSession, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel::new(script));
        let session = ChatSession::new(CassiaConfig::default(), model.clone());
        (session, model)
    }

    #[tokio::test]
    async fn plain_turn_commits_two_history_entries() {
        let (mut session, model) = session_with(vec![Ok(text_response(
            "Tem o Ibis da Torre Eiffel, tá saindo R$ 600 a diária.",
        ))]);

        let reply = session.send_message("Hotel em Paris?").await.unwrap();

        assert_eq!(model.request_count(), 1);
        assert!(model.request(0).tools.is_search());
        assert_eq!(session.store().history_len(), 2);
        assert_eq!(session.store().messages().len(), 2);
        assert!(reply.text.contains("Ibis"));
        assert_eq!(session.status(), ChatStatus::Idle);
    }

    #[tokio::test]
    async fn tool_round_feeds_result_back_and_still_commits_two_entries() {
        let (mut session, model) = session_with(vec![
            Ok(tool_call_response("get_balance")),
            Ok(text_response("Vi aqui, tem R$ 15.450 na conta.")),
        ]);

        let reply = session.send_message("Qual meu saldo?").await.unwrap();

        assert_eq!(model.request_count(), 2);
        // First request offers the balance declaration, not search.
        match model.request(0).tools {
            ToolSet::Declarations(ref decls) => assert_eq!(decls[0].name, "get_balance"),
            ToolSet::Search => panic!("finance turn must offer the balance tool"),
        }

        // Follow-up request ends with the synthetic tool-result turn.
        let follow_up = model.request(1);
        let last = follow_up.contents.last().unwrap();
        assert_eq!(last.role, ContentRole::User);
        match &last.parts[0] {
            Part::FunctionResponse(fr) => {
                assert_eq!(fr.name, "get_balance");
                assert_eq!(fr.id.as_deref(), Some("call-1"));
                assert_eq!(fr.response["result"]["amount"], 15450.75);
                assert_eq!(fr.response["result"]["currency"], "BRL");
            }
            other => panic!("expected function response part, got {other:?}"),
        }
        // The model's own tool-call content precedes the results.
        let prior = &follow_up.contents[follow_up.contents.len() - 2];
        assert_eq!(prior.role, ContentRole::Model);

        // Internal rounds never reach the committed history.
        assert_eq!(session.store().history_len(), 2);
        assert_eq!(reply.text, "Vi aqui, tem R$ 15.450 na conta.");
    }

    #[tokio::test]
    async fn unknown_tool_finalizes_early_without_follow_up() {
        let mut with_text = tool_call_response("transfer_funds");
        with_text.text = "Deixa eu ver...".to_string();
        let (mut session, model) = session_with(vec![Ok(with_text)]);

        let reply = session.send_message("Qual meu saldo?").await.unwrap();

        assert_eq!(model.request_count(), 1);
        assert_eq!(reply.text, "Deixa eu ver...");
        assert_eq!(session.store().history_len(), 2);
    }

    #[tokio::test]
    async fn failed_turn_leaves_history_untouched() {
        let (mut session, model) =
            session_with(vec![Err(ModelError::Api {
                status: 503,
                body: "overloaded".to_string(),
            })]);

        let err = session.send_message("Hotel em Paris?").await.unwrap_err();

        assert!(matches!(err, ModelError::Api { status: 503, .. }));
        assert_eq!(model.request_count(), 1);
        assert_eq!(session.store().history_len(), 0);
        // The user's bubble stays visible; the fallback is the caller's job.
        assert_eq!(session.store().messages().len(), 1);
        assert_eq!(session.status(), ChatStatus::Error);
    }

    #[tokio::test]
    async fn empty_final_text_becomes_the_apology_fallback() {
        let (mut session, _model) = session_with(vec![Ok(text_response("  "))]);

        let reply = session.send_message("Hotel em Paris?").await.unwrap();

        assert_eq!(reply.text, EMPTY_REPLY_FALLBACK);
    }

    #[tokio::test]
    async fn round_cap_bounds_the_tool_cycle() {
        let config = CassiaConfig::default();
        let cap = config.max_tool_rounds;
        let script: Vec<_> = (0..=cap)
            .map(|_| Ok(tool_call_response("get_balance")))
            .collect();
        let model = Arc::new(ScriptedModel::new(script));
        let mut session = ChatSession::new(config, model.clone());

        let reply = session.send_message("Qual meu saldo?").await.unwrap();

        // Initial request plus one per allowed round, then forced finalization.
        assert_eq!(model.request_count(), 1 + cap);
        assert_eq!(reply.text, EMPTY_REPLY_FALLBACK);
        assert_eq!(session.store().history_len(), 2);
    }

    #[tokio::test]
    async fn location_annotation_goes_on_the_wire_but_not_into_history() {
        let (mut session, model) = session_with(vec![
            Ok(text_response("Tem praia boa pertinho de você.")),
            Ok(text_response("Fechado.")),
        ]);
        session.set_location(Some(
            "Localização do usuário: Lat -23.55, Long -46.63".to_string(),
        ));

        session.send_message("Praia perto de mim?").await.unwrap();

        let sent = model.request(0);
        match &sent.contents.last().unwrap().parts[0] {
            Part::Text(t) => {
                assert!(t.starts_with("Praia perto de mim?"));
                assert!(t.contains("[Contexto (Localização): Localização do usuário"));
            }
            other => panic!("expected text part, got {other:?}"),
        }

        // The next turn's prior history carries the raw text only.
        session.send_message("E hotel?").await.unwrap();
        let second = model.request(1);
        match &second.contents[0].parts[0] {
            Part::Text(t) => assert_eq!(t, "Praia perto de mim?"),
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn system_instruction_rides_on_every_request() {
        let (mut session, model) = session_with(vec![
            Ok(tool_call_response("get_balance")),
            Ok(text_response("Vi aqui, tem R$ 15.450 na conta.")),
        ]);

        session.send_message("Qual meu saldo?").await.unwrap();

        for i in 0..model.request_count() {
            assert!(model.request(i).system_instruction.contains("Cassia"));
        }
    }
}
