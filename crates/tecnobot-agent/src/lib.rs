//! # TecnoBot Agent
//! The conversation loop — one retrieval, one prompt, one completion per
//! user turn.
//!
//! Each turn runs: retrieve context (strategy per config) → assemble the
//! closed-book system prompt → send the bounded history to the provider →
//! record the answer. Retrieval is synchronous relative to the turn that
//! triggered it. A per-query retrieval failure degrades to an explicit
//! context-unavailable string instead of aborting the turn; loader and
//! index-build failures at construction time are fatal.

use std::sync::Arc;

use futures::StreamExt;

use tecnobot_core::TecnobotConfig;
use tecnobot_core::config::RetrievalStrategy;
use tecnobot_core::error::Result;
use tecnobot_core::traits::provider::GenerateParams;
use tecnobot_core::traits::{Provider, Retriever};
use tecnobot_core::types::Message;
use tecnobot_knowledge::KnowledgeEngine;
use tecnobot_knowledge::prompt;

/// First assistant message of every session.
pub const GREETING: &str =
    "¡Hola! Soy TecnoBot, el asistente virtual del Instituto 13 de Julio. ¿En qué puedo ayudarte?";

/// Injected when retrieval itself fails for a single query.
pub const CONTEXT_UNAVAILABLE: &str = "El contexto no está disponible en este momento.";

/// The TecnoBot agent — answers user messages grounded in the knowledge base.
pub struct Agent {
    config: TecnobotConfig,
    provider: Box<dyn Provider>,
    retriever: Box<dyn Retriever>,
    conversation: Vec<Message>,
}

impl Agent {
    /// Create an agent from configuration, loading the knowledge document
    /// from the configured path.
    pub async fn new(config: TecnobotConfig) -> Result<Self> {
        let engine = Arc::new(KnowledgeEngine::load(&config.knowledge.path)?);
        Self::with_engine(config, engine).await
    }

    /// Create an agent over an already-initialized knowledge engine.
    pub async fn with_engine(config: TecnobotConfig, engine: Arc<KnowledgeEngine>) -> Result<Self> {
        let provider = tecnobot_providers::create_provider(&config)?;
        let retriever = build_retriever(&config, &engine).await?;
        tracing::info!(
            "Agent ready: provider={}, retrieval={}",
            provider.name(),
            retriever.name()
        );
        Ok(Self::from_parts(config, provider, retriever))
    }

    fn from_parts(
        config: TecnobotConfig,
        provider: Box<dyn Provider>,
        retriever: Box<dyn Retriever>,
    ) -> Self {
        Self {
            config,
            provider,
            retriever,
            conversation: vec![Message::assistant(GREETING)],
        }
    }

    /// Process a user message with a blocking completion call.
    pub async fn process(&mut self, user_message: &str) -> Result<String> {
        let request = self.prepare_turn(user_message).await;
        let params = self.params();

        let response = self.provider.chat(&request, &params).await?;
        let content = response
            .content
            .unwrap_or_else(|| "No pude generar una respuesta.".into());
        self.conversation.push(Message::assistant(&content));
        Ok(content)
    }

    /// Process a user message with a streaming completion call, invoking
    /// `on_fragment` for each text fragment as it arrives.
    ///
    /// The fragment sequence is lazy, finite and non-restartable. If it
    /// terminates early — cancellation or transport loss — whatever arrived
    /// is treated as the final answer.
    pub async fn process_stream<F>(&mut self, user_message: &str, mut on_fragment: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let request = self.prepare_turn(user_message).await;
        let params = self.params();

        let mut stream = self.provider.chat_stream(&request, &params).await?;
        let mut answer = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    on_fragment(&fragment);
                    answer.push_str(&fragment);
                }
                Err(e) => {
                    tracing::warn!("Response stream ended early: {e}");
                    break;
                }
            }
        }

        self.conversation.push(Message::assistant(&answer));
        Ok(answer)
    }

    /// Retrieve context and build the upstream message list for one turn.
    async fn prepare_turn(&mut self, user_message: &str) -> Vec<Message> {
        let context = self.retrieve(user_message).await;
        let system_prompt = prompt::assemble(&context);
        self.conversation.push(Message::user(user_message));
        prompt::build_request(&system_prompt, &self.conversation)
    }

    /// Select context for the query, degrading per-query failures to an
    /// explicit unavailable marker rather than aborting the turn.
    async fn retrieve(&self, query: &str) -> String {
        match self.retriever.search(query).await {
            Ok(result) => {
                tracing::debug!(
                    "Retrieval ({}): matched={}, {} chars",
                    self.retriever.name(),
                    result.matched,
                    result.context.len()
                );
                result.context
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, answering without context: {e}");
                CONTEXT_UNAVAILABLE.to_string()
            }
        }
    }

    fn params(&self) -> GenerateParams {
        GenerateParams {
            model: self.config.default_model.clone(),
            temperature: self.config.default_temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Conversation history, greeting included.
    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    /// Reset the conversation to the initial greeting.
    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
        self.conversation.push(Message::assistant(GREETING));
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model_name(&self) -> &str {
        &self.config.default_model
    }
}

/// Build the retriever selected by configuration. Semantic retrieval embeds
/// the flattened corpus here; a failure at this point is fatal.
pub async fn build_retriever(
    config: &TecnobotConfig,
    engine: &Arc<KnowledgeEngine>,
) -> Result<Box<dyn Retriever>> {
    match config.retrieval.strategy {
        RetrievalStrategy::Keyword => Ok(Box::new(engine.keyword_retriever())),
        RetrievalStrategy::Semantic => {
            let embedder = tecnobot_providers::create_embedder(config)?;
            let retriever = engine
                .semantic_retriever(embedder, config.retrieval.top_k, config.retrieval.threshold)
                .await?;
            Ok(Box::new(retriever))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tecnobot_core::error::TecnobotError;
    use tecnobot_core::traits::provider::FragmentStream;
    use tecnobot_core::traits::RetrievalResult;
    use tecnobot_core::types::{ModelInfo, ProviderResponse, Role};
    use tecnobot_knowledge::KnowledgeDocument;

    type RequestLog = Arc<std::sync::Mutex<Vec<Message>>>;

    /// Records the last request; replies with a fixed answer and a canned
    /// fragment stream.
    struct StubProvider {
        last_request: RequestLog,
        fragments: Vec<Result<String>>,
    }

    impl StubProvider {
        fn new(fragments: Vec<Result<String>>) -> Self {
            Self {
                last_request: RequestLog::default(),
                fragments,
            }
        }

        fn with_log(log: RequestLog, fragments: Vec<Result<String>>) -> Self {
            Self {
                last_request: log,
                fragments,
            }
        }
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn chat(
            &self,
            messages: &[Message],
            _params: &GenerateParams,
        ) -> Result<ProviderResponse> {
            *self.last_request.lock().unwrap() = messages.to_vec();
            Ok(ProviderResponse {
                content: Some("respuesta".into()),
                finish_reason: Some("stop".into()),
                usage: None,
            })
        }

        async fn chat_stream(
            &self,
            messages: &[Message],
            _params: &GenerateParams,
        ) -> Result<FragmentStream> {
            *self.last_request.lock().unwrap() = messages.to_vec();
            let items: Vec<Result<String>> = self
                .fragments
                .iter()
                .map(|r| match r {
                    Ok(s) => Ok(s.clone()),
                    Err(e) => Err(TecnobotError::Stream(e.to_string())),
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(vec![])
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    /// Always fails, as an embedding-down retrieval would.
    struct DownRetriever;

    #[async_trait]
    impl Retriever for DownRetriever {
        fn name(&self) -> &str {
            "down"
        }

        async fn search(&self, _query: &str) -> Result<RetrievalResult> {
            Err(TecnobotError::EmbeddingUnavailable("boom".into()))
        }
    }

    fn keyword_agent(fragments: Vec<Result<String>>) -> Agent {
        let doc = KnowledgeDocument::from_json(
            r#"{"horarios": {"content": "Las clases son de 8 a 13hs.", "keywords": ["horario"]}}"#,
        )
        .unwrap();
        let engine = KnowledgeEngine::new(doc);
        Agent::from_parts(
            TecnobotConfig::default(),
            Box::new(StubProvider::new(fragments)),
            Box::new(engine.keyword_retriever()),
        )
    }

    #[tokio::test]
    async fn test_process_injects_context_and_records_answer() {
        let mut agent = keyword_agent(vec![]);
        let answer = agent.process("¿cuál es el horario?").await.unwrap();
        assert_eq!(answer, "respuesta");

        // greeting + user + assistant
        assert_eq!(agent.conversation().len(), 3);
        assert_eq!(agent.conversation()[1].role, Role::User);
        assert_eq!(agent.conversation()[2].content, "respuesta");
    }

    #[tokio::test]
    async fn test_request_has_one_system_message_with_context() {
        let doc = KnowledgeDocument::from_json(
            r#"{"horarios": {"content": "Las clases son de 8 a 13hs.", "keywords": ["horario"]}}"#,
        )
        .unwrap();
        let engine = KnowledgeEngine::new(doc);
        let log = RequestLog::default();
        let mut agent = Agent::from_parts(
            TecnobotConfig::default(),
            Box::new(StubProvider::with_log(log.clone(), vec![])),
            Box::new(engine.keyword_retriever()),
        );

        agent.process("¿cuál es el horario?").await.unwrap();

        let request = log.lock().unwrap().clone();
        let systems: Vec<&Message> =
            request.iter().filter(|m| m.role == Role::System).collect();
        assert_eq!(systems.len(), 1);
        assert!(systems[0].content.contains("CONTEXTO RELEVANTE:"));
        assert!(systems[0].content.contains("Las clases son de 8 a 13hs."));
    }

    #[tokio::test]
    async fn test_stream_concatenates_fragments_in_order() {
        let mut agent = keyword_agent(vec![
            Ok("Las clases ".into()),
            Ok("son de 8 ".into()),
            Ok("a 13hs.".into()),
        ]);

        let mut seen = Vec::new();
        let answer = agent
            .process_stream("¿horario?", |f| seen.push(f.to_string()))
            .await
            .unwrap();

        assert_eq!(answer, "Las clases son de 8 a 13hs.");
        assert_eq!(seen.len(), 3);
        assert_eq!(agent.conversation().last().unwrap().content, answer);
    }

    #[tokio::test]
    async fn test_stream_early_termination_keeps_partial_answer() {
        let mut agent = keyword_agent(vec![
            Ok("Las clases".into()),
            Err(TecnobotError::Stream("connection reset".into())),
            Ok("nunca llega".into()),
        ]);

        let answer = agent.process_stream("¿horario?", |_| {}).await.unwrap();

        // fragments after the break are not consumed
        assert_eq!(answer, "Las clases");
        assert_eq!(agent.conversation().last().unwrap().content, "Las clases");
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades_to_unavailable_context() {
        let mut agent = Agent::from_parts(
            TecnobotConfig::default(),
            Box::new(StubProvider::new(vec![])),
            Box::new(DownRetriever),
        );

        // the turn completes; the failure never aborts the conversation
        let answer = agent.process("¿horario?").await.unwrap();
        assert_eq!(answer, "respuesta");
    }

    #[tokio::test]
    async fn test_clear_conversation_keeps_greeting() {
        let mut agent = keyword_agent(vec![]);
        agent.process("hola").await.unwrap();
        agent.clear_conversation();
        assert_eq!(agent.conversation().len(), 1);
        assert_eq!(agent.conversation()[0].content, GREETING);
    }
}
