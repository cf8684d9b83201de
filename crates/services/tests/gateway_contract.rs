use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use edutrack_core::model::ChatRole;
use services::{
    ApiKey, ChatServiceError, DEMO_CHAT_REPLY, DEMO_EXPLANATION, EXPLANATION_APOLOGY,
    ExplanationGateway, GenerationError, GenerationRequest, TextGenerator, Turn,
};

enum Reply {
    Text(&'static str),
    Empty,
    ServerError,
    Hang,
}

struct FakeGenerator {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl FakeGenerator {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(
        &self,
        _credential: &ApiKey,
        request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        match self.reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Empty => Err(GenerationError::EmptyResponse),
            Reply::ServerError => Err(GenerationError::HttpStatus(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            )),
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn key() -> ApiKey {
    ApiKey::new("test-key").unwrap()
}

#[tokio::test]
async fn explain_without_credential_never_calls_the_service() {
    let generator = FakeGenerator::new(Reply::Hang);
    let gateway = ExplanationGateway::new(generator.clone());

    let text = tokio::time::timeout(
        Duration::from_millis(50),
        gateway.explain("Q", "faux", "vrai", None),
    )
    .await
    .expect("demo explanation returns immediately");

    assert_eq!(text, DEMO_EXPLANATION);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn explain_returns_service_text() {
    let generator = FakeGenerator::new(Reply::Text("Z = R à la résonance."));
    let gateway = ExplanationGateway::new(generator.clone());

    let text = gateway
        .explain("Impédance ?", "Maximale", "Minimale et égale à R", Some(&key()))
        .await;

    assert_eq!(text, "Z = R à la résonance.");
    let request = generator.last_request.lock().unwrap().clone().unwrap();
    assert!(request.system_instruction.is_none());
    assert!(request.history.is_empty());
    assert!(request.prompt.contains("\"Maximale\""));
    assert!(request.prompt.contains("\"Minimale et égale à R\""));
}

#[tokio::test]
async fn explain_swallows_service_failure() {
    let gateway = ExplanationGateway::new(FakeGenerator::new(Reply::ServerError));
    let text = gateway.explain("Q", "a", "b", Some(&key())).await;
    assert_eq!(text, EXPLANATION_APOLOGY);
}

#[tokio::test]
async fn explain_treats_blank_text_as_failure() {
    let gateway = ExplanationGateway::new(FakeGenerator::new(Reply::Text("   ")));
    let text = gateway.explain("Q", "a", "b", Some(&key())).await;
    assert_eq!(text, EXPLANATION_APOLOGY);

    let gateway = ExplanationGateway::new(FakeGenerator::new(Reply::Empty));
    let text = gateway.explain("Q", "a", "b", Some(&key())).await;
    assert_eq!(text, EXPLANATION_APOLOGY);
}

#[tokio::test(start_paused = true)]
async fn chat_without_credential_waits_then_returns_demo_reply() {
    let generator = FakeGenerator::new(Reply::Hang);
    let gateway = ExplanationGateway::new(generator.clone());
    let started = tokio::time::Instant::now();

    let reply = gateway.chat(&[], "Bonjour", None).await.unwrap();

    assert_eq!(reply, DEMO_CHAT_REPLY);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn chat_forwards_persona_and_history() {
    let generator = FakeGenerator::new(Reply::Text("Voici le théorème."));
    let gateway = ExplanationGateway::new(generator.clone());
    let history = vec![
        Turn::new(ChatRole::Tutor, "Bonjour !"),
        Turn::new(ChatRole::Student, "Salut"),
    ];

    let reply = gateway
        .chat(&history, "Explique Thalès", Some(&key()))
        .await
        .unwrap();

    assert_eq!(reply, "Voici le théorème.");
    let request = generator.last_request.lock().unwrap().clone().unwrap();
    assert!(request.system_instruction.unwrap().starts_with("Tu es EduTrack"));
    assert_eq!(request.history, history);
    assert_eq!(request.prompt, "Explique Thalès");
}

#[tokio::test]
async fn chat_propagates_service_failure() {
    let gateway = ExplanationGateway::new(FakeGenerator::new(Reply::ServerError));
    let err = gateway.chat(&[], "Bonjour", Some(&key())).await.unwrap_err();
    assert!(matches!(
        err,
        ChatServiceError::Generation(GenerationError::HttpStatus(status))
            if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
    ));
}
