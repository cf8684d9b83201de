use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use edutrack_core::model::{ChatRole, Student};
use edutrack_core::time::fixed_clock;
use services::{
    ApiKey, DEMO_CHAT_REPLY, ExplanationGateway, GenerationError, GenerationRequest,
    TUTOR_APOLOGY, TextGenerator, TutorConversation,
};

/// Echoes the prompt back and remembers how much history it was sent.
#[derive(Default)]
struct EchoGenerator {
    history_lens: Mutex<Vec<usize>>,
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(
        &self,
        _credential: &ApiKey,
        request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        self.history_lens.lock().unwrap().push(request.history.len());
        Ok(format!("echo: {}", request.prompt))
    }
}

struct BrokenGenerator;

struct HangingGenerator;

#[async_trait]
impl TextGenerator for HangingGenerator {
    async fn generate(
        &self,
        _credential: &ApiKey,
        _request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

#[async_trait]
impl TextGenerator for BrokenGenerator {
    async fn generate(
        &self,
        _credential: &ApiKey,
        _request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::EmptyResponse)
    }
}

#[tokio::test]
async fn conversation_grows_history_each_turn() {
    let generator = Arc::new(EchoGenerator::default());
    let gateway = ExplanationGateway::new(generator.clone());
    let key = ApiKey::new("k");
    let mut convo = TutorConversation::new(&Student::demo(), fixed_clock());

    let first = convo
        .send(&gateway, key.as_ref(), "Explique-moi le Théorème de Thalès")
        .await
        .unwrap();
    assert_eq!(first.text, "echo: Explique-moi le Théorème de Thalès");
    assert_eq!(first.role, ChatRole::Tutor);

    convo
        .send(&gateway, key.as_ref(), "Et la réciproque ?")
        .await
        .unwrap();

    assert_eq!(*generator.history_lens.lock().unwrap(), vec![1, 3]);
    let roles: Vec<ChatRole> = convo.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            ChatRole::Tutor,
            ChatRole::Student,
            ChatRole::Tutor,
            ChatRole::Student,
            ChatRole::Tutor,
        ]
    );
    assert!(!convo.is_loading());
}

#[tokio::test]
async fn failed_chat_shows_apology_in_transcript() {
    let gateway = ExplanationGateway::new(Arc::new(BrokenGenerator));
    let key = ApiKey::new("k");
    let mut convo = TutorConversation::new(&Student::demo(), fixed_clock());

    let reply = convo.send(&gateway, key.as_ref(), "Bonjour").await.unwrap();

    assert_eq!(reply.text, TUTOR_APOLOGY);
    assert_eq!(convo.messages().len(), 3);
    assert!(!convo.is_loading());
}

#[tokio::test]
async fn demo_mode_replies_with_canned_text() {
    let gateway = ExplanationGateway::new(Arc::new(BrokenGenerator)).with_demo_delay(Duration::ZERO);
    let mut convo = TutorConversation::new(&Student::demo(), fixed_clock());

    let reply = convo.send(&gateway, None, "Bonjour").await.unwrap();

    assert_eq!(reply.text, DEMO_CHAT_REPLY);
}

#[tokio::test(start_paused = true)]
async fn cancelled_send_does_not_block_the_next_message() {
    let key = ApiKey::new("k");
    let mut convo = TutorConversation::new(&Student::demo(), fixed_clock());

    let stuck = ExplanationGateway::new(Arc::new(HangingGenerator));
    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        convo.send(&stuck, key.as_ref(), "Bonjour"),
    )
    .await;
    assert!(outcome.is_err());
    assert!(!convo.is_loading());
    assert_eq!(convo.messages().len(), 2);

    let working = ExplanationGateway::new(Arc::new(EchoGenerator::default()));
    let reply = convo
        .send(&working, key.as_ref(), "encore")
        .await
        .unwrap();
    assert_eq!(reply.text, "echo: encore");
    assert_eq!(convo.messages().len(), 4);
}
