#![forbid(unsafe_code)]

pub mod assessment;
pub mod error;
pub mod gateway;
pub mod text;
pub mod tutor;

pub use edutrack_core::Clock;

pub use assessment::{AssessmentEngine, AssessmentSettings, EngineEvent};
pub use error::{ChatServiceError, GenerationError, TutorError};
pub use gateway::{
    DEMO_CHAT_REPLY, DEMO_EXPLANATION, EXPLANATION_APOLOGY, ExplanationGateway,
    explanation_prompt,
};
pub use text::{
    ApiKey, GenerationRequest, GenerativeTextConfig, HttpTextGenerator, TextGenerator, Turn,
};
pub use tutor::{PendingChat, SUGGESTIONS, TUTOR_APOLOGY, TutorConversation};
