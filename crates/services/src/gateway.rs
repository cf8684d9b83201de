use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::ChatServiceError;
use crate::text::{
    ApiKey, GenerationRequest, GenerativeTextConfig, HttpTextGenerator, TextGenerator, Turn,
};

/// Returned by `explain` when no credential is configured.
pub const DEMO_EXPLANATION: &str = "Mode démo : L'explication n'est pas disponible sans clé API valide. En mode réel, Gemini analyserait votre erreur spécifiquement.";

/// Returned by `explain` when the service fails.
pub const EXPLANATION_APOLOGY: &str =
    "Désolé, je ne peux pas générer d'explication pour le moment.";

/// Returned by `chat` when no credential is configured.
pub const DEMO_CHAT_REPLY: &str = "Je suis EduTrack AI. En mode démo, je ne peux pas répondre dynamiquement, mais je suis conçu pour vous aider en Maths et Physique !";

/// System instruction for the tutor chat.
pub const TUTOR_PERSONA: &str = "Tu es EduTrack, un assistant pédagogique virtuel pour les élèves de Terminale au Bénin. Tu aides en Maths, Physique, SVT. Tu es patient, pédagogue, et tu donnes des exemples concrets. Tu connais le programme scolaire béninois.";

const DEFAULT_DEMO_DELAY: Duration = Duration::from_secs(1);

/// Adapter between the assessment/tutor flows and the generative-text service.
///
/// Holds no per-student state: callers pass the credential and the history on
/// every call.
#[derive(Clone)]
pub struct ExplanationGateway {
    generator: Arc<dyn TextGenerator>,
    demo_delay: Duration,
}

impl ExplanationGateway {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            demo_delay: DEFAULT_DEMO_DELAY,
        }
    }

    #[must_use]
    pub fn from_config(config: &GenerativeTextConfig) -> Self {
        Self::new(Arc::new(HttpTextGenerator::from_config(config)))
    }

    /// Delay applied before the demo chat reply.
    #[must_use]
    pub fn with_demo_delay(mut self, delay: Duration) -> Self {
        self.demo_delay = delay;
        self
    }

    /// Explain why `chosen_answer` is wrong.
    ///
    /// Never fails: without a credential the demo text is returned right away,
    /// and any service failure turns into `EXPLANATION_APOLOGY`.
    pub async fn explain(
        &self,
        question: &str,
        chosen_answer: &str,
        correct_answer: &str,
        credential: Option<&ApiKey>,
    ) -> String {
        let Some(credential) = credential else {
            return DEMO_EXPLANATION.to_string();
        };

        let prompt = explanation_prompt(question, chosen_answer, correct_answer);
        match self
            .generator
            .generate(credential, GenerationRequest::prompt(prompt))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("explanation service returned empty text");
                EXPLANATION_APOLOGY.to_string()
            }
            Err(err) => {
                warn!(error = %err, "explanation request failed");
                EXPLANATION_APOLOGY.to_string()
            }
        }
    }

    /// Send `message` to the tutor persona with the prior `history`.
    ///
    /// # Errors
    ///
    /// Returns `ChatServiceError` when the service fails; the caller is expected
    /// to show an apology instead of the reply.
    pub async fn chat(
        &self,
        history: &[Turn],
        message: &str,
        credential: Option<&ApiKey>,
    ) -> Result<String, ChatServiceError> {
        let Some(credential) = credential else {
            tokio::time::sleep(self.demo_delay).await;
            return Ok(DEMO_CHAT_REPLY.to_string());
        };

        let request = GenerationRequest {
            system_instruction: Some(TUTOR_PERSONA.to_string()),
            history: history.to_vec(),
            prompt: message.to_string(),
        };
        self.generator
            .generate(credential, request)
            .await
            .map_err(|err| {
                warn!(error = %err, "tutor chat request failed");
                ChatServiceError::from(err)
            })
    }
}

/// Prompt sent for one incorrect answer.
#[must_use]
pub fn explanation_prompt(question: &str, chosen_answer: &str, correct_answer: &str) -> String {
    format!(
        "Tu es un tuteur expert pour des lycéens au Bénin.\n\
         L'élève a répondu à cette question : \"{question}\".\n\
         Sa réponse : \"{chosen_answer}\".\n\
         La bonne réponse : \"{correct_answer}\".\n\
         \n\
         Explique brièvement (max 3 phrases) pourquoi sa réponse est incorrecte (si c'est le cas) \
         ou renforce le concept clé si c'est juste.\n\
         Sois encourageant."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_all_three_texts() {
        let prompt = explanation_prompt("La glycolyse se déroule dans :", "Le noyau", "Le hyaloplasme");
        assert!(prompt.contains("\"La glycolyse se déroule dans :\""));
        assert!(prompt.contains("Sa réponse : \"Le noyau\""));
        assert!(prompt.contains("La bonne réponse : \"Le hyaloplasme\""));
        assert!(prompt.contains("max 3 phrases"));
        assert!(prompt.contains("Sois encourageant."));
    }
}
