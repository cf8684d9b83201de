use tracing::{debug, warn};

use edutrack_core::Clock;
use edutrack_core::model::{ChatMessage, Student};

use crate::error::{ChatServiceError, TutorError};
use crate::gateway::ExplanationGateway;
use crate::text::{ApiKey, Turn};

/// Shown in place of the tutor's reply when the chat request fails.
pub const TUTOR_APOLOGY: &str =
    "Désolé, j'ai rencontré une erreur de connexion. Veuillez réessayer.";

/// Conversation starters offered under an empty input box.
pub const SUGGESTIONS: [&str; 4] = [
    "Explique-moi le Théorème de Thalès",
    "Quiz sur la chimie organique",
    "Méthode pour une dissertation philo",
    "Exercice de probabilité difficile",
];

#[must_use]
pub fn greeting(student: &Student) -> String {
    format!(
        "Bonjour {} ! Je suis ton tuteur EduTrack. Je peux t'aider à réviser, t'expliquer des exercices de Maths/Physique, ou te préparer pour le BAC. De quoi veux-tu parler aujourd'hui ?",
        student.name
    )
}

/// A message accepted by `begin`, waiting for the tutor's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChat {
    /// Transcript before the student's message.
    pub history: Vec<Turn>,
    pub message: String,
}

/// Transcript of one tutoring conversation.
///
/// The transcript lives here; the gateway sees it only as the history passed
/// with each request.
#[derive(Debug, Clone)]
pub struct TutorConversation {
    clock: Clock,
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl TutorConversation {
    #[must_use]
    pub fn new(student: &Student, clock: Clock) -> Self {
        Self {
            clock,
            messages: vec![ChatMessage::tutor(greeting(student), clock.now())],
            pending: false,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Record the student's message and return what must be sent.
    ///
    /// # Errors
    ///
    /// `TutorError::EmptyMessage` for blank input, `TutorError::Busy` while a
    /// reply is still pending.
    pub fn begin(&mut self, input: &str) -> Result<PendingChat, TutorError> {
        if input.trim().is_empty() {
            return Err(TutorError::EmptyMessage);
        }
        if self.pending {
            return Err(TutorError::Busy);
        }

        let history = self.messages.iter().map(Turn::from).collect();
        self.messages
            .push(ChatMessage::student(input, self.clock.now()));
        self.pending = true;
        Ok(PendingChat {
            history,
            message: input.to_string(),
        })
    }

    /// Append the tutor's reply, or the apology when the request failed.
    ///
    /// # Errors
    ///
    /// `TutorError::NotPending` when no message was started with `begin`.
    pub fn complete(
        &mut self,
        reply: Result<String, ChatServiceError>,
    ) -> Result<&ChatMessage, TutorError> {
        if !self.pending {
            return Err(TutorError::NotPending);
        }
        let text = match reply {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "tutor reply replaced by apology");
                TUTOR_APOLOGY.to_string()
            }
        };
        self.pending = false;
        self.messages.push(ChatMessage::tutor(text, self.clock.now()));
        self.messages.last().ok_or(TutorError::NotPending)
    }

    /// Give up on the pending reply. The student's message stays in the
    /// transcript and a new message may be started.
    ///
    /// # Errors
    ///
    /// `TutorError::NotPending` when no message was started with `begin`.
    pub fn abandon(&mut self) -> Result<(), TutorError> {
        if !self.pending {
            return Err(TutorError::NotPending);
        }
        self.pending = false;
        debug!("pending tutor reply abandoned");
        Ok(())
    }

    /// `begin`, ask the gateway, then `complete`.
    ///
    /// Dropping the returned future before it finishes abandons the reply.
    ///
    /// # Errors
    ///
    /// See [`TutorConversation::begin`]. Service failures are not errors here:
    /// they become the apology message.
    pub async fn send(
        &mut self,
        gateway: &ExplanationGateway,
        credential: Option<&ApiKey>,
        input: &str,
    ) -> Result<&ChatMessage, TutorError> {
        let pending = self.begin(input)?;
        let guard = PendingReply { convo: Some(self) };
        let reply = gateway
            .chat(&pending.history, &pending.message, credential)
            .await;
        guard.finish(reply)
    }
}

/// Clears the pending flag if `send` is cancelled mid-request.
struct PendingReply<'a> {
    convo: Option<&'a mut TutorConversation>,
}

impl<'a> PendingReply<'a> {
    fn finish(
        mut self,
        reply: Result<String, ChatServiceError>,
    ) -> Result<&'a ChatMessage, TutorError> {
        match self.convo.take() {
            Some(convo) => convo.complete(reply),
            None => Err(TutorError::NotPending),
        }
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if let Some(convo) = self.convo.take() {
            let _ = convo.abandon();
        }
    }
}
