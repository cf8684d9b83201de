use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use edutrack_core::assessment::{
    Advance, AssessmentSession, AssessmentSnapshot, AssessmentSummary, ExplanationRequest,
    ExplanationSource, ExplanationTicket, SubmitOutcome,
};
use edutrack_core::model::{Question, QuestionBank};
use edutrack_core::time::DEFAULT_ASSESSMENT_SECS;
use edutrack_core::{Countdown, InvalidStateError};

use super::timer::spawn_countdown;
use crate::gateway::ExplanationGateway;
use crate::text::ApiKey;

/// Knobs for one assessment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentSettings {
    pub duration_secs: u32,
    pub tick_period: Duration,
}

impl Default for AssessmentSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_ASSESSMENT_SECS,
            tick_period: Duration::from_secs(1),
        }
    }
}

/// Messages produced by the engine's background tasks.
#[derive(Debug)]
pub(crate) enum EngineMessage {
    Tick,
    Explanation {
        ticket: ExplanationTicket,
        text: String,
    },
}

/// A background completion applied to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Ticked { remaining_secs: u32 },
    ExplanationReady { ticket: ExplanationTicket },
}

/// Drives one `AssessmentSession` on the caller's task.
///
/// Explanation requests and the countdown run as separate tasks that only send
/// messages back; the session is mutated solely by `&mut self` methods. Dropping
/// the engine (or calling `teardown`) aborts those tasks, so a late result can
/// never reach a discarded session.
pub struct AssessmentEngine {
    session: AssessmentSession,
    gateway: ExplanationGateway,
    credential: Option<ApiKey>,
    tick_period: Duration,
    tx: UnboundedSender<EngineMessage>,
    rx: UnboundedReceiver<EngineMessage>,
    timer: Option<JoinHandle<()>>,
    inflight: Option<JoinHandle<()>>,
}

impl AssessmentEngine {
    /// Build an engine without starting the countdown.
    ///
    /// Explanations come from the service when `credential` is set, from the
    /// questions themselves otherwise.
    #[must_use]
    pub fn new(
        bank: Arc<QuestionBank>,
        gateway: ExplanationGateway,
        credential: Option<ApiKey>,
        settings: AssessmentSettings,
    ) -> Self {
        let source = if credential.is_some() {
            ExplanationSource::Remote
        } else {
            ExplanationSource::Local
        };
        let session = AssessmentSession::new(bank, source)
            .with_countdown(Countdown::new(settings.duration_secs));
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session,
            gateway,
            credential,
            tick_period: settings.tick_period,
            tx,
            rx,
            timer: None,
            inflight: None,
        }
    }

    /// Build an engine and start its countdown.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn start(
        bank: Arc<QuestionBank>,
        gateway: ExplanationGateway,
        credential: Option<ApiKey>,
        settings: AssessmentSettings,
    ) -> Self {
        let mut engine = Self::new(bank, gateway, credential, settings);
        engine.start_timer();
        engine
    }

    /// Start the countdown if it is not already running.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start_timer(&mut self) {
        if self.timer.is_some() || self.session.is_completed() || self.session.countdown().is_expired() {
            return;
        }
        self.timer = Some(spawn_countdown(self.tick_period, self.tx.clone()));
    }

    #[must_use]
    pub fn session(&self) -> &AssessmentSession {
        &self.session
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        self.session.current_question()
    }

    #[must_use]
    pub fn snapshot(&self) -> AssessmentSnapshot {
        self.session.snapshot()
    }

    #[must_use]
    pub fn summary(&self) -> AssessmentSummary {
        self.session.summary()
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.timer.is_some()
    }

    #[must_use]
    pub fn has_pending_explanation(&self) -> bool {
        self.inflight.is_some()
    }

    /// # Errors
    ///
    /// See [`AssessmentSession::select_option`].
    pub fn select_option(&mut self, index: usize) -> Result<(), InvalidStateError> {
        self.session.select_option(index)
    }

    /// Submit the selected option and, for a wrong answer with a credential,
    /// fire the explanation request.
    ///
    /// # Errors
    ///
    /// See [`AssessmentSession::submit`].
    ///
    /// # Panics
    ///
    /// Panics when a remote explanation is needed outside a tokio runtime.
    pub fn submit(&mut self) -> Result<SubmitOutcome, InvalidStateError> {
        let outcome = self.session.submit()?;
        debug!(
            question = %outcome.question_id,
            correct = outcome.correct,
            theta = self.session.theta(),
            "answer submitted"
        );
        if let Some(request) = outcome.explanation_request.clone() {
            self.spawn_explanation(request);
        }
        Ok(outcome)
    }

    /// Leave the submitted question. An explanation still in flight is dropped.
    ///
    /// # Errors
    ///
    /// See [`AssessmentSession::advance`].
    pub fn advance(&mut self) -> Result<Advance, InvalidStateError> {
        let advance = self.session.advance()?;
        self.cancel_inflight();
        if advance == Advance::Completed {
            self.stop_timer();
            info!(
                score = self.session.score(),
                theta = self.session.theta(),
                "assessment completed"
            );
        }
        Ok(advance)
    }

    /// Apply one elapsed time unit directly, without going through the timer.
    pub fn tick(&mut self) {
        self.session.tick();
        if self.session.countdown().is_expired() {
            self.stop_timer();
        }
    }

    /// Wait for the next background completion and apply it.
    ///
    /// Returns `None` once nothing can produce further events: the countdown is
    /// stopped and no explanation is in flight.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        loop {
            if self.timer.is_none() && self.inflight.is_none() {
                let message = self.rx.try_recv().ok()?;
                if let Some(event) = self.apply(message) {
                    return Some(event);
                }
                continue;
            }
            // The engine keeps a sender alive, so `recv` only yields `None` after teardown.
            let message = self.rx.recv().await?;
            if let Some(event) = self.apply(message) {
                return Some(event);
            }
        }
    }

    /// Apply every completion already queued, without waiting.
    pub fn drain_ready(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            if let Some(event) = self.apply(message) {
                events.push(event);
            }
        }
        events
    }

    /// Release the countdown and abandon any in-flight request.
    pub fn teardown(&mut self) {
        self.stop_timer();
        self.cancel_inflight();
        self.rx.close();
        // Completions already queued belong to the abandoned session.
        let mut discarded = 0_usize;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "dropped queued results on teardown");
        }
    }

    fn apply(&mut self, message: EngineMessage) -> Option<EngineEvent> {
        match message {
            EngineMessage::Tick => {
                if self.timer.is_none() {
                    return None;
                }
                self.tick();
                Some(EngineEvent::Ticked {
                    remaining_secs: self.session.remaining_secs(),
                })
            }
            EngineMessage::Explanation { ticket, text } => {
                match self.session.resolve_explanation(ticket, text) {
                    Ok(()) => {
                        self.inflight = None;
                        Some(EngineEvent::ExplanationReady { ticket })
                    }
                    Err(err) => {
                        debug!(%ticket, error = %err, "discarding explanation");
                        None
                    }
                }
            }
        }
    }

    fn spawn_explanation(&mut self, request: ExplanationRequest) {
        self.cancel_inflight();
        let gateway = self.gateway.clone();
        let credential = self.credential.clone();
        let tx = self.tx.clone();
        debug!(ticket = %request.ticket, "requesting explanation");
        self.inflight = Some(tokio::spawn(async move {
            let text = gateway
                .explain(
                    &request.question,
                    &request.chosen_answer,
                    &request.correct_answer,
                    credential.as_ref(),
                )
                .await;
            let _ = tx.send(EngineMessage::Explanation {
                ticket: request.ticket,
                text,
            });
        }));
    }

    fn cancel_inflight(&mut self) {
        if let Some(handle) = self.inflight.take() {
            handle.abort();
        }
    }

    fn stop_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for AssessmentEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for AssessmentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentEngine")
            .field("current", &self.session.current_index())
            .field("score", &self.session.score())
            .field("theta", &self.session.theta())
            .field("timer_running", &self.timer.is_some())
            .field("explanation_pending", &self.inflight.is_some())
            .finish_non_exhaustive()
    }
}
