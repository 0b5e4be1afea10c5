//! # Interview Runner
//!
//! The body of the interview task is pluggable: anything implementing
//! [`InterviewRunner`] can drive the phases. It receives an [`Interview`],
//! which is the only way for the task to talk to the client, wait for the
//! candidate and record results.

use crate::error::InterviewError;
use crate::interview::handle::InterviewHandle;
use crate::interview::phase::{Phase, PhaseResults};
use crate::interview::session::InterviewSession;
use crate::protocol::{Outbound, ServerMessage};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait InterviewRunner: Send + Sync {
    /// Run one interview to completion.
    ///
    /// Returning `Err(InterviewError::Stopped)` is the normal way to end when
    /// the session asks to stop; any other error is logged by the coordinator.
    async fn conduct(&self, interview: &Interview) -> Result<(), InterviewError>;
}

/// Everything the running interview task may touch.
pub struct Interview {
    session: Arc<InterviewSession>,
    handle: Arc<InterviewHandle>,
    outbound: Outbound,
}

impl Interview {
    pub(crate) fn new(session: Arc<InterviewSession>, handle: Arc<InterviewHandle>, outbound: Outbound) -> Self {
        Self { session, handle, outbound }
    }

    pub fn candidate_text(&self) -> String {
        self.session.candidate_text()
    }

    pub fn job_description(&self) -> String {
        self.session.job_description()
    }

    pub fn results(&self) -> PhaseResults {
        self.session.results()
    }

    /// Send a message to the client. A closed connection counts as a stop.
    pub fn send(&self, message: ServerMessage) -> Result<(), InterviewError> {
        self.outbound.send(message).map_err(|_| InterviewError::Stopped)
    }

    /// Ask a question and suspend until the candidate answers.
    ///
    /// Anything delivered before the question went out is discarded first, so
    /// the returned answer is the one given to *this* question.
    pub async fn ask(&self, phase: Phase, question: String) -> Result<String, InterviewError> {
        self.handle.check_stop()?;
        self.handle.discard_pending_answer();
        self.send(ServerMessage::Question { phase, question })?;
        self.handle.wait_for_answer().await
    }

    /// Pose a coding exercise and suspend until a passing evaluation arrives.
    pub async fn ask_coding(&self, phase: Phase, question: String) -> Result<serde_json::Value, InterviewError> {
        self.handle.check_stop()?;
        self.handle.discard_pending_code_result();
        self.send(ServerMessage::CodingQuestion { phase, question })?;
        self.handle.wait_for_code().await
    }

    /// Store one entry in a phase's results object.
    pub fn record(&self, phase: Phase, key: impl Into<String>, value: serde_json::Value) {
        self.session.record(phase, key.into(), value);
    }

    /// Cooperative stop check between suspension points.
    pub fn check_stop(&self) -> Result<(), InterviewError> {
        self.handle.check_stop()
    }
}
