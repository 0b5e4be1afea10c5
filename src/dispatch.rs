//! # Connection Handler
//!
//! Turns inbound WebSocket messages into session operations and replies.
//! One handler exists per connection; the WebSocket actor feeds it text
//! frames one at a time, in arrival order.
//!
//! ## Error Policy:
//! Every failure is local to the message that caused it. It is logged,
//! converted to a typed reply with [`InterviewError::reply`] and the
//! connection carries on.

use crate::audio::processor::AudioProcessor;
use crate::error::{InterviewError, TranscriptionError};
use crate::interview::session::InterviewSession;
use crate::protocol::{ClientMessage, Document, Outbound, ServerMessage};
use crate::services::{has_passing_verdict, Services};
use crate::state::AppState;
use crate::transcription::ChunkedTranscriber;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

const WARMUP_CODING_QUESTIONS: [&str; 3] = [
    "Q1. Print Hello World",
    "Q2. Print Hello Anish",
    "Q3. Print Hello Duniya",
];

/// A random warm-up exercise, drawn from a v4 UUID.
fn warmup_coding_question() -> &'static str {
    let pick = (Uuid::new_v4().as_u128() % WARMUP_CODING_QUESTIONS.len() as u128) as usize;
    WARMUP_CODING_QUESTIONS[pick]
}

#[derive(Clone)]
pub struct ConnectionHandler {
    session: Arc<InterviewSession>,
    services: Services,
    transcriber: Arc<ChunkedTranscriber>,
    processor: Arc<AudioProcessor>,
    outbound: Outbound,
    stop_grace: Duration,
    state: AppState,
}

impl ConnectionHandler {
    /// Snapshot the current configuration for a new connection.
    pub fn new(state: AppState, outbound: Outbound) -> Self {
        Self {
            session: InterviewSession::new(),
            services: state.services.clone(),
            transcriber: Arc::new(state.transcriber()),
            processor: Arc::new(state.audio_processor()),
            outbound,
            stop_grace: state.get_config().stop_grace(),
            state,
        }
    }

    pub fn session(&self) -> &Arc<InterviewSession> {
        &self.session
    }

    /// Handle one text frame to completion.
    pub async fn handle_text(&self, text: &str) {
        let started = Instant::now();

        let (kind, result) = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => {
                let kind = message.kind();
                debug!(session_id = %self.session.id(), kind, "Message received");
                (kind, self.dispatch(message).await)
            }
            Err(e) => ("invalid", Err(InterviewError::from(e))),
        };

        if let Err(err) = &result {
            warn!(session_id = %self.session.id(), kind, error = %err, "Message failed");
            self.send(err.reply());
        }

        self.state
            .record_message(kind, started.elapsed().as_millis() as u64, result.is_err());
    }

    async fn dispatch(&self, message: ClientMessage) -> Result<(), InterviewError> {
        match message {
            ClientMessage::UploadCv { document } => {
                let text = self.extract(&document)?;
                self.session.set_candidate_text(text.clone());
                self.send(ServerMessage::CvUploaded {
                    message: "CV uploaded successfully".to_string(),
                    cv_text: text,
                });
            }
            ClientMessage::AnalyzeJd { document } => {
                let text = self.extract(&document)?;
                self.session.set_job_description(text.clone());
                self.send(ServerMessage::JdAnalyzed {
                    message: "Job description analyzed successfully".to_string(),
                    job_description: text,
                });
            }
            ClientMessage::StartInterview => {
                if self
                    .session
                    .start_interview(Arc::clone(&self.services.interviewer), self.outbound.clone())
                {
                    self.state.record_interview_started();
                    self.send(ServerMessage::InterviewStarted {
                        message: "Interview started".to_string(),
                    });
                }
            }
            ClientMessage::Answer { code } => {
                self.session.submit_answer(code);
            }
            ClientMessage::Coding { ques, code } => {
                let outcome = self
                    .services
                    .evaluator
                    .evaluate(&ques, &code)
                    .await
                    .map_err(|e| InterviewError::CodingEvaluation(format!("{:#}", e)))?;
                self.send(ServerMessage::CodeEvaluation { result: outcome.clone() });
                if has_passing_verdict(&outcome) {
                    self.session.submit_code_result(outcome);
                }
            }
            ClientMessage::EndInterview => {
                if self.session.end_interview(self.stop_grace).await {
                    info!(session_id = %self.session.id(), "Interview ended by client");
                    self.send(ServerMessage::InterviewEnd {
                        message: "Interview ended".to_string(),
                    });
                }
            }
            ClientMessage::GetAnalysis => {
                let result = self.services.analyzer.analyze(&self.session.results());
                self.send(ServerMessage::Analysis { result });
            }
            ClientMessage::GetSummaryAnalysis => {
                let result = self.services.analyzer.summarize(&self.session.results());
                self.send(ServerMessage::SummaryAnalysis { result });
            }
            ClientMessage::TestCodingQuestion => {
                self.send(ServerMessage::TestCodingQuestion {
                    message: warmup_coding_question().to_string(),
                });
            }
            ClientMessage::Audio { audio_data } => {
                let transcript = self.transcribe(audio_data.as_deref().unwrap_or_default()).await?;
                self.send(ServerMessage::TranscriptionComplete {
                    transcription: transcript.clone(),
                });
                if !transcript.is_empty() {
                    self.session.submit_answer(transcript);
                }
            }
        }
        Ok(())
    }

    async fn transcribe(&self, payload: &str) -> Result<String, TranscriptionError> {
        let audio = self.processor.decode(payload)?;
        debug!(
            session_id = %self.session.id(),
            seconds = audio.duration_seconds(self.processor.format()),
            "Transcribing answer"
        );
        self.transcriber.transcribe(&audio).await
    }

    fn extract(&self, document: &Document) -> Result<String, InterviewError> {
        self.services
            .extractor
            .extract(document)
            .map_err(|e| InterviewError::Extraction(format!("{:#}", e)))
    }

    /// A closed outbound queue means the actor is gone; nothing to report to.
    fn send(&self, message: ServerMessage) {
        if self.outbound.send(message).is_err() {
            debug!(session_id = %self.session.id(), "Outbound closed, reply dropped");
        }
    }
}
