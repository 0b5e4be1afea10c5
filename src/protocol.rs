//! # WebSocket Message Protocol
//!
//! Every frame is one JSON object with a `type` discriminator.
//!
//! ## Message Format:
//! - **Client → Server**: [`ClientMessage`] (CV/JD upload, interview control, answers, audio)
//! - **Server → Client**: [`ServerMessage`] (replies, interview questions, errors)
//!
//! Audio and documents travel base64-encoded inside the JSON text frame.

use crate::interview::phase::{Phase, PhaseResults};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Sending half of a connection's outbound queue. Everything written to the
/// client goes through it, so replies and interview questions keep their order.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// A document sent by the client: either inline text or a base64 file body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Original file name, used to pick an extraction strategy
    #[serde(default)]
    pub file_name: Option<String>,
    /// Base64-encoded file contents
    #[serde(default)]
    pub content: Option<String>,
    /// Plain text, when the client already has it
    #[serde(default)]
    pub text: Option<String>,
}

/// Inbound messages.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    UploadCv {
        #[serde(flatten)]
        document: Document,
    },
    AnalyzeJd {
        #[serde(flatten)]
        document: Document,
    },
    StartInterview,
    /// A typed answer; the text travels in `code` for every phase
    Answer {
        code: String,
    },
    Coding {
        ques: String,
        code: String,
    },
    EndInterview,
    GetAnalysis,
    GetSummaryAnalysis,
    /// Ask for a throwaway coding exercise to check the editor works
    TestCodingQuestion,
    Audio {
        #[serde(default)]
        audio_data: Option<String>,
    },
}

impl ClientMessage {
    /// The wire name of this message, used for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::UploadCv { .. } => "upload_cv",
            ClientMessage::AnalyzeJd { .. } => "analyze_jd",
            ClientMessage::StartInterview => "start_interview",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::Coding { .. } => "coding",
            ClientMessage::EndInterview => "end_interview",
            ClientMessage::GetAnalysis => "get_analysis",
            ClientMessage::GetSummaryAnalysis => "get_summary_analysis",
            ClientMessage::TestCodingQuestion => "test_coding_question",
            ClientMessage::Audio { .. } => "audio",
        }
    }
}

/// Outbound messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    CvUploaded {
        message: String,
        cv_text: String,
    },
    JdAnalyzed {
        message: String,
        job_description: String,
    },
    InterviewStarted {
        message: String,
    },
    /// Sent by the interview task when it waits for a spoken or typed answer
    Question {
        phase: Phase,
        question: String,
    },
    /// Sent by the interview task when it waits for a passing code submission
    CodingQuestion {
        phase: Phase,
        question: String,
    },
    CodeEvaluation {
        result: serde_json::Value,
    },
    CodingError {
        message: String,
    },
    InterviewEnd {
        message: String,
    },
    InterviewComplete {
        message: String,
        results: PhaseResults,
    },
    Analysis {
        result: serde_json::Value,
    },
    SummaryAnalysis {
        result: serde_json::Value,
    },
    TestCodingQuestion {
        message: String,
    },
    TranscriptionComplete {
        transcription: String,
    },
    TranscriptionError {
        message: String,
    },
    Error {
        message: String,
    },
}
