//! # Error Handling
//!
//! Two families of errors live here:
//!
//! - **AppError**: errors of the HTTP surface, converted to JSON responses
//!   through actix's `ResponseError` trait.
//! - **InterviewError / TranscriptionError**: errors raised while handling a
//!   single WebSocket message or while the interview task runs. They never
//!   unwind the connection; the connection handler turns them into a typed
//!   outbound message instead (see [`InterviewError::reply`]).
//!
//! ## Why hand-written enums:
//! Each variant maps to exactly one client-visible message type, so the
//! `Display` text doubles as the `message` field sent to the client.

use crate::protocol::ServerMessage;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Errors returned from HTTP handlers.
///
/// ## Error Categories:
/// - **Internal**: Server-side problems (500 errors)
/// - **BadRequest**: Client sent invalid data (400 errors)
/// - **ValidationError**: Data validation failed (400 errors)
/// - **ServiceUnavailable**: Session capacity reached (503 errors)
#[derive(Debug)]
pub enum AppError {
    Internal(String),
    BadRequest(String),
    ValidationError(String),
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

/// Converts errors into HTTP responses.
///
/// ## JSON Response Format:
/// ```json
/// {
///   "error": {
///     "type": "validation_error",
///     "message": "Overlap (9000ms) must be shorter than the window (5000ms)",
///     "timestamp": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "bad_request",
                msg.clone(),
            ),
            AppError::ValidationError(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
            ),
            AppError::ServiceUnavailable(msg) => (
                actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// JSON parsing errors are almost always the client's fault, so they map to 400.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Failures of the chunked transcription pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionError {
    /// The message carried no audio, or the decoded buffer has zero length
    EmptyAudio,
    /// The payload could not be decoded or does not match the expected format
    InvalidAudio(String),
    /// The speech recognizer was unreachable or rejected one window
    Recognizer { window: usize, message: String },
}

impl fmt::Display for TranscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionError::EmptyAudio => write!(f, "No audio data provided"),
            TranscriptionError::InvalidAudio(msg) => write!(f, "Invalid audio: {}", msg),
            TranscriptionError::Recognizer { window, message } => {
                write!(f, "Speech recognition failed for window {}: {}", window, message)
            }
        }
    }
}

impl std::error::Error for TranscriptionError {}

/// Errors raised while handling one inbound message or running the interview task.
#[derive(Debug)]
pub enum InterviewError {
    /// Malformed inbound message (bad JSON, unknown type, missing field)
    Validation(String),
    /// Audio could not be transcribed
    Transcription(TranscriptionError),
    /// The external code evaluator failed
    CodingEvaluation(String),
    /// The external document extractor failed
    Extraction(String),
    /// The interview task observed the stop signal
    Stopped,
    /// Anything else that went wrong inside the interview task
    Task(String),
}

impl InterviewError {
    /// The outbound message reporting this error to the client.
    pub fn reply(&self) -> ServerMessage {
        let message = self.to_string();
        match self {
            InterviewError::Transcription(_) => ServerMessage::TranscriptionError { message },
            InterviewError::CodingEvaluation(_) => ServerMessage::CodingError { message },
            _ => ServerMessage::Error { message },
        }
    }
}

impl fmt::Display for InterviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewError::Validation(msg) => write!(f, "{}", msg),
            InterviewError::Transcription(err) => write!(f, "{}", err),
            InterviewError::CodingEvaluation(msg) => write!(f, "Code evaluation failed: {}", msg),
            InterviewError::Extraction(msg) => write!(f, "Could not read document: {}", msg),
            InterviewError::Stopped => write!(f, "Interview stopped"),
            InterviewError::Task(msg) => write!(f, "Interview task failed: {}", msg),
        }
    }
}

impl std::error::Error for InterviewError {}

impl From<TranscriptionError> for InterviewError {
    fn from(err: TranscriptionError) -> Self {
        InterviewError::Transcription(err)
    }
}

/// Collaborators (LLM, evaluator, ...) report failures through anyhow; inside
/// the interview task those surface as unhandled task errors.
impl From<anyhow::Error> for InterviewError {
    fn from(err: anyhow::Error) -> Self {
        InterviewError::Task(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for InterviewError {
    fn from(err: serde_json::Error) -> Self {
        InterviewError::Validation(format!("Invalid message: {}", err))
    }
}
