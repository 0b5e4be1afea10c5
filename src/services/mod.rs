//! # External Collaborators
//!
//! The interview core only depends on these traits. Each has one shipped
//! implementation so the server works end to end:
//!
//! | Trait | Implementation | Backing |
//! |---|---|---|
//! | [`LanguageModel`] | [`gemini::GeminiClient`] | Gemini `generateContent` REST API |
//! | [`DocumentExtractor`] | [`extractor::PlainTextExtractor`] | UTF-8 text / markdown uploads |
//! | [`CodeEvaluator`] | [`evaluator::LlmCodeEvaluator`] | prompt on the language model |
//! | [`Analyzer`] | [`analysis::ScoreAnalyzer`] | score aggregation over the results mapping |
//!
//! Implementations report failures through `anyhow`; the connection handler
//! maps them onto the interview error taxonomy.

pub mod analysis;
pub mod evaluator;
pub mod extractor;
pub mod gemini;
#[cfg(test)]
pub mod testing;

use crate::interview::phase::PhaseResults;
use crate::interview::runner::InterviewRunner;
use crate::protocol::Document;
use crate::transcription::SpeechRecognizer;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single prompt and return the model's text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<String>;
}

#[async_trait]
pub trait CodeEvaluator: Send + Sync {
    /// Judge a code submission. A truthy `RESULT` field in the outcome means
    /// the submission passed.
    async fn evaluate(&self, question: &str, code: &str) -> Result<serde_json::Value>;
}

pub trait Analyzer: Send + Sync {
    fn analyze(&self, results: &PhaseResults) -> serde_json::Value;

    fn summarize(&self, results: &PhaseResults) -> serde_json::Value;
}

/// The collaborators one connection needs, shared by every connection.
#[derive(Clone)]
pub struct Services {
    pub speech: Arc<dyn SpeechRecognizer>,
    pub extractor: Arc<dyn DocumentExtractor>,
    pub evaluator: Arc<dyn CodeEvaluator>,
    pub analyzer: Arc<dyn Analyzer>,
    pub interviewer: Arc<dyn InterviewRunner>,
}

/// `RESULT` is the evaluator's verdict field; any JSON value other than
/// null, false, zero or an empty string/array/object counts as passing.
pub fn has_passing_verdict(outcome: &serde_json::Value) -> bool {
    use serde_json::Value;
    match outcome.get("RESULT") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(passed)) => *passed,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_passing_verdict() {
        assert!(has_passing_verdict(&json!({"RESULT": true})));
        assert!(has_passing_verdict(&json!({"RESULT": "PASS"})));
        assert!(!has_passing_verdict(&json!({"RESULT": false})));
        assert!(!has_passing_verdict(&json!({"RESULT": ""})));
        assert!(!has_passing_verdict(&json!({"FEEDBACK": "missing verdict"})));
        assert!(!has_passing_verdict(&json!(null)));
    }
}
