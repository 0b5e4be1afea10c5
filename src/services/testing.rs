//! In-process collaborators for tests that need a whole [`Services`] set.

use crate::error::InterviewError;
use crate::interview::phase::Phase;
use crate::interview::runner::{Interview, InterviewRunner};
use crate::protocol::ServerMessage;
use crate::services::analysis::ScoreAnalyzer;
use crate::services::extractor::PlainTextExtractor;
use crate::services::{CodeEvaluator, Services};
use crate::transcription::recognizer::SpeechRecognizer;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Hears the same text in every window, or fails every window.
pub struct FixedRecognizer {
    reply: Option<String>,
}

impl FixedRecognizer {
    pub fn hearing(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Some(text.to_string()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { reply: None })
    }
}

#[async_trait]
impl SpeechRecognizer for FixedRecognizer {
    async fn recognize(&self, _window: &[u8]) -> Result<Vec<String>> {
        match &self.reply {
            Some(text) => Ok(vec![text.clone()]),
            None => Err(anyhow!("recognizer unavailable")),
        }
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Passes any submission containing `return`; fails on an empty question.
pub struct KeywordEvaluator;

#[async_trait]
impl CodeEvaluator for KeywordEvaluator {
    async fn evaluate(&self, question: &str, code: &str) -> Result<serde_json::Value> {
        if question.trim().is_empty() {
            return Err(anyhow!("no question to evaluate against"));
        }
        let passed = code.contains("return");
        Ok(json!({ "RESULT": passed, "FEEDBACK": if passed { "Correct." } else { "Nothing is returned." } }))
    }
}

/// Asks one question, records the answer and completes.
pub struct OneQuestionRunner;

pub const ONE_QUESTION: &str = "What is six times seven?";

#[async_trait]
impl InterviewRunner for OneQuestionRunner {
    async fn conduct(&self, interview: &Interview) -> Result<(), InterviewError> {
        let answer = interview.ask(Phase::Introduction, ONE_QUESTION.to_string()).await?;
        interview.record(
            Phase::Introduction,
            ONE_QUESTION,
            json!({ "answer": answer, "assessment": { "score": 9, "feedback": "Right." } }),
        );
        interview.send(ServerMessage::InterviewComplete {
            message: "Interview completed".to_string(),
            results: interview.results(),
        })
    }
}

pub fn services(speech: Arc<dyn SpeechRecognizer>) -> Services {
    Services {
        speech,
        extractor: Arc::new(PlainTextExtractor),
        evaluator: Arc::new(KeywordEvaluator),
        analyzer: Arc::new(ScoreAnalyzer),
        interviewer: Arc::new(OneQuestionRunner),
    }
}
