use crate::services::{CodeEvaluator, LanguageModel};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Asks the language model to judge a submission and answer in JSON.
pub struct LlmCodeEvaluator {
    llm: Arc<dyn LanguageModel>,
}

impl LlmCodeEvaluator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CodeEvaluator for LlmCodeEvaluator {
    async fn evaluate(&self, question: &str, code: &str) -> Result<serde_json::Value> {
        let prompt = format!(
            "You are reviewing a candidate's solution in a technical interview.\n\
             Question:\n{question}\n\nSubmitted code:\n{code}\n\n\
             Decide whether the code correctly solves the question. Respond with JSON only, \
             in the form {{\"RESULT\": true|false, \"FEEDBACK\": \"one or two sentences\"}}."
        );
        let reply = self.llm.complete(&prompt).await?;
        parse_json_reply(&reply)
    }
}

/// Pull the JSON object out of a model reply, tolerating markdown code fences
/// and chatter around it.
pub fn parse_json_reply(reply: &str) -> Result<serde_json::Value> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&reply[start..=end])
            .map_err(|e| anyhow!("model reply is not valid JSON: {}", e)),
        _ => Err(anyhow!("model reply contains no JSON object")),
    }
}
