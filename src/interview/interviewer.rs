//! Prompt-driven default interviewer.
//!
//! Walks the phases in order, asks the language model for each question,
//! waits for the candidate, and asks the model to score the answer. The
//! coding phase waits for a passing code evaluation instead of an answer.

use crate::error::InterviewError;
use crate::interview::phase::Phase;
use crate::interview::runner::{Interview, InterviewRunner};
use crate::protocol::ServerMessage;
use crate::services::evaluator::parse_json_reply;
use crate::services::LanguageModel;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LlmInterviewer {
    llm: Arc<dyn LanguageModel>,
    plan: Vec<(Phase, usize)>,
}

impl LlmInterviewer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            plan: vec![
                (Phase::Introduction, 1),
                (Phase::Project, 2),
                (Phase::Coding, 1),
                (Phase::Technical, 2),
                (Phase::Outro, 1),
            ],
        }
    }

    /// Replace how many questions each phase gets. Phases left out are skipped.
    #[cfg(test)]
    pub fn with_plan(mut self, plan: Vec<(Phase, usize)>) -> Self {
        self.plan = plan;
        self
    }

    fn question_prompt(&self, interview: &Interview, phase: Phase, asked: &[String]) -> String {
        let focus = match phase {
            Phase::Introduction => "a warm opening question about the candidate's background",
            Phase::Project => "a question about a specific project listed on the CV",
            Phase::Coding => "a short, self-contained coding exercise solvable in under 15 minutes",
            Phase::Technical => "a technical question relevant to the job description",
            Phase::Outro => "a closing question inviting the candidate's own questions",
        };
        format!(
            "You are interviewing a candidate. Write {focus}.\n\
             Reply with the question text only.\n\n\
             CV:\n{cv}\n\nJob description:\n{jd}\n\nAlready asked:\n{asked}",
            cv = interview.candidate_text(),
            jd = interview.job_description(),
            asked = asked.join("\n"),
        )
    }

    async fn assess(&self, phase: Phase, question: &str, answer: &str) -> serde_json::Value {
        let prompt = format!(
            "Score this interview answer for the {phase} phase from 0 to 10.\n\
             Question: {question}\nAnswer: {answer}\n\
             Respond with JSON only: {{\"score\": <number>, \"feedback\": \"<one sentence>\"}}."
        );
        match self.llm.complete(&prompt).await.and_then(|reply| parse_json_reply(&reply)) {
            Ok(assessment) => assessment,
            Err(err) => {
                // An unscored answer is still recorded; the analyzer skips it.
                warn!(%phase, error = %err, "Could not score answer");
                json!({ "error": err.to_string() })
            }
        }
    }
}

#[async_trait]
impl InterviewRunner for LlmInterviewer {
    async fn conduct(&self, interview: &Interview) -> Result<(), InterviewError> {
        let mut asked = Vec::new();

        for &(phase, count) in &self.plan {
            for _ in 0..count {
                interview.check_stop()?;
                let question = self
                    .llm
                    .complete(&self.question_prompt(interview, phase, &asked))
                    .await?
                    .trim()
                    .to_string();
                asked.push(question.clone());
                debug!(%phase, "Asking question");

                if phase == Phase::Coding {
                    let outcome = interview.ask_coding(phase, question.clone()).await?;
                    interview.record(phase, question, json!({ "evaluation": outcome }));
                } else {
                    let answer = interview.ask(phase, question.clone()).await?;
                    interview.check_stop()?;
                    let assessment = self.assess(phase, &question, &answer).await;
                    interview.record(phase, question, json!({ "answer": answer, "assessment": assessment }));
                }
            }
        }

        interview.send(ServerMessage::InterviewComplete {
            message: "Interview completed".to_string(),
            results: interview.results(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::session::InterviewSession;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Numbers its questions and gives every answer a 7.
    struct ScriptedModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.starts_with("Score") {
                Ok(r#"{"score": 7, "feedback": "fine"}"#.to_string())
            } else {
                Ok(format!("Question {}?", n))
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for the interviewer")
            .expect("outbound closed")
    }

    #[tokio::test]
    async fn test_full_interview_records_every_phase() {
        let llm = Arc::new(ScriptedModel { calls: AtomicUsize::new(0) });
        let interviewer = LlmInterviewer::new(llm).with_plan(vec![
            (Phase::Introduction, 1),
            (Phase::Coding, 1),
            (Phase::Outro, 1),
        ]);
        let session = InterviewSession::new();
        let (outbound, mut rx) = mpsc::unbounded_channel();

        session.start_interview(Arc::new(interviewer), outbound);

        assert!(matches!(recv(&mut rx).await, ServerMessage::Question { phase: Phase::Introduction, .. }));
        session.submit_answer("I build backends".to_string());

        assert!(matches!(recv(&mut rx).await, ServerMessage::CodingQuestion { phase: Phase::Coding, .. }));
        session.submit_code_result(json!({"RESULT": true}));

        assert!(matches!(recv(&mut rx).await, ServerMessage::Question { phase: Phase::Outro, .. }));
        session.submit_answer("No questions".to_string());

        match recv(&mut rx).await {
            ServerMessage::InterviewComplete { results, .. } => {
                let intro = &results[&Phase::Introduction];
                let entry = intro.values().next().unwrap();
                assert_eq!(entry["answer"], "I build backends");
                assert_eq!(entry["assessment"]["score"], 7);
                assert_eq!(results[&Phase::Coding].values().next().unwrap()["evaluation"]["RESULT"], true);
                assert!(results[&Phase::Project].is_empty());
            }
            other => panic!("Expected completion, got {:?}", other),
        }

        tokio::time::timeout(Duration::from_secs(1), async {
            while session.is_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
