//! # Session Coordinator
//!
//! One [`InterviewSession`] exists per WebSocket connection. It owns the
//! candidate artifacts, the results mapping and at most one running interview.
//!
//! ## Interview lifecycle:
//! ```text
//! absent --start_interview--> running --(stop observed | completed | failed)--> absent
//! ```
//! There is no restart in place: every `start_interview` after the task is
//! gone builds a fresh [`InterviewHandle`] with unset signals. A handle that has
//! been halted counts as gone even while its task is still winding down; that
//! task stops at its next check and never releases a newer handle.
//!
//! ## Who touches what:
//! - The connection handler creates the handle (`start_interview`), delivers
//!   into it (`submit_answer`, `submit_code_result`) and raises the stop signal.
//! - The interview task waits on the handle, writes the results mapping and
//!   releases the handle when it ends.
//!
//! Locks are `std::sync` and are never held across an `.await`.

use crate::error::InterviewError;
use crate::interview::handle::InterviewHandle;
use crate::interview::phase::{empty_results, Phase, PhaseResults};
use crate::interview::runner::{Interview, InterviewRunner};
use crate::interview::signal::Signal;
use crate::protocol::Outbound;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Debug)]
pub struct InterviewSession {
    id: Uuid,
    candidate_text: RwLock<String>,
    job_description: RwLock<String>,
    results: RwLock<PhaseResults>,
    handle: Mutex<Option<Arc<InterviewHandle>>>,
    stop: Arc<Signal>,
}

impl InterviewSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            candidate_text: RwLock::new(String::new()),
            job_description: RwLock::new(String::new()),
            results: RwLock::new(empty_results()),
            handle: Mutex::new(None),
            stop: Arc::new(Signal::new()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_candidate_text(&self, text: String) {
        *self.candidate_text.write().unwrap_or_else(PoisonError::into_inner) = text;
    }

    pub fn candidate_text(&self) -> String {
        self.candidate_text.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_job_description(&self, text: String) {
        *self.job_description.write().unwrap_or_else(PoisonError::into_inner) = text;
    }

    pub fn job_description(&self) -> String {
        self.job_description.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// A copy of the results mapping, for analysis queries.
    pub fn results(&self) -> PhaseResults {
        self.results.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn record(&self, phase: Phase, key: String, value: serde_json::Value) {
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(phase)
            .or_default()
            .insert(key, value);
    }

    pub fn is_running(&self) -> bool {
        self.current_handle().is_some()
    }

    #[cfg(test)]
    pub fn stop_requested(&self) -> bool {
        self.stop.is_set()
    }

    /// Launch the interview task unless one is already running.
    ///
    /// Returns immediately; `true` when a new task was spawned.
    pub fn start_interview(self: &Arc<Self>, runner: Arc<dyn InterviewRunner>, outbound: Outbound) -> bool {
        let handle = {
            let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|current| !current.is_halted()) {
                debug!(session_id = %self.id, "Interview already running, start ignored");
                return false;
            }
            let handle = Arc::new(InterviewHandle::new(Arc::clone(&self.stop)));
            *slot = Some(Arc::clone(&handle));
            handle
        };

        info!(session_id = %self.id, interview_id = %handle.id(), "Starting interview");

        let session = Arc::clone(self);
        tokio::spawn(async move {
            let interview = Interview::new(Arc::clone(&session), Arc::clone(&handle), outbound);
            let outcome = AssertUnwindSafe(runner.conduct(&interview)).catch_unwind().await;

            match outcome {
                Ok(Ok(())) => {
                    info!(session_id = %session.id, interview_id = %handle.id(), "Interview completed");
                }
                Ok(Err(InterviewError::Stopped)) => {
                    info!(session_id = %session.id, interview_id = %handle.id(), "Interview stopped");
                }
                Ok(Err(err)) => {
                    error!(
                        session_id = %session.id,
                        interview_id = %handle.id(),
                        error = %err,
                        "Interview task failed"
                    );
                }
                Err(_) => {
                    error!(session_id = %session.id, interview_id = %handle.id(), "Interview task panicked");
                }
            }

            session.release(&handle);
        });

        true
    }

    /// Hand an answer to the running interview. Dropped silently when none is running.
    pub fn submit_answer(&self, text: String) -> bool {
        match self.current_handle() {
            Some(handle) => {
                debug!(session_id = %self.id, chars = text.len(), "Answer delivered");
                handle.deliver_answer(text);
                true
            }
            None => {
                debug!(session_id = %self.id, "No interview running, answer dropped");
                false
            }
        }
    }

    /// Hand a code evaluation outcome to the running interview. Dropped silently when none is running.
    pub fn submit_code_result(&self, outcome: serde_json::Value) -> bool {
        match self.current_handle() {
            Some(handle) => {
                handle.deliver_code_result(outcome);
                true
            }
            None => {
                debug!(session_id = %self.id, "No interview running, code result dropped");
                false
            }
        }
    }

    /// Raise the stop signal and halt the running interview. Returns whether
    /// one was running.
    pub fn request_stop(&self) -> bool {
        self.stop.set();
        match self.current_handle() {
            Some(handle) => {
                handle.halt();
                true
            }
            None => false,
        }
    }

    pub fn clear_stop(&self) {
        self.stop.clear();
    }

    /// Stop the running interview and re-arm the stop signal after `grace`.
    ///
    /// Returns `false` without touching the signal when nothing is running.
    pub async fn end_interview(&self, grace: Duration) -> bool {
        if !self.is_running() {
            return false;
        }
        self.request_stop();
        tokio::time::sleep(grace).await;
        self.clear_stop();
        true
    }

    /// Connection closed: stop for good, the signal is never cleared again.
    pub fn shutdown(&self) {
        if self.request_stop() {
            info!(session_id = %self.id, "Connection closed, stopping interview");
        }
    }

    fn current_handle(&self) -> Option<Arc<InterviewHandle>> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|handle| !handle.is_halted())
            .cloned()
    }

    fn release(&self, handle: &Arc<InterviewHandle>) {
        let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, handle)) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Waits for answers forever and reports each one it receives.
    struct EchoRunner {
        runs: AtomicUsize,
        answers: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl InterviewRunner for EchoRunner {
        async fn conduct(&self, interview: &Interview) -> Result<(), InterviewError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            loop {
                let answer = interview.ask(Phase::Introduction, "Tell me about yourself".to_string()).await?;
                let _ = self.answers.send(answer);
            }
        }
    }

    /// Does uninterruptible work between its stop check and its question.
    struct BusyRunner {
        busy_for: Duration,
    }

    #[async_trait]
    impl InterviewRunner for BusyRunner {
        async fn conduct(&self, interview: &Interview) -> Result<(), InterviewError> {
            interview.check_stop()?;
            tokio::time::sleep(self.busy_for).await;
            interview.ask(Phase::Introduction, "Late question".to_string()).await?;
            Ok(())
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl InterviewRunner for FailingRunner {
        async fn conduct(&self, _interview: &Interview) -> Result<(), InterviewError> {
            Err(InterviewError::Task("language model unreachable".to_string()))
        }
    }

    struct PanickingRunner;

    #[async_trait]
    impl InterviewRunner for PanickingRunner {
        async fn conduct(&self, _interview: &Interview) -> Result<(), InterviewError> {
            panic!("boom");
        }
    }

    fn echo_runner() -> (Arc<EchoRunner>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = Arc::new(EchoRunner {
            runs: AtomicUsize::new(0),
            answers: tx,
        });
        (runner, rx)
    }

    async fn wait_until_released(session: &InterviewSession) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while session.is_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("interview handle was not released");
    }

    async fn next_question(outbound: &mut mpsc::UnboundedReceiver<ServerMessage>) -> String {
        let msg = tokio::time::timeout(Duration::from_secs(1), outbound.recv())
            .await
            .expect("no question sent")
            .expect("outbound closed");
        match msg {
            ServerMessage::Question { question, .. } => question,
            other => panic!("Expected a question, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_twice_runs_one_interview() {
        let session = InterviewSession::new();
        let (runner, _answers) = echo_runner();
        let (outbound, mut questions) = mpsc::unbounded_channel();

        assert!(session.start_interview(runner.clone(), outbound.clone()));
        assert!(!session.start_interview(runner.clone(), outbound));

        next_question(&mut questions).await;
        assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn test_submit_without_interview_is_silent() {
        let session = InterviewSession::new();
        assert!(!session.submit_answer("hello".to_string()));
        assert!(!session.submit_code_result(serde_json::json!({"RESULT": true})));
        assert!(!session.is_running());
        assert!(!session.stop_requested());
    }

    #[tokio::test]
    async fn test_answer_resumes_waiting_task() {
        let session = InterviewSession::new();
        let (runner, mut answers) = echo_runner();
        let (outbound, mut questions) = mpsc::unbounded_channel();

        session.start_interview(runner, outbound);
        next_question(&mut questions).await;

        assert!(session.submit_answer("42".to_string()));
        let received = tokio::time::timeout(Duration::from_secs(1), answers.recv()).await.unwrap();
        assert_eq!(received.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_stop_releases_handle_while_waiting() {
        let session = InterviewSession::new();
        let (runner, _answers) = echo_runner();
        let (outbound, mut questions) = mpsc::unbounded_channel();

        session.start_interview(runner, outbound);
        next_question(&mut questions).await;

        assert!(session.request_stop());
        wait_until_released(&session).await;
        session.clear_stop();

        // A fresh interview can start and is not stopped by the old request.
        let (runner, _answers) = echo_runner();
        let (outbound, mut questions) = mpsc::unbounded_channel();
        assert!(session.start_interview(runner, outbound));
        next_question(&mut questions).await;
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn test_end_interview_clears_stop_signal() {
        let session = InterviewSession::new();
        let (runner, _answers) = echo_runner();
        let (outbound, mut questions) = mpsc::unbounded_channel();

        session.start_interview(runner, outbound);
        next_question(&mut questions).await;

        assert!(session.end_interview(Duration::from_millis(10)).await);
        assert!(!session.stop_requested());
        wait_until_released(&session).await;

        assert!(!session.end_interview(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_end_interview_stops_task_busy_past_grace() {
        let session = InterviewSession::new();
        let (outbound, mut sent) = mpsc::unbounded_channel();
        let busy = Arc::new(BusyRunner {
            busy_for: Duration::from_millis(200),
        });

        assert!(session.start_interview(busy, outbound));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(session.end_interview(Duration::from_millis(10)).await);
        assert!(!session.stop_requested());
        assert!(!session.is_running());

        // The old task finishes its work, sees the halt and sends nothing.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sent.try_recv().is_err());

        let (runner, _answers) = echo_runner();
        let (outbound, mut questions) = mpsc::unbounded_channel();
        assert!(session.start_interview(runner, outbound));
        next_question(&mut questions).await;
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn test_failed_task_releases_handle() {
        let session = InterviewSession::new();
        let (outbound, _rx) = mpsc::unbounded_channel();

        assert!(session.start_interview(Arc::new(FailingRunner), outbound));
        wait_until_released(&session).await;
    }

    #[tokio::test]
    async fn test_panicking_task_releases_handle() {
        let session = InterviewSession::new();
        let (outbound, _rx) = mpsc::unbounded_channel();

        assert!(session.start_interview(Arc::new(PanickingRunner), outbound));
        wait_until_released(&session).await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_interview() {
        let session = InterviewSession::new();
        let (runner, _answers) = echo_runner();
        let (outbound, mut questions) = mpsc::unbounded_channel();

        session.start_interview(runner, outbound);
        next_question(&mut questions).await;

        session.shutdown();
        wait_until_released(&session).await;
        assert!(session.stop_requested());
    }

    #[test]
    fn test_record_results() {
        let session = InterviewSession::new();
        session.record(Phase::Coding, "Reverse a list".to_string(), serde_json::json!({"RESULT": true}));
        let results = session.results();
        assert_eq!(results[&Phase::Coding]["Reverse a list"]["RESULT"], true);
        assert!(results[&Phase::Outro].is_empty());
    }
}
