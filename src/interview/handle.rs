//! # Interview Handle
//!
//! The rendezvous point between the connection handler and one running
//! interview task. The connection handler only ever *delivers* into it; the
//! interview task only ever *waits* on it.
//!
//! ## Delivery semantics:
//! Each slot holds at most one pending value. Delivering a second value before
//! the first is consumed overwrites it, and the ready signal stays set.
//!
//! ## Stopping:
//! The task stops when either the session stop signal or the handle's own
//! `halted` latch is set. The session signal is re-armed after a grace period;
//! the latch never is, so a task that was busy during the grace period still
//! stops at its next check.

use crate::error::InterviewError;
use crate::interview::signal::Signal;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

#[derive(Debug)]
pub struct InterviewHandle {
    id: Uuid,
    answer: Mutex<Option<String>>,
    answer_ready: Signal,
    code: Mutex<Option<serde_json::Value>>,
    code_ready: Signal,
    stop: Arc<Signal>,
    halted: Signal,
}

impl InterviewHandle {
    /// Create a handle with empty slots and unset signals, bound to the
    /// session's stop signal.
    pub fn new(stop: Arc<Signal>) -> Self {
        Self {
            id: Uuid::new_v4(),
            answer: Mutex::new(None),
            answer_ready: Signal::new(),
            code: Mutex::new(None),
            code_ready: Signal::new(),
            stop,
            halted: Signal::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn deliver_answer(&self, text: String) {
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner) = Some(text);
        self.answer_ready.set();
    }

    pub fn deliver_code_result(&self, outcome: serde_json::Value) {
        *self.code.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        self.code_ready.set();
    }

    /// Drop an answer that arrived before the question it would answer was asked.
    pub fn discard_pending_answer(&self) -> Option<String> {
        self.answer_ready.clear();
        self.answer.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub fn discard_pending_code_result(&self) -> Option<serde_json::Value> {
        self.code_ready.clear();
        self.code.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Stop this interview for good, independent of the session stop signal.
    pub fn halt(&self) {
        self.halted.set();
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_set()
    }

    /// Cooperative stop check for code that is not at a suspension point.
    pub fn check_stop(&self) -> Result<(), InterviewError> {
        if self.stop.is_set() || self.halted.is_set() {
            Err(InterviewError::Stopped)
        } else {
            Ok(())
        }
    }

    /// Suspend until an answer is delivered or the session asks to stop.
    pub async fn wait_for_answer(&self) -> Result<String, InterviewError> {
        wait_for_slot(&self.answer_ready, &self.answer, &self.stop, &self.halted).await
    }

    /// Suspend until a code evaluation result is delivered or the session asks to stop.
    pub async fn wait_for_code(&self) -> Result<serde_json::Value, InterviewError> {
        wait_for_slot(&self.code_ready, &self.code, &self.stop, &self.halted).await
    }
}

async fn wait_for_slot<T>(
    ready: &Signal,
    slot: &Mutex<Option<T>>,
    stop: &Signal,
    halted: &Signal,
) -> Result<T, InterviewError> {
    loop {
        tokio::select! {
            biased;
            _ = stop.wait() => return Err(InterviewError::Stopped),
            _ = halted.wait() => return Err(InterviewError::Stopped),
            _ = ready.wait() => {}
        }

        ready.clear();
        let pending = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(value) = pending {
            return Ok(value);
        }
    }
}
