//! # Interview Coordination
//!
//! Lets one long-running interview task suspend on specific events while the
//! connection keeps handling inbound messages.
//!
//! ## Key Components:
//! - **signal**: single-slot rendezvous flag (set / clear / wait)
//! - **handle**: per-interview answer and code slots with their signals
//! - **session**: per-connection state and the start / submit / stop operations
//! - **runner**: the pluggable body of the interview task
//! - **interviewer**: the prompt-driven default runner
//! - **phase**: the fixed interview phases and the results mapping

pub mod handle;
pub mod interviewer;
pub mod phase;
pub mod runner;
pub mod session;
pub mod signal;
