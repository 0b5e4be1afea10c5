//! # Transcription Module
//!
//! Speech-to-text for answer recordings.
//!
//! ## Key Components:
//! - **recognizer**: the [`SpeechRecognizer`] seam and its Google Speech-to-Text client
//! - **pipeline**: overlapping-window dispatch and in-order reassembly
//! - **merge**: word-boundary reconciliation of adjacent fragments

pub mod merge;
pub mod pipeline;
pub mod recognizer;

pub use pipeline::ChunkedTranscriber;
pub use recognizer::{GoogleSpeechRecognizer, SpeechRecognizer};
