//! # Chunked Transcription Pipeline
//!
//! Cuts a recording into overlapping windows (see [`WindowLayout`]),
//! recognizes them concurrently and stitches the fragments back together in
//! window order.
//!
//! ## Accumulation:
//! Each fragment is merged against the *raw* fragment of the window before
//! it, never against the running transcript, and the merged pair is appended
//! to the transcript. Every boundary is therefore reconciled on its own, at
//! constant cost per window.

use crate::audio::buffer::{AudioBuffer, WindowLayout};
use crate::error::TranscriptionError;
use crate::transcription::merge::merge;
use crate::transcription::recognizer::SpeechRecognizer;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct ChunkedTranscriber {
    recognizer: Arc<dyn SpeechRecognizer>,
    layout: WindowLayout,
    max_in_flight: usize,
}

impl ChunkedTranscriber {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, layout: WindowLayout, max_in_flight: usize) -> Self {
        Self {
            recognizer,
            layout,
            max_in_flight: max_in_flight.max(1),
        }
    }

    #[cfg(test)]
    pub fn layout(&self) -> WindowLayout {
        self.layout
    }

    /// Transcribe a whole recording into one trimmed transcript.
    ///
    /// ## Errors:
    /// - **EmptyAudio**: the buffer holds no bytes
    /// - **Recognizer**: any window failed; no partial transcript is returned
    #[instrument(skip(self, audio), fields(bytes = audio.len(), recognizer = self.recognizer.name()))]
    pub async fn transcribe(&self, audio: &AudioBuffer) -> Result<String, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let windows = self.layout.windows(audio.len());
        let window_count = windows.len();

        // `buffered` keeps up to `max_in_flight` requests running but yields
        // results in window order, which the merge depends on.
        let fragments: Vec<String> = stream::iter(windows.into_iter().enumerate())
            .map(|(index, range)| {
                let recognizer = &self.recognizer;
                async move {
                    recognizer
                        .recognize(audio.window(range))
                        .await
                        .map(|alternatives| alternatives.into_iter().next().unwrap_or_default())
                        .map_err(|e| TranscriptionError::Recognizer {
                            window: index,
                            message: format!("{:#}", e),
                        })
                }
            })
            .buffered(self.max_in_flight)
            .try_collect()
            .await?;

        let mut transcript = String::new();
        let mut previous = String::new();
        for fragment in fragments {
            if previous.is_empty() {
                transcript.push_str(&fragment);
            } else {
                transcript.push_str(&merge(&previous, &fragment));
            }
            previous = fragment;
        }

        debug!(windows = window_count, chars = transcript.len(), "Transcription finished");
        Ok(transcript.trim().to_string())
    }
}
