//! # Audio Handling
//!
//! Decodes answer recordings and lays them out for windowed transcription.
//!
//! ## Audio Format Requirements:
//! - **Sample Rate**: 16kHz (16,000 Hz) by default
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//! - **Encoding**: Little-endian signed integers, raw or inside a WAV container

pub mod buffer; // Immutable PCM buffer and window layout
pub mod processor; // Base64 / WAV decoding and validation
