//! # Audio Decoding and Validation
//!
//! Turns the `audio_data` field of an `audio` message into an [`AudioBuffer`]
//! of raw PCM the recognizer accepts.
//!
//! ## Accepted Payloads (base64):
//! - **Raw PCM**: 16-bit little-endian samples in the configured format
//! - **WAV**: a RIFF container holding 16-bit PCM in the configured format;
//!   the header is checked and stripped
//!
//! Anything else fails with a [`TranscriptionError`], which the client sees
//! as a `transcription_error` message.

use crate::audio::buffer::{AudioBuffer, AudioFormat};
use crate::error::TranscriptionError;
use base64::{engine::general_purpose, Engine as _};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Cursor;

const WAV_FORMAT_PCM: u16 = 1;

pub struct AudioProcessor {
    format: AudioFormat,
}

impl AudioProcessor {
    pub fn new(format: AudioFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// Decode a base64 payload into PCM bytes.
    ///
    /// ## Returns:
    /// - **EmptyAudio**: the payload (or what it decodes to) is empty
    /// - **InvalidAudio**: bad base64, a malformed WAV, or a format mismatch
    pub fn decode(&self, payload: &str) -> Result<AudioBuffer, TranscriptionError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| TranscriptionError::InvalidAudio(format!("audio_data is not valid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let pcm = if bytes.starts_with(b"RIFF") {
            self.unwrap_wav(&bytes)?
        } else {
            self.validate_pcm(&bytes)?;
            bytes
        };

        if pcm.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }
        Ok(AudioBuffer::new(pcm))
    }

    /// Raw PCM must hold a whole number of frames.
    fn validate_pcm(&self, data: &[u8]) -> Result<(), TranscriptionError> {
        let frame = self.format.frame_bytes();
        if frame > 0 && data.len() % frame != 0 {
            return Err(TranscriptionError::InvalidAudio(format!(
                "Audio data length {} is not a multiple of the {}-byte frame size",
                data.len(),
                frame
            )));
        }
        Ok(())
    }

    fn unwrap_wav(&self, data: &[u8]) -> Result<Vec<u8>, TranscriptionError> {
        let (header, track) = wav::read(&mut Cursor::new(data))
            .map_err(|e| TranscriptionError::InvalidAudio(format!("Malformed WAV data: {}", e)))?;

        if header.audio_format != WAV_FORMAT_PCM {
            return Err(TranscriptionError::InvalidAudio(format!(
                "Unsupported WAV encoding {}, expected PCM",
                header.audio_format
            )));
        }
        if header.sampling_rate != self.format.sample_rate {
            return Err(TranscriptionError::InvalidAudio(format!(
                "Sample rate mismatch: expected {}, got {}",
                self.format.sample_rate, header.sampling_rate
            )));
        }
        if header.channel_count != self.format.channels as u16 {
            return Err(TranscriptionError::InvalidAudio(format!(
                "Channel count mismatch: expected {}, got {}",
                self.format.channels, header.channel_count
            )));
        }

        match track {
            wav::BitDepth::Sixteen(samples) => {
                let mut pcm = Vec::with_capacity(samples.len() * 2);
                for sample in samples {
                    pcm.write_i16::<LittleEndian>(sample)
                        .map_err(|e| TranscriptionError::InvalidAudio(e.to_string()))?;
                }
                Ok(pcm)
            }
            _ => Err(TranscriptionError::InvalidAudio(format!(
                "Bit depth mismatch: expected {}, got {}",
                self.format.bit_depth, header.bits_per_sample
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> AudioProcessor {
        AudioProcessor::new(AudioFormat::default())
    }

    /// Canonical 44-byte RIFF header followed by 16-bit samples.
    fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.write_u32::<LittleEndian>(36 + data_len).unwrap();
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.write_u32::<LittleEndian>(16).unwrap();
        out.write_u16::<LittleEndian>(WAV_FORMAT_PCM).unwrap();
        out.write_u16::<LittleEndian>(channels).unwrap();
        out.write_u32::<LittleEndian>(sample_rate).unwrap();
        out.write_u32::<LittleEndian>(sample_rate * channels as u32 * 2).unwrap();
        out.write_u16::<LittleEndian>(channels * 2).unwrap();
        out.write_u16::<LittleEndian>(16).unwrap();
        out.extend_from_slice(b"data");
        out.write_u32::<LittleEndian>(data_len).unwrap();
        for s in samples {
            out.write_i16::<LittleEndian>(*s).unwrap();
        }
        out
    }

    #[test]
    fn test_raw_pcm_passes_through() {
        let pcm: Vec<u8> = (0..8i16).flat_map(|s| (s * 1000).to_le_bytes()).collect();
        let buffer = processor().decode(&general_purpose::STANDARD.encode(&pcm)).unwrap();
        assert_eq!(buffer.bytes(), pcm.as_slice());
    }

    #[test]
    fn test_wav_header_is_stripped() {
        let samples = [0i16, 1200, -1200, 32767, -32768];
        let encoded = general_purpose::STANDARD.encode(wav_bytes(16000, 1, &samples));
        let buffer = processor().decode(&encoded).unwrap();
        let expected: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        assert_eq!(buffer.bytes(), expected.as_slice());
    }

    #[test]
    fn test_wav_format_mismatch() {
        let encoded = general_purpose::STANDARD.encode(wav_bytes(44100, 1, &[1, 2, 3]));
        match processor().decode(&encoded) {
            Err(TranscriptionError::InvalidAudio(msg)) => assert!(msg.contains("Sample rate")),
            other => panic!("Expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_invalid_payloads() {
        assert_eq!(processor().decode(""), Err(TranscriptionError::EmptyAudio));
        assert_eq!(processor().decode("   "), Err(TranscriptionError::EmptyAudio));
        assert!(matches!(processor().decode("@@not base64@@"), Err(TranscriptionError::InvalidAudio(_))));

        // 15 bytes cannot hold whole 16-bit samples
        let odd = general_purpose::STANDARD.encode([0u8; 15]);
        assert!(matches!(processor().decode(&odd), Err(TranscriptionError::InvalidAudio(_))));
    }
}
