//! # Audio Buffer and Window Layout
//!
//! An answer arrives as one complete recording, so the buffer is immutable:
//! it holds the 16-bit little-endian PCM bytes of a single upload and is cut
//! into overlapping windows for transcription.
//!
//! ## Window Layout:
//! ```text
//! cursor=0        w           2w          3w
//! |---- window 0 ----|o|
//!                 |---- window 1 ----|o|
//!                             |-- window 2 (tail) --|
//! ```
//! Each window starts at the cursor and reads `window + overlap` bytes,
//! clipped to the buffer end. The cursor then advances by `window`, so the
//! overlap is re-read by the next window and words cut at a boundary appear
//! whole in one of the two transcripts.

use crate::config::AudioSettings;
use std::ops::Range;

/// Expected PCM format of uploaded audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u8,
    pub bit_depth: u8,
}

impl AudioFormat {
    pub fn from_config(audio: &AudioSettings) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            bit_depth: audio.bit_depth,
        }
    }

    /// Bytes in one frame (one sample for every channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * (self.bit_depth as usize / 8)
    }

    /// Byte length of `ms` milliseconds of audio, rounded down to whole frames.
    ///
    /// ## Example:
    /// 16kHz, mono, 16-bit: 5000ms * 16000Hz * 2 bytes / 1000 = 160,000 bytes
    pub fn bytes_for_ms(&self, ms: u32) -> usize {
        let frames = ms as u64 * self.sample_rate as u64 / 1000;
        frames as usize * self.frame_bytes()
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            bit_depth: 16,
        }
    }
}

/// Window and overlap sizes in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    pub window_bytes: usize,
    pub overlap_bytes: usize,
}

impl WindowLayout {
    pub fn new(window_bytes: usize, overlap_bytes: usize) -> Self {
        Self {
            window_bytes,
            overlap_bytes,
        }
    }

    pub fn from_config(audio: &AudioSettings) -> Self {
        let format = AudioFormat::from_config(audio);
        Self::new(
            format.bytes_for_ms(audio.window_duration_ms),
            format.bytes_for_ms(audio.overlap_duration_ms),
        )
    }

    /// Byte ranges of every window over a buffer of `len` bytes, in order.
    ///
    /// Empty for an empty buffer. A zero window size yields a single window
    /// covering the whole buffer instead of looping forever.
    pub fn windows(&self, len: usize) -> Vec<Range<usize>> {
        if len == 0 {
            return Vec::new();
        }
        if self.window_bytes == 0 {
            return vec![0..len];
        }

        let mut ranges = Vec::with_capacity(len.div_ceil(self.window_bytes));
        let mut cursor = 0;
        while cursor < len {
            let end = (cursor + self.window_bytes + self.overlap_bytes).min(len);
            ranges.push(cursor..end);
            cursor += self.window_bytes;
        }
        ranges
    }
}

impl Default for WindowLayout {
    fn default() -> Self {
        Self::new(160_000, 16_000)
    }
}

/// One complete recording of raw PCM bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioBuffer {
    pcm: Vec<u8>,
}

impl AudioBuffer {
    pub fn new(pcm: Vec<u8>) -> Self {
        Self { pcm }
    }

    #[cfg(test)]
    pub fn bytes(&self) -> &[u8] {
        &self.pcm
    }

    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    /// Duration of the recording in the given format.
    pub fn duration_seconds(&self, format: &AudioFormat) -> f64 {
        let bytes_per_second = format.sample_rate as usize * format.frame_bytes();
        if bytes_per_second == 0 {
            return 0.0;
        }
        self.pcm.len() as f64 / bytes_per_second as f64
    }

    /// Slice out one window.
    pub fn window(&self, range: Range<usize>) -> &[u8] {
        &self.pcm[range]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_layout_from_default_config() {
        let layout = WindowLayout::from_config(&AppConfig::default().audio);
        assert_eq!(layout, WindowLayout::new(160_000, 16_000));
    }

    #[test]
    fn test_single_window_for_exact_length() {
        let layout = WindowLayout::default();
        assert_eq!(layout.windows(160_000), vec![0..160_000]);
    }

    #[test]
    fn test_windows_overlap_and_clip() {
        let layout = WindowLayout::default();
        assert_eq!(
            layout.windows(400_000),
            vec![0..176_000, 160_000..336_000, 320_000..400_000]
        );
        // Exactly two windows: the second starts at w and is clipped to w bytes.
        assert_eq!(layout.windows(320_000), vec![0..176_000, 160_000..320_000]);
    }

    #[test]
    fn test_small_and_empty_buffers() {
        let layout = WindowLayout::new(10, 2);
        assert!(layout.windows(0).is_empty());
        assert_eq!(layout.windows(3), vec![0..3]);
        assert_eq!(WindowLayout::new(0, 2).windows(7), vec![0..7]);
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::new(vec![0u8; 64_000]);
        assert_eq!(buffer.duration_seconds(&AudioFormat::default()), 2.0);
        assert_eq!(buffer.window(10..12).len(), 2);
    }
}
