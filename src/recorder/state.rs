//! Recording state management
//!
//! Defines the recording state machine, the fixed encoding options, and the
//! assembled recording type.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::media::MediaType;

/// Current state of the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    /// No recording in progress
    Idle,
    /// Currently recording
    Recording,
    /// Stop requested, chunks being assembled
    Stopping,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Options for one recording session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    /// Source container/codec the stream is recorded as
    pub media_type: MediaType,

    /// Audio bitrate in bits per second
    pub audio_bits_per_second: u32,

    /// Video bitrate in bits per second
    pub video_bits_per_second: u32,

    /// Interval on which buffered data is cut into a chunk
    #[serde(skip)]
    pub timeslice: Duration,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            media_type: MediaType::webm_h264(),
            audio_bits_per_second: 128_000,
            video_bits_per_second: 2_500_000,
            timeslice: Duration::from_millis(100),
        }
    }
}

/// A completed recording: all chunks concatenated in emission order,
/// tagged with the source media type. Immutable once assembled.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Assembled container bytes
    pub data: Vec<u8>,

    /// Source media type the data was recorded as
    pub media_type: MediaType,

    /// Number of chunks the data was assembled from
    pub chunk_count: usize,

    /// Wall-clock duration of the recording
    pub duration: Duration,
}

impl Recording {
    /// Total size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the recording holds no data (started then immediately stopped)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_use_documented_bitrates() {
        let opts = RecordingOptions::default();
        assert_eq!(opts.audio_bits_per_second, 128_000);
        assert_eq!(opts.video_bits_per_second, 2_500_000);
        assert_eq!(opts.timeslice, Duration::from_millis(100));
        assert_eq!(opts.media_type, MediaType::webm_h264());
    }

    #[test]
    fn recorder_starts_idle() {
        assert_eq!(RecorderState::default(), RecorderState::Idle);
    }
}
