//! Recording system module
//!
//! Implements the chunked recording flow:
//! - state machine and fixed encoding options
//! - Recorder driving a stream into 100 ms chunks
//! - assembly of ordered chunks into one recording on stop

pub mod recorder;
pub mod state;

pub use recorder::{RecordError, Recorder, RecorderEvent};
pub use state::{RecorderState, Recording, RecordingOptions};
