//! Audio I/O modules
//!
//! Audio decoding with Symphonia, the waveform types every stage consumes,
//! frame windowing, and the sink through which intermediate artifacts are
//! handed back to the caller.

pub mod decoder;
pub mod frames;
pub mod sink;
pub mod waveform;
