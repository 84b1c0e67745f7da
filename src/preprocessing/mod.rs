//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for feature extraction:
//! - Silence detection and trimming
//! - Channel mixing (multichannel to mono)

pub mod channel_mixer;
pub mod silence;
