//! Per-clip feature extraction modules
//!
//! This module contains the stages every clip passes through after trimming:
//! - MFCC computation (mel filterbank + log + DCT)
//! - Per-coefficient z-score normalization
//! - Temporal aggregation into a fixed-length vector

pub mod aggregation;
pub mod mel;
pub mod mfcc;
pub mod normalization;
