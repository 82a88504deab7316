//! Integration test crate for MotionTrack.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! Synthetic videos are fed through the real frame source, tracking
//! pipeline and analysis stages.

#[cfg(test)]
mod synthetic;

#[cfg(test)]
mod pipeline;

#[cfg(test)]
mod outputs;
