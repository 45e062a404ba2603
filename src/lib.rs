//! Transcription record store with owner indexes and expiry sweeping.
//!
//! Records live in a key-value backend under `transcription:{id}`, with a
//! per-owner id list under `user_transcriptions:{owner}`. See
//! [`daemon::services::transcription`] for the store itself.

#![deny(unsafe_code)]

pub mod commands;
pub mod config;
pub mod constants;
pub mod daemon;
