//! Storage services: the KV layer and the transcription store built on it.

pub mod kv;
pub mod transcription;
