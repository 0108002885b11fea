//! Encode Tracker
//!
//! This library submits and tracks asynchronous transcoding jobs against the
//! Zencoder encoding service. Zencoder reports a single job through separate
//! endpoints with separate schemas and separate state vocabularies; the
//! reconciliation engine merges those responses into one canonical, immutable
//! snapshot per job.

pub mod config;
pub mod models;
pub mod services;
