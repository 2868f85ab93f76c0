//! GitHub Actions as a source of run metadata and job logs.

pub mod client;
pub mod source;

pub use client::GitHubClient;
pub use source::{LogSource, SourceError};
