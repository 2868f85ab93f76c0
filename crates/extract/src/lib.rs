//! Log-relevance extraction for failed CI runs.
//!
//! Reduces the concatenated logs of every failed job to a short excerpt
//! worth sending to a language model:
//! - [`CorpusBuilder`] assembles per-job logs into one [`LogCorpus`]
//! - [`SignatureSet`] decides which lines look like errors
//! - [`extract`] keeps a context window around every matching line
//! - [`tail`] is the fallback when nothing matched
//!
//! Nothing in this crate performs I/O.

pub mod corpus;
pub mod extractor;
pub mod signature;

pub use corpus::{is_job_marker, CorpusBuilder, JobEntry, LogCorpus};
pub use extractor::{
    extract, match_windows, tail, Excerpt, ExcerptStrategy, ExtractOptions, MatchWindow,
    SKIPPED_MARKER,
};
pub use signature::{Signature, SignatureSet};
