//! AI completion backends behind one dispatch point.

pub mod prompt;
pub mod provider;
pub mod providers;

pub use prompt::{PromptContext, PromptTemplate};
pub use provider::{LlmError, LlmProvider, ProviderKind};
pub use providers::{complete, create_provider, ProviderSettings};
