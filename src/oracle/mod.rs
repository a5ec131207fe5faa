pub mod anthropic;
pub mod gemini;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

/// The text-generation capability behind the `AI` operation.
///
/// Given a prompt, return the model's raw text or fail. Shaping the reply
/// into a one-word answer is [`crate::answer`]'s job, not the oracle's.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn ask(&self, prompt: &str) -> Result<String>;
}

/// Read a credential from the environment. Empty counts as missing.
pub fn env_credential(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|key| !key.is_empty())
}
