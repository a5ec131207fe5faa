use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Oracle;

/// One scripted behaviour of a [`MockOracle`].
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Sleep before answering, to exercise timeouts.
    Slow(Duration, String),
    /// Panic inside `ask`, to exercise the server's panic handling.
    Panic(String),
}

/// A scripted oracle for tests. Returns pre-defined replies in order.
pub struct MockOracle {
    replies: Vec<Reply>,
    index: AtomicUsize,
}

impl MockOracle {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
        }
    }

    /// Always answers with `text`.
    pub fn answering(text: &str) -> Self {
        Self::new(vec![Reply::Text(text.to_string())])
    }

    /// Always fails with `error`.
    pub fn failing(error: &str) -> Self {
        Self::new(vec![Reply::Fail(error.to_string())])
    }

    /// How many times `ask` has been called.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for MockOracle {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ask(&self, _prompt: &str) -> Result<String> {
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        // The last reply repeats once the script runs out
        let reply = self
            .replies
            .get(i)
            .or_else(|| self.replies.last())
            .ok_or_else(|| anyhow::anyhow!("MockOracle: no replies scripted"))?;

        match reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(error) => anyhow::bail!("{}", error),
            Reply::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(text.clone())
            }
            Reply::Panic(message) => panic!("{}", message),
        }
    }
}
