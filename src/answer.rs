//! Turns a free-text oracle reply into a one-word answer.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::consts::UNKNOWN_ANSWER;
use crate::oracle::Oracle;

/// Why no usable word came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degraded {
    /// The reply had more than one token. Carries the trimmed reply.
    NotOneWord(String),
    Empty,
    /// The oracle failed. Carries the error text.
    Upstream(String),
    TimedOut,
}

/// Outcome of asking the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Word(String),
    Degraded(Degraded),
}

impl Answer {
    /// The single string exposed to clients: the word, or `"Unknown"`.
    pub fn into_word(self) -> String {
        match self {
            Answer::Word(word) => word,
            Answer::Degraded(_) => UNKNOWN_ANSWER.to_string(),
        }
    }

    /// Classify a raw reply.
    pub fn from_reply(reply: &str) -> Self {
        let trimmed = reply.trim();
        if trimmed.is_empty() {
            Answer::Degraded(Degraded::Empty)
        } else if trimmed.contains(char::is_whitespace) {
            Answer::Degraded(Degraded::NotOneWord(trimmed.to_string()))
        } else {
            Answer::Word(trimmed.to_string())
        }
    }
}

pub fn prompt_for(question: &str) -> String {
    format!("Answer the following question in exactly one word: {}", question)
}

/// Ask `oracle` for a one-word answer. Never fails: every problem degrades.
pub async fn ask(oracle: &dyn Oracle, question: &str, timeout: Option<Duration>) -> Answer {
    let prompt = prompt_for(question);
    let reply = match timeout {
        Some(limit) => match tokio::time::timeout(limit, oracle.ask(&prompt)).await {
            Ok(reply) => reply,
            Err(_) => {
                warn!(oracle = oracle.name(), ?limit, "AI call timed out");
                return Answer::Degraded(Degraded::TimedOut);
            }
        },
        None => oracle.ask(&prompt).await,
    };

    match reply {
        Ok(text) => {
            let answer = Answer::from_reply(&text);
            if let Answer::Degraded(reason) = &answer {
                debug!(oracle = oracle.name(), ?reason, "AI reply is not a single word");
            }
            answer
        }
        Err(e) => {
            error!(oracle = oracle.name(), error = %format!("{:#}", e), "AI error");
            Answer::Degraded(Degraded::Upstream(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::mock::{MockOracle, Reply};

    #[test]
    fn single_token_kept() {
        assert_eq!(Answer::from_reply("  Paris\n"), Answer::Word("Paris".to_string()));
    }

    #[test]
    fn multiple_tokens_degrade() {
        assert_eq!(
            Answer::from_reply("Paris, France"),
            Answer::Degraded(Degraded::NotOneWord("Paris, France".to_string()))
        );
        assert!(matches!(
            Answer::from_reply("Paris\tFrance"),
            Answer::Degraded(Degraded::NotOneWord(_))
        ));
    }

    #[test]
    fn blank_reply_degrades() {
        assert_eq!(Answer::from_reply("  "), Answer::Degraded(Degraded::Empty));
    }

    #[test]
    fn degraded_becomes_unknown() {
        assert_eq!(Answer::Degraded(Degraded::TimedOut).into_word(), "Unknown");
        assert_eq!(Answer::Word("Paris".to_string()).into_word(), "Paris");
    }

    #[test]
    fn prompt_wraps_question() {
        assert_eq!(
            prompt_for("Capital of France?"),
            "Answer the following question in exactly one word: Capital of France?"
        );
    }

    #[tokio::test]
    async fn upstream_error_degrades() {
        let oracle = MockOracle::failing("connection refused");
        let answer = ask(&oracle, "q", None).await;
        assert!(matches!(answer, Answer::Degraded(Degraded::Upstream(ref e)) if e.contains("refused")));
    }

    #[tokio::test]
    async fn slow_oracle_times_out() {
        let oracle = MockOracle::new(vec![Reply::Slow(
            Duration::from_secs(5),
            "Paris".to_string(),
        )]);
        let answer = ask(&oracle, "q", Some(Duration::from_millis(20))).await;
        assert_eq!(answer, Answer::Degraded(Degraded::TimedOut));
    }

    #[tokio::test]
    async fn fast_oracle_within_timeout() {
        let oracle = MockOracle::answering("Paris");
        let answer = ask(&oracle, "q", Some(Duration::from_secs(5))).await;
        assert_eq!(answer, Answer::Word("Paris".to_string()));
    }
}
