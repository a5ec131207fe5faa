//! Project-wide constants.

/// Contact address echoed in every response envelope unless overridden.
pub const DEFAULT_OFFICIAL_EMAIL: &str = "anshika0034.be23@chitkara.edu.in";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum accepted request body: 10 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Requests allowed per client per window.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Rate limit window in seconds.
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;

/// Upper bound on a single AI call, in seconds.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Returned in place of an AI answer that is missing or not a single word.
pub const UNKNOWN_ANSWER: &str = "Unknown";

pub const FIBONACCI_MIN: i128 = 1;
pub const FIBONACCI_MAX: i128 = 100;
pub const PRIME_MAX_LEN: usize = 100;
pub const REDUCER_MIN_LEN: usize = 2;
pub const REDUCER_MAX_LEN: usize = 10;
pub const QUESTION_MAX_CHARS: usize = 500;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";
pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_ordered() {
        assert!(FIBONACCI_MIN <= FIBONACCI_MAX);
        assert!(REDUCER_MIN_LEN <= REDUCER_MAX_LEN);
        assert!(PRIME_MAX_LEN > 0);
    }

    #[test]
    fn sentinel_is_a_single_word() {
        assert!(!UNKNOWN_ANSWER.contains(char::is_whitespace));
    }

    #[test]
    fn body_limit_is_ten_mebibytes() {
        assert_eq!(DEFAULT_BODY_LIMIT, 10_485_760);
    }
}
