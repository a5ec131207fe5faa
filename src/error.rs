use axum::http::StatusCode;
use std::fmt;

use crate::consts::{FIBONACCI_MAX, FIBONACCI_MIN, PRIME_MAX_LEN, QUESTION_MAX_CHARS};

/// The two array reducers share their shape rules and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Lcm,
    Hcf,
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Lcm => f.write_str("lcm"),
            Reducer::Hcf => f.write_str("hcf"),
        }
    }
}

/// Input the service refuses to compute on. Always reported as `400`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Exactly one key from fibonacci, prime, lcm, hcf, or AI is required.")]
    InvalidKeySet,

    #[error(
        "fibonacci must be an integer between {} and {}.",
        FIBONACCI_MIN,
        FIBONACCI_MAX
    )]
    Fibonacci,

    #[error("prime must be a non-empty array of up to {} integers.", PRIME_MAX_LEN)]
    Prime,

    #[error("{0} must be an array of 2 to 10 positive integers.")]
    ReducerShape(Reducer),

    #[error("All elements in {0} array must be positive integers.")]
    ReducerElement(Reducer),

    #[error("{0} result is too large to represent.")]
    Overflow(Reducer),

    #[error("AI must be a non-empty string up to {} characters.", QUESTION_MAX_CHARS)]
    Question,
}

/// Anything that ends a `/bfhl` request without data.
///
/// Unexpected failures never reach this type: a panicking handler is
/// turned into the generic `500` envelope by the router's panic layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The transport refused the body before validation (bad JSON, too large, …).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}
