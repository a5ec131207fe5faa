//! Request decoding: one operation key in, one typed [`Command`] out.
//!
//! Decoding happens in two stages. The body is first parsed into
//! [`Operation`], an externally tagged enum, which only succeeds for an
//! object holding exactly one recognized key. The payload of that key is
//! then shape-checked into a [`Command`] the dispatcher can run without
//! further checks.

use serde::Deserialize;
use serde_json::Value;

use crate::consts::{
    FIBONACCI_MAX, FIBONACCI_MIN, PRIME_MAX_LEN, QUESTION_MAX_CHARS, REDUCER_MAX_LEN,
    REDUCER_MIN_LEN,
};
use crate::error::{Reducer, ValidationError};

/// The raw request: which key was sent, with its untouched payload.
#[derive(Debug, Deserialize)]
enum Operation {
    #[serde(rename = "fibonacci")]
    Fibonacci(Value),
    #[serde(rename = "prime")]
    Prime(Value),
    #[serde(rename = "lcm")]
    Lcm(Value),
    #[serde(rename = "hcf")]
    Hcf(Value),
    #[serde(rename = "AI")]
    Ai(Value),
}

/// A validated request, ready to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Length of the sequence to generate.
    Fibonacci(usize),
    /// Candidates to filter. Elements are not checked; non-integers are dropped later.
    Prime(Vec<Value>),
    Lcm(Vec<u64>),
    Hcf(Vec<u64>),
    /// Trimmed question text.
    Ai(String),
}

impl Command {
    /// Decode and validate a request body.
    pub fn parse(body: Value) -> Result<Self, ValidationError> {
        let operation: Operation =
            serde_json::from_value(body).map_err(|_| ValidationError::InvalidKeySet)?;

        match operation {
            Operation::Fibonacci(value) => parse_fibonacci(&value),
            Operation::Prime(value) => parse_prime(value),
            Operation::Lcm(value) => parse_reducer(value, Reducer::Lcm).map(Command::Lcm),
            Operation::Hcf(value) => parse_reducer(value, Reducer::Hcf).map(Command::Hcf),
            Operation::Ai(value) => parse_question(&value),
        }
    }
}

/// A JSON number with no fractional part. `5` and `5.0` both qualify.
pub fn as_integer(value: &Value) -> Option<i128> {
    if let Some(n) = value.as_i64() {
        return Some(n.into());
    }
    if let Some(n) = value.as_u64() {
        return Some(n.into());
    }
    let f = value.as_f64()?;
    // `as` saturates, so out-of-range floats fail the callers' range checks
    (f.is_finite() && f.fract() == 0.0).then_some(f as i128)
}

fn parse_fibonacci(value: &Value) -> Result<Command, ValidationError> {
    as_integer(value)
        .filter(|n| (FIBONACCI_MIN..=FIBONACCI_MAX).contains(n))
        .and_then(|n| usize::try_from(n).ok())
        .map(Command::Fibonacci)
        .ok_or(ValidationError::Fibonacci)
}

fn parse_prime(value: Value) -> Result<Command, ValidationError> {
    match value {
        Value::Array(items) if !items.is_empty() && items.len() <= PRIME_MAX_LEN => {
            Ok(Command::Prime(items))
        }
        _ => Err(ValidationError::Prime),
    }
}

fn parse_reducer(value: Value, reducer: Reducer) -> Result<Vec<u64>, ValidationError> {
    let items = match value {
        Value::Array(items) if (REDUCER_MIN_LEN..=REDUCER_MAX_LEN).contains(&items.len()) => {
            items
        }
        _ => return Err(ValidationError::ReducerShape(reducer)),
    };

    items
        .iter()
        .map(|item| {
            as_integer(item)
                .filter(|&n| n > 0)
                .and_then(|n| u64::try_from(n).ok())
                .ok_or(ValidationError::ReducerElement(reducer))
        })
        .collect()
}

fn parse_question(value: &Value) -> Result<Command, ValidationError> {
    let Some(question) = value.as_str() else {
        return Err(ValidationError::Question);
    };
    let trimmed = question.trim();
    if trimmed.is_empty() || question.chars().count() > QUESTION_MAX_CHARS {
        return Err(ValidationError::Question);
    }
    Ok(Command::Ai(trimmed.to_string()))
}
