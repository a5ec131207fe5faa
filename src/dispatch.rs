//! Runs a validated [`Command`] and produces its result payload.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::answer;
use crate::command::{Command, as_integer};
use crate::error::{Reducer, ValidationError};
use crate::numeric;
use crate::oracle::Oracle;

/// The `data` field of a success envelope.
///
/// Serialized untagged: a sequence, a single integer, or a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Data {
    Sequence(Vec<u128>),
    Primes(Vec<u64>),
    Number(u128),
    Word(String),
}

/// Maps each command to the numeric toolkit or the oracle.
pub struct Dispatcher {
    oracle: Arc<dyn Oracle>,
    ai_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(oracle: Arc<dyn Oracle>, ai_timeout: Option<Duration>) -> Self {
        Self { oracle, ai_timeout }
    }

    pub async fn dispatch(&self, command: Command) -> Result<Data, ValidationError> {
        match command {
            Command::Fibonacci(n) => Ok(Data::Sequence(numeric::fibonacci(n))),
            Command::Prime(items) => Ok(Data::Primes(filter_primes(&items))),
            Command::Lcm(items) => fold_lcm(&items).map(Data::Number),
            Command::Hcf(items) => Ok(Data::Number(fold_hcf(&items))),
            Command::Ai(question) => {
                let answer = answer::ask(self.oracle.as_ref(), &question, self.ai_timeout).await;
                Ok(Data::Word(answer.into_word()))
            }
        }
    }
}

/// Integer elements that are prime, in input order. Everything else is dropped.
fn filter_primes(items: &[Value]) -> Vec<u64> {
    items
        .iter()
        .filter_map(as_integer)
        .filter_map(|n| u64::try_from(n).ok())
        .filter(|&n| n >= 2 && numeric::is_prime(n))
        .collect()
}

fn fold_lcm(items: &[u64]) -> Result<u128, ValidationError> {
    let (first, rest) = items
        .split_first()
        .ok_or(ValidationError::ReducerShape(Reducer::Lcm))?;
    rest.iter().try_fold(u128::from(*first), |acc, &n| {
        numeric::lcm(acc, n.into()).ok_or(ValidationError::Overflow(Reducer::Lcm))
    })
}

fn fold_hcf(items: &[u64]) -> u128 {
    items
        .iter()
        .map(|&n| u128::from(n))
        .reduce(numeric::gcd)
        .unwrap_or_default()
}
