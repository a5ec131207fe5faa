//! Pure integer helpers behind the arithmetic operations.

/// Primality by 6k±1 trial division.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5u64;
    // i <= n / i instead of i * i <= n: the square overflows near u64::MAX
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Greatest common divisor, iterative Euclid.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Least common multiple, or `None` if it does not fit in a `u128`.
pub fn lcm(a: u128, b: u128) -> Option<u128> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// The first `n` Fibonacci numbers, starting `0, 1, 1, 2, …`.
///
/// Every term up to index 185 fits a `u128`; past that the sequence stops
/// at the last representable term.
pub fn fibonacci(n: usize) -> Vec<u128> {
    std::iter::successors(Some((0u128, 1u128)), |&(a, b)| {
        a.checked_add(b).map(|next| (b, next))
    })
    .map(|(a, _)| a)
    .take(n)
    .collect()
}
