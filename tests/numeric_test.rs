use bfhl::numeric::{fibonacci, gcd, is_prime, lcm};

fn naive_is_prime(n: u64) -> bool {
    n > 1 && (2..n).all(|d| n % d != 0)
}

#[test]
fn fibonacci_recurrence_holds() {
    for n in 1..=100 {
        let series = fibonacci(n);
        assert_eq!(series.len(), n);
        assert_eq!(series[0], 0);
        if n >= 2 {
            assert_eq!(series[1], 1);
        }
        for i in 2..n {
            assert_eq!(series[i], series[i - 1] + series[i - 2]);
        }
    }
}

#[test]
fn is_prime_agrees_with_trial_division() {
    for n in 0..3_000 {
        assert_eq!(is_prime(n), naive_is_prime(n), "mismatch at {}", n);
    }
}

#[test]
fn gcd_lcm_identity() {
    for a in 1u128..=60 {
        for b in 1u128..=60 {
            let g = gcd(a, b);
            let l = lcm(a, b).unwrap();
            assert_eq!(g * l, a * b);
            assert_eq!(a % g, 0);
            assert_eq!(b % g, 0);
        }
    }
}
