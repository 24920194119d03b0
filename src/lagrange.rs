//! Shamir/Lagrange combination in the exponent, and the squared-product-of-
//! primes trick that clears Lagrange denominators so the exponents used in
//! the sigma protocol stay integral.
//!
//! Indices throughout this module are the protocol's 1-based party indices
//! `1..=k`, matching §3/§4.5.

use ark_ff::PrimeField;

use crate::config::MAX_PARTIES;

/// Primes up to and including `n`, found by trial division. `n <= 1009` in
/// every call site this crate makes (enforced by [`crate::config`]), so a
/// sieve isn't worth the code.
fn primes_up_to(n: usize) -> Vec<usize> {
    (2..=n).filter(|&candidate| is_prime(candidate)).collect()
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= n {
        if n.is_multiple_of(d) {
            return false;
        }
        d += 1;
    }
    true
}

/// `pi = (prod_{p prime, p <= k} p^floor(log_p k))^2`, reduced modulo the
/// ring's characteristic. Coprime to `q` for every `k <= 1009` (Testable
/// Property 2 in §8) because no prime in the product can equal `q`.
pub fn compute_pi<F: PrimeField>(k: usize) -> F {
    debug_assert!(k <= MAX_PARTIES);
    let mut base = F::one();
    for p in primes_up_to(k) {
        let mut power = p;
        let mut exponent = 0u32;
        while power <= k {
            exponent += 1;
            match power.checked_mul(p) {
                Some(next) => power = next,
                None => break,
            }
        }
        base *= F::from(p as u64).pow([exponent as u64]);
    }
    base * base
}

/// `1 / pi mod q`. Exists because [`compute_pi`] is coprime to `q` for every
/// supported `k`.
pub fn pi_inverse<F: PrimeField>(k: usize) -> F {
    compute_pi::<F>(k)
        .inverse()
        .expect("pi is coprime to q for every k <= MAX_PARTIES")
}

/// The ascending-order first `t` indices in `1..=correct.len()` with
/// `correct[index - 1] == true`, or `None` if fewer than `t` exist. Ties are
/// always broken by preferring the smallest index, per §4.6.
pub fn first_t_correct(correct: &[bool], t: usize) -> Option<Vec<usize>> {
    let indices: Vec<usize> = correct
        .iter()
        .enumerate()
        .filter(|(_, &ok)| ok)
        .map(|(i, _)| i + 1)
        .take(t)
        .collect();
    if indices.len() == t {
        Some(indices)
    } else {
        None
    }
}

/// Modified Lagrange coefficients `lambda_i = pi * prod_{l in indices, l !=
/// i} l / (l - i)` for every `i` in `indices`, evaluated at `x = 0`. `k` is
/// the protocol instance's configured party count (the same `k` that fixes
/// `pi`, not the size of `indices`).
///
/// Exponent minimization (picking the representative of smallest absolute
/// value and group-inverting for negative ones) is a concern specific to
/// bignum-exponent implementations; field arithmetic already reduces these
/// coefficients to their canonical representative mod `q`, and
/// `GroupElement::exp` handles negative logical exponents via the field's own
/// additive inverse, so this crate computes `lambda_i` directly as a field
/// element (see DESIGN.md).
pub fn modified_lagrange_coefficients<F: PrimeField>(indices: &[usize], k: usize) -> Vec<F> {
    let pi = compute_pi::<F>(k);
    indices
        .iter()
        .map(|&i| {
            let mut coefficient = pi;
            let i_f = F::from(i as u64);
            for &l in indices {
                if l == i {
                    continue;
                }
                let l_f = F::from(l as u64);
                coefficient *= l_f;
                coefficient *= (l_f - i_f).inverse().expect("distinct indices, l != i");
            }
            coefficient
        })
        .collect()
}
