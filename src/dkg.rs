//! Distributed key generation view (§3/§4 "DKG view").
//!
//! The core consumes DKG purely as a read-only accessor for the local
//! secret share, the per-party public keys, the polynomial-in-exponent, the
//! joint public key, and the basic generator — key generation itself (the
//! CCA2 channel distributing shares, the dealing protocol) is out of scope
//! and consumed as a black box (§1/§9).
//!
//! [`TrustedDealerDkg`] is the reference implementation this crate tests
//! against: an actual Feldman-VSS dealer producing a degree-`(t-1)`
//! polynomial, rather than the additive n-of-n keying `shuffler::cluster`
//! uses (grounding noted in DESIGN.md).

use ark_ff::UniformRand;
use rand::Rng;

use crate::byte_tree::ByteTree;
use crate::group::GroupElement;

/// Read-only accessor for one party's view of a completed DKG run.
pub trait DkgView<C: GroupElement> {
    fn basic_generator(&self) -> C;
    fn party_count(&self) -> usize;
    fn threshold(&self) -> usize;
    fn own_index(&self) -> usize;
    /// `y_l`, the public key of party `l` (1-based).
    fn public_key(&self, party: usize) -> C;
    /// `x_j`, this party's own secret share.
    fn own_secret_share(&self) -> C::Scalar;
    /// `Y`, the joint public key.
    fn joint_public_key(&self) -> C;
    /// Canonical transcript bytes for the polynomial-in-exponent (Feldman
    /// commitments), persisted as `PolynomialInExponent.bt`.
    fn polynomial_in_exponent_bytes(&self) -> ByteTree;
    /// Liveness snapshot at session start.
    fn is_active(&self, party: usize) -> bool;
}

/// Feldman-VSS dealer output: a random degree-`(t-1)` polynomial `f` with
/// `f(0)` the joint secret, shares `x_l = f(l)`, and public commitments
/// `A_i = g^{a_i}` to its coefficients (`A_0 = Y`).
pub struct TrustedDealerDkg<C: GroupElement> {
    generator: C,
    threshold: usize,
    commitments: Vec<C>,
    shares: Vec<C::Scalar>,
    active: Vec<bool>,
}

impl<C: GroupElement> TrustedDealerDkg<C> {
    /// Deal fresh shares for `k` parties with reconstruction threshold `t`,
    /// all initially active.
    pub fn deal<R: Rng>(rng: &mut R, k: usize, t: usize) -> Self {
        assert!(t >= 1 && t <= k, "threshold must be in 1..=k");
        let generator = C::generator();
        let coefficients: Vec<C::Scalar> = (0..t).map(|_| C::Scalar::rand(rng)).collect();
        let commitments = coefficients.iter().map(|a| generator.exp(a)).collect();
        let shares = (1..=k)
            .map(|l| evaluate_polynomial(&coefficients, C::Scalar::from(l as u64)))
            .collect();
        TrustedDealerDkg {
            generator,
            threshold: t,
            commitments,
            shares,
            active: vec![true; k],
        }
    }

    /// The per-party view handed to party `index` (1-based).
    pub fn view_for(&self, index: usize) -> StaticDkgView<C> {
        StaticDkgView {
            generator: self.generator.clone(),
            threshold: self.threshold,
            own_index: index,
            public_keys: self
                .shares
                .iter()
                .map(|x| self.generator.exp(x))
                .collect(),
            own_secret_share: self.shares[index - 1],
            joint_public_key: self.commitments[0].clone(),
            commitments: self.commitments.clone(),
            active: self.active.clone(),
        }
    }

    pub fn set_active(&mut self, party: usize, active: bool) {
        self.active[party - 1] = active;
    }
}

fn evaluate_polynomial<F: ark_ff::PrimeField>(coefficients: &[F], x: F) -> F {
    let mut acc = F::zero();
    for a in coefficients.iter().rev() {
        acc = acc * x + a;
    }
    acc
}

/// A concrete, immutable [`DkgView`] snapshot handed to one party.
#[derive(Clone)]
pub struct StaticDkgView<C: GroupElement> {
    generator: C,
    threshold: usize,
    own_index: usize,
    public_keys: Vec<C>,
    own_secret_share: C::Scalar,
    joint_public_key: C,
    commitments: Vec<C>,
    active: Vec<bool>,
}

impl<C: GroupElement> DkgView<C> for StaticDkgView<C> {
    fn basic_generator(&self) -> C {
        self.generator.clone()
    }

    fn party_count(&self) -> usize {
        self.public_keys.len()
    }

    fn threshold(&self) -> usize {
        self.threshold
    }

    fn own_index(&self) -> usize {
        self.own_index
    }

    fn public_key(&self, party: usize) -> C {
        self.public_keys[party - 1].clone()
    }

    fn own_secret_share(&self) -> C::Scalar {
        self.own_secret_share
    }

    fn joint_public_key(&self) -> C {
        self.joint_public_key.clone()
    }

    fn polynomial_in_exponent_bytes(&self) -> ByteTree {
        ByteTree::node(
            self.commitments
                .iter()
                .map(|c| ByteTree::leaf(c.to_bytes()))
                .collect::<Vec<_>>(),
        )
    }

    fn is_active(&self, party: usize) -> bool {
        self.active[party - 1]
    }
}
