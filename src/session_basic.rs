//! `SessionBasic` — the pure sigma-protocol state machine (§4.5).
//!
//! No I/O: every method here is a deterministic function of its arguments
//! and the accumulated state. `Session` (orchestrator, `session.rs`) drives
//! this machine through Board exchanges, transcript writes, and the
//! optimistic-combine-then-fallback flow.

use ark_ff::{PrimeField, UniformRand, Zero};
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::ciphertext::CiphertextArray;
use crate::dkg::DkgView;
use crate::group::{GroupElement, GroupElementArray, RingElementArray};
use crate::lagrange::{compute_pi, first_t_correct, modified_lagrange_coefficients, pi_inverse};

const LOG_TARGET: &str = "threshold_decrypt::session_basic";

/// Lifecycle states from §4.5. `Session` drives transitions; this type only
/// records where the state machine currently is for debug assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Created,
    InstanceSet,
    Batched,
    Committed,
    Replied,
    Done,
}

/// Pure sigma-protocol state for one decryption session.
pub struct SessionBasic<C: GroupElement> {
    state: SessionState,

    own_index: usize,
    party_count: usize,
    threshold: usize,

    generator: C,
    left: GroupElementArray<C>,
    public_keys: Vec<C>,
    joint_public_key: C,
    own_secret_share: C::Scalar,

    pi: C::Scalar,
    pi_inv: C::Scalar,

    /// Per-party factors `f_l`, 0-indexed by `l - 1`. Populated by
    /// `set_peer_factor` for peers and `own_factor` for self.
    factors: Vec<Option<GroupElementArray<C>>>,
    correct: Vec<bool>,

    combined_factors: Option<GroupElementArray<C>>,
    batching_vector: Option<RingElementArray<C::Scalar>>,
    big_a: Option<C>,

    own_blinder: Option<C::Scalar>,
    /// `(y'_l, B'_l)` per party.
    commitments: Vec<Option<(C, C)>>,
    challenge: Option<C::Scalar>,
    replies: Vec<Option<C::Scalar>>,
}

impl<C: GroupElement> SessionBasic<C> {
    /// `setInstance`: fix the generator, ciphertext left component, per-party
    /// public keys, own secret share, and joint public key for this session.
    pub fn new<D: DkgView<C>>(dkg: &D, ciphertexts: &CiphertextArray<C>) -> Self {
        let k = dkg.party_count();
        let t = dkg.threshold();
        let own_index = dkg.own_index();
        let public_keys = (1..=k).map(|l| dkg.public_key(l)).collect();

        debug!(target: LOG_TARGET, own_index, k, t, n = ciphertexts.len(), "session instance set");

        SessionBasic {
            state: SessionState::InstanceSet,
            own_index,
            party_count: k,
            threshold: t,
            generator: dkg.basic_generator(),
            left: ciphertexts.u.clone(),
            public_keys,
            joint_public_key: dkg.joint_public_key(),
            own_secret_share: dkg.own_secret_share(),
            pi: compute_pi(k),
            pi_inv: pi_inverse(k),
            factors: vec![None; k],
            correct: vec![true; k],
            combined_factors: None,
            batching_vector: None,
            big_a: None,
            own_blinder: None,
            commitments: vec![None; k],
            challenge: None,
            replies: vec![None; k],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn correct(&self) -> &[bool] {
        &self.correct
    }

    pub fn own_index(&self) -> usize {
        self.own_index
    }

    pub fn party_count(&self) -> usize {
        self.party_count
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Explicitly flip a party's verdict to `false`, e.g. after the
    /// fallback separate-verification check rejects it. `correct` only ever
    /// moves `true -> false` (§3/§8 Testable Property 3).
    pub fn mark_incorrect(&mut self, party: usize, reason: &str) {
        self.flip_incorrect(party, reason);
    }

    pub fn left_component(&self) -> &GroupElementArray<C> {
        &self.left
    }

    /// `pi = (prod of first primes <= k)^2 mod q`, per §3/§9.
    pub fn pi(&self) -> C::Scalar {
        self.pi
    }

    fn flip_incorrect(&mut self, party: usize, reason: &str) {
        if self.correct[party - 1] {
            warn!(target: LOG_TARGET, party, reason, "party flipped to incorrect");
        }
        self.correct[party - 1] = false;
    }

    /// `f_j = u ^ (-x_j * pi^-1)`, pointwise. Computing `f_l` for `l` with
    /// pre-scaled exponent `pi^-1` means the later combination (raising each
    /// `f_l` to `pi * L_l(0)`) multiplies out to `u ^ (-sum L_l(0) x_l)`,
    /// i.e. `u ^ -s` for the reconstructed secret `s`.
    #[instrument(skip(self), level = "trace")]
    pub fn own_factor(&mut self) -> GroupElementArray<C> {
        let exponent = -(self.own_secret_share * self.pi_inv);
        let factor = self.left.exp(&exponent);
        self.factors[self.own_index - 1] = Some(factor.clone());
        factor
    }

    /// Record party `l`'s decryption-factor array. `None` marks the party
    /// inactive or its payload malformed (§4.6 step 3); the substitute
    /// factor is `u` itself (`u ^ 1`), keeping later arithmetic well-defined
    /// without a separate default-value type.
    pub fn set_peer_factor(&mut self, party: usize, factor: Option<GroupElementArray<C>>) {
        match factor {
            Some(f) if f.len() == self.left.len() => {
                self.factors[party - 1] = Some(f);
            }
            Some(_) => {
                self.flip_incorrect(party, "factor array wrong length");
                self.factors[party - 1] = Some(self.left.clone());
            }
            None => {
                self.flip_incorrect(party, "factor missing or malformed");
                self.factors[party - 1] = Some(self.left.clone());
            }
        }
    }

    pub fn factor(&self, party: usize) -> &GroupElementArray<C> {
        self.factors[party - 1]
            .as_ref()
            .expect("factor must be set before it is read back")
    }

    pub fn commitment(&self, party: usize) -> &(C, C) {
        self.commitments[party - 1]
            .as_ref()
            .expect("commitment must be set before it is read back")
    }

    pub fn reply_of(&self, party: usize) -> C::Scalar {
        self.replies[party - 1].expect("reply must be set before it is read back")
    }

    pub fn combined_factors(&self) -> Option<&GroupElementArray<C>> {
        self.combined_factors.as_ref()
    }

    /// Combine the current first-`t` `correct` parties' factors into `F_c`.
    /// Fails with `None` if fewer than `t` parties are currently `correct`.
    pub fn combine_factors(&mut self) -> Option<GroupElementArray<C>> {
        let indices = first_t_correct(&self.correct, self.threshold)?;
        let lambdas = modified_lagrange_coefficients::<C::Scalar>(&indices, self.party_count);
        let mut acc = GroupElementArray::new(vec![C::identity(); self.left.len()]);
        for (&l, &lambda) in indices.iter().zip(lambdas.iter()) {
            let f_l = self.factors[l - 1]
                .as_ref()
                .expect("factor must be set before combining");
            acc = acc
                .mul(&f_l.exp(&lambda))
                .expect("same-length arrays by construction");
        }
        self.combined_factors = Some(acc.clone());
        Some(acc)
    }

    /// Set the batching vector `e` (derived from the Challenger seed by
    /// `Session`) and compute `A = expProd(u, e)`.
    pub fn batch(&mut self, e: RingElementArray<C::Scalar>) {
        self.big_a = Some(
            self.left
                .exp_prod(&e)
                .expect("batching vector length matches ciphertext count"),
        );
        self.batching_vector = Some(e);
        self.state = SessionState::Batched;
    }

    fn batched_factor(&self, party: usize) -> C {
        let e = self.batching_vector.as_ref().expect("batch() called first");
        let f_l = self.factors[party - 1]
            .as_ref()
            .expect("factor must be set before batching it");
        f_l.exp_prod(e).expect("same length as e by construction")
    }

    /// Own commitment: `r <- random`, `(y'_j, B'_j) = (g^r, A^r)`.
    #[instrument(skip(self, rng), level = "trace")]
    pub fn commit<R: Rng>(&mut self, rng: &mut R) -> (C, C)
    where
        C::Scalar: PrimeField,
    {
        let r = C::Scalar::rand(rng);
        let big_a = self.big_a.clone().expect("batch() called first");
        let y_prime = self.generator.exp(&r);
        let b_prime = big_a.exp(&r);
        self.own_blinder = Some(r);
        self.commitments[self.own_index - 1] = Some((y_prime.clone(), b_prime.clone()));
        self.state = SessionState::Committed;
        (y_prime, b_prime)
    }

    /// Record party `l`'s commitment. `None` marks malformed/inactive;
    /// substitute is `(g, A)` (`g^1`, `A^1`).
    pub fn set_peer_commitment(&mut self, party: usize, commitment: Option<(C, C)>) {
        match commitment {
            Some(c) => self.commitments[party - 1] = Some(c),
            None => {
                self.flip_incorrect(party, "commitment missing or malformed");
                let big_a = self.big_a.clone().expect("batch() called first");
                self.commitments[party - 1] = Some((self.generator.clone(), big_a));
            }
        }
    }

    pub fn set_challenge(&mut self, challenge: C::Scalar) {
        self.challenge = Some(challenge);
    }

    /// Own reply: `k_x,j = r + (-x_j * pi^-1) * c`.
    #[instrument(skip(self), level = "trace")]
    pub fn reply(&mut self) -> C::Scalar {
        let r = self.own_blinder.expect("commit() called first");
        let c = self.challenge.expect("set_challenge() called first");
        let exponent = -(self.own_secret_share * self.pi_inv);
        let k = r + exponent * c;
        self.replies[self.own_index - 1] = Some(k);
        self.state = SessionState::Replied;
        k
    }

    /// Record party `l`'s reply. `None` marks malformed/inactive;
    /// substitute is `0`.
    pub fn set_peer_reply(&mut self, party: usize, reply: Option<C::Scalar>) {
        match reply {
            Some(k) => self.replies[party - 1] = Some(k),
            None => {
                self.flip_incorrect(party, "reply missing or malformed");
                self.replies[party - 1] = Some(C::Scalar::zero());
            }
        }
    }

    /// Optimistic combined verification over the first `t` `correct`
    /// parties. Returns `None` if fewer than `t` are currently `correct`.
    #[instrument(skip(self), level = "trace")]
    pub fn verify_combined(&mut self) -> Option<bool> {
        let c = self.challenge.expect("set_challenge() called first");
        let indices = first_t_correct(&self.correct, self.threshold)?;
        let lambdas = modified_lagrange_coefficients::<C::Scalar>(&indices, self.party_count);

        let mut y_prime_c = C::identity();
        let mut b_prime_c = C::identity();
        let mut k_x_c = C::Scalar::zero();
        for (&l, &lambda) in indices.iter().zip(lambdas.iter()) {
            let (y_prime_l, b_prime_l) = self.commitments[l - 1]
                .as_ref()
                .expect("commitment must be set before combined verification");
            let k_x_l = self.replies[l - 1].expect("reply must be set before combined verification");
            y_prime_c = y_prime_c.op(&y_prime_l.exp(&lambda));
            b_prime_c = b_prime_c.op(&b_prime_l.exp(&lambda));
            k_x_c += lambda * k_x_l;
        }

        let big_a = self.big_a.clone().expect("batch() called first");
        let f_c = self.combined_factors.clone().expect("combine_factors() called first");
        let e = self.batching_vector.as_ref().expect("batch() called first");
        let b_c = f_c.exp_prod(e).expect("same length as e by construction");

        let first = self
            .joint_public_key
            .exp(&(-c))
            .op(&y_prime_c)
            == self.generator.exp(&k_x_c);
        let second = b_c.exp(&c).op(&b_prime_c) == big_a.exp(&k_x_c);

        let accepted = first && second;
        self.state = SessionState::Done;
        debug!(target: LOG_TARGET, accepted, "combined verification");
        Some(accepted)
    }

    /// Separate verification of party `l != own_index`, for the fallback
    /// path. Does not itself mutate `correct` — `Session` does that based on
    /// the returned verdict, matching §9's "exceptions become explicit"
    /// design note.
    #[instrument(skip(self), level = "trace")]
    pub fn verify_separate(&self, party: usize) -> bool {
        let c = self.challenge.expect("set_challenge() called first");
        let (y_prime_l, b_prime_l) = self.commitments[party - 1]
            .as_ref()
            .expect("commitment must be set before separate verification");
        let k_x_l = self.replies[party - 1].expect("reply must be set before separate verification");
        let y_l = &self.public_keys[party - 1];
        let big_a = self.big_a.clone().expect("batch() called first");
        let b_l = self.batched_factor(party);

        let first = y_l.exp(&(-(self.pi_inv * c))).op(y_prime_l) == self.generator.exp(&k_x_l);
        let second = b_l.exp(&c).op(b_prime_l) == big_a.exp(&k_x_l);
        first && second
    }
}
