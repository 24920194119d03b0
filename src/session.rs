//! `Session` — drives one decryption instance end to end (§4.6): exchanges
//! over the [`Board`], transcript persistence (§6.3), and the optimistic
//! combined-verification-then-fallback flow built on [`SessionBasic`].

use std::path::{Path, PathBuf};

use ark_ff::PrimeField;
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::board::Board;
use crate::byte_tree::ByteTree;
use crate::challenger::{mask_to_bits, Challenger};
use crate::ciphertext::CiphertextArray;
use crate::config::ProtocolConfig;
use crate::dkg::DkgView;
use crate::error::{CoreError, CoreResult};
use crate::group::{GroupElement, RingElementArray};
use crate::session_basic::SessionBasic;
use crate::transcript;
use crate::wire;

const LOG_TARGET: &str = "threshold_decrypt::session";

const LABEL_FACTORS: &str = "DecryptionFactors";
const LABEL_COMMITMENT: &str = "Commitment";
const LABEL_REPLY: &str = "Reply";

/// Outcome of a completed [`Session::decrypt`] run.
pub struct DecryptOutcome<C: GroupElement> {
    pub plaintexts: Vec<C>,
    /// A deferred transcript-write failure. Per §7, `TranscriptIo` never
    /// aborts the computation of plaintexts; it is surfaced here instead.
    pub transcript_error: Option<CoreError>,
}

/// One party's orchestration of a threshold decryption over `ciphertexts`.
pub struct Session<'a, C: GroupElement, D: DkgView<C>, Bd: Board, Ch: Challenger> {
    dkg: &'a D,
    board: &'a Bd,
    challenger: Ch,
    config: ProtocolConfig,
    transcript_dir: PathBuf,
    basic: SessionBasic<C>,
}

impl<'a, C: GroupElement, D: DkgView<C>, Bd: Board, Ch: Challenger> Session<'a, C, D, Bd, Ch>
where
    C::Scalar: PrimeField,
{
    pub fn new(
        dkg: &'a D,
        board: &'a Bd,
        challenger: Ch,
        config: ProtocolConfig,
        transcript_dir: impl AsRef<Path>,
        ciphertexts: &CiphertextArray<C>,
    ) -> CoreResult<Self> {
        config.validate()?;
        Ok(Session {
            dkg,
            board,
            challenger,
            config,
            transcript_dir: transcript_dir.as_ref().to_path_buf(),
            basic: SessionBasic::new(dkg, ciphertexts),
        })
    }

    /// Read a peer's byte-tree message under `label`, decoding it with
    /// `decode`. Missing, cancelled, or malformed payloads all collapse to
    /// `None` — per §4.6 step 3, a decode failure is treated exactly like an
    /// absent party, not a fatal error.
    fn read_peer<T>(&self, party: usize, label: &str, decode: impl FnOnce(&ByteTree) -> CoreResult<T>) -> Option<T> {
        if !self.dkg.is_active(party) || !self.board.is_active(party) {
            return None;
        }
        let payload = self.board.wait_for(party, label)?;
        match decode(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(target: LOG_TARGET, party, label, %err, "peer payload malformed");
                None
            }
        }
    }

    fn record_io(&self, transcript_error: &mut Option<CoreError>, result: CoreResult<()>) {
        if let Err(err) = result {
            warn!(target: LOG_TARGET, %err, "transcript write failed");
            if transcript_error.is_none() {
                *transcript_error = Some(err);
            }
        }
    }

    /// Expand `seed_bytes` into `n` scalars of `bit_len` bits each, matching
    /// how the batching vector and challenge are carved out of a Challenger
    /// output (§6.5 `mask_to_bits`).
    fn expand_scalars(seed_bytes: &[u8], n: usize, bit_len: usize) -> RingElementArray<C::Scalar> {
        let chunk_bytes = bit_len.div_ceil(8);
        let scalars = seed_bytes
            .chunks(chunk_bytes)
            .take(n)
            .map(|chunk| {
                let mut chunk = chunk.to_vec();
                mask_to_bits(&mut chunk, bit_len);
                C::Scalar::from_be_bytes_mod_order(&chunk)
            })
            .collect();
        RingElementArray::new(scalars)
    }

    /// Run the full protocol (§4.6 steps 1-12) and return the recovered
    /// plaintexts for `ciphertexts`, which must be the same array `new` was
    /// constructed with.
    #[instrument(skip(self, ciphertexts, rng), level = "trace")]
    pub fn decrypt(
        mut self,
        ciphertexts: &CiphertextArray<C>,
        rng: &mut impl Rng,
    ) -> CoreResult<DecryptOutcome<C>> {
        let mut transcript_error = None;
        let k = self.basic.party_count();
        let own_index = self.basic.own_index();
        let n = ciphertexts.len();

        std::fs::create_dir_all(&self.transcript_dir).ok();
        self.record_io(
            &mut transcript_error,
            transcript::write_active_threshold(&self.transcript_dir, self.basic.threshold() as u32),
        );
        self.record_io(
            &mut transcript_error,
            transcript::write_tree(
                &transcript::ciphertexts_path(&self.transcript_dir),
                &wire::encode_ciphertexts(ciphertexts),
            ),
        );

        debug!(target: LOG_TARGET, own_index, k, n, "decryption session starting");

        // Step 2: compute and publish this party's decryption factor.
        let own_factor = self.basic.own_factor();
        self.board
            .publish(own_index, LABEL_FACTORS, wire::encode_array(&own_factor));

        // Step 3: collect every party's factor, substituting defaults for
        // anyone inactive or malformed (handled inside `set_peer_factor`).
        for l in 1..=k {
            if l == own_index {
                continue;
            }
            let factor = self.read_peer(l, LABEL_FACTORS, |tree| wire::decode_array(tree));
            self.basic.set_peer_factor(l, factor);
        }
        for l in 1..=k {
            self.record_io(
                &mut transcript_error,
                transcript::write_tree(
                    &transcript::decryption_factors_path(&self.transcript_dir, l),
                    &wire::encode_array(self.basic.factor(l)),
                ),
            );
        }

        let needed_for_combine = self.basic.threshold();
        if self.basic.combine_factors().is_none() {
            return Err(CoreError::NotEnoughShares {
                needed: needed_for_combine,
                available: self.basic.correct().iter().filter(|c| **c).count(),
            });
        }

        // Step 5: derive the batching seed from a transcript binding the
        // instance (generator, ciphertexts) to everyone's factors and the
        // polynomial-in-exponent, then batch.
        let seed_transcript = ByteTree::node(vec![
            ByteTree::node(vec![
                wire::encode_element(&self.dkg.basic_generator()),
                wire::encode_ciphertexts(ciphertexts),
            ]),
            ByteTree::node(vec![
                self.dkg.polynomial_in_exponent_bytes(),
                ByteTree::node((1..=k).map(|l| wire::encode_array(self.basic.factor(l))).collect::<Vec<_>>()),
            ]),
        ]);
        let chunk_bytes = self.config.active_ebitlen().div_ceil(8);
        let seed_bytes = self.challenger.seed(&seed_transcript, chunk_bytes * n.max(1));
        let e = Self::expand_scalars(&seed_bytes, n, self.config.active_ebitlen());
        self.basic.batch(e);

        // Step 6: exchange commitments.
        let (own_y_prime, own_b_prime) = self.basic.commit(rng);
        self.board.publish(
            own_index,
            LABEL_COMMITMENT,
            ByteTree::node(vec![wire::encode_element(&own_y_prime), wire::encode_element(&own_b_prime)]),
        );
        for l in 1..=k {
            if l == own_index {
                continue;
            }
            let commitment = self.read_peer(l, LABEL_COMMITMENT, |tree| {
                let children = tree.as_node()?;
                if children.len() != 2 {
                    return Err(CoreError::MalformedTranscript(
                        "commitment must have exactly two children".to_string(),
                    ));
                }
                let y_prime: C = wire::decode_element(&children[0])?;
                let b_prime: C = wire::decode_element(&children[1])?;
                Ok((y_prime, b_prime))
            });
            self.basic.set_peer_commitment(l, commitment);
        }
        for l in 1..=k {
            let (y_prime, b_prime) = self.basic.commitment(l);
            self.record_io(
                &mut transcript_error,
                transcript::write_tree(
                    &transcript::commitment_path(&self.transcript_dir, l),
                    &ByteTree::node(vec![wire::encode_element(y_prime), wire::encode_element(b_prime)]),
                ),
            );
        }

        // Step 7: derive the challenge from the seed and every commitment.
        let challenge_transcript = ByteTree::node(vec![
            ByteTree::leaf(seed_bytes),
            ByteTree::node(
                (1..=k)
                    .map(|l| {
                        let (y_prime, b_prime) = self.basic.commitment(l);
                        ByteTree::node(vec![wire::encode_element(y_prime), wire::encode_element(b_prime)])
                    })
                    .collect::<Vec<_>>(),
            ),
        ]);
        let challenge_bytes = self.challenger.challenge(&challenge_transcript, self.config.active_vbitlen());
        let challenge = C::Scalar::from_be_bytes_mod_order(&challenge_bytes);
        self.basic.set_challenge(challenge);

        // Step 8: exchange replies.
        let own_reply = self.basic.reply();
        self.board
            .publish(own_index, LABEL_REPLY, wire::encode_scalar(&own_reply));
        for l in 1..=k {
            if l == own_index {
                continue;
            }
            let reply = self.read_peer(l, LABEL_REPLY, wire::decode_scalar);
            self.basic.set_peer_reply(l, reply);
        }
        for l in 1..=k {
            self.record_io(
                &mut transcript_error,
                transcript::write_tree(
                    &transcript::reply_path(&self.transcript_dir, l),
                    &wire::encode_scalar(&self.basic.reply_of(l)),
                ),
            );
        }

        // Step 9: optimistic combined verification.
        let combined_accepted = self.basic.verify_combined().unwrap_or(false);
        debug!(target: LOG_TARGET, combined_accepted, "combined verification result");

        if !combined_accepted {
            // Step 10: fall back to per-party separate verification.
            warn!(target: LOG_TARGET, "combined verification failed, falling back to per-party checks");
            let correct_before = self.basic.correct().to_vec();
            for l in 1..=k {
                if l == own_index {
                    continue;
                }
                if self.basic.correct()[l - 1] && !self.basic.verify_separate(l) {
                    self.basic.mark_incorrect(l, "separate verification failed");
                }
            }
            // Step 11: if the correct set changed, recombine and fail if
            // fewer than t parties remain.
            if self.basic.correct() != correct_before.as_slice() {
                let needed = self.basic.threshold();
                if self.basic.combine_factors().is_none() {
                    return Err(CoreError::NotEnoughShares {
                        needed,
                        available: self.basic.correct().iter().filter(|c| **c).count(),
                    });
                }
            }
        }

        self.record_io(
            &mut transcript_error,
            transcript::write_tree(
                &transcript::correct_indices_path(&self.transcript_dir),
                &ByteTree::node(
                    self.basic
                        .correct()
                        .iter()
                        .map(|&c| ByteTree::leaf(vec![c as u8]))
                        .collect::<Vec<_>>(),
                ),
            ),
        );

        // Step 12: recover plaintexts as v (op) F_c.
        let f_c = self
            .basic
            .combined_factors()
            .expect("combine_factors succeeded above")
            .clone();
        let plaintexts = ciphertexts
            .v
            .as_slice()
            .iter()
            .zip(f_c.as_slice())
            .map(|(v_i, f_i)| v_i.op(f_i))
            .collect();

        Ok(DecryptOutcome {
            plaintexts,
            transcript_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::InMemoryBoard;
    use crate::challenger::{compute_global_prefix, ChallengerRo};
    use crate::config::RoHash;
    use crate::dkg::TrustedDealerDkg;
    use ark_bn254::{Fr, G1Projective};
    use ark_std::{test_rng, UniformRand};

    fn fresh_challenger() -> ChallengerRo {
        let prefix = compute_global_prefix(RoHash::Sha256, b"v1", b"test-sid", 128, 256, 256, "sha-ctr", b"bn254");
        ChallengerRo::new(RoHash::Sha256, prefix)
    }

    fn sample_ciphertexts(
        rng: &mut impl Rng,
        generator: &G1Projective,
        public_key: &G1Projective,
        messages: &[G1Projective],
    ) -> CiphertextArray<G1Projective> {
        let randomness: Vec<Fr> = messages.iter().map(|_| Fr::rand(rng)).collect();
        CiphertextArray::encrypt(generator, public_key, messages, &randomness).unwrap()
    }

    #[test]
    fn full_session_recovers_plaintexts() {
        let mut rng = test_rng();
        let (k, t, n) = (4usize, 3usize, 3usize);
        let dealer = TrustedDealerDkg::<G1Projective>::deal(&mut rng, k, t);
        let generator = <G1Projective as GroupElement>::generator();
        let public_key = dealer.view_for(1).joint_public_key();
        let messages: Vec<G1Projective> = (0..n).map(|i| generator.exp(&Fr::from(100 + i as u64))).collect();
        let ciphertexts = sample_ciphertexts(&mut rng, &generator, &public_key, &messages);

        let board = InMemoryBoard::new();
        let dir = std::env::temp_dir().join(format!("session-test-{}", std::process::id()));

        let views: Vec<_> = (1..=k).map(|l| dealer.view_for(l)).collect();
        // Every session blocks on `Board::wait_for` until peers publish, so
        // each party needs its own thread running concurrently.
        let outcomes: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = views
                .iter()
                .map(|view| {
                    let board = &board;
                    let ciphertexts = &ciphertexts;
                    let dir = &dir;
                    scope.spawn(move || {
                        let mut rng = test_rng();
                        let session = Session::new(
                            view,
                            board,
                            fresh_challenger(),
                            ProtocolConfig {
                                k,
                                t,
                                ..ProtocolConfig::default()
                            },
                            dir.join(format!("party-{}", view.own_index())),
                            ciphertexts,
                        )
                        .unwrap();
                        session.decrypt(ciphertexts, &mut rng).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for outcome in &outcomes {
            assert!(outcome.transcript_error.is_none());
            assert_eq!(outcome.plaintexts, messages);
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn inactive_party_still_recovers_plaintexts_above_threshold() {
        let mut rng = test_rng();
        let (k, t, n) = (4usize, 3usize, 2usize);
        let mut dealer = TrustedDealerDkg::<G1Projective>::deal(&mut rng, k, t);
        dealer.set_active(4, false);
        let generator = <G1Projective as GroupElement>::generator();
        let public_key = dealer.view_for(1).joint_public_key();
        let messages: Vec<G1Projective> = (0..n).map(|i| generator.exp(&Fr::from(7 + i as u64))).collect();
        let ciphertexts = sample_ciphertexts(&mut rng, &generator, &public_key, &messages);

        let board = InMemoryBoard::new();
        board.set_active(4, false);
        let dir = std::env::temp_dir().join(format!("session-test-inactive-{}", std::process::id()));

        let views: Vec<_> = (1..=3).map(|l| dealer.view_for(l)).collect();
        let outcomes: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = views
                .iter()
                .map(|view| {
                    let board = &board;
                    let ciphertexts = &ciphertexts;
                    let dir = &dir;
                    scope.spawn(move || {
                        let mut rng = test_rng();
                        let session = Session::new(
                            view,
                            board,
                            fresh_challenger(),
                            ProtocolConfig {
                                k,
                                t,
                                ..ProtocolConfig::default()
                            },
                            dir.join(format!("party-{}", view.own_index())),
                            ciphertexts,
                        )
                        .unwrap();
                        session.decrypt(ciphertexts, &mut rng).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for outcome in &outcomes {
            assert_eq!(outcome.plaintexts, messages);
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn below_threshold_active_parties_fails_with_not_enough_shares() {
        let mut rng = test_rng();
        let (k, t, n) = (4usize, 3usize, 1usize);
        let mut dealer = TrustedDealerDkg::<G1Projective>::deal(&mut rng, k, t);
        dealer.set_active(3, false);
        dealer.set_active(4, false);
        let generator = <G1Projective as GroupElement>::generator();
        let public_key = dealer.view_for(1).joint_public_key();
        let messages: Vec<G1Projective> = vec![generator.exp(&Fr::from(1u64)); n];
        let ciphertexts = sample_ciphertexts(&mut rng, &generator, &public_key, &messages);

        let board = InMemoryBoard::new();
        board.set_active(2, false);
        board.set_active(3, false);
        board.set_active(4, false);
        let dir = std::env::temp_dir().join(format!("session-test-below-{}", std::process::id()));

        let view = dealer.view_for(1);
        let session = Session::new(
            &view,
            &board,
            fresh_challenger(),
            ProtocolConfig {
                k,
                t,
                ..ProtocolConfig::default()
            },
            dir.join("party-1"),
            &ciphertexts,
        )
        .unwrap();
        let result = session.decrypt(&ciphertexts, &mut test_rng());
        assert!(matches!(result, Err(CoreError::NotEnoughShares { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }
}
