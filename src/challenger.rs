//! Coin-flip / random-oracle challenger (§4.4).
//!
//! Both variants share one capability: `seed(data, n_bytes)` produces a
//! batching seed, `challenge(data, bit_len)` produces a single challenge
//! integer. `ChallengerRO` derives both from a Fiat-Shamir hash of the
//! global prefix and the byte-tree transcript; `ChallengerI` reads them from
//! a joint coin-flip source (the actual 2-party coin-flip sub-protocol,
//! `CoinFlipPRingSource`, is explicitly out of scope — see DESIGN.md — so
//! this crate ships only a CSPRNG-backed stand-in behind the same trait).

use ark_ff::PrimeField;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::byte_tree::ByteTree;
use crate::config::RoHash;

/// Shared capability of both challenger variants.
pub trait Challenger {
    /// A pseudorandom string of exactly `n_bytes` bytes, bound to `data`.
    fn seed(&mut self, data: &ByteTree, n_bytes: usize) -> Vec<u8>;

    /// A single challenge, as an unsigned big-endian integer truncated to
    /// `bit_len` bits (high bits beyond `bit_len` in the leading byte are
    /// zero), bound to `data`.
    fn challenge(&mut self, data: &ByteTree, bit_len: usize) -> Vec<u8>;
}

/// Zero out the bits above `bit_len` in a big-endian byte string, per §6.5.
pub fn mask_to_bits(bytes: &mut Vec<u8>, bit_len: usize) {
    let want_bytes = bit_len.div_ceil(8);
    if bytes.len() > want_bytes {
        let drop = bytes.len() - want_bytes;
        bytes.copy_within(drop.., 0);
        bytes.truncate(want_bytes);
    }
    if !bit_len.is_multiple_of(8) && !bytes.is_empty() {
        let keep_bits = bit_len % 8;
        let mask = (1u8 << keep_bits) - 1;
        bytes[0] &= mask;
    }
}

fn hash_bytes(h: RoHash, data: &[u8]) -> Vec<u8> {
    match h {
        RoHash::Sha256 => Sha256::digest(data).to_vec(),
        RoHash::Sha384 => Sha384::digest(data).to_vec(),
        RoHash::Sha512 => Sha512::digest(data).to_vec(),
    }
}

/// Deterministic counter-mode expansion of `H`:
/// `PRG(seed, n) = H(seed || 0) || H(seed || 1) || ...` truncated to `n`
/// bytes. This is the `"sha-ctr"` `prg` symbol from §6.4/§10.
pub fn counter_prg(h: RoHash, seed: &[u8], n_bytes: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(n_bytes);
    let mut counter: u32 = 0;
    while out.len() < n_bytes {
        let mut block_input = seed.to_vec();
        block_input.extend_from_slice(&counter.to_be_bytes());
        out.extend_from_slice(&hash_bytes(h, &block_input));
        counter += 1;
    }
    out.truncate(n_bytes);
    out
}

/// `globalPrefix = H(version || rosid || rbitlen || vbitlenro || ebitlenro
/// || prg_id || group_id || rohash_id)`, with every field length-prefixed as
/// a byte-tree leaf (§4.4). Computed once per session and passed by value to
/// the challenger — it is not a process-wide singleton (§9).
#[allow(clippy::too_many_arguments)]
pub fn compute_global_prefix(
    h: RoHash,
    version: &[u8],
    rosid: &[u8],
    rbitlen: u32,
    vbitlenro: u32,
    ebitlenro: u32,
    prg_id: &str,
    group_id: &[u8],
) -> Vec<u8> {
    let tree = ByteTree::node(vec![
        ByteTree::leaf(version),
        ByteTree::leaf(rosid),
        ByteTree::leaf(rbitlen.to_be_bytes().to_vec()),
        ByteTree::leaf(vbitlenro.to_be_bytes().to_vec()),
        ByteTree::leaf(ebitlenro.to_be_bytes().to_vec()),
        ByteTree::leaf(prg_id.as_bytes().to_vec()),
        ByteTree::leaf(group_id.to_vec()),
        ByteTree::leaf(h.id().as_bytes().to_vec()),
    ]);
    hash_bytes(h, &tree.to_bytes())
}

/// Fiat-Shamir random-oracle challenger.
#[derive(Clone, Debug)]
pub struct ChallengerRo {
    hash: RoHash,
    global_prefix: Vec<u8>,
}

impl ChallengerRo {
    pub fn new(hash: RoHash, global_prefix: Vec<u8>) -> Self {
        ChallengerRo { hash, global_prefix }
    }

    fn digest_of(&self, data: &ByteTree) -> Vec<u8> {
        let mut input = self.global_prefix.clone();
        input.extend_from_slice(&data.to_bytes());
        hash_bytes(self.hash, &input)
    }
}

impl Challenger for ChallengerRo {
    fn seed(&mut self, data: &ByteTree, n_bytes: usize) -> Vec<u8> {
        let digest = self.digest_of(data);
        counter_prg(self.hash, &digest, n_bytes)
    }

    fn challenge(&mut self, data: &ByteTree, bit_len: usize) -> Vec<u8> {
        let digest = self.digest_of(data);
        let want_bytes = bit_len.div_ceil(8);
        let mut bytes = counter_prg(self.hash, &digest, want_bytes);
        mask_to_bits(&mut bytes, bit_len);
        bytes
    }
}

/// A source of joint, unpredictable coin-flip bits for [`ChallengerI`]. The
/// protocol proper would run a 2-party coin-flip sub-protocol
/// (`CoinFlipPRingSource`); this crate treats that as a black box exactly
/// like DKG, and ships only a CSPRNG-backed reference source for tests.
pub trait CoinSource {
    fn next_bytes(&mut self, n: usize) -> Vec<u8>;
}

/// Reference [`CoinSource`] backed by any `rand::RngCore`. Not a real joint
/// coin flip between parties — a stand-in behind the same trait a networked
/// implementation would satisfy.
pub struct RngCoinSource<R> {
    rng: R,
}

impl<R: RngCore> RngCoinSource<R> {
    pub fn new(rng: R) -> Self {
        RngCoinSource { rng }
    }
}

impl<R: RngCore> CoinSource for RngCoinSource<R> {
    fn next_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; n];
        self.rng.fill_bytes(&mut bytes);
        bytes
    }
}

/// Interactive challenger reading both seed and challenge from a joint
/// coin-flip source.
pub struct ChallengerI<C> {
    coins: C,
}

impl<C: CoinSource> ChallengerI<C> {
    pub fn new(coins: C) -> Self {
        ChallengerI { coins }
    }
}

impl<C: CoinSource> Challenger for ChallengerI<C> {
    fn seed(&mut self, _data: &ByteTree, n_bytes: usize) -> Vec<u8> {
        self.coins.next_bytes(n_bytes)
    }

    fn challenge(&mut self, _data: &ByteTree, bit_len: usize) -> Vec<u8> {
        let want_bytes = bit_len.div_ceil(8);
        let mut bytes = self.coins.next_bytes(want_bytes);
        mask_to_bits(&mut bytes, bit_len);
        bytes
    }
}

/// Interpret a big-endian byte string as a field element, reducing modulo
/// the ring's characteristic.
pub fn bytes_to_field<F: PrimeField>(bytes: &[u8]) -> F {
    F::from_be_bytes_mod_order(bytes)
}

/// Expand a seed into `n` ring elements of up to `bit_len` bits each, via
/// [`counter_prg`] over the configured hash — the batching vector `e`.
pub fn expand_batching_vector<F: PrimeField>(h: RoHash, seed: &[u8], n: usize, bit_len: usize) -> Vec<F> {
    let chunk_bytes = bit_len.div_ceil(8);
    let raw = counter_prg(h, seed, chunk_bytes * n);
    raw.chunks(chunk_bytes)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            mask_to_bits(&mut chunk, bit_len);
            bytes_to_field(&chunk)
        })
        .collect()
}
