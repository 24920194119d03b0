//! El-Gamal ciphertext array: a pair of element arrays of equal length,
//! an element of the product group `G_u x G_v` (§3).

use crate::group::{GroupElement, GroupElementArray, GroupError};

/// `n` El-Gamal ciphertexts, stored as two parallel component arrays: the
/// left component `u = g^r` (the randomization) and the right component
/// `v = pk^r * m`.
#[derive(Clone, Debug)]
pub struct CiphertextArray<C: GroupElement> {
    pub u: GroupElementArray<C>,
    pub v: GroupElementArray<C>,
}

impl<C: GroupElement> CiphertextArray<C> {
    pub fn new(u: GroupElementArray<C>, v: GroupElementArray<C>) -> Result<Self, GroupError> {
        if u.len() != v.len() {
            return Err(GroupError::WrongArrayLength {
                expected: u.len(),
                actual: v.len(),
            });
        }
        Ok(CiphertextArray { u, v })
    }

    pub fn len(&self) -> usize {
        self.u.len()
    }

    pub fn is_empty(&self) -> bool {
        self.u.is_empty()
    }

    /// Encrypt `n` messages under `public_key` with the given generator and
    /// fresh randomness, for use in tests and demos.
    pub fn encrypt(
        generator: &C,
        public_key: &C,
        messages: &[C],
        randomness: &[C::Scalar],
    ) -> Result<Self, GroupError> {
        if messages.len() != randomness.len() {
            return Err(GroupError::WrongArrayLength {
                expected: messages.len(),
                actual: randomness.len(),
            });
        }
        let u = GroupElementArray::new(randomness.iter().map(|r| generator.exp(r)).collect());
        let v = GroupElementArray::new(
            messages
                .iter()
                .zip(randomness)
                .map(|(m, r)| public_key.exp(r).op(m))
                .collect(),
        );
        CiphertextArray::new(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fr, G1Projective};
    use ark_std::{test_rng, UniformRand};

    #[test]
    fn encrypt_then_manual_decrypt_recovers_message() {
        let mut rng = test_rng();
        let generator = <G1Projective as GroupElement>::generator();
        let secret = Fr::rand(&mut rng);
        let public_key = generator.exp(&secret);
        let message = generator.exp(&Fr::from(42u64));
        let randomness = Fr::rand(&mut rng);
        let ciphertexts =
            CiphertextArray::encrypt(&generator, &public_key, &[message], &[randomness]).unwrap();
        let shared_secret = ciphertexts.u.as_slice()[0].exp(&secret);
        let recovered = ciphertexts.v.as_slice()[0].op(&GroupElement::inverse(&shared_secret));
        assert_eq!(recovered, message);
    }
}
