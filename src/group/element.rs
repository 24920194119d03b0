use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_serialize::{Compress, Validate};

use super::GroupError;

/// An element of a prime-order group whose ring of exponents is
/// `Self::Scalar`. Implemented directly for every `ark_ec::CurveGroup` and,
/// recursively, for [`super::ProductElement`] over any `GroupElement`.
pub trait GroupElement: Clone + PartialEq + Eq + core::fmt::Debug {
    type Scalar: PrimeField;

    fn identity() -> Self;
    fn generator() -> Self;
    fn op(&self, other: &Self) -> Self;
    fn inverse(&self) -> Self;
    fn exp(&self, scalar: &Self::Scalar) -> Self;

    /// Canonical fixed-length encoding (subgroup-checked on decode).
    fn to_bytes(&self) -> Vec<u8>;
    fn from_bytes(bytes: &[u8]) -> Result<Self, GroupError>
    where
        Self: Sized;
}

impl<C> GroupElement for C
where
    C: CurveGroup,
{
    type Scalar = C::ScalarField;

    fn identity() -> Self {
        C::zero()
    }

    fn generator() -> Self {
        C::generator()
    }

    fn op(&self, other: &Self) -> Self {
        *self + *other
    }

    fn inverse(&self) -> Self {
        -*self
    }

    fn exp(&self, scalar: &Self::Scalar) -> Self {
        *self * scalar
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.compressed_size());
        self.serialize_with_mode(&mut buf, Compress::Yes)
            .expect("serialization into a Vec<u8> cannot fail");
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, GroupError> {
        C::deserialize_with_mode(bytes, Compress::Yes, Validate::Yes)
            .map_err(|e| GroupError::DeserializationFailed(e.to_string()))
    }
}
