use ark_ff::PrimeField;
use rand::Rng;

use super::{element::GroupElement, GroupError};

/// A vector of ring elements (the batching/challenge vector `e`, Lagrange
/// coefficients, and so on).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RingElementArray<F> {
    elements: Vec<F>,
}

impl<F: PrimeField> RingElementArray<F> {
    pub fn new(elements: Vec<F>) -> Self {
        RingElementArray { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[F] {
        &self.elements
    }

    /// Draw `n` independent uniformly random ring elements.
    pub fn sample_uniform<R: Rng>(rng: &mut R, n: usize) -> Self {
        RingElementArray {
            elements: (0..n).map(|_| F::rand(rng)).collect(),
        }
    }
}

/// A vector of group elements, supporting the pointwise operations and
/// multi-exponentiation the protocol's batched combine/verify steps need.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GroupElementArray<E> {
    elements: Vec<E>,
}

impl<E: GroupElement> GroupElementArray<E> {
    pub fn new(elements: Vec<E>) -> Self {
        GroupElementArray { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.elements
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.elements.get(index)
    }

    /// Project out the `i`-th element, `0`-indexed (the `project(i)` array
    /// operation GA provides alongside the product group's own `project`).
    pub fn project(&self, i: usize) -> Result<E, GroupError> {
        self.elements
            .get(i)
            .cloned()
            .ok_or(GroupError::IndexOutOfBounds {
                index: i,
                width: self.elements.len(),
            })
    }

    /// Pointwise group operation; both arrays must have equal length.
    pub fn mul(&self, other: &Self) -> Result<Self, GroupError> {
        if self.elements.len() != other.elements.len() {
            return Err(GroupError::WrongArrayLength {
                expected: self.elements.len(),
                actual: other.elements.len(),
            });
        }
        Ok(GroupElementArray {
            elements: self
                .elements
                .iter()
                .zip(other.elements.iter())
                .map(|(a, b)| a.op(b))
                .collect(),
        })
    }

    /// Pointwise exponentiation by the same scalar.
    pub fn exp(&self, scalar: &E::Scalar) -> Self {
        GroupElementArray {
            elements: self.elements.iter().map(|e| e.exp(scalar)).collect(),
        }
    }

    /// Multi-exponentiation: collapses the array into a single element,
    /// `prod_i self[i] ^ exponents[i]`. Used to combine a ciphertext
    /// component array with the batching vector into one group element.
    pub fn exp_prod(&self, exponents: &RingElementArray<E::Scalar>) -> Result<E, GroupError> {
        if self.elements.len() != exponents.len() {
            return Err(GroupError::WrongArrayLength {
                expected: self.elements.len(),
                actual: exponents.len(),
            });
        }
        let mut acc = E::identity();
        for (base, exponent) in self.elements.iter().zip(exponents.as_slice()) {
            acc = acc.op(&base.exp(exponent));
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fr, G1Projective};
    use ark_std::test_rng;

    #[test]
    fn exp_prod_matches_manual_sum() {
        let mut rng = test_rng();
        let bases = GroupElementArray::new(vec![
            <G1Projective as GroupElement>::generator().exp(&Fr::from(3u64)),
            <G1Projective as GroupElement>::generator().exp(&Fr::from(5u64)),
        ]);
        let exponents = RingElementArray::sample_uniform(&mut rng, 2);
        let combined = bases.exp_prod(&exponents).unwrap();
        let expected = bases.as_slice()[0]
            .exp(&exponents.as_slice()[0])
            .op(&bases.as_slice()[1].exp(&exponents.as_slice()[1]));
        assert_eq!(combined, expected);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let bases = GroupElementArray::new(vec![<G1Projective as GroupElement>::generator()]);
        let exponents = RingElementArray::new(vec![Fr::from(1u64), Fr::from(2u64)]);
        assert!(bases.exp_prod(&exponents).is_err());
    }

    #[test]
    fn project_returns_the_indexed_element() {
        let e0 = <G1Projective as GroupElement>::generator().exp(&Fr::from(3u64));
        let e1 = <G1Projective as GroupElement>::generator().exp(&Fr::from(5u64));
        let array = GroupElementArray::new(vec![e0, e1]);
        assert_eq!(array.project(0).unwrap(), e0);
        assert_eq!(array.project(1).unwrap(), e1);
        assert!(array.project(2).is_err());
    }
}
