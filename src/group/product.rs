use super::{element::GroupElement, GroupError};

/// A fixed-width product of `W` copies of `E`, with componentwise group
/// operations. This realizes the "product group of arity `w`" (`keywidth`
/// batching several atomic group elements into one key-shaped value);
/// nesting is just `ProductElement<ProductElement<E, W1>, W2>`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProductElement<E, const W: usize> {
    components: Vec<E>,
}

impl<E: GroupElement, const W: usize> ProductElement<E, W> {
    pub fn new(components: Vec<E>) -> Result<Self, GroupError> {
        if components.len() != W {
            return Err(GroupError::WrongArrayLength {
                expected: W,
                actual: components.len(),
            });
        }
        Ok(ProductElement { components })
    }

    pub fn components(&self) -> &[E] {
        &self.components
    }

    /// Project out the `i`-th component, `0`-indexed (the `project(i)` array
    /// operation a product group must support).
    pub fn project(&self, i: usize) -> Result<E, GroupError> {
        self.components
            .get(i)
            .cloned()
            .ok_or(GroupError::IndexOutOfBounds { index: i, width: W })
    }
}

impl<E: GroupElement, const W: usize> GroupElement for ProductElement<E, W> {
    type Scalar = E::Scalar;

    fn identity() -> Self {
        ProductElement {
            components: (0..W).map(|_| E::identity()).collect(),
        }
    }

    fn generator() -> Self {
        ProductElement {
            components: (0..W).map(|_| E::generator()).collect(),
        }
    }

    fn op(&self, other: &Self) -> Self {
        ProductElement {
            components: self
                .components
                .iter()
                .zip(other.components.iter())
                .map(|(a, b)| a.op(b))
                .collect(),
        }
    }

    fn inverse(&self) -> Self {
        ProductElement {
            components: self.components.iter().map(GroupElement::inverse).collect(),
        }
    }

    fn exp(&self, scalar: &Self::Scalar) -> Self {
        ProductElement {
            components: self.components.iter().map(|c| c.exp(scalar)).collect(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.components.iter().flat_map(GroupElement::to_bytes).collect()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, GroupError> {
        if W == 0 {
            return if bytes.is_empty() {
                Ok(ProductElement { components: Vec::new() })
            } else {
                Err(GroupError::WrongByteLength { width: W, actual: bytes.len() })
            };
        }
        if !bytes.len().is_multiple_of(W) {
            return Err(GroupError::WrongByteLength {
                width: W,
                actual: bytes.len(),
            });
        }
        let chunk = bytes.len() / W;
        let components = bytes
            .chunks(chunk)
            .map(E::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        ProductElement::new(components)
    }
}
