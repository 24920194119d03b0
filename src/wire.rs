//! Byte-tree encoding/decoding for the wire types the protocol exchanges:
//! group elements, element arrays, and ring (scalar) elements (§4.2/§6.2).
//!
//! Kept separate from `group` so the abstract algebra layer stays free of
//! any serialization-format dependency; this module is the seam where
//! `GroupElement`/`RingElementArray` meet `ByteTree`.

use ark_ff::{BigInteger, PrimeField};

use crate::byte_tree::ByteTree;
use crate::ciphertext::CiphertextArray;
use crate::error::CoreError;
use crate::group::{GroupElement, GroupElementArray};

pub fn encode_element<C: GroupElement>(element: &C) -> ByteTree {
    ByteTree::leaf(element.to_bytes())
}

pub fn decode_element<C: GroupElement>(tree: &ByteTree) -> Result<C, CoreError> {
    let bytes = tree.as_leaf()?;
    C::from_bytes(bytes).map_err(CoreError::from)
}

pub fn encode_array<C: GroupElement>(array: &GroupElementArray<C>) -> ByteTree {
    ByteTree::node(array.as_slice().iter().map(encode_element).collect::<Vec<_>>())
}

pub fn decode_array<C: GroupElement>(tree: &ByteTree) -> Result<GroupElementArray<C>, CoreError> {
    let children = tree.as_node()?;
    let elements = children.iter().map(decode_element).collect::<Result<Vec<_>, _>>()?;
    Ok(GroupElementArray::new(elements))
}

/// Fixed-width big-endian encoding of a scalar, `ceil(log2 q / 8)` bytes
/// (§6.5). Values round-trip; non-canonical (>= q) encodings are rejected.
pub fn encode_scalar<F: PrimeField>(scalar: &F) -> ByteTree {
    let width = (F::MODULUS_BIT_SIZE as usize).div_ceil(8);
    let mut bytes = scalar.into_bigint().to_bytes_be();
    if bytes.len() < width {
        let mut padded = vec![0u8; width - bytes.len()];
        padded.extend_from_slice(&bytes);
        bytes = padded;
    }
    ByteTree::leaf(bytes)
}

pub fn decode_scalar<F: PrimeField>(tree: &ByteTree) -> Result<F, CoreError> {
    let bytes = tree.as_leaf()?;
    let width = (F::MODULUS_BIT_SIZE as usize).div_ceil(8);
    if bytes.len() != width {
        return Err(CoreError::MalformedTranscript(format!(
            "scalar has wrong width: expected {width}, got {}",
            bytes.len()
        )));
    }
    let value = F::from_be_bytes_mod_order(bytes);
    if encode_scalar(&value).as_leaf().expect("just built as leaf") != bytes {
        return Err(CoreError::MalformedTranscript(
            "scalar encoding is not canonical".to_string(),
        ));
    }
    Ok(value)
}

pub fn encode_ciphertexts<C: GroupElement>(ciphertexts: &CiphertextArray<C>) -> ByteTree {
    ByteTree::node(vec![encode_array(&ciphertexts.u), encode_array(&ciphertexts.v)])
}

pub fn decode_ciphertexts<C: GroupElement>(tree: &ByteTree) -> Result<CiphertextArray<C>, CoreError> {
    let children = tree.as_node()?;
    if children.len() != 2 {
        return Err(CoreError::MalformedTranscript(
            "ciphertext array must have exactly two children".to_string(),
        ));
    }
    let u = decode_array(&children[0])?;
    let v = decode_array(&children[1])?;
    CiphertextArray::new(u, v).map_err(CoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fr, G1Projective};
    use ark_std::{test_rng, UniformRand};

    #[test]
    fn element_round_trips() {
        let mut rng = test_rng();
        let e = <G1Projective as GroupElement>::generator().exp(&Fr::rand(&mut rng));
        let tree = encode_element(&e);
        let back: G1Projective = decode_element(&tree).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn array_round_trips() {
        let mut rng = test_rng();
        let array = GroupElementArray::new(vec![
            <G1Projective as GroupElement>::generator().exp(&Fr::rand(&mut rng)),
            <G1Projective as GroupElement>::generator().exp(&Fr::rand(&mut rng)),
        ]);
        let tree = encode_array(&array);
        let back: GroupElementArray<G1Projective> = decode_array(&tree).unwrap();
        assert_eq!(array.as_slice(), back.as_slice());
    }

    #[test]
    fn scalar_round_trips() {
        let mut rng = test_rng();
        let s = Fr::rand(&mut rng);
        let tree = encode_scalar(&s);
        let back: Fr = decode_scalar(&tree).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn malformed_element_bytes_are_rejected() {
        let tree = ByteTree::leaf(vec![0xffu8; 32]);
        assert!(decode_element::<G1Projective>(&tree).is_err());
    }

    #[test]
    fn wrong_width_scalar_is_rejected() {
        let tree = ByteTree::leaf(vec![1, 2, 3]);
        assert!(decode_scalar::<Fr>(&tree).is_err());
    }
}
