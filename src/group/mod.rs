//! Abstract group/ring layer the protocol is written against.
//!
//! The "atomic group" and "product group of arity `w`" are modeled here as,
//! respectively, any `ark_ec::CurveGroup` and a fixed-width wrapper
//! ([`ProductElement`]) around `w` such elements with componentwise
//! operations; nesting a product group inside another is just instantiating
//! the wrapper over itself. Groups are monomorphized generics: the curve is
//! a call-site type parameter, never a runtime choice.

mod array;
mod element;
mod product;

pub use array::{GroupElementArray, RingElementArray};
pub use element::GroupElement;
pub use product::ProductElement;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GroupError {
    #[error("bytes do not decode to a point in the group's prime-order subgroup")]
    NotInGroup,
    #[error("failed to deserialize group element: {0}")]
    DeserializationFailed(String),
    #[error("array length mismatch: expected {expected}, got {actual}")]
    WrongArrayLength { expected: usize, actual: usize },
    #[error("byte length {actual} is not a multiple of the component width {width}")]
    WrongByteLength { width: usize, actual: usize },
    #[error("project index {index} out of bounds for width {width}")]
    IndexOutOfBounds { index: usize, width: usize },
}
