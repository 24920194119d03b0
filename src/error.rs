//! Tagged error taxonomy for the decryption core.
//!
//! Each module that can fail defines its own `thiserror::Error` enum scoped to
//! that module's concerns (mirroring `ShuffleError`, `PedersenCommitmentOpeningError`,
//! and the other per-module error enums in this ecosystem); [`CoreError`]
//! aggregates them at the crate boundary via `#[from]`.

use thiserror::Error;

use crate::byte_tree::ByteTreeError;
use crate::group::GroupError;

/// Errors surfaced by the decryption core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Structural decoding error in a byte-tree message or transcript file.
    #[error("malformed byte-tree: {0}")]
    MalformedByteTree(#[from] ByteTreeError),

    /// A group or ring element was outside its set, or had the wrong size.
    #[error("malformed element: {0}")]
    MalformedElement(#[from] GroupError),

    /// A structural error in transcript inputs this party is reading as a
    /// subsession (own decoding errors are fatal, unlike peer decoding
    /// errors, which only flip a verdict bit).
    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),

    /// Fewer than `t` parties remain `correct` at a combine step.
    #[error("not enough shares: need {needed}, have {available}")]
    NotEnoughShares { needed: usize, available: usize },

    /// The transcript directory could not be written.
    #[error("transcript I/O error: {0}")]
    TranscriptIo(#[from] std::io::Error),

    /// Security parameters below floor, or `k > 1009`.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// An arithmetic condition the protocol proves cannot occur (e.g.
    /// inverting a zero ring element).
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
