pub mod board;
pub mod byte_tree;
pub mod challenger;
pub mod ciphertext;
pub mod config;
pub mod dkg;
pub mod error;
pub mod group;
pub mod lagrange;
pub mod session;
pub mod session_basic;
pub mod transcript;
pub mod wire;

pub use error::{CoreError, CoreResult};
