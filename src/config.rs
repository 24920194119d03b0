//! Runtime configuration surface for the decryption core.
//!
//! `ProtocolConfig` is the single place the protocol's security parameters
//! are centralized, the way `config::poseidon_config` centralizes a sponge's
//! round constants — except here the parameters are the decryption core's
//! own security floors. Construct one programmatically or via `serde`, then
//! call [`ProtocolConfig::validate`] before handing it to a `Session`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The hard cap on party count: `pi` in [`crate::lagrange`] is computed from
/// a table of odd primes up to 1009, so no configuration with more parties
/// than that can be supported.
pub const MAX_PARTIES: usize = 1009;

const DEFAULT_VBITLEN: usize = 128;
const DEFAULT_VBITLENRO: usize = 256;
const DEFAULT_EBITLEN: usize = 128;
const DEFAULT_EBITLENRO: usize = 256;
const DEFAULT_RBITLEN: usize = 128;

/// Hash selection for [`crate::challenger::ChallengerRO`], also folded into
/// the global prefix so that two challengers configured with different
/// hashes never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoHash {
    Sha256,
    Sha384,
    Sha512,
}

impl RoHash {
    /// Stable identifier folded into the global prefix transcript.
    pub fn id(self) -> &'static str {
        match self {
            RoHash::Sha256 => "sha-256",
            RoHash::Sha384 => "sha-384",
            RoHash::Sha512 => "sha-512",
        }
    }

    pub fn output_len(self) -> usize {
        match self {
            RoHash::Sha256 => 32,
            RoHash::Sha384 => 48,
            RoHash::Sha512 => 64,
        }
    }
}

/// Storage model for element arrays. `Ram` is the only model this crate
/// implements; `File` is accepted by configuration (and round-trips through
/// `serde`) but out of this core's scope per §6.4/§1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayStorage {
    Ram,
    File,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Number of parties `k` the protocol instance is configured for.
    pub k: usize,
    /// Reconstruction threshold `t`, `1 <= t <= k`.
    pub t: usize,
    /// Public-key arity (width of the product group); `>= 1`.
    pub keywidth: usize,
    /// Interactive challenge size in bits.
    pub vbitlen: usize,
    /// Non-interactive (Fiat-Shamir) challenge size in bits.
    pub vbitlenro: usize,
    /// Interactive batching-component size in bits.
    pub ebitlen: usize,
    /// Non-interactive batching-component size in bits.
    pub ebitlenro: usize,
    /// Statistical distance (in bits) for random sampling.
    pub rbitlen: usize,
    /// Selects `ChallengerRO` (`true`) vs `ChallengerI` (`false`).
    pub non_interactive: bool,
    /// Hash fixing `H` for the random-oracle challenger and global prefix.
    pub rohash: RoHash,
    /// Symbol recorded into the global prefix; this crate implements only
    /// `"sha-ctr"` (counter-mode expansion of `rohash`).
    pub prg: String,
    /// Storage model for element arrays.
    pub arrays: ArrayStorage,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            k: 3,
            t: 2,
            keywidth: 1,
            vbitlen: DEFAULT_VBITLEN,
            vbitlenro: DEFAULT_VBITLENRO,
            ebitlen: DEFAULT_EBITLEN,
            ebitlenro: DEFAULT_EBITLENRO,
            rbitlen: DEFAULT_RBITLEN,
            non_interactive: true,
            rohash: RoHash::Sha256,
            prg: "sha-ctr".to_string(),
            arrays: ArrayStorage::Ram,
        }
    }
}

impl ProtocolConfig {
    /// Enforce the security floors and the `k <= 1009` bound from §6.4/§9.
    pub fn validate(&self) -> CoreResult<()> {
        if self.k == 0 || self.k > MAX_PARTIES {
            return Err(CoreError::ConfigInvalid(format!(
                "k must be in 1..={MAX_PARTIES}, got {}",
                self.k
            )));
        }
        if self.t == 0 || self.t > self.k {
            return Err(CoreError::ConfigInvalid(format!(
                "t must be in 1..=k ({}), got {}",
                self.k, self.t
            )));
        }
        if self.keywidth == 0 {
            return Err(CoreError::ConfigInvalid("keywidth must be >= 1".to_string()));
        }
        if self.vbitlen < DEFAULT_VBITLEN {
            return Err(CoreError::ConfigInvalid(format!(
                "vbitlen must be >= {DEFAULT_VBITLEN}, got {}",
                self.vbitlen
            )));
        }
        if self.vbitlenro < DEFAULT_VBITLENRO {
            return Err(CoreError::ConfigInvalid(format!(
                "vbitlenro must be >= {DEFAULT_VBITLENRO}, got {}",
                self.vbitlenro
            )));
        }
        if self.ebitlen < DEFAULT_EBITLEN {
            return Err(CoreError::ConfigInvalid(format!(
                "ebitlen must be >= {DEFAULT_EBITLEN}, got {}",
                self.ebitlen
            )));
        }
        if self.ebitlenro < DEFAULT_EBITLENRO {
            return Err(CoreError::ConfigInvalid(format!(
                "ebitlenro must be >= {DEFAULT_EBITLENRO}, got {}",
                self.ebitlenro
            )));
        }
        if self.prg != "sha-ctr" {
            return Err(CoreError::ConfigInvalid(format!(
                "unsupported prg symbol: {}",
                self.prg
            )));
        }
        Ok(())
    }

    /// The challenge bit length this configuration actually uses, depending
    /// on whether the Fiat-Shamir or interactive challenger is selected.
    pub fn active_vbitlen(&self) -> usize {
        if self.non_interactive {
            self.vbitlenro
        } else {
            self.vbitlen
        }
    }

    pub fn active_ebitlen(&self) -> usize {
        if self.non_interactive {
            self.ebitlenro
        } else {
            self.ebitlen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        ProtocolConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_k_above_bound() {
        let config = ProtocolConfig {
            k: MAX_PARTIES + 1,
            t: 1,
            ..ProtocolConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_threshold_above_k() {
        let mut config = ProtocolConfig::default();
        config.t = config.k + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_weak_challenge_size() {
        let config = ProtocolConfig {
            vbitlenro: 64,
            ..ProtocolConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = ProtocolConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ProtocolConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
