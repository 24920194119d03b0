//! Runs a full k-of-n threshold decryption over an in-memory board and
//! prints the recovered plaintexts.

use anyhow::{anyhow, Result};
use ark_bn254::{Fr, G1Projective};
use ark_std::UniformRand;
use tracing::info;
use tracing_subscriber::EnvFilter;

use threshold_decrypt::board::InMemoryBoard;
use threshold_decrypt::challenger::{compute_global_prefix, ChallengerRo};
use threshold_decrypt::ciphertext::CiphertextArray;
use threshold_decrypt::config::{ProtocolConfig, RoHash};
use threshold_decrypt::dkg::{DkgView, TrustedDealerDkg};
use threshold_decrypt::group::GroupElement;
use threshold_decrypt::session::Session;

const LOG_TARGET: &str = "decrypt_demo";

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("decrypt_demo=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing subscriber: {err}"))
}

fn main() -> Result<()> {
    init_tracing()?;

    let (k, t, n) = (5usize, 3usize, 3usize);
    let mut rng = ark_std::test_rng();
    let dealer = TrustedDealerDkg::<G1Projective>::deal(&mut rng, k, t);
    let generator = <G1Projective as GroupElement>::generator();
    let public_key = dealer.view_for(1).joint_public_key();

    let messages: Vec<G1Projective> = (0..n).map(|i| generator.exp(&Fr::from(1000 + i as u64))).collect();
    let randomness: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut rng)).collect();
    let ciphertexts = CiphertextArray::encrypt(&generator, &public_key, &messages, &randomness)?;

    info!(target: LOG_TARGET, k, t, n, "dealt shares and encrypted messages");

    let board = InMemoryBoard::new();
    let dir = std::env::temp_dir().join(format!("decrypt-demo-{}", std::process::id()));
    let views: Vec<_> = (1..=k).map(|l| dealer.view_for(l)).collect();

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = views
            .iter()
            .map(|view| {
                let board = &board;
                let ciphertexts = &ciphertexts;
                let dir = &dir;
                let prefix =
                    compute_global_prefix(RoHash::Sha256, b"v1", b"decrypt-demo", 128, 256, 256, "sha-ctr", b"bn254");
                scope.spawn(move || {
                    let session = Session::new(
                        view,
                        board,
                        ChallengerRo::new(RoHash::Sha256, prefix),
                        ProtocolConfig {
                            k,
                            t,
                            ..ProtocolConfig::default()
                        },
                        dir.join(format!("party-{:02}", view.own_index())),
                        ciphertexts,
                    )
                    .expect("valid config");
                    session.decrypt(ciphertexts, &mut ark_std::test_rng())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("party thread panicked")).collect()
    });

    for (party, outcome) in outcomes.into_iter().enumerate() {
        let outcome = outcome?;
        let recovered = outcome.plaintexts == messages;
        info!(target: LOG_TARGET, party = party + 1, recovered, "party finished decryption");
    }

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}
