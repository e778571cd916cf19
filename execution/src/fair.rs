//! Commit-reveal outcome derivation.
//!
//! The server commits to `game_hash = H(game_id :: server_secret)` before the
//! player supplies a client secret. The outcome is drawn from a generator
//! seeded by `H(server_secret :: client_secret)`, so anyone holding both
//! revealed secrets can replay it.

use commonware_cryptography::{sha256::Digest, Hasher, Sha256};
use commonware_utils::hex;
use gamba_types::ledger::CoinSide;
use rand::{CryptoRng, RngCore};

use crate::chain::commitment;

/// Deterministic random number generator seeded from a run secret.
///
/// Uses a SHA256 hash chain: the state is rehashed whenever its 32 bytes are
/// exhausted.
#[derive(Clone)]
pub struct GameRng {
    state: [u8; 32],
    index: usize,
}

impl GameRng {
    pub fn new(run_secret: &Digest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(run_secret.as_ref());
        Self {
            state: hasher.finalize().0,
            index: 0,
        }
    }

    fn next_byte(&mut self) -> u8 {
        if self.index >= 32 {
            let mut hasher = Sha256::new();
            hasher.update(&self.state);
            self.state = hasher.finalize().0;
            self.index = 0;
        }
        let result = self.state[self.index];
        self.index += 1;
        result
    }

    /// Get a random value in range [0, max).
    pub fn next_bounded(&mut self, max: u8) -> u8 {
        if max == 0 {
            return 0;
        }
        // Rejection sampling keeps the distribution unbiased
        let limit = u8::MAX - (u8::MAX % max);
        loop {
            let value = self.next_byte();
            if value < limit {
                return value % max;
            }
        }
    }

    pub fn flip(&mut self) -> CoinSide {
        CoinSide::from_bit(self.next_bounded(2))
    }
}

/// `H(server_secret :: client_secret)`.
pub fn run_secret(server_secret: &str, client_secret: &str) -> Digest {
    commitment(server_secret, client_secret)
}

/// `H(game_id :: server_secret)`, published at init time.
pub fn game_hash(game_id: &str, server_secret: &str) -> Digest {
    commitment(game_id, server_secret)
}

pub fn draw_side(server_secret: &str, client_secret: &str) -> CoinSide {
    GameRng::new(&run_secret(server_secret, client_secret)).flip()
}

/// Checks a revealed server secret against the hash disclosed before play.
pub fn verify_commitment(game_id: &str, server_secret: &str, expected: &Digest) -> bool {
    game_hash(game_id, server_secret) == *expected
}

/// Recomputes the drawn side and whether `choice` won.
pub fn replay_outcome(
    server_secret: &str,
    client_secret: &str,
    choice: CoinSide,
) -> (CoinSide, bool) {
    let side = draw_side(server_secret, client_secret);
    (side, side == choice)
}

/// Hex rendering of `bytes` freshly drawn random bytes.
pub fn generate_secret<R: RngCore + CryptoRng>(rng: &mut R, bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rng.fill_bytes(&mut buf);
    hex(&buf)
}
