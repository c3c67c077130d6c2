use rand::{CryptoRng, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::mpc_core::party::error::{MpcError, MpcResult};

pub const CR_SEC_PARAM: usize = 128 / 8;

pub type SeedContribution = [u8; CR_SEC_PARAM];

/// Randomness source shared between all parties, seeded by the XOR of one seed contribution per
/// party.
pub struct GlobalRng(ChaCha20Rng);

impl GlobalRng {
    /// Samples this party's contribution to the joint seed.
    pub fn contribution<LocalRng: Rng + CryptoRng>(rng: &mut LocalRng) -> SeedContribution {
        let mut seed = [0u8; CR_SEC_PARAM];
        rng.fill_bytes(&mut seed);
        seed
    }

    /// Combines the opened contributions of all parties.
    pub fn from_contributions(contributions: &[&[u8]]) -> MpcResult<Self> {
        let mut common_seed = [0u8; 32];
        for seed in contributions {
            if seed.len() != CR_SEC_PARAM {
                return Err(MpcError::MalformedMessage(format!(
                    "seed contribution of {} bytes, expected {}",
                    seed.len(),
                    CR_SEC_PARAM
                )));
            }
            for (i, byte) in seed.iter().enumerate() {
                common_seed[i] ^= byte;
            }
        }
        Ok(Self(ChaCha20Rng::from_seed(common_seed)))
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha20Rng {
        &mut self.0
    }
}
