use tracing::{error, info};

use crate::mpc_core::network::BatchedNetwork;
use crate::mpc_core::party::broadcast::BroadcastContext;
use crate::mpc_core::party::commitment::{self, Nonce};
use crate::mpc_core::party::correlated_randomness::{GlobalRng, SeedContribution};
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::{EvaluationStatus, Stage};
use crate::share::RingElement;
use crate::spdz2k::resource_pool::ResourcePool;

fn missing(what: &str) -> MpcError {
    MpcError::Misuse(format!("mac check state missing: {}", what))
}

/// Batch MAC check of all values in the opened-value store.
///
/// 1. Round 0 commits to a seed contribution, round 1 opens it. The XOR of all contributions
///    seeds the stream of coefficients `χ_j ∈ Z/2^s`.
/// 2. Round 2 computes `y = Σ χ_j·opened_j`, `z = Σ χ_j·mac_j - α_i·y` and commits to `z`.
/// 3. Round 3 opens `z`, round 4 checks that all `z` sum to zero.
/// 4. With more than two parties, round 4 also sends a digest of everything received and
///    round 5 compares the digests before the sum is checked.
pub struct MacCheckProtocol<T: RingElement> {
    stage: Stage,
    shares: Vec<AuthenticatedShare<T>>,
    opened: Vec<T>,
    seed: Option<(SeedContribution, Nonce)>,
    z: Option<(T, Nonce)>,
    commitments: Vec<Vec<u8>>,
    context: Option<BroadcastContext>,
    digest: Option<Vec<u8>>,
    sum: Option<T>,
}

impl<T: RingElement> Default for MacCheckProtocol<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RingElement> MacCheckProtocol<T> {
    pub fn new() -> Self {
        Self {
            stage: Stage::Init,
            shares: Vec::new(),
            opened: Vec::new(),
            seed: None,
            z: None,
            commitments: Vec::new(),
            context: None,
            digest: None,
            sum: None,
        }
    }

    /// Number of opened values covered by this check.
    pub fn checked_values(&self) -> usize {
        self.opened.len()
    }

    pub fn out(&self) -> MpcResult<()> {
        if self.stage.is_done() {
            Ok(())
        } else {
            Err(MpcError::Misuse(
                "result requested before the protocol is done".to_string(),
            ))
        }
    }

    fn record(&mut self, messages: &[Vec<u8>]) -> MpcResult<()> {
        if let Some(context) = self.context.as_mut() {
            for (from, message) in messages.iter().enumerate() {
                context.add_to_view(from, message)?;
            }
        }
        Ok(())
    }

    fn verify(&mut self, party: usize) -> MpcResult<EvaluationStatus> {
        let sum = self.sum.take().ok_or_else(|| missing("sum"))?;
        if !sum.is_zero() {
            error!(
                party = party + 1,
                "MAC check failed for {} opened value(s)",
                self.opened.len()
            );
            return Err(MpcError::MacCheck);
        }
        info!(
            party = party + 1,
            "MAC check passed for {} opened value(s)",
            self.opened.len()
        );
        Ok(self.stage.finish())
    }

    pub fn evaluate(
        &mut self,
        round: usize,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<EvaluationStatus> {
        self.stage.enter(round)?;
        let party = pool.my_id();
        match round {
            0 => {
                let (shares, opened) = pool.store_mut().pop_values();
                self.shares = shares;
                self.opened = opened;
                // the stores of all parties hold the same number of values
                if self.opened.is_empty() {
                    return Ok(self.stage.finish());
                }
                let seed = GlobalRng::contribution(pool.random_local());
                let (commitment, nonce) = commitment::commit(pool.random_local(), &seed);
                network.send_to_all(&commitment)?;
                self.seed = Some((seed, nonce));
                if pool.no_of_parties() > 2 {
                    self.context = Some(BroadcastContext::new(pool.no_of_parties()));
                }
                Ok(EvaluationStatus::HasMoreRounds)
            }
            1 => {
                let commitments = network.receive_from_all()?;
                self.record(&commitments)?;
                self.commitments = commitments;
                let (seed, nonce) = self.seed.ok_or_else(|| missing("seed"))?;
                network.send_to_all(&commitment::opening_bytes(&nonce, &seed))?;
                Ok(EvaluationStatus::HasMoreRounds)
            }
            2 => {
                let openings = network.receive_from_all()?;
                self.record(&openings)?;
                let seeds = self
                    .commitments
                    .iter()
                    .zip(&openings)
                    .map(|(c, o)| commitment::open_bytes(c, o))
                    .collect::<MpcResult<Vec<_>>>()?;
                let mut coefficients = GlobalRng::from_contributions(&seeds)?;

                let mut y = T::ZERO;
                let mut mac = T::ZERO;
                for (share, value) in self.shares.iter().zip(&self.opened) {
                    let chi = T::random_coefficient(coefficients.rng_mut());
                    y += chi * *value;
                    mac += chi * share.mac_share;
                }
                let z = mac - pool.mac_key_share() * y;

                let (z_commitment, nonce) = commitment::commit(pool.random_local(), &z.to_be_bytes());
                network.send_to_all(&z_commitment)?;
                self.z = Some((z, nonce));
                Ok(EvaluationStatus::HasMoreRounds)
            }
            3 => {
                let z_commitments = network.receive_from_all()?;
                self.record(&z_commitments)?;
                self.commitments = z_commitments;
                let (z, nonce) = self.z.ok_or_else(|| missing("z"))?;
                network.send_to_all(&commitment::opening_bytes(&nonce, &z.to_be_bytes()))?;
                Ok(EvaluationStatus::HasMoreRounds)
            }
            4 => {
                let openings = network.receive_from_all()?;
                self.record(&openings)?;
                let mut sum = T::ZERO;
                for (c, o) in self.commitments.iter().zip(&openings) {
                    sum += T::from_be_bytes(commitment::open_bytes(c, o)?)?;
                }
                self.sum = Some(sum);
                match self.context.take() {
                    Some(context) => {
                        let digest = context.digest();
                        network.send_to_all(&digest)?;
                        self.digest = Some(digest);
                        Ok(EvaluationStatus::HasMoreRounds)
                    }
                    None => self.verify(party),
                }
            }
            5 => {
                let received = network.receive_from_all()?;
                let own = self.digest.take().ok_or_else(|| missing("digest"))?;
                if let Err(err) = BroadcastContext::compare_view(&own, &received) {
                    error!(party = party + 1, "inconsistent broadcast during MAC check");
                    return Err(err);
                }
                self.verify(party)
            }
            _ => Err(Stage::unexpected_round(round)),
        }
    }
}
