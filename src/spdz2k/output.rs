use crate::mpc_core::network::BatchedNetwork;
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::promise::Promise;
use crate::protocol::{EvaluationStatus, ProtocolOutput, Stage};
use crate::share::RingElement;
use crate::spdz2k::resource_pool::ResourcePool;
use crate::spdz2k::DeferredShare;

/// Sums the shares broadcast in the previous round and records the opened value of `share`.
fn reconstruct<T: RingElement>(
    pool: &mut ResourcePool<T>,
    network: &mut BatchedNetwork,
    share: AuthenticatedShare<T>,
) -> MpcResult<T> {
    let mut opened = T::ZERO;
    for message in network.receive_from_all()? {
        opened += T::from_be_bytes(&message)?;
    }
    pool.store_mut().push_opened_value(share, opened);
    Ok(opened)
}

/// Opens a shared value to all parties.
///
/// The high `s` bits of a reconstructed sum would leak information about the shares, so the
/// value `x + 2^k·r` is opened for a fresh random `r` and only the low `k` bits are returned.
/// The result is unauthenticated until the next successful MAC check.
pub struct OutputProtocol<T: RingElement> {
    share: DeferredShare<T>,
    masked: Option<AuthenticatedShare<T>>,
    stage: Stage,
    out: ProtocolOutput<T>,
}

impl<T: RingElement> OutputProtocol<T> {
    pub fn new(share: DeferredShare<T>) -> Self {
        Self {
            share,
            masked: None,
            stage: Stage::Init,
            out: ProtocolOutput::new(),
        }
    }

    pub fn promise(&self) -> Promise<T> {
        self.out.promise()
    }

    pub fn out(&self) -> MpcResult<T> {
        self.out.get(self.stage)
    }

    pub fn evaluate(
        &mut self,
        round: usize,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<EvaluationStatus> {
        self.stage.enter(round)?;
        match round {
            0 => {
                let x = self.share.get()?;
                let r = pool.supplier().next_random_element_share()?;
                let masked = x + r.shift_low_up();
                network.send_to_all(&masked.share.to_be_bytes())?;
                self.masked = Some(masked);
                Ok(EvaluationStatus::HasMoreRounds)
            }
            1 => {
                let masked = self
                    .masked
                    .take()
                    .ok_or_else(|| MpcError::Misuse("output share missing".to_string()))?;
                let opened = reconstruct(pool, network, masked)?;
                self.out.set(opened.low_part());
                Ok(self.stage.finish())
            }
            _ => Err(Stage::unexpected_round(round)),
        }
    }
}

/// Opens a shared value to a single party.
///
/// Everybody opens `x - r` where `r` is the input mask of the receiving party, which alone can
/// add `r` back. The other parties learn nothing and get `None`.
pub struct OutputToPartyProtocol<T: RingElement> {
    share: DeferredShare<T>,
    to: usize,
    pending: Option<(AuthenticatedShare<T>, Option<T>)>,
    stage: Stage,
    out: ProtocolOutput<Option<T>>,
}

impl<T: RingElement> OutputToPartyProtocol<T> {
    pub fn new(share: DeferredShare<T>, to: usize) -> Self {
        Self {
            share,
            to,
            pending: None,
            stage: Stage::Init,
            out: ProtocolOutput::new(),
        }
    }

    pub fn promise(&self) -> Promise<Option<T>> {
        self.out.promise()
    }

    pub fn out(&self) -> MpcResult<Option<T>> {
        self.out.get(self.stage)
    }

    pub fn evaluate(
        &mut self,
        round: usize,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<EvaluationStatus> {
        self.stage.enter(round)?;
        match round {
            0 => {
                if self.to >= pool.no_of_parties() {
                    return Err(MpcError::InvalidParameters(format!(
                        "output to party {} in a computation of {} parties",
                        self.to,
                        pool.no_of_parties()
                    )));
                }
                let x = self.share.get()?;
                let mask = pool.supplier().next_input_mask(self.to)?;
                let difference = x - mask.mask_share;
                network.send_to_all(&difference.share.to_be_bytes())?;
                self.pending = Some((difference, mask.real_value));
                Ok(EvaluationStatus::HasMoreRounds)
            }
            1 => {
                let (difference, real_value) = self
                    .pending
                    .take()
                    .ok_or_else(|| MpcError::Misuse("output share missing".to_string()))?;
                let opened = reconstruct(pool, network, difference)?;
                let value = if pool.my_id() == self.to {
                    let r = real_value.ok_or_else(|| {
                        MpcError::InsufficientPreprocessing(
                            "input mask without value for its owner".to_string(),
                        )
                    })?;
                    Some((opened + r).low_part())
                } else {
                    None
                };
                self.out.set(value);
                Ok(self.stage.finish())
            }
            _ => Err(Stage::unexpected_round(round)),
        }
    }
}
