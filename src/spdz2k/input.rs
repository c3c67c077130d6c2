use crate::mpc_core::network::BatchedNetwork;
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::promise::Promise;
use crate::protocol::{EvaluationStatus, ProtocolOutput, Stage};
use crate::share::RingElement;
use crate::spdz2k::resource_pool::ResourcePool;
use crate::spdz2k::supplier::InputMask;
use crate::spdz2k::DeferredShare;

/// Secret-shares the input of one party.
///
/// The input party broadcasts its value minus the mask it alone knows; everybody adds the
/// broadcast value as public constant to its share of the mask. The broadcast message is exposed
/// through [InputProtocol::received] so that it can be validated with more than two parties.
pub struct InputProtocol<T: RingElement> {
    input: Option<T>,
    input_party: usize,
    mask: Option<InputMask<T>>,
    stage: Stage,
    out: ProtocolOutput<AuthenticatedShare<T>>,
    received: ProtocolOutput<Vec<u8>>,
}

impl<T: RingElement> InputProtocol<T> {
    /// `input` must be `Some` exactly at the input party.
    pub fn new(input: Option<T>, input_party: usize) -> Self {
        Self {
            input,
            input_party,
            mask: None,
            stage: Stage::Init,
            out: ProtocolOutput::new(),
            received: ProtocolOutput::new(),
        }
    }

    pub fn promise(&self) -> DeferredShare<T> {
        self.out.promise()
    }

    /// The masked input as received from the input party.
    pub fn received(&self) -> Promise<Vec<u8>> {
        self.received.promise()
    }

    pub fn out(&self) -> MpcResult<AuthenticatedShare<T>> {
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
                if self.input_party >= pool.no_of_parties() {
                    return Err(MpcError::InvalidParameters(format!(
                        "input from party {} in a computation of {} parties",
                        self.input_party,
                        pool.no_of_parties()
                    )));
                }
                let mask = pool.supplier().next_input_mask(self.input_party)?;
                if pool.my_id() == self.input_party {
                    let value = self.input.ok_or_else(|| {
                        MpcError::Misuse("input party provided no input".to_string())
                    })?;
                    let real_value = mask.real_value.ok_or_else(|| {
                        MpcError::InsufficientPreprocessing(
                            "input mask without value for its owner".to_string(),
                        )
                    })?;
                    network.send_to_all(&(value - real_value).to_be_bytes())?;
                } else if self.input.is_some() {
                    return Err(MpcError::Misuse(format!(
                        "input given to party {} for an input of party {}",
                        pool.my_id() + 1,
                        self.input_party + 1
                    )));
                }
                self.mask = Some(mask);
                Ok(EvaluationStatus::HasMoreRounds)
            }
            1 => {
                let bytes = network.receive(self.input_party)?;
                let masked = T::from_be_bytes(&bytes)?;
                let mask = self
                    .mask
                    .take()
                    .ok_or_else(|| MpcError::Misuse("input mask missing".to_string()))?;
                let share = mask
                    .mask_share
                    .add_constant(masked, pool.mac_key_share(), pool.my_id());
                self.out.set(share);
                self.received.set(bytes);
                Ok(self.stage.finish())
            }
            _ => Err(Stage::unexpected_round(round)),
        }
    }
}
