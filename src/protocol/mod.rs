//! The protocol evaluation engine.
//!
//! Applications describe a computation as a tree of [producer::ProtocolProducer]s. The
//! [evaluator::BatchedProtocolEvaluator] drains that tree into batches of [NativeProtocol]s and
//! runs each batch round by round in lock-step with the other parties.
pub mod engine;
pub mod evaluator;
pub mod producer;
pub mod promise;

use crate::mpc_core::network::BatchedNetwork;
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::share::RingElement;
use crate::spdz2k::broadcast_validation::BroadcastValidationProtocol;
use crate::spdz2k::input::InputProtocol;
use crate::spdz2k::linear::LinearProtocol;
use crate::spdz2k::mac_check::MacCheckProtocol;
use crate::spdz2k::mult::MultProtocol;
use crate::spdz2k::output::{OutputProtocol, OutputToPartyProtocol};
use crate::spdz2k::random::RandomProtocol;
use crate::spdz2k::resource_pool::ResourcePool;

pub use crate::mpc_core::party::error::ProtocolKind;

use self::promise::{promise, Completer, Promise};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationStatus {
    HasMoreRounds,
    Done,
}

/// Progress of a native protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Init,
    Round(usize),
    Done,
}

impl Stage {
    /// Moves to `round`. Rounds must be entered in order starting at `0`, and not after
    /// [Stage::Done].
    pub fn enter(&mut self, round: usize) -> MpcResult<()> {
        let expected = match *self {
            Stage::Init => 0,
            Stage::Round(r) => r + 1,
            Stage::Done => {
                return Err(MpcError::Misuse(
                    "protocol evaluated after it was done".to_string(),
                ))
            }
        };
        if round != expected {
            return Err(MpcError::Misuse(format!(
                "protocol evaluated in round {}, expected round {}",
                round, expected
            )));
        }
        *self = Stage::Round(round);
        Ok(())
    }

    pub fn finish(&mut self) -> EvaluationStatus {
        *self = Stage::Done;
        EvaluationStatus::Done
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Stage::Done)
    }

    pub(crate) fn unexpected_round(round: usize) -> MpcError {
        MpcError::Misuse(format!("no round {} in this protocol", round))
    }
}

/// Result slot of a native protocol.
pub struct ProtocolOutput<T> {
    completers: Vec<Completer<T>>,
    promise: Promise<T>,
}

impl<T: Clone> Default for ProtocolOutput<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ProtocolOutput<T> {
    pub fn new() -> Self {
        let (completer, promise) = promise();
        Self {
            completers: vec![completer],
            promise,
        }
    }

    /// Additionally completes `completer` with the result.
    pub fn forward_to(&mut self, completer: Completer<T>) {
        self.completers.push(completer);
    }

    pub fn promise(&self) -> Promise<T> {
        self.promise.clone()
    }

    pub fn set(&mut self, value: T) {
        for completer in self.completers.drain(..) {
            completer.complete(value.clone());
        }
    }

    /// The result, available once `stage` is [Stage::Done].
    pub fn get(&self, stage: Stage) -> MpcResult<T> {
        if !stage.is_done() {
            return Err(MpcError::Misuse(
                "result requested before the protocol is done".to_string(),
            ));
        }
        self.promise.get()
    }
}

/// The unit of network-synchronized work.
pub enum NativeProtocol<T: RingElement> {
    Linear(LinearProtocol<T>),
    Random(RandomProtocol<T>),
    Input(InputProtocol<T>),
    Mult(MultProtocol<T>),
    Output(OutputProtocol<T>),
    OutputToParty(OutputToPartyProtocol<T>),
    BroadcastValidation(BroadcastValidationProtocol),
    MacCheck(MacCheckProtocol<T>),
    #[cfg(test)]
    Recording(test::RecordingProtocol),
}

impl<T: RingElement> NativeProtocol<T> {
    pub fn kind(&self) -> ProtocolKind {
        match self {
            NativeProtocol::Linear(_) => ProtocolKind::Linear,
            NativeProtocol::Random(_) => ProtocolKind::Random,
            NativeProtocol::Input(_) => ProtocolKind::Input,
            NativeProtocol::Mult(_) => ProtocolKind::Multiplication,
            NativeProtocol::Output(_) | NativeProtocol::OutputToParty(_) => ProtocolKind::Output,
            NativeProtocol::BroadcastValidation(_) => ProtocolKind::BroadcastValidation,
            NativeProtocol::MacCheck(_) => ProtocolKind::MacCheck,
            #[cfg(test)]
            NativeProtocol::Recording(_) => ProtocolKind::Linear,
        }
    }

    /// Runs round `round` of the protocol. Errors are tagged with the protocol kind.
    pub fn evaluate(
        &mut self,
        round: usize,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<EvaluationStatus> {
        let res = match self {
            NativeProtocol::Linear(p) => p.evaluate(round, pool),
            NativeProtocol::Random(p) => p.evaluate(round, pool),
            NativeProtocol::Input(p) => p.evaluate(round, pool, network),
            NativeProtocol::Mult(p) => p.evaluate(round, pool, network),
            NativeProtocol::Output(p) => p.evaluate(round, pool, network),
            NativeProtocol::OutputToParty(p) => p.evaluate(round, pool, network),
            NativeProtocol::BroadcastValidation(p) => p.evaluate(round, network),
            NativeProtocol::MacCheck(p) => p.evaluate(round, pool, network),
            #[cfg(test)]
            NativeProtocol::Recording(p) => p.evaluate(round),
        };
        res.map_err(|err| err.during(self.kind()))
    }
}
