use crate::mpc_core::party::error::MpcResult;
use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::{EvaluationStatus, ProtocolOutput, Stage};
use crate::share::RingElement;
use crate::spdz2k::resource_pool::ResourcePool;
use crate::spdz2k::DeferredShare;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RandomKind {
    Element,
    Bit,
}

/// Takes a random element or bit share from the supplier.
pub struct RandomProtocol<T: RingElement> {
    kind: RandomKind,
    stage: Stage,
    out: ProtocolOutput<AuthenticatedShare<T>>,
}

impl<T: RingElement> RandomProtocol<T> {
    pub fn new(kind: RandomKind) -> Self {
        Self {
            kind,
            stage: Stage::Init,
            out: ProtocolOutput::new(),
        }
    }

    pub fn promise(&self) -> DeferredShare<T> {
        self.out.promise()
    }

    pub fn out(&self) -> MpcResult<AuthenticatedShare<T>> {
        self.out.get(self.stage)
    }

    pub fn evaluate(&mut self, round: usize, pool: &mut ResourcePool<T>) -> MpcResult<EvaluationStatus> {
        self.stage.enter(round)?;
        let share = match self.kind {
            RandomKind::Element => pool.supplier().next_random_element_share()?,
            RandomKind::Bit => pool.supplier().next_bit_share()?,
        };
        self.out.set(share);
        Ok(self.stage.finish())
    }
}
