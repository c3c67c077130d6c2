use crate::mpc_core::party::error::MpcResult;
use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::promise::Completer;
use crate::protocol::{EvaluationStatus, ProtocolOutput, Stage};
use crate::share::RingElement;
use crate::spdz2k::resource_pool::ResourcePool;
use crate::spdz2k::DeferredShare;

/// Operations that every party computes on its own shares.
pub enum LinearOp<T> {
    /// A public constant.
    Known(T),
    Add(DeferredShare<T>, DeferredShare<T>),
    Sub(DeferredShare<T>, DeferredShare<T>),
    Neg(DeferredShare<T>),
    AddConstant(DeferredShare<T>, T),
    MulConstant(DeferredShare<T>, T),
    Copy(DeferredShare<T>),
}

/// Single-round local protocol.
pub struct LinearProtocol<T: RingElement> {
    op: LinearOp<T>,
    stage: Stage,
    out: ProtocolOutput<AuthenticatedShare<T>>,
}

impl<T: RingElement> LinearProtocol<T> {
    pub fn new(op: LinearOp<T>) -> Self {
        Self {
            op,
            stage: Stage::Init,
            out: ProtocolOutput::new(),
        }
    }

    /// A protocol that passes `source` on to `target` once it is available.
    pub fn forward(source: DeferredShare<T>, target: Completer<AuthenticatedShare<T>>) -> Self {
        let mut protocol = Self::new(LinearOp::Copy(source));
        protocol.out.forward_to(target);
        protocol
    }

    pub fn promise(&self) -> DeferredShare<T> {
        self.out.promise()
    }

    pub fn out(&self) -> MpcResult<AuthenticatedShare<T>> {
        self.out.get(self.stage)
    }

    pub fn evaluate(&mut self, round: usize, pool: &mut ResourcePool<T>) -> MpcResult<EvaluationStatus> {
        self.stage.enter(round)?;
        let key = pool.mac_key_share();
        let id = pool.my_id();
        let result = match &self.op {
            LinearOp::Known(c) => AuthenticatedShare::from_public(*c, key, id),
            LinearOp::Add(a, b) => a.get()? + b.get()?,
            LinearOp::Sub(a, b) => a.get()? - b.get()?,
            LinearOp::Neg(a) => -a.get()?,
            LinearOp::AddConstant(a, c) => a.get()?.add_constant(*c, key, id),
            LinearOp::MulConstant(a, c) => a.get()? * *c,
            LinearOp::Copy(a) => a.get()?,
        };
        self.out.set(result);
        Ok(self.stage.finish())
    }
}
