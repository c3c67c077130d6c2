//! Application-facing construction of computations.
//!
//! Every operation of [Numeric] immediately returns a promise of its result and records the
//! native protocol that will produce it. Operations in a sequential builder run one after
//! another; operations in a parallel builder must not depend on each other.
use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::producer::ProtocolProducer;
use crate::protocol::promise::{promise, Promise};
use crate::protocol::NativeProtocol;
use crate::share::RingElement;
use crate::spdz2k::broadcast_validation::BroadcastValidationProtocol;
use crate::spdz2k::input::InputProtocol;
use crate::spdz2k::linear::{LinearOp, LinearProtocol};
use crate::spdz2k::mult::MultProtocol;
use crate::spdz2k::output::{OutputProtocol, OutputToPartyProtocol};
use crate::spdz2k::random::{RandomKind, RandomProtocol};
use crate::spdz2k::DeferredShare;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Composition {
    Sequential,
    Parallel,
}

pub struct Numeric<T: RingElement> {
    no_of_parties: usize,
    composition: Composition,
    children: Vec<ProtocolProducer<T>>,
}

impl<T: RingElement> Numeric<T> {
    pub fn sequential(no_of_parties: usize) -> Self {
        Self {
            no_of_parties,
            composition: Composition::Sequential,
            children: Vec::new(),
        }
    }

    pub fn parallel(no_of_parties: usize) -> Self {
        Self {
            no_of_parties,
            composition: Composition::Parallel,
            children: Vec::new(),
        }
    }

    pub fn no_of_parties(&self) -> usize {
        self.no_of_parties
    }

    pub fn build(self) -> ProtocolProducer<T> {
        match self.composition {
            Composition::Sequential => ProtocolProducer::sequential(self.children),
            Composition::Parallel => ProtocolProducer::parallel(self.children),
        }
    }

    fn push(&mut self, protocol: NativeProtocol<T>) {
        self.children.push(ProtocolProducer::single(protocol));
    }

    fn linear(&mut self, op: LinearOp<T>) -> DeferredShare<T> {
        let protocol = LinearProtocol::new(op);
        let out = protocol.promise();
        self.push(NativeProtocol::Linear(protocol));
        out
    }

    pub fn known(&mut self, value: T) -> DeferredShare<T> {
        self.linear(LinearOp::Known(value))
    }

    /// Secret-shares the input of party `input_party` (0-based). Only that party passes
    /// `Some(value)`.
    ///
    /// With more than two parties the broadcast of the masked input is validated before the
    /// enclosing sequence continues.
    pub fn input(&mut self, value: Option<T>, input_party: usize) -> DeferredShare<T> {
        let protocol = InputProtocol::new(value, input_party);
        let out = protocol.promise();
        if self.no_of_parties > 2 {
            let validation =
                BroadcastValidationProtocol::new(vec![(input_party, protocol.received())]);
            self.children.push(ProtocolProducer::sequential(vec![
                ProtocolProducer::single(NativeProtocol::Input(protocol)),
                ProtocolProducer::single(NativeProtocol::BroadcastValidation(validation)),
            ]));
        } else {
            self.push(NativeProtocol::Input(protocol));
        }
        out
    }

    pub fn add(&mut self, a: &DeferredShare<T>, b: &DeferredShare<T>) -> DeferredShare<T> {
        self.linear(LinearOp::Add(a.clone(), b.clone()))
    }

    pub fn sub(&mut self, a: &DeferredShare<T>, b: &DeferredShare<T>) -> DeferredShare<T> {
        self.linear(LinearOp::Sub(a.clone(), b.clone()))
    }

    pub fn neg(&mut self, a: &DeferredShare<T>) -> DeferredShare<T> {
        self.linear(LinearOp::Neg(a.clone()))
    }

    pub fn add_constant(&mut self, a: &DeferredShare<T>, c: T) -> DeferredShare<T> {
        self.linear(LinearOp::AddConstant(a.clone(), c))
    }

    pub fn mul_constant(&mut self, a: &DeferredShare<T>, c: T) -> DeferredShare<T> {
        self.linear(LinearOp::MulConstant(a.clone(), c))
    }

    pub fn mult(&mut self, a: &DeferredShare<T>, b: &DeferredShare<T>) -> DeferredShare<T> {
        let protocol = MultProtocol::new(a.clone(), b.clone());
        let out = protocol.promise();
        self.push(NativeProtocol::Mult(protocol));
        out
    }

    /// Opens `a` to all parties.
    pub fn open(&mut self, a: &DeferredShare<T>) -> Promise<T> {
        let protocol = OutputProtocol::new(a.clone());
        let out = protocol.promise();
        self.push(NativeProtocol::Output(protocol));
        out
    }

    /// Opens `a` to party `to` (0-based) only; all other parties get `None`.
    pub fn open_to(&mut self, a: &DeferredShare<T>, to: usize) -> Promise<Option<T>> {
        let protocol = OutputToPartyProtocol::new(a.clone(), to);
        let out = protocol.promise();
        self.push(NativeProtocol::OutputToParty(protocol));
        out
    }

    pub fn random_element(&mut self) -> DeferredShare<T> {
        self.random(RandomKind::Element)
    }

    pub fn random_bit(&mut self) -> DeferredShare<T> {
        self.random(RandomKind::Bit)
    }

    fn random(&mut self, kind: RandomKind) -> DeferredShare<T> {
        let protocol = RandomProtocol::new(kind);
        let out = protocol.promise();
        self.push(NativeProtocol::Random(protocol));
        out
    }

    /// Adds a nested sequential block built by `f`.
    pub fn seq<R>(&mut self, f: impl FnOnce(&mut Numeric<T>) -> R) -> R {
        let mut inner = Numeric::sequential(self.no_of_parties);
        let res = f(&mut inner);
        self.children.push(inner.build());
        res
    }

    /// Adds a nested parallel block built by `f`.
    pub fn par<R>(&mut self, f: impl FnOnce(&mut Numeric<T>) -> R) -> R {
        let mut inner = Numeric::parallel(self.no_of_parties);
        let res = f(&mut inner);
        self.children.push(inner.build());
        res
    }

    /// Adds a block that is only built once everything before it in the enclosing sequence has
    /// been evaluated, so `f` may read the results of earlier steps, e.g. to branch on an opened
    /// value.
    pub fn lazy<F>(&mut self, f: F) -> DeferredShare<T>
    where
        F: FnOnce(&mut Numeric<T>) -> DeferredShare<T> + 'static,
    {
        let (completer, out) = promise::<AuthenticatedShare<T>>();
        let no_of_parties = self.no_of_parties;
        self.children.push(ProtocolProducer::lazy(move || {
            let mut inner = Numeric::sequential(no_of_parties);
            let result = f(&mut inner);
            inner.push(NativeProtocol::Linear(LinearProtocol::forward(result, completer)));
            inner.build()
        }));
        out
    }
}
