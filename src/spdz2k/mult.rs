use crate::mpc_core::network::{BatchedNetwork, NetSerializable};
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::{EvaluationStatus, ProtocolOutput, Stage};
use crate::share::RingElement;
use crate::spdz2k::resource_pool::ResourcePool;
use crate::spdz2k::supplier::Triple;
use crate::spdz2k::DeferredShare;

struct Opening<T> {
    triple: Triple<T>,
    epsilon: AuthenticatedShare<T>,
    delta: AuthenticatedShare<T>,
}

/// Multiplication with a Beaver triple `(a, b, c)`.
///
/// Round 0 broadcasts the shares of `ε = x - a` and `δ = y - b`. Round 1 reconstructs `e` and
/// `d` and computes `c + b·e + a·d + e·d`. Both opened values go to the opened-value store.
pub struct MultProtocol<T: RingElement> {
    left: DeferredShare<T>,
    right: DeferredShare<T>,
    opening: Option<Opening<T>>,
    stage: Stage,
    out: ProtocolOutput<AuthenticatedShare<T>>,
}

impl<T: RingElement> MultProtocol<T> {
    pub fn new(left: DeferredShare<T>, right: DeferredShare<T>) -> Self {
        Self {
            left,
            right,
            opening: None,
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

    pub fn evaluate(
        &mut self,
        round: usize,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<EvaluationStatus> {
        self.stage.enter(round)?;
        match round {
            0 => {
                let x = self.left.get()?;
                let y = self.right.get()?;
                let triple = pool.supplier().next_triple_shares()?;
                let epsilon = x - triple.a;
                let delta = y - triple.b;
                network.send_to_all(&T::as_byte_vec_slice(&[epsilon.share, delta.share]))?;
                self.opening = Some(Opening {
                    triple,
                    epsilon,
                    delta,
                });
                Ok(EvaluationStatus::HasMoreRounds)
            }
            1 => {
                let Opening {
                    triple,
                    epsilon,
                    delta,
                } = self
                    .opening
                    .take()
                    .ok_or_else(|| MpcError::Misuse("multiplication opening missing".to_string()))?;
                let mut e = T::ZERO;
                let mut d = T::ZERO;
                for message in network.receive_from_all()? {
                    let values = T::from_byte_vec(message, 2)?;
                    e += values[0];
                    d += values[1];
                }
                let product = (triple.c + triple.b * e + triple.a * d).add_constant(
                    e * d,
                    pool.mac_key_share(),
                    pool.my_id(),
                );
                let store = pool.store_mut();
                store.push_opened_value(epsilon, e);
                store.push_opened_value(delta, d);
                self.out.set(product);
                Ok(self.stage.finish())
            }
            _ => Err(Stage::unexpected_round(round)),
        }
    }
}
