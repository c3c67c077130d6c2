#[cfg(feature = "verbose-timing")]
use std::time::Instant;

use tracing::{debug, error};

use crate::mpc_core::config::EngineConfig;
use crate::mpc_core::network::{BatchedNetwork, Network};
use crate::mpc_core::party::error::{MpcError, MpcResult};
#[cfg(feature = "verbose-timing")]
use crate::mpc_core::party::PARTY_TIMER;
use crate::protocol::producer::ProtocolProducer;
use crate::protocol::{EvaluationStatus, NativeProtocol};
use crate::share::RingElement;
use crate::spdz2k::resource_pool::ResourcePool;
use crate::spdz2k::round_sync::Spdz2kRoundSynchronization;

/// Evaluates all protocols of `batch` in lock-step: round `r` of every protocol that is not done
/// yet, then one flush, then round `r + 1`. Returns the number of rounds.
pub fn evaluate_batch<T: RingElement>(
    batch: &mut [NativeProtocol<T>],
    pool: &mut ResourcePool<T>,
    network: &mut BatchedNetwork,
) -> MpcResult<usize> {
    let mut pending: Vec<usize> = (0..batch.len()).collect();
    let mut round = 0;
    while !pending.is_empty() {
        let mut unfinished = Vec::with_capacity(pending.len());
        for &i in &pending {
            if batch[i].evaluate(round, pool, network)? == EvaluationStatus::HasMoreRounds {
                unfinished.push(i);
            }
        }
        network.flush()?;
        pending = unfinished;
        round += 1;
    }
    Ok(round)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub batches: usize,
    pub native_protocols: usize,
    /// Communication rounds, including those of MAC checks.
    pub rounds: usize,
    pub mac_checks: usize,
    pub checked_values: usize,
}

/// Drains a [ProtocolProducer] batch by batch.
pub struct BatchedProtocolEvaluator {
    max_batch_size: usize,
    sync: Spdz2kRoundSynchronization,
}

impl BatchedProtocolEvaluator {
    pub fn new(max_batch_size: usize, open_value_threshold: usize) -> MpcResult<Self> {
        if max_batch_size == 0 {
            return Err(MpcError::InvalidParameters(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(Self {
            max_batch_size,
            sync: Spdz2kRoundSynchronization::new(open_value_threshold),
        })
    }

    pub fn from_config(config: &EngineConfig) -> MpcResult<Self> {
        Self::new(config.batch_size, config.open_value_threshold)
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Evaluates everything `producer` yields, followed by the final MAC check. Any error aborts
    /// the evaluation.
    pub fn eval<T: RingElement>(
        &mut self,
        producer: ProtocolProducer<T>,
        pool: &mut ResourcePool<T>,
        transport: &mut dyn Network,
    ) -> MpcResult<EvaluationStats> {
        if transport.party_id() != pool.my_id() || transport.no_of_parties() != pool.no_of_parties() {
            return Err(MpcError::InvalidParameters(format!(
                "network of party {}/{} used with resource pool of party {}/{}",
                transport.party_id() + 1,
                transport.no_of_parties(),
                pool.my_id() + 1,
                pool.no_of_parties()
            )));
        }
        let mut network = BatchedNetwork::new(transport);
        let res = self.eval_batches(producer, pool, &mut network);
        if let Err(err) = &res {
            error!(party = pool.my_id() + 1, "evaluation aborted: {}", err);
        }
        res
    }

    fn eval_batches<T: RingElement>(
        &mut self,
        mut producer: ProtocolProducer<T>,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<EvaluationStats> {
        let mut stats = EvaluationStats::default();
        let checks_before = self.sync.mac_checks();
        let checked_before = self.sync.checked_values();
        let rounds_before = network.rounds();

        while producer.has_next() {
            let mut batch = Vec::with_capacity(self.max_batch_size);
            producer.append(&mut batch, self.max_batch_size);
            if batch.is_empty() {
                return Err(MpcError::Misuse(
                    "producer reported more protocols but appended none".to_string(),
                ));
            }
            #[cfg(feature = "verbose-timing")]
            let start = Instant::now();
            let rounds = evaluate_batch(&mut batch, pool, network)?;
            #[cfg(feature = "verbose-timing")]
            if let Ok(mut timer) = PARTY_TIMER.lock() {
                timer.report_time("batch", start.elapsed());
            }
            debug!(
                party = pool.my_id() + 1,
                "evaluated batch of {} protocols in {} rounds",
                batch.len(),
                rounds
            );
            stats.batches += 1;
            stats.native_protocols += batch.len();
            self.sync.finished_batch(pool, network)?;
        }
        #[cfg(feature = "verbose-timing")]
        let start = Instant::now();
        self.sync.finished_eval(pool, network)?;
        #[cfg(feature = "verbose-timing")]
        if let Ok(mut timer) = PARTY_TIMER.lock() {
            timer.report_time("final mac check", start.elapsed());
        }

        stats.rounds = network.rounds() - rounds_before;
        stats.mac_checks = self.sync.mac_checks() - checks_before;
        stats.checked_values = self.sync.checked_values() - checked_before;
        Ok(stats)
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{evaluate_batch, BatchedProtocolEvaluator};
    use crate::mpc_core::network::{BatchedNetwork, LocalNetwork};
    use crate::mpc_core::party::error::{MpcError, ProtocolKind};
    use crate::protocol::producer::ProtocolProducer;
    use crate::protocol::test::RecordingProtocol;
    use crate::protocol::NativeProtocol;
    use crate::share::CompUInt64;
    use crate::spdz2k::resource_pool::ResourcePool;
    use crate::spdz2k::supplier::DummyDataSupplier;

    fn pool() -> ResourcePool<CompUInt64> {
        let supplier = DummyDataSupplier::new(0, 2, 0).unwrap();
        ResourcePool::new(0, 2, Box::new(supplier)).unwrap()
    }

    #[test]
    fn rounds_are_evaluated_in_lock_step() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut batch: Vec<NativeProtocol<CompUInt64>> = [1, 3, 2]
            .iter()
            .enumerate()
            .map(|(id, rounds)| NativeProtocol::Recording(RecordingProtocol::new(id, *rounds, log.clone())))
            .collect();
        let mut nets = LocalNetwork::connect_all(2, None);
        let mut network = BatchedNetwork::new(&mut nets[0]);
        let rounds = evaluate_batch(&mut batch, &mut pool(), &mut network).unwrap();
        assert_eq!(rounds, 3);
        assert_eq!(network.rounds(), 3);
        assert_eq!(
            *log.borrow(),
            vec![(0, 0), (1, 0), (2, 0), (1, 1), (2, 1), (1, 2)]
        );
    }

    #[test]
    fn batches_are_bounded() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let producer = ProtocolProducer::parallel(
            (0..5)
                .map(|id| {
                    ProtocolProducer::single(NativeProtocol::Recording(RecordingProtocol::new(id, 2, log.clone())))
                })
                .collect(),
        );
        let mut nets = LocalNetwork::connect_all(2, None);
        let mut evaluator = BatchedProtocolEvaluator::new(2, 100).unwrap();
        let stats = evaluator.eval(producer, &mut pool(), &mut nets[0]).unwrap();
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.native_protocols, 5);
        assert_eq!(stats.rounds, 6);
        assert_eq!(stats.mac_checks, 0);
        assert_eq!(log.borrow().len(), 10);
    }

    #[test]
    fn evaluating_done_protocol_is_rejected() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut recording =
            NativeProtocol::<CompUInt64>::Recording(RecordingProtocol::new(0, 1, log));
        let mut nets = LocalNetwork::connect_all(2, None);
        let mut network = BatchedNetwork::new(&mut nets[0]);
        let mut pool = pool();
        recording.evaluate(0, &mut pool, &mut network).unwrap();
        let err = recording.evaluate(1, &mut pool, &mut network).unwrap_err();
        assert!(matches!(err.root_cause(), MpcError::Misuse(_)));
        assert_eq!(err.failed_stage(), Some(ProtocolKind::Linear));
    }

    #[test]
    fn invalid_setup() {
        assert!(BatchedProtocolEvaluator::new(0, 1).is_err());
        let mut nets = LocalNetwork::connect_all(2, None);
        let mut evaluator = BatchedProtocolEvaluator::new(1, 1).unwrap();
        let res = evaluator.eval(ProtocolProducer::parallel(vec![]), &mut pool(), &mut nets[1]);
        assert!(matches!(res, Err(MpcError::InvalidParameters(_))));
    }
}
