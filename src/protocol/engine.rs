use tracing::info;

use crate::mpc_core::config::EngineConfig;
use crate::mpc_core::network::Network;
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::protocol::evaluator::{BatchedProtocolEvaluator, EvaluationStats};
use crate::protocol::promise::Resolve;
use crate::share::RingElement;
use crate::spdz2k::builder::Numeric;
use crate::spdz2k::resource_pool::ResourcePool;

/// Runs applications built with [Numeric] and returns their results once all opened values
/// passed the MAC check.
pub struct SecureComputationEngine {
    evaluator: BatchedProtocolEvaluator,
}

impl SecureComputationEngine {
    pub fn new(max_batch_size: usize, open_value_threshold: usize) -> MpcResult<Self> {
        Ok(Self {
            evaluator: BatchedProtocolEvaluator::new(max_batch_size, open_value_threshold)?,
        })
    }

    pub fn from_config(config: &EngineConfig) -> MpcResult<Self> {
        Ok(Self {
            evaluator: BatchedProtocolEvaluator::from_config(config)?,
        })
    }

    /// Builds the computation with `app`, evaluates it and resolves what `app` returned.
    pub fn run<T, F, O>(
        &mut self,
        pool: &mut ResourcePool<T>,
        network: &mut dyn Network,
        app: F,
    ) -> MpcResult<(O::Output, EvaluationStats)>
    where
        T: RingElement,
        F: FnOnce(&mut Numeric<T>) -> O,
        O: Resolve,
    {
        let mut builder = Numeric::sequential(pool.no_of_parties());
        let result = app(&mut builder);
        let stats = self.evaluator.eval(builder.build(), pool, network)?;
        let unchecked = pool.store().len();
        if unchecked > 0 {
            return Err(MpcError::UncheckedValues(unchecked));
        }
        info!(
            party = pool.my_id() + 1,
            "computation finished: {} protocols in {} batches, {} rounds, {} MAC check(s)",
            stats.native_protocols,
            stats.batches,
            stats.rounds,
            stats.mac_checks
        );
        Ok((result.resolve()?, stats))
    }
}

#[cfg(test)]
mod test {
    use super::SecureComputationEngine;
    use crate::mpc_core::network::Network;
    use crate::mpc_core::party::error::{MpcError, MpcResult, ProtocolKind};
    use crate::mpc_core::share::HasZero;
    use crate::mpc_core::party::test_export::{
        init_test_logging, localhost_setup, localhost_setup_with, Tamper, TamperingNetwork,
    };
    use crate::protocol::evaluator::EvaluationStats;
    use crate::protocol::promise::{Promise, Resolve};
    use crate::share::{CompUInt128, CompUInt64, RingElement};
    use crate::spdz2k::builder::Numeric;
    use crate::spdz2k::resource_pool::ResourcePool;
    use crate::spdz2k::supplier::{DummyDataSupplier, SupplyLimits};

    const SEED: u64 = 0x5eed;

    type Outcome<O> = MpcResult<(<O as Resolve>::Output, EvaluationStats)>;

    fn party<T, N, O, F>(
        i: usize,
        n: usize,
        net: &mut N,
        engine: (usize, usize),
        limits: SupplyLimits,
        app: F,
    ) -> Outcome<O>
    where
        T: RingElement,
        N: Network,
        O: Resolve,
        F: FnOnce(&mut Numeric<T>) -> O,
    {
        let supplier = DummyDataSupplier::<T>::new(i, n, SEED)?.with_limits(limits);
        let mut pool = ResourcePool::new(i, n, Box::new(supplier))?;
        let mut engine = SecureComputationEngine::new(engine.0, engine.1)?;
        engine.run(&mut pool, net, app)
    }

    fn evaluate<T, O, F>(n: usize, batch_size: usize, threshold: usize, app: F) -> Vec<Outcome<O>>
    where
        T: RingElement,
        O: Resolve,
        O::Output: Send,
        F: Fn(usize, &mut Numeric<T>) -> O + Sync,
    {
        init_test_logging();
        localhost_setup(n, |i, net| {
            party(i, n, net, (batch_size, threshold), SupplyLimits::default(), |b| app(i, b))
        })
    }

    fn input_of<T: RingElement>(i: usize, owner: usize, value: u64) -> Option<T> {
        (i == owner).then(|| T::from_u64(value))
    }

    /// Inputs `x` of party 1 and `y` of party 2, then opens `x + y` and `x * y`.
    fn sum_and_product<T: RingElement>(i: usize, b: &mut Numeric<T>) -> (Promise<T>, Promise<T>) {
        let (x, y) = b.par(|b| (b.input(input_of(i, 0, 7), 0), b.input(input_of(i, 1, 5), 1)));
        let (sum, product) = b.par(|b| (b.add(&x, &y), b.mult(&x, &y)));
        b.par(|b| (b.open(&sum), b.open(&product)))
    }

    #[test]
    fn two_party_sum_and_product() {
        for res in evaluate(2, 4096, 100_000, sum_and_product::<CompUInt128>) {
            let ((sum, product), stats) = res.unwrap();
            assert_eq!(sum, CompUInt128::from_u64(12));
            assert_eq!(product, CompUInt128::from_u64(35));
            assert_eq!(stats.batches, 3);
            assert_eq!(stats.native_protocols, 6);
            assert_eq!(stats.mac_checks, 1);
            // e and d of the multiplication plus the two outputs
            assert_eq!(stats.checked_values, 4);
        }
    }

    #[test]
    fn three_parties_small_ring() {
        let results = evaluate::<CompUInt64, _, _>(3, 4096, 100_000, |i, b| {
            let x = b.input(input_of(i, 0, 7), 0);
            let y = b.input(input_of(i, 1, 5), 1);
            let z = b.input(input_of(i, 2, 4), 2);
            let xy = b.mult(&x, &y);
            let diff = b.sub(&xy, &z);
            let scaled = b.mul_constant(&diff, CompUInt64::from_u64(3));
            let res = b.add_constant(&scaled, CompUInt64::from_u64(10));
            let one = b.known(CompUInt64::ONE);
            let minus_one = b.neg(&one);
            b.par(|b| (b.open(&res), b.open(&minus_one)))
        });
        for res in results {
            let ((value, minus_one), _) = res.unwrap();
            assert_eq!(value, CompUInt64::from_u64(103));
            assert_eq!(minus_one, CompUInt64::from_u64(u32::MAX as u64));
        }
    }

    #[test]
    fn open_to_single_party() {
        let results = evaluate::<CompUInt128, _, _>(3, 4096, 100_000, |i, b| {
            let (x, y) = b.par(|b| (b.input(input_of(i, 0, 7), 0), b.input(input_of(i, 2, 5), 2)));
            let product = b.mult(&x, &y);
            b.open_to(&product, 1)
        });
        for (i, res) in results.into_iter().enumerate() {
            let (value, _) = res.unwrap();
            if i == 1 {
                assert_eq!(value, Some(CompUInt128::from_u64(35)));
            } else {
                assert_eq!(value, None);
            }
        }
    }

    #[test]
    fn random_values_are_consistent() {
        let results = evaluate::<CompUInt128, _, _>(2, 3, 100_000, |_, b| {
            let bits: Vec<_> = (0..8).map(|_| b.random_bit()).collect();
            let element = b.random_element();
            let opened_bits = b.par(|b| bits.iter().map(|bit| b.open(bit)).collect::<Vec<_>>());
            (opened_bits, b.open(&element))
        });
        let outputs: Vec<_> = results.into_iter().map(|res| res.unwrap().0).collect();
        assert_eq!(outputs[0], outputs[1]);
        for bit in &outputs[0].0 {
            assert!(*bit == CompUInt128::ZERO || *bit == CompUInt128::ONE);
        }
    }

    #[test]
    fn threshold_triggers_intermediate_checks() {
        let app = |i: usize, b: &mut Numeric<CompUInt128>| {
            let (x, y) = b.par(|b| (b.input(input_of(i, 0, 7), 0), b.input(input_of(i, 1, 5), 1)));
            let product = b.mult(&x, &y);
            b.open(&product)
        };
        for res in evaluate(2, 4096, 1, app) {
            let (product, stats) = res.unwrap();
            assert_eq!(product, CompUInt128::from_u64(35));
            assert_eq!(stats.mac_checks, 2);
            assert_eq!(stats.checked_values, 3);
        }
        for res in evaluate(2, 4096, 100, app) {
            let (_, stats) = res.unwrap();
            assert_eq!(stats.mac_checks, 1);
            assert_eq!(stats.checked_values, 3);
        }
    }

    #[test]
    fn lazy_block_branches_on_opened_value() {
        let results = evaluate::<CompUInt128, _, _>(2, 4096, 100_000, |i, b| {
            let x = b.input(input_of(i, 0, 7), 0);
            let y = b.input(input_of(i, 1, 5), 1);
            let opened = b.open(&x);
            let branch = opened.clone();
            let z = b.lazy(move |b| {
                if branch.get().unwrap().low() > 5 {
                    b.mult(&x, &y)
                } else {
                    b.add(&x, &y)
                }
            });
            (opened, b.open(&z))
        });
        for res in results {
            let ((x, z), _) = res.unwrap();
            assert_eq!(x, CompUInt128::from_u64(7));
            assert_eq!(z, CompUInt128::from_u64(35));
        }
    }

    #[test]
    fn tampered_multiplication_fails_mac_check() {
        // transfer 0 of party 2 is its masked input, transfer 1 holds the shares of e and d
        let tamper = Tamper {
            target: 0,
            transfer: 1,
            byte: 35,
            bit: 0,
        };
        init_test_logging();
        let results = localhost_setup_with(
            2,
            |i, net| {
                if i == 1 {
                    TamperingNetwork::new(net, tamper)
                } else {
                    TamperingNetwork::honest(net)
                }
            },
            |i, net| {
                party::<CompUInt128, _, _, _>(
                    i,
                    2,
                    net,
                    (4096, 100_000),
                    SupplyLimits::default(),
                    |b| sum_and_product(i, b),
                )
                .map(|_| ())
            },
        );
        for res in results {
            let err = res.unwrap_err();
            assert!(err.is_authentication_failure(), "{}", err);
            assert!(matches!(err.root_cause(), MpcError::MacCheck));
            assert_eq!(err.failed_stage(), Some(ProtocolKind::MacCheck));
        }
    }

    /// The last party inputs 7 and the value is opened, while the last party flips `bit` of
    /// `byte` in its share of the masked output sent to party 1.
    fn tampered_output(n: usize, byte: usize, bit: u8) -> Vec<MpcResult<()>> {
        let attacker = n - 1;
        // input broadcast, then one digest per validation round with more than two parties
        let transfer = if n > 2 { 2 } else { 1 };
        let tamper = Tamper {
            target: 0,
            transfer,
            byte,
            bit,
        };
        init_test_logging();
        localhost_setup_with(
            n,
            |i, net| {
                if i == attacker {
                    TamperingNetwork::new(net, tamper)
                } else {
                    TamperingNetwork::honest(net)
                }
            },
            |i, net| {
                party::<CompUInt128, _, _, _>(
                    i,
                    n,
                    net,
                    (4096, 100_000),
                    SupplyLimits::default(),
                    |b| {
                        let x = b.input(input_of(i, attacker, 7), attacker);
                        b.open(&x)
                    },
                )
                .map(|_| ())
            },
        )
    }

    #[test]
    fn tampered_output_fails_mac_check() {
        // frame = 4 length bytes + 16 bytes of x + 2^k·r; bit 0 of byte 11 adds 2^64 (high
        // part), bit 0 of byte 19 adds 1 (low part)
        for n in [2, 3] {
            for byte in [11, 19] {
                for (i, res) in tampered_output(n, byte, 0).into_iter().enumerate() {
                    let err = res.unwrap_err();
                    assert!(
                        matches!(err.root_cause(), MpcError::MacCheck),
                        "n = {}, byte {}, party {}: {}",
                        n,
                        byte,
                        i + 1,
                        err
                    );
                    assert_eq!(err.failed_stage(), Some(ProtocolKind::MacCheck));
                }
            }
        }
    }

    #[test]
    fn inconsistent_input_broadcast_is_detected() {
        // flips the last byte of the masked input party 1 sends to party 2
        let tamper = Tamper {
            target: 1,
            transfer: 0,
            byte: 19,
            bit: 0,
        };
        init_test_logging();
        let results = localhost_setup_with(
            3,
            |i, net| {
                if i == 0 {
                    TamperingNetwork::new(net, tamper)
                } else {
                    TamperingNetwork::honest(net)
                }
            },
            |i, net| {
                party::<CompUInt128, _, _, _>(
                    i,
                    3,
                    net,
                    (4096, 100_000),
                    SupplyLimits::default(),
                    |b| {
                        let x = b.input(input_of(i, 0, 7), 0);
                        b.open(&x)
                    },
                )
                .map(|_| ())
            },
        );
        for res in results {
            let err = res.unwrap_err();
            assert!(matches!(err.root_cause(), MpcError::Broadcast), "{}", err);
            assert_eq!(err.failed_stage(), Some(ProtocolKind::BroadcastValidation));
        }
    }

    #[test]
    fn exhausted_preprocessing_aborts() {
        init_test_logging();
        let limits = SupplyLimits {
            triples: Some(1),
            ..SupplyLimits::default()
        };
        let results = localhost_setup(2, |i, net| {
            party::<CompUInt128, _, _, _>(i, 2, net, (4096, 100_000), limits, |b| {
                let (x, y) = b.par(|b| (b.input(input_of(i, 0, 7), 0), b.input(input_of(i, 1, 5), 1)));
                let products = b.par(|b| (b.mult(&x, &y), b.mult(&x, &x)));
                b.par(|b| (b.open(&products.0), b.open(&products.1)))
            })
            .map(|_| ())
        });
        for res in results {
            let err = res.unwrap_err();
            assert!(matches!(err.root_cause(), MpcError::InsufficientPreprocessing(_)));
            assert_eq!(err.failed_stage(), Some(ProtocolKind::Multiplication));
            assert!(!err.is_authentication_failure());
        }
    }
}
