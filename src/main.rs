#![doc = include_str!("../README.md")]
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use itertools::Itertools;
use spdz_engine::mpc_core::config::{EngineConfig, DEFAULT_BATCH_SIZE, DEFAULT_OPEN_VALUE_THRESHOLD};
use spdz_engine::mpc_core::network::{log_comm_statistics, Network};
use spdz_engine::mpc_core::party::error::MpcResult;
#[cfg(feature = "verbose-timing")]
use spdz_engine::mpc_core::party::PARTY_TIMER;
use spdz_engine::mpc_core::party::test_export::localhost_setup_with_timeout;
use spdz_engine::protocol::engine::SecureComputationEngine;
use spdz_engine::protocol::evaluator::EvaluationStats;
use spdz_engine::share::{CompUInt128, CompUInt64, RingElement};
use spdz_engine::spdz2k::resource_pool::ResourcePool;
use spdz_engine::spdz2k::supplier::DummyDataSupplier;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Simulates all parties of a computation in one process. Input `j` is provided by party
/// `j mod parties`; the sum and the product of all inputs are opened.
#[derive(Parser)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Engine configuration (TOML). Its party_count, batch_size, open_value_threshold and dealer_seed override the flags")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 2)]
    parties: usize,

    #[arg(long, num_args = 1.., default_values_t = [7u64, 5])]
    inputs: Vec<u64>,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, help = "Number of unchecked opened values that triggers a MAC check", default_value_t = DEFAULT_OPEN_VALUE_THRESHOLD)]
    threshold: usize,

    #[arg(long, help = "Seed of the simulated preprocessing", default_value_t = 0)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = Ring::K64)]
    ring: Ring,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum Ring {
    /// `Z/2^128` with k = s = 64
    K64,
    /// `Z/2^64` with k = s = 32
    K32,
}

fn party<T: RingElement>(
    i: usize,
    config: &EngineConfig,
    inputs: &[u64],
    network: &mut dyn Network,
) -> MpcResult<((T, T), EvaluationStats)> {
    let n = config.party_count;
    let supplier = DummyDataSupplier::<T>::new(i, n, config.dealer_seed)?;
    let mut pool = ResourcePool::new(i, n, Box::new(supplier))?;
    let mut engine = SecureComputationEngine::from_config(config)?;
    engine.run(&mut pool, network, |b| {
        let shares = b.par(|b| {
            inputs
                .iter()
                .enumerate()
                .map(|(j, x)| b.input((j % n == i).then(|| T::from_u64(*x)), j % n))
                .collect_vec()
        });
        let (sum, product) = b.par(|b| {
            let sum = b.seq(|b| {
                let mut acc = b.known(T::ZERO);
                for share in &shares {
                    acc = b.add(&acc, share);
                }
                acc
            });
            let product = b.seq(|b| {
                let mut acc = b.known(T::ONE);
                for share in &shares {
                    acc = b.mult(&acc, share);
                }
                acc
            });
            (sum, product)
        });
        b.par(|b| (b.open(&sum), b.open(&product)))
    })
}

fn simulate<T: RingElement>(config: &EngineConfig, inputs: &[u64]) -> Result<(), String> {
    let results = localhost_setup_with_timeout(config.party_count, config.receive_timeout(), |i, net| {
        let res = party::<T>(i, config, inputs, net);
        log_comm_statistics(i, net.comm_stats());
        res
    });
    let mut failed = false;
    for (i, res) in results.into_iter().enumerate() {
        match res {
            Ok(((sum, product), stats)) => info!(
                party = i + 1,
                "sum = {}, product = {} ({} batches, {} rounds, {} MAC check(s) over {} values)",
                sum.low(),
                product.low(),
                stats.batches,
                stats.rounds,
                stats.mac_checks,
                stats.checked_values
            ),
            Err(err) => {
                error!(party = i + 1, "computation failed: {}", err);
                failed = true;
            }
        }
    }
    if failed {
        Err("at least one party aborted".to_string())
    } else {
        Ok(())
    }
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).map_err(|err| format!("{}: {}", path.display(), err))?,
        None => {
            let mut config = EngineConfig::new(1, cli.parties);
            config.batch_size = cli.batch_size;
            config.open_value_threshold = cli.threshold;
            config.dealer_seed = cli.seed;
            config.validate().map_err(|err| err.to_string())?;
            config
        }
    };
    if cli.inputs.is_empty() {
        return Err("at least one input is required".to_string());
    }
    info!(
        "simulating {} parties on inputs {:?} (batch size {}, threshold {})",
        config.party_count, cli.inputs, config.batch_size, config.open_value_threshold
    );
    let res = match cli.ring {
        Ring::K64 => simulate::<CompUInt128>(&config, &cli.inputs),
        Ring::K32 => simulate::<CompUInt64>(&config, &cli.inputs),
    };
    #[cfg(feature = "verbose-timing")]
    if let Ok(timer) = PARTY_TIMER.lock() {
        timer.log_times();
    }
    res
}
