//! This module provides the per-party building blocks shared by all protocols: commitments,
//! broadcast views, joint randomness and errors.
pub mod broadcast;
pub mod commitment;
pub mod correlated_randomness;
pub mod error;

#[cfg(feature = "verbose-timing")]
use {
    lazy_static::lazy_static,
    std::{collections::HashMap, sync::Mutex, time::Duration},
};

#[cfg(feature = "verbose-timing")]
lazy_static! {
    pub static ref PARTY_TIMER: Mutex<Timer> = Mutex::new(Timer::new());
}

#[cfg(feature = "verbose-timing")]
#[derive(Default)]
pub struct Timer {
    times: HashMap<String, Duration>,
}

#[cfg(feature = "verbose-timing")]
impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_time(&mut self, key: &str, duration: Duration) {
        *self.times.entry(key.to_string()).or_insert(Duration::ZERO) += duration;
    }

    pub fn log_times(&self) {
        for (key, duration) in &self.times {
            tracing::info!("{}: {}s", key, duration.as_secs_f64());
        }
    }
}

#[cfg(all(test, feature = "verbose-timing"))]
mod test {
    use std::time::Duration;

    use super::Timer;

    #[test]
    fn timer_accumulates_per_key() {
        let mut timer = Timer::default();
        timer.report_time("batch", Duration::from_millis(2));
        timer.report_time("batch", Duration::from_millis(3));
        timer.report_time("final mac check", Duration::from_millis(1));
        assert_eq!(timer.times.get("batch"), Some(&Duration::from_millis(5)));
        assert_eq!(timer.times.len(), 2);
        timer.log_times();
    }
}

/// Exposes useful testing functionalities
pub mod test_export {
    use std::thread;
    use std::time::Duration;

    use tracing_subscriber::EnvFilter;

    use crate::mpc_core::network::{LocalNetwork, Network};
    use crate::mpc_core::party::error::MpcResult;

    /// Upper bound for a single receive in tests, so that a stuck party fails the test.
    pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Installs a `tracing` subscriber controlled by `RUST_LOG`. Safe to call repeatedly.
    pub fn init_test_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Runs `f` for each of `n` parties on its own thread (named `party1`, `party2`, ...) over a
    /// fresh in-memory network and returns the results ordered by party id.
    pub fn localhost_setup<R, F>(n: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize, &mut LocalNetwork) -> R + Sync,
    {
        localhost_setup_with(n, |_, net| net, f)
    }

    /// Like [localhost_setup], but receives give up after `timeout` instead of [TEST_TIMEOUT].
    pub fn localhost_setup_with_timeout<R, F>(n: usize, timeout: Option<Duration>, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize, &mut LocalNetwork) -> R + Sync,
    {
        run_parties(LocalNetwork::connect_all(n, timeout), |_, net| net, f)
    }

    /// Like [localhost_setup], but each party's network is first passed through `wrap`.
    pub fn localhost_setup_with<N, R, W, F>(n: usize, wrap: W, f: F) -> Vec<R>
    where
        N: Network + Send,
        R: Send,
        W: Fn(usize, LocalNetwork) -> N + Sync,
        F: Fn(usize, &mut N) -> R + Sync,
    {
        run_parties(LocalNetwork::connect_all(n, Some(TEST_TIMEOUT)), wrap, f)
    }

    fn run_parties<N, R, W, F>(networks: Vec<LocalNetwork>, wrap: W, f: F) -> Vec<R>
    where
        N: Network + Send,
        R: Send,
        W: Fn(usize, LocalNetwork) -> N + Sync,
        F: Fn(usize, &mut N) -> R + Sync,
    {
        let (wrap, f) = (&wrap, &f);
        thread::scope(|scope| {
            let handles: Vec<_> = networks
                .into_iter()
                .enumerate()
                .map(|(i, net)| {
                    thread::Builder::new()
                        .name(format!("party{}", i + 1))
                        .spawn_scoped(scope, move || {
                            let mut net = wrap(i, net);
                            f(i, &mut net)
                        })
                        .unwrap()
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        })
    }

    #[derive(Clone, Copy, Debug)]
    pub struct Tamper {
        /// Receiver of the manipulated transfer.
        pub target: usize,
        /// Index of the manipulated transfer among all transfers to `target`.
        pub transfer: usize,
        pub byte: usize,
        pub bit: u8,
    }

    /// Transport wrapper that flips one bit of one outgoing transfer.
    pub struct TamperingNetwork<N> {
        inner: N,
        tamper: Option<Tamper>,
        sent_to_target: usize,
    }

    impl<N: Network> TamperingNetwork<N> {
        pub fn honest(inner: N) -> Self {
            Self {
                inner,
                tamper: None,
                sent_to_target: 0,
            }
        }

        pub fn new(inner: N, tamper: Tamper) -> Self {
            Self {
                inner,
                tamper: Some(tamper),
                sent_to_target: 0,
            }
        }

        pub fn into_inner(self) -> N {
            self.inner
        }
    }

    impl<N: Network> Network for TamperingNetwork<N> {
        fn party_id(&self) -> usize {
            self.inner.party_id()
        }

        fn no_of_parties(&self) -> usize {
            self.inner.no_of_parties()
        }

        fn send(&mut self, to: usize, mut data: Vec<u8>) -> MpcResult<()> {
            if let Some(tamper) = self.tamper {
                if to == tamper.target {
                    if self.sent_to_target == tamper.transfer && tamper.byte < data.len() {
                        data[tamper.byte] ^= 1 << tamper.bit;
                    }
                    self.sent_to_target += 1;
                }
            }
            self.inner.send(to, data)
        }

        fn receive(&mut self, from: usize) -> MpcResult<Vec<u8>> {
            self.inner.receive(from)
        }
    }
}
