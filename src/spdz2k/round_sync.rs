use tracing::debug;

use crate::mpc_core::network::BatchedNetwork;
use crate::mpc_core::party::error::MpcResult;
use crate::protocol::evaluator::evaluate_batch;
use crate::protocol::NativeProtocol;
use crate::share::RingElement;
use crate::spdz2k::mac_check::MacCheckProtocol;
use crate::spdz2k::resource_pool::ResourcePool;

/// Decides when opened values are MAC-checked.
///
/// A check runs after any batch that leaves more than `open_value_threshold` unchecked values
/// in the store, and once more when the evaluation finishes if anything was opened since the
/// last check.
pub struct Spdz2kRoundSynchronization {
    open_value_threshold: usize,
    check_required: bool,
    mac_checks: usize,
    checked_values: usize,
}

impl Spdz2kRoundSynchronization {
    pub fn new(open_value_threshold: usize) -> Self {
        Self {
            open_value_threshold,
            check_required: false,
            mac_checks: 0,
            checked_values: 0,
        }
    }

    pub fn mac_checks(&self) -> usize {
        self.mac_checks
    }

    pub fn checked_values(&self) -> usize {
        self.checked_values
    }

    pub fn finished_batch<T: RingElement>(
        &mut self,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<()> {
        if !pool.store().is_empty() {
            self.check_required = true;
        }
        if pool.store().exceeds_threshold(self.open_value_threshold) {
            debug!(
                party = pool.my_id() + 1,
                "{} unchecked values exceed the threshold of {}",
                pool.store().len(),
                self.open_value_threshold
            );
            self.mac_check(pool, network)?;
        }
        Ok(())
    }

    pub fn finished_eval<T: RingElement>(
        &mut self,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<()> {
        if self.check_required || !pool.store().is_empty() {
            self.mac_check(pool, network)?;
        }
        Ok(())
    }

    fn mac_check<T: RingElement>(
        &mut self,
        pool: &mut ResourcePool<T>,
        network: &mut BatchedNetwork,
    ) -> MpcResult<()> {
        let values = pool.store().len();
        let mut batch = [NativeProtocol::MacCheck(MacCheckProtocol::new())];
        evaluate_batch(&mut batch, pool, network)?;
        self.check_required = false;
        self.mac_checks += 1;
        self.checked_values += values;
        Ok(())
    }
}
