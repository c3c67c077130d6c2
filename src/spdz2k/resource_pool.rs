use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::spdz2k::store::OpenedValueStore;
use crate::spdz2k::supplier::DataSupplier;
use crate::share::RingElement;

/// Everything a party needs to evaluate native protocols, apart from the network.
///
/// Party ids are 0-based; party id `0` is "party 1".
pub struct ResourcePool<T: RingElement> {
    my_id: usize,
    no_of_parties: usize,
    supplier: Box<dyn DataSupplier<T>>,
    mac_key_share: T,
    store: OpenedValueStore<T>,
    random_local: ChaCha20Rng,
}

impl<T: RingElement> ResourcePool<T> {
    pub fn new(my_id: usize, no_of_parties: usize, supplier: Box<dyn DataSupplier<T>>) -> MpcResult<Self> {
        if no_of_parties < 2 || my_id >= no_of_parties {
            return Err(MpcError::InvalidParameters(format!(
                "party id {} in a computation of {} parties",
                my_id, no_of_parties
            )));
        }
        let mac_key_share = supplier.secret_shared_key();
        Ok(Self {
            my_id,
            no_of_parties,
            supplier,
            mac_key_share,
            store: OpenedValueStore::new(),
            random_local: ChaCha20Rng::from_entropy(),
        })
    }

    pub fn my_id(&self) -> usize {
        self.my_id
    }

    pub fn no_of_parties(&self) -> usize {
        self.no_of_parties
    }

    pub fn mac_key_share(&self) -> T {
        self.mac_key_share
    }

    pub fn supplier(&mut self) -> &mut dyn DataSupplier<T> {
        self.supplier.as_mut()
    }

    pub fn store(&self) -> &OpenedValueStore<T> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut OpenedValueStore<T> {
        &mut self.store
    }

    /// Private randomness of this party (commitment nonces, coin-toss contributions).
    pub fn random_local(&mut self) -> &mut ChaCha20Rng {
        &mut self.random_local
    }
}
