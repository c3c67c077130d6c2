//! Sources of correlated randomness.
//!
//! The engine only consumes preprocessed material through [DataSupplier]. The
//! [DummyDataSupplier] simulates a trusted dealer: every party runs the same seeded dealer and
//! keeps only its own share, so no preprocessing protocol is needed for testing.
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::warn;

use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::mpc_core::share::{AuthenticatedShare, HasZero};
use crate::share::RingElement;

/// Shares of a multiplication triple `(a, b, c)` with `c = a * b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triple<T> {
    pub a: AuthenticatedShare<T>,
    pub b: AuthenticatedShare<T>,
    pub c: AuthenticatedShare<T>,
}

/// Share of a random input mask; only the party the mask belongs to learns its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputMask<T> {
    pub mask_share: AuthenticatedShare<T>,
    pub real_value: Option<T>,
}

pub trait DataSupplier<T: RingElement> {
    fn next_triple_shares(&mut self) -> MpcResult<Triple<T>>;

    /// The next mask for an input of party `towards_party`.
    fn next_input_mask(&mut self, towards_party: usize) -> MpcResult<InputMask<T>>;

    fn next_random_element_share(&mut self) -> MpcResult<AuthenticatedShare<T>>;

    /// Share of a uniformly random bit.
    fn next_bit_share(&mut self) -> MpcResult<AuthenticatedShare<T>>;

    /// This party's share of the global MAC key.
    fn secret_shared_key(&self) -> T;
}

/// Optional bounds on the material a [DummyDataSupplier] hands out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupplyLimits {
    pub triples: Option<usize>,
    pub input_masks: Option<usize>,
    pub random_elements: Option<usize>,
    pub bits: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupplyUsage {
    pub triples: usize,
    pub input_masks: usize,
    pub random_elements: usize,
    pub bits: usize,
}

const KEY_STREAM: u64 = 0;
const TRIPLE_STREAM: u64 = 1;
const RANDOM_STREAM: u64 = 2;
const BIT_STREAM: u64 = 3;
const MASK_STREAM_OFFSET: u64 = 4;

fn dealer_stream(seed: u64, stream: u64) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

fn check_supply(kind: &str, used: usize, limit: Option<usize>) -> MpcResult<()> {
    match limit {
        Some(limit) if used >= limit => {
            warn!("preprocessed {} exhausted after {} uses", kind, used);
            Err(MpcError::InsufficientPreprocessing(format!(
                "no {} left ({} available)",
                kind, limit
            )))
        }
        _ => Ok(()),
    }
}

/// Dealer-simulated supplier. All parties must use the same seed and party count.
pub struct DummyDataSupplier<T: RingElement> {
    my_id: usize,
    no_of_parties: usize,
    mac_key: T,
    mac_key_share: T,
    triples: ChaCha20Rng,
    randoms: ChaCha20Rng,
    bits: ChaCha20Rng,
    masks: Vec<ChaCha20Rng>,
    limits: SupplyLimits,
    usage: SupplyUsage,
}

impl<T: RingElement> DummyDataSupplier<T> {
    pub fn new(my_id: usize, no_of_parties: usize, seed: u64) -> MpcResult<Self> {
        if no_of_parties < 2 || my_id >= no_of_parties {
            return Err(MpcError::InvalidParameters(format!(
                "party id {} in a computation of {} parties",
                my_id, no_of_parties
            )));
        }
        let mut key_rng = dealer_stream(seed, KEY_STREAM);
        let mac_key = T::random_coefficient(&mut key_rng);
        let mac_key_share = Self::share_of(&mut key_rng, mac_key, my_id, no_of_parties);
        Ok(Self {
            my_id,
            no_of_parties,
            mac_key,
            mac_key_share,
            triples: dealer_stream(seed, TRIPLE_STREAM),
            randoms: dealer_stream(seed, RANDOM_STREAM),
            bits: dealer_stream(seed, BIT_STREAM),
            masks: (0..no_of_parties)
                .map(|p| dealer_stream(seed, MASK_STREAM_OFFSET + p as u64))
                .collect(),
            limits: SupplyLimits::default(),
            usage: SupplyUsage::default(),
        })
    }

    pub fn with_limits(mut self, limits: SupplyLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn usage(&self) -> SupplyUsage {
        self.usage
    }

    /// Draws the shares of all parties for `value` and keeps the own one. The last party's
    /// share is the difference, so all parties consume the stream identically.
    fn share_of(rng: &mut ChaCha20Rng, value: T, my_id: usize, n: usize) -> T {
        let mut sum = T::ZERO;
        let mut mine = T::ZERO;
        for p in 0..n - 1 {
            let s = T::random(rng);
            if p == my_id {
                mine = s;
            }
            sum += s;
        }
        if my_id == n - 1 {
            mine = value - sum;
        }
        mine
    }

    fn authenticate(rng: &mut ChaCha20Rng, value: T, mac_key: T, my_id: usize, n: usize) -> AuthenticatedShare<T> {
        let share = Self::share_of(rng, value, my_id, n);
        let mac_share = Self::share_of(rng, mac_key * value, my_id, n);
        AuthenticatedShare::from(share, mac_share)
    }
}

impl<T: RingElement> DataSupplier<T> for DummyDataSupplier<T> {
    fn next_triple_shares(&mut self) -> MpcResult<Triple<T>> {
        check_supply("multiplication triples", self.usage.triples, self.limits.triples)?;
        self.usage.triples += 1;
        let (i, n, key) = (self.my_id, self.no_of_parties, self.mac_key);
        let a = T::random(&mut self.triples);
        let b = T::random(&mut self.triples);
        Ok(Triple {
            a: Self::authenticate(&mut self.triples, a, key, i, n),
            b: Self::authenticate(&mut self.triples, b, key, i, n),
            c: Self::authenticate(&mut self.triples, a * b, key, i, n),
        })
    }

    fn next_input_mask(&mut self, towards_party: usize) -> MpcResult<InputMask<T>> {
        check_supply("input masks", self.usage.input_masks, self.limits.input_masks)?;
        let (i, n, key) = (self.my_id, self.no_of_parties, self.mac_key);
        let rng = self.masks.get_mut(towards_party).ok_or_else(|| {
            MpcError::InvalidParameters(format!(
                "input mask for party {} in a computation of {} parties",
                towards_party, n
            ))
        })?;
        self.usage.input_masks += 1;
        let r = T::random(rng);
        Ok(InputMask {
            mask_share: Self::authenticate(rng, r, key, i, n),
            real_value: (towards_party == i).then_some(r),
        })
    }

    fn next_random_element_share(&mut self) -> MpcResult<AuthenticatedShare<T>> {
        check_supply("random elements", self.usage.random_elements, self.limits.random_elements)?;
        self.usage.random_elements += 1;
        let r = T::random(&mut self.randoms);
        Ok(Self::authenticate(&mut self.randoms, r, self.mac_key, self.my_id, self.no_of_parties))
    }

    fn next_bit_share(&mut self) -> MpcResult<AuthenticatedShare<T>> {
        check_supply("random bits", self.usage.bits, self.limits.bits)?;
        self.usage.bits += 1;
        let bit = if T::random(&mut self.bits).low() & 1 == 1 {
            T::ONE
        } else {
            T::ZERO
        };
        Ok(Self::authenticate(&mut self.bits, bit, self.mac_key, self.my_id, self.no_of_parties))
    }

    fn secret_shared_key(&self) -> T {
        self.mac_key_share
    }
}
