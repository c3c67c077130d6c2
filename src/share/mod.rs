//! This module provides the rings `Z/2^(k+s)` that shares live in.
//!
//! An element of such a ring is split into a low part of `k` bits, which carries the value, and
//! a high part of `s` bits, which provides statistical security for the MAC check. The provided
//! ring operations are **not constant-time**.
mod comp_uint;

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_bigint::BigUint;
use rand::{CryptoRng, Rng};

use crate::mpc_core::network::NetSerializable;
use crate::mpc_core::party::error::MpcResult;
use crate::mpc_core::share::HasZero;

pub use comp_uint::{CompUInt128, CompUInt64};

/// The ring `Z/2^BIT_LENGTH` with arithmetic wrapping modulo `2^BIT_LENGTH`.
pub trait RingElement:
    Default
    + Debug
    + HasZero
    + NetSerializable
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + Clone
    + Copy
    + PartialEq
    + Eq
    + Send
    + 'static
{
    /// The element size in byte
    const NBYTES: usize;

    /// The number of bits of the modulus, `k + s`.
    const BIT_LENGTH: usize = 8 * Self::NBYTES;

    /// The number of bits `k` of the low (value) part.
    const LOW_BIT_LENGTH: usize;

    /// The number of bits `s` of the high (security) part.
    const HIGH_BIT_LENGTH: usize = Self::BIT_LENGTH - Self::LOW_BIT_LENGTH;

    /// One the neutral element of multiplication
    const ONE: Self;

    fn from_u64(value: u64) -> Self;

    /// Reduces `value` modulo `2^BIT_LENGTH`.
    fn from_u128(value: u128) -> Self;

    /// Parses exactly [RingElement::NBYTES] big-endian bytes.
    fn from_be_bytes(bytes: &[u8]) -> MpcResult<Self>;

    fn to_be_bytes(&self) -> Vec<u8>;

    /// Reduces `value` modulo `2^BIT_LENGTH`.
    fn from_biguint(value: &BigUint) -> Self;

    fn to_biguint(&self) -> BigUint;

    /// The low `k` bits as integer.
    fn low(&self) -> u64;

    /// The high `s` bits as integer.
    fn high(&self) -> u64;

    /// The element with its high part cleared.
    fn low_part(&self) -> Self;

    /// Multiplies by `2^k`.
    fn shift_low_up(&self) -> Self;

    /// Returns if the value is zero
    fn is_zero(&self) -> bool;

    /// A uniformly random ring element.
    fn random<R: Rng + CryptoRng>(rng: &mut R) -> Self;

    /// A uniformly random element of `Z/2^s`, used as MAC key and as MAC-check coefficient.
    fn random_coefficient<R: Rng + CryptoRng>(rng: &mut R) -> Self;
}

#[cfg(test)]
pub mod test {
    use rand::{CryptoRng, Rng};

    use super::RingElement;
    use crate::mpc_core::share::AuthenticatedShare;

    /// Splits `x` into `n` uniformly random additive shares.
    pub fn additive_shares<T: RingElement, R: Rng + CryptoRng>(rng: &mut R, x: T, n: usize) -> Vec<T> {
        let mut shares: Vec<T> = (0..n - 1).map(|_| T::random(rng)).collect();
        let sum = shares.iter().fold(T::ZERO, |acc, s| acc + *s);
        shares.push(x - sum);
        shares
    }

    pub fn random_key_shares<T: RingElement, R: Rng + CryptoRng>(rng: &mut R, n: usize) -> Vec<T> {
        let key = T::random_coefficient(rng);
        additive_shares(rng, key, n)
    }

    pub fn reconstruct<T: RingElement>(shares: &[T]) -> T {
        shares.iter().fold(T::ZERO, |acc, s| acc + *s)
    }

    /// Authenticated sharing of `x` under the key shared by `key_shares`.
    pub fn share_authenticated<T: RingElement, R: Rng + CryptoRng>(
        rng: &mut R,
        x: T,
        key_shares: &[T],
    ) -> Vec<AuthenticatedShare<T>> {
        let n = key_shares.len();
        let key = reconstruct(key_shares);
        let shares = additive_shares(rng, x, n);
        let macs = additive_shares(rng, key * x, n);
        shares
            .into_iter()
            .zip(macs)
            .map(|(s, m)| AuthenticatedShare::from(s, m))
            .collect()
    }

    /// Reconstructs the shared value and asserts that its MAC is valid.
    pub fn assert_authenticated<T: RingElement>(
        shares: &[AuthenticatedShare<T>],
        key_shares: &[T],
    ) -> T {
        let value = reconstruct(&shares.iter().map(|s| s.share).collect::<Vec<_>>());
        let mac = reconstruct(&shares.iter().map(|s| s.mac_share).collect::<Vec<_>>());
        let key = reconstruct(key_shares);
        assert_eq!(mac, key * value, "invalid MAC for {:?}", value);
        value
    }
}
