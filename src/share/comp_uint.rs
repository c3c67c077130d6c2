use std::borrow::Borrow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_bigint::BigUint;
use rand::{CryptoRng, Rng};

use super::RingElement;
use crate::mpc_core::network::NetSerializable;
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::mpc_core::share::HasZero;

macro_rules! comp_uint {
    ($(#[$doc:meta])* $name:ident, $word:ty, $nbytes:expr, $low_bits:expr) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
        pub struct $name($word);

        impl $name {
            const LOW_MASK: $word = (1 << $low_bits) - 1;
            const COEFFICIENT_MASK: $word = (1 << (8 * $nbytes - $low_bits)) - 1;

            pub const fn new(value: $word) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> $word {
                self.0
            }
        }

        impl HasZero for $name {
            const ZERO: Self = Self(0);
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0.wrapping_add(rhs.0))
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0.wrapping_sub(rhs.0))
            }
        }

        impl Mul for $name {
            type Output = Self;

            fn mul(self, rhs: Self) -> Self::Output {
                Self(self.0.wrapping_mul(rhs.0))
            }
        }

        impl Neg for $name {
            type Output = Self;

            fn neg(self) -> Self::Output {
                Self(self.0.wrapping_neg())
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl MulAssign for $name {
            fn mul_assign(&mut self, rhs: Self) {
                *self = *self * rhs;
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                <Self as RingElement>::from_u64(value)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl RingElement for $name {
            const NBYTES: usize = $nbytes;
            const LOW_BIT_LENGTH: usize = $low_bits;
            const ONE: Self = Self(1);

            fn from_u64(value: u64) -> Self {
                Self(value as $word)
            }

            fn from_u128(value: u128) -> Self {
                Self(value as $word)
            }

            fn from_be_bytes(bytes: &[u8]) -> MpcResult<Self> {
                let bytes: [u8; $nbytes] = bytes.try_into().map_err(|_| {
                    MpcError::MalformedMessage(format!(
                        "expected {} bytes for {}, got {}",
                        $nbytes,
                        stringify!($name),
                        bytes.len()
                    ))
                })?;
                Ok(Self(<$word>::from_be_bytes(bytes)))
            }

            fn to_be_bytes(&self) -> Vec<u8> {
                self.0.to_be_bytes().to_vec()
            }

            fn from_biguint(value: &BigUint) -> Self {
                let mut le = value.to_bytes_le();
                le.resize($nbytes, 0);
                let mut bytes = [0u8; $nbytes];
                bytes.copy_from_slice(&le[..$nbytes]);
                Self(<$word>::from_le_bytes(bytes))
            }

            fn to_biguint(&self) -> BigUint {
                BigUint::from(self.0)
            }

            fn low(&self) -> u64 {
                (self.0 & Self::LOW_MASK) as u64
            }

            fn high(&self) -> u64 {
                (self.0 >> $low_bits) as u64
            }

            fn low_part(&self) -> Self {
                Self(self.0 & Self::LOW_MASK)
            }

            fn shift_low_up(&self) -> Self {
                Self(self.0 << $low_bits)
            }

            fn is_zero(&self) -> bool {
                self.0 == 0
            }

            fn random<R: Rng + CryptoRng>(rng: &mut R) -> Self {
                Self(rng.gen())
            }

            fn random_coefficient<R: Rng + CryptoRng>(rng: &mut R) -> Self {
                Self(rng.gen::<$word>() & Self::COEFFICIENT_MASK)
            }
        }

        impl NetSerializable for $name {
            fn serialized_size(n_elements: usize) -> usize {
                n_elements * $nbytes
            }

            fn as_byte_vec(it: impl IntoIterator<Item = impl Borrow<Self>>, len: usize) -> Vec<u8> {
                let mut res = Vec::with_capacity(Self::serialized_size(len));
                it.into_iter()
                    .for_each(|el| res.extend_from_slice(&el.borrow().0.to_be_bytes()));
                res
            }

            fn as_byte_vec_slice(elements: &[Self]) -> Vec<u8> {
                Self::as_byte_vec(elements, elements.len())
            }

            fn from_byte_vec(v: Vec<u8>, len: usize) -> MpcResult<Vec<Self>> {
                if v.len() != Self::serialized_size(len) {
                    return Err(MpcError::MalformedMessage(format!(
                        "expected {} bytes for {} elements, got {}",
                        Self::serialized_size(len),
                        len,
                        v.len()
                    )));
                }
                v.chunks_exact($nbytes)
                    .map(<Self as RingElement>::from_be_bytes)
                    .collect()
            }

        }


    };
}

comp_uint!(
    /// An element of `Z/2^128` with a 64-bit value part and 64 bits of statistical security.
    CompUInt128, u128, 16, 64
);

comp_uint!(
    /// An element of `Z/2^64` with a 32-bit value part and 32 bits of statistical security.
    CompUInt64, u64, 8, 32
);

#[cfg(test)]
mod test {
    use num_bigint::BigUint;
    use rand::thread_rng;

    use super::{CompUInt128, CompUInt64};
    use crate::mpc_core::network::NetSerializable;
    use crate::mpc_core::party::error::MpcError;
    use crate::mpc_core::share::HasZero;
    use crate::share::RingElement;

    #[test]
    fn arithmetic_wraps() {
        let max = CompUInt128::new(u128::MAX);
        assert_eq!(max + CompUInt128::ONE, CompUInt128::ZERO);
        assert_eq!(CompUInt128::ZERO - CompUInt128::ONE, max);
        assert_eq!(-CompUInt64::ONE, CompUInt64::new(u64::MAX));
        assert_eq!(
            CompUInt64::new(1 << 63) * CompUInt64::from_u64(2),
            CompUInt64::ZERO
        );
        assert_eq!(CompUInt64::from_u128(1u128 << 64 | 5), CompUInt64::from_u64(5));
    }

    #[test]
    fn low_and_high_parts() {
        let x = CompUInt128::new((7u128 << 64) | 12);
        assert_eq!(x.low(), 12);
        assert_eq!(x.high(), 7);
        assert_eq!(x.low_part(), CompUInt128::from_u64(12));
        assert_eq!(CompUInt128::from_u64(3).shift_low_up().high(), 3);
        assert_eq!(CompUInt128::from_u64(3).shift_low_up().low(), 0);

        let y = CompUInt64::new(0xdead_beef_0000_002a);
        assert_eq!(y.low(), 42);
        assert_eq!(y.high(), 0xdead_beef);
        assert_eq!(<CompUInt64 as RingElement>::LOW_BIT_LENGTH, 32);
        assert_eq!(<CompUInt64 as RingElement>::HIGH_BIT_LENGTH, 32);
        assert_eq!(<CompUInt128 as RingElement>::BIT_LENGTH, 128);
    }

    #[test]
    fn coefficients_fit_the_security_part() {
        let mut rng = thread_rng();
        for _ in 0..100 {
            assert_eq!(CompUInt128::random_coefficient(&mut rng).high(), 0);
            assert_eq!(CompUInt64::random_coefficient(&mut rng).high(), 0);
        }
    }

    #[test]
    fn big_endian_encoding() {
        let x = CompUInt64::new(0x0102_0304_0506_0708);
        assert_eq!(x.to_be_bytes(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let v = CompUInt64::as_byte_vec_slice(&[x, CompUInt64::ONE]);
        assert_eq!(&v[8..], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            CompUInt64::from_byte_vec(v, 2).unwrap(),
            vec![x, CompUInt64::ONE]
        );
        assert!(matches!(
            CompUInt128::from_be_bytes(&[0u8; 15]),
            Err(MpcError::MalformedMessage(_))
        ));
        assert!(CompUInt128::from_byte_vec(vec![0u8; 17], 1).is_err());
    }

    #[test]
    fn big_integers_are_reduced() {
        let big = (BigUint::from(1u8) << 130) + BigUint::from(99u8);
        assert_eq!(CompUInt128::from_biguint(&big), CompUInt128::from_u64(99));
        let x = CompUInt64::new(u64::MAX);
        assert_eq!(CompUInt64::from_biguint(&x.to_biguint()), x);
    }
}
