use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::share::RingElement;

/// The party whose value share absorbs public constants ("party 1").
pub const DESIGNATED_PARTY: usize = 0;

/// A party's additive share of a ring element together with its share of the element's MAC.
///
/// Summed over all parties, `mac_share` equals `share` times the global MAC key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedShare<T> {
    /// The additive share of the value.
    pub share: T,
    /// The additive share of the MAC.
    pub mac_share: T,
}

// Provides the neutral element of addition
pub trait HasZero {
    /// Zero the neutral element of addition
    const ZERO: Self;
}

impl<T> AuthenticatedShare<T> {
    pub fn from(share: T, mac_share: T) -> Self {
        Self { share, mac_share }
    }
}

impl<T: RingElement> AuthenticatedShare<T> {
    /// Adds the public constant `c`.
    ///
    /// Only the designated party changes its value share; every party adds `c` times its MAC key
    /// share to its MAC share.
    pub fn add_constant(self, c: T, mac_key_share: T, party_id: usize) -> Self {
        let share = if party_id == DESIGNATED_PARTY {
            self.share + c
        } else {
            self.share
        };
        Self {
            share,
            mac_share: self.mac_share + c * mac_key_share,
        }
    }

    /// A sharing of the public constant `c`.
    pub fn from_public(c: T, mac_key_share: T, party_id: usize) -> Self {
        Self::ZERO.add_constant(c, mac_key_share, party_id)
    }

    /// Multiplies the shared value by `2^k`, moving its low part into the high part.
    pub fn shift_low_up(self) -> Self {
        Self {
            share: self.share.shift_low_up(),
            mac_share: self.mac_share.shift_low_up(),
        }
    }
}

impl<T: Add> Add<Self> for AuthenticatedShare<T> {
    type Output = AuthenticatedShare<<T as Add>::Output>;

    fn add(self, rhs: Self) -> Self::Output {
        AuthenticatedShare {
            share: self.share + rhs.share,
            mac_share: self.mac_share + rhs.mac_share,
        }
    }
}

impl<T: Sub> Sub<Self> for AuthenticatedShare<T> {
    type Output = AuthenticatedShare<<T as Sub>::Output>;

    fn sub(self, rhs: Self) -> Self::Output {
        AuthenticatedShare {
            share: self.share - rhs.share,
            mac_share: self.mac_share - rhs.mac_share,
        }
    }
}

impl<T: Neg> Neg for AuthenticatedShare<T> {
    type Output = AuthenticatedShare<<T as Neg>::Output>;

    fn neg(self) -> Self::Output {
        AuthenticatedShare {
            share: -self.share,
            mac_share: -self.mac_share,
        }
    }
}

/// Multiplies the share with a public scalar.
impl<T: Mul + Copy> Mul<T> for AuthenticatedShare<T> {
    type Output = AuthenticatedShare<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        AuthenticatedShare {
            share: self.share * rhs,
            mac_share: self.mac_share * rhs,
        }
    }
}

impl<T: AddAssign> AddAssign for AuthenticatedShare<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.share += rhs.share;
        self.mac_share += rhs.mac_share;
    }
}

impl<T: SubAssign> SubAssign for AuthenticatedShare<T> {
    fn sub_assign(&mut self, rhs: Self) {
        self.share -= rhs.share;
        self.mac_share -= rhs.mac_share;
    }
}

impl<T: HasZero> HasZero for AuthenticatedShare<T> {
    const ZERO: Self = Self {
        share: T::ZERO,
        mac_share: T::ZERO,
    };
}
