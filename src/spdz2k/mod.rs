//! Native protocols over authenticated shares of `Z/2^(k+s)` in the style of SPDZ2k.
//!
//! Opening a value never checks its MAC on the spot. Every opened value is recorded in the
//! [store::OpenedValueStore] of the [resource_pool::ResourcePool] and authenticated later, in
//! bulk, by the [mac_check::MacCheckProtocol] that [round_sync::Spdz2kRoundSynchronization]
//! schedules.
pub mod broadcast_validation;
pub mod builder;
pub mod input;
pub mod linear;
pub mod mac_check;
pub mod mult;
pub mod output;
pub mod random;
pub mod resource_pool;
pub mod round_sync;
pub mod store;
pub mod supplier;

use crate::mpc_core::share::AuthenticatedShare;
use crate::protocol::promise::Promise;

/// An authenticated share that becomes available once the protocol computing it is done.
pub type DeferredShare<T> = Promise<AuthenticatedShare<T>>;
