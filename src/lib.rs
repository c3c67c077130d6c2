//! This crate implements an engine that evaluates secure multi-party computations over
//! authenticated additive shares of `Z/2^(k+s)` in the style of SPDZ2k.
pub mod mpc_core;
pub mod protocol;
pub mod share;
pub mod spdz2k;
