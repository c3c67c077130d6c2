//! This module provides the networking functionality.
//!
//! The [Network] trait is the point-to-point transport contract between `n` parties. The
//! evaluator never talks to a transport directly but through a [BatchedNetwork] that collects
//! all messages of one round and sends them as a single transfer per peer.
use std::borrow::Borrow;

use tracing::info;

use crate::mpc_core::party::error::MpcResult;

mod batched;
mod local;

pub use batched::BatchedNetwork;
pub use local::LocalNetwork;

pub trait NetSerializable: Sized {
    /// Returns the size in byte of a serialization of n_elements many elements
    fn serialized_size(n_elements: usize) -> usize;

    /// Serializes the elements
    fn as_byte_vec(it: impl IntoIterator<Item = impl Borrow<Self>>, len: usize) -> Vec<u8>;

    /// Serializes the elements
    fn as_byte_vec_slice(elements: &[Self]) -> Vec<u8>;

    /// Deserializes `len` elements from a byte vector
    fn from_byte_vec(v: Vec<u8>, len: usize) -> MpcResult<Vec<Self>>;
}

/// Point-to-point transport between the parties `0..no_of_parties()`.
///
/// Sending to the own party id is allowed and loops back. Receives block until a message from
/// the given party arrives or the transport gives up.
pub trait Network {
    fn party_id(&self) -> usize;

    fn no_of_parties(&self) -> usize;

    fn send(&mut self, to: usize, data: Vec<u8>) -> MpcResult<()>;

    fn receive(&mut self, from: usize) -> MpcResult<Vec<u8>>;

    /// Sends `data` to every party, including the sender itself.
    fn send_to_all(&mut self, data: &[u8]) -> MpcResult<()> {
        for to in 0..self.no_of_parties() {
            self.send(to, data.to_vec())?;
        }
        Ok(())
    }

    /// Receives one message from every party, ordered by party id.
    fn receive_from_all(&mut self) -> MpcResult<Vec<Vec<u8>>> {
        (0..self.no_of_parties())
            .map(|from| self.receive(from))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommStats {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub transfers_sent: usize,
    pub transfers_received: usize,
}

impl CommStats {
    pub fn empty() -> Self {
        Self::default()
    }

    fn record_sent(&mut self, bytes: usize) {
        self.bytes_sent += bytes as u64;
        self.transfers_sent += 1;
    }

    fn record_received(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
        self.transfers_received += 1;
    }
}

/// Logs the per-peer statistics of party `i` (0-based).
pub fn log_comm_statistics(i: usize, stats: &[CommStats]) {
    let mut total = CommStats::empty();
    for (peer, s) in stats.iter().enumerate() {
        if peer == i {
            continue;
        }
        info!(
            party = i + 1,
            "Communication to P{}: {} bytes sent, {} bytes received, {} transfers",
            peer + 1,
            s.bytes_sent,
            s.bytes_received,
            s.transfers_sent
        );
        total.bytes_sent += s.bytes_sent;
        total.bytes_received += s.bytes_received;
    }
    info!(
        party = i + 1,
        "Total communication: {} bytes sent, {} bytes received",
        total.bytes_sent,
        total.bytes_received
    );
}
