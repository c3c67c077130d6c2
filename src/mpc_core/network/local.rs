use std::io;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use tracing::trace;

use crate::mpc_core::network::{CommStats, Network};
use crate::mpc_core::party::error::{MpcError, MpcResult};

/// In-memory transport with one channel per ordered pair of parties.
///
/// When a party drops its [LocalNetwork], pending receives of its peers fail instead of
/// blocking forever.
pub struct LocalNetwork {
    i: usize,
    n: usize,
    // indexed by receiver
    senders: Vec<Sender<Vec<u8>>>,
    // indexed by sender
    receivers: Vec<Receiver<Vec<u8>>>,
    timeout: Option<Duration>,
    stats: Vec<CommStats>,
}

impl LocalNetwork {
    /// Creates the fully connected networks of `n` parties, ordered by party id.
    pub fn connect_all(n: usize, timeout: Option<Duration>) -> Vec<Self> {
        let mut senders: Vec<Vec<Sender<Vec<u8>>>> = (0..n).map(|_| Vec::with_capacity(n)).collect();
        let mut receivers: Vec<Vec<Receiver<Vec<u8>>>> =
            (0..n).map(|_| Vec::with_capacity(n)).collect();
        for from in 0..n {
            for to in 0..n {
                let (tx, rx) = channel();
                senders[from].push(tx);
                receivers[to].push(rx);
            }
        }
        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(i, (senders, receivers))| Self {
                i,
                n,
                senders,
                receivers,
                timeout,
                stats: vec![CommStats::empty(); n],
            })
            .collect()
    }

    /// Communication statistics, indexed by peer.
    pub fn comm_stats(&self) -> &[CommStats] {
        &self.stats
    }

    fn check_party(&self, party: usize) -> MpcResult<()> {
        if party >= self.n {
            return Err(MpcError::InvalidParameters(format!(
                "party {} does not exist in a network of {} parties",
                party, self.n
            )));
        }
        Ok(())
    }
}

impl Network for LocalNetwork {
    fn party_id(&self) -> usize {
        self.i
    }

    fn no_of_parties(&self) -> usize {
        self.n
    }

    fn send(&mut self, to: usize, data: Vec<u8>) -> MpcResult<()> {
        self.check_party(to)?;
        let len = data.len();
        self.senders[to].send(data).map_err(|_| {
            MpcError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("party {} is no longer connected", to + 1),
            ))
        })?;
        self.stats[to].record_sent(len);
        trace!(party = self.i + 1, to = to + 1, bytes = len, "sent");
        Ok(())
    }

    fn receive(&mut self, from: usize) -> MpcResult<Vec<u8>> {
        self.check_party(from)?;
        let data = match self.timeout {
            Some(timeout) => self.receivers[from].recv_timeout(timeout)?,
            None => self.receivers[from].recv()?,
        };
        self.stats[from].record_received(data.len());
        trace!(party = self.i + 1, from = from + 1, bytes = data.len(), "received");
        Ok(data)
    }
}
