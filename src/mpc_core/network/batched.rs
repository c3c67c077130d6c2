use std::collections::VecDeque;
use std::mem;

use crate::mpc_core::network::Network;
use crate::mpc_core::party::error::{MpcError, MpcResult};

const LEN_PREFIX: usize = 4;

/// Round buffer between the native protocols and the transport.
///
/// Sends are appended to a per-peer buffer and leave the party only when [BatchedNetwork::flush]
/// is called at the end of a round: all messages for one peer form a single transfer, each
/// prefixed with its length as big-endian `u32`. Messages to the own party are looped back
/// locally and become receivable after the flush.
pub struct BatchedNetwork<'a> {
    transport: &'a mut dyn Network,
    i: usize,
    n: usize,
    outgoing: Vec<Vec<Vec<u8>>>,
    inbox: Vec<VecDeque<Vec<u8>>>,
    rounds: usize,
}

impl<'a> BatchedNetwork<'a> {
    pub fn new(transport: &'a mut dyn Network) -> Self {
        let i = transport.party_id();
        let n = transport.no_of_parties();
        Self {
            transport,
            i,
            n,
            outgoing: vec![Vec::new(); n],
            inbox: vec![VecDeque::new(); n],
            rounds: 0,
        }
    }

    pub fn party_id(&self) -> usize {
        self.i
    }

    pub fn no_of_parties(&self) -> usize {
        self.n
    }

    /// Number of flushes so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    fn check_party(&self, party: usize) -> MpcResult<()> {
        if party >= self.n {
            return Err(MpcError::Misuse(format!(
                "party {} does not exist in a network of {} parties",
                party, self.n
            )));
        }
        Ok(())
    }

    pub fn send(&mut self, to: usize, data: Vec<u8>) -> MpcResult<()> {
        self.check_party(to)?;
        self.outgoing[to].push(data);
        Ok(())
    }

    /// Sends `data` to every party, including this one.
    pub fn send_to_all(&mut self, data: &[u8]) -> MpcResult<()> {
        for buffer in self.outgoing.iter_mut() {
            buffer.push(data.to_vec());
        }
        Ok(())
    }

    /// Receives the next message of the previous round from party `from`.
    pub fn receive(&mut self, from: usize) -> MpcResult<Vec<u8>> {
        self.check_party(from)?;
        if self.inbox[from].is_empty() {
            if from == self.i {
                return Err(MpcError::Misuse(
                    "nothing was sent to the own party in the previous round".to_string(),
                ));
            }
            let frame = self.transport.receive(from)?;
            self.inbox[from] = decode_frame(&frame)?;
        }
        self.inbox[from].pop_front().ok_or_else(|| {
            MpcError::MalformedMessage(format!("empty transfer from party {}", from + 1))
        })
    }

    /// Receives one message from every party, ordered by party id.
    pub fn receive_from_all(&mut self) -> MpcResult<Vec<Vec<u8>>> {
        (0..self.n).map(|from| self.receive(from)).collect()
    }

    /// Ends the current round.
    ///
    /// Fails if a message received in this round was not consumed, since that means the
    /// parties disagree on the protocols being evaluated.
    pub fn flush(&mut self) -> MpcResult<()> {
        if let Some((from, left)) = self
            .inbox
            .iter()
            .enumerate()
            .find(|(_, inbox)| !inbox.is_empty())
        {
            return Err(MpcError::Misuse(format!(
                "{} unconsumed message(s) from party {} at the end of a round",
                left.len(),
                from + 1
            )));
        }
        for to in 0..self.n {
            let messages = mem::take(&mut self.outgoing[to]);
            if messages.is_empty() {
                continue;
            }
            if to == self.i {
                self.inbox[to] = messages.into();
            } else {
                self.transport.send(to, encode_frame(&messages))?;
            }
        }
        self.rounds += 1;
        Ok(())
    }
}

fn encode_frame(messages: &[Vec<u8>]) -> Vec<u8> {
    let total = messages.iter().map(|m| LEN_PREFIX + m.len()).sum();
    let mut frame = Vec::with_capacity(total);
    for m in messages {
        frame.extend_from_slice(&(m.len() as u32).to_be_bytes());
        frame.extend_from_slice(m);
    }
    frame
}

fn decode_frame(mut frame: &[u8]) -> MpcResult<VecDeque<Vec<u8>>> {
    let mut messages = VecDeque::new();
    while !frame.is_empty() {
        if frame.len() < LEN_PREFIX {
            return Err(MpcError::MalformedMessage(
                "truncated length prefix".to_string(),
            ));
        }
        let (prefix, rest) = frame.split_at(LEN_PREFIX);
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if rest.len() < len {
            return Err(MpcError::MalformedMessage(format!(
                "message of {} bytes announced but only {} bytes left",
                len,
                rest.len()
            )));
        }
        let (message, rest) = rest.split_at(len);
        messages.push_back(message.to_vec());
        frame = rest;
    }
    Ok(messages)
}
