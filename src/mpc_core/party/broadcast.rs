//! Consistency check for broadcast messages.
//!
//! Messages are sent point-to-point, so a corrupted sender can hand different values to different
//! parties. Each party hashes everything it received from every sender into a view and the views
//! are compared in one additional all-to-all round.
use sha2::{Digest, Sha256};

use crate::mpc_core::party::error::{MpcError, MpcResult};

pub const VIEW_DIGEST_SIZE: usize = 256 / 8;

pub struct BroadcastContext {
    views: Vec<Sha256>,
}

impl BroadcastContext {
    pub fn new(no_of_parties: usize) -> Self {
        Self {
            views: (0..no_of_parties).map(|_| Sha256::new()).collect(),
        }
    }

    fn view(&mut self, from: usize) -> MpcResult<&mut Sha256> {
        let n = self.views.len();
        self.views.get_mut(from).ok_or_else(|| {
            MpcError::Misuse(format!("no broadcast view for party {} of {}", from, n))
        })
    }

    /// Records a message received from party `from`.
    pub fn add_to_view(&mut self, from: usize, message: &[u8]) -> MpcResult<()> {
        let view = self.view(from)?;
        // length prefix so that message boundaries are part of the view
        Digest::update(view, (message.len() as u64).to_be_bytes());
        Digest::update(view, message);
        Ok(())
    }

    /// Finalizes all views into one digest that is sent to every other party.
    pub fn digest(self) -> Vec<u8> {
        let mut res = Sha256::new();
        self.views.into_iter().for_each(|view| {
            Digest::update(&mut res, view.finalize());
        });
        res.finalize().to_vec()
    }

    /// Compares the own digest with the digests received from all parties.
    pub fn compare_view(own: &[u8], received: &[Vec<u8>]) -> MpcResult<()> {
        if received.iter().all(|digest| digest.as_slice() == own) {
            Ok(())
        } else {
            Err(MpcError::Broadcast)
        }
    }
}

#[cfg(test)]
mod test {
    use super::BroadcastContext;
    use crate::mpc_core::party::error::MpcError;

    fn digest_of(messages: &[(usize, &[u8])]) -> Vec<u8> {
        let mut context = BroadcastContext::new(3);
        for (from, msg) in messages {
            context.add_to_view(*from, msg).unwrap();
        }
        context.digest()
    }

    #[test]
    fn equal_views_pass() {
        let a = digest_of(&[(0, b"abc"), (2, b"de")]);
        let b = digest_of(&[(0, b"abc"), (2, b"de")]);
        BroadcastContext::compare_view(&a, &[a.clone(), b]).unwrap();
    }

    #[test]
    fn views_depend_on_sender_and_boundaries() {
        let a = digest_of(&[(0, b"abc"), (0, b"de")]);
        let b = digest_of(&[(0, b"ab"), (0, b"cde")]);
        let c = digest_of(&[(1, b"abc"), (1, b"de")]);
        assert!(matches!(
            BroadcastContext::compare_view(&a, &[b]),
            Err(MpcError::Broadcast)
        ));
        assert!(matches!(
            BroadcastContext::compare_view(&a, &[c]),
            Err(MpcError::Broadcast)
        ));
    }

    #[test]
    fn unknown_sender_is_rejected() {
        let mut context = BroadcastContext::new(2);
        assert!(matches!(
            context.add_to_view(2, b"x"),
            Err(MpcError::Misuse(_))
        ));
    }
}
