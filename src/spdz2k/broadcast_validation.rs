use tracing::error;

use crate::mpc_core::network::BatchedNetwork;
use crate::mpc_core::party::broadcast::BroadcastContext;
use crate::mpc_core::party::error::{MpcError, MpcResult};
use crate::protocol::promise::Promise;
use crate::protocol::{EvaluationStatus, Stage};

/// Checks that every party received the same broadcast messages.
///
/// Round 0 sends a digest over all given messages, tagged with their senders, to every party;
/// round 1 compares the digests and fails with [MpcError::Broadcast] on any difference.
pub struct BroadcastValidationProtocol {
    messages: Vec<(usize, Promise<Vec<u8>>)>,
    digest: Option<Vec<u8>>,
    stage: Stage,
}

impl BroadcastValidationProtocol {
    /// `messages` pairs each broadcast message with the party that sent it.
    pub fn new(messages: Vec<(usize, Promise<Vec<u8>>)>) -> Self {
        Self {
            messages,
            digest: None,
            stage: Stage::Init,
        }
    }

    pub fn out(&self) -> MpcResult<()> {
        if self.stage.is_done() {
            Ok(())
        } else {
            Err(MpcError::Misuse(
                "result requested before the protocol is done".to_string(),
            ))
        }
    }

    pub fn evaluate(&mut self, round: usize, network: &mut BatchedNetwork) -> MpcResult<EvaluationStatus> {
        self.stage.enter(round)?;
        match round {
            0 => {
                let mut context = BroadcastContext::new(network.no_of_parties());
                for (from, message) in &self.messages {
                    context.add_to_view(*from, &message.get()?)?;
                }
                let digest = context.digest();
                network.send_to_all(&digest)?;
                self.digest = Some(digest);
                Ok(EvaluationStatus::HasMoreRounds)
            }
            1 => {
                let received = network.receive_from_all()?;
                let own = self
                    .digest
                    .take()
                    .ok_or_else(|| MpcError::Misuse("broadcast digest missing".to_string()))?;
                if let Err(err) = BroadcastContext::compare_view(&own, &received) {
                    error!(
                        party = network.party_id() + 1,
                        "inconsistent broadcast of {} message(s)",
                        self.messages.len()
                    );
                    return Err(err);
                }
                Ok(self.stage.finish())
            }
            _ => Err(Stage::unexpected_round(round)),
        }
    }
}
