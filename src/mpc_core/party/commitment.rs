//! Hash-based commitments.
//!
//! A commitment is `SHA-256(nonce || msg)`; it is opened by revealing the nonce and the message.
use rand::{CryptoRng, Rng};
use sha2::{Digest, Sha256};

use crate::mpc_core::party::error::{MpcError, MpcResult};

const COMMITMENT_SEC_PARAM: usize = 128 / 8;
const SHA256_OUTPUT_SIZE: usize = 256 / 8;

pub const COMMITMENT_SIZE: usize = SHA256_OUTPUT_SIZE;
pub const NONCE_SIZE: usize = COMMITMENT_SEC_PARAM;

pub type Commitment = [u8; COMMITMENT_SIZE];
pub type Nonce = [u8; NONCE_SIZE];

fn hash(nonce: &[u8], msg: &[u8]) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(msg);
    hasher.finalize().into()
}

/// Commits to `msg`, returning the commitment and the nonce needed to open it.
pub fn commit<Random: Rng + CryptoRng>(rand: &mut Random, msg: &[u8]) -> (Commitment, Nonce) {
    let mut nonce = [0u8; NONCE_SIZE];
    rand.fill_bytes(&mut nonce);
    (hash(&nonce, msg), nonce)
}

pub fn open(commitment: &[u8], nonce: &[u8], msg: &[u8]) -> MpcResult<()> {
    if commitment.len() != COMMITMENT_SIZE || nonce.len() != NONCE_SIZE {
        return Err(MpcError::Commitment);
    }
    let expected = hash(nonce, msg);
    // no early exit on the first differing byte
    let diff = expected
        .iter()
        .zip(commitment)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    if diff != 0 {
        return Err(MpcError::Commitment);
    }
    Ok(())
}

/// Serializes an opening as `nonce || msg`.
pub fn opening_bytes(nonce: &Nonce, msg: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(NONCE_SIZE + msg.len());
    v.extend_from_slice(nonce);
    v.extend_from_slice(msg);
    v
}

/// Splits an opening produced by [opening_bytes] and checks it against `commitment`.
pub fn open_bytes<'a>(commitment: &[u8], opening: &'a [u8]) -> MpcResult<&'a [u8]> {
    if opening.len() < NONCE_SIZE {
        return Err(MpcError::MalformedMessage(format!(
            "opening of {} bytes is shorter than the nonce",
            opening.len()
        )));
    }
    let (nonce, msg) = opening.split_at(NONCE_SIZE);
    open(commitment, nonce, msg)?;
    Ok(msg)
}

#[cfg(test)]
mod test {
    use rand::thread_rng;

    use super::{commit, open, open_bytes, opening_bytes};
    use crate::mpc_core::party::error::MpcError;

    #[test]
    fn correctness() {
        let mut rng = thread_rng();
        let message = "This is a message I commit to.".as_bytes();
        for _ in 0..10 {
            let (commitment, nonce) = commit(&mut rng, message);
            open(&commitment, &nonce, message).unwrap();
            let opening = opening_bytes(&nonce, message);
            assert_eq!(open_bytes(&commitment, &opening).unwrap(), message);
        }
    }

    #[test]
    fn soundness() {
        let mut rng = thread_rng();
        let mut message = "This is a message I commit to.".as_bytes().to_vec();

        let (mut commitment, nonce) = commit(&mut rng, &message);

        // try open different message
        message[5] ^= 0x4;
        assert!(matches!(
            open(&commitment, &nonce, &message),
            Err(MpcError::Commitment)
        ));

        message[5] ^= 0x4;
        // try different commitment
        commitment[3] ^= 0x80;
        assert!(matches!(
            open(&commitment, &nonce, &message),
            Err(MpcError::Commitment)
        ));
    }

    #[test]
    fn short_opening_is_malformed() {
        let mut rng = thread_rng();
        let (commitment, _) = commit(&mut rng, b"m");
        assert!(matches!(
            open_bytes(&commitment, &[1, 2, 3]),
            Err(MpcError::MalformedMessage(_))
        ));
    }
}
