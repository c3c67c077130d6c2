use std::fmt::{Display, Formatter};
use std::io;
use std::sync::mpsc;

use thiserror::Error;

pub type MpcResult<T> = Result<T, MpcError>;

/// The kind of native protocol that was running when an error occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    Input,
    Linear,
    Multiplication,
    Output,
    Random,
    BroadcastValidation,
    MacCheck,
}

impl Display for ProtocolKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProtocolKind::Input => "input",
            ProtocolKind::Linear => "linear",
            ProtocolKind::Multiplication => "multiplication",
            ProtocolKind::Output => "output",
            ProtocolKind::Random => "random",
            ProtocolKind::BroadcastValidation => "broadcast-validation",
            ProtocolKind::MacCheck => "mac-check",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum MpcError {
    #[error("CommitmentError")]
    Commitment,
    #[error("BroadcastError")]
    Broadcast,
    #[error("MacCheckError")]
    MacCheck,
    #[error("IoError({0})")]
    Io(#[from] io::Error),
    #[error("RecvError")]
    Receive,
    #[error("InsufficientPreprocessing({0})")]
    InsufficientPreprocessing(String),
    #[error("MalformedMessage({0})")]
    MalformedMessage(String),
    #[error("InvalidParameters({0})")]
    InvalidParameters(String),
    #[error("Misuse({0})")]
    Misuse(String),
    #[error("UncheckedValues({0} opened values were not MAC-checked)")]
    UncheckedValues(usize),
    #[error("{kind} failed: {source}")]
    Failed {
        kind: ProtocolKind,
        #[source]
        source: Box<MpcError>,
    },
}

impl MpcError {
    /// Tags the error with the protocol kind that raised it. Already tagged errors keep their
    /// innermost stage.
    pub fn during(self, kind: ProtocolKind) -> Self {
        match self {
            err @ MpcError::Failed { .. } => err,
            err => MpcError::Failed {
                kind,
                source: Box::new(err),
            },
        }
    }

    /// The error without any stage tags.
    pub fn root_cause(&self) -> &MpcError {
        match self {
            MpcError::Failed { source, .. } => source.root_cause(),
            err => err,
        }
    }

    /// The protocol kind that raised the error, if known.
    pub fn failed_stage(&self) -> Option<ProtocolKind> {
        match self {
            MpcError::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True if a peer was caught deviating: a MAC mismatch, an inconsistent broadcast or a
    /// commitment that does not open.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self.root_cause(),
            MpcError::MacCheck | MpcError::Broadcast | MpcError::Commitment
        )
    }
}

impl From<oneshot::RecvError> for MpcError {
    fn from(_err: oneshot::RecvError) -> Self {
        Self::Receive
    }
}

impl From<mpsc::RecvError> for MpcError {
    fn from(_err: mpsc::RecvError) -> Self {
        Self::Receive
    }
}

impl From<mpsc::RecvTimeoutError> for MpcError {
    fn from(err: mpsc::RecvTimeoutError) -> Self {
        match err {
            mpsc::RecvTimeoutError::Timeout => Self::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out waiting for a peer",
            )),
            mpsc::RecvTimeoutError::Disconnected => Self::Receive,
        }
    }
}
