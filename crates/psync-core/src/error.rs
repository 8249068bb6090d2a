use psync_iblt::IbltError;
use psync_types::tlv::TlvError;
use thiserror::Error;

/// Reply payload fails TLV grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected Content TLV, found type {0}")]
    WrongOuterType(u64),
    #[error("expected a Name or DataBlock TLV inside Content, found type {0}")]
    UnexpectedTlv(u64),
    #[error("a DataBlock TLV appeared before any Name")]
    DataBlockBeforeName,
    #[error(transparent)]
    Tlv(#[from] TlvError),
}

/// `publishName`/`publishNameAndData` on an unregistered prefix: logged at
/// `warn`, never surfaced as a panic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("prefix {0} is not registered")]
    UnknownPrefix(String),
}

/// Errors surfaced by the `Face` external transport interface.
#[derive(Debug, Error)]
pub enum FaceError {
    #[error("outbound request was nacked")]
    Nack,
    #[error("outbound request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Other(String),
}

/// Errors the sync engine can hit while running. Most are logged and
/// absorbed rather than propagated, since a single malformed peer message
/// must never take the engine down.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed sync reply: {0}")]
    MalformedState(#[from] CodecError),
    #[error("malformed IBLT component in peer request: {0}")]
    MalformedIblt(#[from] IbltError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Face(#[from] FaceError),
    #[error("sync engine has stopped")]
    EngineStopped,
}
