//! Crate error type. Kept deliberately small: the core only needs to tell a
//! caller apart from four situations (see spec §7) -- a shard-reported
//! abort, a transport failure, an unavailable timestamp oracle, and an
//! internal precondition violation. Precondition violations are programming
//! errors and are not represented here; they panic at the call site instead
//! (see `VersionedStore::get_last_read_at`).

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A shard explicitly refused the transaction (REPLY_FAIL in the
    /// original source). Not retryable.
    ShardAbort,

    /// An RPC to a shard or the timestamp oracle did not complete, either
    /// because the transport reported a failure or because it timed out.
    /// The coordinator treats this the same as a shard RETRY reply.
    Transport(String),

    /// The timestamp oracle (OCC mode) could not be reached within the
    /// prepare timeout.
    OracleUnavailable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShardAbort => write!(f, "shard aborted the transaction"),
            Error::Transport(msg) => write!(f, "transport error: {msg}"),
            Error::OracleUnavailable => write!(f, "timestamp oracle unavailable"),
        }
    }
}

impl std::error::Error for Error {}
