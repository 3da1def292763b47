//! Error types for identifier decoding, pool access and block replenishment.
//!
//! Only [`Error::BlockPoolExhausted`] is ever surfaced by
//! [`Dispenser::next`](crate::Dispenser::next). Failures on the replenishment
//! side-channel ([`Error::FetchFailed`], [`Error::Transport`],
//! [`Error::InvalidResponse`]) are contained by the allocator client and show
//! up indirectly as a pool that stays low.

use crate::id::Base36Error;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `suid` can produce.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed base-36 text.
    #[error("format error: {0}")]
    Format(#[from] Base36Error),

    /// The block pool had no reserve when a take was attempted.
    #[error("block pool is empty")]
    EmptyPool,

    /// No block is held and the pool is empty, so no identifier can be
    /// produced until replenishment succeeds.
    #[error("unable to generate IDs: suid block pool exhausted")]
    BlockPoolExhausted,

    /// A block start whose identifiers would leave the 64-bit range.
    #[error("block starting at {start} overflows the identifier range")]
    BlockOverflow { start: u64 },

    /// The allocator answered with a non-success status.
    #[error("fetching blocks failed with status {status}")]
    FetchFailed { status: u16 },

    /// The allocator could not be reached at all (connection refused,
    /// timeout, client setup failure).
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The allocator answered with a body that does not hold block starts.
    #[error("invalid allocator response: {reason}")]
    InvalidResponse { reason: String },

    /// An externally supplied configuration payload could not be parsed.
    #[error("unable to parse suid options: {reason}")]
    ConfigParse { reason: String },

    /// The pool store could not be read or written.
    #[error("pool store error: {reason}")]
    Store { reason: String },

    /// No tokio runtime was available to run background replenishment.
    #[error("no tokio runtime available")]
    NoRuntime,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Store {
            reason: err.to_string(),
        }
    }
}
