use thiserror::Error;

use crate::store::MAX_SHARD_AMOUNT;

/// The failures a map or one of its views can report.
///
/// Absence is never an error: lookups and removals that find nothing return `None` or `false`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The view cannot perform the operation, e.g. adding a bare key to a key set when there is
    /// no value to pair it with.
    #[error("the {view} view does not support `{operation}`")]
    Unsupported {
        /// The kind of view that rejected the call
        view: &'static str,
        /// The rejected operation
        operation: &'static str,
    },
    /// The requested shard amount is zero, not a power of two, or too large.
    #[error("shard amount must be a power of two no greater than {max}, got {0}", max = MAX_SHARD_AMOUNT)]
    InvalidShardAmount(usize),
}

/// A shorthand for results whose error is [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;
