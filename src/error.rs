use thiserror::Error;

use crate::family::AddressFamily;

/// Failure to turn one input token into a numeric range.
///
/// Every variant keeps the offending token so callers can report it as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unrecognized address: {input}")]
    MalformedAddress { input: String },

    #[error("invalid prefix {prefix} for {family} address: {input}")]
    InvalidPrefixLength {
        input: String,
        prefix: String,
        family: AddressFamily,
    },

    #[error("invalid range {input}: {reason}")]
    InvalidRange { input: String, reason: String },

    #[error("{input} is not a valid network address for prefix /{prefix}")]
    UnalignedNetwork { input: String, prefix: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(input: &str) -> Self {
        Error::MalformedAddress {
            input: input.to_owned(),
        }
    }

    /// The token that failed to parse.
    pub fn input(&self) -> &str {
        match self {
            Error::MalformedAddress { input }
            | Error::InvalidPrefixLength { input, .. }
            | Error::InvalidRange { input, .. }
            | Error::UnalignedNetwork { input, .. } => input,
        }
    }
}
