//! Error types.
//!
//! The bridge itself never fails: a missing store degrades to no-ops and
//! empty snapshots. Errors only come from decoding loosely typed input
//! (action records, JSON state and config).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The action type name is not part of the media request vocabulary.
    #[error("unknown media action type `{0}`")]
    UnknownActionType(String),

    /// The detail attached to an action does not fit its type.
    #[error("action `{action}` expects {expected} as detail")]
    InvalidDetail {
        action: &'static str,
        expected: &'static str,
    },

    /// Media state or store configuration could not be decoded.
    #[error("invalid media state: {0}")]
    InvalidState(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
