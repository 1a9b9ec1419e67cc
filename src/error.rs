use thiserror::Error;

/// Failure classes with distinct handling policies.
///
/// `InvalidUrl` is surfaced verbatim to the user. `LookupUnavailable` is
/// never user-visible: the feature extractor downgrades it to the default
/// domain age. Everything else is `Internal` and gets a generic reply.
#[derive(Debug, Error)]
pub enum PhishguardError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("lookup unavailable: {0}")]
    LookupUnavailable(String),

    #[error("{0}")]
    Internal(anyhow::Error),
}
