// Error classification for dispatch attempts.

use thiserror::Error;

/// Terminal failure of a single dispatch attempt.
///
/// Every variant surfaces through the descriptor's `on_error` callback;
/// the queue engine only observes success-vs-failure and never propagates
/// these upward. Nothing here is fatal to the process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The device reports no connectivity at all; no request was attempted.
    #[error("no network connectivity")]
    ConnectivityUnavailable,

    /// Connection-level failure (DNS, refused, reset, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("protocol error: HTTP {status}")]
    Protocol { status: u16 },

    /// The response body could not be decoded into the expected payload.
    #[error("data error: {0}")]
    Data(String),

    /// The bundle manifest did not contain a well-formed version hash.
    #[error("Wrong AssetBundle Manifest Hash for: {manifest_url}")]
    ManifestInvalid { manifest_url: String },

    /// The queue gave up on a descriptor after the configured attempt cap.
    #[error("max attempts exceeded for: {url}")]
    MaxAttemptsExceeded { url: String },
}

impl FetchError {
    /// Map a reqwest error to its transport/data classification.
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return FetchError::Protocol {
                status: status.as_u16(),
            };
        }
        if err.is_decode() || err.is_body() {
            return FetchError::Data(err.to_string());
        }
        FetchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_error_message_names_the_manifest_url() {
        let err = FetchError::ManifestInvalid {
            manifest_url: "https://cdn.example/bundle.manifest".into(),
        };
        assert_eq!(
            err.to_string(),
            "Wrong AssetBundle Manifest Hash for: https://cdn.example/bundle.manifest"
        );
    }

    #[test]
    fn max_attempts_message_mentions_the_cap() {
        let err = FetchError::MaxAttemptsExceeded {
            url: "https://a".into(),
        };
        assert!(err.to_string().contains("max attempts exceeded"));
    }
}
