use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode JSON response from {0}")]
    Decode(String, #[source] reqwest::Error),
}

impl RemoteError {
    /// Maps a failed `send()` or `error_for_status()` to the matching variant.
    pub(crate) fn from_request(url: &str, error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => RemoteError::HttpStatus {
                url: url.to_string(),
                status,
                source: error,
            },
            None => RemoteError::NetworkRequest(url.to_string(), error),
        }
    }
}
