// Centralized error handling

use thiserror::Error;

/// Errors raised while talking to the torrent client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to send request to {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Torrent client returned error status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Login rejected by torrent client: {0}")]
    LoginRejected(String),

    #[error("Failed to create HTTP client: {0}")]
    Builder(#[source] reqwest::Error),
}

/// Errors raised while delivering a notification
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to deliver notification to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Notification endpoint {url} returned error status {status}")]
    Status { url: String, status: u16 },
}

/// Errors that abort a share limits pass
#[derive(Error, Debug)]
pub enum ShareLimitError {
    #[error("Torrent client call failed: {0}")]
    Client(#[from] ClientError),
}
