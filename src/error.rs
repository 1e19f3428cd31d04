use thiserror::Error;

use crate::clients::http::TransportResponse;

/// Errors produced by the request client.
///
/// `UnsupportedContentType` and `InvalidHeader` are raised synchronously while a
/// call is being built, before the host transport is touched. The remaining
/// variants settle a [`PendingResponse`](crate::PendingResponse).
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unsupported content type : {0}")]
    UnsupportedContentType(String),

    #[error("invalid header {name:?}")]
    InvalidHeader { name: String },

    #[error("request failed: {}", describe_failure(.0))]
    Failed(TransportResponse),

    #[error("the outcome was delivered to a per-call callback")]
    HandledByCallback,

    #[error("host transport dropped the request without settling it")]
    Abandoned,
}

impl RequestError {
    /// The failure value for transport, business and canceled failures.
    pub fn response(&self) -> Option<&TransportResponse> {
        match self {
            RequestError::Failed(response) => Some(response),
            _ => None,
        }
    }
}

fn describe_failure(response: &TransportResponse) -> String {
    match &response.err_msg {
        Some(msg) => format!("{} (status {})", msg, response.status_code),
        None => format!("status {}", response.status_code),
    }
}

pub type Result<T, E = RequestError> = std::result::Result<T, E>;
