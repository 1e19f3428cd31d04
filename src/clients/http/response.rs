use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CANCELED_ERR_MSG: &str = "request:canceled";

/// What the host transport hands back, for successes and failures alike.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportResponse {
    pub status_code: i32,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub header: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
}

impl TransportResponse {
    pub fn new(status_code: i32, data: Value) -> Self {
        Self {
            status_code,
            data,
            ..Default::default()
        }
    }

    /// A host-reported failure that never produced an HTTP response.
    pub fn from_err_msg(err_msg: impl Into<String>) -> Self {
        Self {
            status_code: -1,
            err_msg: Some(err_msg.into()),
            ..Default::default()
        }
    }

    pub fn canceled() -> Self {
        Self::from_err_msg(CANCELED_ERR_MSG)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }

    /// Transport-level success covers 200 through 302, redirects included.
    pub fn is_http_ok(&self) -> bool {
        (200..=302).contains(&self.status_code)
    }
}
