use std::{path::PathBuf, time::Duration};

use hyper::{HeaderMap, Method};
use serde_json::Value;

use crate::config::CallConfig;

/// What the host transport is asked to send.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub header: HeaderMap,
    pub data: Value,
    /// Extra multipart fields of an upload.
    pub form_data: Value,
    pub file_path: Option<PathBuf>,
    /// Multipart field name of the uploaded file.
    pub name: String,
    pub data_type: String,
    pub timeout: Option<Duration>,
}

impl From<&CallConfig> for TransportRequest {
    fn from(config: &CallConfig) -> Self {
        Self {
            url: config.url.clone(),
            method: config.method.clone(),
            header: config.header.clone(),
            data: config.data.clone(),
            form_data: config.form_data.clone().unwrap_or(Value::Null),
            file_path: config.file_path.clone(),
            name: config.name.clone(),
            data_type: config.data_type.clone(),
            timeout: config.timeout,
        }
    }
}
