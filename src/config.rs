//! Client defaults, their partial update form, and the merged per-call view.

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use hyper::{HeaderMap, Method};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{RequestError, Result};

pub const DEFAULT_BUSINESS: &str = "data";
pub const DEFAULT_ENCODING: &str = "UTF-8";
pub const DEFAULT_DATA_TYPE: &str = "json";
pub const DEFAULT_FILE_FIELD: &str = "file";
pub const DEFAULT_LOADING_DURATION: Duration = Duration::from_millis(500);

/// How the request body is encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Json,
    Form,
    File,
}

impl ContentType {
    pub fn essence(&self) -> mime::Mime {
        match self {
            ContentType::Json => mime::APPLICATION_JSON,
            ContentType::Form => mime::APPLICATION_WWW_FORM_URLENCODED,
            ContentType::File => mime::MULTIPART_FORM_DATA,
        }
    }

    /// The `Content-Type` header value, e.g. `application/json;charset=UTF-8`.
    pub fn header(&self, encoding: &str) -> String {
        format!("{};charset={}", self.essence(), encoding)
    }
}

impl FromStr for ContentType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(ContentType::Json),
            "form" => Ok(ContentType::Form),
            "file" => Ok(ContentType::File),
            other => Err(RequestError::UnsupportedContentType(other.to_string())),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::Json => "json",
            ContentType::Form => "form",
            ContentType::File => "file",
        })
    }
}

/// Header value for an untyped content type name. An empty name means `json`.
pub fn content_type_header(content_type: &str, encoding: &str) -> Result<String> {
    let content_type = if content_type.is_empty() {
        ContentType::default()
    } else {
        content_type.parse()?
    };
    let encoding = if encoding.is_empty() {
        DEFAULT_ENCODING
    } else {
        encoding
    };
    Ok(content_type.header(encoding))
}

/// Defaults shared by every call of a client.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestConfig {
    pub base_url: String,
    /// Response field holding the payload; empty means the whole body.
    pub business: String,
    pub content_type: ContentType,
    pub encoding: String,
    /// `json` makes textual upload responses get parsed as JSON.
    pub data_type: String,
    pub debug: bool,
    pub loading_tip: Option<String>,
    /// Minimum time a loading tip stays visible.
    pub loading_duration: Duration,
    /// Treat `/path` urls as absolute instead of prefixing `base_url`.
    pub slash_absolute_url: bool,
    pub skip_interceptor_response: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            business: DEFAULT_BUSINESS.to_string(),
            content_type: ContentType::default(),
            encoding: DEFAULT_ENCODING.to_string(),
            data_type: DEFAULT_DATA_TYPE.to_string(),
            debug: false,
            loading_tip: None,
            loading_duration: DEFAULT_LOADING_DURATION,
            slash_absolute_url: false,
            skip_interceptor_response: false,
        }
    }
}

impl RequestConfig {
    /// Shallow merge: every field present in `patch` replaces the stored one.
    pub fn apply(&mut self, patch: ConfigPatch) {
        let ConfigPatch {
            base_url,
            business,
            content_type,
            encoding,
            data_type,
            debug,
            loading_tip,
            loading_duration,
            slash_absolute_url,
            skip_interceptor_response,
        } = patch;

        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(business) = business {
            self.business = business;
        }
        if let Some(content_type) = content_type {
            self.content_type = content_type;
        }
        if let Some(encoding) = encoding {
            self.encoding = encoding;
        }
        if let Some(data_type) = data_type {
            self.data_type = data_type;
        }
        if let Some(debug) = debug {
            self.debug = debug;
        }
        if let Some(loading_tip) = loading_tip {
            self.loading_tip = loading_tip;
        }
        if let Some(ms) = loading_duration {
            self.loading_duration = Duration::from_millis(ms);
        }
        if let Some(flag) = slash_absolute_url {
            self.slash_absolute_url = flag;
        }
        if let Some(flag) = skip_interceptor_response {
            self.skip_interceptor_response = flag;
        }
    }
}

/// Partial [`RequestConfig`], as read from a JSON configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub base_url: Option<String>,
    pub business: Option<String>,
    pub content_type: Option<ContentType>,
    pub encoding: Option<String>,
    pub data_type: Option<String>,
    pub debug: Option<bool>,
    /// `Some(None)` (`"loadingTip": null`) clears the tip.
    #[serde(deserialize_with = "present")]
    pub loading_tip: Option<Option<String>>,
    /// Milliseconds.
    pub loading_duration: Option<u64>,
    pub slash_absolute_url: Option<bool>,
    pub skip_interceptor_response: Option<bool>,
}

/// A field that is present in the JSON, even as `null`, becomes `Some`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// The configuration of one call: client defaults overridden by call-site values.
///
/// Request interceptors receive and return this.
#[derive(Clone, Debug)]
pub struct CallConfig {
    pub url: String,
    pub base_url: String,
    pub method: Method,
    pub content_type: ContentType,
    pub data: Value,
    pub form_data: Option<Value>,
    pub header: HeaderMap,
    pub encoding: String,
    pub data_type: String,
    pub business: String,
    pub skip_interceptor_response: bool,
    pub slash_absolute_url: bool,
    pub debug: bool,
    pub loading_tip: Option<String>,
    pub loading_duration: Duration,
    pub file_path: Option<PathBuf>,
    pub name: String,
    pub timeout: Option<Duration>,
    /// Checked right before dispatch. When set, the transport is never called
    /// and the call fails with the `request:canceled` response.
    pub canceled: bool,
}
