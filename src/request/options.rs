use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use hyper::{
    HeaderMap, Method,
    header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

use super::resolve::resolve_url;
use crate::{
    clients::http::{ProgressCallback, TransportResponse, UploadProgress},
    config::{
        CallConfig, ContentType, DEFAULT_FILE_FIELD, DEFAULT_LOADING_DURATION, RequestConfig,
    },
    error::{RequestError, Result},
};

pub type SuccessCallback = Box<dyn FnOnce(Value) + Send>;
pub type FailCallback = Box<dyn FnOnce(TransportResponse) + Send>;

/// Per-call values. Anything left unset falls back to the client defaults.
#[derive(Default)]
pub struct RequestOptions {
    url: String,
    method: Option<Method>,
    base_url: Option<String>,
    content_type: Option<ContentType>,
    content_type_name: Option<String>,
    data: Option<Value>,
    form_data: Option<Value>,
    header: Vec<(String, String)>,
    encoding: Option<String>,
    data_type: Option<String>,
    business: Option<String>,
    skip_interceptor_response: Option<bool>,
    slash_absolute_url: Option<bool>,
    debug: Option<bool>,
    loading_tip: Option<String>,
    loading_duration: Option<Duration>,
    file_path: Option<PathBuf>,
    name: Option<String>,
    timeout: Option<Duration>,
    success: Option<SuccessCallback>,
    fail: Option<FailCallback>,
    progress: Option<ProgressCallback>,
}

/// Callbacks that travel with a call but are not part of its config.
#[derive(Default)]
pub(crate) struct CallHooks {
    pub success: Option<SuccessCallback>,
    pub fail: Option<FailCallback>,
    pub progress: Option<ProgressCallback>,
}

impl fmt::Debug for CallHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHooks")
            .field("success", &self.success.is_some())
            .field("fail", &self.fail.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self.content_type_name = None;
        self
    }

    /// Content type by name (`json`, `form` or `file`). Any other name makes the
    /// call fail with [`RequestError::UnsupportedContentType`] before it is sent,
    /// unless the call carries its own `Content-Type` header.
    pub fn content_type_name(mut self, name: impl Into<String>) -> Self {
        self.content_type_name = Some(name.into());
        self.content_type = None;
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Extra multipart fields of an upload. Defaults to `data`.
    pub fn form_data(mut self, form_data: Value) -> Self {
        self.form_data = Some(form_data);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.push((name.into(), value.into()));
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn business(mut self, business: impl Into<String>) -> Self {
        self.business = Some(business.into());
        self
    }

    /// Resolve with the whole response body instead of one field of it.
    pub fn whole_body(self) -> Self {
        self.business("")
    }

    pub fn skip_interceptor_response(mut self, skip: bool) -> Self {
        self.skip_interceptor_response = Some(skip);
        self
    }

    pub fn slash_absolute_url(mut self, flag: bool) -> Self {
        self.slash_absolute_url = Some(flag);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn loading_tip(mut self, tip: impl Into<String>) -> Self {
        self.loading_tip = Some(tip.into());
        self
    }

    pub fn loading_duration(mut self, duration: Duration) -> Self {
        self.loading_duration = Some(duration);
        self
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Multipart field name of the uploaded file, `file` by default.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Receive the payload here instead of through the pending response.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.success = Some(Box::new(f));
        self
    }

    /// Receive the failure here instead of through the pending response.
    pub fn on_fail<F>(mut self, f: F) -> Self
    where
        F: FnOnce(TransportResponse) + Send + 'static,
    {
        self.fail = Some(Box::new(f));
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&UploadProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(f));
        self
    }

    pub(crate) fn force_method(&mut self, method: Method) {
        self.method = Some(method);
    }

    pub(crate) fn force_content_type(&mut self, content_type: ContentType) {
        self.content_type = Some(content_type);
        self.content_type_name = None;
    }

    /// Merges onto `defaults`; call-site values win.
    pub(crate) fn into_call(self, defaults: &RequestConfig) -> Result<(CallConfig, CallHooks)> {
        let mut header = HeaderMap::with_capacity(self.header.len() + 1);
        for (name, value) in &self.header {
            let invalid = || RequestError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            header.insert(header_name, header_value);
        }

        let base_url = self.base_url.unwrap_or_else(|| defaults.base_url.clone());
        let slash_absolute_url = self
            .slash_absolute_url
            .unwrap_or(defaults.slash_absolute_url);
        let encoding = self.encoding.unwrap_or_else(|| defaults.encoding.clone());
        let has_content_type = header.contains_key(CONTENT_TYPE);
        let content_type = match &self.content_type_name {
            Some(name) if has_content_type => name.parse().unwrap_or(ContentType::Json),
            Some(name) => name.parse()?,
            None => self.content_type.unwrap_or(defaults.content_type),
        };

        if !has_content_type {
            let value = content_type.header(&encoding);
            let value = HeaderValue::from_str(&value).map_err(|_| RequestError::InvalidHeader {
                name: CONTENT_TYPE.to_string(),
            })?;
            header.insert(CONTENT_TYPE, value);
        }

        let config = CallConfig {
            url: resolve_url(&base_url, &self.url, slash_absolute_url),
            base_url,
            method: self.method.unwrap_or(Method::GET),
            content_type,
            data: self.data.unwrap_or_else(|| Value::Object(Map::new())),
            form_data: self.form_data,
            header,
            encoding,
            data_type: self.data_type.unwrap_or_else(|| defaults.data_type.clone()),
            business: self.business.unwrap_or_else(|| defaults.business.clone()),
            skip_interceptor_response: self
                .skip_interceptor_response
                .unwrap_or(defaults.skip_interceptor_response),
            slash_absolute_url,
            debug: self.debug.unwrap_or(defaults.debug),
            loading_tip: self
                .loading_tip
                .or_else(|| defaults.loading_tip.clone())
                .filter(|tip| !tip.is_empty()),
            loading_duration: Some(self.loading_duration.unwrap_or(defaults.loading_duration))
                .filter(|duration| !duration.is_zero())
                .unwrap_or(DEFAULT_LOADING_DURATION),
            file_path: self.file_path,
            name: self.name.unwrap_or_else(|| DEFAULT_FILE_FIELD.to_string()),
            timeout: self.timeout,
            canceled: false,
        };
        let hooks = CallHooks {
            success: self.success,
            fail: self.fail,
            progress: self.progress,
        };
        Ok((config, hooks))
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .field("data", &self.data)
            .field("header", &self.header)
            .field("success", &self.success.is_some())
            .field("fail", &self.fail.is_some())
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
