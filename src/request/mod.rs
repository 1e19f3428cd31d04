//! The request client: merges per-call options onto client defaults, runs the
//! interceptors and hands the call to the host transport.
//!
//! ```no_run
//! # async fn run() -> Result<(), jrequest::RequestError> {
//! use std::sync::Arc;
//! use jrequest::{ConfigPatch, ReqwestTransport, RequestClient, RequestOptions};
//! use serde_json::json;
//!
//! let mut client = RequestClient::new(Arc::new(ReqwestTransport::default()));
//! client.set_config(ConfigPatch {
//!     base_url: Some("https://api.example.com/".to_string()),
//!     ..Default::default()
//! });
//! client.interceptors_mut().set_request(|mut config| {
//!     config.header.insert("x-token", "secret".parse().unwrap());
//!     config
//! });
//!
//! let user = client
//!     .get(RequestOptions::new("users/1").data(json!({"fields": "name"})))?
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod completion;
mod interceptor;
mod options;
mod resolve;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use hyper::{
    Method,
    header::{CONTENT_TYPE, REFERER},
};
use log::debug;
use serde_json::Value;

pub use completion::{CompletionHandlers, PendingResponse};
pub use interceptor::{FailInterceptor, Interceptors, RequestInterceptor, ResponseInterceptor};
pub use options::{FailCallback, RequestOptions, SuccessCallback};
pub use resolve::{is_absolute_url, resolve_url};

use crate::{
    clients::{
        LoadingIndicator, NoLoading,
        http::{HostTransport, TransportRequest},
    },
    config::{CallConfig, ConfigPatch, ContentType, RequestConfig},
    error::Result,
};

/// One configured client. Configure it, then share it behind an `Arc`.
pub struct RequestClient {
    config: RequestConfig,
    interceptors: Interceptors,
    transport: Arc<dyn HostTransport>,
    indicator: Arc<dyn LoadingIndicator>,
}

impl RequestClient {
    pub fn new(transport: Arc<dyn HostTransport>) -> Self {
        Self {
            config: RequestConfig::default(),
            interceptors: Interceptors::default(),
            transport,
            indicator: Arc::new(NoLoading),
        }
    }

    pub fn with_indicator(mut self, indicator: Arc<dyn LoadingIndicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn set_config(&mut self, patch: ConfigPatch) {
        self.config.apply(patch);
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    pub fn interceptors_mut(&mut self) -> &mut Interceptors {
        &mut self.interceptors
    }

    pub fn get(&self, mut options: RequestOptions) -> Result<PendingResponse> {
        options.force_method(Method::GET);
        self.request(options)
    }

    pub fn post(&self, mut options: RequestOptions) -> Result<PendingResponse> {
        options.force_method(Method::POST);
        self.request(options)
    }

    /// Multipart upload of `file_path`; `data` becomes the extra form fields.
    pub fn upload(&self, mut options: RequestOptions) -> Result<PendingResponse> {
        options.force_method(Method::POST);
        options.force_content_type(ContentType::File);
        self.request(options)
    }

    /// Sends one call.
    ///
    /// Configuration errors come back right away and nothing is sent. Everything
    /// else, including HTTP and business failures, settles the returned
    /// [`PendingResponse`].
    pub fn request(&self, options: RequestOptions) -> Result<PendingResponse> {
        let (config, hooks) = options.into_call(&self.config)?;

        let config = match &self.interceptors.request {
            Some(intercept) => intercept(config),
            None => config,
        };
        let config = prepare(config);
        let request = TransportRequest::from(&config);

        if let Some(tip) = config.loading_tip.as_deref().filter(|tip| !tip.is_empty()) {
            self.indicator.show_loading(tip);
        }

        let canceled = config.canceled;
        let upload = config.content_type == ContentType::File;
        let (handlers, pending) = CompletionHandlers::new(
            config,
            self.interceptors.clone(),
            Arc::clone(&self.indicator),
            hooks.success,
            hooks.fail,
        );

        if canceled {
            handlers.cancel();
        } else if upload {
            let task = self.transport.upload_file(request, handlers);
            if let Some(progress) = hooks.progress {
                task.on_progress_update(progress);
            }
        } else {
            self.transport.request(request, handlers);
        }
        Ok(pending)
    }
}

/// Upload calls carry their fields in `form_data`, and leave `Content-Type`
/// and `Referer` to the multipart encoder.
fn prepare(mut config: CallConfig) -> CallConfig {
    if config.content_type == ContentType::File {
        if config.form_data.as_ref().is_none_or(Value::is_null) {
            config.form_data = Some(std::mem::take(&mut config.data));
        }
        config.header.remove(CONTENT_TYPE);
        config.header.remove(REFERER);
        config.method = Method::POST;
    }
    if config.debug {
        debug!("request: {:?}", config);
    }
    config
}
