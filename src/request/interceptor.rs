use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{clients::http::TransportResponse, config::CallConfig};

pub type RequestInterceptor = Arc<dyn Fn(CallConfig) -> CallConfig + Send + Sync>;
pub type ResponseInterceptor = Arc<dyn Fn(Value, &CallConfig) -> Value + Send + Sync>;
pub type FailInterceptor =
    Arc<dyn Fn(TransportResponse, &CallConfig) -> TransportResponse + Send + Sync>;

/// Hooks run at fixed points of every call.
///
/// - `request` rewrites the merged config before anything is sent.
/// - `response` rewrites the body of an HTTP-ok response before the business
///   check, unless the call sets `skip_interceptor_response`.
/// - `fail` rewrites the value a failed call is rejected with.
#[derive(Clone, Default)]
pub struct Interceptors {
    pub request: Option<RequestInterceptor>,
    pub response: Option<ResponseInterceptor>,
    pub fail: Option<FailInterceptor>,
}

impl Interceptors {
    pub fn set_request<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(CallConfig) -> CallConfig + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(f));
        self
    }

    pub fn set_response<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Value, &CallConfig) -> Value + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(f));
        self
    }

    pub fn set_fail<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(TransportResponse, &CallConfig) -> TransportResponse + Send + Sync + 'static,
    {
        self.fail = Some(Arc::new(f));
        self
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .field("fail", &self.fail.is_some())
            .finish()
    }
}
