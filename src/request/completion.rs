use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use log::{debug, error, warn};
use serde_json::Value;
use tokio::{sync::oneshot, time::Instant};

use super::{
    interceptor::Interceptors,
    options::{FailCallback, SuccessCallback},
};
use crate::{
    clients::{LoadingIndicator, http::TransportResponse},
    config::{CallConfig, ContentType, DEFAULT_LOADING_DURATION},
    error::{RequestError, Result},
};

/// The settle-once side of a call, handed to the host transport.
///
/// Consuming it through [`success`](Self::success), [`fail`](Self::fail) or
/// [`cancel`](Self::cancel) settles the call and then runs the completion step
/// (elapsed time, loading tip). Dropping it unconsumed still runs the completion
/// step and leaves the caller with [`RequestError::Abandoned`].
pub struct CompletionHandlers {
    state: Option<CallState>,
}

struct CallState {
    config: CallConfig,
    interceptors: Interceptors,
    indicator: Arc<dyn LoadingIndicator>,
    start_time: Instant,
    settle: Option<Settle>,
}

struct Settle {
    sender: oneshot::Sender<Result<Value>>,
    success: Option<SuccessCallback>,
    fail: Option<FailCallback>,
}

/// Resolves once with the business payload, or with the reason the call failed.
#[must_use = "a pending response does nothing unless awaited"]
pub struct PendingResponse {
    receiver: oneshot::Receiver<Result<Value>>,
}

impl Future for PendingResponse {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RequestError::Abandoned)))
    }
}

impl CompletionHandlers {
    pub(crate) fn new(
        config: CallConfig,
        interceptors: Interceptors,
        indicator: Arc<dyn LoadingIndicator>,
        success: Option<SuccessCallback>,
        fail: Option<FailCallback>,
    ) -> (Self, PendingResponse) {
        let (sender, receiver) = oneshot::channel();
        let state = CallState {
            config,
            interceptors,
            indicator,
            start_time: Instant::now(),
            settle: Some(Settle {
                sender,
                success,
                fail,
            }),
        };
        (Self { state: Some(state) }, PendingResponse { receiver })
    }

    pub fn config(&self) -> Option<&CallConfig> {
        self.state.as_ref().map(|state| &state.config)
    }

    /// The transport got an HTTP response, whatever its status.
    pub fn success(mut self, response: TransportResponse) {
        if let Some(mut state) = self.state.take() {
            state.succeed(response);
            state.complete();
        }
    }

    /// The transport could not produce an HTTP response.
    pub fn fail(mut self, response: TransportResponse) {
        if let Some(mut state) = self.state.take() {
            state.reject(response);
            state.complete();
        }
    }

    /// Fails the call with `{errMsg: "request:canceled", statusCode: -1}`.
    ///
    /// The client does this itself for a call whose [`CallConfig::canceled`]
    /// is set once the request interceptor has run.
    pub fn cancel(self) {
        self.fail(TransportResponse::canceled());
    }
}

impl Drop for CompletionHandlers {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if state.config.debug {
                warn!("request to {} dropped without a response", state.config.url);
            }
            state.complete();
        }
    }
}

impl fmt::Debug for CompletionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandlers")
            .field("url", &self.config().map(|c| c.url.as_str()))
            .field("settled", &self.state.is_none())
            .finish()
    }
}

impl CallState {
    fn succeed(&mut self, response: TransportResponse) {
        if response.is_http_ok() {
            if self.config.debug {
                debug!("response success: {:?}", response);
            }
            if let Some(payload) = self.business_payload(&response) {
                self.resolve(payload);
                return;
            }
        }
        self.reject(response);
    }

    /// `None` when the body does not report business success.
    fn business_payload(&self, response: &TransportResponse) -> Option<Value> {
        let mut result = response.data.clone();
        if self.config.content_type == ContentType::File && self.config.data_type == "json" {
            if let Value::String(text) = &result {
                match serde_json::from_str(text) {
                    Ok(parsed) => result = parsed,
                    Err(err) => {
                        warn!("upload response of {} is not JSON: {}", self.config.url, err);
                        return None;
                    }
                }
            }
        }

        let skip = self.config.skip_interceptor_response;
        if !skip {
            if let Some(intercept) = &self.interceptors.response {
                result = intercept(result, &self.config);
            }
        }

        if skip || is_truthy(result.get("success")) {
            Some(unwrap_business(result, &self.config.business))
        } else {
            None
        }
    }

    fn resolve(&mut self, payload: Value) {
        let Some(settle) = self.settle.take() else {
            return;
        };
        let outcome = match settle.success {
            Some(callback) => {
                callback(payload);
                Err(RequestError::HandledByCallback)
            }
            None => Ok(payload),
        };
        let _ = settle.sender.send(outcome);
    }

    fn reject(&mut self, response: TransportResponse) {
        let Some(settle) = self.settle.take() else {
            return;
        };
        if self.config.debug {
            error!("response failure: {:?}", response);
        }
        let result = match &self.interceptors.fail {
            Some(intercept) => intercept(response, &self.config),
            None => response,
        };
        let outcome = match settle.fail {
            Some(callback) => {
                callback(result);
                RequestError::HandledByCallback
            }
            None => RequestError::Failed(result),
        };
        let _ = settle.sender.send(Err(outcome));
    }

    fn complete(&self) {
        let end_time = Instant::now();
        let elapsed = end_time.duration_since(self.start_time);
        if self.config.debug {
            debug!("request completed in {} ms", elapsed.as_millis());
        }
        if self.config.loading_tip.as_deref().is_some_and(|tip| !tip.is_empty()) {
            let duration = Some(self.config.loading_duration)
                .filter(|duration| !duration.is_zero())
                .unwrap_or(DEFAULT_LOADING_DURATION);
            let remaining = duration.saturating_sub(elapsed);
            hide_loading_after(Arc::clone(&self.indicator), remaining);
        }
    }
}

/// Keeps the loading tip up for whatever is left of its minimum duration.
fn hide_loading_after(indicator: Arc<dyn LoadingIndicator>, delay: Duration) {
    if delay.is_zero() {
        indicator.hide_loading();
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                indicator.hide_loading();
            });
        }
        Err(_) => {
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                indicator.hide_loading();
            });
        }
    }
}

fn unwrap_business(result: Value, business: &str) -> Value {
    if business.is_empty() {
        return result;
    }
    match result {
        Value::Object(mut map) => map.remove(business).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        clients::NoLoading,
        config::RequestConfig,
        request::{RequestOptions, testing::RecordingIndicator},
    };
    use serde_json::json;

    fn call_config(options: RequestOptions) -> CallConfig {
        options.into_call(&RequestConfig::default()).unwrap().0
    }

    fn new_call(config: CallConfig, interceptors: Interceptors) -> (CompletionHandlers, PendingResponse) {
        CompletionHandlers::new(config, interceptors, Arc::new(NoLoading), None, None)
    }

    #[tokio::test]
    async fn test_business_success_unwraps_data_field() {
        let (handlers, pending) = new_call(call_config(RequestOptions::new("a")), Interceptors::default());
        handlers.success(TransportResponse::new(200, json!({"success": true, "data": {"x": 1}})));

        assert_eq!(pending.await.unwrap(), json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_empty_business_resolves_whole_body() {
        let body = json!({"success": true, "data": {"x": 1}});
        let (handlers, pending) = new_call(
            call_config(RequestOptions::new("a").whole_body()),
            Interceptors::default(),
        );
        handlers.success(TransportResponse::new(200, body.clone()));

        assert_eq!(pending.await.unwrap(), body);
    }

    #[tokio::test]
    async fn test_http_error_status_fails_with_raw_response() {
        let response = TransportResponse::new(404, json!({"success": true, "data": 1}));
        let (handlers, pending) = new_call(call_config(RequestOptions::new("a")), Interceptors::default());
        handlers.success(response.clone());

        match pending.await {
            Err(RequestError::Failed(failed)) => assert_eq!(failed, response),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_business_failure_fails_with_raw_response() {
        let response = TransportResponse::new(200, json!({"success": false, "msg": "nope"}));
        let (handlers, pending) = new_call(call_config(RequestOptions::new("a")), Interceptors::default());
        handlers.success(response.clone());

        let err = pending.await.unwrap_err();
        assert_eq!(err.response(), Some(&response));
    }

    #[tokio::test]
    async fn test_skip_interceptor_response_bypasses_success_check() {
        let mut interceptors = Interceptors::default();
        interceptors.set_response(|_, _| json!({"success": false}));
        let (handlers, pending) = new_call(
            call_config(RequestOptions::new("a").skip_interceptor_response(true)),
            interceptors,
        );
        handlers.success(TransportResponse::new(200, json!({"data": [1, 2]})));

        assert_eq!(pending.await.unwrap(), json!([1, 2]));
    }

    #[tokio::test]
    async fn test_response_interceptor_adapts_foreign_body() {
        let mut interceptors = Interceptors::default();
        interceptors.set_response(|body, config| {
            assert_eq!(config.url, "a");
            json!({"success": body["code"] == 0, "data": body["result"]})
        });
        let (handlers, pending) = new_call(call_config(RequestOptions::new("a")), interceptors);
        handlers.success(TransportResponse::new(200, json!({"code": 0, "result": "ok"})));

        assert_eq!(pending.await.unwrap(), json!("ok"));
    }

    #[tokio::test]
    async fn test_fail_interceptor_replaces_rejection_value() {
        let mut interceptors = Interceptors::default();
        interceptors.set_fail(|response, _| TransportResponse {
            err_msg: Some(format!("wrapped {}", response.status_code)),
            ..response
        });
        let (handlers, pending) = new_call(call_config(RequestOptions::new("a")), interceptors);
        handlers.fail(TransportResponse::from_err_msg("request:fail timeout"));

        let err = pending.await.unwrap_err();
        assert_eq!(err.response().unwrap().err_msg.as_deref(), Some("wrapped -1"));
    }

    #[tokio::test]
    async fn test_upload_text_body_is_parsed_as_json() {
        let config = call_config(RequestOptions::new("a").content_type(ContentType::File));
        let (handlers, pending) = new_call(config, Interceptors::default());
        handlers.success(TransportResponse::new(
            200,
            json!(r#"{"success": true, "data": {"url": "/f/1"}}"#),
        ));

        assert_eq!(pending.await.unwrap(), json!({"url": "/f/1"}));
    }

    #[tokio::test]
    async fn test_upload_body_that_is_not_json_fails() {
        let config = call_config(RequestOptions::new("a").content_type(ContentType::File));
        let (handlers, pending) = new_call(config, Interceptors::default());
        handlers.success(TransportResponse::new(200, json!("<html>")));

        assert_eq!(
            pending.await.unwrap_err().response().unwrap().data,
            json!("<html>")
        );
    }

    #[tokio::test]
    async fn test_per_call_callbacks_take_the_outcome() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let (handlers, pending) = CompletionHandlers::new(
            call_config(RequestOptions::new("a")),
            Interceptors::default(),
            Arc::new(NoLoading),
            Some(Box::new(move |payload: Value| sink.lock().unwrap().push(payload))),
            None,
        );
        handlers.success(TransportResponse::new(200, json!({"success": 1, "data": "p"})));
        assert!(matches!(pending.await, Err(RequestError::HandledByCallback)));

        let sink = Arc::clone(&seen);
        let (handlers, pending) = CompletionHandlers::new(
            call_config(RequestOptions::new("a")),
            Interceptors::default(),
            Arc::new(NoLoading),
            None,
            Some(Box::new(move |response: TransportResponse| {
                sink.lock().unwrap().push(json!(response.status_code))
            })),
        );
        handlers.success(TransportResponse::new(500, Value::Null));
        assert!(matches!(pending.await, Err(RequestError::HandledByCallback)));

        assert_eq!(*seen.lock().unwrap(), vec![json!("p"), json!(500)]);
    }

    #[tokio::test]
    async fn test_cancel_fails_with_sentinel_payload() {
        let (handlers, pending) = new_call(call_config(RequestOptions::new("a")), Interceptors::default());
        handlers.cancel();

        let err = pending.await.unwrap_err();
        let response = err.response().unwrap();
        assert_eq!(response.err_msg.as_deref(), Some("request:canceled"));
        assert_eq!(response.status_code, -1);
    }

    #[tokio::test]
    async fn test_dropped_handlers_abandon_the_call() {
        let (handlers, pending) = new_call(call_config(RequestOptions::new("a")), Interceptors::default());
        drop(handlers);

        assert!(matches!(pending.await, Err(RequestError::Abandoned)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_response_keeps_loading_tip_for_minimum_duration() {
        let indicator = RecordingIndicator::new();
        let config = call_config(
            RequestOptions::new("a")
                .loading_tip("Loading")
                .loading_duration(Duration::from_millis(500)),
        );
        let (handlers, pending) = CompletionHandlers::new(
            config,
            Interceptors::default(),
            indicator.clone(),
            None,
            None,
        );

        tokio::time::advance(Duration::from_millis(50)).await;
        handlers.success(TransportResponse::new(200, json!({"success": true})));
        pending.await.unwrap();
        assert_eq!(indicator.hides(), 0);

        tokio::time::sleep(Duration::from_millis(440)).await;
        assert_eq!(indicator.hides(), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(indicator.hides(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_hides_loading_tip_immediately() {
        let indicator = RecordingIndicator::new();
        let config = call_config(
            RequestOptions::new("a")
                .loading_tip("Loading")
                .loading_duration(Duration::from_millis(500)),
        );
        let (handlers, _pending) = CompletionHandlers::new(
            config,
            Interceptors::default(),
            indicator.clone(),
            None,
            None,
        );

        tokio::time::advance(Duration::from_millis(600)).await;
        handlers.fail(TransportResponse::from_err_msg("request:fail"));
        assert_eq!(indicator.hides(), 1);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!(1))));
        assert!(is_truthy(Some(&json!("yes"))));
        assert!(is_truthy(Some(&json!({}))));
    }

    #[test]
    fn test_unwrap_business() {
        assert_eq!(unwrap_business(json!({"data": 1}), "data"), json!(1));
        assert_eq!(unwrap_business(json!({"data": 1}), "rows"), Value::Null);
        assert_eq!(unwrap_business(json!([1]), "data"), Value::Null);
        assert_eq!(unwrap_business(json!([1]), ""), json!([1]));
    }
}
