use std::{
    error::Error,
    sync::{Arc, Mutex, PoisonError},
};

use futures_util::StreamExt;
use hyper::{HeaderMap, Method, header::CONTENT_TYPE};
use reqwest::{
    Body, Client,
    multipart::{Form, Part},
};
use serde_json::Value;
use tokio_util::io::ReaderStream;
use url::Url;

use super::{
    HostTransport, ProgressCallback, TransportRequest, TransportResponse, UploadProgress,
    UploadTask,
};
use crate::request::CompletionHandlers;

type BoxError = Box<dyn Error + Send + Sync>;

/// Host transport backed by `reqwest`. Calls are spawned on the current tokio
/// runtime, so it must be used from within one.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl HostTransport for ReqwestTransport {
    fn request(&self, request: TransportRequest, handlers: CompletionHandlers) {
        let client = self.client.clone();
        tokio::spawn(async move {
            match send(&client, request).await {
                Ok(response) => handlers.success(response),
                Err(err) => handlers.fail(TransportResponse::from_err_msg(format!(
                    "request:fail {}",
                    err
                ))),
            }
        });
    }

    fn upload_file(
        &self,
        request: TransportRequest,
        handlers: CompletionHandlers,
    ) -> Box<dyn UploadTask> {
        let client = self.client.clone();
        let listeners = ProgressListeners::default();
        let task_listeners = listeners.clone();
        tokio::spawn(async move {
            match upload(&client, request, task_listeners).await {
                Ok(response) => handlers.success(response),
                Err(err) => handlers.fail(TransportResponse::from_err_msg(format!(
                    "uploadFile:fail {}",
                    err
                ))),
            }
        });
        Box::new(ReqwestUploadTask { listeners })
    }
}

#[derive(Clone, Default)]
struct ProgressListeners(Arc<Mutex<Vec<ProgressCallback>>>);

impl ProgressListeners {
    fn push(&self, callback: ProgressCallback) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    fn notify(&self, progress: &UploadProgress) {
        let callbacks = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for callback in callbacks {
            callback(progress);
        }
    }
}

struct ReqwestUploadTask {
    listeners: ProgressListeners,
}

impl UploadTask for ReqwestUploadTask {
    fn on_progress_update(&self, callback: ProgressCallback) {
        self.listeners.push(callback);
    }
}

async fn send(client: &Client, request: TransportRequest) -> Result<TransportResponse, BoxError> {
    let url = Url::parse(&request.url)?;
    let mut builder = client
        .request(request.method.clone(), url)
        .headers(request.header.clone());
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }

    let pairs = form_fields(&request.data);
    builder = if request.method == Method::GET {
        builder.query(&pairs)
    } else if is_form(&request.header) {
        builder.form(&pairs)
    } else {
        builder.json(&request.data)
    };

    let response = builder.send().await?;
    let status_code = i32::from(response.status().as_u16());
    let header = collect_headers(response.headers());
    let body = response.bytes().await?;

    Ok(TransportResponse {
        status_code,
        data: decode_body(&body, &request.data_type),
        header,
        err_msg: None,
    })
}

async fn upload(
    client: &Client,
    request: TransportRequest,
    listeners: ProgressListeners,
) -> Result<TransportResponse, BoxError> {
    let url = Url::parse(&request.url)?;
    let path = request.file_path.as_ref().ok_or("missing file path")?;
    let file = tokio::fs::File::open(path).await?;
    let total = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| request.name.clone());

    let mut sent = 0u64;
    let stream = ReaderStream::new(file).map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            listeners.notify(&UploadProgress::new(sent, total));
        }
        chunk
    });
    let part = Part::stream_with_length(Body::wrap_stream(stream), total).file_name(file_name);

    let mut form = Form::new();
    for (name, value) in form_fields(&request.form_data) {
        form = form.text(name, value);
    }
    let form = form.part(request.name.clone(), part);

    let mut builder = client
        .request(request.method.clone(), url)
        .headers(request.header.clone())
        .multipart(form);
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }

    let response = builder.send().await?;
    let status_code = i32::from(response.status().as_u16());
    let header = collect_headers(response.headers());
    let text = response.text().await?;

    Ok(TransportResponse {
        status_code,
        data: Value::String(text),
        header,
        err_msg: None,
    })
}

fn is_form(header: &HeaderMap) -> bool {
    header
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(mime::APPLICATION_WWW_FORM_URLENCODED.as_ref()))
}

/// Top-level fields of an object as name/value pairs; strings are taken as is.
fn form_fields(data: &Value) -> Vec<(String, String)> {
    match data {
        Value::Object(map) => map
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_headers(headers: &HeaderMap) -> std::collections::BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect()
}

/// With `data_type = "json"` the body is parsed when it can be; otherwise it
/// is kept as text.
fn decode_body(body: &[u8], data_type: &str) -> Value {
    if data_type == "json" {
        if let Ok(value) = serde_json::from_slice(body) {
            return value;
        }
    }
    Value::String(String::from_utf8_lossy(body).into_owned())
}
