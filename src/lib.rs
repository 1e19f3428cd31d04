//! A request client layered over a host-supplied HTTP transport.
//!
//! The client merges per-call options onto shared defaults, resolves urls
//! against a base url, picks the `Content-Type` header, runs request, response
//! and fail interceptors, unwraps the business field of successful responses
//! and keeps a loading tip visible for a minimum duration. Network I/O is left
//! to a [`HostTransport`]; [`ReqwestTransport`] is the bundled one.

pub mod clients;
pub mod config;
pub mod error;
pub mod request;

pub use clients::{
    LoadingIndicator, NoLoading,
    http::{
        HostTransport, ProgressCallback, ReqwestTransport, TransportRequest, TransportResponse,
        UploadProgress, UploadTask,
    },
};
pub use config::{CallConfig, ConfigPatch, ContentType, RequestConfig, content_type_header};
pub use error::{RequestError, Result};
pub use request::{CompletionHandlers, Interceptors, PendingResponse, RequestClient, RequestOptions};
