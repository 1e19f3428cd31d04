pub mod async_client;
mod client;
mod request;
mod response;

pub use async_client::ReqwestTransport;
pub use client::{HostTransport, ProgressCallback, UploadProgress, UploadTask};
pub use request::TransportRequest;
pub use response::{CANCELED_ERR_MSG, TransportResponse};
