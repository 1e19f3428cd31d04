use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::TransportRequest;
use crate::request::CompletionHandlers;

/// The network primitives supplied by the embedding environment.
///
/// Both calls are fire-and-forget: the transport owns `handlers` and must
/// consume them with exactly one of [`CompletionHandlers::success`] or
/// [`CompletionHandlers::fail`], from whatever thread or task it likes. Every
/// HTTP response, whatever its status, goes to `success`; `fail` is for
/// requests that never produced a response.
pub trait HostTransport: Send + Sync {
    fn request(&self, request: TransportRequest, handlers: CompletionHandlers);

    fn upload_file(
        &self,
        request: TransportRequest,
        handlers: CompletionHandlers,
    ) -> Box<dyn UploadTask>;
}

pub type ProgressCallback = Arc<dyn Fn(&UploadProgress) + Send + Sync>;

/// Handle of an in-flight upload.
pub trait UploadTask: Send {
    fn on_progress_update(&self, callback: ProgressCallback);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    /// Percentage, 0 to 100.
    pub progress: u8,
    pub total_bytes_sent: u64,
    pub total_bytes_expected_to_send: u64,
}

impl UploadProgress {
    pub fn new(total_bytes_sent: u64, total_bytes_expected_to_send: u64) -> Self {
        let progress = if total_bytes_expected_to_send == 0 {
            100
        } else {
            (total_bytes_sent.min(total_bytes_expected_to_send) * 100
                / total_bytes_expected_to_send) as u8
        };
        Self {
            progress,
            total_bytes_sent,
            total_bytes_expected_to_send,
        }
    }
}

#[test]
fn test_upload_progress_percentage() {
    assert_eq!(UploadProgress::new(0, 200).progress, 0);
    assert_eq!(UploadProgress::new(50, 200).progress, 25);
    assert_eq!(UploadProgress::new(200, 200).progress, 100);
    assert_eq!(UploadProgress::new(0, 0).progress, 100);
}
