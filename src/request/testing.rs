//! In-memory host doubles for pipeline tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use super::CompletionHandlers;
use crate::clients::{
    LoadingIndicator,
    http::{HostTransport, ProgressCallback, TransportRequest, UploadProgress, UploadTask},
};

#[derive(Default)]
pub struct RecordingIndicator {
    titles: Mutex<Vec<String>>,
    hides: AtomicUsize,
}

impl RecordingIndicator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

impl LoadingIndicator for RecordingIndicator {
    fn show_loading(&self, title: &str) {
        self.titles.lock().unwrap().push(title.to_string());
    }

    fn hide_loading(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatched {
    Request,
    Upload,
}

/// Keeps every dispatched call so the test decides how it ends.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<(Dispatched, TransportRequest, CompletionHandlers)>>,
    progress: Arc<Mutex<Vec<ProgressCallback>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn take(&self) -> (Dispatched, TransportRequest, CompletionHandlers) {
        self.calls.lock().unwrap().remove(0)
    }

    pub fn report_progress(&self, sent: u64, total: u64) {
        let progress = UploadProgress::new(sent, total);
        for callback in self.progress.lock().unwrap().iter() {
            callback(&progress);
        }
    }
}

struct RecordingUploadTask {
    progress: Arc<Mutex<Vec<ProgressCallback>>>,
}

impl UploadTask for RecordingUploadTask {
    fn on_progress_update(&self, callback: ProgressCallback) {
        self.progress.lock().unwrap().push(callback);
    }
}

impl HostTransport for RecordingTransport {
    fn request(&self, request: TransportRequest, handlers: CompletionHandlers) {
        self.calls
            .lock()
            .unwrap()
            .push((Dispatched::Request, request, handlers));
    }

    fn upload_file(
        &self,
        request: TransportRequest,
        handlers: CompletionHandlers,
    ) -> Box<dyn UploadTask> {
        self.calls
            .lock()
            .unwrap()
            .push((Dispatched::Upload, request, handlers));
        Box::new(RecordingUploadTask {
            progress: Arc::clone(&self.progress),
        })
    }
}
