/// Loading tip controls supplied by the embedding environment.
pub trait LoadingIndicator: Send + Sync {
    fn show_loading(&self, title: &str);
    fn hide_loading(&self);
}

/// Used when the environment has nothing to show.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLoading;

impl LoadingIndicator for NoLoading {
    fn show_loading(&self, _title: &str) {}

    fn hide_loading(&self) {}
}
