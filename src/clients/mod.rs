pub mod http;
mod loading;

pub use loading::{LoadingIndicator, NoLoading};
