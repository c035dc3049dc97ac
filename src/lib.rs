pub mod cli;
pub mod config;
pub mod core;
pub mod utils;

pub use crate::core::{
    AnalysisResult, ApiClient, Backend, ClientError, DownloadRequest, DownloadResponse,
    ProgressSubscription, ProgressUpdate, StreamFormat, SubscriptionEvent, SubscriptionOptions,
    TaskStatus,
};
