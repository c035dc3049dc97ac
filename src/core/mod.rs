pub mod client;
pub mod models;
pub mod progress;
pub mod sse;

pub use client::{ApiClient, Backend, ClientError};
pub use models::{
    AnalysisResult, AnalyzeRequest, DownloadRequest, DownloadResponse, ProgressUpdate,
    StreamFormat, TaskStatus,
};
pub use progress::{CloseReason, ProgressSubscription, SubscriptionEvent, SubscriptionOptions};
pub use sse::{decode_progress_frame, DecodeError, FrameAssembler, SseFrame};
