use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel: String,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub formats: Vec<StreamFormat>,
    pub error: Option<String>,
}

impl AnalysisResult {
    /// The quality the UI pre-selects: the first format the backend offered,
    /// or "best" when it offered none.
    pub fn default_quality(&self) -> String {
        self.formats
            .first()
            .map(|f| f.format_id.clone())
            .unwrap_or_else(|| "best".to_string())
    }

    /// DVR capture is the sane default for live streams only.
    pub fn default_dvr(&self) -> bool {
        self.is_live
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFormat {
    pub format_id: String,
    pub resolution: String,
    pub label: String,
    pub fps: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: String,
    pub dvr_mode: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub output_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub task_id: String,
    #[serde(default)]
    pub message: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Downloading,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// completed/failed/cancelled end the task; the progress stream is never
    /// reopened after one of these.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub downloaded: String,
    #[serde(default)]
    pub eta: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}
