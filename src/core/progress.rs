use crate::core::sse::{decode_progress_frame, FrameAssembler};
use crate::core::{ProgressUpdate, TaskStatus};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SubscriptionOptions {
    /// Fixed delay between reconnect attempts. No backoff growth.
    pub reconnect_delay: Duration,
    /// Cap on consecutive failed attempts; `None` retries forever.
    pub max_reconnects: Option<u32>,
    pub connect_timeout: Duration,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(3),
            max_reconnects: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum SubscriptionEvent {
    /// The stream opened (or reopened) successfully.
    Open,
    /// A decoded progress snapshot. Replaces the previous one entirely.
    Progress(ProgressUpdate),
    /// Transport dropped; a retry is scheduled after the fixed delay.
    Reconnecting { error: String, attempt: u32 },
    Closed(CloseReason),
}

#[derive(Debug)]
pub enum CloseReason {
    /// The task reported completed/failed/cancelled. Never resubscribed.
    Finished(TaskStatus),
    RetriesExhausted,
}

/// Owned handle to the one live progress stream. Holding the handle *is* the
/// subscription: dropping it (or calling `disconnect`) aborts the transport,
/// so replacing an old handle with a new one can never leak a connection.
pub struct ProgressSubscription {
    task_id: String,
    handle: tokio::task::JoinHandle<()>,
    events: mpsc::UnboundedReceiver<SubscriptionEvent>,
}

impl ProgressSubscription {
    pub fn connect(events_url: String, task_id: String, options: SubscriptionOptions) -> Self {
        // Deliberately no whole-request timeout: that clock keeps running
        // while the body streams and would cut a long-lived SSE connection.
        let client = reqwest::Client::builder()
            .user_agent(format!("kick-dvr/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(options.connect_timeout)
            .build()
            .expect("Failed to create HTTP client");

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_subscription(client, events_url, options, tx));

        Self {
            task_id,
            handle,
            events: rx,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Next lifecycle event, or `None` once the stream has closed.
    pub async fn next_event(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }

    /// Explicit teardown. Equivalent to dropping the handle.
    pub fn disconnect(self) {}
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

enum StreamEnd {
    Terminal(TaskStatus),
    Transport(String),
}

async fn run_subscription(
    client: reqwest::Client,
    url: String,
    options: SubscriptionOptions,
    tx: mpsc::UnboundedSender<SubscriptionEvent>,
) {
    let mut attempt: u32 = 0;

    loop {
        let error = match open_stream(&client, &url).await {
            Ok(response) => {
                if tx.send(SubscriptionEvent::Open).is_err() {
                    return;
                }
                attempt = 0;

                match consume_stream(response, &tx).await {
                    StreamEnd::Terminal(status) => {
                        let _ = tx.send(SubscriptionEvent::Closed(CloseReason::Finished(status)));
                        return;
                    }
                    StreamEnd::Transport(error) => error,
                }
            }
            Err(error) => error,
        };

        attempt += 1;
        if let Some(max) = options.max_reconnects {
            if attempt > max {
                warn!("Giving up on {} after {} attempts: {}", url, attempt, error);
                let _ = tx.send(SubscriptionEvent::Closed(CloseReason::RetriesExhausted));
                return;
            }
        }

        debug!("Stream dropped ({}), retrying in {:?}", error, options.reconnect_delay);
        if tx
            .send(SubscriptionEvent::Reconnecting { error, attempt })
            .is_err()
        {
            return;
        }
        tokio::time::sleep(options.reconnect_delay).await;
    }
}

async fn open_stream(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, String> {
    let response = client
        .get(url)
        .header("Accept", "text/event-stream")
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }
    Ok(response)
}

async fn consume_stream(
    response: reqwest::Response,
    tx: &mpsc::UnboundedSender<SubscriptionEvent>,
) -> StreamEnd {
    let mut assembler = FrameAssembler::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return StreamEnd::Transport(e.to_string()),
        };

        for frame in assembler.push_chunk(&chunk) {
            let update = match decode_progress_frame(&frame) {
                Ok(update) => update,
                Err(e) => {
                    // Keep the last good snapshot; a bad frame is not fatal.
                    warn!("Dropping undecodable progress frame: {}", e);
                    continue;
                }
            };

            let status = update.status;
            if tx.send(SubscriptionEvent::Progress(update)).is_err() {
                return StreamEnd::Transport("receiver dropped".to_string());
            }
            if status.is_terminal() {
                return StreamEnd::Terminal(status);
            }
        }
    }

    // Server closed the stream without a terminal status; treat like a drop
    // so the retry loop picks the task back up.
    StreamEnd::Transport("stream ended unexpectedly".to_string())
}
