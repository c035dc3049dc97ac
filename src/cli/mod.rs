use crate::config::Config;
use crate::core::{
    ApiClient, Backend, CloseReason, DownloadRequest, ProgressSubscription, SubscriptionEvent,
    TaskStatus,
};
use crate::utils::{is_kick_url, is_vod_url, parse_clock_time, sanitize_filename};
use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "kick-dvr")]
#[command(about = "Download Kick.com live streams and VODs through a local backend")]
#[command(version)]
pub struct Cli {
    /// Kick.com channel or VOD URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Quality format id (defaults to the first format the backend offers)
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Capture a live stream from its earliest DVR point
    #[arg(long, overrides_with = "no_dvr")]
    pub dvr: bool,

    /// Capture from the live edge instead of the DVR buffer
    #[arg(long, overrides_with = "dvr")]
    pub no_dvr: bool,

    /// Clip start time
    #[arg(long, value_name = "HH:MM:SS")]
    pub start: Option<String>,

    /// Clip end time
    #[arg(long, value_name = "HH:MM:SS")]
    pub end: Option<String>,

    /// Output filename hint passed to the backend
    #[arg(short, long)]
    pub output_filename: Option<String>,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    pub api: Option<String>,

    /// Analyze the URL and exit without downloading
    #[arg(long)]
    pub analyze_only: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let mut config = Config::load()?;
        if let Some(api) = &self.api {
            config.api_base = api.clone();
        }

        // Advisory shape check: hint and keep going, the backend decides.
        if !is_kick_url(&self.url) {
            println!("Note: that does not look like a kick.com channel or VOD URL");
        }
        for (name, value) in [("start", &self.start), ("end", &self.end)] {
            if let Some(t) = value {
                if parse_clock_time(t).is_none() {
                    println!("Note: --{} {:?} is not HH:MM:SS; sending it as-is", name, t);
                }
            }
        }

        let client = ApiClient::new(&config.api_base, config.timeout)?;

        println!("Analyzing: {}", self.url);
        let analysis = client.analyze(&self.url).await?;

        println!("Title: {}", analysis.title);
        if !analysis.channel.is_empty() {
            println!("Channel: {}", analysis.channel);
        }
        println!("Type: {}", if analysis.is_live { "live stream" } else { "VOD" });
        if let Some(duration) = analysis.duration {
            println!("Duration: {}", format_duration(duration));
        }

        println!("Available formats: {}", analysis.formats.len());
        for (i, format) in analysis.formats.iter().enumerate() {
            println!(
                "  {}: {} - {} ({})",
                i + 1,
                format.format_id,
                format.resolution,
                format.label
            );
        }

        let quality = match &self.quality {
            Some(q) => q.clone(),
            None => analysis.default_quality(),
        };
        let dvr_mode = if self.dvr {
            true
        } else if self.no_dvr {
            false
        } else {
            analysis.default_dvr()
        };

        if self.analyze_only {
            return Ok(());
        }

        let request = DownloadRequest {
            url: self.url.clone(),
            quality: quality.clone(),
            dvr_mode,
            start_time: self.start.clone(),
            end_time: self.end.clone(),
            output_filename: self.output_filename.as_deref().map(sanitize_filename),
        };

        println!(
            "Starting download: quality={} dvr={}{}",
            quality,
            dvr_mode,
            if is_vod_url(&self.url) { " (vod)" } else { "" }
        );
        let response = client.start_download(&request).await?;
        if !response.message.is_empty() {
            println!("{}", response.message);
        }

        let subscription = ProgressSubscription::connect(
            client.events_url(&response.task_id),
            response.task_id.clone(),
            config.subscription_options(),
        );

        watch_progress(subscription).await
    }
}

async fn watch_progress(mut subscription: ProgressSubscription) -> Result<()> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        )
        .expect("valid template")
        .progress_chars("#>-"),
    );
    pb.set_message("Connecting...");

    let mut last_error: Option<String> = None;

    while let Some(event) = subscription.next_event().await {
        match event {
            SubscriptionEvent::Open => {
                pb.set_message("Connected");
            }
            SubscriptionEvent::Progress(update) => {
                pb.set_position(update.progress.clamp(0.0, 100.0) as u64);
                let mut msg = update.message.clone();
                if !update.speed.is_empty() {
                    msg.push_str(&format!(" [{}]", update.speed));
                }
                if !update.eta.is_empty() {
                    msg.push_str(&format!(" ETA {}", update.eta));
                }
                pb.set_message(msg);
                last_error = update.error.filter(|e| !e.is_empty());
            }
            SubscriptionEvent::Reconnecting { error, attempt } => {
                tracing::warn!("Progress stream dropped: {}", error);
                pb.set_message(format!("Reconnecting (attempt {})...", attempt));
            }
            SubscriptionEvent::Closed(reason) => {
                return match reason {
                    CloseReason::Finished(TaskStatus::Completed) => {
                        pb.finish_with_message("Download completed");
                        Ok(())
                    }
                    CloseReason::Finished(status) => {
                        pb.abandon_with_message(format!("Download {}", status));
                        match last_error {
                            Some(error) => anyhow::bail!("Download {}: {}", status, error),
                            None => anyhow::bail!("Download {}", status),
                        }
                    }
                    CloseReason::RetriesExhausted => {
                        pb.abandon_with_message("Lost connection to backend");
                        anyhow::bail!("Gave up reconnecting to the progress stream")
                    }
                };
            }
        }
    }

    pb.abandon_with_message("Progress stream closed");
    anyhow::bail!("Progress stream closed unexpectedly")
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
