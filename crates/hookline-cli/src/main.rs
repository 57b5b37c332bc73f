#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;

use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, bail};
use hookline_webhook::reqwest::ReqwestClient;
use hookline_webhook::{SendOutcome, Webhook};
use tokio::sync::Notify;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_SEND: &str = "hookline_cli::send";
pub const TRACING_TARGET_CONFIG: &str = "hookline_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SEND,
            error = format!("{error:#}"),
            "message was not delivered"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing();
    cli.log();

    cli.webhook
        .validate()
        .context("invalid webhook configuration")?;

    let client = ReqwestClient::new(cli.http.clone()).context("failed to create HTTP client")?;
    let webhook = Webhook::new(cli.webhook.clone(), client);

    let drained = Arc::new(Notify::new());
    let notify = Arc::clone(&drained);
    webhook.on_queue_empty(move |_| notify.notify_one());

    let dropped = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&dropped);
    webhook.on_error_on_dequeue(move |error, _| {
        tracing::warn!(target: TRACING_TARGET_SEND, error = %error, "retry failed");
        counter.fetch_add(1, Ordering::SeqCst);
    });
    webhook.on_rate_limited(|retry_after| {
        tracing::info!(
            target: TRACING_TARGET_SEND,
            wait_ms = retry_after.wait.as_millis(),
            source = %retry_after.source,
            "rate limited, waiting to retry"
        );
    });

    let message = cli.message.to_message(&webhook);
    let outcome = webhook
        .send(message)
        .await
        .context("failed to send message")?;

    match outcome {
        SendOutcome::Sent => {}
        SendOutcome::Queued => {
            tokio::time::timeout(Duration::from_secs(cli.max_wait), drained.notified())
                .await
                .context("timed out waiting for the retry queue to drain")?;

            if dropped.load(Ordering::SeqCst) > 0 {
                bail!("queued message could not be delivered");
            }
        }
        SendOutcome::Error => bail!("delivery failed"),
    }

    tracing::info!(target: TRACING_TARGET_SEND, outcome = %outcome, "message delivered");
    Ok(())
}
