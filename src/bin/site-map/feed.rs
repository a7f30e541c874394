//! Background poller for the live marker feed.

use crate::constants::{FEED_POLL_INTERVAL, FEED_TIMEOUT, USER_AGENT};
use eframe::egui;
use site_map::feed::{FeedPayload, parse_payload};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed responded with {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid feed payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to start feed runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Debug)]
pub enum FeedUpdate {
    Payload(FeedPayload),
    Failed(String),
}

/// Polls the feed endpoint on a background thread.
///
/// Dropping the poller signals the worker, which exits without waiting for
/// its next tick or an in-flight request.
pub struct FeedPoller {
    url: String,
    rx: Receiver<FeedUpdate>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FeedPoller {
    pub fn spawn(url: String, ctx: egui::Context) -> Self {
        let (tx, rx) = mpsc::channel();
        let (shutdown, stop) = oneshot::channel();

        let worker_url = url.clone();
        thread::spawn(move || {
            if let Err(err) = run(&worker_url, &tx, &ctx, stop) {
                let _ = tx.send(FeedUpdate::Failed(err.to_string()));
                ctx.request_repaint();
            }
        });

        log::info!("Polling marker feed {url} every {FEED_POLL_INTERVAL:?}");
        Self {
            url,
            rx,
            shutdown: Some(shutdown),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the most recent pending update, if any.
    pub fn poll(&self) -> Option<FeedUpdate> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(update) => latest = Some(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Feed worker stopped");
                    break;
                }
            }
        }
        latest
    }
}

impl Drop for FeedPoller {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

fn run(
    url: &str,
    tx: &Sender<FeedUpdate>,
    ctx: &egui::Context,
    mut stop: oneshot::Receiver<()>,
) -> Result<(), FeedError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FEED_TIMEOUT)
        .build()?;

    runtime.block_on(async {
        let mut interval = tokio::time::interval(FEED_POLL_INTERVAL);
        loop {
            let result = tokio::select! {
                _ = &mut stop => None,
                result = async {
                    interval.tick().await;
                    fetch(&client, url).await
                } => Some(result),
            };
            let Some(result) = result else {
                log::debug!("Feed poller for {url} stopped");
                return Ok(());
            };

            let update = match result {
                Ok(payload) => FeedUpdate::Payload(payload),
                Err(err) => {
                    log::warn!("Feed fetch failed: {err}");
                    FeedUpdate::Failed(err.to_string())
                }
            };

            if tx.send(update).is_err() {
                log::debug!("Feed receiver dropped, stopping poller for {url}");
                return Ok(());
            }
            ctx.request_repaint();
        }
    })
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<FeedPayload, FeedError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FeedError::Status(response.status()));
    }

    let bytes = response.bytes().await?;
    Ok(parse_payload(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn worker_exits_promptly_when_stopped() {
        let (tx, rx) = mpsc::channel();
        let (shutdown, stop) = oneshot::channel();
        let (done_tx, done_rx) = mpsc::channel();

        thread::spawn(move || {
            let ctx = egui::Context::default();
            let result = run("http://127.0.0.1:9/", &tx, &ctx, stop);
            let _ = done_tx.send(result.is_ok());
        });

        let first = rx
            .recv_timeout(Duration::from_secs(15))
            .expect("first poll result");
        assert!(matches!(first, FeedUpdate::Failed(_)));

        let stopped_at = Instant::now();
        let _ = shutdown.send(());
        let clean = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker should stop well before its next tick");
        assert!(clean);
        assert!(stopped_at.elapsed() < FEED_POLL_INTERVAL);
        drop(rx);
    }

    #[test]
    fn dropping_the_poller_signals_the_worker() {
        let (_tx, rx) = mpsc::channel();
        let (shutdown, mut stop) = oneshot::channel();
        let poller = FeedPoller {
            url: "http://127.0.0.1:9/".to_string(),
            rx,
            shutdown: Some(shutdown),
        };

        assert!(stop.try_recv().is_err());
        drop(poller);
        assert_eq!(stop.try_recv(), Ok(()));
    }
}
