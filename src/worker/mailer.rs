//! In-process mail queue
//!
//! Jobs go through a bounded mpsc channel drained by a fixed pool of worker
//! tasks. A failed delivery is retried up to `max_attempts` times with
//! exponential backoff, then dropped with an error log. Delivery itself goes
//! through a `MailBackend`: an HTTP relay in production, the log in dev.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::types::{LyceumError, Result};

/// An outgoing email
#[derive(Debug, Clone, Serialize)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery backend
#[async_trait]
pub trait MailBackend: Send + Sync {
    async fn send(&self, from: &str, job: &EmailJob) -> Result<()>;
}

/// Delivers mail by POSTing JSON to an HTTP relay
pub struct HttpRelayBackend {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpRelayBackend {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl MailBackend for HttpRelayBackend {
    async fn send(&self, from: &str, job: &EmailJob) -> Result<()> {
        #[derive(Serialize)]
        struct RelayRequest<'a> {
            from: &'a str,
            to: &'a str,
            subject: &'a str,
            body: &'a str,
        }

        let mut req = self.http.post(&self.api_url).json(&RelayRequest {
            from,
            to: &job.to,
            subject: &job.subject,
            body: &job.body,
        });
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(LyceumError::Mail(format!(
                "Mail relay returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Dev backend: writes the mail to the log instead of sending it
pub struct LogBackend;

#[async_trait]
impl MailBackend for LogBackend {
    async fn send(&self, from: &str, job: &EmailJob) -> Result<()> {
        info!(
            from = %from,
            to = %job.to,
            subject = %job.subject,
            body = %job.body,
            "Mail (log backend)"
        );
        Ok(())
    }
}

/// Configuration for the mail queue
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub worker_count: usize,
    pub from: String,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub max_queue_size: usize,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            from: "no-reply@lyceum.local".into(),
            max_attempts: 5,
            backoff_base_ms: 500,
            max_queue_size: 256,
        }
    }
}

/// Backoff before retry `attempt` (1-based, after the first failure)
pub fn backoff_delay(config: &MailerConfig, attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(config.backoff_base_ms.saturating_mul(factor))
}

/// Handle to the running mail queue
#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<EmailJob>,
}

impl MailQueue {
    /// Start the queue and its worker tasks
    pub fn start(config: MailerConfig, backend: Arc<dyn MailBackend>) -> Self {
        let (tx, rx) = mpsc::channel::<EmailJob>(config.max_queue_size);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        for i in 0..config.worker_count.max(1) {
            let rx = Arc::clone(&rx);
            let backend = Arc::clone(&backend);
            let config = config.clone();
            tokio::spawn(async move {
                worker_task(i, config, backend, rx).await;
            });
        }

        info!("Mail queue started with {} workers", config.worker_count.max(1));
        Self { tx }
    }

    /// Enqueue a job; fails fast when the queue is full
    pub fn enqueue(&self, job: EmailJob) -> Result<()> {
        self.tx
            .try_send(job)
            .map_err(|e| LyceumError::Mail(format!("Mail queue unavailable: {}", e)))
    }
}

async fn worker_task(
    worker_id: usize,
    config: MailerConfig,
    backend: Arc<dyn MailBackend>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<EmailJob>>>,
) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            // Channel closed, queue is shutting down
            return;
        };

        let mut attempt = 1u32;
        loop {
            match backend.send(&config.from, &job).await {
                Ok(()) => break,
                Err(e) if attempt < config.max_attempts => {
                    let delay = backoff_delay(&config, attempt);
                    warn!(
                        worker = worker_id,
                        to = %job.to,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Mail delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        worker = worker_id,
                        to = %job.to,
                        attempts = attempt,
                        error = %e,
                        "Mail delivery failed permanently, dropping job"
                    );
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct RecordingBackend {
        calls: AtomicU32,
        fail_first: u32,
        delivered: tokio::sync::Mutex<Vec<EmailJob>>,
    }

    impl RecordingBackend {
        fn new(fail_first: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
                delivered: tokio::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MailBackend for RecordingBackend {
        async fn send(&self, _from: &str, job: &EmailJob) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                return Err(LyceumError::Mail("transient".into()));
            }
            self.delivered.lock().await.push(job.clone());
            Ok(())
        }
    }

    fn job() -> EmailJob {
        EmailJob {
            to: "learner@example.com".into(),
            subject: "Your verification code".into(),
            body: "123456".into(),
        }
    }

    #[test]
    fn test_backoff_schedule_doubles() {
        let config = MailerConfig {
            backoff_base_ms: 500,
            ..Default::default()
        };
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&config, 4), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_delivers_job() {
        let backend = Arc::new(RecordingBackend::new(0));
        let queue = MailQueue::start(
            MailerConfig {
                worker_count: 1,
                backoff_base_ms: 1,
                ..Default::default()
            },
            Arc::clone(&backend) as Arc<dyn MailBackend>,
        );

        queue.enqueue(job()).unwrap();

        // Wait for the worker to drain the queue
        for _ in 0..100 {
            if !backend.delivered.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let delivered = backend.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].to, "learner@example.com");
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        // Fails twice, succeeds on the third attempt
        let backend = Arc::new(RecordingBackend::new(2));
        let queue = MailQueue::start(
            MailerConfig {
                worker_count: 1,
                backoff_base_ms: 1,
                ..Default::default()
            },
            Arc::clone(&backend) as Arc<dyn MailBackend>,
        );

        queue.enqueue(job()).unwrap();

        for _ in 0..100 {
            if !backend.delivered.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(backend.delivered.lock().await.len(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let backend = Arc::new(RecordingBackend::new(u32::MAX));
        let queue = MailQueue::start(
            MailerConfig {
                worker_count: 1,
                max_attempts: 3,
                backoff_base_ms: 1,
                ..Default::default()
            },
            Arc::clone(&backend) as Arc<dyn MailBackend>,
        );

        queue.enqueue(job()).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert!(backend.delivered.lock().await.is_empty());
    }
}
