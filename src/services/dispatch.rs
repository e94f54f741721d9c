// src/services/dispatch.rs

//! Dispatch strategies for image downloads.
//!
//! The page scraper hands every image URL to a [`DispatchStrategy`] and
//! collects the returned [`FetchHandle`]s; it never knows whether the
//! downloads ran inline or on the worker pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{FetchConfig, ImageResult};
use crate::services::fetcher::ImageFetcher;

/// One image download request.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub url: String,
    pub output_dir: PathBuf,
    pub subdirectory: String,
}

/// Pending or finished outcome of a dispatched job.
#[derive(Debug)]
pub struct FetchHandle {
    url: String,
    state: HandleState,
}

#[derive(Debug)]
enum HandleState {
    Ready(ImageResult),
    Pending(oneshot::Receiver<ImageResult>),
}

impl FetchHandle {
    pub fn ready(result: ImageResult) -> Self {
        Self {
            url: result.source_url.clone(),
            state: HandleState::Ready(result),
        }
    }

    fn pending(url: String, rx: oneshot::Receiver<ImageResult>) -> Self {
        Self {
            url,
            state: HandleState::Pending(rx),
        }
    }

    /// Wait for the job's result.
    pub async fn resolve(self) -> ImageResult {
        match self.state {
            HandleState::Ready(result) => result,
            HandleState::Pending(rx) => rx.await.unwrap_or_else(|_| {
                ImageResult::fail(self.url, "[worker] worker exited before finishing the download")
            }),
        }
    }
}

/// How image downloads are executed.
#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    /// Submit a job. Inline strategies finish the job before returning.
    async fn dispatch(&self, job: FetchJob) -> Result<FetchHandle>;

    /// Stop accepting jobs and wait at most `drain` for outstanding ones.
    async fn shutdown(&mut self, drain: Duration);
}

/// Build the strategy for a worker count; zero means inline.
pub fn strategy_for(workers: usize, config: &FetchConfig) -> Result<Box<dyn DispatchStrategy>> {
    if workers == 0 {
        Ok(Box::new(InlineDispatch::new(ImageFetcher::new(config)?)))
    } else {
        Ok(Box::new(WorkerPool::start(workers, config)?))
    }
}

/// Downloads synchronously, in submission order, on the calling task.
pub struct InlineDispatch {
    fetcher: ImageFetcher,
}

impl InlineDispatch {
    pub fn new(fetcher: ImageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl DispatchStrategy for InlineDispatch {
    async fn dispatch(&self, job: FetchJob) -> Result<FetchHandle> {
        let result = self
            .fetcher
            .fetch(&job.url, &job.output_dir, &job.subdirectory, None)
            .await;
        Ok(FetchHandle::ready(result))
    }

    async fn shutdown(&mut self, _drain: Duration) {}
}

struct QueuedJob {
    job: FetchJob,
    reply: oneshot::Sender<ImageResult>,
}

/// Fixed-size pool of download workers.
///
/// Each worker owns its own HTTP client and tags the files it writes with
/// its index.
pub struct WorkerPool {
    sender: Option<mpsc::UnboundedSender<QueuedJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers. Must be called inside a tokio runtime.
    pub fn start(size: usize, config: &FetchConfig) -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel::<QueuedJob>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let fetcher = ImageFetcher::new(config)?;
            let receiver = Arc::clone(&receiver);
            workers.push(tokio::spawn(async move {
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(QueuedJob { job, reply }) = next else {
                        break;
                    };
                    let result = fetcher
                        .fetch(&job.url, &job.output_dir, &job.subdirectory, Some(id))
                        .await;
                    let _ = reply.send(result);
                }
                log::debug!("Download worker {id} stopped");
            }));
        }

        log::info!("Started {size} download workers");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

#[async_trait]
impl DispatchStrategy for WorkerPool {
    async fn dispatch(&self, job: FetchJob) -> Result<FetchHandle> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| AppError::session("worker pool is shut down"))?;
        let (reply, rx) = oneshot::channel();
        let url = job.url.clone();
        sender
            .send(QueuedJob { job, reply })
            .map_err(|_| AppError::session("worker pool is not accepting jobs"))?;
        Ok(FetchHandle::pending(url, rx))
    }

    async fn shutdown(&mut self, drain: Duration) {
        // Closing the channel lets idle workers exit once the queue is empty.
        self.sender.take();
        let workers = std::mem::take(&mut self.workers);
        let aborts: Vec<_> = workers.iter().map(JoinHandle::abort_handle).collect();

        if tokio::time::timeout(drain, join_all(workers)).await.is_err() {
            log::warn!(
                "Download workers did not finish within {}s, aborting",
                drain.as_secs()
            );
            for handle in aborts {
                handle.abort();
            }
        }
    }
}
