// THEORY:
// A single analysis is a synchronous, single-pass computation and stays that
// way. What *can* run concurrently is the analysis of separate images, since no
// state is shared between them. `BatchAnalyzer` provides that: a fixed pool of
// worker tasks fed round-robin by a dispatcher, each worker running the plain
// `analyze_image` on one image at a time and answering through a oneshot
// channel. Results of a batch are returned in submission order.

use crate::error::InvalidImageError;
use crate::pipeline::{AnalysisReport, analyze_image};
use futures::future::join_all;
use image::DynamicImage;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Failure of a batched analysis.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Image(#[from] InvalidImageError),
    #[error("worker pool is no longer accepting images")]
    WorkerUnavailable,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of worker tasks. Zero is treated as one.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
        }
    }
}

struct ImageTask {
    image: DynamicImage,
    result_sender: oneshot::Sender<Result<AnalysisReport, InvalidImageError>>,
}

/// Distributes whole-image analyses across a pool of tokio tasks.
pub struct BatchAnalyzer {
    task_sender: mpsc::UnboundedSender<ImageTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl BatchAnalyzer {
    /// Spawns the dispatcher and workers on the current tokio runtime.
    pub fn new(config: BatchConfig) -> Self {
        let worker_count = config.workers.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<ImageTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<ImageTask>())
            .unzip();

        let mut workers = Vec::with_capacity(worker_count + 1);

        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        }));

        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let outcome = analyze_image(&task.image);
                    if let Err(error) = &outcome {
                        tracing::warn!(worker_id, %error, "image rejected");
                    }
                    let _ = task.result_sender.send(outcome);
                }
            }));
        }

        tracing::debug!(workers = worker_count, "batch analyzer started");

        Self {
            task_sender,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len() - 1
    }

    /// Analyses one image on the pool.
    pub async fn analyze(&self, image: DynamicImage) -> Result<AnalysisReport, BatchError> {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(ImageTask {
                image,
                result_sender,
            })
            .map_err(|_| BatchError::WorkerUnavailable)?;

        let outcome = result_receiver
            .await
            .map_err(|_| BatchError::WorkerUnavailable)?;
        Ok(outcome?)
    }

    /// Analyses every image, returning results in the order given.
    pub async fn analyze_all(
        &self,
        images: Vec<DynamicImage>,
    ) -> Vec<Result<AnalysisReport, BatchError>> {
        join_all(images.into_iter().map(|image| self.analyze(image))).await
    }
}
