use crate::error::ApiError;
use detector::{DecodeError, Detector, InferenceBackend, Prediction, decode_base64, decode_image};
use image::RgbImage;
use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tokio::sync::oneshot;
use tracing::Span;

/// Raw image as received over HTTP. Decoding happens on the worker.
#[derive(Debug)]
pub enum ImagePayload {
    Bytes(Vec<u8>),
    Base64(String),
}

impl ImagePayload {
    fn decode(&self) -> Result<RgbImage, DecodeError> {
        match self {
            ImagePayload::Bytes(bytes) => decode_image(bytes),
            ImagePayload::Base64(text) => decode_base64(text),
        }
    }
}

type JobResult = Result<Vec<Prediction>, ApiError>;

struct Job {
    payload: ImagePayload,
    span: Span,
    reply: oneshot::Sender<JobResult>,
}

/// Fixed set of worker threads, each owning its own independently loaded
/// detector. A worker handles one image at a time; jobs queue on a shared
/// channel until a worker is free.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn<B>(detectors: Vec<Detector<B>>) -> anyhow::Result<Self>
    where
        B: InferenceBackend + Send + 'static,
    {
        if detectors.is_empty() {
            anyhow::bail!("Worker pool needs at least one detector");
        }

        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();

        let mut workers = Vec::with_capacity(detectors.len());
        for (id, detector) in detectors.into_iter().enumerate() {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("detector-{}", id))
                .spawn(move || run_worker(id, detector, receiver))?;
            workers.push(handle);
        }

        tracing::info!(workers = workers.len(), "Worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Decode and run detection on the next free worker.
    pub async fn detect(&self, payload: ImagePayload) -> JobResult {
        let (reply, response) = oneshot::channel();
        let job = Job {
            payload,
            span: Span::current(),
            reply,
        };

        self.sender
            .as_ref()
            .ok_or(ApiError::WorkerUnavailable)?
            .send(job)
            .map_err(|_| ApiError::WorkerUnavailable)?;

        response.await.map_err(|_| ApiError::WorkerUnavailable)?
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel lets idle workers exit
        drop(self.sender.take());

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Worker thread panicked during shutdown");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

fn run_worker<B: InferenceBackend>(
    id: usize,
    mut detector: Detector<B>,
    receiver: Receiver<Job>,
) {
    tracing::debug!(worker = id, "Worker ready");

    // Ends once the pool drops its sender and the queue drains
    while let Ok(job) = receiver.recv() {
        let span = tracing::info_span!(parent: &job.span, "worker_detect", worker = id);
        let result = span.in_scope(|| process(&mut detector, &job.payload));

        // The requester may have gone away; nothing to do then.
        let _ = job.reply.send(result);
    }

    tracing::debug!(worker = id, "Worker exiting");
}

fn process<B: InferenceBackend>(detector: &mut Detector<B>, payload: &ImagePayload) -> JobResult {
    let image = payload.decode()?;

    match panic::catch_unwind(AssertUnwindSafe(|| detector.detect(&image))) {
        Ok(Ok(predictions)) => Ok(predictions),
        Ok(Err(e)) => Err(ApiError::Inference(e.to_string())),
        Err(panic) => Err(ApiError::Inference(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("Inference panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("Inference panicked: {}", message)
    } else {
        "Inference panicked".to_string()
    }
}
