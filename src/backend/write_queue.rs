//! Serialized read-modify-write over a [`DocumentStore`].
//!
//! One worker task owns the store and pulls mutations off a channel,
//! so a mutation always loads a document that already contains the
//! result of every mutation enqueued before it. Replies travel back on
//! a oneshot channel per mutation. Each mutation runs in its own task,
//! so a panicking one fails only its own caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::backend::interface::{BackendError, DocumentStore, Result};
use crate::core::Document;

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

trait Job<S>: Send {
    fn run(self: Box<Self>, store: Arc<S>) -> JobFuture;
}

struct Pending<F, T> {
    mutation: F,
    reply: oneshot::Sender<Result<T>>,
}

impl<S, F, T> Job<S> for Pending<F, T>
where
    S: DocumentStore,
    F: FnOnce(&mut Document) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>, store: Arc<S>) -> JobFuture {
        Box::pin(async move {
            let Pending { mutation, reply } = *self;
            let task = tokio::spawn(async move { apply(store.as_ref(), mutation).await });
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(BackendError::MutationAborted(err.to_string())),
            };
            if let Err(err) = &result {
                log::error!("queued write failed: {}", err);
            }
            // nobody waiting any more, the write stands anyway
            let _ = reply.send(result);
        })
    }
}

async fn apply<S, F, T>(store: &S, mutation: F) -> Result<T>
where
    S: DocumentStore,
    F: FnOnce(&mut Document) -> Result<T>,
{
    let mut document = store.load().await?;
    let value = mutation(&mut document)?;
    store.persist(&document).await?;
    Ok(value)
}

/// Handle to the write queue of one store. Clones share the same worker.
pub struct WriteQueue<S> {
    store: Arc<S>,
    sender: mpsc::UnboundedSender<Box<dyn Job<S>>>,
}

impl<S> Clone for WriteQueue<S> {
    fn clone(&self) -> Self {
        WriteQueue { store: Arc::clone(&self.store), sender: self.sender.clone() }
    }
}

impl<S: DocumentStore> WriteQueue<S> {
    /// Spawns the worker on the current tokio runtime. The worker stops
    /// after the last handle is dropped and pending mutations are done.
    pub fn spawn(store: S) -> WriteQueue<S> {
        let store = Arc::new(store);
        let (sender, mut receiver) = mpsc::unbounded_channel::<Box<dyn Job<S>>>();

        let worker_store = Arc::clone(&store);
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job.run(Arc::clone(&worker_store)).await;
            }
            log::debug!("write queue drained, worker exiting");
        });

        WriteQueue { store, sender }
    }

    /// The store mutations run against, for reads outside the queue.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `mutation` on a freshly loaded document once every earlier
    /// mutation has settled. The document is persisted only when the
    /// mutation returns `Ok`; an error leaves the file untouched and the
    /// queue keeps going.
    pub async fn enqueue<F, T>(&self, mutation: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.sender.send(Box::new(Pending { mutation, reply }))
            .map_err(|_| BackendError::QueueClosed)?;
        log::debug!("write enqueued");

        response.await.map_err(|_| BackendError::QueueClosed)?
    }
}
