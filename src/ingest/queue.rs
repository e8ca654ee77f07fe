use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tracing::{info, warn};

use crate::app::{Result, TributaryError};

/// Work handed to the background queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Fetch and extract the content of a stored article.
    FetchArticle { article_id: String },
}

/// Deferred task execution. Tasks run at least once, somewhere else.
pub trait TaskQueue: Send + Sync {
    fn enqueue(&self, task: Task, delay: Duration) -> Result<()>;
}

/// Executes tasks pulled off the queue.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: Task) -> Result<()>;
}

/// Message type for the background queue
#[derive(Debug)]
pub enum QueueMessage {
    /// Run a task whose delay has elapsed; the guard travels with it
    Run { task: Task, guard: PendingGuard },
    /// Stop accepting work
    Shutdown,
}

#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

impl Pending {
    fn start(self: &Arc<Self>) -> PendingGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        PendingGuard(self.clone())
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks one task finished when dropped, however it ended.
pub struct PendingGuard(Arc<Pending>);

impl std::fmt::Debug for PendingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PendingGuard")
            .field(&self.0.count.load(Ordering::SeqCst))
            .finish()
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Handle to send tasks to the background queue
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<QueueMessage>,
    pending: Arc<Pending>,
}

impl QueueHandle {
    /// Tasks enqueued but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.count.load(Ordering::SeqCst)
    }

    /// Resolves once every enqueued task has finished.
    pub async fn wait_idle(&self) {
        self.pending.wait_idle().await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Shutdown the background queue
    pub fn shutdown(&self) {
        let _ = self.tx.send(QueueMessage::Shutdown);
    }
}

impl TaskQueue for QueueHandle {
    fn enqueue(&self, task: Task, delay: Duration) -> Result<()> {
        if self.tx.is_closed() {
            return Err(TributaryError::Queue("background queue has shut down".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TributaryError::Queue(e.to_string()))?;

        let guard = self.pending.start();
        let tx = self.tx.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(mpsc::error::SendError(msg)) = tx.send(QueueMessage::Run { task, guard }) {
                warn!("Dropping task, queue closed: {:?}", msg);
            }
        });

        Ok(())
    }
}

/// Background worker running delayed tasks as they come due
pub struct BackgroundQueue {
    runner: Arc<dyn TaskRunner>,
    rx: mpsc::UnboundedReceiver<QueueMessage>,
}

impl BackgroundQueue {
    /// Create a new background queue and return a handle to communicate with it
    pub fn new(runner: Arc<dyn TaskRunner>) -> (Self, QueueHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Pending::default());
        let handle = QueueHandle { tx, pending };
        let queue = Self { runner, rx };
        (queue, handle)
    }

    /// Run the worker loop; each due task runs on its own tokio task.
    pub async fn run(mut self) {
        info!("Background queue started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                QueueMessage::Run { task, guard } => {
                    let runner = self.runner.clone();
                    tokio::spawn(async move {
                        if let Err(e) = runner.run(task.clone()).await {
                            warn!("Task {:?} failed: {}", task, e);
                        }
                        drop(guard);
                    });
                }
                QueueMessage::Shutdown => {
                    info!("Background queue shutting down");
                    break;
                }
            }
        }

        self.rx.close();
        while let Ok(msg) = self.rx.try_recv() {
            if let QueueMessage::Run { task, .. } = msg {
                warn!("Dropping task at shutdown: {:?}", task);
            }
        }
    }
}

/// Spawn the background queue as a tokio task
pub fn spawn_background_queue(runner: Arc<dyn TaskRunner>) -> QueueHandle {
    let (queue, handle) = BackgroundQueue::new(runner);

    tokio::spawn(async move {
        queue.run().await;
    });

    handle
}
