// Batched dispatch loop — pending descriptors, retry cap, persistence, events.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatcher::Dispatcher;
use super::host::TaskHost;
use super::persist::{QueuePersistence, QueueSnapshot};
use crate::config::NetConfig;
use crate::error::FetchError;
use crate::request::{RequestDescriptor, RequestId};

/// Notifications emitted by the dispatch loop.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// One loop iteration finished: `attempted` descriptors were dispatched
    /// and `remaining` are still queued afterwards.
    BatchDispatched { attempted: usize, remaining: usize },
}

struct QueuedRequest {
    id: RequestId,
    attempts: u32,
    descriptor: RequestDescriptor,
}

/// FIFO queue of pending descriptors with a rate-limited batch dispatch loop.
///
/// Descriptors stay queued until their own attempt succeeds or the attempt
/// cap removes them; a failed attempt leaves the entry in place for the next
/// iteration. The loop exits naturally once the queue drains and does not
/// restart on `add` — call `start` again.
pub struct QueueEngine {
    config: NetConfig,
    dispatcher: Arc<Dispatcher>,
    host: Arc<TaskHost>,
    persistence: QueuePersistence,
    queue: Mutex<VecDeque<QueuedRequest>>,
    next_id: AtomicU64,
    running: AtomicBool,
    loop_token: Mutex<CancellationToken>,
    events: broadcast::Sender<QueueEvent>,
}

impl QueueEngine {
    pub fn new(
        config: NetConfig,
        dispatcher: Arc<Dispatcher>,
        host: Arc<TaskHost>,
        persist_root: &Path,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            config,
            dispatcher,
            host,
            persistence: QueuePersistence::new(persist_root),
            queue: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            running: AtomicBool::new(false),
            loop_token: Mutex::new(CancellationToken::new()),
            events,
        })
    }

    /// Append a descriptor and return the handle used for removal.
    pub fn add(&self, descriptor: impl Into<RequestDescriptor>) -> RequestId {
        let descriptor = descriptor.into();
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if self.config.debug_mode {
            debug!(%id, kind = descriptor.kind(), url = descriptor.url(), "queued");
        }
        self.queue.lock().push_back(QueuedRequest {
            id,
            attempts: 0,
            descriptor,
        });
        id
    }

    /// Remove the entry with the given handle. Returns whether it was found.
    pub fn remove(&self, id: RequestId) -> bool {
        let mut queue = self.queue.lock();
        match queue.iter().position(|entry| entry.id == id) {
            Some(pos) => {
                queue.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn count(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to batch notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Begin the dispatch loop. Idempotent: a second call while the loop is
    /// running is a no-op, so a batch is never dispatched twice.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("dispatch loop already running");
            return;
        }

        let token = self.host.child_token();
        *self.loop_token.lock() = token.clone();

        let engine = Arc::clone(self);
        self.host.spawn(async move {
            engine.run_loop(token).await;
            engine.running.store(false, Ordering::SeqCst);
        });
    }

    /// Halt future loop iterations. Dispatches already in flight run to
    /// completion and still settle against the queue.
    pub fn stop(&self) {
        self.loop_token.lock().cancel();
    }

    /// Persist the current queue. Returns `false` (and deletes any stale
    /// file) when the queue is empty.
    pub fn save_queue(&self) -> bool {
        let snapshot = {
            let queue = self.queue.lock();
            QueueSnapshot::from_descriptors(queue.iter().map(|entry| &entry.descriptor))
        };
        if snapshot.is_empty() {
            self.persistence.clear();
            return false;
        }
        match self.persistence.save(&snapshot) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "failed to persist queue");
                false
            }
        }
    }

    /// Reload a persisted queue, re-adding every descriptor. Returns `false`
    /// when no file exists or it holds no entries — the expected empty state,
    /// not an error.
    pub fn load_queue(&self) -> bool {
        let Some(snapshot) = self.persistence.load() else {
            return false;
        };
        if snapshot.is_empty() {
            return false;
        }
        let descriptors = snapshot.into_descriptors();
        let count = descriptors.len();
        for descriptor in descriptors {
            self.add(descriptor);
        }
        info!(count, "queue reloaded from disk");
        true
    }

    async fn run_loop(&self, token: CancellationToken) {
        let interval = Duration::from_secs_f32(self.config.queue_requests_interval);
        loop {
            if token.is_cancelled() {
                debug!("dispatch loop cancelled");
                break;
            }

            // Snapshot, not a destructive pop: entries stay queued until
            // their own completion settles them.
            let batch: Vec<(RequestId, RequestDescriptor)> = {
                let queue = self.queue.lock();
                queue
                    .iter()
                    .take(self.config.max_request_queue)
                    .map(|entry| (entry.id, entry.descriptor.clone()))
                    .collect()
            };
            if batch.is_empty() {
                debug!("queue empty, dispatch loop exiting");
                break;
            }

            let attempted = batch.len();
            if self.config.debug_mode {
                debug!(attempted, "dispatching batch");
            }

            // Dispatch in queue order; attempts run concurrently and the
            // loop waits for the whole batch to settle, bounding in-flight
            // work at the batch size.
            let mut handles = Vec::with_capacity(attempted);
            for (id, descriptor) in batch {
                let dispatcher = Arc::clone(&self.dispatcher);
                handles.push(self.host.spawn(async move {
                    let outcome = dispatcher.dispatch(&descriptor).await;
                    (id, outcome.is_success())
                }));
            }
            for handle in handles {
                match handle.await {
                    Ok((id, success)) => self.settle(id, success),
                    Err(err) => warn!(%err, "dispatch task failed to join"),
                }
            }

            if self.config.save_queue_between_sessions {
                let _ = self.save_queue();
            }

            let remaining = self.count();
            let _ = self.events.send(QueueEvent::BatchDispatched {
                attempted,
                remaining,
            });

            if remaining == 0 {
                debug!("queue drained");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = token.cancelled() => {
                    debug!("dispatch loop cancelled during interval");
                    break;
                }
            }
        }
    }

    /// Apply one attempt's terminal outcome: success removes the entry,
    /// failure bumps its attempt count and enforces the configured cap.
    fn settle(&self, id: RequestId, success: bool) {
        let mut exhausted: Option<RequestDescriptor> = None;
        {
            let mut queue = self.queue.lock();
            let Some(pos) = queue.iter().position(|entry| entry.id == id) else {
                // Removed by the caller while in flight.
                return;
            };
            if success {
                queue.remove(pos);
            } else if let Some(entry) = queue.get_mut(pos) {
                entry.attempts += 1;
                if entry.attempts >= self.config.queue_max_attempts {
                    exhausted = queue.remove(pos).map(|entry| entry.descriptor);
                }
            }
        }

        if let Some(descriptor) = exhausted {
            let err = FetchError::MaxAttemptsExceeded {
                url: descriptor.url().to_string(),
            };
            warn!(url = descriptor.url(), "giving up after max attempts");
            descriptor.callbacks().error(err.to_string());
        }
    }
}
