//! Debounced progress writes.
//!
//! Activities report progress on nearly every interaction. [`ProgressBuffer`]
//! merges those patches per lesson and sends one write after the lesson has
//! been quiet for the debounce window, or immediately on an explicit flush.
//!
//! The buffer is a handle to a worker task. The worker owns all pending state
//! and the only timer; handles talk to it over a channel. Sends are spawned,
//! so a slow server never delays later saves. A failed send is logged and
//! dropped: the next save for that lesson carries the newer state anyway.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};
use tracing::{Instrument, debug, info_span, warn};

use super::{ProgressError, ProgressPatch, ProgressSink};
use crate::Result;

/// Quiet period after the last save before a lesson is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

const COMMAND_CAPACITY: usize = 100;

#[derive(Debug)]
enum BufferCommand {
    Save {
        lesson_id: i64,
        patch: ProgressPatch,
    },
    Flush {
        lesson_id: i64,
        done: Option<oneshot::Sender<()>>,
    },
    FlushAll {
        done: oneshot::Sender<()>,
    },
    Pending {
        response: oneshot::Sender<Vec<i64>>,
    },
}

/// Caller-side write coalescer for progress patches.
///
/// Cheap to clone; clones share one worker. When the last handle is dropped
/// the worker sends everything still pending and exits. Must be created
/// inside a tokio runtime.
#[derive(Clone, Debug)]
pub struct ProgressBuffer {
    commands: mpsc::Sender<BufferCommand>,
}

impl ProgressBuffer {
    /// Create a buffer with the default two second debounce window.
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self::with_window(sink, DEFAULT_DEBOUNCE)
    }

    pub fn with_window(sink: Arc<dyn ProgressSink>, window: Duration) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        let worker = BufferWorker {
            sink,
            window,
            pending: HashMap::new(),
            commands: rx,
        };
        tokio::spawn(worker.run());
        Self { commands }
    }

    async fn send(&self, command: BufferCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ProgressError::BufferClosed.into())
    }

    /// Merge `patch` into the lesson's pending write and restart its timer.
    pub async fn save(&self, lesson_id: i64, patch: ProgressPatch) -> Result<()> {
        self.send(BufferCommand::Save { lesson_id, patch }).await
    }

    /// Send the lesson's pending write now. No-op if nothing is pending.
    ///
    /// Returns once the write has been handed to the sink, not once the sink
    /// has finished with it.
    pub async fn flush(&self, lesson_id: i64) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.send(BufferCommand::Flush {
            lesson_id,
            done: Some(done),
        })
        .await?;
        wait.await.map_err(|_| ProgressError::BufferClosed.into())
    }

    /// Non-blocking flush request for contexts that cannot await, such as `Drop`.
    ///
    /// Returns false if the request could not be queued.
    pub fn request_flush(&self, lesson_id: i64) -> bool {
        self.commands
            .try_send(BufferCommand::Flush {
                lesson_id,
                done: None,
            })
            .is_ok()
    }

    /// Send every pending write now.
    pub async fn flush_all(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.send(BufferCommand::FlushAll { done }).await?;
        wait.await.map_err(|_| ProgressError::BufferClosed.into())
    }

    /// Lessons with a write waiting for its timer, in ascending order.
    pub async fn pending_lessons(&self) -> Result<Vec<i64>> {
        let (response, wait) = oneshot::channel();
        self.send(BufferCommand::Pending { response }).await?;
        wait.await.map_err(|_| ProgressError::BufferClosed.into())
    }
}

#[derive(Debug)]
struct PendingWrite {
    patch: ProgressPatch,
    deadline: Instant,
}

struct BufferWorker {
    sink: Arc<dyn ProgressSink>,
    window: Duration,
    pending: HashMap<i64, PendingWrite>,
    commands: mpsc::Receiver<BufferCommand>,
}

impl BufferWorker {
    async fn run(mut self) {
        async move {
            debug!(window_ms = self.window.as_millis() as u64, "Starting progress buffer");
            loop {
                let next_deadline = self.pending.values().map(|p| p.deadline).min();
                let timer = async {
                    match next_deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => std::future::pending().await,
                    }
                };

                tokio::select! {
                    command = self.commands.recv() => match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            // Every handle is gone; nobody is left to flush.
                            self.flush_all();
                            debug!("Progress buffer shutting down");
                            break;
                        }
                    },
                    _ = timer => self.flush_due(Instant::now()),
                }
            }
        }
        .instrument(info_span!("progress_buffer"))
        .await
    }

    fn handle_command(&mut self, command: BufferCommand) {
        match command {
            BufferCommand::Save { lesson_id, patch } => {
                let deadline = Instant::now() + self.window;
                match self.pending.entry(lesson_id) {
                    Entry::Occupied(mut entry) => {
                        let pending = entry.get_mut();
                        pending.patch.merge(patch);
                        pending.deadline = deadline;
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(PendingWrite { patch, deadline });
                    }
                }
            }
            BufferCommand::Flush { lesson_id, done } => {
                self.flush(lesson_id);
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            BufferCommand::FlushAll { done } => {
                self.flush_all();
                let _ = done.send(());
            }
            BufferCommand::Pending { response } => {
                let mut lessons: Vec<i64> = self.pending.keys().copied().collect();
                lessons.sort_unstable();
                let _ = response.send(lessons);
            }
        }
    }

    fn flush_due(&mut self, now: Instant) {
        let due: Vec<i64> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(lesson_id, _)| *lesson_id)
            .collect();
        for lesson_id in due {
            self.flush(lesson_id);
        }
    }

    fn flush_all(&mut self) {
        let lessons: Vec<i64> = self.pending.keys().copied().collect();
        for lesson_id in lessons {
            self.flush(lesson_id);
        }
    }

    /// Remove the lesson's pending write and hand it to the sink.
    fn flush(&mut self, lesson_id: i64) {
        let Some(pending) = self.pending.remove(&lesson_id) else {
            return;
        };

        let sink = Arc::clone(&self.sink);
        tokio::spawn(
            async move {
                if let Err(e) = sink.send(lesson_id, pending.patch).await {
                    warn!(error = %e, "Failed to save progress");
                }
            }
            .instrument(info_span!("progress_flush", lesson_id)),
        );
    }
}
