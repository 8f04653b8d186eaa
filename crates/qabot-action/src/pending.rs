//! Pending action store.
//!
//! Drafts built from inline queries wait here until the author confirms or
//! dismisses them. A single owner task holds the map; every caller talks to
//! it through a bounded mailbox and waits on a oneshot reply, so no two
//! operations on the map ever run at the same time. A periodic sweep on the
//! same task evicts entries older than the retention window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use qabot_core::config::PendingConfig;
use qabot_core::hashing::ContentId;
use qabot_core::types::{DraftAction, Timestamp};

/// A stored draft plus its registration metadata.
#[derive(Debug, Clone)]
struct PendingEntry {
    draft: DraftAction,
    registered_at: Timestamp,
    registered: Instant,
}

enum Command {
    Register {
        id: ContentId,
        draft: DraftAction,
        reply: oneshot::Sender<()>,
    },
    Take {
        id: ContentId,
        reply: oneshot::Sender<Option<DraftAction>>,
    },
    Cancel {
        id: ContentId,
        reply: oneshot::Sender<bool>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the pending action store.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct PendingStore {
    tx: mpsc::Sender<Command>,
    owner: Mutex<Option<JoinHandle<()>>>,
}

impl PendingStore {
    /// Start the owner task. Must be called inside a tokio runtime.
    pub fn spawn(config: PendingConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let owner = Owner {
            entries: HashMap::new(),
            retention: config.retention(),
            single_use: config.single_use,
        };
        info!(
            retention_secs = config.retention().as_secs(),
            sweep_interval_secs = config.sweep_interval().as_secs(),
            single_use = config.single_use,
            "Pending store started"
        );
        let handle = tokio::spawn(owner.run(rx, config.sweep_interval()));
        Self {
            tx,
            owner: Mutex::new(Some(handle)),
        }
    }

    /// Store `draft` under its content identifier and return the identifier.
    ///
    /// An existing entry with the same identifier is replaced. Never fails:
    /// after shutdown the identifier is still returned but nothing is stored.
    pub async fn register(&self, draft: DraftAction) -> ContentId {
        let id = draft.content_id();
        let (reply, rx) = oneshot::channel();
        let cmd = Command::Register {
            id: id.clone(),
            draft,
            reply,
        };
        if self.tx.send(cmd).await.is_err() || rx.await.is_err() {
            warn!(content_id = %id, "Pending store is shut down; draft not kept");
        }
        id
    }

    /// Look up a draft. `None` when it was never registered, was cancelled,
    /// or has been swept.
    pub async fn take(&self, id: &ContentId) -> Option<DraftAction> {
        let (reply, rx) = oneshot::channel();
        let cmd = Command::Take {
            id: id.clone(),
            reply,
        };
        if self.tx.send(cmd).await.is_err() {
            return None;
        }
        rx.await.ok().flatten()
    }

    /// Drop a draft regardless of its age. Returns whether it was present.
    pub async fn cancel(&self, id: &ContentId) -> bool {
        let (reply, rx) = oneshot::channel();
        let cmd = Command::Cancel {
            id: id.clone(),
            reply,
        };
        if self.tx.send(cmd).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Len { reply }).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stop the sweep and the owner task.
    ///
    /// Requests already queued are answered before the owner exits. Safe to
    /// call more than once.
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = rx.await;
        }

        let handle = match self.owner.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Pending store owner task ended abnormally");
            }
            info!("Pending store stopped");
        }
    }
}

/// State owned exclusively by the store's task.
struct Owner {
    entries: HashMap<ContentId, PendingEntry>,
    retention: Duration,
    single_use: bool,
}

impl Owner {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>, sweep_interval: Duration) {
        let mut sweep = tokio::time::interval_at(Instant::now() + sweep_interval, sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = sweep.tick() => self.sweep(),
                cmd = rx.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => {
                        rx.close();
                        while let Ok(cmd) = rx.try_recv() {
                            self.handle(cmd);
                        }
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle(cmd),
                    // Every handle dropped.
                    None => break,
                },
            }
        }
        debug!(remaining = self.entries.len(), "Pending store owner exiting");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Register { id, draft, reply } => {
                let entry = PendingEntry {
                    draft,
                    registered_at: Timestamp::now(),
                    registered: Instant::now(),
                };
                if self.entries.insert(id.clone(), entry).is_some() {
                    debug!(content_id = %id, "Pending draft replaced");
                } else {
                    debug!(content_id = %id, "Pending draft registered");
                }
                let _ = reply.send(());
            }
            Command::Take { id, reply } => {
                let found = if self.single_use {
                    self.entries.remove(&id)
                } else {
                    self.entries.get(&id).cloned()
                };
                match &found {
                    Some(entry) => debug!(
                        content_id = %id,
                        registered_at = entry.registered_at.0,
                        "Pending draft taken"
                    ),
                    None => debug!(content_id = %id, "Pending draft not found"),
                }
                let _ = reply.send(found.map(|entry| entry.draft));
            }
            Command::Cancel { id, reply } => {
                let removed = self.entries.remove(&id).is_some();
                debug!(content_id = %id, removed, "Pending draft cancelled");
                let _ = reply.send(removed);
            }
            Command::Len { reply } => {
                let _ = reply.send(self.entries.len());
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn sweep(&mut self) {
        let retention = self.retention;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.registered.elapsed() <= retention);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            info!(evicted, remaining = self.entries.len(), "Expired pending drafts swept");
        }
    }
}
