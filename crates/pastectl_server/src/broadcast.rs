//! In-memory fan-out of live edits among viewers of the same paste.
//!
//! Each paste id owns a room with its own lock. The registry lock is only
//! taken to find, create or drop a room, so traffic on unrelated pastes does
//! not serialize. Nothing here is persisted.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::mpsc;

/// Default per-viewer queue depth before relays to that viewer are dropped.
pub const DEFAULT_VIEWER_QUEUE: usize = 256;

/// Process-unique id of one viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewerId(u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// Broadcaster runtime errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// The broadcaster has been shut down.
    Closed,
    /// Internal lock state is poisoned.
    Poisoned,
}

impl fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "live update broadcaster is shut down"),
            Self::Poisoned => write!(f, "live update broadcaster state is poisoned"),
        }
    }
}

impl std::error::Error for BroadcastError {}

/// Outcome of one relay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Registration handle returned by [`Broadcaster::join`].
///
/// Relayed messages arrive through [`Viewer::recv`]; it yields `None` once
/// the broadcaster shuts down.
pub struct Viewer<M> {
    id: ViewerId,
    paste_id: String,
    receiver: mpsc::Receiver<M>,
}

impl<M> Viewer<M> {
    pub fn id(&self) -> ViewerId {
        self.id
    }

    pub fn paste_id(&self) -> &str {
        &self.paste_id
    }

    /// Wait for the next relayed message.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }
}

struct Room<M> {
    viewers: Vec<(ViewerId, mpsc::Sender<M>)>,
}

type SharedRoom<M> = Arc<Mutex<Room<M>>>;

/// Registry of viewer sets keyed by paste id.
pub struct Broadcaster<M> {
    rooms: RwLock<HashMap<String, SharedRoom<M>>>,
    next_viewer: AtomicU64,
    closed: AtomicBool,
    queue_depth: usize,
}

impl<M> Default for Broadcaster<M>
where
    M: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_VIEWER_QUEUE)
    }
}

fn lock_room<M>(room: &Mutex<Room<M>>) -> Result<MutexGuard<'_, Room<M>>, BroadcastError> {
    room.lock().map_err(|_| BroadcastError::Poisoned)
}

impl<M> Broadcaster<M>
where
    M: Clone + Send + 'static,
{
    /// Create an open broadcaster whose viewers buffer up to `queue_depth`
    /// undelivered messages each.
    pub fn new(queue_depth: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_viewer: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            queue_depth: queue_depth.max(1),
        }
    }

    fn ensure_open(&self) -> Result<(), BroadcastError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BroadcastError::Closed);
        }
        Ok(())
    }

    /// Register a new viewer under `paste_id`, creating the room on demand.
    ///
    /// # Errors
    /// Returns [`BroadcastError::Closed`] after [`Broadcaster::shutdown`].
    pub fn join(&self, paste_id: &str) -> Result<Viewer<M>, BroadcastError> {
        self.ensure_open()?;
        let id = ViewerId(self.next_viewer.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.queue_depth);

        // The registry lock stays held while the viewer is pushed so a
        // concurrent `leave` cannot drop the room in between.
        {
            let rooms = self.rooms.read().map_err(|_| BroadcastError::Poisoned)?;
            if let Some(room) = rooms.get(paste_id) {
                lock_room(room)?.viewers.push((id, sender));
                return self.registered(id, paste_id, receiver);
            }
        }

        let mut rooms = self.rooms.write().map_err(|_| BroadcastError::Poisoned)?;
        // Re-check under the write lock: shutdown clears rooms while holding it.
        self.ensure_open()?;
        let room = rooms.entry(paste_id.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(Room {
                viewers: Vec::new(),
            }))
        });
        lock_room(room)?.viewers.push((id, sender));
        drop(rooms);
        self.registered(id, paste_id, receiver)
    }

    fn registered(
        &self,
        id: ViewerId,
        paste_id: &str,
        receiver: mpsc::Receiver<M>,
    ) -> Result<Viewer<M>, BroadcastError> {
        tracing::debug!("{} joined paste {}", id, paste_id);
        Ok(Viewer {
            id,
            paste_id: paste_id.to_string(),
            receiver,
        })
    }

    /// Remove `viewer` from `paste_id`'s room, dropping the room when empty.
    ///
    /// Only the room's own lock is taken unless the room became empty, so
    /// leaving one paste never waits on traffic for another.
    ///
    /// # Returns
    /// `Ok(true)` when the viewer was registered.
    pub fn leave(&self, paste_id: &str, viewer: ViewerId) -> Result<bool, BroadcastError> {
        let room = {
            let rooms = self.rooms.read().map_err(|_| BroadcastError::Poisoned)?;
            match rooms.get(paste_id) {
                Some(room) => Arc::clone(room),
                None => return Ok(false),
            }
        };
        let (removed, now_empty) = {
            let mut room = lock_room(&room)?;
            let before = room.viewers.len();
            room.viewers.retain(|(id, _)| *id != viewer);
            (room.viewers.len() != before, room.viewers.is_empty())
        };
        if removed {
            tracing::debug!("{} left paste {}", viewer, paste_id);
        }
        if now_empty {
            self.drop_room_if_empty(paste_id, &room)?;
        }
        Ok(removed)
    }

    fn drop_room_if_empty(
        &self,
        paste_id: &str,
        room: &SharedRoom<M>,
    ) -> Result<(), BroadcastError> {
        let mut rooms = self.rooms.write().map_err(|_| BroadcastError::Poisoned)?;
        // A join may have refilled the room, or a newer room may have replaced it.
        let still_empty = match rooms.get(paste_id) {
            Some(current) if Arc::ptr_eq(current, room) => {
                lock_room(current)?.viewers.is_empty()
            }
            _ => false,
        };
        if still_empty {
            rooms.remove(paste_id);
        }
        Ok(())
    }

    /// Forward `message` to every viewer of `paste_id` except `from`.
    ///
    /// A full or closed recipient queue is logged and skipped; it does not
    /// abort delivery to the others and does not unregister that viewer.
    ///
    /// # Errors
    /// Returns [`BroadcastError::Closed`] after shutdown.
    pub fn relay(
        &self,
        paste_id: &str,
        from: ViewerId,
        message: M,
    ) -> Result<RelayReport, BroadcastError> {
        self.ensure_open()?;
        let room = {
            let rooms = self.rooms.read().map_err(|_| BroadcastError::Poisoned)?;
            match rooms.get(paste_id) {
                Some(room) => Arc::clone(room),
                None => return Ok(RelayReport::default()),
            }
        };
        let recipients: Vec<(ViewerId, mpsc::Sender<M>)> = lock_room(&room)?
            .viewers
            .iter()
            .filter(|(id, _)| *id != from)
            .cloned()
            .collect();

        let mut report = RelayReport::default();
        for (id, sender) in recipients {
            match sender.try_send(message.clone()) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!("Failed to relay update for paste {} to {}: {}", paste_id, id, err);
                }
            }
        }
        Ok(report)
    }

    /// Number of viewers currently registered for `paste_id`.
    pub fn viewer_count(&self, paste_id: &str) -> usize {
        let Ok(rooms) = self.rooms.read() else {
            return 0;
        };
        rooms
            .get(paste_id)
            .and_then(|room| room.lock().ok().map(|room| room.viewers.len()))
            .unwrap_or(0)
    }

    /// Number of paste ids with at least one viewer.
    pub fn room_count(&self) -> usize {
        self.rooms.read().map(|rooms| rooms.len()).unwrap_or(0)
    }

    /// Close every room and refuse further joins and relays.
    ///
    /// Viewers observe end-of-stream from [`Viewer::recv`].
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        match self.rooms.write() {
            Ok(mut rooms) => {
                let count = rooms.len();
                rooms.clear();
                tracing::info!("Live update broadcaster shut down ({} room(s) closed)", count);
            }
            Err(_) => {
                tracing::error!("Failed to close live rooms: broadcaster state poisoned");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
