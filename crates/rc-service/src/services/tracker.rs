//! In-memory tracking of rooms with an active recording.
//!
//! Process-local by design: the tracker exists only to reject duplicate
//! start calls and stops without a start, and its state is lost on restart.
//! At most one entry exists per room name.
//!
//! Starting a recording is two-phase: [`RecordingTracker::begin`] reserves
//! the room before the egress call so concurrent starts cannot both pass
//! the duplicate check, then [`RecordingTracker::commit`] attaches the
//! egress details (or [`RecordingTracker::abort`] releases the reservation
//! when the start failed).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A recording currently in progress for a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRecording {
    /// Egress id to stop the recording with.
    pub egress_id: String,

    /// Base name of the file the egress is writing.
    pub file_name: String,

    /// Start time in milliseconds since the Unix epoch.
    pub started_at_ms: i64,
}

/// Per-room tracker state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RoomState {
    /// Reserved while the egress start call is in flight.
    Starting,

    /// The egress confirmed the start.
    Recording(ActiveRecording),
}

/// Concurrency-safe room name -> recording state map.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    inner: RwLock<HashMap<String, RoomState>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a room for a new recording.
    ///
    /// Returns `false` when a recording is already starting or active for
    /// the room. Check and insert happen under one write lock, so of any
    /// number of concurrent callers exactly one is admitted.
    pub async fn begin(&self, room_name: &str) -> bool {
        match self.inner.write().await.entry(room_name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(RoomState::Starting);
                true
            }
        }
    }

    /// Attach the egress details to a reserved room.
    pub async fn commit(&self, room_name: &str, recording: ActiveRecording) {
        self.inner
            .write()
            .await
            .insert(room_name.to_string(), RoomState::Recording(recording));
    }

    /// Release a reservation whose egress start failed.
    pub async fn abort(&self, room_name: &str) {
        self.inner.write().await.remove(room_name);
    }

    /// Current recording for a room. A room that is still starting has no
    /// recording yet.
    pub async fn get(&self, room_name: &str) -> Option<ActiveRecording> {
        match self.inner.read().await.get(room_name) {
            Some(RoomState::Recording(recording)) => Some(recording.clone()),
            _ => None,
        }
    }

    /// Untrack a room's recording, returning the removed entry. A room
    /// that is only reserved is left untouched.
    pub async fn remove(&self, room_name: &str) -> Option<ActiveRecording> {
        let mut map = self.inner.write().await;
        if let Entry::Occupied(occupied) = map.entry(room_name.to_string()) {
            if matches!(occupied.get(), RoomState::Recording(_)) {
                if let RoomState::Recording(recording) = occupied.remove() {
                    return Some(recording);
                }
            }
        }
        None
    }

    /// Number of rooms with a recording starting or active.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
