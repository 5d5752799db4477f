use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    room::{MemberSummary, QueueResponse, RoomSnapshot, TrackSummary, wire_index},
    ws::ServerMessage,
};

/// Short opaque identifier of a room.
pub type RoomId = String;
/// Identifier of one listener connection.
pub type ConnectionId = String;

/// Errors raised by room transitions. The room is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// A queue index fell outside `[0, len)`.
    #[error("queue index {index} out of range (queue length {len})")]
    InvalidIndex {
        /// Index supplied by the caller.
        index: usize,
        /// Queue length at the time of the request.
        len: usize,
    },
}

/// Where a track's audio lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// File stored by the upload layer.
    Local {
        /// Name of the stored file.
        filename: String,
    },
    /// Externally resolved stream.
    Remote {
        /// Playable URL.
        url: String,
    },
}

/// Queue entry. Immutable once enqueued except for its position.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Identity of the entry, stable across reorders.
    pub id: Uuid,
    /// Handle to playable media.
    pub media: MediaSource,
    /// Display title.
    pub title: String,
    /// Display artist, when known.
    pub artist: Option<String>,
    /// Display album, when known.
    pub album: Option<String>,
    /// Cover art reference, when extracted.
    pub cover: Option<String>,
    /// Unix timestamp (seconds) of the enqueue.
    pub added_at: f64,
}

/// Coarse device class reported by a joining client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Laptop or desktop browser.
    Desktop,
    /// Phone.
    Mobile,
    /// Tablet.
    Tablet,
    /// Anything the client did not or could not classify.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Descriptive metadata of a joined connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Name shown to other listeners.
    pub display_name: String,
    /// Device class reported at join.
    pub device: DeviceClass,
    /// Wall-clock time of the join.
    pub joined_at: SystemTime,
}

/// Coarse playback status derived from the room fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// No current track.
    Stopped,
    /// Current track loaded, holding at `position_seconds`.
    Paused,
    /// Current track advancing from the anchor.
    Playing,
}

/// Authoritative per-room playback, queue and membership state.
///
/// Position is materialized lazily: while playing, the true offset is
/// `position_seconds + (now - position_anchored_at)`; while paused it is
/// `position_seconds`. Every mutation re-anchors instead of ticking.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub(super) id: RoomId,
    pub(super) queue: Vec<Track>,
    pub(super) current_index: Option<usize>,
    pub(super) is_playing: bool,
    pub(super) position_seconds: f64,
    pub(super) position_anchored_at: f64,
    pub(super) is_shuffling: bool,
    pub(super) is_looping: bool,
    /// Insertion order is join order, which drives host election.
    pub(super) members: IndexMap<ConnectionId, Member>,
    pub(super) host_id: Option<ConnectionId>,
}

impl RoomState {
    /// Build an empty, paused room.
    pub fn new(id: RoomId, now: f64) -> Self {
        Self {
            id,
            queue: Vec::new(),
            current_index: None,
            is_playing: false,
            position_seconds: 0.0,
            position_anchored_at: now,
            is_shuffling: false,
            is_looping: false,
            members: IndexMap::new(),
            host_id: None,
        }
    }

    /// Identifier of the room.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue in play order.
    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    /// Index of the current track, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Track at `current_index`, if any.
    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|index| self.queue.get(index))
    }

    /// Whether the room is advancing.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether `next` picks a random track.
    pub fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    /// Whether clients restart the track when it ends.
    pub fn is_looping(&self) -> bool {
        self.is_looping
    }

    /// Current host connection, if the room has members.
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// Number of connected members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Derived playback status.
    pub fn status(&self) -> PlaybackStatus {
        match (self.current_track(), self.is_playing) {
            (None, _) => PlaybackStatus::Stopped,
            (Some(_), false) => PlaybackStatus::Paused,
            (Some(_), true) => PlaybackStatus::Playing,
        }
    }

    /// Playback offset as of `now`. Reads the flag and the anchor together.
    pub fn effective_position(&self, now: f64) -> f64 {
        if self.is_playing {
            self.position_seconds + (now - self.position_anchored_at).max(0.0)
        } else {
            self.position_seconds
        }
    }

    /// Move the anchor to `position` at `now`.
    pub(super) fn anchor(&mut self, position: f64, now: f64) {
        self.position_seconds = position.max(0.0);
        self.position_anchored_at = now;
    }

    /// Position-corrected snapshot for joiners and HTTP readers.
    pub fn snapshot(&self, now: f64) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            current_track: self.current_track().map(TrackSummary::from),
            current_index: wire_index(self.current_index),
            is_playing: self.is_playing,
            position: self.effective_position(now),
            server_time: now,
            is_shuffling: self.is_shuffling,
            is_looping: self.is_looping,
            host_id: self.host_id.clone(),
            member_count: self.members.len(),
            members: self.member_summaries(),
            queue: self.queue_summaries(),
        }
    }

    /// Queue listing with the current pointer.
    pub fn queue_response(&self) -> QueueResponse {
        QueueResponse {
            queue: self.queue_summaries(),
            current_index: wire_index(self.current_index),
        }
    }

    /// `queue_update` broadcast built from the present queue.
    pub fn queue_update(&self) -> ServerMessage {
        ServerMessage::QueueUpdate {
            queue: self.queue_summaries(),
            current_index: wire_index(self.current_index),
        }
    }

    /// `new_track` broadcast for the present current track.
    pub(super) fn new_track(&self) -> ServerMessage {
        ServerMessage::NewTrack {
            track: self.current_track().map(TrackSummary::from),
        }
    }

    pub(super) fn member_summaries(&self) -> Vec<MemberSummary> {
        self.members
            .iter()
            .map(|(id, member)| {
                MemberSummary::from_member(id, member, self.host_id.as_deref() == Some(id.as_str()))
            })
            .collect()
    }

    fn queue_summaries(&self) -> Vec<TrackSummary> {
        self.queue.iter().map(TrackSummary::from).collect()
    }

    pub(super) fn check_index(&self, index: usize) -> Result<(), RoomError> {
        if index < self.queue.len() {
            Ok(())
        } else {
            Err(RoomError::InvalidIndex {
                index,
                len: self.queue.len(),
            })
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn new_room_is_stopped_and_empty() {
        let room = RoomState::new("abc123".into(), 10.0);
        assert_eq!(room.status(), PlaybackStatus::Stopped);
        assert_eq!(room.current_index(), None);
        assert_eq!(room.effective_position(99.0), 0.0);
        assert_eq!(room.snapshot(10.0).current_index, -1);
    }

    #[test]
    fn position_advances_only_while_playing() {
        let mut room = room_with_queue(&["a"], 100.0);
        room.is_playing = true;
        room.anchor(10.0, 100.0);
        let first = room.effective_position(101.0);
        let second = room.effective_position(103.5);
        assert!((second - first - 2.5).abs() < 1e-9);

        room.is_playing = false;
        assert_eq!(room.effective_position(200.0), 10.0);
    }

    #[test]
    fn position_never_runs_backwards_when_the_clock_does() {
        let mut room = room_with_queue(&["a"], 100.0);
        room.is_playing = true;
        room.anchor(4.0, 100.0);
        assert_eq!(room.effective_position(99.0), 4.0);
    }

    #[test]
    fn snapshot_is_position_corrected() {
        let mut room = room_with_queue(&["a", "b"], 100.0);
        room.is_playing = true;
        room.anchor(10.0, 100.0);

        let snapshot = room.snapshot(100.5);
        assert!((snapshot.position - 10.5).abs() < 1e-9);
        assert_eq!(snapshot.server_time, 100.5);
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.queue.len(), 2);
        assert_eq!(snapshot.current_track.unwrap().title, "a");
    }

    #[test]
    fn check_index_bounds() {
        let room = room_with_queue(&["a", "b"], 0.0);
        assert!(room.check_index(1).is_ok());
        assert_eq!(
            room.check_index(2),
            Err(RoomError::InvalidIndex { index: 2, len: 2 })
        );
    }
}
