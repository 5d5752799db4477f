//! DTO definitions for the room REST API and the payloads embedded in room events.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_media_reference},
    state::room::{ConnectionId, DeviceClass, MediaSource, Member, Track},
};

/// Where the audio for a track can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaReference {
    /// File previously stored by the upload layer, served under `/uploads`.
    Local { filename: String },
    /// Stream resolved by an external provider.
    Remote { url: String },
}

impl From<MediaSource> for MediaReference {
    fn from(value: MediaSource) -> Self {
        match value {
            MediaSource::Local { filename } => Self::Local { filename },
            MediaSource::Remote { url } => Self::Remote { url },
        }
    }
}

impl From<MediaReference> for MediaSource {
    fn from(value: MediaReference) -> Self {
        match value {
            MediaReference::Local { filename } => Self::Local { filename },
            MediaReference::Remote { url } => Self::Remote { url },
        }
    }
}

/// Public projection of a queued track.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackSummary {
    /// Identity of the entry, stable across reorders.
    pub id: Uuid,
    /// Where clients fetch the audio.
    pub media: MediaReference,
    /// Display title.
    pub title: String,
    /// Display artist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Album name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Cover art reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Unix timestamp (seconds) at which the track entered the queue.
    pub added_at: f64,
}

impl From<&Track> for TrackSummary {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            media: track.media.clone().into(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            cover: track.cover.clone(),
            added_at: track.added_at,
        }
    }
}

/// Public projection of a room member.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MemberSummary {
    /// Server-assigned connection identifier.
    pub connection_id: ConnectionId,
    /// Name shown to the other members.
    pub display_name: String,
    /// Client-reported device class.
    pub device: DeviceClass,
    /// RFC 3339 timestamp of the join.
    pub joined_at: String,
    /// Whether this member currently hosts the room.
    pub is_host: bool,
}

impl MemberSummary {
    /// Project a member, flagging it as host when it holds the room.
    pub fn from_member(connection_id: &str, member: &Member, is_host: bool) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            display_name: member.display_name.clone(),
            device: member.device,
            joined_at: format_system_time(member.joined_at),
            is_host,
        }
    }
}

/// Position-corrected view of a room handed to joining clients and HTTP readers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RoomSnapshot {
    /// Identifier of the room.
    pub room_id: String,
    /// Track at `current_index`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_track: Option<TrackSummary>,
    /// Index of the current track in `queue`, or -1 when nothing is loaded.
    pub current_index: i64,
    /// Whether the position is advancing.
    pub is_playing: bool,
    /// Effective playback offset in seconds as of `server_time`.
    pub position: f64,
    /// Unix timestamp (seconds) at which `position` was computed.
    pub server_time: f64,
    /// Whether `next` picks a random track.
    pub is_shuffling: bool,
    /// Whether clients restart the track when it ends.
    pub is_looping: bool,
    /// Connection currently holding the host role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<ConnectionId>,
    /// Number of connected members.
    pub member_count: usize,
    /// Members in join order.
    pub members: Vec<MemberSummary>,
    /// Full queue in play order.
    pub queue: Vec<TrackSummary>,
}

/// Queue listing together with the current pointer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QueueResponse {
    /// Full queue in play order.
    pub queue: Vec<TrackSummary>,
    /// Index of the current track, or -1.
    pub current_index: i64,
}

/// Response returned when a room is created.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    /// Identifier to share with listeners.
    pub room_id: String,
}

/// Request to append a track to a room queue.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EnqueueTrackRequest {
    /// Display title.
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// Display artist.
    #[serde(default)]
    #[validate(length(max = 256))]
    pub artist: Option<String>,
    /// Album name.
    #[serde(default)]
    #[validate(length(max = 256))]
    pub album: Option<String>,
    /// Reference to already-extracted cover art.
    #[serde(default)]
    #[validate(length(max = 512))]
    pub cover: Option<String>,
    /// Stored file or remote stream to play.
    #[validate(custom(function = "validate_media_reference"))]
    pub media: MediaReference,
}

impl EnqueueTrackRequest {
    /// Build the queue entry, allocating a fresh track identifier.
    pub fn into_track(self, added_at: f64) -> Track {
        Track {
            id: Uuid::new_v4(),
            media: self.media.into(),
            title: self.title,
            artist: self.artist,
            album: self.album,
            cover: self.cover,
            added_at,
        }
    }
}

/// Request to move one queue entry to another slot.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// Current position of the entry.
    pub from_index: usize,
    /// Position the entry moves to.
    pub to_index: usize,
}

/// Convert an optional queue position into the wire representation (-1 for none).
pub fn wire_index(index: Option<usize>) -> i64 {
    index.map_or(-1, |value| value as i64)
}
