use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dto::{
        room::{MemberSummary, RoomSnapshot, TrackSummary},
        validation::{validate_display_name, validate_room_id},
    },
    state::room::DeviceClass,
};

/// Reasons an inbound WebSocket frame is rejected before dispatch.
#[derive(Debug, Error)]
pub enum InboundError {
    /// Not JSON, or not a known message shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Well-formed but carrying invalid field values.
    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
/// Messages accepted from listener WebSocket clients.
///
/// Every message except `join` and `ping` applies to the room joined by the connection.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter a room. Must be the first message of a connection.
    Join {
        /// Room to enter.
        room_id: String,
        /// Name shown to the other members.
        display_name: String,
        /// Client device class.
        #[serde(default)]
        device: DeviceClass,
    },
    /// Resume playback.
    Play {
        /// Offset in seconds to resume from.
        #[serde(default)]
        time: f64,
    },
    /// Freeze playback.
    Pause,
    /// Jump within the current track.
    Seek {
        /// Target offset in seconds.
        time: f64,
    },
    /// Advance to the next track.
    Next,
    /// Step back to the previous track.
    Previous,
    /// Make a queue entry current, paused at its start.
    Select {
        /// Queue position.
        index: usize,
    },
    /// Delete a queue entry.
    Remove {
        /// Queue position.
        index: usize,
    },
    /// Move a queue entry.
    Reorder {
        /// Current position of the entry.
        from_index: usize,
        /// Position the entry moves to.
        to_index: usize,
    },
    /// Set the shuffle flag.
    ShuffleToggle {
        /// New flag value.
        enabled: bool,
    },
    /// Set the loop flag.
    LoopToggle {
        /// New flag value.
        enabled: bool,
    },
    /// A looped track ended on the client.
    LoopRestart,
    /// Ask the room to catch up to a client-reported position.
    Sync {
        /// Reported offset in seconds.
        #[serde(default)]
        time: f64,
    },
    /// Clock check, answered with `pong`.
    Ping,
    /// Any unrecognised `type`; ignored.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a text frame and validate the fields that carry user input.
    pub fn from_json_str(text: &str) -> Result<Self, InboundError> {
        let message: Self = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Self::Join {
            room_id,
            display_name,
            ..
        } = self
        {
            if let Err(e) = validate_room_id(room_id) {
                errors.add("room_id", e);
            }
            if let Err(e) = validate_display_name(display_name) {
                errors.add("display_name", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
/// Messages pushed to listeners, either to a single connection or to a whole room.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full position-corrected room view, sent to a client right after it joins.
    RoomState {
        /// Snapshot as of the join.
        room: RoomSnapshot,
    },
    /// The queue or its current pointer changed.
    QueueUpdate {
        /// Full queue in play order.
        queue: Vec<TrackSummary>,
        /// Index of the current track, or -1.
        current_index: i64,
    },
    /// Load a different track; `None` means the room no longer has one.
    NewTrack {
        /// Track to load.
        track: Option<TrackSummary>,
    },
    /// Stop immediately and hold at `time`.
    Pause {
        /// Frozen offset in seconds.
        time: f64,
    },
    /// Start playing from `audio_time` once the wall clock reaches `target_timestamp`.
    ScheduledPlay {
        /// Offset in seconds to start from.
        audio_time: f64,
        /// Unix seconds at which to start.
        target_timestamp: f64,
    },
    /// The room was at `audio_time` as of `target_timestamp`, which is already in the past.
    CatchUp {
        /// Offset in seconds at the anchor.
        audio_time: f64,
        /// Unix seconds of the anchor.
        target_timestamp: f64,
    },
    /// Periodic anchor for drift correction.
    ServerSync {
        /// Effective offset in seconds.
        audio_time: f64,
        /// Unix seconds at which the offset was computed.
        server_time: f64,
    },
    /// Member count changed.
    MemberCountUpdate {
        /// Connected members.
        count: usize,
    },
    /// Member list changed.
    MemberListUpdate {
        /// Members in join order.
        members: Vec<MemberSummary>,
    },
    /// The host left and another member took over.
    HostChanged {
        /// Connection of the new host.
        new_host_id: String,
        /// Display name of the new host.
        new_host_name: String,
    },
    /// Loop flag changed.
    LoopStateUpdate {
        /// New flag value.
        enabled: bool,
    },
    /// Shuffle flag changed.
    ShuffleStateUpdate {
        /// New flag value.
        enabled: bool,
    },
    /// Restart the current track from 0 now.
    LoopRestart,
    /// Reply to `ping`.
    Pong {
        /// Server wall clock in Unix seconds.
        server_timestamp: f64,
    },
    /// A request from this connection failed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl ServerMessage {
    /// Wire name of the message, also used as the SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomState { .. } => "room_state",
            Self::QueueUpdate { .. } => "queue_update",
            Self::NewTrack { .. } => "new_track",
            Self::Pause { .. } => "pause",
            Self::ScheduledPlay { .. } => "scheduled_play",
            Self::CatchUp { .. } => "catch_up",
            Self::ServerSync { .. } => "server_sync",
            Self::MemberCountUpdate { .. } => "member_count_update",
            Self::MemberListUpdate { .. } => "member_list_update",
            Self::HostChanged { .. } => "host_changed",
            Self::LoopStateUpdate { .. } => "loop_state_update",
            Self::ShuffleStateUpdate { .. } => "shuffle_state_update",
            Self::LoopRestart => "loop_restart",
            Self::Pong { .. } => "pong",
            Self::Error { .. } => "error",
        }
    }

    /// Build an error message for a single connection.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_with_default_device() {
        let msg = ClientMessage::from_json_str(
            r#"{"type":"join","room_id":"ab12cd","display_name":"Alice"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                room_id: "ab12cd".into(),
                display_name: "Alice".into(),
                device: DeviceClass::Unknown,
            }
        );
    }

    #[test]
    fn rejects_join_with_blank_name() {
        let err = ClientMessage::from_json_str(
            r#"{"type":"join","room_id":"ab12cd","display_name":"  "}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InboundError::Invalid(_)));
    }

    #[test]
    fn unit_messages_ignore_extra_fields() {
        let msg = ClientMessage::from_json_str(r#"{"type":"pause","room":"ab12cd"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Pause);
    }

    #[test]
    fn unknown_types_are_tolerated() {
        let msg = ClientMessage::from_json_str(r#"{"type":"dance"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Unknown);
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = ClientMessage::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, InboundError::Malformed(_)));
    }

    #[test]
    fn server_messages_are_tagged_by_kind() {
        let value = serde_json::to_value(ServerMessage::ScheduledPlay {
            audio_time: 10.0,
            target_timestamp: 1000.3,
        })
        .unwrap();
        assert_eq!(value["type"], "scheduled_play");
        assert_eq!(value["audio_time"], 10.0);

        let value = serde_json::to_value(ServerMessage::LoopRestart).unwrap();
        assert_eq!(value["type"], ServerMessage::LoopRestart.kind());
    }
}
