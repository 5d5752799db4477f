use std::{sync::Arc, time::SystemTime};

use tokio::sync::broadcast;
use tracing::info;

use crate::{
    dto::{room::RoomSnapshot, ws::ServerMessage},
    error::ServiceError,
    services::room_service::{apply, require_room},
    state::{
        SharedState,
        registry::Room,
        room::{DeviceClass, Member},
    },
};

/// Everything a freshly joined connection needs to start streaming room events.
pub struct Joined {
    /// Handle to the joined room.
    pub room: Arc<Room>,
    /// Position-corrected view sent to the joiner as `room_state`.
    pub snapshot: RoomSnapshot,
    /// Queue listing sent right after the snapshot.
    pub queue_update: ServerMessage,
    /// Subscription taken under the room lock, so no event after the snapshot is missed.
    pub receiver: broadcast::Receiver<ServerMessage>,
}

/// Add `connection_id` to a room and announce the new member list.
pub async fn join(
    state: &SharedState,
    room_id: &str,
    connection_id: &str,
    display_name: String,
    device: DeviceClass,
) -> Result<Joined, ServiceError> {
    let room = require_room(state, room_id)?;
    let member = Member {
        display_name,
        device,
        joined_at: SystemTime::now(),
    };

    let (snapshot, queue_update, receiver) = room
        .with_state(|room_state| {
            let receiver = room.hub().subscribe();
            let presence = room_state.join(connection_id.to_string(), member);
            room.hub().broadcast_all(presence);
            (
                room_state.snapshot(state.now()),
                room_state.queue_update(),
                receiver,
            )
        })
        .await;

    info!(room_id, connection_id, "member joined");
    Ok(Joined {
        room,
        snapshot,
        queue_update,
        receiver,
    })
}

/// Remove `connection_id` from a room, re-electing the host and resetting an emptied room.
pub async fn leave(
    state: &SharedState,
    room_id: &str,
    connection_id: &str,
) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.leave(connection_id, now)).await?;
    info!(room_id, connection_id, "member left");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::room_service, state::AppState};

    #[tokio::test]
    async fn joiner_receives_snapshot_and_presence() {
        let state = AppState::new(AppConfig::default());
        let room_id = room_service::create_room(&state).room_id;

        let mut alice = join(&state, &room_id, "a", "Alice".into(), DeviceClass::Desktop)
            .await
            .unwrap();
        assert_eq!(alice.snapshot.member_count, 1);
        assert_eq!(alice.snapshot.host_id.as_deref(), Some("a"));
        assert_eq!(
            alice.receiver.recv().await.unwrap(),
            ServerMessage::MemberCountUpdate { count: 1 }
        );
        assert!(matches!(
            alice.receiver.recv().await.unwrap(),
            ServerMessage::MemberListUpdate { .. }
        ));

        let bob = join(&state, &room_id, "b", "Bob".into(), DeviceClass::Mobile)
            .await
            .unwrap();
        assert_eq!(bob.snapshot.member_count, 2);
        assert_eq!(
            alice.receiver.recv().await.unwrap(),
            ServerMessage::MemberCountUpdate { count: 2 }
        );
    }

    #[tokio::test]
    async fn host_departure_is_announced() {
        let state = AppState::new(AppConfig::default());
        let room_id = room_service::create_room(&state).room_id;
        join(&state, &room_id, "a", "Alice".into(), DeviceClass::Desktop)
            .await
            .unwrap();
        let mut bob = join(&state, &room_id, "b", "Bob".into(), DeviceClass::Desktop)
            .await
            .unwrap();
        // drain bob's own presence
        bob.receiver.recv().await.unwrap();
        bob.receiver.recv().await.unwrap();

        leave(&state, &room_id, "a").await.unwrap();

        assert_eq!(
            bob.receiver.recv().await.unwrap(),
            ServerMessage::HostChanged {
                new_host_id: "b".into(),
                new_host_name: "Bob".into(),
            }
        );
        let snapshot = room_service::room_snapshot(&state, &room_id).await.unwrap();
        assert_eq!(snapshot.host_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn joining_a_missing_room_fails() {
        let state = AppState::new(AppConfig::default());
        let result = join(&state, "gone00", "a", "Alice".into(), DeviceClass::Unknown).await;
        assert!(matches!(result, Err(ServiceError::RoomNotFound(_))));
    }
}
