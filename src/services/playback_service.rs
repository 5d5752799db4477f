//! Transport controls shared by every member of a room.

use crate::{
    error::ServiceError,
    services::room_service::apply,
    state::SharedState,
};

/// Resume playback from `time`.
pub async fn play(state: &SharedState, room_id: &str, time: f64) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.play(time, now)).await
}

/// Freeze playback at the room's effective position.
pub async fn pause(state: &SharedState, room_id: &str) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.pause(now)).await
}

/// Jump to `time` within the current track.
pub async fn seek(state: &SharedState, room_id: &str, time: f64) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.seek(time, now)).await
}

/// Advance to the next track, honouring shuffle.
pub async fn next(state: &SharedState, room_id: &str) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.next(now, &mut rand::rng())).await
}

/// Step back to the previous track.
pub async fn previous(state: &SharedState, room_id: &str) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.previous(now)).await
}

/// Toggle shuffle for subsequent `next` calls.
pub async fn set_shuffle(
    state: &SharedState,
    room_id: &str,
    enabled: bool,
) -> Result<(), ServiceError> {
    apply(state, room_id, |room, _now| room.set_shuffle(enabled)).await
}

/// Toggle whether clients restart the track when it ends.
pub async fn set_loop(state: &SharedState, room_id: &str, enabled: bool) -> Result<(), ServiceError> {
    apply(state, room_id, |room, _now| room.set_loop(enabled)).await
}

/// Restart the current track after a client-side loop ended it.
pub async fn loop_restart(state: &SharedState, room_id: &str) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.loop_restart(now)).await
}

/// Broadcast a catch-up anchor for a client-reported position.
pub async fn catch_up(state: &SharedState, room_id: &str, time: f64) -> Result<(), ServiceError> {
    apply(state, room_id, |room, now| room.catch_up(time, now)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::ws::ServerMessage,
        services::room_service,
        state::{AppState, clock::ManualClock, room::fixtures::track},
    };

    struct Fixture {
        state: SharedState,
        clock: Arc<ManualClock>,
        room_id: String,
        rx: broadcast::Receiver<ServerMessage>,
    }

    async fn fixture(titles: &[&str]) -> Fixture {
        let clock = Arc::new(ManualClock::new(1_000.0));
        let state = AppState::with_clock(AppConfig::default(), clock.clone());
        let room_id = room_service::create_room(&state).room_id;
        let room = state.rooms().get(&room_id).unwrap();
        room.with_state(|room| {
            for title in titles {
                room.enqueue(track(title), 1_000.0);
            }
        })
        .await;
        let rx = room.hub().subscribe();
        Fixture {
            state,
            clock,
            room_id,
            rx,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn late_joiner_sees_position_moved_by_elapsed_time() {
        let mut f = fixture(&["a"]).await;
        play(&f.state, &f.room_id, 10.0).await.unwrap();

        match f.rx.recv().await.unwrap() {
            ServerMessage::ScheduledPlay {
                audio_time,
                target_timestamp,
            } => {
                assert_eq!(audio_time, 10.0);
                assert!(approx(target_timestamp, 1_000.3));
            }
            other => panic!("unexpected message {other:?}"),
        }

        f.clock.advance(5.0);
        let snapshot = room_service::room_snapshot(&f.state, &f.room_id)
            .await
            .unwrap();
        assert!(snapshot.is_playing);
        assert!(approx(snapshot.position, 15.0));
    }

    #[tokio::test]
    async fn next_while_paused_starts_second_track() {
        let mut f = fixture(&["a", "b"]).await;
        next(&f.state, &f.room_id).await.unwrap();

        match f.rx.recv().await.unwrap() {
            ServerMessage::NewTrack { track: Some(track) } => assert_eq!(track.title, "b"),
            other => panic!("unexpected message {other:?}"),
        }
        match f.rx.recv().await.unwrap() {
            ServerMessage::ScheduledPlay {
                audio_time,
                target_timestamp,
            } => {
                assert_eq!(audio_time, 0.0);
                assert!(approx(target_timestamp, 1_000.5));
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(matches!(
            f.rx.recv().await.unwrap(),
            ServerMessage::QueueUpdate { current_index: 1, .. }
        ));
    }

    #[tokio::test]
    async fn pause_then_play_resumes_from_frozen_position() {
        let mut f = fixture(&["a"]).await;
        play(&f.state, &f.room_id, 0.0).await.unwrap();
        f.clock.advance(4.0);
        pause(&f.state, &f.room_id).await.unwrap();

        f.rx.recv().await.unwrap();
        match f.rx.recv().await.unwrap() {
            ServerMessage::Pause { time } => assert!(approx(time, 4.0)),
            other => panic!("unexpected message {other:?}"),
        }

        f.clock.advance(60.0);
        let snapshot = room_service::room_snapshot(&f.state, &f.room_id)
            .await
            .unwrap();
        assert!(approx(snapshot.position, 4.0));
    }

    #[tokio::test]
    async fn catch_up_is_anchored_in_the_past() {
        let mut f = fixture(&["a"]).await;
        catch_up(&f.state, &f.room_id, 42.0).await.unwrap();

        match f.rx.recv().await.unwrap() {
            ServerMessage::CatchUp {
                audio_time,
                target_timestamp,
            } => {
                assert_eq!(audio_time, 42.0);
                assert!(approx(target_timestamp, 999.7));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[tokio::test]
    async fn toggles_broadcast_new_flag_values() {
        let mut f = fixture(&[]).await;
        set_shuffle(&f.state, &f.room_id, true).await.unwrap();
        set_loop(&f.state, &f.room_id, true).await.unwrap();

        assert_eq!(
            f.rx.recv().await.unwrap(),
            ServerMessage::ShuffleStateUpdate { enabled: true }
        );
        assert_eq!(
            f.rx.recv().await.unwrap(),
            ServerMessage::LoopStateUpdate { enabled: true }
        );
    }

    #[tokio::test]
    async fn unknown_room_is_an_error() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(
            play(&state, "nope00", 0.0).await.unwrap_err(),
            ServiceError::RoomNotFound("nope00".into())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transport_events_are_serialized() {
        let config = AppConfig {
            room_channel_capacity: 4_096,
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        let room_id = room_service::create_room(&state).room_id;
        let room = state.rooms().get(&room_id).unwrap();
        room.with_state(|room| {
            for title in ["a", "b", "c", "d"] {
                room.enqueue(track(title), 0.0);
            }
        })
        .await;
        let mut rx = room.hub().subscribe();

        let tasks: Vec<_> = (0..400)
            .map(|i| {
                let state = state.clone();
                let room_id = room_id.clone();
                tokio::spawn(async move {
                    match i % 5 {
                        0 => play(&state, &room_id, f64::from(i % 30)).await.unwrap(),
                        1 => pause(&state, &room_id).await.unwrap(),
                        2 => seek(&state, &room_id, f64::from(i % 17)).await.unwrap(),
                        3 => next(&state, &room_id).await.unwrap(),
                        _ => {
                            crate::services::sync_service::broadcast_server_sync(&state).await;
                        }
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut last_transport = None;
        while let Ok(message) = rx.try_recv() {
            match message {
                ServerMessage::Pause { time } => {
                    assert!(time >= 0.0);
                    last_transport = Some(false);
                }
                ServerMessage::ScheduledPlay { audio_time, .. } => {
                    assert!(audio_time >= 0.0);
                    last_transport = Some(true);
                }
                ServerMessage::ServerSync { audio_time, .. } => assert!(audio_time >= 0.0),
                _ => {}
            }
        }

        let snapshot = room_service::room_snapshot(&state, &room_id).await.unwrap();
        assert!(snapshot.current_index >= 0);
        assert!((snapshot.current_index as usize) < snapshot.queue.len());
        assert!(snapshot.position >= 0.0);
        assert_eq!(Some(snapshot.is_playing), last_transport);
    }
}
