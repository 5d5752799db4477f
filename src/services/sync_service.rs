//! Periodic drift-correction broadcasts and the ping/pong clock check.

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::{dto::ws::ServerMessage, state::SharedState};

/// Broadcast `server_sync` to every playing room, forever, at the configured cadence.
pub async fn run_sync_loop(state: SharedState) {
    let period = state.config().sync_interval;
    info!(interval_ms = period.as_millis() as u64, "starting sync loop");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let sent = broadcast_server_sync(&state).await;
        if sent > 0 {
            debug!(rooms = sent, "server sync broadcast");
        }
    }
}

/// One sync pass. Returns the number of rooms that received an anchor.
///
/// Iterates over a snapshot of room ids; rooms are locked one at a time.
pub async fn broadcast_server_sync(state: &SharedState) -> usize {
    let mut sent = 0;
    for room_id in state.rooms().ids() {
        let Some(room) = state.rooms().get(&room_id) else {
            continue;
        };
        let hub = room.hub();
        let synced = room
            .with_state(|room| {
                room.server_sync(state.now())
                    .map(|message| hub.broadcast(message))
                    .is_some()
            })
            .await;
        if synced {
            sent += 1;
        }
    }
    sent
}

/// Reply to a client clock check.
pub fn pong(state: &SharedState) -> ServerMessage {
    ServerMessage::Pong {
        server_timestamp: state.now(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        services::{playback_service, room_service},
        state::{AppState, clock::ManualClock, room::fixtures::track},
    };

    #[tokio::test]
    async fn only_playing_rooms_are_synced() {
        let clock = Arc::new(ManualClock::new(100.0));
        let state = AppState::with_clock(AppConfig::default(), clock.clone());
        let playing = room_service::create_room(&state).room_id;
        let paused = room_service::create_room(&state).room_id;
        for room_id in [&playing, &paused] {
            let room = state.rooms().get(room_id).unwrap();
            room.with_state(|room| room.enqueue(track("a"), 100.0)).await;
        }
        playback_service::play(&state, &playing, 20.0).await.unwrap();

        let mut playing_rx = state.rooms().get(&playing).unwrap().hub().subscribe();
        let mut paused_rx = state.rooms().get(&paused).unwrap().hub().subscribe();

        clock.advance(3.0);
        assert_eq!(broadcast_server_sync(&state).await, 1);

        match playing_rx.recv().await.unwrap() {
            ServerMessage::ServerSync {
                audio_time,
                server_time,
            } => {
                assert!((audio_time - 23.0).abs() < 1e-9);
                assert_eq!(server_time, 103.0);
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(paused_rx.try_recv().is_err());
    }

    #[test]
    fn pong_carries_server_time() {
        let state = AppState::with_clock(AppConfig::default(), Arc::new(ManualClock::new(7.5)));
        assert_eq!(
            pong(&state),
            ServerMessage::Pong {
                server_timestamp: 7.5
            }
        );
    }
}
