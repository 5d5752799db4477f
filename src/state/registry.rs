use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::{
    hub::RoomHub,
    room::{RoomId, RoomState},
};

/// One room: its authoritative state behind a per-room lock, plus its fan-out hub.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    state: Mutex<RoomState>,
    hub: RoomHub,
}

impl Room {
    fn new(id: RoomId, now: f64, channel_capacity: usize) -> Self {
        Self {
            state: Mutex::new(RoomState::new(id.clone(), now)),
            hub: RoomHub::new(channel_capacity),
            id,
        }
    }

    /// Identifier clients use to join.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Broadcast hub of this room.
    pub fn hub(&self) -> &RoomHub {
        &self.hub
    }

    /// Run `f` with exclusive access to the room state.
    ///
    /// The closure must not perform I/O or block; hub sends are the only side effect allowed.
    pub async fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut RoomState) -> T,
    {
        let mut guard = self.state.lock().await;
        f(&mut guard)
    }
}

/// Registry of live rooms keyed by identifier. Rooms are never removed.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Room>>,
    id_length: usize,
    channel_capacity: usize,
}

impl RoomRegistry {
    /// Empty registry drawing `id_length`-character ids; each room buffers `channel_capacity` events.
    pub fn new(id_length: usize, channel_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            id_length,
            channel_capacity,
        }
    }

    /// Allocate a fresh room id and register an empty room under it.
    pub fn create(&self, now: f64) -> Arc<Room> {
        loop {
            let id = self.generate_id();
            match self.rooms.entry(id.clone()) {
                Entry::Occupied(_) => {
                    warn!(room_id = %id, "room id collision; drawing another");
                }
                Entry::Vacant(slot) => {
                    let room = Arc::new(Room::new(id.clone(), now, self.channel_capacity));
                    slot.insert(room.clone());
                    info!(room_id = %id, "room created");
                    return room;
                }
            }
        }
    }

    /// Look up a room. The returned handle does not pin the registry shard.
    pub fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|entry| entry.value().clone())
    }

    /// Stable snapshot of the current room ids.
    pub fn ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn generate_id(&self) -> RoomId {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(self.id_length);
        id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn created_rooms_are_retrievable_and_unique() {
        let registry = RoomRegistry::new(6, 8);
        let ids: HashSet<_> = (0..50)
            .map(|_| registry.create(0.0).id().to_string())
            .collect();

        assert_eq!(ids.len(), 50);
        assert_eq!(registry.room_count(), 50);
        for id in &ids {
            assert_eq!(id.len(), 6);
            assert_eq!(registry.get(id).unwrap().id(), id);
        }
        assert!(registry.get("nope").is_none());
    }

    #[tokio::test]
    async fn new_rooms_start_empty() {
        let registry = RoomRegistry::new(8, 8);
        let room = registry.create(5.0);
        let snapshot = room.with_state(|state| state.snapshot(5.0)).await;

        assert_eq!(snapshot.room_id, room.id());
        assert_eq!(snapshot.current_index, -1);
        assert!(snapshot.queue.is_empty());
        assert_eq!(snapshot.member_count, 0);
    }
}
