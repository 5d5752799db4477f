use crate::{
    dto::ws::ServerMessage,
    state::{
        room::{ConnectionId, Member, RoomState},
        transport::Broadcast,
    },
};

impl RoomState {
    /// Register a connection. The first member of an empty room becomes host.
    pub fn join(&mut self, connection_id: ConnectionId, member: Member) -> Broadcast {
        if self.host_id.is_none() {
            self.host_id = Some(connection_id.clone());
        }
        self.members.insert(connection_id, member);
        self.presence()
    }

    /// Drop a connection, re-electing the host if needed.
    ///
    /// When the last member leaves, playback is reset and the queue cleared;
    /// the room itself stays registered for later joins.
    pub fn leave(&mut self, connection_id: &str, now: f64) -> Broadcast {
        if self.members.shift_remove(connection_id).is_none() {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(3);
        if self.host_id.as_deref() == Some(connection_id) {
            self.host_id = self.members.keys().next().cloned();
            if let Some((id, member)) = self.members.first() {
                out.push(ServerMessage::HostChanged {
                    new_host_id: id.clone(),
                    new_host_name: member.display_name.clone(),
                });
            }
        }

        if self.members.is_empty() {
            self.reset_playback(now);
        }

        out.extend(self.presence());
        out
    }

    fn reset_playback(&mut self, now: f64) {
        self.is_playing = false;
        self.anchor(0.0, now);
        self.queue.clear();
        self.current_index = None;
    }

    fn presence(&self) -> Broadcast {
        vec![
            ServerMessage::MemberCountUpdate {
                count: self.members.len(),
            },
            ServerMessage::MemberListUpdate {
                members: self.member_summaries(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::fixtures::{member, room_with_queue};

    #[test]
    fn first_joiner_becomes_host() {
        let mut room = RoomState::new("room01".into(), 0.0);
        let out = room.join("a".into(), member("Alice"));

        assert_eq!(room.host_id(), Some("a"));
        assert_eq!(out[0], ServerMessage::MemberCountUpdate { count: 1 });
        match &out[1] {
            ServerMessage::MemberListUpdate { members } => {
                assert_eq!(members.len(), 1);
                assert!(members[0].is_host);
                assert_eq!(members[0].display_name, "Alice");
            }
            other => panic!("unexpected message {other:?}"),
        }

        room.join("b".into(), member("Bob"));
        assert_eq!(room.host_id(), Some("a"));
        assert_eq!(room.member_count(), 2);
    }

    #[test]
    fn host_leaving_elects_earliest_remaining_joiner() {
        let mut room = RoomState::new("room01".into(), 0.0);
        room.join("a".into(), member("Alice"));
        room.join("b".into(), member("Bob"));
        room.join("c".into(), member("Carol"));

        let out = room.leave("a", 1.0);

        assert_eq!(room.host_id(), Some("b"));
        assert_eq!(
            out[0],
            ServerMessage::HostChanged {
                new_host_id: "b".into(),
                new_host_name: "Bob".into(),
            }
        );
        assert_eq!(out[1], ServerMessage::MemberCountUpdate { count: 2 });
    }

    #[test]
    fn non_host_leaving_keeps_host() {
        let mut room = RoomState::new("room01".into(), 0.0);
        room.join("a".into(), member("Alice"));
        room.join("b".into(), member("Bob"));

        let out = room.leave("b", 1.0);
        assert_eq!(room.host_id(), Some("a"));
        assert!(
            !out.iter()
                .any(|m| matches!(m, ServerMessage::HostChanged { .. }))
        );
    }

    #[test]
    fn last_member_leaving_resets_playback() {
        let mut room = room_with_queue(&["a", "b"], 0.0);
        room.join("solo".into(), member("Solo"));
        room.play(30.0, 1.0);
        room.set_loop(true);

        room.leave("solo", 2.0);

        let snapshot = room.snapshot(10.0);
        assert!(snapshot.queue.is_empty());
        assert_eq!(snapshot.current_index, -1);
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.position, 0.0);
        assert_eq!(snapshot.host_id, None);
        assert!(snapshot.is_looping);
    }

    #[test]
    fn leaving_twice_is_silent() {
        let mut room = RoomState::new("room01".into(), 0.0);
        room.join("a".into(), member("Alice"));
        room.leave("a", 1.0);
        assert!(room.leave("a", 2.0).is_empty());
    }
}
