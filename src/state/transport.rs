//! Transport transitions of a room: every client-initiated playback or queue
//! event mutates [`RoomState`] and returns the messages to fan out, computed
//! while the caller still holds the room lock.

use rand::Rng;

use crate::{
    dto::ws::ServerMessage,
    state::{
        clock::Lead,
        room::{PlaybackStatus, RoomError, RoomState, Track},
    },
};

/// Messages to broadcast to every member after a transition, in order.
pub type Broadcast = Vec<ServerMessage>;

impl RoomState {
    /// Append a track. The first track of an idle room becomes current, paused at 0.
    pub fn enqueue(&mut self, track: Track, now: f64) -> Broadcast {
        self.queue.push(track);

        let mut out = Vec::with_capacity(3);
        if self.current_index.is_none() {
            self.current_index = Some(self.queue.len() - 1);
            self.is_playing = false;
            self.anchor(0.0, now);
            out.push(self.new_track());
            out.push(ServerMessage::Pause { time: 0.0 });
        }
        out.push(self.queue_update());
        out
    }

    /// Start playing from `time`, scheduled a short lead ahead so clients start together.
    ///
    /// A Stopped room (no current track) ignores transport commands and broadcasts nothing.
    pub fn play(&mut self, time: f64, now: f64) -> Broadcast {
        if self.status() == PlaybackStatus::Stopped {
            return Vec::new();
        }

        self.is_playing = true;
        self.anchor(time, now);
        vec![ServerMessage::ScheduledPlay {
            audio_time: self.position_seconds,
            target_timestamp: Lead::Resume.target(now),
        }]
    }

    /// Freeze the effective position. Pausing an already paused room broadcasts nothing.
    pub fn pause(&mut self, now: f64) -> Broadcast {
        if !self.is_playing {
            return Vec::new();
        }

        let frozen = self.effective_position(now);
        self.is_playing = false;
        self.anchor(frozen, now);
        vec![ServerMessage::Pause {
            time: self.position_seconds,
        }]
    }

    /// Jump to `time`, keeping the play/pause state.
    ///
    /// While paused the new position is always re-broadcast, even if unchanged.
    pub fn seek(&mut self, time: f64, now: f64) -> Broadcast {
        if self.status() == PlaybackStatus::Stopped {
            return Vec::new();
        }

        self.anchor(time, now);
        if self.is_playing {
            vec![ServerMessage::ScheduledPlay {
                audio_time: self.position_seconds,
                target_timestamp: Lead::Resume.target(now),
            }]
        } else {
            vec![ServerMessage::Pause {
                time: self.position_seconds,
            }]
        }
    }

    /// Advance to the following track, or to a random other track when shuffling.
    ///
    /// Wraps at the end of the queue. An empty queue is a silent no-op.
    pub fn next<R: Rng>(&mut self, now: f64, rng: &mut R) -> Broadcast {
        let len = self.queue.len();
        if len == 0 {
            return Vec::new();
        }

        let index = match self.current_index {
            Some(current) if self.is_shuffling && len > 1 => {
                // Uniform over every index except the current one.
                let pick = rng.random_range(0..len - 1);
                if pick >= current { pick + 1 } else { pick }
            }
            Some(current) => (current + 1) % len,
            None => 0,
        };
        self.change_track(index, now)
    }

    /// Step back to the preceding track, wrapping to the end of the queue.
    pub fn previous(&mut self, now: f64) -> Broadcast {
        let len = self.queue.len();
        if len == 0 {
            return Vec::new();
        }

        let index = match self.current_index {
            Some(0) | None => len - 1,
            Some(current) => current - 1,
        };
        self.change_track(index, now)
    }

    fn change_track(&mut self, index: usize, now: f64) -> Broadcast {
        self.current_index = Some(index);
        self.is_playing = true;
        self.anchor(0.0, now);
        vec![
            self.new_track(),
            ServerMessage::ScheduledPlay {
                audio_time: 0.0,
                target_timestamp: Lead::TrackChange.target(now),
            },
            self.queue_update(),
        ]
    }

    /// Jump to an explicit queue entry and hold paused at its start.
    pub fn select(&mut self, index: usize, now: f64) -> Result<Broadcast, RoomError> {
        self.check_index(index)?;

        self.current_index = Some(index);
        self.is_playing = false;
        self.anchor(0.0, now);
        Ok(vec![
            self.new_track(),
            ServerMessage::Pause { time: 0.0 },
            self.queue_update(),
        ])
    }

    /// Delete a queue entry while keeping `current_index` on the same logical track.
    ///
    /// Removing the current entry promotes the one sliding into its slot (or the
    /// new last entry when the removed one was last), paused at 0.
    pub fn remove(&mut self, index: usize, now: f64) -> Result<Broadcast, RoomError> {
        self.check_index(index)?;
        self.queue.remove(index);

        let mut out = Vec::with_capacity(3);
        match self.current_index {
            Some(current) if current == index => {
                self.is_playing = false;
                self.anchor(0.0, now);
                if self.queue.is_empty() {
                    self.current_index = None;
                    out.push(self.new_track());
                } else {
                    self.current_index = Some(index.min(self.queue.len() - 1));
                    out.push(self.new_track());
                    out.push(ServerMessage::Pause { time: 0.0 });
                }
            }
            Some(current) if index < current => {
                self.current_index = Some(current - 1);
            }
            _ => {}
        }
        out.push(self.queue_update());
        Ok(out)
    }

    /// Move one entry from `from` to `to`. Playback is not touched.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<Broadcast, RoomError> {
        self.check_index(from)?;
        self.check_index(to)?;

        let track = self.queue.remove(from);
        self.queue.insert(to, track);

        if let Some(current) = self.current_index {
            self.current_index = Some(if from == current {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        Ok(vec![self.queue_update()])
    }

    /// Set the shuffle flag.
    pub fn set_shuffle(&mut self, enabled: bool) -> Broadcast {
        self.is_shuffling = enabled;
        vec![ServerMessage::ShuffleStateUpdate { enabled }]
    }

    /// Set the loop flag.
    pub fn set_loop(&mut self, enabled: bool) -> Broadcast {
        self.is_looping = enabled;
        vec![ServerMessage::LoopStateUpdate { enabled }]
    }

    /// Restart the current track from 0 when a looped track ends client-side.
    pub fn loop_restart(&mut self, now: f64) -> Broadcast {
        if self.status() == PlaybackStatus::Stopped {
            return Vec::new();
        }

        self.is_playing = true;
        self.anchor(0.0, now);
        vec![ServerMessage::LoopRestart]
    }

    /// Catch-up anchor for a manually requested resync. Does not mutate the room.
    pub fn catch_up(&self, time: f64, now: f64) -> Broadcast {
        vec![ServerMessage::CatchUp {
            audio_time: time.max(0.0),
            target_timestamp: Lead::CatchUp.target(now),
        }]
    }

    /// Periodic drift-correction anchor, only for rooms that are playing.
    pub fn server_sync(&self, now: f64) -> Option<ServerMessage> {
        self.is_playing.then(|| ServerMessage::ServerSync {
            audio_time: self.effective_position(now),
            server_time: now,
        })
    }
}
