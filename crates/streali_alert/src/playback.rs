// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview clock for scrubbing and playing an alert.

use crate::units::Milliseconds;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped at the start
    #[default]
    Stopped,
    /// Advancing
    Playing,
    /// Holding the current time
    Paused,
}

/// Preview clock
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    /// Current timestamp
    pub time: Milliseconds,
    /// Playback state
    pub state: PlaybackState,
    /// Playback speed multiplier
    pub speed: f32,
    /// Wrap to the start instead of stopping at the end
    pub looping: bool,
}

impl Playback {
    /// Create a stopped clock at zero
    pub fn new() -> Self {
        Self {
            time: Milliseconds::ZERO,
            state: PlaybackState::Stopped,
            speed: 1.0,
            looping: false,
        }
    }

    /// Advance by `delta_seconds` of wall time
    pub fn update(&mut self, delta_seconds: f32, total_time: Milliseconds) {
        if self.state != PlaybackState::Playing {
            return;
        }

        self.time = self.time + Milliseconds::from_secs(delta_seconds * self.speed);

        if self.time >= total_time {
            if self.looping && total_time.0 > 0.0 {
                self.time = Milliseconds(self.time.0 % total_time.0);
            } else {
                self.time = total_time;
                self.state = PlaybackState::Stopped;
            }
        }
    }

    /// Play from the current position; restarts if parked at the end
    pub fn play(&mut self, total_time: Milliseconds) {
        if self.time >= total_time {
            self.time = Milliseconds::ZERO;
        }
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and rewind
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = Milliseconds::ZERO;
    }

    /// Toggle play/pause
    pub fn toggle(&mut self, total_time: Milliseconds) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(total_time),
        }
    }

    /// Jump to a timestamp within `[0, total_time]`
    pub fn seek(&mut self, time: Milliseconds, total_time: Milliseconds) {
        self.time = time.clamp(Milliseconds::ZERO, total_time);
    }

    /// Whether the clock is advancing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: Milliseconds = Milliseconds(10_000.0);

    #[test]
    fn test_update_only_advances_while_playing() {
        let mut playback = Playback::new();
        playback.update(1.0, TOTAL);
        assert_eq!(playback.time, Milliseconds::ZERO);

        playback.play(TOTAL);
        playback.update(0.5, TOTAL);
        assert_eq!(playback.time, Milliseconds(500.0));

        playback.pause();
        playback.update(0.5, TOTAL);
        assert_eq!(playback.time, Milliseconds(500.0));
    }

    #[test]
    fn test_stops_at_end_without_loop() {
        let mut playback = Playback::new();
        playback.play(TOTAL);
        playback.update(12.0, TOTAL);

        assert_eq!(playback.time, TOTAL);
        assert_eq!(playback.state, PlaybackState::Stopped);

        playback.play(TOTAL);
        assert_eq!(playback.time, Milliseconds::ZERO);
    }

    #[test]
    fn test_loop_wraps_around() {
        let mut playback = Playback { looping: true, ..Playback::new() };
        playback.play(TOTAL);
        playback.update(10.5, TOTAL);

        assert_eq!(playback.time, Milliseconds(500.0));
        assert!(playback.is_playing());
    }

    #[test]
    fn test_seek_clamps_and_stop_rewinds() {
        let mut playback = Playback::new();
        playback.seek(Milliseconds(-100.0), TOTAL);
        assert_eq!(playback.time, Milliseconds::ZERO);

        playback.seek(Milliseconds(20_000.0), TOTAL);
        assert_eq!(playback.time, TOTAL);

        playback.toggle(TOTAL);
        assert!(playback.is_playing());
        playback.stop();
        assert_eq!(playback.time, Milliseconds::ZERO);
        assert_eq!(playback.state, PlaybackState::Stopped);
    }
}
