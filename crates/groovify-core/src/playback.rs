//! Live playback session: current song, navigation queue, play/pause.
//!
//! The session is a small state machine:
//!
//! - **Idle**: no current song
//! - **Paused**: a song is loaded, not playing
//! - **Playing**: a song is loaded and playing
//!
//! Navigation looks the current song up by identifier inside the queue on
//! every call instead of keeping a cursor, so a queue replaced behind the
//! session's back never leaves a stale index.
//!
//! Every state change is published as a [`PlaybackEvent`]. Other components
//! (history recording, the audio transport) react to those events instead
//! of being called directly, which keeps this module testable on its own.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::DEFAULT_VOLUME;
use crate::song::Song;

/// Coarse playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No current song.
    Idle,
    /// A song is loaded and paused.
    Paused,
    /// A song is loaded and playing.
    Playing,
}

/// What happens when the transport reports the end of a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Advance through the queue and stop at its end.
    #[default]
    Off,
    /// Advance through the queue and wrap to its head at the end.
    All,
    /// Restart the current song.
    One,
}

impl RepeatMode {
    /// The mode a repeat toggle switches to (off, all, one, off, ...).
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::All => write!(f, "All"),
            Self::One => write!(f, "One"),
        }
    }
}

/// Events published by the playback session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PlaybackEvent {
    /// A new current song was selected (play, next, previous, wrap).
    SongStarted(Song),
    /// The play/pause flag flipped.
    PlayStateChanged {
        /// New value of the flag.
        is_playing: bool,
    },
    /// The queue was replaced wholesale.
    QueueReplaced {
        /// Length of the new queue.
        len: usize,
    },
    /// A song was appended to the queue.
    SongEnqueued(Song),
}

/// Owns the current song, the queue and the transport-facing playback flags.
pub struct PlaybackSession {
    current: Option<Song>,
    queue: Vec<Song>,
    is_playing: bool,
    repeat_mode: RepeatMode,
    volume: u8,
    position: f64,
    duration: f64,
    event_tx: mpsc::UnboundedSender<PlaybackEvent>,
    event_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
}

impl PlaybackSession {
    /// Create an idle session with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            current: None,
            queue: Vec::new(),
            is_playing: false,
            repeat_mode: RepeatMode::Off,
            volume: DEFAULT_VOLUME,
            position: 0.0,
            duration: 0.0,
            event_tx,
            event_rx,
        }
    }

    /// Make `song` current, replace the queue with `context` and start playing.
    ///
    /// `song` does not need to be part of `context`.
    pub fn play(&mut self, song: Song, context: Vec<Song>) {
        info!("Playing '{}' with a queue of {}", song.title, context.len());
        self.queue = context;
        self.emit(PlaybackEvent::QueueReplaced {
            len: self.queue.len(),
        });

        self.set_current(song);
        if !self.is_playing {
            self.is_playing = true;
            self.emit(PlaybackEvent::PlayStateChanged { is_playing: true });
        }
    }

    /// Flip between playing and paused. Returns false when idle.
    pub fn toggle_play(&mut self) -> bool {
        if self.current.is_none() {
            debug!("toggle_play ignored: nothing loaded");
            return false;
        }
        self.set_playing(!self.is_playing);
        true
    }

    /// Set the play/pause flag. Idle sessions ignore this.
    pub fn set_playing(&mut self, playing: bool) {
        if self.current.is_none() || self.is_playing == playing {
            return;
        }
        self.is_playing = playing;
        self.emit(PlaybackEvent::PlayStateChanged {
            is_playing: playing,
        });
    }

    /// Advance to the queue entry after the current song.
    ///
    /// Returns false, changing nothing, when the current song is the last
    /// entry or is not in the queue at all.
    pub fn next(&mut self) -> bool {
        let successor = self
            .current_index()
            .and_then(|index| self.queue.get(index + 1))
            .cloned();

        match successor {
            Some(song) => {
                self.set_current(song);
                true
            }
            None => {
                debug!("next ignored: no successor in queue");
                false
            }
        }
    }

    /// Step back to the queue entry before the current song.
    ///
    /// Returns false, changing nothing, when the current song is the first
    /// entry or is not in the queue at all.
    pub fn previous(&mut self) -> bool {
        let predecessor = self
            .current_index()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.queue.get(index))
            .cloned();

        match predecessor {
            Some(song) => {
                self.set_current(song);
                true
            }
            None => {
                debug!("previous ignored: no predecessor in queue");
                false
            }
        }
    }

    /// Make the queue's first entry current. Returns false for an empty queue.
    pub fn restart_queue(&mut self) -> bool {
        match self.queue.first().cloned() {
            Some(song) => {
                self.set_current(song);
                true
            }
            None => false,
        }
    }

    /// Append `song` unless its identifier is already queued.
    pub fn enqueue(&mut self, song: Song) -> bool {
        if self.queue.iter().any(|s| s.id == song.id) {
            debug!("enqueue ignored: '{}' already queued", song.id);
            return false;
        }
        self.queue.push(song.clone());
        self.emit(PlaybackEvent::SongEnqueued(song));
        true
    }

    /// Record the transport-reported playback position, in seconds.
    pub fn update_position(&mut self, position: f64) {
        if position.is_finite() && position >= 0.0 {
            self.position = position;
        }
    }

    /// Record the transport-reported duration of the current song, in seconds.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
    }

    /// Set the volume, clamped to 0-100.
    pub fn set_volume(&mut self, volume: u8) -> u8 {
        self.volume = volume.min(100);
        self.volume
    }

    /// Advance the repeat mode and return the new one.
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.cycle();
        info!("Repeat mode set to {}", self.repeat_mode);
        self.repeat_mode
    }

    /// Set the repeat mode explicitly.
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    /// Current coarse state.
    #[must_use]
    pub const fn status(&self) -> PlaybackStatus {
        match (&self.current, self.is_playing) {
            (None, _) => PlaybackStatus::Idle,
            (Some(_), true) => PlaybackStatus::Playing,
            (Some(_), false) => PlaybackStatus::Paused,
        }
    }

    /// The current song, if any.
    #[must_use]
    pub const fn current_song(&self) -> Option<&Song> {
        self.current.as_ref()
    }

    /// The navigation queue.
    #[must_use]
    pub fn queue(&self) -> &[Song] {
        &self.queue
    }

    /// Whether the play flag is set.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Current repeat mode.
    #[must_use]
    pub const fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    /// Current volume, 0-100.
    #[must_use]
    pub const fn volume(&self) -> u8 {
        self.volume
    }

    /// Last reported position, in seconds.
    #[must_use]
    pub const fn position(&self) -> f64 {
        self.position
    }

    /// Last reported duration, in seconds (0 when unknown).
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Try to receive the next pending event without blocking.
    pub fn try_recv_event(&mut self) -> Option<PlaybackEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Take every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::iter::from_fn(|| self.try_recv_event()).collect()
    }

    /// Get a sender for injecting events into this session's stream.
    #[must_use]
    pub fn event_sender(&self) -> mpsc::UnboundedSender<PlaybackEvent> {
        self.event_tx.clone()
    }

    fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.queue.iter().position(|s| s.id == current.id)
    }

    fn set_current(&mut self, song: Song) {
        self.position = 0.0;
        self.duration = 0.0;
        self.current = Some(song.clone());
        self.emit(PlaybackEvent::SongStarted(song));
    }

    fn emit(&self, event: PlaybackEvent) {
        // The receiver lives in `self`, so sending cannot fail.
        let _ = self.event_tx.send(event);
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("current", &self.current.as_ref().map(|s| &s.id))
            .field("queue_len", &self.queue.len())
            .field("is_playing", &self.is_playing)
            .field("repeat_mode", &self.repeat_mode)
            .finish_non_exhaustive()
    }
}

/// Render a playback time as `m:ss`.
#[must_use]
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song::new(id, format!("Song {id}"), "Artist", format!("/music/{id}.mp3"))
    }

    fn songs(ids: &[&str]) -> Vec<Song> {
        ids.iter().map(|id| song(id)).collect()
    }

    fn current_id(session: &PlaybackSession) -> Option<&str> {
        session.current_song().map(|s| s.id.as_str())
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = PlaybackSession::new();
        assert_eq!(session.status(), PlaybackStatus::Idle);
        assert!(session.queue().is_empty());
        assert_eq!(session.volume(), DEFAULT_VOLUME);
    }

    #[test]
    fn test_play_replaces_queue_and_starts() {
        let mut session = PlaybackSession::new();
        session.play(song("a"), songs(&["a", "b", "c"]));

        assert_eq!(session.status(), PlaybackStatus::Playing);
        assert_eq!(current_id(&session), Some("a"));
        assert_eq!(session.queue().len(), 3);

        session.play(song("x"), songs(&["y"]));
        assert_eq!(current_id(&session), Some("x"));
        assert_eq!(session.queue(), songs(&["y"]).as_slice());
    }

    #[test]
    fn test_play_emits_events_in_order() {
        let mut session = PlaybackSession::new();
        session.play(song("a"), songs(&["a", "b"]));

        assert_eq!(
            session.drain_events(),
            vec![
                PlaybackEvent::QueueReplaced { len: 2 },
                PlaybackEvent::SongStarted(song("a")),
                PlaybackEvent::PlayStateChanged { is_playing: true },
            ]
        );
        assert!(session.try_recv_event().is_none());
    }

    #[test]
    fn test_next_walks_queue_and_stops_at_end() {
        let mut session = PlaybackSession::new();
        session.play(song("a"), songs(&["a", "b", "c"]));

        assert!(session.next());
        assert_eq!(current_id(&session), Some("b"));
        assert!(session.next());
        assert_eq!(current_id(&session), Some("c"));
        assert!(!session.next());
        assert_eq!(current_id(&session), Some("c"));
        assert_eq!(session.queue().len(), 3);
    }

    #[test]
    fn test_previous_at_first_is_noop() {
        let mut session = PlaybackSession::new();
        session.play(song("b"), songs(&["a", "b"]));

        assert!(session.previous());
        assert_eq!(current_id(&session), Some("a"));
        session.drain_events();

        assert!(!session.previous());
        assert_eq!(current_id(&session), Some("a"));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_navigation_when_current_not_in_queue_is_noop() {
        let mut session = PlaybackSession::new();
        session.play(song("x"), songs(&["a", "b"]));

        assert!(!session.next());
        assert!(!session.previous());
        assert_eq!(current_id(&session), Some("x"));
    }

    #[test]
    fn test_navigation_when_idle_is_noop() {
        let mut session = PlaybackSession::new();
        assert!(!session.next());
        assert!(!session.previous());
        assert_eq!(session.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn test_next_keeps_play_flag() {
        let mut session = PlaybackSession::new();
        session.play(song("a"), songs(&["a", "b"]));
        session.toggle_play();
        session.next();
        assert_eq!(session.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_toggle_play() {
        let mut session = PlaybackSession::new();
        assert!(!session.toggle_play());
        assert!(session.drain_events().is_empty());

        session.play(song("a"), songs(&["a"]));
        session.drain_events();

        assert!(session.toggle_play());
        assert_eq!(session.status(), PlaybackStatus::Paused);
        assert!(session.toggle_play());
        assert_eq!(session.status(), PlaybackStatus::Playing);
        assert_eq!(
            session.drain_events(),
            vec![
                PlaybackEvent::PlayStateChanged { is_playing: false },
                PlaybackEvent::PlayStateChanged { is_playing: true },
            ]
        );
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut session = PlaybackSession::new();
        assert!(session.enqueue(song("a")));
        assert!(!session.enqueue(song("a")));
        assert_eq!(session.queue().len(), 1);
        assert_eq!(
            session.drain_events(),
            vec![PlaybackEvent::SongEnqueued(song("a"))]
        );
    }

    #[test]
    fn test_restart_queue() {
        let mut session = PlaybackSession::new();
        assert!(!session.restart_queue());

        session.play(song("c"), songs(&["a", "b", "c"]));
        assert!(session.restart_queue());
        assert_eq!(current_id(&session), Some("a"));
    }

    #[test]
    fn test_song_change_resets_progress() {
        let mut session = PlaybackSession::new();
        session.play(song("a"), songs(&["a", "b"]));
        session.set_duration(200.0);
        session.update_position(42.5);
        assert_eq!(session.position(), 42.5);

        session.next();
        assert_eq!(session.position(), 0.0);
        assert_eq!(session.duration(), 0.0);
    }

    #[test]
    fn test_progress_rejects_invalid_values() {
        let mut session = PlaybackSession::new();
        session.update_position(10.0);
        session.update_position(f64::NAN);
        session.update_position(-1.0);
        assert_eq!(session.position(), 10.0);

        session.set_duration(f64::INFINITY);
        assert_eq!(session.duration(), 0.0);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut session = PlaybackSession::new();
        assert_eq!(session.set_volume(150), 100);
        assert_eq!(session.set_volume(30), 30);
    }

    #[test]
    fn test_repeat_mode_cycles() {
        let mut session = PlaybackSession::new();
        assert_eq!(session.cycle_repeat(), RepeatMode::All);
        assert_eq!(session.cycle_repeat(), RepeatMode::One);
        assert_eq!(session.cycle_repeat(), RepeatMode::Off);
    }

    #[test]
    fn test_event_sender_feeds_same_stream() {
        let mut session = PlaybackSession::new();
        session
            .event_sender()
            .send(PlaybackEvent::QueueReplaced { len: 0 })
            .expect("send");
        assert_eq!(
            session.try_recv_event(),
            Some(PlaybackEvent::QueueReplaced { len: 0 })
        );
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }
}
