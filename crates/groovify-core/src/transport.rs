//! Audio transport boundary.
//!
//! The audio element that actually decodes and plays sound lives outside
//! this crate. The core drives it through [`AudioTransport`] commands and
//! receives its notifications as [`TransportEvent`]s, which may arrive at
//! any time relative to the commands.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Commands the core issues to the external audio element.
#[cfg_attr(test, mockall::automock)]
pub trait AudioTransport: Send {
    /// Load a new audio source, replacing the current one.
    fn load(&mut self, source: &str) -> Result<()>;

    /// Start or resume playback.
    fn play(&mut self) -> Result<()>;

    /// Pause playback.
    fn pause(&mut self) -> Result<()>;

    /// Jump to `position` seconds.
    fn seek(&mut self, position: f64) -> Result<()>;

    /// Set output volume, 0.0 to 1.0.
    fn set_volume(&mut self, level: f32) -> Result<()>;
}

/// Notifications reported by the audio element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TransportEvent {
    /// Playback position advanced, in seconds.
    TimeUpdate(f64),
    /// The current source played to its end.
    Ended,
    /// The source's duration became known, in seconds.
    MetadataLoaded(f64),
}

/// Transport that accepts every command and does nothing.
///
/// For headless sessions and tests that only care about library state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl AudioTransport for NullTransport {
    fn load(&mut self, _source: &str) -> Result<()> {
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn seek(&mut self, _position: f64) -> Result<()> {
        Ok(())
    }

    fn set_volume(&mut self, _level: f32) -> Result<()> {
        Ok(())
    }
}
